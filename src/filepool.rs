// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Two-stage sample cache: a synchronous preload of each file's head plus
//! a background pipeline that streams in the remainder.
//!
//! Voices ask for a [`FilePromise`] when they start. The promise carries
//! the preloaded head immediately, so playback begins without touching the
//! disk; a loader thread then reads the whole file and publishes it
//! through the promise's `data_ready` flag. The audio thread never
//! blocks, never reads files, and never frees sample memory: retired
//! promises are parked on a to-clean list whose actual destruction is
//! deferred to the next maintenance call.

pub mod oversampler;
mod reader;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::audio::buffer::AudioBuffer;
use crate::config::{EngineConfig, DEFAULT_SAMPLE_RATE, LOADER_DEQUEUE_TIMEOUT};
use oversampler::{upsample, Oversampling};
use reader::SampleReader;

/// Error types for file pool operations.
#[derive(Debug, thiserror::Error)]
pub enum FilePoolError {
    #[error("File not found: {0}")]
    MissingFile(PathBuf),

    #[error("Unsupported channel count {1} in {0}")]
    UnsupportedChannelCount(PathBuf, u16),

    #[error("Wave file error: {0}")]
    WavError(#[from] hound::Error),

    #[error("Oversampling failed: x{0}")]
    OversamplingFailed(u32),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Metadata about a sample file.
#[derive(Clone, Debug, PartialEq)]
pub struct FileInformation {
    /// Total frames in the file.
    pub end: u32,
    /// First frame of the instrument loop, if the file carries one.
    pub loop_begin: u32,
    /// Last frame of the instrument loop.
    pub loop_end: u32,
    /// Native sample rate.
    pub sample_rate: f64,
    /// Channel count.
    pub num_channels: u16,
}

/// A handle to a sample that is immediately playable from its preloaded
/// head and asynchronously upgradeable to the full file data.
///
/// The loader thread is the only writer of `file_data`; it publishes with
/// a release store on `data_ready`, and readers must check
/// [`FilePromise::data_ready`] (an acquire load) before touching the full
/// buffer.
pub struct FilePromise {
    filename: String,
    preloaded_data: Option<Arc<AudioBuffer<f32>>>,
    file_data: OnceLock<AudioBuffer<f32>>,
    sample_rate: f32,
    oversampling: Oversampling,
    data_ready: AtomicBool,
}

impl FilePromise {
    /// A promise with no backing sample. It never becomes ready; a voice
    /// holding one renders silence and releases itself.
    fn empty() -> Self {
        Self {
            filename: String::new(),
            preloaded_data: None,
            file_data: OnceLock::new(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            oversampling: Oversampling::X1,
            data_ready: AtomicBool::new(false),
        }
    }

    /// Gets the file this promise refers to.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Gets the preloaded head of the sample.
    pub fn preloaded_data(&self) -> Option<&Arc<AudioBuffer<f32>>> {
        self.preloaded_data.as_ref()
    }

    /// Gets the full sample, if the background load has completed.
    pub fn file_data(&self) -> Option<&AudioBuffer<f32>> {
        self.file_data.get()
    }

    /// Gets the effective sample rate (native rate times the oversampling
    /// factor).
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Gets the oversampling factor the data was loaded with.
    pub fn oversampling(&self) -> Oversampling {
        self.oversampling
    }

    /// True once the full file data is published. Pairs with the loader's
    /// release store.
    pub fn data_ready(&self) -> bool {
        self.data_ready.load(Ordering::Acquire)
    }
}

/// One preloaded sample head, plus the values recorded at preload time
/// that later re-preloads are computed from.
struct PreloadedEntry {
    preloaded_data: Arc<AudioBuffer<f32>>,
    /// Effective rate of the stored data (native × oversampling factor).
    sample_rate: f32,
    /// Native rate on disk.
    source_sample_rate: u32,
    /// The `max_offset` passed to the most recent preload of this file.
    max_offset: u32,
}

/// State shared with the loader threads.
struct LoaderShared {
    root_directory: RwLock<PathBuf>,
    quit: AtomicBool,
    empty_queue: AtomicBool,
    /// Loaders actively reading a file.
    threads_loading: AtomicUsize,
    /// Promises enqueued but not yet handed to the filled queue. Unlike a
    /// queue length this has no window between dequeue and load, so
    /// `wait_for_background_loading` cannot return early.
    pending_loads: AtomicUsize,
}

/// The sample cache and background loading pipeline.
pub struct FilePool {
    shared: Arc<LoaderShared>,
    preload_size: u32,
    oversampling: Oversampling,
    preloaded: HashMap<String, PreloadedEntry>,
    promise_tx: Sender<Arc<FilePromise>>,
    filled_rx: Receiver<Arc<FilePromise>>,
    temporary_promises: Vec<Arc<FilePromise>>,
    promises_to_clean: Vec<Arc<FilePromise>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl FilePool {
    /// Creates a pool and starts its background loader threads.
    pub fn new(config: &EngineConfig) -> Self {
        let (promise_tx, promise_rx) = bounded::<Arc<FilePromise>>(config.max_voices());
        let (filled_tx, filled_rx) = bounded::<Arc<FilePromise>>(config.max_voices());

        let shared = Arc::new(LoaderShared {
            root_directory: RwLock::new(PathBuf::new()),
            quit: AtomicBool::new(false),
            empty_queue: AtomicBool::new(false),
            threads_loading: AtomicUsize::new(0),
            pending_loads: AtomicUsize::new(0),
        });

        let num_threads = config.num_background_threads().max(1);
        let workers = (0..num_threads)
            .map(|index| {
                let shared = shared.clone();
                let promise_rx = promise_rx.clone();
                let filled_tx = filled_tx.clone();
                thread::Builder::new()
                    .name(format!("sforzo-loader-{index}"))
                    .spawn(move || loading_thread(shared, promise_rx, filled_tx))
                    .expect("failed to spawn loader thread")
            })
            .collect();

        Self {
            shared,
            preload_size: config.preload_size(),
            oversampling: config.oversampling(),
            preloaded: HashMap::new(),
            promise_tx,
            filled_rx,
            temporary_promises: Vec::with_capacity(config.max_voices() * 2),
            promises_to_clean: Vec::with_capacity(config.max_voices() * 2),
            workers,
        }
    }

    /// Sets the directory sample paths are resolved against.
    pub fn set_root_directory(&mut self, directory: &Path) {
        *self.shared.root_directory.write() = directory.to_path_buf();
    }

    /// Gets the number of preloaded sample files.
    pub fn num_preloaded_samples(&self) -> usize {
        self.preloaded.len()
    }

    /// Gets the current preload size in frames.
    pub fn preload_size(&self) -> u32 {
        self.preload_size
    }

    /// Gets the current oversampling factor.
    pub fn oversampling_factor(&self) -> Oversampling {
        self.oversampling
    }

    /// Probes a file for its metadata. Returns `None` for missing files
    /// and unsupported channel counts.
    pub fn get_file_information(&self, filename: &str) -> Option<FileInformation> {
        let file = self.shared.root_directory.read().join(filename);
        if !file.exists() {
            return None;
        }

        let reader = match SampleReader::open(&file) {
            Ok(reader) => reader,
            Err(error) => {
                warn!(file = %file.display(), error = %error, "Failed to probe sample");
                return None;
            }
        };
        if reader.channels() == 0 || reader.channels() > 2 {
            debug!(
                file = %file.display(),
                channels = reader.channels(),
                "Discarding sample with unsupported channel count"
            );
            return None;
        }

        let mut information = FileInformation {
            end: reader.num_frames(),
            loop_begin: 0,
            loop_end: u32::MAX,
            sample_rate: f64::from(reader.sample_rate()),
            num_channels: reader.channels(),
        };
        if let Some(loop_points) = reader::read_loop_points(&file) {
            information.loop_begin = loop_points.start;
            information.loop_end = loop_points.end;
        }
        Some(information)
    }

    /// Ensures a file is preloaded with enough frames to cover playback
    /// starting anywhere up to `max_offset`. Loads
    /// `min(total, preload_size + max_offset)` frames, or the whole file
    /// when the preload size is zero. A file already preloaded at least
    /// that far is left untouched.
    pub fn preload_file(&mut self, filename: &str, max_offset: u32) -> bool {
        let root = self.shared.root_directory.read().clone();
        let frames_to_load = match probe_frames_to_load(&root, filename, self.preload_size, max_offset)
        {
            Ok(frames) => frames,
            Err(error) => {
                warn!(filename, error = %error, "Preload failed");
                return false;
            }
        };

        if let Some(entry) = self.preloaded.get(filename) {
            let wanted = frames_to_load.saturating_mul(self.oversampling.factor());
            if u32::try_from(entry.preloaded_data.num_frames()).unwrap_or(u32::MAX) >= wanted {
                debug!(filename, "Sample already preloaded");
                return true;
            }
        }

        match read_from_file(&root, filename, frames_to_load, self.oversampling) {
            Ok((buffer, source_sample_rate)) => {
                debug!(
                    filename,
                    frames = buffer.num_frames(),
                    "Sample head preloaded"
                );
                self.preloaded.insert(
                    filename.to_string(),
                    PreloadedEntry {
                        preloaded_data: Arc::new(buffer),
                        sample_rate: source_sample_rate as f32
                            * self.oversampling.factor() as f32,
                        source_sample_rate,
                        max_offset,
                    },
                );
                true
            }
            Err(error) => {
                warn!(filename, error = %error, "Preload failed");
                false
            }
        }
    }

    /// Hands out a promise for a sample. If the file is preloaded the
    /// promise carries its head and is queued for a background full load;
    /// otherwise the returned promise is empty and never becomes ready.
    ///
    /// Safe to call from the audio thread: this never blocks and never
    /// touches the disk.
    pub fn get_promise(&self, filename: &str) -> Arc<FilePromise> {
        let entry = match self.preloaded.get(filename) {
            Some(entry) => entry,
            None => return Arc::new(FilePromise::empty()),
        };

        let promise = Arc::new(FilePromise {
            filename: filename.to_string(),
            preloaded_data: Some(entry.preloaded_data.clone()),
            file_data: OnceLock::new(),
            sample_rate: entry.sample_rate,
            oversampling: self.oversampling,
            data_ready: AtomicBool::new(false),
        });

        // A full queue means the promise is simply never upgraded; the
        // voice keeps playing from the preloaded head.
        if self.promise_tx.try_send(promise.clone()).is_ok() {
            self.shared.pending_loads.fetch_add(1, Ordering::AcqRel);
        }
        promise
    }

    /// Collects filled promises and garbage-collects the ones their
    /// voices have dropped.
    ///
    /// Safe to call from the audio thread; the entries retired on one call
    /// are destroyed at the start of the next, so hosts that care about
    /// worst-case deallocation cost should rotate this call to a worker.
    pub fn cleanup_promises(&mut self) {
        self.promises_to_clean.clear();

        while let Ok(promise) = self.filled_rx.try_recv() {
            self.temporary_promises.push(promise);
        }

        let mut index = 0;
        while index < self.temporary_promises.len() {
            if Arc::strong_count(&self.temporary_promises[index]) == 1 {
                let promise = self.temporary_promises.swap_remove(index);
                self.promises_to_clean.push(promise);
            } else {
                index += 1;
            }
        }
    }

    /// Changes the preload size and re-reads every cached file at the new
    /// size, using the per-file offset recorded when it was preloaded.
    /// Not real-time safe; the audio thread must be quiescent.
    pub fn set_preload_size(&mut self, preload_size: u32) {
        self.preload_size = preload_size;
        let root = self.shared.root_directory.read().clone();
        for (filename, entry) in self.preloaded.iter_mut() {
            let frames_to_load =
                match probe_frames_to_load(&root, filename, preload_size, entry.max_offset) {
                    Ok(frames) => frames,
                    Err(error) => {
                        warn!(filename = %filename, error = %error, "Re-preload failed");
                        continue;
                    }
                };
            match read_from_file(&root, filename, frames_to_load, self.oversampling) {
                Ok((buffer, _)) => entry.preloaded_data = Arc::new(buffer),
                Err(error) => warn!(filename = %filename, error = %error, "Re-preload failed"),
            }
        }
    }

    /// Changes the oversampling factor and re-reads every cached file.
    /// Setting the current factor again is a no-op. Not real-time safe;
    /// the audio thread must be quiescent.
    pub fn set_oversampling_factor(&mut self, factor: Oversampling) {
        if factor == self.oversampling {
            return;
        }

        let root = self.shared.root_directory.read().clone();
        let preload_size = self.preload_size;
        for (filename, entry) in self.preloaded.iter_mut() {
            let frames_to_load =
                match probe_frames_to_load(&root, filename, preload_size, entry.max_offset) {
                    Ok(frames) => frames,
                    Err(error) => {
                        warn!(filename = %filename, error = %error, "Re-preload failed");
                        continue;
                    }
                };
            match read_from_file(&root, filename, frames_to_load, factor) {
                Ok((buffer, source_sample_rate)) => {
                    entry.preloaded_data = Arc::new(buffer);
                    entry.source_sample_rate = source_sample_rate;
                    entry.sample_rate =
                        source_sample_rate as f32 * factor.factor() as f32;
                }
                Err(error) => warn!(filename = %filename, error = %error, "Re-preload failed"),
            }
        }
        self.oversampling = factor;
    }

    /// Asks the loader threads to drain the promise queue without loading
    /// anything; the drained promises stay unfulfilled. Spins until a
    /// loader has acknowledged, so do not call this from the audio thread.
    pub fn empty_file_loading_queues(&self) {
        self.shared.empty_queue.store(true, Ordering::Release);
        while self.shared.empty_queue.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
    }

    /// Waits until every queued promise has been picked up and fully
    /// loaded.
    pub fn wait_for_background_loading(&self) {
        while self.shared.pending_loads.load(Ordering::Acquire) > 0
            || self.shared.threads_loading.load(Ordering::Acquire) > 0
        {
            spin_sleep::sleep(Duration::from_micros(100));
        }
    }

    /// Empties the queues and drops the whole cache.
    pub fn clear(&mut self) {
        self.empty_file_loading_queues();
        self.preloaded.clear();
        self.temporary_promises.clear();
        self.promises_to_clean.clear();
    }

    #[cfg(test)]
    pub(crate) fn preloaded_buffer(&self, filename: &str) -> Option<Arc<AudioBuffer<f32>>> {
        self.preloaded
            .get(filename)
            .map(|entry| entry.preloaded_data.clone())
    }

    #[cfg(test)]
    pub(crate) fn temporary_promise_count(&self) -> usize {
        self.temporary_promises.len()
    }
}

impl Drop for FilePool {
    fn drop(&mut self) {
        self.shared.quit.store(true, Ordering::Release);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for FilePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePool")
            .field("preloaded_samples", &self.preloaded.len())
            .field("preload_size", &self.preload_size)
            .field("oversampling", &self.oversampling)
            .finish()
    }
}

/// Opens a file and computes how many frames a preload should read.
fn probe_frames_to_load(
    root: &Path,
    filename: &str,
    preload_size: u32,
    max_offset: u32,
) -> Result<u32, FilePoolError> {
    let file = root.join(filename);
    if !file.exists() {
        return Err(FilePoolError::MissingFile(file));
    }
    let reader = SampleReader::open(&file)?;
    if reader.channels() == 0 || reader.channels() > 2 {
        return Err(FilePoolError::UnsupportedChannelCount(
            file,
            reader.channels(),
        ));
    }

    let frames = reader.num_frames();
    if preload_size == 0 {
        Ok(frames)
    } else {
        Ok(frames.min(preload_size.saturating_add(max_offset)))
    }
}

/// Reads up to `frames` frames of a file and applies the oversampling
/// factor. Returns the buffer and the file's native sample rate.
fn read_from_file(
    root: &Path,
    filename: &str,
    frames: u32,
    factor: Oversampling,
) -> Result<(AudioBuffer<f32>, u32), FilePoolError> {
    let file = root.join(filename);
    if !file.exists() {
        return Err(FilePoolError::MissingFile(file));
    }
    let mut reader = SampleReader::open(&file)?;
    if reader.channels() == 0 || reader.channels() > 2 {
        return Err(FilePoolError::UnsupportedChannelCount(
            file,
            reader.channels(),
        ));
    }

    let buffer = reader.read_frames(frames)?;
    let buffer = upsample(&buffer, factor)?;
    Ok((buffer, reader.sample_rate()))
}

/// The background loader loop. Dequeues promises, reads their full file
/// data, and hands the filled promises back for collection.
fn loading_thread(
    shared: Arc<LoaderShared>,
    promise_rx: Receiver<Arc<FilePromise>>,
    filled_tx: Sender<Arc<FilePromise>>,
) {
    loop {
        if shared.quit.load(Ordering::Acquire) {
            return;
        }

        if shared.empty_queue.load(Ordering::Acquire) {
            while promise_rx.try_recv().is_ok() {
                shared.pending_loads.fetch_sub(1, Ordering::AcqRel);
            }
            shared.empty_queue.store(false, Ordering::Release);
            continue;
        }

        let promise = match promise_rx.recv_timeout(LOADER_DEQUEUE_TIMEOUT) {
            Ok(promise) => promise,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => return,
        };

        shared.threads_loading.fetch_add(1, Ordering::AcqRel);

        // A count of one means the voice has already abandoned the
        // promise; skip the load and let it be collected.
        if Arc::strong_count(&promise) > 1 {
            let root = shared.root_directory.read().clone();
            match read_from_file(&root, promise.filename(), u32::MAX, promise.oversampling()) {
                Ok((buffer, _)) => {
                    debug!(filename = promise.filename(), "Loaded file in the background");
                    let _ = promise.file_data.set(buffer);
                    promise.data_ready.store(true, Ordering::Release);
                }
                Err(error) => {
                    warn!(
                        filename = promise.filename(),
                        error = %error,
                        "Background load failed; voice stays on preloaded data"
                    );
                }
            }
        }

        // Hand the promise to the filled queue for collection, retrying
        // while the audio thread catches up on cleanup.
        let mut promise = promise;
        loop {
            match filled_tx.try_send(promise) {
                Ok(()) => break,
                Err(TrySendError::Full(returned)) => {
                    if shared.quit.load(Ordering::Acquire) {
                        break;
                    }
                    promise = returned;
                    thread::sleep(Duration::from_millis(1));
                }
                Err(TrySendError::Disconnected(_)) => break,
            }
        }

        shared.pending_loads.fetch_sub(1, Ordering::AcqRel);
        shared.threads_loading.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{append_smpl_chunk, write_wav};
    use tempfile::tempdir;

    fn test_config() -> EngineConfig {
        EngineConfig::default()
    }

    fn write_ramp(dir: &Path, name: &str, frames: usize, sample_rate: u32) {
        let samples: Vec<f32> = (0..frames).map(|i| i as f32).collect();
        write_wav(dir.join(name), vec![samples], sample_rate).unwrap();
    }

    #[test]
    fn test_file_information() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 1000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());

        let information = pool.get_file_information("ramp.wav").unwrap();
        assert_eq!(information.end, 1000);
        assert_eq!(information.sample_rate, 44100.0);
        assert_eq!(information.num_channels, 1);
        assert_eq!(information.loop_begin, 0);
        assert_eq!(information.loop_end, u32::MAX);

        assert!(pool.get_file_information("missing.wav").is_none());
    }

    #[test]
    fn test_file_information_with_loop() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "looped.wav", 1000, 44100);
        append_smpl_chunk(&tempdir.path().join("looped.wav"), 400, 800).unwrap();

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());

        let information = pool.get_file_information("looped.wav").unwrap();
        assert_eq!(information.loop_begin, 400);
        assert_eq!(information.loop_end, 800);
    }

    #[test]
    fn test_unsupported_channel_count() {
        let tempdir = tempdir().unwrap();
        write_wav(
            tempdir.path().join("quad.wav"),
            vec![vec![0.0f32; 10]; 4],
            44100,
        )
        .unwrap();

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());

        assert!(pool.get_file_information("quad.wav").is_none());
        assert!(!pool.preload_file("quad.wav", 0));
    }

    #[test]
    fn test_preload_missing_file() {
        let tempdir = tempdir().unwrap();
        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(!pool.preload_file("missing.wav", 0));
        assert_eq!(pool.num_preloaded_samples(), 0);
    }

    #[test]
    fn test_preload_caps_at_preload_size() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "long.wav", 100_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());

        assert!(pool.preload_file("long.wav", 0));
        let buffer = pool.preloaded_buffer("long.wav").unwrap();
        assert_eq!(buffer.num_frames() as u32, pool.preload_size());
    }

    #[test]
    fn test_preload_size_zero_loads_whole_files() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "short.wav", 5000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        pool.set_preload_size(0);

        assert!(pool.preload_file("short.wav", 0));
        let buffer = pool.preloaded_buffer("short.wav").unwrap();
        assert_eq!(buffer.num_frames(), 5000);
    }

    #[test]
    fn test_preload_is_idempotent() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 50_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());

        assert!(pool.preload_file("ramp.wav", 128));
        let first = pool.preloaded_buffer("ramp.wav").unwrap();

        // Same or smaller request keeps the same buffer.
        assert!(pool.preload_file("ramp.wav", 128));
        let second = pool.preloaded_buffer("ramp.wav").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(pool.preload_file("ramp.wav", 64));
        let third = pool.preloaded_buffer("ramp.wav").unwrap();
        assert!(Arc::ptr_eq(&first, &third));

        // A larger offset needs a bigger head.
        assert!(pool.preload_file("ramp.wav", 4096));
        let fourth = pool.preloaded_buffer("ramp.wav").unwrap();
        assert!(!Arc::ptr_eq(&first, &fourth));
        assert_eq!(
            fourth.num_frames() as u32,
            pool.preload_size() + 4096
        );
    }

    #[test]
    fn test_promise_carries_preloaded_head() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 1000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(pool.preload_file("ramp.wav", 0));

        let promise = pool.get_promise("ramp.wav");
        assert_eq!(promise.filename(), "ramp.wav");
        assert!(promise.preloaded_data().is_some());
        assert_eq!(promise.sample_rate(), 44100.0);
    }

    #[test]
    fn test_promise_upgrade_to_full_data() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 50_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(pool.preload_file("ramp.wav", 0));

        let promise = pool.get_promise("ramp.wav");
        pool.wait_for_background_loading();

        assert!(promise.data_ready());
        let full = promise.file_data().unwrap();
        assert_eq!(full.num_frames(), 50_000);
        // The full read picks up where the preload only had the head.
        assert_eq!(full.channel(0)[49_999], 49_999.0);
    }

    #[test]
    fn test_oversampled_promise_frame_count() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 10_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        pool.set_oversampling_factor(Oversampling::X2);
        assert!(pool.preload_file("ramp.wav", 0));

        let promise = pool.get_promise("ramp.wav");
        assert_eq!(promise.sample_rate(), 88200.0);

        pool.wait_for_background_loading();
        assert!(promise.data_ready());
        assert_eq!(promise.file_data().unwrap().num_frames(), 20_000);
    }

    #[test]
    fn test_missing_sample_gives_empty_promise() {
        let pool = FilePool::new(&test_config());
        let promise = pool.get_promise("never-preloaded.wav");
        assert!(promise.preloaded_data().is_none());
        assert!(!promise.data_ready());
        assert!(promise.file_data().is_none());
    }

    #[test]
    fn test_cleanup_collects_dropped_promises() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 10_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(pool.preload_file("ramp.wav", 0));

        let promise = pool.get_promise("ramp.wav");
        pool.wait_for_background_loading();

        // While the voice holds the promise it must survive cleanup.
        pool.cleanup_promises();
        assert_eq!(pool.temporary_promise_count(), 1);

        drop(promise);
        pool.cleanup_promises();
        assert_eq!(pool.temporary_promise_count(), 0);

        // The next call destroys the retired entries.
        pool.cleanup_promises();
    }

    #[test]
    fn test_cancelled_promise_is_still_collected() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 10_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(pool.preload_file("ramp.wav", 0));

        // Drop the handle immediately, as a voice reset would.
        drop(pool.get_promise("ramp.wav"));

        pool.wait_for_background_loading();
        pool.cleanup_promises();
        pool.cleanup_promises();
        assert_eq!(pool.temporary_promise_count(), 0);
    }

    #[test]
    fn test_set_oversampling_factor_is_idempotent() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 10_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        pool.set_oversampling_factor(Oversampling::X2);
        assert!(pool.preload_file("ramp.wav", 0));

        let first = pool.preloaded_buffer("ramp.wav").unwrap();
        pool.set_oversampling_factor(Oversampling::X2);
        let second = pool.preloaded_buffer("ramp.wav").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // An actual change reloads and rescales.
        pool.set_oversampling_factor(Oversampling::X1);
        let third = pool.preloaded_buffer("ramp.wav").unwrap();
        assert!(!Arc::ptr_eq(&first, &third));

        let promise = pool.get_promise("ramp.wav");
        assert_eq!(promise.sample_rate(), 44100.0);
        pool.wait_for_background_loading();
    }

    #[test]
    fn test_empty_file_loading_queues() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 10_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(pool.preload_file("ramp.wav", 0));

        pool.empty_file_loading_queues();
        pool.wait_for_background_loading();
    }

    #[test]
    fn test_clear() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 1000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(pool.preload_file("ramp.wav", 0));
        assert_eq!(pool.num_preloaded_samples(), 1);

        pool.clear();
        assert_eq!(pool.num_preloaded_samples(), 0);
    }

    #[test]
    fn test_preload_records_offset_for_resize() {
        let tempdir = tempdir().unwrap();
        write_ramp(tempdir.path(), "ramp.wav", 100_000, 44100);

        let mut pool = FilePool::new(&test_config());
        pool.set_root_directory(tempdir.path());
        assert!(pool.preload_file("ramp.wav", 2000));

        // Shrinking the preload size recomputes from the recorded offset,
        // not from the previous buffer length.
        pool.set_preload_size(1024);
        let buffer = pool.preloaded_buffer("ramp.wav").unwrap();
        assert_eq!(buffer.num_frames(), 1024 + 2000);

        pool.set_preload_size(4096);
        let buffer = pool.preloaded_buffer("ramp.wav").unwrap();
        assert_eq!(buffer.num_frames(), 4096 + 2000);
    }
}
