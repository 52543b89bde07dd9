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

//! WAV sample reading for the preload cache and the background loaders.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use hound::WavReader;

use super::FilePoolError;
use crate::audio::buffer::AudioBuffer;

/// A WAV file opened for planar frame reading.
pub(crate) struct SampleReader {
    reader: WavReader<BufReader<File>>,
    channels: u16,
    sample_rate: u32,
    num_frames: u32,
    bits_per_sample: u16,
    sample_format: hound::SampleFormat,
}

impl SampleReader {
    /// Opens a WAV file.
    pub fn open(path: &Path) -> Result<Self, FilePoolError> {
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let num_frames = reader.duration();
        Ok(Self {
            reader,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            num_frames,
            bits_per_sample: spec.bits_per_sample,
            sample_format: spec.sample_format,
        })
    }

    /// Gets the channel count.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Gets the sample rate.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Gets the total frame count.
    pub fn num_frames(&self) -> u32 {
        self.num_frames
    }

    /// Reads up to `frames` frames from the start of the file into a
    /// planar buffer, converting integer formats to f32 in [-1, 1].
    pub fn read_frames(&mut self, frames: u32) -> Result<AudioBuffer<f32>, FilePoolError> {
        let channels = self.channels as usize;
        let frames = frames.min(self.num_frames) as usize;
        let samples_to_read = frames * channels;
        let mut planar: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];

        match self.sample_format {
            hound::SampleFormat::Float => {
                for (index, sample) in self
                    .reader
                    .samples::<f32>()
                    .take(samples_to_read)
                    .enumerate()
                {
                    planar[index % channels].push(sample?);
                }
            }
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (self.bits_per_sample - 1)) as f32;
                for (index, sample) in self
                    .reader
                    .samples::<i32>()
                    .take(samples_to_read)
                    .enumerate()
                {
                    planar[index % channels].push(sample? as f32 * scale);
                }
            }
        }

        // A truncated file can leave the last frame ragged.
        let shortest = planar.iter().map(Vec::len).min().unwrap_or(0);
        for channel in planar.iter_mut() {
            channel.truncate(shortest);
        }

        Ok(AudioBuffer::from_planar(planar))
    }
}

/// Instrument loop points found in a WAV `smpl` chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct LoopPoints {
    pub start: u32,
    pub end: u32,
}

/// Scans the RIFF chunks of a WAV file for a `smpl` chunk and returns the
/// first sampler loop, if any. hound does not expose this chunk, so the
/// scan walks the container directly.
pub(crate) fn read_loop_points(path: &Path) -> Option<LoopPoints> {
    let mut file = BufReader::new(File::open(path).ok()?);

    let mut header = [0u8; 12];
    file.read_exact(&mut header).ok()?;
    if &header[0..4] != b"RIFF" || &header[8..12] != b"WAVE" {
        return None;
    }

    loop {
        let mut chunk_header = [0u8; 8];
        if file.read_exact(&mut chunk_header).is_err() {
            return None;
        }
        let size = u32::from_le_bytes(chunk_header[4..8].try_into().ok()?);

        if &chunk_header[0..4] == b"smpl" {
            let mut data = vec![0u8; size as usize];
            file.read_exact(&mut data).ok()?;
            // Nine fixed u32 fields precede the loop records; each record
            // is six u32s with start/end at offsets 8 and 12.
            if data.len() < 60 {
                return None;
            }
            let loop_count = u32::from_le_bytes(data[28..32].try_into().ok()?);
            if loop_count == 0 {
                return None;
            }
            let start = u32::from_le_bytes(data[44..48].try_into().ok()?);
            let end = u32::from_le_bytes(data[48..52].try_into().ok()?);
            return Some(LoopPoints { start, end });
        }

        // Chunks are word-aligned.
        let skip = i64::from(size) + i64::from(size & 1);
        file.seek(SeekFrom::Current(skip)).ok()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{append_smpl_chunk, write_wav};
    use tempfile::tempdir;

    #[test]
    fn test_open_and_read() {
        let tempdir = tempdir().unwrap();
        let path = tempdir.path().join("mono.wav");
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        write_wav(path.clone(), vec![samples], 44100).unwrap();

        let mut reader = SampleReader::open(&path).unwrap();
        assert_eq!(reader.channels(), 1);
        assert_eq!(reader.sample_rate(), 44100);
        assert_eq!(reader.num_frames(), 100);

        let buffer = reader.read_frames(50).unwrap();
        assert_eq!(buffer.num_channels(), 1);
        assert_eq!(buffer.num_frames(), 50);
        assert!((buffer.channel(0)[10] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_read_stereo_deinterleaves() {
        let tempdir = tempdir().unwrap();
        let path = tempdir.path().join("stereo.wav");
        write_wav(
            path.clone(),
            vec![vec![1.0f32; 20], vec![-1.0f32; 20]],
            48000,
        )
        .unwrap();

        let mut reader = SampleReader::open(&path).unwrap();
        assert_eq!(reader.channels(), 2);

        let buffer = reader.read_frames(20).unwrap();
        assert_eq!(buffer.num_frames(), 20);
        assert!(buffer.channel(0)[..20].iter().all(|&s| s == 1.0));
        assert!(buffer.channel(1)[..20].iter().all(|&s| s == -1.0));
    }

    #[test]
    fn test_read_int_samples_are_scaled() {
        let tempdir = tempdir().unwrap();
        let path = tempdir.path().join("int.wav");
        let samples: Vec<i16> = vec![i16::MAX, 0, i16::MIN, 0];
        crate::testutil::write_wav_with_bits(path.clone(), vec![samples], 44100, 16).unwrap();

        let mut reader = SampleReader::open(&path).unwrap();
        let buffer = reader.read_frames(4).unwrap();
        assert!((buffer.channel(0)[0] - 1.0).abs() < 1e-3);
        assert_eq!(buffer.channel(0)[1], 0.0);
        assert!((buffer.channel(0)[2] + 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_missing_file() {
        assert!(SampleReader::open(Path::new("/nonexistent/file.wav")).is_err());
    }

    #[test]
    fn test_loop_points() {
        let tempdir = tempdir().unwrap();
        let path = tempdir.path().join("looped.wav");
        write_wav(path.clone(), vec![vec![0.0f32; 1000]], 44100).unwrap();

        // No smpl chunk yet.
        assert_eq!(read_loop_points(&path), None);

        append_smpl_chunk(&path, 400, 800).unwrap();
        assert_eq!(
            read_loop_points(&path),
            Some(LoopPoints {
                start: 400,
                end: 800
            })
        );
    }
}
