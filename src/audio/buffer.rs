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

//! Owned planar sample storage.
//!
//! Buffers are frozen after creation: the loaders build them, wrap them in
//! an `Arc`, and from then on any number of voices may read them
//! concurrently.

use crate::audio::view::AudioView;

/// Frames of silence appended to every channel. Linear interpolation may
/// read one frame past any valid index and must land on silence when a
/// sample runs out.
const GUARD_FRAMES: usize = 1;

/// A multi-channel audio buffer stored one contiguous slice per channel.
#[derive(Clone, Debug, Default)]
pub struct AudioBuffer<T> {
    channels: Vec<Vec<T>>,
    num_frames: usize,
}

impl<T: Copy + Default> AudioBuffer<T> {
    /// Creates a zero-filled buffer.
    pub fn new(num_channels: usize, num_frames: usize) -> Self {
        Self {
            channels: vec![vec![T::default(); num_frames + GUARD_FRAMES]; num_channels],
            num_frames,
        }
    }

    /// Creates a buffer from planar channel data. All channels must have
    /// the same length; in release builds extra samples are dropped down
    /// to the shortest channel.
    pub fn from_planar(mut channels: Vec<Vec<T>>) -> Self {
        let num_frames = channels.iter().map(Vec::len).min().unwrap_or(0);
        for channel in channels.iter_mut() {
            debug_assert_eq!(channel.len(), num_frames);
            channel.truncate(num_frames);
            channel.extend(std::iter::repeat(T::default()).take(GUARD_FRAMES));
        }
        Self {
            channels,
            num_frames,
        }
    }

    /// Gets the number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Gets the number of frames, excluding the interpolation guard.
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Gets one channel's samples. The returned slice includes the
    /// trailing guard frames, so it is one element longer than
    /// `num_frames`.
    pub fn channel(&self, index: usize) -> &[T] {
        &self.channels[index]
    }

    /// Gets a read view over the buffer. The view's channel slices keep
    /// the guard frames so interpolating readers can run off the end by
    /// one sample.
    pub fn view(&self) -> AudioView<'_, T> {
        AudioView::from_buffer(self)
    }

    /// Memory used by the sample data, in bytes.
    pub fn memory_size(&self) -> usize {
        self.channels.iter().map(Vec::len).sum::<usize>() * std::mem::size_of::<T>()
    }
}
