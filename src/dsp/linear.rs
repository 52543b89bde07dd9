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

//! Single-channel linear ramp generator driven by within-block events.

use std::ops::{Add, Mul, Sub};

use crate::config::MAX_EVENTS_PER_BLOCK;

/// A value generator that ramps linearly towards targets scheduled at
/// sample offsets inside the current block. Between blocks the last value
/// persists.
///
/// The event queue has a fixed capacity so registering events never
/// allocates; past capacity the newest registration replaces the previous
/// one.
#[derive(Clone, Debug)]
pub struct LinearEnvelope<T> {
    current: T,
    events: Vec<(usize, T)>,
}

impl<T> LinearEnvelope<T>
where
    T: Copy + Default + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    /// Creates an envelope holding the default value.
    pub fn new() -> Self {
        Self {
            current: T::default(),
            events: Vec::with_capacity(MAX_EVENTS_PER_BLOCK),
        }
    }

    /// Sets the current value and discards all pending events.
    pub fn reset(&mut self, value: T) {
        self.current = value;
        self.events.clear();
    }

    /// Gets the value the envelope is currently resting at.
    pub fn value(&self) -> T {
        self.current
    }

    /// Schedules `target` to be reached at `sample_offset` within the next
    /// rendered block. Offsets at or past the block length are clamped to
    /// the final sample; when two events share an offset the later
    /// registration wins.
    pub fn register_event(&mut self, sample_offset: usize, target: T) {
        if self.events.len() == self.events.capacity() {
            if let Some(last) = self.events.last_mut() {
                *last = (sample_offset, target);
            }
            return;
        }
        self.events.push((sample_offset, target));
    }

    /// Fills `output` with one block of values, ramping linearly between
    /// the scheduled targets. The queue is drained.
    pub fn get_block(&mut self, output: &mut [T]) {
        if output.is_empty() {
            return;
        }

        if self.events.is_empty() {
            output.fill(self.current);
            return;
        }

        let last = output.len() - 1;
        for event in self.events.iter_mut() {
            event.0 = event.0.min(last);
        }
        self.events.sort_by_key(|event| event.0);

        // Keep only the latest event per offset; the stable sort left them
        // in registration order.
        let mut index = 0;
        while index + 1 < self.events.len() {
            if self.events[index].0 == self.events[index + 1].0 {
                self.events.remove(index);
            } else {
                index += 1;
            }
        }

        // The persisted value sits one sample before the block.
        let mut previous_index: isize = -1;
        let mut previous_value = self.current;
        for &(offset, target) in self.events.iter() {
            let span = (offset as isize - previous_index) as usize;
            for step in 1..=span {
                let t = step as f32 / span as f32;
                let position = (previous_index + step as isize) as usize;
                output[position] = previous_value + (target - previous_value) * t;
            }
            previous_index = offset as isize;
            previous_value = target;
        }

        for sample in output.iter_mut().skip((previous_index + 1) as usize) {
            *sample = previous_value;
        }

        self.current = previous_value;
        self.events.clear();
    }
}

impl<T> Default for LinearEnvelope<T>
where
    T: Copy + Default + Add<Output = T> + Sub<Output = T> + Mul<f32, Output = T>,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_block_eq(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (index, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            assert!(
                (a - e).abs() < 1e-6,
                "sample {}: {} != {}",
                index,
                a,
                e
            );
        }
    }

    #[test]
    fn test_no_events_holds_value() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.reset(0.5);

        let mut output = [0.0f32; 4];
        envelope.get_block(&mut output);
        assert_block_eq(&output, &[0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_single_event_ramp() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.reset(0.0);
        envelope.register_event(3, 1.0);

        let mut output = [0.0f32; 8];
        envelope.get_block(&mut output);
        assert_block_eq(&output, &[0.25, 0.5, 0.75, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_event_at_offset_zero() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.reset(0.0);
        envelope.register_event(0, 1.0);

        let mut output = [0.0f32; 4];
        envelope.get_block(&mut output);
        assert_block_eq(&output, &[1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_same_offset_later_wins() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.reset(0.0);
        envelope.register_event(1, 10.0);
        envelope.register_event(1, 2.0);

        let mut output = [0.0f32; 4];
        envelope.get_block(&mut output);
        assert_block_eq(&output, &[1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_successive_events() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.reset(0.0);
        envelope.register_event(1, 1.0);
        envelope.register_event(3, 0.0);

        let mut output = [0.0f32; 6];
        envelope.get_block(&mut output);
        assert_block_eq(&output, &[0.5, 1.0, 0.5, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_value_persists_between_blocks() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.reset(0.0);
        envelope.register_event(1, 0.8);

        let mut output = [0.0f32; 2];
        envelope.get_block(&mut output);

        // The queue was drained; the next block holds steady.
        envelope.get_block(&mut output);
        assert_block_eq(&output, &[0.8, 0.8]);
    }

    #[test]
    fn test_offset_past_block_is_clamped() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.reset(0.0);
        envelope.register_event(100, 1.0);

        let mut output = [0.0f32; 4];
        envelope.get_block(&mut output);
        assert!((output[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_discards_events() {
        let mut envelope = LinearEnvelope::<f32>::new();
        envelope.register_event(0, 1.0);
        envelope.reset(0.25);

        let mut output = [0.0f32; 2];
        envelope.get_block(&mut output);
        assert_block_eq(&output, &[0.25, 0.25]);
    }
}
