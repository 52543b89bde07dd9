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

//! Engine configuration and compile-time tuning constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::filepool::oversampler::Oversampling;

/// Number of output channels produced by the engine.
pub const NUM_CHANNELS: usize = 2;

/// Maximum number of channels in a source sample.
pub const MAX_CHANNELS: usize = 2;

/// Sample rate assumed before the host has called `set_sample_rate`.
pub const DEFAULT_SAMPLE_RATE: f32 = 48000.0;

/// Block size assumed before the host has called `set_samples_per_block`.
pub const DEFAULT_SAMPLES_PER_BLOCK: usize = 1024;

/// Number of rendered blocks over which a voice's power is averaged for
/// the stealing policy.
pub const POWER_HISTORY_LENGTH: usize = 16;

/// Maximum number of modulation events a linear envelope holds per block.
pub const MAX_EVENTS_PER_BLOCK: usize = 128;

/// How long loader threads block on the promise queue before rechecking
/// their control flags.
pub const LOADER_DEQUEUE_TIMEOUT: Duration = Duration::from_millis(50);

fn default_max_voices() -> usize {
    64
}

fn default_num_background_threads() -> usize {
    4
}

fn default_preload_size() -> u32 {
    8192
}

fn default_sustain_cc() -> u8 {
    64
}

fn default_half_cc_threshold() -> u8 {
    64
}

/// Host-tunable engine configuration.
///
/// All fields have sensible defaults, so a `{}` document deserializes to
/// the same thing as [`EngineConfig::default`].
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct EngineConfig {
    /// Maximum number of simultaneously sounding voices. Also sizes the
    /// file pool's lock-free queues.
    #[serde(default = "default_max_voices")]
    max_voices: usize,

    /// Number of background sample-loading threads.
    #[serde(default = "default_num_background_threads")]
    num_background_threads: usize,

    /// Number of frames preloaded per sample file. Zero preloads whole
    /// files.
    #[serde(default = "default_preload_size")]
    preload_size: u32,

    /// Oversampling factor applied to sample data at load time.
    #[serde(default)]
    oversampling: Oversampling,

    /// MIDI CC number of the sustain pedal.
    #[serde(default = "default_sustain_cc")]
    sustain_cc: u8,

    /// CC values at or above this threshold count as "pedal down".
    #[serde(default = "default_half_cc_threshold")]
    half_cc_threshold: u8,
}

impl EngineConfig {
    /// Gets the maximum number of voices.
    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    /// Gets the number of background loading threads.
    pub fn num_background_threads(&self) -> usize {
        self.num_background_threads
    }

    /// Gets the preload size in frames.
    pub fn preload_size(&self) -> u32 {
        self.preload_size
    }

    /// Gets the default oversampling factor.
    pub fn oversampling(&self) -> Oversampling {
        self.oversampling
    }

    /// Gets the sustain pedal CC number.
    pub fn sustain_cc(&self) -> u8 {
        self.sustain_cc
    }

    /// Gets the half-pedal threshold.
    pub fn half_cc_threshold(&self) -> u8 {
        self.half_cc_threshold
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_voices: default_max_voices(),
            num_background_threads: default_num_background_threads(),
            preload_size: default_preload_size(),
            oversampling: Oversampling::default(),
            sustain_cc: default_sustain_cc(),
            half_cc_threshold: default_half_cc_threshold(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_voices(), 64);
        assert_eq!(config.num_background_threads(), 4);
        assert_eq!(config.preload_size(), 8192);
        assert_eq!(config.oversampling(), Oversampling::X1);
        assert_eq!(config.sustain_cc(), 64);
        assert_eq!(config.half_cc_threshold(), 64);
    }
}
