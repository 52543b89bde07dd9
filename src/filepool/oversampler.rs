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

//! Load-time oversampling of sample data.
//!
//! Samples can be upsampled ×2/×4/×8 when they are read from disk so that
//! the voices' linear interpolation aliases less under pitch shifting.
//! This runs on preload and on the background loader threads, never on
//! the audio thread.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use serde::{Deserialize, Serialize};

use super::FilePoolError;
use crate::audio::buffer::AudioBuffer;

/// Input block size fed to the sinc resampler.
const INPUT_BLOCK_SIZE: usize = 1024;

/// Oversampling factor applied to sample data at load time. The stored
/// sample rate scales with it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Oversampling {
    #[default]
    X1,
    X2,
    X4,
    X8,
}

impl Oversampling {
    /// The factor as a plain integer.
    pub fn factor(self) -> u32 {
        match self {
            Oversampling::X1 => 1,
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
            Oversampling::X8 => 8,
        }
    }
}

/// Upsamples a whole buffer by the given factor. The output holds exactly
/// `input_frames * factor` frames; the resampler's transient delay is
/// trimmed so frame 0 of the output aligns with frame 0 of the input.
pub fn upsample(
    buffer: &AudioBuffer<f32>,
    factor: Oversampling,
) -> Result<AudioBuffer<f32>, FilePoolError> {
    if factor == Oversampling::X1 || buffer.num_channels() == 0 || buffer.num_frames() == 0 {
        return Ok(buffer.clone());
    }

    let channels = buffer.num_channels();
    let expected = buffer.num_frames() * factor.factor() as usize;

    let parameters = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        oversampling_factor: 128,
        interpolation: SincInterpolationType::Linear,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(factor.factor()),
        1.0,
        parameters,
        INPUT_BLOCK_SIZE,
        channels,
    )
    .map_err(|_| FilePoolError::OversamplingFailed(factor.factor()))?;

    let delay = resampler.output_delay();
    let mut produced: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];
    let mut scratch: Vec<Vec<f32>> = vec![vec![0.0; INPUT_BLOCK_SIZE]; channels];
    let mut position = 0;

    // Keep feeding input, then zeros, until the transient delay plus the
    // full output length has come out the other side.
    while produced[0].len() < expected + delay {
        let needed = resampler.input_frames_next();
        for (channel, input) in scratch.iter_mut().enumerate() {
            input.clear();
            let source = &buffer.channel(channel)[..buffer.num_frames()];
            let available = source.len().saturating_sub(position).min(needed);
            input.extend_from_slice(&source[position..position + available]);
            input.resize(needed, 0.0);
        }
        position += needed;

        let output = resampler
            .process(&scratch, None)
            .map_err(|_| FilePoolError::OversamplingFailed(factor.factor()))?;
        for (channel, data) in output.into_iter().enumerate() {
            produced[channel].extend_from_slice(&data);
        }
    }

    let trimmed = produced
        .into_iter()
        .map(|channel| channel[delay..delay + expected].to_vec())
        .collect();
    Ok(AudioBuffer::from_planar(trimmed))
}
