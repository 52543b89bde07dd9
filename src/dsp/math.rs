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

//! Conversions between the units SFZ instruments are written in (decibels,
//! cents, percents, 7-bit controller values) and linear gain or ratios.

use std::f32::consts::FRAC_PI_4;

/// Cents in one semitone.
pub const CENTS_PER_SEMITONE: f32 = 100.0;

/// Volume opcodes are clamped to this range, in dB.
pub const VOLUME_RANGE_DB: (f32, f32) = (-144.0, 6.0);

/// Converts a level in dB to a linear gain.
pub fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(0.05 * db)
}

/// Converts a pitch offset in cents to a playback-rate ratio.
pub fn cents_factor(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

/// Frequency of a MIDI note in Hz, equal temperament around A4 = 440 Hz.
pub fn midi_note_frequency(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((f32::from(note) - 69.0) / 12.0)
}

/// Maps a 7-bit controller value to [0, 1].
pub fn normalize_cc(value: u8) -> f32 {
    f32::from(value & 0x7f) / 127.0
}

/// Maps an SFZ percentage to [0, 1] gain.
pub fn normalize_percents(percents: f32) -> f32 {
    percents / 100.0
}

/// Maps a bipolar SFZ percentage (pan, position, width) to [-1, 1].
pub fn normalize_bipolar_percents(percents: f32) -> f32 {
    (percents / 100.0).clamp(-1.0, 1.0)
}

/// Clamps a volume in dB to the representable SFZ range.
pub fn clamp_volume_db(db: f32) -> f32 {
    db.clamp(VOLUME_RANGE_DB.0, VOLUME_RANGE_DB.1)
}

/// Angle of the constant-power pan law for a position in [-1, 1]. The
/// gains are `(cos, sin)` of this angle, which keeps `L² + R²` constant.
pub fn pan_angle(position: f32) -> f32 {
    (position + 1.0) * FRAC_PI_4
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_db_to_gain() {
        assert!((db_to_gain(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_gain(-6.0) - 0.501187).abs() < 1e-5);
        assert!((db_to_gain(6.0) - 1.995262).abs() < 1e-5);
    }

    #[test]
    fn test_cents_factor() {
        assert!((cents_factor(0.0) - 1.0).abs() < 1e-6);
        assert!((cents_factor(1200.0) - 2.0).abs() < 1e-6);
        assert!((cents_factor(-1200.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_midi_note_frequency() {
        assert!((midi_note_frequency(69) - 440.0).abs() < 1e-3);
        assert!((midi_note_frequency(57) - 220.0).abs() < 1e-3);
        assert!((midi_note_frequency(60) - 261.626).abs() < 1e-2);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_cc(0), 0.0);
        assert_eq!(normalize_cc(127), 1.0);
        assert_eq!(normalize_percents(100.0), 1.0);
        assert_eq!(normalize_bipolar_percents(-100.0), -1.0);
        assert_eq!(normalize_bipolar_percents(250.0), 1.0);
    }

    #[test]
    fn test_pan_angle() {
        assert!((pan_angle(-1.0)).abs() < 1e-6);
        assert!((pan_angle(1.0) - FRAC_PI_2).abs() < 1e-6);
        // Constant power at center.
        let theta = pan_angle(0.0);
        let power = theta.cos().powi(2) + theta.sin().powi(2);
        assert!((power - 1.0).abs() < 1e-6);
    }
}
