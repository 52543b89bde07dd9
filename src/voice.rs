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

//! The per-note render engine.
//!
//! A voice owns one sounding note: it plays back a region's sample (or
//! test tone) with pitch shifting, runs the amplitude ADSR and the
//! CC-driven modulation envelopes, and applies pan, width and position
//! processing into the host's output block. The synth above routes events
//! to voices and steals the quiet ones; everything here runs on the audio
//! thread and never allocates after `set_samples_per_block`.

use std::f32::consts::{FRAC_1_SQRT_2, TAU};
use std::sync::Arc;

use crate::audio::view::AudioViewMut;
use crate::config::{
    EngineConfig, DEFAULT_SAMPLES_PER_BLOCK, DEFAULT_SAMPLE_RATE, NUM_CHANNELS,
    POWER_HISTORY_LENGTH,
};
use crate::dsp::adsr::AdsrEnvelope;
use crate::dsp::linear::LinearEnvelope;
use crate::dsp::math::{
    clamp_volume_db, db_to_gain, midi_note_frequency, normalize_bipolar_percents, normalize_cc,
    normalize_percents, pan_angle,
};
use crate::dsp::power::PowerHistory;
use crate::filepool::FilePromise;
use crate::host::VoiceHost;
use crate::region::{LoopMode, Region, GENERATOR_SINE};

/// What started a voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerType {
    NoteOn,
    NoteOff,
    Cc,
}

/// Voice lifecycle. `Release` still renders; `Idle` means the voice can be
/// started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Idle,
    Playing,
    Release,
}

/// Where the rendered signal comes from.
#[derive(Clone)]
enum SampleSource {
    None,
    Generator,
    File(Arc<FilePromise>),
}

/// A per-note voice. The host keeps an array of these and drives them
/// from its audio callback.
pub struct Voice {
    state: State,
    region: Option<Arc<Region>>,
    source: SampleSource,
    note_is_off: bool,

    trigger_type: TriggerType,
    trigger_channel: u8,
    trigger_number: u8,
    trigger_value: u8,

    speed_ratio: f32,
    pitch_ratio: f32,
    base_volume_db: f32,
    base_gain: f32,
    base_pan: f32,
    base_position: f32,
    base_width: f32,
    base_frequency: f32,
    phase: f32,

    source_position: u32,
    float_position_offset: f32,
    initial_delay: u32,

    amplitude_envelope: LinearEnvelope<f32>,
    volume_envelope: LinearEnvelope<f32>,
    pan_envelope: LinearEnvelope<f32>,
    position_envelope: LinearEnvelope<f32>,
    width_envelope: LinearEnvelope<f32>,
    eg_envelope: AdsrEnvelope,

    power_history: PowerHistory,

    sample_rate: f32,
    samples_per_block: usize,
    sustain_cc: u8,
    half_cc_threshold: u8,
    /// Last seen sustain pedal value, snapshotted at start and tracked
    /// through `register_cc` so note-off handling needs no host lookup.
    sustain_value: u8,

    scratch1: Vec<f32>,
    scratch2: Vec<f32>,
    scratch3: Vec<f32>,
    indices: Vec<usize>,
}

impl Voice {
    /// Creates an idle voice.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            state: State::Idle,
            region: None,
            source: SampleSource::None,
            note_is_off: false,
            trigger_type: TriggerType::NoteOn,
            trigger_channel: 0,
            trigger_number: 0,
            trigger_value: 0,
            speed_ratio: 1.0,
            pitch_ratio: 1.0,
            base_volume_db: 0.0,
            base_gain: 1.0,
            base_pan: 0.0,
            base_position: 0.0,
            base_width: 0.0,
            base_frequency: 440.0,
            phase: 0.0,
            source_position: 0,
            float_position_offset: 0.0,
            initial_delay: 0,
            amplitude_envelope: LinearEnvelope::new(),
            volume_envelope: LinearEnvelope::new(),
            pan_envelope: LinearEnvelope::new(),
            position_envelope: LinearEnvelope::new(),
            width_envelope: LinearEnvelope::new(),
            eg_envelope: AdsrEnvelope::new(),
            power_history: PowerHistory::new(POWER_HISTORY_LENGTH),
            sample_rate: DEFAULT_SAMPLE_RATE,
            samples_per_block: DEFAULT_SAMPLES_PER_BLOCK,
            sustain_cc: config.sustain_cc(),
            half_cc_threshold: config.half_cc_threshold(),
            sustain_value: 0,
            scratch1: vec![0.0; DEFAULT_SAMPLES_PER_BLOCK],
            scratch2: vec![0.0; DEFAULT_SAMPLES_PER_BLOCK],
            scratch3: vec![0.0; DEFAULT_SAMPLES_PER_BLOCK],
            indices: vec![0; DEFAULT_SAMPLES_PER_BLOCK],
        }
    }

    /// Sets the output sample rate. All pitch math derives from this, so
    /// the host must keep it current.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Sets the expected block size (or an upper bound when the host's
    /// block size varies) and reallocates the scratch buffers. Not
    /// real-time safe.
    pub fn set_samples_per_block(&mut self, samples_per_block: usize) {
        self.samples_per_block = samples_per_block;
        self.scratch1.resize(samples_per_block, 0.0);
        self.scratch2.resize(samples_per_block, 0.0);
        self.scratch3.resize(samples_per_block, 0.0);
        self.indices.resize(samples_per_block, 0);
    }

    /// Gets the configured sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Gets the configured block size.
    pub fn samples_per_block(&self) -> usize {
        self.samples_per_block
    }

    /// Starts the voice on a region after `delay` output frames. The host
    /// must only call this on a voice that `is_free`.
    #[allow(clippy::too_many_arguments)]
    pub fn start_voice(
        &mut self,
        region: &Arc<Region>,
        delay: u32,
        channel: u8,
        number: u8,
        value: u8,
        trigger_type: TriggerType,
        host: &dyn VoiceHost,
    ) {
        debug_assert!(self.is_free());

        self.trigger_type = trigger_type;
        self.trigger_channel = channel;
        self.trigger_number = number;
        self.trigger_value = value;
        self.region = Some(region.clone());
        self.state = State::Playing;
        self.note_is_off = false;

        let midi = host.midi_state();
        self.sustain_value = midi.cc_value(self.sustain_cc);

        if region.is_generator() {
            self.source = SampleSource::Generator;
            self.speed_ratio = 1.0;
        } else {
            let promise = host.file_pool().get_promise(&region.sample);
            self.speed_ratio = promise.sample_rate() / self.sample_rate;
            self.source = SampleSource::File(promise);
        }
        self.pitch_ratio = region.base_pitch_variation(number, value);

        self.base_volume_db = region.base_volume_db(number);
        let mut volume_db = self.base_volume_db;
        if let Some(modulator) = &region.volume_cc {
            volume_db += normalize_cc(midi.cc_value(modulator.cc)) * modulator.depth;
        }
        self.volume_envelope
            .reset(db_to_gain(clamp_volume_db(volume_db)));

        self.base_gain = region.base_gain() * region.crossfade_gain(midi);
        if trigger_type != TriggerType::Cc {
            self.base_gain *= region.note_gain(number, value);
        }
        let mut gain = self.base_gain;
        if let Some(modulator) = &region.amplitude_cc {
            gain *= normalize_cc(midi.cc_value(modulator.cc)) * normalize_percents(modulator.depth);
        }
        self.amplitude_envelope.reset(gain);

        self.base_pan = normalize_bipolar_percents(region.pan);
        let mut pan = self.base_pan;
        if let Some(modulator) = &region.pan_cc {
            pan += normalize_cc(midi.cc_value(modulator.cc))
                * normalize_bipolar_percents(modulator.depth);
        }
        self.pan_envelope.reset(pan);

        self.base_position = normalize_bipolar_percents(region.position);
        let mut position = self.base_position;
        if let Some(modulator) = &region.position_cc {
            position += normalize_cc(midi.cc_value(modulator.cc))
                * normalize_bipolar_percents(modulator.depth);
        }
        self.position_envelope.reset(position);

        self.base_width = normalize_bipolar_percents(region.width);
        let mut width = self.base_width;
        if let Some(modulator) = &region.width_cc {
            width += normalize_cc(midi.cc_value(modulator.cc))
                * normalize_bipolar_percents(modulator.depth);
        }
        self.width_envelope.reset(width);

        let factor = match &self.source {
            SampleSource::File(promise) => promise.oversampling().factor(),
            _ => 1,
        };
        self.source_position = region.offset_frames(factor);
        self.float_position_offset = 0.0;
        self.phase = 0.0;
        self.initial_delay = delay + (region.delay * self.sample_rate).round() as u32;
        self.base_frequency = midi_note_frequency(number) * self.pitch_ratio;

        let eg = &region.amplitude_eg;
        let seconds_to_samples = |seconds: f32| (seconds * self.sample_rate) as u32;
        self.eg_envelope.reset(
            seconds_to_samples(eg.get_attack(midi, value)),
            seconds_to_samples(eg.get_release(midi, value)),
            normalize_percents(eg.get_sustain(midi, value)),
            self.initial_delay + seconds_to_samples(eg.get_delay(midi, value)),
            seconds_to_samples(eg.get_decay(midi, value)),
            seconds_to_samples(eg.get_hold(midi, value)),
            normalize_percents(eg.get_start(midi, value)),
        );
    }

    /// Registers a note-off. May latch on the sustain pedal or begin the
    /// release.
    pub fn register_note_off(&mut self, delay: u32, channel: u8, number: u8, _velocity: u8) {
        let region = match &self.region {
            Some(region) => region.clone(),
            None => return,
        };
        if self.state != State::Playing {
            return;
        }

        if self.trigger_number == number && self.trigger_channel == channel {
            self.note_is_off = true;

            if region.loop_mode == LoopMode::OneShot {
                return;
            }

            if !region.check_sustain || self.sustain_value < self.half_cc_threshold {
                self.release(delay);
            }
        }
    }

    /// Registers a CC event. Releases a sustained note when the pedal
    /// lifts and schedules new targets on the modulation envelopes.
    pub fn register_cc(&mut self, delay: u32, _channel: u8, cc_number: u8, cc_value: u8) {
        let region = match &self.region {
            Some(region) => region.clone(),
            None => return,
        };
        if self.state == State::Idle {
            return;
        }

        if cc_number == self.sustain_cc {
            self.sustain_value = cc_value;
            if region.check_sustain && self.note_is_off && cc_value < self.half_cc_threshold {
                self.release(delay);
            }
        }

        let delay = delay as usize;
        if let Some(modulator) = &region.amplitude_cc {
            if cc_number == modulator.cc {
                let gain =
                    self.base_gain * normalize_cc(cc_value) * normalize_percents(modulator.depth);
                self.amplitude_envelope.register_event(delay, gain);
            }
        }

        if let Some(modulator) = &region.volume_cc {
            if cc_number == modulator.cc {
                let volume_db =
                    clamp_volume_db(self.base_volume_db + normalize_cc(cc_value) * modulator.depth);
                self.volume_envelope
                    .register_event(delay, db_to_gain(volume_db));
            }
        }

        if let Some(modulator) = &region.pan_cc {
            if cc_number == modulator.cc {
                let pan = self.base_pan
                    + normalize_cc(cc_value) * normalize_bipolar_percents(modulator.depth);
                self.pan_envelope.register_event(delay, pan);
            }
        }

        if let Some(modulator) = &region.position_cc {
            if cc_number == modulator.cc {
                let position = self.base_position
                    + normalize_cc(cc_value) * normalize_bipolar_percents(modulator.depth);
                self.position_envelope.register_event(delay, position);
            }
        }

        if let Some(modulator) = &region.width_cc {
            if cc_number == modulator.cc {
                let width = self.base_width
                    + normalize_cc(cc_value) * normalize_bipolar_percents(modulator.depth);
                self.width_envelope.register_event(delay, width);
            }
        }
    }

    /// Accepted but unimplemented.
    pub fn register_pitch_wheel(&mut self, _delay: u32, _pitch: i32) {}

    /// Accepted but unimplemented.
    pub fn register_aftertouch(&mut self, _delay: u32, _aftertouch: u8) {}

    /// Accepted but unimplemented.
    pub fn register_tempo(&mut self, _delay: u32, _seconds_per_quarter: f32) {}

    /// Begins the release after `delay` frames. A voice whose envelope
    /// delay has not elapsed yet resets instead; it never became audible.
    pub fn release(&mut self, delay: u32) {
        if self.state != State::Playing {
            return;
        }

        if self.eg_envelope.remaining_delay() > delay.saturating_sub(self.initial_delay) {
            self.reset();
        } else {
            self.state = State::Release;
            self.eg_envelope.start_release(delay);
        }
    }

    /// Releases this voice if it was note-on triggered and its region is
    /// silenced by `group`. Returns whether it matched.
    pub fn check_off_group(&mut self, delay: u32, group: u32) -> bool {
        let region = match &self.region {
            Some(region) => region.clone(),
            None => return false,
        };

        if self.trigger_type == TriggerType::NoteOn && region.off_by == Some(group) {
            self.release(delay);
            return true;
        }

        false
    }

    /// Renders one block into the host's stereo output view.
    pub fn render_block(&mut self, output: &mut AudioViewMut<'_, f32>) {
        debug_assert!(output.num_frames() <= self.samples_per_block);
        debug_assert_eq!(output.num_channels(), NUM_CHANNELS);
        output.fill(0.0);

        let region = match &self.region {
            Some(region) => region.clone(),
            None => {
                self.power_history.push(0.0);
                return;
            }
        };
        if self.state == State::Idle {
            self.power_history.push(0.0);
            return;
        }

        let delay = (self.initial_delay as usize).min(output.num_frames());
        self.initial_delay -= delay as u32;

        let source = self.source.clone();
        {
            let mut delayed = output.subspan_from(delay);
            match &source {
                SampleSource::Generator => self.fill_with_generator(&region, &mut delayed),
                SampleSource::File(promise) => self.fill_with_data(&region, promise, &mut delayed),
                SampleSource::None => {}
            }
        }

        if region.is_stereo {
            self.process_stereo(output);
        } else {
            self.process_mono(output);
        }

        if !self.eg_envelope.is_smoothing() {
            self.reset();
        }

        self.power_history.push(output.mean_squared());
    }

    /// Resets the voice to idle, dropping its region and sample handles.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.region = None;
        self.source = SampleSource::None;
        self.source_position = 0;
        self.float_position_offset = 0.0;
        self.phase = 0.0;
        self.note_is_off = false;
    }

    /// True when the voice is idle and can be started.
    pub fn is_free(&self) -> bool {
        self.region.is_none()
    }

    /// True when the voice is releasing and may be stolen for a new note.
    pub fn can_be_stolen(&self) -> bool {
        self.state == State::Release
    }

    /// Average rendered power over the recent past; the stealing policy
    /// picks the quietest voice.
    pub fn mean_squared_average(&self) -> f32 {
        self.power_history.average()
    }

    /// Gets the note or CC number that started the voice.
    pub fn trigger_number(&self) -> u8 {
        self.trigger_number
    }

    /// Gets the channel that started the voice.
    pub fn trigger_channel(&self) -> u8 {
        self.trigger_channel
    }

    /// Gets the velocity or CC value that started the voice.
    pub fn trigger_value(&self) -> u8 {
        self.trigger_value
    }

    /// Gets what kind of event started the voice.
    pub fn trigger_type(&self) -> TriggerType {
        self.trigger_type
    }

    /// Gets the region being played, if any.
    pub fn region(&self) -> Option<&Arc<Region>> {
        self.region.as_ref()
    }

    /// Gets the integer source frame the voice will read next.
    pub fn source_position(&self) -> u32 {
        self.source_position
    }

    /// Pitched sample playback with linear interpolation, loop wrapping
    /// and end-of-sample handling.
    fn fill_with_data(
        &mut self,
        region: &Arc<Region>,
        promise: &Arc<FilePromise>,
        output: &mut AudioViewMut<'_, f32>,
    ) {
        let num_frames = output.num_frames().min(self.samples_per_block);
        if num_frames == 0 {
            return;
        }

        let preloaded = match promise.preloaded_data() {
            Some(preloaded) => preloaded,
            None => {
                // No sample was ever preloaded; stay silent and wind down.
                if self.state != State::Release {
                    self.release(0);
                }
                return;
            }
        };

        let factor = promise.oversampling().factor();
        // Never touch an in-flight load: stick with the preloaded head
        // until the loader has published, or forever if the head already
        // covers the playable range.
        let use_preloaded = region.can_use_preloaded_data(preloaded.num_frames() as u32, factor)
            || !promise.data_ready();
        let source = if use_preloaded {
            preloaded.as_ref()
        } else {
            promise.file_data().unwrap_or(preloaded.as_ref())
        };

        if source.num_frames() == 0 {
            if self.state != State::Release {
                self.release(0);
            }
            return;
        }

        let sample_end = (region.true_sample_end(factor).min(source.num_frames() as u32)
            as usize)
            .saturating_sub(1);
        let should_loop =
            region.should_loop() && region.loop_end(factor) as usize <= source.num_frames();
        let loop_offset = sample_end.saturating_sub(region.loop_start(factor) as usize);
        let jump = self.pitch_ratio * self.speed_ratio;

        let mut first_exhausted: Option<usize> = None;
        {
            let indices = &mut self.indices[..num_frames];
            let left_coeffs = &mut self.scratch2[..num_frames];
            let right_coeffs = &mut self.scratch3[..num_frames];

            let mut position = self.float_position_offset;
            for ((index, left), right) in indices
                .iter_mut()
                .zip(left_coeffs.iter_mut())
                .zip(right_coeffs.iter_mut())
            {
                *index = self.source_position as usize + position as usize;
                *right = position.fract();
                *left = 1.0 - *right;
                position += jump;
            }

            if should_loop {
                if loop_offset > 0 {
                    for start in 0..num_frames {
                        if indices[start] > sample_end {
                            for index in indices[start..].iter_mut() {
                                *index -= loop_offset;
                            }
                        }
                    }
                }
            } else {
                for (sample, index) in indices.iter_mut().enumerate() {
                    if *index > sample_end {
                        if first_exhausted.is_none() {
                            first_exhausted = Some(sample);
                        }
                        *index = sample_end;
                        left_coeffs[sample] = 0.0;
                        right_coeffs[sample] = 1.0;
                    }
                }
            }
        }

        {
            let indices = &self.indices[..num_frames];
            let left_coeffs = &self.scratch2[..num_frames];
            let right_coeffs = &self.scratch3[..num_frames];
            let channels = if source.num_channels() == 1 {
                1
            } else {
                output.num_channels().min(source.num_channels())
            };
            for channel in 0..channels {
                // Channel slices include the buffer's guard frame, so
                // reading index + 1 is always in bounds and lands on
                // silence at the very end.
                let data = source.channel(channel);
                let out = output.channel_mut(channel);
                for (((sample, &index), &left), &right) in
                    out.iter_mut().zip(indices).zip(left_coeffs).zip(right_coeffs)
                {
                    *sample = data[index] * left + data[index + 1] * right;
                }
            }
        }

        if first_exhausted.is_some() {
            self.source_position = sample_end as u32;
            self.float_position_offset = 1.0;
        } else {
            let mut next_offset = self.scratch3[num_frames - 1] + jump;
            let mut next_index = self.indices[num_frames - 1] + next_offset as usize;
            next_offset = next_offset.fract();
            if should_loop && loop_offset > 0 {
                while next_index > sample_end {
                    next_index -= loop_offset;
                }
            }
            self.source_position = next_index as u32;
            self.float_position_offset = next_offset;
        }

        if self.state != State::Release {
            if let Some(first) = first_exhausted {
                self.release(first as u32);
                output.subspan_from(first).fill(0.0);
            }
        }
    }

    /// Phase-accumulated sine test tone.
    fn fill_with_generator(&mut self, region: &Arc<Region>, output: &mut AudioViewMut<'_, f32>) {
        if region.sample != GENERATOR_SINE {
            return;
        }
        if output.num_frames() == 0 {
            return;
        }

        let step = self.base_frequency * TAU / self.sample_rate;
        let mut phase = self.phase;

        let (left, right) = output.split_stereo();
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let value = phase.sin();
            *l = value;
            *r = value;
            phase += step;
        }

        // Wrap so long notes don't lose precision.
        self.phase = phase.rem_euclid(TAU);
    }

    /// Envelope and pan processing for a one-channel source.
    fn process_mono(&mut self, output: &mut AudioViewMut<'_, f32>) {
        let num_frames = output.num_frames().min(self.samples_per_block);

        self.amplitude_envelope
            .get_block(&mut self.scratch1[..num_frames]);
        multiply(output.channel_mut(0), &self.scratch1[..num_frames]);

        self.eg_envelope.get_block(&mut self.scratch1[..num_frames]);
        multiply(output.channel_mut(0), &self.scratch1[..num_frames]);

        self.volume_envelope
            .get_block(&mut self.scratch1[..num_frames]);
        multiply(output.channel_mut(0), &self.scratch1[..num_frames]);

        {
            let (left, right) = output.split_stereo();
            right.copy_from_slice(left);
        }

        self.pan_envelope
            .get_block(&mut self.scratch1[..num_frames]);
        let pans = &self.scratch1[..num_frames];
        let (left, right) = output.split_stereo();
        for ((l, r), &pan) in left.iter_mut().zip(right.iter_mut()).zip(pans) {
            let theta = pan_angle(pan);
            *l *= theta.cos();
            *r *= theta.sin();
        }
    }

    /// Envelope, width and position processing for a two-channel source.
    fn process_stereo(&mut self, output: &mut AudioViewMut<'_, f32>) {
        let num_frames = output.num_frames().min(self.samples_per_block);

        self.amplitude_envelope
            .get_block(&mut self.scratch1[..num_frames]);
        output.apply_gain(&self.scratch1[..num_frames]);

        self.eg_envelope.get_block(&mut self.scratch1[..num_frames]);
        output.apply_gain(&self.scratch1[..num_frames]);

        self.volume_envelope
            .get_block(&mut self.scratch1[..num_frames]);
        output.apply_gain(&self.scratch1[..num_frames]);

        // Split left/right into side (channel 0) and mid (channel 1).
        {
            let (left, right) = output.split_stereo();
            for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                let side = (*l - *r) * FRAC_1_SQRT_2;
                let mid = (*l + *r) * FRAC_1_SQRT_2;
                *l = side;
                *r = mid;
            }
        }

        // Width: constant-power pan over the (side, mid) pair.
        self.width_envelope
            .get_block(&mut self.scratch1[..num_frames]);
        {
            let widths = &self.scratch1[..num_frames];
            let (left, right) = output.split_stereo();
            for ((l, r), &width) in left.iter_mut().zip(right.iter_mut()).zip(widths) {
                let theta = pan_angle(width);
                *l *= theta.cos();
                *r *= theta.sin();
            }
        }

        // Position: pan the side component into both outputs around the
        // mid, then rescale.
        self.position_envelope
            .get_block(&mut self.scratch1[..num_frames]);
        {
            let positions = &self.scratch1[..num_frames];
            let (left, right) = output.split_stereo();
            for ((l, r), &position) in left.iter_mut().zip(right.iter_mut()).zip(positions) {
                let theta = pan_angle(position);
                let side = *l;
                let mid = *r;
                *l = (mid + side * theta.cos()) * FRAC_1_SQRT_2;
                *r = (mid + side * theta.sin()) * FRAC_1_SQRT_2;
            }
        }
    }
}

/// Multiplies a channel elementwise by a block of gains.
fn multiply(samples: &mut [f32], gains: &[f32]) {
    for (sample, gain) in samples.iter_mut().zip(gains) {
        *sample *= *gain;
    }
}

impl std::fmt::Debug for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Voice")
            .field("state", &self.state)
            .field(
                "sample",
                &self.region.as_ref().map(|region| region.sample.as_str()),
            )
            .field("trigger_number", &self.trigger_number)
            .field("source_position", &self.source_position)
            .finish()
    }
}
