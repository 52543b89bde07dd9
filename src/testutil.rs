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

use std::{error::Error, fs::File, io::Read, io::Write, path::Path, path::PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

pub fn write_wav<S: hound::Sample + Copy + 'static>(
    path: PathBuf,
    samples: Vec<Vec<S>>,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    write_wav_with_bits(path, samples, sample_rate, 32)
}

pub fn write_wav_with_bits<S: hound::Sample + Copy + 'static>(
    path: PathBuf,
    samples: Vec<Vec<S>>,
    sample_rate: u32,
    bits_per_sample: u16,
) -> Result<(), Box<dyn Error>> {
    let tempwav = File::create(path)?;

    // Determine sample format based on the type
    let sample_format = if std::any::TypeId::of::<S>() == std::any::TypeId::of::<f32>() {
        SampleFormat::Float
    } else if std::any::TypeId::of::<S>() == std::any::TypeId::of::<i32>()
        || std::any::TypeId::of::<S>() == std::any::TypeId::of::<i16>()
    {
        SampleFormat::Int
    } else {
        return Err("Unsupported sample format".into());
    };

    let num_channels = samples.len();
    assert!(num_channels <= u16::MAX.into(), "Too many channels!");
    let num_frames = samples.first().map(Vec::len).unwrap_or(0);
    let mut writer = WavWriter::new(
        tempwav,
        WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample,
            sample_format,
        },
    )?;

    // Interleave the planar channels frame by frame.
    for frame in 0..num_frames {
        for channel_samples in &samples {
            writer.write_sample(channel_samples[frame])?;
        }
    }
    writer.finalize()?;

    Ok(())
}

/// Appends a RIFF `smpl` chunk with one loop to an existing WAV file and
/// patches the RIFF size so readers accept it. hound cannot write sampler
/// metadata, so tests splice the chunk in by hand.
pub fn append_smpl_chunk(path: &Path, loop_start: u32, loop_end: u32) -> Result<(), Box<dyn Error>> {
    let mut bytes = Vec::new();
    File::open(path)?.read_to_end(&mut bytes)?;
    if bytes.len() < 8 {
        return Err("Not a RIFF file".into());
    }

    let mut chunk = Vec::with_capacity(68);
    chunk.extend_from_slice(b"smpl");
    chunk.extend_from_slice(&60u32.to_le_bytes());
    // Manufacturer through sampler data: seven zero fields around one
    // sample loop.
    for _ in 0..7 {
        chunk.extend_from_slice(&0u32.to_le_bytes());
    }
    chunk.extend_from_slice(&1u32.to_le_bytes()); // num_sample_loops
    chunk.extend_from_slice(&0u32.to_le_bytes()); // sampler_data
    chunk.extend_from_slice(&0u32.to_le_bytes()); // cue_point_id
    chunk.extend_from_slice(&0u32.to_le_bytes()); // type
    chunk.extend_from_slice(&loop_start.to_le_bytes());
    chunk.extend_from_slice(&loop_end.to_le_bytes());
    chunk.extend_from_slice(&0u32.to_le_bytes()); // fraction
    chunk.extend_from_slice(&0u32.to_le_bytes()); // play_count

    bytes.extend_from_slice(&chunk);
    let riff_size = (bytes.len() - 8) as u32;
    bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());

    File::create(path)?.write_all(&bytes)?;
    Ok(())
}
