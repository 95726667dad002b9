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
use std::{
    any::TypeId,
    error::Error,
    fs::{self, File},
    path::{Path, PathBuf},
};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes a WAV file with 32-bit samples. `samples` holds one vector per
/// channel; channels must all be the same length.
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
    let file = File::create(path)?;

    let sample_format = if TypeId::of::<S>() == TypeId::of::<f32>() {
        SampleFormat::Float
    } else if TypeId::of::<S>() == TypeId::of::<i32>()
        || TypeId::of::<S>() == TypeId::of::<i16>()
        || TypeId::of::<S>() == TypeId::of::<i8>()
    {
        SampleFormat::Int
    } else {
        return Err("Unsupported sample format".into());
    };

    let channels = u16::try_from(samples.len())?;
    let frames = samples.first().map_or(0, Vec::len);
    if samples.iter().any(|channel| channel.len() != frames) {
        return Err("Channels differ in length".into());
    }

    let mut writer = WavWriter::new(
        file,
        WavSpec {
            channels,
            sample_rate,
            bits_per_sample,
            sample_format,
        },
    )?;

    // Interleaved, one frame at a time.
    for frame in 0..frames {
        for channel in &samples {
            writer.write_sample(channel[frame])?;
        }
    }
    writer.finalize()?;

    Ok(())
}

/// Populates `root` with short silent mono clips at the given relative paths,
/// creating parent folders as needed.
pub fn write_sfx_tree(root: &Path, names: &[&str]) -> Result<(), Box<dyn Error>> {
    for name in names {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // A tenth of a second at 1kHz.
        write_wav_with_bits(path, vec![vec![0i16; 100]], 1000, 16)?;
    }
    Ok(())
}
