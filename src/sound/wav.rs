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
use std::path::Path;

use hound::{SampleFormat, WavReader};

use super::error::DecodeError;
use crate::backend::PcmFormat;

/// A WAV file decoded into bytes the backend accepts directly.
pub struct DecodedWav {
    pub pcm: Vec<u8>,
    pub format: PcmFormat,
    pub sample_rate: u32,
}

/// Decodes a mono or stereo WAV file. 8 and 16-bit integer data is passed
/// through; wider integer and 32-bit float data is reduced to 16 bits.
pub fn decode_wav<P: AsRef<Path>>(path: P) -> Result<DecodedWav, DecodeError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    if spec.channels != 1 && spec.channels != 2 {
        return Err(DecodeError::UnsupportedChannels(spec.channels));
    }
    if spec.sample_rate == 0 {
        return Err(DecodeError::ZeroSampleRate);
    }

    let (pcm, bits_per_sample) = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => {
            // Backend 8-bit data is unsigned.
            let pcm = reader
                .samples::<i8>()
                .map(|s| s.map(|s| (i16::from(s) + 128) as u8))
                .collect::<Result<Vec<u8>, hound::Error>>()?;
            (pcm, 8)
        }
        (SampleFormat::Int, 16) => {
            let mut pcm = Vec::with_capacity(reader.len() as usize * 2);
            for sample in reader.samples::<i16>() {
                pcm.extend_from_slice(&sample?.to_le_bytes());
            }
            (pcm, 16)
        }
        (SampleFormat::Int, bits @ 17..=32) => {
            let shift = bits - 16;
            let mut pcm = Vec::with_capacity(reader.len() as usize * 2);
            for sample in reader.samples::<i32>() {
                let reduced = (sample? >> shift) as i16;
                pcm.extend_from_slice(&reduced.to_le_bytes());
            }
            (pcm, 16)
        }
        (SampleFormat::Float, 32) => {
            let mut pcm = Vec::with_capacity(reader.len() as usize * 2);
            for sample in reader.samples::<f32>() {
                let reduced = (sample?.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
                pcm.extend_from_slice(&reduced.to_le_bytes());
            }
            (pcm, 16)
        }
        (format, bits) => return Err(DecodeError::UnsupportedFormat(bits, format)),
    };

    let format = PcmFormat::from_layout(spec.channels, bits_per_sample)
        .ok_or(DecodeError::UnsupportedChannels(spec.channels))?;

    Ok(DecodedWav {
        pcm,
        format,
        sample_rate: spec.sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{write_wav, write_wav_with_bits};

    #[test]
    fn test_decode_16_bit_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav_with_bits(path.clone(), vec![vec![0i16, 1, -1, i16::MAX]], 22050, 16).unwrap();

        let decoded = decode_wav(&path).unwrap();
        assert_eq!(decoded.format, PcmFormat::Mono16);
        assert_eq!(decoded.sample_rate, 22050);
        assert_eq!(decoded.pcm, vec![0, 0, 1, 0, 0xff, 0xff, 0xff, 0x7f]);
    }

    #[test]
    fn test_decode_float_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        write_wav(path.clone(), vec![vec![1.0f32, -1.0, 2.0, 0.0]], 44100).unwrap();

        let decoded = decode_wav(&path).unwrap();
        assert_eq!(decoded.format, PcmFormat::Mono16);
        let samples: Vec<i16> = decoded
            .pcm
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(samples, vec![i16::MAX, -i16::MAX, i16::MAX, 0]);
    }

    #[test]
    fn test_decode_32_bit_int_reduced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.wav");
        write_wav(path.clone(), vec![vec![1i32 << 16, -(1i32 << 20)]], 48000).unwrap();

        let decoded = decode_wav(&path).unwrap();
        assert_eq!(decoded.format, PcmFormat::Mono16);
        assert_eq!(decoded.pcm, vec![1, 0, 0xf0, 0xff]);
    }

    #[test]
    fn test_decode_rejects_surround() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surround.wav");
        write_wav_with_bits(path.clone(), vec![vec![0i16]; 6], 44100, 16).unwrap();

        assert!(matches!(
            decode_wav(&path),
            Err(DecodeError::UnsupportedChannels(6))
        ));
    }

    #[test]
    fn test_decode_8_bit_unsigned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("byte.wav");
        write_wav_with_bits(path.clone(), vec![vec![0i8, 127, -128, -1]], 8000, 8).unwrap();

        let decoded = decode_wav(&path).unwrap();
        assert_eq!(decoded.format, PcmFormat::Mono8);
        assert_eq!(decoded.pcm, vec![128, 255, 0, 127]);
    }

    #[test]
    fn test_decode_24_bit_reduced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.wav");
        write_wav_with_bits(path.clone(), vec![vec![0x0100i32, -0x0100, 0x7fffff]], 48000, 24)
            .unwrap();

        let decoded = decode_wav(&path).unwrap();
        assert_eq!(decoded.format, PcmFormat::Mono16);
        assert_eq!(decoded.pcm, vec![1, 0, 0xff, 0xff, 0xff, 0x7f]);
    }

    #[test]
    fn test_decode_zero_sample_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.wav");
        write_wav_with_bits(path.clone(), vec![vec![0i16; 4]], 44100, 16).unwrap();

        // Zero the sample rate and byte rate fields of the fmt chunk.
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[24..32].fill(0);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            decode_wav(&path),
            Err(DecodeError::ZeroSampleRate) | Err(DecodeError::Wav(_))
        ));
    }

    #[test]
    fn test_decode_missing_file() {
        assert!(matches!(
            decode_wav("/nonexistent/sound.wav"),
            Err(DecodeError::Wav(_))
        ));
    }

    #[test]
    fn test_decode_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        assert!(matches!(decode_wav(&path), Err(DecodeError::Wav(_))));
    }
}
