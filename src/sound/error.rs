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
use std::path::PathBuf;

use crate::backend::BackendError;

/// Errors surfaced by sound loading and playback.
#[derive(Debug, thiserror::Error)]
pub enum SoundError {
    #[error("Failed to load sound {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("No free source available ({0} in pool)")]
    PoolExhausted(usize),

    #[error("Sound not found: {0}")]
    NotFound(String),

    #[error("No sound bound to source")]
    NotBound,
}

/// Errors from turning a WAV file into PCM.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported channel count {0}, expected mono or stereo")]
    UnsupportedChannels(u16),

    #[error("Unsupported sample format: {0} bits {1:?}")]
    UnsupportedFormat(u16, hound::SampleFormat),

    #[error("Invalid sample rate of zero")]
    ZeroSampleRate,
}
