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

//! Loaded sounds.
//!
//! A sound is decoded once and uploaded into a backend buffer. It is shared
//! through an `Arc` so any number of sources can play it at the same time; the
//! buffer is released when the last reference goes away.

use std::{fmt, path::Path, sync::Arc, time::Duration};

use tracing::info;

use super::context::Context;
use super::error::SoundError;
use super::wav::decode_wav;
use crate::backend::BufferId;

/// A sound shared between the cache and the sources playing it.
pub type SoundRef = Arc<Sound>;

/// Immutable audio data resident in the backend. Not `Clone`: the buffer has
/// exactly one release point, in `Drop`.
pub struct Sound {
    debug_name: String,
    buffer: BufferId,
    size_bytes: usize,
    duration: Duration,
    context: Arc<Context>,
}

impl Sound {
    /// Decodes the WAV file at `path` and uploads it to the backend.
    pub fn load(
        context: &Arc<Context>,
        path: &Path,
        debug_name: &str,
    ) -> Result<Sound, SoundError> {
        let decoded = decode_wav(path).map_err(|source| SoundError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let buffer =
            context
                .backend()
                .create_buffer(&decoded.pcm, decoded.format, decoded.sample_rate)?;

        let frames = decoded.pcm.len() / decoded.format.bytes_per_frame();
        let duration =
            Duration::try_from_secs_f64(frames as f64 / f64::from(decoded.sample_rate))
                .unwrap_or(Duration::ZERO);

        let sound = Sound {
            debug_name: debug_name.to_string(),
            buffer,
            size_bytes: decoded.pcm.len(),
            duration,
            context: Arc::clone(context),
        };

        info!(
            name = debug_name,
            format = ?decoded.format,
            sample_rate = decoded.sample_rate,
            duration_ms = duration.as_millis() as u64,
            memory_kb = sound.size_bytes / 1024,
            "Sound loaded"
        );

        Ok(sound)
    }

    /// Backend memory used by this sound.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn name(&self) -> &str {
        &self.debug_name
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }
}

impl Drop for Sound {
    fn drop(&mut self) {
        self.context.backend().delete_buffer(self.buffer);
        self.context.check("delete_buffer");
    }
}

impl fmt::Debug for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sound")
            .field("name", &self.debug_name)
            .field("buffer", &self.buffer)
            .field("size_bytes", &self.size_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{mock, BackendError};
    use crate::testutil::write_wav_with_bits;

    fn context(backend: &Arc<mock::Backend>) -> Arc<Context> {
        Arc::new(Context::new(backend.clone()))
    }

    #[test]
    fn test_load_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beep.wav");
        write_wav_with_bits(path.clone(), vec![vec![0i16; 4410]], 44100, 16).unwrap();

        let backend = Arc::new(mock::Backend::new("mock", 4));
        let sound = Sound::load(&context(&backend), &path, "beep.wav").unwrap();
        assert_eq!(sound.size_bytes(), 8820);
        assert_eq!(sound.name(), "beep.wav");
        assert_eq!(sound.duration(), Duration::from_millis(100));
        assert_eq!(backend.live_buffers(), 1);

        drop(sound);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_load_error() {
        let backend = Arc::new(mock::Backend::new("mock", 4));
        let result = Sound::load(&context(&backend), Path::new("/missing.wav"), "missing");
        assert!(matches!(result, Err(SoundError::Load { .. })));
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_upload_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beep.wav");
        write_wav_with_bits(path.clone(), vec![vec![0i16; 16]], 44100, 16).unwrap();

        let backend = Arc::new(mock::Backend::new("mock", 4));
        backend.fail_next_upload();
        let result = Sound::load(&context(&backend), &path, "beep.wav");
        assert!(matches!(
            result,
            Err(SoundError::Backend(BackendError::OutOfMemory))
        ));
    }
}
