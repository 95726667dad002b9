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
use std::{collections::HashMap, fmt, num::NonZeroU32, time::Duration};

use glam::Vec3;
use parking_lot::Mutex;
use tracing::debug;

use super::{
    BackendError, BufferId, DeviceString, DistanceModel, ListenerVector, PcmFormat, SourceFlag,
    SourceId, SourceParam, SourceState, SourceVector,
};

const DEFAULT_DOPPLER_VELOCITY: f32 = 344.0;
const DEFAULT_DOPPLER_FACTOR: f32 = 1.0;

struct BufferData {
    frames: usize,
    sample_rate: u32,
}

struct SourceData {
    buffer: Option<BufferId>,
    state: SourceState,
    /// Playback position in frames.
    cursor: usize,
    params: HashMap<SourceParam, f32>,
    vectors: HashMap<SourceVector, Vec3>,
    flags: HashMap<SourceFlag, bool>,
}

impl SourceData {
    fn new() -> SourceData {
        SourceData {
            buffer: None,
            state: SourceState::Initial,
            cursor: 0,
            params: SourceParam::ALL
                .iter()
                .map(|param| (*param, param.default_value()))
                .collect(),
            vectors: HashMap::new(),
            flags: HashMap::new(),
        }
    }
}

struct ListenerData {
    position: Vec3,
    velocity: Vec3,
    forward: Vec3,
    up: Vec3,
    gain: f32,
}

struct State {
    next_id: u32,
    buffers: HashMap<BufferId, BufferData>,
    sources: HashMap<SourceId, SourceData>,
    listener: ListenerData,
    doppler_velocity: f32,
    doppler_factor: f32,
    distance_model: DistanceModel,
    /// First unreported error. Later errors are dropped until this is drained.
    error: Option<BackendError>,
    fail_next_upload: bool,
    uploads: usize,
}

impl State {
    fn next_id(&mut self) -> NonZeroU32 {
        self.next_id += 1;
        NonZeroU32::new(self.next_id).unwrap_or(NonZeroU32::MIN)
    }

    fn record(&mut self, error: BackendError) {
        debug!(error = %error, "Mock backend error");
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn source_mut(&mut self, source: SourceId) -> Option<&mut SourceData> {
        if !self.sources.contains_key(&source) {
            self.record(BackendError::InvalidName(source.get()));
        }
        self.sources.get_mut(&source)
    }

    fn source(&mut self, source: SourceId) -> Option<&SourceData> {
        self.source_mut(source).map(|data| &*data)
    }
}

/// A mock backend. Doesn't render anything, but tracks every buffer, source
/// and parameter and validates them the way an OpenAL implementation would.
pub struct Backend {
    name: String,
    max_sources: usize,
    state: Mutex<State>,
}

impl Backend {
    /// Opens a mock backend offering `max_sources` channels.
    pub fn new(name: &str, max_sources: usize) -> Backend {
        Backend {
            name: name.to_string(),
            max_sources,
            state: Mutex::new(State {
                next_id: 0,
                buffers: HashMap::new(),
                sources: HashMap::new(),
                listener: ListenerData {
                    position: Vec3::ZERO,
                    velocity: Vec3::ZERO,
                    forward: Vec3::NEG_Z,
                    up: Vec3::Y,
                    gain: 1.0,
                },
                doppler_velocity: DEFAULT_DOPPLER_VELOCITY,
                doppler_factor: DEFAULT_DOPPLER_FACTOR,
                distance_model: DistanceModel::default(),
                error: None,
                fail_next_upload: false,
                uploads: 0,
            }),
        }
    }

    /// Makes the next `create_buffer` call fail with `OutOfMemory`.
    pub fn fail_next_upload(&self) {
        self.state.lock().fail_next_upload = true;
    }

    /// Moves every playing source forward by `elapsed` (scaled by its pitch).
    /// Sources that reach the end of their buffer stop unless they loop.
    pub fn advance(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        let State {
            buffers, sources, ..
        } = &mut *state;

        for source in sources.values_mut() {
            if source.state != SourceState::Playing {
                continue;
            }
            let Some(buffer) = source.buffer.and_then(|id| buffers.get(&id)) else {
                source.state = SourceState::Stopped;
                continue;
            };

            let pitch = source
                .params
                .get(&SourceParam::Pitch)
                .copied()
                .unwrap_or(1.0);
            let frames = elapsed.as_secs_f64() * f64::from(buffer.sample_rate) * f64::from(pitch);
            source.cursor += frames as usize;

            if source.cursor >= buffer.frames {
                let looping = source
                    .flags
                    .get(&SourceFlag::Looping)
                    .copied()
                    .unwrap_or(false);
                if looping && buffer.frames > 0 {
                    source.cursor %= buffer.frames;
                } else {
                    source.state = SourceState::Stopped;
                    source.cursor = 0;
                }
            }
        }
    }

    /// Number of buffers currently allocated.
    pub fn live_buffers(&self) -> usize {
        self.state.lock().buffers.len()
    }

    /// Number of sources currently allocated.
    pub fn live_sources(&self) -> usize {
        self.state.lock().sources.len()
    }

    /// Number of successful buffer uploads since the backend was opened.
    pub fn uploads(&self) -> usize {
        self.state.lock().uploads
    }

    /// Playback position of the source in frames.
    pub fn cursor(&self, source: SourceId) -> Option<usize> {
        self.state.lock().sources.get(&source).map(|s| s.cursor)
    }
}

fn validate(param: SourceParam, value: f32) -> bool {
    match param {
        SourceParam::Gain
        | SourceParam::Pitch
        | SourceParam::MaxDistance
        | SourceParam::RolloffFactor
        | SourceParam::ReferenceDistance => value >= 0.0,
        SourceParam::MinGain | SourceParam::MaxGain | SourceParam::ConeOuterGain => {
            (0.0..=1.0).contains(&value)
        }
        SourceParam::ConeInnerAngle | SourceParam::ConeOuterAngle => {
            (0.0..=360.0).contains(&value)
        }
    }
}

impl super::Backend for Backend {
    fn max_sources(&self) -> usize {
        self.max_sources
    }

    fn create_buffer(
        &self,
        pcm: &[u8],
        format: PcmFormat,
        sample_rate: u32,
    ) -> Result<BufferId, BackendError> {
        let mut state = self.state.lock();
        if state.fail_next_upload {
            state.fail_next_upload = false;
            return Err(BackendError::OutOfMemory);
        }
        if sample_rate == 0 || pcm.len() % format.bytes_per_frame() != 0 {
            return Err(BackendError::InvalidValue("buffer data"));
        }

        let id = BufferId::new(state.next_id());
        state.buffers.insert(
            id,
            BufferData {
                frames: pcm.len() / format.bytes_per_frame(),
                sample_rate,
            },
        );
        state.uploads += 1;
        Ok(id)
    }

    fn delete_buffer(&self, buffer: BufferId) {
        let mut state = self.state.lock();
        if !state.buffers.contains_key(&buffer) {
            state.record(BackendError::InvalidName(buffer.get()));
            return;
        }
        if state.sources.values().any(|s| s.buffer == Some(buffer)) {
            state.record(BackendError::InvalidOperation(
                "buffer still attached to a source",
            ));
            return;
        }
        state.buffers.remove(&buffer);
    }

    fn create_source(&self) -> Result<SourceId, BackendError> {
        let mut state = self.state.lock();
        if state.sources.len() >= self.max_sources {
            return Err(BackendError::OutOfMemory);
        }
        let id = SourceId::new(state.next_id());
        state.sources.insert(id, SourceData::new());
        Ok(id)
    }

    fn delete_source(&self, source: SourceId) {
        let mut state = self.state.lock();
        if state.sources.remove(&source).is_none() {
            state.record(BackendError::InvalidName(source.get()));
        }
    }

    fn set_source_buffer(&self, source: SourceId, buffer: Option<BufferId>) {
        let mut state = self.state.lock();
        if let Some(id) = buffer {
            if !state.buffers.contains_key(&id) {
                state.record(BackendError::InvalidName(id.get()));
                return;
            }
        }
        let Some(idle) = state.source(source).map(|s| s.state.is_idle()) else {
            return;
        };
        if !idle {
            state.record(BackendError::InvalidOperation(
                "buffer change on an active source",
            ));
            return;
        }
        if let Some(data) = state.sources.get_mut(&source) {
            data.buffer = buffer;
            data.cursor = 0;
        }
    }

    fn source_buffer(&self, source: SourceId) -> Option<BufferId> {
        self.state.lock().source(source).and_then(|s| s.buffer)
    }

    fn source_play(&self, source: SourceId) {
        let mut state = self.state.lock();
        if let Some(data) = state.source_mut(source) {
            if data.buffer.is_none() {
                data.state = SourceState::Stopped;
                return;
            }
            if data.state != SourceState::Paused {
                data.cursor = 0;
            }
            data.state = SourceState::Playing;
        }
    }

    fn source_pause(&self, source: SourceId) {
        let mut state = self.state.lock();
        if let Some(data) = state.source_mut(source) {
            if data.state == SourceState::Playing {
                data.state = SourceState::Paused;
            }
        }
    }

    fn source_stop(&self, source: SourceId) {
        let mut state = self.state.lock();
        if let Some(data) = state.source_mut(source) {
            data.state = SourceState::Stopped;
            data.cursor = 0;
        }
    }

    fn source_rewind(&self, source: SourceId) {
        let mut state = self.state.lock();
        if let Some(data) = state.source_mut(source) {
            data.state = SourceState::Initial;
            data.cursor = 0;
        }
    }

    fn source_state(&self, source: SourceId) -> SourceState {
        self.state
            .lock()
            .source(source)
            .map(|s| s.state)
            .unwrap_or_default()
    }

    fn set_source_param(&self, source: SourceId, param: SourceParam, value: f32) {
        let mut state = self.state.lock();
        if !validate(param, value) {
            state.record(BackendError::InvalidValue(param.name()));
            return;
        }
        if let Some(data) = state.source_mut(source) {
            data.params.insert(param, value);
        }
    }

    fn source_param(&self, source: SourceId, param: SourceParam) -> f32 {
        self.state
            .lock()
            .source(source)
            .and_then(|s| s.params.get(&param).copied())
            .unwrap_or_else(|| param.default_value())
    }

    fn set_source_vector(&self, source: SourceId, param: SourceVector, value: Vec3) {
        let mut state = self.state.lock();
        if !value.is_finite() {
            state.record(BackendError::InvalidValue("source vector"));
            return;
        }
        if let Some(data) = state.source_mut(source) {
            data.vectors.insert(param, value);
        }
    }

    fn source_vector(&self, source: SourceId, param: SourceVector) -> Vec3 {
        self.state
            .lock()
            .source(source)
            .and_then(|s| s.vectors.get(&param).copied())
            .unwrap_or(Vec3::ZERO)
    }

    fn set_source_flag(&self, source: SourceId, flag: SourceFlag, value: bool) {
        let mut state = self.state.lock();
        if let Some(data) = state.source_mut(source) {
            data.flags.insert(flag, value);
        }
    }

    fn source_flag(&self, source: SourceId, flag: SourceFlag) -> bool {
        self.state
            .lock()
            .source(source)
            .and_then(|s| s.flags.get(&flag).copied())
            .unwrap_or(false)
    }

    fn set_listener_vector(&self, param: ListenerVector, value: Vec3) {
        let mut state = self.state.lock();
        if !value.is_finite() {
            state.record(BackendError::InvalidValue("listener vector"));
            return;
        }
        match param {
            ListenerVector::Position => state.listener.position = value,
            ListenerVector::Velocity => state.listener.velocity = value,
        }
    }

    fn listener_vector(&self, param: ListenerVector) -> Vec3 {
        let state = self.state.lock();
        match param {
            ListenerVector::Position => state.listener.position,
            ListenerVector::Velocity => state.listener.velocity,
        }
    }

    fn set_listener_orientation(&self, forward: Vec3, up: Vec3) {
        let mut state = self.state.lock();
        if !forward.is_finite() || !up.is_finite() {
            state.record(BackendError::InvalidValue("listener orientation"));
            return;
        }
        state.listener.forward = forward;
        state.listener.up = up;
    }

    fn listener_orientation(&self) -> (Vec3, Vec3) {
        let state = self.state.lock();
        (state.listener.forward, state.listener.up)
    }

    fn set_listener_gain(&self, gain: f32) {
        let mut state = self.state.lock();
        if gain >= 0.0 {
            state.listener.gain = gain;
        } else {
            state.record(BackendError::InvalidValue("listener gain"));
        }
    }

    fn listener_gain(&self) -> f32 {
        self.state.lock().listener.gain
    }

    fn set_doppler_velocity(&self, velocity: f32) {
        let mut state = self.state.lock();
        if velocity > 0.0 {
            state.doppler_velocity = velocity;
        } else {
            state.record(BackendError::InvalidValue("doppler velocity"));
        }
    }

    fn doppler_velocity(&self) -> f32 {
        self.state.lock().doppler_velocity
    }

    fn set_doppler_factor(&self, factor: f32) {
        let mut state = self.state.lock();
        if factor >= 0.0 {
            state.doppler_factor = factor;
        } else {
            state.record(BackendError::InvalidValue("doppler factor"));
        }
    }

    fn doppler_factor(&self) -> f32 {
        self.state.lock().doppler_factor
    }

    fn set_distance_model(&self, model: DistanceModel) {
        self.state.lock().distance_model = model;
    }

    fn distance_model(&self) -> DistanceModel {
        self.state.lock().distance_model
    }

    fn device_string(&self, which: DeviceString) -> Option<String> {
        Some(match which {
            DeviceString::Vendor => "mock".to_string(),
            DeviceString::Version => "1.1 (mock)".to_string(),
            DeviceString::Renderer => self.name.clone(),
            DeviceString::Extensions => String::new(),
        })
    }

    fn check_for_error(&self) -> Option<BackendError> {
        self.state.lock().error.take()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend as _;

    fn backend_with_source() -> (Backend, SourceId, BufferId) {
        let backend = Backend::new("mock", 4);
        // One second of mono 16-bit audio at 1kHz.
        let buffer = backend
            .create_buffer(&[0u8; 2000], PcmFormat::Mono16, 1000)
            .unwrap();
        let source = backend.create_source().unwrap();
        backend.set_source_buffer(source, Some(buffer));
        (backend, source, buffer)
    }

    #[test]
    fn test_source_limit() {
        let backend = Backend::new("mock", 2);
        assert!(backend.create_source().is_ok());
        assert!(backend.create_source().is_ok());
        assert_eq!(backend.create_source(), Err(BackendError::OutOfMemory));
    }

    #[test]
    fn test_first_error_is_sticky() {
        let (backend, source, _) = backend_with_source();
        backend.set_source_param(source, SourceParam::MinGain, 2.0);
        backend.set_source_param(source, SourceParam::Gain, -1.0);

        assert_eq!(
            backend.check_for_error(),
            Some(BackendError::InvalidValue("min_gain"))
        );
        assert_eq!(backend.check_for_error(), None);
        assert_eq!(backend.source_param(source, SourceParam::MinGain), 0.0);
    }

    #[test]
    fn test_gain_above_one_accepted() {
        let (backend, source, _) = backend_with_source();
        backend.set_source_param(source, SourceParam::Gain, 4.0);
        assert_eq!(backend.check_for_error(), None);
        assert_eq!(backend.source_param(source, SourceParam::Gain), 4.0);
    }

    #[test]
    fn test_attached_buffer_not_deleted() {
        let (backend, source, buffer) = backend_with_source();
        backend.delete_buffer(buffer);
        assert!(matches!(
            backend.check_for_error(),
            Some(BackendError::InvalidOperation(_))
        ));
        assert_eq!(backend.live_buffers(), 1);

        backend.set_source_buffer(source, None);
        backend.delete_buffer(buffer);
        assert_eq!(backend.check_for_error(), None);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn test_buffer_change_while_playing_rejected() {
        let (backend, source, _) = backend_with_source();
        backend.source_play(source);
        backend.set_source_buffer(source, None);
        assert!(matches!(
            backend.check_for_error(),
            Some(BackendError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_advance_stops_at_end() {
        let (backend, source, _) = backend_with_source();
        backend.source_play(source);

        backend.advance(Duration::from_millis(500));
        assert_eq!(backend.source_state(source), SourceState::Playing);
        assert_eq!(backend.cursor(source), Some(500));

        backend.advance(Duration::from_millis(600));
        assert_eq!(backend.source_state(source), SourceState::Stopped);
    }

    #[test]
    fn test_advance_wraps_looping() {
        let (backend, source, _) = backend_with_source();
        backend.set_source_flag(source, SourceFlag::Looping, true);
        backend.source_play(source);

        backend.advance(Duration::from_millis(1250));
        assert_eq!(backend.source_state(source), SourceState::Playing);
        assert_eq!(backend.cursor(source), Some(250));
    }

    #[test]
    fn test_pause_resumes_from_cursor() {
        let (backend, source, _) = backend_with_source();
        backend.source_play(source);
        backend.advance(Duration::from_millis(300));
        backend.source_pause(source);
        backend.advance(Duration::from_millis(300));
        assert_eq!(backend.cursor(source), Some(300));

        backend.source_play(source);
        assert_eq!(backend.cursor(source), Some(300));
        backend.source_rewind(source);
        assert_eq!(backend.cursor(source), Some(0));
        assert_eq!(backend.source_state(source), SourceState::Initial);
    }

    #[test]
    fn test_failed_upload() {
        let backend = Backend::new("mock", 1);
        backend.fail_next_upload();
        assert_eq!(
            backend.create_buffer(&[0u8; 4], PcmFormat::Mono16, 44100),
            Err(BackendError::OutOfMemory)
        );
        assert!(backend
            .create_buffer(&[0u8; 4], PcmFormat::Mono16, 44100)
            .is_ok());
        assert_eq!(backend.uploads(), 1);
    }
}
