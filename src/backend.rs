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

//! The audio backend seam.
//!
//! A backend owns the actual mixing and exposes buffers and sources by opaque
//! handle, with parameters addressed by enum key. Errors from parameter calls
//! are not returned; they queue up and are drained with `check_for_error`.

use std::{fmt, num::NonZeroU32, str::FromStr, sync::Arc};

use glam::Vec3;
use serde::Deserialize;

pub mod cpal;
mod error;
pub mod mock;

pub use error::BackendError;

/// Number of channels the mock backend offers when none is given.
const DEFAULT_MOCK_SOURCES: usize = 32;

/// Opaque handle to a buffer of PCM data resident in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(NonZeroU32);

impl BufferId {
    pub fn new(id: NonZeroU32) -> BufferId {
        BufferId(id)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Opaque handle to a playback channel in the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(NonZeroU32);

impl SourceId {
    pub fn new(id: NonZeroU32) -> SourceId {
        SourceId(id)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Layout of the PCM bytes handed to the backend. 8-bit data is unsigned,
/// 16-bit data is signed little endian; stereo data is interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcmFormat {
    Mono8,
    Mono16,
    Stereo8,
    Stereo16,
}

impl PcmFormat {
    /// Picks the format for the given channel count and bit depth.
    pub fn from_layout(channels: u16, bits_per_sample: u16) -> Option<PcmFormat> {
        match (channels, bits_per_sample) {
            (1, 8) => Some(PcmFormat::Mono8),
            (1, 16) => Some(PcmFormat::Mono16),
            (2, 8) => Some(PcmFormat::Stereo8),
            (2, 16) => Some(PcmFormat::Stereo16),
            _ => None,
        }
    }

    pub fn channels(self) -> u16 {
        match self {
            PcmFormat::Mono8 | PcmFormat::Mono16 => 1,
            PcmFormat::Stereo8 | PcmFormat::Stereo16 => 2,
        }
    }

    pub fn bits_per_sample(self) -> u16 {
        match self {
            PcmFormat::Mono8 | PcmFormat::Stereo8 => 8,
            PcmFormat::Mono16 | PcmFormat::Stereo16 => 16,
        }
    }

    /// Size of one frame (one sample per channel) in bytes.
    pub fn bytes_per_frame(self) -> usize {
        usize::from(self.channels()) * usize::from(self.bits_per_sample() / 8)
    }
}

/// Playback state of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceState {
    #[default]
    Initial,
    Playing,
    Paused,
    Stopped,
}

impl SourceState {
    /// True for the states a pooled source can be handed out in.
    pub fn is_idle(self) -> bool {
        matches!(self, SourceState::Initial | SourceState::Stopped)
    }
}

/// Attenuation function the backend applies between listener and sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceModel {
    None,
    #[default]
    InverseDistance,
    InverseDistanceClamped,
}

impl FromStr for DistanceModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DistanceModel::None),
            "inverse_distance" => Ok(DistanceModel::InverseDistance),
            "inverse_distance_clamped" => Ok(DistanceModel::InverseDistanceClamped),
            _ => Err(format!("Unsupported distance model: {}", s)),
        }
    }
}

impl fmt::Display for DistanceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DistanceModel::None => "none",
            DistanceModel::InverseDistance => "inverse_distance",
            DistanceModel::InverseDistanceClamped => "inverse_distance_clamped",
        };
        write!(f, "{}", name)
    }
}

/// Scalar source parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceParam {
    Gain,
    Pitch,
    MaxDistance,
    RolloffFactor,
    ReferenceDistance,
    MinGain,
    MaxGain,
    ConeOuterGain,
    ConeInnerAngle,
    ConeOuterAngle,
}

impl SourceParam {
    pub fn name(self) -> &'static str {
        match self {
            SourceParam::Gain => "gain",
            SourceParam::Pitch => "pitch",
            SourceParam::MaxDistance => "max_distance",
            SourceParam::RolloffFactor => "rolloff_factor",
            SourceParam::ReferenceDistance => "reference_distance",
            SourceParam::MinGain => "min_gain",
            SourceParam::MaxGain => "max_gain",
            SourceParam::ConeOuterGain => "cone_outer_gain",
            SourceParam::ConeInnerAngle => "cone_inner_angle",
            SourceParam::ConeOuterAngle => "cone_outer_angle",
        }
    }

    /// The value a freshly created source reports.
    pub fn default_value(self) -> f32 {
        match self {
            SourceParam::Gain
            | SourceParam::Pitch
            | SourceParam::RolloffFactor
            | SourceParam::ReferenceDistance
            | SourceParam::MaxGain => 1.0,
            SourceParam::MaxDistance => f32::INFINITY,
            SourceParam::MinGain | SourceParam::ConeOuterGain => 0.0,
            SourceParam::ConeInnerAngle | SourceParam::ConeOuterAngle => 360.0,
        }
    }

    pub const ALL: [SourceParam; 10] = [
        SourceParam::Gain,
        SourceParam::Pitch,
        SourceParam::MaxDistance,
        SourceParam::RolloffFactor,
        SourceParam::ReferenceDistance,
        SourceParam::MinGain,
        SourceParam::MaxGain,
        SourceParam::ConeOuterGain,
        SourceParam::ConeInnerAngle,
        SourceParam::ConeOuterAngle,
    ];
}

/// Vector source parameters. All default to the zero vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceVector {
    Position,
    Velocity,
    Direction,
}

/// Boolean source parameters. All default to false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFlag {
    Looping,
    RelativeToListener,
}

/// Vector listener parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerVector {
    Position,
    Velocity,
}

/// Informational strings a device reports while it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceString {
    Vendor,
    Version,
    Renderer,
    Extensions,
}

/// An open audio device and context.
///
/// All methods take `&self`; implementations guard their own state. Calls
/// that can only fail because of a bad argument or handle do not return a
/// result. Instead the first error is queued and reported by
/// [`Backend::check_for_error`].
pub trait Backend: fmt::Display + Send + Sync {
    /// Upper bound on simultaneously existing sources.
    fn max_sources(&self) -> usize;

    /// Uploads PCM data into a new buffer.
    fn create_buffer(
        &self,
        pcm: &[u8],
        format: PcmFormat,
        sample_rate: u32,
    ) -> Result<BufferId, BackendError>;

    /// Releases a buffer. Fails (queued) while a source still has it attached.
    fn delete_buffer(&self, buffer: BufferId);

    fn create_source(&self) -> Result<SourceId, BackendError>;

    fn delete_source(&self, source: SourceId);

    /// Attaches a buffer to a stopped or initial source, or detaches it.
    fn set_source_buffer(&self, source: SourceId, buffer: Option<BufferId>);

    fn source_buffer(&self, source: SourceId) -> Option<BufferId>;

    fn source_play(&self, source: SourceId);

    fn source_pause(&self, source: SourceId);

    fn source_stop(&self, source: SourceId);

    fn source_rewind(&self, source: SourceId);

    fn source_state(&self, source: SourceId) -> SourceState;

    fn set_source_param(&self, source: SourceId, param: SourceParam, value: f32);

    fn source_param(&self, source: SourceId, param: SourceParam) -> f32;

    fn set_source_vector(&self, source: SourceId, param: SourceVector, value: Vec3);

    fn source_vector(&self, source: SourceId, param: SourceVector) -> Vec3;

    fn set_source_flag(&self, source: SourceId, flag: SourceFlag, value: bool);

    fn source_flag(&self, source: SourceId, flag: SourceFlag) -> bool;

    fn set_listener_vector(&self, param: ListenerVector, value: Vec3);

    fn listener_vector(&self, param: ListenerVector) -> Vec3;

    fn set_listener_orientation(&self, forward: Vec3, up: Vec3);

    /// Returns the (forward, up) pair.
    fn listener_orientation(&self) -> (Vec3, Vec3);

    fn set_listener_gain(&self, gain: f32);

    fn listener_gain(&self) -> f32;

    fn set_doppler_velocity(&self, velocity: f32);

    fn doppler_velocity(&self) -> f32;

    fn set_doppler_factor(&self, factor: f32);

    fn doppler_factor(&self) -> f32;

    fn set_distance_model(&self, model: DistanceModel);

    fn distance_model(&self) -> DistanceModel;

    fn device_string(&self, which: DeviceString) -> Option<String>;

    /// Drains the error queue.
    fn check_for_error(&self) -> Option<BackendError>;
}

/// Opens the backend with the given device name.
///
/// `mock` opens an in-memory backend with the default channel count and
/// `mock:<N>` one with `N` channels.
pub fn open(device: &str) -> Result<Arc<dyn Backend>, BackendError> {
    if device == "mock" {
        return Ok(Arc::new(mock::Backend::new(device, DEFAULT_MOCK_SOURCES)));
    }

    if let Some(count) = device.strip_prefix("mock:") {
        let max_sources = count
            .parse::<usize>()
            .map_err(|_| BackendError::DeviceUnavailable(device.to_string()))?;
        return Ok(Arc::new(mock::Backend::new(device, max_sources)));
    }

    Err(BackendError::DeviceUnavailable(device.to_string()))
}

/// Lists the output devices the host audio system knows about.
pub fn list_devices() -> Result<Vec<cpal::OutputDevice>, Box<dyn std::error::Error>> {
    cpal::OutputDevice::list()
}
