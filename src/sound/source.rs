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

//! Playback channels.
//!
//! A source plays at most one sound at a time and carries the spatial, gain
//! and pitch state the backend mixes it with. Parameter changes are
//! best-effort: a rejected value is logged and counted, never returned.

use std::{fmt, sync::Arc};

use glam::Vec3;
use parking_lot::Mutex;
use tracing::{debug, warn};

use super::buffer::SoundRef;
use super::context::Context;
use super::error::SoundError;
use crate::backend::{SourceFlag, SourceId, SourceParam, SourceState, SourceVector};

/// Lowest pitch a source accepts.
pub const MIN_PITCH: f32 = 0.0;

/// Highest pitch a source accepts.
pub const MAX_PITCH: f32 = 2.0;

/// A source handed out by the pool. The pool keeps one reference; a source is
/// only reused once every other reference has been dropped.
pub type SourceRef = Arc<Mutex<Source>>;

/// One playback channel in the backend.
pub struct Source {
    id: SourceId,
    sound: Option<SoundRef>,
    context: Arc<Context>,
}

impl Source {
    /// Allocates a new channel in the backend.
    pub fn new(context: &Arc<Context>) -> Result<Source, SoundError> {
        let id = context.backend().create_source()?;
        Ok(Source {
            id,
            sound: None,
            context: Arc::clone(context),
        })
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Current playback state as reported by the backend.
    pub fn state(&self) -> SourceState {
        self.context.backend().source_state(self.id)
    }

    /// Drives the source into the given state through the matching transition.
    /// Asking for `Playing` without a bound sound leaves the state unchanged.
    pub fn set_state(&mut self, state: SourceState) {
        match state {
            SourceState::Initial => self.rewind(),
            SourceState::Playing => {
                if let Err(e) = self.play() {
                    warn!(source = self.id.get(), error = %e, "Unable to set source playing");
                }
            }
            SourceState::Paused => self.pause(),
            SourceState::Stopped => self.stop(),
        }
    }

    /// Starts playback from the beginning, or resumes if paused.
    pub fn play(&mut self) -> Result<(), SoundError> {
        let Some(sound) = &self.sound else {
            return Err(SoundError::NotBound);
        };
        debug!(source = self.id.get(), sound = sound.name(), "Playing source");
        self.context.backend().source_play(self.id);
        self.context.check("play");
        Ok(())
    }

    /// Pauses a playing source. Does nothing in any other state.
    pub fn pause(&mut self) {
        if self.state() == SourceState::Playing {
            self.context.backend().source_pause(self.id);
            self.context.check("pause");
        }
    }

    pub fn stop(&mut self) {
        self.context.backend().source_stop(self.id);
        self.context.check("stop");
    }

    /// Returns to the initial state with the playback position at the start.
    pub fn rewind(&mut self) {
        self.context.backend().source_rewind(self.id);
        self.context.check("rewind");
    }

    /// Binds a new sound (or none). An active source is stopped first, and the
    /// source is always left in `Initial`; call `play` again to hear it.
    pub fn set_sound(&mut self, sound: Option<SoundRef>) {
        if !self.state().is_idle() {
            self.stop();
        }

        self.context
            .backend()
            .set_source_buffer(self.id, sound.as_ref().map(|s| s.buffer_id()));
        self.context.check("set_sound");

        // The previous sound is released only after the backend let go of it.
        self.sound = sound;
        self.rewind();
    }

    pub fn sound(&self) -> Option<&SoundRef> {
        self.sound.as_ref()
    }

    /// Volume, nominally [0,1]. Larger values are passed through and may work
    /// depending on the backend.
    pub fn set_gain(&mut self, gain: f32) {
        self.set_param(SourceParam::Gain, gain);
    }

    pub fn gain(&self) -> f32 {
        self.param(SourceParam::Gain)
    }

    /// Sets the pitch, clamped to [0,2]. Affects playback speed as well.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.set_param(SourceParam::Pitch, pitch.clamp(MIN_PITCH, MAX_PITCH));
    }

    pub fn pitch(&self) -> f32 {
        self.param(SourceParam::Pitch)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.set_vector(SourceVector::Position, position);
    }

    pub fn position(&self) -> Vec3 {
        self.vector(SourceVector::Position)
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.set_vector(SourceVector::Velocity, velocity);
    }

    pub fn velocity(&self) -> Vec3 {
        self.vector(SourceVector::Velocity)
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.set_vector(SourceVector::Direction, direction);
    }

    pub fn direction(&self) -> Vec3 {
        self.vector(SourceVector::Direction)
    }

    /// Distance above which the source is no longer attenuated under the
    /// clamped distance model. Defaults to +inf.
    pub fn set_max_distance(&mut self, distance: f32) {
        self.set_param(SourceParam::MaxDistance, distance);
    }

    pub fn max_distance(&self) -> f32 {
        self.param(SourceParam::MaxDistance)
    }

    /// How fast the sound falls off with distance.
    pub fn set_rolloff_factor(&mut self, factor: f32) {
        self.set_param(SourceParam::RolloffFactor, factor);
    }

    pub fn rolloff_factor(&self) -> f32 {
        self.param(SourceParam::RolloffFactor)
    }

    /// Distance at which the source plays at full gain. At 0.0 no distance
    /// attenuation occurs. Defaults to 1.0.
    pub fn set_reference_distance(&mut self, distance: f32) {
        self.set_param(SourceParam::ReferenceDistance, distance);
    }

    pub fn reference_distance(&self) -> f32 {
        self.param(SourceParam::ReferenceDistance)
    }

    pub fn set_min_gain(&mut self, gain: f32) {
        self.set_param(SourceParam::MinGain, gain);
    }

    pub fn min_gain(&self) -> f32 {
        self.param(SourceParam::MinGain)
    }

    pub fn set_max_gain(&mut self, gain: f32) {
        self.set_param(SourceParam::MaxGain, gain);
    }

    pub fn max_gain(&self) -> f32 {
        self.param(SourceParam::MaxGain)
    }

    pub fn set_cone_outer_gain(&mut self, gain: f32) {
        self.set_param(SourceParam::ConeOuterGain, gain);
    }

    pub fn cone_outer_gain(&self) -> f32 {
        self.param(SourceParam::ConeOuterGain)
    }

    pub fn set_cone_inner_angle(&mut self, degrees: f32) {
        self.set_param(SourceParam::ConeInnerAngle, degrees);
    }

    pub fn cone_inner_angle(&self) -> f32 {
        self.param(SourceParam::ConeInnerAngle)
    }

    pub fn set_cone_outer_angle(&mut self, degrees: f32) {
        self.set_param(SourceParam::ConeOuterAngle, degrees);
    }

    pub fn cone_outer_angle(&self) -> f32 {
        self.param(SourceParam::ConeOuterAngle)
    }

    /// Whether the position is relative to the listener. False by default.
    pub fn set_relative_to_listener(&mut self, relative: bool) {
        self.set_flag(SourceFlag::RelativeToListener, relative);
    }

    pub fn relative_to_listener(&self) -> bool {
        self.flag(SourceFlag::RelativeToListener)
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.set_flag(SourceFlag::Looping, looping);
    }

    pub fn looping(&self) -> bool {
        self.flag(SourceFlag::Looping)
    }

    /// Unbinds the sound and restores every parameter to its default, so the
    /// next user doesn't inherit the previous one's settings.
    pub(crate) fn reset(&mut self) {
        self.set_sound(None);
        for param in SourceParam::ALL {
            self.set_param(param, param.default_value());
        }
        for vector in [
            SourceVector::Position,
            SourceVector::Velocity,
            SourceVector::Direction,
        ] {
            self.set_vector(vector, Vec3::ZERO);
        }
        self.set_flag(SourceFlag::Looping, false);
        self.set_flag(SourceFlag::RelativeToListener, false);
    }

    fn set_param(&mut self, param: SourceParam, value: f32) {
        self.context
            .backend()
            .set_source_param(self.id, param, value);
        self.context.check(param.name());
    }

    fn param(&self, param: SourceParam) -> f32 {
        self.context.backend().source_param(self.id, param)
    }

    fn set_vector(&mut self, param: SourceVector, value: Vec3) {
        self.context
            .backend()
            .set_source_vector(self.id, param, value);
        self.context.check("set_source_vector");
    }

    fn vector(&self, param: SourceVector) -> Vec3 {
        self.context.backend().source_vector(self.id, param)
    }

    fn set_flag(&mut self, flag: SourceFlag, value: bool) {
        self.context.backend().set_source_flag(self.id, flag, value);
        self.context.check("set_source_flag");
    }

    fn flag(&self, flag: SourceFlag) -> bool {
        self.context.backend().source_flag(self.id, flag)
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        let backend = self.context.backend();
        backend.source_stop(self.id);
        backend.set_source_buffer(self.id, None);
        backend.delete_source(self.id);
        self.context.check("delete_source");
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("sound", &self.sound.as_ref().map(|s| s.name()))
            .field("state", &self.state())
            .finish()
    }
}
