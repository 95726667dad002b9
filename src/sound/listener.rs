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
use std::{fmt, sync::Arc};

use glam::Vec3;

use super::context::Context;
use crate::backend::ListenerVector;

/// The single point sounds are heard from. There is one per backend, owned by
/// the manager, so this type is not `Clone`.
pub struct Listener {
    context: Arc<Context>,
}

impl Listener {
    pub(crate) fn new(context: &Arc<Context>) -> Listener {
        Listener {
            context: Arc::clone(context),
        }
    }

    pub fn set_position(&self, position: Vec3) {
        self.context
            .backend()
            .set_listener_vector(ListenerVector::Position, position);
        self.context.check("set_listener_position");
    }

    pub fn position(&self) -> Vec3 {
        self.context.backend().listener_vector(ListenerVector::Position)
    }

    pub fn set_velocity(&self, velocity: Vec3) {
        self.context
            .backend()
            .set_listener_vector(ListenerVector::Velocity, velocity);
        self.context.check("set_listener_velocity");
    }

    pub fn velocity(&self) -> Vec3 {
        self.context.backend().listener_vector(ListenerVector::Velocity)
    }

    /// Sets where the listener faces and which way is up, in one call.
    pub fn set_orientation(&self, forward: Vec3, up: Vec3) {
        self.context.backend().set_listener_orientation(forward, up);
        self.context.check("set_listener_orientation");
    }

    /// The forward half of the orientation.
    pub fn direction(&self) -> Vec3 {
        self.context.backend().listener_orientation().0
    }

    pub fn up(&self) -> Vec3 {
        self.context.backend().listener_orientation().1
    }

    /// Master gain applied to everything the listener hears.
    pub fn set_gain(&self, gain: f32) {
        self.context.backend().set_listener_gain(gain);
        self.context.check("set_listener_gain");
    }

    pub fn gain(&self) -> f32 {
        self.context.backend().listener_gain()
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("position", &self.position())
            .field("direction", &self.direction())
            .field("gain", &self.gain())
            .finish()
    }
}
