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

//! Sound effect playback on top of an OpenAL-style backend: a name-keyed cache
//! of loaded sounds, a fixed pool of playback sources and a single listener.

pub mod backend;
pub mod config;
pub mod sound;
#[cfg(test)]
mod testutil;

pub use glam::Vec3;
pub use sound::{SoundError, SoundMngr, SoundRef, SourceRef};
