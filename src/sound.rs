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
mod buffer;
mod cache;
mod context;
mod error;
mod listener;
mod manager;
mod pool;
mod source;
mod wav;

pub use buffer::{Sound, SoundRef};
pub use cache::SoundCache;
pub use context::Context;
pub use error::{DecodeError, SoundError};
pub use listener::Listener;
pub use manager::SoundMngr;
pub use pool::SourcePool;
pub use source::{Source, SourceRef, MAX_PITCH, MIN_PITCH};
pub use wav::{decode_wav, DecodedWav};
