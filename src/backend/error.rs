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

/// Errors reported by an audio backend, either returned directly from
/// allocation calls or drained from the backend's error queue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("Invalid handle: {0}")]
    InvalidName(u32),

    #[error("Invalid value for {0}")]
    InvalidValue(&'static str),

    #[error("Invalid operation: {0}")]
    InvalidOperation(&'static str),

    #[error("Backend out of memory")]
    OutOfMemory,

    #[error("Audio device unavailable: {0}")]
    DeviceUnavailable(String),
}
