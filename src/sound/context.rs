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

//! Shared context for everything that talks to an open backend. Sounds,
//! sources and the listener hold it instead of each carrying the backend and
//! the error counter separately.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tracing::warn;

use crate::backend::Backend;

/// The open backend plus the side channel for errors that are logged rather
/// than returned.
pub struct Context {
    backend: Arc<dyn Backend>,
    swallowed_errors: AtomicU64,
}

impl Context {
    pub fn new(backend: Arc<dyn Backend>) -> Context {
        Context {
            backend,
            swallowed_errors: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    /// Drains the backend error queue after a best-effort call. Errors are
    /// logged and counted, never returned. Returns true if the call succeeded.
    pub fn check(&self, operation: &'static str) -> bool {
        match self.backend.check_for_error() {
            Some(e) => {
                self.swallowed_errors.fetch_add(1, Ordering::Relaxed);
                warn!(operation, error = %e, "Backend rejected call");
                false
            }
            None => true,
        }
    }

    /// Number of backend errors logged and dropped so far.
    pub fn swallowed_errors(&self) -> u64 {
        self.swallowed_errors.load(Ordering::Relaxed)
    }
}
