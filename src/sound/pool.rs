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

//! Fixed-size pool of playback channels.
//!
//! Every channel is allocated up front. Which ones are free is worked out on
//! demand from the backend state and the reference count of each handle, so
//! there is no separate free list to fall out of sync.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::context::Context;
use super::source::{Source, SourceRef};
use crate::backend::SourceId;

/// Owns every source and hands out the idle ones.
pub struct SourcePool {
    /// Backend ids in pool order, readable without locking a source.
    ids: Vec<SourceId>,
    sources: Vec<SourceRef>,
    context: Arc<Context>,
}

impl SourcePool {
    /// Allocates `min(backend maximum, cap)` sources. If the backend refuses
    /// a source before that, the pool keeps the ones it already got.
    pub fn new(context: &Arc<Context>, cap: Option<usize>) -> SourcePool {
        let max_sources = Self::max_sources(context);
        let size = cap.map_or(max_sources, |cap| cap.min(max_sources));

        let mut ids = Vec::with_capacity(size);
        let mut sources = Vec::with_capacity(size);
        for _ in 0..size {
            match Source::new(context) {
                Ok(source) => {
                    ids.push(source.id());
                    sources.push(Arc::new(Mutex::new(source)));
                }
                Err(e) => {
                    warn!(
                        requested = size,
                        allocated = sources.len(),
                        error = %e,
                        "Backend refused to allocate more sources"
                    );
                    break;
                }
            }
        }

        info!(sources = sources.len(), max_sources, "Source pool allocated");
        SourcePool {
            ids,
            sources,
            context: Arc::clone(context),
        }
    }

    /// The backend's upper bound on simultaneously existing sources.
    pub fn max_sources(context: &Context) -> usize {
        context.backend().max_sources()
    }

    /// Number of sources in the pool.
    pub fn capacity(&self) -> usize {
        self.sources.len()
    }

    /// Hands out the first source that is stopped or initial and that nobody
    /// outside the pool still references. The source is reset to defaults
    /// with no sound bound. Returns `None` if every source is busy.
    pub fn acquire(&self) -> Option<SourceRef> {
        let free = self.sources.iter().find(|source| Self::is_free(source))?;

        let mut guard = free.lock();
        guard.reset();
        debug!(source = guard.id().get(), "Source acquired");
        drop(guard);

        Some(Arc::clone(free))
    }

    /// Number of sources that are playing, paused or held by a caller.
    pub fn in_use(&self) -> usize {
        self.sources
            .iter()
            .filter(|source| !Self::is_free(source))
            .count()
    }

    /// Unbinds sounds from sources that are free, so evicted sounds can be
    /// released without waiting for their source to be reused.
    pub fn release_idle(&self) {
        for source in self.sources.iter().filter(|source| Self::is_free(source)) {
            let mut guard = source.lock();
            if guard.sound().is_some() {
                guard.set_sound(None);
            }
        }
    }

    /// Stops every source, whether or not a caller still holds it. A source
    /// whose lock is taken, possibly by the calling thread, is stopped
    /// directly through the backend.
    pub fn stop_all(&self) {
        for (id, source) in self.ids.iter().zip(&self.sources) {
            match source.try_lock() {
                Some(mut guard) => guard.stop(),
                None => {
                    debug!(source = id.get(), "Source locked, stopping through backend");
                    self.context.backend().source_stop(*id);
                    self.context.check("stop");
                }
            }
        }
    }

    fn is_free(source: &SourceRef) -> bool {
        Arc::strong_count(source) == 1 && source.lock().state().is_idle()
    }
}

impl std::fmt::Debug for SourcePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcePool")
            .field("capacity", &self.capacity())
            .field("in_use", &self.in_use())
            .finish()
    }
}
