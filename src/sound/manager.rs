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

//! Top-level entry point that ties the cache, the source pool and the listener
//! to one backend.
//!
//! If the backend cannot be opened the manager still constructs, but reports
//! `is_working() == false` and every operation becomes a no-op.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::cache::SoundCache;
use super::context::Context;
use super::error::SoundError;
use super::listener::Listener;
use super::pool::SourcePool;
use super::source::SourceRef;
use crate::backend::{self, Backend, BackendError, DeviceString, DistanceModel};
use crate::config::{SoundConfig, DEFAULT_DOPPLER_FACTOR, DEFAULT_DOPPLER_VELOCITY};

/// Everything that only exists once the backend is open.
struct Active {
    context: Arc<Context>,
    cache: SoundCache,
    pool: SourcePool,
    listener: Listener,
}

/// Plays named sound effects on a fixed set of backend sources.
pub struct SoundMngr {
    device: String,
    active: Option<Active>,
}

impl SoundMngr {
    /// Opens the configured device and builds the manager on top of it.
    pub fn open(config: &SoundConfig) -> SoundMngr {
        SoundMngr::new(config, backend::open(config.device()))
    }

    /// Builds the manager on an already opened backend. A failed open is
    /// logged and leaves the manager inert.
    pub fn new(
        config: &SoundConfig,
        backend: Result<Arc<dyn Backend>, BackendError>,
    ) -> SoundMngr {
        let backend = match backend {
            Ok(backend) => backend,
            Err(e) => {
                error!(
                    device = config.device(),
                    error = %e,
                    "Unable to open sound device, sound is disabled"
                );
                return SoundMngr {
                    device: config.device().to_string(),
                    active: None,
                };
            }
        };

        info!(device = %backend, sfx_dir = ?config.sfx_dir(), "Opening sound manager");
        let context = Arc::new(Context::new(backend));
        let mut mngr = SoundMngr {
            device: config.device().to_string(),
            active: Some(Active {
                cache: SoundCache::new(&context, config.sfx_dir()),
                pool: SourcePool::new(&context, config.max_sources()),
                listener: Listener::new(&context),
                context,
            }),
        };

        mngr.set_doppler_velocity(config.doppler_velocity());
        mngr.set_doppler_factor(config.doppler_factor());
        mngr.set_distance_model(config.distance_model());

        for subfolder in config.prefetch() {
            if let Err(e) = mngr.prefetch_all(subfolder) {
                warn!(
                    subfolder = subfolder.as_str(),
                    error = %e,
                    "Unable to prefetch sounds"
                );
            }
        }

        mngr
    }

    /// Whether the backend opened. When false every other call is a no-op.
    pub fn is_working(&self) -> bool {
        self.active.is_some()
    }

    /// Loads a sound ahead of time so `play` does not have to.
    pub fn prefetch(&mut self, name: &str) -> Result<(), SoundError> {
        match &mut self.active {
            Some(active) => active.cache.prefetch(name).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Loads every sound below the given subfolder of the sound effects
    /// directory. Returns the number of sounds newly loaded.
    pub fn prefetch_all(&mut self, subfolder: &str) -> Result<usize, SoundError> {
        match &mut self.active {
            Some(active) => active.cache.prefetch_all(subfolder),
            None => Ok(0),
        }
    }

    /// Starts playing the named sound on a free source and returns the source
    /// for further control. Returns `None` if the sound cannot be loaded, every
    /// source is busy or the manager is not working.
    pub fn play(&mut self, name: &str) -> Option<SourceRef> {
        if !self.is_working() {
            return None;
        }

        match self.try_play(name) {
            Ok(source) => Some(source),
            Err(e) => {
                warn!(name, error = %e, "Unable to play sound");
                None
            }
        }
    }

    /// Like `play`, but says why nothing is playing.
    pub fn try_play(&mut self, name: &str) -> Result<SourceRef, SoundError> {
        let Some(active) = &mut self.active else {
            return Err(BackendError::DeviceUnavailable(self.device.clone()).into());
        };

        let sound = active.cache.resolve(name)?;
        let source = active
            .pool
            .acquire()
            .ok_or(SoundError::PoolExhausted(active.pool.capacity()))?;

        {
            let mut guard = source.lock();
            guard.set_sound(Some(sound));
            guard.play()?;
            debug!(name, source = guard.id().get(), "Playing sound");
        }

        Ok(source)
    }

    /// The listener, if the manager is working.
    pub fn listener(&self) -> Option<&Listener> {
        self.active.as_ref().map(|active| &active.listener)
    }

    pub fn cache(&self) -> Option<&SoundCache> {
        self.active.as_ref().map(|active| &active.cache)
    }

    pub fn pool(&self) -> Option<&SourcePool> {
        self.active.as_ref().map(|active| &active.pool)
    }

    pub fn set_doppler_velocity(&self, velocity: f32) {
        if let Some(context) = self.context() {
            context.backend().set_doppler_velocity(velocity);
            context.check("set_doppler_velocity");
        }
    }

    pub fn doppler_velocity(&self) -> f32 {
        self.context()
            .map_or(DEFAULT_DOPPLER_VELOCITY, |c| c.backend().doppler_velocity())
    }

    pub fn set_doppler_factor(&self, factor: f32) {
        if let Some(context) = self.context() {
            context.backend().set_doppler_factor(factor);
            context.check("set_doppler_factor");
        }
    }

    pub fn doppler_factor(&self) -> f32 {
        self.context()
            .map_or(DEFAULT_DOPPLER_FACTOR, |c| c.backend().doppler_factor())
    }

    pub fn set_distance_model(&self, model: DistanceModel) {
        if let Some(context) = self.context() {
            context.backend().set_distance_model(model);
            context.check("set_distance_model");
        }
    }

    pub fn distance_model(&self) -> DistanceModel {
        self.context()
            .map_or(DistanceModel::default(), |c| c.backend().distance_model())
    }

    pub fn vendor(&self) -> Option<String> {
        self.device_string(DeviceString::Vendor)
    }

    pub fn version(&self) -> Option<String> {
        self.device_string(DeviceString::Version)
    }

    pub fn renderer(&self) -> Option<String> {
        self.device_string(DeviceString::Renderer)
    }

    pub fn extensions(&self) -> Option<String> {
        self.device_string(DeviceString::Extensions)
    }

    /// Logs the backend memory held by every cached sound and the total.
    pub fn log_memory_usage(&self) {
        let Some(active) = &self.active else {
            return;
        };

        for (name, sound) in active.cache.sorted() {
            info!(
                name,
                memory_kb = sound.size_bytes() / 1024,
                duration_ms = sound.duration().as_millis() as u64,
                "Cached sound"
            );
        }
        info!(
            sounds = active.cache.len(),
            memory_kb = active.cache.memory_usage() / 1024,
            sources = active.pool.capacity(),
            sources_in_use = active.pool.in_use(),
            "Sound memory usage"
        );
    }

    /// Forgets a cached sound. Its backend buffer is released once no source
    /// is still playing it. Returns false if the sound was not cached.
    pub fn evict(&mut self, name: &str) -> bool {
        let Some(active) = &mut self.active else {
            return false;
        };

        let evicted = active.cache.evict(name).is_some();
        if evicted {
            active.pool.release_idle();
        }
        evicted
    }

    /// Backend errors that were logged and dropped so far.
    pub fn swallowed_errors(&self) -> u64 {
        self.context().map_or(0, |c| c.swallowed_errors())
    }

    /// Stops every source.
    pub fn stop_all(&self) {
        if let Some(active) = &self.active {
            active.pool.stop_all();
        }
    }

    fn context(&self) -> Option<&Context> {
        self.active.as_ref().map(|active| active.context.as_ref())
    }

    fn device_string(&self, which: DeviceString) -> Option<String> {
        self.context()?.backend().device_string(which)
    }
}

impl std::fmt::Debug for SoundMngr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("SoundMngr");
        debug.field("device", &self.device);
        match &self.active {
            Some(active) => debug
                .field("cache", &active.cache)
                .field("pool", &active.pool)
                .finish(),
            None => debug.field("working", &false).finish(),
        }
    }
}
