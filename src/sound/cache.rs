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

//! Name-keyed cache of loaded sounds.
//!
//! Names are paths relative to the sound effects directory, always with `/`
//! separators (`"footsteps/left.wav"`). A name is loaded at most once; later
//! requests share the same sound.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::buffer::{Sound, SoundRef};
use super::context::Context;
use super::error::SoundError;

/// Maps sound names to loaded sounds.
pub struct SoundCache {
    /// Root directory names are resolved against.
    sfx_dir: PathBuf,
    /// Loaded sounds by name.
    sounds: HashMap<String, SoundRef>,
    context: Arc<Context>,
}

impl SoundCache {
    pub fn new(context: &Arc<Context>, sfx_dir: &Path) -> SoundCache {
        SoundCache {
            sfx_dir: sfx_dir.to_path_buf(),
            sounds: HashMap::new(),
            context: Arc::clone(context),
        }
    }

    pub fn sfx_dir(&self) -> &Path {
        &self.sfx_dir
    }

    /// Loads the sound ahead of time. Does nothing if it is already cached.
    pub fn prefetch(&mut self, name: &str) -> Result<SoundRef, SoundError> {
        self.load(name, false)
    }

    /// Returns the cached sound, loading it now if it was never prefetched.
    pub fn resolve(&mut self, name: &str) -> Result<SoundRef, SoundError> {
        self.load(name, true)
    }

    /// Recursively loads every WAV file under `sfx_dir/subfolder`. Files that
    /// fail to load are logged and skipped. Returns how many sounds were newly
    /// loaded; fails only if the folder itself does not exist.
    pub fn prefetch_all(&mut self, subfolder: &str) -> Result<usize, SoundError> {
        let root = self.sfx_dir.join(subfolder);
        if !root.is_dir() {
            return Err(SoundError::NotFound(subfolder.to_string()));
        }

        let mut files = Vec::new();
        find_wav_files(&root, &mut files);
        files.sort();

        let mut loaded = 0;
        for file in files {
            let Some(name) = self.name_for(&file) else {
                warn!(path = ?file, "Skipping sound with unreadable name");
                continue;
            };
            if self.sounds.contains_key(&name) {
                continue;
            }
            match self.load(&name, false) {
                Ok(_) => loaded += 1,
                Err(e) => {
                    warn!(name = name.as_str(), error = %e, "Failed to prefetch sound")
                }
            }
        }

        info!(
            subfolder,
            loaded,
            cached = self.sounds.len(),
            memory_kb = self.memory_usage() / 1024,
            "Prefetched sounds"
        );
        Ok(loaded)
    }

    /// Returns the sound if it is already cached, without loading.
    pub fn get(&self, name: &str) -> Option<&SoundRef> {
        self.sounds.get(&normalize(Path::new(name))?)
    }

    /// Drops the cache entry. The sound itself lives on until every source
    /// playing it lets go.
    pub fn evict(&mut self, name: &str) -> Option<SoundRef> {
        let evicted = self.sounds.remove(&normalize(Path::new(name))?);
        if evicted.is_some() {
            debug!(name, "Sound evicted");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Cached sounds sorted by name.
    pub fn sorted(&self) -> Vec<(&str, &SoundRef)> {
        let mut sounds: Vec<(&str, &SoundRef)> = self
            .sounds
            .iter()
            .map(|(name, sound)| (name.as_str(), sound))
            .collect();
        sounds.sort_by_key(|(name, _)| *name);
        sounds
    }

    /// Returns the total backend memory used by cached sounds.
    pub fn memory_usage(&self) -> usize {
        self.sounds.values().map(|s| s.size_bytes()).sum()
    }

    fn load(&mut self, name: &str, is_hot: bool) -> Result<SoundRef, SoundError> {
        let Some(key) = normalize(Path::new(name)) else {
            return Err(SoundError::NotFound(name.to_string()));
        };
        if let Some(sound) = self.sounds.get(&key) {
            debug!(name = key.as_str(), "Using cached sound");
            return Ok(Arc::clone(sound));
        }

        let path = self.sfx_dir.join(&key);
        if !path.is_file() {
            return Err(SoundError::NotFound(name.to_string()));
        }
        if is_hot {
            warn!(name = key.as_str(), "Hot-loading sound that was not prefetched");
        }

        let sound = Arc::new(Sound::load(&self.context, &path, &key)?);
        self.sounds.insert(key, Arc::clone(&sound));
        Ok(sound)
    }

    /// The cache name of a file under the sound effects directory.
    fn name_for(&self, path: &Path) -> Option<String> {
        normalize(path.strip_prefix(&self.sfx_dir).ok()?)
    }
}

/// Turns a relative path into its cache name: `/`-joined normal components.
/// `.` and repeated separators are dropped. Paths that are absolute, climb
/// out with `..`, or are not UTF-8 have no name.
fn normalize(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Recurse into the given directory and collect every WAV file found.
fn find_wav_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = ?dir, error = %e, "Unable to read sound directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        // Linked folders can form cycles.
        if file_type.is_symlink() && path.is_dir() {
            debug!(path = ?path, "Skipping linked sound directory");
            continue;
        }
        if file_type.is_dir() {
            find_wav_files(&path, files);
            continue;
        }

        let extension = path.extension();
        if extension.is_some_and(|ext| ext.eq_ignore_ascii_case("wav")) {
            files.push(path);
        }
    }
}

impl std::fmt::Debug for SoundCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundCache")
            .field("sfx_dir", &self.sfx_dir)
            .field("cached_sounds", &self.sounds.len())
            .field("total_memory_kb", &(self.memory_usage() / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock;
    use crate::testutil::write_wav_with_bits;

    struct Fixture {
        backend: Arc<mock::Backend>,
        cache: SoundCache,
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Fixture {
            let dir = tempfile::tempdir().unwrap();
            let backend = Arc::new(mock::Backend::new("mock", 4));
            let context = Arc::new(Context::new(backend.clone()));
            let cache = SoundCache::new(&context, dir.path());
            Fixture {
                backend,
                cache,
                dir,
            }
        }

        fn write(&self, name: &str, frames: usize) {
            let path = self.dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            write_wav_with_bits(path, vec![vec![0i16; frames]], 44100, 16).unwrap();
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut fixture = Fixture::new();
        fixture.write("beep.wav", 100);

        let first = fixture.cache.resolve("beep.wav").unwrap();
        let second = fixture.cache.resolve("beep.wav").unwrap();
        assert_eq!(first.buffer_id(), second.buffer_id());
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fixture.backend.uploads(), 1);
    }

    #[test]
    fn test_prefetch_then_resolve() {
        let mut fixture = Fixture::new();
        fixture.write("ui/click.wav", 10);

        let prefetched = fixture.cache.prefetch("ui/click.wav").unwrap();
        fixture.cache.prefetch("ui/click.wav").unwrap();
        let resolved = fixture.cache.resolve("ui/click.wav").unwrap();
        assert!(Arc::ptr_eq(&prefetched, &resolved));
        assert_eq!(fixture.backend.uploads(), 1);
        assert_eq!(fixture.cache.len(), 1);
    }

    #[test]
    fn test_names_normalized() {
        let mut fixture = Fixture::new();
        fixture.write("footsteps/left.wav", 10);

        let plain = fixture.cache.resolve("footsteps/left.wav").unwrap();
        let doubled = fixture.cache.resolve("footsteps//left.wav").unwrap();
        let dotted = fixture.cache.resolve("./footsteps/left.wav").unwrap();
        assert!(Arc::ptr_eq(&plain, &doubled));
        assert!(Arc::ptr_eq(&plain, &dotted));
        assert_eq!(fixture.backend.uploads(), 1);
        assert_eq!(plain.name(), "footsteps/left.wav");
        assert!(fixture.cache.get("./footsteps/left.wav").is_some());

        assert!(matches!(
            fixture.cache.resolve("../footsteps/left.wav"),
            Err(SoundError::NotFound(_))
        ));
        assert!(fixture.cache.evict("footsteps//left.wav").is_some());
        assert!(fixture.cache.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_prefetch_all_skips_linked_directories() {
        let mut fixture = Fixture::new();
        fixture.write("loop/a.wav", 10);
        std::os::unix::fs::symlink(
            fixture.dir.path().join("loop"),
            fixture.dir.path().join("loop/again"),
        )
        .unwrap();

        assert_eq!(fixture.cache.prefetch_all("loop").unwrap(), 1);
        assert!(fixture.cache.get("loop/a.wav").is_some());
        assert_eq!(fixture.backend.uploads(), 1);
    }

    #[test]
    fn test_resolve_missing() {
        let mut fixture = Fixture::new();
        assert!(matches!(
            fixture.cache.resolve("nope.wav"),
            Err(SoundError::NotFound(name)) if name == "nope.wav"
        ));
        assert!(fixture.cache.is_empty());
    }

    #[test]
    fn test_resolve_corrupt() {
        let mut fixture = Fixture::new();
        fs::write(fixture.dir.path().join("bad.wav"), b"RIFF????").unwrap();

        assert!(matches!(
            fixture.cache.resolve("bad.wav"),
            Err(SoundError::Load { .. })
        ));
        assert!(fixture.cache.get("bad.wav").is_none());
    }

    #[test]
    fn test_prefetch_all_subfolder() {
        let mut fixture = Fixture::new();
        fixture.write("footsteps/left.wav", 10);
        fixture.write("footsteps/right.WAV", 10);
        fixture.write("footsteps/gravel/left.wav", 10);
        fixture.write("music/theme.wav", 10);
        fs::write(fixture.dir.path().join("footsteps/notes.txt"), b"hi").unwrap();

        assert_eq!(fixture.cache.prefetch_all("footsteps/").unwrap(), 3);
        let names: Vec<&str> = fixture.cache.sorted().into_iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "footsteps/gravel/left.wav",
                "footsteps/left.wav",
                "footsteps/right.WAV"
            ]
        );

        // Already cached sounds are not loaded again.
        assert_eq!(fixture.cache.prefetch_all("").unwrap(), 1);
        assert_eq!(fixture.backend.uploads(), 4);
    }

    #[test]
    fn test_prefetch_all_skips_failures() {
        let mut fixture = Fixture::new();
        fixture.write("sfx/good.wav", 10);
        fs::write(fixture.dir.path().join("sfx/bad.wav"), b"garbage").unwrap();

        assert_eq!(fixture.cache.prefetch_all("sfx").unwrap(), 1);
        assert!(fixture.cache.get("sfx/good.wav").is_some());
        assert!(fixture.cache.get("sfx/bad.wav").is_none());
    }

    #[test]
    fn test_prefetch_all_missing_folder() {
        let mut fixture = Fixture::new();
        assert!(matches!(
            fixture.cache.prefetch_all("nothing"),
            Err(SoundError::NotFound(_))
        ));
    }

    #[test]
    fn test_memory_usage_and_evict() {
        let mut fixture = Fixture::new();
        fixture.write("a.wav", 100);
        fixture.write("b.wav", 50);

        fixture.cache.prefetch("a.wav").unwrap();
        let b = fixture.cache.prefetch("b.wav").unwrap();
        assert_eq!(fixture.cache.memory_usage(), 300);

        fixture.cache.evict("a.wav");
        assert_eq!(fixture.cache.memory_usage(), 100);
        assert_eq!(fixture.backend.live_buffers(), 1);

        // Still referenced outside the cache.
        fixture.cache.evict("b.wav");
        assert_eq!(fixture.backend.live_buffers(), 1);
        drop(b);
        assert_eq!(fixture.backend.live_buffers(), 0);
    }
}
