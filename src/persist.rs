use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use directories::ProjectDirs;
use log::{info, warn};

// Bumped whenever the blob shape changes incompatibly, so an old build never
// tramples a newer save.
pub const SAVE_FILE: &str = "progress_v1.json";

/// Where the progression blob lives. Injected into the engine so tests and
/// embedders choose their own storage and engine instances never share
/// hidden state.
pub trait SavePort {
    /// The previously saved blob, or `None` when there is no usable save.
    fn load(&self) -> Option<String>;
    fn save(&self, blob: &str) -> io::Result<()>;
}

/// Save blob on disk in the platform data directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store under the platform-native data dir. `None` when the platform
    /// offers no home directory to resolve against.
    pub fn at_default_location() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "beatfall")?;
        Some(Self {
            path: dirs.data_dir().join(SAVE_FILE),
        })
    }

    pub fn at_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SavePort for FileStore {
    fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Some(blob),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No save at {}", self.path.display());
                None
            }
            Err(e) => {
                warn!("Could not read save at {}: {e}", self.path.display());
                None
            }
        }
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, blob)
    }
}

/// In-memory store for tests and embedders that persist elsewhere. Clones
/// share one slot, so a caller can keep a handle after boxing the port.
#[derive(Clone, Default)]
pub struct MemStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: &str) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(blob.to_string()))),
        }
    }

    pub fn blob(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl SavePort for MemStore {
    fn load(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    fn save(&self, blob: &str) -> io::Result<()> {
        *self.slot.borrow_mut() = Some(blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::at_path(dir.path().join("nested").join(SAVE_FILE));
        assert_eq!(store.load(), None, "fresh path should have no save");

        store.save("{\"currency\":5}").expect("save");
        assert_eq!(store.load().as_deref(), Some("{\"currency\":5}"));

        store.save("{\"currency\":9}").expect("overwrite");
        assert_eq!(store.load().as_deref(), Some("{\"currency\":9}"));
    }

    #[test]
    fn mem_store_round_trips() {
        let store = MemStore::new();
        assert_eq!(store.load(), None);
        store.save("blob").expect("mem save");
        assert_eq!(store.load().as_deref(), Some("blob"));
        assert_eq!(store.blob().as_deref(), Some("blob"));
    }

    #[test]
    fn preseeded_mem_store_serves_its_blob() {
        let store = MemStore::with_blob("{\"highest_level\":4}");
        assert_eq!(store.load().as_deref(), Some("{\"highest_level\":4}"));
    }

    #[test]
    fn mem_store_clones_share_one_slot() {
        let handle = MemStore::new();
        let owned = handle.clone();
        owned.save("shared").expect("mem save");
        assert_eq!(handle.blob().as_deref(), Some("shared"));
    }
}
