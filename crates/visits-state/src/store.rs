use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use visits_common::replace_file;
use visits_model::RunState;

use crate::error::{Result, StateError};

/// Where run state lives between runs.
///
/// `load` returning `Ok(None)` means no run has saved state yet.
pub trait RunStateStore {
    fn load(&self) -> Result<Option<RunState>>;
    fn save(&self, state: &RunState) -> Result<()>;
}

/// Run state as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RunStateStore for JsonFileStore {
    fn load(&self) -> Result<Option<RunState>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no run state yet");
                return Ok(None);
            }
            Err(source) => {
                return Err(StateError::Io {
                    operation: "read",
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let state = serde_json::from_slice(&bytes).map_err(|source| {
            StateError::Deserialization {
                path: self.path.clone(),
                source,
            }
        })?;
        Ok(Some(state))
    }

    fn save(&self, state: &RunState) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(state)
            .map_err(|source| StateError::Serialization { source })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StateError::Io {
                operation: "create directory",
                path: parent.to_path_buf(),
                source,
            })?;
        }

        replace_file(&self.path, &bytes)?;

        info!(
            path = %self.path.display(),
            last_row_count = state.last_row_count,
            watermark = ?state.watermark,
            "run state saved"
        );
        Ok(())
    }
}

/// In-process store, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<Option<RunState>>,
}

impl MemoryStore {
    pub fn new(initial: Option<RunState>) -> Self {
        Self {
            state: RefCell::new(initial),
        }
    }

    pub fn get(&self) -> Option<RunState> {
        *self.state.borrow()
    }
}

impl RunStateStore for MemoryStore {
    fn load(&self) -> Result<Option<RunState>> {
        Ok(self.get())
    }

    fn save(&self, state: &RunState) -> Result<()> {
        *self.state.borrow_mut() = Some(*state);
        Ok(())
    }
}
