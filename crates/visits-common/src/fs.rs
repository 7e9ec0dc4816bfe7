//! File writes used by snapshots, reports and run state.
//!
//! [`write_new_file`] never overwrites: artifacts that share a timestamp get a
//! numeric suffix. [`replace_file`] swaps in new contents atomically through a
//! `.tmp` sibling.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temp file was written but could not replace the target.
    #[error("failed to replace {target_path}")]
    Rename {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(operation: &'static str, path: &Path) -> impl FnOnce(io::Error) -> WriteError {
    let path = path.to_path_buf();
    move |source| WriteError::Io {
        operation,
        path,
        source,
    }
}

/// Create `name` in `dir`; when it already exists, try `name_1`, `name_2`, ...
pub fn write_new_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, WriteError> {
    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    let mut attempt = 0usize;
    loop {
        let candidate = match (attempt, ext) {
            (0, _) => dir.join(name),
            (_, "") => dir.join(format!("{stem}_{attempt}")),
            _ => dir.join(format!("{stem}_{attempt}.{ext}")),
        };
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(mut file) => {
                file.write_all(bytes)
                    .and_then(|()| file.sync_all())
                    .map_err(io_error("write", &candidate))?;
                return Ok(candidate);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(source) => return Err(io_error("create", &candidate)(source)),
        }
    }
}

/// Path of the temp sibling used by [`replace_file`].
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `bytes`: write a temp sibling, sync it, rename it over.
pub fn replace_file(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let temp = temp_path(path);
    let mut file = File::create(&temp).map_err(io_error("create", &temp))?;
    file.write_all(bytes).map_err(io_error("write", &temp))?;
    file.sync_all().map_err(io_error("sync", &temp))?;
    fs::rename(&temp, path).map_err(|source| WriteError::Rename {
        temp_path: temp.clone(),
        target_path: path.to_path_buf(),
        source,
    })
}
