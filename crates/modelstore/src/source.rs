//! File-reading collaborator: whole-file reads with distinct failure modes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Why a read failed. No variant ever carries partial content.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{}: no such file", .path.display())]
    NotFound { path: PathBuf },
    #[error("{}: not a regular file", .path.display())]
    NotRegular { path: PathBuf },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Byte-oriented asset reads. The store is generic over this so tests can
/// substitute in-memory stubs and count reads.
pub trait AssetSource {
    /// Read a whole file, addressed relative to the source.
    fn read(&self, path: &Path) -> Result<Vec<u8>, SourceError>;
}

/// Reads assets from a directory tree on disk.
#[derive(Clone, Debug)]
pub struct DiskSource {
    root: PathBuf,
}

impl DiskSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DiskSource {
    fn read(&self, path: &Path) -> Result<Vec<u8>, SourceError> {
        let full = self.root.join(path);

        // Stat first so directories and sockets fail as such rather than
        // as an opaque read error.
        let meta = match fs::metadata(&full) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound { path: full });
            }
            Err(e) => return Err(SourceError::Io { path: full, source: e }),
        };
        if !meta.is_file() {
            return Err(SourceError::NotRegular { path: full });
        }

        fs::read(&full).map_err(|e| SourceError::Io { path: full, source: e })
    }
}
