//! Open-and-lock synchronizer for request files.
//!
//! # Responsibilities
//! - Resolve request URIs to paths under the storage root
//! - Open a file and take its advisory lock as one step relative to other
//!   requests of the same kind
//! - Hand the locked descriptor to the handler as a lease that unlocks on drop
//!
//! # Design Decisions
//! - Two disjoint critical sections: one for readers, one for writers
//! - The advisory lock (shared for GET, exclusive for PUT) is the real
//!   cross-request invariant; the sections only close the window between
//!   `open` and `flock` in which a writer could truncate under a reader
//! - Data transfer happens after the section is released

use std::fs::{File, Metadata, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs2::FileExt;
use thiserror::Error;

use crate::http::Response;

/// Failure to obtain a locked descriptor for a request.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("open failed: {0}")]
    Open(#[source] io::Error),
    #[error("advisory lock failed: {0}")]
    Lock(#[source] io::Error),
    #[error("truncate failed: {0}")]
    Truncate(#[source] io::Error),
    #[error("stat failed: {0}")]
    Stat(#[source] io::Error),
    #[error("path is a directory")]
    IsDirectory,
}

impl AccessError {
    /// Response a GET should produce for this failure.
    pub fn get_response(&self) -> Response {
        match self {
            AccessError::Open(e) => match e.kind() {
                io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory => Response::Forbidden,
                io::ErrorKind::NotFound => Response::NotFound,
                _ => Response::InternalServerError,
            },
            AccessError::IsDirectory => Response::Forbidden,
            AccessError::Lock(_) | AccessError::Truncate(_) | AccessError::Stat(_) => {
                Response::InternalServerError
            }
        }
    }

    /// Response a PUT should produce for this failure.
    ///
    /// Unlike GET, a missing path (e.g. a missing parent directory) is
    /// reported as forbidden.
    pub fn put_response(&self) -> Response {
        match self {
            AccessError::Open(e) => match e.kind() {
                io::ErrorKind::PermissionDenied
                | io::ErrorKind::NotFound
                | io::ErrorKind::IsADirectory => Response::Forbidden,
                _ => Response::InternalServerError,
            },
            AccessError::IsDirectory => Response::Forbidden,
            AccessError::Lock(_) | AccessError::Truncate(_) | AccessError::Stat(_) => {
                Response::InternalServerError
            }
        }
    }
}

/// Process-wide table of the open+lock critical sections.
#[derive(Debug)]
pub struct FileAccess {
    root: PathBuf,
    read_section: Mutex<()>,
    write_section: Mutex<()>,
}

impl FileAccess {
    /// Create a synchronizer resolving URIs under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_section: Mutex::new(()),
            write_section: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request URI to a filesystem path.
    pub fn resolve(&self, uri: &str) -> PathBuf {
        self.root.join(uri.trim_start_matches('/'))
    }

    /// Open `uri` read-only under a shared advisory lock.
    pub fn open_read(&self, uri: &str) -> Result<ReadLease, AccessError> {
        let path = self.resolve(uri);

        let file = {
            let _section = section(&self.read_section);
            let file = File::open(&path).map_err(AccessError::Open)?;
            // Taken before leaving the section so no writer can slip in
            // between our open and our lock.
            FileExt::lock_shared(&file).map_err(AccessError::Lock)?;
            file
        };

        let lease = ReadLease { file };
        let metadata = lease.metadata()?;
        if metadata.is_dir() {
            return Err(AccessError::IsDirectory);
        }
        Ok(lease)
    }

    /// Open `uri` write-only, creating it if absent, truncated and under an
    /// exclusive advisory lock.
    pub fn open_write(&self, uri: &str) -> Result<WriteLease, AccessError> {
        let path = self.resolve(uri);
        let existed = path.exists();

        let _section = section(&self.write_section);
        let file = open_for_write(&path).map_err(AccessError::Open)?;
        FileExt::lock_exclusive(&file).map_err(AccessError::Lock)?;
        // Truncate only once exclusive: readers holding the shared lock must
        // keep seeing the old contents until they finish.
        file.set_len(0).map_err(AccessError::Truncate)?;

        Ok(WriteLease { file, existed })
    }
}

fn section(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(unix)]
fn open_for_write(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new().write(true).create(true).mode(0o600).open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path) -> io::Result<File> {
    OpenOptions::new().write(true).create(true).open(path)
}

/// A read-only descriptor held under a shared lock.
#[derive(Debug)]
pub struct ReadLease {
    file: File,
}

impl ReadLease {
    pub fn metadata(&self) -> Result<Metadata, AccessError> {
        self.file.metadata().map_err(AccessError::Stat)
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> Result<u64, AccessError> {
        Ok(self.metadata()?.len())
    }

    pub fn file(&mut self) -> &mut File {
        &mut self.file
    }
}

impl Drop for ReadLease {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// A truncated write-only descriptor held under an exclusive lock.
#[derive(Debug)]
pub struct WriteLease {
    file: File,
    existed: bool,
}

impl WriteLease {
    /// Whether the path existed before this request opened it.
    pub fn existed(&self) -> bool {
        self.existed
    }

    pub fn file(&mut self) -> &mut File {
        &mut self.file
    }
}

impl Drop for WriteLease {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
