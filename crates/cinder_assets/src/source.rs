//! Byte-stream sources: directories on disk and archives.
//!
//! The pipeline never decodes archive formats itself. An [`ArchiveOpener`]
//! supplied by the embedder turns a path into an [`Archive`]; everything
//! downstream only sees the [`Source`] trait.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// A readable, seekable byte stream owned by a component.
pub trait DataStream: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> DataStream for T {}

/// Errors raised while opening sources and streams.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Underlying filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source does not contain the requested path.
    #[error("`{path}` not found")]
    NotFound {
        /// The path that was looked up.
        path: String,
    },

    /// The archive backend refused the file.
    #[error("archive `{path}`: {reason}")]
    Archive {
        /// Archive path on disk.
        path: String,
        /// Backend-specific explanation.
        reason: String,
    },
}

/// Something that can open streams by path: an archive or a directory root.
pub trait Source: Send + Sync {
    /// Short label for logs, e.g. `"directory"`.
    fn kind(&self) -> &'static str;

    /// Where this source lives on disk.
    fn root(&self) -> &Path;

    /// Open `path`, relative to the source.
    fn open(&self, path: &str) -> Result<Box<dyn DataStream>, SourceError>;
}

/// An opened archive.
pub trait Archive: Send + Sync {
    /// Filesystem path the archive was opened from.
    fn path(&self) -> &Path;

    /// Open an entry by its internal (backslash-separated) path.
    fn open_stream(&self, internal: &str) -> Result<Box<dyn DataStream>, SourceError>;
}

/// Archive backend. Used both to probe whether a path is an archive and to
/// open it for reading.
pub trait ArchiveOpener: Send + Sync {
    /// Open `path` as an archive, failing if it is not one.
    fn open(&self, path: &Path) -> Result<Box<dyn Archive>, SourceError>;
}

/// An [`ArchiveOpener`] that recognises nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoArchives;

impl ArchiveOpener for NoArchives {
    fn open(&self, path: &Path) -> Result<Box<dyn Archive>, SourceError> {
        Err(SourceError::Archive {
            path: path.display().to_string(),
            reason: "no archive backend configured".to_owned(),
        })
    }
}

/// A directory on disk. Paths are joined onto the root.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Root a source at `root`, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SourceError> {
        let root = root.into();
        if !std::fs::metadata(&root)?.is_dir() {
            return Err(SourceError::NotFound {
                path: root.display().to_string(),
            });
        }
        Ok(Self { root })
    }

    /// Absolute location of `path` under this root.
    #[must_use]
    pub fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches(['/', '\\']))
    }
}

impl Source for DirectorySource {
    fn kind(&self) -> &'static str {
        "directory"
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn open(&self, path: &str) -> Result<Box<dyn DataStream>, SourceError> {
        let full = self.full_path(path);
        match File::open(&full) {
            Ok(file) => Ok(Box::new(file)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(SourceError::NotFound {
                path: full.display().to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }
}

/// A [`Source`] over an opened [`Archive`].
pub struct ArchiveSource {
    archive: Box<dyn Archive>,
}

impl ArchiveSource {
    #[must_use]
    pub fn new(archive: Box<dyn Archive>) -> Self {
        Self { archive }
    }

    /// Archive entries use backslashes and no leading separator.
    #[must_use]
    pub fn internal_path(path: &str) -> String {
        let path = path.replace('/', "\\");
        match path.strip_prefix('\\') {
            Some(rest) => rest.to_owned(),
            None => path,
        }
    }
}

impl Source for ArchiveSource {
    fn kind(&self) -> &'static str {
        "archive"
    }

    fn root(&self) -> &Path {
        self.archive.path()
    }

    fn open(&self, path: &str) -> Result<Box<dyn DataStream>, SourceError> {
        self.archive.open_stream(&Self::internal_path(path))
    }
}

impl std::fmt::Debug for ArchiveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSource")
            .field("path", &self.archive.path())
            .finish()
    }
}
