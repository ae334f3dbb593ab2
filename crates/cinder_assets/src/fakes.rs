//! In-memory collaborators shared by the unit tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::render::{FrameImage, HeadlessRenderer, RenderError, Renderer, TextureId};
use crate::source::{Archive, ArchiveOpener, DataStream, SourceError};

type Entries = HashMap<String, Vec<u8>>;

/// Archive backend that knows a fixed set of archive paths.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryArchives {
    archives: HashMap<PathBuf, Arc<Entries>>,
}

impl MemoryArchives {
    pub(crate) fn with_archive<'a>(
        mut self,
        path: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
    ) -> Self {
        let entries = entries
            .into_iter()
            .map(|(name, data)| (name.to_owned(), data.to_vec()))
            .collect();
        self.archives.insert(PathBuf::from(path), Arc::new(entries));
        self
    }
}

impl ArchiveOpener for MemoryArchives {
    fn open(&self, path: &Path) -> Result<Box<dyn Archive>, SourceError> {
        match self.archives.get(path) {
            Some(entries) => Ok(Box::new(MemoryArchive {
                path: path.to_path_buf(),
                entries: Arc::clone(entries),
            })),
            None => Err(SourceError::Archive {
                path: path.display().to_string(),
                reason: "not an archive".to_owned(),
            }),
        }
    }
}

struct MemoryArchive {
    path: PathBuf,
    entries: Arc<Entries>,
}

impl Archive for MemoryArchive {
    fn path(&self) -> &Path {
        &self.path
    }

    fn open_stream(&self, internal: &str) -> Result<Box<dyn DataStream>, SourceError> {
        self.entries
            .get(internal)
            .map(|data| Box::new(Cursor::new(data.clone())) as Box<dyn DataStream>)
            .ok_or_else(|| SourceError::NotFound {
                path: internal.to_owned(),
            })
    }
}

/// Renderer that refuses every texture.
#[derive(Debug, Default)]
pub(crate) struct BrokenRenderer;

impl Renderer for BrokenRenderer {
    fn name(&self) -> &str {
        "broken"
    }

    fn create_texture(&mut self, image: &FrameImage<'_>) -> Result<TextureId, RenderError> {
        Err(RenderError::Rejected {
            width: image.width,
            height: image.height,
            reason: "device lost".to_owned(),
        })
    }

    fn destroy_texture(&mut self, _texture: TextureId) {}
}

/// Headless renderer that runs out of memory after `budget` textures.
#[derive(Debug, Default)]
pub(crate) struct LimitedRenderer {
    pub(crate) inner: HeadlessRenderer,
    pub(crate) budget: u64,
}

impl Renderer for LimitedRenderer {
    fn name(&self) -> &str {
        "limited"
    }

    fn create_texture(&mut self, image: &FrameImage<'_>) -> Result<TextureId, RenderError> {
        if self.inner.textures_created() >= self.budget {
            return Err(RenderError::Rejected {
                width: image.width,
                height: image.height,
                reason: "out of texture memory".to_owned(),
            });
        }
        self.inner.create_texture(image)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.inner.destroy_texture(texture);
    }
}
