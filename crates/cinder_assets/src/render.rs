//! The renderer collaborator.
//!
//! Sprites are renderer-agnostic until bound. Binding uploads one texture per
//! frame through whatever [`Renderer`] is published as the [`ActiveRenderer`]
//! world resource; while that resource is absent, sprites simply wait.

use std::collections::HashSet;
use std::fmt;

/// Opaque handle to a texture owned by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Texture({})", self.0)
    }
}

/// A decoded RGBA8 frame, row-major, `width * height * 4` bytes.
#[derive(Debug, Clone, Copy)]
pub struct FrameImage<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba: &'a [u8],
}

/// Errors raised by a renderer backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The backend could not realise a texture.
    #[error("cannot create {width}x{height} texture: {reason}")]
    Rejected {
        width: u32,
        height: u32,
        reason: String,
    },
}

/// A rendering backend able to turn frames into textures.
pub trait Renderer {
    /// Backend name for logs.
    fn name(&self) -> &str;

    /// Upload `image` and return a handle to the new texture.
    fn create_texture(&mut self, image: &FrameImage<'_>) -> Result<TextureId, RenderError>;

    /// Release a texture created by this renderer. Unknown ids are ignored.
    fn destroy_texture(&mut self, texture: TextureId);
}

/// World resource holding the renderer in use.
pub struct ActiveRenderer(pub Box<dyn Renderer>);

impl ActiveRenderer {
    pub fn new(renderer: impl Renderer + 'static) -> Self {
        Self(Box::new(renderer))
    }
}

impl fmt::Debug for ActiveRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActiveRenderer").field(&self.0.name()).finish()
    }
}

/// A renderer with no device: hands out sequential ids and keeps counts.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    next: u64,
    bytes: usize,
    live: HashSet<TextureId>,
}

impl HeadlessRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of textures created so far.
    #[must_use]
    pub fn textures_created(&self) -> u64 {
        self.next
    }

    /// Textures created and not yet destroyed.
    #[must_use]
    pub fn textures_live(&self) -> usize {
        self.live.len()
    }

    /// Total pixel bytes uploaded.
    #[must_use]
    pub fn bytes_uploaded(&self) -> usize {
        self.bytes
    }
}

impl Renderer for HeadlessRenderer {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_texture(&mut self, image: &FrameImage<'_>) -> Result<TextureId, RenderError> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.rgba.len() != expected {
            return Err(RenderError::Rejected {
                width: image.width,
                height: image.height,
                reason: format!("expected {expected} bytes, got {}", image.rgba.len()),
            });
        }
        self.next += 1;
        self.bytes += expected;
        let id = TextureId(self.next);
        self.live.insert(id);
        Ok(id)
    }

    fn destroy_texture(&mut self, texture: TextureId) {
        self.live.remove(&texture);
    }
}
