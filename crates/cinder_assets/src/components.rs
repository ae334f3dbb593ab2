//! Components carried by file and sprite entities.

use std::fmt;

use cinder_component::{Component, Entity};
use cinder_math::DVec2;

use crate::render::TextureId;
use crate::source::{DataStream, Source};
use crate::sprite::SpriteObject;

macro_rules! component_name {
    ($ty:ty, $name:literal) => {
        impl Component for $ty {
            fn type_name() -> &'static str {
                $name
            }
        }
    };
}

/// Path of a file entity, as the producer gave it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePath(pub String);

impl FilePath {
    /// Wrap a path exactly as given; resolvers normalise it later.
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Classification of a file entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Could not be classified; no stage picks it up.
    Unknown,
    /// An `.mpq` archive, mounted as a source.
    Archive,
    /// A filesystem directory, mounted as a source.
    Directory,
    /// Animation data (`.d2`).
    D2,
    /// Compressed sprite (`.dcc`).
    Dcc,
    /// Uncompressed sprite (`.dc6`).
    Dc6,
    /// Sound effect or music (`.wav`).
    Wav,
    /// Map preset (`.ds1`).
    Ds1,
    /// Map tile set (`.dt1`).
    Dt1,
    /// Palette transform table (`.pl2`).
    PaletteTransform,
    /// 256-colour palette (`.dat`).
    Palette,
    /// Localised strings (`.tbl`).
    StringTable,
    /// Glyph metrics (`.tbl` under a font path).
    FontTable,
    /// Tab-separated data table (`.txt`).
    DataDictionary,
    /// Composite animation layout (`.cof`).
    Cof,
    /// JSON document.
    Json,
}

impl FileType {
    /// Classify by extension alone. `path` disambiguates `.tbl` files, which
    /// are font tables when the path mentions `FONT`.
    #[must_use]
    pub fn from_extension(ext: &str, path: &str) -> Option<Self> {
        let kind = match ext.to_ascii_lowercase().as_str() {
            "mpq" => Self::Archive,
            "d2" => Self::D2,
            "dcc" => Self::Dcc,
            "dc6" => Self::Dc6,
            "wav" => Self::Wav,
            "ds1" => Self::Ds1,
            "dt1" => Self::Dt1,
            "pl2" => Self::PaletteTransform,
            "dat" => Self::Palette,
            "tbl" if path.contains("FONT") => Self::FontTable,
            "tbl" => Self::StringTable,
            "txt" => Self::DataDictionary,
            "cof" => Self::Cof,
            "json" => Self::Json,
            _ => return None,
        };
        Some(kind)
    }

    /// Archives and directories become sources, not handles.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Archive | Self::Directory)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Marks a file the pipeline has given up on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Unresolvable;

/// A container that can open other files.
pub struct FileSource(pub Box<dyn Source>);

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSource")
            .field("kind", &self.0.kind())
            .field("root", &self.0.root())
            .finish()
    }
}

/// An open stream over a file's bytes, waiting to be parsed.
pub struct FileHandle(pub Box<dyn DataStream>);

impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FileHandle")
    }
}

/// One palette-indexed frame as produced by a sprite decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFrame {
    pub width: u32,
    pub height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    /// Row-major palette indices, `width * height` long.
    pub pixels: Vec<u8>,
}

/// A decoded DC6 image. Frames are stored direction-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dc6 {
    pub directions: u32,
    pub frames_per_direction: u32,
    pub frames: Vec<IndexedFrame>,
}

/// A decoded DCC image. Frames are stored direction-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dcc {
    pub directions: u32,
    pub frames_per_direction: u32,
    pub frames: Vec<IndexedFrame>,
}

/// A decoded 256-colour palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<[u8; 3]>,
}

impl Palette {
    #[must_use]
    pub fn color(&self, index: u8) -> Option<[u8; 3]> {
        self.colors.get(index as usize).copied()
    }
}

/// A sprite built from an image and a palette.
#[derive(Debug, Clone)]
pub struct Sprite(pub SpriteObject);

/// The renderer texture for a sprite's current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture(pub TextureId);

/// Draw offset of a sprite's current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Origin(pub DVec2);

/// A sprite whose frames are tiles of one large image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentedSprite {
    pub x_segments: u32,
    pub y_segments: u32,
    pub frame_offset: u32,
}

/// Load-queue entry: the sprite entity waits on these two file entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteLoad {
    pub image: Entity,
    pub palette: Entity,
}

component_name!(FilePath, "FilePath");
component_name!(FileType, "FileType");
component_name!(Unresolvable, "Unresolvable");
component_name!(FileSource, "FileSource");
component_name!(FileHandle, "FileHandle");
component_name!(Dc6, "Dc6");
component_name!(Dcc, "Dcc");
component_name!(Palette, "Palette");
component_name!(Sprite, "Sprite");
component_name!(Texture, "Texture");
component_name!(Origin, "Origin");
component_name!(SegmentedSprite, "SegmentedSprite");
component_name!(SpriteLoad, "SpriteLoad");
