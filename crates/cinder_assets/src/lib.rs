//! # cinder_assets
//!
//! The asset pipeline. Each file is an entity that walks through a sequence
//! of stages purely by gaining components:
//!
//! ```text
//! FilePath ─► FileType ─► FileSource        (archives, directories)
//!                     └─► FileHandle ─► Dc6 / Dcc / Palette (external parsers)
//! ```
//!
//! - [`FileTypeResolver`] classifies paths.
//! - [`FileSourceResolver`] turns archives and directories into [`Source`]s.
//! - [`FileHandleResolver`] opens every other file through the first source
//!   that has it.
//! - [`SpriteFactory`] waits for a parsed image and palette, builds a
//!   [`SpriteObject`], and binds it to the active [`Renderer`].
//!
//! Anything that cannot be classified or opened gets the [`Unresolvable`]
//! marker and drops out of every later stage.

pub mod components;
pub mod file_handle;
pub mod file_source;
pub mod file_type;
pub mod render;
pub mod source;
pub mod sprite;

#[cfg(test)]
pub(crate) mod fakes;

pub use components::{
    Dc6, Dcc, FileHandle, FilePath, FileSource, FileType, IndexedFrame, Origin, Palette,
    SegmentedSprite, Sprite, SpriteLoad, Texture, Unresolvable,
};
pub use file_handle::FileHandleResolver;
pub use file_source::FileSourceResolver;
pub use file_type::FileTypeResolver;
pub use render::{ActiveRenderer, FrameImage, HeadlessRenderer, RenderError, Renderer, TextureId};
pub use source::{
    Archive, ArchiveOpener, ArchiveSource, DataStream, DirectorySource, NoArchives, Source,
    SourceError,
};
pub use sprite::{SpriteError, SpriteFactory, SpriteFrame, SpriteObject};
