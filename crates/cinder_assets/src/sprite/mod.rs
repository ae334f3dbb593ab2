//! Renderer-agnostic sprites.
//!
//! A [`SpriteObject`] holds every frame of an image converted to RGBA through
//! a palette, plus animation state. Binding it to a [`Renderer`] uploads one
//! texture per frame, so the current texture changes exactly when the current
//! frame does.

mod factory;

use std::time::Duration;

use cinder_math::IVec2;

use crate::components::{Dc6, Dcc, IndexedFrame, Palette};
use crate::render::{FrameImage, RenderError, Renderer, TextureId};

pub use factory::SpriteFactory;

/// Playback rate used until [`SpriteObject::set_fps`] is called.
pub const DEFAULT_FPS: f64 = 25.0;

/// Errors raised while building or driving a sprite.
#[derive(Debug, thiserror::Error)]
pub enum SpriteError {
    /// The image decoded to zero frames.
    #[error("image has no frames")]
    NoFrames,

    /// A frame's pixel buffer does not match its dimensions.
    #[error("frame {frame}: expected {expected} pixels, got {actual}")]
    FrameSize {
        frame: usize,
        expected: usize,
        actual: usize,
    },

    /// The frame count is not directions times frames per direction.
    #[error("expected {expected} frames ({directions} directions), got {actual}")]
    FrameCount {
        directions: u32,
        expected: usize,
        actual: usize,
    },

    /// A pixel refers past the end of the palette.
    #[error("frame {frame}: palette has no colour {index}")]
    PaletteIndex { frame: usize, index: u8 },

    /// A frame or direction index is out of range.
    #[error("frame index {index} out of range (0..{count})")]
    FrameIndex { index: usize, count: usize },
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteFrame {
    pub width: u32,
    pub height: u32,
    pub offset: IVec2,
    /// Row-major RGBA8.
    pub rgba: Vec<u8>,
}

impl SpriteFrame {
    /// Convert palette indices to RGBA. Index 0 is fully transparent.
    fn from_indexed(
        index: usize,
        frame: &IndexedFrame,
        palette: &Palette,
    ) -> Result<Self, SpriteError> {
        let expected = frame.width as usize * frame.height as usize;
        if frame.pixels.len() != expected {
            return Err(SpriteError::FrameSize {
                frame: index,
                expected,
                actual: frame.pixels.len(),
            });
        }

        let mut rgba = Vec::with_capacity(expected * 4);
        for &px in &frame.pixels {
            if px == 0 {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let [r, g, b] = palette.color(px).ok_or(SpriteError::PaletteIndex {
                frame: index,
                index: px,
            })?;
            rgba.extend_from_slice(&[r, g, b, 255]);
        }

        Ok(Self {
            width: frame.width,
            height: frame.height,
            offset: IVec2::new(frame.offset_x, frame.offset_y),
            rgba,
        })
    }

    #[must_use]
    pub fn image(&self) -> FrameImage<'_> {
        FrameImage {
            width: self.width,
            height: self.height,
            rgba: &self.rgba,
        }
    }
}

/// An animated, multi-direction sprite.
#[derive(Debug, Clone)]
pub struct SpriteObject {
    frames: Vec<SpriteFrame>,
    directions: usize,
    frames_per_direction: usize,
    direction: usize,
    frame: usize,
    fps: f64,
    looping: bool,
    playing: bool,
    /// Time carried over from partial frames, in seconds.
    carry: f64,
    /// One texture per entry in `frames`, once bound.
    textures: Vec<TextureId>,
}

impl SpriteObject {
    /// Build from direction-major indexed frames.
    pub fn from_indexed(
        directions: u32,
        frames_per_direction: u32,
        frames: &[IndexedFrame],
        palette: &Palette,
    ) -> Result<Self, SpriteError> {
        if frames.is_empty() || directions == 0 || frames_per_direction == 0 {
            return Err(SpriteError::NoFrames);
        }
        let expected = directions as usize * frames_per_direction as usize;
        if frames.len() != expected {
            return Err(SpriteError::FrameCount {
                directions,
                expected,
                actual: frames.len(),
            });
        }

        let frames = frames
            .iter()
            .enumerate()
            .map(|(i, f)| SpriteFrame::from_indexed(i, f, palette))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            frames,
            directions: directions as usize,
            frames_per_direction: frames_per_direction as usize,
            direction: 0,
            frame: 0,
            fps: DEFAULT_FPS,
            looping: true,
            playing: true,
            carry: 0.0,
            textures: Vec::new(),
        })
    }

    pub fn from_dc6(dc6: &Dc6, palette: &Palette) -> Result<Self, SpriteError> {
        Self::from_indexed(dc6.directions, dc6.frames_per_direction, &dc6.frames, palette)
    }

    pub fn from_dcc(dcc: &Dcc, palette: &Palette) -> Result<Self, SpriteError> {
        Self::from_indexed(dcc.directions, dcc.frames_per_direction, &dcc.frames, palette)
    }

    /// Frames in the current direction.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames_per_direction
    }

    #[must_use]
    pub fn direction_count(&self) -> usize {
        self.directions
    }

    #[must_use]
    pub fn current_frame(&self) -> usize {
        self.frame
    }

    pub fn set_current_frame(&mut self, index: usize) -> Result<(), SpriteError> {
        if index >= self.frames_per_direction {
            return Err(SpriteError::FrameIndex {
                index,
                count: self.frames_per_direction,
            });
        }
        self.frame = index;
        self.carry = 0.0;
        Ok(())
    }

    #[must_use]
    pub fn current_direction(&self) -> usize {
        self.direction
    }

    /// Switch direction, keeping the frame index.
    pub fn set_direction(&mut self, direction: usize) -> Result<(), SpriteError> {
        if direction >= self.directions {
            return Err(SpriteError::FrameIndex {
                index: direction,
                count: self.directions,
            });
        }
        self.direction = direction;
        Ok(())
    }

    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Set the playback rate. Non-positive or non-finite rates pause playback.
    pub fn set_fps(&mut self, fps: f64) {
        self.fps = if fps.is_finite() && fps > 0.0 { fps } else { 0.0 };
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.carry = 0.0;
    }

    fn index(&self) -> usize {
        self.direction * self.frames_per_direction + self.frame
    }

    /// The frame currently shown.
    #[must_use]
    pub fn frame(&self) -> &SpriteFrame {
        &self.frames[self.index()]
    }

    #[must_use]
    pub fn current_frame_size(&self) -> (u32, u32) {
        let f = self.frame();
        (f.width, f.height)
    }

    #[must_use]
    pub fn current_frame_offset(&self) -> IVec2 {
        self.frame().offset
    }

    /// Advance playback by `dt`. Returns `true` if the frame changed.
    ///
    /// A non-looping sprite stops on its last frame.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.playing || self.fps <= 0.0 || self.frames_per_direction < 2 {
            return false;
        }

        let frame_time = 1.0 / self.fps;
        if frame_time <= 0.0 {
            return false;
        }
        self.carry += dt.as_secs_f64();
        let steps = (self.carry / frame_time).floor();
        if steps < 1.0 {
            return false;
        }
        self.carry %= frame_time;

        // Saturating cast: only the step count modulo the frame count matters.
        let steps = steps as u64;
        let count = self.frames_per_direction as u64;
        let before = self.frame;
        let last = self.frames_per_direction - 1;

        if self.looping {
            self.frame = ((before as u64 + steps % count) % count) as usize;
        } else if steps > (last - before) as u64 {
            self.frame = last;
            self.stop();
        } else {
            self.frame = before + steps as usize;
        }

        self.frame != before
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.textures.is_empty()
    }

    /// Upload every frame to `renderer`. On failure the textures created so
    /// far are destroyed and the sprite stays unbound.
    pub fn bind_renderer(&mut self, renderer: &mut dyn Renderer) -> Result<(), RenderError> {
        let mut textures = Vec::with_capacity(self.frames.len());
        for frame in &self.frames {
            match renderer.create_texture(&frame.image()) {
                Ok(texture) => textures.push(texture),
                Err(err) => {
                    for texture in textures {
                        renderer.destroy_texture(texture);
                    }
                    return Err(err);
                }
            }
        }
        self.textures = textures;
        Ok(())
    }

    /// Texture of the current frame, once bound.
    #[must_use]
    pub fn current_texture(&self) -> Option<TextureId> {
        self.textures.get(self.index()).copied()
    }
}
