//! Loading progress, derived from how many files sit in each pipeline stage.
//!
//! | stage     | has                              | lacks                         |
//! |-----------|----------------------------------|-------------------------------|
//! | untyped   | FilePath                         | FileType, any loaded kind     |
//! | unhandled | FilePath, FileType               | any loaded kind               |
//! | unparsed  | FilePath, FileType, FileHandle   | FileSource, any parsed kind   |
//! | loaded    | one of the loaded kinds          |                               |
//!
//! Loaded kinds are `FileHandle`, `FileSource`, and the parsed assets (`Dc6`,
//! `Dcc`, `Palette`). Files marked `Unresolvable` never count as pending.

use cinder_assets::{
    Dc6, Dcc, FileHandle, FilePath, FileSource, FileType, Palette, Sprite, SpriteFactory,
    Unresolvable,
};
use cinder_component::{ComponentTypeId, Entity, Filter};
use cinder_world::{SubscriptionId, System, World};
use tracing::{debug, info, warn};

/// Overlay alpha change per tick.
pub const FADE_STEP: f64 = 0.125;

fn parsed_kinds() -> [ComponentTypeId; 3] {
    [
        ComponentTypeId::of::<Dc6>(),
        ComponentTypeId::of::<Dcc>(),
        ComponentTypeId::of::<Palette>(),
    ]
}

fn loaded_kinds() -> impl Iterator<Item = ComponentTypeId> {
    [
        ComponentTypeId::of::<FileHandle>(),
        ComponentTypeId::of::<FileSource>(),
    ]
    .into_iter()
    .chain(parsed_kinds())
}

/// Number of files in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub untyped: usize,
    pub unhandled: usize,
    pub unparsed: usize,
    pub loaded: usize,
}

impl StageCounts {
    #[must_use]
    pub fn pending(&self) -> usize {
        self.untyped + self.unhandled + self.unparsed
    }

    /// `1 - pending / 3 / loaded`, clamped to `[0, 1]`. Nothing loaded yet
    /// means no progress.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.loaded == 0 {
            return 0.0;
        }
        let p = 1.0 - (self.pending() as f64 / 3.0 / self.loaded as f64);
        p.clamp(0.0, 1.0)
    }
}

/// Snapshot published as a world resource after every update, so code that
/// only sees the [`World`] can follow loading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoadStatus {
    pub counts: StageCounts,
    pub progress: f64,
    pub loading: bool,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy)]
struct Stages {
    untyped: SubscriptionId,
    unhandled: SubscriptionId,
    unparsed: SubscriptionId,
    loaded: SubscriptionId,
}

/// Tracks pipeline progress and fades a loading overlay in and out.
///
/// Optionally owns a loading-screen sprite whose frame follows progress.
#[derive(Debug, Default)]
pub struct LoadProgress {
    stages: Option<Stages>,
    counts: StageCounts,
    progress: f64,
    alpha: f64,
    was_loading: bool,
    screen: Option<(String, String)>,
    screen_sprite: Option<Entity>,
}

impl LoadProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also show a loading-screen sprite built from `image` and `palette`.
    #[must_use]
    pub fn with_loading_screen(
        mut self,
        image: impl Into<String>,
        palette: impl Into<String>,
    ) -> Self {
        self.screen = Some((image.into(), palette.into()));
        self
    }

    #[must_use]
    pub fn counts(&self) -> StageCounts {
        self.counts
    }

    /// Progress in `[0, 1]` as of the last update.
    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// `true` while any file waits in a pending stage.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.counts.pending() > 0
    }

    /// Overlay alpha in `[0, 1]`.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn status(&self) -> LoadStatus {
        LoadStatus {
            counts: self.counts,
            progress: self.progress,
            loading: self.is_loading(),
            alpha: self.alpha,
        }
    }

    #[must_use]
    pub fn loading_sprite(&self) -> Option<Entity> {
        self.screen_sprite
    }

    fn count(world: &World, stages: Stages) -> StageCounts {
        StageCounts {
            untyped: world.subscription(stages.untyped).len(),
            unhandled: world.subscription(stages.unhandled).len(),
            unparsed: world.subscription(stages.unparsed).len(),
            loaded: world.subscription(stages.loaded).len(),
        }
    }

    fn update_alpha(&mut self) {
        self.alpha = if self.is_loading() {
            (self.alpha + FADE_STEP).min(1.0)
        } else {
            (self.alpha - FADE_STEP).max(0.0)
        };
    }

    /// Show the frame proportional to progress.
    fn update_sprite_frame(&self, world: &mut World) {
        let Some(entity) = self.screen_sprite else {
            return;
        };
        let Some(Sprite(sprite)) = world.get_component_mut::<Sprite>(entity) else {
            return;
        };
        let last = sprite.frame_count().saturating_sub(1);
        let frame = ((self.progress * last as f64) as usize).min(last);
        if let Err(err) = sprite.set_current_frame(frame) {
            warn!(%entity, %err, "cannot set loading frame");
        }
    }
}

impl System for LoadProgress {
    fn name(&self) -> &'static str {
        "load_progress"
    }

    fn init(&mut self, world: &mut World) {
        info!("initializing load progress");
        let path = ComponentTypeId::of::<FilePath>();
        let file_type = ComponentTypeId::of::<FileType>();
        let handle = ComponentTypeId::of::<FileHandle>();
        let unresolvable = ComponentTypeId::of::<Unresolvable>();

        let untyped = Filter::builder()
            .require_id(path)
            .forbid_id(file_type)
            .forbid_id(unresolvable)
            .forbid_all(loaded_kinds())
            .build();
        let unhandled = Filter::builder()
            .require_id(path)
            .require_id(file_type)
            .forbid_id(unresolvable)
            .forbid_all(loaded_kinds())
            .build();
        let unparsed = Filter::builder()
            .require_id(path)
            .require_id(file_type)
            .require_id(handle)
            .forbid_id(unresolvable)
            .forbid_id(ComponentTypeId::of::<FileSource>())
            .forbid_all(parsed_kinds())
            .build();
        let loaded = Filter::builder().require_any_of(loaded_kinds()).build();

        self.stages = Some(Stages {
            untyped: world.add_subscription(untyped),
            unhandled: world.add_subscription(unhandled),
            unparsed: world.add_subscription(unparsed),
            loaded: world.add_subscription(loaded),
        });

        if let Some((image, palette)) = &self.screen {
            match SpriteFactory::load_sprite(world, 0.0, 0.0, image, palette) {
                Ok(entity) => self.screen_sprite = Some(entity),
                Err(err) => warn!(%err, "cannot queue loading screen"),
            }
        }
    }

    fn update(&mut self, world: &mut World) {
        let Some(stages) = self.stages else { return };
        self.counts = Self::count(world, stages);
        self.progress = self.counts.progress();
        self.update_alpha();
        self.update_sprite_frame(world);

        let loading = self.is_loading();
        world.insert_resource(self.status());
        debug!(
            untyped = self.counts.untyped,
            unhandled = self.counts.unhandled,
            unparsed = self.counts.unparsed,
            loaded = self.counts.loaded,
            progress = self.progress,
            "load progress"
        );
        if self.was_loading && !loading {
            info!(loaded = self.counts.loaded, "loading finished");
        }
        self.was_loading = loading;
    }
}
