//! Queues sprites, builds them once their files are parsed, and keeps their
//! textures in step with playback.

use cinder_component::{Entity, Filter};
use cinder_math::{DVec2, Position};
use cinder_world::{SubscriptionId, System, World, WorldError};
use tracing::{debug, error, info, warn};

use super::{SpriteError, SpriteObject};
use crate::components::{
    Dc6, Dcc, FilePath, Origin, Palette, SegmentedSprite, Sprite, SpriteLoad, Texture,
    Unresolvable,
};
use crate::render::ActiveRenderer;

/// Outcome of one attempt to build a queued sprite.
enum LoadStep {
    Waiting,
    Built(SpriteObject),
    Failed(String),
}

/// Each tick, in order:
///
/// 1. build queued sprites whose image and palette are parsed;
/// 2. advance bound sprites and refresh their [`Texture`] and [`Origin`];
/// 3. bind unbound sprites to the [`ActiveRenderer`], if there is one.
#[derive(Debug, Default)]
pub struct SpriteFactory {
    queued: Option<SubscriptionId>,
    to_update: Option<SubscriptionId>,
    to_render: Option<SubscriptionId>,
}

impl SpriteFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a sprite at `(x, y)` built from `image` and `palette`. The two
    /// paths become file entities that the rest of the pipeline resolves.
    pub fn load_sprite(
        world: &mut World,
        x: f64,
        y: f64,
        image: &str,
        palette: &str,
    ) -> Result<Entity, WorldError> {
        let sprite = world.new_entity();
        world.add_component(sprite, Position::new(x, y))?;

        let image_file = world.new_entity();
        world.add_component(image_file, FilePath::new(image))?;
        let palette_file = world.new_entity();
        world.add_component(palette_file, FilePath::new(palette))?;

        world.add_component(
            sprite,
            SpriteLoad {
                image: image_file,
                palette: palette_file,
            },
        )?;
        debug!(entity = %sprite, image, palette, "sprite queued");
        Ok(sprite)
    }

    /// Queue a sprite whose frames are tiles of one larger picture.
    #[allow(clippy::too_many_arguments)]
    pub fn load_segmented_sprite(
        world: &mut World,
        x: f64,
        y: f64,
        image: &str,
        palette: &str,
        x_segments: u32,
        y_segments: u32,
        frame_offset: u32,
    ) -> Result<Entity, WorldError> {
        let sprite = Self::load_sprite(world, x, y, image, palette)?;
        world.add_component(
            sprite,
            SegmentedSprite {
                x_segments,
                y_segments,
                frame_offset,
            },
        )?;
        Ok(sprite)
    }

    fn try_build(world: &World, load: SpriteLoad) -> LoadStep {
        for file in [load.image, load.palette] {
            if !world.is_alive(file) {
                return LoadStep::Failed(format!("{file} was removed"));
            }
            if world.has_component::<Unresolvable>(file) {
                return LoadStep::Failed(format!("{file} is unresolvable"));
            }
        }

        let (Some(_), Some(_), Some(palette)) = (
            world.get_component::<FilePath>(load.image),
            world.get_component::<FilePath>(load.palette),
            world.get_component::<Palette>(load.palette),
        ) else {
            return LoadStep::Waiting;
        };

        let built: Result<SpriteObject, SpriteError> =
            if let Some(dc6) = world.get_component::<Dc6>(load.image) {
                SpriteObject::from_dc6(dc6, palette)
            } else if let Some(dcc) = world.get_component::<Dcc>(load.image) {
                SpriteObject::from_dcc(dcc, palette)
            } else {
                return LoadStep::Waiting;
            };

        match built {
            Ok(sprite) => LoadStep::Built(sprite),
            Err(err) => LoadStep::Failed(err.to_string()),
        }
    }

    fn path_of(world: &World, file: Entity) -> String {
        world
            .get_component::<FilePath>(file)
            .map(|p| p.0.clone())
            .unwrap_or_default()
    }

    fn process_queue(world: &mut World, queued: SubscriptionId) {
        for entity in world.entities(queued) {
            let Some(&load) = world.get_component::<SpriteLoad>(entity) else {
                continue;
            };
            match Self::try_build(world, load) {
                LoadStep::Waiting => {}
                LoadStep::Built(sprite) => {
                    world.remove_component::<SpriteLoad>(entity);
                    if let Err(err) = world.add_component(entity, Sprite(sprite)) {
                        warn!(%entity, %err, "cannot attach sprite");
                    } else {
                        debug!(%entity, "sprite built");
                    }
                }
                LoadStep::Failed(reason) => {
                    error!(
                        %entity,
                        image = %Self::path_of(world, load.image),
                        palette = %Self::path_of(world, load.palette),
                        reason = %reason,
                        "could not create sprite"
                    );
                    world.remove_entity(entity);
                    world.remove_entity(load.image);
                    world.remove_entity(load.palette);
                }
            }
        }
    }

    fn update_sprites(world: &mut World, to_update: SubscriptionId) {
        let dt = world.time_delta();
        for entity in world.entities(to_update) {
            let segmented = world.has_component::<SegmentedSprite>(entity);
            let Some(Sprite(sprite)) = world.get_component_mut::<Sprite>(entity) else {
                continue;
            };

            sprite.advance(dt);
            let texture = sprite.current_texture();
            let offset = sprite.current_frame_offset();
            let (_, height) = sprite.current_frame_size();

            let mut origin = offset.as_dvec2();
            if !segmented {
                origin.y -= f64::from(height);
            }

            if let (Some(texture), Some(slot)) =
                (texture, world.get_component_mut::<Texture>(entity))
            {
                *slot = Texture(texture);
            }
            set_origin(world, entity, origin);
        }
    }

    fn render_sprites(world: &mut World, to_render: SubscriptionId) {
        let pending = world.entities(to_render);
        if pending.is_empty() {
            return;
        }
        let Some(ActiveRenderer(mut renderer)) = world.take_resource::<ActiveRenderer>() else {
            return;
        };

        for entity in pending {
            let Some(Sprite(sprite)) = world.get_component_mut::<Sprite>(entity) else {
                continue;
            };
            if !sprite.is_bound()
                && let Err(err) = sprite.bind_renderer(renderer.as_mut())
            {
                error!(%entity, renderer = renderer.name(), %err, "cannot bind sprite");
                continue;
            }
            let Some(texture) = sprite.current_texture() else {
                continue;
            };
            if let Err(err) = world.add_component(entity, Texture(texture)) {
                warn!(%entity, %err, "cannot attach texture");
            }
        }

        world.insert_resource(ActiveRenderer(renderer));
    }
}

fn set_origin(world: &mut World, entity: Entity, origin: DVec2) {
    if let Some(slot) = world.get_component_mut::<Origin>(entity) {
        slot.0 = origin;
    } else if let Err(err) = world.add_component(entity, Origin(origin)) {
        warn!(%entity, %err, "cannot attach origin");
    }
}

impl System for SpriteFactory {
    fn name(&self) -> &'static str {
        "sprite_factory"
    }

    fn init(&mut self, world: &mut World) {
        info!("initializing sprite factory");
        self.queued =
            Some(world.add_subscription(Filter::builder().require::<SpriteLoad>().build()));
        self.to_update = Some(world.add_subscription(
            Filter::builder()
                .require::<Sprite>()
                .require::<Texture>()
                .build(),
        ));
        self.to_render = Some(world.add_subscription(
            Filter::builder()
                .require::<Sprite>()
                .forbid::<Texture>()
                .build(),
        ));
    }

    fn update(&mut self, world: &mut World) {
        let (Some(queued), Some(to_update), Some(to_render)) =
            (self.queued, self.to_update, self.to_render)
        else {
            return;
        };
        Self::process_queue(world, queued);
        Self::update_sprites(world, to_update);
        Self::render_sprites(world, to_render);
    }
}
