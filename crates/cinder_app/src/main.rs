//! # cinder
//!
//! Headless driver for the asset pipeline. Mounts the configured sources,
//! queues the requested assets as file entities, and ticks the scheduler until
//! loading finishes or the tick limit is reached.
//!
//! ```text
//! cinder --data-root /srv/d2 --ticks 120 /data/global/palette/act1/pal.dat
//! ```
//!
//! Log verbosity follows `RUST_LOG`; the default is `cinder=info`.

mod config;
mod settle;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use cinder_assets::{
    ActiveRenderer, ArchiveOpener, FileHandleResolver, FilePath, FileSourceResolver,
    FileTypeResolver, HeadlessRenderer, NoArchives, SpriteFactory,
};
use cinder_component::Entity;
use cinder_systems::{LoadProgress, LoadStatus, MovementSystem, TimeScaleSystem};
use cinder_world::{Scheduler, World};
use config::{AppConfig, Args};
use settle::Settle;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("cinder=info".parse()?))
        .init();

    let args = Args::parse();
    let config = AppConfig::resolve(&args)?;
    info!(
        assets = config.assets.len(),
        tick_rate = config.tick.tick_rate,
        max_ticks = config.tick.max_ticks,
        time_scale = config.time_scale,
        "cinder starting"
    );

    let (mut scheduler, files) = build(&config)?;
    let mut settle = Settle::new(config.settle_ticks);
    let ticks = scheduler.run_until(&config.tick, |world| settle.done(world))?;

    let status = scheduler
        .world()
        .get_resource::<LoadStatus>()
        .copied()
        .unwrap_or_default();
    info!(
        ticks,
        progress = status.progress,
        loaded = status.counts.loaded,
        pending = status.counts.pending(),
        "run finished"
    );
    for entity in files {
        let world = scheduler.world();
        let path = world
            .get_component::<FilePath>(entity)
            .map(|p| p.as_str().to_owned())
            .unwrap_or_default();
        info!(%entity, path = %path, components = ?world.component_names(entity), "file");
    }

    let world = scheduler.shutdown();
    debug!(entities = world.entity_count(), "world released");
    Ok(())
}

/// Register every system in pipeline order and queue the configured files.
fn build(config: &AppConfig) -> Result<(Scheduler, Vec<Entity>)> {
    let archives: Arc<dyn ArchiveOpener> = Arc::new(NoArchives);
    let mut scheduler = Scheduler::new(World::new());

    scheduler.register(TimeScaleSystem::new(config.time_scale));
    scheduler.register(FileTypeResolver::new(Arc::clone(&archives)));
    scheduler.register(FileSourceResolver::new(archives));
    scheduler.register(FileHandleResolver::new());
    scheduler.register(SpriteFactory::new());
    scheduler.register(MovementSystem::new());

    let progress = match &config.loading_screen {
        Some(screen) => LoadProgress::new().with_loading_screen(&screen.image, &screen.palette),
        None => LoadProgress::new(),
    };
    scheduler.register(progress);

    let world = scheduler.world_mut();
    world.insert_resource(ActiveRenderer::new(HeadlessRenderer::new()));

    let mut files = Vec::new();
    let sources = config.data_root.iter().chain(&config.sources);
    for source in sources {
        files.push(add_file(world, &source.to_string_lossy())?);
    }
    for asset in &config.assets {
        files.push(add_file(world, asset)?);
    }
    Ok((scheduler, files))
}

fn add_file(world: &mut World, path: &str) -> Result<Entity> {
    let entity = world.new_entity();
    world.add_component(entity, FilePath::new(path))?;
    debug!(%entity, path, "file queued");
    Ok(entity)
}
