//! Classifies file entities.
//!
//! Probe order for each new path:
//!
//! 1. the archive backend: if it opens the path, it is an archive;
//! 2. the extension table;
//! 3. the filesystem: an existing directory is a directory.
//!
//! Anything else is [`FileType::Unknown`] and also marked [`Unresolvable`].

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinder_component::{Entity, Filter};
use cinder_world::{SubscriptionId, System, World};
use tracing::{debug, info, warn};

use crate::components::{FilePath, FileType, Unresolvable};
use crate::source::ArchiveOpener;

/// Attaches a [`FileType`] to every entity with a [`FilePath`] and no type.
pub struct FileTypeResolver {
    archives: Arc<dyn ArchiveOpener>,
    untyped: Option<SubscriptionId>,
}

impl FileTypeResolver {
    pub fn new(archives: Arc<dyn ArchiveOpener>) -> Self {
        Self {
            archives,
            untyped: None,
        }
    }

    /// Classify a single path.
    #[must_use]
    pub fn classify(&self, path: &str) -> FileType {
        if self.archives.open(Path::new(path)).is_ok() {
            return FileType::Archive;
        }

        let ext = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        if let Some(kind) = FileType::from_extension(ext, path) {
            return kind;
        }

        match std::fs::symlink_metadata(clean(path)) {
            Ok(meta) if meta.is_dir() => FileType::Directory,
            _ => FileType::Unknown,
        }
    }

    fn resolve(&self, world: &mut World, entity: Entity) {
        let Some(path) = world.get_component::<FilePath>(entity) else {
            return;
        };
        let path = path.0.clone();
        let kind = self.classify(&path);

        if let Err(err) = world.add_component(entity, kind) {
            warn!(%entity, %err, "cannot attach file type");
            return;
        }
        if kind != FileType::Unknown {
            debug!(%entity, path = %path, file_type = %kind, "file type resolved");
            return;
        }
        warn!(%entity, path = %path, "unknown file type");
        if let Err(err) = world.add_component(entity, Unresolvable) {
            warn!(%entity, %err, "cannot mark file unresolvable");
        }
    }
}

/// Lexically collapse `.` and `..` components. `..` at the root is dropped;
/// leading `..` in a relative path is kept.
fn clean(path: &str) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    let mut parts: Vec<&OsStr> = Vec::new();
    for part in Path::new(path).components() {
        match part {
            Component::Prefix(_) | Component::RootDir => out.push(part.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if out.has_root() => {}
                _ => parts.push(part.as_os_str()),
            },
            Component::Normal(name) => parts.push(name),
        }
    }
    out.extend(parts);
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

impl System for FileTypeResolver {
    fn name(&self) -> &'static str {
        "file_type_resolver"
    }

    fn init(&mut self, world: &mut World) {
        info!("initializing file type resolver");
        self.untyped = Some(world.add_subscription(
            Filter::builder()
                .require::<FilePath>()
                .forbid::<FileType>()
                .build(),
        ));
    }

    fn update(&mut self, world: &mut World) {
        let Some(untyped) = self.untyped else { return };
        for entity in world.entities(untyped) {
            self.resolve(world, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use cinder_world::Scheduler;
    use std::time::Duration;

    use super::*;
    use crate::fakes::MemoryArchives;
    use crate::source::NoArchives;

    fn scheduler_with(archives: Arc<dyn ArchiveOpener>) -> Scheduler {
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(FileTypeResolver::new(archives));
        scheduler
    }

    fn file(scheduler: &mut Scheduler, path: &str) -> Entity {
        let world = scheduler.world_mut();
        let e = world.new_entity();
        world.add_component(e, FilePath::new(path)).unwrap();
        e
    }

    #[test]
    fn test_extension_classification() {
        let mut scheduler = scheduler_with(Arc::new(NoArchives));
        let dc6 = file(&mut scheduler, "/data/global/ui/loading/loadingscreen.dc6");
        let pal = file(&mut scheduler, "/data/global/palette/loading/pal.dat");
        let font = file(&mut scheduler, "/data/local/FONT/eng/font16.tbl");

        scheduler.tick(Duration::ZERO);
        let world = scheduler.world();
        assert_eq!(world.get_component::<FileType>(dc6), Some(&FileType::Dc6));
        assert_eq!(world.get_component::<FileType>(pal), Some(&FileType::Palette));
        assert_eq!(world.get_component::<FileType>(font), Some(&FileType::FontTable));
        assert!(!world.has_component::<Unresolvable>(dc6));
    }

    #[test]
    fn test_archive_probe_wins_over_extension() {
        let archives =
            MemoryArchives::default().with_archive("d2data.bin", Vec::<(&str, &[u8])>::new());
        let mut scheduler = scheduler_with(Arc::new(archives));
        let e = file(&mut scheduler, "d2data.bin");

        scheduler.tick(Duration::ZERO);
        assert_eq!(
            scheduler.world().get_component::<FileType>(e),
            Some(&FileType::Archive)
        );
    }

    #[test]
    fn test_directory_and_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("readme");
        std::fs::write(&plain, "x").unwrap();

        let mut scheduler = scheduler_with(Arc::new(NoArchives));
        let d = file(&mut scheduler, dir.path().to_str().unwrap());
        let f = file(&mut scheduler, plain.to_str().unwrap());
        let missing = file(&mut scheduler, "/definitely/not/here");

        let typed = scheduler.world_mut().add_subscription(
            Filter::builder()
                .require::<FileType>()
                .forbid::<Unresolvable>()
                .build(),
        );

        scheduler.tick(Duration::ZERO);
        let world = scheduler.world();
        assert_eq!(world.get_component::<FileType>(d), Some(&FileType::Directory));
        assert_eq!(world.get_component::<FileType>(f), Some(&FileType::Unknown));
        assert_eq!(world.get_component::<FileType>(missing), Some(&FileType::Unknown));
        assert!(world.has_component::<Unresolvable>(missing));
        assert_eq!(world.entities(typed), vec![d]);
    }

    #[test]
    fn test_each_file_is_classified_once() {
        let mut scheduler = scheduler_with(Arc::new(NoArchives));
        let e = file(&mut scheduler, "a.dc6");
        scheduler.tick(Duration::ZERO);

        scheduler
            .world_mut()
            .get_component_mut::<FilePath>(e)
            .unwrap()
            .0 = "a.wav".to_owned();
        scheduler.tick(Duration::ZERO);
        assert_eq!(
            scheduler.world().get_component::<FileType>(e),
            Some(&FileType::Dc6)
        );
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("a/./b/../c"), PathBuf::from("a/c"));
        assert_eq!(clean("./"), PathBuf::from("."));
        assert_eq!(clean("../x"), PathBuf::from("../x"));
        assert_eq!(clean("/../x"), PathBuf::from("/x"));
        assert_eq!(clean("/a/../../b"), PathBuf::from("/b"));
        assert_eq!(clean("a/../../b"), PathBuf::from("../b"));
        assert_eq!(clean("../../x"), PathBuf::from("../../x"));
    }
}
