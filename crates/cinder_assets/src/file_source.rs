//! Turns archive and directory entities into [`FileSource`]s.

use std::path::Path;
use std::sync::Arc;

use cinder_component::{Entity, Filter};
use cinder_world::{SubscriptionId, System, World};
use tracing::{error, info, warn};

use crate::components::{FilePath, FileSource, FileType, Unresolvable};
use crate::source::{ArchiveOpener, ArchiveSource, DirectorySource, Source, SourceError};

/// Opens containers. Non-container types are left for
/// [`FileHandleResolver`](crate::FileHandleResolver).
pub struct FileSourceResolver {
    archives: Arc<dyn ArchiveOpener>,
    candidates: Option<SubscriptionId>,
}

impl FileSourceResolver {
    pub fn new(archives: Arc<dyn ArchiveOpener>) -> Self {
        Self {
            archives,
            candidates: None,
        }
    }

    fn open(&self, kind: FileType, path: &str) -> Option<Result<Box<dyn Source>, SourceError>> {
        let source: Result<Box<dyn Source>, SourceError> = match kind {
            FileType::Archive => self
                .archives
                .open(Path::new(path))
                .map(|archive| Box::new(ArchiveSource::new(archive)) as Box<dyn Source>),
            FileType::Directory => {
                DirectorySource::open(path).map(|dir| Box::new(dir) as Box<dyn Source>)
            }
            _ => return None,
        };
        Some(source)
    }

    fn resolve(&self, world: &mut World, entity: Entity) {
        let (Some(path), Some(&kind)) = (
            world.get_component::<FilePath>(entity),
            world.get_component::<FileType>(entity),
        ) else {
            return;
        };
        let path = path.0.clone();

        match self.open(kind, &path) {
            None => {}
            Some(Ok(source)) => {
                info!(%entity, path = %path, kind = source.kind(), "using file source");
                if let Err(err) = world.add_component(entity, FileSource(source)) {
                    warn!(%entity, %err, "cannot attach file source");
                }
            }
            Some(Err(err)) => {
                error!(%entity, path = %path, file_type = %kind, %err, "cannot open file source");
                demote(world, entity);
            }
        }
    }
}

/// Reset a file to [`FileType::Unknown`] and take it out of the pipeline.
fn demote(world: &mut World, entity: Entity) {
    if let Some(kind) = world.get_component_mut::<FileType>(entity) {
        *kind = FileType::Unknown;
    }
    if let Err(err) = world.add_component(entity, Unresolvable) {
        warn!(%entity, %err, "cannot mark file unresolvable");
    }
}

impl System for FileSourceResolver {
    fn name(&self) -> &'static str {
        "file_source_resolver"
    }

    fn init(&mut self, world: &mut World) {
        info!("initializing file source resolver");
        self.candidates = Some(world.add_subscription(
            Filter::builder()
                .require::<FilePath>()
                .require::<FileType>()
                .forbid::<FileSource>()
                .forbid::<Unresolvable>()
                .build(),
        ));
    }

    fn update(&mut self, world: &mut World) {
        let Some(candidates) = self.candidates else {
            return;
        };
        for entity in world.entities(candidates) {
            self.resolve(world, entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;
    use std::time::Duration;

    use cinder_world::Scheduler;

    use super::*;
    use crate::file_type::FileTypeResolver;
    use crate::fakes::MemoryArchives;

    fn pipeline(archives: MemoryArchives) -> Scheduler {
        let archives: Arc<dyn ArchiveOpener> = Arc::new(archives);
        let mut scheduler = Scheduler::new(World::new());
        scheduler.register(FileTypeResolver::new(Arc::clone(&archives)));
        scheduler.register(FileSourceResolver::new(archives));
        scheduler
    }

    fn file(world: &mut World, path: &str) -> Entity {
        let e = world.new_entity();
        world.add_component(e, FilePath::new(path)).unwrap();
        e
    }

    fn read(world: &World, source: Entity, path: &str) -> String {
        let mut buf = String::new();
        world
            .get_component::<FileSource>(source)
            .unwrap()
            .0
            .open(path)
            .unwrap()
            .read_to_string(&mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn test_archive_becomes_source_in_one_tick() {
        let archives = MemoryArchives::default()
            .with_archive("d2data.mpq", [("data\\global\\x.txt", b"x".as_slice())]);
        let mut scheduler = pipeline(archives);
        let e = file(scheduler.world_mut(), "d2data.mpq");

        scheduler.tick(Duration::ZERO);
        assert_eq!(read(scheduler.world(), e, "/data/global/x.txt"), "x");
    }

    #[test]
    fn test_directory_becomes_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "dir").unwrap();

        let mut scheduler = pipeline(MemoryArchives::default());
        let e = file(scheduler.world_mut(), dir.path().to_str().unwrap());

        scheduler.tick(Duration::ZERO);
        assert_eq!(read(scheduler.world(), e, "a.txt"), "dir");
        assert_eq!(
            scheduler.world().get_component::<FileSource>(e).unwrap().0.root(),
            dir.path()
        );
    }

    #[test]
    fn test_open_failure_demotes_to_unknown() {
        // Classified as an archive by extension, but the backend refuses it.
        let mut scheduler = pipeline(MemoryArchives::default());
        let e = file(scheduler.world_mut(), "broken.mpq");

        scheduler.tick(Duration::ZERO);
        let world = scheduler.world();
        assert_eq!(world.get_component::<FileType>(e), Some(&FileType::Unknown));
        assert!(world.has_component::<Unresolvable>(e));
        assert!(!world.has_component::<FileSource>(e));
    }

    #[test]
    fn test_plain_files_are_left_alone() {
        let mut scheduler = pipeline(MemoryArchives::default());
        let e = file(scheduler.world_mut(), "/data/global/x.dc6");

        scheduler.tick(Duration::ZERO);
        scheduler.tick(Duration::ZERO);
        let world = scheduler.world();
        assert_eq!(world.get_component::<FileType>(e), Some(&FileType::Dc6));
        assert!(!world.has_component::<FileSource>(e));
        assert!(!world.has_component::<Unresolvable>(e));
    }

    #[test]
    fn test_removing_source_entity_drops_source() {
        let archives =
            MemoryArchives::default().with_archive("d2data.mpq", Vec::<(&str, &[u8])>::new());
        let mut scheduler = pipeline(archives);
        let e = file(scheduler.world_mut(), "d2data.mpq");
        scheduler.tick(Duration::ZERO);

        assert!(scheduler.world_mut().remove_entity(e));
        assert!(scheduler.world().get_component::<FileSource>(e).is_none());
    }
}
