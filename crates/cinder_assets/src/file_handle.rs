//! Opens plain files through the first [`FileSource`] that has them.
//!
//! Sources are tried in ascending entity order, so a source registered earlier
//! shadows later ones. A file that no source can open stays where it is and is
//! looked up again next tick; a new source may appear at any time.

use cinder_component::{Entity, Filter};
use cinder_world::{SubscriptionId, System, World};
use tracing::{debug, info, trace};

use crate::components::{FileHandle, FilePath, FileSource, FileType, Unresolvable};
use crate::source::DataStream;

#[derive(Debug, Default)]
pub struct FileHandleResolver {
    unopened: Option<SubscriptionId>,
    sources: Option<SubscriptionId>,
}

impl FileHandleResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask each source in turn for `path`.
    fn lookup(
        world: &World,
        sources: &[Entity],
        path: &str,
    ) -> Option<(Entity, Box<dyn DataStream>)> {
        sources.iter().find_map(|&source| {
            let FileSource(source_impl) = world.get_component::<FileSource>(source)?;
            match source_impl.open(path) {
                Ok(stream) => Some((source, stream)),
                Err(err) => {
                    trace!(source = %source, path, %err, "source miss");
                    None
                }
            }
        })
    }
}

impl System for FileHandleResolver {
    fn name(&self) -> &'static str {
        "file_handle_resolver"
    }

    fn init(&mut self, world: &mut World) {
        info!("initializing file handle resolver");
        self.unopened = Some(world.add_subscription(
            Filter::builder()
                .require::<FilePath>()
                .require::<FileType>()
                .forbid::<FileHandle>()
                .forbid::<FileSource>()
                .forbid::<Unresolvable>()
                .build(),
        ));
        self.sources =
            Some(world.add_subscription(Filter::builder().require::<FileSource>().build()));
    }

    fn update(&mut self, world: &mut World) {
        let (Some(unopened), Some(sources)) = (self.unopened, self.sources) else {
            return;
        };
        let sources = world.entities(sources);
        if sources.is_empty() {
            return;
        }

        for entity in world.entities(unopened) {
            let (Some(path), Some(kind)) = (
                world.get_component::<FilePath>(entity),
                world.get_component::<FileType>(entity),
            ) else {
                continue;
            };
            if kind.is_container() {
                continue;
            }
            let path = path.0.clone();

            let Some((source, stream)) = Self::lookup(world, &sources, &path) else {
                trace!(%entity, path = %path, "not ready");
                continue;
            };
            debug!(%entity, %source, path = %path, "file opened");
            if let Err(err) = world.add_component(entity, FileHandle(stream)) {
                debug!(%entity, %err, "cannot attach file handle");
            }
        }
    }
}
