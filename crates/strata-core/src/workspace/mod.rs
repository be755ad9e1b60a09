use std::collections::HashMap;
use std::sync::Arc;

use crate::syntax::SourceFile;
use crate::vfs::VirtualPath;

/// Open-document overlay. In a long-lived server this holds the editor's
/// unsaved buffers; the source loader consults it before touching disk.
/// The builder only ever reads it.
#[derive(Default)]
pub struct Workspace {
    documents: HashMap<VirtualPath, Arc<SourceFile>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_get_source(&self, location: &VirtualPath) -> Option<Arc<SourceFile>> {
        self.documents.get(location).cloned()
    }

    pub fn upsert_sources(&mut self, sources: impl IntoIterator<Item = Arc<SourceFile>>) {
        for source in sources {
            self.documents.insert(source.location().clone(), source);
        }
    }

    pub fn remove(&mut self, location: &VirtualPath) -> Option<Arc<SourceFile>> {
        self.documents.remove(location)
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}
