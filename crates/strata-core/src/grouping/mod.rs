use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::error::ModuleFailure;
use crate::syntax::{DeclId, SourceFile};
use crate::vfs::VirtualPath;

pub mod builder;
pub mod loader;

/// The complete, immutable result of resolving one entry file's transitive
/// module graph. Every module declaration reachable from the entry file
/// appears in exactly one of the two lookup maps.
#[derive(Debug)]
pub struct SyntaxTreeGrouping {
    entry: Arc<SourceFile>,
    files: BTreeMap<VirtualPath, Arc<SourceFile>>,
    modules: HashMap<DeclId, Arc<SourceFile>>,
    failures: HashMap<DeclId, ModuleFailure>,
}

impl SyntaxTreeGrouping {
    pub(crate) fn new(
        entry: Arc<SourceFile>,
        files: BTreeMap<VirtualPath, Arc<SourceFile>>,
        modules: HashMap<DeclId, Arc<SourceFile>>,
        failures: HashMap<DeclId, ModuleFailure>,
    ) -> Self {
        Self {
            entry,
            files,
            modules,
            failures,
        }
    }

    pub fn entry(&self) -> &Arc<SourceFile> {
        &self.entry
    }

    /// All source files reached transitively, the entry file included,
    /// ordered by location.
    pub fn files(&self) -> impl Iterator<Item = &Arc<SourceFile>> {
        self.files.values()
    }

    pub fn file_at(&self, location: &VirtualPath) -> Option<&Arc<SourceFile>> {
        self.files.get(location)
    }

    /// The source file a declaration resolved to, when resolution succeeded.
    pub fn resolved(&self, decl: &DeclId) -> Option<&Arc<SourceFile>> {
        self.modules.get(decl)
    }

    /// The failure attached to a declaration, when resolution failed.
    pub fn failure(&self, decl: &DeclId) -> Option<&ModuleFailure> {
        self.failures.get(decl)
    }

    pub fn resolutions(&self) -> impl Iterator<Item = (&DeclId, &Arc<SourceFile>)> {
        self.modules.iter()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&DeclId, &ModuleFailure)> {
        self.failures.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
