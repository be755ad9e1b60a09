use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::ModuleFailure;
use crate::syntax::{parse_source, SourceFile};
use crate::vfs::{FileResolver, VirtualPath};
use crate::workspace::Workspace;

/// Per-build memoized source loader. A location is read and parsed at most
/// once per build, so every declaration reaching the same location shares one
/// `Arc<SourceFile>`; cycle detection relies on that identity. Load failures
/// are memoized too and replayed without re-reading.
pub struct SourceCache<'a> {
    files: &'a dyn FileResolver,
    workspace: &'a Workspace,
    trees: HashMap<VirtualPath, Arc<SourceFile>>,
    failures: HashMap<VirtualPath, ModuleFailure>,
}

impl<'a> SourceCache<'a> {
    pub fn new(files: &'a dyn FileResolver, workspace: &'a Workspace) -> Self {
        Self {
            files,
            workspace,
            trees: HashMap::new(),
            failures: HashMap::new(),
        }
    }

    /// The already-memoized tree for a location, if any. The builder uses
    /// this to decide whether to descend into a target.
    pub fn cached(&self, location: &VirtualPath) -> Option<Arc<SourceFile>> {
        self.trees.get(location).cloned()
    }

    pub fn load(&mut self, location: &VirtualPath) -> Result<Arc<SourceFile>, ModuleFailure> {
        // an open editor buffer wins over anything on disk
        if let Some(open) = self.workspace.try_get_source(location) {
            self.trees.insert(location.clone(), open.clone());
            return Ok(open);
        }
        if let Some(tree) = self.trees.get(location) {
            return Ok(tree.clone());
        }
        if let Some(failure) = self.failures.get(location) {
            return Err(failure.clone());
        }
        match self.files.try_read(location) {
            Ok(text) => {
                let tree = Arc::new(parse_source(location.clone(), &text));
                debug!(location = %location, "loaded source file");
                self.trees.insert(location.clone(), tree.clone());
                Ok(tree)
            }
            Err(err) => {
                let failure = ModuleFailure::FileReadFailure {
                    location: location.clone(),
                    reason: err.to_string(),
                };
                self.failures.insert(location.clone(), failure.clone());
                Err(failure)
            }
        }
    }

    pub fn trees(&self) -> &HashMap<VirtualPath, Arc<SourceFile>> {
        &self.trees
    }

    pub fn into_trees(self) -> HashMap<VirtualPath, Arc<SourceFile>> {
        self.trees
    }
}
