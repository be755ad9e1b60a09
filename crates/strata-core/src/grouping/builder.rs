use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use itertools::Itertools;
use tracing::warn;

use super::loader::SourceCache;
use super::SyntaxTreeGrouping;
use crate::error::{Error, ModuleFailure, Result};
use crate::graph::find_cycles;
use crate::modules::ReferenceResolver;
use crate::syntax::{DeclId, SourceFile};
use crate::vfs::{FileResolver, VirtualPath};
use crate::workspace::Workspace;

/// Builds a [`SyntaxTreeGrouping`] by depth-first traversal from an entry
/// file. A failing entry load is fatal; every other failure is recorded
/// against its declaration and traversal continues, so one build produces as
/// complete a diagnostic report as possible.
pub struct GroupingBuilder<'a> {
    sources: SourceCache<'a>,
    resolver: &'a dyn ReferenceResolver,
    modules: HashMap<DeclId, Arc<SourceFile>>,
    failures: HashMap<DeclId, ModuleFailure>,
}

impl<'a> GroupingBuilder<'a> {
    pub fn build(
        files: &'a dyn FileResolver,
        resolver: &'a dyn ReferenceResolver,
        workspace: &'a Workspace,
        entry: &VirtualPath,
    ) -> Result<SyntaxTreeGrouping> {
        let mut builder = GroupingBuilder {
            sources: SourceCache::new(files, workspace),
            resolver,
            modules: HashMap::new(),
            failures: HashMap::new(),
        };

        let entry_tree = builder
            .populate(entry)
            .map_err(|failure| Error::EntryLoad {
                location: entry.clone(),
                failure,
            })?;
        builder.report_cycles();

        Ok(SyntaxTreeGrouping::new(
            entry_tree,
            builder
                .sources
                .into_trees()
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
            builder.modules,
            builder.failures,
        ))
    }

    fn populate(&mut self, location: &VirtualPath) -> std::result::Result<Arc<SourceFile>, ModuleFailure> {
        let tree = self.sources.load(location)?;

        for (id, decl) in tree.module_decls() {
            let target = match self.resolver.location_for(location, decl) {
                Ok(target) => target,
                Err(failure) => {
                    warn!(decl = %id, failure = %failure, "module reference did not resolve");
                    self.failures.insert(id, failure);
                    continue;
                }
            };

            // descend only into locations not seen before; revisiting a known
            // location just links to the memoized tree, which is what keeps
            // the traversal finite on cyclic graphs
            let resolved = match self.sources.cached(&target) {
                Some(known) => known,
                None => match self.populate(&target) {
                    Ok(loaded) => loaded,
                    Err(failure) => {
                        warn!(decl = %id, failure = %failure, "module target failed to load");
                        self.failures.insert(id, failure);
                        continue;
                    }
                },
            };

            self.modules.insert(id, resolved);
        }

        Ok(tree)
    }

    /// Runs cycle detection over the completed graph and projects each cycle
    /// back onto the declarations targeting its members. A declaration whose
    /// target participates in a cycle moves from the resolution map to the
    /// failure map, superseding its earlier success.
    fn report_cycles(&mut self) {
        let mut edges: BTreeMap<VirtualPath, Vec<VirtualPath>> = BTreeMap::new();
        for (location, tree) in self.sources.trees() {
            let targets = tree
                .module_decls()
                .filter_map(|(id, _)| self.modules.get(&id))
                .map(|target| target.location().clone())
                .unique()
                .collect();
            edges.insert(location.clone(), targets);
        }

        let cycles = find_cycles(&edges);
        if cycles.is_empty() {
            return;
        }

        let cyclic: Vec<(DeclId, Vec<VirtualPath>)> = self
            .modules
            .iter()
            .filter_map(|(id, target)| {
                cycles
                    .get(target.location())
                    .map(|cycle| (id.clone(), cycle.clone()))
            })
            .collect();

        for (id, cycle) in cyclic {
            let failure = if cycle.len() == 1 {
                ModuleFailure::CyclicSelfReference
            } else {
                ModuleFailure::CyclicModule {
                    chain: cycle.iter().map(ToString::to_string).collect(),
                }
            };
            self.modules.remove(&id);
            self.failures.insert(id, failure);
        }
    }
}
