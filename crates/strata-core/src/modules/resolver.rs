use std::sync::Arc;

use tracing::debug;

use super::registry::{PullCoordinator, RegistryClient, RegistryError};
use super::{parse_reference, ModuleReference, OciArtifact};
use crate::config::CacheConfig;
use crate::error::ModuleFailure;
use crate::syntax::ModuleDecl;
use crate::vfs::{FileResolver, VirtualPath};

/// Resolution seam consumed by the graph builder: extract a declaration's
/// typed reference, and turn it into a loadable location.
pub trait ReferenceResolver: Send + Sync {
    fn reference_for(&self, decl: &ModuleDecl) -> Result<ModuleReference, ModuleFailure>;

    fn location_for(
        &self,
        parent: &VirtualPath,
        decl: &ModuleDecl,
    ) -> Result<VirtualPath, ModuleFailure>;
}

/// Derives the on-disk cache location for an OCI artifact. Registry,
/// repository segments and tag each become a discrete path segment, so two
/// repositories sharing a string prefix can never collide in the cache.
pub fn artifact_cache_path(cache_root: &VirtualPath, artifact: &OciArtifact) -> VirtualPath {
    let mut location = cache_root.join(&artifact.registry);
    for segment in artifact
        .repository
        .split('/')
        .filter(|segment| !segment.is_empty())
    {
        location = location.join(segment);
    }
    location.join(&artifact.tag)
}

pub struct ModuleResolver {
    files: Arc<dyn FileResolver>,
    registry: Arc<dyn RegistryClient>,
    cache: CacheConfig,
    pulls: PullCoordinator,
}

impl ModuleResolver {
    pub fn new(
        files: Arc<dyn FileResolver>,
        registry: Arc<dyn RegistryClient>,
        cache: CacheConfig,
    ) -> Self {
        Self {
            files,
            registry,
            cache,
            pulls: PullCoordinator::new(),
        }
    }

    /// Resolves an already-parsed reference against the declaring file's
    /// location.
    pub fn resolve_location(
        &self,
        parent: &VirtualPath,
        reference: &ModuleReference,
    ) -> Result<VirtualPath, ModuleFailure> {
        match reference {
            ModuleReference::Local { path } => self
                .files
                .try_resolve_relative(parent, path)
                .ok_or_else(|| ModuleFailure::PathCouldNotBeResolved {
                    path: path.clone(),
                    parent: parent.to_string(),
                }),
            // a restore protocol for feeds is not part of this layer
            ModuleReference::NuGet { .. } => {
                Err(ModuleFailure::UnsupportedReferenceKind { scheme: "nuget" })
            }
            ModuleReference::OciArtifact(artifact) => {
                let location = artifact_cache_path(self.cache.artifact_root(), artifact);
                debug!(artifact = %reference, location = %location, "resolved artifact cache location");
                Ok(location)
            }
        }
    }

    /// Materializes every remote reference through the registry client,
    /// holding the per-location pull lock so concurrent builds sharing the
    /// cache never interleave writes to the same artifact.
    pub fn download_external_references<'a>(
        &self,
        references: impl IntoIterator<Item = &'a ModuleReference>,
    ) -> Result<(), RegistryError> {
        for reference in references {
            match reference {
                ModuleReference::OciArtifact(artifact) => {
                    let target = artifact_cache_path(self.cache.artifact_root(), artifact);
                    self.pulls
                        .with_lock(&target, || self.registry.pull(artifact))?;
                    debug!(artifact = %reference, "pulled remote artifact");
                }
                ModuleReference::NuGet { .. } => {
                    return Err(RegistryError::UnsupportedReference { scheme: "nuget" })
                }
                ModuleReference::Local { .. } => {
                    return Err(RegistryError::UnsupportedReference { scheme: "local" })
                }
            }
        }
        Ok(())
    }
}

impl ReferenceResolver for ModuleResolver {
    fn reference_for(&self, decl: &ModuleDecl) -> Result<ModuleReference, ModuleFailure> {
        parse_reference(&decl.reference)
    }

    fn location_for(
        &self,
        parent: &VirtualPath,
        decl: &ModuleDecl,
    ) -> Result<VirtualPath, ModuleFailure> {
        let reference = self.reference_for(decl)?;
        self.resolve_location(parent, &reference)
    }
}
