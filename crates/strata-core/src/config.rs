use crate::vfs::VirtualPath;

/// Where materialized remote artifacts live. Threaded explicitly into the
/// resolver and registry client at construction time; resolution logic never
/// consults ambient environment state.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    artifact_root: VirtualPath,
}

impl CacheConfig {
    pub fn new(artifact_root: VirtualPath) -> Self {
        Self { artifact_root }
    }

    /// The conventional cache layout under a base directory.
    pub fn under(base: &VirtualPath) -> Self {
        Self::new(base.join(".strata").join("artifacts"))
    }

    pub fn artifact_root(&self) -> &VirtualPath {
        &self.artifact_root
    }
}
