use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use super::OciArtifact;
use crate::vfs::VirtualPath;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unable to pull artifact {reference}: {reason}")]
    PullFailed { reference: String, reason: String },
    #[error("references using scheme {scheme:?} cannot be downloaded")]
    UnsupportedReference { scheme: &'static str },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Transport boundary for remote artifact registries. A client materializes
/// an artifact at its deterministic cache location as a side effect of
/// `pull`; `local_cache_path` must agree with
/// [`super::resolver::artifact_cache_path`] for the same cache root.
pub trait RegistryClient: Send + Sync {
    fn pull(&self, artifact: &OciArtifact) -> Result<(), RegistryError>;

    fn local_cache_path(&self, artifact: &OciArtifact) -> VirtualPath;
}

/// Serializes pulls per cache location. The artifact cache directory is
/// shared process-wide, so two builds pulling the same reference must not
/// interleave writes to the same target.
#[derive(Default)]
pub struct PullCoordinator {
    locks: DashMap<VirtualPath, Arc<Mutex<()>>>,
}

impl PullCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock<R>(&self, target: &VirtualPath, pull: impl FnOnce() -> R) -> R {
        let lock = self
            .locks
            .entry(target.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = match lock.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        };
        pull()
    }
}
