use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

pub mod collect;
pub mod parse;
pub mod registry;
pub mod resolver;

pub use collect::collect_external_references;
pub use parse::parse_reference;
pub use registry::{PullCoordinator, RegistryClient, RegistryError};
pub use resolver::{artifact_cache_path, ModuleResolver, ReferenceResolver};

/// A typed module reference. Equality and hashing are structural and scoped
/// to the variant; references of different kinds are never equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModuleReference {
    /// Relative file path, compared ordinally and kept verbatim.
    Local { path: String },
    /// A package in a NuGet feed, identified by (id, version).
    NuGet { package_id: String, version: String },
    /// An artifact in an OCI registry.
    OciArtifact(OciArtifact),
}

impl ModuleReference {
    pub fn is_local(&self) -> bool {
        matches!(self, ModuleReference::Local { .. })
    }
}

impl Display for ModuleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleReference::Local { path } => write!(f, "{}", path),
            ModuleReference::NuGet {
                package_id,
                version,
            } => write!(f, "nuget:{}@{}", package_id, version),
            ModuleReference::OciArtifact(artifact) => write!(f, "{}", artifact),
        }
    }
}

/// Coordinates of one OCI artifact. `registry` may carry a `host:port` form;
/// `repository` always begins with `/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OciArtifact {
    pub registry: String,
    pub repository: String,
    pub tag: String,
}

impl Display for OciArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "oci:{}{}:{}", self.registry, self.repository, self.tag)
    }
}
