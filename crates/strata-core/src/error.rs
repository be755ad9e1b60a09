use crate::vfs::VirtualPath;
use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to load entry file {location}: {failure}")]
    EntryLoad {
        location: VirtualPath,
        failure: ModuleFailure,
    },
    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

// Convert from std::io::Error to our Error type
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Generic(e.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

/// Expected per-declaration failures. Each value is attached to the module
/// declaration that caused it and never aborts the surrounding build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleFailure {
    #[error("the module path has not been specified")]
    PathNotSpecified,
    #[error("the module path is empty")]
    PathIsEmpty,
    #[error("module paths must be relative and cannot begin with \"/\"")]
    PathBeginsWithSlash,
    #[error("module paths must use \"/\" as the directory separator")]
    PathContainsBackSlash,
    #[error(r#"the module path contains characters that are not allowed (one of < > : " \ | ? *)"#)]
    PathContainsForbiddenCharacters,
    #[error("the module path contains control characters")]
    PathContainsControlChars,
    #[error("the module path cannot end with a space or a period")]
    PathHasForbiddenTerminator,
    #[error("the module reference scheme {scheme:?} is not recognized (known schemes: {})", .known.join(", "))]
    UnknownScheme { scheme: String, known: Vec<String> },
    #[error("invalid nuget reference {raw:?}, expected nuget:<package-id>@<version>")]
    MalformedNuGetReference { raw: String },
    #[error("invalid oci reference {raw:?}, expected oci:<registry>/<repository>:<tag>")]
    MalformedOciReference { raw: String },
    #[error("the module path {path:?} could not be resolved relative to {parent:?}")]
    PathCouldNotBeResolved { path: String, parent: String },
    #[error("references using scheme {scheme:?} cannot be resolved to a local file")]
    UnsupportedReferenceKind { scheme: &'static str },
    #[error("unable to read file {location}: {reason}")]
    FileReadFailure {
        location: VirtualPath,
        reason: String,
    },
    #[error("this module references its own file")]
    CyclicSelfReference,
    #[error("the module is involved in a cyclic dependency ({})", .chain.join(" -> "))]
    CyclicModule { chain: Vec<String> },
}
