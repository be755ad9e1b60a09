use std::collections::HashMap;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Normalised UTF-8 location decoupled from the host OS. A source file's
/// canonical location is a `VirtualPath`; equality of locations is equality
/// of the file they denote within one build.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct VirtualPath {
    segments: Vec<String>,
    absolute: bool,
}

impl VirtualPath {
    /// The absolute root location (`/`).
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            absolute: true,
        }
    }

    pub fn absolute<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::collect(true, segments)
    }

    pub fn relative<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::collect(false, segments)
    }

    fn collect<I, S>(absolute: bool, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments = segments
            .into_iter()
            .map(Into::into)
            .filter(|segment| !segment.is_empty())
            .collect();
        Self { segments, absolute }
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing directory, or `None` for a segment-less relative path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return self.absolute.then(VirtualPath::root);
        }
        let mut segments = self.segments.clone();
        segments.pop();
        Some(Self {
            segments,
            absolute: self.absolute,
        })
    }

    /// Appends one literal segment. `.`/`..` are not interpreted here; use
    /// [`VirtualPath::join_relative`] for relative-path arithmetic.
    pub fn join<S: Into<String>>(&self, segment: S) -> Self {
        let segment = segment.into();
        let mut segments = self.segments.clone();
        if !segment.is_empty() {
            segments.push(segment);
        }
        Self {
            segments,
            absolute: self.absolute,
        }
    }

    /// Resolves a `/`-separated relative path against this location, treating
    /// `self` as a directory. Returns `None` when `..` would escape the root.
    pub fn join_relative(&self, relative: &str) -> Option<Self> {
        let mut segments = self.segments.clone();
        for segment in relative.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return None;
                    }
                }
                _ => segments.push(segment.to_string()),
            }
        }
        Some(Self {
            segments,
            absolute: self.absolute,
        })
    }

    pub fn to_path_buf(&self) -> PathBuf {
        let mut buf = if self.absolute {
            PathBuf::from("/")
        } else {
            PathBuf::new()
        };
        for segment in &self.segments {
            buf.push(segment);
        }
        buf
    }
}

impl From<&str> for VirtualPath {
    fn from(s: &str) -> Self {
        Self::collect(
            s.starts_with('/'),
            s.split('/').filter(|segment| !segment.is_empty()),
        )
    }
}

impl FromStr for VirtualPath {
    type Err = std::convert::Infallible; // every string denotes some location

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            write!(f, "/")?;
        }
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, "/")?;
            }
            first = false;
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("{0} not found")]
    NotFound(VirtualPath),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type FsResult<T> = std::result::Result<T, FsError>;

/// File-access collaborator consumed by the source loader and path resolver.
/// Implementations only need to read whole files and answer existence checks;
/// relative-path resolution is pure segment arithmetic by default.
pub trait FileResolver: Send + Sync {
    fn try_read(&self, location: &VirtualPath) -> FsResult<String>;

    fn exists(&self, location: &VirtualPath) -> bool;

    /// Resolves a module path against the *file* that declared it (the path
    /// is interpreted relative to that file's directory).
    fn try_resolve_relative(&self, parent: &VirtualPath, relative: &str) -> Option<VirtualPath> {
        parent.parent()?.join_relative(relative)
    }
}

// -----------------------------------------------------------------------------
// In-memory filesystem
// -----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    files: Arc<Mutex<HashMap<VirtualPath, String>>>,
}

impl InMemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, HashMap<VirtualPath, String>> {
        match self.files.lock() {
            Ok(guard) => guard,
            Err(poison) => poison.into_inner(),
        }
    }

    pub fn write(&self, location: VirtualPath, contents: impl Into<String>) {
        self.guard().insert(location, contents.into());
    }

    pub fn remove(&self, location: &VirtualPath) -> Option<String> {
        self.guard().remove(location)
    }
}

impl FileResolver for InMemoryFileSystem {
    fn try_read(&self, location: &VirtualPath) -> FsResult<String> {
        self.guard()
            .get(location)
            .cloned()
            .ok_or_else(|| FsError::NotFound(location.clone()))
    }

    fn exists(&self, location: &VirtualPath) -> bool {
        self.guard().contains_key(location)
    }
}

// -----------------------------------------------------------------------------
// OS filesystem implementation
// -----------------------------------------------------------------------------

pub struct OsFileSystem {
    root: PathBuf,
}

impl OsFileSystem {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn to_native(&self, location: &VirtualPath) -> PathBuf {
        let mut buf = self.root.clone();
        for segment in location.segments() {
            buf.push(segment);
        }
        buf
    }
}

impl FileResolver for OsFileSystem {
    fn try_read(&self, location: &VirtualPath) -> FsResult<String> {
        let native = self.to_native(location);
        match std::fs::read_to_string(&native) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(FsError::NotFound(location.clone()))
            }
            Err(err) => Err(FsError::Io(err)),
        }
    }

    fn exists(&self, location: &VirtualPath) -> bool {
        self.to_native(location).is_file()
    }
}
