use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use super::{ModuleReference, OciArtifact};
use crate::error::ModuleFailure;

type SchemeParser = fn(&str) -> Result<ModuleReference, ModuleFailure>;

/// Fixed table of recognized reference schemes. A bare path (no scheme) is a
/// local reference.
static SCHEME_PARSERS: Lazy<BTreeMap<&'static str, SchemeParser>> = Lazy::new(|| {
    BTreeMap::from([
        ("nuget", parse_nuget as SchemeParser),
        ("oci", parse_oci as SchemeParser),
    ])
});

pub fn known_schemes() -> impl Iterator<Item = &'static str> {
    SCHEME_PARSERS.keys().copied()
}

/// Parses a raw module reference string into a typed reference. The string is
/// split on the first `:`; the part before it selects the scheme, and a
/// string without `:` is validated as a relative local path.
pub fn parse_reference(raw: &str) -> Result<ModuleReference, ModuleFailure> {
    if raw.is_empty() {
        return Err(ModuleFailure::PathNotSpecified);
    }
    match raw.split_once(':') {
        None => {
            validate_local_path(raw)?;
            Ok(ModuleReference::Local {
                path: raw.to_string(),
            })
        }
        Some((scheme, rest)) => match SCHEME_PARSERS.get(scheme) {
            Some(parser) => parser(rest),
            None => Err(ModuleFailure::UnknownScheme {
                scheme: scheme.to_string(),
                known: known_schemes().map(str::to_string).collect(),
            }),
        },
    }
}

const FORBIDDEN_PATH_CHARS: &[char] = &['<', '>', ':', '"', '\\', '|', '?', '*'];
const FORBIDDEN_TERMINATORS: &[char] = &[' ', '.'];

/// Validates a local module path. Checks run in order and the first offending
/// condition wins; a valid path is kept verbatim (no normalization).
pub fn validate_local_path(path: &str) -> Result<(), ModuleFailure> {
    if path.is_empty() {
        return Err(ModuleFailure::PathIsEmpty);
    }
    if path.starts_with('/') {
        return Err(ModuleFailure::PathBeginsWithSlash);
    }
    for c in path.chars() {
        // '/' is the only accepted separator, for cross-platform paths
        if c == '\\' {
            return Err(ModuleFailure::PathContainsBackSlash);
        }
        if FORBIDDEN_PATH_CHARS.contains(&c) {
            return Err(ModuleFailure::PathContainsForbiddenCharacters);
        }
        // chars 0-31 are invalid in paths on Windows; char::is_control would
        // also reject valid path characters, so the range is checked directly
        if (c as u32) <= 31 {
            return Err(ModuleFailure::PathContainsControlChars);
        }
    }
    if path.ends_with(FORBIDDEN_TERMINATORS) {
        return Err(ModuleFailure::PathHasForbiddenTerminator);
    }
    Ok(())
}

/// `<package-id>@<version>`, split on the last `@` (package ids never contain
/// `@`, versions may contain `.` and `-`).
fn parse_nuget(rest: &str) -> Result<ModuleReference, ModuleFailure> {
    let malformed = || ModuleFailure::MalformedNuGetReference {
        raw: rest.to_string(),
    };
    let (package_id, version) = rest.rsplit_once('@').ok_or_else(malformed)?;
    if package_id.is_empty() || version.is_empty() {
        return Err(malformed());
    }
    Ok(ModuleReference::NuGet {
        package_id: package_id.to_string(),
        version: version.to_string(),
    })
}

/// `<registry>/<repository...>:<tag>`. The registry may itself contain a
/// `:port`, so the tag separator is the final `:` after the last `/`; the
/// repository keeps its leading `/`.
fn parse_oci(rest: &str) -> Result<ModuleReference, ModuleFailure> {
    let malformed = || ModuleFailure::MalformedOciReference {
        raw: rest.to_string(),
    };
    let slash = rest.find('/').ok_or_else(malformed)?;
    let registry = &rest[..slash];
    if registry.is_empty() {
        return Err(malformed());
    }
    let remainder = &rest[slash..];
    let colon = remainder.rfind(':').ok_or_else(malformed)?;
    if remainder[colon..].contains('/') {
        return Err(malformed());
    }
    let repository = &remainder[..colon];
    let tag = &remainder[colon + 1..];
    if repository.len() <= 1 || tag.is_empty() {
        return Err(malformed());
    }
    Ok(ModuleReference::OciArtifact(OciArtifact {
        registry: registry.to_string(),
        repository: repository.to_string(),
        tag: tag.to_string(),
    }))
}
