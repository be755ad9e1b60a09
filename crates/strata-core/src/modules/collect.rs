use std::collections::HashSet;

use super::{parse_reference, ModuleReference};
use crate::grouping::SyntaxTreeGrouping;

/// Gathers every external (non-local) reference declared anywhere in the
/// grouping, each exactly once. Used to batch-download remote artifacts
/// before type checking. Declarations whose reference does not parse carry
/// their own diagnostics already and are skipped here.
pub fn collect_external_references(grouping: &SyntaxTreeGrouping) -> HashSet<ModuleReference> {
    let mut references = HashSet::new();
    for file in grouping.files() {
        for (_, decl) in file.module_decls() {
            match parse_reference(&decl.reference) {
                Ok(reference) if !reference.is_local() => {
                    references.insert(reference);
                }
                Ok(_) | Err(_) => {}
            }
        }
    }
    references
}
