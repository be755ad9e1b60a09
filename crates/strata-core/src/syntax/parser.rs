use super::{ModuleDecl, SourceFile, Statement};
use crate::span::Span;
use crate::vfs::VirtualPath;

/// Total statement scanner. Always produces a tree: unrecognized lines become
/// opaque statements and a malformed `module` statement yields a declaration
/// with an empty reference string, so every problem surfaces later as a
/// per-declaration diagnostic instead of a parse abort.
pub fn parse_source(location: VirtualPath, text: &str) -> SourceFile {
    let mut statements = Vec::new();
    let mut offset: u32 = 0;
    for line in text.split('\n') {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("//") {
            let lo = offset + (line.len() - line.trim_start().len()) as u32;
            let span = Span::new(lo, lo + trimmed.len() as u32);
            statements.push(match module_statement(trimmed, span) {
                Some(decl) => Statement::Module(decl),
                None => Statement::Other {
                    text: trimmed.to_string(),
                    span,
                },
            });
        }
        offset += line.len() as u32 + 1;
    }
    SourceFile::new(location, statements)
}

fn module_statement(line: &str, span: Span) -> Option<ModuleDecl> {
    let rest = line.strip_prefix("module")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let rest = rest.trim_start();
    let name: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let reference = quoted_literal(&rest[name.len()..]).unwrap_or_default();
    Some(ModuleDecl {
        name,
        reference,
        span,
    })
}

fn quoted_literal(text: &str) -> Option<String> {
    let start = text.find('\'')?;
    let rest = &text[start + 1..];
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> VirtualPath {
        VirtualPath::from("/main.strata")
    }

    #[test]
    fn finds_top_level_module_declarations() {
        let text = "param env string\n\
                    module network './network.strata' = {\n\
                    }\n\
                    module registry 'oci:example.com/infra/net:v1' = {\n\
                    }\n";
        let tree = parse_source(location(), text);
        let decls: Vec<_> = tree.module_decls().map(|(_, decl)| decl.clone()).collect();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].name, "network");
        assert_eq!(decls[0].reference, "./network.strata");
        assert_eq!(decls[1].reference, "oci:example.com/infra/net:v1");
    }

    #[test]
    fn malformed_declaration_keeps_empty_reference() {
        let tree = parse_source(location(), "module broken\n");
        let decls: Vec<_> = tree.module_decls().collect();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].1.reference, "");
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let tree = parse_source(location(), "// header\n\nvar x = 1\n");
        assert_eq!(tree.statements().len(), 1);
        assert!(tree.module_decls().next().is_none());
    }

    #[test]
    fn moduleish_identifiers_are_not_declarations() {
        let tree = parse_source(location(), "moduleCount = 3\n");
        assert!(tree.module_decls().next().is_none());
    }

    #[test]
    fn declaration_ids_are_stable_statement_indices() {
        let text = "var a = 1\nmodule m './m.strata'\n";
        let tree = parse_source(location(), text);
        let (id, _) = tree.module_decls().next().expect("one declaration");
        assert_eq!(id.index, 1);
        assert_eq!(id.file, location());
    }
}
