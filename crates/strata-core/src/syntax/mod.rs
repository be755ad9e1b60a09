use crate::span::Span;
use crate::vfs::VirtualPath;

pub mod parser;

pub use parser::parse_source;

/// Parsed representation of one source file, keyed by its canonical location.
/// Built once per location per build and shared behind `Arc` afterwards.
#[derive(Debug)]
pub struct SourceFile {
    location: VirtualPath,
    statements: Vec<Statement>,
}

impl SourceFile {
    pub fn new(location: VirtualPath, statements: Vec<Statement>) -> Self {
        Self {
            location,
            statements,
        }
    }

    pub fn location(&self) -> &VirtualPath {
        &self.location
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Iterates the top-level module declarations. Declarations never nest,
    /// so a flat scan over statements is sufficient.
    pub fn module_decls(&self) -> impl Iterator<Item = (DeclId, &ModuleDecl)> + '_ {
        self.statements
            .iter()
            .enumerate()
            .filter_map(|(index, statement)| match statement {
                Statement::Module(decl) => Some((
                    DeclId {
                        file: self.location.clone(),
                        index,
                    },
                    decl,
                )),
                Statement::Other { .. } => None,
            })
    }
}

#[derive(Debug)]
pub enum Statement {
    /// A `module <name> '<reference>'` declaration.
    Module(ModuleDecl),
    /// Any other top-level statement, kept verbatim.
    Other { text: String, span: Span },
}

/// One `module` statement. `reference` is the raw, unvalidated reference
/// string; an unterminated or missing string literal leaves it empty so the
/// build can attach a diagnostic to the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: String,
    pub reference: String,
    pub span: Span,
}

/// Structural identity of a module declaration: the declaring file plus the
/// declaration's statement index within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclId {
    pub file: VirtualPath,
    pub index: usize,
}

impl std::fmt::Display for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.file, self.index)
    }
}
