use std::fmt;

use serde::Deserialize;

pub mod cursor_kind;
pub mod tree;

// Concrete Definition Re-Export
pub use self::cursor_kind::CursorKind;
pub use self::tree::{NodeRef, SyntaxTree};

/// Stable per-node identity assigned by the parser. Declarations are
/// captured under this identity so later references can bypass name lookup.
pub type NodeHash = u64;

/// Severity of a parser diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Ignored,
    Note,
    Warning,
    Error,
    Fatal,
}

/// A diagnostic reported by the parser for the translation unit.
#[derive(Debug, Clone, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Position of a node in the original source, used in error reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceLocation {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}:{}", self.file, self.line, self.column)
    }
}

/// Cursor is the checker's view of one node of the parser's syntax tree.
///
/// The parser itself is an external collaborator; any tree that can answer
/// these questions can be checked. `referenced_hash` and `definition_hash`
/// expose the parser's own binding of references to declarations and of
/// declarations to their definitions, where it has one.
pub trait Cursor: Clone {
    fn kind(&self) -> CursorKind;
    fn spelling(&self) -> String;
    fn children(&self) -> Vec<Self>;
    fn semantic_parent(&self) -> Option<Self>;
    fn hash(&self) -> NodeHash;
    fn location(&self) -> SourceLocation;

    /// The token spellings covered by this node, in source order.
    fn tokens(&self) -> Vec<String>;

    /// Identity of the declaration this node references, if bound.
    fn referenced_hash(&self) -> Option<NodeHash>;

    /// Identity of the definition for this declaration, if the parser has
    /// collapsed redeclarations onto one.
    fn definition_hash(&self) -> Option<NodeHash>;
}

/// One parsed C++ translation unit: a root cursor plus parser diagnostics.
pub trait TranslationUnit {
    type Node: Cursor;

    fn cursor(&self) -> Self::Node;
    fn diagnostics(&self) -> &[Diagnostic];
}
