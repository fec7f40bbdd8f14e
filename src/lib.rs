//! rainbow - arbitrary function coloring for C++.
//!
//! Rainbow enforces user-declared function-color discipline: every function
//! may carry at most one color from a configured palette, and program
//! admissibility is expressed as Cypher patterns over the typed call graph
//! extracted from one translation unit. A non-empty match rejects the
//! program.

// Internal Modules
mod checker;

pub use checker::{
    Config, Cursor, CursorKind, CypherEngine, Diagnostic, Extractor, InProcessExecutor, NodeHash,
    NodeRef, Pattern, QueryExecutor, Rainbow, RainbowError, ResultTable, Row, Scope, ScopeId,
    ScopeKind, ScopeTree, Severity, SourceLocation, SubprocessExecutor, SyntaxTree,
    TranslationUnit, Verdict,
};

#[cfg(test)]
mod test;
