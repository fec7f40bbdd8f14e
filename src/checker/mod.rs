pub mod config;
pub mod errors;
pub mod executor;
pub mod extractor;
pub mod scope;
pub mod syntax;

// Concrete Definitions Re-Export
pub use self::config::{Config, Pattern, Verdict};
pub use self::errors::RainbowError;
pub use self::executor::{
    CypherEngine, InProcessExecutor, QueryExecutor, ResultTable, Row, SubprocessExecutor,
};
pub use self::extractor::Extractor;
pub use self::scope::{Scope, ScopeId, ScopeKind, ScopeTree};
pub use self::syntax::{
    Cursor, CursorKind, Diagnostic, NodeHash, NodeRef, Severity, SourceLocation, SyntaxTree,
    TranslationUnit,
};

/// Rainbow wires one parsed translation unit through the extractor, the
/// Cypher serializer, the query executor and the pattern interpreter.
///
/// # Checking Diagram
/// syntax tree -> Extractor -> ScopeTree -> Cypher CREATE -> QueryExecutor -> result tables -> Verdict
pub struct Rainbow<T: TranslationUnit> {
    tu: T,
    config: Config,
}

#[allow(dead_code)] // Some of these functions act as a library interface
impl<T: TranslationUnit> Rainbow<T> {
    pub fn new(tu: T, config: Config) -> Self {
        Rainbow { tu, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Extract the call graph and colors for every function. Parser error
    /// diagnostics abort before extraction begins.
    pub fn process(&self) -> Result<ScopeTree, RainbowError> {
        Extractor::new(&self.config).extract(&self.tu)
    }

    /// Check the translation unit end to end using the configured
    /// subprocess executor.
    pub fn run(&self) -> Result<Verdict, RainbowError> {
        let tree = self.process()?;
        self.config.run(&tree)
    }

    /// Check the translation unit end to end against a caller supplied
    /// executor.
    pub fn run_with(&self, executor: &mut dyn QueryExecutor) -> Result<Verdict, RainbowError> {
        let tree = self.process()?;
        Ok(self.config.run_with(&tree, executor))
    }
}
