use std::path::PathBuf;

use thiserror::Error;

use super::syntax::SourceLocation;

/// Failures raised while checking a translation unit.
///
/// Extraction-time variants abort the whole run; anything the checker can
/// recover from (unsupported node kinds, unresolved call names, unverifiable
/// arities) is logged as a warning instead and never appears here.
#[derive(Error, Debug)]
pub enum RainbowError {
    /// The C++ parser reported at least one error diagnostic.
    #[error("detected syntax errors in source")]
    CppSyntaxErrors,

    /// An alias or argument binding disagrees with the color of its source.
    #[error("invalid assignment to {name} in {location}\n  original color {original:?}, new color: {new:?}")]
    InvalidAssignment {
        location: SourceLocation,
        name: String,
        original: Option<String>,
        new: Option<String>,
    },

    /// An annotation decoded to a string outside the configured palette.
    #[error("unknown color '{color}' in {location}")]
    UnknownColor {
        location: SourceLocation,
        color: String,
    },

    /// One entity was annotated with two different colors.
    #[error("multiple colors found for {entity}")]
    MultipleColors { entity: String },

    /// A redeclaration disagrees with the parameter list already recorded.
    #[error("mismatched parameters for {function}: {expected:?} vs {found:?}")]
    MismatchedParameters {
        function: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// A function name could not be resolved from the requesting scope.
    #[error("could not resolve function {0}")]
    FunctionResolution(String),

    /// A lambda expression is not bound to any variable declaration.
    #[error("unnamed lambda in {0} is not bound to a variable")]
    UnnamedLambda(SourceLocation),

    /// The config file is malformed or references a missing executor.
    #[error("invalid config: {0}")]
    Config(String),

    /// The syntax tree dump could not be read or decoded.
    #[error("could not load syntax tree: {0}")]
    SyntaxTree(String),

    /// The external executor process could not be started.
    #[error("could not start executor {path}: {source}")]
    ExecutorSpawn {
        path: PathBuf,
        source: std::io::Error,
    },
}
