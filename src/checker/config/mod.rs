use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::error;
use serde::Deserialize;
use serde_json::Value;

use super::errors::RainbowError;
use super::executor::{QueryExecutor, ResultTable, Row, SubprocessExecutor};
use super::scope::ScopeTree;

/// Tri-valued outcome of checking a translation unit. `Invalid` dominates
/// `Unknown`, which dominates `Valid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Valid,
    Unknown,
    Invalid,
}

impl Verdict {
    /// Combine two verdicts; the more severe one wins.
    pub fn combine(self, other: Verdict) -> Verdict {
        self.max(other)
    }

    /// Process exit code for this verdict: 0 valid, 1 invalid, 2 unknown.
    pub fn exit_code(self) -> exitcode::ExitCode {
        match self {
            Verdict::Valid => exitcode::OK,
            Verdict::Invalid => 1,
            Verdict::Unknown => 2,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Valid => write!(f, "valid"),
            Verdict::Unknown => write!(f, "unknown"),
            Verdict::Invalid => write!(f, "invalid"),
        }
    }
}

/// A single validation rule: a Cypher path expression that, if matched,
/// indicates the program violates color discipline. A pattern either counts
/// matches (the default) or, when `error_msg` is present, reports every
/// match as a diagnostic with `%var` substitution from the row's bindings.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    match_pattern: String,
    on_match: Option<IndexMap<String, String>>,
    error_msg: Option<String>,
}

impl Pattern {
    pub fn new(match_pattern: impl Into<String>) -> Self {
        Pattern {
            match_pattern: match_pattern.into(),
            on_match: None,
            error_msg: None,
        }
    }

    /// Report every match through `message` (`RETURN *` mode).
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.error_msg = Some(message.into());
        self
    }

    /// Report every match through `message`, projecting the expressions in
    /// `on_match` as the named variables available for substitution.
    pub fn with_projection(
        mut self,
        on_match: IndexMap<String, String>,
        message: impl Into<String>,
    ) -> Self {
        self.on_match = Some(on_match);
        self.error_msg = Some(message.into());
        self
    }

    /// Assemble the Cypher query dispatched for this pattern.
    pub fn to_query(&self) -> String {
        let pattern = self.match_pattern.trim();
        if let Some(on_match) = &self.on_match {
            let projection: Vec<String> = on_match
                .iter()
                .map(|(variable, expression)| format!("{} AS {}", expression, variable))
                .collect();
            format!("MATCH {} RETURN DISTINCT {}", pattern, projection.join(", "))
        } else if self.error_msg.is_some() {
            format!("MATCH {} RETURN *", pattern)
        } else {
            format!("MATCH {} RETURN count(*) > 0 AS invalidcalls", pattern)
        }
    }

    /// Interpret the executor's result table for this pattern. A missing
    /// table means the query's outcome could not be determined.
    pub fn interpret(&self, table: Option<&ResultTable>) -> Verdict {
        let rows = match table {
            Some(rows) => rows,
            None => return Verdict::Unknown,
        };

        if self.on_match.is_some() || self.error_msg.is_some() {
            for row in rows {
                error!("{}", self.render_message(row));
            }
            if rows.is_empty() {
                Verdict::Valid
            } else {
                Verdict::Invalid
            }
        } else {
            match rows
                .first()
                .and_then(|row| row.get("invalidcalls"))
                .and_then(Value::as_bool)
            {
                Some(true) => Verdict::Invalid,
                Some(false) => Verdict::Valid,
                None => Verdict::Unknown,
            }
        }
    }

    /// Substitute `%var` bindings into the diagnostic template. Strings are
    /// inserted bare; any other value keeps its JSON rendering.
    fn render_message(&self, row: &Row) -> String {
        let mut message = self.error_msg.clone().unwrap_or_default();
        for (variable, value) in row {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            message = message.replace(&format!("%{}", variable), &rendered);
        }
        message
    }
}

fn default_prefix() -> String {
    String::from("COLOR::")
}

/// On-disk pattern entries: a bare string is shorthand for a counting
/// pattern; the object form optionally carries a projection and a message.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawPattern {
    Shorthand(String),
    Full {
        pattern: String,
        #[serde(default)]
        on_match: Option<IndexMap<String, String>>,
        #[serde(default)]
        msg: Option<String>,
    },
}

#[derive(Deserialize)]
struct RawConfig {
    colors: Vec<String>,
    patterns: Vec<RawPattern>,
    #[serde(default = "default_prefix")]
    prefix: String,
    #[serde(default)]
    executor: Option<PathBuf>,
}

/// The checker's configuration: the color palette, the annotation prefix,
/// the validation patterns and (optionally) an external executor.
#[derive(Debug, Clone)]
pub struct Config {
    source: PathBuf,
    colors: Vec<String>,
    patterns: Vec<Pattern>,
    prefix: String,
    executor: Option<PathBuf>,
}

impl Config {
    /// Build a config programmatically with the default prefix.
    pub fn new(source: impl Into<PathBuf>, colors: Vec<String>, patterns: Vec<Pattern>) -> Self {
        Config {
            source: source.into(),
            colors,
            patterns,
            prefix: default_prefix(),
            executor: None,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_executor(mut self, executor: impl Into<PathBuf>) -> Self {
        self.executor = Some(executor.into());
        self
    }

    /// Convert a JSON config file to a config.
    pub fn from_json_file(path: &Path) -> Result<Config, RainbowError> {
        let data = fs::read_to_string(path)
            .map_err(|why| RainbowError::Config(format!("{}: {}", path.display(), why)))?;
        let value: Value = serde_json::from_str(&data)
            .map_err(|why| RainbowError::Config(why.to_string()))?;
        Config::from_value(path.to_path_buf(), value)
    }

    /// Convert a parsed JSON document to a config.
    pub fn from_value(source: PathBuf, value: Value) -> Result<Config, RainbowError> {
        let raw: RawConfig =
            serde_json::from_value(value).map_err(|why| RainbowError::Config(why.to_string()))?;

        let mut patterns = Vec::new();
        for raw_pattern in raw.patterns {
            match raw_pattern {
                RawPattern::Shorthand(pattern) => patterns.push(Pattern::new(pattern)),
                RawPattern::Full {
                    pattern,
                    on_match,
                    msg,
                } => {
                    if on_match.is_some() && msg.is_none() {
                        return Err(RainbowError::Config(format!(
                            "pattern '{}' has on_match but no msg",
                            pattern
                        )));
                    }
                    patterns.push(Pattern {
                        match_pattern: pattern,
                        on_match,
                        error_msg: msg,
                    });
                }
            }
        }

        if let Some(executor) = &raw.executor {
            if !executor.exists() {
                return Err(RainbowError::Config(format!(
                    "could not find executable at {}",
                    executor.display()
                )));
            }
        }

        Ok(Config {
            source,
            colors: raw.colors,
            patterns,
            prefix: raw.prefix,
            executor: raw.executor,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    pub fn contains_color(&self, color: &str) -> bool {
        self.colors.iter().any(|known| known == color)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn executor(&self) -> Option<&Path> {
        self.executor.as_deref()
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Run the patterns against an extracted scope tree through the
    /// configured subprocess executor. Embedders without one supply their
    /// engine through `run_with` instead.
    pub fn run(&self, tree: &ScopeTree) -> Result<Verdict, RainbowError> {
        let executor_path = match &self.executor {
            Some(path) => path,
            None => {
                return Err(RainbowError::Config(String::from(
                    "no executor configured; embed a CypherEngine and use run_with",
                )))
            }
        };
        let mut executor = SubprocessExecutor::spawn(executor_path, &self.source)?;
        Ok(self.run_with(tree, &mut executor))
    }

    /// Dispatch the graph's `CREATE` statement followed by every pattern
    /// query, in config order, and combine the per-pattern verdicts. All
    /// patterns are evaluated so every diagnostic is reported.
    pub fn run_with(&self, tree: &ScopeTree, executor: &mut dyn QueryExecutor) -> Verdict {
        executor.execute(&tree.to_cypher());

        let mut verdict = Verdict::Valid;
        for pattern in &self.patterns {
            let table = executor.execute(&pattern.to_query());
            verdict = verdict.combine(pattern.interpret(table.as_ref()));
        }
        verdict
    }
}
