//! Shared helpers for extractor and end-to-end tests: builders for dumped
//! syntax tree nodes in the shapes the parser produces, and a small graph
//! engine that evaluates the counting patterns the scenarios use.

use std::collections::{HashMap, HashSet, VecDeque};
use std::error::Error;

use regex::Regex;
use serde_json::{json, Value};

use crate::{CypherEngine, ResultTable, Row};

pub fn translation_unit(children: Vec<Value>) -> Value {
    json!({"root": {"kind": "TRANSLATION_UNIT", "children": children}})
}

pub fn function(name: &str, hash: u64, children: Vec<Value>) -> Value {
    json!({"kind": "FUNCTION_DECL", "spelling": name, "hash": hash, "children": children})
}

/// A declaration whose definition lives elsewhere under `definition`.
pub fn fn_declaration(name: &str, hash: u64, definition: u64, children: Vec<Value>) -> Value {
    json!({
        "kind": "FUNCTION_DECL",
        "spelling": name,
        "hash": hash,
        "definition": definition,
        "children": children
    })
}

pub fn annotate(label: &str) -> Value {
    json!({"kind": "ANNOTATE_ATTR", "spelling": label})
}

pub fn param(name: &str, children: Vec<Value>) -> Value {
    json!({"kind": "PARM_DECL", "spelling": name, "children": children})
}

pub fn body(children: Vec<Value>) -> Value {
    json!({"kind": "COMPOUND_STMT", "children": children})
}

pub fn declref(name: &str, referenced: u64) -> Value {
    json!({"kind": "DECL_REF_EXPR", "spelling": name, "referenced": referenced})
}

pub fn unexposed(children: Vec<Value>) -> Value {
    json!({"kind": "UNEXPOSED_EXPR", "children": children})
}

pub fn lambda(hash: u64, children: Vec<Value>) -> Value {
    json!({"kind": "LAMBDA_EXPR", "hash": hash, "children": children})
}

pub fn var_decl(name: &str, hash: u64, children: Vec<Value>) -> Value {
    json!({"kind": "VAR_DECL", "spelling": name, "hash": hash, "children": children})
}

/// A call bound by the parser to the declaration with identity `referenced`.
pub fn call(name: &str, referenced: u64, arguments: Vec<Value>) -> Value {
    let mut children = vec![declref(name, referenced)];
    children.extend(arguments);
    json!({
        "kind": "CALL_EXPR",
        "spelling": name,
        "referenced": referenced,
        "children": children
    })
}

/// A call the parser left unbound; resolution falls back to the name.
pub fn call_by_name(name: &str, arguments: Vec<Value>) -> Value {
    let mut children = vec![json!({"kind": "DECL_REF_EXPR", "spelling": name})];
    children.extend(arguments);
    json!({"kind": "CALL_EXPR", "spelling": name, "children": children})
}

/// Invocation through `operator()`, e.g. calling a std::function value.
/// The invocable is named by an unexposed child.
pub fn operator_call(target: &str, referenced: u64) -> Value {
    json!({
        "kind": "CALL_EXPR",
        "spelling": "operator()",
        "children": [{
            "kind": "UNEXPOSED_EXPR",
            "spelling": target,
            "referenced": referenced,
            "children": [declref(target, referenced)]
        }]
    })
}

/// The implicit std::function construction the parser wraps around an
/// invocable argument.
fn wrap_invocable(inner: Value) -> Value {
    unexposed(vec![json!({
        "kind": "CALL_EXPR",
        "spelling": "",
        "children": [unexposed(vec![unexposed(vec![unexposed(vec![json!({
            "kind": "CALL_EXPR",
            "spelling": "function",
            "children": [inner]
        })])])])]
    })])
}

/// A named function passed as an invocable argument.
pub fn arg_function(name: &str, referenced: u64) -> Value {
    wrap_invocable(declref(name, referenced))
}

/// An anonymous lambda passed inline as an invocable argument.
pub fn arg_lambda(lambda_node: Value) -> Value {
    wrap_invocable(unexposed(vec![lambda_node]))
}

/// `lhs = rhs;` where both sides are plain references.
pub fn assign(lhs_name: &str, rhs_name: &str, rhs_referenced: u64) -> Value {
    json!({
        "kind": "BINARY_OPERATOR",
        "tokens": [lhs_name, "=", rhs_name],
        "children": [
            {"kind": "DECL_REF_EXPR", "spelling": lhs_name, "tokens": [lhs_name]},
            unexposed(vec![declref(rhs_name, rhs_referenced)])
        ]
    })
}

/// An embedded engine just big enough for the end-to-end scenarios: it
/// loads the emitted CREATE statement into an adjacency list and answers
/// counting queries of the shapes `(:A)-->(:B)` and `(:A)-[*]->(:B)`.
pub struct PatternEngine {
    colors: HashMap<String, Option<String>>,
    edges: Vec<(String, String)>,
}

impl PatternEngine {
    pub fn new() -> Self {
        PatternEngine {
            colors: HashMap::new(),
            edges: Vec::new(),
        }
    }

    fn load(&mut self, body: &str) {
        let node = Regex::new(r"^\((`[^`]+`)(?::([A-Za-z0-9_]+))? \{name: '[^']*'\}\)$").unwrap();
        let edge = Regex::new(r"^\((`[^`]+`)\)-\[:CALLS\]->\((`[^`]+`)\)$").unwrap();
        for entry in body.split(",\n  ") {
            if let Some(captures) = edge.captures(entry) {
                self.edges
                    .push((captures[1].to_string(), captures[2].to_string()));
            } else if let Some(captures) = node.captures(entry) {
                self.colors.insert(
                    captures[1].to_string(),
                    captures.get(2).map(|color| color.as_str().to_string()),
                );
            } else {
                panic!("unparseable CREATE entry: {}", entry);
            }
        }
    }

    fn color_of(&self, alias: &str) -> Option<&str> {
        self.colors.get(alias).and_then(|color| color.as_deref())
    }

    /// Any path of length >= 1 from `start` to a node colored `target`.
    fn reaches(&self, start: &str, target: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = self
            .edges
            .iter()
            .filter(|(from, _)| from == start)
            .map(|(_, to)| to.as_str())
            .collect();

        while let Some(alias) = queue.pop_front() {
            if !visited.insert(alias) {
                continue;
            }
            if self.color_of(alias) == Some(target) {
                return true;
            }
            for (from, to) in &self.edges {
                if from == alias {
                    queue.push_back(to.as_str());
                }
            }
        }
        false
    }

    fn any_match(&self, from: &str, to: &str, transitive: bool) -> bool {
        self.colors
            .iter()
            .filter(|(_, color)| color.as_deref() == Some(from))
            .any(|(alias, _)| {
                if transitive {
                    self.reaches(alias, to)
                } else {
                    self.edges.iter().any(|(a, b)| {
                        a == alias && self.color_of(b) == Some(to)
                    })
                }
            })
    }
}

impl CypherEngine for PatternEngine {
    fn exec(&mut self, query: &str) -> Result<ResultTable, Box<dyn Error>> {
        if let Some(body) = query.strip_prefix("CREATE ") {
            self.load(body);
            return Ok(Vec::new());
        }
        if query == "RETURN 0" {
            return Ok(Vec::new());
        }

        let shape = Regex::new(
            r"^MATCH \(:(\w+)\)(-->|-\[\*\]->)\(:(\w+)\) RETURN count\(\*\) > 0 AS invalidcalls$",
        )
        .unwrap();
        let captures = match shape.captures(query) {
            Some(captures) => captures,
            None => return Err(format!("unsupported query: {}", query).into()),
        };

        let transitive = &captures[2] == "-[*]->";
        let matched = self.any_match(&captures[1], &captures[3], transitive);
        let mut row = Row::new();
        row.insert(String::from("invalidcalls"), json!(matched));
        Ok(vec![row])
    }
}
