use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;

use super::errors::RainbowError;

mod cypher;

/// Unique id associated with every scope regardless of position in the tree.
///
/// The root is always 0 and ordinary scopes receive dense positive ids from
/// the extractor's generator. Parameter proxies live below `INVALID` on a
/// descending counter owned by the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(i64);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);
    pub const INVALID: ScopeId = ScopeId(-1);

    pub fn new(id: i64) -> Self {
        ScopeId(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a scope stands for in the program's nested name tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeKind {
    /// The translation unit itself.
    Root,
    /// An anonymous block.
    Block,
    /// A named function; functions own parameters and act as scopes for
    /// their bodies.
    Function {
        name: String,
        color: Option<String>,
        params: IndexMap<String, ScopeId>,
    },
    /// A parameter proxy. Proxies are first class graph nodes so that
    /// parameter mediated calls are traversable by patterns.
    Param { name: String, color: Option<String> },
}

/// A node in the program's nested name tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Scope {
    id: ScopeId,
    parent: Option<ScopeId>,
    kind: ScopeKind,
    functions: IndexMap<String, ScopeId>,
    child_scopes: Vec<ScopeId>,
    called_functions: Vec<ScopeId>,
}

impl Scope {
    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    /// Name of this scope if it is a function or a parameter proxy.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            ScopeKind::Function { name, .. } | ScopeKind::Param { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn color(&self) -> Option<&str> {
        match &self.kind {
            ScopeKind::Function { color, .. } | ScopeKind::Param { color, .. } => color.as_deref(),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, ScopeKind::Function { .. })
    }

    pub fn is_param(&self) -> bool {
        matches!(self.kind, ScopeKind::Param { .. })
    }

    /// Functions declared directly in this scope, in declaration order.
    pub fn functions(&self) -> &IndexMap<String, ScopeId> {
        &self.functions
    }

    /// Parameter proxies of a function scope, in declaration order.
    pub fn params(&self) -> Option<&IndexMap<String, ScopeId>> {
        match &self.kind {
            ScopeKind::Function { params, .. } => Some(params),
            _ => None,
        }
    }

    pub fn child_scopes(&self) -> &[ScopeId] {
        &self.child_scopes
    }

    pub fn called_functions(&self) -> &[ScopeId] {
        &self.called_functions
    }
}

/// Arena of scopes indexed by id.
///
/// Scopes reference each other through ids rather than owning pointers, so
/// the tree stays cheap to clone and post-extraction traversals are pure
/// index walks. The tree is only mutated during extraction; serialization
/// and resolution never mutate.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: HashMap<ScopeId, Scope>,
    next_param_id: i64,
}

impl ScopeTree {
    /// Create a tree holding only the root scope.
    pub fn new() -> Self {
        let mut scopes = HashMap::new();
        scopes.insert(
            ScopeId::ROOT,
            Scope {
                id: ScopeId::ROOT,
                parent: None,
                kind: ScopeKind::Root,
                functions: IndexMap::new(),
                child_scopes: Vec::new(),
                called_functions: Vec::new(),
            },
        );
        ScopeTree {
            scopes,
            next_param_id: ScopeId::INVALID.as_i64() - 1,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    /// Look up a scope by id. Ids handed out by this tree are always valid.
    pub fn get(&self, id: ScopeId) -> &Scope {
        self.scopes
            .get(&id)
            .unwrap_or_else(|| panic!("No scope with id {}! Scope tree malformed!", id))
    }

    fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        self.scopes
            .get_mut(&id)
            .unwrap_or_else(|| panic!("No scope with id {}! Scope tree malformed!", id))
    }

    /// Create an anonymous block scope under `parent`.
    /// The caller guarantees `id` is fresh.
    pub fn create_block(&mut self, id: ScopeId, parent: ScopeId) -> ScopeId {
        self.scopes.insert(
            id,
            Scope {
                id,
                parent: Some(parent),
                kind: ScopeKind::Block,
                functions: IndexMap::new(),
                child_scopes: Vec::new(),
                called_functions: Vec::new(),
            },
        );
        self.get_mut(parent).child_scopes.push(id);
        id
    }

    /// Create a function scope under `parent` and materialize one parameter
    /// proxy per `params` entry. Re-declaring a name already present in the
    /// parent updates that entry rather than adding a sibling.
    /// The caller guarantees `id` is fresh.
    pub fn create_function(
        &mut self,
        id: ScopeId,
        parent: ScopeId,
        name: &str,
        color: Option<String>,
        params: &[(String, Option<String>)],
    ) -> ScopeId {
        let mut param_map = IndexMap::new();
        for (param_name, param_color) in params {
            let param_id = ScopeId::new(self.next_param_id);
            self.next_param_id -= 1;
            self.scopes.insert(
                param_id,
                Scope {
                    id: param_id,
                    parent: Some(id),
                    kind: ScopeKind::Param {
                        name: param_name.clone(),
                        color: param_color.clone(),
                    },
                    functions: IndexMap::new(),
                    child_scopes: Vec::new(),
                    called_functions: Vec::new(),
                },
            );
            param_map.insert(param_name.clone(), param_id);
        }

        self.scopes.insert(
            id,
            Scope {
                id,
                parent: Some(parent),
                kind: ScopeKind::Function {
                    name: name.to_string(),
                    color,
                    params: param_map,
                },
                functions: IndexMap::new(),
                child_scopes: Vec::new(),
                called_functions: Vec::new(),
            },
        );
        self.get_mut(parent).functions.insert(name.to_string(), id);
        id
    }

    /// Record that `caller` calls the already resolved scope `callee`.
    /// Calls are kept in registration order.
    pub fn register_call(&mut self, caller: ScopeId, callee: ScopeId) {
        self.get_mut(caller).called_functions.push(callee);
    }

    /// Resolve `name` from `caller` and record the call.
    /// Unlike the extractor's call path this raises on resolution failure.
    pub fn register_call_by_name(
        &mut self,
        caller: ScopeId,
        name: &str,
    ) -> Result<ScopeId, RainbowError> {
        let callee = self
            .resolve_function(caller, name)
            .ok_or_else(|| RainbowError::FunctionResolution(name.to_string()))?;
        self.register_call(caller, callee);
        Ok(callee)
    }

    /// Lexical, innermost-first name lookup:
    /// 1. a function resolves its own name (direct recursion),
    /// 2. then functions declared in this scope,
    /// 3. then a function's parameters,
    /// 4. then the enclosing scope.
    /// Siblings are never visible; parameters shadow enclosing functions.
    pub fn resolve_function(&self, from: ScopeId, name: &str) -> Option<ScopeId> {
        let scope = self.get(from);
        if let Some(own_name) = scope.name() {
            if !own_name.is_empty() && own_name == name {
                return Some(from);
            }
        }
        if let Some(&found) = scope.functions.get(name) {
            return Some(found);
        }
        if let ScopeKind::Function { params, .. } = &scope.kind {
            if let Some(&found) = params.get(name) {
                return Some(found);
            }
        }
        match scope.parent {
            Some(parent) => self.resolve_function(parent, name),
            None => None,
        }
    }

    /// Overwrite the color of a function or parameter scope.
    pub fn set_color(&mut self, id: ScopeId, new_color: Option<String>) {
        match &mut self.get_mut(id).kind {
            ScopeKind::Function { color, .. } | ScopeKind::Param { color, .. } => {
                *color = new_color;
            }
            _ => panic!("Scope {} cannot carry a color!", id),
        }
    }

    /// The (name, color) signature of a function's parameters in order.
    /// Empty for parameter proxies and non-functions.
    pub fn param_colors(&self, id: ScopeId) -> IndexMap<String, Option<String>> {
        match self.get(id).params() {
            Some(params) => params
                .iter()
                .map(|(name, &param_id)| {
                    (name.clone(), self.get(param_id).color().map(String::from))
                })
                .collect(),
            None => IndexMap::new(),
        }
    }

    /// The Cypher alias naming this scope's graph node. Aliases are unique
    /// across the tree by construction: function ids are unique and a
    /// parameter alias embeds its function's id.
    pub fn alias(&self, id: ScopeId) -> String {
        let scope = self.get(id);
        match &scope.kind {
            ScopeKind::Function { name, .. } => format!("`{}__{}`", name, scope.id),
            ScopeKind::Param { name, .. } => {
                let function = self.get(
                    scope
                        .parent
                        .unwrap_or_else(|| panic!("Parameter {} has no function!", id)),
                );
                match function.name() {
                    Some(function_name) => {
                        format!("`{}__param__{}__{}`", name, function_name, function.id)
                    }
                    None => panic!("Parameter {} is not owned by a function!", id),
                }
            }
            _ => panic!("Aliases are only defined for functions and parameters!"),
        }
    }
}

/// Formatting a scope tree writes an indented dump of every scope, its
/// color, parameters, functions and recorded calls.
impl fmt::Display for ScopeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn print_scope(
            tree: &ScopeTree,
            f: &mut fmt::Formatter<'_>,
            id: ScopeId,
            depth: usize,
        ) -> fmt::Result {
            let indent = "  ".repeat(depth);
            let scope = tree.get(id);

            writeln!(f, "{}{{ {}", indent, scope.id)?;
            writeln!(f, "{}  Color: {:?}", indent, scope.color())?;
            if let Some(params) = scope.params() {
                writeln!(f, "{}  Params:", indent)?;
                for (name, &param_id) in params {
                    writeln!(
                        f,
                        "{}    {}: {:?}",
                        indent,
                        name,
                        tree.get(param_id).color()
                    )?;
                }
            }
            writeln!(f, "{}  Functions:", indent)?;
            for (name, &fn_id) in &scope.functions {
                writeln!(f, "{}    {}:", indent, name)?;
                print_scope(tree, f, fn_id, depth + 2)?;
            }
            writeln!(f, "{}  Called functions:", indent)?;
            for &callee in &scope.called_functions {
                writeln!(
                    f,
                    "{}    {}",
                    indent,
                    tree.get(callee).name().unwrap_or("?")
                )?;
            }
            writeln!(f, "{}  Child scopes:", indent)?;
            for (position, &child) in scope.child_scopes.iter().enumerate() {
                writeln!(f, "{}    {}:", indent, position)?;
                print_scope(tree, f, child, depth + 2)?;
            }
            writeln!(f, "{}}}", indent)
        }

        print_scope(self, f, ScopeId::ROOT, 0)
    }
}
