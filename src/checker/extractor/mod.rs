use std::collections::{HashMap, HashSet, VecDeque};

use log::{debug, warn};

use super::config::Config;
use super::errors::RainbowError;
use super::scope::{ScopeId, ScopeTree};
use super::syntax::{
    Cursor, CursorKind, NodeHash, Severity, SourceLocation, TranslationUnit,
};

mod classify;

/// Work list of (node, enclosing scope) pairs. The walk is iterative so
/// pathologically deep syntax trees cannot exhaust the runtime stack.
type Frontier<C> = VecDeque<(C, ScopeId)>;

/// Schedule `children` ahead of the remaining frontier, preserving source
/// order.
fn push_children_front<C: Cursor>(frontier: &mut Frontier<C>, children: Vec<C>, scope: ScopeId) {
    for child in children.into_iter().rev() {
        frontier.push_front((child, scope));
    }
}

/// Extracts the scope tree from a parsed translation unit: classifies every
/// node, tracks the nested scope hierarchy, resolves call targets and
/// enforces the color consistency invariants.
pub struct Extractor<'cfg> {
    config: &'cfg Config,
    tree: ScopeTree,
    scope_id_vendor: i64,

    // Unsupported kinds we have already warned about
    seen_unsupported: HashSet<CursorKind>,

    // Declarations captured by parser identity, consulted before name lookup
    scopes_by_identity: HashMap<NodeHash, ScopeId>,
}

impl<'cfg> Extractor<'cfg> {
    pub fn new(config: &'cfg Config) -> Self {
        Extractor {
            config,
            tree: ScopeTree::new(),
            scope_id_vendor: 0,
            seen_unsupported: HashSet::new(),
            scopes_by_identity: HashMap::new(),
        }
    }

    /// Process the translation unit and extract the call graph with colors
    /// for every function. Error diagnostics from the parser abort before
    /// the walk begins; warnings are logged and ignored.
    pub fn extract<T: TranslationUnit>(mut self, tu: &T) -> Result<ScopeTree, RainbowError> {
        let mut error_count = 0;
        for diagnostic in tu.diagnostics() {
            match diagnostic.severity {
                Severity::Warning => warn!("found warning diagnostic: {}", diagnostic.message),
                Severity::Error | Severity::Fatal => {
                    error_count += 1;
                    warn!("found error diagnostic: {}", diagnostic.message);
                }
                _ => {}
            }
        }
        if error_count > 0 {
            return Err(RainbowError::CppSyntaxErrors);
        }

        self.walk(tu.cursor())?;
        Ok(self.tree)
    }

    fn next_scope_id(&mut self) -> ScopeId {
        self.scope_id_vendor += 1;
        ScopeId::new(self.scope_id_vendor)
    }

    fn walk<C: Cursor>(&mut self, root: C) -> Result<(), RainbowError> {
        let mut frontier: Frontier<C> = VecDeque::new();
        frontier.push_back((root, self.tree.root()));

        while let Some((node, scope)) = frontier.pop_front() {
            let kind = node.kind();

            if classify::is_unsupported(&kind) {
                if self.seen_unsupported.insert(kind.clone()) {
                    warn!("unsupported node type {}", kind);
                }
                continue;
            }
            if classify::is_skipped(&kind) {
                continue;
            }

            if classify::is_scope(&kind) {
                let id = self.next_scope_id();
                let block = self.tree.create_block(id, scope);
                push_children_front(&mut frontier, node.children(), block);
                continue;
            }

            if let Some(lambda) = classify::as_lambda(&node) {
                self.process_lambda_definition(&node, &lambda, scope, &mut frontier)?;
                continue;
            }

            if let Some((name, identity)) = classify::as_fn_decl(&node) {
                let (body, function) = self.process_function(&name, identity, &node, scope)?;
                if let Some(body) = body {
                    push_children_front(&mut frontier, body.children(), function);
                }
                continue;
            }

            if classify::is_var_decl(&kind) && self.process_alias_decl(&node, scope)? {
                continue;
            }

            if let Some((lhs, rhs)) = classify::as_assignment(&node) {
                if self.process_alias_assign(&lhs, &rhs, scope)? {
                    continue;
                }
            }

            if let Some((name, identity)) = classify::as_call(&node) {
                self.process_call(&node, &name, identity, scope, &mut frontier)?;
            }
            push_children_front(&mut frontier, node.children(), scope);
        }
        Ok(())
    }

    /// A lambda reached by the walker is either bound to a variable
    /// declaration, which names it, or was already registered while
    /// processing a call argument, in which case its body is scheduled.
    fn process_lambda_definition<C: Cursor>(
        &mut self,
        node: &C,
        lambda: &C,
        scope: ScopeId,
        frontier: &mut Frontier<C>,
    ) -> Result<(), RainbowError> {
        if self.scopes_by_identity.contains_key(&lambda.hash()) {
            return Ok(());
        }

        let binding = match node.semantic_parent() {
            Some(parent) if classify::is_var_decl(&parent.kind()) => parent,
            _ => return Err(RainbowError::UnnamedLambda(node.location())),
        };
        let (body, function) =
            self.process_function(&binding.spelling(), binding.hash(), node, scope)?;
        if let Some(body) = body {
            push_children_front(frontier, body.children(), function);
        }
        Ok(())
    }

    /// Collect a definition's color, parameters and body, then register the
    /// function, merging with the scope already known for its identity when
    /// a declaration was seen before.
    fn process_function<C: Cursor>(
        &mut self,
        name: &str,
        identity: NodeHash,
        node: &C,
        scope: ScopeId,
    ) -> Result<(Option<C>, ScopeId), RainbowError> {
        let mut fn_color: Option<String> = None;
        let mut params: Vec<(String, Option<String>)> = Vec::new();
        let mut body: Option<C> = None;

        let mut definition = node.clone();
        if let Some(lambda) = classify::as_lambda(node) {
            // A lambda's color may live on the variable declaration binding it.
            if let Some(parent) = node.semantic_parent() {
                if classify::is_var_decl(&parent.kind()) {
                    for child in parent.children() {
                        if let Some(color) = self.as_color(&child)? {
                            merge_color(&mut fn_color, color, || format!("function {}", name))?;
                        }
                    }
                }
            }
            definition = lambda;
        }

        for child in definition.children() {
            if let Some(color) = self.as_color(&child)? {
                merge_color(&mut fn_color, color, || format!("function {}", name))?;
            } else if child.kind() == CursorKind::ParmDecl {
                let mut param_name = child.spelling();
                if param_name.is_empty() {
                    param_name = format!("!unnamed_param{}", params.len());
                }
                let mut param_color: Option<String> = None;
                for attr in child.children() {
                    if let Some(color) = self.as_color(&attr)? {
                        merge_color(&mut param_color, color, || {
                            format!("param {} of function {}", param_name, name)
                        })?;
                    }
                }
                params.push((param_name, param_color));
            } else if classify::is_scope(&child.kind()) {
                if body.is_some() {
                    panic!("Malformed syntax tree! Function {} has more than one body", name);
                }
                body = Some(child);
            }
        }

        if let Some(&function) = self.scopes_by_identity.get(&identity) {
            self.merge_function(function, name, fn_color, &params)?;
            return Ok((body, function));
        }

        let id = self.next_scope_id();
        let function = self.tree.create_function(id, scope, name, fn_color, &params);
        self.scopes_by_identity.insert(identity, function);
        Ok((body, function))
    }

    /// Reconcile a redeclaration with the entry already registered under the
    /// same identity. Colors only upgrade from unset; parameter lists must
    /// agree in count, names and order.
    fn merge_function(
        &mut self,
        function: ScopeId,
        name: &str,
        color: Option<String>,
        params: &[(String, Option<String>)],
    ) -> Result<(), RainbowError> {
        let existing_color = self.tree.get(function).color().map(String::from);
        match (&existing_color, &color) {
            (Some(existing), Some(new)) if existing != new => {
                return Err(RainbowError::MultipleColors {
                    entity: format!("function {}", name),
                });
            }
            (None, Some(_)) => self.tree.set_color(function, color.clone()),
            _ => {}
        }

        let existing_params: Vec<(String, ScopeId)> = match self.tree.get(function).params() {
            Some(existing) => existing
                .iter()
                .map(|(param_name, &id)| (param_name.clone(), id))
                .collect(),
            None => Vec::new(),
        };
        let expected: Vec<String> = existing_params.iter().map(|(n, _)| n.clone()).collect();
        let found: Vec<String> = params.iter().map(|(n, _)| n.clone()).collect();
        if expected != found {
            return Err(RainbowError::MismatchedParameters {
                function: name.to_string(),
                expected,
                found,
            });
        }

        for ((param_name, param_color), (_, param_id)) in params.iter().zip(existing_params) {
            let existing = self.tree.get(param_id).color().map(String::from);
            match (&existing, param_color) {
                (Some(existing), Some(new)) if existing != new => {
                    return Err(RainbowError::MultipleColors {
                        entity: format!("param {} of function {}", param_name, name),
                    });
                }
                (None, Some(_)) => self.tree.set_color(param_id, param_color.clone()),
                _ => {}
            }
        }
        Ok(())
    }

    /// Decode an annotate attribute carrying the configured prefix. The
    /// remainder after the prefix must be a palette member.
    fn as_color<C: Cursor>(&self, node: &C) -> Result<Option<String>, RainbowError> {
        if node.kind() != CursorKind::AnnotateAttr {
            return Ok(None);
        }
        let spelling = node.spelling();
        let color = match spelling.strip_prefix(self.config.prefix()) {
            Some(color) => color,
            None => return Ok(None),
        };
        if !self.config.contains_color(color) {
            return Err(RainbowError::UnknownColor {
                location: node.location(),
                color: color.to_string(),
            });
        }
        Ok(Some(color.to_string()))
    }

    /// `auto NEW = EXISTING;` is a declaration whose initializer references a
    /// known function, directly or through a one-call converting wrapper.
    /// Returns true when the declaration was consumed as an alias.
    fn process_alias_decl<C: Cursor>(
        &mut self,
        node: &C,
        scope: ScopeId,
    ) -> Result<bool, RainbowError> {
        let children = node.children();
        let initializer = match children.last() {
            Some(initializer) => initializer.clone(),
            None => return Ok(false),
        };

        let mut color: Option<String> = None;
        for child in &children[..children.len() - 1] {
            if let Some(found) = self.as_color(child)? {
                merge_color(&mut color, found, || format!("variable {}", node.spelling()))?;
            }
        }

        let reference = match initializer.kind() {
            CursorKind::UnexposedExpr => {
                classify::only_child_of(&initializer, CursorKind::DeclRefExpr)
            }
            CursorKind::CallExpr if initializer.spelling().is_empty() => {
                classify::only_child_of(&initializer, CursorKind::UnexposedExpr)
                    .and_then(|inner| classify::only_child_of(&inner, CursorKind::DeclRefExpr))
            }
            _ => None,
        };
        let reference = match reference {
            Some(reference) => reference,
            None => return Ok(false),
        };

        self.register_alias(
            scope,
            node.location(),
            &node.spelling(),
            color,
            reference.referenced_hash(),
            &reference.spelling(),
        )
    }

    /// `NEW = EXISTING;` where NEW was previously declared with function
    /// type. Both sides must already resolve; their colors and parameter
    /// signatures must agree.
    fn process_alias_assign<C: Cursor>(
        &mut self,
        lhs: &C,
        rhs: &C,
        scope: ScopeId,
    ) -> Result<bool, RainbowError> {
        if lhs.kind() != CursorKind::DeclRefExpr || rhs.kind() != CursorKind::UnexposedExpr {
            return Ok(false);
        }
        let reference = match classify::only_child_of(rhs, CursorKind::DeclRefExpr) {
            Some(reference) => reference,
            None => return Ok(false),
        };

        let lhs_fn = match self.tree.resolve_function(scope, &lhs.spelling()) {
            Some(lhs_fn) => lhs_fn,
            None => {
                debug!("assignment to unresolved name {}", lhs.spelling());
                return Ok(false);
            }
        };
        let rhs_fn = match self.tree.resolve_function(scope, &reference.spelling()) {
            Some(rhs_fn) => rhs_fn,
            None => {
                debug!("assignment from unresolved name {}", reference.spelling());
                return Ok(false);
            }
        };

        let lhs_color = self.tree.get(lhs_fn).color().map(String::from);
        let rhs_color = self.tree.get(rhs_fn).color().map(String::from);
        if lhs_color != rhs_color
            || self.tree.param_colors(lhs_fn) != self.tree.param_colors(rhs_fn)
        {
            return Err(RainbowError::InvalidAssignment {
                location: lhs.location(),
                name: lhs.spelling(),
                original: lhs_color,
                new: rhs_color,
            });
        }

        self.register_alias(
            scope,
            lhs.location(),
            &lhs.spelling(),
            lhs_color,
            reference.referenced_hash(),
            &reference.spelling(),
        )
    }

    /// Register `alias` as a copy of a resolved function, inheriting its
    /// color and parameter signature. An explicit annotation on the alias
    /// must match the source's color.
    fn register_alias(
        &mut self,
        scope: ScopeId,
        location: SourceLocation,
        alias: &str,
        declared_color: Option<String>,
        referenced: Option<NodeHash>,
        original_name: &str,
    ) -> Result<bool, RainbowError> {
        let resolved = referenced
            .and_then(|identity| self.scopes_by_identity.get(&identity).copied())
            .or_else(|| self.tree.resolve_function(scope, original_name));
        let source = match resolved {
            Some(source) => source,
            None => return Ok(false),
        };

        let source_color = self.tree.get(source).color().map(String::from);
        if declared_color.is_some() && declared_color != source_color {
            return Err(RainbowError::InvalidAssignment {
                location,
                name: alias.to_string(),
                original: declared_color,
                new: source_color,
            });
        }

        let params: Vec<(String, Option<String>)> =
            self.tree.param_colors(source).into_iter().collect();
        let id = self.next_scope_id();
        self.tree
            .create_function(id, scope, alias, source_color, &params);
        Ok(true)
    }

    /// Register a resolved call and bind any invocable arguments to the
    /// callee's parameter proxies.
    fn process_call<C: Cursor>(
        &mut self,
        node: &C,
        name: &str,
        identity: NodeHash,
        scope: ScopeId,
        frontier: &mut Frontier<C>,
    ) -> Result<(), RainbowError> {
        let callee = self
            .scopes_by_identity
            .get(&identity)
            .copied()
            .or_else(|| self.tree.resolve_function(scope, name));
        let callee = match callee {
            Some(callee) => callee,
            None => {
                let shown = if name.is_empty() { "`???`" } else { name };
                warn!("could not resolve function call {}", shown);
                return Ok(());
            }
        };
        self.tree.register_call(scope, callee);

        // Children past the callee reference are the arguments; an invocation
        // through operator() carries the invocable as an extra leading child.
        let mut arguments = node.children();
        if !arguments.is_empty() {
            arguments.remove(0);
        }
        if !arguments.is_empty()
            && arguments[0].kind() == CursorKind::UnexposedExpr
            && arguments[0].spelling() == "operator()"
        {
            arguments.remove(0);
        }

        let params: Vec<ScopeId> = match self.tree.get(callee).params() {
            Some(params) => params.values().copied().collect(),
            None => Vec::new(),
        };
        if arguments.len() != params.len() {
            warn!(
                "could not verify parameters passed into {} @ {}",
                self.tree.get(callee).name().unwrap_or(name),
                node.location()
            );
            return Ok(());
        }

        for (position, (argument, param)) in arguments.iter().zip(params).enumerate() {
            let param_color = self.tree.get(param).color().map(String::from);
            match self.resolve_invocable_argument(scope, argument, frontier)? {
                Some(argument_fn) => {
                    if let Some(param_color) = &param_color {
                        let argument_color = self.tree.get(argument_fn).color();
                        if let Some(argument_color) = argument_color {
                            if argument_color != param_color {
                                return Err(RainbowError::InvalidAssignment {
                                    location: node.location(),
                                    name: format!("(parameter {} of {})", position, name),
                                    original: Some(param_color.clone()),
                                    new: Some(argument_color.to_string()),
                                });
                            }
                        }
                    }
                    self.tree.register_call(param, argument_fn);
                }
                None => {
                    if param_color.is_some() {
                        warn!(
                            "could not verify color of parameter {} of {} @ {}",
                            position,
                            name,
                            node.location()
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Resolve a call argument to the function it passes, unwrapping the
    /// implicit std::function construction the parser materializes around
    /// named functions and lambdas. An anonymous lambda in argument position
    /// is registered as an uncolored function and its body is scheduled.
    fn resolve_invocable_argument<C: Cursor>(
        &mut self,
        scope: ScopeId,
        argument: &C,
        frontier: &mut Frontier<C>,
    ) -> Result<Option<ScopeId>, RainbowError> {
        if argument.kind() != CursorKind::UnexposedExpr {
            return Ok(None);
        }

        let mut node = argument.clone();
        loop {
            let mut children = node.children();
            if children.len() != 1 {
                return Ok(None);
            }
            let child = children.remove(0);
            match child.kind() {
                CursorKind::UnexposedExpr => node = child,
                CursorKind::CallExpr => {
                    let spelling = child.spelling();
                    if spelling.is_empty() || spelling == "function" {
                        node = child;
                    } else {
                        return Ok(None);
                    }
                }
                CursorKind::DeclRefExpr => {
                    if let Some(identity) = child.referenced_hash() {
                        if let Some(&known) = self.scopes_by_identity.get(&identity) {
                            return Ok(Some(known));
                        }
                    }
                    if let Some(resolved) = self.tree.resolve_function(scope, &child.spelling()) {
                        return Ok(Some(resolved));
                    }
                    warn!(
                        "found functional parameter {}, but could not lookup defn",
                        child.spelling()
                    );
                    return Ok(None);
                }
                CursorKind::LambdaExpr => {
                    let name =
                        format!("!unnamed_lambda{}", self.tree.get(scope).functions().len());
                    let (body, function) =
                        self.process_function(&name, child.hash(), &child, scope)?;
                    let body = match body {
                        Some(body) => body,
                        None => panic!("Malformed syntax tree! Lambda {} has no body", name),
                    };
                    push_children_front(frontier, body.children(), function);
                    return Ok(Some(function));
                }
                _ => return Ok(None),
            }
        }
    }
}

/// Record `color` into `slot`; a second, different color for the same entity
/// is fatal, duplicates agree.
fn merge_color<F: FnOnce() -> String>(
    slot: &mut Option<String>,
    color: String,
    entity: F,
) -> Result<(), RainbowError> {
    match slot {
        Some(existing) if *existing != color => {
            Err(RainbowError::MultipleColors { entity: entity() })
        }
        Some(_) => Ok(()),
        None => {
            *slot = Some(color);
            Ok(())
        }
    }
}
