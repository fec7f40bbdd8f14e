use super::{ScopeId, ScopeTree};

/// Cypher serialization of the scope tree.
///
/// The emitted statement is a single `CREATE` listing every function and
/// parameter as a node followed by every recorded call as a `CALLS` edge.
/// Traversal order is deterministic: functions of a scope in declaration
/// order, each followed by its parameters and then the functions nested
/// inside it, then the scope's anonymous blocks. Edges follow all nodes in
/// the same function order, each edge exactly once.
impl ScopeTree {
    /// Serialize the call graph as an openCypher `CREATE` statement,
    /// tagging every colored node with its color as a label. An empty
    /// graph serializes to `RETURN 0` so the executor stays in a defined
    /// state.
    pub fn to_cypher(&self) -> String {
        let mut functions = Vec::new();
        self.collect_functions(self.root(), &mut functions);

        let mut entries = Vec::new();
        for &function in &functions {
            entries.push(self.node_pattern(function));
            if let Some(params) = self.get(function).params() {
                for &param in params.values() {
                    entries.push(self.node_pattern(param));
                }
            }
        }

        for &function in &functions {
            let mut called = Vec::new();
            self.collect_calls(function, &mut called);
            for callee in called {
                entries.push(self.edge_pattern(function, callee));
            }
            if let Some(params) = self.get(function).params() {
                for &param in params.values() {
                    for &callee in self.get(param).called_functions() {
                        entries.push(self.edge_pattern(param, callee));
                    }
                }
            }
        }

        if entries.is_empty() {
            return String::from("RETURN 0");
        }
        format!("CREATE {}", entries.join(",\n  "))
    }

    /// Every function scope reachable from `id`, in emission order.
    fn collect_functions(&self, id: ScopeId, out: &mut Vec<ScopeId>) {
        let scope = self.get(id);
        for &function in scope.functions().values() {
            out.push(function);
            self.collect_functions(function, out);
        }
        for &child in scope.child_scopes() {
            self.collect_functions(child, out);
        }
    }

    /// Calls made by `id` and its anonymous blocks. Nested functions keep
    /// their own calls; blocks attribute theirs to the enclosing function.
    fn collect_calls(&self, id: ScopeId, out: &mut Vec<ScopeId>) {
        let scope = self.get(id);
        out.extend_from_slice(scope.called_functions());
        for &child in scope.child_scopes() {
            self.collect_calls(child, out);
        }
    }

    fn node_pattern(&self, id: ScopeId) -> String {
        let scope = self.get(id);
        let name = scope
            .name()
            .unwrap_or_else(|| panic!("Scope {} has no name to emit!", id));
        match scope.color() {
            Some(color) => format!("({}:{} {{name: '{}'}})", self.alias(id), color, name),
            None => format!("({} {{name: '{}'}})", self.alias(id), name),
        }
    }

    fn edge_pattern(&self, caller: ScopeId, callee: ScopeId) -> String {
        format!("({})-[:CALLS]->({})", self.alias(caller), self.alias(callee))
    }
}
