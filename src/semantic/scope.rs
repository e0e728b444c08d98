//! Scope tracking for the value flow analysis
//!
//! Scopes live in a `ScopeTree` arena and refer to each other through
//! `ScopeId`s: the tree owns every scope, links between scopes never do.

use indexmap::IndexMap;
use tracing::debug;

use super::value::Value;

/// Assignment history of one variable, keyed by source line in write order
pub type History = IndexMap<usize, Value>;

/// Unique identifier for a scope within its `ScopeTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

impl ScopeId {
    /// Global scope (scope 0)
    pub fn global() -> Self {
        Self(0)
    }

    /// Get the raw index
    pub fn index(&self) -> usize {
        self.0
    }
}

/// One environment: the global program or a declared function
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    /// Lexically enclosing scope, consulted only for variable lookup
    outer: Option<ScopeId>,
    variables: IndexMap<String, History>,
    parameters: IndexMap<String, Value>,
    nested: IndexMap<String, ScopeId>,
    /// Call-site snapshots keyed by the line of the first argument
    specialized: IndexMap<usize, ScopeId>,
}

impl Scope {
    fn new(name: &str, outer: Option<ScopeId>) -> Self {
        Self {
            name: name.to_string(),
            outer,
            variables: IndexMap::new(),
            parameters: IndexMap::new(),
            nested: IndexMap::new(),
            specialized: IndexMap::new(),
        }
    }

    /// Copy of the parameter state only; nested and specialized scopes are dropped
    fn snapshot(&self) -> Self {
        Self {
            name: self.name.clone(),
            outer: self.outer,
            variables: IndexMap::new(),
            parameters: self.parameters.clone(),
            nested: IndexMap::new(),
            specialized: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn outer(&self) -> Option<ScopeId> {
        self.outer
    }

    pub fn variables(&self) -> &IndexMap<String, History> {
        &self.variables
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    pub fn nested(&self) -> &IndexMap<String, ScopeId> {
        &self.nested
    }

    pub fn specialized(&self) -> &IndexMap<usize, ScopeId> {
        &self.specialized
    }

    /// History recorded for `name` in this scope only
    pub fn history(&self, name: &str) -> Option<&History> {
        self.variables.get(name)
    }

    /// Most recently written value of `name` in this scope only
    pub fn latest(&self, name: &str) -> Option<&Value> {
        self.history(name)
            .and_then(|history| history.last())
            .map(|(_, value)| value)
    }

    pub fn lookup_parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Parameter by declaration position
    pub fn lookup_parameter_at(&self, index: usize) -> Option<&Value> {
        self.parameters.get_index(index).map(|(_, value)| value)
    }

    /// Record a write to a variable.
    ///
    /// A resolved latest entry is never displaced by an unresolved write;
    /// every other write is kept under its line.
    pub fn record_value(&mut self, value: Value) {
        let history = self.variables.entry(value.name().to_string()).or_default();

        let keeps_better = history
            .last()
            .is_some_and(|(_, latest)| latest.is_resolved() && !value.is_resolved());
        if keeps_better {
            debug!(
                variable = value.name(),
                line = value.line(),
                "dropping unresolved write over a resolved value"
            );
            return;
        }

        history.insert(value.line(), value);
    }

    /// Bind a parameter, replacing any previous binding of the same name
    pub fn record_parameter(&mut self, value: Value) {
        self.parameters.insert(value.name().to_string(), value);
    }
}

/// Arena owning every scope created during an analysis
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    /// Tree holding only the empty global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new("global", None)],
        }
    }

    pub fn global(&self) -> &Scope {
        self.get(ScopeId::global())
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    /// Number of scopes ever created, snapshots included
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Always false: the global scope exists from construction. Pairs with `len`.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Allocate a detached scope
    pub fn create(&mut self, name: &str, outer: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(name, outer));
        id
    }

    /// History of `name`, falling back through the outer chain
    pub fn lookup_variable(&self, scope: ScopeId, name: &str) -> Option<&History> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(history) = scope.history(name) {
                return Some(history);
            }
            current = scope.outer();
        }
        None
    }

    /// Function scope declared directly in `scope`; no outer fallback
    pub fn lookup_nested_scope(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        self.get(scope).nested.get(name).copied()
    }

    /// Register `child` under its own name, replacing an earlier declaration
    pub fn attach(&mut self, parent: ScopeId, child: ScopeId) {
        let name = self.get(child).name.clone();
        self.get_mut(parent).nested.insert(name, child);
    }

    /// Record a call-site view of `callee`'s parameters.
    ///
    /// The callee scope is created on first use. The snapshot is keyed by the
    /// line of the first argument; no arguments means nothing is recorded.
    pub fn specialize(
        &mut self,
        scope: ScopeId,
        callee: &str,
        arguments: IndexMap<String, Value>,
    ) -> Option<ScopeId> {
        let line = arguments.first().map(|(_, value)| value.line())?;

        let function = match self.lookup_nested_scope(scope, callee) {
            Some(function) => function,
            None => {
                debug!(function = callee, "creating scope for undeclared function");
                let function = self.create(callee, Some(scope));
                self.attach(scope, function);
                function
            }
        };

        let snapshot = self.get(function).snapshot();
        let specialized = ScopeId(self.scopes.len());
        self.scopes.push(snapshot);

        for (_, value) in arguments {
            self.get_mut(specialized).record_parameter(value);
        }

        self.get_mut(function).specialized.insert(line, specialized);
        Some(specialized)
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::types::TypeLabel;
    use crate::semantic::value::Payload;

    fn int(name: &str, n: i64, line: usize) -> Value {
        Value::resolved(name, Payload::Int(n), TypeLabel::int(), line)
    }

    fn unknown(name: &str, line: usize) -> Value {
        Value::unresolved(name, TypeLabel::Mixed, line)
    }

    #[test]
    fn test_resolved_writes_append() {
        let mut tree = ScopeTree::new();
        let global = tree.get_mut(ScopeId::global());

        global.record_value(int("a", 23, 15));
        global.record_value(Value::resolved(
            "a",
            Payload::String("foobar".into()),
            TypeLabel::string(),
            19,
        ));

        let history = global.history("a").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(global.latest("a").unwrap().line(), 19);
    }

    #[test]
    fn test_unresolved_write_is_dropped() {
        let mut tree = ScopeTree::new();
        let global = tree.get_mut(ScopeId::global());

        global.record_value(int("a", 1, 1));
        global.record_value(unknown("a", 2));

        assert_eq!(global.history("a").unwrap().len(), 1);
        assert_eq!(global.latest("a").unwrap().value(), Some(&Payload::Int(1)));
    }

    #[test]
    fn test_unresolved_latest_is_extended() {
        let mut tree = ScopeTree::new();
        let global = tree.get_mut(ScopeId::global());

        global.record_value(unknown("a", 1));
        global.record_value(unknown("a", 2));
        global.record_value(int("a", 3, 3));

        assert_eq!(global.history("a").unwrap().len(), 3);
        assert!(global.latest("a").unwrap().is_resolved());
    }

    #[test]
    fn test_same_line_overwrites_in_place() {
        let mut tree = ScopeTree::new();
        let global = tree.get_mut(ScopeId::global());

        global.record_value(int("a", 1, 4));
        global.record_value(int("a", 2, 4));

        let history = global.history("a").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[&4].value(), Some(&Payload::Int(2)));
    }

    #[test]
    fn test_variable_lookup_walks_outer_chain() {
        let mut tree = ScopeTree::new();
        tree.get_mut(ScopeId::global()).record_value(int("g", 7, 1));

        let child = tree.create("child", Some(ScopeId::global()));
        tree.attach(ScopeId::global(), child);

        assert!(tree.lookup_variable(child, "g").is_some());
        assert!(tree.lookup_variable(child, "missing").is_none());
    }

    #[test]
    fn test_nested_lookup_is_local() {
        let mut tree = ScopeTree::new();
        let foo = tree.create("foo", Some(ScopeId::global()));
        tree.attach(ScopeId::global(), foo);
        let bar = tree.create("bar", Some(foo));
        tree.attach(foo, bar);

        assert_eq!(tree.lookup_nested_scope(ScopeId::global(), "foo"), Some(foo));
        assert_eq!(tree.lookup_nested_scope(foo, "bar"), Some(bar));
        assert_eq!(tree.lookup_nested_scope(bar, "foo"), None);
    }

    #[test]
    fn test_attach_replaces_same_name() {
        let mut tree = ScopeTree::new();
        let first = tree.create("foo", Some(ScopeId::global()));
        tree.attach(ScopeId::global(), first);
        let second = tree.create("foo", Some(ScopeId::global()));
        tree.attach(ScopeId::global(), second);

        assert_eq!(tree.global().nested().len(), 1);
        assert_eq!(tree.lookup_nested_scope(ScopeId::global(), "foo"), Some(second));
    }

    #[test]
    fn test_parameter_at_follows_declaration_order() {
        let mut tree = ScopeTree::new();
        let f = tree.create("f", Some(ScopeId::global()));
        tree.get_mut(f).record_parameter(unknown("a", 1));
        tree.get_mut(f).record_parameter(unknown("b", 1));

        assert_eq!(tree.get(f).lookup_parameter_at(0).unwrap().name(), "a");
        assert_eq!(tree.get(f).lookup_parameter_at(1).unwrap().name(), "b");
        assert!(tree.get(f).lookup_parameter_at(2).is_none());
    }

    #[test]
    fn test_specialize_isolates_call_sites() {
        let mut tree = ScopeTree::new();
        let foo = tree.create("foo", Some(ScopeId::global()));
        tree.attach(ScopeId::global(), foo);
        tree.get_mut(foo).record_parameter(unknown("value", 8));

        let mut first = IndexMap::new();
        first.insert("value".to_string(), int("value", 42, 13));
        let mut second = IndexMap::new();
        second.insert("value".to_string(), int("value", 23, 17));

        tree.specialize(ScopeId::global(), "foo", first).unwrap();
        tree.specialize(ScopeId::global(), "foo", second).unwrap();

        let specialized = tree.get(foo).specialized();
        assert_eq!(specialized.len(), 2);

        let at_13 = tree.get(specialized[&13]);
        let at_17 = tree.get(specialized[&17]);
        assert_eq!(
            at_13.lookup_parameter("value").unwrap().value(),
            Some(&Payload::Int(42))
        );
        assert_eq!(
            at_17.lookup_parameter("value").unwrap().value(),
            Some(&Payload::Int(23))
        );
        assert!(at_13.specialized().is_empty());

        // Declared defaults stay untouched
        assert!(!tree.get(foo).lookup_parameter("value").unwrap().is_resolved());
    }

    #[test]
    fn test_specialize_creates_unknown_callee() {
        let mut tree = ScopeTree::new();
        let mut args = IndexMap::new();
        args.insert("#0".to_string(), int("#0", 1, 3));

        tree.specialize(ScopeId::global(), "strlen", args).unwrap();

        let strlen = tree.lookup_nested_scope(ScopeId::global(), "strlen").unwrap();
        assert!(tree.get(strlen).parameters().is_empty());
        assert_eq!(tree.get(strlen).specialized().len(), 1);
    }

    #[test]
    fn test_specialize_without_arguments_is_noop() {
        let mut tree = ScopeTree::new();

        assert!(tree
            .specialize(ScopeId::global(), "nothing", IndexMap::new())
            .is_none());
        assert!(tree.lookup_nested_scope(ScopeId::global(), "nothing").is_none());
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_empty());
    }
}
