//! Lexical scopes for evaluation.
//!
//! Scopes live in an arena owned by the [`EvalContext`]; the active stack
//! holds indices into it. Because the arena never drops a scope during
//! evaluation, a function value can capture its definition scope by id and
//! resolve free names through it long after the surrounding syntactic
//! region has been left.
//!
//! [`EvalContext`]: super::EvalContext

use crate::dag::ValueRef;
use crate::error::FabError;
use crate::map::{FabMap, Spanned};
use crate::nom_tools::SpanInfo;

impl Spanned for ValueRef {
    fn span(&self) -> SpanInfo {
        self.source().clone()
    }
}

/// Index of a scope in the evaluation context's arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScopeId(pub(crate) usize);

/// A named set of bindings with an optional parent scope.
#[derive(Debug)]
pub struct Scope {
    name: String,
    parent: Option<ScopeId>,
    values: FabMap<String, ValueRef>,
}

impl Scope {
    pub(crate) fn new(name: String, parent: Option<ScopeId>) -> Self {
        Self {
            name,
            parent,
            values: FabMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Looks up a name in this scope only (no parent traversal).
    pub fn get(&self, name: &str) -> Option<&ValueRef> {
        self.values.get(name)
    }

    /// Binds a name in this scope; rebinding is a semantic error.
    pub fn define(&mut self, name: String, value: ValueRef) -> Result<(), FabError> {
        self.values.validate_insert(name, value)
    }

    /// The scope's bindings, in definition order.
    pub fn bindings(&self) -> impl Iterator<Item = (&String, &ValueRef)> {
        self.values.iter()
    }
}
