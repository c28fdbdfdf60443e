//! Function values: user-defined closures, builtins and plugin natives.

use std::rc::Rc;

use crate::ast::FunctionAst;
use crate::error::FabError;
use crate::eval::ScopeId;
use crate::nom_tools::SpanInfo;
use crate::types::{TypeContext, TypeId};

use super::{DagBuilder, ValueMap, ValueRef};

/// A formal parameter of a rule or function: a name, a type and an
/// optional default value.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub typ: TypeId,
    pub default: Option<ValueRef>,
    pub source: SpanInfo,
}

impl Parameter {
    pub fn new(name: impl Into<String>, typ: TypeId, default: Option<ValueRef>) -> Self {
        Self {
            name: name.into(),
            typ,
            default,
            source: SpanInfo::none(),
        }
    }

    pub fn with_source(mut self, source: SpanInfo) -> Self {
        self.source = source;
        self
    }
}

/// Builtins injected into the root scope. The evaluator dispatches on this
/// enum so that `import` can recursively parse and evaluate submodules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `file(name, ...)`: open a file in the current subdirectory
    OpenFile,
    /// `import(module, ...)`: resolve a submodule or plugin
    Import,
    /// `print(value)`: write a value to stdout, passing it through
    Print,
    /// `fields(value)`: the names and types of a value's fields
    Fields,
    /// `type(value)`: a first-class reference to a value's type
    TypeOf,
    /// `string(value)`: render any value as a string
    Stringify,
}

/// A function body provided by the host rather than by Fabrique source,
/// e.g. a member of a plugin's record.
pub trait NativeFunction: std::fmt::Debug {
    fn call(
        &self,
        arguments: ValueMap,
        builder: &mut DagBuilder,
        types: &mut TypeContext,
        source: &SpanInfo,
    ) -> Result<ValueRef, FabError>;
}

/// How a function computes its result when called.
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// A closure over Fabrique source: the body expression of a
    /// `function(...)` literal
    Expression(Rc<FunctionAst>),
    /// An evaluator-dispatched builtin
    Builtin(Builtin),
    /// A host-provided native function
    Native(Rc<dyn NativeFunction>),
}

/// A callable function value.
///
/// User functions capture the scope surrounding their definition, so free
/// names in the body resolve against the definition site rather than the
/// call site.
#[derive(Debug)]
pub struct Function {
    parameters: Vec<Parameter>,
    result: TypeId,
    body: FunctionBody,
    /// The lexical scope captured at the definition site; `None` for
    /// builtins and natives, which have no free names.
    captured_scope: Option<ScopeId>,
    allow_extra_args: bool,
    source: SpanInfo,
}

impl Function {
    pub(crate) fn new(
        parameters: Vec<Parameter>,
        result: TypeId,
        body: FunctionBody,
        captured_scope: Option<ScopeId>,
        allow_extra_args: bool,
        source: SpanInfo,
    ) -> Self {
        Self {
            parameters,
            result,
            body,
            captured_scope,
            allow_extra_args,
            source,
        }
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn result_type(&self) -> TypeId {
        self.result
    }

    pub fn body(&self) -> &FunctionBody {
        &self.body
    }

    pub fn captured_scope(&self) -> Option<ScopeId> {
        self.captured_scope
    }

    pub fn allow_extra_args(&self) -> bool {
        self.allow_extra_args
    }

    pub fn source(&self) -> &SpanInfo {
        &self.source
    }
}
