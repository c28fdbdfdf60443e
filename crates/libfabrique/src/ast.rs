//! Abstract Syntax Tree definitions for the Fabrique language.
//!
//! Each node records the [`Span`] it was parsed from; evaluation (in
//! [`crate::eval`]) consumes these nodes via the `Evaluate` trait. The
//! `Display` impls pretty-print nodes back to valid source, such that
//! re-parsing the printed form evaluates to the same build graph.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

use crate::file::SourceFile;
use crate::nom_tools::Span;

/// A parsed Fabrique file: an ordered sequence of top-level value
/// definitions.
#[derive(Debug, Clone)]
pub struct FileAst {
    pub file: SourceFile,
    pub values: Vec<ValueAst>,
}

/// A value definition: `name = expr;` or `name: type = expr;`.
#[derive(Debug, Clone)]
pub struct ValueAst {
    pub name: Span,
    pub explicit_type: Option<TypeAst>,
    pub value: ExpressionAst,
}

/// Binary operators, in source syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Prefix,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    And,
    Or,
    Xor,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Prefix => "::",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl UnaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "not ",
        }
    }
}

/// A (possibly dotted) reference to a name: `foo` or `foo.bar.baz`.
///
/// The first component is looked up in the enclosing scopes; every further
/// component projects a field out of the preceding value.
#[derive(Debug, Clone)]
pub struct NameReferenceAst {
    pub components: Vec<Span>,
    pub span: Span,
}

/// One argument in a call: positional, or `name = expr`.
#[derive(Debug, Clone)]
pub struct ArgumentAst {
    pub name: Option<Span>,
    pub value: ExpressionAst,
}

/// A formal parameter: `name: type` with an optional `= default`.
#[derive(Debug, Clone)]
pub struct ParameterAst {
    pub name: Span,
    pub param_type: TypeAst,
    pub default: Option<ExpressionAst>,
}

#[derive(Debug, Clone)]
pub struct BinaryAst {
    pub lhs: ExpressionAst,
    pub rhs: ExpressionAst,
    pub op: BinaryOperator,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct UnaryAst {
    pub operand: ExpressionAst,
    pub op: UnaryOperator,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallAst {
    pub target: ExpressionAst,
    pub arguments: Vec<ArgumentAst>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConditionalAst {
    pub condition: ExpressionAst,
    pub then_branch: ExpressionAst,
    pub else_branch: ExpressionAst,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForeachAst {
    pub loop_var: Span,
    pub explicit_type: Option<TypeAst>,
    pub source_sequence: ExpressionAst,
    pub body: ExpressionAst,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ListAst {
    pub elements: Vec<ExpressionAst>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct RecordAst {
    pub fields: Vec<ValueAst>,
    pub span: Span,
}

/// A function literal: `function(params): result body`.
///
/// Held behind `Rc` because function values capture their body expression
/// for later invocation.
#[derive(Debug, Clone)]
pub struct FunctionAst {
    pub parameters: Vec<ParameterAst>,
    pub result_type: TypeAst,
    pub body: ExpressionAst,
    pub span: Span,
}

/// An action: `action('command', extra = 'args' <- params)`, producing a
/// build rule.
#[derive(Debug, Clone)]
pub struct ActionAst {
    pub arguments: Vec<ArgumentAst>,
    pub parameters: Vec<ParameterAst>,
    pub span: Span,
}

/// A `files(...)` list of filename literals, with an optional `subdir`
/// keyword argument applying to all of them.
#[derive(Debug, Clone)]
pub struct FileListAst {
    pub files: Vec<Span>,
    pub arguments: Vec<ArgumentAst>,
    pub span: Span,
}

/// A compound expression: `{ name = expr; ... result }`.
#[derive(Debug, Clone)]
pub struct CompoundAst {
    pub values: Vec<ValueAst>,
    pub result: ExpressionAst,
    pub span: Span,
}

/// A `type T` declaration expression, producing a first-class type value.
#[derive(Debug, Clone)]
pub struct TypeDeclarationAst {
    pub declared: TypeAst,
    pub span: Span,
}

/// Type syntax: named/parametric (`int`, `list[file]`), function
/// (`(int)=>string`) or record (`record[a:int]`).
#[derive(Debug, Clone)]
pub enum TypeAst {
    Named {
        name: Span,
        params: Vec<TypeAst>,
    },
    Function {
        params: Vec<TypeAst>,
        result: Box<TypeAst>,
        span: Span,
    },
    Record {
        fields: Vec<(Span, TypeAst)>,
        span: Span,
    },
}

impl TypeAst {
    pub fn span(&self) -> &Span {
        match self {
            TypeAst::Named { name, .. } => name,
            TypeAst::Function { span, .. } => span,
            TypeAst::Record { span, .. } => span,
        }
    }
}

/// An expression node. Every variant knows its source span and can be
/// evaluated into a DAG value.
#[derive(Debug, Clone)]
pub enum ExpressionAst {
    Boolean { value: bool, span: Span },
    Integer { value: i64, span: Span },
    Str { value: String, span: Span },
    Name(NameReferenceAst),
    Binary(Box<BinaryAst>),
    Unary(Box<UnaryAst>),
    Call(Box<CallAst>),
    Conditional(Box<ConditionalAst>),
    Foreach(Box<ForeachAst>),
    List(Box<ListAst>),
    Record(Box<RecordAst>),
    Function(Rc<FunctionAst>),
    Action(Rc<ActionAst>),
    FileList(Box<FileListAst>),
    Compound(Box<CompoundAst>),
    TypeDeclaration(Box<TypeDeclarationAst>),
}

impl ExpressionAst {
    pub fn span(&self) -> &Span {
        match self {
            ExpressionAst::Boolean { span, .. } => span,
            ExpressionAst::Integer { span, .. } => span,
            ExpressionAst::Str { span, .. } => span,
            ExpressionAst::Name(name) => &name.span,
            ExpressionAst::Binary(op) => &op.span,
            ExpressionAst::Unary(op) => &op.span,
            ExpressionAst::Call(call) => &call.span,
            ExpressionAst::Conditional(cond) => &cond.span,
            ExpressionAst::Foreach(foreach) => &foreach.span,
            ExpressionAst::List(list) => &list.span,
            ExpressionAst::Record(record) => &record.span,
            ExpressionAst::Function(function) => &function.span,
            ExpressionAst::Action(action) => &action.span,
            ExpressionAst::FileList(files) => &files.span,
            ExpressionAst::Compound(compound) => &compound.span,
            ExpressionAst::TypeDeclaration(decl) => &decl.span,
        }
    }
}

// Pretty-printing. Output is valid source: parse(print(ast)) evaluates to
// the same DAG as ast.

impl Display for FileAst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for value in &self.values {
            writeln!(f, "{value}")?;
        }
        Ok(())
    }
}

impl Display for ValueAst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.explicit_type {
            Some(t) => write!(f, "{}: {} = {};", self.name, t, self.value),
            None => write!(f, "{} = {};", self.name, self.value),
        }
    }
}

impl Display for TypeAst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            TypeAst::Named { name, params } => {
                write!(f, "{name}")?;
                if !params.is_empty() {
                    write!(f, "[")?;
                    for (i, param) in params.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{param}")?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            TypeAst::Function { params, result, .. } => {
                write!(f, "(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, ") => {result}")
            }
            TypeAst::Record { fields, .. } => {
                write!(f, "record[")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {t}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Display for ArgumentAst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} = {}", name, self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

impl Display for ParameterAst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.param_type)?;
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

fn write_comma_separated<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl Display for ExpressionAst {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionAst::Boolean { value, .. } => {
                write!(f, "{}", if *value { "true" } else { "false" })
            }
            ExpressionAst::Integer { value, .. } => write!(f, "{value}"),
            ExpressionAst::Str { value, .. } => write!(f, "'{value}'"),
            ExpressionAst::Name(name) => {
                let components: Vec<&str> =
                    name.components.iter().map(|c| c.text.as_str()).collect();
                write!(f, "{}", components.join("."))
            }
            ExpressionAst::Binary(op) => {
                write!(f, "({} {} {})", op.lhs, op.op.symbol(), op.rhs)
            }
            ExpressionAst::Unary(op) => write!(f, "({}{})", op.op.symbol(), op.operand),
            ExpressionAst::Call(call) => {
                write!(f, "{}(", call.target)?;
                write_comma_separated(f, &call.arguments)?;
                write!(f, ")")
            }
            ExpressionAst::Conditional(cond) => write!(
                f,
                "if {} {} else {}",
                cond.condition, cond.then_branch, cond.else_branch
            ),
            ExpressionAst::Foreach(foreach) => {
                write!(f, "foreach {}", foreach.loop_var)?;
                if let Some(t) = &foreach.explicit_type {
                    write!(f, ": {t}")?;
                }
                write!(f, " <- {} {}", foreach.source_sequence, foreach.body)
            }
            ExpressionAst::List(list) => {
                write!(f, "[")?;
                write_comma_separated(f, &list.elements)?;
                write!(f, "]")
            }
            ExpressionAst::Record(record) => {
                write!(f, "record {{ ")?;
                for field in &record.fields {
                    write!(f, "{field} ")?;
                }
                write!(f, "}}")
            }
            ExpressionAst::Function(function) => {
                write!(f, "function(")?;
                write_comma_separated(f, &function.parameters)?;
                write!(f, "): {} {}", function.result_type, function.body)
            }
            ExpressionAst::Action(action) => {
                write!(f, "action(")?;
                write_comma_separated(f, &action.arguments)?;
                if !action.parameters.is_empty() {
                    write!(f, " <- ")?;
                    write_comma_separated(f, &action.parameters)?;
                }
                write!(f, ")")
            }
            ExpressionAst::FileList(files) => {
                write!(f, "files(")?;
                for (i, file) in files.files.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{file}")?;
                }
                for argument in &files.arguments {
                    write!(f, ", {argument}")?;
                }
                write!(f, ")")
            }
            ExpressionAst::Compound(compound) => {
                write!(f, "{{ ")?;
                for value in &compound.values {
                    write!(f, "{value} ")?;
                }
                write!(f, "{} }}", compound.result)
            }
            ExpressionAst::TypeDeclaration(decl) => write!(f, "type {}", decl.declared),
        }
    }
}
