//! Runtime values and the build-graph accumulator.
//!
//! Evaluating an AST produces [`Value`]s: primitives, files, lists, records,
//! rules, builds, functions, targets and type references. The
//! [`DagBuilder`] interns files, builds, rules, variables and targets as
//! they are created, and its final post-processing pass produces the
//! immutable [`Dag`] consumed by backends.

mod build;
mod builder;
mod callable;
mod file;
mod function;
mod graph;
mod rule;
mod target;
mod value;

pub use build::Build;
pub use builder::DagBuilder;
pub use callable::Callable;
pub use file::File;
pub use function::{Builtin, Function, FunctionBody, NativeFunction, Parameter};
pub use graph::Dag;
pub use rule::Rule;
pub use target::Target;
pub use value::{collect_files, Value, ValueData, ValueKind};

use indexmap::IndexMap;
use std::rc::Rc;

/// Shared handle to an evaluated value.
pub type ValueRef = Rc<Value>;

/// Named values, in insertion order.
pub type ValueMap = IndexMap<String, ValueRef>;
