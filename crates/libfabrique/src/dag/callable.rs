//! The callable contract shared by rules and functions.
//!
//! Both expose an ordered parameter list; applying either starts with the
//! same argument-naming and type-checking protocol.

use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::ast::{ArgumentAst, ExpressionAst};
use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::types::TypeContext;

use super::function::{Function, Parameter};
use super::{Rule, ValueMap};

/// Anything that can be applied to named arguments.
#[derive(Debug, Clone)]
pub enum Callable {
    Rule(Rc<Rule>),
    Function(Rc<Function>),
}

impl Callable {
    pub fn parameters(&self) -> &[Parameter] {
        match self {
            Callable::Rule(rule) => rule.parameters(),
            Callable::Function(function) => function.parameters(),
        }
    }

    /// Whether unrecognised keyword arguments are forwarded rather than
    /// rejected. `import` and `file` use this to accept arbitrary fields.
    pub fn allow_extra_args(&self) -> bool {
        match self {
            Callable::Rule(_) => false,
            Callable::Function(function) => function.allow_extra_args(),
        }
    }

    pub fn has_parameter_named(&self, name: &str) -> bool {
        self.parameters().iter().any(|p| p.name == name)
    }

    /// Matches call arguments to parameter names.
    ///
    /// Arguments are positional until the first keyword argument; after
    /// that, no more positional arguments are allowed. Positional
    /// arguments bind to parameters in declaration order.
    pub fn name_arguments<'args>(
        &self,
        arguments: &'args [ArgumentAst],
    ) -> Result<Vec<(String, &'args ExpressionAst)>, FabError> {
        let mut named: Vec<(String, &ExpressionAst)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut done_with_positional = false;
        let mut parameters = self.parameters().iter();

        for argument in arguments {
            let name = match &argument.name {
                Some(name) => {
                    done_with_positional = true;
                    name.text.clone()
                }
                None => {
                    if done_with_positional {
                        return Err(FabError::positional_after_keyword(
                            argument.value.span().info(),
                        ));
                    }

                    match parameters.next() {
                        Some(parameter) => parameter.name.clone(),
                        None => {
                            return Err(FabError::too_many_arguments(
                                argument.value.span().info(),
                            ));
                        }
                    }
                }
            };

            if argument.name.is_some()
                && !self.has_parameter_named(&name)
                && !self.allow_extra_args()
            {
                return Err(FabError::unknown_argument(&name, argument.value.span().info()));
            }

            if !seen.insert(name.clone()) {
                return Err(FabError::semantic(
                    format!("redefining argument '{name}'"),
                    argument.value.span().info(),
                ));
            }

            debug!("argument '{name}' bound");
            named.push((name, &argument.value));
        }

        Ok(named)
    }

    /// Checks every named argument against its parameter's type and fills
    /// in defaults for the rest. A parameter with neither an argument nor a
    /// default is an error.
    pub fn check_arguments(
        &self,
        arguments: &mut ValueMap,
        locations: &IndexMap<String, SpanInfo>,
        types: &mut TypeContext,
        call_src: &SpanInfo,
    ) -> Result<(), FabError> {
        for parameter in self.parameters() {
            let Some(argument) = arguments.get(&parameter.name) else {
                match &parameter.default {
                    Some(default) => {
                        arguments.insert(parameter.name.clone(), default.clone());
                        continue;
                    }
                    None => {
                        return Err(FabError::missing_argument(
                            &parameter.name,
                            call_src.clone(),
                        ));
                    }
                }
            };

            if !types.is_subtype(argument.type_id(), parameter.typ) {
                let src = locations
                    .get(&parameter.name)
                    .cloned()
                    .unwrap_or_else(|| call_src.clone());

                return Err(FabError::wrong_type(
                    types.display(parameter.typ),
                    types.display(argument.type_id()),
                    src,
                ));
            }
        }

        Ok(())
    }
}
