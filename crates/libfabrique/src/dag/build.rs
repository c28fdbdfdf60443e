//! Builds: concrete invocations of rules with file arguments.

use std::rc::Rc;

use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::types::{TypeContext, TypeId};

use super::value::{collect_files, Value, ValueData};
use super::{File, Rule, ValueMap, ValueRef};

/// The result of applying a [`Rule`] to arguments: a build step that
/// transforms input files into output files.
///
/// Its type is the single output's type, or a list type when there are
/// several outputs. Operators and field accesses forward to the canonical
/// output value.
#[derive(Debug)]
pub struct Build {
    rule: Rc<Rule>,
    inputs: Vec<Rc<File>>,
    outputs: Vec<Rc<File>>,
    arguments: ValueMap,
    typ: TypeId,
    source: SpanInfo,
}

impl Build {
    /// Derives the build's inputs and outputs from arguments bound to
    /// file-typed parameters, marks output files as generated, and fills
    /// in unspecified default arguments.
    pub(crate) fn create(
        rule: Rc<Rule>,
        mut arguments: ValueMap,
        types: &mut TypeContext,
        source: SpanInfo,
    ) -> Result<Rc<Build>, FabError> {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for (name, argument) in &arguments {
            let Some(parameter) = rule.parameters().iter().find(|p| &p.name == name) else {
                return Err(FabError::unknown_argument(
                    name,
                    argument.source().clone(),
                ));
            };

            if !types.is_subtype(argument.type_id(), parameter.typ) {
                return Err(FabError::wrong_type(
                    types.display(parameter.typ),
                    types.display(argument.type_id()),
                    argument.source().clone(),
                ));
            }

            if types.has_input(parameter.typ) {
                collect_files(argument, &mut inputs);
            } else if types.has_output(parameter.typ) {
                let mut files = Vec::new();
                collect_files(argument, &mut files);
                for file in &files {
                    file.set_generated()?;
                }
                outputs.extend(files);
            }
        }

        // Unspecified parameters take their default values.
        for parameter in rule.parameters() {
            if arguments.contains_key(&parameter.name) {
                continue;
            }

            match &parameter.default {
                Some(default) => {
                    arguments.insert(parameter.name.clone(), default.clone());
                }
                None => {
                    return Err(FabError::missing_argument(&parameter.name, source.clone()));
                }
            }
        }

        if outputs.is_empty() {
            return Err(FabError::no_outputs(source.clone()));
        }

        let typ = if outputs.len() == 1 {
            outputs[0].type_id()
        } else {
            types.list_of(outputs[0].type_id())
        };

        Ok(Rc::new(Build {
            rule,
            inputs,
            outputs,
            arguments,
            typ,
            source,
        }))
    }

    pub fn rule(&self) -> &Rc<Rule> {
        &self.rule
    }

    pub fn inputs(&self) -> &[Rc<File>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Rc<File>] {
        &self.outputs
    }

    pub fn arguments(&self) -> &ValueMap {
        &self.arguments
    }

    pub fn type_id(&self) -> TypeId {
        self.typ
    }

    pub fn source(&self) -> &SpanInfo {
        &self.source
    }

    /// The value this build stands for in expressions: its single output
    /// file, or the list of its outputs.
    pub fn output_value(&self, types: &mut TypeContext) -> Result<ValueRef, FabError> {
        if types.is_file(self.typ) {
            debug_assert_eq!(self.outputs.len(), 1);
            let file = &self.outputs[0];
            return Ok(Value::new(
                ValueData::File(file.clone()),
                file.type_id(),
                self.source.clone(),
            ));
        }

        let outputs = self
            .outputs
            .iter()
            .map(|file| {
                Value::new(
                    ValueData::File(file.clone()),
                    file.type_id(),
                    self.source.clone(),
                )
            })
            .collect();

        Ok(Value::new(
            ValueData::List(outputs),
            self.typ,
            self.source.clone(),
        ))
    }
}
