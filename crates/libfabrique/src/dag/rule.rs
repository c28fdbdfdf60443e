//! Build rules: command templates with typed parameter signatures.

use crate::nom_tools::SpanInfo;
use crate::types::TypeId;

use super::function::Parameter;
use super::ValueMap;

/// Name of the rule that regenerates build files from Fabrique sources.
pub static REGENERATION_RULE_NAME: &str = "_fabrique_regenerate";

/// A command template plus a parameter signature describing how to
/// transform inputs into outputs. Calling a rule constructs a [`Build`].
///
/// [`Build`]: super::Build
#[derive(Debug)]
pub struct Rule {
    name: String,
    command: String,
    description: String,
    /// Default arguments supplied at rule definition (e.g. `pool`)
    arguments: ValueMap,
    parameters: Vec<Parameter>,
    typ: TypeId,
    source: SpanInfo,
}

impl Rule {
    pub(crate) fn new(
        name: String,
        command: String,
        mut arguments: ValueMap,
        parameters: Vec<Parameter>,
        typ: TypeId,
        source: SpanInfo,
    ) -> Self {
        // An explicit description is pulled out of the argument map; without
        // one, the command itself is the description.
        let description = match arguments.shift_remove("description") {
            Some(description) => description.render_plain(),
            None => command.clone(),
        };

        Self {
            name,
            command,
            description,
            arguments,
            parameters,
            typ,
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn arguments(&self) -> &ValueMap {
        &self.arguments
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn type_id(&self) -> TypeId {
        self.typ
    }

    pub fn source(&self) -> &SpanInfo {
        &self.source
    }
}
