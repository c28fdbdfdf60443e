//! Output backends: consumers of the finished DAG.
//!
//! Every backend sees the same stable query surface (files sorted by full
//! name, builds in creation order) and writes a complete build description
//! to a byte stream.

mod dot;
mod make;
mod ninja;
mod shell;

use std::io::{self, Write};

use crate::dag::{Build, Dag};
use crate::types::TypeContext;

/// The supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ninja,
    Dot,
    Make,
    Shell,
}

impl Format {
    pub fn by_name(name: &str) -> Option<Format> {
        match name {
            "ninja" => Some(Format::Ninja),
            "dot" => Some(Format::Dot),
            "make" => Some(Format::Make),
            "sh" => Some(Format::Shell),
            _ => None,
        }
    }

    /// The conventional output filename for this format.
    pub fn default_filename(self) -> &'static str {
        match self {
            Format::Ninja => "build.ninja",
            Format::Dot => "build.dot",
            Format::Make => "build.mk",
            Format::Shell => "build.sh",
        }
    }

    /// Writes the DAG in this format.
    pub fn format(
        self,
        dag: &Dag,
        types: &TypeContext,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        match self {
            Format::Ninja => ninja::format(dag, types, out),
            Format::Dot => dot::format(dag, types, out),
            Format::Make => make::format(dag, types, out),
            Format::Shell => shell::format(dag, types, out),
        }
    }
}

/// Substitutes `${name}` placeholders in a command template from a
/// build's argument map. Unknown placeholders are left in place.
pub(crate) fn substitute_command(template: &str, build: &Build) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match build.arguments().get(name) {
                    Some(value) => result.push_str(&value.render_plain()),
                    None => {
                        result.push_str("${");
                        result.push_str(name);
                        result.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                result.push_str("${");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

/// Rule names sorted alphabetically, for deterministic emission.
pub(crate) fn sorted_rule_names(dag: &Dag) -> Vec<&String> {
    let mut names: Vec<&String> = dag.rules().keys().collect();
    names.sort();
    names
}

/// Variables worth emitting as backend variables (primitives, strings,
/// lists, records), sorted by name. Rules, functions and builds have their
/// own representations.
pub(crate) fn plain_variables(dag: &Dag) -> Vec<(&String, &crate::dag::ValueRef)> {
    use crate::dag::ValueData;

    let mut variables: Vec<_> = dag
        .variables()
        .iter()
        .filter(|(_, value)| {
            matches!(
                value.data(),
                ValueData::Boolean(_)
                    | ValueData::Integer(_)
                    | ValueData::Str(_)
                    | ValueData::List(_)
                    | ValueData::Record(_)
            )
        })
        .collect();

    variables.sort_by_key(|(name, _)| name.as_str());
    variables
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::{DagBuilder, Parameter, ValueData, ValueMap};
    use crate::nom_tools::SpanInfo;
    use crate::types::TypeContext;

    #[test]
    fn substitution_replaces_known_parameters() {
        let mut types = TypeContext::new();
        let mut builder = DagBuilder::new();

        let input = types.input_file_type();
        let output = types.output_file_type();
        let file_list = types.file_list_type();
        let typ = types.function_type(vec![input, output], file_list);

        let rule_value = builder.rule(
            "cc".to_string(),
            "cc -c ${src} -o ${obj}".to_string(),
            ValueMap::new(),
            vec![
                Parameter::new("src", input, None),
                Parameter::new("obj", output, None),
            ],
            typ,
            SpanInfo::none(),
        );
        let rule = match rule_value.data() {
            ValueData::Rule(rule) => rule.clone(),
            _ => unreachable!(),
        };

        let mut args = ValueMap::new();
        let src = builder
            .file(&mut types, "a.c", ValueMap::new(), SpanInfo::none(), false)
            .unwrap();
        let obj = builder
            .file(&mut types, "a.o", ValueMap::new(), SpanInfo::none(), false)
            .unwrap();
        args.insert("src".to_string(), src);
        args.insert("obj".to_string(), obj);

        let build_value = builder
            .build(rule, args, &mut types, SpanInfo::none())
            .unwrap();
        let build = build_value.as_build().unwrap();

        assert_eq!(
            substitute_command(build.rule().command(), build),
            "cc -c a.c -o a.o"
        );
    }
}
