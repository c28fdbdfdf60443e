//! Ninja build file emission.

use std::io::{self, Write};

use crate::dag::Dag;
use crate::types::TypeContext;

use super::{plain_variables, sorted_rule_names};

const INDENT: &str = "    ";

/// Rewrites `${name}` placeholders as ninja `$name` references, leaving
/// any other text (including stray braces) alone.
fn ninja_command(template: &str) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end)
                if !after[..end].is_empty()
                    && after[..end]
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
            {
                result.push('$');
                result.push_str(&after[..end]);
                rest = &after[end + 1..];
            }
            _ => {
                result.push_str("${");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

pub(crate) fn format(dag: &Dag, types: &TypeContext, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "#")?;
    writeln!(out, "# Ninja file generated by Fabrique")?;
    writeln!(out, "#")?;
    writeln!(out)?;

    for (name, value) in plain_variables(dag) {
        writeln!(out, "{name} = {}", value.render(types))?;
    }
    writeln!(out)?;

    for name in sorted_rule_names(dag) {
        let rule = &dag.rules()[name];

        writeln!(out, "rule {name}")?;
        writeln!(out, "{INDENT}command = {}", ninja_command(rule.command()))?;
        writeln!(out, "{INDENT}description = {}", rule.description())?;
        for (arg, value) in rule.arguments() {
            writeln!(out, "{INDENT}{arg} = {}", value.render_plain())?;
        }
        writeln!(out)?;
    }

    for build in dag.builds() {
        let outputs: Vec<String> = build.outputs().iter().map(|f| f.full_name()).collect();
        let inputs: Vec<String> = build.inputs().iter().map(|f| f.full_name()).collect();

        write!(out, "build {}: {}", outputs.join(" "), build.rule().name())?;
        if !inputs.is_empty() {
            write!(out, " {}", inputs.join(" "))?;
        }
        writeln!(out)?;

        // Bind parameter values so the rule's $-references resolve.
        for (name, value) in build.arguments() {
            writeln!(out, "{INDENT}{name} = {}", value.render_plain())?;
        }
        writeln!(out)?;
    }

    if !dag.top_level_targets().is_empty() {
        for (name, target) in dag.top_level_targets() {
            let mut files = Vec::new();
            crate::dag::collect_files(target.value(), &mut files);
            if files.is_empty() {
                continue;
            }

            let files: Vec<String> = files.iter().map(|f| f.full_name()).collect();
            writeln!(out, "build {name}: phony {}", files.join(" "))?;
        }
        writeln!(out)?;

        let defaults: Vec<&str> = dag
            .top_level_targets()
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        writeln!(out, "default {}", defaults.join(" "))?;
    }

    Ok(())
}
