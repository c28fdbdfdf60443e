//! POSIX make emission.

use std::io::{self, Write};

use crate::dag::{collect_files, Dag};
use crate::types::TypeContext;

use super::{plain_variables, substitute_command};

pub(crate) fn format(dag: &Dag, types: &TypeContext, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "#")?;
    writeln!(out, "# Makefile generated by Fabrique")?;
    writeln!(out, "#")?;
    writeln!(out)?;

    for (name, value) in plain_variables(dag) {
        writeln!(out, "{name} = {}", value.render(types))?;
    }
    writeln!(out)?;

    // Top-level targets are phony aliases for their underlying files.
    let target_names: Vec<&str> = dag
        .top_level_targets()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();

    if !target_names.is_empty() {
        writeln!(out, "all: {}", target_names.join(" "))?;
        writeln!(out, ".PHONY: all {}", target_names.join(" "))?;
        writeln!(out)?;

        for (name, target) in dag.top_level_targets() {
            let mut files = Vec::new();
            collect_files(target.value(), &mut files);
            let files: Vec<String> = files.iter().map(|f| f.full_name()).collect();
            writeln!(out, "{name}: {}", files.join(" "))?;
        }
        writeln!(out)?;
    }

    for build in dag.builds() {
        let outputs: Vec<String> = build.outputs().iter().map(|f| f.full_name()).collect();
        let inputs: Vec<String> = build.inputs().iter().map(|f| f.full_name()).collect();

        writeln!(out, "{}: {}", outputs.join(" "), inputs.join(" "))?;
        writeln!(out, "\t{}", substitute_command(build.rule().command(), build))?;
        writeln!(out)?;
    }

    Ok(())
}
