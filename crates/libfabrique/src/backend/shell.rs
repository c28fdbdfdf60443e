//! Shell script emission: builds in dependency (creation) order.

use std::io::{self, Write};

use crate::dag::Dag;
use crate::types::TypeContext;

use super::{plain_variables, substitute_command};

pub(crate) fn format(dag: &Dag, types: &TypeContext, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "#!/bin/sh")?;
    writeln!(out, "# Build script generated by Fabrique")?;
    writeln!(out, "set -e")?;
    writeln!(out)?;

    for (name, value) in plain_variables(dag) {
        writeln!(out, "# {name} = {}", value.render(types))?;
    }
    writeln!(out)?;

    for build in dag.builds() {
        let command = substitute_command(build.rule().command(), build);
        let description = substitute_command(build.rule().description(), build);

        writeln!(out, "echo \"{}\"", description.replace('"', "\\\""))?;
        writeln!(out, "{command}")?;
        writeln!(out)?;
    }

    Ok(())
}
