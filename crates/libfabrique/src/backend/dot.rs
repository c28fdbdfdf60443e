//! Graphviz DOT emission: files as ellipses, builds as rectangles.

use std::io::{self, Write};

use crate::dag::Dag;
use crate::types::TypeContext;

fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}

pub(crate) fn format(dag: &Dag, _types: &TypeContext, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "digraph fabrique {{")?;
    writeln!(out, "    rankdir = LR;")?;
    writeln!(out)?;

    for file in dag.files() {
        writeln!(
            out,
            "    \"{}\" [ shape = ellipse ];",
            escape(&file.full_name())
        )?;
    }
    writeln!(out)?;

    for (index, build) in dag.builds().iter().enumerate() {
        let node = format!("build{index}");
        writeln!(
            out,
            "    \"{node}\" [ shape = rectangle, label = \"{}\" ];",
            escape(build.rule().name())
        )?;

        for input in build.inputs() {
            writeln!(
                out,
                "    \"{}\" -> \"{node}\";",
                escape(&input.full_name())
            )?;
        }

        for output in build.outputs() {
            writeln!(
                out,
                "    \"{node}\" -> \"{}\";",
                escape(&output.full_name())
            )?;
        }

        writeln!(out)?;
    }

    writeln!(out, "}}")?;
    Ok(())
}
