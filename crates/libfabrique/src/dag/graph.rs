//! The immutable result of evaluation.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::types::TypeContext;

use super::build::Build;
use super::{File, Rule, Target, ValueRef};

/// The finished build graph: the contract consumed by backends.
///
/// Iteration order is stable: files are sorted by full name, builds appear
/// in creation order, and the name→value maps preserve definition order.
#[derive(Debug)]
pub struct Dag {
    files: Vec<Rc<File>>,
    builds: Vec<Rc<Build>>,
    rules: IndexMap<String, Rc<Rule>>,
    variables: IndexMap<String, ValueRef>,
    targets: IndexMap<String, Rc<Target>>,
    top_level_targets: Vec<(String, Rc<Target>)>,
}

impl Dag {
    pub(crate) fn new(
        files: Vec<Rc<File>>,
        builds: Vec<Rc<Build>>,
        rules: IndexMap<String, Rc<Rule>>,
        variables: IndexMap<String, ValueRef>,
        targets: IndexMap<String, Rc<Target>>,
        top_level_targets: Vec<(String, Rc<Target>)>,
    ) -> Self {
        Self {
            files,
            builds,
            rules,
            variables,
            targets,
            top_level_targets,
        }
    }

    /// All files, deduplicated and sorted by full name.
    pub fn files(&self) -> &[Rc<File>] {
        &self.files
    }

    /// All builds, in creation order.
    pub fn builds(&self) -> &[Rc<Build>] {
        &self.builds
    }

    pub fn rules(&self) -> &IndexMap<String, Rc<Rule>> {
        &self.rules
    }

    pub fn variables(&self) -> &IndexMap<String, ValueRef> {
        &self.variables
    }

    pub fn targets(&self) -> &IndexMap<String, Rc<Target>> {
        &self.targets
    }

    /// Top-level targets in declaration order.
    pub fn top_level_targets(&self) -> &[(String, Rc<Target>)] {
        &self.top_level_targets
    }

    /// A human-readable dump of the whole graph, for debugging.
    pub fn pretty_print(&self, types: &TypeContext) -> String {
        let mut out = String::new();

        for (name, value) in &self.variables {
            out.push_str(&format!("{name} = {}\n", value.render(types)));
        }

        for (name, rule) in &self.rules {
            out.push_str(&format!("rule {name}: '{}'\n", rule.command()));
        }

        for build in &self.builds {
            let inputs: Vec<String> = build.inputs().iter().map(|f| f.full_name()).collect();
            let outputs: Vec<String> = build.outputs().iter().map(|f| f.full_name()).collect();
            out.push_str(&format!(
                "build [{}] <- {} [{}]\n",
                outputs.join(" "),
                build.rule().name(),
                inputs.join(" "),
            ));
        }

        for (name, target) in &self.targets {
            out.push_str(&format!("target {name}: {}\n", target.value().render(types)));
        }

        out
    }
}
