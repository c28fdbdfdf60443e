//! Factory and accumulator for files, builds, rules, variables and targets.
//!
//! Every value factory both returns and retains its product. The final
//! [`dag`] pass deduplicates files, synthesizes directory-creation steps
//! for generated files, checks target/file name conflicts, and snapshots
//! everything into an immutable [`Dag`].
//!
//! [`dag`]: DagBuilder::dag

use std::rc::Rc;

use indexmap::IndexMap;
use log::debug;

use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::platform;
use crate::types::{TypeContext, TypeId};

use super::build::Build;
use super::function::Parameter;
use super::rule::REGENERATION_RULE_NAME;
use super::value::{collect_files, Value, ValueData};
use super::{Dag, File, Rule, Target, ValueMap, ValueRef};

#[derive(Debug, Default)]
pub struct DagBuilder {
    files: Vec<Rc<File>>,
    builds: Vec<Rc<Build>>,
    rules: IndexMap<String, Rc<Rule>>,
    variables: IndexMap<String, ValueRef>,
    targets: IndexMap<String, Rc<Target>>,
}

impl DagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a file, interning it in the builder. A boolean `generated`
    /// attribute, if present, overrides the flag and is consumed.
    pub fn file(
        &mut self,
        types: &mut TypeContext,
        path: &str,
        attributes: ValueMap,
        src: SpanInfo,
        generated: bool,
    ) -> Result<ValueRef, FabError> {
        self.file_in_subdir(types, "", path, attributes, src, generated)
    }

    pub fn file_in_subdir(
        &mut self,
        types: &mut TypeContext,
        subdir: &str,
        path: &str,
        mut attributes: ValueMap,
        src: SpanInfo,
        mut generated: bool,
    ) -> Result<ValueRef, FabError> {
        if let Some(flag) = attributes.shift_remove("generated") {
            let boolean = types.boolean_type();
            if !types.is_subtype(flag.type_id(), boolean) {
                return Err(FabError::wrong_type(
                    types.display(boolean),
                    types.display(flag.type_id()),
                    flag.source().clone(),
                ));
            }

            generated = flag.as_boolean().unwrap_or(false);
        }

        let typ = types.file_type();
        let file = Rc::new(File::new(subdir, path, typ, attributes, src.clone(), generated));
        debug!("opened file '{}'", file.full_name());

        self.files.push(file.clone());
        Ok(Value::new(ValueData::File(file), typ, src))
    }

    /// Defines a rule, registering it under the given name.
    pub fn rule(
        &mut self,
        name: String,
        command: String,
        arguments: ValueMap,
        parameters: Vec<Parameter>,
        typ: TypeId,
        src: SpanInfo,
    ) -> ValueRef {
        let rule = Rc::new(Rule::new(
            name.clone(),
            command,
            arguments,
            parameters,
            typ,
            src.clone(),
        ));

        debug!("defined rule '{name}'");
        self.rules.insert(name, rule.clone());
        Value::new(ValueData::Rule(rule), typ, src)
    }

    /// Applies a rule to arguments, producing a build step. The build's
    /// input and output files are interned alongside it.
    pub fn build(
        &mut self,
        rule: Rc<Rule>,
        arguments: ValueMap,
        types: &mut TypeContext,
        src: SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let build = Build::create(rule, arguments, types, src.clone())?;

        debug!(
            "build '{}': {} input(s), {} output(s)",
            build.rule().name(),
            build.inputs().len(),
            build.outputs().len()
        );

        self.builds.push(build.clone());
        self.files.extend(build.inputs().iter().cloned());
        self.files.extend(build.outputs().iter().cloned());

        let typ = build.type_id();
        Ok(Value::new(ValueData::Build(build), typ, src))
    }

    /// Constructs a record value from named fields; the record's type is
    /// derived from the fields' types.
    pub fn record(
        &mut self,
        types: &mut TypeContext,
        fields: Vec<(String, ValueRef)>,
        src: SpanInfo,
    ) -> ValueRef {
        let field_types = fields
            .iter()
            .map(|(name, value)| (name.clone(), value.type_id()))
            .collect();

        let typ = types.record_type(field_types);
        Value::new(ValueData::Record(fields), typ, src)
    }

    /// Registers a named value. Values containing files become targets;
    /// everything else is a variable.
    pub fn define(&mut self, name: String, value: ValueRef, types: &mut TypeContext) {
        if types.has_files(value.type_id()) {
            debug!("target '{name}' ({})", value.kind());
            let target = Rc::new(Target::new(name.clone(), value));
            self.targets.insert(name, target);
        } else {
            debug!("variable '{name}' ({})", value.kind());
            self.variables.insert(name, value);
        }
    }

    pub fn target(&self, name: &str) -> Option<&Rc<Target>> {
        self.targets.get(name)
    }

    /// The canonical rule for creating output directories.
    fn make_directory_rule(types: &mut TypeContext) -> Rc<Rule> {
        let string = types.string_type();
        let output = types.output_file_type();
        let typ = types.function_type(vec![string], output);

        let mut arguments = ValueMap::new();
        arguments.insert(
            "description".to_string(),
            Value::string("Creating ${directory}", types, SpanInfo::none()),
        );

        let parameters = vec![Parameter::new("directory", output, None)];

        Rc::new(Rule::new(
            "mkdir".to_string(),
            platform::create_dir_command("${directory}"),
            arguments,
            parameters,
            typ,
            SpanInfo::none(),
        ))
    }

    /// Records the dependency of the generated build file on the Fabrique
    /// source files: a console-pool rule that re-runs the given command,
    /// plus a build invoking it.
    pub fn add_regeneration(
        &mut self,
        types: &mut TypeContext,
        command: &str,
        input_files: &[String],
        output_files: &[String],
    ) -> Result<ValueRef, FabError> {
        let nowhere = SpanInfo::none();

        let input_file = types.input_file_type();
        let input_list = types.list_of(input_file);
        let output_file = types.output_file_type();
        let output_list = types.list_of(output_file);
        let build_type = types.function_type(vec![input_list], output_file);

        let mut rule_args = ValueMap::new();
        rule_args.insert(
            "description".to_string(),
            Value::string("Regenerating ${output}", types, nowhere.clone()),
        );

        // Backends that support it (Ninja) give the regeneration step
        // direct console access.
        rule_args.insert(
            "pool".to_string(),
            Value::string("console", types, nowhere.clone()),
        );

        let parameters = vec![
            Parameter::new("rootInput", input_file, None),
            Parameter::new("otherInputs", input_list, None),
            Parameter::new("output", output_list, None),
        ];

        let rule_value = self.rule(
            REGENERATION_RULE_NAME.to_string(),
            format!("{command} ${{rootInput}}"),
            rule_args,
            parameters,
            build_type,
            nowhere.clone(),
        );
        let rule = match rule_value.data() {
            ValueData::Rule(rule) => rule.clone(),
            _ => unreachable!("rule factory returned a non-rule"),
        };

        let mut root_input = None;
        let mut other_inputs = Vec::new();
        for name in input_files {
            let file = self.file(types, name, ValueMap::new(), nowhere.clone(), false)?;
            if root_input.is_none() {
                root_input = Some(file);
            } else {
                other_inputs.push(file);
            }
        }

        let Some(root_input) = root_input else {
            return Err(FabError::semantic(
                "regeneration requires at least one input file",
                nowhere,
            ));
        };

        let mut outputs = Vec::new();
        for name in output_files {
            outputs.push(self.file(types, name, ValueMap::new(), nowhere.clone(), true)?);
        }

        let mut arguments = ValueMap::new();
        arguments.insert("rootInput".to_string(), root_input);
        arguments.insert(
            "otherInputs".to_string(),
            Value::list(other_inputs, types, nowhere.clone())?,
        );
        arguments.insert(
            "output".to_string(),
            Value::list(outputs, types, nowhere.clone())?,
        );

        self.build(rule, arguments, types, nowhere)
    }

    /// Produces the immutable DAG: synthesizes directory-creation steps,
    /// deduplicates files, checks name conflicts and snapshots the
    /// collections.
    pub fn dag(
        self,
        top_level_names: &[String],
        types: &mut TypeContext,
    ) -> Result<Dag, FabError> {
        let DagBuilder {
            mut files,
            builds: own_builds,
            mut rules,
            variables,
            targets,
        } = self;

        // Files in output directories need those directories created.
        // Every directory appears exactly once, however many files live in
        // it; the synthesized builds precede the builds that need them.
        let mkdir = Self::make_directory_rule(types);
        let mut directories: IndexMap<String, Rc<File>> = IndexMap::new();
        let mut directory_builds = Vec::new();

        for file in &files {
            // Absolute paths are never build outputs, so no directories
            // are created for them.
            if !file.generated() || file.absolute() {
                continue;
            }

            let mut dirname = file.directory().to_string();
            while !dirname.is_empty() && dirname != "." && dirname != "/" {
                if directories.contains_key(&dirname) {
                    break;
                }

                let file_type = types.file_type();
                let dir = Rc::new(File::new(
                    "",
                    &dirname,
                    file_type,
                    ValueMap::new(),
                    SpanInfo::none(),
                    true,
                ));
                directories.insert(dirname.clone(), dir.clone());

                let mut arguments = ValueMap::new();
                arguments.insert(
                    "directory".to_string(),
                    Value::new(ValueData::File(dir.clone()), file_type, SpanInfo::none()),
                );

                directory_builds.push(Build::create(
                    mkdir.clone(),
                    arguments,
                    types,
                    SpanInfo::none(),
                )?);

                dirname = dir.directory().to_string();
            }
        }

        if !directories.is_empty() {
            rules.insert("mkdir".to_string(), mkdir);
        }

        files.extend(directories.into_values());

        let mut builds = directory_builds;
        builds.extend(own_builds);

        // Deduplicate files by full name; iteration order is sort order.
        files.sort_by(|x, y| x.full_name().cmp(&y.full_name()));
        files.dedup_by(|x, y| x.full_name() == y.full_name());

        // A target may only share a name with a file if that file is among
        // the target's own outputs.
        for file in &files {
            let filename = file.full_name();
            if !top_level_names.contains(&filename) {
                continue;
            }

            let own_output = targets.get(&filename).is_some_and(|target| {
                let mut target_files = Vec::new();
                collect_files(target.value(), &mut target_files);
                target_files.iter().any(|f| f.full_name() == filename)
            });

            if !own_output {
                return Err(FabError::target_conflict(filename, file.source().clone()));
            }
        }

        let mut top_level_targets = Vec::new();
        for name in top_level_names {
            if let Some(target) = targets.get(name) {
                top_level_targets.push((name.clone(), target.clone()));
            }
        }

        Ok(Dag::new(
            files,
            builds,
            rules,
            variables,
            targets,
            top_level_targets,
        ))
    }
}
