//! The runtime value sum type and its operator semantics.
//!
//! Operators carry a source span for diagnostics and consult the type
//! lattice where result types depend on it (list concatenation, scalar
//! addition, prefixing). Builds and targets forward operators to their
//! canonical output value, so `build + '.o'` works when the build has a
//! single output file.

use std::rc::Rc;

use strum_macros::EnumDiscriminants;

use crate::error::FabError;
use crate::nom_tools::SpanInfo;
use crate::types::{TypeContext, TypeId};

use super::build::Build;
use super::callable::Callable;
use super::file::File;
use super::function::Function;
use super::rule::Rule;
use super::target::Target;
use super::{ValueMap, ValueRef};

/// The data carried by a [`Value`].
#[derive(Debug, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(strum_macros::Display))]
pub enum ValueData {
    Boolean(bool),
    Integer(i64),
    Str(String),
    File(Rc<File>),
    List(Vec<ValueRef>),
    Record(Vec<(String, ValueRef)>),
    Rule(Rc<Rule>),
    Build(Rc<Build>),
    Function(Rc<Function>),
    Target(Rc<Target>),
    Type(TypeId),
}

/// An evaluated value: data, a type and the source range it came from.
#[derive(Debug)]
pub struct Value {
    data: ValueData,
    typ: TypeId,
    source: SpanInfo,
}

impl Value {
    pub fn new(data: ValueData, typ: TypeId, source: SpanInfo) -> ValueRef {
        Rc::new(Self { data, typ, source })
    }

    pub fn boolean(value: bool, types: &mut TypeContext, source: SpanInfo) -> ValueRef {
        let typ = types.boolean_type();
        Self::new(ValueData::Boolean(value), typ, source)
    }

    pub fn integer(value: i64, types: &mut TypeContext, source: SpanInfo) -> ValueRef {
        let typ = types.integer_type();
        Self::new(ValueData::Integer(value), typ, source)
    }

    pub fn string(value: impl Into<String>, types: &mut TypeContext, source: SpanInfo) -> ValueRef {
        let typ = types.string_type();
        Self::new(ValueData::Str(value.into()), typ, source)
    }

    /// Wraps a list of values, computing the element type as the least
    /// upper bound of the elements. An empty list has element type nil.
    pub fn list(
        elements: Vec<ValueRef>,
        types: &mut TypeContext,
        source: SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let mut element_type = types.nil_type();
        for element in &elements {
            let join = types.supertype(element_type, element.typ);
            if !join.valid() {
                return Err(FabError::no_common_supertype(
                    types.display(element_type),
                    types.display(element.typ),
                    element.source.clone(),
                ));
            }
            element_type = join;
        }

        let typ = types.list_of(element_type);
        Ok(Self::new(ValueData::List(elements), typ, source))
    }

    pub fn type_reference(typ: TypeId, types: &mut TypeContext, source: SpanInfo) -> ValueRef {
        let reference_type = types.type_type();
        Self::new(ValueData::Type(typ), reference_type, source)
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    pub fn kind(&self) -> ValueKind {
        ValueKind::from(&self.data)
    }

    pub fn type_id(&self) -> TypeId {
        self.typ
    }

    pub fn source(&self) -> &SpanInfo {
        &self.source
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match &self.data {
            ValueData::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match &self.data {
            ValueData::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match &self.data {
            ValueData::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&Rc<File>> {
        match &self.data {
            ValueData::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ValueRef]> {
        match &self.data {
            ValueData::List(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&[(String, ValueRef)]> {
        match &self.data {
            ValueData::Record(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_build(&self) -> Option<&Rc<Build>> {
        match &self.data {
            ValueData::Build(build) => Some(build),
            _ => None,
        }
    }

    pub fn as_target(&self) -> Option<&Rc<Target>> {
        match &self.data {
            ValueData::Target(target) => Some(target),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeId> {
        match &self.data {
            ValueData::Type(typ) => Some(*typ),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<Callable> {
        match &self.data {
            ValueData::Rule(rule) => Some(Callable::Rule(rule.clone())),
            ValueData::Function(function) => Some(Callable::Function(function.clone())),
            _ => None,
        }
    }

    /// Renders this value as a string without access to the type context:
    /// used for command-template substitution and descriptions.
    pub fn render_plain(&self) -> String {
        match &self.data {
            ValueData::Boolean(value) => if *value { "true" } else { "false" }.to_string(),
            ValueData::Integer(value) => value.to_string(),
            ValueData::Str(value) => value.clone(),
            ValueData::File(file) => file.full_name(),
            ValueData::List(elements) => {
                let rendered: Vec<String> = elements.iter().map(|e| e.render_plain()).collect();
                rendered.join(" ")
            }
            ValueData::Record(fields) => {
                let rendered: Vec<String> = fields
                    .iter()
                    .map(|(name, value)| format!("{name} = {}", value.render_plain()))
                    .collect();
                format!("record {{ {} }}", rendered.join(", "))
            }
            ValueData::Rule(rule) => rule.command().to_string(),
            ValueData::Build(build) => {
                let rendered: Vec<String> =
                    build.outputs().iter().map(|f| f.full_name()).collect();
                rendered.join(" ")
            }
            ValueData::Function(_) => "<function>".to_string(),
            ValueData::Target(target) => target.value().render_plain(),
            ValueData::Type(_) => "<type>".to_string(),
        }
    }

    /// Like [`render_plain`], but renders type references properly.
    ///
    /// [`render_plain`]: Self::render_plain
    pub fn render(&self, types: &TypeContext) -> String {
        match &self.data {
            ValueData::Type(typ) => types.display(*typ),
            ValueData::List(elements) => {
                let rendered: Vec<String> = elements.iter().map(|e| e.render(types)).collect();
                rendered.join(" ")
            }
            _ => self.render_plain(),
        }
    }
}

/// Resolves builds and targets to the value their operators act on: a
/// single output file, or a list of outputs.
fn operand(value: &ValueRef, types: &mut TypeContext) -> Result<ValueRef, FabError> {
    match value.data() {
        ValueData::Build(build) => build.output_value(types),
        ValueData::Target(target) => operand(target.value(), types),
        _ => Ok(value.clone()),
    }
}

fn invalid(
    operation: &str,
    lhs: &ValueRef,
    rhs: &ValueRef,
    types: &TypeContext,
    src: &SpanInfo,
) -> FabError {
    FabError::invalid_operands(
        operation,
        types.display(lhs.type_id()),
        types.display(rhs.type_id()),
        src.clone(),
    )
}

impl Value {
    /// `lhs + rhs`: integer addition, string/list concatenation, file
    /// suffixing/prefixing and elementwise scalar addition.
    pub fn add(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let lhs = operand(lhs, types)?;
        let rhs = operand(rhs, types)?;

        match (lhs.data(), rhs.data()) {
            (ValueData::Integer(x), ValueData::Integer(y)) => {
                Ok(Value::integer(x + y, types, src.clone()))
            }

            (ValueData::Str(x), ValueData::Str(y)) => {
                Ok(Value::string(format!("{x}{y}"), types, src.clone()))
            }

            // Adding a string to a file extends its name.
            (ValueData::File(file), ValueData::Str(suffix)) => Ok(Value::new(
                ValueData::File(Rc::new(file.with_filename(
                    format!("{}{}", file.name(), suffix),
                    src.clone(),
                ))),
                lhs.type_id(),
                src.clone(),
            )),

            (ValueData::Str(prefix), ValueData::File(file)) => Ok(Value::new(
                ValueData::File(Rc::new(file.with_filename(
                    format!("{}{}", prefix, file.name()),
                    src.clone(),
                ))),
                rhs.type_id(),
                src.clone(),
            )),

            // List concatenation; the result's element type is the join.
            (ValueData::List(x), ValueData::List(y)) => {
                let result = types.on_add_to(lhs.type_id(), rhs.type_id());
                if !result.valid() {
                    return Err(FabError::no_common_supertype(
                        types.display(lhs.type_id()),
                        types.display(rhs.type_id()),
                        src.clone(),
                    ));
                }

                let mut elements = x.clone();
                elements.extend(y.iter().cloned());
                Ok(Value::new(ValueData::List(elements), result, src.clone()))
            }

            // Scalar addition distributes over the list's elements.
            (ValueData::List(elements), _) => {
                let result = types.on_add_to(lhs.type_id(), rhs.type_id());
                if !result.valid() {
                    return Err(invalid("add", &lhs, &rhs, types, src));
                }

                let elements = elements
                    .iter()
                    .map(|element| Value::add(element, &rhs, types, src))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::new(ValueData::List(elements), result, src.clone()))
            }

            (_, ValueData::List(elements)) => {
                let result = types.on_add_to(rhs.type_id(), lhs.type_id());
                if !result.valid() {
                    return Err(invalid("add", &lhs, &rhs, types, src));
                }

                let elements = elements
                    .iter()
                    .map(|element| Value::add(&lhs, element, types, src))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::new(ValueData::List(elements), result, src.clone()))
            }

            _ => Err(invalid("add", &lhs, &rhs, types, src)),
        }
    }

    /// `prefix :: value`.
    pub fn prefix_with(
        value: &ValueRef,
        prefix: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let value = operand(value, types)?;
        let prefix = operand(prefix, types)?;

        match (value.data(), prefix.data()) {
            (ValueData::Str(x), ValueData::Str(p)) => {
                Ok(Value::string(format!("{p}{x}"), types, src.clone()))
            }

            (ValueData::File(file), ValueData::Str(p)) => Ok(Value::new(
                ValueData::File(Rc::new(
                    file.with_filename(format!("{}{}", p, file.name()), src.clone()),
                )),
                value.type_id(),
                src.clone(),
            )),

            // Prepending an element to a list.
            (ValueData::List(elements), _) => {
                let result = types.on_prefix_with(value.type_id(), prefix.type_id());
                if !result.valid() {
                    return Err(invalid("prefix", &value, &prefix, types, src));
                }

                let mut prefixed = vec![prefix.clone()];
                prefixed.extend(elements.iter().cloned());
                Ok(Value::new(ValueData::List(prefixed), result, src.clone()))
            }

            _ => Err(invalid("prefix", &value, &prefix, types, src)),
        }
    }

    pub fn subtract(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let lhs = operand(lhs, types)?;
        let rhs = operand(rhs, types)?;

        match (lhs.data(), rhs.data()) {
            (ValueData::Integer(x), ValueData::Integer(y)) => {
                Ok(Value::integer(x - y, types, src.clone()))
            }
            _ => Err(invalid("subtract", &lhs, &rhs, types, src)),
        }
    }

    pub fn multiply_by(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let lhs = operand(lhs, types)?;
        let rhs = operand(rhs, types)?;

        match (lhs.data(), rhs.data()) {
            (ValueData::Integer(x), ValueData::Integer(y)) => {
                Ok(Value::integer(x * y, types, src.clone()))
            }
            _ => Err(invalid("multiply", &lhs, &rhs, types, src)),
        }
    }

    pub fn divide_by(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let lhs = operand(lhs, types)?;
        let rhs = operand(rhs, types)?;

        match (lhs.data(), rhs.data()) {
            (ValueData::Integer(_), ValueData::Integer(0)) => {
                Err(FabError::division_by_zero(src.clone()))
            }
            (ValueData::Integer(x), ValueData::Integer(y)) => {
                Ok(Value::integer(x / y, types, src.clone()))
            }
            _ => Err(invalid("divide", &lhs, &rhs, types, src)),
        }
    }

    pub fn negate(
        value: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        match value.data() {
            ValueData::Integer(x) => Ok(Value::integer(-x, types, src.clone())),
            _ => Err(FabError::invalid_operands(
                "negate",
                types.display(value.type_id()),
                types.display(value.type_id()),
                src.clone(),
            )),
        }
    }

    pub fn logical_not(
        value: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        match value.data() {
            ValueData::Boolean(x) => Ok(Value::boolean(!x, types, src.clone())),
            _ => Err(FabError::invalid_operands(
                "logically negate",
                types.display(value.type_id()),
                types.display(value.type_id()),
                src.clone(),
            )),
        }
    }

    fn boolean_op(
        name: &str,
        op: fn(bool, bool) -> bool,
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        match (lhs.data(), rhs.data()) {
            (ValueData::Boolean(x), ValueData::Boolean(y)) => {
                Ok(Value::boolean(op(*x, *y), types, src.clone()))
            }
            _ => Err(invalid(name, lhs, rhs, types, src)),
        }
    }

    pub fn and(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        Self::boolean_op("and", |x, y| x && y, lhs, rhs, types, src)
    }

    pub fn or(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        Self::boolean_op("or", |x, y| x || y, lhs, rhs, types, src)
    }

    pub fn xor(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        Self::boolean_op("xor", |x, y| x ^ y, lhs, rhs, types, src)
    }

    /// `lhs == rhs` for primitive values. Strings compare byte-exact over
    /// their full length, embedded NULs included.
    pub fn equals(
        lhs: &ValueRef,
        rhs: &ValueRef,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<ValueRef, FabError> {
        let lhs = operand(lhs, types)?;
        let rhs = operand(rhs, types)?;

        let equal = match (lhs.data(), rhs.data()) {
            (ValueData::Boolean(x), ValueData::Boolean(y)) => x == y,
            (ValueData::Integer(x), ValueData::Integer(y)) => x == y,
            (ValueData::Str(x), ValueData::Str(y)) => {
                x.len() == y.len() && x.as_bytes() == y.as_bytes()
            }
            (ValueData::File(x), ValueData::File(y)) => x.full_name() == y.full_name(),
            _ => return Err(invalid("compare", &lhs, &rhs, types, src)),
        };

        Ok(Value::boolean(equal, types, src.clone()))
    }

    /// Looks up a field on this value, if it is the kind of value that has
    /// fields. Returns `Ok(None)` for a missing field on a field-bearing
    /// value; errors on field access to something without fields.
    pub fn field(
        value: &ValueRef,
        name: &str,
        types: &mut TypeContext,
        src: &SpanInfo,
    ) -> Result<Option<ValueRef>, FabError> {
        match value.data() {
            ValueData::Record(fields) => Ok(fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value.clone())),

            ValueData::File(file) => Ok(file_field(file, name, types)),

            ValueData::Build(build) => match build.outputs() {
                [only] => {
                    let file = Value::new(
                        ValueData::File(only.clone()),
                        only.type_id(),
                        value.source().clone(),
                    );
                    Value::field(&file, name, types, src)
                }
                _ => Err(FabError::no_such_field(
                    name,
                    types.display(value.type_id()),
                    src.clone(),
                )),
            },

            ValueData::Target(target) => Value::field(target.value(), name, types, src),

            _ => Err(FabError::no_such_field(
                name,
                types.display(value.type_id()),
                src.clone(),
            )),
        }
    }
}

fn file_field(file: &Rc<File>, name: &str, types: &mut TypeContext) -> Option<ValueRef> {
    let src = file.source().clone();
    match name {
        "basename" => Some(Value::string(
            crate::platform::base_name(file.name()),
            types,
            src,
        )),
        "extension" => Some(Value::string(
            crate::platform::file_extension(file.name()),
            types,
            src,
        )),
        "name" => Some(Value::string(file.name(), types, src)),
        "fullName" => Some(Value::string(file.full_name(), types, src)),
        "generated" => Some(Value::boolean(file.generated(), types, src)),
        "subdir" => {
            let typ = types.file_type();
            let subdir = File::new(
                "",
                file.subdirectory(),
                typ,
                ValueMap::new(),
                src.clone(),
                false,
            );
            Some(Value::new(ValueData::File(Rc::new(subdir)), typ, src))
        }
        _ => file.attributes().get(name).cloned(),
    }
}

/// Collects every file contained in a value, recursing through lists,
/// records, builds and targets.
pub fn collect_files(value: &ValueRef, out: &mut Vec<Rc<File>>) {
    match value.data() {
        ValueData::File(file) => out.push(file.clone()),
        ValueData::List(elements) => {
            for element in elements {
                collect_files(element, out);
            }
        }
        ValueData::Record(fields) => {
            for (_, field) in fields {
                collect_files(field, out);
            }
        }
        ValueData::Build(build) => out.extend(build.outputs().iter().cloned()),
        ValueData::Target(target) => collect_files(target.value(), out),
        _ => {}
    }
}
