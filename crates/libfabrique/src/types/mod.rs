//! The Fabrique type system: an interning context and the subtype lattice.
//!
//! All types live in a single [`TypeContext`] arena and are referred to by
//! [`TypeId`]. Interning canonicalises structurally, so type equality is id
//! equality within a context. The lattice operations (subtyping, join,
//! operator-result rules) all live here; the evaluator never inspects type
//! structure directly.
//!
//! # Subtyping
//!
//! - reflexive; `nil` is a subtype of everything (and `valid() == false`)
//! - lists are covariant in their element type; the empty list's element
//!   type is `nil`, making it a subtype of every list type
//! - functions are contravariant in parameters, covariant in results
//! - records use width/depth subtyping: `R₁ ≤ R₂` iff every field of `R₂`
//!   exists in `R₁` with a subtype
//! - an untagged `file` can be supplied where `file[in]` or `file[out]` is
//!   expected; the two tagged types are incomparable

use indexmap::IndexMap;

use crate::error::FabError;
use crate::nom_tools::SpanInfo;

/// Tag distinguishing build inputs from build outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileTag {
    /// An untagged file, usable as either input or output
    None,
    /// `file[in]`
    Input,
    /// `file[out]`
    Output,
}

/// Structure of a type. Interned; never constructed outside [`TypeContext`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The distinguished "no type"; subtype of everything
    Nil,
    Boolean,
    Integer,
    String,
    File(FileTag),
    /// The unparameterised `list` base type
    RawList,
    List(TypeId),
    Function {
        params: Vec<TypeId>,
        result: TypeId,
    },
    Record(Vec<(String, TypeId)>),
    /// The type of first-class type references
    Type,
    /// A bare tag name usable as a type parameter (`in`, `out`)
    Tag(String),
}

/// Handle to an interned type. Copyable; equality is referential within the
/// owning [`TypeContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

impl TypeId {
    /// The distinguished nil type, always at index zero.
    pub const NIL: TypeId = TypeId(0);

    /// Whether this is a real type (everything except nil).
    pub fn valid(self) -> bool {
        self != Self::NIL
    }
}

/// The canonicalising registry for all types in a compilation.
///
/// Owns every type for the compilation's lifetime; the types outlive the
/// DAG they helped build.
#[derive(Debug)]
pub struct TypeContext {
    types: Vec<TypeKind>,
    canon: IndexMap<TypeKind, TypeId>,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeContext {
    pub fn new() -> Self {
        let mut ctx = Self {
            types: Vec::new(),
            canon: IndexMap::new(),
        };

        // Nil must land at index zero so TypeId::NIL is stable.
        ctx.intern(TypeKind::Nil);
        ctx.intern(TypeKind::Boolean);
        ctx.intern(TypeKind::Integer);
        ctx.intern(TypeKind::String);
        ctx.intern(TypeKind::File(FileTag::None));
        ctx.intern(TypeKind::File(FileTag::Input));
        ctx.intern(TypeKind::File(FileTag::Output));
        ctx.intern(TypeKind::RawList);
        ctx.intern(TypeKind::Type);
        ctx.intern(TypeKind::Tag("in".to_string()));
        ctx.intern(TypeKind::Tag("out".to_string()));

        ctx
    }

    fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(id) = self.canon.get(&kind) {
            return *id;
        }

        let id = TypeId(self.types.len());
        self.types.push(kind.clone());
        self.canon.insert(kind, id);
        id
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.types[id.0]
    }

    pub fn nil_type(&self) -> TypeId {
        TypeId::NIL
    }

    pub fn boolean_type(&mut self) -> TypeId {
        self.intern(TypeKind::Boolean)
    }

    pub fn integer_type(&mut self) -> TypeId {
        self.intern(TypeKind::Integer)
    }

    pub fn string_type(&mut self) -> TypeId {
        self.intern(TypeKind::String)
    }

    pub fn file_type(&mut self) -> TypeId {
        self.intern(TypeKind::File(FileTag::None))
    }

    pub fn input_file_type(&mut self) -> TypeId {
        self.intern(TypeKind::File(FileTag::Input))
    }

    pub fn output_file_type(&mut self) -> TypeId {
        self.intern(TypeKind::File(FileTag::Output))
    }

    pub fn list_of(&mut self, element: TypeId) -> TypeId {
        self.intern(TypeKind::List(element))
    }

    /// The type of an empty list literal: `list[nil]`.
    pub fn empty_list_type(&mut self) -> TypeId {
        self.list_of(TypeId::NIL)
    }

    pub fn file_list_type(&mut self) -> TypeId {
        let file = self.file_type();
        self.list_of(file)
    }

    pub fn function_type(&mut self, params: Vec<TypeId>, result: TypeId) -> TypeId {
        self.intern(TypeKind::Function { params, result })
    }

    pub fn record_type(&mut self, fields: Vec<(String, TypeId)>) -> TypeId {
        self.intern(TypeKind::Record(fields))
    }

    pub fn type_type(&mut self) -> TypeId {
        self.intern(TypeKind::Type)
    }

    /// Returns the canonical type with the given name and parameters,
    /// constructing it on demand. Unknown names yield the nil type.
    pub fn find(&mut self, name: &str, params: &[TypeId]) -> TypeId {
        match (name, params) {
            ("nil", []) => TypeId::NIL,
            ("bool", []) => self.boolean_type(),
            ("int", []) => self.integer_type(),
            ("string", []) => self.string_type(),
            ("file", []) => self.file_type(),
            ("list", []) => self.intern(TypeKind::RawList),
            ("type", []) => self.type_type(),
            ("in", []) => self.intern(TypeKind::Tag("in".to_string())),
            ("out", []) => self.intern(TypeKind::Tag("out".to_string())),
            ("list", [element]) => self.list_of(*element),
            ("file", [tag]) => match self.kind(*tag) {
                TypeKind::Tag(tag) if tag == "in" => self.input_file_type(),
                TypeKind::Tag(tag) if tag == "out" => self.output_file_type(),
                _ => TypeId::NIL,
            },
            _ => TypeId::NIL,
        }
    }

    /// Applies type parameters to a named base type, kind-checking them.
    /// Used for parametric application like `list[int]` and `file[in]`.
    pub fn parameterise(
        &mut self,
        base: &str,
        params: &[TypeId],
        src: &SpanInfo,
    ) -> Result<TypeId, FabError> {
        match (base, params) {
            ("list", [element]) => Ok(self.list_of(*element)),
            ("file", [tag]) => match self.kind(*tag).clone() {
                TypeKind::Tag(name) if name == "in" => Ok(self.input_file_type()),
                TypeKind::Tag(name) if name == "out" => Ok(self.output_file_type()),
                other => {
                    let tag = self.display_kind(&other);
                    Err(FabError::invalid_file_tag(tag, src.clone()))
                }
            },
            _ => Err(FabError::semantic(
                format!("'{base}' cannot take these type parameters"),
                src.clone(),
            )),
        }
    }

    /// Human-readable rendering of a type, matching the source syntax.
    pub fn display(&self, id: TypeId) -> String {
        self.display_kind(self.kind(id))
    }

    fn display_kind(&self, kind: &TypeKind) -> String {
        match kind {
            TypeKind::Nil => "nil".to_string(),
            TypeKind::Boolean => "bool".to_string(),
            TypeKind::Integer => "int".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::File(FileTag::None) => "file".to_string(),
            TypeKind::File(FileTag::Input) => "file[in]".to_string(),
            TypeKind::File(FileTag::Output) => "file[out]".to_string(),
            TypeKind::RawList => "list".to_string(),
            TypeKind::List(element) => format!("list[{}]", self.display(*element)),
            TypeKind::Function { params, result } => {
                let params: Vec<String> = params.iter().map(|p| self.display(*p)).collect();
                format!("({})=>{}", params.join(","), self.display(*result))
            }
            TypeKind::Record(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(name, t)| format!("{name}:{}", self.display(*t)))
                    .collect();
                format!("record[{}]", fields.join(", "))
            }
            TypeKind::Type => "type".to_string(),
            TypeKind::Tag(name) => name.clone(),
        }
    }

    /// The subtype relation `sub ≤ sup`.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }

        match (self.kind(sub), self.kind(sup)) {
            // Nil is a subtype of everything, and accepts anything: it is
            // the type of empty lists and of wildcard parameters like
            // print's.
            (TypeKind::Nil, _) => true,
            (_, TypeKind::Nil) => true,

            // An untagged file can be supplied where a tagged one is
            // expected; tagged files are incomparable with each other.
            (TypeKind::File(FileTag::None), TypeKind::File(_)) => true,
            (TypeKind::File(_), TypeKind::File(_)) => false,

            // Lists are covariant in their element type.
            (TypeKind::List(sub_el), TypeKind::List(sup_el)) => self.is_subtype(*sub_el, *sup_el),

            // Functions are contravariant in parameters, covariant in
            // results.
            (
                TypeKind::Function {
                    params: sub_params,
                    result: sub_result,
                },
                TypeKind::Function {
                    params: sup_params,
                    result: sup_result,
                },
            ) => {
                sub_params.len() == sup_params.len()
                    && sub_params
                        .iter()
                        .zip(sup_params.iter())
                        .all(|(mine, theirs)| self.is_subtype(*theirs, *mine))
                    && self.is_subtype(*sub_result, *sup_result)
            }

            // Width/depth record subtyping: the subtype may have extra
            // fields, and shared fields are covariant.
            (TypeKind::Record(sub_fields), TypeKind::Record(sup_fields)) => {
                sup_fields.iter().all(|(name, sup_field)| {
                    sub_fields
                        .iter()
                        .find(|(sub_name, _)| sub_name == name)
                        .is_some_and(|(_, sub_field)| self.is_subtype(*sub_field, *sup_field))
                })
            }

            _ => false,
        }
    }

    /// The least upper bound of two types, or nil if none exists.
    ///
    /// Commutative up to canonicalisation; for records it is the row
    /// intersection, recursed field-wise.
    pub fn supertype(&mut self, a: TypeId, b: TypeId) -> TypeId {
        if a == b {
            return a;
        }

        // Nil joins transparently with anything (it is the element type of
        // empty lists); handled first so the join stays commutative.
        if a == TypeId::NIL {
            return b;
        }

        if b == TypeId::NIL {
            return a;
        }

        if self.is_subtype(a, b) {
            return b;
        }

        if self.is_subtype(b, a) {
            return a;
        }

        match (self.kind(a).clone(), self.kind(b).clone()) {
            (TypeKind::List(a_el), TypeKind::List(b_el)) => {
                let join = self.supertype(a_el, b_el);
                if join.valid() {
                    self.list_of(join)
                } else {
                    TypeId::NIL
                }
            }

            (TypeKind::Record(a_fields), TypeKind::Record(b_fields)) => {
                let mut fields = Vec::new();
                for (name, a_field) in &a_fields {
                    let Some((_, b_field)) = b_fields.iter().find(|(b_name, _)| b_name == name)
                    else {
                        continue;
                    };

                    let join = self.supertype(*a_field, *b_field);
                    if join.valid() {
                        fields.push((name.clone(), join));
                    }
                }

                self.record_type(fields)
            }

            _ => TypeId::NIL,
        }
    }

    /// The result type of `a + b`, or nil if unsupported. Asymmetric: the
    /// evaluator tries both orderings.
    pub fn on_add_to(&mut self, a: TypeId, b: TypeId) -> TypeId {
        match self.kind(a).clone() {
            TypeKind::Integer if matches!(self.kind(b), TypeKind::Integer) => a,
            TypeKind::String if matches!(self.kind(b), TypeKind::String) => a,

            // Adding a string to a file yields a file with a longer name.
            TypeKind::File(_) if matches!(self.kind(b), TypeKind::String) => a,

            TypeKind::List(element) => match self.kind(b).clone() {
                // Concatenation: the result element type is the join.
                TypeKind::List(other_element) => {
                    let join = self.supertype(element, other_element);
                    if join.valid() {
                        self.list_of(join)
                    } else {
                        TypeId::NIL
                    }
                }
                // Scalar add: apply `+ b` to every element.
                _ => {
                    let join = self.on_add_to(element, b);
                    if join.valid() {
                        self.list_of(join)
                    } else {
                        TypeId::NIL
                    }
                }
            },

            _ => TypeId::NIL,
        }
    }

    /// The result type of `a * b`, or nil if unsupported.
    pub fn on_multiply(&mut self, a: TypeId, b: TypeId) -> TypeId {
        match (self.kind(a), self.kind(b)) {
            (TypeKind::Integer, TypeKind::Integer) => a,
            _ => TypeId::NIL,
        }
    }

    /// The result type of `b :: a` (prefixing `a` with `b`), or nil.
    pub fn on_prefix_with(&mut self, a: TypeId, b: TypeId) -> TypeId {
        match self.kind(a).clone() {
            TypeKind::String if matches!(self.kind(b), TypeKind::String) => a,

            // Prefixing a file with a string modifies the filename but not
            // the subdir or root directories.
            TypeKind::File(_) if matches!(self.kind(b), TypeKind::String) => a,

            TypeKind::List(element) => {
                let join = self.supertype(element, b);
                if join.valid() {
                    self.list_of(join)
                } else {
                    TypeId::NIL
                }
            }

            _ => TypeId::NIL,
        }
    }

    /// The fields of a type, for types that have fields (records and
    /// files). Files expose the universal field set; records expose their
    /// declared fields in declaration order.
    pub fn fields(&mut self, id: TypeId) -> Option<Vec<(String, TypeId)>> {
        match self.kind(id).clone() {
            TypeKind::Record(fields) => Some(fields),
            TypeKind::File(_) => {
                let string = self.string_type();
                let boolean = self.boolean_type();
                let file = self.file_type();
                Some(vec![
                    ("basename".to_string(), string),
                    ("extension".to_string(), string),
                    ("name".to_string(), string),
                    ("fullName".to_string(), string),
                    ("generated".to_string(), boolean),
                    ("subdir".to_string(), file),
                ])
            }
            _ => None,
        }
    }

    pub fn is_file(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::File(_))
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::String)
    }

    pub fn is_ordered(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::List(_) | TypeKind::RawList)
    }

    /// Whether values of this type contain files (and should be promoted to
    /// targets when bound at the top level).
    pub fn has_files(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::File(_) => true,
            TypeKind::List(element) => self.has_files(*element),
            TypeKind::Record(fields) => fields.iter().any(|(_, t)| self.has_files(*t)),
            _ => false,
        }
    }

    /// Whether this type is, or contains, `file[out]`.
    pub fn has_output(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::File(FileTag::Output) => true,
            TypeKind::List(element) => self.has_output(*element),
            TypeKind::Record(fields) => fields.iter().any(|(_, t)| self.has_output(*t)),
            _ => false,
        }
    }

    /// Whether this type contains a file with no in/out tag. Action
    /// signatures reject such parameters.
    pub fn has_untagged_file(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::File(FileTag::None) => true,
            TypeKind::List(element) => self.has_untagged_file(*element),
            TypeKind::Record(fields) => fields.iter().any(|(_, t)| self.has_untagged_file(*t)),
            _ => false,
        }
    }

    /// Whether this type is, or contains, `file[in]`.
    pub fn has_input(&self, id: TypeId) -> bool {
        match self.kind(id) {
            TypeKind::File(FileTag::Input) => true,
            TypeKind::List(element) => self.has_input(*element),
            TypeKind::Record(fields) => fields.iter().any(|(_, t)| self.has_input(*t)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn interning_is_referential() {
        let mut ctx = TypeContext::new();
        let a = ctx.list_of(ctx.nil_type());
        let nil = ctx.nil_type();
        let b = ctx.list_of(nil);
        assert_eq!(a, b);

        let int = ctx.integer_type();
        let r1 = ctx.record_type(vec![("a".to_string(), int)]);
        let r2 = ctx.record_type(vec![("a".to_string(), int)]);
        assert_eq!(r1, r2);
    }

    #[test]
    fn nil_is_subtype_of_everything() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let file_list = ctx.file_list_type();
        assert!(ctx.is_subtype(TypeId::NIL, int));
        assert!(ctx.is_subtype(TypeId::NIL, file_list));

        // Nil also accepts anything, so wildcard parameters type-check.
        assert!(ctx.is_subtype(int, TypeId::NIL));
        assert_eq!(ctx.supertype(int, TypeId::NIL), int);
        assert_eq!(ctx.supertype(TypeId::NIL, int), int);
    }

    #[test]
    fn file_tag_subtyping() {
        let mut ctx = TypeContext::new();
        let file = ctx.file_type();
        let input = ctx.input_file_type();
        let output = ctx.output_file_type();

        assert!(ctx.is_subtype(file, input));
        assert!(ctx.is_subtype(file, output));
        assert!(!ctx.is_subtype(input, output));
        assert!(!ctx.is_subtype(output, input));
        assert!(!ctx.is_subtype(input, file));
    }

    #[test]
    fn empty_list_is_subtype_of_any_list() {
        let mut ctx = TypeContext::new();
        let empty = ctx.empty_list_type();
        let int = ctx.integer_type();
        let ints = ctx.list_of(int);
        let files = ctx.file_list_type();

        assert!(ctx.is_subtype(empty, ints));
        assert!(ctx.is_subtype(empty, files));
    }

    #[test]
    fn function_variance() {
        let mut ctx = TypeContext::new();
        let file = ctx.file_type();
        let input = ctx.input_file_type();
        let int = ctx.integer_type();

        // (file[in]) => int  ≤  (file) => int : parameters are contravariant
        // and any plain file can be passed where file[in] is expected.
        let wide = ctx.function_type(vec![input], int);
        let narrow = ctx.function_type(vec![file], int);
        assert!(ctx.is_subtype(narrow, wide));
        assert!(!ctx.is_subtype(wide, narrow));

        // Results are covariant.
        let empty = ctx.empty_list_type();
        let ints = ctx.list_of(int);
        let returns_empty = ctx.function_type(vec![int], empty);
        let returns_ints = ctx.function_type(vec![int], ints);
        assert!(ctx.is_subtype(returns_empty, returns_ints));
    }

    #[test]
    fn record_width_subtyping() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let wide = ctx.record_type(vec![("a".to_string(), int), ("b".to_string(), int)]);
        let narrow = ctx.record_type(vec![("a".to_string(), int)]);
        let empty = ctx.record_type(vec![]);

        assert!(ctx.is_subtype(wide, narrow));
        assert!(!ctx.is_subtype(narrow, wide));
        assert!(ctx.is_subtype(wide, empty));
        assert!(ctx.is_subtype(narrow, empty));
    }

    #[test]
    fn record_supertype_is_row_intersection() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let string = ctx.string_type();
        let a = ctx.record_type(vec![("x".to_string(), int), ("y".to_string(), string)]);
        let b = ctx.record_type(vec![("y".to_string(), string), ("z".to_string(), int)]);

        let join = ctx.supertype(a, b);
        assert_eq!(
            ctx.kind(join),
            &TypeKind::Record(vec![("y".to_string(), string)])
        );
    }

    /// supertype(a, b) laws: commutative, idempotent, and an upper bound.
    #[rstest]
    #[case::identical("int", "int")]
    #[case::file_tags("file", "file[in]")]
    #[case::lists("list[file]", "list[file[in]]")]
    #[case::unrelated("int", "string")]
    fn supertype_laws(#[case] left: &str, #[case] right: &str) {
        let mut ctx = TypeContext::new();
        let a = parse_type(&mut ctx, left);
        let b = parse_type(&mut ctx, right);

        assert_eq!(ctx.supertype(a, a), a);
        assert_eq!(ctx.supertype(a, b), ctx.supertype(b, a));

        let join = ctx.supertype(a, b);
        if join.valid() {
            assert!(ctx.is_subtype(a, join));
            assert!(ctx.is_subtype(b, join));
        }
    }

    fn parse_type(ctx: &mut TypeContext, name: &str) -> TypeId {
        match name {
            "int" => ctx.integer_type(),
            "string" => ctx.string_type(),
            "file" => ctx.file_type(),
            "file[in]" => ctx.input_file_type(),
            "list[file]" => ctx.file_list_type(),
            "list[file[in]]" => {
                let input = ctx.input_file_type();
                ctx.list_of(input)
            }
            _ => unreachable!("unknown test type {name}"),
        }
    }

    #[test]
    fn operator_result_types() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let string = ctx.string_type();
        let file = ctx.file_type();
        let strings = ctx.list_of(string);

        assert_eq!(ctx.on_add_to(int, int), int);
        assert_eq!(ctx.on_multiply(int, int), int);
        assert_eq!(ctx.on_add_to(string, string), string);
        assert_eq!(ctx.on_add_to(file, string), file);
        assert_eq!(ctx.on_prefix_with(file, string), file);
        assert_eq!(ctx.on_add_to(strings, strings), strings);
        assert_eq!(ctx.on_add_to(strings, string), strings);
        assert_eq!(ctx.on_prefix_with(strings, string), strings);

        assert_eq!(ctx.on_add_to(int, string), TypeId::NIL);
        assert_eq!(ctx.on_multiply(string, string), TypeId::NIL);
    }

    #[test]
    fn find_parameterises_on_demand() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let found = ctx.find("list", &[int]);
        let expected = ctx.list_of(int);
        assert_eq!(found, expected);

        let tag = ctx.find("in", &[]);
        let found = ctx.find("file", &[tag]);
        let expected = ctx.input_file_type();
        assert_eq!(found, expected);

        assert_eq!(ctx.find("no_such_type", &[]), TypeId::NIL);
    }

    #[test]
    fn invalid_file_tag_is_an_error() {
        let mut ctx = TypeContext::new();
        let int = ctx.integer_type();
        let result = ctx.parameterise("file", &[int], &SpanInfo::none());
        assert!(matches!(result, Err(FabError::InvalidFileTag(_))));
    }
}
