//! Error reporting: every failure carries a labelled source span.

use crate::error::FabError;

use super::expect_error;

#[test]
fn undefined_name() {
    let error = expect_error("x = nobody;");
    assert!(matches!(error, FabError::UndefinedName(_)), "{error}");
}

#[test]
fn undefined_field() {
    let error = expect_error("r = record { a = 1; }; x = r.b;");
    assert!(matches!(error, FabError::NoSuchField(_)), "{error}");
}

#[test]
fn redefinition_in_same_scope() {
    let error = expect_error("x = 1; x = 2;");
    assert!(matches!(error, FabError::AlreadyDefined(_)), "{error}");
}

#[test]
fn division_by_zero() {
    let error = expect_error("x = 1 / 0;");
    assert!(matches!(error, FabError::DivisionByZero(_)), "{error}");
}

#[test]
fn invalid_operands() {
    let error = expect_error("x = 1 + 'one';");
    assert!(matches!(error, FabError::InvalidOperands(_)), "{error}");
}

#[test]
fn conditional_requires_boolean() {
    let error = expect_error("x = if 1 2 else 3;");
    assert!(matches!(error, FabError::WrongType(_)), "{error}");
}

#[test]
fn foreach_requires_a_sequence() {
    let error = expect_error("x = foreach i <- 42 i;");
    assert!(matches!(error, FabError::NotIterable(_)), "{error}");
}

#[test]
fn calling_a_non_callable() {
    let error = expect_error("x = 1; y = x(2);");
    assert!(matches!(error, FabError::NotCallable(_)), "{error}");
}

#[test]
fn missing_argument_without_default() {
    let error = expect_error("f = function(x: int): int x; y = f();");
    assert!(matches!(error, FabError::MissingArgument(_)), "{error}");
}

#[test]
fn unknown_keyword_argument() {
    let error = expect_error("f = function(x: int): int x; y = f(x = 1, z = 2);");
    assert!(matches!(error, FabError::UnknownArgument(_)), "{error}");
}

#[test]
fn positional_after_keyword() {
    let error = expect_error("f = function(x: int, y: int): int x; z = f(x = 1, 2);");
    assert!(matches!(error, FabError::PositionalAfterKeyword(_)), "{error}");
}

#[test]
fn too_many_positional_arguments() {
    let error = expect_error("f = function(x: int): int x; y = f(1, 2);");
    assert!(matches!(error, FabError::TooManyArguments(_)), "{error}");
}

#[test]
fn argument_type_mismatch() {
    let error = expect_error("f = function(x: int): int x; y = f('one');");
    assert!(matches!(error, FabError::WrongType(_)), "{error}");
}

#[test]
fn record_missing_required_field() {
    let error = expect_error(
        "f = function(r: record[a: int, b: int]): int 1;
         x = f(record { a = 1; });",
    );
    assert!(matches!(error, FabError::WrongType(_)), "{error}");
}

#[test]
fn function_result_type_mismatch() {
    let error = expect_error("f = function(x: int): string x; y = f(1);");
    assert!(matches!(error, FabError::WrongType(_)), "{error}");
}

#[test]
fn invalid_file_tag() {
    let error = expect_error("cc = action('cc' <- out: file[string]);");
    assert!(matches!(error, FabError::InvalidFileTag(_)), "{error}");
}

#[test]
fn unknown_file_tag_is_undefined() {
    let error = expect_error("cc = action('cc' <- out: file[weird]);");
    assert!(matches!(error, FabError::UndefinedName(_)), "{error}");
}

#[test]
fn action_requires_an_output() {
    let error = expect_error("cc = action('cc ${src}' <- src: file[in]);");
    assert!(matches!(error, FabError::NoOutputs(_)), "{error}");
}

#[test]
fn action_rejects_untagged_files() {
    let error = expect_error("cc = action('cc ${f}' <- f: file);");
    assert!(matches!(error, FabError::SemanticError(_)), "{error}");
}

#[test]
fn list_elements_need_a_common_supertype() {
    let error = expect_error("x = [1, 'one'];");
    assert!(matches!(error, FabError::NoCommonSupertype(_)), "{error}");
}

#[test]
fn explicit_type_mismatch() {
    let error = expect_error("x: int = 'one';");
    assert!(matches!(error, FabError::WrongType(_)), "{error}");
}

#[test]
fn import_of_missing_module() {
    let error = expect_error("m = import('no_such_module_anywhere');");
    assert!(matches!(error, FabError::ImportNotFound(_)), "{error}");
}

#[test]
fn syntax_errors_are_labelled() {
    let result = super::evaluate_source("x = ;");
    let Err(FabError::SyntaxError(error)) = result else {
        panic!("expected a syntax error");
    };
    assert!(!error.errors.is_empty());
}

#[test]
fn string_equality_is_byte_exact() {
    let (_, dag) = super::expect_dag(&format!(
        "a = '{0}' == '{0}'; b = '{0}' == '{1}';",
        "x\u{0}y", "x\u{0}z"
    ));

    assert_eq!(dag.variables()["a"].as_boolean(), Some(true));
    assert_eq!(dag.variables()["b"].as_boolean(), Some(false));
}

#[test]
fn loop_variable_type_mismatch() {
    let error = expect_error("x = foreach s: int <- ['a'] s;");
    assert!(matches!(error, FabError::WrongType(_)), "{error}");
}
