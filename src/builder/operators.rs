//! Free operator functions.
//!
//! Operators declared at namespace scope are moved into the class of the operand that provides
//! `self`. When that operand is the second one the function becomes a reverse operator. Stream
//! operators go to the stream class, or to the streamed class when the stream class is not
//! generated. `qHash` and `operator<<(QDebug, T)` only mark capabilities.

use std::sync::Arc;

use crate::{
    builder::{
        functions::{apply_function_modifications, FunctionOutcome},
        BuildContext,
    },
    codemodel::{Access, ArgumentModel, CodeModel, FunctionModel},
    meta::{ClassAttributes, FunctionAttributes, FunctionKind, MetaClassRc, Visibility},
};

/// Binary operators moved into classes, in lookup order.
const BINARY_OPERATORS: &[&str] = &[
    "operator==",
    "operator!=",
    "operator<=",
    "operator>=",
    "operator<",
    "operator+",
    "operator/",
    "operator*",
    "operator-",
    "operator&",
    "operator|",
    "operator^",
    "operator~",
    "operator>",
];

/// Operators that are unary when declared without arguments.
const AMBIGUOUS_OPERATORS: &[&str] = &["operator*", "operator&"];

impl BuildContext<'_> {
    /// The class created for the complex type of `argument`.
    fn argument_to_class(&self, argument: &ArgumentModel) -> Option<MetaClassRc> {
        let translated = self.translate(&argument.type_info, None).ok()?;
        let entry = translated.type_entry();
        if !entry.is_complex() {
            return None;
        }
        self.find_class_by_entry(entry)
    }

    /// Mark classes with a `qHash` overload as hashable.
    pub(super) fn register_hash_functions(&mut self) {
        let code_model = self.code_model;
        for function in code_model.global().scope.find_functions("qHash") {
            let [argument] = function.arguments.as_slice() else {
                continue;
            };
            if let Some(class) = self.argument_to_class(argument) {
                class.add_attributes(ClassAttributes::HAS_HASH_FUNCTION);
            }
        }
    }

    /// Mark classes streamable to `QDebug` as having a string representation.
    pub(super) fn register_to_string_capabilities(&mut self) {
        let code_model = self.code_model;
        for function in code_model.global().scope.find_functions("operator<<") {
            let [stream, argument] = function.arguments.as_slice() else {
                continue;
            };
            if stream.type_info.to_string() != "QDebug" || argument.type_info.indirections >= 2 {
                continue;
            }
            if let Some(class) = self.argument_to_class(argument) {
                class.add_attributes(ClassAttributes::HAS_TO_STRING_CAPABILITY);
            }
        }
    }

    /// Move the global binary and stream operators into their classes.
    pub(super) fn traverse_operators(&mut self) {
        let code_model = self.code_model;
        for model in global_functions_named(code_model, BINARY_OPERATORS) {
            self.traverse_operator_function(model);
        }
        for model in global_functions_named(code_model, &["operator<<", "operator>>"]) {
            self.traverse_stream_operator(model);
        }
    }

    fn traverse_operator_function(&mut self, model: &FunctionModel) {
        if model.access != Access::Public {
            return;
        }
        let Some(first) = model.arguments.first() else {
            return;
        };

        let unary = model.arguments.len() == 1;
        let mut first_is_self = true;
        let mut home = self.argument_to_class(first);

        if !unary {
            let second = &model.arguments[1];
            match &home {
                Some(class) if class.type_entry().generates_target_lang() => {
                    let other = self.argument_to_class(second);
                    let return_entry = self
                        .translate(&model.return_type, None)
                        .ok()
                        .map(|ty| ty.type_entry().clone());
                    if let (Some(other), Some(return_entry)) = (other, return_entry) {
                        if (return_entry.is_value() || return_entry.is_object())
                            && !Arc::ptr_eq(&return_entry, class.type_entry())
                            && Arc::ptr_eq(&return_entry, other.type_entry())
                        {
                            home = self.find_class_by_entry(&return_entry);
                            first_is_self = false;
                        }
                    }
                }
                _ => {
                    home = self.argument_to_class(second);
                    first_is_self = false;
                }
            }
        }

        let Some(home) = home else {
            return;
        };
        let FunctionOutcome::Built(mut function) = self.traverse_function(model, Some(&home)) else {
            return;
        };
        if function.arguments.is_empty() {
            return;
        }

        if first_is_self || unary {
            let removed = function.arguments.remove(0);
            if !unary && removed.argument_type.indirections > 0 {
                function.attributes |= FunctionAttributes::POINTER_OPERATOR;
            }
        } else {
            if let Some(removed) = function.arguments.pop() {
                if removed.argument_type.indirections > 0 {
                    function.attributes |= FunctionAttributes::POINTER_OPERATOR;
                }
            }
            function.attributes |= FunctionAttributes::REVERSE_OPERATOR;
        }
        reindex(&mut function.arguments);

        function.kind = FunctionKind::Normal;
        function.visibility = Visibility::Public;
        let modifications = function.modifications(self.database);
        apply_function_modifications(&mut function, &modifications);
        tracing::trace!(
            class = %home.qualified_name(),
            operator = %function.name,
            reverse = function.is_reverse_operator(),
            "global operator moved into class"
        );
        home.add_function(Arc::new(function));
    }

    fn traverse_stream_operator(&mut self, model: &FunctionModel) {
        let [stream, streamed] = model.arguments.as_slice() else {
            return;
        };
        if model.access != Access::Public {
            return;
        }
        let (Some(stream_class), Some(streamed_class)) =
            (self.argument_to_class(stream), self.argument_to_class(streamed))
        else {
            return;
        };
        if !stream_class.is_stream() {
            return;
        }

        let FunctionOutcome::Built(mut function) = self.traverse_function(model, Some(&streamed_class))
        else {
            return;
        };
        if function.arguments.len() != 2 {
            return;
        }
        function.kind = FunctionKind::GlobalScope;

        let home = if stream_class.type_entry().generate_code() {
            function.arguments.remove(0);
            stream_class
        } else {
            function.arguments.pop();
            function.arguments.reverse();
            function.attributes |= FunctionAttributes::REVERSE_OPERATOR;
            streamed_class
        };
        reindex(&mut function.arguments);

        function.attributes |= FunctionAttributes::FINAL_IN_TARGET_LANG;
        function.visibility = Visibility::Public;
        function.set_owner(&home);
        let modifications = function.modifications(self.database);
        apply_function_modifications(&mut function, &modifications);
        home.add_function(Arc::new(function));
    }
}

/// Global functions named any of `names`, each once, in lookup order.
fn global_functions_named<'m>(code_model: &'m CodeModel, names: &[&str]) -> Vec<&'m FunctionModel> {
    let scope = &code_model.global().scope;
    let mut found: Vec<&FunctionModel> = Vec::new();
    for name in names {
        for function in scope.find_functions(name) {
            if AMBIGUOUS_OPERATORS.contains(name) && function.arguments.is_empty() {
                continue;
            }
            if !found.iter().any(|known| std::ptr::eq(*known, function)) {
                found.push(function);
            }
        }
    }
    found
}

fn reindex(arguments: &mut [crate::meta::MetaArgument]) {
    for (index, argument) in arguments.iter_mut().enumerate() {
        argument.index = index;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        codemodel::{ArgumentModel, ClassModel, CodeModel, FunctionModel},
        meta::{ClassAttributes, FunctionAttributes, FunctionKind, Visibility},
        typesystem::{AccessModification, CodeGeneration, FunctionModification, TypeDatabase, TypeEntry},
        MetaBuilder, MetaModel,
    };

    fn build(database: TypeDatabase, code_model: &CodeModel) -> MetaModel {
        MetaBuilder::new(Arc::new(database)).build(code_model).unwrap()
    }

    fn operator(name: &str, return_type: &str, arguments: &[&str]) -> FunctionModel {
        let mut function = FunctionModel::new(name, return_type).unwrap();
        for (index, type_name) in arguments.iter().enumerate() {
            function = function.with_argument(ArgumentModel::new(&format!("a{index}"), type_name).unwrap());
        }
        function
    }

    fn operator_names(model: &MetaModel, class: &str) -> Vec<String> {
        model
            .find_class(class)
            .unwrap()
            .functions()
            .iter()
            .filter(|f| f.is_operator_overload())
            .map(|f| f.minimal_signature())
            .collect()
    }

    fn matrix_database() -> TypeDatabase {
        let database = TypeDatabase::new();
        database.add_type(TypeEntry::primitive("double"));
        database.add_type(TypeEntry::value("Matrix"));
        database.add_type(TypeEntry::value("Vector"));
        database
    }

    fn matrix_model() -> CodeModel {
        let mut code_model = CodeModel::new("matrix.h");
        let global = code_model.global_mut();
        global.add_class(ClassModel::new("Matrix"));
        global.add_class(ClassModel::new("Vector"));
        code_model
    }

    #[test]
    fn test_reverse_operator() {
        let mut code_model = matrix_model();
        let global = code_model.global_mut();
        global.add_function(operator("operator*", "Matrix", &["double", "const Matrix&"]));
        global.add_function(operator("operator+", "Matrix", &["const Matrix&", "const Matrix&"]));

        let model = build(matrix_database(), &code_model);
        let matrix = model.find_class("Matrix").unwrap();

        let multiply = matrix.find_function("operator*").unwrap();
        assert_eq!(multiply.arguments.len(), 1);
        assert_eq!(multiply.arguments[0].argument_type.name(), "double");
        assert!(multiply.is_reverse_operator());
        assert_eq!(multiply.kind, FunctionKind::Normal);
        assert!(Arc::ptr_eq(&multiply.implementing_class().unwrap(), matrix));

        let add = matrix.find_function("operator+").unwrap();
        assert_eq!(add.arguments.len(), 1);
        assert!(!add.is_reverse_operator());
    }

    #[test]
    fn test_moved_operator_takes_member_modifications() {
        let mut code_model = matrix_model();
        let global = code_model.global_mut();
        global.add_function(operator("operator+", "Matrix", &["const Matrix&", "const Matrix&"]));
        global.add_function(operator("operator*", "Matrix", &["double", "const Matrix&"]));

        let database = TypeDatabase::new();
        database.add_type(TypeEntry::primitive("double"));
        database.add_type(TypeEntry::value("Vector"));
        database.add_type(
            TypeEntry::value("Matrix")
                .with_function_modification(
                    FunctionModification::new("operator+(const Matrix&)").rename("plus"),
                )
                .with_function_modification(
                    FunctionModification::new("operator*(double)")
                        .with_access(AccessModification::Protected),
                ),
        );

        let model = build(database, &code_model);
        let matrix = model.find_class("Matrix").unwrap();
        let plus = matrix.find_function("plus").unwrap();
        assert_eq!(plus.original_name, "operator+");
        assert!(matrix.find_function("operator+").is_none());

        let multiply = matrix.find_function("operator*").unwrap();
        assert!(multiply.is_reverse_operator());
        assert_eq!(multiply.visibility, Visibility::Protected);
    }

    #[test]
    fn test_return_type_selects_home_class() {
        let mut code_model = matrix_model();
        code_model.global_mut().add_function(operator(
            "operator*",
            "Matrix",
            &["const Vector&", "const Matrix&"],
        ));

        let model = build(matrix_database(), &code_model);
        assert!(operator_names(&model, "Vector").is_empty());
        let multiply = model
            .find_class("Matrix")
            .unwrap()
            .find_function("operator*")
            .unwrap();
        assert!(multiply.is_reverse_operator());
        assert_eq!(multiply.arguments[0].argument_type.name(), "Vector");
    }

    #[test]
    fn test_unary_and_pointer_operators() {
        let mut code_model = matrix_model();
        let global = code_model.global_mut();
        global.add_function(operator("operator-", "Matrix", &["const Matrix&"]));
        global.add_function(operator("operator==", "bool", &["Matrix*", "const Matrix&"]));
        global.add_function(operator("operator*", "Matrix", &[]));

        let database = matrix_database();
        database.add_type(TypeEntry::primitive("bool"));
        let model = build(database, &code_model);
        let matrix = model.find_class("Matrix").unwrap();

        let negate = matrix.find_function("operator-").unwrap();
        assert!(negate.arguments.is_empty());
        let equals = matrix.find_function("operator==").unwrap();
        assert!(equals.has(FunctionAttributes::POINTER_OPERATOR));
        assert_eq!(operator_names(&model, "Matrix").len(), 2);
    }

    #[test]
    fn test_stream_operators() {
        let database = matrix_database();
        database.add_type(TypeEntry::object("QDataStream").with_stream());
        database.add_type(
            TypeEntry::object("QTextStream")
                .with_stream()
                .with_code_generation(CodeGeneration::FOR_SUBCLASS),
        );

        let mut code_model = matrix_model();
        let global = code_model.global_mut();
        global.add_class(ClassModel::new("QDataStream"));
        global.add_class(ClassModel::new("QTextStream"));
        global.add_function(operator("operator<<", "QDataStream&", &["QDataStream&", "const Matrix&"]));
        global.add_function(operator("operator<<", "QTextStream&", &["QTextStream&", "const Matrix&"]));

        let model = build(database, &code_model);

        let data_stream = model.find_class("QDataStream").unwrap();
        let write = data_stream.find_function("operator<<").unwrap();
        assert_eq!(write.kind, FunctionKind::GlobalScope);
        assert_eq!(write.arguments.len(), 1);
        assert_eq!(write.arguments[0].argument_type.name(), "Matrix");

        let matrix = model.find_class("Matrix").unwrap();
        let text = matrix.find_function("operator<<").unwrap();
        assert!(text.is_reverse_operator());
        assert_eq!(text.arguments.len(), 1);
        assert_eq!(text.arguments[0].argument_type.name(), "QTextStream");
        assert!(text.has(FunctionAttributes::FINAL_IN_TARGET_LANG));
    }

    #[test]
    fn test_hash_and_to_string_capabilities() {
        let database = matrix_database();
        database.add_type(TypeEntry::primitive("uint"));
        database.add_type(TypeEntry::value("QDebug"));

        let mut code_model = matrix_model();
        let global = code_model.global_mut();
        global.add_class(ClassModel::new("QDebug"));
        global.add_function(operator("qHash", "uint", &["const Matrix&"]));
        global.add_function(operator("operator<<", "QDebug", &["QDebug", "const Vector&"]));

        let model = build(database, &code_model);
        let matrix = model.find_class("Matrix").unwrap();
        let vector = model.find_class("Vector").unwrap();
        assert!(matrix.has(ClassAttributes::HAS_HASH_FUNCTION));
        assert!(!matrix.has(ClassAttributes::HAS_TO_STRING_CAPABILITY));
        assert!(vector.has(ClassAttributes::HAS_TO_STRING_CAPABILITY));
    }
}
