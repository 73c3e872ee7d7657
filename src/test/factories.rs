//! Ready-made rule databases, code models and classes.

use std::sync::Arc;

use crate::{
    codemodel::{
        Access, ArgumentModel, ClassModel, CodeModel, EnumKind, EnumModel, EnumeratorModel,
        FunctionModel, FunctionModifiers, NamespaceModel,
    },
    meta::{MetaClass, MetaClassRc},
    typesystem::{TypeDatabase, TypeEntry},
};

// Helper function to create a value class without members or links
pub fn value_class(qualified_name: &str) -> MetaClassRc {
    Arc::new(MetaClass::new(
        Arc::new(TypeEntry::value(qualified_name)),
        Vec::new(),
        Vec::new(),
    ))
}

// Helper function to create an object class without members or links
pub fn object_class(qualified_name: &str) -> MetaClassRc {
    Arc::new(MetaClass::new(
        Arc::new(TypeEntry::object(qualified_name)),
        Vec::new(),
        Vec::new(),
    ))
}

/// Rule database for a small widget library in namespace `Gui`.
///
/// Primitives `int`, `bool`, `char`, `double` and `QString`, the `QList` container, the
/// `Gui::Color` enum, value type `Gui::Size` and object types `Gui::Widget` and `Gui::Button`.
pub fn sample_database() -> TypeDatabase {
    let database = TypeDatabase::new();
    for primitive in ["int", "bool", "char", "double", "QString"] {
        database.add_type(TypeEntry::primitive(primitive));
    }
    database.add_type(TypeEntry::container("QList"));
    database.add_type(TypeEntry::namespace("Gui"));
    database.add_type(TypeEntry::enumeration("Gui::Color"));
    database.add_type(TypeEntry::value("Gui::Size"));
    database.add_type(TypeEntry::object("Gui::Widget"));
    database.add_type(TypeEntry::object("Gui::Button"));
    database
}

fn function(name: &str, return_type: &str) -> FunctionModel {
    FunctionModel::new(name, return_type).expect("fixture return type parses")
}

fn argument(name: &str, type_name: &str) -> ArgumentModel {
    ArgumentModel::new(name, type_name).expect("fixture argument type parses")
}

/// Code model matching [`sample_database`].
pub fn sample_code_model() -> CodeModel {
    let size = ClassModel::new("Size")
        .with_function(FunctionModel::constructor("Size"))
        .with_function(
            FunctionModel::constructor("Size")
                .with_argument(argument("width", "int"))
                .with_argument(argument("height", "int")),
        )
        .with_function(function("width", "int").with_modifiers(FunctionModifiers::CONST))
        .with_function(function("height", "int").with_modifiers(FunctionModifiers::CONST));

    let widget = ClassModel::new("Widget")
        .with_function(
            FunctionModel::constructor("Widget")
                .with_argument(argument("parent", "Widget*").with_default("nullptr")),
        )
        .with_function(FunctionModel::destructor("Widget").with_modifiers(FunctionModifiers::VIRTUAL))
        .with_function(function("size", "Size").with_modifiers(FunctionModifiers::CONST))
        .with_function(function("setSize", "void").with_argument(argument("size", "const Size&")))
        .with_function(function("color", "Color").with_modifiers(FunctionModifiers::CONST))
        .with_function(function("children", "QList<Widget*>").with_modifiers(FunctionModifiers::CONST))
        .with_function(
            function("paintEvent", "void")
                .with_modifiers(FunctionModifiers::VIRTUAL)
                .with_access(Access::Protected),
        );

    let button = ClassModel::new("Button")
        .with_base("Widget", Access::Public)
        .with_function(
            FunctionModel::constructor("Button")
                .with_argument(argument("text", "const QString&"))
                .with_argument(argument("parent", "Widget*").with_default("nullptr")),
        )
        .with_function(function("text", "QString").with_modifiers(FunctionModifiers::CONST))
        .with_function(function("setText", "void").with_argument(argument("text", "const QString&")));

    let mut code_model = CodeModel::new("gui.h");
    code_model.global_mut().add_namespace(
        NamespaceModel::new("Gui")
            .with_enum(
                EnumModel::new("Color", EnumKind::CEnum)
                    .with_enumerator(EnumeratorModel::new("Red", 0))
                    .with_enumerator(EnumeratorModel::new("Green", 1)),
            )
            .with_class(button)
            .with_class(widget)
            .with_class(size),
    );
    code_model
}
