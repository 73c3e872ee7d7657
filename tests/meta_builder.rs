//! End-to-end builds through the public API.

use std::{path::PathBuf, sync::Arc};

use cppmeta::{builder::TypeResolver, prelude::*};

fn function(name: &str, return_type: &str) -> FunctionModel {
    FunctionModel::new(name, return_type).unwrap()
}

fn argument(name: &str, type_name: &str) -> ArgumentModel {
    ArgumentModel::new(name, type_name).unwrap()
}

fn build(database: TypeDatabase, code_model: &CodeModel) -> MetaModel {
    MetaBuilder::new(Arc::new(database)).build(code_model).unwrap()
}

fn position(model: &MetaModel, name: &str) -> usize {
    model
        .position_of(name)
        .unwrap_or_else(|| panic!("{name} missing from the sorted classes"))
}

#[test]
fn resolution_is_idempotent() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::primitive("int"));
    database.add_type(TypeEntry::primitive("QString"));
    database.add_type(TypeEntry::container("QMap"));

    let resolver = TypeResolver::new(&database);
    let written = TypeInfo::parse("const QMap<QString, int>&").unwrap();
    let first = resolver.translate(&written, None, &[]).unwrap();
    let second = resolver.translate(&written, None, &[]).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.usage_pattern(), UsagePattern::Container);
    let arguments: Vec<&str> = first.instantiations().iter().map(|t| t.name()).collect();
    assert_eq!(arguments, vec!["QString", "int"]);
}

#[test]
fn constructors_carry_the_class_name() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::primitive("int"));
    database.add_type(TypeEntry::namespace("Geo"));
    database.add_type(TypeEntry::value("Geo::Point"));
    database.add_type(TypeEntry::object("Geo::Shape"));

    let mut code_model = CodeModel::new("geo.h");
    code_model.global_mut().add_namespace(
        NamespaceModel::new("Geo")
            .with_class(
                ClassModel::new("Point")
                    .with_function(FunctionModel::constructor("Point"))
                    .with_function(
                        FunctionModel::constructor("Point")
                            .with_argument(argument("x", "int"))
                            .with_argument(argument("y", "int")),
                    ),
            )
            .with_class(ClassModel::new("Shape")),
    );

    let model = build(database, &code_model);
    for class in model.classes() {
        for constructor in class.constructors() {
            assert_eq!(constructor.name, class.name());
        }
    }
    assert_eq!(model.find_class("Geo::Point").unwrap().constructors().len(), 3);
    assert_eq!(model.find_class("Geo::Shape").unwrap().constructors().len(), 1);
}

#[test]
fn sorted_classes_respect_dependencies() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::value("Window"));
    database.add_type(TypeEntry::value("Window::Frame"));
    database.add_type(TypeEntry::value("Style"));
    database.add_type(TypeEntry::object("Base"));
    database.add_type(TypeEntry::object("Derived"));

    let mut code_model = CodeModel::new("window.h");
    let global = code_model.global_mut();
    global.add_class(ClassModel::new("Derived").with_base("Base", Access::Public));
    global.add_class(
        ClassModel::new("Window")
            .with_class(ClassModel::new("Frame"))
            .with_function(
                FunctionModel::constructor("Window")
                    .with_argument(argument("style", "Style").with_default("Style()")),
            ),
    );
    global.add_class(ClassModel::new("Style"));
    global.add_class(ClassModel::new("Base"));

    let model = build(database, &code_model);
    assert!(position(&model, "Base") < position(&model, "Derived"));
    assert!(position(&model, "Window") < position(&model, "Window::Frame"));
    assert!(position(&model, "Style") < position(&model, "Window"));
}

#[test]
fn mutual_inheritance_fails_the_build() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::object("Chicken"));
    database.add_type(TypeEntry::object("Egg"));

    let mut code_model = CodeModel::new("cycle.h");
    let global = code_model.global_mut();
    global.add_class(ClassModel::new("Chicken").with_base("Egg", Access::Public));
    global.add_class(ClassModel::new("Egg").with_base("Chicken", Access::Public));

    let result = MetaBuilder::new(Arc::new(database)).build(&code_model);
    match result {
        Err(Error::CyclicDependency(cycle)) => {
            assert!(cycle.contains("Chicken"));
            assert!(cycle.contains("Egg"));
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("a cyclic hierarchy must not produce an ordering"),
    }
}

#[test]
fn rejected_function_leaves_siblings_alone() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::primitive("int"));
    database.add_type(TypeEntry::object("Widget"));

    let mut code_model = CodeModel::new("widget.h");
    code_model.global_mut().add_class(
        ClassModel::new("Widget")
            .with_function(function("width", "int"))
            .with_function(function("attach", "void").with_argument(argument("gadget", "Gadget*")))
            .with_function(function("setWidth", "void").with_argument(argument("width", "int"))),
    );

    let model = build(database, &code_model);
    let widget = model.find_class("Widget").unwrap();
    let names: Vec<String> = widget
        .functions()
        .iter()
        .filter(|f| !f.is_constructor())
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(names, vec!["width", "setWidth"]);
    assert_eq!(widget.find_function("setWidth").unwrap().arguments[0].name, "width");
    assert_eq!(
        model
            .rejections()
            .count(RejectionCategory::Function, RejectReason::UnmatchedArgumentType),
        1
    );
}

#[test]
fn free_operator_becomes_reverse_member() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::primitive("double"));
    database.add_type(TypeEntry::value("Matrix"));

    let mut code_model = CodeModel::new("matrix.h");
    let global = code_model.global_mut();
    global.add_class(ClassModel::new("Matrix"));
    global.add_function(
        function("operator+", "Matrix")
            .with_argument(argument("scalar", "double"))
            .with_argument(argument("matrix", "const Matrix&")),
    );

    let model = build(database, &code_model);
    let matrix = model.find_class("Matrix").unwrap();
    let plus = matrix.find_function("operator+").unwrap();
    assert_eq!(plus.arguments.len(), 1);
    assert_eq!(plus.arguments[0].argument_type.name(), "double");
    assert!(plus.is_reverse_operator());
    assert!(Arc::ptr_eq(&plus.implementing_class().unwrap(), matrix));
    assert!(model.global_functions().is_empty());
}

#[test]
fn void_instantiation_drops_members() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::primitive("int"));
    database.add_type(TypeEntry::container("Box"));
    database.add_type(TypeEntry::object("IntBox"));
    database.add_type(TypeEntry::object("VoidBox"));

    let mut code_model = CodeModel::new("box.h");
    let global = code_model.global_mut();
    global.add_class(
        ClassModel::new("Box<T>")
            .with_template_parameter("T")
            .with_function(function("foo", "T"))
            .with_function(function("size", "int")),
    );
    global.add_class(ClassModel::new("IntBox").with_base("Box<int>", Access::Public));
    global.add_class(ClassModel::new("VoidBox").with_base("Box<void>", Access::Public));

    let model = build(database, &code_model);
    let int_box = model.find_class("IntBox").unwrap();
    assert_eq!(
        int_box.find_function("foo").unwrap().return_type.as_ref().unwrap().name(),
        "int"
    );
    let void_box = model.find_class("VoidBox").unwrap();
    assert!(!void_box.has_function("foo"));
    assert!(void_box.has_function("size"));
}

#[test]
fn interfaces_are_never_primary() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::object("A"));
    database.add_type(TypeEntry::interface("I"));
    database.add_type(TypeEntry::object("D"));

    let mut code_model = CodeModel::new("d.h");
    let global = code_model.global_mut();
    global.add_class(ClassModel::new("I"));
    global.add_class(ClassModel::new("A"));
    global.add_class(
        ClassModel::new("D")
            .with_base("I", Access::Public)
            .with_base("A", Access::Public),
    );

    let model = build(database, &code_model);
    let d = model.find_class("D").unwrap();
    assert_eq!(d.base_class().unwrap().qualified_name(), "A");
    let interfaces: Vec<String> = d
        .interfaces()
        .iter()
        .map(|i| i.qualified_name().to_string())
        .collect();
    assert_eq!(interfaces, vec!["I"]);
    assert!(model.position_of("I").is_none());
    assert_eq!(model.interfaces().len(), 1);
    assert!(Arc::ptr_eq(model.find_class("I").unwrap(), &d.interfaces()[0]));
}

#[test]
fn property_accessors_share_a_spec() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::primitive("int"));
    database.add_type(
        TypeEntry::object("Counter")
            .with_property(PropertyDeclaration::new("value", "int", "value").with_write("setValue")),
    );

    let mut code_model = CodeModel::new("counter.h");
    code_model.global_mut().add_class(
        ClassModel::new("Counter")
            .with_function(function("value", "int").with_modifiers(FunctionModifiers::CONST))
            .with_function(function("setValue", "void").with_argument(argument("value", "int"))),
    );

    let model = build(database, &code_model);
    let counter = model.find_class("Counter").unwrap();
    let getter = counter.find_function("value").unwrap();
    let setter = counter.find_function("setValue").unwrap();
    assert!(getter.has(FunctionAttributes::PROPERTY_READER));
    assert!(setter.has(FunctionAttributes::PROPERTY_WRITER));
    assert!(Arc::ptr_eq(
        getter.property_spec.as_ref().unwrap(),
        setter.property_spec.as_ref().unwrap()
    ));
}

#[test]
fn anonymous_enum_found_through_later_enumerator() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::namespace("NS"));
    database.add_type(TypeEntry::enumeration("NS::GREEN"));

    let mut code_model = CodeModel::new("colors.h");
    code_model.global_mut().add_namespace(
        NamespaceModel::new("NS").with_enum(
            EnumModel::anonymous()
                .with_enumerator(EnumeratorModel::new("RED", 0))
                .with_enumerator(EnumeratorModel::new("GREEN", 1)),
        ),
    );

    let model = build(database, &code_model);
    let item = model.find_enum("NS::GREEN").unwrap();
    assert!(item.is_anonymous());
    assert_eq!(item.values.len(), 2);
    assert!(item.type_entry().generate_code());
}

#[test]
fn added_function_with_unknown_type_is_fatal() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::namespace("Paint"));
    database.add_type(TypeEntry::value("Paint::Color"));
    database.add_type(
        TypeEntry::object("Canvas")
            .with_added_function(AddedFunction::new("fill(Color)", "void").unwrap()),
    );

    let mut code_model = CodeModel::new("canvas.h");
    code_model.global_mut().add_class(ClassModel::new("Canvas"));

    let error = MetaBuilder::new(Arc::new(database))
        .build(&code_model)
        .unwrap_err();
    let message = error.to_string();
    assert!(message.contains("fill"), "{message}");
    assert!(matches!(error, Error::AddedFunction { .. }));
}

#[test]
fn includes_follow_header_paths() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::object("Widget"));
    database.add_type(TypeEntry::object("Global"));

    let mut code_model = CodeModel::new("/project/include/global.h");
    let global = code_model.global_mut();
    global.add_class(ClassModel::new("Widget").with_file("/project/include/gui/widget.h"));
    global.add_class(ClassModel::new("Global").with_file("/project/include/global.h"));

    let config = BuilderConfig::default()
        .with_header_paths(vec![PathBuf::from("/project/include")])
        .with_global_header("/project/include/global.h");
    let model = MetaBuilder::with_config(Arc::new(database), config)
        .build(&code_model)
        .unwrap();

    let widget = model.find_class("Widget").unwrap();
    assert_eq!(widget.type_entry().include(), Some("gui/widget.h"));
    assert_eq!(model.find_class("Global").unwrap().type_entry().include(), None);
}

#[test]
fn deprecated_functions_follow_config() {
    let source = || {
        let mut code_model = CodeModel::new("legacy.h");
        code_model.global_mut().add_class(
            ClassModel::new("Legacy")
                .with_function(function("old", "void").with_modifiers(FunctionModifiers::DEPRECATED))
                .with_function(function("current", "void")),
        );
        code_model
    };
    let database = || {
        let database = TypeDatabase::new();
        database.add_type(TypeEntry::object("Legacy"));
        Arc::new(database)
    };

    let lenient = MetaBuilder::new(database()).build(&source()).unwrap();
    let legacy = lenient.find_class("Legacy").unwrap();
    assert!(legacy.find_function("old").unwrap().has(FunctionAttributes::DEPRECATED));

    let strict = MetaBuilder::with_config(database(), BuilderConfig::strict())
        .build(&source())
        .unwrap();
    assert!(!strict.find_class("Legacy").unwrap().has_function("old"));
    assert_eq!(
        strict
            .rejections()
            .count(RejectionCategory::Function, RejectReason::Deprecated),
        1
    );
}

#[test]
fn bool_defaults_keep_named_constants() {
    let database = TypeDatabase::new();
    database.add_type(TypeEntry::primitive("bool"));
    database.add_type(TypeEntry::object("Panel"));

    let mut code_model = CodeModel::new("panel.h");
    code_model.global_mut().add_class(
        ClassModel::new("Panel")
            .with_function(
                function("show", "void")
                    .with_argument(argument("on", "bool").with_default("kDefaultOn")),
            )
            .with_function(
                function("hide", "void").with_argument(argument("now", "bool").with_default("1")),
            ),
    );

    let model = build(database, &code_model);
    let panel = model.find_class("Panel").unwrap();
    let show = panel.find_function("show").unwrap();
    assert_eq!(show.arguments[0].default_value.as_deref(), Some("kDefaultOn"));
    let hide = panel.find_function("hide").unwrap();
    assert_eq!(hide.arguments[0].default_value.as_deref(), Some("true"));
}
