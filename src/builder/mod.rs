//! The meta model builder.
//!
//! [`MetaBuilder`] walks a [`CodeModel`] once per build and produces a [`MetaModel`]. All
//! lookups go through the shared [`TypeDatabase`]; a build registers a few derived entries in
//! it (enumerator values, private enums, numeric template arguments) and fills in lazily
//! computed entry data such as includes, so the same database can serve several builds.
//!
//! # Build Passes
//!
//! 1. **Declarations**: classes, namespaces, global enums and typedefs become meta classes and
//!    enums; properties are parsed
//! 2. **Members**: fields and functions of every class and namespace, followed by the
//!    functions the rule database adds
//! 3. **Global functions**: free functions declared by a function entry
//! 4. **Inheritance**: base classes, interfaces and template base instantiation
//! 5. **Completion**: implicit constructors, consistency warnings, hash and stream
//!    capabilities, global operators and modification checks
//! 6. **Ordering**: topological sort, clonability, external conversions, inner class order
//! 7. **Finishing**: global added functions and effective thread and exception policies
//!
//! # Error Handling
//!
//! Anything the model cannot represent is logged with `tracing` and recorded in the
//! [`RejectionLog`]; the build continues. Only an added function naming an unknown type and a
//! dependency cycle between classes abort the build.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use cppmeta::{
//!     codemodel::{ClassModel, CodeModel},
//!     typesystem::{TypeDatabase, TypeEntry},
//!     MetaBuilder,
//! };
//!
//! let database = TypeDatabase::new();
//! database.add_type(TypeEntry::value("Point"));
//!
//! let mut code_model = CodeModel::new("point.h");
//! code_model.global_mut().add_class(ClassModel::new("Point"));
//!
//! let model = MetaBuilder::new(Arc::new(database)).build(&code_model)?;
//! assert_eq!(model.classes().len(), 1);
//! assert!(model.classes()[0].has_constructors());
//! # Ok::<(), cppmeta::Error>(())
//! ```

mod added;
mod config;
mod defaults;
mod functions;
mod graph;
mod include;
mod inheritance;
mod operators;
mod postprocess;
mod report;
mod resolver;
mod traversal;

pub use config::BuilderConfig;
pub use graph::{sort_classes, ClassGraph};
pub use report::{RejectReason, RejectionCategory, RejectionLog, RejectionRecord};
pub use resolver::TypeResolver;

use std::{collections::HashMap, sync::Arc};

use crate::{
    codemodel::{CodeModel, TypeInfo},
    meta::{
        MetaClass, MetaClassRc, MetaClassRegistry, MetaEnumRc, MetaFunctionRc, MetaModel,
        MetaType,
    },
    typesystem::{TypeDatabase, TypeEntryKind, TypeEntryRc},
    Result,
};

use include::IncludeResolver;

/// Builds [`MetaModel`]s from code models against one rule database.
pub struct MetaBuilder {
    database: Arc<TypeDatabase>,
    config: BuilderConfig,
}

impl MetaBuilder {
    /// A builder with the default configuration.
    #[must_use]
    pub fn new(database: Arc<TypeDatabase>) -> Self {
        MetaBuilder {
            database,
            config: BuilderConfig::default(),
        }
    }

    /// A builder with an explicit configuration.
    #[must_use]
    pub fn with_config(database: Arc<TypeDatabase>, config: BuilderConfig) -> Self {
        MetaBuilder { database, config }
    }

    /// The rule database.
    #[must_use]
    pub fn database(&self) -> &TypeDatabase {
        &self.database
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build the meta model for `code_model`.
    ///
    /// ## Arguments
    /// * 'code_model' - The parsed translation unit
    ///
    /// # Errors
    /// Returns [`crate::Error::AddedFunction`] if a function added by the rule database names
    /// an unknown type and [`crate::Error::CyclicDependency`] if classes depend on each other
    /// in a cycle.
    #[tracing::instrument(skip_all, fields(file = code_model.file_name()))]
    pub fn build(&self, code_model: &CodeModel) -> Result<MetaModel> {
        let context = BuildContext::new(&self.database, &self.config, code_model);
        let model = context.run()?;
        tracing::debug!(
            classes = model.classes().len(),
            rejected = model.rejections().len(),
            "meta model built"
        );
        Ok(model)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InheritanceState {
    InProgress,
    Resolved,
}

/// State of one build.
struct BuildContext<'a> {
    database: &'a TypeDatabase,
    config: &'a BuilderConfig,
    code_model: &'a CodeModel,
    classes: MetaClassRegistry,
    templates: Vec<MetaClassRc>,
    smart_pointers: Vec<MetaClassRc>,
    global_functions: Vec<MetaFunctionRc>,
    global_enums: Vec<MetaEnumRc>,
    rejections: RejectionLog,
    /// Classes and namespaces by code model path, for the member pass
    scope_classes: HashMap<String, MetaClassRc>,
    inheritance: HashMap<usize, InheritanceState>,
    includes: IncludeResolver,
    class_stack: Vec<MetaClassRc>,
    scope_path: Vec<String>,
}

impl<'a> BuildContext<'a> {
    fn new(database: &'a TypeDatabase, config: &'a BuilderConfig, code_model: &'a CodeModel) -> Self {
        BuildContext {
            database,
            config,
            code_model,
            classes: MetaClassRegistry::new(),
            templates: Vec::new(),
            smart_pointers: Vec::new(),
            global_functions: Vec::new(),
            global_enums: Vec::new(),
            rejections: RejectionLog::new(),
            scope_classes: HashMap::new(),
            inheritance: HashMap::new(),
            includes: IncludeResolver::new(&config.header_paths, config.global_header.as_deref()),
            class_stack: Vec::new(),
            scope_path: Vec::new(),
        }
    }

    fn run(mut self) -> Result<MetaModel> {
        let global = self.code_model.global();

        for model in &global.scope.classes {
            if let Some(class) = self.traverse_class(model)? {
                self.add_meta_class(&class);
            }
        }
        for model in &global.namespaces {
            if let Some(class) = self.traverse_namespace(model)? {
                self.add_meta_class(&class);
            }
        }
        for model in &global.scope.enums {
            if let Some(item) = self.traverse_enum(model, None) {
                if item.type_entry().generate_code() {
                    self.global_enums.push(item);
                }
            }
        }
        for model in &global.scope.typedefs {
            if let Some(class) = self.traverse_typedef(model)? {
                self.add_meta_class(&class);
            }
        }
        self.traverse_typesystem_typedefs()?;

        for model in &global.scope.classes {
            self.traverse_class_members(model)?;
        }
        for model in &global.namespaces {
            self.traverse_namespace_members(model)?;
        }

        self.traverse_global_functions();

        for class in self.classes.all() {
            if !class.is_interface() && !class.is_namespace() {
                self.setup_inheritance(&class);
            }
        }

        if self.config.add_default_constructors {
            self.add_default_constructors();
        }
        self.check_declared_entries();
        self.register_hash_functions();
        self.register_to_string_capabilities();
        self.traverse_operators();
        self.check_function_modifications();

        let sorted = sort_classes(&self.classes.all())?;
        for class in &sorted {
            self.setup_clonable(class);
            self.setup_external_conversion(class);
        }
        for class in &sorted {
            let inner_classes = class.inner_classes();
            if class.type_entry().generate_code() && inner_classes.len() > 1 {
                class.set_inner_classes(graph::order_classes(&inner_classes)?);
            }
        }

        self.fill_global_added_functions()?;
        self.apply_policies(&sorted);

        let interfaces = self
            .classes
            .all()
            .into_iter()
            .filter(|class| class.is_interface())
            .collect();

        Ok(MetaModel::new(
            sorted,
            interfaces,
            self.templates,
            self.smart_pointers,
            self.global_functions,
            self.global_enums,
            self.rejections,
        ))
    }

    fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(self.database)
            .with_code_model(self.code_model)
            .with_classes(&self.classes)
            .with_global_enums(&self.global_enums)
            .with_limits(self.config.max_scope_depth, self.config.max_template_depth)
    }

    /// Translate a type as used inside `class` at the current code model scope.
    fn translate(&self, info: &TypeInfo, class: Option<&MetaClassRc>) -> Result<MetaType> {
        self.resolver().translate(info, class, &self.scope_path)
    }

    fn current_class(&self) -> Option<MetaClassRc> {
        self.class_stack.last().cloned()
    }

    fn push_scope(&mut self, class: &MetaClassRc, name: &str) {
        self.class_stack.push(class.clone());
        self.scope_path.push(name.to_string());
    }

    fn pop_scope(&mut self) {
        self.class_stack.pop();
        self.scope_path.pop();
    }

    /// `name` qualified with the class being traversed.
    fn qualify(&self, name: &str) -> String {
        match self.class_stack.last() {
            Some(class) => format!("{}::{name}", class.qualified_name()),
            None => name.to_string(),
        }
    }

    /// Code model path of `name` in the current scope.
    fn scope_key(&self, name: &str) -> String {
        if self.scope_path.is_empty() {
            name.to_string()
        } else {
            format!("{}::{name}", self.scope_path.join("::"))
        }
    }

    /// Register a class with the collection matching its entry kind.
    fn add_meta_class(&mut self, class: &MetaClassRc) {
        match class.type_entry().kind() {
            TypeEntryKind::Container => {
                if !self.templates.iter().any(|known| Arc::ptr_eq(known, class)) {
                    self.templates.push(class.clone());
                }
            }
            TypeEntryKind::SmartPointer => {
                if !self.smart_pointers.iter().any(|known| Arc::ptr_eq(known, class)) {
                    self.smart_pointers.push(class.clone());
                }
            }
            _ => self.classes.insert(class),
        }
    }

    /// Class, template or smart pointer created for `entry`.
    fn find_class_by_entry(&self, entry: &TypeEntryRc) -> Option<MetaClassRc> {
        self.classes.find_by_entry(entry).or_else(|| {
            self.templates
                .iter()
                .chain(&self.smart_pointers)
                .find(|class| Arc::ptr_eq(class.type_entry(), entry))
                .cloned()
        })
    }

    /// Class, template or smart pointer named `name` as seen from `context`.
    fn find_class(&self, name: &str, context: Option<&MetaClassRc>) -> Option<MetaClassRc> {
        if let Some(class) = self.resolver().find_class(name, context) {
            return Some(class);
        }
        let name = crate::codemodel::strip_template_arguments(name);
        self.templates
            .iter()
            .chain(&self.smart_pointers)
            .find(|class| class.qualified_name() == name)
            .cloned()
    }

    fn inheritance_key(class: &MetaClass) -> usize {
        std::ptr::from_ref(class) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codemodel::ClassModel,
        meta::{ClassAttributes, FunctionKind, UsagePattern},
        test::factories::{sample_code_model, sample_database},
        typesystem::TypeEntry,
    };

    #[test]
    fn test_empty_model() {
        let builder = MetaBuilder::new(Arc::new(TypeDatabase::new()));
        let model = builder.build(&CodeModel::new("empty.h")).unwrap();
        assert!(model.classes().is_empty());
        assert!(model.rejections().is_empty());
    }

    #[test]
    fn test_templates_kept_apart() {
        let database = TypeDatabase::new();
        database.add_type(TypeEntry::container("QList"));
        database.add_type(TypeEntry::smart_pointer("QSharedPointer"));
        database.add_type(TypeEntry::value("Point"));

        let mut code_model = CodeModel::new("types.h");
        code_model
            .global_mut()
            .add_class(ClassModel::new("QList<T>").with_template_parameter("T"));
        code_model
            .global_mut()
            .add_class(ClassModel::new("QSharedPointer<T>").with_template_parameter("T"));
        code_model.global_mut().add_class(ClassModel::new("Point"));

        let model = MetaBuilder::new(Arc::new(database)).build(&code_model).unwrap();
        assert_eq!(model.classes().len(), 1);
        assert_eq!(model.templates()[0].qualified_name(), "QList");
        assert_eq!(model.smart_pointers()[0].qualified_name(), "QSharedPointer");
        assert!(model.find_class("QList").unwrap().is_template());
    }

    #[test]
    fn test_sample_library() {
        let model = MetaBuilder::new(Arc::new(sample_database()))
            .build(&sample_code_model())
            .unwrap();

        let widget = model.find_class("Gui::Widget").unwrap();
        let button = model.find_class("Gui::Button").unwrap();
        let size = model.find_class("Gui::Size").unwrap();
        assert!(Arc::ptr_eq(&button.base_class().unwrap(), widget));
        assert!(model.position_of("Gui::Widget").unwrap() < model.position_of("Gui::Button").unwrap());
        assert!(model.position_of("Gui").unwrap() < model.position_of("Gui::Size").unwrap());

        assert!(widget.has(ClassAttributes::HAS_VIRTUAL_DESTRUCTOR));
        assert!(widget.find_function("~Widget").is_none());
        let color = widget.find_function("color").unwrap();
        assert_eq!(color.return_type.as_ref().unwrap().name(), "Gui::Color");
        let children = widget.find_function("children").unwrap();
        let children_type = children.return_type.as_ref().unwrap();
        assert_eq!(children_type.usage_pattern(), UsagePattern::Container);
        assert_eq!(children_type.instantiations()[0].name(), "Gui::Widget");

        let kinds: Vec<FunctionKind> = size.constructors().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![FunctionKind::Constructor, FunctionKind::Constructor, FunctionKind::CopyConstructor]
        );
        assert!(size.has(ClassAttributes::HAS_CLONE_OPERATOR));
    }
}
