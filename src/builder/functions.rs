//! Function traversal and normalization.

use std::sync::Arc;

use crate::{
    builder::{
        defaults::fix_default_value,
        report::{RejectReason, RejectionCategory},
        traversal::visibility_of,
        BuildContext,
    },
    codemodel::{
        strip_template_arguments, Access, ArgumentModel, FunctionModel, FunctionModifiers,
        FunctionType, ReferenceType, ScopeModel,
    },
    meta::{
        is_operator_name, ClassAttributes, FunctionAttributes, FunctionKind, MetaArgument,
        MetaClassRc, MetaFunction, MetaType, PropertyRole, Visibility,
    },
    typesystem::{
        AccessModification, AllowThread, ExceptionHandling, FunctionModification,
    },
    Result,
};

/// Result of traversing one function declaration.
pub(super) enum FunctionOutcome {
    /// The function was translated
    Built(MetaFunction),
    /// The declaration is not part of the exposed API
    Ignored,
    /// The function was dropped and recorded
    Rejected,
}

fn function_signature(model: &FunctionModel) -> String {
    let arguments: Vec<String> = model
        .arguments
        .iter()
        .map(|argument| argument.type_info.to_string())
        .collect();
    format!("{}({})", model.name, arguments.join(","))
}

/// `ReturnType Class::name(Args)`, used as rejection key and in diagnostics.
fn qualified_signature(model: &FunctionModel, class_name: &str) -> String {
    if class_name.is_empty() {
        format!("{} {}", model.return_type, function_signature(model))
    } else {
        format!(
            "{} {class_name}::{}",
            model.return_type,
            function_signature(model)
        )
    }
}

fn kind_of(function_type: FunctionType) -> FunctionKind {
    match function_type {
        FunctionType::Normal => FunctionKind::Normal,
        FunctionType::Constructor => FunctionKind::Constructor,
        FunctionType::CopyConstructor => FunctionKind::CopyConstructor,
        FunctionType::MoveConstructor => FunctionKind::MoveConstructor,
        FunctionType::Destructor => FunctionKind::Destructor,
        FunctionType::Signal => FunctionKind::Signal,
        FunctionType::Slot => FunctionKind::Slot,
    }
}

/// Classify constructors the front end reported as plain functions, and copy or move
/// constructors reported as plain constructors.
fn constructor_kind(model: &FunctionModel, class_name: &str, kind: FunctionKind) -> FunctionKind {
    let mut kind = kind;
    if kind == FunctionKind::Normal && strip_template_arguments(&model.name) == class_name {
        kind = FunctionKind::Constructor;
    }
    if kind != FunctionKind::Constructor {
        return kind;
    }

    let Some((first, rest)) = model.arguments.split_first() else {
        return kind;
    };
    let same_class = first.type_info.local_name() == class_name
        && first.type_info.indirections == 0
        && rest.iter().all(|argument| argument.default_value.is_some());
    if !same_class {
        return kind;
    }
    match first.type_info.reference {
        ReferenceType::LValueReference => FunctionKind::CopyConstructor,
        ReferenceType::RValueReference => FunctionKind::MoveConstructor,
        _ => kind,
    }
}

fn attributes_of(modifiers: FunctionModifiers) -> FunctionAttributes {
    let mut attributes = FunctionAttributes::empty();
    if modifiers.contains(FunctionModifiers::CONST) {
        attributes |= FunctionAttributes::CONST;
    }
    if modifiers.contains(FunctionModifiers::ABSTRACT) {
        attributes |= FunctionAttributes::ABSTRACT;
    }
    if modifiers.intersects(FunctionModifiers::VIRTUAL | FunctionModifiers::ABSTRACT) {
        attributes |= FunctionAttributes::VIRTUAL;
        if modifiers.contains(FunctionModifiers::OVERRIDE) {
            attributes |= FunctionAttributes::OVERRIDE;
        }
        if modifiers.contains(FunctionModifiers::FINAL) {
            attributes |= FunctionAttributes::FINAL_CPP;
        }
    } else {
        attributes |= FunctionAttributes::FINAL_IN_TARGET_LANG;
    }
    if modifiers.contains(FunctionModifiers::INVOKABLE) {
        attributes |= FunctionAttributes::INVOKABLE;
    }
    if modifiers.contains(FunctionModifiers::STATIC) {
        attributes |= FunctionAttributes::STATIC | FunctionAttributes::FINAL_IN_TARGET_LANG;
    }
    if modifiers.contains(FunctionModifiers::EXPLICIT) {
        attributes |= FunctionAttributes::EXPLICIT;
    }
    if modifiers.contains(FunctionModifiers::DEPRECATED) {
        attributes |= FunctionAttributes::DEPRECATED;
    }
    attributes
}

fn is_meta_object_helper(name: &str, class: &MetaClassRc) -> bool {
    name == "qt_check_for_QGADGET_macro"
        || name.starts_with("qt_meta")
        || (name == "metaObject" && class.qualified_name() != "QObject")
}

/// Apply argument renames, then name the remaining unnamed arguments `arg__N`.
pub(super) fn fix_argument_names(function: &mut MetaFunction, modifications: &[FunctionModification]) {
    for modification in modifications {
        for argument_modification in &modification.argument_modifications {
            let Some(renamed) = &argument_modification.renamed_to else {
                continue;
            };
            let Some(argument) = argument_modification
                .index
                .checked_sub(1)
                .and_then(|index| function.arguments.get_mut(index))
            else {
                continue;
            };
            argument.original_name = std::mem::replace(&mut argument.name, renamed.clone());
        }
    }

    for (index, argument) in function.arguments.iter_mut().enumerate() {
        if argument.name.is_empty() {
            argument.name = format!("arg__{}", index + 1);
        }
    }
}

/// Default expression replacement and removal for argument `position` (1-based).
pub(super) fn default_modifications(
    modifications: &[FunctionModification],
    position: usize,
) -> (Option<String>, bool) {
    let mut replaced = None;
    let mut removed = false;
    for argument_modification in modifications
        .iter()
        .flat_map(|modification| &modification.argument_modifications)
        .filter(|argument_modification| argument_modification.index == position)
    {
        if let Some(expression) = &argument_modification.replaced_default_expression {
            replaced = Some(expression.clone());
        }
        removed |= argument_modification.remove_default_expression;
    }
    (replaced, removed)
}

/// Rename, access, final and deprecation edits. Later modifications win.
pub(super) fn apply_function_modifications(
    function: &mut MetaFunction,
    modifications: &[FunctionModification],
) {
    for modification in modifications {
        if modification.is_renamed() {
            if let Some(renamed) = &modification.renamed_to {
                function.name.clone_from(renamed);
            }
        }
        if let Some(access) = modification.access {
            function.visibility = match access {
                AccessModification::Private => Visibility::Private,
                AccessModification::Protected => Visibility::Protected,
                AccessModification::Public => Visibility::Public,
                AccessModification::Friendly => Visibility::Friendly,
            };
        }
        if modification.is_final() {
            function.attributes |= FunctionAttributes::FINAL_IN_TARGET_LANG;
        } else if modification.is_non_final() {
            function.attributes -= FunctionAttributes::FINAL_IN_TARGET_LANG;
        }
        if modification.is_deprecated() {
            function.attributes |= FunctionAttributes::DEPRECATED;
        }
    }
}

impl BuildContext<'_> {
    fn reject_function(&mut self, key: String, reason: RejectReason, detail: Option<String>) -> FunctionOutcome {
        tracing::debug!(function = %key, %reason, "function rejected");
        self.rejections
            .record(RejectionCategory::Function, &key, reason, detail);
        FunctionOutcome::Rejected
    }

    /// Translate a function declaration as a member of `class`, or as a free function.
    pub(super) fn traverse_function(
        &mut self,
        model: &FunctionModel,
        class: Option<&MetaClassRc>,
    ) -> FunctionOutcome {
        if model.has(FunctionModifiers::DELETED) || !model.template_parameters.is_empty() {
            return FunctionOutcome::Ignored;
        }
        if class.is_some_and(|class| is_meta_object_helper(&model.name, class)) {
            return FunctionOutcome::Ignored;
        }

        let class_name = class.map_or("", |class| class.qualified_name()).to_string();
        let key = qualified_signature(model, &class_name);

        if let Some(rule) = self.database.is_function_rejected(&class_name, &model.name) {
            return self.reject_function(key, RejectReason::GenerationDisabled, Some(rule));
        }
        if let Some(rule) = self
            .database
            .is_function_rejected(&class_name, &function_signature(model))
        {
            return self.reject_function(key, RejectReason::GenerationDisabled, Some(rule));
        }
        if model.has(FunctionModifiers::FRIEND) {
            return FunctionOutcome::Ignored;
        }
        if let Some(rule) = self
            .database
            .is_return_type_rejected(&class_name, &model.return_type.to_string())
        {
            return self.reject_function(key, RejectReason::GenerationDisabled, Some(rule));
        }
        for argument in &model.arguments {
            if let Some(rule) = self
                .database
                .is_argument_type_rejected(&class_name, &argument.type_info.to_string())
            {
                return self.reject_function(key, RejectReason::GenerationDisabled, Some(rule));
            }
        }
        if model.has(FunctionModifiers::DEPRECATED) && self.config.skip_deprecated {
            return self.reject_function(key, RejectReason::Deprecated, None);
        }

        let mut kind = kind_of(model.function_type);
        if let Some(class) = class {
            kind = constructor_kind(model, class.name(), kind);
        }

        let mut function = MetaFunction::new(&model.name, kind);
        function.attributes = attributes_of(model.modifiers);
        function.visibility = visibility_of(model.access);
        function.exception_specification = model.exception_specification;

        match kind {
            FunctionKind::Destructor => {}
            FunctionKind::Constructor | FunctionKind::CopyConstructor | FunctionKind::MoveConstructor => {
                if let Some(class) = class {
                    function.name = class.name().to_string();
                }
            }
            _ if model.return_type.is_void() => {}
            _ => match self.translate(&model.return_type, class) {
                Ok(return_type) => function.return_type = Some(return_type),
                Err(error) => {
                    tracing::warn!(
                        "skipping function '{key}', unmatched return type '{}': {error}",
                        model.return_type
                    );
                    return self.reject_function(key, RejectReason::UnmatchedReturnType, None);
                }
            },
        }

        let mut arguments: &[ArgumentModel] = &model.arguments;
        if let [only] = arguments {
            if only.type_info.is_void() {
                arguments = &[];
            }
        }

        let generates = class.map_or(true, |class| class.type_entry().generates_target_lang());
        for (index, argument) in arguments.iter().enumerate() {
            match self.translate(&argument.type_info, class) {
                Ok(argument_type) => {
                    let mut meta_argument = MetaArgument::new(&argument.name, argument_type, index);
                    meta_argument.original_default_value = argument.default_value.clone();
                    function.arguments.push(meta_argument);
                }
                Err(error) if argument.default_value.is_some() => {
                    if generates {
                        tracing::warn!(
                            "Stripping argument #{} of {key} due to unmatched type \"{}\" with default expression \"{}\": {error}",
                            index + 1,
                            argument.type_info,
                            argument.default_value.as_deref().unwrap_or_default()
                        );
                    }
                    break;
                }
                Err(error) => {
                    tracing::warn!(
                        "skipping function '{key}', unmatched parameter type '{}' (#{}): {error}",
                        argument.type_info,
                        index + 1
                    );
                    let detail = format!("unmatched parameter type '{}'", argument.type_info);
                    return self.reject_function(key, RejectReason::UnmatchedArgumentType, Some(detail));
                }
            }
        }

        if model.has(FunctionModifiers::VARIADIC) {
            if let Some(varargs) = self.database.find_type("...") {
                let mut varargs_type = MetaType::new(varargs);
                varargs_type.decide_usage_pattern();
                let index = function.arguments.len();
                function
                    .arguments
                    .push(MetaArgument::new("", varargs_type, index));
            }
        }

        if let Some(class) = class {
            function.set_owner(class);
        }
        let modifications = function.modifications(self.database);
        self.apply_argument_modifications(&mut function, &modifications, class);

        if let Some(class) = class {
            if function.original_name == "operator=" && function.arguments.len() == 1 {
                let argument_type = &function.arguments[0].argument_type;
                if Arc::ptr_eq(argument_type.type_entry(), class.type_entry())
                    && argument_type.indirections == 0
                {
                    match argument_type.reference {
                        ReferenceType::NoReference => {
                            function.kind = FunctionKind::AssignmentOperator;
                        }
                        ReferenceType::LValueReference if argument_type.is_const => {
                            function.kind = FunctionKind::AssignmentOperator;
                        }
                        ReferenceType::RValueReference => {
                            function.kind = FunctionKind::MoveAssignmentOperator;
                        }
                        ReferenceType::LValueReference => {}
                    }
                }
            }
        }

        FunctionOutcome::Built(function)
    }

    /// Policies, defaults, argument names and array usage from the function modifications.
    fn apply_argument_modifications(
        &self,
        function: &mut MetaFunction,
        modifications: &[FunctionModification],
        class: Option<&MetaClassRc>,
    ) {
        for modification in modifications {
            if modification.exception_handling != ExceptionHandling::Unspecified {
                function.exception_handling = modification.exception_handling;
            }
            if modification.allow_thread != AllowThread::Unspecified {
                function.allow_thread = modification.allow_thread;
            }
        }

        let class_name = class.map_or("", |class| class.qualified_name());
        let warn_unnamed = !function.is_operator_overload() && function.kind != FunctionKind::Signal;
        for index in 0..function.arguments.len() {
            let (replaced, removed) = default_modifications(modifications, index + 1);
            let argument = &mut function.arguments[index];
            let Some(expression) = argument.original_default_value.take() else {
                if let Some(replaced) = replaced.filter(|_| !removed) {
                    argument.default_value = Some(replaced);
                }
                continue;
            };

            let fixed = fix_default_value(&expression, &argument.argument_type, class);
            argument.original_default_value = Some(fixed.clone());
            argument.default_value = if removed {
                None
            } else {
                Some(replaced.unwrap_or(fixed))
            };

            let renamed = modifications.iter().any(|modification| {
                modification
                    .argument_modifications
                    .iter()
                    .any(|m| m.index == index + 1 && m.renamed_to.is_some())
            });
            if argument.default_value.is_some() && argument.name.is_empty() && warn_unnamed && !renamed {
                tracing::warn!(
                    "Argument {} on function '{class_name}::{}' has default expression but does not have name.",
                    index + 1,
                    function.minimal_signature()
                );
            }
        }

        for argument_modification in modifications
            .iter()
            .flat_map(|modification| &modification.argument_modifications)
        {
            let Some(argument) = argument_modification
                .index
                .checked_sub(1)
                .and_then(|index| function.arguments.get_mut(index))
            else {
                continue;
            };
            if argument_modification.removed {
                argument.removed = true;
            }
            if let Some(ownership) = argument_modification.ownership {
                argument.ownership = Some(ownership);
            }
            if argument_modification.array {
                if let Err(error) = argument.argument_type.apply_array_modification() {
                    tracing::warn!("While traversing {class_name}: {error}");
                }
            }
        }

        if !function.arguments.is_empty() {
            fix_argument_names(function, modifications);
        }
    }

    /// Give a conversion operator the return type spelled in its name.
    fn fix_conversion_return_type(&self, function: &mut MetaFunction) {
        let Some(spelled) = function.original_name.strip_prefix("operator ") else {
            return;
        };
        let spelled = spelled.trim().trim_end_matches('&').trim();
        let spelled = spelled.strip_prefix("const ").unwrap_or(spelled);
        let Some(entry) = self.database.find_type(spelled) else {
            return;
        };
        let mut return_type = MetaType::new(entry);
        return_type.decide_usage_pattern();
        function.return_type = Some(return_type);
    }

    /// Translate the functions of `scope` as members of `class`, then append the functions the
    /// rule database adds to it.
    pub(super) fn traverse_functions(&mut self, scope: &ScopeModel, class: &MetaClassRc) -> Result<()> {
        let property_specs = class.property_specs();
        let is_namespace = class.is_namespace();

        for model in &scope.functions {
            let mut function = match self.traverse_function(model, Some(class)) {
                FunctionOutcome::Built(function) => function,
                FunctionOutcome::Ignored => continue,
                FunctionOutcome::Rejected => {
                    if model.function_type == FunctionType::Constructor
                        || strip_template_arguments(&model.name) == class.name()
                    {
                        class.add_attributes(ClassAttributes::HAS_REJECTED_CONSTRUCTOR);
                        if model
                            .arguments
                            .first()
                            .map_or(true, |argument| argument.default_value.is_some())
                        {
                            class.add_attributes(ClassAttributes::HAS_REJECTED_DEFAULT_CONSTRUCTOR);
                        }
                    }
                    continue;
                }
            };

            if is_namespace {
                function.attributes |= FunctionAttributes::STATIC;
            }

            if function.is_destructor() {
                match function.visibility {
                    Visibility::Private => class.add_attributes(ClassAttributes::HAS_PRIVATE_DESTRUCTOR),
                    Visibility::Protected => {
                        class.add_attributes(ClassAttributes::HAS_PROTECTED_DESTRUCTOR);
                    }
                    _ => {}
                }
                if function.has(FunctionAttributes::VIRTUAL) {
                    class.add_attributes(ClassAttributes::HAS_VIRTUAL_DESTRUCTOR);
                    if function.visibility != Visibility::Private {
                        class.add_attributes(ClassAttributes::FORCE_SHELL_CLASS);
                    }
                }
                continue;
            }

            if function.kind == FunctionKind::Constructor && model.access == Access::Private {
                class.add_attributes(ClassAttributes::HAS_PRIVATE_CONSTRUCTOR);
                continue;
            }

            if function.kind != FunctionKind::Signal {
                for spec in &property_specs {
                    let Some(role) = spec.role_for(&function) else {
                        continue;
                    };
                    function.attributes |= match role {
                        PropertyRole::Reader => FunctionAttributes::PROPERTY_READER,
                        PropertyRole::Writer => FunctionAttributes::PROPERTY_WRITER,
                        PropertyRole::Resetter => FunctionAttributes::PROPERTY_RESETTER,
                    };
                    function.property_spec = Some(spec.clone());
                    break;
                }
            }

            let modifications = function.modifications(self.database);
            apply_function_modifications(&mut function, &modifications);

            if function.is_conversion_operator() {
                self.fix_conversion_return_type(&mut function);
            }
            if function.is_equals_operator() {
                class.add_attributes(ClassAttributes::HAS_EQUALS_OPERATOR);
            }
            if function.is_abstract() {
                class.add_attributes(ClassAttributes::ABSTRACT);
            }

            tracing::trace!(class = %class.qualified_name(), function = %function.name, "function added");
            class.add_function(Arc::new(function));
        }

        self.fill_added_functions(class)
    }

    /// Free functions declared by a generation-enabled function entry.
    pub(super) fn traverse_global_functions(&mut self) {
        let code_model = self.code_model;
        for model in &code_model.global().scope.functions {
            if model.access != Access::Public || is_operator_name(&model.name) {
                continue;
            }
            let Some(entry) = self.database.find_function_type(&model.name) else {
                continue;
            };
            if !entry.generate_code() {
                continue;
            }

            let FunctionOutcome::Built(mut function) = self.traverse_function(model, None) else {
                continue;
            };
            let signature = function.minimal_signature();
            if !entry.has_signature(&signature) {
                tracing::debug!(%signature, "global function signature not declared");
                continue;
            }

            let modifications = function.modifications(self.database);
            apply_function_modifications(&mut function, &modifications);
            function.type_entry = Some(entry.clone());
            self.includes.apply(&entry, model.file_name.as_deref());
            self.global_functions.push(Arc::new(function));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        builder::{RejectReason, RejectionCategory},
        codemodel::{
            Access, ArgumentModel, ClassModel, CodeModel, FunctionModel, FunctionModifiers,
            FunctionType,
        },
        meta::{ClassAttributes, FunctionAttributes, FunctionKind, Visibility},
        typesystem::{
            AccessModification, AllowThread, ArgumentModification, FunctionModification,
            PropertyDeclaration, RejectionMatch, TypeDatabase, TypeEntry, TypeRejection,
        },
        BuilderConfig, MetaBuilder, MetaModel,
    };

    fn build(database: TypeDatabase, code_model: &CodeModel) -> MetaModel {
        MetaBuilder::new(Arc::new(database)).build(code_model).unwrap()
    }

    /// Build without implicit constructors, so only declared functions show up.
    fn build_declared(database: TypeDatabase, code_model: &CodeModel) -> MetaModel {
        MetaBuilder::with_config(Arc::new(database), BuilderConfig::minimal())
            .build(code_model)
            .unwrap()
    }

    fn database() -> TypeDatabase {
        let database = TypeDatabase::new();
        database.add_type(TypeEntry::primitive("int"));
        database.add_type(TypeEntry::primitive("bool"));
        database
    }

    fn function(name: &str, return_type: &str) -> FunctionModel {
        FunctionModel::new(name, return_type).unwrap()
    }

    fn argument(name: &str, type_name: &str) -> ArgumentModel {
        ArgumentModel::new(name, type_name).unwrap()
    }

    #[test]
    fn test_constructors_named_after_class() {
        let database = database();
        database.add_type(TypeEntry::value("Gui::Point"));
        database.add_type(TypeEntry::namespace("Gui"));

        let mut code_model = CodeModel::new("point.h");
        code_model.global_mut().add_namespace(
            crate::codemodel::NamespaceModel::new("Gui").with_class(
                ClassModel::new("Point")
                    .with_function(FunctionModel::constructor("Point"))
                    .with_function(
                        FunctionModel::constructor("Point")
                            .with_argument(argument("other", "const Point&")),
                    )
                    .with_function(function("Point", "void").with_argument(argument("x", "int"))),
            ),
        );

        let model = build(database, &code_model);
        let point = model.find_class("Gui::Point").unwrap();
        let constructors = point.constructors();
        assert_eq!(constructors.len(), 3);
        assert!(constructors.iter().all(|c| c.name == "Point"));
        assert_eq!(constructors[1].kind, FunctionKind::CopyConstructor);
        assert!(point.has(ClassAttributes::HAS_NON_PRIVATE_CONSTRUCTOR));
    }

    #[test]
    fn test_rejection_keeps_siblings() {
        let database = database();
        database.add_type(TypeEntry::object("Widget"));

        let mut code_model = CodeModel::new("widget.h");
        code_model.global_mut().add_class(
            ClassModel::new("Widget")
                .with_function(function("show", "void"))
                .with_function(function("paint", "void").with_argument(argument("painter", "Painter*")))
                .with_function(function("handle", "Handle"))
                .with_function(function("hide", "void")),
        );

        let model = build_declared(database, &code_model);
        let widget = model.find_class("Widget").unwrap();
        let names: Vec<String> = widget.functions().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["show", "hide"]);

        let log = model.rejections();
        assert_eq!(
            log.find(RejectionCategory::Function, "void Widget::paint(Painter*)")
                .map(|r| r.reason),
            Some(RejectReason::UnmatchedArgumentType)
        );
        assert_eq!(
            log.find(RejectionCategory::Function, "Handle Widget::handle()")
                .map(|r| r.reason),
            Some(RejectReason::UnmatchedReturnType)
        );
    }

    #[test]
    fn test_rule_rejections_and_deprecation() {
        let database = database();
        database.add_type(TypeEntry::object("Widget"));
        database.add_rejection(TypeRejection::new(RejectionMatch::Function, "Widget", "secret").unwrap());
        database.add_rejection(TypeRejection::new(RejectionMatch::ArgumentType, "*", "bool").unwrap());

        let mut code_model = CodeModel::new("widget.h");
        code_model.global_mut().add_class(
            ClassModel::new("Widget")
                .with_function(function("secret", "void"))
                .with_function(function("setEnabled", "void").with_argument(argument("on", "bool")))
                .with_function(function("old", "void").with_modifiers(FunctionModifiers::DEPRECATED))
                .with_function(function("ok", "int")),
        );

        let strict = build_declared(database, &code_model);
        let widget = strict.find_class("Widget").unwrap();
        assert_eq!(widget.functions().len(), 1);
        let log = strict.rejections();
        assert_eq!(log.count(RejectionCategory::Function, RejectReason::GenerationDisabled), 2);
        assert_eq!(log.count(RejectionCategory::Function, RejectReason::Deprecated), 1);
    }

    #[test]
    fn test_deprecated_kept_by_default() {
        let database = database();
        database.add_type(TypeEntry::object("Widget"));
        let mut code_model = CodeModel::new("widget.h");
        code_model.global_mut().add_class(
            ClassModel::new("Widget")
                .with_function(function("old", "void").with_modifiers(FunctionModifiers::DEPRECATED)),
        );
        let model = build(database, &code_model);
        let old = model.find_class("Widget").unwrap().find_function("old").unwrap();
        assert!(old.has(FunctionAttributes::DEPRECATED));
    }

    #[test]
    fn test_argument_handling() {
        let database = database();
        database.add_type(TypeEntry::object("Widget").with_function_modification(
            FunctionModification::new("move(int,int,bool)")
                .with_argument(ArgumentModification::new(2).rename("top"))
                .with_argument(ArgumentModification::new(3).replace_default("true"))
                .with_allow_thread(AllowThread::Allow),
        ));

        let mut code_model = CodeModel::new("widget.h");
        code_model.global_mut().add_class(
            ClassModel::new("Widget")
                .with_function(function("clear", "void").with_argument(argument("", "void")))
                .with_function(
                    function("move", "void")
                        .with_argument(argument("left", "int"))
                        .with_argument(argument("", "int"))
                        .with_argument(argument("", "bool").with_default("0")),
                )
                .with_function(
                    function("resize", "void")
                        .with_argument(argument("w", "int"))
                        .with_argument(argument("hint", "Hint").with_default("Hint()")),
                ),
        );

        let model = build(database, &code_model);
        let widget = model.find_class("Widget").unwrap();
        assert!(widget.find_function("clear").unwrap().arguments.is_empty());

        let moved = widget.find_function("move").unwrap();
        let names: Vec<&str> = moved.arguments.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["left", "top", "arg__3"]);
        assert_eq!(moved.arguments[2].original_default_value.as_deref(), Some("false"));
        assert_eq!(moved.arguments[2].default_value.as_deref(), Some("true"));
        assert_eq!(moved.allow_thread, AllowThread::Allow);

        let resized = widget.find_function("resize").unwrap();
        assert_eq!(resized.arguments.len(), 1);
    }

    #[test]
    fn test_destructor_and_private_constructor_bookkeeping() {
        let database = database();
        database.add_type(TypeEntry::object("Singleton"));

        let mut code_model = CodeModel::new("singleton.h");
        code_model.global_mut().add_class(
            ClassModel::new("Singleton")
                .with_function(FunctionModel::constructor("Singleton").with_access(Access::Private))
                .with_function(
                    FunctionModel::destructor("Singleton")
                        .with_access(Access::Protected)
                        .with_modifiers(FunctionModifiers::VIRTUAL),
                )
                .with_function(function("instance", "Singleton*").with_modifiers(FunctionModifiers::STATIC)),
        );

        let model = build(database, &code_model);
        let class = model.find_class("Singleton").unwrap();
        assert!(class.has(ClassAttributes::HAS_PRIVATE_CONSTRUCTOR));
        assert!(class.has(ClassAttributes::HAS_PROTECTED_DESTRUCTOR));
        assert!(class.has(ClassAttributes::HAS_VIRTUAL_DESTRUCTOR));
        assert!(class.has(ClassAttributes::FORCE_SHELL_CLASS));
        assert!(!class.has_constructors());
        assert_eq!(class.functions().len(), 1);
        assert!(class.find_function("instance").unwrap().is_static());
    }

    #[test]
    fn test_rejected_constructor_flags() {
        let database = database();
        database.add_type(TypeEntry::object("Reader"));

        let mut code_model = CodeModel::new("reader.h");
        code_model.global_mut().add_class(
            ClassModel::new("Reader").with_function(
                FunctionModel::constructor("Reader").with_argument(argument("device", "Device*")),
            ),
        );

        let model = build(database, &code_model);
        let reader = model.find_class("Reader").unwrap();
        assert!(reader.has(ClassAttributes::HAS_REJECTED_CONSTRUCTOR));
        assert!(!reader.has(ClassAttributes::HAS_REJECTED_DEFAULT_CONSTRUCTOR));
        assert!(!reader.has_constructors());
    }

    #[test]
    fn test_property_roles_and_modifications() {
        let database = database();
        database.add_type(
            TypeEntry::object("Slider")
                .with_property(PropertyDeclaration::new("value", "int", "value").with_write("setValue"))
                .with_function_modification(
                    FunctionModification::new("setValue(int)")
                        .rename("setIntValue")
                        .with_access(AccessModification::Protected),
                ),
        );

        let mut code_model = CodeModel::new("slider.h");
        code_model.global_mut().add_class(
            ClassModel::new("Slider")
                .with_function(function("value", "int").with_modifiers(FunctionModifiers::CONST))
                .with_function(function("setValue", "void").with_argument(argument("v", "int")))
                .with_function(
                    function("area", "int")
                        .with_modifiers(FunctionModifiers::VIRTUAL | FunctionModifiers::ABSTRACT),
                )
                .with_function(function("operator==", "bool").with_argument(argument("o", "const Slider&"))),
        );

        let model = build(database, &code_model);
        let slider = model.find_class("Slider").unwrap();
        let reader = slider.find_function("value").unwrap();
        let writer = slider.find_function("setIntValue").unwrap();
        assert!(reader.has(FunctionAttributes::PROPERTY_READER));
        assert!(writer.has(FunctionAttributes::PROPERTY_WRITER));
        assert_eq!(writer.visibility, Visibility::Protected);
        assert_eq!(writer.original_name, "setValue");
        assert!(Arc::ptr_eq(
            reader.property_spec.as_ref().unwrap(),
            writer.property_spec.as_ref().unwrap()
        ));
        assert!(slider.has(ClassAttributes::ABSTRACT));
        assert!(slider.has(ClassAttributes::HAS_EQUALS_OPERATOR));
        assert!(reader.has(FunctionAttributes::FINAL_IN_TARGET_LANG));
        assert!(!slider.find_function("area").unwrap().has(FunctionAttributes::FINAL_IN_TARGET_LANG));
    }

    #[test]
    fn test_assignment_and_meta_object_helpers() {
        let database = database();
        database.add_type(TypeEntry::value("Size"));

        let mut code_model = CodeModel::new("size.h");
        code_model.global_mut().add_class(
            ClassModel::new("Size")
                .with_function(function("operator=", "Size&").with_argument(argument("o", "const Size&")))
                .with_function(function("operator=", "Size&").with_argument(argument("o", "Size&&")))
                .with_function(function("qt_metacall", "int"))
                .with_function(function("metaObject", "int"))
                .with_function(function("swap", "void").with_template_parameter("T"))
                .with_function(
                    function("detach", "void").with_modifiers(FunctionModifiers::DELETED),
                ),
        );

        let model = build(database, &code_model);
        let size = model.find_class("Size").unwrap();
        let kinds: Vec<FunctionKind> = size
            .functions()
            .iter()
            .filter(|f| !f.is_constructor())
            .map(|f| f.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![FunctionKind::AssignmentOperator, FunctionKind::MoveAssignmentOperator]
        );
        assert!(model.rejections().is_empty());
    }

    #[test]
    fn test_global_functions() {
        let database = database();
        database.add_type(TypeEntry::function("qAbs", &["qAbs(int)"]));
        database.add_type(TypeEntry::function("qMax", &["qMax(int,int)"]));

        let mut code_model = CodeModel::new("global.h");
        let global = code_model.global_mut();
        global.add_function(function("qAbs", "int").with_argument(argument("v", "int")));
        global.add_function(function("qAbs", "int").with_argument(argument("v", "bool")));
        global.add_function(
            function("qMax", "int")
                .with_argument(argument("a", "int"))
                .with_argument(argument("b", "int"))
                .with_access(Access::Private),
        );
        global.add_function(function("undeclared", "void"));

        let model = build(database, &code_model);
        let functions = model.global_functions();
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].minimal_signature(), "qAbs(int)");
        assert!(functions[0].type_entry.is_some());
        assert!(functions[0].implementing_class().is_none());
    }

    #[test]
    fn test_signal_kind_kept() {
        let database = database();
        database.add_type(TypeEntry::object("Button").qobject());
        let mut code_model = CodeModel::new("button.h");
        code_model.global_mut().add_class(
            ClassModel::new("Button")
                .with_function(function("clicked", "void").with_type(FunctionType::Signal)),
        );
        let model = build(database, &code_model);
        let clicked = model.find_class("Button").unwrap().find_function("clicked").unwrap();
        assert_eq!(clicked.kind, FunctionKind::Signal);
    }
}
