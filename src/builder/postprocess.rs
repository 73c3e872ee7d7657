//! Completion passes run once inheritance is known.

use std::{collections::VecDeque, sync::Arc};

use crate::{
    builder::BuildContext,
    codemodel::ReferenceType,
    meta::{
        ClassAttributes, FunctionAttributes, FunctionKind, MetaArgument, MetaClassRc,
        MetaFunction, MetaType, Visibility,
    },
    typesystem::{AllowThread, CodeGeneration, ExceptionHandling, TypeEntryKind},
};

/// `(has public constructors or no private ones) and no private destructor`
fn is_constructible(class: &MetaClassRc) -> bool {
    (class.has(ClassAttributes::HAS_NON_PRIVATE_CONSTRUCTOR)
        || !class.has(ClassAttributes::HAS_PRIVATE_CONSTRUCTOR))
        && !class.has(ClassAttributes::HAS_PRIVATE_DESTRUCTOR)
}

fn ancestor_has_private_copy_constructor(class: &MetaClassRc) -> bool {
    let mut pending = vec![class.clone()];
    let mut seen: Vec<MetaClassRc> = Vec::new();
    while let Some(current) = pending.pop() {
        if seen.iter().any(|item| Arc::ptr_eq(item, &current)) {
            continue;
        }
        if current.has_private_copy_constructor() {
            return true;
        }
        pending.extend(current.base_classes());
        pending.extend(current.template_base_class());
        seen.push(current);
    }
    false
}

fn default_constructor(class: &MetaClassRc) -> MetaFunction {
    let mut function = MetaFunction::new(class.name(), FunctionKind::Constructor);
    function.attributes = FunctionAttributes::FINAL_IN_TARGET_LANG | FunctionAttributes::IMPLICIT;
    function.set_owner(class);
    function
}

fn default_copy_constructor(class: &MetaClassRc, private: bool) -> MetaFunction {
    let mut function = MetaFunction::new(class.name(), FunctionKind::CopyConstructor);
    function.attributes = FunctionAttributes::FINAL_IN_TARGET_LANG | FunctionAttributes::IMPLICIT;
    function.visibility = if private {
        Visibility::Private
    } else {
        Visibility::Public
    };

    let mut argument_type = MetaType::new(class.type_entry().clone());
    argument_type.is_const = true;
    argument_type.reference = ReferenceType::LValueReference;
    argument_type.decide_usage_pattern();
    function.arguments.push(MetaArgument::new("other", argument_type, 0));
    function.set_owner(class);
    function
}

fn copy_function(class: &MetaClassRc) -> Option<Arc<MetaFunction>> {
    class.functions().into_iter().find(|function| {
        matches!(
            function.kind,
            FunctionKind::CopyConstructor | FunctionKind::AssignmentOperator
        )
    })
}

impl BuildContext<'_> {
    /// Give classes the constructors C++ would declare implicitly.
    pub(super) fn add_default_constructors(&mut self) {
        for class in self.classes.all() {
            if !is_constructible(&class)
                || class.is_interface()
                || class.is_namespace()
                || class.has(ClassAttributes::HAS_REJECTED_CONSTRUCTOR)
            {
                continue;
            }
            if !class.has_constructors() {
                tracing::trace!(class = %class.qualified_name(), "implicit default constructor");
                class.add_function(Arc::new(default_constructor(&class)));
            }
            if class.type_entry().is_value()
                && !class.has(ClassAttributes::ABSTRACT)
                && class.copy_constructor().is_none()
            {
                let private = ancestor_has_private_copy_constructor(&class);
                class.add_function(Arc::new(default_copy_constructor(&class, private)));
            }
        }
    }

    /// Warn about rule database entries that the code model does not declare.
    pub(super) fn check_declared_entries(&mut self) {
        for entry in self.database.entries() {
            if entry.is_primitive() {
                continue;
            }
            match entry.kind() {
                TypeEntryKind::Value | TypeEntryKind::Object => {
                    if entry.generates_target_lang()
                        && self.database.is_class_rejected(entry.name()).is_none()
                        && self.find_class_by_entry(&entry).is_none()
                    {
                        tracing::warn!(
                            "type '{}' is specified in typesystem, but not defined. This could potentially lead to compilation errors.",
                            entry.name()
                        );
                    }
                }
                TypeEntryKind::Function if entry.generate_code() => {
                    for signature in entry.signatures() {
                        let defined = self
                            .global_functions
                            .iter()
                            .any(|function| function.minimal_signature() == *signature);
                        if !defined {
                            tracing::warn!(
                                "Global function '{signature}' is specified in typesystem, but not defined. This could potentially lead to compilation errors."
                            );
                        }
                    }
                }
                TypeEntryKind::Enum if entry.generates_target_lang() => {
                    let qualifier = entry.enum_qualifier().unwrap_or_default();
                    let found = if qualifier.is_empty() {
                        self.global_enums
                            .iter()
                            .any(|item| Arc::ptr_eq(item.type_entry(), &entry))
                    } else {
                        self.classes
                            .find_by_name(qualifier)
                            .is_some_and(|class| class.find_enum(entry.local_name()).is_some())
                    };
                    if !found {
                        entry.set_code_generation(CodeGeneration::NOTHING);
                        tracing::warn!(
                            "enum '{}' is specified in typesystem, but not declared",
                            entry.name()
                        );
                    }
                }
                _ => {}
            }
        }
    }

    /// Warn about function modifications that match no function of their class.
    pub(super) fn check_function_modifications(&mut self) {
        for class in self.classes.all() {
            let entry = class.type_entry();
            let Some(data) = entry.complex() else {
                continue;
            };
            let functions = class.functions();
            for modification in data.function_modifications() {
                let signature = modification.signature().trim();
                let name = signature.split('(').next().unwrap_or(signature);

                let mut candidates: Vec<String> = Vec::new();
                let found = functions.iter().any(|function| {
                    let owned = function
                        .implementing_class()
                        .is_some_and(|owner| Arc::ptr_eq(&owner, &class));
                    if owned && modification.matches(&function.minimal_signature()) {
                        return true;
                    }
                    if function.original_name == name {
                        candidates.push(format!(
                            "{} in {}",
                            function.minimal_signature(),
                            function
                                .implementing_class()
                                .map_or_else(String::new, |owner| owner.name().to_string())
                        ));
                    }
                    false
                });
                if !found {
                    tracing::warn!(
                        "signature '{signature}' for function modification in '{}' not found. Possible candidates: {}",
                        class.qualified_name(),
                        candidates.join(", ")
                    );
                }
            }
        }
    }

    /// A class is clonable unless the nearest copy constructor or assignment operator, in the
    /// class or breadth first through its bases, is not public.
    pub(super) fn setup_clonable(&self, class: &MetaClassRc) {
        let mut clonable = true;
        if let Some(copy) = copy_function(class) {
            clonable = copy.visibility == Visibility::Public;
        } else {
            let mut queue: VecDeque<MetaClassRc> = class.base_class().into_iter().collect();
            queue.extend(class.interfaces());
            let mut visited = 0usize;
            while let Some(current) = queue.pop_front() {
                visited += 1;
                if visited > self.classes.len() + 1 {
                    break;
                }
                queue.extend(current.interfaces());
                queue.extend(current.base_class());
                if let Some(copy) = copy_function(&current) {
                    clonable = copy.visibility == Visibility::Public;
                    break;
                }
            }
        }
        if clonable {
            class.add_attributes(ClassAttributes::HAS_CLONE_OPERATOR);
        }
    }

    /// Register the conversion operators of `class` with the classes they convert to.
    pub(super) fn setup_external_conversion(&self, class: &MetaClassRc) {
        for function in class.functions() {
            if !function.is_conversion_operator() || function.is_modified_removed(self.database) {
                continue;
            }
            let Some(return_type) = &function.return_type else {
                continue;
            };
            if let Some(target) = self.find_class_by_entry(return_type.type_entry()) {
                target.add_external_conversion_operator(function.clone());
            }
        }
    }

    /// Resolve the effective exception and thread policies of every function: the function
    /// modification, then the class entry, then the bases, then the database default.
    pub(super) fn apply_policies(&self, classes: &[MetaClassRc]) {
        let global_exception_handling = self.database.exception_handling();
        let global_allow_thread = self.database.allow_thread();

        for class in classes {
            let (class_exception_handling, class_allow_thread) = class_policies(class);
            for function in class.functions() {
                let exception_handling = [function.exception_handling, class_exception_handling]
                    .into_iter()
                    .find(|policy| *policy != ExceptionHandling::Unspecified)
                    .unwrap_or(global_exception_handling);
                let allow_thread = [function.allow_thread, class_allow_thread]
                    .into_iter()
                    .find(|policy| *policy != AllowThread::Unspecified)
                    .unwrap_or(global_allow_thread);
                function.set_effective_policies(exception_handling, allow_thread);
            }
        }

        for function in &self.global_functions {
            let exception_handling = if function.exception_handling == ExceptionHandling::Unspecified {
                global_exception_handling
            } else {
                function.exception_handling
            };
            let allow_thread = if function.allow_thread == AllowThread::Unspecified {
                global_allow_thread
            } else {
                function.allow_thread
            };
            function.set_effective_policies(exception_handling, allow_thread);
        }
    }
}

/// Class level policies, falling back to the nearest base that declares one.
fn class_policies(class: &MetaClassRc) -> (ExceptionHandling, AllowThread) {
    let mut exception_handling = ExceptionHandling::Unspecified;
    let mut allow_thread = AllowThread::Unspecified;

    let mut queue: VecDeque<MetaClassRc> = VecDeque::from([class.clone()]);
    let mut visited: Vec<MetaClassRc> = Vec::new();
    while let Some(current) = queue.pop_front() {
        if visited.iter().any(|seen| Arc::ptr_eq(seen, &current)) {
            continue;
        }
        if let Some(data) = current.type_entry().complex() {
            if exception_handling == ExceptionHandling::Unspecified {
                exception_handling = data.exception_handling();
            }
            if allow_thread == AllowThread::Unspecified {
                allow_thread = data.allow_thread();
            }
        }
        if exception_handling != ExceptionHandling::Unspecified
            && allow_thread != AllowThread::Unspecified
        {
            break;
        }
        queue.extend(current.base_classes());
        visited.push(current);
    }
    (exception_handling, allow_thread)
}
