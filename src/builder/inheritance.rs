//! Base classes, interfaces and template base instantiation.
//!
//! Every class is resolved at most once. A class whose only base is a template instantiation
//! such as `Container<Item>` inherits copies of the template members with the template
//! parameters replaced by the concrete arguments; members that would mention `void` are
//! dropped. Other bases are split into the primary base and interfaces.

use std::sync::Arc;

use crate::{
    builder::{BuildContext, InheritanceState},
    codemodel::TypeInfo,
    meta::{ClassAttributes, MetaClass, MetaClassRc, MetaClassRef, MetaField, MetaType},
    typesystem::{CodeGeneration, TypeEntry, TypeEntryRc},
};

/// Attributes a typedef instantiation takes over from its template.
const TYPEDEF_INHERITED: ClassAttributes = ClassAttributes::HAS_CLONE_OPERATOR
    .union(ClassAttributes::HAS_EQUALS_OPERATOR)
    .union(ClassAttributes::HAS_HASH_FUNCTION)
    .union(ClassAttributes::HAS_NON_PRIVATE_CONSTRUCTOR)
    .union(ClassAttributes::HAS_PRIVATE_DESTRUCTOR)
    .union(ClassAttributes::HAS_PROTECTED_DESTRUCTOR)
    .union(ClassAttributes::HAS_VIRTUAL_DESTRUCTOR);

/// Result of looking up a template base by name.
struct TemplateLookup {
    template: Option<MetaClassRc>,
    info: TypeInfo,
    container: Option<TypeEntryRc>,
}

/// Template parameter bindings of one instantiation.
struct Substitution<'a> {
    arguments: &'a [MetaType],
    max_depth: usize,
}

impl Substitution<'_> {
    /// Replace template parameters in `meta_type` by the bound arguments.
    ///
    /// Returns `None` when a parameter is bound to `void`, not bound at all, or nested deeper
    /// than `max_depth`.
    fn apply(&self, meta_type: &MetaType) -> Option<MetaType> {
        self.apply_at(meta_type, 0)
    }

    fn apply_at(&self, meta_type: &MetaType, depth: usize) -> Option<MetaType> {
        if depth > self.max_depth {
            tracing::warn!(
                "template substitution of '{meta_type}' exceeds depth {}",
                self.max_depth
            );
            return None;
        }
        let entry = meta_type.type_entry();
        if !entry.is_template_argument() && meta_type.instantiations().is_empty() {
            return Some(meta_type.clone());
        }

        let mut result = meta_type.clone();
        result.set_original_template_type(meta_type.clone());

        if entry.is_template_argument() {
            let argument = self.arguments.get(entry.ordinal()?)?;
            if argument.type_entry().is_void() {
                return None;
            }
            result.set_type_entry(argument.type_entry().clone());
            result.indirections += argument.indirections;
            result.clear_instantiations();
            for instantiation in argument.instantiations() {
                result.instantiations_mut().push(instantiation.clone());
            }
            result.decide_usage_pattern();
            return self.apply_at(&result, depth + 1);
        }

        let instantiations: Option<Vec<MetaType>> = meta_type
            .instantiations()
            .iter()
            .map(|instantiation| self.apply_at(instantiation, depth + 1))
            .collect();
        *result.instantiations_mut() = instantiations?;
        Some(result)
    }
}

impl BuildContext<'_> {
    /// Resolve the bases of `class`. Returns false if a base could not be found.
    pub(super) fn setup_inheritance(&mut self, class: &MetaClassRc) -> bool {
        let key = Self::inheritance_key(class);
        match self.inheritance.get(&key) {
            Some(InheritanceState::Resolved) => return true,
            Some(InheritanceState::InProgress) => {
                tracing::trace!(class = %class.qualified_name(), "inheritance cycle re-entered");
                return true;
            }
            None => {}
        }
        self.inheritance.insert(key, InheritanceState::InProgress);
        let result = self.resolve_bases(class);
        self.inheritance.insert(key, InheritanceState::Resolved);
        result
    }

    fn resolve_bases(&mut self, class: &MetaClassRc) -> bool {
        let base_names = class.base_class_names().to_vec();

        if let [base_name] = base_names.as_slice() {
            if base_name.contains('<') {
                return self.resolve_template_base(class, base_name);
            }
        }

        let mut resolved = true;
        let mut bases: Vec<MetaClassRc> = Vec::new();
        for name in &base_names {
            if self.database.is_class_rejected(name).is_some() {
                continue;
            }
            match self.find_class(name, Some(class)) {
                Some(base) => bases.push(base),
                None => {
                    tracing::warn!(
                        "class '{}' inherits from unknown base class '{name}'",
                        class.qualified_name()
                    );
                    resolved = false;
                }
            }
        }

        let candidates = bases
            .iter()
            .filter(|base| !base.type_entry().is_interface())
            .count();
        if candidates > 1 {
            tracing::warn!(
                "class '{}' has {candidates} primary base class candidates, using the last one",
                class.qualified_name()
            );
        }
        let primary = bases
            .iter()
            .rposition(|base| !base.type_entry().is_interface());
        for (index, base) in bases.iter().enumerate() {
            if !base.is_namespace() {
                self.setup_inheritance(base);
            }
            if Some(index) == primary {
                class.set_base_class(base);
                continue;
            }
            class.add_interface(base);
            for interface in base.interfaces() {
                class.add_interface(&interface);
            }
        }
        resolved
    }

    fn resolve_template_base(&mut self, class: &MetaClassRc, base_name: &str) -> bool {
        let lookup = self.find_template_class(base_name, class);
        if let Some(template) = lookup.template {
            self.setup_inheritance(&template);
            self.inherit_template(class, &template, &lookup.info);
            if let Some(data) = class.type_entry().complex() {
                data.set_base_container_type(template.type_entry().clone());
            }
            return true;
        }
        if let Some(container) = lookup.container {
            if let Some(data) = class.type_entry().complex() {
                data.set_base_container_type(container);
            }
            return true;
        }
        tracing::warn!(
            "template baseclass '{base_name}' of '{}' is not known",
            class.qualified_name()
        );
        false
    }

    /// Look `name` up as a template, trying the scopes around `context` innermost first.
    fn find_template_class(&self, name: &str, context: &MetaClass) -> TemplateLookup {
        let mut scope: Vec<&str> = context.qualified_name().split("::").collect();
        scope.pop();

        let mut lookup = TemplateLookup {
            template: None,
            info: TypeInfo::default(),
            container: None,
        };
        for depth in (0..=scope.len()).rev() {
            let complete_name = if depth == 0 {
                name.to_string()
            } else {
                format!("{}::{name}", scope[..depth].join("::"))
            };
            let info = match TypeInfo::parse(&complete_name) {
                Ok(info) => info,
                Err(error) => {
                    tracing::warn!(
                        "Unable to parse type \"{complete_name}\" while looking for template \"{name}\": {error}"
                    );
                    continue;
                }
            };
            let qualified = info.qualified_name_string();
            lookup.info = info;

            let template = self
                .templates
                .iter()
                .find(|template| template.type_entry().name() == qualified)
                .cloned()
                .or_else(|| self.classes.find_by_name(&qualified));
            if template.is_some() {
                lookup.template = template;
                return lookup;
            }
            if let Some(container) = self.database.find_container_type(&qualified) {
                lookup.container = Some(container);
            }
        }
        lookup
    }

    /// Entry for one template argument of an instantiation.
    fn template_argument_entry(
        &self,
        name: &str,
        subclass: &MetaClass,
        template: &MetaClass,
    ) -> Option<TypeEntryRc> {
        if !name.is_empty() && name.chars().all(|c| c.is_ascii_digit()) {
            if let Some(entry) = self.database.find_type(name) {
                return Some(entry);
            }
            let entry = TypeEntry::enum_value(name, name, None);
            entry.set_code_generation(CodeGeneration::NOTHING);
            return Some(self.database.add_type(entry));
        }

        let mut candidates = vec![
            format!("{}::{name}", subclass.qualified_name()),
            format!("{}::{name}", template.qualified_name()),
        ];
        if let Some(enclosing) = subclass.enclosing_class() {
            candidates.push(format!("{}::{name}", enclosing.qualified_name()));
        }
        candidates.push(name.to_string());
        candidates
            .iter()
            .find_map(|candidate| self.database.find_type(candidate))
    }

    fn inherit_template(&mut self, subclass: &MetaClassRc, template: &MetaClassRc, info: &TypeInfo) {
        if subclass.is_typedef() {
            subclass.add_attributes(template.attributes() & TYPEDEF_INHERITED);
        }

        let mut arguments: Vec<MetaType> = Vec::new();
        for argument in &info.instantiations {
            let name = argument.qualified_name_string();
            let Some(entry) = self.template_argument_entry(&name, subclass, template) else {
                tracing::warn!(
                    "Ignoring template parameter {name} from {info}. The corresponding type was not found in the typesystem."
                );
                continue;
            };
            let mut meta_type = MetaType::new(entry);
            meta_type.is_const = argument.is_const;
            meta_type.reference = argument.reference;
            meta_type.indirections = argument.indirections;
            meta_type.decide_usage_pattern();
            arguments.push(meta_type);
        }

        let substitution = Substitution {
            arguments: &arguments,
            max_depth: self.config.max_template_depth,
        };
        let subclass_entry = subclass.type_entry().clone();
        for function in template.functions() {
            if function.is_modified_removed(self.database) || subclass.has_function(&function.name) {
                continue;
            }
            if function.is_constructor() && !subclass.is_typedef() {
                continue;
            }

            let mut copy = (*function).clone();
            if let Some(return_type) = &function.return_type {
                let Some(substituted) = substitution.apply(return_type) else {
                    continue;
                };
                copy.return_type = Some(substituted);
            }
            copy.arguments.clear();
            for argument in &function.arguments {
                let Some(substituted) = substitution.apply(&argument.argument_type) else {
                    break;
                };
                let mut argument = argument.clone();
                argument.argument_type = substituted;
                copy.arguments.push(argument);
            }
            if copy.arguments.len() < function.arguments.len() {
                continue;
            }

            copy.set_owner(subclass);
            if copy.is_constructor() {
                copy.name = subclass.name().to_string();
                copy.original_name = subclass.name().to_string();
            }

            if let Some(data) = subclass_entry.complex() {
                let signature = copy.minimal_signature();
                for modification in function.modifications(self.database) {
                    data.add_function_modification(modification.for_signature(&signature));
                }
            }
            for argument_modification in copy
                .modifications(self.database)
                .iter()
                .flat_map(|modification| modification.argument_modifications.clone())
                .filter(|argument_modification| argument_modification.array)
            {
                let Some(argument) = argument_modification
                    .index
                    .checked_sub(1)
                    .and_then(|index| copy.arguments.get_mut(index))
                else {
                    continue;
                };
                if let Err(error) = argument.argument_type.apply_array_modification() {
                    tracing::warn!(
                        "While specializing {} ({}): {error}",
                        subclass.name(),
                        template.name()
                    );
                }
            }

            subclass.add_function(Arc::new(copy));
        }

        let template_entry = template.type_entry();
        for field in template.fields() {
            let removed = template_entry
                .field_modification(&field.name)
                .is_some_and(|modification| modification.is_removed());
            if removed || field.is_static || subclass.find_field(&field.name).is_some() {
                continue;
            }
            let Some(field_type) = substitution.apply(&field.field_type) else {
                continue;
            };
            let mut copy = MetaField::clone(&field);
            copy.field_type = field_type;
            copy.enclosing_class = Some(MetaClassRef::new(subclass));
            subclass.add_field(Arc::new(copy));
        }

        subclass.set_template_base(
            template,
            arguments.iter().map(|argument| argument.type_entry().clone()).collect(),
        );
        for interface in template.interfaces() {
            subclass.add_interface(&interface);
        }
        if let Some(base) = template.base_class() {
            subclass.set_base_class(&base);
        }
    }
}
