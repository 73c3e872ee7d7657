//! Declaration and member passes over the code model.

use std::sync::Arc;

use crate::{
    builder::{
        report::{RejectReason, RejectionCategory},
        BuildContext,
    },
    codemodel::{
        strip_template_arguments, Access, ClassModel, EnumKind, EnumModel, NamespaceModel,
        ScopeModel, TypeDefModel, VariableModel,
    },
    meta::{
        ClassAttributes, MetaClass, MetaClassRc, MetaClassRef, MetaEnum, MetaEnumRc,
        MetaEnumValue, MetaField, PropertySpec, PropertyText, Visibility,
    },
    typesystem::{CodeGeneration, ModificationFlags, TypeEntry, TypeEntryKind, TypeEntryRc},
    Result,
};

pub(super) fn visibility_of(access: Access) -> Visibility {
    match access {
        Access::Public => Visibility::Public,
        Access::Protected => Visibility::Protected,
        Access::Private => Visibility::Private,
    }
}

impl BuildContext<'_> {
    /// Create the meta class for a namespace and everything declared in it.
    pub(super) fn traverse_namespace(
        &mut self,
        model: &NamespaceModel,
    ) -> Result<Option<MetaClassRc>> {
        let qualified = self.qualify(model.name());
        if let Some(rule) = self.database.is_class_rejected(&qualified) {
            self.rejections.record(
                RejectionCategory::Class,
                &qualified,
                RejectReason::GenerationDisabled,
                Some(rule),
            );
            return Ok(None);
        }
        let Some(entry) = self.database.find_namespace_type(&qualified) else {
            tracing::warn!("namespace '{qualified}' does not have a type entry");
            return Ok(None);
        };

        let key = self.scope_key(model.name());
        let class = Arc::new(MetaClass::new(entry, Vec::new(), Vec::new()));
        for item in &model.scope.enums {
            if let Some(meta_enum) = self.traverse_enum(item, Some(&class)) {
                class.add_enum(meta_enum);
            }
        }

        self.push_scope(&class, model.name());
        let result = self.traverse_namespace_declarations(model, &class);
        self.pop_scope();
        result?;

        self.includes
            .apply(class.type_entry(), model.scope.file_name.as_deref());
        self.scope_classes.insert(key, class.clone());
        Ok(Some(class))
    }

    fn traverse_namespace_declarations(
        &mut self,
        model: &NamespaceModel,
        namespace: &MetaClassRc,
    ) -> Result<()> {
        for item in &model.scope.classes {
            if let Some(class) = self.traverse_class(item)? {
                self.adopt_inner_class(namespace, &class);
            }
        }
        for item in &model.scope.typedefs {
            if let Some(class) = self.traverse_typedef(item)? {
                self.adopt_inner_class(namespace, &class);
            }
        }
        for item in &model.namespaces {
            if let Some(class) = self.traverse_namespace(item)? {
                self.adopt_inner_class(namespace, &class);
            }
        }
        Ok(())
    }

    fn adopt_inner_class(&mut self, parent: &MetaClassRc, class: &MetaClassRc) {
        class.set_enclosing_class(parent);
        parent.add_inner_class(class.clone());
        self.add_meta_class(class);
    }

    /// Decide whether a class declaration gets a meta class.
    fn class_entry(&self, qualified: &str) -> std::result::Result<TypeEntryRc, (RejectReason, Option<String>)> {
        if let Some(rule) = self.database.is_class_rejected(qualified) {
            return Err((RejectReason::GenerationDisabled, Some(rule)));
        }
        match self.database.find_complex_type(qualified) {
            Some(entry) if entry.code_generation() == CodeGeneration::NOTHING => {
                Err((RejectReason::GenerationDisabled, None))
            }
            Some(entry) => Ok(entry),
            None if self.database.find_type(qualified).is_some() => {
                Err((RejectReason::RedefinedToNotClass, None))
            }
            None => Err((RejectReason::NotInTypeSystem, None)),
        }
    }

    /// Create the meta class for a class declaration, with its enums, inner classes, typedefs
    /// and properties. Members follow in [`Self::traverse_class_members`].
    pub(super) fn traverse_class(&mut self, model: &ClassModel) -> Result<Option<MetaClassRc>> {
        let name = strip_template_arguments(model.name());
        let qualified = self.qualify(name);

        let entry = match self.class_entry(&qualified) {
            Ok(entry) => entry,
            Err((reason, detail)) => {
                tracing::debug!(class = %qualified, %reason, "class rejected");
                self.rejections
                    .record(RejectionCategory::Class, &qualified, reason, detail);
                return Ok(None);
            }
        };

        let template_arguments: Vec<TypeEntryRc> = model
            .template_parameters
            .iter()
            .enumerate()
            .map(|(ordinal, parameter)| Arc::new(TypeEntry::template_argument(parameter, ordinal)))
            .collect();
        let base_names: Vec<String> = model
            .base_classes
            .iter()
            .filter(|base| base.access == Access::Public)
            .map(|base| base.name.clone())
            .collect();

        let key = self.scope_key(name);
        let class = Arc::new(MetaClass::new(entry.clone(), base_names, template_arguments));
        if model.is_final {
            class.add_attributes(ClassAttributes::FINAL_CPP_CLASS);
        }
        if entry.complex().is_some_and(|data| data.stream()) {
            class.add_attributes(ClassAttributes::STREAM);
        }

        self.push_scope(&class, name);
        let result = self.traverse_class_declarations(model, &class);
        self.pop_scope();
        result?;

        self.includes.apply(&entry, model.scope.file_name.as_deref());
        self.scope_classes.insert(key, class.clone());
        Ok(Some(class))
    }

    fn traverse_class_declarations(&mut self, model: &ClassModel, class: &MetaClassRc) -> Result<()> {
        for item in &model.scope.enums {
            if let Some(meta_enum) = self.traverse_enum(item, Some(class)) {
                class.add_enum(meta_enum);
            }
        }
        for item in &model.scope.classes {
            if let Some(inner) = self.traverse_class(item)? {
                self.adopt_inner_class(class, &inner);
            }
        }
        for item in &model.scope.typedefs {
            if let Some(alias) = self.traverse_typedef(item)? {
                alias.set_enclosing_class(class);
                self.add_meta_class(&alias);
            }
        }
        self.traverse_properties(model, class);
        Ok(())
    }

    fn traverse_properties(&mut self, model: &ClassModel, class: &MetaClassRc) {
        let mut texts = Vec::new();
        for declaration in &model.property_declarations {
            match PropertyText::parse(declaration) {
                Ok(text) => texts.push(text),
                Err(error) => tracing::warn!(
                    "Unable to parse property '{declaration}' in class '{}': {error}",
                    class.qualified_name()
                ),
            }
        }
        if let Some(data) = class.type_entry().complex() {
            for declaration in data.property_declarations() {
                match PropertyText::from_declaration(declaration) {
                    Ok(text) => texts.push(text),
                    Err(error) => tracing::warn!(
                        "Unable to parse property '{}' in class '{}': {error}",
                        declaration.name,
                        class.qualified_name()
                    ),
                }
            }
        }

        for (index, text) in texts.into_iter().enumerate() {
            match self.translate(&text.type_info, Some(class)) {
                Ok(property_type) => {
                    class.add_property_spec(Arc::new(PropertySpec::new(text, property_type, index)));
                }
                Err(error) => {
                    tracing::warn!(
                        "Unable to decide type of property: '{}' in class '{}'",
                        text.type_info,
                        class.qualified_name()
                    );
                    tracing::debug!(%error, "property type lookup failed");
                }
            }
        }
    }

    /// Find the enum entry of an anonymous enum through the names of its enumerators.
    fn anonymous_enum_entry(&self, model: &EnumModel, scope: &str) -> Option<TypeEntryRc> {
        model.enumerators.iter().find_map(|enumerator| {
            let name = if scope.is_empty() {
                enumerator.name.clone()
            } else {
                format!("{scope}::{}", enumerator.name)
            };
            self.database
                .find_entries(&name)
                .into_iter()
                .find(|entry| entry.is_enum())
        })
    }

    /// Create the meta enum for an enum declared in `enclosing` or at global scope.
    pub(super) fn traverse_enum(
        &mut self,
        model: &EnumModel,
        enclosing: Option<&MetaClassRc>,
    ) -> Option<MetaEnumRc> {
        let scope = enclosing.map_or("", |class| class.qualified_name()).to_string();
        let mut qualified = if scope.is_empty() {
            model.name.clone()
        } else {
            format!("{scope}::{}", model.name)
        };

        let entry = if model.access == Access::Private {
            let entry = self
                .database
                .find_entries(&qualified)
                .into_iter()
                .find(|entry| entry.is_enum())
                .unwrap_or_else(|| self.database.add_type(TypeEntry::enumeration(&qualified)));
            Some(entry)
        } else if model.kind == EnumKind::AnonymousEnum || model.name.is_empty() {
            let entry = self.anonymous_enum_entry(model, &scope);
            if let Some(entry) = &entry {
                qualified = entry.name().to_string();
            }
            entry
        } else {
            self.database.find_type(&qualified)
        };

        if let Some(rule) = self.database.is_enum_rejected(&scope, &model.name) {
            if let Some(entry) = &entry {
                entry.set_code_generation(CodeGeneration::NOTHING);
            }
            self.rejections.record(
                RejectionCategory::Enum,
                &qualified,
                RejectReason::GenerationDisabled,
                Some(rule),
            );
            return None;
        }

        let Some(entry) = entry.filter(|entry| entry.is_enum()) else {
            if enclosing.map_or(true, |class| class.type_entry().generates_target_lang()) {
                tracing::warn!("enum '{qualified}' does not have a type entry or is not an enum");
            }
            self.rejections.record(
                RejectionCategory::Enum,
                &qualified,
                RejectReason::NotInTypeSystem,
                None,
            );
            return None;
        };

        let mut meta_enum = MetaEnum::new(entry.clone(), model.kind);
        meta_enum.signed = model.signed;
        meta_enum.visibility = visibility_of(model.access);
        meta_enum.enclosing_class = enclosing.map(MetaClassRef::new);
        if model.access == Access::Private {
            entry.set_code_generation(CodeGeneration::NOTHING);
        }

        let value_scope = match (scope.is_empty(), model.kind) {
            (true, EnumKind::EnumClass) => format!("{}::", entry.local_name()),
            (false, EnumKind::EnumClass) => format!("{scope}::{}::", entry.local_name()),
            (true, _) => String::new(),
            (false, _) => format!("{scope}::"),
        };
        for enumerator in &model.enumerators {
            meta_enum.values.push(MetaEnumValue {
                name: enumerator.name.clone(),
                value: enumerator.value,
                string_value: enumerator.expression.clone(),
            });
            self.register_enum_value(&format!("{value_scope}{}", enumerator.name), enumerator.value, &entry);
            if enumerator.value == 0 {
                entry.set_null_value(&enumerator.name);
            }
        }

        self.includes.apply(&entry, model.file_name.as_deref());
        Some(Arc::new(meta_enum))
    }

    fn register_enum_value(&self, name: &str, value: i64, enum_entry: &TypeEntryRc) {
        let known = self
            .database
            .find_entries(name)
            .iter()
            .any(|entry| entry.kind() == TypeEntryKind::EnumValue);
        if !known {
            self.database.add_type(TypeEntry::enum_value(
                name,
                &value.to_string(),
                Some(enum_entry.clone()),
            ));
        }
    }

    /// Create the meta class for a typedef that the rule database declares as a class. A
    /// typedef to a primitive only links the two primitive entries.
    pub(super) fn traverse_typedef(&mut self, model: &TypeDefModel) -> Result<Option<MetaClassRc>> {
        let name = strip_template_arguments(&model.name);
        let qualified = self.qualify(name);

        if let Some(primitive) = self.database.find_primitive_type(&qualified) {
            let target = model
                .type_info
                .qualified_name
                .first()
                .and_then(|target| self.database.find_primitive_type(target));
            if let Some(target) = target.filter(|target| !Arc::ptr_eq(target, &primitive)) {
                primitive.set_referenced_primitive(target);
            }
            return Ok(None);
        }

        let Some(entry) = self.database.find_complex_type(&qualified) else {
            return Ok(None);
        };
        let class = Arc::new(MetaClass::typedef_alias(entry.clone(), &model.type_info.to_string()));
        self.includes.apply(&entry, model.file_name.as_deref());
        self.fill_added_functions(&class)?;
        Ok(Some(class))
    }

    /// Create classes for the typedef entries declared only in the rule database.
    pub(super) fn traverse_typesystem_typedefs(&mut self) -> Result<()> {
        for typedef in self.database.typedef_entries() {
            let (Some(target), Some(source)) = (typedef.typedef_target(), typedef.typedef_source())
            else {
                continue;
            };
            if self.find_class_by_entry(&target).is_some() {
                continue;
            }
            let class = Arc::new(MetaClass::typedef_alias(target, source));
            self.fill_added_functions(&class)?;
            self.add_meta_class(&class);
        }
        Ok(())
    }

    /// Second pass over a class declaration: fields, functions and inner class members.
    pub(super) fn traverse_class_members(&mut self, model: &ClassModel) -> Result<()> {
        let name = strip_template_arguments(model.name());
        let Some(class) = self.scope_classes.get(&self.scope_key(name)).cloned() else {
            return Ok(());
        };

        self.push_scope(&class, name);
        let result = self.traverse_class_member_declarations(model, &class);
        self.pop_scope();
        result
    }

    fn traverse_class_member_declarations(
        &mut self,
        model: &ClassModel,
        class: &MetaClassRc,
    ) -> Result<()> {
        self.traverse_fields(&model.scope, class);
        self.traverse_functions(&model.scope, class)?;
        for item in &model.scope.classes {
            self.traverse_class_members(item)?;
        }
        Ok(())
    }

    /// Second pass over a namespace: its functions become static members.
    pub(super) fn traverse_namespace_members(&mut self, model: &NamespaceModel) -> Result<()> {
        let Some(class) = self.scope_classes.get(&self.scope_key(model.name())).cloned() else {
            return Ok(());
        };

        self.push_scope(&class, model.name());
        let result = self.traverse_namespace_member_declarations(model, &class);
        self.pop_scope();
        result
    }

    fn traverse_namespace_member_declarations(
        &mut self,
        model: &NamespaceModel,
        namespace: &MetaClassRc,
    ) -> Result<()> {
        self.traverse_fields(&model.scope, namespace);
        self.traverse_functions(&model.scope, namespace)?;
        for item in &model.scope.classes {
            self.traverse_class_members(item)?;
        }
        for item in &model.namespaces {
            self.traverse_namespace_members(item)?;
        }
        Ok(())
    }

    fn traverse_fields(&mut self, scope: &ScopeModel, class: &MetaClassRc) {
        for variable in &scope.variables {
            if let Some(field) = self.traverse_field(variable, class) {
                class.add_field(Arc::new(field));
            }
        }
    }

    fn traverse_field(&mut self, model: &VariableModel, class: &MetaClassRc) -> Option<MetaField> {
        if model.is_friend || model.access == Access::Private {
            return None;
        }

        let class_name = class.qualified_name();
        if let Some(rule) = self.database.is_field_rejected(class_name, &model.name) {
            self.rejections.record(
                RejectionCategory::Field,
                &format!("{class_name}::{}", model.name),
                RejectReason::GenerationDisabled,
                Some(rule),
            );
            return None;
        }

        let field_type = match self.translate(&model.type_info, Some(class)) {
            Ok(field_type) => field_type,
            Err(error) => {
                if class.type_entry().generates_target_lang() {
                    tracing::warn!(
                        "skipping field '{}::{}' with unmatched type '{}'",
                        class.name(),
                        model.name,
                        model.type_info
                    );
                }
                tracing::debug!(%error, "field type lookup failed");
                return None;
            }
        };

        let mut field = MetaField::new(&model.name, field_type);
        field.visibility = visibility_of(model.access);
        field.is_static = model.is_static || class.is_namespace();
        field.enclosing_class = Some(MetaClassRef::new(class));

        if let Some(modification) = class.type_entry().field_modification(&model.name) {
            if modification.is_removed() {
                return None;
            }
            if let Some(renamed) = &modification.renamed_to {
                field.name.clone_from(renamed);
            }
            field.readable = modification.flags.contains(ModificationFlags::READABLE);
            field.writable = modification.flags.contains(ModificationFlags::WRITABLE);
        }
        Some(field)
    }
}
