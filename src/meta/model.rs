use crate::{
    builder::RejectionLog,
    meta::{MetaClassRc, MetaEnumRc, MetaFunctionRc},
    typesystem::TypeEntryRc,
};

/// The finished model handed to generators.
///
/// `classes` is topologically sorted: every class comes after its enclosing class, its bases and
/// the classes its constructors default-construct by value. Container and smart pointer
/// templates are kept apart because generators instantiate them per use. Interfaces are held
/// separately too; they are never sorted but the model owns them so that
/// [`crate::meta::MetaClass::interfaces`] stays populated.
#[derive(Debug, Default)]
pub struct MetaModel {
    classes: Vec<MetaClassRc>,
    interfaces: Vec<MetaClassRc>,
    templates: Vec<MetaClassRc>,
    smart_pointers: Vec<MetaClassRc>,
    global_functions: Vec<MetaFunctionRc>,
    global_enums: Vec<MetaEnumRc>,
    rejections: RejectionLog,
}

impl MetaModel {
    pub(crate) fn new(
        classes: Vec<MetaClassRc>,
        interfaces: Vec<MetaClassRc>,
        templates: Vec<MetaClassRc>,
        smart_pointers: Vec<MetaClassRc>,
        global_functions: Vec<MetaFunctionRc>,
        global_enums: Vec<MetaEnumRc>,
        rejections: RejectionLog,
    ) -> Self {
        MetaModel {
            classes,
            interfaces,
            templates,
            smart_pointers,
            global_functions,
            global_enums,
            rejections,
        }
    }

    /// Sorted classes, including inner classes and namespaces.
    #[must_use]
    pub fn classes(&self) -> &[MetaClassRc] {
        &self.classes
    }

    /// Interface classes, in registration order.
    #[must_use]
    pub fn interfaces(&self) -> &[MetaClassRc] {
        &self.interfaces
    }

    /// Container templates.
    #[must_use]
    pub fn templates(&self) -> &[MetaClassRc] {
        &self.templates
    }

    /// Smart pointer templates.
    #[must_use]
    pub fn smart_pointers(&self) -> &[MetaClassRc] {
        &self.smart_pointers
    }

    /// Free functions exposed at global scope.
    #[must_use]
    pub fn global_functions(&self) -> &[MetaFunctionRc] {
        &self.global_functions
    }

    /// Enums declared at global scope.
    #[must_use]
    pub fn global_enums(&self) -> &[MetaEnumRc] {
        &self.global_enums
    }

    /// Entities left out of the model, with reasons.
    #[must_use]
    pub fn rejections(&self) -> &RejectionLog {
        &self.rejections
    }

    /// Class, interface, template or smart pointer by qualified name.
    #[must_use]
    pub fn find_class(&self, qualified_name: &str) -> Option<&MetaClassRc> {
        self.classes
            .iter()
            .chain(&self.interfaces)
            .chain(&self.templates)
            .chain(&self.smart_pointers)
            .find(|class| class.qualified_name() == qualified_name)
    }

    /// Class created for `entry`.
    #[must_use]
    pub fn find_class_by_entry(&self, entry: &TypeEntryRc) -> Option<&MetaClassRc> {
        self.classes
            .iter()
            .chain(&self.interfaces)
            .chain(&self.templates)
            .chain(&self.smart_pointers)
            .find(|class| std::sync::Arc::ptr_eq(class.type_entry(), entry))
    }

    /// Enum by qualified name, global or declared in a class.
    #[must_use]
    pub fn find_enum(&self, qualified_name: &str) -> Option<MetaEnumRc> {
        if let Some(item) = self
            .global_enums
            .iter()
            .find(|item| item.qualified_name() == qualified_name)
        {
            return Some(item.clone());
        }
        self.classes.iter().find_map(|class| {
            class
                .enums()
                .into_iter()
                .find(|item| item.qualified_name() == qualified_name)
        })
    }

    /// Global functions named `name`.
    #[must_use]
    pub fn find_global_functions(&self, name: &str) -> Vec<MetaFunctionRc> {
        self.global_functions
            .iter()
            .filter(|function| function.name == name)
            .cloned()
            .collect()
    }

    /// Position of a class in the sorted list.
    #[must_use]
    pub fn position_of(&self, qualified_name: &str) -> Option<usize> {
        self.classes
            .iter()
            .position(|class| class.qualified_name() == qualified_name)
    }
}
