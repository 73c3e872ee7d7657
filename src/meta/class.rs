use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, OnceLock, RwLock, Weak,
};

use bitflags::bitflags;

use crate::{
    meta::{FunctionKind, MetaEnumRc, MetaFieldRc, MetaFunctionRc, PropertySpec, Visibility},
    typesystem::TypeEntryRc,
};

/// A reference-counted pointer to a [`MetaClass`]
pub type MetaClassRc = Arc<MetaClass>;

/// A smart reference to a [`MetaClass`] that holds a weak reference, so base, interface and
/// enclosing links never keep a class alive or form ownership cycles.
#[derive(Clone, Debug)]
pub struct MetaClassRef {
    weak_ref: Weak<MetaClass>,
}

impl MetaClassRef {
    /// Create a new `MetaClassRef` from a strong reference
    pub fn new(strong_ref: &MetaClassRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the class, returning None if the class has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<MetaClassRc> {
        self.weak_ref.upgrade()
    }

    /// Get a strong reference to the class, panicking if the class has been dropped
    ///
    /// # Panics
    /// Panics if the class has been dropped and the weak reference cannot be upgraded.
    #[must_use]
    pub fn expect(&self, msg: &str) -> MetaClassRc {
        self.weak_ref.upgrade().expect(msg)
    }

    /// Check if the referenced class is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }

    /// Get the qualified name of the referenced class (if still alive)
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.upgrade().map(|c| c.qualified_name().to_string())
    }

    /// Returns true if both references point at the same class
    #[must_use]
    pub fn ptr_eq(&self, other: &MetaClassRef) -> bool {
        Weak::ptr_eq(&self.weak_ref, &other.weak_ref)
    }

    /// Returns true if this references `class`
    #[must_use]
    pub fn is(&self, class: &MetaClassRc) -> bool {
        std::ptr::eq(self.weak_ref.as_ptr(), Arc::as_ptr(class))
    }
}

impl From<MetaClassRc> for MetaClassRef {
    fn from(strong_ref: MetaClassRc) -> Self {
        Self::new(&strong_ref)
    }
}

bitflags! {
    /// Properties of a class collected during traversal.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassAttributes: u32 {
        /// Publicly visible
        const PUBLIC = 0x0000_0001;
        /// Declared `final`
        const FINAL_CPP_CLASS = 0x0000_0002;
        /// Cannot be subclassed from the target language
        const FINAL_IN_TARGET_LANG = 0x0000_0004;
        /// Has pure virtual functions
        const ABSTRACT = 0x0000_0008;
        /// Destructor is private
        const HAS_PRIVATE_DESTRUCTOR = 0x0000_0010;
        /// Destructor is protected
        const HAS_PROTECTED_DESTRUCTOR = 0x0000_0020;
        /// Destructor is virtual
        const HAS_VIRTUAL_DESTRUCTOR = 0x0000_0040;
        /// A shell wrapper is required
        const FORCE_SHELL_CLASS = 0x0000_0080;
        /// At least one constructor is private
        const HAS_PRIVATE_CONSTRUCTOR = 0x0000_0100;
        /// At least one constructor is not private
        const HAS_NON_PRIVATE_CONSTRUCTOR = 0x0000_0200;
        /// A constructor was rejected
        const HAS_REJECTED_CONSTRUCTOR = 0x0000_0400;
        /// A constructor callable without arguments was rejected
        const HAS_REJECTED_DEFAULT_CONSTRUCTOR = 0x0000_0800;
        /// Has `operator==`
        const HAS_EQUALS_OPERATOR = 0x0000_1000;
        /// A `qHash` overload exists
        const HAS_HASH_FUNCTION = 0x0000_2000;
        /// A debug stream operator exists
        const HAS_TO_STRING_CAPABILITY = 0x0000_4000;
        /// Can be copied through a public copy constructor or assignment operator
        const HAS_CLONE_OPERATOR = 0x0000_8000;
        /// Stream operators are attached to this class
        const STREAM = 0x0001_0000;
    }
}

/// One exposed class, struct or namespace.
///
/// Classes are shared as [`MetaClassRc`]; the model registry and the enclosing class hold the
/// strong references. Base, interface, template base and enclosing links are [`MetaClassRef`]s
/// set once the target exists. Declared members are kept in append-only vectors so that the
/// inheritance pass can add to a class that other classes already reference.
#[derive(Debug)]
pub struct MetaClass {
    name: String,
    type_entry: TypeEntryRc,
    attributes: AtomicU32,
    base_class_names: Vec<String>,
    template_arguments: Vec<TypeEntryRc>,
    is_typedef: bool,
    base_class: OnceLock<MetaClassRef>,
    enclosing_class: OnceLock<MetaClassRef>,
    template_base_class: OnceLock<MetaClassRef>,
    template_base_instantiations: OnceLock<Vec<TypeEntryRc>>,
    interfaces: boxcar::Vec<MetaClassRef>,
    functions: boxcar::Vec<MetaFunctionRc>,
    fields: boxcar::Vec<MetaFieldRc>,
    enums: boxcar::Vec<MetaEnumRc>,
    inner_classes: RwLock<Vec<MetaClassRc>>,
    property_specs: boxcar::Vec<Arc<PropertySpec>>,
    external_conversion_operators: boxcar::Vec<MetaFunctionRc>,
}

impl MetaClass {
    /// Create a class for `type_entry`.
    ///
    /// ## Arguments
    /// * 'type_entry' - The class-like entry
    /// * 'base_class_names' - Public bases as written
    /// * 'template_arguments' - Template parameter placeholders, empty for non-templates
    #[must_use]
    pub fn new(
        type_entry: TypeEntryRc,
        base_class_names: Vec<String>,
        template_arguments: Vec<TypeEntryRc>,
    ) -> Self {
        MetaClass {
            name: type_entry.local_name().to_string(),
            type_entry,
            attributes: AtomicU32::new(ClassAttributes::PUBLIC.bits()),
            base_class_names,
            template_arguments,
            is_typedef: false,
            base_class: OnceLock::new(),
            enclosing_class: OnceLock::new(),
            template_base_class: OnceLock::new(),
            template_base_instantiations: OnceLock::new(),
            interfaces: boxcar::Vec::new(),
            functions: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
            enums: boxcar::Vec::new(),
            inner_classes: RwLock::new(Vec::new()),
            property_specs: boxcar::Vec::new(),
            external_conversion_operators: boxcar::Vec::new(),
        }
    }

    /// Create a class standing for a typedef of `source_type`.
    #[must_use]
    pub fn typedef_alias(type_entry: TypeEntryRc, source_type: &str) -> Self {
        let mut class = MetaClass::new(type_entry, vec![source_type.to_string()], Vec::new());
        class.is_typedef = true;
        class
    }

    /// Unqualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Qualified name, equal to the entry name.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        self.type_entry.name()
    }

    /// The type entry.
    #[must_use]
    pub fn type_entry(&self) -> &TypeEntryRc {
        &self.type_entry
    }

    /// Attribute set.
    #[must_use]
    pub fn attributes(&self) -> ClassAttributes {
        ClassAttributes::from_bits_retain(self.attributes.load(Ordering::Acquire))
    }

    /// Returns true if all of `attributes` are set.
    #[must_use]
    pub fn has(&self, attributes: ClassAttributes) -> bool {
        self.attributes().contains(attributes)
    }

    /// Set attributes.
    pub fn add_attributes(&self, attributes: ClassAttributes) {
        self.attributes.fetch_or(attributes.bits(), Ordering::AcqRel);
    }

    /// Clear attributes.
    pub fn remove_attributes(&self, attributes: ClassAttributes) {
        self.attributes.fetch_and(!attributes.bits(), Ordering::AcqRel);
    }

    /// Public bases as written.
    #[must_use]
    pub fn base_class_names(&self) -> &[String] {
        &self.base_class_names
    }

    /// Template parameter placeholders.
    #[must_use]
    pub fn template_arguments(&self) -> &[TypeEntryRc] {
        &self.template_arguments
    }

    /// Returns true for template declarations.
    #[must_use]
    pub fn is_template(&self) -> bool {
        !self.template_arguments.is_empty()
    }

    /// Returns true for typedef alias classes.
    #[must_use]
    pub fn is_typedef(&self) -> bool {
        self.is_typedef
    }

    /// Returns true for namespaces.
    #[must_use]
    pub fn is_namespace(&self) -> bool {
        self.type_entry.is_namespace()
    }

    /// Returns true for interfaces.
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.type_entry.is_interface()
    }

    /// Returns true for `QObject` classes.
    #[must_use]
    pub fn is_qobject(&self) -> bool {
        self.type_entry.complex().is_some_and(|data| data.is_qobject())
    }

    /// Stream operators are exposed for the class.
    #[must_use]
    pub fn is_stream(&self) -> bool {
        self.type_entry.complex().is_some_and(|data| data.stream())
    }

    /// Polymorphic id expression from the rule database.
    #[must_use]
    pub fn polymorphic_id_value(&self) -> Option<&str> {
        self.type_entry.complex()?.polymorphic_id_value()
    }

    /// The primary base.
    #[must_use]
    pub fn base_class(&self) -> Option<MetaClassRc> {
        self.base_class.get().and_then(MetaClassRef::upgrade)
    }

    /// Set the primary base. Returns false if one was already set.
    pub fn set_base_class(&self, base: &MetaClassRc) -> bool {
        self.base_class.set(MetaClassRef::new(base)).is_ok()
    }

    /// The enclosing class.
    #[must_use]
    pub fn enclosing_class(&self) -> Option<MetaClassRc> {
        self.enclosing_class.get().and_then(MetaClassRef::upgrade)
    }

    /// Set the enclosing class. Returns false if one was already set.
    pub fn set_enclosing_class(&self, enclosing: &MetaClassRc) -> bool {
        self.enclosing_class.set(MetaClassRef::new(enclosing)).is_ok()
    }

    /// The template this class was instantiated from.
    #[must_use]
    pub fn template_base_class(&self) -> Option<MetaClassRc> {
        self.template_base_class.get().and_then(MetaClassRef::upgrade)
    }

    /// Concrete template arguments of the template base.
    #[must_use]
    pub fn template_base_instantiations(&self) -> &[TypeEntryRc] {
        self.template_base_instantiations
            .get()
            .map_or(&[], Vec::as_slice)
    }

    /// Record the template base and its arguments.
    pub fn set_template_base(&self, template: &MetaClassRc, instantiations: Vec<TypeEntryRc>) {
        let _ = self.template_base_class.set(MetaClassRef::new(template));
        let _ = self.template_base_instantiations.set(instantiations);
    }

    /// Interfaces, flattened over the interface hierarchy.
    #[must_use]
    pub fn interfaces(&self) -> Vec<MetaClassRc> {
        self.interfaces
            .iter()
            .filter_map(|(_, r)| r.upgrade())
            .collect()
    }

    /// Append an interface unless already present.
    pub fn add_interface(&self, interface: &MetaClassRc) {
        if self.interfaces.iter().any(|(_, r)| r.is(interface)) {
            return;
        }
        self.interfaces.push(MetaClassRef::new(interface));
    }

    /// Primary base followed by interfaces.
    #[must_use]
    pub fn base_classes(&self) -> Vec<MetaClassRc> {
        let mut result: Vec<MetaClassRc> = self.base_class().into_iter().collect();
        result.extend(self.interfaces());
        result
    }

    /// Declared functions in order.
    #[must_use]
    pub fn functions(&self) -> Vec<MetaFunctionRc> {
        self.functions.iter().map(|(_, f)| f.clone()).collect()
    }

    /// Append a function and update the constructor bookkeeping.
    pub fn add_function(&self, function: MetaFunctionRc) {
        if function.is_constructor() {
            if function.visibility == Visibility::Private {
                self.add_attributes(ClassAttributes::HAS_PRIVATE_CONSTRUCTOR);
            } else {
                self.add_attributes(ClassAttributes::HAS_NON_PRIVATE_CONSTRUCTOR);
            }
        }
        self.functions.push(function);
    }

    /// Functions named `name`.
    #[must_use]
    pub fn find_functions(&self, name: &str) -> Vec<MetaFunctionRc> {
        self.functions
            .iter()
            .filter(|(_, f)| f.name == name)
            .map(|(_, f)| f.clone())
            .collect()
    }

    /// First function named `name`.
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<MetaFunctionRc> {
        self.functions
            .iter()
            .find(|(_, f)| f.name == name)
            .map(|(_, f)| f.clone())
    }

    /// Returns true if a function with this name exists.
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.iter().any(|(_, f)| f.name == name)
    }

    /// Constructors, copy and move constructors.
    #[must_use]
    pub fn constructors(&self) -> Vec<MetaFunctionRc> {
        self.functions
            .iter()
            .filter(|(_, f)| f.is_constructor())
            .map(|(_, f)| f.clone())
            .collect()
    }

    /// Returns true if any constructor is declared.
    #[must_use]
    pub fn has_constructors(&self) -> bool {
        self.functions.iter().any(|(_, f)| f.is_constructor())
    }

    /// The copy constructor, if declared.
    #[must_use]
    pub fn copy_constructor(&self) -> Option<MetaFunctionRc> {
        self.functions
            .iter()
            .find(|(_, f)| f.kind == FunctionKind::CopyConstructor)
            .map(|(_, f)| f.clone())
    }

    /// Returns true if the class or an ancestor has a private copy constructor.
    #[must_use]
    pub fn has_private_copy_constructor(&self) -> bool {
        if let Some(copy) = self.copy_constructor() {
            return copy.visibility == Visibility::Private;
        }
        let mut seen: Vec<MetaClassRc> = Vec::new();
        let mut current = self.base_class();
        while let Some(base) = current {
            if seen.iter().any(|class| Arc::ptr_eq(class, &base)) {
                return false;
            }
            if let Some(copy) = base.copy_constructor() {
                return copy.visibility == Visibility::Private;
            }
            current = base.base_class();
            seen.push(base);
        }
        false
    }

    /// Declared fields in order.
    #[must_use]
    pub fn fields(&self) -> Vec<MetaFieldRc> {
        self.fields.iter().map(|(_, f)| f.clone()).collect()
    }

    /// Append a field.
    pub fn add_field(&self, field: MetaFieldRc) {
        self.fields.push(field);
    }

    /// Field named `name`.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<MetaFieldRc> {
        self.fields
            .iter()
            .find(|(_, f)| f.name == name)
            .map(|(_, f)| f.clone())
    }

    /// Declared enums in order.
    #[must_use]
    pub fn enums(&self) -> Vec<MetaEnumRc> {
        self.enums.iter().map(|(_, e)| e.clone()).collect()
    }

    /// Append an enum.
    pub fn add_enum(&self, item: MetaEnumRc) {
        self.enums.push(item);
    }

    /// Enum named `name` (unqualified).
    #[must_use]
    pub fn find_enum(&self, name: &str) -> Option<MetaEnumRc> {
        self.enums
            .iter()
            .find(|(_, e)| e.name() == name)
            .map(|(_, e)| e.clone())
    }

    /// Inner classes in their current order.
    #[must_use]
    pub fn inner_classes(&self) -> Vec<MetaClassRc> {
        read_lock!(self.inner_classes).clone()
    }

    /// Append an inner class; the enclosing class owns it.
    pub fn add_inner_class(&self, class: MetaClassRc) {
        write_lock!(self.inner_classes).push(class);
    }

    /// Replace the inner class order.
    pub fn set_inner_classes(&self, classes: Vec<MetaClassRc>) {
        *write_lock!(self.inner_classes) = classes;
    }

    /// Property specifications, in declaration order.
    #[must_use]
    pub fn property_specs(&self) -> Vec<Arc<PropertySpec>> {
        self.property_specs.iter().map(|(_, p)| p.clone()).collect()
    }

    /// Append a property specification.
    pub fn add_property_spec(&self, spec: Arc<PropertySpec>) {
        self.property_specs.push(spec);
    }

    /// Conversion operators of other classes that produce this class.
    #[must_use]
    pub fn external_conversion_operators(&self) -> Vec<MetaFunctionRc> {
        self.external_conversion_operators
            .iter()
            .map(|(_, f)| f.clone())
            .collect()
    }

    /// Register a conversion operator of another class producing this class.
    pub fn add_external_conversion_operator(&self, function: MetaFunctionRc) {
        if self
            .external_conversion_operators
            .iter()
            .any(|(_, f)| Arc::ptr_eq(f, &function))
        {
            return;
        }
        self.external_conversion_operators.push(function);
    }

    /// Returns true if `ancestor` is the primary base or an interface, transitively.
    #[must_use]
    pub fn inherits_from(&self, ancestor: &MetaClassRc) -> bool {
        let mut seen: Vec<MetaClassRc> = Vec::new();
        let mut current = self.base_class();
        while let Some(base) = current {
            if Arc::ptr_eq(&base, ancestor) {
                return true;
            }
            if seen.iter().any(|class| Arc::ptr_eq(class, &base)) {
                break;
            }
            current = base.base_class();
            seen.push(base);
        }
        self.interfaces().iter().any(|i| Arc::ptr_eq(i, ancestor))
    }
}
