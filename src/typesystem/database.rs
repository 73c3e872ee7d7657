//! Central registry of rule-database type entries.
//!
//! The [`TypeDatabase`] stores every [`TypeEntry`] under an internal, monotonically increasing
//! id so that iteration follows registration order, and keeps a name index for the lookups
//! the builder performs while resolving types. It also owns the rejection rules, the global
//! added functions and function modifications, and the global thread policy defaults.
//!
//! # Thread Safety
//!
//! Lookups and insertions are lock-free (`SkipMap`, `DashMap`, `boxcar::Vec`), so a database
//! can be wrapped in an `Arc` and shared by several builds. The builder itself only adds
//! synthetic entries (private enums, enumerator values, non-type template arguments) and
//! never removes any.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    codemodel::{normalize_signature, strip_template_arguments},
    typesystem::{
        AddedFunction, AddedFunctionRc, AllowThread, ExceptionHandling, FunctionModification,
        RejectionMatch, TypeEntry, TypeEntryKind, TypeEntryRc, TypeRejection,
    },
};

/// Registry of [`TypeEntry`] values and the rules that apply to them.
///
/// # Examples
///
/// ```rust
/// use cppmeta::typesystem::{TypeDatabase, TypeEntry, TypeEntryKind};
///
/// let db = TypeDatabase::new();
/// db.add_type(TypeEntry::primitive("int"));
/// db.add_type(TypeEntry::value("Gui::Color"));
/// db.add_type(TypeEntry::value("Paint::Color"));
///
/// assert_eq!(db.find_type("int").unwrap().kind(), TypeEntryKind::Primitive);
/// assert!(db.find_complex_type("Gui::Color").is_some());
/// assert_eq!(db.candidates_for("Color"), vec!["Gui::Color", "Paint::Color"]);
/// ```
pub struct TypeDatabase {
    /// Primary storage, ordered by registration
    entries: SkipMap<u32, TypeEntryRc>,
    /// Counter for entry ids
    next_id: AtomicU32,
    /// Secondary index: ids by qualified name
    entries_by_name: DashMap<String, Vec<u32>>,
    /// Flags entries by their alias name
    flags_by_alias: DashMap<String, TypeEntryRc>,
    /// Typedef entries, kept apart from the name index like their targets
    typedef_entries: boxcar::Vec<TypeEntryRc>,
    /// Exclusion rules
    rejections: boxcar::Vec<TypeRejection>,
    /// Functions added to the global namespace
    global_added_functions: boxcar::Vec<AddedFunctionRc>,
    /// Modifications for global functions
    global_function_modifications: boxcar::Vec<FunctionModification>,
    /// Global exception handling default
    exception_handling: ExceptionHandling,
    /// Global interpreter lock default
    allow_thread: AllowThread,
}

impl Default for TypeDatabase {
    fn default() -> Self {
        TypeDatabase::new()
    }
}

impl TypeDatabase {
    /// Create a database holding only the `void` and `...` entries.
    #[must_use]
    pub fn new() -> Self {
        let database = TypeDatabase {
            entries: SkipMap::new(),
            next_id: AtomicU32::new(1),
            entries_by_name: DashMap::new(),
            flags_by_alias: DashMap::new(),
            typedef_entries: boxcar::Vec::new(),
            rejections: boxcar::Vec::new(),
            global_added_functions: boxcar::Vec::new(),
            global_function_modifications: boxcar::Vec::new(),
            exception_handling: ExceptionHandling::Unspecified,
            allow_thread: AllowThread::Unspecified,
        };

        database.add_type(TypeEntry::void());
        database.add_type(TypeEntry::varargs());
        database
    }

    /// Set the global thread policy defaults.
    #[must_use]
    pub fn with_thread_policies(
        mut self,
        exception_handling: ExceptionHandling,
        allow_thread: AllowThread,
    ) -> Self {
        self.exception_handling = exception_handling;
        self.allow_thread = allow_thread;
        self
    }

    /// Register an entry and return the shared handle.
    ///
    /// Typedef entries go to the typedef list and their target class entry is registered in
    /// the name index instead. Flags entries are also indexed by their alias.
    pub fn add_type(&self, entry: TypeEntry) -> TypeEntryRc {
        let entry = Arc::new(entry);
        self.add_shared_type(&entry);
        entry
    }

    /// Register an already shared entry. Registering the same `Arc` twice is a no-op.
    pub fn add_shared_type(&self, entry: &TypeEntryRc) {
        if entry.kind() == TypeEntryKind::Typedef {
            if self.typedef_entries.iter().any(|(_, e)| Arc::ptr_eq(e, entry)) {
                return;
            }
            self.typedef_entries.push(entry.clone());
            if let Some(target) = entry.typedef_target() {
                self.add_shared_type(&target);
            }
            return;
        }

        if let Some(ids) = self.entries_by_name.get(entry.name()) {
            let duplicate = ids.iter().any(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|e| Arc::ptr_eq(e.value(), entry))
            });
            if duplicate {
                return;
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(id, entry.clone());
        self.entries_by_name
            .entry(entry.name().to_string())
            .or_default()
            .push(id);

        if let Some(alias) = entry.flags_original_name() {
            self.flags_by_alias.insert(alias.to_string(), entry.clone());
        }
    }

    /// All entries registered under `name`, in registration order.
    #[must_use]
    pub fn find_entries(&self, name: &str) -> Vec<TypeEntryRc> {
        if let Some(ids) = self.entries_by_name.get(name) {
            ids.iter()
                .filter_map(|id| self.entries.get(id).map(|entry| entry.value().clone()))
                .collect()
        } else {
            Vec::new()
        }
    }

    /// The first type entry named `name`. Function entries are not types and are skipped.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<TypeEntryRc> {
        self.find_entries(name)
            .into_iter()
            .find(|entry| entry.kind() != TypeEntryKind::Function)
    }

    /// The first class-like entry named `name`.
    #[must_use]
    pub fn find_complex_type(&self, name: &str) -> Option<TypeEntryRc> {
        self.find_entries(name)
            .into_iter()
            .find(|entry| entry.is_complex())
    }

    /// The first primitive entry named `name`.
    #[must_use]
    pub fn find_primitive_type(&self, name: &str) -> Option<TypeEntryRc> {
        self.find_entries(name)
            .into_iter()
            .find(|entry| entry.is_primitive())
    }

    /// The container entry for `name`; template arguments in `name` are ignored.
    #[must_use]
    pub fn find_container_type(&self, name: &str) -> Option<TypeEntryRc> {
        let template_name = strip_template_arguments(name);
        self.find_type(template_name)
            .filter(|entry| entry.is_container())
    }

    /// The flags entry named `name` or aliased as `name`.
    #[must_use]
    pub fn find_flags_type(&self, name: &str) -> Option<TypeEntryRc> {
        self.find_type(name)
            .filter(|entry| entry.is_flags())
            .or_else(|| self.flags_by_alias.get(name).map(|e| e.value().clone()))
    }

    /// The namespace entry named `name`.
    #[must_use]
    pub fn find_namespace_type(&self, name: &str) -> Option<TypeEntryRc> {
        self.find_entries(name)
            .into_iter()
            .find(|entry| entry.is_namespace())
    }

    /// The global function entry named `name`.
    #[must_use]
    pub fn find_function_type(&self, name: &str) -> Option<TypeEntryRc> {
        self.find_entries(name)
            .into_iter()
            .find(|entry| entry.kind() == TypeEntryKind::Function)
    }

    /// Every registered entry in registration order (typedef entries excluded).
    #[must_use]
    pub fn entries(&self) -> Vec<TypeEntryRc> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Typedef entries in registration order.
    #[must_use]
    pub fn typedef_entries(&self) -> Vec<TypeEntryRc> {
        self.typedef_entries.iter().map(|(_, e)| e.clone()).collect()
    }

    /// Qualified names ending with `::name`, sorted. Used for "did you mean" diagnostics.
    #[must_use]
    pub fn candidates_for(&self, name: &str) -> Vec<String> {
        let suffix = format!("::{name}");
        let mut candidates: Vec<String> = self
            .entries_by_name
            .iter()
            .filter(|item| item.key().ends_with(&suffix))
            .map(|item| item.key().clone())
            .collect();
        candidates.sort();
        candidates
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an exclusion rule.
    pub fn add_rejection(&self, rejection: TypeRejection) {
        self.rejections.push(rejection);
    }

    fn find_rejection(&self, match_type: RejectionMatch, class_name: &str, name: &str) -> Option<String> {
        self.rejections
            .iter()
            .find(|(_, rule)| rule.matches(match_type, class_name, name))
            .map(|(_, rule)| rule.to_string())
    }

    /// The matching rule, rendered, if the class is excluded.
    #[must_use]
    pub fn is_class_rejected(&self, class_name: &str) -> Option<String> {
        self.find_rejection(RejectionMatch::ExcludeClass, class_name, "")
    }

    /// The matching rule, rendered, if the function is excluded.
    #[must_use]
    pub fn is_function_rejected(&self, class_name: &str, function_name: &str) -> Option<String> {
        self.find_rejection(RejectionMatch::Function, class_name, function_name)
    }

    /// The matching rule, rendered, if the field is excluded.
    #[must_use]
    pub fn is_field_rejected(&self, class_name: &str, field_name: &str) -> Option<String> {
        self.find_rejection(RejectionMatch::Field, class_name, field_name)
    }

    /// The matching rule, rendered, if the enum is excluded.
    #[must_use]
    pub fn is_enum_rejected(&self, class_name: &str, enum_name: &str) -> Option<String> {
        self.find_rejection(RejectionMatch::Enum, class_name, enum_name)
    }

    /// The matching rule, rendered, if functions returning `type_name` are excluded.
    #[must_use]
    pub fn is_return_type_rejected(&self, class_name: &str, type_name: &str) -> Option<String> {
        self.find_rejection(RejectionMatch::ReturnType, class_name, type_name)
    }

    /// The matching rule, rendered, if functions taking `type_name` are excluded.
    #[must_use]
    pub fn is_argument_type_rejected(&self, class_name: &str, type_name: &str) -> Option<String> {
        self.find_rejection(RejectionMatch::ArgumentType, class_name, type_name)
    }

    /// Add a function to the global namespace.
    pub fn add_global_function(&self, function: AddedFunction) {
        self.global_added_functions.push(Arc::new(function));
    }

    /// Functions added to the global namespace.
    #[must_use]
    pub fn global_added_functions(&self) -> Vec<AddedFunctionRc> {
        self.global_added_functions
            .iter()
            .map(|(_, f)| f.clone())
            .collect()
    }

    /// Add a modification for global functions.
    pub fn add_global_function_modification(&self, modification: FunctionModification) {
        self.global_function_modifications.push(modification);
    }

    /// Global function modifications whose signature matches `signature`.
    #[must_use]
    pub fn global_function_modifications(&self, signature: &str) -> Vec<FunctionModification> {
        let signature = normalize_signature(signature);
        self.global_function_modifications
            .iter()
            .filter(|(_, m)| m.matches(&signature))
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// Global exception handling default.
    #[must_use]
    pub fn exception_handling(&self) -> ExceptionHandling {
        self.exception_handling
    }

    /// Global interpreter lock default.
    #[must_use]
    pub fn allow_thread(&self) -> AllowThread {
        self.allow_thread
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let db = TypeDatabase::new();
        assert_eq!(db.len(), 2);
        assert!(db.find_type("void").unwrap().is_void());
        assert!(db.find_type("...").unwrap().is_varargs());
    }

    #[test]
    fn test_registration_order_and_duplicates() {
        let db = TypeDatabase::new();
        let first = db.add_type(TypeEntry::value("A"));
        db.add_type(TypeEntry::object("B"));
        db.add_shared_type(&first);

        let names: Vec<String> = db.entries().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(names, vec!["void", "...", "A", "B"]);
    }

    #[test]
    fn test_kind_specific_lookups() {
        let db = TypeDatabase::new();
        db.add_type(TypeEntry::function("Gui", &["Gui()"]));
        db.add_type(TypeEntry::namespace("Gui"));
        db.add_type(TypeEntry::container("QList"));
        let color = db.add_type(TypeEntry::enumeration("Gui::Color"));
        db.add_type(TypeEntry::flags("QFlags<Gui::Color>", "Gui::Colors", Some(color)));

        assert!(db.find_type("Gui").unwrap().is_namespace());
        assert!(db.find_function_type("Gui").is_some());
        assert!(db.find_namespace_type("Gui").is_some());
        assert!(db.find_container_type("QList<int>").is_some());
        assert!(db.find_container_type("Gui").is_none());
        assert!(db.find_flags_type("QFlags<Gui::Color>").is_some());
        assert!(db.find_flags_type("Gui::Colors").is_some());
        assert!(db.find_primitive_type("Gui").is_none());
    }

    #[test]
    fn test_typedef_entries_kept_apart() {
        let db = TypeDatabase::new();
        let target = Arc::new(TypeEntry::value("IntList"));
        db.add_type(TypeEntry::typedef("IntList", "QList<int>", target));

        assert_eq!(db.typedef_entries().len(), 1);
        assert!(db.find_type("IntList").unwrap().is_value());
    }

    #[test]
    fn test_rejections() {
        let db = TypeDatabase::new();
        db.add_rejection(TypeRejection::exclude_class("QPrivate").unwrap());
        db.add_rejection(
            TypeRejection::new(RejectionMatch::Function, "QWidget", "metaObject").unwrap(),
        );
        db.add_rejection(TypeRejection::new(RejectionMatch::ArgumentType, "*", "void*").unwrap());

        assert!(db.is_class_rejected("QPrivate").is_some());
        assert!(db.is_class_rejected("QWidget").is_none());
        assert!(db.is_function_rejected("QWidget", "metaObject").is_some());
        assert!(db.is_function_rejected("QLabel", "metaObject").is_none());
        assert!(db.is_argument_type_rejected("Anything", "void*").is_some());
        assert!(db.is_return_type_rejected("Anything", "void*").is_none());
    }

    #[test]
    fn test_global_functions() {
        let db = TypeDatabase::new();
        db.add_global_function(AddedFunction::new("version()", "int").unwrap());
        db.add_global_function_modification(FunctionModification::new("qMax(int, int)").remove());

        assert_eq!(db.global_added_functions().len(), 1);
        assert_eq!(db.global_function_modifications("qMax(int,int)").len(), 1);
        assert!(db.global_function_modifications("qMin(int,int)").is_empty());
    }
}
