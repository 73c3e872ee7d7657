//! Translation of code model types into meta types.
//!
//! [`TypeResolver`] turns the [`TypeInfo`] written in a declaration into a [`MetaType`] bound to
//! a rule database entry. Names are looked up relative to the class being processed: first
//! through its own scope and every enclosing scope, then through the scopes of its base
//! classes, then globally, as a flags alias, as a container by local name and finally as one
//! of the class's own template parameters.
//!
//! When a name does not resolve as written, typedefs visible from the current scope are
//! expanded and the lookup is retried once with the expanded type.
//!
//! Array dimensions and the constant expressions used as sizes are evaluated with
//! [`TypeResolver::find_out_value`].

use std::sync::Arc;

use crate::{
    codemodel::{CodeModel, ReferenceType, TypeInfo},
    meta::{MetaClassRc, MetaClassRegistry, MetaEnumRc, MetaType},
    typesystem::{TypeDatabase, TypeEntry, TypeEntryKind, TypeEntryRc},
    Error::{RecursionLimit, UnresolvedType},
    Result,
};

/// Resolves type names against a rule database and the classes built so far.
pub struct TypeResolver<'a> {
    database: &'a TypeDatabase,
    code_model: Option<&'a CodeModel>,
    classes: Option<&'a MetaClassRegistry>,
    global_enums: &'a [MetaEnumRc],
    max_scope_depth: usize,
    max_template_depth: usize,
}

impl<'a> TypeResolver<'a> {
    /// A resolver that only consults `database`.
    #[must_use]
    pub fn new(database: &'a TypeDatabase) -> Self {
        TypeResolver {
            database,
            code_model: None,
            classes: None,
            global_enums: &[],
            max_scope_depth: 64,
            max_template_depth: 100,
        }
    }

    /// Expand typedefs declared in `code_model`.
    #[must_use]
    pub fn with_code_model(mut self, code_model: &'a CodeModel) -> Self {
        self.code_model = Some(code_model);
        self
    }

    /// Search base classes and enum values in `classes`.
    #[must_use]
    pub fn with_classes(mut self, classes: &'a MetaClassRegistry) -> Self {
        self.classes = Some(classes);
        self
    }

    /// Search enum values in these global enums.
    #[must_use]
    pub fn with_global_enums(mut self, global_enums: &'a [MetaEnumRc]) -> Self {
        self.global_enums = global_enums;
        self
    }

    /// Bound the scope walk and the template nesting.
    #[must_use]
    pub fn with_limits(mut self, max_scope_depth: usize, max_template_depth: usize) -> Self {
        self.max_scope_depth = max_scope_depth;
        self.max_template_depth = max_template_depth;
        self
    }

    /// Translate `info` as used inside `class`.
    ///
    /// ## Arguments
    /// * 'info' - The type as written
    /// * 'class' - The class whose scope the type is used in, `None` at global scope
    /// * 'scope_path' - Names of the enclosing code model scopes, used for typedef expansion
    ///
    /// # Errors
    /// Returns [`crate::Error::UnresolvedType`] if the type or one of its template arguments
    /// cannot be found, and [`crate::Error::RecursionLimit`] for absurdly nested types.
    pub fn translate(
        &self,
        info: &TypeInfo,
        class: Option<&MetaClassRc>,
        scope_path: &[String],
    ) -> Result<MetaType> {
        self.translate_at(info, class, scope_path, 0)
    }

    fn translate_at(
        &self,
        info: &TypeInfo,
        class: Option<&MetaClassRc>,
        scope_path: &[String],
        depth: usize,
    ) -> Result<MetaType> {
        if depth > self.max_template_depth {
            return Err(RecursionLimit(self.max_template_depth));
        }

        let first_error = match self.translate_written(info, class, scope_path, depth) {
            Ok(result) => return Ok(result),
            Err(error @ RecursionLimit(_)) => return Err(error),
            Err(error) => error,
        };

        let Some(code_model) = self.code_model else {
            return Err(first_error);
        };
        let expanded = code_model.resolve_type(info, scope_path, self.max_scope_depth)?;
        if expanded == *info {
            return Err(first_error);
        }
        tracing::trace!(from = %info, to = %expanded, "expanded typedef");
        self.translate_written(&expanded, class, scope_path, depth)
    }

    fn translate_written(
        &self,
        info: &TypeInfo,
        class: Option<&MetaClassRc>,
        scope_path: &[String],
        depth: usize,
    ) -> Result<MetaType> {
        if info.function_pointer {
            return Err(UnresolvedType {
                type_name: info.to_string(),
                reason: "Unsupported function pointer.".to_string(),
            });
        }

        if info.is_array() {
            return self.translate_array(info, class, scope_path, depth);
        }

        let mut lookup = info.clone();
        let mut name = info.qualified_name_string();
        if name == "QFlags" && !info.instantiations.is_empty() {
            name = info.instantiation_name();
            lookup.instantiations.clear();
        }

        let Some(entry) = self.find_entry(&name, info.local_name(), class) else {
            return Err(UnresolvedType {
                type_name: info.to_string(),
                reason: format!("could not find type '{name}'"),
            });
        };

        let mut result = MetaType::new(entry);
        result.is_const = info.is_const;
        result.is_volatile = info.is_volatile;
        result.indirections = info.indirections;
        result.reference = info.reference;
        result.set_original_description(&info.to_string());

        for (position, argument) in lookup.instantiations.iter().enumerate() {
            let resolved = self
                .translate_at(argument, class, scope_path, depth + 1)
                .map_err(|error| match error {
                    RecursionLimit(_) => error,
                    other => UnresolvedType {
                        type_name: info.to_string(),
                        reason: format!(
                            "could not resolve template argument {position} '{argument}': {other}"
                        ),
                    },
                })?;
            result.add_instantiation(resolved).map_err(|error| UnresolvedType {
                type_name: info.to_string(),
                reason: error.to_string(),
            })?;
        }

        result.decide_usage_pattern();
        Ok(result)
    }

    fn translate_array(
        &self,
        info: &TypeInfo,
        class: Option<&MetaClassRc>,
        scope_path: &[String],
        depth: usize,
    ) -> Result<MetaType> {
        let mut element_info = info.clone();
        element_info.array_elements.clear();

        // const char name[] is a string
        if info.array_elements.len() == 1
            && info.is_const
            && info.indirections == 0
            && info.reference == ReferenceType::NoReference
            && info.qualified_name.len() == 1
            && info.qualified_name[0] == "char"
        {
            element_info.indirections = 1;
            return self.translate_at(&element_info, class, scope_path, depth + 1);
        }

        let mut current = self.translate_at(&element_info, class, scope_path, depth + 1)?;
        for dimension in info.array_elements.iter().rev() {
            let count = if dimension.trim().is_empty() {
                None
            } else {
                let value = self.find_out_value(dimension);
                if value.is_none() {
                    tracing::debug!(dimension = %dimension, "array size is not a known constant");
                }
                value
            };
            let array_entry = Arc::new(TypeEntry::array(current.type_entry().clone()));
            let mut array = MetaType::array_of(array_entry, current, count);
            array.set_original_description(&info.to_string());
            array.decide_usage_pattern();
            current = array;
        }
        Ok(current)
    }

    /// Find the entry for `name` as seen from `class`.
    fn find_entry(
        &self,
        name: &str,
        local_name: &str,
        class: Option<&MetaClassRc>,
    ) -> Option<TypeEntryRc> {
        if let Some(class) = class {
            if let Some(entry) = self.find_in_scopes(name, class.qualified_name()) {
                return Some(entry);
            }
            for base_name in class.base_class_names() {
                let Some(base) = self.find_class(base_name, Some(class)) else {
                    continue;
                };
                if let Some(entry) = self.find_in_scopes(name, base.qualified_name()) {
                    return Some(entry);
                }
            }
        }

        if let Some(entry) = self.database.find_type(name) {
            return Some(entry);
        }
        if let Some(entry) = self.database.find_flags_type(name) {
            return Some(entry);
        }
        if let Some(entry) = self.database.find_container_type(local_name) {
            return Some(entry);
        }

        class.and_then(|class| {
            class
                .template_arguments()
                .iter()
                .find(|argument| argument.name() == name)
                .cloned()
        })
    }

    /// Try `scope::name` for `scope` and each enclosing scope, innermost first.
    fn find_in_scopes(&self, name: &str, scope: &str) -> Option<TypeEntryRc> {
        let mut context = scope.to_string();
        for _ in 0..self.max_scope_depth {
            if context.is_empty() {
                return None;
            }
            if let Some(entry) = self.database.find_type(&format!("{context}::{name}")) {
                return Some(entry);
            }
            match context.rfind("::") {
                Some(position) => context.truncate(position),
                None => context.clear(),
            }
        }
        None
    }

    /// Find a built class by a name as written inside `context`.
    ///
    /// The enclosing scopes of `context` are searched innermost first, then the global scope.
    /// As a last resort a class whose unqualified name matches is accepted if it is the only
    /// one.
    #[must_use]
    pub fn find_class(&self, name: &str, context: Option<&MetaClassRc>) -> Option<MetaClassRc> {
        let classes = self.classes?;
        let name = crate::codemodel::strip_template_arguments(name);

        if let Some(context) = context {
            let mut scope = context.qualified_name().to_string();
            for _ in 0..self.max_scope_depth {
                if let Some(class) = classes.find_by_name(&format!("{scope}::{name}")) {
                    return Some(class);
                }
                match scope.rfind("::") {
                    Some(position) => scope.truncate(position),
                    None => break,
                }
            }
        }

        if let Some(class) = classes.find_by_name(name) {
            return Some(class);
        }

        let local = name.rsplit("::").next().unwrap_or(name);
        let mut matches = classes.all().into_iter().filter(|class| class.name() == local);
        match (matches.next(), matches.next()) {
            (Some(class), None) => Some(class),
            _ => None,
        }
    }

    /// Evaluate a constant expression used as an array size or default value.
    ///
    /// Integers and `true`/`false` evaluate directly. Anything that is not a plain, possibly
    /// qualified identifier evaluates to 0. An identifier must name a known enumerator.
    #[must_use]
    pub fn find_out_value(&self, text: &str) -> Option<i64> {
        let text = text.trim();
        if let Some(value) = parse_integer(text) {
            return Some(value);
        }
        match text {
            "true" => return Some(1),
            "false" => return Some(0),
            _ => {}
        }
        if !is_identifier(text) {
            return Some(0);
        }

        if let Some(classes) = self.classes {
            for class in classes.all() {
                for item in class.enums() {
                    if let Some(value) = item.find_value(text) {
                        return Some(value.value);
                    }
                }
            }
        }
        for item in self.global_enums {
            if let Some(value) = item.find_value(text) {
                return Some(value.value);
            }
        }

        self.database
            .find_entries(text)
            .into_iter()
            .filter(|entry| entry.kind() == TypeEntryKind::EnumValue)
            .find_map(|entry| entry.enum_value_text().and_then(parse_integer))
    }
}

fn parse_integer(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let digits = digits.trim_end_matches(['u', 'U', 'l', 'L']);
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

fn is_identifier(text: &str) -> bool {
    text.split("::").all(|segment| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codemodel::{NamespaceModel, TypeDefModel},
        meta::{MetaClass, UsagePattern},
        test::factories::sample_database,
        Error,
    };

    fn info(text: &str) -> TypeInfo {
        TypeInfo::parse(text).unwrap()
    }

    #[test]
    fn test_translate_plain_and_qualified() {
        let database = sample_database();
        let resolver = TypeResolver::new(&database);

        let ty = resolver.translate(&info("const QString&"), None, &[]).unwrap();
        assert_eq!(ty.name(), "QString");
        assert!(ty.is_const_reference());
        assert_eq!(ty.usage_pattern(), UsagePattern::Primitive);
        assert_eq!(ty.original_description(), "const QString&");

        let ty = resolver.translate(&info("Gui::Size"), None, &[]).unwrap();
        assert_eq!(ty.usage_pattern(), UsagePattern::Value);

        let ty = resolver.translate(&info("QList<int>"), None, &[]).unwrap();
        assert_eq!(ty.usage_pattern(), UsagePattern::Container);
        assert_eq!(ty.instantiations()[0].name(), "int");

        let error = resolver.translate(&info("Missing*"), None, &[]).unwrap_err();
        assert!(matches!(error, Error::UnresolvedType { .. }));
    }

    #[test]
    fn test_translate_in_class_scope() {
        let database = sample_database();
        let widget = Arc::new(MetaClass::new(
            database.find_type("Gui::Widget").unwrap(),
            Vec::new(),
            vec![Arc::new(TypeEntry::template_argument("T", 0))],
        ));
        let resolver = TypeResolver::new(&database);

        let ty = resolver.translate(&info("Color"), Some(&widget), &[]).unwrap();
        assert_eq!(ty.name(), "Gui::Color");
        assert_eq!(ty.usage_pattern(), UsagePattern::Enum);

        let ty = resolver.translate(&info("T"), Some(&widget), &[]).unwrap();
        assert_eq!(ty.type_entry().kind(), TypeEntryKind::TemplateArgument);
    }

    #[test]
    fn test_flags_only_for_global_qflags() {
        let database = sample_database();
        let color = database.find_type("Gui::Color").unwrap();
        database.add_type(TypeEntry::flags("QFlags<Gui::Color>", "Gui::Colors", Some(color)));
        let resolver = TypeResolver::new(&database);

        let ty = resolver.translate(&info("QFlags<Gui::Color>"), None, &[]).unwrap();
        assert_eq!(ty.usage_pattern(), UsagePattern::Flags);
        assert!(ty.instantiations().is_empty());

        let ty = resolver.translate(&info("Gui::Colors"), None, &[]).unwrap();
        assert_eq!(ty.usage_pattern(), UsagePattern::Flags);

        let error = resolver
            .translate(&info("Other::QFlags<Gui::Color>"), None, &[])
            .unwrap_err();
        assert!(matches!(error, Error::UnresolvedType { .. }));
    }

    #[test]
    fn test_typedef_expansion() {
        let database = sample_database();
        let mut model = CodeModel::new("gui.h");
        model.global_mut().add_namespace(
            NamespaceModel::new("Gui").with_typedef(TypeDefModel::new("Text", "QString").unwrap()),
        );
        let resolver = TypeResolver::new(&database).with_code_model(&model);
        let scope = vec!["Gui".to_string()];

        let ty = resolver.translate(&info("const Text&"), None, &scope).unwrap();
        assert_eq!(ty.name(), "QString");
        assert!(ty.is_const_reference());
        assert!(resolver.translate(&info("Text"), None, &[]).is_err());
    }

    #[test]
    fn test_arrays() {
        let database = sample_database();
        let resolver = TypeResolver::new(&database);

        let ty = resolver.translate(&info("int[4][2]"), None, &[]).unwrap();
        assert_eq!(ty.usage_pattern(), UsagePattern::Array);
        assert_eq!(ty.array_count(), Some(4));
        let inner = ty.array_element().unwrap();
        assert_eq!(inner.array_count(), Some(2));
        assert_eq!(inner.array_element().unwrap().name(), "int");

        let ty = resolver.translate(&info("const char[]"), None, &[]).unwrap();
        assert_eq!(ty.name(), "char");
        assert_eq!(ty.indirections, 1);
        assert!(ty.is_const);
    }

    #[test]
    fn test_translate_is_repeatable() {
        let database = sample_database();
        let resolver = TypeResolver::new(&database);
        let written = info("const QList<QString>&");
        let first = resolver.translate(&written, None, &[]).unwrap();
        let second = resolver.translate(&written, None, &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_find_out_value() {
        let database = sample_database();
        database.add_type(TypeEntry::enum_value("Gui::Large", "8", None));
        let resolver = TypeResolver::new(&database);

        assert_eq!(resolver.find_out_value("42"), Some(42));
        assert_eq!(resolver.find_out_value("0x10"), Some(16));
        assert_eq!(resolver.find_out_value("true"), Some(1));
        assert_eq!(resolver.find_out_value("SIZE * 2"), Some(0));
        assert_eq!(resolver.find_out_value("Gui::Large"), Some(8));
        assert_eq!(resolver.find_out_value("Unknown"), None);
    }
}
