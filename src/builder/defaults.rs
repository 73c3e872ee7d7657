//! Default argument expression fix-ups.
//!
//! Default expressions are copied from the header as written. Generated code calls them from
//! outside the declaring class, so unqualified enumerators, constructor calls and class fields
//! get the scope they are resolved in.

use std::sync::LazyLock;

use regex::Regex;

use crate::meta::{MetaClassRc, MetaType};

static CONTAINER_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^<]*<).*(>[^>]*)").expect("container default pattern is valid"));

static CONTAINER_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^<]*<(.*)>").expect("container type pattern is valid"));

static CONSTRUCTOR_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\(]*\(|)([^\)]*)(\)|)").expect("constructor default pattern is valid")
});

static SCOPED_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:const\s+|)([\w:]*::|)([A-Za-z_]\w*)\s*[&\*]?$")
        .expect("scoped type pattern is valid")
});

/// Rewrite `expression` so it is valid outside of `class`.
///
/// ## Arguments
/// * 'expression' - The default expression as written
/// * 'argument_type' - The resolved argument type
/// * 'class' - The class declaring the function, `None` for free functions
pub(crate) fn fix_default_value(
    expression: &str,
    argument_type: &MetaType,
    class: Option<&MetaClassRc>,
) -> String {
    let expression = expression.trim();
    let entry = argument_type.type_entry();

    if entry.is_primitive() && argument_type.indirections == 0 {
        if entry.name() == "bool" {
            if let Ok(number) = expression.parse::<i64>() {
                return if number != 0 { "true" } else { "false" }.to_string();
            }
        }
        return expression.to_string();
    }

    if entry.is_enum() || entry.is_flags() {
        if expression.parse::<i64>().is_ok() || expression.contains("::") {
            return expression.to_string();
        }
        let enum_entry = if entry.is_flags() {
            entry.enum_entry()
        } else {
            Some(entry.clone())
        };
        return match enum_entry.as_ref().and_then(|e| e.enum_qualifier()) {
            Some(qualifier) if !qualifier.is_empty() => format!("{qualifier}::{expression}"),
            _ => expression.to_string(),
        };
    }

    if argument_type.is_container() && expression.contains('<') {
        let signature = argument_type.minimal_signature();
        if let (Some(type_match), Some(default_match)) = (
            CONTAINER_TYPE.captures(&signature),
            CONTAINER_DEFAULT.captures(expression),
        ) {
            return format!("{}{}{}", &default_match[1], &type_match[1], &default_match[2]);
        }
        return expression.to_string();
    }

    let Some(default_match) = CONSTRUCTOR_DEFAULT.captures(expression) else {
        return expression.to_string();
    };
    let constructor_name = default_match[1].trim_end_matches('(');
    let mut result = expression.to_string();

    let signature = argument_type.minimal_signature();
    if let Some(type_match) = SCOPED_TYPE.captures(&signature) {
        let namespace = &type_match[1];
        if !namespace.is_empty() && constructor_name == &type_match[2] {
            result = format!("{namespace}{expression}");
        }
    }

    if let Some(class) = class {
        let value = &default_match[2];
        if class.fields().iter().any(|field| field.name == value) {
            result = format!(
                "{}{}::{}{}",
                &default_match[1],
                class.name(),
                value,
                &default_match[3]
            );
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        meta::{MetaClass, MetaField},
        typesystem::{TypeEntry, TypeEntryRc},
    };

    fn meta_type(entry: TypeEntryRc) -> MetaType {
        let mut result = MetaType::new(entry);
        result.decide_usage_pattern();
        result
    }

    #[test]
    fn test_bool_normalized() {
        let ty = meta_type(Arc::new(TypeEntry::primitive("bool")));
        assert_eq!(fix_default_value("1", &ty, None), "true");
        assert_eq!(fix_default_value("0", &ty, None), "false");
        assert_eq!(fix_default_value("-2", &ty, None), "true");
        assert_eq!(fix_default_value("true", &ty, None), "true");

        let int_type = meta_type(Arc::new(TypeEntry::primitive("int")));
        assert_eq!(fix_default_value("1", &int_type, None), "1");
    }

    #[test]
    fn test_bool_expression_kept() {
        let ty = meta_type(Arc::new(TypeEntry::primitive("bool")));
        assert_eq!(fix_default_value("kDefaultOn", &ty, None), "kDefaultOn");
        assert_eq!(fix_default_value("Config::enabled()", &ty, None), "Config::enabled()");
        assert_eq!(fix_default_value("!kQuiet", &ty, None), "!kQuiet");
    }

    #[test]
    fn test_enum_gets_scope() {
        let ty = meta_type(Arc::new(TypeEntry::enumeration("Gui::Widget::State")));
        assert_eq!(fix_default_value("Visible", &ty, None), "Gui::Widget::Visible");
        assert_eq!(fix_default_value("Other::Visible", &ty, None), "Other::Visible");
        assert_eq!(fix_default_value("4", &ty, None), "4");

        let global = meta_type(Arc::new(TypeEntry::enumeration("Mode")));
        assert_eq!(fix_default_value("Fast", &global, None), "Fast");
    }

    #[test]
    fn test_container_instantiation_rewritten() {
        let mut list = MetaType::new(Arc::new(TypeEntry::container("QList")));
        list.add_instantiation(meta_type(Arc::new(TypeEntry::value("QString"))))
            .unwrap();
        list.decide_usage_pattern();
        assert_eq!(
            fix_default_value("QList<String>()", &list, None),
            "QList<QString>()"
        );
    }

    #[test]
    fn test_constructor_and_field_scope() {
        let ty = meta_type(Arc::new(TypeEntry::value("Gui::Color")));
        assert_eq!(fix_default_value("Color()", &ty, None), "Gui::Color()");
        assert_eq!(fix_default_value("QColor()", &ty, None), "QColor()");

        let owner = Arc::new(MetaClass::new(
            Arc::new(TypeEntry::value("Palette")),
            Vec::new(),
            Vec::new(),
        ));
        owner.add_field(Arc::new(MetaField::new("defaultColor", ty.clone())));
        assert_eq!(
            fix_default_value("defaultColor", &ty, Some(&owner)),
            "Palette::defaultColor"
        );
    }
}
