//! Rejection bookkeeping.
//!
//! Everything the builder leaves out is recorded in a [`RejectionLog`] under one of four
//! [`RejectionCategory`] values with a [`RejectReason`]. The log keeps insertion order and
//! renders the classic plain-text report, one section per reason framed by lines of 72
//! asterisks.

use std::fmt::Write;

use strum::{Display, EnumIter, IntoEnumIterator};

const FRAME_WIDTH: usize = 72;

/// Why an entity was left out.
///
/// The declaration order is the order of the sections in a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RejectReason {
    /// No rule database entry
    #[strum(to_string = "Not in type system")]
    NotInTypeSystem,
    /// A rule or a `NOTHING` code generation setting excluded it
    #[strum(to_string = "Generation disabled by type system")]
    GenerationDisabled,
    /// The name is registered, but not as a class
    #[strum(to_string = "Type redefined to not be a class")]
    RedefinedToNotClass,
    /// The return type does not resolve
    #[strum(to_string = "Unmatched return type")]
    UnmatchedReturnType,
    /// An argument type does not resolve
    #[strum(to_string = "Unmatched argument type")]
    UnmatchedArgumentType,
    /// Not expressible in the target API
    #[strum(to_string = "Incompatible API")]
    ApiIncompatible,
    /// Deprecated and deprecated functions are skipped
    #[strum(to_string = "Deprecated")]
    Deprecated,
}

/// The kind of entity a rejection is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RejectionCategory {
    /// Classes and namespaces
    #[strum(to_string = "classes")]
    Class,
    /// Enums
    #[strum(to_string = "enums")]
    Enum,
    /// Functions
    #[strum(to_string = "functions")]
    Function,
    /// Fields
    #[strum(to_string = "fields")]
    Field,
}

/// One rejected entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectionRecord {
    /// Qualified name or signature
    pub key: String,
    /// Why it was left out
    pub reason: RejectReason,
    /// Matching rule or other detail
    pub detail: Option<String>,
}

/// Insertion-ordered rejection records per category. A key appears once per category; a
/// repeated key updates the existing record.
#[derive(Debug, Clone, Default)]
pub struct RejectionLog {
    classes: Vec<RejectionRecord>,
    enums: Vec<RejectionRecord>,
    functions: Vec<RejectionRecord>,
    fields: Vec<RejectionRecord>,
}

impl RejectionLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn records_mut(&mut self, category: RejectionCategory) -> &mut Vec<RejectionRecord> {
        match category {
            RejectionCategory::Class => &mut self.classes,
            RejectionCategory::Enum => &mut self.enums,
            RejectionCategory::Function => &mut self.functions,
            RejectionCategory::Field => &mut self.fields,
        }
    }

    /// Record a rejection.
    ///
    /// ## Arguments
    /// * 'category' - What kind of entity was rejected
    /// * 'key' - Its qualified name or signature
    /// * 'reason' - Why
    /// * 'detail' - Optional matching rule or message
    pub fn record(
        &mut self,
        category: RejectionCategory,
        key: &str,
        reason: RejectReason,
        detail: Option<String>,
    ) {
        let records = self.records_mut(category);
        if let Some(existing) = records.iter_mut().find(|record| record.key == key) {
            existing.reason = reason;
            existing.detail = detail;
            return;
        }
        records.push(RejectionRecord {
            key: key.to_string(),
            reason,
            detail,
        });
    }

    /// Records of one category in insertion order.
    #[must_use]
    pub fn entries(&self, category: RejectionCategory) -> &[RejectionRecord] {
        match category {
            RejectionCategory::Class => &self.classes,
            RejectionCategory::Enum => &self.enums,
            RejectionCategory::Function => &self.functions,
            RejectionCategory::Field => &self.fields,
        }
    }

    /// The record for `key`, if rejected.
    #[must_use]
    pub fn find(&self, category: RejectionCategory, key: &str) -> Option<&RejectionRecord> {
        self.entries(category).iter().find(|record| record.key == key)
    }

    /// Returns true if `key` was rejected.
    #[must_use]
    pub fn contains(&self, category: RejectionCategory, key: &str) -> bool {
        self.find(category, key).is_some()
    }

    /// Number of records of `category` rejected for `reason`.
    #[must_use]
    pub fn count(&self, category: RejectionCategory, reason: RejectReason) -> usize {
        self.entries(category)
            .iter()
            .filter(|record| record.reason == reason)
            .count()
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len() + self.enums.len() + self.functions.len() + self.fields.len()
    }

    /// Returns true if nothing was rejected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the report for one category.
    ///
    /// Every reason gets a section, in [`RejectReason`] order, even when it is empty.
    #[must_use]
    pub fn render(&self, category: RejectionCategory) -> String {
        let frame = "*".repeat(FRAME_WIDTH);
        let mut output = String::new();
        for reason in RejectReason::iter() {
            let _ = writeln!(output, "{frame}");
            let _ = writeln!(output, "{reason}");
            let _ = writeln!(output);
            for record in self.entries(category).iter().filter(|r| r.reason == reason) {
                match &record.detail {
                    Some(detail) => {
                        let _ = writeln!(output, " - {} ({})", record.key, detail);
                    }
                    None => {
                        let _ = writeln!(output, " - {}", record.key);
                    }
                }
            }
            let _ = writeln!(output, "{frame}");
            let _ = writeln!(output);
        }
        output
    }

    /// Render all four categories as `(name, report)` pairs, one per log file.
    #[must_use]
    pub fn render_all(&self) -> Vec<(String, String)> {
        RejectionCategory::iter()
            .map(|category| (category.to_string(), self.render(category)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_update() {
        let mut log = RejectionLog::new();
        log.record(RejectionCategory::Class, "Hidden", RejectReason::NotInTypeSystem, None);
        log.record(RejectionCategory::Class, "Other", RejectReason::GenerationDisabled, None);
        log.record(
            RejectionCategory::Class,
            "Hidden",
            RejectReason::GenerationDisabled,
            Some("excluded".to_string()),
        );

        let keys: Vec<&str> = log
            .entries(RejectionCategory::Class)
            .iter()
            .map(|r| r.key.as_str())
            .collect();
        assert_eq!(keys, vec!["Hidden", "Other"]);
        assert_eq!(
            log.count(RejectionCategory::Class, RejectReason::GenerationDisabled),
            2
        );
        assert!(log.contains(RejectionCategory::Class, "Other"));
        assert!(!log.contains(RejectionCategory::Function, "Other"));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_render() {
        let mut log = RejectionLog::new();
        log.record(
            RejectionCategory::Function,
            "Widget::frobnicate(Gadget)",
            RejectReason::UnmatchedArgumentType,
            None,
        );

        let report = log.render(RejectionCategory::Function);
        let frame = "*".repeat(72);
        assert!(report.starts_with(&format!("{frame}\nNot in type system\n\n{frame}\n\n")));
        assert!(report.contains("Unmatched argument type\n\n - Widget::frobnicate(Gadget)\n"));
        assert_eq!(report.matches(&frame).count(), 14);
        assert!(report.ends_with(&format!("Deprecated\n\n{frame}\n\n")));
    }

    #[test]
    fn test_reason_titles() {
        let titles: Vec<String> = RejectReason::iter().map(|r| r.to_string()).collect();
        assert_eq!(
            titles,
            vec![
                "Not in type system",
                "Generation disabled by type system",
                "Type redefined to not be a class",
                "Unmatched return type",
                "Unmatched argument type",
                "Incompatible API",
                "Deprecated",
            ]
        );
    }
}
