//! Structural checks over a loaded catalog.
//!
//! Nothing here is derived or repaired; the checks only report. Duplicate
//! alias records are legal (the same trait can be reachable from several
//! path roots) and are never flagged.

use tracing::debug;

use super::catalog::DocCatalog;
use crate::shared_types::{ItemKind, Severity, ValidationIssue, ValidationReport};

pub fn validate(catalog: &DocCatalog) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (library, map) in catalog.aliases.iter() {
        for (token, entries) in map.iter() {
            if token.is_empty() {
                push(
                    &mut report,
                    Severity::Error,
                    format!("ALIASES[{library:?}]"),
                    "empty alias token".to_string(),
                );
            }
            for (i, entry) in entries.iter().enumerate() {
                report.alias_entries_checked += 1;
                let location = format!("ALIASES[{library:?}][{token:?}][{i}]");
                if entry.kind().is_none() {
                    push(
                        &mut report,
                        Severity::Error,
                        location.clone(),
                        format!("unknown item kind code {}", entry.ty),
                    );
                }
                if entry.path.is_empty() {
                    push(
                        &mut report,
                        Severity::Error,
                        location.clone(),
                        format!("'{}' has an empty path", entry.name),
                    );
                }
                if entry.name.is_empty() {
                    push(
                        &mut report,
                        Severity::Error,
                        location.clone(),
                        "empty item name".to_string(),
                    );
                }
                if entry.krate != library {
                    push(
                        &mut report,
                        Severity::Warning,
                        location,
                        format!(
                            "record names crate '{}' but is listed under '{library}'",
                            entry.krate
                        ),
                    );
                }
            }
        }
    }

    for (module, index) in &catalog.sidebars {
        for (category, entries) in index.iter() {
            if ItemKind::from_category(category).is_none() {
                push(
                    &mut report,
                    Severity::Warning,
                    format!("{module}[{category:?}]"),
                    format!("unknown sidebar category '{category}'"),
                );
            }
            for (i, entry) in entries.iter().enumerate() {
                report.sidebar_entries_checked += 1;
                if entry.name.is_empty() {
                    push(
                        &mut report,
                        Severity::Error,
                        format!("{module}[{category:?}][{i}]"),
                        "empty item name".to_string(),
                    );
                }
            }
        }
    }

    debug!(
        "Validated {} alias and {} sidebar entries: {} error(s), {} warning(s)",
        report.alias_entries_checked,
        report.sidebar_entries_checked,
        report.error_count(),
        report.warning_count()
    );
    report
}

fn push(report: &mut ValidationReport, severity: Severity, location: String, message: String) {
    report.issues.push(ValidationIssue {
        severity,
        location,
        message,
    });
}
