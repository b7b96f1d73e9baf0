//! Scoring and filtering for symbol queries

use crate::index_core::SymbolRecord;
use crate::shared_types::ItemKind;

pub const EXACT_NAME_SCORE: f32 = 1.0;
pub const ALIAS_TOKEN_SCORE: f32 = 0.9;
pub const NAME_CONTAINS_SCORE: f32 = 0.75;
pub const PATH_CONTAINS_SCORE: f32 = 0.5;

/// Best score of `rec` against the query; 0.0 means no match.
///
/// `lowered` is `query` lowercased. Alias tokens compare verbatim since they
/// are mostly operators.
pub(crate) fn score(rec: &SymbolRecord, query: &str, lowered: &str) -> f32 {
    let name = rec.name.to_lowercase();
    if name == lowered {
        return EXACT_NAME_SCORE;
    }
    if rec.symbol.as_deref() == Some(query) {
        return ALIAS_TOKEN_SCORE;
    }
    if name.contains(lowered) {
        return NAME_CONTAINS_SCORE;
    }
    if rec.path.to_lowercase().contains(lowered) {
        return PATH_CONTAINS_SCORE;
    }
    0.0
}

/// Whether `kind` passes a filter of category keys or kind names.
pub fn kind_matches(kind: Option<ItemKind>, filter: &[String]) -> bool {
    if filter.is_empty() {
        return true;
    }
    let Some(kind) = kind else {
        return false;
    };
    let name = format!("{kind:?}").to_lowercase();
    filter.iter().any(|f| {
        let f = f.trim().to_lowercase();
        f == kind.category() || f == name
    })
}
