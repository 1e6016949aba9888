//! Ranked full-text search backed by the storage's FTS5 index.

use std::sync::LazyLock;

use regex::Regex;

use relkit_core::config::SimilarityConfig;
use relkit_core::errors::RelkitResult;
use relkit_core::traits::IEntityStorage;
use relkit_observability::search_span;
use relkit_queryset::QuerySet;

use crate::document::check_fields;
use crate::similarity::Scored;

static WORD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\w+").ok());
static OPERATORS: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[!'()|&]").ok());

const NO_LIMIT: usize = i64::MAX as usize;

/// Every word of `text` must appear; best rank first.
pub fn full_text_search<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    text: &str,
) -> RelkitResult<Vec<Scored<f64>>> {
    let span = search_span!(queryset.entity_type(), "full_text");
    let _guard = span.enter();

    check_fields(queryset.model()?, fields)?;
    let Some(query) = words_query(text) else {
        return Ok(Vec::new());
    };
    search(queryset, fields, &query, NO_LIMIT, None)
}

/// Search with AND-ed terms where the last term, and any term written with a
/// trailing `*`, matches as a prefix. Only results ranked above `min_rank`
/// are kept, at most `max_results` of them.
pub fn run_partial_search<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    text: &str,
    fields: &[&str],
    max_results: usize,
    min_rank: f64,
) -> RelkitResult<Vec<Scored<f64>>> {
    let span = search_span!(queryset.entity_type(), "partial");
    let _guard = span.enter();

    check_fields(queryset.model()?, fields)?;
    let Some(query) = partial_query(text) else {
        return Ok(Vec::new());
    };
    search(queryset, fields, &query, max_results, Some(min_rank))
}

/// `run_partial_search` with limits from `config`.
pub fn run_partial_search_with_config<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    text: &str,
    fields: &[&str],
    config: &SimilarityConfig,
) -> RelkitResult<Vec<Scored<f64>>> {
    run_partial_search(queryset, text, fields, config.max_search_results, config.min_search_rank)
}

fn search<S: IEntityStorage>(
    queryset: &QuerySet<'_, S>,
    fields: &[&str],
    query: &str,
    limit: usize,
    min_rank: Option<f64>,
) -> RelkitResult<Vec<Scored<f64>>> {
    tracing::debug!(entity_type = %queryset.entity_type(), query, "fts query");
    let ranked = queryset.storage().search_fulltext(
        queryset.entity_type(),
        fields,
        query,
        queryset.filter(),
        limit,
    )?;
    Ok(ranked
        .into_iter()
        .filter(|(_, rank)| min_rank.map_or(true, |min| *rank > min))
        .map(|(entity, score)| Scored { entity, score })
        .collect())
}

/// `"a" AND "b"` over the words of `text`.
pub(crate) fn words_query(text: &str) -> Option<String> {
    let pattern = WORD.as_ref()?;
    let terms: Vec<String> = pattern
        .find_iter(text)
        .map(|m| quote(m.as_str()))
        .collect();
    (!terms.is_empty()).then(|| terms.join(" AND "))
}

pub(crate) fn partial_query(text: &str) -> Option<String> {
    let cleaned = match OPERATORS.as_ref() {
        Some(pattern) => pattern.replace_all(text, " ").into_owned(),
        None => text.to_string(),
    };
    let tokens: Vec<(&str, bool)> = cleaned
        .split_whitespace()
        .map(|token| {
            let bare = token.trim_end_matches('*');
            (bare, bare.len() != token.len())
        })
        .filter(|(bare, _)| bare.chars().any(char::is_alphanumeric))
        .collect();

    let last = tokens.len().checked_sub(1)?;
    let terms: Vec<String> = tokens
        .iter()
        .enumerate()
        .map(|(i, (bare, starred))| {
            if *starred || i == last {
                format!("{}*", quote(bare))
            } else {
                quote(bare)
            }
        })
        .collect();
    Some(terms.join(" AND "))
}

fn quote(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}
