//! Requirement matching: how many completed uploads each required category has,
//! and whether all of them are satisfied.
//!
//! Pure functions, linear in the number of uploads; safe to call after every
//! status change.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{
    CompletedUpload, RequiredDocument, RequirementReport, UploadItem, ValidationResult,
};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Lowercase and collapse each whitespace run into one underscore:
/// "Bank Statements" -> "bank_statements".
pub fn normalize_label(label: &str) -> String {
    WHITESPACE
        .replace_all(&label.to_lowercase(), "_")
        .into_owned()
}

/// Quantity inferred from a category label: six bank statements, three
/// financial statements, one of anything else.
pub fn required_count_for(label: &str) -> u32 {
    let lower = label.to_lowercase();
    if lower.contains("bank") && lower.contains("statement") {
        6
    } else if lower.contains("financial") && lower.contains("statement") {
        3
    } else {
        1
    }
}

/// Group key of a required category.
pub fn requirement_key(required: &RequiredDocument) -> String {
    match &required.document_type {
        Some(tag) => normalize_label(tag),
        None => normalize_label(&required.label),
    }
}

/// Count completed uploads against the required categories.
///
/// A file name is counted once, under the first category it completed in.
/// Later completions of the same name under a different category are listed
/// in `duplicates` and ignored.
pub fn validate_requirements(
    required: &[RequiredDocument],
    completed: &[CompletedUpload],
) -> RequirementReport {
    if required.is_empty() {
        return RequirementReport::passthrough();
    }

    let mut first_group: HashMap<&str, String> = HashMap::new();
    let mut counts: HashMap<String, u32> = HashMap::new();
    let mut duplicates: Vec<String> = Vec::new();

    for upload in completed {
        let group = normalize_label(&upload.document_type);
        match first_group.get(upload.file_name.as_str()) {
            Some(existing) if *existing != group => {
                if !duplicates.contains(&upload.file_name) {
                    tracing::warn!(
                        file_name = %upload.file_name,
                        first = %existing,
                        second = %group,
                        "File completed under two document types, counting it once"
                    );
                    duplicates.push(upload.file_name.clone());
                }
                continue;
            }
            Some(_) => {}
            None => {
                first_group.insert(upload.file_name.as_str(), group.clone());
            }
        }
        *counts.entry(group).or_insert(0) += 1;
    }

    let results: Vec<ValidationResult> = required
        .iter()
        .map(|req| {
            let key = requirement_key(req);
            let required_count = req
                .required_count
                .unwrap_or_else(|| required_count_for(&req.label));
            let uploaded = counts.get(&key).copied().unwrap_or(0);
            ValidationResult {
                label: req.label.clone(),
                document_type: key,
                required: required_count,
                uploaded,
                complete: uploaded >= required_count,
            }
        })
        .collect();

    let all_complete = results.iter().all(|r| r.complete);

    tracing::debug!(
        complete = results.iter().filter(|r| r.complete).count(),
        total = results.len(),
        all_complete,
        "Document requirements evaluated"
    );

    RequirementReport {
        all_complete,
        results,
        duplicates,
    }
}

/// Same as [`validate_requirements`], reading completed items from the upload list.
pub fn validate_items(required: &[RequiredDocument], items: &[UploadItem]) -> RequirementReport {
    let completed: Vec<CompletedUpload> =
        items.iter().filter_map(CompletedUpload::from_item).collect();
    validate_requirements(required, &completed)
}

/// File names that completed under more than one normalized category.
pub fn cross_category_duplicates(completed: &[CompletedUpload]) -> Vec<String> {
    let mut groups: HashMap<&str, HashSet<String>> = HashMap::new();
    for upload in completed {
        groups
            .entry(upload.file_name.as_str())
            .or_default()
            .insert(normalize_label(&upload.document_type));
    }
    let mut names: Vec<String> = groups
        .into_iter()
        .filter(|(_, g)| g.len() > 1)
        .map(|(name, _)| name.to_string())
        .collect();
    names.sort();
    names
}
