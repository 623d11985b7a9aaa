//! Header text handling: quote stripping, field-count fitting, ASCII folding
//! and the final standardized form.
//!
//! A header looks like `>EUK1703800;Fungi;Ascomycota;...` where the first
//! field is the accession ID and the remaining fields are taxonomic ranks,
//! `.` or empty meaning unclassified.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::fasta::HEADER_MARKER;
use crate::taxonomy::UNCLASSIFIED;

/// Separator between the accession and the taxonomic rank fields.
pub const FIELD_SEPARATOR: char = ';';

/// Strips one layer of wrapping quotes if present, then removes any quote
/// characters that remain anywhere in the line.
pub fn strip_quotes(line: &str) -> String {
    let line = match line.strip_prefix('"') {
        Some(rest) => rest.strip_suffix('"').unwrap_or(rest),
        None => line,
    };
    line.replace('"', "")
}

/// Fits a header line to exactly `expected_fields` semicolon-delimited
/// fields: surplus fields are dropped, missing ranks are padded with the
/// unclassified placeholder. The marker stays glued to the accession field.
pub fn fit_fields(line: &str, expected_fields: usize) -> String {
    let mut fields: Vec<&str> = line
        .split(FIELD_SEPARATOR)
        .take(expected_fields)
        .collect();
    while fields.len() < expected_fields {
        fields.push(UNCLASSIFIED);
    }
    fields.join(";")
}

/// Folds text to its closest ASCII-compatible form: NFKD decomposition with
/// combining marks dropped.
pub fn fold_to_ascii(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Full normalization applied to header lines during the filter stage.
pub fn normalize_header(line: &str, expected_fields: usize) -> String {
    let line = strip_quotes(line);
    let line = fit_fields(&line, expected_fields);
    fold_to_ascii(&line)
}

/// Extracts the accession ID, the first field of a header line with the
/// marker stripped. Returns `None` for a non-header line or an empty field.
pub fn accession(header: &str) -> Option<&str> {
    let body = header.strip_prefix(HEADER_MARKER)?;
    let first = body.split(FIELD_SEPARATOR).next().unwrap_or("");
    if first.is_empty() {
        None
    } else {
        Some(first)
    }
}

/// The taxonomic rank fields of a header, accession excluded.
pub fn rank_fields(header: &str) -> Vec<&str> {
    header
        .trim_start_matches(HEADER_MARKER)
        .trim_end_matches(FIELD_SEPARATOR)
        .split(FIELD_SEPARATOR)
        .skip(1)
        .collect()
}

/// Final standardized form: exactly the first `expected_fields` fields,
/// padded where short, rejoined and terminated by a single trailing
/// separator.
///
/// Idempotent: one existing trailing separator is stripped before splitting,
/// so reapplying the pass never doubles it.
pub fn standardize(header: &str, expected_fields: usize) -> String {
    let body = header.trim_start_matches(HEADER_MARKER).trim();
    let body = body.strip_suffix(FIELD_SEPARATOR).unwrap_or(body);
    format!(
        "{}{};",
        HEADER_MARKER,
        fit_fields(body, expected_fields)
    )
}
