use std::collections::HashMap;
use std::io::Write;

use uuid::Uuid;

use glossa_core::{GlossaError, TermFilter, TermStore};

use crate::error::Result;

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Column headings of the term export, in output order.
pub const EXPORT_HEADINGS: [&str; 8] = [
    "term",
    "parent",
    "translation",
    "language",
    "tags",
    "added",
    "status",
    "pronunciation",
];

/// Write the terms matching `filter` to `out` as CSV.
///
/// Fields containing commas, quotes, or newlines are quoted per RFC 4180.
/// Multi-valued columns (parents, tags) are joined with `", "`.
pub fn export_terms_csv<W: Write>(
    store: &dyn TermStore,
    filter: &TermFilter,
    mut out: W,
) -> Result<()> {
    let terms = store.list_terms(filter)?;

    let mut language_names: HashMap<Uuid, String> = HashMap::new();

    write_row(&mut out, &EXPORT_HEADINGS).map_err(GlossaError::Io)?;
    for term in &terms {
        let language = match language_names.get(&term.language_id) {
            Some(name) => name.clone(),
            None => {
                let name = store.get_language(&term.language_id)?.name;
                language_names.insert(term.language_id, name.clone());
                name
            }
        };
        let parents = term
            .parents
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let row = [
            term.text.clone(),
            parents,
            term.translation.clone().unwrap_or_default(),
            language,
            term.tags.join(", "),
            term.created_at.format("%Y-%m-%d").to_string(),
            term.status.as_i64().to_string(),
            term.pronunciation.clone().unwrap_or_default(),
        ];
        write_row(&mut out, &row).map_err(GlossaError::Io)?;
    }
    Ok(())
}

fn write_row<W: Write, S: AsRef<str>>(out: &mut W, fields: &[S]) -> std::io::Result<()> {
    let line = fields
        .iter()
        .map(|f| csv_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{line}")
}

/// Quote a field when it contains a comma, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
