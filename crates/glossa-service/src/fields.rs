use serde::Deserialize;

use glossa_core::tokenize;
use glossa_core::{Language, Term, TermStatus, TermStore};

use crate::error::{Result, ServiceError};

// ---------------------------------------------------------------------------
// TermFields
// ---------------------------------------------------------------------------

/// Untrusted key-value form input for a term.
///
/// The web layer deserializes whatever the client posted into this struct;
/// [`TermFields::apply`] validates it and maps each field onto a [`Term`]
/// explicitly. Nothing is bound by reflection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TermFields {
    pub text: String,
    pub translation: Option<String>,
    pub pronunciation: Option<String>,
    pub status: TermStatus,
    pub tags: Vec<String>,
    /// Parent term texts; parents that do not exist yet are created.
    pub parents: Vec<String>,
    pub image: Option<String>,
}

impl TermFields {
    /// Validate this input and copy it onto `term`.
    ///
    /// Fails with `EmptyText` when the text normalizes to nothing, and with
    /// `DuplicateTerm` when another persisted term already holds the same
    /// (language, text_lc) pair. On success the term's canonical fields are
    /// re-derived and its parents replaced; the term itself is not saved.
    pub fn apply(
        &self,
        store: &dyn TermStore,
        language: &Language,
        term: &mut Term,
    ) -> Result<()> {
        let spec = Term::new(language, &self.text);
        if spec.text.is_empty() {
            return Err(ServiceError::EmptyText);
        }

        if let Some(existing) = store.find_by_spec(&spec)? {
            if existing.id != term.id {
                return Err(ServiceError::DuplicateTerm(spec.text));
            }
        }

        term.set_text(language, &self.text);
        term.translation = self.translation.clone();
        term.pronunciation = self.pronunciation.clone();
        term.status = self.status;
        term.tags = self.tags.clone();
        term.image = self.image.clone();

        term.parents.clear();
        for parent_text in &self.parents {
            if tokenize::normalize_text(parent_text).is_empty() {
                continue;
            }
            let parent_spec = Term::new(language, parent_text);
            // Never create a row for the term's own spec.
            if parent_spec.same_word_as(term) {
                continue;
            }
            let parent = match store.find_by_spec(&parent_spec)? {
                Some(existing) => existing,
                None => {
                    store.save_term(&parent_spec)?;
                    parent_spec
                }
            };
            term.add_parent(parent);
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
