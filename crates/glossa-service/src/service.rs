use uuid::Uuid;

use glossa_core::tokenize;
use glossa_core::{Language, Term, TermStatus, TermStore};

use crate::error::{Result, ServiceError};

// ---------------------------------------------------------------------------
// StatusUpdate
// ---------------------------------------------------------------------------

/// One group of a bulk status change: every listed term gets `new_status`.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub new_status: TermStatus,
    pub term_ids: Vec<Uuid>,
}

// ---------------------------------------------------------------------------
// TermService
// ---------------------------------------------------------------------------

pub struct TermService;

impl TermService {
    /// Return the persisted term matching `text` in `language`, or a fresh
    /// transient term when none exists.
    pub fn find_or_new(store: &dyn TermStore, language: &Language, text: &str) -> Result<Term> {
        let spec = Term::new(language, text);
        match store.find_by_spec(&spec)? {
            Some(existing) => Ok(existing),
            None => Ok(spec),
        }
    }

    /// Load a term for the edit form.
    ///
    /// An unclassified term is bumped to the first learning level, and a
    /// pending flash message is cleared — opening the form acknowledges it.
    /// Both changes are in-memory only; the caller saves on submit.
    pub fn load_for_edit(store: &dyn TermStore, id: &Uuid) -> Result<Term> {
        let mut term = store.get_term(id)?;
        if term.status == TermStatus::Unknown {
            term.status = TermStatus::Level1;
        }
        term.flash_message = None;
        Ok(term)
    }

    pub fn bulk_update_status(store: &dyn TermStore, updates: &[StatusUpdate]) -> Result<()> {
        for update in updates {
            for id in &update.term_ids {
                let mut term = store.get_term(id)?;
                term.status = update.new_status;
                store.save_term(&term)?;
            }
        }
        Ok(())
    }

    /// Replace the parents of every listed term with the single term named
    /// by `parent_text`, creating and saving it when it does not exist yet.
    ///
    /// All listed terms must belong to one language; a term that is itself
    /// the named parent simply ends up with no parents (the entity guard
    /// drops the self-reference).
    pub fn bulk_set_parent(
        store: &dyn TermStore,
        parent_text: &str,
        term_ids: &[Uuid],
    ) -> Result<()> {
        if term_ids.is_empty() {
            return Ok(());
        }
        if tokenize::normalize_text(parent_text).is_empty() {
            return Err(ServiceError::EmptyParentText);
        }

        let mut terms = Vec::with_capacity(term_ids.len());
        for id in term_ids {
            terms.push(store.get_term(id)?);
        }
        let language_id = terms[0].language_id;
        if terms.iter().any(|t| t.language_id != language_id) {
            return Err(ServiceError::MixedLanguages);
        }

        let language = store.get_language(&language_id)?;
        let parent = Self::find_or_new(store, &language, parent_text)?;
        store.save_term(&parent)?;

        for term in &mut terms {
            term.parents.clear();
            term.add_parent(parent.clone());
            store.save_term(term)?;
        }
        Ok(())
    }

    pub fn bulk_delete(store: &dyn TermStore, term_ids: &[Uuid]) -> Result<()> {
        for id in term_ids {
            store.delete_term(id)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_core::{create_memory_pool, GlossaError, SqliteTermStore};

    fn setup() -> (SqliteTermStore, Language) {
        let pool = create_memory_pool().expect("memory pool");
        let store = SqliteTermStore::new(pool);
        let lang = Language::new("Spanish", "a-zA-ZÀ-ÖØ-öø-ȳ").expect("valid language");
        store.insert_language(&lang).expect("insert language");
        (store, lang)
    }

    #[test]
    fn find_or_new_returns_persisted_match() {
        let (store, lang) = setup();
        let term = Term::new(&lang, "gato");
        store.save_term(&term).unwrap();

        let found = TermService::find_or_new(&store, &lang, "GATO").unwrap();
        assert_eq!(found.id, term.id);
    }

    #[test]
    fn find_or_new_returns_transient_term() {
        let (store, lang) = setup();
        let term = TermService::find_or_new(&store, &lang, "  gato  ").unwrap();
        assert_eq!(term.text, "gato");
        // Nothing was persisted.
        assert!(matches!(
            store.get_term(&term.id),
            Err(GlossaError::NotFound(_))
        ));
    }

    #[test]
    fn load_for_edit_bumps_unknown_and_clears_flash() {
        let (store, lang) = setup();
        let mut term = Term::new(&lang, "gato");
        term.status = TermStatus::Unknown;
        term.flash_message = Some("imported".into());
        store.save_term(&term).unwrap();

        let loaded = TermService::load_for_edit(&store, &term.id).unwrap();
        assert_eq!(loaded.status, TermStatus::Level1);
        assert!(loaded.flash_message.is_none());

        // In-memory only until the caller saves.
        let persisted = store.get_term(&term.id).unwrap();
        assert_eq!(persisted.status, TermStatus::Unknown);
        assert_eq!(persisted.flash_message.as_deref(), Some("imported"));
    }

    #[test]
    fn load_for_edit_keeps_classified_status() {
        let (store, lang) = setup();
        let mut term = Term::new(&lang, "gato");
        term.status = TermStatus::Level4;
        store.save_term(&term).unwrap();

        let loaded = TermService::load_for_edit(&store, &term.id).unwrap();
        assert_eq!(loaded.status, TermStatus::Level4);
    }

    #[test]
    fn bulk_update_status_applies_each_group() {
        let (store, lang) = setup();
        let gato = Term::new(&lang, "gato");
        let perro = Term::new(&lang, "perro");
        let el = Term::new(&lang, "el");
        for term in [&gato, &perro, &el] {
            store.save_term(term).unwrap();
        }

        let updates = [
            StatusUpdate {
                new_status: TermStatus::WellKnown,
                term_ids: vec![gato.id, perro.id],
            },
            StatusUpdate {
                new_status: TermStatus::Ignored,
                term_ids: vec![el.id],
            },
        ];
        TermService::bulk_update_status(&store, &updates).unwrap();

        assert_eq!(store.get_term(&gato.id).unwrap().status, TermStatus::WellKnown);
        assert_eq!(store.get_term(&perro.id).unwrap().status, TermStatus::WellKnown);
        assert_eq!(store.get_term(&el.id).unwrap().status, TermStatus::Ignored);
    }

    #[test]
    fn bulk_set_parent_creates_parent_and_replaces_links() {
        let (store, lang) = setup();
        let mut gatos = Term::new(&lang, "gatos");
        let old_parent = Term::new(&lang, "viejo");
        store.save_term(&old_parent).unwrap();
        gatos.add_parent(old_parent);
        store.save_term(&gatos).unwrap();
        let gatitos = Term::new(&lang, "gatitos");
        store.save_term(&gatitos).unwrap();

        TermService::bulk_set_parent(&store, "gato", &[gatos.id, gatitos.id]).unwrap();

        // The parent was created.
        let parent = store
            .find_by_spec(&Term::new(&lang, "gato"))
            .unwrap()
            .expect("parent created");

        for id in [gatos.id, gatitos.id] {
            let term = store.get_term(&id).unwrap();
            assert_eq!(term.parents.len(), 1, "old parents replaced");
            assert_eq!(term.parents[0].id, parent.id);
        }
    }

    #[test]
    fn bulk_set_parent_skips_self_reference() {
        let (store, lang) = setup();
        let gato = Term::new(&lang, "gato");
        store.save_term(&gato).unwrap();

        TermService::bulk_set_parent(&store, "GATO", &[gato.id]).unwrap();
        let term = store.get_term(&gato.id).unwrap();
        assert!(term.parents.is_empty());
    }

    #[test]
    fn bulk_set_parent_rejects_mixed_languages() {
        let (store, spanish) = setup();
        let english = Language::new("English", "a-zA-Z").unwrap();
        store.insert_language(&english).unwrap();

        let gato = Term::new(&spanish, "gato");
        let cat = Term::new(&english, "cat");
        store.save_term(&gato).unwrap();
        store.save_term(&cat).unwrap();

        let result = TermService::bulk_set_parent(&store, "animal", &[gato.id, cat.id]);
        assert!(matches!(result, Err(ServiceError::MixedLanguages)));
    }

    #[test]
    fn bulk_set_parent_rejects_blank_parent_text() {
        let (store, lang) = setup();
        let gato = Term::new(&lang, "gato");
        store.save_term(&gato).unwrap();

        let result = TermService::bulk_set_parent(&store, " \t ", &[gato.id]);
        assert!(matches!(result, Err(ServiceError::EmptyParentText)));
    }

    #[test]
    fn bulk_set_parent_with_no_ids_is_a_no_op() {
        let (store, _lang) = setup();
        TermService::bulk_set_parent(&store, "gato", &[]).unwrap();
    }

    #[test]
    fn bulk_delete_removes_terms() {
        let (store, lang) = setup();
        let gato = Term::new(&lang, "gato");
        let perro = Term::new(&lang, "perro");
        store.save_term(&gato).unwrap();
        store.save_term(&perro).unwrap();

        TermService::bulk_delete(&store, &[gato.id, perro.id]).unwrap();
        assert!(matches!(
            store.get_term(&gato.id),
            Err(GlossaError::NotFound(_))
        ));
        assert!(matches!(
            store.get_term(&perro.id),
            Err(GlossaError::NotFound(_))
        ));
    }

    #[test]
    fn bulk_delete_missing_id_errors() {
        let (store, _lang) = setup();
        let result = TermService::bulk_delete(&store, &[Uuid::new_v4()]);
        assert!(matches!(
            result,
            Err(ServiceError::Core(GlossaError::NotFound(_)))
        ));
    }
}
