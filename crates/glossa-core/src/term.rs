use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::language::Language;
use crate::tokenize;

// ---------------------------------------------------------------------------
// TermStatus
// ---------------------------------------------------------------------------

/// Learning-progress value of a term.
///
/// `Unknown` is a sentinel for terms that were never classified; it is
/// excluded from user-facing status pickers (see [`TermStatus::selectable`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    Unknown,
    #[default]
    Level1,
    Level2,
    Level3,
    Level4,
    Level5,
    Ignored,
    WellKnown,
}

impl TermStatus {
    /// Integer mapping used in storage and exports. The learning levels map
    /// to 1–5; `Ignored` and `WellKnown` keep their historical 98/99 slots.
    pub fn as_i64(&self) -> i64 {
        match self {
            TermStatus::Unknown => 0,
            TermStatus::Level1 => 1,
            TermStatus::Level2 => 2,
            TermStatus::Level3 => 3,
            TermStatus::Level4 => 4,
            TermStatus::Level5 => 5,
            TermStatus::Ignored => 98,
            TermStatus::WellKnown => 99,
        }
    }

    /// Statuses a user may pick, in display order. `Unknown` is excluded.
    pub fn selectable() -> [TermStatus; 7] {
        [
            TermStatus::Level1,
            TermStatus::Level2,
            TermStatus::Level3,
            TermStatus::Level4,
            TermStatus::Level5,
            TermStatus::Ignored,
            TermStatus::WellKnown,
        ]
    }
}

impl From<i64> for TermStatus {
    fn from(value: i64) -> Self {
        match value {
            1 => TermStatus::Level1,
            2 => TermStatus::Level2,
            3 => TermStatus::Level3,
            4 => TermStatus::Level4,
            5 => TermStatus::Level5,
            98 => TermStatus::Ignored,
            99 => TermStatus::WellKnown,
            _ => TermStatus::Unknown, // graceful fallback
        }
    }
}

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// A recorded vocabulary item in a given language.
///
/// The canonical fields `text`, `text_lc`, and `token_count` are derived at
/// construction (and on [`Term::set_text`]) from the raw input and the
/// language's tokenization rules; `text_lc` is always the lowercase form of
/// `text`, and `token_count` is at least 1 whenever `text` is non-empty.
///
/// `parents` is a non-owning association to base terms (e.g. the dictionary
/// form of an inflection); stores load it one level deep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Term {
    pub id: Uuid,
    pub language_id: Uuid,
    /// Canonical display text; whitespace-normalised, case preserved.
    pub text: String,
    /// Lowercase form of `text`, used for case-insensitive matching.
    pub text_lc: String,
    /// Number of word-tokens in `text` per the language's rules (>= 1 for
    /// non-empty text).
    pub token_count: usize,
    pub status: TermStatus,
    pub translation: Option<String>,
    pub pronunciation: Option<String>,
    pub image: Option<String>,
    /// Pending notice (e.g. from a bulk import); cleared when the user opens
    /// the term for editing.
    pub flash_message: Option<String>,
    pub tags: Vec<String>,
    pub parents: Vec<Term>,
    pub created_at: DateTime<Utc>,
}

impl Term {
    /// Construct a transient term from raw text, normalizing immediately.
    pub fn new(language: &Language, raw_text: &str) -> Self {
        let mut term = Self {
            id: Uuid::new_v4(),
            language_id: language.id,
            text: String::new(),
            text_lc: String::new(),
            token_count: 1,
            status: TermStatus::Level1,
            translation: None,
            pronunciation: None,
            image: None,
            flash_message: None,
            tags: Vec::new(),
            parents: Vec::new(),
            created_at: Utc::now(),
        };
        term.set_text(language, raw_text);
        term
    }

    /// Replace the term text, re-deriving all canonical fields.
    pub fn set_text(&mut self, language: &Language, raw_text: &str) {
        let text = tokenize::normalize_text(raw_text);
        self.text_lc = text.to_lowercase();
        self.token_count = tokenize::token_count(&text, language);
        self.text = text;
    }

    /// The lookup/deduplication equality contract: two terms are the same
    /// word iff they share a language and a lowercase text.
    pub fn same_word_as(&self, other: &Term) -> bool {
        self.language_id == other.language_id && self.text_lc == other.text_lc
    }

    /// Add a parent term.
    ///
    /// A candidate that is the term itself under [`Term::same_word_as`] is
    /// silently dropped: this covers both the identical instance and a
    /// distinct instance normalizing to the same (language, text) pair, and
    /// so prevents a one-hop self-cycle. Multi-hop cycles are not guarded
    /// here. Adding an already-present parent is a no-op.
    pub fn add_parent(&mut self, parent: Term) {
        if self.same_word_as(&parent) {
            return;
        }
        if self.parents.iter().any(|p| p.same_word_as(&parent)) {
            return;
        }
        self.parents.push(parent);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
