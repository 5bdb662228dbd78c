use regex::Regex;
use uuid::Uuid;

use crate::error::{GlossaError, Result};

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Tokenization rules for one language.
///
/// `word_characters` is the body of a regex character class (e.g.
/// `"a-zA-ZÀ-ÖØ-öø-ȳ"`): any character it matches is a word character, every
/// other character is a separator. `split_exceptions` are regex patterns
/// matched against a whole term, case-insensitively; a matching term is kept
/// as a single token regardless of internal punctuation (abbreviations such
/// as `"EE.UU."`).
///
/// The patterns are compiled once at construction, so a `Language` loaded
/// from storage is known to be valid.
#[derive(Debug, Clone)]
pub struct Language {
    /// Stable unique identifier (UUIDv4).
    pub id: Uuid,
    /// Human-readable language name (e.g. `"Spanish"`).
    pub name: String,
    /// `false` for character-based scripts where each word character is a
    /// token of its own.
    pub space_delimited: bool,
    /// Whether term forms should offer a pronunciation field.
    pub show_pronunciation: bool,
    word_characters: String,
    split_exceptions: Vec<String>,
    word_re: Regex,
    exception_res: Vec<Regex>,
}

impl Language {
    /// Construct a new language with a fresh id and no split exceptions.
    ///
    /// Fails with `InvalidInput` when `word_characters` does not compile as
    /// a character class.
    pub fn new(name: impl Into<String>, word_characters: impl Into<String>) -> Result<Self> {
        let word_characters = word_characters.into();
        let word_re = compile_word_class(&word_characters)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            space_delimited: true,
            show_pronunciation: true,
            word_characters,
            split_exceptions: Vec::new(),
            word_re,
            exception_res: Vec::new(),
        })
    }

    /// Reconstitute a language from stored fields, revalidating all patterns.
    pub fn from_parts(
        id: Uuid,
        name: String,
        word_characters: String,
        split_exceptions: Vec<String>,
        space_delimited: bool,
        show_pronunciation: bool,
    ) -> Result<Self> {
        let word_re = compile_word_class(&word_characters)?;
        let exception_res = split_exceptions
            .iter()
            .map(|p| compile_exception(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id,
            name,
            space_delimited,
            show_pronunciation,
            word_characters,
            split_exceptions,
            word_re,
            exception_res,
        })
    }

    /// Replace the split-exception patterns, recompiling them.
    pub fn set_split_exceptions(&mut self, patterns: Vec<String>) -> Result<()> {
        self.exception_res = patterns
            .iter()
            .map(|p| compile_exception(p))
            .collect::<Result<Vec<_>>>()?;
        self.split_exceptions = patterns;
        Ok(())
    }

    pub fn word_characters(&self) -> &str {
        &self.word_characters
    }

    pub fn split_exceptions(&self) -> &[String] {
        &self.split_exceptions
    }

    /// Return `true` if `c` is a word character in this language.
    pub fn is_word_char(&self, c: char) -> bool {
        let mut buf = [0u8; 4];
        self.word_re.is_match(c.encode_utf8(&mut buf))
    }

    /// Return `true` if any split exception matches the whole of `text`,
    /// case-insensitively.
    pub fn matches_exception(&self, text: &str) -> bool {
        self.exception_res.iter().any(|re| re.is_match(text))
    }
}

// ---------------------------------------------------------------------------
// Pattern compilation
// ---------------------------------------------------------------------------

fn compile_word_class(class: &str) -> Result<Regex> {
    Regex::new(&format!("[{class}]")).map_err(|e| {
        GlossaError::InvalidInput(format!("invalid word character class '{class}': {e}"))
    })
}

/// Exceptions match the whole string, case-insensitively.
fn compile_exception(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i)^(?:{pattern})$")).map_err(|e| {
        GlossaError::InvalidInput(format!("invalid split exception '{pattern}': {e}"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn spanish() -> Language {
        Language::new("Spanish", "a-zA-ZÀ-ÖØ-öø-ȳ").expect("valid language")
    }

    #[test]
    fn word_char_membership() {
        let lang = spanish();
        assert!(lang.is_word_char('a'));
        assert!(lang.is_word_char('ñ'));
        assert!(!lang.is_word_char('\''));
        assert!(!lang.is_word_char(' '));
        assert!(!lang.is_word_char('.'));
    }

    #[test]
    fn exception_matches_upper_and_lowercase() {
        let mut lang = spanish();
        lang.set_split_exceptions(vec!["EE.UU.".into()]).unwrap();
        assert!(lang.matches_exception("EE.UU."));
        assert!(lang.matches_exception("ee.uu."));
        assert!(!lang.matches_exception("EE.UU. hola"));
    }

    #[test]
    fn exception_is_anchored() {
        let mut lang = spanish();
        lang.set_split_exceptions(vec!["Sr\\.".into()]).unwrap();
        assert!(lang.matches_exception("Sr."));
        assert!(!lang.matches_exception("Sr. García"));
    }

    #[test]
    fn invalid_word_class_is_rejected() {
        let result = Language::new("Broken", "a-\\");
        assert!(matches!(result, Err(GlossaError::InvalidInput(_))));
    }

    #[test]
    fn invalid_exception_is_rejected() {
        let mut lang = spanish();
        let result = lang.set_split_exceptions(vec!["(".into()]);
        assert!(matches!(result, Err(GlossaError::InvalidInput(_))));
        // A failed update must not leave stale patterns behind.
        assert!(lang.split_exceptions().is_empty());
    }

    #[test]
    fn from_parts_round_trip() {
        let mut lang = spanish();
        lang.set_split_exceptions(vec!["EE.UU.".into()]).unwrap();
        let rebuilt = Language::from_parts(
            lang.id,
            lang.name.clone(),
            lang.word_characters().to_string(),
            lang.split_exceptions().to_vec(),
            lang.space_delimited,
            lang.show_pronunciation,
        )
        .expect("rebuild");
        assert_eq!(rebuilt.id, lang.id);
        assert!(rebuilt.matches_exception("ee.uu."));
    }
}
