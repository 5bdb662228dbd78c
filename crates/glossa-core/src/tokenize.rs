//! Text normalization and word-token splitting.
//!
//! Splitting rules:
//! - A term matching one of its language's split exceptions is a single
//!   token regardless of internal punctuation ("EE.UU.").
//! - Otherwise tokens are maximal runs of word characters and maximal runs
//!   of non-word characters. Punctuation glued to a space groups into one
//!   separator run, so "O' stuff" yields [O][' ][stuff].
//! - In non-space-delimited languages every word character is its own token;
//!   separator runs still group.
//!
//! Example (word class without apostrophe):
//!   "the CAT's pyjamas" → [the][ ][CAT]['][s][ ][pyjamas]  (7 tokens)

use crate::language::Language;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// One maximal run of word or non-word characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextToken {
    pub text: String,
    pub is_word: bool,
}

/// Canonicalise raw term text: collapse runs of whitespace (tabs included)
/// to single spaces and strip leading/trailing whitespace. Case is
/// preserved. Whitespace-only or empty input yields `""`.
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split `text` into tokens using `language`'s word-character rules.
///
/// `text` is expected to be normalized already; the function never fails,
/// and empty input produces no tokens.
pub fn parse_tokens(text: &str, language: &Language) -> Vec<TextToken> {
    if text.is_empty() {
        return Vec::new();
    }

    if language.matches_exception(text) {
        return vec![TextToken {
            text: text.to_string(),
            is_word: true,
        }];
    }

    let mut tokens: Vec<TextToken> = Vec::new();
    for c in text.chars() {
        let is_word = language.is_word_char(c);
        // Word characters in character-based scripts never extend a run.
        let single_char_token = is_word && !language.space_delimited;
        match tokens.last_mut() {
            Some(last) if last.is_word == is_word && !single_char_token => last.text.push(c),
            _ => tokens.push(TextToken {
                text: c.to_string(),
                is_word,
            }),
        }
    }
    tokens
}

/// Number of tokens in `text`. Empty text has zero tokens; any non-empty
/// text counts at least one, so a purely-punctuation string such as `"..."`
/// still counts as a single token.
pub fn token_count(text: &str, language: &Language) -> usize {
    parse_tokens(text, language).len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn english() -> Language {
        Language::new("English", "a-zA-Z").expect("valid language")
    }

    fn japanese() -> Language {
        let mut lang = Language::new("Japanese", r"\p{Han}\p{Hiragana}\p{Katakana}")
            .expect("valid language");
        lang.space_delimited = false;
        lang
    }

    #[test]
    fn normalize_strips_and_collapses() {
        assert_eq!(normalize_text("hola"), "hola");
        assert_eq!(normalize_text("    hola    "), "hola");
        assert_eq!(normalize_text("  hola  gato"), "hola gato");
        assert_eq!(normalize_text("HOLA hay\tgato  "), "HOLA hay gato");
        assert_eq!(normalize_text("   \t  "), "");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn normalize_preserves_case() {
        assert_eq!(normalize_text("  HOLA Gato "), "HOLA Gato");
    }

    #[test]
    fn token_count_scenarios() {
        let lang = english();
        let cases = [
            ("hola", 1),
            ("    hola    ", 1),
            ("  hola  gato", 3),
            ("HOLA hay\tgato  ", 5),
            ("  the CAT's pyjamas  ", 7),
            // 9 tokens: the "'" groups with the following space ("' ").
            ("A big CHUNK O' stuff", 9),
            ("YOU'RE", 3),
            ("...", 1),
        ];
        for (raw, expected) in cases {
            let text = normalize_text(raw);
            assert_eq!(
                token_count(&text, &lang),
                expected,
                "token count for {raw:?}"
            );
        }
    }

    #[test]
    fn tokens_alternate_word_and_separator_runs() {
        let lang = english();
        let tokens = parse_tokens("the CAT's pyjamas", &lang);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["the", " ", "CAT", "'", "s", " ", "pyjamas"]);
        assert!(tokens[0].is_word);
        assert!(!tokens[1].is_word);
    }

    #[test]
    fn glued_punctuation_groups_with_space() {
        let lang = english();
        let tokens = parse_tokens("O' stuff", &lang);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["O", "' ", "stuff"]);
    }

    #[test]
    fn exception_keeps_term_whole() {
        let mut lang = english();
        lang.set_split_exceptions(vec!["EE.UU.".into()]).unwrap();
        let tokens = parse_tokens("EE.UU.", &lang);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "EE.UU.");
        assert!(tokens[0].is_word);

        let tokens = parse_tokens("ee.uu.", &lang);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "ee.uu.");
    }

    #[test]
    fn empty_text_has_no_tokens() {
        let lang = english();
        assert!(parse_tokens("", &lang).is_empty());
        assert_eq!(token_count("", &lang), 0);
    }

    #[test]
    fn character_script_counts_each_word_char() {
        let lang = japanese();
        assert_eq!(token_count("猫", &lang), 1);
        assert_eq!(token_count("子猫", &lang), 2);
        // Separator runs still group: word, comma+space, word, word.
        let tokens = parse_tokens("猫、 子猫", &lang);
        assert_eq!(tokens.len(), 4);
    }
}
