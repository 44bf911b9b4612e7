//! Utilities for generating deterministic, human-friendly slugs.
//!
//! ASCII letters and digits are kept as-is and Hangul syllables survive
//! untouched, so “Rust의 기초” becomes `rust의-기초`. Letters from other
//! scripts are transliterated through the `slug` crate (“Crème” → `creme`).
//! Everything else collapses into single hyphens.

use slug::slugify;
use thiserror::Error;

const HANGUL_SYLLABLES: std::ops::RangeInclusive<char> = '\u{AC00}'..='\u{D7A3}';

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
}

/// Derive a slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let mut output = String::with_capacity(input.len());

    for ch in input.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() || is_hangul_syllable(ch) {
            output.push(ch);
            continue;
        }

        if ch.is_ascii() || !ch.is_alphanumeric() {
            push_separator(&mut output);
            continue;
        }

        let transliterated = slugify(ch.to_string());
        if transliterated.is_empty() {
            push_separator(&mut output);
        } else {
            output.push_str(&transliterated);
        }
    }

    let candidate = output.trim_matches('-');
    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate.to_string())
}

/// Resolve the slug for a record: an explicit slug is normalised, otherwise
/// the fallback text (title or name) is slugified.
pub fn resolve_slug(explicit: Option<&str>, fallback: &str) -> Result<String, SlugError> {
    match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => derive_slug(value),
        None => derive_slug(fallback),
    }
}

pub fn is_hangul_syllable(ch: char) -> bool {
    HANGUL_SYLLABLES.contains(&ch)
}

fn push_separator(buffer: &mut String) {
    if !buffer.is_empty() && !buffer.ends_with('-') {
        buffer.push('-');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_slug_lowercases_and_hyphenates() {
        assert_eq!(derive_slug("Hello World").expect("slug"), "hello-world");
        assert_eq!(
            derive_slug("  --Hello!!   World--  ").expect("slug"),
            "hello-world"
        );
    }

    #[test]
    fn derive_slug_keeps_hangul() {
        assert_eq!(derive_slug("Rust의 기초").expect("slug"), "rust의-기초");
        assert_eq!(derive_slug("안녕하세요 세계").expect("slug"), "안녕하세요-세계");
    }

    #[test]
    fn derive_slug_transliterates_latin_letters() {
        assert_eq!(derive_slug("Crème Brûlée").expect("slug"), "creme-brulee");
    }

    #[test]
    fn derive_slug_rejects_empty_and_symbol_only_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
        assert_eq!(
            derive_slug("!!! ???"),
            Err(SlugError::Unrepresentable {
                input: "!!! ???".to_string()
            })
        );
    }

    #[test]
    fn resolve_slug_prefers_explicit_value() {
        assert_eq!(
            resolve_slug(Some("Custom Slug"), "Ignored Title").expect("slug"),
            "custom-slug"
        );
        assert_eq!(
            resolve_slug(Some("   "), "Fallback Title").expect("slug"),
            "fallback-title"
        );
        assert_eq!(
            resolve_slug(None, "Fallback Title").expect("slug"),
            "fallback-title"
        );
    }
}
