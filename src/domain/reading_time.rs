//! Reading-time estimation for post bodies.
//!
//! Hangul is counted per character, everything else per word. Markup is
//! stripped first so tag names do not inflate the estimate.

const WORDS_PER_MINUTE: f64 = 200.0;
const HANGUL_CHARS_PER_MINUTE: f64 = 500.0;

/// Estimate reading time in whole minutes, never less than one.
pub fn estimate_minutes(content: &str) -> i32 {
    if content.is_empty() {
        return 1;
    }

    let mut hangul_chars = 0u64;
    let mut words = 0u64;
    let mut in_word = false;

    for ch in strip_tags(content).chars() {
        if is_hangul(ch) {
            hangul_chars += 1;
            in_word = false;
        } else if ch.is_alphanumeric() {
            if !in_word {
                words += 1;
                in_word = true;
            }
        } else {
            in_word = false;
        }
    }

    let minutes = hangul_chars as f64 / HANGUL_CHARS_PER_MINUTE + words as f64 / WORDS_PER_MINUTE;
    if minutes < 1.0 {
        return 1;
    }

    (minutes + 0.5).floor() as i32
}

fn strip_tags(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut in_tag = false;

    for ch in input.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => output.push(ch),
            _ => {}
        }
    }

    output
}

fn is_hangul(ch: char) -> bool {
    matches!(
        ch,
        '\u{1100}'..='\u{11FF}'
            | '\u{3130}'..='\u{318F}'
            | '\u{A960}'..='\u{A97F}'
            | '\u{AC00}'..='\u{D7A3}'
            | '\u{D7B0}'..='\u{D7FF}'
            | '\u{FFA0}'..='\u{FFDC}'
    )
}
