//! Message text assembly.
//!
//! Everything player-visible is composed here so the rest of the engine
//! deals in cards and state, not strings.

use crate::cards::Card;

const SENTENCE_ENDS: [char; 3] = ['.', '?', '!'];

/// The question card announcement line, with pick and draw markers when
/// they differ from the defaults.
#[must_use]
pub fn question_line(question: &Card) -> String {
    let mut line = format!("CARD: {}", question.blank_text());
    if question.pick > 1 {
        line.push_str(&format!(" [PICK {}]", question.pick));
    }
    if question.draw > 0 {
        line.push_str(&format!(" [DRAW {}]", question.draw));
    }
    line
}

/// Substitute `answers` into the question's blanks, producing one readable
/// sentence.
///
/// An answer starting a sentence is capitalized; one spliced mid-sentence
/// is decapitalized. A fragment trailing off with an ellipsis does not
/// count as a sentence end. The result always ends with sentence
/// punctuation.
#[must_use]
pub fn fill_entry(question: &Card, answers: &[&Card]) -> String {
    let mut out = String::new();
    for (i, fragment) in question.text.iter().enumerate() {
        out.push_str(fragment);
        if let Some(answer) = answers.get(i) {
            let text = adjust_case(&answer.text[0], starts_sentence(&out));
            out.push_str(&text);
        }
    }
    if !out.trim_end().ends_with(SENTENCE_ENDS) {
        out.push('.');
    }
    out
}

/// `"3 players"`, `"1 player"`.
#[must_use]
pub fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// `"a, b and c"`.
#[must_use]
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    match names {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let init: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} and {}", init.join(", "), last.as_ref())
        }
    }
}

/// Would text appended to `so_far` begin a new sentence?
fn starts_sentence(so_far: &str) -> bool {
    let trimmed = so_far.trim_end();
    if trimmed.is_empty() {
        return true;
    }
    // "..." trails off rather than ending the sentence.
    if trimmed.ends_with("..") {
        return false;
    }
    trimmed.ends_with(SENTENCE_ENDS)
}

fn adjust_case(text: &str, capitalize: bool) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {
            let first: String = if capitalize {
                first.to_uppercase().collect()
            } else {
                first.to_lowercase().collect()
            };
            format!("{first}{}", chars.as_str())
        }
        _ => text.to_string(),
    }
}
