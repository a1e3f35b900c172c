//! Sentence Tokenizer
//!
//! Splits a sentence into Arabic word runs. Whitespace, punctuation (ASCII and
//! Arabic) and non-Arabic characters are boundaries; diacritics, tatweel and
//! zero-width joiners stay inside the word they decorate.

use serde::{Deserialize, Serialize};

use crate::arabic::{is_arabic_diacritic, is_arabic_digit, is_arabic_letter, is_joining_char};

/// A contiguous run of Arabic script characters, as written in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Position of the token in the sentence, starting at 0.
    pub index: usize,
    /// Surface form, diacritics included.
    pub text: String,
    /// Byte offset of the token in the source sentence.
    pub offset: usize,
}

/// A character that can start or carry a word.
fn is_base_char(ch: char) -> bool {
    is_arabic_letter(ch) || is_arabic_digit(ch)
}

/// A character that belongs to a word run.
fn is_token_char(ch: char) -> bool {
    is_base_char(ch) || is_arabic_diacritic(ch) || is_joining_char(ch)
}

/// Tokenize a sentence into ordered Arabic word runs.
///
/// Runs made only of marks or joiners (a stray diacritic, a lone tatweel)
/// carry no letter and are dropped.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut has_base = false;

    for (offset, ch) in text.char_indices() {
        if is_token_char(ch) {
            if start.is_none() {
                start = Some(offset);
                has_base = false;
            }
            has_base |= is_base_char(ch);
        } else if let Some(begin) = start.take() {
            push_run(&mut tokens, text, begin, offset, has_base);
        }
    }

    if let Some(begin) = start {
        push_run(&mut tokens, text, begin, text.len(), has_base);
    }

    tokens
}

fn push_run(tokens: &mut Vec<Token>, text: &str, begin: usize, end: usize, has_base: bool) {
    if !has_base {
        return;
    }
    tokens.push(Token {
        index: tokens.len(),
        text: text[begin..end].to_string(),
        offset: begin,
    });
}
