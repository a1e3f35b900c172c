//! Arabic Character Handling
//!
//! Provides the character classes and the letter-level transforms the
//! feature extractor is built on:
//! - Diacritics (tashkeel) removal
//! - Last haraka removal (case ending hint)
//! - Character normalization (alef, hamza, yaa, taa marbuta, ligatures)
//! - Tatweel and zero-width joiner removal

/// Arabic letter alef.
pub const ALEF: char = '\u{0627}';
/// Arabic letter lam.
pub const LAM: char = '\u{0644}';
/// Tatweel (kashida), a joining stretch character.
pub const TATWEEL: char = '\u{0640}';

const ZWNJ: char = '\u{200C}';
const ZWJ: char = '\u{200D}';

/// The definite article prefix, alef + lam.
pub const DEFINITE_ARTICLE: &str = "\u{0627}\u{0644}";

/// Letters the article's lam assimilates into.
pub const SUN_LETTERS: [char; 14] = [
    'ت', 'ث', 'د', 'ذ', 'ر', 'ز', 'س', 'ش', 'ص', 'ض', 'ط', 'ظ', 'ل', 'ن',
];

/// Letters after which the article's lam is pronounced.
pub const MOON_LETTERS: [char; 15] = [
    'ا', 'ب', 'ج', 'ح', 'خ', 'ع', 'غ', 'ف', 'ق', 'ك', 'م', 'ه', 'و', 'ي', 'ء',
];

/// Check if a character is an Arabic diacritical mark.
pub fn is_arabic_diacritic(ch: char) -> bool {
    matches!(ch,
        '\u{0610}'..='\u{061A}' | // Honorifics and small high marks
        '\u{064B}'..='\u{065F}' | // Fathatan to wavy hamza below
        '\u{0670}' |              // Superscript alef
        '\u{06D6}'..='\u{06DC}' | // Quranic small high ligatures
        '\u{06DF}'..='\u{06E4}' |
        '\u{06E7}'..='\u{06E8}' |
        '\u{06EA}'..='\u{06ED}' |
        '\u{08D3}'..='\u{08E1}' | // Extended-A annotation marks
        '\u{08E3}'..='\u{08FF}'
    )
}

/// Check if a character is a haraka or tanwin, i.e. a vowel mark that can
/// carry a case ending. Shadda is not a haraka.
pub fn is_haraka(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{0650}' | '\u{0652}')
}

/// Check if a character is an Arabic letter (including presentation forms).
pub fn is_arabic_letter(ch: char) -> bool {
    matches!(ch,
        '\u{0621}'..='\u{063A}' |
        '\u{0641}'..='\u{064A}' |
        '\u{066E}'..='\u{066F}' |
        '\u{0671}'..='\u{06D3}' |
        '\u{06D5}' |
        '\u{06EE}'..='\u{06EF}' |
        '\u{06FA}'..='\u{06FC}' |
        '\u{06FF}' |
        '\u{0750}'..='\u{077F}' | // Arabic Supplement
        '\u{08A0}'..='\u{08C9}' | // Arabic Extended-A
        '\u{FB50}'..='\u{FD3D}' | // Presentation Forms-A (ornate parentheses excluded)
        '\u{FD50}'..='\u{FDFB}' |
        '\u{FE70}'..='\u{FEFC}'   // Presentation Forms-B
    )
}

/// Check if a character is an Arabic-Indic or extended Arabic-Indic digit.
pub fn is_arabic_digit(ch: char) -> bool {
    matches!(ch, '\u{0660}'..='\u{0669}' | '\u{06F0}'..='\u{06F9}')
}

/// Characters that join letters inside a word without being letters
/// themselves.
pub fn is_joining_char(ch: char) -> bool {
    matches!(ch, TATWEEL | ZWJ | ZWNJ)
}

/// Check if a character is an alef variant.
fn is_alef_variant(ch: char) -> bool {
    matches!(ch,
        '\u{0622}' | // Alef with madda
        '\u{0623}' | // Alef with hamza above
        '\u{0625}' | // Alef with hamza below
        '\u{0671}' | // Alef wasla
        '\u{0672}' | // Alef with wavy hamza above
        '\u{0673}' | // Alef with wavy hamza below
        '\u{0675}'   // High hamza alef
    )
}

/// Normalize hamza seated on waw or yaa.
fn normalize_hamza(ch: char) -> Option<char> {
    match ch {
        '\u{0624}' => Some('\u{0648}'), // Waw with hamza -> waw
        '\u{0626}' => Some('\u{064A}'), // Yaa with hamza -> yaa
        _ => None,
    }
}

/// Lam-alef presentation ligatures (isolated and final forms).
fn is_lam_alef_ligature(ch: char) -> bool {
    matches!(ch, '\u{FEF5}'..='\u{FEFC}')
}

/// Remove every diacritical mark, leaving the letter skeleton.
pub fn strip_diacritics(text: &str) -> String {
    text.chars().filter(|ch| !is_arabic_diacritic(*ch)).collect()
}

/// Remove the trailing haraka / tanwin marks of a word, keeping a final shadda.
pub fn strip_last_haraka(word: &str) -> String {
    word.trim_end_matches(is_haraka).to_string()
}

/// Arabic text normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArabicNormalizer {
    /// Remove diacritical marks (tashkeel)
    pub remove_diacritics: bool,
    /// Remove tatweel (kashida) and zero-width joiners
    pub remove_tatweel: bool,
    /// Normalize alef variants to bare alef
    pub normalize_alef: bool,
    /// Normalize hamza seated on waw and yaa
    pub normalize_hamza: bool,
    /// Normalize alef maqsura and Farsi yeh to yaa, keheh to kaf
    pub normalize_yaa: bool,
    /// Normalize taa marbuta to haa
    pub normalize_taa_marbuta: bool,
    /// Expand lam-alef ligatures into lam + alef
    pub expand_ligatures: bool,
}

impl Default for ArabicNormalizer {
    fn default() -> Self {
        Self {
            remove_diacritics: true,
            remove_tatweel: true,
            normalize_alef: true,
            normalize_hamza: true,
            normalize_yaa: true,
            normalize_taa_marbuta: true,
            expand_ligatures: true,
        }
    }
}

impl ArabicNormalizer {
    /// Create a new Arabic normalizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize Arabic text.
    pub fn normalize(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());

        for ch in text.chars() {
            if self.remove_diacritics && is_arabic_diacritic(ch) {
                continue;
            }

            if self.remove_tatweel && is_joining_char(ch) {
                continue;
            }

            if self.normalize_alef && is_alef_variant(ch) {
                result.push(ALEF);
                continue;
            }

            if self.normalize_hamza {
                if let Some(normalized) = normalize_hamza(ch) {
                    result.push(normalized);
                    continue;
                }
            }

            if self.normalize_yaa {
                match ch {
                    '\u{0649}' | '\u{06CC}' => {
                        result.push('\u{064A}');
                        continue;
                    }
                    '\u{06A9}' => {
                        result.push('\u{0643}');
                        continue;
                    }
                    _ => {}
                }
            }

            if self.normalize_taa_marbuta && ch == '\u{0629}' {
                result.push('\u{0647}');
                continue;
            }

            if self.expand_ligatures && is_lam_alef_ligature(ch) {
                result.push(LAM);
                result.push(ALEF);
                continue;
            }

            result.push(ch);
        }

        result
    }
}
