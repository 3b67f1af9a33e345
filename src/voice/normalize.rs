//! Transcript normalization for comparison
//!
//! Katakana folds onto hiragana, punctuation and whitespace are dropped and
//! ASCII letters are lowercased, so that "リナちゃん、" and "りなちゃん" compare equal.

/// First katakana code point folded onto hiragana (ァ)
const KATAKANA_START: char = '\u{30A1}';

/// Last katakana code point folded onto hiragana (ヶ)
const KATAKANA_END: char = '\u{30F6}';

/// Distance between a katakana character and its hiragana counterpart
const KANA_OFFSET: u32 = 0x60;

/// Punctuation removed in addition to whitespace
const STRIPPED: [char; 4] = ['、', '。', ',', '.'];

/// Canonicalize a transcript or pattern
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !STRIPPED.contains(c))
        .map(fold_katakana)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn fold_katakana(c: char) -> char {
    if (KATAKANA_START..=KATAKANA_END).contains(&c) {
        char::from_u32(u32::from(c) - KANA_OFFSET).unwrap_or(c)
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_katakana_folds_to_hiragana() {
        assert_eq!(normalize("リナちゃん"), "りなちゃん");
        assert_eq!(normalize("エディター"), "えでぃたー");
        assert_eq!(normalize("リナちゃん"), normalize("りなちゃん"));
        assert_eq!(normalize("ヴ"), "ゔ");
    }

    #[test]
    fn test_trims_and_strips_punctuation() {
        assert_eq!(normalize("  リナちゃん  "), "りなちゃん");
        assert_eq!(normalize("リナちゃん、エディター。"), "りなちゃんえでぃたー");
        assert_eq!(normalize("hey, rina."), "heyrina");
        assert_eq!(normalize("リナ\u{3000}ちゃん"), "りなちゃん");
    }

    #[test]
    fn test_lowercases_ascii() {
        assert_eq!(normalize("EDITOR"), "editor");
    }

    #[test]
    fn test_kanji_is_untouched() {
        assert_eq!(normalize("  リナちゃん、エディター起動  "), "りなちゃんえでぃたー起動");
    }

    #[test]
    fn test_outside_range_is_untouched() {
        // Long vowel mark and middle dot sit just outside the folded range
        assert_eq!(normalize("ー・ヷ"), "ー・ヷ");
    }
}
