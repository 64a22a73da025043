//! Nominal width model for interlinear cells
//!
//! Widths are measured in abstract "width units": a string of `n` characters at
//! point size `s` is `n * s` units wide, scaled by the wide-script ratio when the
//! string contains any character of the wide (CJK) script. Renderers map units
//! to device space with a single multiplier, so the model never needs font data.
//!
//! The wide test is per string, not per character: a mixed token such as `"A股"`
//! is scaled as a whole.

use unicode_script::{Script, UnicodeScript};

/// Ratio between a wide-script glyph (Mincho-like) and a Latin monospace glyph.
pub const DEFAULT_WIDE_RATIO: f32 = 50.0 / 30.0;

/// Return true if the string contains at least one wide-script character.
pub fn is_wide(text: &str) -> bool {
    text.chars().any(is_wide_char)
}

/// Han-family letters plus the full-width punctuation used alongside them.
pub fn is_wide_char(ch: char) -> bool {
    match ch.script() {
        Script::Han | Script::Hiragana | Script::Katakana | Script::Bopomofo => true,
        _ => is_wide_punctuation(ch),
    }
}

fn is_wide_punctuation(ch: char) -> bool {
    matches!(
        ch,
        // CJK Symbols and Punctuation
        '\u{3000}'..='\u{303F}'
            // Half-width and full-width forms
            | '\u{FF01}'..='\u{FF0F}'
            | '\u{FF1A}'..='\u{FF20}'
            | '\u{FF3B}'..='\u{FF40}'
            | '\u{FF5B}'..='\u{FF65}'
            // Small form variants
            | '\u{FE50}'..='\u{FE6B}'
            | '\u{FE4F}'
            // General punctuation used by Chinese typesetting
            | '–' | '—' | '‘' | '’' | '‛' | '“' | '”' | '„' | '‟' | '…' | '‧' | '·'
    )
}

/// Width computation parameterised by the wide-script ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthModel {
    pub wide_ratio: f32,
}

impl Default for WidthModel {
    fn default() -> Self {
        Self {
            wide_ratio: DEFAULT_WIDE_RATIO,
        }
    }
}

impl WidthModel {
    pub fn new(wide_ratio: f32) -> Self {
        Self { wide_ratio }
    }

    /// Visual width of `text` at nominal size `size`. Empty text is 0.
    pub fn width(&self, text: &str, size: f32) -> f32 {
        self.measure(text.chars().count(), size, is_wide(text))
    }

    /// Width of `char_count` characters whose wide flag is already known.
    pub fn measure(&self, char_count: usize, size: f32, wide: bool) -> f32 {
        let base = char_count as f32 * size;
        if wide {
            base * self.wide_ratio
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin_text_is_not_wide() {
        assert!(!is_wide("hello"));
        assert!(!is_wide(" bom dia"));
        assert!(!is_wide(""));
    }

    #[test]
    fn han_and_fullwidth_punctuation_are_wide() {
        assert!(is_wide("中"));
        assert!(is_wide("。"));
        assert!(is_wide("，"));
        assert!(is_wide("《"));
        assert!(is_wide("ひらがな"));
    }

    #[test]
    fn pinyin_with_tone_marks_is_not_wide() {
        assert!(!is_wide("zhōngguó"));
    }

    #[test]
    fn width_scales_whole_string_when_any_char_is_wide() {
        let model = WidthModel::new(2.0);
        assert_eq!(model.width("ab", 10.0), 20.0);
        assert_eq!(model.width("中", 10.0), 20.0);
        // Mixed token: every character is scaled, not just the Han one.
        assert_eq!(model.width("A股", 10.0), 40.0);
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        let model = WidthModel::new(1.0);
        assert_eq!(model.width("é", 4.0), 4.0);
        assert_eq!(model.width("中国", 4.0), 8.0);
    }

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(WidthModel::default().width("", 40.0), 0.0);
    }

    #[test]
    fn width_is_monotone_in_appended_characters() {
        let model = WidthModel::default();
        let samples = ["", "a", "ab", "ab中", "ab中c", "ab中c。"];
        for pair in samples.windows(2) {
            assert!(model.width(pair[1], 12.0) >= model.width(pair[0], 12.0));
        }
    }
}
