//! Interlinear cell layout
//!
//! Builds the three stacked layers (gloss, phonetic, literal) of every token,
//! measures them with the [`WidthModel`] and pads each layer so all three share
//! the width of the widest one. The result is grouped into display lines by the
//! [`chunker`](crate::chunker).

use crate::chunker::chunk_ranges;
use crate::fonts::FontContext;
use crate::width::{is_wide, WidthModel};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// RGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Components in 0.0..=1.0, as PDF color operators expect.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Grammatical category attached to a token by the segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Classifier,
    Pronoun,
    #[default]
    None,
}

impl PartOfSpeech {
    /// Map a segmenter label to a category. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "noun" => PartOfSpeech::Noun,
            "verb" => PartOfSpeech::Verb,
            "adjective" => PartOfSpeech::Adjective,
            "adverb" => PartOfSpeech::Adverb,
            "classifier" => PartOfSpeech::Classifier,
            "pronoun" => PartOfSpeech::Pronoun,
            _ => PartOfSpeech::None,
        }
    }

    pub fn color(self) -> Color {
        match self {
            PartOfSpeech::Noun => Color::rgb(17, 138, 178),
            PartOfSpeech::Verb => Color::rgb(219, 58, 52),
            PartOfSpeech::Adjective => Color::rgb(6, 214, 160),
            PartOfSpeech::Adverb => Color::rgb(247, 127, 0),
            PartOfSpeech::Classifier => Color::rgb(0, 48, 73),
            PartOfSpeech::Pronoun => Color::rgb(239, 71, 111),
            PartOfSpeech::None => Color::BLACK,
        }
    }
}

/// A segmented word with its category. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    category: PartOfSpeech,
}

impl Token {
    pub fn new(text: impl Into<String>, category: PartOfSpeech) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> PartOfSpeech {
        self.category
    }
}

/// Pre-resolved annotation layers for one token.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenAnnotation {
    pub gloss: String,
    pub phonetic: String,
    pub literal: String,
    #[serde(default)]
    pub category: PartOfSpeech,
}

/// Which of the three stacked rows a cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Gloss,
    Phonetic,
    Literal,
}

impl Layer {
    pub fn name(self) -> &'static str {
        match self {
            Layer::Gloss => "gloss",
            Layer::Phonetic => "phonetic",
            Layer::Literal => "literal",
        }
    }
}

/// Text with a nominal size and display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedCell {
    text: String,
    size: f32,
    is_wide: bool,
    color: Color,
}

impl AnnotatedCell {
    pub fn new(text: impl Into<String>, size: f32) -> Self {
        let text = text.into();
        let is_wide = is_wide(&text);
        Self {
            text,
            size,
            is_wide,
            color: Color::BLACK,
        }
    }

    /// Assign the display color. Cells are not changed after this.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn is_wide(&self) -> bool {
        self.is_wide
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Always recomputed, never cached.
    pub fn width(&self, model: &WidthModel) -> f32 {
        model.measure(self.text.chars().count(), self.size, self.is_wide)
    }
}

/// A cell with the whitespace runs that center it under its token's target width.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddedCell {
    pub cell: AnnotatedCell,
    pub left_pad: String,
    pub right_pad: String,
}

impl PaddedCell {
    pub fn text(&self) -> &str {
        self.cell.text()
    }

    pub fn color(&self) -> Color {
        self.cell.color()
    }

    pub fn font_size(&self) -> f32 {
        self.cell.size()
    }
}

/// Symmetric padding against a shared target width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddingCalculator {
    pub model: WidthModel,
    /// Width of one padding space, in width units.
    pub space_unit: f32,
}

impl PaddingCalculator {
    pub fn new(model: WidthModel, space_unit: f32) -> Self {
        Self { model, space_unit }
    }

    /// Number of pad spaces on each side; the left side takes the odd one.
    ///
    /// Panics if `target_width` is smaller than `cell_width`: callers always
    /// derive the target as a maximum over the cells being padded.
    pub fn pad_lengths(&self, cell_width: f32, target_width: f32) -> (usize, usize) {
        assert!(
            target_width >= cell_width,
            "padding target {target_width} is narrower than cell width {cell_width}"
        );
        if cell_width == target_width {
            return (0, 0);
        }
        let half = (target_width - cell_width) / 2.0 / self.space_unit;
        (half.ceil() as usize, half.floor() as usize)
    }

    pub fn pad(&self, cell: &AnnotatedCell, target_width: f32) -> (String, String) {
        let (left, right) = self.pad_lengths(cell.width(&self.model), target_width);
        (" ".repeat(left), " ".repeat(right))
    }

    pub fn padded(&self, cell: AnnotatedCell, target_width: f32) -> PaddedCell {
        let (left_pad, right_pad) = self.pad(&cell, target_width);
        PaddedCell {
            cell,
            left_pad,
            right_pad,
        }
    }

    /// Width of a run of `len` pad spaces.
    pub fn pad_width(&self, len: usize) -> f32 {
        len as f32 * self.space_unit
    }
}

/// The three padded layers of one token, all spanning `target_width`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenLayoutUnit {
    pub gloss: PaddedCell,
    pub phonetic: PaddedCell,
    pub literal: PaddedCell,
    pub target_width: f32,
    pub category: PartOfSpeech,
}

impl TokenLayoutUnit {
    pub fn assemble(
        gloss: AnnotatedCell,
        phonetic: AnnotatedCell,
        literal: AnnotatedCell,
        category: PartOfSpeech,
        padding: &PaddingCalculator,
    ) -> Self {
        let model = &padding.model;
        let target_width = gloss
            .width(model)
            .max(phonetic.width(model))
            .max(literal.width(model));

        Self {
            gloss: padding.padded(gloss, target_width),
            phonetic: padding.padded(phonetic, target_width),
            literal: padding.padded(literal, target_width),
            target_width,
            category,
        }
    }

    pub fn layer(&self, layer: Layer) -> &PaddedCell {
        match layer {
            Layer::Gloss => &self.gloss,
            Layer::Phonetic => &self.phonetic,
            Layer::Literal => &self.literal,
        }
    }
}

/// One display line worth of tokens.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub units: &'a [TokenLayoutUnit],
}

impl<'a> Chunk<'a> {
    pub fn row(&self, layer: Layer) -> impl Iterator<Item = &'a PaddedCell> + 'a {
        self.units.iter().map(move |unit| unit.layer(layer))
    }

    pub fn width(&self) -> f32 {
        self.units.iter().map(|unit| unit.target_width).sum()
    }
}

/// A laid-out sentence: translation line plus chunked token units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceLayout {
    pub source: String,
    pub translation: AnnotatedCell,
    pub units: Vec<TokenLayoutUnit>,
    pub chunks: Vec<Range<usize>>,
}

impl SentenceLayout {
    pub fn iter_chunks(&self) -> impl Iterator<Item = Chunk<'_>> + '_ {
        self.chunks.iter().map(move |range| Chunk {
            units: &self.units[range.clone()],
        })
    }
}

/// Stateless layout engine over a set of layout constants.
pub struct InterlinearLayoutEngine<'a> {
    font_context: &'a FontContext,
}

impl<'a> InterlinearLayoutEngine<'a> {
    pub fn new(font_context: &'a FontContext) -> Self {
        Self { font_context }
    }

    pub fn padding(&self) -> PaddingCalculator {
        PaddingCalculator::new(
            WidthModel::new(self.font_context.wide_ratio),
            self.font_context.space_unit,
        )
    }

    /// Build the per-token units; the literal layer takes the category color.
    pub fn layout_tokens(&self, annotations: &[TokenAnnotation]) -> Vec<TokenLayoutUnit> {
        let padding = self.padding();
        let ctx = self.font_context;

        annotations
            .iter()
            .map(|annotation| {
                TokenLayoutUnit::assemble(
                    AnnotatedCell::new(annotation.gloss.as_str(), ctx.gloss_font_size()),
                    AnnotatedCell::new(annotation.phonetic.as_str(), ctx.phonetic_font_size()),
                    AnnotatedCell::new(annotation.literal.as_str(), ctx.base_font_size)
                        .with_color(annotation.category.color()),
                    annotation.category,
                    &padding,
                )
            })
            .collect()
    }

    pub fn layout_sentence(
        &self,
        source: &str,
        translation: &str,
        annotations: &[TokenAnnotation],
    ) -> SentenceLayout {
        let units = self.layout_tokens(annotations);
        let widths: Vec<f32> = units.iter().map(|unit| unit.target_width).collect();
        let chunks = chunk_ranges(&widths, self.font_context.line_budget);

        log::debug!(
            "Laid out sentence with {} tokens into {} chunks",
            units.len(),
            chunks.len()
        );

        SentenceLayout {
            source: source.to_string(),
            translation: AnnotatedCell::new(translation, self.font_context.translation_font_size()),
            units,
            chunks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_padding() -> PaddingCalculator {
        PaddingCalculator::new(WidthModel::default(), 1.0)
    }

    #[test]
    fn equal_width_needs_no_padding() {
        let padding = unit_padding();
        let cell = AnnotatedCell::new("abcd", 5.0);
        assert_eq!(padding.pad(&cell, 20.0), (String::new(), String::new()));
    }

    #[test]
    fn even_gap_splits_evenly() {
        // cell width 12, target 20
        let padding = unit_padding();
        let cell = AnnotatedCell::new("abc", 4.0);
        let (left, right) = padding.pad(&cell, 20.0);
        assert_eq!((left.len(), right.len()), (4, 4));
    }

    #[test]
    fn odd_gap_rounds_left_up() {
        // cell width 13, target 20
        let padding = unit_padding();
        assert_eq!(padding.pad_lengths(13.0, 20.0), (4, 3));
    }

    #[test]
    fn space_unit_scales_pad_lengths() {
        let padding = PaddingCalculator::new(WidthModel::default(), 2.0);
        assert_eq!(padding.pad_lengths(12.0, 20.0), (2, 2));
    }

    #[test]
    #[should_panic(expected = "narrower than cell width")]
    fn target_narrower_than_cell_is_an_invariant_violation() {
        unit_padding().pad_lengths(21.0, 20.0);
    }

    #[test]
    fn unit_target_is_widest_layer() {
        let padding = unit_padding();
        let unit = TokenLayoutUnit::assemble(
            AnnotatedCell::new("you", 10.0),
            AnnotatedCell::new("nǐ", 20.0),
            AnnotatedCell::new("你", 40.0),
            PartOfSpeech::Pronoun,
            &padding,
        );
        let literal_width = 40.0 * padding.model.wide_ratio;
        assert_eq!(unit.target_width, literal_width);
        assert!(unit.literal.left_pad.is_empty());
        assert!(unit.literal.right_pad.is_empty());
        assert!(!unit.gloss.left_pad.is_empty());
    }

    #[test]
    fn padded_layers_span_the_target() {
        let padding = unit_padding();
        let unit = TokenLayoutUnit::assemble(
            AnnotatedCell::new("good", 10.0),
            AnnotatedCell::new("hǎo", 20.0),
            AnnotatedCell::new("好", 40.0),
            PartOfSpeech::Adjective,
            &padding,
        );
        for layer in [Layer::Gloss, Layer::Phonetic, Layer::Literal] {
            let cell = unit.layer(layer);
            let total = padding.pad_width(cell.left_pad.len())
                + cell.cell.width(&padding.model)
                + padding.pad_width(cell.right_pad.len());
            assert!((total - unit.target_width).abs() <= padding.space_unit);
            let skew = cell.left_pad.len() - cell.right_pad.len();
            assert!(skew <= 1);
        }
    }

    #[test]
    fn category_colors_the_literal_layer_only() {
        let ctx = FontContext::default();
        let engine = InterlinearLayoutEngine::new(&ctx);
        let units = engine.layout_tokens(&[TokenAnnotation {
            gloss: "book".into(),
            phonetic: "shū".into(),
            literal: "书".into(),
            category: PartOfSpeech::Noun,
        }]);
        assert_eq!(units[0].literal.color(), PartOfSpeech::Noun.color());
        assert_eq!(units[0].gloss.color(), Color::BLACK);
        assert_eq!(units[0].phonetic.color(), Color::BLACK);
    }

    #[test]
    fn layer_sizes_follow_the_base_size() {
        let ctx = FontContext::default();
        let engine = InterlinearLayoutEngine::new(&ctx);
        let units = engine.layout_tokens(&[TokenAnnotation {
            gloss: "I".into(),
            phonetic: "wǒ".into(),
            literal: "我".into(),
            category: PartOfSpeech::None,
        }]);
        assert_eq!(units[0].literal.font_size(), 40.0);
        assert_eq!(units[0].phonetic.font_size(), 20.0);
        assert_eq!(units[0].gloss.font_size(), 10.0);
    }

    #[test]
    fn empty_sentence_has_no_chunks() {
        let ctx = FontContext::default();
        let layout = InterlinearLayoutEngine::new(&ctx).layout_sentence("", "", &[]);
        assert!(layout.units.is_empty());
        assert!(layout.chunks.is_empty());
    }

    #[test]
    fn labels_map_to_categories() {
        assert_eq!(PartOfSpeech::from_label("Noun"), PartOfSpeech::Noun);
        assert_eq!(PartOfSpeech::from_label("classifier"), PartOfSpeech::Classifier);
        assert_eq!(PartOfSpeech::from_label("punctuation mark"), PartOfSpeech::None);
        assert_eq!(PartOfSpeech::from_label("not_detected"), PartOfSpeech::None);
    }

    #[test]
    fn color_hex_is_lowercase_rgb() {
        assert_eq!(PartOfSpeech::Verb.color().to_hex(), "#db3a34");
    }
}
