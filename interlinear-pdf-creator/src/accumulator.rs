//! Document accumulator
//!
//! Collects laid-out sentences in input order. One accumulator is built per
//! document and handed to a renderer; the layout engine itself keeps no state.

use crate::annotate::{split_sentences, Annotator};
use crate::fonts::FontContext;
use crate::typography::{InterlinearLayoutEngine, SentenceLayout, TokenAnnotation};
use serde::{Deserialize, Serialize};

/// A sentence whose layers were resolved elsewhere.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolvedSentence {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub translation: String,
    pub tokens: Vec<TokenAnnotation>,
}

/// Ordered sentence layouts of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterlinearDocument {
    pub sentences: Vec<SentenceLayout>,
}

impl InterlinearDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sentence: SentenceLayout) {
        self.sentences.push(sentence);
    }

    /// Total chunk count; each chunk is one rendered interlinear row block.
    pub fn chunk_count(&self) -> usize {
        self.sentences.iter().map(|s| s.chunks.len()).sum()
    }

    pub fn token_count(&self) -> usize {
        self.sentences.iter().map(|s| s.units.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Serialize the full layout (cells, pads, chunk ranges) as JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Lay out already resolved sentences.
    pub fn from_resolved(sentences: &[ResolvedSentence], font_context: &FontContext) -> Self {
        let engine = InterlinearLayoutEngine::new(font_context);
        let mut document = Self::new();
        for sentence in sentences {
            document.push(engine.layout_sentence(
                &sentence.source,
                &sentence.translation,
                &sentence.tokens,
            ));
        }
        document
    }

    /// Split, annotate and lay out raw source text.
    pub fn from_text(text: &str, annotator: &Annotator, font_context: &FontContext) -> Self {
        let engine = InterlinearLayoutEngine::new(font_context);
        let mut document = Self::new();
        let sentences = split_sentences(text);
        log::info!("Annotating {} sentences", sentences.len());

        for line in &sentences {
            let annotated = annotator.annotate_sentence(line);
            document.push(engine.layout_sentence(
                &annotated.source,
                &annotated.translation,
                &annotated.tokens,
            ));
        }
        document
    }
}
