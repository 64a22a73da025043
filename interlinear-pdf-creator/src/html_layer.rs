//! HTML display export
//!
//! Writes the same interlinear layout as a standalone HTML page. Rows are
//! preformatted runs of monospace text: every cell is preceded and followed by
//! its pad spaces at the space-unit size, so the three rows of a chunk line up
//! the way the PDF does.

use crate::accumulator::InterlinearDocument;
use crate::fonts::FontContext;
use crate::interlinear_generator::percent_encode;
use crate::typography::{Chunk, Layer, PaddedCell};
use anyhow::{Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

const STYLE: &str = "
body { margin: 2em; }
.translation { font-family: Arial, sans-serif; margin: 1.2em 0 0.4em; }
.chunk { margin-bottom: 0.8em; }
.row { white-space: pre; font-family: \"Courier New\", Courier, monospace; line-height: 1.2; }
.row a { text-decoration: none; }
.page-break { break-after: page; }
";

/// HTML exporter for interlinear documents
pub struct HtmlExporter<'a> {
    font_context: &'a FontContext,
    rows_rendered: usize,
}

impl<'a> HtmlExporter<'a> {
    pub fn new(font_context: &'a FontContext) -> Self {
        Self {
            font_context,
            rows_rendered: 0,
        }
    }

    pub fn render(&mut self, document: &InterlinearDocument) -> Result<String> {
        self.rows_rendered = 0;
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::DocType(BytesText::from_escaped("html")))?;
        writer.write_event(Event::Start(BytesStart::new("html")))?;
        writer.write_event(Event::Start(BytesStart::new("head")))?;
        writer.write_event(Event::Empty(
            BytesStart::new("meta").with_attributes([("charset", "utf-8")]),
        ))?;
        writer
            .create_element("title")
            .write_text_content(BytesText::new("Interlinear text"))?;
        writer
            .create_element("style")
            .write_text_content(BytesText::from_escaped(STYLE))?;
        writer.write_event(Event::End(BytesEnd::new("head")))?;
        writer.write_event(Event::Start(BytesStart::new("body")))?;

        for sentence in &document.sentences {
            writer.write_event(Event::Start(
                BytesStart::new("section").with_attributes([("class", "sentence")]),
            ))?;

            let translation = sentence.translation.text().trim();
            if !translation.is_empty() {
                let style = format!("font-size:{}px", sentence.translation.size());
                writer
                    .create_element("p")
                    .with_attributes([("class", "translation"), ("style", style.as_str())])
                    .write_text_content(BytesText::new(translation))?;
            }

            for chunk in sentence.iter_chunks() {
                self.write_chunk(&mut writer, &chunk)?;
            }

            writer.write_event(Event::End(BytesEnd::new("section")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("body")))?;
        writer.write_event(Event::End(BytesEnd::new("html")))?;

        String::from_utf8(writer.into_inner().into_inner()).context("HTML output is not UTF-8")
    }

    fn write_chunk(&mut self, writer: &mut Writer<Cursor<Vec<u8>>>, chunk: &Chunk<'_>) -> Result<()> {
        writer.write_event(Event::Start(
            BytesStart::new("div").with_attributes([("class", "chunk")]),
        ))?;
        for layer in [Layer::Gloss, Layer::Phonetic, Layer::Literal] {
            let class = format!("row {}", layer.name());
            writer.write_event(Event::Start(
                BytesStart::new("div").with_attributes([("class", class.as_str())]),
            ))?;
            for cell in chunk.row(layer) {
                self.write_cell(writer, cell, layer)?;
            }
            writer.write_event(Event::End(BytesEnd::new("div")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("div")))?;

        self.rows_rendered += 1;
        if self.rows_rendered % self.font_context.lines_per_page == 0 {
            writer.write_event(Event::Empty(
                BytesStart::new("div").with_attributes([("class", "page-break")]),
            ))?;
        }
        Ok(())
    }

    fn write_cell(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        cell: &PaddedCell,
        layer: Layer,
    ) -> Result<()> {
        self.write_pad(writer, &cell.left_pad)?;

        let style = format!(
            "font-size:{}px;color:{}",
            cell.font_size(),
            cell.color().to_hex()
        );
        if layer == Layer::Literal && !cell.text().trim().is_empty() {
            let href = format!(
                "{}{}",
                self.font_context.dictionary_link_base,
                percent_encode(cell.text().trim())
            );
            writer
                .create_element("a")
                .with_attributes([("href", href.as_str()), ("style", style.as_str())])
                .write_text_content(BytesText::new(cell.text()))?;
        } else {
            writer
                .create_element("span")
                .with_attributes([("style", style.as_str())])
                .write_text_content(BytesText::new(cell.text()))?;
        }

        self.write_pad(writer, &cell.right_pad)?;
        if self.font_context.debug_separators {
            writer
                .create_element("span")
                .with_attributes([("class", "separator")])
                .write_text_content(BytesText::new("|"))?;
        }
        Ok(())
    }

    fn write_pad(&self, writer: &mut Writer<Cursor<Vec<u8>>>, pad: &str) -> Result<()> {
        if pad.is_empty() {
            return Ok(());
        }
        let style = format!("font-size:{}px", self.font_context.space_unit);
        writer
            .create_element("span")
            .with_attributes([("class", "pad"), ("style", style.as_str())])
            .write_text_content(BytesText::new(pad))?;
        Ok(())
    }
}

/// Render an accumulated document to an HTML file.
pub fn create_interlinear_html_with_context(
    document: &InterlinearDocument,
    output_path: &str,
    font_context: &FontContext,
) -> Result<()> {
    let html = HtmlExporter::new(font_context).render(document)?;
    std::fs::write(output_path, html).with_context(|| format!("writing {}", output_path))?;
    log::info!("Wrote HTML view to {}", output_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::ResolvedSentence;
    use crate::typography::{PartOfSpeech, TokenAnnotation};

    fn document(ctx: &FontContext, translation: &str, tokens: usize) -> InterlinearDocument {
        let sentence = ResolvedSentence {
            source: String::new(),
            translation: translation.into(),
            tokens: (0..tokens)
                .map(|_| TokenAnnotation {
                    gloss: "book".into(),
                    phonetic: "shū".into(),
                    literal: "书".into(),
                    category: PartOfSpeech::Verb,
                })
                .collect(),
        };
        InterlinearDocument::from_resolved(&[sentence], ctx)
    }

    #[test]
    fn literal_cells_link_to_the_dictionary() {
        let ctx = FontContext::default();
        let html = HtmlExporter::new(&ctx).render(&document(&ctx, "Book.", 1)).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("wdqb=%E4%B9%A6"));
        assert!(html.contains("color:#db3a34"));
        assert!(html.contains(">书</a>"));
    }

    #[test]
    fn text_is_escaped() {
        let ctx = FontContext::default();
        let html = HtmlExporter::new(&ctx).render(&document(&ctx, "a < b", 1)).unwrap();
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn narrow_layers_are_padded() {
        let ctx = FontContext::default();
        let html = HtmlExporter::new(&ctx).render(&document(&ctx, "", 1)).unwrap();
        assert!(html.contains("class=\"pad\""));
        assert!(!html.contains("class=\"translation\""));
    }

    #[test]
    fn page_breaks_follow_chunk_count() {
        let mut ctx = FontContext::default();
        ctx.line_budget = 1.0;
        ctx.lines_per_page = 2;
        let html = HtmlExporter::new(&ctx).render(&document(&ctx, "", 5)).unwrap();
        assert_eq!(html.matches("class=\"chunk\"").count(), 5);
        // two break markers plus the stylesheet rule
        assert_eq!(html.matches("page-break").count(), 3);
    }

    #[test]
    fn writes_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.html");
        let ctx = FontContext::default();
        create_interlinear_html_with_context(&document(&ctx, "Hi", 2), path.to_str().unwrap(), &ctx)
            .unwrap();
        let html = std::fs::read_to_string(&path).unwrap();
        assert_eq!(html.matches("<a ").count(), 2);
    }
}
