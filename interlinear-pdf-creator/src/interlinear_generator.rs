//! Interlinear PDF generation
//!
//! Renders an [`InterlinearDocument`]: for each sentence a translation line,
//! then every chunk as three stacked rows (gloss, phonetic, literal). Cells
//! are placed from the layout widths, so columns line up exactly regardless of
//! the glyphs drawn. Literal cells link to an online dictionary.

use crate::accumulator::InterlinearDocument;
use crate::annotate::Annotator;
use crate::fonts::FontContext;
use crate::typography::{Chunk, Layer, PaddingCalculator, SentenceLayout};
use crate::width::WidthModel;
use anyhow::{anyhow, Result};
use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::HashMap;

const LATIN_FONT: &str = "latin";
const TRANSLATION_FONT: &str = "sans";
const UNICODE_FONT: &str = "unicode";

/// Courier advance in thousandths of an em.
const COURIER_ADVANCE: f32 = 600.0;
/// The composite font is written with a uniform default width.
const UNICODE_ADVANCE: f32 = 1000.0;

/// Content of the page currently being filled.
struct PageState {
    operations: Vec<Operation>,
    annotations: Vec<ObjectId>,
    /// Distance of the next block from the top edge, in points.
    cursor_y: f32,
}

impl PageState {
    fn new(top: f32) -> Self {
        Self {
            operations: Vec::new(),
            annotations: Vec::new(),
            cursor_y: top,
        }
    }

    fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Interlinear PDF generator
pub struct InterlinearPdfGenerator {
    font_context: FontContext,
    padding: PaddingCalculator,
    document: Document,
    font_objects: HashMap<String, ObjectId>,
    pages_id: ObjectId,
    rows_rendered: usize,
}

impl InterlinearPdfGenerator {
    pub fn new(font_context: FontContext) -> Self {
        let padding = PaddingCalculator::new(
            WidthModel::new(font_context.wide_ratio),
            font_context.space_unit,
        );
        Self {
            font_context,
            padding,
            document: Document::with_version("1.5"),
            font_objects: HashMap::new(),
            pages_id: (0, 0), // set in initialize_document
            rows_rendered: 0,
        }
    }

    /// Render the document and write it to `output_path`.
    pub fn generate_pdf(&mut self, document: &InterlinearDocument, output_path: &str) -> Result<()> {
        let pages = self.render(document)?;
        log::info!("Writing {} pages to {}", pages, output_path);
        self.document.compress();
        self.document.save(output_path)?;
        Ok(())
    }

    /// Render the document into an in-memory PDF.
    pub fn render_to_bytes(&mut self, document: &InterlinearDocument) -> Result<Vec<u8>> {
        self.render(document)?;
        self.document.compress();
        let mut bytes = Vec::new();
        self.document.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn render(&mut self, document: &InterlinearDocument) -> Result<usize> {
        self.font_context.validate()?;
        self.initialize_document()?;

        let (_, top, _, _) = self.font_context.content_area();
        let mut page = PageState::new(top);
        for sentence in &document.sentences {
            self.render_sentence(&mut page, sentence)?;
        }

        if !page.is_empty() || self.get_page_count()? == 0 {
            self.create_single_page(page)?;
        }

        self.get_page_count()
    }

    /// Initialize PDF document with fonts and metadata
    fn initialize_document(&mut self) -> Result<()> {
        self.add_standard_font(LATIN_FONT, "Courier");
        self.add_standard_font(TRANSLATION_FONT, "Helvetica");
        self.add_unicode_font();

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Kids", Object::Array(vec![]));
        pages_dict.set("Count", Object::Integer(0));
        let pages_id = self.document.add_object(Object::Dictionary(pages_dict));

        let mut info_dict = Dictionary::new();
        info_dict.set("Producer", Object::string_literal("Interlinear PDF Creator"));
        info_dict.set("Creator", Object::string_literal("interlinear-pdf-creator"));
        let info_id = self.document.add_object(Object::Dictionary(info_dict));

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog_dict.set("Pages", Object::Reference(pages_id));
        let catalog_id = self.document.add_object(Object::Dictionary(catalog_dict));

        self.document.trailer.set("Root", Object::Reference(catalog_id));
        self.document.trailer.set("Info", Object::Reference(info_id));
        self.pages_id = pages_id;
        self.rows_rendered = 0;

        Ok(())
    }

    fn render_sentence(&mut self, page: &mut PageState, sentence: &SentenceLayout) -> Result<()> {
        let translation = sentence.translation.text().trim();
        if !translation.is_empty() {
            let size = sentence.translation.size();
            let (_, _, content_width, _) = self.font_context.content_area();
            for line in self.wrap_translation(translation, size, content_width) {
                let height = self.font_context.get_line_height(size);
                self.ensure_room(page, height)?;
                self.draw_translation_line(page, &line, size);
                page.cursor_y += height;
            }
        }

        for chunk in sentence.iter_chunks() {
            self.ensure_room(page, self.font_context.chunk_height())?;
            for layer in [Layer::Gloss, Layer::Phonetic, Layer::Literal] {
                self.draw_row(page, &chunk, layer);
            }

            self.rows_rendered += 1;
            if self.rows_rendered % self.font_context.lines_per_page == 0 {
                self.finish_page(page)?;
            }
        }

        Ok(())
    }

    /// Start a new page if `height` more points would run past the bottom margin.
    fn ensure_room(&mut self, page: &mut PageState, height: f32) -> Result<()> {
        let (_, top, _, content_height) = self.font_context.content_area();
        if page.cursor_y + height > top + content_height && !page.is_empty() {
            self.finish_page(page)?;
        }
        Ok(())
    }

    fn finish_page(&mut self, page: &mut PageState) -> Result<()> {
        let (_, top, _, _) = self.font_context.content_area();
        let full = std::mem::replace(page, PageState::new(top));
        if !full.is_empty() {
            self.create_single_page(full)?;
        }
        Ok(())
    }

    /// Greedy word wrap; a word wider than the line keeps a line to itself.
    fn wrap_translation(&self, text: &str, size: f32, max_width: f32) -> Vec<String> {
        let model = &self.padding.model;
        let mut lines = Vec::new();
        let mut current = String::new();

        for word in text.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            let width = self.font_context.units_to_points(model.width(&candidate, size));
            if width > max_width && !current.is_empty() {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn draw_translation_line(&mut self, page: &mut PageState, text: &str, size: f32) {
        let (left, _, _, _) = self.font_context.content_area();
        let baseline = self.baseline(page.cursor_y, size);
        let (font, tj) = if is_win_ansi(text) {
            (TRANSLATION_FONT, vec![Object::String(win_ansi_bytes(text), StringFormat::Literal)])
        } else {
            (UNICODE_FONT, vec![Object::String(utf16_be_bytes(text), StringFormat::Hexadecimal)])
        };

        page.operations.push(Operation::new("BT", vec![]));
        page.operations.push(black_fill());
        page.operations.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size)],
        ));
        page.operations.push(text_matrix(left, baseline));
        page.operations.push(Operation::new("TJ", vec![Object::Array(tj)]));
        page.operations.push(Operation::new("ET", vec![]));
    }

    /// Draw one layer of a chunk. Each cell starts after its left pad; the
    /// cursor then advances by the token's shared target width.
    fn draw_row(&mut self, page: &mut PageState, chunk: &Chunk<'_>, layer: Layer) {
        let size = match layer {
            Layer::Gloss => self.font_context.gloss_font_size(),
            Layer::Phonetic => self.font_context.phonetic_font_size(),
            Layer::Literal => self.font_context.base_font_size,
        };
        let line_height = self.font_context.get_line_height(size);
        let row_top = page.cursor_y;
        let baseline = self.baseline(row_top, size);
        let (mut x, _, _, _) = self.font_context.content_area();

        page.operations.push(Operation::new("BT", vec![]));
        for unit in chunk.units {
            let cell = unit.layer(layer);
            let cell_x = x
                + self
                    .font_context
                    .units_to_points(self.padding.pad_width(cell.left_pad.chars().count()));
            let cell_width = self
                .font_context
                .units_to_points(cell.cell.width(&self.padding.model));

            if !cell.text().is_empty() {
                let (font, tj) = self.build_tj_array(cell.text(), cell.cell.is_wide());
                let (r, g, b) = cell.color().to_unit();
                page.operations.push(Operation::new(
                    "rg",
                    vec![Object::Real(r), Object::Real(g), Object::Real(b)],
                ));
                page.operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.as_bytes().to_vec()), Object::Real(cell.font_size())],
                ));
                page.operations.push(text_matrix(cell_x, baseline));
                page.operations.push(Operation::new("TJ", vec![Object::Array(tj)]));
            }

            x += self.font_context.units_to_points(unit.target_width);

            if self.font_context.debug_separators {
                page.operations.push(black_fill());
                page.operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(LATIN_FONT.as_bytes().to_vec()), Object::Real(size)],
                ));
                page.operations.push(text_matrix(x, baseline));
                page.operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(b"|".to_vec(), StringFormat::Literal)],
                ));
            }

            if layer == Layer::Literal && !cell.text().trim().is_empty() {
                let page_height = self.font_context.page_height;
                let rect = [
                    cell_x,
                    page_height - (row_top + line_height),
                    cell_x + cell_width,
                    page_height - row_top,
                ];
                let link = self.add_dictionary_link(cell.text().trim(), rect);
                page.annotations.push(link);
            }
        }
        page.operations.push(Operation::new("ET", vec![]));

        page.cursor_y += line_height;
    }

    /// Baseline in PDF space for a line of `size` whose box starts `top` points
    /// below the top edge.
    fn baseline(&self, top: f32, size: f32) -> f32 {
        let line_height = self.font_context.get_line_height(size);
        self.font_context.page_height - (top + (line_height - size) / 2.0 + size * 0.8)
    }

    /// Build a TJ array whose glyph advances match the width model: every
    /// character advances `points_per_unit` em, times the wide ratio for wide text.
    fn build_tj_array(&self, text: &str, wide: bool) -> (&'static str, Vec<Object>) {
        let per_char = if wide {
            self.font_context.wide_ratio * self.font_context.points_per_unit
        } else {
            self.font_context.points_per_unit
        } * 1000.0;

        let (font, glyph_advance) = if is_win_ansi(text) {
            (LATIN_FONT, COURIER_ADVANCE)
        } else {
            (UNICODE_FONT, UNICODE_ADVANCE)
        };
        let encode = |s: &str| {
            if font == LATIN_FONT {
                Object::String(win_ansi_bytes(s), StringFormat::Literal)
            } else {
                Object::String(utf16_be_bytes(s), StringFormat::Hexadecimal)
            }
        };

        // TJ numbers move the pen left by n/1000 em.
        let adjust = glyph_advance - per_char;
        if adjust.abs() < 0.01 {
            return (font, vec![encode(text)]);
        }

        let chars: Vec<char> = text.chars().collect();
        let mut tj = Vec::with_capacity(chars.len() * 2);
        let mut buf = [0u8; 4];
        for (i, ch) in chars.iter().enumerate() {
            tj.push(encode(ch.encode_utf8(&mut buf)));
            if i < chars.len() - 1 {
                tj.push(Object::Real(adjust));
            }
        }
        (font, tj)
    }

    fn add_dictionary_link(&mut self, token: &str, rect: [f32; 4]) -> ObjectId {
        let url = format!("{}{}", self.font_context.dictionary_link_base, percent_encode(token));

        let mut action = Dictionary::new();
        action.set("S", Object::Name(b"URI".to_vec()));
        action.set("URI", Object::string_literal(url));

        let mut annot = Dictionary::new();
        annot.set("Type", Object::Name(b"Annot".to_vec()));
        annot.set("Subtype", Object::Name(b"Link".to_vec()));
        annot.set("Rect", Object::Array(rect.iter().map(|&v| Object::Real(v)).collect()));
        annot.set(
            "Border",
            Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)]),
        );
        annot.set("A", Object::Dictionary(action));

        self.document.add_object(Object::Dictionary(annot))
    }

    fn create_single_page(&mut self, page: PageState) -> Result<()> {
        let page_id = self.document.new_object_id();
        let content = Content {
            operations: page.operations,
        };

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(self.pages_id));
        page_dict.set("Resources", self.create_resources_dict());
        page_dict.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(self.font_context.page_width),
                Object::Real(self.font_context.page_height),
            ]),
        );
        if !page.annotations.is_empty() {
            page_dict.set(
                "Annots",
                Object::Array(page.annotations.into_iter().map(Object::Reference).collect()),
            );
        }

        let content_stream = Stream::new(Dictionary::new(), content.encode()?);
        let content_id = self.document.add_object(content_stream);
        page_dict.set("Contents", Object::Reference(content_id));

        self.document.objects.insert(page_id, Object::Dictionary(page_dict));
        self.add_page_to_tree(page_id)?;
        log::debug!("Created page {:?}", page_id);
        Ok(())
    }

    fn create_resources_dict(&self) -> Object {
        let mut font_dict = Dictionary::new();
        for (font_name, &font_id) in &self.font_objects {
            font_dict.set(font_name.as_str(), Object::Reference(font_id));
        }

        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(font_dict));
        Object::Dictionary(resources)
    }

    /// One of the 14 standard Type1 fonts; always available to viewers.
    fn add_standard_font(&mut self, name: &str, base_font: &str) {
        let mut font_dict = Dictionary::new();
        font_dict.set("Type", Object::Name(b"Font".to_vec()));
        font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
        font_dict.set("BaseFont", Object::Name(base_font.as_bytes().to_vec()));
        font_dict.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));

        let font_id = self.document.add_object(Object::Dictionary(font_dict));
        self.font_objects.insert(name.to_string(), font_id);
    }

    /// Composite Type0 font with a CIDFontType2 descendant, addressed by UTF-16
    /// code units. Embedded with an explicit glyph map when a TrueType file was
    /// loaded; otherwise the viewer substitutes a system font.
    fn add_unicode_font(&mut self) {
        let base_font_name = self.unicode_pdf_font_name();

        let mut font_descriptor = Dictionary::new();
        font_descriptor.set("Type", Object::Name(b"FontDescriptor".to_vec()));
        font_descriptor.set("FontName", Object::Name(base_font_name.clone().into_bytes()));
        font_descriptor.set("Flags", Object::Integer(4));
        font_descriptor.set(
            "FontBBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(-300),
                Object::Integer(1000),
                Object::Integer(1000),
            ]),
        );
        font_descriptor.set("ItalicAngle", Object::Integer(0));
        font_descriptor.set("Ascent", Object::Integer(880));
        font_descriptor.set("Descent", Object::Integer(-120));
        font_descriptor.set("CapHeight", Object::Integer(700));
        font_descriptor.set("StemV", Object::Integer(80));

        let embedded = self
            .font_context
            .unicode_font
            .as_ref()
            .filter(|font| font.is_embeddable())
            .map(|font| {
                let mut stream_dict = Dictionary::new();
                stream_dict.set("Length1", Object::Integer(font.data.len() as i64));
                Stream::new(stream_dict, font.data.clone())
            });
        let is_embedded = embedded.is_some();
        if let Some(stream) = embedded {
            let font_stream_id = self.document.add_object(stream);
            font_descriptor.set("FontFile2", Object::Reference(font_stream_id));
        }
        let font_descriptor_id = self.document.add_object(Object::Dictionary(font_descriptor));

        let mut cid_system_info = Dictionary::new();
        cid_system_info.set("Registry", Object::string_literal("Adobe"));
        cid_system_info.set("Ordering", Object::string_literal("Identity"));
        cid_system_info.set("Supplement", Object::Integer(0));

        let mut cidfont = Dictionary::new();
        cidfont.set("Type", Object::Name(b"Font".to_vec()));
        cidfont.set("Subtype", Object::Name(b"CIDFontType2".to_vec()));
        cidfont.set("BaseFont", Object::Name(base_font_name.clone().into_bytes()));
        cidfont.set("CIDSystemInfo", Object::Dictionary(cid_system_info));
        cidfont.set("FontDescriptor", Object::Reference(font_descriptor_id));
        cidfont.set("DW", Object::Integer(UNICODE_ADVANCE as i64));
        let glyph_map = if is_embedded {
            self.create_cid_to_gid_map_stream()
        } else {
            None
        };
        match glyph_map {
            Some(map) => {
                let map_id = self.document.add_object(map);
                cidfont.set("CIDToGIDMap", Object::Reference(map_id));
            }
            None => cidfont.set("CIDToGIDMap", Object::Name(b"Identity".to_vec())),
        }
        let cidfont_id = self.document.add_object(Object::Dictionary(cidfont));

        let tounicode_id = self.document.add_object(create_identity_tounicode_cmap_stream());

        let mut type0 = Dictionary::new();
        type0.set("Type", Object::Name(b"Font".to_vec()));
        type0.set("Subtype", Object::Name(b"Type0".to_vec()));
        type0.set("BaseFont", Object::Name(base_font_name.into_bytes()));
        type0.set("Encoding", Object::Name(b"Identity-H".to_vec()));
        type0.set("DescendantFonts", Object::Array(vec![Object::Reference(cidfont_id)]));
        type0.set("ToUnicode", Object::Reference(tounicode_id));

        let font_id = self.document.add_object(Object::Dictionary(type0));
        self.font_objects.insert(UNICODE_FONT.to_string(), font_id);
    }

    fn unicode_pdf_font_name(&self) -> String {
        let raw = self
            .font_context
            .unicode_font
            .as_ref()
            .map(|font| font.name.as_str())
            .unwrap_or("MS Mincho");
        let name: String = raw
            .chars()
            .filter_map(|ch| {
                if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                    Some(ch)
                } else if ch.is_whitespace() {
                    Some('-')
                } else {
                    None
                }
            })
            .collect();
        if name.is_empty() {
            "CJKFont".to_string()
        } else {
            name
        }
    }

    /// Full BMP CID -> glyph index map (2 bytes per CID).
    fn create_cid_to_gid_map_stream(&self) -> Option<Stream> {
        let font = &self.font_context.unicode_font.as_ref()?.font;
        let mut map = vec![0u8; 65536 * 2];
        for cid in 0u32..=0xFFFF {
            if let Some(ch) = char::from_u32(cid) {
                let gid = font.lookup_glyph_index(ch);
                let offset = (cid as usize) * 2;
                map[offset] = (gid >> 8) as u8;
                map[offset + 1] = (gid & 0xFF) as u8;
            }
        }
        Some(Stream::new(Dictionary::new(), map))
    }

    fn add_page_to_tree(&mut self, page_id: ObjectId) -> Result<()> {
        let pages_obj = self.document.get_object_mut(self.pages_id)?;
        if let Object::Dictionary(ref mut pages_dict) = pages_obj {
            let kids = pages_dict.get_mut(b"Kids")?.as_array_mut()?;
            kids.push(Object::Reference(page_id));
            let count = kids.len() as i64;
            pages_dict.set("Count", Object::Integer(count));
            Ok(())
        } else {
            Err(anyhow!("Pages object is not a dictionary"))
        }
    }

    fn get_page_count(&self) -> Result<usize> {
        let pages_obj = self.document.get_object(self.pages_id)?;
        if let Object::Dictionary(ref pages_dict) = pages_obj {
            Ok(pages_dict.get(b"Kids")?.as_array()?.len())
        } else {
            Ok(0)
        }
    }
}

fn black_fill() -> Operation {
    Operation::new("rg", vec![Object::Real(0.0), Object::Real(0.0), Object::Real(0.0)])
}

fn text_matrix(x: f32, y: f32) -> Operation {
    Operation::new(
        "Tm",
        vec![
            Object::Real(1.0),
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(1.0),
            Object::Real(x),
            Object::Real(y),
        ],
    )
}

fn create_identity_tounicode_cmap_stream() -> Stream {
    let cmap = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CIDSystemInfo
<< /Registry (Adobe)
/Ordering (UCS)
/Supplement 0
>> def
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
1 beginbfrange
<0000> <FFFF> <0000>
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end"
    .to_vec();
    Stream::new(Dictionary::new(), cmap)
}

/// WinAnsi agrees with Latin-1 for printable ASCII and 0xA0..=0xFF.
fn win_ansi_byte(ch: char) -> Option<u8> {
    match ch as u32 {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => Some(code as u8),
        _ => None,
    }
}

pub(crate) fn is_win_ansi(text: &str) -> bool {
    text.chars().all(|ch| win_ansi_byte(ch).is_some())
}

fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars().map(|ch| win_ansi_byte(ch).unwrap_or(b'?')).collect()
}

fn utf16_be_bytes(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
}

/// Everything outside the URI unreserved set.
const DICTIONARY_QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a token for the dictionary query string.
pub fn percent_encode(text: &str) -> String {
    utf8_percent_encode(text, DICTIONARY_QUERY_SET).to_string()
}

/// Create an interlinear PDF generator
pub fn create_interlinear_generator(font_context: FontContext) -> InterlinearPdfGenerator {
    InterlinearPdfGenerator::new(font_context)
}

/// Render an accumulated document to `output_path`.
pub fn create_interlinear_pdf_with_context(
    document: &InterlinearDocument,
    output_path: &str,
    font_context: &FontContext,
) -> Result<()> {
    let mut generator = create_interlinear_generator(font_context.clone());
    generator.generate_pdf(document, output_path)
}

/// Annotate, lay out and render raw source text.
pub fn create_interlinear_pdf(
    text: &str,
    annotator: &Annotator,
    output_path: &str,
    font_context: &FontContext,
) -> Result<()> {
    let document = InterlinearDocument::from_text(text, annotator, font_context);
    create_interlinear_pdf_with_context(&document, output_path, font_context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::ResolvedSentence;
    use crate::typography::{PartOfSpeech, TokenAnnotation};

    fn token(gloss: &str, phonetic: &str, literal: &str) -> TokenAnnotation {
        TokenAnnotation {
            gloss: gloss.into(),
            phonetic: phonetic.into(),
            literal: literal.into(),
            category: PartOfSpeech::Noun,
        }
    }

    fn sample_document(ctx: &FontContext, tokens: usize) -> InterlinearDocument {
        let sentence = ResolvedSentence {
            source: "书".repeat(tokens),
            translation: "Books.".into(),
            tokens: (0..tokens).map(|_| token("book", "shū", "书")).collect(),
        };
        InterlinearDocument::from_resolved(&[sentence], ctx)
    }

    fn count_links(doc: &Document) -> usize {
        doc.get_pages()
            .values()
            .filter_map(|&id| doc.get_dictionary(id).ok())
            .filter_map(|page| page.get(b"Annots").ok())
            .filter_map(|annots| annots.as_array().ok())
            .map(|annots| annots.len())
            .sum()
    }

    #[test]
    fn renders_a_loadable_pdf_with_one_link_per_token() {
        let ctx = FontContext::default();
        let document = sample_document(&ctx, 3);
        let bytes = InterlinearPdfGenerator::new(ctx).render_to_bytes(&document).unwrap();

        let pdf = Document::load_mem(&bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);
        assert_eq!(count_links(&pdf), 3);
    }

    #[test]
    fn page_breaks_after_lines_per_page_chunks() {
        let mut ctx = FontContext::default();
        ctx.line_budget = 1.0; // one token per chunk
        ctx.lines_per_page = 2;
        let document = sample_document(&ctx, 5);
        assert_eq!(document.chunk_count(), 5);

        let bytes = InterlinearPdfGenerator::new(ctx).render_to_bytes(&document).unwrap();
        let pdf = Document::load_mem(&bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 3);
    }

    #[test]
    fn exact_page_multiple_leaves_no_blank_page() {
        let mut ctx = FontContext::default();
        ctx.line_budget = 1.0;
        ctx.lines_per_page = 2;
        let document = sample_document(&ctx, 4);

        let bytes = InterlinearPdfGenerator::new(ctx).render_to_bytes(&document).unwrap();
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 2);
    }

    #[test]
    fn empty_document_still_has_a_page() {
        let ctx = FontContext::default();
        let bytes = InterlinearPdfGenerator::new(ctx)
            .render_to_bytes(&InterlinearDocument::new())
            .unwrap();
        assert_eq!(Document::load_mem(&bytes).unwrap().get_pages().len(), 1);
    }

    #[test]
    fn invalid_settings_fail_before_rendering() {
        let mut ctx = FontContext::default();
        ctx.lines_per_page = 0;
        let document = InterlinearDocument::new();
        assert!(InterlinearPdfGenerator::new(ctx).render_to_bytes(&document).is_err());
    }

    #[test]
    fn writes_pdf_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let ctx = FontContext::default();
        let document = sample_document(&ctx, 2);
        create_interlinear_pdf_with_context(&document, path.to_str().unwrap(), &ctx).unwrap();
        assert!(Document::load(&path).is_ok());
    }

    #[test]
    fn latin_cells_need_no_glyph_adjustment_by_default() {
        let generator = InterlinearPdfGenerator::new(FontContext::default());
        let (font, tj) = generator.build_tj_array("book", false);
        assert_eq!(font, LATIN_FONT);
        assert_eq!(tj.len(), 1);

        let (font, tj) = generator.build_tj_array("书本", true);
        assert_eq!(font, UNICODE_FONT);
        assert_eq!(tj.len(), 1);
    }

    #[test]
    fn narrow_unicode_text_is_spaced_like_courier() {
        let generator = InterlinearPdfGenerator::new(FontContext::default());
        let (font, tj) = generator.build_tj_array("shū", false);
        assert_eq!(font, UNICODE_FONT);
        // three glyphs with two adjustments between them
        assert_eq!(tj.len(), 5);
        assert!(matches!(tj[1], Object::Real(v) if (v - 400.0).abs() < 0.01));
    }

    #[test]
    fn win_ansi_detection() {
        assert!(is_win_ansi("café"));
        assert!(!is_win_ansi("shū"));
        assert!(!is_win_ansi("书"));
    }

    #[test]
    fn percent_encoding_covers_utf8() {
        assert_eq!(percent_encode("书"), "%E4%B9%A6");
        assert_eq!(percent_encode("a b"), "a%20b");
        assert_eq!(percent_encode("a-b_c.d~e/f"), "a-b_c.d~e%2Ff");
    }

    #[test]
    fn long_translations_wrap_on_words() {
        let generator = InterlinearPdfGenerator::new(FontContext::default());
        let lines = generator.wrap_translation("aaaa bbbb cccc", 10.0, 60.0);
        // 10pt * 0.6 = 6pt per char; "aaaa bbbb" is 54pt
        assert_eq!(lines, vec!["aaaa bbbb".to_string(), "cccc".to_string()]);
    }
}
