//! Lays out part-of-speech tagged text and writes both renderings.

use interlinear_pdf_creator::annotate::{Annotator, StaticTranslator, TableTranscriber, TaggedSegmenter};
use interlinear_pdf_creator::{
    create_interlinear_html_with_context, create_interlinear_pdf_with_context, FontContext,
    InterlinearDocument,
};

fn main() -> anyhow::Result<()> {
    let font_context = FontContext::initialize_fonts()?;

    let transcriber = TableTranscriber::parse("我\twǒ\n学习\txuéxí\n中文\tzhōngwén\n");
    let mut translator = StaticTranslator::new();
    translator.insert("我/pronoun 学习/verb 中文/noun.", "I study Chinese.");

    let annotator = Annotator::new(Box::new(TaggedSegmenter))
        .with_transcriber(Box::new(transcriber))
        .with_translator(Box::new(translator));

    let document = InterlinearDocument::from_text(
        "我/pronoun 学习/verb 中文/noun。",
        &annotator,
        &font_context,
    );
    println!(
        "{} sentences, {} tokens, {} chunks",
        document.sentences.len(),
        document.token_count(),
        document.chunk_count()
    );

    create_interlinear_pdf_with_context(&document, "tagged_output.pdf", &font_context)?;
    create_interlinear_html_with_context(&document, "tagged_output.html", &font_context)?;
    std::fs::write("tagged_layout.json", document.to_json()?)?;
    println!("Wrote tagged_output.pdf, tagged_output.html and tagged_layout.json");
    Ok(())
}
