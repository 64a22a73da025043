use interlinear_pdf_creator::{cleanup_pdf_creator, generate_interlinear_pdf, init_pdf_creator, set_pdf_options};
use std::ffi::CString;

const SENTENCES: &str = r#"[
  {
    "source": "我学习中文.",
    "translation": "I study Chinese.",
    "tokens": [
      { "gloss": "I", "phonetic": "wǒ", "literal": "我", "category": "pronoun" },
      { "gloss": "learn", "phonetic": "xuéxí", "literal": "学习", "category": "verb" },
      { "gloss": "Chinese", "phonetic": "zhōngwén", "literal": "中文", "category": "noun" },
      { "gloss": "", "phonetic": "", "literal": "." }
    ]
  },
  {
    "source": "Bom dia.",
    "translation": "Good morning.",
    "tokens": [
      { "gloss": "good", "phonetic": "bõ", "literal": " Bom", "category": "adjective" },
      { "gloss": "day", "phonetic": "ˈdʒi.ɐ", "literal": " dia." }
    ]
  }
]"#;

fn main() {
    println!("Testing interlinear PDF generation...");

    let context = init_pdf_creator();
    if context.is_null() {
        eprintln!("Failed to initialize PDF creator");
        return;
    }

    let status = unsafe {
        set_pdf_options(
            context,
            595.0, // page width (A4)
            842.0, // page height (A4)
            36.0,  // margin
            24.0,  // base font size
            1500.0, // line budget
            8,     // chunks per page
            1.2,   // line spacing
        )
    };
    if status != 0 {
        eprintln!("Options rejected");
    }

    let sentences = CString::new(SENTENCES).unwrap();
    let output_path = CString::new("test_output.pdf").unwrap();
    let result = unsafe { generate_interlinear_pdf(context, sentences.as_ptr(), output_path.as_ptr()) };

    if result == 0 {
        println!("PDF generated successfully: test_output.pdf");
    } else {
        println!("PDF generation failed with code: {}", result);
    }

    unsafe { cleanup_pdf_creator(context) };
}
