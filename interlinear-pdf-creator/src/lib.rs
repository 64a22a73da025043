//! Interlinear PDF Creator
//!
//! Lays out source sentences as three word-aligned layers (gloss, phonetic,
//! source text) with a full-sentence translation, and renders the result as a
//! print-ready PDF or an HTML page.

pub mod accumulator;
pub mod annotate;
pub mod chunker;
pub mod fonts;
pub mod html_layer;
pub mod interlinear_generator;
pub mod typography;
pub mod width;

// Re-export commonly used functions and types
pub use accumulator::{InterlinearDocument, ResolvedSentence};
pub use annotate::{Annotator, LookupError};
pub use chunker::chunk_ranges;
pub use fonts::FontContext;
pub use html_layer::create_interlinear_html_with_context;
pub use interlinear_generator::{create_interlinear_pdf, create_interlinear_pdf_with_context};
pub use typography::{InterlinearLayoutEngine, PartOfSpeech, TokenAnnotation};
pub use width::WidthModel;

use anyhow::{anyhow, Result};
use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_int};

unsafe fn c_str_to_string(ptr: *const c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(anyhow!("null string argument"));
    }
    Ok(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

fn render_resolved(sentences_json: &str, output_path: &str, font_context: &FontContext) -> Result<()> {
    font_context.validate()?;
    let sentences: Vec<ResolvedSentence> = serde_json::from_str(sentences_json)?;
    let document = InterlinearDocument::from_resolved(&sentences, font_context);
    create_interlinear_pdf_with_context(&document, output_path, font_context)
}

/// Render pre-resolved sentences, given as a JSON array of
/// `{ "translation": ..., "tokens": [{ "gloss", "phonetic", "literal", "category" }] }`.
///
/// `context` may be null, in which case default settings and discovered fonts are used.
#[no_mangle]
pub unsafe extern "C" fn generate_interlinear_pdf(
    context: *const c_void,
    sentences_json: *const c_char,
    output_path: *const c_char,
) -> c_int {
    let result = (|| -> Result<()> {
        let sentences_json = c_str_to_string(sentences_json)?;
        let output_path = c_str_to_string(output_path)?;
        if context.is_null() {
            let font_context = fonts::initialize_fonts()?;
            render_resolved(&sentences_json, &output_path, &font_context)
        } else {
            let font_context = &*(context as *const FontContext);
            render_resolved(&sentences_json, &output_path, font_context)
        }
    })();

    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("PDF generation failed: {:#}", e);
            -1
        }
    }
}

/// Initialize the PDF creator (load fonts, etc.)
#[no_mangle]
pub extern "C" fn init_pdf_creator() -> *mut c_void {
    match fonts::initialize_fonts() {
        Ok(font_context) => Box::into_raw(Box::new(font_context)) as *mut c_void,
        Err(e) => {
            log::error!("Font initialization failed: {:#}", e);
            std::ptr::null_mut()
        }
    }
}

/// Cleanup PDF creator resources
#[no_mangle]
pub unsafe extern "C" fn cleanup_pdf_creator(context: *mut c_void) {
    if !context.is_null() {
        drop(Box::from_raw(context as *mut FontContext));
    }
}

/// Set page geometry and the main layout constants. Rejected options leave
/// the context unchanged.
#[no_mangle]
pub unsafe extern "C" fn set_pdf_options(
    context: *mut c_void,
    page_width: f32,
    page_height: f32,
    margin: f32,
    base_font_size: f32,
    line_budget: f32,
    lines_per_page: c_int,
    line_spacing: f32,
) -> c_int {
    if context.is_null() || lines_per_page <= 0 {
        return -1;
    }

    let font_context = &mut *(context as *mut FontContext);
    let mut candidate = font_context.clone();
    candidate.set_options(
        page_width,
        page_height,
        margin,
        base_font_size,
        line_budget,
        lines_per_page as usize,
        line_spacing,
    );

    match candidate.validate() {
        Ok(()) => {
            *font_context = candidate;
            0
        }
        Err(e) => {
            log::error!("Rejected PDF options: {:#}", e);
            -1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn boxed_context() -> *mut c_void {
        Box::into_raw(Box::new(FontContext::default())) as *mut c_void
    }

    #[test]
    fn rejected_options_leave_the_context_unchanged() {
        let context = boxed_context();
        let status = unsafe { set_pdf_options(context, 595.0, 842.0, 36.0, f32::NAN, 1500.0, 8, 1.2) };
        assert_eq!(status, -1);

        let font_context = unsafe { &*(context as *const FontContext) };
        assert_eq!(font_context.base_font_size, 40.0);
        assert_eq!(font_context.margin, 72.0);
        assert_eq!(font_context.lines_per_page, 14);

        let dir = tempfile::tempdir().unwrap();
        let output = CString::new(dir.path().join("out.pdf").to_string_lossy().into_owned()).unwrap();
        let json = CString::new(r#"[{"translation": "Good.", "tokens": [{"gloss": "good", "phonetic": "hǎo", "literal": "好"}]}]"#)
            .unwrap();
        let status = unsafe { generate_interlinear_pdf(context, json.as_ptr(), output.as_ptr()) };
        assert_eq!(status, 0);

        unsafe { cleanup_pdf_creator(context) };
    }

    #[test]
    fn accepted_options_are_applied() {
        let context = boxed_context();
        let status = unsafe { set_pdf_options(context, 595.0, 842.0, 36.0, 24.0, 1500.0, 8, 1.2) };
        assert_eq!(status, 0);

        let font_context = unsafe { &*(context as *const FontContext) };
        assert_eq!(font_context.base_font_size, 24.0);
        assert_eq!(font_context.lines_per_page, 8);
        unsafe { cleanup_pdf_creator(context) };
    }

    #[test]
    fn invalid_context_fails_before_layout() {
        let mut font_context = FontContext::default();
        font_context.base_font_size = f32::NAN;
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.pdf");
        let json = r#"[{"tokens": [{"gloss": "a", "phonetic": "b", "literal": "c"}]}]"#;
        assert!(render_resolved(json, output.to_str().unwrap(), &font_context).is_err());
        assert!(!output.exists());
    }
}
