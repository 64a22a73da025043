//! Test example for the interlinear DLL
//!
//! Calls the exported C entry point the way a host application would, once
//! per output format.

use interlinear_dll::{generate_interlinear_output_ffi, OUTPUT_HTML, OUTPUT_PDF};
use std::ffi::CString;
use std::ptr;

const DICTIONARY: &str = "\
如 如 [ru2] /as/as if/
是 是 [shi4] /is/are/
我 我 [wo3] /I/me/
聞 闻 [wen2] /to hear/
";

const TRANSLATIONS: &str = "如是我闻。\tThus have I heard.\n一时佛在舍卫国。\tAt one time the Buddha was in Sravasti.\n";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Testing interlinear DLL...");

    let dir = std::env::temp_dir().join("interlinear-dll-demo");
    std::fs::create_dir_all(&dir)?;
    let dictionary = dir.join("cedict.u8");
    let translations = dir.join("translations.tsv");
    std::fs::write(&dictionary, DICTIONARY)?;
    std::fs::write(&translations, TRANSLATIONS)?;

    let text = CString::new("如是我闻。一时佛在舍卫国。")?;
    let language = CString::new("zh")?;
    let dictionary = CString::new(dictionary.to_string_lossy().into_owned())?;
    let translations = CString::new(translations.to_string_lossy().into_owned())?;

    for (format, file_name) in [(OUTPUT_PDF, "test_dll_output.pdf"), (OUTPUT_HTML, "test_dll_output.html")] {
        let output_path = CString::new(file_name)?;
        let result = unsafe {
            generate_interlinear_output_ffi(
                text.as_ptr(),
                language.as_ptr(),
                dictionary.as_ptr(),
                ptr::null(),
                ptr::null(),
                translations.as_ptr(),
                output_path.as_ptr(),
                format,
                0.0,
                0.0,
                0,
            )
        };

        if result == 0 {
            println!("Generated {}", file_name);
        } else {
            println!("Generation of {} failed with code: {}", file_name, result);
        }
    }

    Ok(())
}
