//! Layout constants and font discovery
//!
//! `FontContext` carries the nominal sizes, width-model constants and page
//! geometry shared by the layout engine and the renderers, plus the optional
//! Unicode font used for text outside WinAnsi (Han characters, pinyin tone marks).

use anyhow::{anyhow, Context, Result};
use fontdue::{Font, FontSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::width::DEFAULT_WIDE_RATIO;

pub const DEFAULT_DICTIONARY_LINK_BASE: &str =
    "https://www.mdbg.net/chinese/dictionary?page=worddict&wdrst=0&wdqb=";

/// Millimetres to PDF points.
pub fn mm_to_pt(mm: f32) -> f32 {
    mm / 25.4 * 72.0
}

/// A font file loaded for embedding and glyph lookup.
#[derive(Clone)]
pub struct LoadedFont {
    pub font: Font,
    pub name: String,
    pub path: String,
    pub data: Vec<u8>,
}

impl LoadedFont {
    pub fn from_path(name: &str, path: &str) -> Result<Self> {
        let data = std::fs::read(path).with_context(|| format!("reading font {}", path))?;
        let font = Font::from_bytes(data.clone(), FontSettings::default())
            .map_err(|e| anyhow!("Failed to load font from {}: {}", path, e))?;
        Ok(Self {
            font,
            name: name.to_string(),
            path: path.to_string(),
            data,
        })
    }

    /// Only plain TrueType files can go into a FontFile2 stream.
    pub fn is_embeddable(&self) -> bool {
        self.path.to_ascii_lowercase().ends_with(".ttf") && !self.data.is_empty()
    }
}

/// Layout and page settings for an interlinear document
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontContext {
    /// Size of the literal (source text) layer.
    pub base_font_size: f32,
    /// Width of one padding space, in width units.
    pub space_unit: f32,
    pub wide_ratio: f32,
    /// Maximum width units per display line.
    pub line_budget: f32,
    /// Chunks rendered per page before a forced page break.
    pub lines_per_page: usize,

    // Page geometry, in points
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    /// Device points per nominal width unit (Courier advance is 0.6 em).
    pub points_per_unit: f32,
    pub line_spacing: f32,

    pub dictionary_link_base: String,
    /// Draw a `|` after every cell, to inspect alignment.
    pub debug_separators: bool,

    #[serde(skip)]
    pub unicode_font: Option<LoadedFont>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self {
            base_font_size: 40.0,
            space_unit: 1.0,
            wide_ratio: DEFAULT_WIDE_RATIO,
            line_budget: 2500.0,
            lines_per_page: 14,

            page_width: mm_to_pt(210.0 * 3.0),
            page_height: mm_to_pt(297.0 * 3.0),
            margin: 72.0,
            points_per_unit: 0.6,
            line_spacing: 1.2,

            dictionary_link_base: DEFAULT_DICTIONARY_LINK_BASE.to_string(),
            debug_separators: false,

            unicode_font: None,
        }
    }
}

impl FontContext {
    /// Default settings plus whatever Unicode font the system provides.
    pub fn initialize_fonts() -> Result<Self> {
        let mut context = Self::default();
        context.unicode_font = Self::load_unicode_font()?;
        match &context.unicode_font {
            Some(font) => log::info!("Loaded Unicode font: {} from {}", font.name, font.path),
            None => log::warn!("No Unicode font found; wide text will not be embedded"),
        }
        Ok(context)
    }

    /// Read settings from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading layout settings {}", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let context: FontContext = serde_json::from_str(raw)?;
        context.validate()?;
        Ok(context)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("base_font_size", self.base_font_size),
            ("space_unit", self.space_unit),
            ("line_budget", self.line_budget),
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("points_per_unit", self.points_per_unit),
            ("line_spacing", self.line_spacing),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(anyhow!("{} must be positive, got {}", name, value));
            }
        }
        if !(self.wide_ratio >= 1.0) {
            return Err(anyhow!("wide_ratio must be at least 1, got {}", self.wide_ratio));
        }
        if self.lines_per_page == 0 {
            return Err(anyhow!("lines_per_page must be at least 1"));
        }
        if !(self.margin >= 0.0 && 2.0 * self.margin < self.page_width.min(self.page_height)) {
            return Err(anyhow!("margin {} does not fit the page", self.margin));
        }
        Ok(())
    }

    /// Priority list of fonts covering both Han characters and pinyin.
    fn load_unicode_font() -> Result<Option<LoadedFont>> {
        let font_paths = vec![
            ("Noto Sans CJK SC", concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/NotoSansSC-Regular.ttf")),
            ("Source Han Sans SC", concat!(env!("CARGO_MANIFEST_DIR"), "/assets/fonts/SourceHanSansSC-Regular.otf")),
            // Windows system fonts
            ("MS Mincho", "C:\\Windows\\Fonts\\msmincho.ttc"),
            ("SimSun", "C:\\Windows\\Fonts\\simsun.ttc"),
            ("Microsoft YaHei", "C:\\Windows\\Fonts\\msyh.ttc"),
            // Linux packaged fonts
            ("Noto Sans CJK SC", "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc"),
            ("WenQuanYi Zen Hei", "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc"),
            ("Droid Sans Fallback", "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf"),
        ];

        for (font_name, font_path) in font_paths {
            if !Path::new(font_path).exists() {
                continue;
            }
            match LoadedFont::from_path(font_name, font_path) {
                Ok(font) => return Ok(Some(font)),
                Err(e) => log::warn!("Skipping font {}: {:#}", font_path, e),
            }
        }

        Ok(None)
    }

    /// Update the main layout options in place.
    pub fn set_options(
        &mut self,
        page_width: f32,
        page_height: f32,
        margin: f32,
        base_font_size: f32,
        line_budget: f32,
        lines_per_page: usize,
        line_spacing: f32,
    ) {
        self.page_width = page_width;
        self.page_height = page_height;
        self.margin = margin;
        self.base_font_size = base_font_size;
        self.line_budget = line_budget;
        self.lines_per_page = lines_per_page;
        self.line_spacing = line_spacing;
    }

    pub fn gloss_font_size(&self) -> f32 {
        self.base_font_size / 4.0
    }

    pub fn phonetic_font_size(&self) -> f32 {
        self.base_font_size / 2.0
    }

    pub fn translation_font_size(&self) -> f32 {
        self.base_font_size / 2.0
    }

    /// Convert nominal width units to points.
    pub fn units_to_points(&self, units: f32) -> f32 {
        units * self.points_per_unit
    }

    pub fn get_line_height(&self, font_size: f32) -> f32 {
        font_size * self.line_spacing
    }

    /// Height of one chunk: gloss, phonetic and literal rows stacked.
    pub fn chunk_height(&self) -> f32 {
        self.get_line_height(self.gloss_font_size())
            + self.get_line_height(self.phonetic_font_size())
            + self.get_line_height(self.base_font_size)
    }

    /// Get content area (page minus margins)
    pub fn content_area(&self) -> (f32, f32, f32, f32) {
        (
            self.margin,
            self.margin,
            self.page_width - 2.0 * self.margin,
            self.page_height - 2.0 * self.margin,
        )
    }
}

/// Initialize the layout settings and fonts
pub fn initialize_fonts() -> Result<FontContext> {
    FontContext::initialize_fonts()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_sizes_follow_base_size() {
        let ctx = FontContext::default();
        assert_eq!(ctx.gloss_font_size(), 10.0);
        assert_eq!(ctx.phonetic_font_size(), 20.0);
        assert_eq!(ctx.translation_font_size(), 20.0);
    }

    #[test]
    fn default_budget_fits_inside_the_page() {
        let ctx = FontContext::default();
        let (_, _, width, _) = ctx.content_area();
        assert!(ctx.units_to_points(ctx.line_budget) < width);
    }

    #[test]
    fn json_overrides_keep_other_defaults() {
        let ctx = FontContext::from_json_str(r#"{ "base_font_size": 32.0, "lines_per_page": 10 }"#)
            .unwrap();
        assert_eq!(ctx.base_font_size, 32.0);
        assert_eq!(ctx.lines_per_page, 10);
        assert_eq!(ctx.line_budget, 2500.0);
        assert!(ctx.unicode_font.is_none());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(FontContext::from_json_str(r#"{ "space_unit": 0.0 }"#).is_err());
        assert!(FontContext::from_json_str(r#"{ "wide_ratio": 0.5 }"#).is_err());
        assert!(FontContext::from_json_str(r#"{ "lines_per_page": 0 }"#).is_err());
        assert!(FontContext::from_json_str(r#"{ "margin": 5000.0 }"#).is_err());
        let mut ctx = FontContext::default();
        ctx.margin = f32::NAN;
        assert!(ctx.validate().is_err());
    }

    #[test]
    fn settings_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(&path, r#"{ "line_budget": 1200.0 }"#).unwrap();
        let ctx = FontContext::from_json_file(&path).unwrap();
        assert_eq!(ctx.line_budget, 1200.0);
    }
}
