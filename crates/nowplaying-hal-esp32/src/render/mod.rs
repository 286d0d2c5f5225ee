//! Fixed-pitch font faces and their metrics.

use embedded_graphics::mono_font::{
    MonoFont,
    ascii::{FONT_7X13, FONT_7X13_BOLD, FONT_9X15_BOLD, FONT_10X20},
};
use nowplaying_core::render::{Font, TextMetrics};

pub fn mono_font(font: Font) -> &'static MonoFont<'static> {
    match font {
        Font::Regular => &FONT_7X13,
        Font::Title => &FONT_9X15_BOLD,
        Font::Message => &FONT_7X13_BOLD,
        Font::Large => &FONT_10X20,
    }
}

/// Metrics of the ASCII mono fonts: every glyph advances by the same width.
#[derive(Clone, Copy, Debug, Default)]
pub struct MonoMetrics;

impl TextMetrics for MonoMetrics {
    fn text_width(&self, text: &str, font: Font) -> u32 {
        let face = mono_font(font);
        let glyphs = text.chars().count() as u32;
        if glyphs == 0 {
            return 0;
        }
        glyphs * face.character_size.width + (glyphs - 1) * face.character_spacing
    }

    fn line_height(&self, font: Font) -> u32 {
        mono_font(font).character_size.height
    }
}
