use embedded_hal::delay::DelayNs;

use crate::render::{Font, Rgb565, Surface, TextColors, TextMetrics};

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DrawOp {
    FillRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Rgb565,
    },
    FillRoundRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        radius: u32,
        color: Rgb565,
    },
    HLine {
        x: i32,
        y: i32,
        width: u32,
        color: Rgb565,
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        font: Font,
    },
    Image {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
}

/// Fixed-pitch metrics: every glyph of a font has the same advance.
pub const fn char_width(font: Font) -> u32 {
    match font {
        Font::Regular => 6,
        Font::Title => 8,
        Font::Message => 7,
        Font::Large => 10,
    }
}

pub const fn line_height(font: Font) -> u32 {
    match font {
        Font::Regular => 10,
        Font::Title => 16,
        Font::Message => 12,
        Font::Large => 20,
    }
}

pub struct FixedMetrics;

impl TextMetrics for FixedMetrics {
    fn text_width(&self, text: &str, font: Font) -> u32 {
        text.chars().count() as u32 * char_width(font)
    }

    fn line_height(&self, font: Font) -> u32 {
        line_height(font)
    }
}

pub struct RecordingSurface {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<DrawOp>,
    pub brightness: Option<u8>,
    pub backlight_writes: usize,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            brightness: None,
            backlight_writes: 0,
        }
    }

    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn images(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }
}

impl TextMetrics for RecordingSurface {
    fn text_width(&self, text: &str, font: Font) -> u32 {
        FixedMetrics.text_width(text, font)
    }

    fn line_height(&self, font: Font) -> u32 {
        line_height(font)
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb565) {
        self.ops.push(DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn fill_round_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        radius: u32,
        color: Rgb565,
    ) {
        self.ops.push(DrawOp::FillRoundRect {
            x,
            y,
            width,
            height,
            radius,
            color,
        });
    }

    fn hline(&mut self, x: i32, y: i32, width: u32, color: Rgb565) {
        self.ops.push(DrawOp::HLine { x, y, width, color });
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: Font, _colors: TextColors) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: String::from(text),
            font,
        });
    }

    fn draw_image(&mut self, x: i32, y: i32, width: u32, height: u32, _pixels: &[Rgb565]) {
        self.ops.push(DrawOp::Image {
            x,
            y,
            width,
            height,
        });
    }

    fn backlight(&self) -> Option<u8> {
        self.brightness
    }

    fn set_backlight(&mut self, level: u8) {
        if self.brightness.is_some() {
            self.brightness = Some(level);
            self.backlight_writes += 1;
        }
    }
}
