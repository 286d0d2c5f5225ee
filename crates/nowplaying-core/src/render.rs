//! Drawing surface abstraction, text metrics, and RGB565 color helpers.

use embedded_hal::delay::DelayNs;

/// Packed 5-6-5 pixel as sent to the panel.
pub type Rgb565 = u16;

pub const BLACK: Rgb565 = 0x0000;
pub const WHITE: Rgb565 = 0xFFFF;
pub const BLUE: Rgb565 = 0x001F;

pub const DEFAULT_BRIGHTNESS: u8 = 153;
pub const FADE_STEPS: u32 = 50;

/// Packs 8-bit channels the way the panel driver expects.
pub const fn color565(r: u8, g: u8, b: u8) -> Rgb565 {
    (((r & 0xF8) as u16) << 8) | (((g & 0xFC) as u16) << 3) | ((b >> 3) as u16)
}

/// Splits a pixel into its raw 5-bit red, 6-bit green and 5-bit blue fields.
pub const fn unpack565(color: Rgb565) -> (u8, u8, u8) {
    (
        ((color >> 11) & 0x1F) as u8,
        ((color >> 5) & 0x3F) as u8,
        (color & 0x1F) as u8,
    )
}

pub const fn pack565(r5: u8, g6: u8, b5: u8) -> Rgb565 {
    (((r5 & 0x1F) as u16) << 11) | (((g6 & 0x3F) as u16) << 5) | ((b5 & 0x1F) as u16)
}

/// Per-channel linear blend from `from` to `to` at `step / steps`, truncated.
pub fn interpolate565(from: Rgb565, to: Rgb565, step: u32, steps: u32) -> Rgb565 {
    if steps == 0 {
        return from;
    }

    let step = step.min(steps) as i32;
    let steps = steps as i32;
    let (r1, g1, b1) = unpack565(from);
    let (r2, g2, b2) = unpack565(to);
    let blend = |a: u8, b: u8| -> u8 {
        let a = a as i32;
        let b = b as i32;
        ((a * steps + (b - a) * step) / steps) as u8
    };

    pack565(blend(r1, r2), blend(g1, g2), blend(b1, b2))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Font {
    /// Artist and album lines, progress time labels.
    Regular,
    /// Track title.
    Title,
    /// Provisioning and status messages.
    Message,
    /// Highlighted provisioning values.
    Large,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TextColors {
    pub fg: Rgb565,
    pub bg: Rgb565,
}

impl TextColors {
    pub const fn new(fg: Rgb565, bg: Rgb565) -> Self {
        Self { fg, bg }
    }
}

pub trait TextMetrics {
    fn text_width(&self, text: &str, font: Font) -> u32;
    fn line_height(&self, font: Font) -> u32;
}

/// Pixel sink for the now-playing screen.
///
/// Coordinates are panel pixels with the origin in the top-left corner.
/// Text is positioned by the top-left corner of its bounding box.
pub trait Surface: TextMetrics {
    fn size(&self) -> (u32, u32);

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb565);

    fn fill_round_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        radius: u32,
        color: Rgb565,
    );

    fn hline(&mut self, x: i32, y: i32, width: u32, color: Rgb565);

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: Font, colors: TextColors);

    /// Blits `pixels` row-major into the `width` x `height` box at `(x, y)`.
    fn draw_image(&mut self, x: i32, y: i32, width: u32, height: u32, pixels: &[Rgb565]);

    fn fill_screen(&mut self, color: Rgb565) {
        let (width, height) = self.size();
        self.fill_rect(0, 0, width, height, color);
    }

    /// Current backlight level, or `None` when the panel has no dimmable backlight.
    fn backlight(&self) -> Option<u8> {
        None
    }

    fn set_backlight(&mut self, _level: u8) {}
}

/// Ramps the backlight to `target` in [`FADE_STEPS`] equal steps spread over `duration_ms`.
pub fn fade_backlight<S, D>(surface: &mut S, delay: &mut D, target: u8, duration_ms: u32)
where
    S: Surface + ?Sized,
    D: DelayNs,
{
    let Some(from) = surface.backlight() else {
        return;
    };

    let steps = FADE_STEPS;
    let step_delay_ms = duration_ms / steps;
    let from = from as i32;
    let span = target as i32 - from;

    for step in 1..=steps {
        let level = from + span * step as i32 / steps as i32;
        surface.set_backlight(level as u8);
        if step_delay_ms > 0 {
            delay.delay_ms(step_delay_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{NoDelay, RecordingSurface};

    #[test]
    fn color565_matches_panel_packing() {
        assert_eq!(color565(255, 255, 255), WHITE);
        assert_eq!(color565(0, 0, 0), BLACK);
        assert_eq!(color565(255, 0, 0), 0xF800);
        assert_eq!(color565(0, 255, 0), 0x07E0);
        assert_eq!(color565(0, 0, 255), 0x001F);
    }

    #[test]
    fn interpolation_hits_both_endpoints() {
        let from = color565(255, 255, 255);
        let to = color565(220, 220, 220);
        assert_eq!(interpolate565(from, to, 0, 6), from);
        assert_eq!(interpolate565(from, to, 6, 6), to);

        let (r, _, _) = unpack565(interpolate565(from, to, 1, 6));
        assert_eq!(r, 30);
    }

    #[test]
    fn fade_lands_on_target_level() {
        let mut surface = RecordingSurface::new(320, 240);
        surface.brightness = Some(DEFAULT_BRIGHTNESS);

        fade_backlight(&mut surface, &mut NoDelay, 0, 600);
        assert_eq!(surface.brightness, Some(0));
        assert_eq!(surface.backlight_writes, FADE_STEPS as usize);

        fade_backlight(&mut surface, &mut NoDelay, DEFAULT_BRIGHTNESS, 600);
        assert_eq!(surface.brightness, Some(DEFAULT_BRIGHTNESS));
    }

    #[test]
    fn fade_is_a_no_op_without_backlight_control() {
        let mut surface = RecordingSurface::new(320, 240);
        fade_backlight(&mut surface, &mut NoDelay, 0, 600);
        assert_eq!(surface.backlight_writes, 0);
    }
}
