use embedded_graphics::{
    mono_font::MonoTextStyleBuilder,
    pixelcolor::{Rgb565 as PanelColor, raw::RawU16},
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle, RoundedRectangle},
    text::{Baseline, Text},
};
use embedded_hal::pwm::SetDutyCycle;
use nowplaying_core::render::{Font, Rgb565, Surface, TextColors, TextMetrics};

use crate::render::{MonoMetrics, mono_font};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SurfaceError<DrawErr, PwmErr> {
    Draw(DrawErr),
    Backlight(PwmErr),
}

/// [`Surface`] over an RGB565 `embedded-graphics` draw target with an
/// optional PWM backlight.
///
/// Draw calls cannot fail through the trait, so the first fault is kept for
/// the board loop to report and later ones are dropped.
pub struct TftSurface<D, BL>
where
    D: DrawTarget<Color = PanelColor>,
    BL: SetDutyCycle,
{
    display: D,
    backlight: Option<BL>,
    level: u8,
    fault: Option<SurfaceError<D::Error, BL::Error>>,
}

impl<D, BL> TftSurface<D, BL>
where
    D: DrawTarget<Color = PanelColor>,
    BL: SetDutyCycle,
{
    pub fn new(display: D, backlight: Option<BL>) -> Self {
        Self {
            display,
            backlight,
            level: 0,
            fault: None,
        }
    }

    pub fn take_fault(&mut self) -> Option<SurfaceError<D::Error, BL::Error>> {
        self.fault.take()
    }

    fn record_draw(&mut self, result: Result<(), D::Error>) {
        if let Err(err) = result
            && self.fault.is_none()
        {
            self.fault = Some(SurfaceError::Draw(err));
        }
    }
}

fn panel_color(color: Rgb565) -> PanelColor {
    PanelColor::from(RawU16::new(color))
}

fn area(x: i32, y: i32, width: u32, height: u32) -> Rectangle {
    Rectangle::new(Point::new(x, y), Size::new(width, height))
}

impl<D, BL> TextMetrics for TftSurface<D, BL>
where
    D: DrawTarget<Color = PanelColor>,
    BL: SetDutyCycle,
{
    fn text_width(&self, text: &str, font: Font) -> u32 {
        MonoMetrics.text_width(text, font)
    }

    fn line_height(&self, font: Font) -> u32 {
        MonoMetrics.line_height(font)
    }
}

impl<D, BL> Surface for TftSurface<D, BL>
where
    D: DrawTarget<Color = PanelColor>,
    BL: SetDutyCycle,
{
    fn size(&self) -> (u32, u32) {
        let size = self.display.bounding_box().size;
        (size.width, size.height)
    }

    fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgb565) {
        if width == 0 || height == 0 {
            return;
        }
        let result = self
            .display
            .fill_solid(&area(x, y, width, height), panel_color(color));
        self.record_draw(result);
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
        let result = RoundedRectangle::with_equal_corners(
            area(x, y, width, height),
            Size::new(radius, radius),
        )
        .into_styled(PrimitiveStyle::with_fill(panel_color(color)))
        .draw(&mut self.display);
        self.record_draw(result);
    }

    fn hline(&mut self, x: i32, y: i32, width: u32, color: Rgb565) {
        self.fill_rect(x, y, width, 1, color);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: Font, colors: TextColors) {
        let style = MonoTextStyleBuilder::new()
            .font(mono_font(font))
            .text_color(panel_color(colors.fg))
            .background_color(panel_color(colors.bg))
            .build();
        let result = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top)
            .draw(&mut self.display)
            .map(|_| ());
        self.record_draw(result);
    }

    fn draw_image(&mut self, x: i32, y: i32, width: u32, height: u32, pixels: &[Rgb565]) {
        let result = self.display.fill_contiguous(
            &area(x, y, width, height),
            pixels.iter().map(|pixel| panel_color(*pixel)),
        );
        self.record_draw(result);
    }

    fn backlight(&self) -> Option<u8> {
        self.backlight.as_ref().map(|_| self.level)
    }

    fn set_backlight(&mut self, level: u8) {
        let Some(backlight) = self.backlight.as_mut() else {
            return;
        };

        self.level = level;
        if let Err(err) = backlight.set_duty_cycle_fraction(level as u16, u8::MAX as u16)
            && self.fault.is_none()
        {
            self.fault = Some(SurfaceError::Backlight(err));
        }
    }
}
