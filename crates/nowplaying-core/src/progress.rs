//! Differential progress bar: the static track is drawn once per reset, the
//! gradient fill only grows or shrinks by the changed columns, and the time
//! labels are repainted only when their text changes.

use core::fmt::Write as _;

use heapless::String;

use crate::render::{BLACK, Font, Rgb565, Surface, TextColors, color565, interpolate565};

/// Fits `u64::MAX` milliseconds: 15 minute digits, a colon, two second digits.
pub const TIME_LABEL_BYTES: usize = 18;
/// Widest label the clear box has to cover.
const LABEL_TEMPLATE: &str = "88:88";
const LABEL_CLEAR_PADDING: u32 = 8;

pub type TimeLabel = String<TIME_LABEL_BYTES>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressBarStyle {
    bar_height: u32,
    padding: u32,
    margin_bottom: u32,
    radius: u32,
    label_gap: u32,
    pub border: Rgb565,
    pub track: Rgb565,
    pub fill_start: Rgb565,
    pub fill_end: Rgb565,
    pub highlight: Rgb565,
    pub label: Rgb565,
    pub background: Rgb565,
}

impl Default for ProgressBarStyle {
    fn default() -> Self {
        Self {
            bar_height: 8,
            padding: 25,
            margin_bottom: 45,
            radius: 4,
            label_gap: 4,
            border: color565(60, 60, 60),
            track: color565(40, 40, 40),
            fill_start: color565(255, 255, 255),
            fill_end: color565(220, 220, 220),
            highlight: color565(255, 255, 255),
            label: color565(180, 180, 180),
            background: BLACK,
        }
    }
}

impl ProgressBarStyle {
    pub const fn with_bar_height(mut self, bar_height: u32) -> Self {
        self.bar_height = bar_height;
        self
    }

    pub const fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub const fn with_margin_bottom(mut self, margin_bottom: u32) -> Self {
        self.margin_bottom = margin_bottom;
        self
    }

    pub const fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressBarLayout {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub radius: u32,
    pub panel_width: u32,
}

impl ProgressBarLayout {
    pub fn for_panel(panel_width: u32, panel_height: u32, style: &ProgressBarStyle) -> Self {
        Self {
            x: style.padding as i32,
            y: panel_height.saturating_sub(style.margin_bottom) as i32,
            width: panel_width.saturating_sub(style.padding * 2),
            height: style.bar_height,
            radius: style.radius,
            panel_width,
        }
    }

    /// Width inside the one-pixel border.
    pub const fn drawable_width(&self) -> u32 {
        self.width.saturating_sub(2)
    }

    const fn inner_height(&self) -> u32 {
        self.height.saturating_sub(2)
    }
}

/// Filled pixel width for a playback position.
///
/// The whole percentage is mapped onto `drawable_width`. Any non-zero fill is
/// raised to at least two corner radii so the rounded ends stay intact.
pub fn fill_width(progress_ms: u64, duration_ms: u64, drawable_width: u32, radius: u32) -> u32 {
    let percent = if duration_ms == 0 {
        0
    } else {
        (progress_ms.saturating_mul(100) / duration_ms).min(100)
    };

    let filled = (percent * drawable_width as u64 / 100) as u32;
    let minimum = radius * 2;
    if filled > 0 && filled < minimum {
        minimum.min(drawable_width)
    } else {
        filled
    }
}

/// Formats milliseconds as zero-padded `MM:SS`. Minutes keep growing past
/// 99 rather than wrapping.
pub fn format_time(ms: u64) -> TimeLabel {
    let total_seconds = ms / 1000;
    let mut out = TimeLabel::new();
    // Cannot overflow: the label is sized for the widest u64 input.
    let _ = write!(out, "{:02}:{:02}", total_seconds / 60, total_seconds % 60);
    out
}

/// What the last render pass repainted.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ProgressRedraw {
    pub track: bool,
    pub fill: bool,
    pub labels: bool,
}

impl ProgressRedraw {
    pub const fn any(&self) -> bool {
        self.track || self.fill || self.labels
    }
}

/// Remembers what is on the panel so the next render only touches changed pixels.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProgressBarState {
    bar_initialized: bool,
    last_filled_width: Option<u32>,
    last_current_label: TimeLabel,
    last_total_label: TimeLabel,
}

impl ProgressBarState {
    pub const fn new() -> Self {
        Self {
            bar_initialized: false,
            last_filled_width: None,
            last_current_label: TimeLabel::new(),
            last_total_label: TimeLabel::new(),
        }
    }

    /// Forces the next render to redraw the track and both labels.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub const fn is_initialized(&self) -> bool {
        self.bar_initialized
    }

    pub const fn last_filled_width(&self) -> Option<u32> {
        self.last_filled_width
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProgressBar {
    layout: ProgressBarLayout,
    style: ProgressBarStyle,
}

impl ProgressBar {
    pub fn new(panel_width: u32, panel_height: u32, style: ProgressBarStyle) -> Self {
        Self {
            layout: ProgressBarLayout::for_panel(panel_width, panel_height, &style),
            style,
        }
    }

    pub const fn layout(&self) -> &ProgressBarLayout {
        &self.layout
    }

    pub fn render<S>(
        &self,
        state: &mut ProgressBarState,
        surface: &mut S,
        progress_ms: u64,
        duration_ms: u64,
    ) -> ProgressRedraw
    where
        S: Surface + ?Sized,
    {
        let layout = &self.layout;
        let mut redraw = ProgressRedraw::default();
        let filled = fill_width(
            progress_ms,
            duration_ms,
            layout.drawable_width(),
            layout.radius,
        );

        if !state.bar_initialized {
            self.draw_track(surface);
            state.bar_initialized = true;
            state.last_filled_width = None;
            redraw.track = true;
        }

        if state.last_filled_width != Some(filled) {
            if let Some(last) = state.last_filled_width
                && filled < last
            {
                surface.fill_rect(
                    layout.x + 1 + filled as i32,
                    layout.y + 1,
                    last - filled,
                    layout.inner_height(),
                    self.style.track,
                );
            }
            if filled > 0 {
                self.draw_fill(surface, filled);
            }
            state.last_filled_width = Some(filled);
            redraw.fill = true;
        }

        let current = format_time(progress_ms);
        let total = format_time(duration_ms);
        if current != state.last_current_label || total != state.last_total_label {
            self.draw_labels(surface, &current, &total);
            state.last_current_label = current;
            state.last_total_label = total;
            redraw.labels = true;
        }

        redraw
    }

    fn draw_track<S: Surface + ?Sized>(&self, surface: &mut S) {
        let layout = &self.layout;
        surface.fill_round_rect(
            layout.x,
            layout.y,
            layout.width,
            layout.height,
            layout.radius,
            self.style.border,
        );
        surface.fill_round_rect(
            layout.x + 1,
            layout.y + 1,
            layout.drawable_width(),
            layout.inner_height(),
            layout.radius.saturating_sub(1),
            self.style.track,
        );
    }

    fn draw_fill<S: Surface + ?Sized>(&self, surface: &mut S, filled: u32) {
        let layout = &self.layout;
        let rows = layout.inner_height();
        let corner = layout.radius.saturating_sub(1);
        let bottom_start = rows.saturating_sub(corner);

        for row in 0..rows {
            let inset = if row < corner {
                corner - row
            } else if row >= bottom_start {
                row - bottom_start
            } else {
                0
            };

            let width = filled.saturating_sub(inset * 2);
            if width == 0 {
                continue;
            }

            let color = interpolate565(self.style.fill_start, self.style.fill_end, row, rows);
            surface.hline(
                layout.x + 1 + inset as i32,
                layout.y + 1 + row as i32,
                width,
                color,
            );
        }

        let caps = layout.radius * 2;
        if filled > caps {
            surface.hline(
                layout.x + layout.radius as i32,
                layout.y + 1,
                filled - caps,
                self.style.highlight,
            );
        }
    }

    fn draw_labels<S: Surface + ?Sized>(&self, surface: &mut S, current: &str, total: &str) {
        let layout = &self.layout;
        let bar_bottom = layout.y + layout.height as i32;
        let label_y = bar_bottom + self.style.label_gap as i32;
        let line_height = surface.line_height(Font::Regular);
        let clear_width = surface.text_width(LABEL_TEMPLATE, Font::Regular) + LABEL_CLEAR_PADDING;
        let clear_y = (label_y - 1).max(bar_bottom);
        let clear_height = line_height + 2;
        let right_edge = layout.panel_width.saturating_sub(self.style.padding) as i32;
        let colors = TextColors::new(self.style.label, self.style.background);

        surface.fill_rect(
            layout.x,
            clear_y,
            clear_width,
            clear_height,
            self.style.background,
        );
        surface.fill_rect(
            right_edge - clear_width as i32,
            clear_y,
            clear_width,
            clear_height,
            self.style.background,
        );

        surface.draw_text(layout.x, label_y, current, Font::Regular, colors);
        let total_width = surface.text_width(total, Font::Regular) as i32;
        surface.draw_text(right_edge - total_width, label_y, total, Font::Regular, colors);
    }
}
