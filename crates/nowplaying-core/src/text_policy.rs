//! Bounded text layout for the now-playing panel: greedy word wrap, ellipsis
//! truncation into a line budget, and clipped multi-line printing.
//!
//! Words are separated by ASCII spaces only. A single word wider than the line
//! occupies its own line and overflows horizontally; it is never broken.

use heapless::{String, Vec};

use crate::render::{Font, Surface, TextColors, TextMetrics};

mod glyphs;

pub use glyphs::transliterate;

pub const GLYPH_STRING_BYTES: usize = 256;
pub const MAX_LAYOUT_LINES: usize = 4;
pub const ELLIPSIS: &str = "...";

// Multi-line truncation searches against a narrower width so the ellipsis
// never lands flush against the right edge.
const MULTI_LINE_SAFE_PERCENT: u32 = 90;
// A word boundary is only used if it keeps more than 70% of the cut prefix.
const WORD_PULLBACK_KEEP_PERCENT: usize = 70;

pub type GlyphString = String<GLYPH_STRING_BYTES>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Line<'a> {
    pub text: &'a str,
    pub width: u32,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LayoutResult<'a> {
    pub lines: Vec<Line<'a>, MAX_LAYOUT_LINES>,
    /// Text remained after the last line that fit.
    pub truncated: bool,
}

/// Box a bounded print may fill: lines start at `(x, y)`, wrap at `max_width`
/// and must end at or above `max_y`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TextBounds {
    pub x: i32,
    pub y: i32,
    pub max_width: u32,
    pub max_y: i32,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BoundedPrint {
    pub lines_drawn: usize,
    pub truncated: bool,
}

/// Number of lines greedy word wrap needs for `text` at `max_width`.
///
/// Text that fits on one line (including empty text) needs exactly one.
pub fn count_lines<M>(metrics: &M, text: &str, max_width: u32, font: Font) -> usize
where
    M: TextMetrics + ?Sized,
{
    if metrics.text_width(text, font) <= max_width {
        return 1;
    }

    let space_width = metrics.text_width(" ", font);
    let mut lines = 1usize;
    let mut current_width = 0u32;

    for word in text.split(' ').filter(|word| !word.is_empty()) {
        let word_width = metrics.text_width(word, font);
        let candidate = if current_width > 0 {
            current_width + space_width + word_width
        } else {
            word_width
        };

        if candidate > max_width && current_width > 0 {
            lines += 1;
            current_width = word_width;
        } else {
            current_width = candidate;
        }
    }

    lines
}

/// Fits `text` into `max_lines` wrapped lines, cutting it and appending
/// [`ELLIPSIS`] when it does not fit as-is.
///
/// The cut point is the longest character prefix that still fits with the
/// ellipsis. When a space sits in the last 30% of that prefix, the cut is
/// pulled back to the space so words stay whole.
pub fn truncate_to_lines<M>(
    metrics: &M,
    text: &str,
    max_width: u32,
    max_lines: usize,
    font: Font,
) -> GlyphString
where
    M: TextMetrics + ?Sized,
{
    let max_lines = max_lines.max(1);
    let mut out = GlyphString::new();

    if fits_in_lines(metrics, text, max_width, max_lines, font) {
        push_bounded(&mut out, text);
        return out;
    }

    let budget = if max_lines == 1 {
        max_width
    } else {
        max_width * MULTI_LINE_SAFE_PERCENT / 100
    };

    let char_total = text.chars().count();
    let mut best_chars = 0usize;
    let mut low = 0usize;
    let mut high = char_total;
    while low <= high {
        let mid = low + (high - low) / 2;
        let candidate = with_ellipsis(&text[..byte_offset(text, mid)]);
        if fits_in_lines(metrics, &candidate, budget, max_lines, font) {
            best_chars = mid;
            low = mid + 1;
        } else if mid == 0 {
            break;
        } else {
            high = mid - 1;
        }
    }

    let cut = byte_offset(text, best_chars);
    let mut end = cut;
    if cut > 0 {
        let search_end = (cut + 1).min(text.len());
        if let Some(space) = text[..search_end].rfind(' ')
            && space * 100 > cut * WORD_PULLBACK_KEEP_PERCENT
        {
            end = space;
        }
    }

    push_bounded(&mut out, text[..end].trim_end_matches(' '));
    push_bounded(&mut out, ELLIPSIS);
    out
}

/// Wraps `text` greedily into at most `max_lines` lines of `max_width`.
pub fn wrap_lines<'a, M>(
    metrics: &M,
    text: &'a str,
    max_width: u32,
    max_lines: usize,
    font: Font,
) -> LayoutResult<'a>
where
    M: TextMetrics + ?Sized,
{
    let max_lines = max_lines.min(MAX_LAYOUT_LINES);
    let mut lines = Vec::new();
    let mut cursor = 0usize;

    while let Some((line, next)) = next_line(metrics, text, cursor, max_width, font) {
        if lines.len() >= max_lines {
            return LayoutResult {
                lines,
                truncated: true,
            };
        }
        let _ = lines.push(line);
        cursor = next;
    }

    LayoutResult {
        lines,
        truncated: false,
    }
}

/// Prints `text` word-wrapped inside `bounds`, one line per font height, and
/// stops before any line whose bottom would pass `bounds.max_y`.
pub fn print_bounded<S>(
    surface: &mut S,
    text: &str,
    bounds: TextBounds,
    font: Font,
    colors: TextColors,
) -> BoundedPrint
where
    S: Surface + ?Sized,
{
    let line_height = surface.line_height(font) as i32;
    let mut report = BoundedPrint::default();
    let mut cursor = 0usize;
    let mut line_y = bounds.y;

    while let Some((line, next)) = next_line(&*surface, text, cursor, bounds.max_width, font) {
        if line_y + line_height > bounds.max_y {
            report.truncated = true;
            break;
        }
        surface.draw_text(bounds.x, line_y, line.text, font, colors);
        report.lines_drawn += 1;
        line_y += line_height;
        cursor = next;
    }

    report
}

/// Joins artist names with ", " and " & " before the last one.
pub fn join_artists<'a, I>(names: I) -> GlyphString
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: ExactSizeIterator,
{
    let names = names.into_iter();
    let count = names.len();
    let mut out = GlyphString::new();

    for (index, name) in names.enumerate() {
        if index > 0 {
            push_bounded(&mut out, if index + 1 == count { " & " } else { ", " });
        }
        push_bounded(&mut out, name);
    }

    out
}

fn fits_in_lines<M>(metrics: &M, text: &str, max_width: u32, max_lines: usize, font: Font) -> bool
where
    M: TextMetrics + ?Sized,
{
    if max_lines == 1 {
        metrics.text_width(text, font) <= max_width
    } else {
        count_lines(metrics, text, max_width, font) <= max_lines
    }
}

fn next_line<'a, M>(
    metrics: &M,
    text: &'a str,
    cursor: usize,
    max_width: u32,
    font: Font,
) -> Option<(Line<'a>, usize)>
where
    M: TextMetrics + ?Sized,
{
    let (start, mut end) = next_word(text, cursor)?;
    let mut width = metrics.text_width(&text[start..end], font);

    while let Some((_, word_end)) = next_word(text, end) {
        let candidate_width = metrics.text_width(&text[start..word_end], font);
        if candidate_width > max_width {
            break;
        }
        end = word_end;
        width = candidate_width;
    }

    Some((
        Line {
            text: &text[start..end],
            width,
        },
        end,
    ))
}

fn next_word(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let start = from + bytes[from..].iter().position(|byte| *byte != b' ')?;
    let end = bytes[start..]
        .iter()
        .position(|byte| *byte == b' ')
        .map_or(bytes.len(), |offset| start + offset);
    Some((start, end))
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| offset)
}

fn with_ellipsis(prefix: &str) -> GlyphString {
    let mut candidate = GlyphString::new();
    push_bounded(&mut candidate, prefix);
    push_bounded(&mut candidate, ELLIPSIS);
    candidate
}

fn push_bounded(out: &mut GlyphString, text: &str) {
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
}
