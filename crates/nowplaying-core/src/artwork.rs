//! Album art: change tracking, the loader seam, per-block pixel post-processing
//! and the rounded-corner mask drawn over the finished image.

use crate::{
    playback::{CurrentlyPlaying, ImageUrl},
    render::{BLACK, Rgb565, Surface, pack565, unpack565},
};

/// Cache location of the downloaded album art blob.
pub const ALBUM_ART_PATH: &str = "/album.jpg";
pub const DEFAULT_SATURATION_BOOST: f32 = 1.0108;
pub const ART_CORNER_RADIUS: u32 = 22;
pub const DEFAULT_ART_SIZE: (u32, u32) = (150, 150);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ArtworkError {
    /// The blob store could not be opened for writing.
    StoreOpen,
    /// Download failed or was cut short.
    Download,
    /// The cached blob did not decode.
    Decode,
}

impl ArtworkError {
    /// Status code as reported to logs.
    pub const fn status_code(&self) -> i32 {
        match self {
            Self::StoreOpen => -1,
            Self::Download => -2,
            Self::Decode => 0,
        }
    }
}

/// One decoded block of the album art, already in panel coordinates.
pub struct ArtBlock<'a> {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a mut [Rgb565],
}

pub trait ArtworkLoader {
    /// Downloads `url` into the blob at [`ALBUM_ART_PATH`], replacing the
    /// previous art, then decodes it at half scale with its top-left corner at
    /// `origin`, handing every decoded block to `sink`.
    ///
    /// The sink returns `false` to stop decoding early.
    fn load(
        &mut self,
        url: &str,
        origin: (i32, i32),
        sink: &mut dyn FnMut(ArtBlock<'_>) -> bool,
    ) -> Result<(), ArtworkError>;
}

/// Multiplies a pixel's saturation by `boost`, keeping its luminance.
pub fn boost_saturation(pixel: Rgb565, boost: f32) -> Rgb565 {
    let (r5, g6, b5) = unpack565(pixel);
    let r = r5 as f32 * 255.0 / 31.0;
    let g = g6 as f32 * 255.0 / 63.0;
    let b = b5 as f32 * 255.0 / 31.0;

    let gray = 0.299 * r + 0.587 * g + 0.114 * b;
    let saturate = |channel: f32| (gray + (channel - gray) * boost).clamp(0.0, 255.0);

    pack565(
        (saturate(r) * 31.0 / 255.0 + 0.5) as u8,
        (saturate(g) * 63.0 / 255.0 + 0.5) as u8,
        (saturate(b) * 31.0 / 255.0 + 0.5) as u8,
    )
}

/// Post-processes a decoded block and draws it.
///
/// Returns `false` once blocks start below the panel, which ends decoding.
pub fn blit_block<S>(surface: &mut S, block: ArtBlock<'_>, saturation_boost: f32) -> bool
where
    S: Surface + ?Sized,
{
    let (_, panel_height) = surface.size();
    if block.y >= panel_height as i32 {
        return false;
    }

    if saturation_boost != 1.0 {
        for pixel in block.pixels.iter_mut() {
            *pixel = boost_saturation(*pixel, saturation_boost);
        }
    }

    surface.draw_image(block.x, block.y, block.width, block.height, block.pixels);
    true
}

/// Per-row inset of a rounded corner, top row first.
pub fn rounded_corner_insets(radius: u32) -> impl Iterator<Item = u32> {
    (0..radius).map(move |row| {
        let dy = radius - row - 1;
        radius - round_sqrt(radius * radius - dy * dy)
    })
}

/// Paints the area outside a quarter circle in each corner of the box black.
pub fn mask_rounded_corners<S>(
    surface: &mut S,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    radius: u32,
) where
    S: Surface + ?Sized,
{
    let radius = radius.min(width / 2).min(height / 2);
    let right = x + width as i32;
    let bottom = y + height as i32 - 1;

    for (row, inset) in rounded_corner_insets(radius).enumerate() {
        if inset == 0 {
            continue;
        }
        let row = row as i32;
        surface.hline(x, y + row, inset, BLACK);
        surface.hline(right - inset as i32, y + row, inset, BLACK);
        surface.hline(x, bottom - row, inset, BLACK);
        surface.hline(right - inset as i32, bottom - row, inset, BLACK);
    }
}

fn round_sqrt(value: u32) -> u32 {
    let root = value.isqrt();
    if value - root * root > root { root + 1 } else { root }
}

/// Tracks which album image is on screen so art is only fetched on change.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlbumArtTracker {
    url: ImageUrl,
    displayed: bool,
    size: (u32, u32),
}

impl Default for AlbumArtTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AlbumArtTracker {
    pub const fn new() -> Self {
        Self {
            url: ImageUrl::new(),
            displayed: false,
            size: DEFAULT_ART_SIZE,
        }
    }

    /// Picks the medium image of `playing`; returns whether it needs drawing.
    pub fn process(&mut self, playing: &CurrentlyPlaying) -> bool {
        let Some(image) = playing.medium_image() else {
            return false;
        };

        if self.displayed && self.url == image.url {
            return false;
        }

        self.displayed = false;
        self.url = image.url.clone();
        self.size = (image.width as u32 / 2, image.height as u32 / 2);
        true
    }

    pub fn mark_displayed(&mut self) {
        self.displayed = true;
    }

    pub const fn is_displayed(&self) -> bool {
        self.displayed
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// On-panel size of the art at half scale.
    pub const fn size(&self) -> (u32, u32) {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        playback::AlbumImage,
        render::{WHITE, color565},
        test_support::{DrawOp, RecordingSurface},
    };

    fn playing_with_art(url: &str) -> CurrentlyPlaying {
        let mut playing = CurrentlyPlaying::default();
        for (size, suffix) in [(640u16, "l"), (300, "m"), (64, "s")] {
            let mut image_url = ImageUrl::try_from(url).unwrap();
            image_url.push_str(suffix).unwrap();
            playing
                .album_images
                .push(AlbumImage {
                    url: image_url,
                    width: size,
                    height: size,
                })
                .unwrap();
        }
        playing
    }

    #[test]
    fn gray_pixels_are_unchanged_by_saturation() {
        assert_eq!(boost_saturation(BLACK, DEFAULT_SATURATION_BOOST), BLACK);
        assert_eq!(boost_saturation(WHITE, DEFAULT_SATURATION_BOOST), WHITE);
        let gray = color565(128, 128, 128);
        assert_eq!(boost_saturation(gray, 1.5), gray);
    }

    #[test]
    fn boost_pushes_channels_apart() {
        let pixel = color565(200, 100, 100);
        let (r0, _, b0) = unpack565(pixel);
        let (r1, _, b1) = unpack565(boost_saturation(pixel, 1.5));
        assert!(r1 >= r0);
        assert!(b1 <= b0);
        assert!(r1 - b1 > r0 - b0);
    }

    #[test]
    fn corner_insets_shrink_toward_the_middle() {
        let insets: Vec<u32> = rounded_corner_insets(ART_CORNER_RADIUS).collect();
        assert_eq!(insets.len(), 22);
        assert_eq!(insets[0], 15);
        assert_eq!(insets[21], 0);
        assert!(insets.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn mask_paints_all_four_corners() {
        let mut surface = RecordingSurface::new(320, 240);
        mask_rounded_corners(&mut surface, 20, 20, 150, 150, 4);

        // Radius 4 insets: 1, 1, 0, 0.
        assert_eq!(surface.ops.len(), 8);
        assert_eq!(
            surface.ops[0],
            DrawOp::HLine {
                x: 20,
                y: 20,
                width: 1,
                color: BLACK
            }
        );
        assert_eq!(
            surface.ops[3],
            DrawOp::HLine {
                x: 169,
                y: 169,
                width: 1,
                color: BLACK
            }
        );
    }

    #[test]
    fn blocks_below_the_panel_stop_decoding() {
        let mut surface = RecordingSurface::new(320, 240);
        let mut pixels = [0u16; 4];

        let block = ArtBlock {
            x: 20,
            y: 20,
            width: 2,
            height: 2,
            pixels: &mut pixels,
        };
        assert!(blit_block(&mut surface, block, DEFAULT_SATURATION_BOOST));

        let block = ArtBlock {
            x: 20,
            y: 240,
            width: 2,
            height: 2,
            pixels: &mut pixels,
        };
        assert!(!blit_block(&mut surface, block, DEFAULT_SATURATION_BOOST));
        assert_eq!(surface.images(), 1);
    }

    #[test]
    fn tracker_requests_art_only_on_change() {
        let mut tracker = AlbumArtTracker::new();
        let first = playing_with_art("https://i.example/a");

        assert!(tracker.process(&first));
        assert_eq!(tracker.url(), "https://i.example/am");
        assert_eq!(tracker.size(), (150, 150));

        // Not yet displayed: keep asking.
        assert!(tracker.process(&first));
        tracker.mark_displayed();
        assert!(!tracker.process(&first));

        assert!(tracker.process(&playing_with_art("https://i.example/b")));
        assert!(!tracker.is_displayed());
    }

    #[test]
    fn tracker_ignores_tracks_without_art() {
        let mut tracker = AlbumArtTracker::new();
        assert!(!tracker.process(&CurrentlyPlaying::default()));
    }
}
