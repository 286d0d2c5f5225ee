//! Now-playing state machine: polls the player, extrapolates progress between
//! polls, refreshes text and album art behind a backlight fade when the track
//! changes, and turns encoder and button input into playback commands.

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::{
    artwork::{
        ART_CORNER_RADIUS, AlbumArtTracker, ArtworkError, ArtworkLoader, DEFAULT_SATURATION_BOOST,
        blit_block, mask_rounded_corners,
    },
    input::{ClickAction, ClickDispatcher, EncoderConfig, SharedInput},
    playback::{CurrentlyPlaying, PlaybackSource, PollGate, TrackUri, track_id_from_uri},
    progress::{ProgressBar, ProgressBarState, ProgressBarStyle},
    render::{BLACK, DEFAULT_BRIGHTNESS, Font, Surface, TextColors, WHITE, fade_backlight},
    text_policy::{TextBounds, count_lines, print_bounded, transliterate, truncate_to_lines},
    volume::{VolumeConfig, VolumeMapper},
};

const TITLE_MAX_LINES: usize = 2;
const DETAIL_MAX_LINES: usize = 2;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TickResult {
    NoRender,
    Rendered,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NowPlayingConfig {
    pub request_interval_ms: u64,
    pub progress_interval_ms: u64,
    /// Double click removes an already-saved track instead of saving it again.
    pub allow_unlike: bool,
    pub brightness: u8,
    pub fade_ms: u32,
    pub saturation_boost: f32,
    pub encoder: EncoderConfig,
    pub volume: VolumeConfig,
}

impl Default for NowPlayingConfig {
    fn default() -> Self {
        Self {
            request_interval_ms: 5_000,
            progress_interval_ms: 500,
            allow_unlike: false,
            brightness: DEFAULT_BRIGHTNESS,
            fade_ms: 600,
            saturation_boost: DEFAULT_SATURATION_BOOST,
            encoder: EncoderConfig::default(),
            volume: VolumeConfig::default(),
        }
    }
}

/// Placement of the art block and the text column beside it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NowPlayingLayout {
    pub image_x: i32,
    pub image_y: i32,
    /// Gap between the art and the text column.
    pub text_gap: u32,
    pub right_margin: u32,
    /// How far above the art's vertical middle the title starts.
    pub text_raise: i32,
    pub block_spacing: i32,
}

impl Default for NowPlayingLayout {
    fn default() -> Self {
        Self {
            image_x: 20,
            image_y: 20,
            text_gap: 10,
            right_margin: 10,
            text_raise: 25,
            block_spacing: 8,
        }
    }
}

/// Playback position anchor used to extrapolate progress between polls.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct PlaybackClock {
    anchor_ms: u64,
    anchor_progress_ms: u64,
    duration_ms: u64,
}

impl PlaybackClock {
    fn progress_at(&self, now_ms: u64) -> u64 {
        self.anchor_progress_ms
            .saturating_add(now_ms.saturating_sub(self.anchor_ms))
            .min(self.duration_ms)
    }
}

pub struct NowPlayingApp<'a, PB, AL>
where
    PB: PlaybackSource,
    AL: ArtworkLoader,
{
    playback: PB,
    artwork: AL,
    input: &'a SharedInput,
    poll_gate: &'a PollGate,
    config: NowPlayingConfig,
    layout: NowPlayingLayout,
    progress_bar: ProgressBar,
    progress_state: ProgressBarState,
    volume: VolumeMapper,
    clicks: ClickDispatcher,
    art: AlbumArtTracker,
    current: Option<CurrentlyPlaying>,
    last_track_uri: TrackUri,
    is_playing: bool,
    track_liked: bool,
    clock: Option<PlaybackClock>,
    next_request_ms: Option<u64>,
    next_progress_ms: u64,
    text_dirty: bool,
    art_changed: bool,
    force_refresh: bool,
    online: bool,
}

include!("view.rs");
include!("input.rs");
include!("runtime.rs");
