//! Currently-playing model, the playback service seam, and the poll gate that
//! suspends background polling while a command is in flight.

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::{String, Vec};

use crate::text_policy::{GlyphString, join_artists};

pub const TRACK_NAME_BYTES: usize = 128;
pub const ARTIST_NAME_BYTES: usize = 64;
pub const ALBUM_NAME_BYTES: usize = 128;
pub const TRACK_URI_BYTES: usize = 64;
pub const IMAGE_URL_BYTES: usize = 128;
pub const MAX_ARTISTS: usize = 4;
pub const MAX_ALBUM_IMAGES: usize = 3;

pub type TrackUri = String<TRACK_URI_BYTES>;
pub type ImageUrl = String<IMAGE_URL_BYTES>;

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AlbumImage {
    pub url: ImageUrl,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CurrentlyPlaying {
    pub track_name: String<TRACK_NAME_BYTES>,
    pub artists: Vec<String<ARTIST_NAME_BYTES>, MAX_ARTISTS>,
    pub album_name: String<ALBUM_NAME_BYTES>,
    pub progress_ms: u64,
    pub duration_ms: u64,
    pub is_playing: bool,
    pub track_uri: TrackUri,
    /// Largest first, as the service lists them.
    pub album_images: Vec<AlbumImage, MAX_ALBUM_IMAGES>,
}

impl CurrentlyPlaying {
    pub fn artist_line(&self) -> GlyphString {
        join_artists(self.artists.iter().map(|artist| artist.as_str()))
    }

    /// The second-smallest listed image, or the only one.
    pub fn medium_image(&self) -> Option<&AlbumImage> {
        let index = self.album_images.len().saturating_sub(2);
        self.album_images.get(index)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PlaybackError {
    /// No response within the request deadline.
    Timeout,
    /// Service answered with a non-success HTTP status.
    Status(u16),
    Transport,
    /// No access token is available yet.
    NoToken,
}

impl PlaybackError {
    /// Status code as reported to logs: the HTTP status, or -1 for local failures.
    pub const fn status_code(&self) -> i32 {
        match self {
            Self::Status(status) => *status as i32,
            Self::Timeout | Self::Transport | Self::NoToken => -1,
        }
    }
}

/// Remote player the device controls.
///
/// Calls block until the service answers or the request deadline passes.
pub trait PlaybackSource {
    /// `Ok(None)` when nothing is playing.
    fn currently_playing(&mut self) -> Result<Option<CurrentlyPlaying>, PlaybackError>;

    fn set_volume(&mut self, percent: u8) -> Result<(), PlaybackError>;

    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self) -> Result<(), PlaybackError>;

    fn save_track(&mut self, track_id: &str) -> Result<(), PlaybackError>;

    fn remove_track(&mut self, track_id: &str) -> Result<(), PlaybackError>;
}

/// The id segment of a `scheme:type:id` track URI, or `""` without a separator.
pub fn track_id_from_uri(uri: &str) -> &str {
    uri.rfind(':').map_or("", |index| &uri[index + 1..])
}

/// Shared flag that holds off background currently-playing polls.
pub struct PollGate {
    paused: AtomicBool,
}

impl Default for PollGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PollGate {
    pub const fn new() -> Self {
        Self {
            paused: AtomicBool::new(false),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pauses polling until the returned guard drops.
    pub fn pause(&self) -> PollPause<'_> {
        self.paused.store(true, Ordering::Release);
        PollPause { gate: self }
    }
}

#[must_use = "polling resumes as soon as the guard is dropped"]
pub struct PollPause<'a> {
    gate: &'a PollGate,
}

impl Drop for PollPause<'_> {
    fn drop(&mut self) {
        self.gate.paused.store(false, Ordering::Release);
    }
}
