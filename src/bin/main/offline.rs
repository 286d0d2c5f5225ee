use nowplaying_core::{
    artwork::{ArtBlock, ArtworkError, ArtworkLoader},
    playback::{CurrentlyPlaying, PlaybackError, PlaybackSource},
};

/// Player stand-in used until a Web API transport is plugged in: nothing is
/// ever playing and every command fails as a transport error.
#[derive(Debug, Default)]
pub(super) struct OfflinePlayback;

impl PlaybackSource for OfflinePlayback {
    fn currently_playing(&mut self) -> Result<Option<CurrentlyPlaying>, PlaybackError> {
        Ok(None)
    }

    fn set_volume(&mut self, _percent: u8) -> Result<(), PlaybackError> {
        Err(PlaybackError::Transport)
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        Err(PlaybackError::Transport)
    }

    fn pause(&mut self) -> Result<(), PlaybackError> {
        Err(PlaybackError::Transport)
    }

    fn save_track(&mut self, _track_id: &str) -> Result<(), PlaybackError> {
        Err(PlaybackError::Transport)
    }

    fn remove_track(&mut self, _track_id: &str) -> Result<(), PlaybackError> {
        Err(PlaybackError::Transport)
    }
}

#[derive(Debug, Default)]
pub(super) struct OfflineArtwork;

impl ArtworkLoader for OfflineArtwork {
    fn load(
        &mut self,
        _url: &str,
        _origin: (i32, i32),
        _sink: &mut dyn FnMut(ArtBlock<'_>) -> bool,
    ) -> Result<(), ArtworkError> {
        Err(ArtworkError::Download)
    }
}
