impl<'a, PB, AL> NowPlayingApp<'a, PB, AL>
where
    PB: PlaybackSource,
    AL: ArtworkLoader,
{
    fn process_inputs(&mut self, now_ms: u64) {
        if let Some(volume) = self.volume.on_encoder_tick(self.input, now_ms) {
            self.apply_volume(volume);
        }

        match self.input.poll_click(&mut self.clicks, now_ms) {
            Some(ClickAction::Single) => self.toggle_playback(),
            Some(ClickAction::Double) => self.toggle_saved_track(),
            None => {}
        }
    }

    fn apply_volume(&mut self, volume: u8) {
        let gate = self.poll_gate;
        let _pause = gate.pause();

        match self.playback.set_volume(volume) {
            Ok(()) => debug!("input: volume={}", volume),
            Err(err) => warn!(
                "input: set volume failed volume={} status={} err={:?}",
                volume,
                err.status_code(),
                err
            ),
        }
    }

    fn toggle_playback(&mut self) {
        let gate = self.poll_gate;
        let _pause = gate.pause();

        let (action, result) = if self.is_playing {
            ("pause", self.playback.pause())
        } else {
            ("play", self.playback.play())
        };

        match result {
            Ok(()) => {
                self.is_playing = !self.is_playing;
                if !self.is_playing {
                    self.clock = None;
                }
                info!("input: {} ok", action);
            }
            Err(err) => warn!(
                "input: {} failed status={} err={:?}",
                action,
                err.status_code(),
                err
            ),
        }
    }

    fn toggle_saved_track(&mut self) {
        let track_id = track_id_from_uri(&self.last_track_uri);
        if track_id.is_empty() {
            warn!("input: no current track to save");
            return;
        }

        let gate = self.poll_gate;
        let _pause = gate.pause();

        let unlike = self.config.allow_unlike && self.track_liked;
        let result = if unlike {
            self.playback.remove_track(track_id)
        } else {
            self.playback.save_track(track_id)
        };

        match result {
            Ok(()) => {
                self.track_liked = !unlike;
                info!(
                    "input: track {} id={}",
                    if unlike { "removed" } else { "saved" },
                    track_id
                );
            }
            Err(err) => warn!(
                "input: {} failed status={} err={:?}",
                if unlike { "remove" } else { "save" },
                err.status_code(),
                err
            ),
        }
    }
}
