impl<'a, PB, AL> NowPlayingApp<'a, PB, AL>
where
    PB: PlaybackSource,
    AL: ArtworkLoader,
{
    /// Runs one pass of the UI loop: input first, then a currently-playing
    /// poll when one is due, then the extrapolated progress bar.
    pub fn tick<S, D>(&mut self, now_ms: u64, surface: &mut S, delay: &mut D) -> TickResult
    where
        S: Surface + ?Sized,
        D: DelayNs,
    {
        self.process_inputs(now_ms);

        let mut rendered = false;
        if self.request_due(now_ms) {
            rendered |= self.poll_currently_playing(now_ms, surface, delay);
        }
        rendered |= self.update_progress(now_ms, surface);

        if rendered {
            TickResult::Rendered
        } else {
            TickResult::NoRender
        }
    }

    /// Polls on the next tick regardless of the schedule and redraws text and art.
    pub fn request_refresh(&mut self) {
        self.force_refresh = true;
    }

    pub fn set_online(&mut self, online: bool) {
        if self.online != online {
            info!("now-playing: online={}", online);
            self.online = online;
        }
    }

    fn request_due(&self, now_ms: u64) -> bool {
        if !self.online {
            return false;
        }
        if self.force_refresh {
            return true;
        }

        !self.poll_gate.is_paused() && self.next_request_ms.is_none_or(|due| now_ms >= due)
    }

    fn poll_currently_playing<S, D>(&mut self, now_ms: u64, surface: &mut S, delay: &mut D) -> bool
    where
        S: Surface + ?Sized,
        D: DelayNs,
    {
        let forced = core::mem::take(&mut self.force_refresh);
        if forced {
            info!("now-playing: forced refresh");
        }
        self.next_request_ms = Some(now_ms + self.config.request_interval_ms);

        match self.playback.currently_playing() {
            Ok(Some(playing)) => {
                let mut rendered = self.handle_currently_playing(playing, now_ms, surface);
                if self.current.is_some() && (self.art_changed || self.text_dirty || forced) {
                    self.refresh_screen(surface, delay, forced);
                    rendered = true;
                }
                rendered
            }
            Ok(None) => {
                self.clock = None;
                debug!("now-playing: nothing playing");
                false
            }
            Err(err) => {
                warn!(
                    "now-playing: poll failed status={} err={:?}",
                    err.status_code(),
                    err
                );
                false
            }
        }
    }

    fn handle_currently_playing<S>(
        &mut self,
        playing: CurrentlyPlaying,
        now_ms: u64,
        surface: &mut S,
    ) -> bool
    where
        S: Surface + ?Sized,
    {
        if playing.track_uri.is_empty() {
            debug!("now-playing: response without a track uri");
            return false;
        }

        if playing.track_uri != self.last_track_uri {
            info!("now-playing: track changed uri={}", playing.track_uri);
            self.last_track_uri = playing.track_uri.clone();
            self.track_liked = false;
            self.text_dirty = true;
        }

        self.is_playing = playing.is_playing;
        self.art_changed = self.art.process(&playing);
        self.clock = playing.is_playing.then_some(PlaybackClock {
            anchor_ms: now_ms,
            anchor_progress_ms: playing.progress_ms,
            duration_ms: playing.duration_ms,
        });

        let redraw = self.progress_bar.render(
            &mut self.progress_state,
            surface,
            playing.progress_ms,
            playing.duration_ms,
        );
        self.current = Some(playing);
        redraw.any()
    }

    /// Redraws text and art behind a backlight fade.
    fn refresh_screen<S, D>(&mut self, surface: &mut S, delay: &mut D, forced: bool)
    where
        S: Surface + ?Sized,
        D: DelayNs,
    {
        let Some(playing) = self.current.take() else {
            return;
        };

        fade_backlight(surface, delay, 0, self.config.fade_ms);
        self.progress_state.reset();

        if self.text_dirty || forced {
            self.print_now_playing(surface, &playing);
            self.text_dirty = false;
        }

        if (self.art_changed || forced) && !self.art.url().is_empty() {
            self.clear_image(surface);
            if let Err(err) = self.draw_album_art(surface) {
                warn!(
                    "now-playing: album art failed status={} err={:?}",
                    err.status_code(),
                    err
                );
                self.clear_image(surface);
            }
            self.art.mark_displayed();
            self.art_changed = false;
        }

        self.progress_bar.render(
            &mut self.progress_state,
            surface,
            playing.progress_ms,
            playing.duration_ms,
        );
        fade_backlight(surface, delay, self.config.brightness, self.config.fade_ms);
        self.current = Some(playing);
    }

    fn update_progress<S>(&mut self, now_ms: u64, surface: &mut S) -> bool
    where
        S: Surface + ?Sized,
    {
        let Some(clock) = self.clock else {
            return false;
        };
        if now_ms < self.next_progress_ms {
            return false;
        }

        self.next_progress_ms = now_ms + self.config.progress_interval_ms;
        self.progress_bar
            .render(
                &mut self.progress_state,
                surface,
                clock.progress_at(now_ms),
                clock.duration_ms,
            )
            .any()
    }
}
