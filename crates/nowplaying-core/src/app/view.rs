impl<'a, PB, AL> NowPlayingApp<'a, PB, AL>
where
    PB: PlaybackSource,
    AL: ArtworkLoader,
{
    pub fn new(
        playback: PB,
        artwork: AL,
        input: &'a SharedInput,
        poll_gate: &'a PollGate,
        config: NowPlayingConfig,
        panel_size: (u32, u32),
    ) -> Self {
        let (panel_width, panel_height) = panel_size;

        Self {
            playback,
            artwork,
            input,
            poll_gate,
            config,
            layout: NowPlayingLayout::default(),
            progress_bar: ProgressBar::new(panel_width, panel_height, ProgressBarStyle::default()),
            progress_state: ProgressBarState::new(),
            volume: VolumeMapper::new(config.volume),
            clicks: ClickDispatcher::new(config.encoder),
            art: AlbumArtTracker::new(),
            current: None,
            last_track_uri: TrackUri::new(),
            is_playing: false,
            track_liked: false,
            clock: None,
            next_request_ms: None,
            next_progress_ms: 0,
            text_dirty: false,
            art_changed: false,
            force_refresh: false,
            online: true,
        }
    }

    pub fn with_layout(mut self, layout: NowPlayingLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Blanks the panel and lights the backlight at the configured level.
    pub fn begin<S>(&mut self, surface: &mut S)
    where
        S: Surface + ?Sized,
    {
        let (width, height) = surface.size();
        surface.fill_screen(BLACK);
        surface.set_backlight(self.config.brightness);
        self.progress_state.reset();
        info!(
            "now-playing: display ready panel={}x{} brightness={}",
            width, height, self.config.brightness
        );
    }

    pub const fn config(&self) -> &NowPlayingConfig {
        &self.config
    }

    pub const fn volume(&self) -> u8 {
        self.volume.volume()
    }

    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Whether the current track was saved from this device since it started.
    pub const fn track_liked(&self) -> bool {
        self.track_liked
    }

    pub fn current(&self) -> Option<&CurrentlyPlaying> {
        self.current.as_ref()
    }

    pub fn playback(&self) -> &PB {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PB {
        &mut self.playback
    }

    fn print_now_playing<S>(&self, surface: &mut S, playing: &CurrentlyPlaying)
    where
        S: Surface + ?Sized,
    {
        let layout = &self.layout;
        let (panel_width, _) = surface.size();
        let (image_width, image_height) = self.art.size();
        let text_x = layout.image_x + image_width as i32 + layout.text_gap as i32;
        let text_width = (panel_width as i32 - text_x - layout.right_margin as i32).max(0) as u32;
        let text_bottom = layout.image_y + image_height as i32;
        let colors = TextColors::new(WHITE, BLACK);

        surface.fill_rect(
            layout.image_x + image_width as i32,
            layout.image_y,
            layout.text_gap,
            image_height,
            BLACK,
        );
        surface.fill_rect(
            text_x,
            layout.image_y,
            (panel_width as i32 - text_x).max(0) as u32,
            image_height,
            BLACK,
        );

        let title_y = layout.image_y + image_height as i32 / 2 - layout.text_raise;
        let bounds = TextBounds {
            x: text_x,
            y: title_y,
            max_width: text_width,
            max_y: text_bottom,
        };

        let title = truncate_to_lines(
            &*surface,
            &transliterate(&playing.track_name),
            text_width,
            TITLE_MAX_LINES,
            Font::Title,
        );
        let title_lines = count_lines(&*surface, &title, text_width, Font::Title).min(TITLE_MAX_LINES);
        print_bounded(surface, &title, bounds, Font::Title, colors);

        let detail_height = surface.line_height(Font::Regular) as i32;
        let mut y = title_y
            + title_lines as i32 * surface.line_height(Font::Title) as i32
            + layout.block_spacing;

        let artists = playing.artist_line();
        for detail in [artists.as_str(), playing.album_name.as_str()] {
            if y + detail_height >= text_bottom {
                debug!("now-playing: text column full at y={}", y);
                break;
            }

            let detail = truncate_to_lines(
                &*surface,
                &transliterate(detail),
                text_width,
                DETAIL_MAX_LINES,
                Font::Regular,
            );
            let lines = count_lines(&*surface, &detail, text_width, Font::Regular).min(DETAIL_MAX_LINES);
            print_bounded(surface, &detail, TextBounds { y, ..bounds }, Font::Regular, colors);
            y += lines as i32 * detail_height + layout.block_spacing;
        }
    }

    /// Clears the art block together with the gap beside it.
    fn clear_image<S>(&self, surface: &mut S)
    where
        S: Surface + ?Sized,
    {
        let (width, height) = self.art.size();
        surface.fill_rect(
            self.layout.image_x,
            self.layout.image_y,
            width + self.layout.text_gap,
            height,
            BLACK,
        );
    }

    fn draw_album_art<S>(&mut self, surface: &mut S) -> Result<(), ArtworkError>
    where
        S: Surface + ?Sized,
    {
        let origin = (self.layout.image_x, self.layout.image_y);
        let boost = self.config.saturation_boost;
        let (width, height) = self.art.size();

        self.artwork.load(self.art.url(), origin, &mut |block| {
            blit_block(&mut *surface, block, boost)
        })?;

        mask_rounded_corners(surface, origin.0, origin.1, width, height, ART_CORNER_RADIUS);
        surface.fill_rect(
            origin.0 + width as i32,
            origin.1,
            self.layout.text_gap,
            height,
            BLACK,
        );
        Ok(())
    }
}
