//! Encoder position to playback volume, with burst acceleration.
//!
//! Position deltas inside a short window accumulate into a click count;
//! beyond a threshold every extra click raises the step multiplier up to a
//! cap. The level is tracked in hundredths of a percent across ticks, so a
//! 1.2x or 1.4x step taken one detent at a time still adds up, and only the
//! whole-percent part is reported.

use crate::input::SharedInput;

pub const MAX_VOLUME: u8 = 100;

const LEVEL_PER_PERCENT: i64 = 100;
const MAX_LEVEL: i64 = MAX_VOLUME as i64 * LEVEL_PER_PERCENT;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VolumeConfig {
    /// Percent per encoder count at rest, in tenths.
    base_step_tenths: i64,
    acceleration_threshold: u32,
    window_ms: u64,
    max_extra_clicks: u32,
    multiplier_step_tenths: i64,
    max_multiplier_tenths: i64,
    initial_volume: u8,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            base_step_tenths: 10,
            acceleration_threshold: 3,
            window_ms: 200,
            max_extra_clicks: 10,
            multiplier_step_tenths: 2,
            max_multiplier_tenths: 30,
            initial_volume: 50,
        }
    }
}

impl VolumeConfig {
    pub const fn with_base_step_tenths(mut self, base_step_tenths: i64) -> Self {
        self.base_step_tenths = base_step_tenths;
        self
    }

    pub const fn with_initial_volume(mut self, initial_volume: u8) -> Self {
        self.initial_volume = initial_volume;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VolumeStep {
    /// New volume, when it changed.
    pub volume: Option<u8>,
    /// Where the encoder position should be moved, after a clamp.
    pub snap_position: Option<i32>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VolumeMapper {
    config: VolumeConfig,
    /// Hundredths of a percent, `0..=MAX_LEVEL`.
    level: i64,
    last_position: i32,
    window_start_ms: Option<u64>,
    window_clicks: u32,
}

impl VolumeMapper {
    pub fn new(config: VolumeConfig) -> Self {
        Self {
            config,
            level: config.initial_volume.min(MAX_VOLUME) as i64 * LEVEL_PER_PERCENT,
            last_position: 0,
            window_start_ms: None,
            window_clicks: 0,
        }
    }

    pub const fn volume(&self) -> u8 {
        (self.level / LEVEL_PER_PERCENT) as u8
    }

    /// Drains a pending encoder move from `input` and applies it. A clamp
    /// snaps the shared position inside the same critical section as the
    /// read, so no detent lands in between.
    pub fn on_encoder_tick(&mut self, input: &SharedInput, now_ms: u64) -> Option<u8> {
        input
            .drain_encoder(|position| {
                let step = self.step(position, now_ms);
                (step.volume, step.snap_position)
            })
            .flatten()
    }

    pub fn step(&mut self, position: i32, now_ms: u64) -> VolumeStep {
        let delta = position as i64 - self.last_position as i64;
        self.last_position = position;

        let clicks = delta.unsigned_abs().min(u32::MAX as u64) as u32;
        let window_open = self
            .window_start_ms
            .is_some_and(|start| now_ms.saturating_sub(start) <= self.config.window_ms);
        if window_open {
            self.window_clicks = self.window_clicks.saturating_add(clicks);
        } else {
            self.window_clicks = clicks;
            self.window_start_ms = Some(now_ms);
        }

        let change = delta
            .saturating_mul(self.config.base_step_tenths)
            .saturating_mul(self.multiplier_tenths());
        let target = self.level.saturating_add(change);
        let clamped = target.clamp(0, MAX_LEVEL);

        let previous = self.volume();
        self.level = clamped;

        let mut step = VolumeStep {
            volume: None,
            snap_position: None,
        };

        if clamped != target {
            self.window_clicks = 0;
            self.last_position = 0;
            step.snap_position = Some(0);
        }

        let volume = self.volume();
        if volume != previous {
            step.volume = Some(volume);
        }

        step
    }

    fn multiplier_tenths(&self) -> i64 {
        let threshold = self.config.acceleration_threshold;
        if self.window_clicks <= threshold {
            return 10;
        }

        let extra = (self.window_clicks - threshold).min(self.config.max_extra_clicks) as i64;
        (10 + extra * self.config.multiplier_step_tenths).min(self.config.max_multiplier_tenths)
    }
}
