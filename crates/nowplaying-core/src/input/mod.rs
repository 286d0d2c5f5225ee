//! Rotary encoder and push-button decoding.
//!
//! Pin edges are fed in from interrupt context through [`SharedInput`]; the
//! main loop drains encoder position changes and classified clicks from it.

mod button;
mod quadrature;
mod shared;

pub use button::{ButtonClassifier, ClickAction, ClickDispatcher};
pub use quadrature::{EdgeOutcome, QuadratureDecoder, ab_from_levels};
pub use shared::{InputSnapshot, SharedInput};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EncoderConfig {
    encoder_debounce_ms: u64,
    button_debounce_ms: u64,
    double_click_ms: u64,
    direction_inverted: bool,
    button_active_low: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderConfig {
    pub const fn new() -> Self {
        Self {
            encoder_debounce_ms: 2,
            button_debounce_ms: 50,
            double_click_ms: 400,
            direction_inverted: false,
            button_active_low: true,
        }
    }

    pub const fn with_encoder_debounce_ms(mut self, encoder_debounce_ms: u64) -> Self {
        self.encoder_debounce_ms = encoder_debounce_ms;
        self
    }

    pub const fn with_button_debounce_ms(mut self, button_debounce_ms: u64) -> Self {
        self.button_debounce_ms = button_debounce_ms;
        self
    }

    pub const fn with_double_click_ms(mut self, double_click_ms: u64) -> Self {
        self.double_click_ms = double_click_ms;
        self
    }

    pub const fn with_direction_inverted(mut self, direction_inverted: bool) -> Self {
        self.direction_inverted = direction_inverted;
        self
    }

    pub const fn with_button_active_low(mut self, button_active_low: bool) -> Self {
        self.button_active_low = button_active_low;
        self
    }

    pub const fn double_click_ms(&self) -> u64 {
        self.double_click_ms
    }

    /// Maps the switch pin level to a pressed state.
    pub const fn button_pressed(&self, sw_high: bool) -> bool {
        if self.button_active_low { !sw_high } else { sw_high }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_level_follows_polarity() {
        let active_low = EncoderConfig::default();
        assert!(active_low.button_pressed(false));
        assert!(!active_low.button_pressed(true));

        let active_high = EncoderConfig::default().with_button_active_low(false);
        assert!(active_high.button_pressed(true));
    }
}
