use super::EncoderConfig;

// Quadrature transition table for previous/current (CLK, DT) states.
// Index: (prev << 2) | curr. Clockwise runs 00 -> 01 -> 11 -> 10 -> 00.
const QUADRATURE_TRANSITIONS: [i8; 16] = [0, 1, -1, 0, -1, 0, 0, 1, 1, 0, 0, -1, 0, -1, 1, 0];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EdgeOutcome {
    /// Arrived inside the debounce window after the last accepted change.
    Debounced,
    /// Pin levels match the stored state.
    Unchanged,
    /// Valid transition; the signed step was applied to the position.
    Step(i8),
    /// Skipped or bouncing state; stored without moving the position.
    Resync,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QuadratureDecoder {
    state: u8,
    position: i32,
    last_change_ms: Option<u64>,
    debounce_ms: u64,
    direction_inverted: bool,
}

impl QuadratureDecoder {
    pub const fn new(initial_state: u8, config: EncoderConfig) -> Self {
        Self {
            state: initial_state & 0b11,
            position: 0,
            last_change_ms: None,
            debounce_ms: config.encoder_debounce_ms,
            direction_inverted: config.direction_inverted,
        }
    }

    pub fn on_edge(&mut self, clk_high: bool, dt_high: bool, now_ms: u64) -> EdgeOutcome {
        if let Some(last) = self.last_change_ms
            && now_ms.saturating_sub(last) < self.debounce_ms
        {
            return EdgeOutcome::Debounced;
        }

        let current = ab_from_levels(clk_high, dt_high);
        if current == self.state {
            return EdgeOutcome::Unchanged;
        }

        let step = QUADRATURE_TRANSITIONS[((self.state << 2) | current) as usize];
        self.state = current;
        self.last_change_ms = Some(now_ms);

        if step == 0 {
            return EdgeOutcome::Resync;
        }

        let step = if self.direction_inverted { -step } else { step };
        self.position = self.position.wrapping_add(step as i32);
        EdgeOutcome::Step(step)
    }

    /// Re-reads the pins without counting, e.g. right after boot.
    pub fn resync(&mut self, clk_high: bool, dt_high: bool) {
        self.state = ab_from_levels(clk_high, dt_high);
    }

    pub const fn position(&self) -> i32 {
        self.position
    }

    pub fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    pub const fn state(&self) -> u8 {
        self.state
    }
}

#[inline]
pub const fn ab_from_levels(clk_high: bool, dt_high: bool) -> u8 {
    ((clk_high as u8) << 1) | (dt_high as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    // (clk, dt) levels for one clockwise detent starting from 00.
    const CW_CYCLE: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];
    const CCW_CYCLE: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];

    fn decoder() -> QuadratureDecoder {
        QuadratureDecoder::new(0b00, EncoderConfig::default())
    }

    fn feed(decoder: &mut QuadratureDecoder, levels: &[(bool, bool)], start_ms: u64) -> u64 {
        let mut now = start_ms;
        for (clk, dt) in levels {
            decoder.on_edge(*clk, *dt, now);
            now += 5;
        }
        now
    }

    #[test]
    fn clockwise_cycle_counts_up_per_transition() {
        let mut decoder = decoder();
        feed(&mut decoder, &CW_CYCLE, 0);
        assert_eq!(decoder.position(), 4);
        assert_eq!(decoder.state(), 0b00);
    }

    #[test]
    fn counter_clockwise_cycle_counts_down() {
        let mut decoder = decoder();
        feed(&mut decoder, &CCW_CYCLE, 0);
        assert_eq!(decoder.position(), -4);
    }

    #[test]
    fn net_displacement_survives_direction_reversal() {
        let mut decoder = decoder();
        let now = feed(&mut decoder, &CW_CYCLE, 0);
        let now = feed(&mut decoder, &CW_CYCLE, now);
        feed(&mut decoder, &CCW_CYCLE, now);
        assert_eq!(decoder.position(), 4);
    }

    #[test]
    fn edges_inside_debounce_window_are_ignored() {
        let mut decoder = decoder();
        assert_eq!(decoder.on_edge(false, true, 100), EdgeOutcome::Step(1));
        assert_eq!(decoder.on_edge(true, true, 101), EdgeOutcome::Debounced);
        assert_eq!(decoder.position(), 1);
        assert_eq!(decoder.on_edge(true, true, 102), EdgeOutcome::Step(1));
    }

    #[test]
    fn skipped_state_is_adopted_without_counting() {
        let mut decoder = decoder();
        assert_eq!(decoder.on_edge(true, true, 10), EdgeOutcome::Resync);
        assert_eq!(decoder.position(), 0);
        assert_eq!(decoder.state(), 0b11);
        assert_eq!(decoder.on_edge(true, false, 20), EdgeOutcome::Step(1));
    }

    #[test]
    fn repeated_level_is_unchanged() {
        let mut decoder = decoder();
        assert_eq!(decoder.on_edge(false, false, 10), EdgeOutcome::Unchanged);
    }

    #[test]
    fn inverted_direction_flips_the_sign() {
        let config = EncoderConfig::default().with_direction_inverted(true);
        let mut decoder = QuadratureDecoder::new(0b00, config);
        feed(&mut decoder, &CW_CYCLE, 0);
        assert_eq!(decoder.position(), -4);
    }
}
