use core::cell::RefCell;

use critical_section::Mutex;

use super::{
    ButtonClassifier, ClickAction, ClickDispatcher, EdgeOutcome, EncoderConfig, QuadratureDecoder,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InputSnapshot {
    pub position: i32,
    pub quadrature_state: u8,
    pub button_held: bool,
    pub click_count: u8,
}

struct InputState {
    encoder: QuadratureDecoder,
    button: ButtonClassifier,
    encoder_changed: bool,
}

/// Encoder and button state shared between pin interrupts and the main loop.
///
/// Every access runs inside a critical section, so the interrupt writer and
/// the main-loop reader never observe a half-applied update.
pub struct SharedInput {
    inner: Mutex<RefCell<InputState>>,
}

impl SharedInput {
    pub const fn new(config: EncoderConfig) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(InputState {
                encoder: QuadratureDecoder::new(0, config),
                button: ButtonClassifier::new(config),
                encoder_changed: false,
            })),
        }
    }

    /// Adopts the current pin levels as the resting state without counting.
    pub fn seed(&self, clk_high: bool, dt_high: bool) {
        critical_section::with(|cs| {
            self.inner
                .borrow_ref_mut(cs)
                .encoder
                .resync(clk_high, dt_high);
        });
    }

    /// Interrupt context: CLK or DT changed level.
    pub fn on_encoder_edge(&self, clk_high: bool, dt_high: bool, now_ms: u64) -> EdgeOutcome {
        critical_section::with(|cs| {
            let mut state = self.inner.borrow_ref_mut(cs);
            let outcome = state.encoder.on_edge(clk_high, dt_high, now_ms);
            if matches!(outcome, EdgeOutcome::Step(_) | EdgeOutcome::Resync) {
                state.encoder_changed = true;
            }
            outcome
        })
    }

    /// Interrupt context: the switch pin changed level.
    pub fn on_button_edge(&self, pressed: bool, now_ms: u64) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).button.on_edge(pressed, now_ms))
    }

    /// When the encoder moved since the last drain, hands its position to
    /// `apply` and moves the counter to the position `apply` asks for. The
    /// read, the update and the snap share one critical section.
    pub fn drain_encoder<R>(&self, apply: impl FnOnce(i32) -> (R, Option<i32>)) -> Option<R> {
        critical_section::with(|cs| {
            let mut state = self.inner.borrow_ref_mut(cs);
            if !state.encoder_changed {
                return None;
            }
            state.encoder_changed = false;

            let (result, snap) = apply(state.encoder.position());
            if let Some(position) = snap {
                state.encoder.set_position(position);
            }
            Some(result)
        })
    }

    pub fn poll_click(&self, dispatcher: &mut ClickDispatcher, now_ms: u64) -> Option<ClickAction> {
        critical_section::with(|cs| dispatcher.poll(&mut self.inner.borrow_ref_mut(cs).button, now_ms))
    }

    pub fn snapshot(&self) -> InputSnapshot {
        critical_section::with(|cs| {
            let state = self.inner.borrow_ref(cs);
            InputSnapshot {
                position: state.encoder.position(),
                quadrature_state: state.encoder.state(),
                button_held: state.button.is_held(),
                click_count: state.button.click_count(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_position(input: &SharedInput) -> Option<i32> {
        input.drain_encoder(|position| (position, None))
    }

    #[test]
    fn encoder_changes_are_drained_once() {
        let input = SharedInput::new(EncoderConfig::default());
        assert_eq!(read_position(&input), None);

        input.on_encoder_edge(false, true, 10);
        input.on_encoder_edge(true, true, 20);
        assert_eq!(read_position(&input), Some(2));
        assert_eq!(read_position(&input), None);
    }

    #[test]
    fn seeding_adopts_levels_without_counting() {
        let input = SharedInput::new(EncoderConfig::default());
        input.seed(true, true);

        let snapshot = input.snapshot();
        assert_eq!(snapshot.position, 0);
        assert_eq!(snapshot.quadrature_state, 0b11);
        assert_eq!(read_position(&input), None);
    }

    #[test]
    fn drain_snaps_the_position_it_read() {
        let input = SharedInput::new(EncoderConfig::default());
        input.on_encoder_edge(false, true, 10);

        assert_eq!(input.drain_encoder(|position| (position, Some(0))), Some(1));
        assert_eq!(input.snapshot().position, 0);
        assert_eq!(read_position(&input), None);

        // Counting resumes from the snapped position.
        input.on_encoder_edge(true, true, 20);
        assert_eq!(read_position(&input), Some(1));
    }

    #[test]
    fn button_edges_feed_the_click_dispatcher() {
        let config = EncoderConfig::default();
        let input = SharedInput::new(config);
        let mut dispatcher = ClickDispatcher::new(config);

        assert!(input.on_button_edge(true, 100));
        assert!(input.snapshot().button_held);
        assert!(input.on_button_edge(false, 200));
        assert_eq!(input.snapshot().click_count, 1);

        assert_eq!(input.poll_click(&mut dispatcher, 300), None);
        assert_eq!(
            input.poll_click(&mut dispatcher, 601),
            Some(ClickAction::Single)
        );
    }
}
