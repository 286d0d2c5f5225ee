use super::EncoderConfig;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClickAction {
    Single,
    Double,
}

/// Edge-level push-button state: debounces edges and counts completed clicks.
///
/// A click completes on release. A second release within the double-click
/// window of the first turns the pending single click into a double click.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ButtonClassifier {
    held: bool,
    press_start_ms: u64,
    click_count: u8,
    first_click_ms: u64,
    last_edge_ms: Option<u64>,
    debounce_ms: u64,
    double_click_ms: u64,
}

impl ButtonClassifier {
    pub const fn new(config: EncoderConfig) -> Self {
        Self {
            held: false,
            press_start_ms: 0,
            click_count: 0,
            first_click_ms: 0,
            last_edge_ms: None,
            debounce_ms: config.button_debounce_ms,
            double_click_ms: config.double_click_ms,
        }
    }

    /// Returns whether the edge was accepted.
    pub fn on_edge(&mut self, pressed: bool, now_ms: u64) -> bool {
        if let Some(last) = self.last_edge_ms
            && now_ms.saturating_sub(last) < self.debounce_ms
        {
            return false;
        }

        if pressed && !self.held {
            self.held = true;
            self.press_start_ms = now_ms;
        } else if !pressed && self.held {
            self.held = false;
            self.register_release(now_ms);
        } else {
            return false;
        }

        self.last_edge_ms = Some(now_ms);
        true
    }

    fn register_release(&mut self, now_ms: u64) {
        if self.click_count > 0 && now_ms.saturating_sub(self.first_click_ms) < self.double_click_ms
        {
            self.click_count = 2;
        } else {
            self.first_click_ms = now_ms;
            self.click_count = 1;
        }
    }

    pub const fn is_held(&self) -> bool {
        self.held
    }

    /// How long the button has been held, if it is down.
    pub fn held_for_ms(&self, now_ms: u64) -> Option<u64> {
        self.held.then(|| now_ms.saturating_sub(self.press_start_ms))
    }

    pub const fn click_count(&self) -> u8 {
        self.click_count
    }

    fn consume(&mut self) {
        self.click_count = 0;
    }
}

/// Main-loop side of click handling.
///
/// Double clicks dispatch immediately. A single click waits out the
/// double-click window, and is dropped when another action fired within the
/// same window before it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClickDispatcher {
    last_action_ms: Option<u64>,
    double_click_ms: u64,
}

impl ClickDispatcher {
    pub const fn new(config: EncoderConfig) -> Self {
        Self {
            last_action_ms: None,
            double_click_ms: config.double_click_ms,
        }
    }

    pub fn poll(&mut self, button: &mut ButtonClassifier, now_ms: u64) -> Option<ClickAction> {
        match button.click_count {
            2 => {
                button.consume();
                self.last_action_ms = Some(now_ms);
                Some(ClickAction::Double)
            }
            1 if now_ms.saturating_sub(button.first_click_ms) > self.double_click_ms => {
                button.consume();
                let cooled_down = self
                    .last_action_ms
                    .is_none_or(|last| now_ms.saturating_sub(last) > self.double_click_ms);
                if !cooled_down {
                    return None;
                }
                self.last_action_ms = Some(now_ms);
                Some(ClickAction::Single)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(button: &mut ButtonClassifier, at_ms: u64) {
        assert!(button.on_edge(true, at_ms));
        assert!(button.on_edge(false, at_ms + 60));
    }

    fn parts() -> (ButtonClassifier, ClickDispatcher) {
        let config = EncoderConfig::default();
        (ButtonClassifier::new(config), ClickDispatcher::new(config))
    }

    #[test]
    fn single_click_waits_out_the_double_click_window() {
        let (mut button, mut dispatcher) = parts();
        click(&mut button, 1_000);
        assert_eq!(button.click_count(), 1);

        assert_eq!(dispatcher.poll(&mut button, 1_100), None);
        assert_eq!(dispatcher.poll(&mut button, 1_460), None);
        assert_eq!(dispatcher.poll(&mut button, 1_461), Some(ClickAction::Single));
        assert_eq!(button.click_count(), 0);
    }

    #[test]
    fn two_quick_releases_make_a_double_click() {
        let (mut button, mut dispatcher) = parts();
        click(&mut button, 1_000);
        click(&mut button, 1_200);
        assert_eq!(button.click_count(), 2);

        assert_eq!(dispatcher.poll(&mut button, 1_300), Some(ClickAction::Double));
        assert_eq!(dispatcher.poll(&mut button, 2_000), None);
    }

    #[test]
    fn slow_second_click_starts_a_new_single() {
        let (mut button, _) = parts();
        click(&mut button, 1_000);
        click(&mut button, 1_500);
        assert_eq!(button.click_count(), 1);
    }

    #[test]
    fn clicks_half_a_second_apart_are_two_singles() {
        let (mut button, mut dispatcher) = parts();
        click(&mut button, 1_000);
        assert_eq!(dispatcher.poll(&mut button, 1_461), Some(ClickAction::Single));

        click(&mut button, 1_500);
        assert_eq!(button.click_count(), 1);
        assert_eq!(dispatcher.poll(&mut button, 1_700), None);
        assert_eq!(dispatcher.poll(&mut button, 1_960), None);
        assert_eq!(dispatcher.poll(&mut button, 1_961), Some(ClickAction::Single));
        assert_eq!(button.click_count(), 0);
    }

    #[test]
    fn bouncing_contacts_are_debounced() {
        let (mut button, _) = parts();
        assert!(button.on_edge(true, 1_000));
        assert!(!button.on_edge(false, 1_010));
        assert!(!button.on_edge(true, 1_020));
        assert!(button.is_held());
        assert_eq!(button.held_for_ms(1_200), Some(200));
        assert!(button.on_edge(false, 1_300));
        assert_eq!(button.held_for_ms(1_400), None);
    }

    #[test]
    fn release_without_press_is_ignored() {
        let (mut button, _) = parts();
        assert!(!button.on_edge(false, 1_000));
        assert_eq!(button.click_count(), 0);
    }

    #[test]
    fn eligible_single_inside_action_cooldown_is_dropped() {
        let config = EncoderConfig::default();
        let mut dispatcher = ClickDispatcher::new(config);
        let mut stale = ButtonClassifier::new(config);
        let mut fresh = ButtonClassifier::new(config);

        click(&mut stale, 800);
        click(&mut fresh, 1_000);
        click(&mut fresh, 1_150);
        assert_eq!(dispatcher.poll(&mut fresh, 1_300), Some(ClickAction::Double));

        assert_eq!(dispatcher.poll(&mut stale, 1_300), None);
        assert_eq!(stale.click_count(), 0);
    }

    #[test]
    fn single_after_cooldown_is_delivered() {
        let (mut button, mut dispatcher) = parts();
        click(&mut button, 1_000);
        click(&mut button, 1_150);
        assert_eq!(dispatcher.poll(&mut button, 1_300), Some(ClickAction::Double));

        click(&mut button, 1_300);
        assert_eq!(dispatcher.poll(&mut button, 1_500), None);
        assert_eq!(dispatcher.poll(&mut button, 1_761), Some(ClickAction::Single));
    }
}
