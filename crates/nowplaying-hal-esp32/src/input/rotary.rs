use embedded_hal::digital::InputPin;
use esp_hal::gpio::{Event, Input};

use nowplaying_core::input::{EncoderConfig, SharedInput};

/// Pin with a latched edge interrupt.
pub trait EdgeSource {
    /// Starts latching edges in both directions.
    fn listen_any_edge(&mut self);

    /// Acknowledges a latched edge; returns whether one was pending.
    fn take_edge(&mut self) -> bool;
}

impl EdgeSource for Input<'_> {
    fn listen_any_edge(&mut self) {
        self.listen(Event::AnyEdge);
    }

    fn take_edge(&mut self) -> bool {
        let pending = self.is_interrupt_set();
        if pending {
            self.clear_interrupt();
        }
        pending
    }
}

#[derive(Debug)]
pub enum RotaryInputError<ClkErr, DtErr, SwErr> {
    Clk(ClkErr),
    Dt(DtErr),
    Sw(SwErr),
}

type RotaryResult<ClkErr, DtErr, SwErr, T> = Result<T, RotaryInputError<ClkErr, DtErr, SwErr>>;

/// Encoder and switch pins serviced from the GPIO interrupt.
///
/// Levels are read inside the handler and forwarded to [`SharedInput`] with
/// the handler's millisecond timestamp.
#[derive(Debug)]
pub struct RotaryInterrupts<CLK, DT, SW> {
    clk: CLK,
    dt: DT,
    sw: SW,
    config: EncoderConfig,
    input: &'static SharedInput,
}

impl<CLK, DT, SW> RotaryInterrupts<CLK, DT, SW>
where
    CLK: InputPin + EdgeSource,
    DT: InputPin + EdgeSource,
    SW: InputPin + EdgeSource,
{
    /// Seeds the decoder with the resting pin levels and arms all three pins.
    pub fn new(
        mut clk: CLK,
        mut dt: DT,
        mut sw: SW,
        config: EncoderConfig,
        input: &'static SharedInput,
    ) -> RotaryResult<CLK::Error, DT::Error, SW::Error, Self> {
        let clk_high = clk.is_high().map_err(RotaryInputError::Clk)?;
        let dt_high = dt.is_high().map_err(RotaryInputError::Dt)?;
        input.seed(clk_high, dt_high);

        clk.listen_any_edge();
        dt.listen_any_edge();
        sw.listen_any_edge();

        Ok(Self {
            clk,
            dt,
            sw,
            config,
            input,
        })
    }

    /// Interrupt context: acknowledges pending edges and feeds them forward.
    pub fn service(&mut self, now_ms: u64) -> RotaryResult<CLK::Error, DT::Error, SW::Error, ()> {
        // Both pins must be acknowledged even when only one fired.
        let clk_edge = self.clk.take_edge();
        let dt_edge = self.dt.take_edge();
        if clk_edge || dt_edge {
            let clk_high = self.clk.is_high().map_err(RotaryInputError::Clk)?;
            let dt_high = self.dt.is_high().map_err(RotaryInputError::Dt)?;
            self.input.on_encoder_edge(clk_high, dt_high, now_ms);
        }

        if self.sw.take_edge() {
            let sw_high = self.sw.is_high().map_err(RotaryInputError::Sw)?;
            let pressed = self.config.button_pressed(sw_high);
            self.input.on_button_edge(pressed, now_ms);
        }

        Ok(())
    }
}
