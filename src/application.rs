//! Application layer: one entry point per execution context
//!
//! The board runs three interrupt handlers (control edge, synthesis timer,
//! display tick) at one priority, plus the keypad loop in the foreground.
//! Handlers borrow the shared state for their whole run; the foreground goes
//! through [`Shared`](crate::os::Shared) via [`KeypadInput`](crate::drivers::KeypadInput).

use crate::control::{self, Transition};
use crate::drivers::Display;
use crate::error::Error;
use crate::hal::{Countdown, SegmentBus};
use crate::logger::{Event, EventSink};
use crate::state::SharedState;
use crate::synth::FrequencySynth;
use embedded_hal::digital::v2::OutputPin;

/// Handler-side components of the generator.
pub struct Application<T, O, I, B, D> {
    synth: FrequencySynth<T, O, I>,
    display: Display<B, D>,
}

impl<T, O, I, B, D, E> Application<T, O, I, B, D>
where
    T: Countdown,
    O: OutputPin<Error = E>,
    I: OutputPin<Error = E>,
    B: SegmentBus<Error = E>,
    D: OutputPin<Error = E>,
{
    pub fn new(synth: FrequencySynth<T, O, I>, display: Display<B, D>) -> Self {
        Self { synth, display }
    }

    /// Power-on: display blanked, boot logged.
    pub fn start(&mut self, state: &SharedState, log: &mut impl EventSink) -> Result<(), Error<E>> {
        self.display.blank()?;
        log.record(&Event::Boot {
            digits: *state.digits(),
        });
        Ok(())
    }

    /// Control line edge.
    pub fn on_control_edge(
        &mut self,
        state: &mut SharedState,
        log: &mut impl EventSink,
    ) -> Result<Transition, Error<E>> {
        let transition = control::on_edge(state, &mut self.synth)?;
        log.record(&transition.into());
        Ok(transition)
    }

    /// Synthesis timer completion.
    #[inline]
    pub fn on_synth_overflow(&mut self) -> Result<(), Error<E>> {
        self.synth.on_overflow()
    }

    /// Display refresh tick.
    #[inline]
    pub fn on_display_tick(&mut self, state: &SharedState) -> Result<(), Error<E>> {
        self.display.tick(state.digits())
    }

    pub fn synth(&self) -> &FrequencySynth<T, O, I> {
        &self.synth
    }

    #[cfg(test)]
    pub(crate) fn display(&self) -> &Display<B, D> {
        &self.display
    }
}
