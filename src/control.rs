//! Edge-triggered on/off control

use crate::error::Error;
use crate::hal::Countdown;
use crate::state::SharedState;
use crate::synth::{ChunkPlan, FrequencySynth};
use embedded_hal::digital::v2::OutputPin;

/// Outcome of one control edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Output started with this plan
    Activated { freq_hz: u16, plan: ChunkPlan },
    /// The buffer reads 0 Hz; nothing started and the flag stays off
    Refused,
    /// Output stopped and the buffer cleared
    Deactivated,
}

/// Handles an edge on the control line.
///
/// Safe to call whatever the keypad loop or the other handlers are doing: it
/// runs with the shared state borrowed and only touches the synthesis engine.
pub fn on_edge<T, O, I, E>(
    state: &mut SharedState,
    synth: &mut FrequencySynth<T, O, I>,
) -> Result<Transition, Error<E>>
where
    T: Countdown,
    O: OutputPin<Error = E>,
    I: OutputPin<Error = E>,
{
    if state.is_active() {
        synth.deactivate()?;
        state.digits.clear();
        state.set_active(false);
        return Ok(Transition::Deactivated);
    }

    match synth.activate(state.digits())? {
        Some(plan) => {
            state.set_active(true);
            Ok(Transition::Activated {
                freq_hz: state.digits().value(),
                plan,
            })
        }
        None => Ok(Transition::Refused),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Digit, DigitBuffer};
    use crate::synth::tests::synth;
    use crate::synth::Mode;

    fn enter(state: &mut SharedState, digits: &[u8]) {
        for &d in digits {
            state.enter_digit(Digit::new(d).unwrap());
        }
    }

    #[test]
    fn first_edge_activates_with_buffer_frequency() {
        let mut state = SharedState::new();
        let mut synth = synth();
        enter(&mut state, &[1, 2, 3, 4]);

        match on_edge(&mut state, &mut synth).unwrap() {
            Transition::Activated { freq_hz, plan } => {
                assert_eq!(freq_hz, 1234);
                assert_eq!(plan.mode(), Mode::Short);
            }
            other => panic!("unexpected transition {:?}", other),
        }
        assert!(state.is_active());
        assert!(synth.is_running());
        // Buffer is left alone while running
        assert_eq!(state.digits().value(), 1234);
    }

    #[test]
    fn second_edge_deactivates_and_clears() {
        let mut state = SharedState::new();
        let mut synth = synth();
        enter(&mut state, &[9, 9]);
        on_edge(&mut state, &mut synth).unwrap();
        synth.on_overflow().unwrap();

        assert_eq!(on_edge(&mut state, &mut synth), Ok(Transition::Deactivated));
        assert!(!state.is_active());
        assert!(!synth.is_running());
        assert!(!synth.level());
        assert_eq!(*state.digits(), DigitBuffer::ZERO);
    }

    #[test]
    fn zero_buffer_is_refused_and_stays_inactive() {
        let mut state = SharedState::new();
        let mut synth = synth();
        enter(&mut state, &[0, 0, 0, 0]);

        assert_eq!(on_edge(&mut state, &mut synth), Ok(Transition::Refused));
        assert!(!state.is_active());
        assert!(!synth.is_running());
        // The next edge tries again
        assert_eq!(on_edge(&mut state, &mut synth), Ok(Transition::Refused));
        assert!(!synth.level());
    }
}
