use crate::error::Error;
use crate::hal::SegmentBus;
use crate::state::{DigitBuffer, DIGIT_COUNT};
use embedded_hal::digital::v2::OutputPin;

/// Segment patterns for 0-9 on a common-anode display: bit 0 is segment a,
/// bit 7 the decimal point, and a low bit lights the segment.
pub const SEGMENT_TABLE: [u8; 10] = [0xC0, 0xF9, 0xA4, 0xB0, 0x99, 0x92, 0x82, 0xF8, 0x80, 0x90];

/// All segments off
pub const BLANK: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Next tick turns the lit digit off and loads the bus
    LoadSegments,
    /// Next tick turns the loaded digit on
    EnableDigit,
}

/// Multiplexed 4-digit display sharing one segment bus.
///
/// Each position takes two ticks so the bus never changes under a lit digit
/// and no digit lights with the previous digit's segments.
pub struct Display<B, D> {
    bus: B,
    enables: [D; DIGIT_COUNT],
    position: usize,
    phase: Phase,
    lit: Option<usize>,
}

impl<B, D, E> Display<B, D>
where
    B: SegmentBus<Error = E>,
    D: OutputPin<Error = E>,
{
    pub fn new(bus: B, enables: [D; DIGIT_COUNT]) -> Self {
        Self {
            bus,
            enables,
            position: 0,
            phase: Phase::LoadSegments,
            lit: None,
        }
    }

    /// Turns every digit off and blanks the bus.
    pub fn blank(&mut self) -> Result<(), Error<E>> {
        for enable in self.enables.iter_mut() {
            enable.set_low()?;
        }
        self.bus.write(BLANK)?;
        self.lit = None;
        self.position = 0;
        self.phase = Phase::LoadSegments;
        Ok(())
    }

    /// Refresh tick handler.
    pub fn tick(&mut self, digits: &DigitBuffer) -> Result<(), Error<E>> {
        match self.phase {
            Phase::LoadSegments => {
                if let Some(previous) = self.lit.take() {
                    self.enables[previous].set_low()?;
                }
                let pattern = SEGMENT_TABLE[usize::from(digits.digit(self.position))];
                self.bus.write(pattern)?;
                self.phase = Phase::EnableDigit;
            }
            Phase::EnableDigit => {
                self.enables[self.position].set_high()?;
                self.lit = Some(self.position);
                self.position = (self.position + 1) % DIGIT_COUNT;
                self.phase = Phase::LoadSegments;
            }
        }
        Ok(())
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }
}
