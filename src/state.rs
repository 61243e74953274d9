//! State shared between the keypad loop and the interrupt handlers
//!
//! | field          | written by                            | read by                    |
//! |----------------|---------------------------------------|----------------------------|
//! | `digits`       | keypad (while inactive), control edge | display tick, control edge |
//! | `active`       | control edge                          | keypad loop                |
//!
//! Every handler runs to completion at a single priority level, so one writer
//! per field is enough. The display may catch a shift halfway; that only shows
//! a partially updated number for one refresh.

use crate::config::INITIAL_DIGITS;

/// Number of digit positions on the display
pub const DIGIT_COUNT: usize = 4;

/// A single decimal digit, 0 to 9.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Digit(u8);

impl Digit {
    pub const fn new(value: u8) -> Option<Self> {
        if value <= 9 {
            Some(Self(value))
        } else {
            None
        }
    }

    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl ufmt::uDisplay for Digit {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uDisplay::fmt(&self.0, f)
    }
}

/// Entered frequency in Hz as four decimal digits, most significant first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitBuffer {
    digits: [u8; DIGIT_COUNT],
}

impl DigitBuffer {
    /// All-zero buffer
    pub const ZERO: Self = Self {
        digits: [0; DIGIT_COUNT],
    };

    /// Buffer shown at power-up
    pub const POWER_ON: Self = match Self::from_digits(INITIAL_DIGITS) {
        Some(buffer) => buffer,
        None => panic!("power-on digits out of range"),
    };

    /// Builds a buffer, rejecting any value above 9.
    pub const fn from_digits(digits: [u8; DIGIT_COUNT]) -> Option<Self> {
        let mut i = 0;
        while i < DIGIT_COUNT {
            if digits[i] > 9 {
                return None;
            }
            i += 1;
        }
        Some(Self { digits })
    }

    /// Drops the most significant digit and appends `digit` as the units.
    pub fn shift_in(&mut self, digit: Digit) {
        self.digits.copy_within(1.., 0);
        self.digits[DIGIT_COUNT - 1] = digit.value();
    }

    pub fn clear(&mut self) {
        self.digits = [0; DIGIT_COUNT];
    }

    /// Digit at `position`, 0 being the most significant.
    ///
    /// # Panics
    ///
    /// Panics if `position >= DIGIT_COUNT`.
    #[inline]
    pub fn digit(&self, position: usize) -> u8 {
        self.digits[position]
    }

    #[inline]
    pub fn digits(&self) -> [u8; DIGIT_COUNT] {
        self.digits
    }

    /// Frequency in Hz, 0 to 9999.
    pub fn value(&self) -> u16 {
        self.digits
            .iter()
            .fold(0u16, |acc, &d| acc * 10 + u16::from(d))
    }
}

impl Default for DigitBuffer {
    fn default() -> Self {
        Self::POWER_ON
    }
}

/// Digit buffer plus the output-active flag.
#[derive(Debug)]
pub struct SharedState {
    pub(crate) digits: DigitBuffer,
    active: bool,
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            digits: DigitBuffer::POWER_ON,
            active: false,
        }
    }

    #[inline]
    pub fn digits(&self) -> &DigitBuffer {
        &self.digits
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Shifts a keypad digit in. Refused while the output is running.
    pub fn enter_digit(&mut self, digit: Digit) -> bool {
        if self.active {
            return false;
        }
        self.digits.shift_in(digit);
        true
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
