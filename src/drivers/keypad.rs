//! 4x4 matrix keypad with digits on the first three columns
//!
//! ```text
//!        C1  C2  C3  C4
//!   R1    1   2   3   -
//!   R2    4   5   6   -
//!   R3    7   8   9   -
//!   R4    -   0   -   -
//! ```

use crate::error::Error;
use crate::hal::SpanWait;
use crate::os::Shared;
use crate::state::Digit;
use embedded_hal::digital::v2::{InputPin, OutputPin};

pub const ROWS: usize = 4;
pub const COLUMNS: usize = 4;

/// Columns that carry keys
const DECODED_COLUMNS: usize = 3;

const KEYMAP: [[Option<u8>; DECODED_COLUMNS]; ROWS] = [
    [Some(1), Some(2), Some(3)],
    [Some(4), Some(5), Some(6)],
    [Some(7), Some(8), Some(9)],
    [None, Some(0), None],
];

/// The two sensing phases of a matrix scan. `true` means pressed.
pub trait MatrixLines {
    type Error;

    /// Releases the rows, drives every column low and reports which rows read low.
    fn sense_rows(&mut self) -> Result<[bool; ROWS], Self::Error>;

    /// Releases the columns, drives every row low and reports which columns read low.
    fn sense_columns(&mut self) -> Result<[bool; COLUMNS], Self::Error>;
}

/// Matrix wired to quasi-bidirectional lines: released lines float high,
/// driven lines sink, and either can be read back.
pub struct PinMatrix<R, C> {
    rows: [R; ROWS],
    columns: [C; COLUMNS],
}

impl<R, C> PinMatrix<R, C> {
    pub fn new(rows: [R; ROWS], columns: [C; COLUMNS]) -> Self {
        Self { rows, columns }
    }
}

fn drive_all<P: OutputPin>(lines: &mut [P], high: bool) -> Result<(), P::Error> {
    for line in lines.iter_mut() {
        if high {
            line.set_high()?;
        } else {
            line.set_low()?;
        }
    }
    Ok(())
}

fn sample<P: InputPin, const N: usize>(lines: &[P; N]) -> Result<[bool; N], P::Error> {
    let mut pressed = [false; N];
    for (slot, line) in pressed.iter_mut().zip(lines.iter()) {
        *slot = line.is_low()?;
    }
    Ok(pressed)
}

impl<R, C, E> MatrixLines for PinMatrix<R, C>
where
    R: InputPin<Error = E> + OutputPin<Error = E>,
    C: InputPin<Error = E> + OutputPin<Error = E>,
{
    type Error = E;

    fn sense_rows(&mut self) -> Result<[bool; ROWS], E> {
        drive_all(&mut self.rows, true)?;
        drive_all(&mut self.columns, false)?;
        sample(&self.rows)
    }

    fn sense_columns(&mut self) -> Result<[bool; COLUMNS], E> {
        drive_all(&mut self.columns, true)?;
        drive_all(&mut self.rows, false)?;
        sample(&self.columns)
    }
}

/// Resolves at most one digit per scan.
pub struct Keypad<M> {
    lines: M,
}

impl<M: MatrixLines> Keypad<M> {
    pub fn new(lines: M) -> Self {
        Self { lines }
    }

    /// One two-phase scan.
    ///
    /// The first pressed row wins, then the first pressed column within it that
    /// carries a digit. Keys outside the digit layout are skipped, and a key
    /// released between the two phases resolves to nothing.
    pub fn scan(&mut self) -> Result<Option<Digit>, Error<M::Error>> {
        let rows = self.lines.sense_rows()?;
        let Some(row) = rows.iter().position(|&pressed| pressed) else {
            return Ok(None);
        };

        let columns = self.lines.sense_columns()?;
        let digit = columns
            .iter()
            .zip(KEYMAP[row].iter())
            .filter(|&(&pressed, _)| pressed)
            .find_map(|(_, &key)| key)
            .and_then(Digit::new);
        Ok(digit)
    }
}

/// Fixed dead time after an accepted key.
///
/// Busy-waits on a timer nothing else uses. Foreground only: it blocks and
/// cannot be cancelled.
pub struct Debounce<W> {
    timer: W,
    spans: u8,
}

impl<W: SpanWait> Debounce<W> {
    pub fn new(timer: W, spans: u8) -> Self {
        Self { timer, spans }
    }

    pub fn settle(&mut self) {
        self.timer.restart();
        for _ in 0..self.spans {
            match nb::block!(self.timer.wait()) {
                Ok(()) => {}
                Err(never) => match never {},
            }
        }
        self.timer.stop();
    }
}

/// Keypad scanning loop body: scan, shift the digit in, debounce.
pub struct KeypadInput<M, W> {
    keypad: Keypad<M>,
    debounce: Debounce<W>,
}

impl<M: MatrixLines, W: SpanWait> KeypadInput<M, W> {
    pub fn new(keypad: Keypad<M>, debounce: Debounce<W>) -> Self {
        Self { keypad, debounce }
    }

    /// Runs one polling iteration and returns the digit it accepted.
    ///
    /// Does nothing while the output is running. The debounce wait happens
    /// after the shared state has been released.
    pub fn poll<S: Shared>(&mut self, shared: &S) -> Result<Option<Digit>, Error<M::Error>> {
        if shared.with(|state| state.is_active()) {
            return Ok(None);
        }

        let Some(digit) = self.keypad.scan()? else {
            return Ok(None);
        };

        // The control edge may have fired since the check above
        if !shared.with(|state| state.enter_digit(digit)) {
            return Ok(None);
        }

        self.debounce.settle();
        Ok(Some(digit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal_mock::pin::{Mock as PinMock, State, Transaction};
    use std::vec::Vec;

    /// Matrix with a fixed set of held keys, as (row, column).
    #[derive(Default)]
    struct HeldKeys {
        keys: Vec<(usize, usize)>,
        column_senses: u32,
    }

    impl HeldKeys {
        fn holding(keys: &[(usize, usize)]) -> Self {
            Self {
                keys: keys.to_vec(),
                column_senses: 0,
            }
        }
    }

    impl MatrixLines for HeldKeys {
        type Error = Infallible;

        fn sense_rows(&mut self) -> Result<[bool; ROWS], Infallible> {
            let mut rows = [false; ROWS];
            for &(row, _) in &self.keys {
                rows[row] = true;
            }
            Ok(rows)
        }

        fn sense_columns(&mut self) -> Result<[bool; COLUMNS], Infallible> {
            self.column_senses += 1;
            let mut columns = [false; COLUMNS];
            for &(_, column) in &self.keys {
                columns[column] = true;
            }
            Ok(columns)
        }
    }

    #[derive(Default)]
    struct CountingTimer {
        restarts: u32,
        waits: u32,
        stops: u32,
        pending: bool,
    }

    impl SpanWait for CountingTimer {
        fn restart(&mut self) {
            self.restarts += 1;
        }

        fn wait(&mut self) -> nb::Result<(), Infallible> {
            // Every other poll sees the rollover
            self.pending = !self.pending;
            if self.pending {
                return Err(nb::Error::WouldBlock);
            }
            self.waits += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    fn scan(keys: &[(usize, usize)]) -> Option<u8> {
        Keypad::new(HeldKeys::holding(keys))
            .scan()
            .unwrap()
            .map(Digit::value)
    }

    fn input(keys: &[(usize, usize)]) -> KeypadInput<HeldKeys, CountingTimer> {
        KeypadInput::new(
            Keypad::new(HeldKeys::holding(keys)),
            Debounce::new(CountingTimer::default(), 6),
        )
    }

    #[test]
    fn every_digit_key_resolves() {
        let layout = [
            ((0, 0), 1),
            ((0, 1), 2),
            ((0, 2), 3),
            ((1, 0), 4),
            ((1, 1), 5),
            ((1, 2), 6),
            ((2, 0), 7),
            ((2, 1), 8),
            ((2, 2), 9),
            ((3, 1), 0),
        ];
        for (key, digit) in layout {
            assert_eq!(scan(&[key]), Some(digit), "key {:?}", key);
        }
    }

    #[test]
    fn unused_keys_resolve_to_nothing() {
        for key in [(3, 0), (3, 2), (0, 3), (2, 3)] {
            assert_eq!(scan(&[key]), None, "key {:?}", key);
        }
    }

    #[test]
    fn idle_matrix_skips_column_phase() {
        let mut keypad = Keypad::new(HeldKeys::default());
        assert_eq!(keypad.scan(), Ok(None));
        assert_eq!(keypad.lines.column_senses, 0);
    }

    #[test]
    fn first_row_then_first_column_wins() {
        // 8 and 6 held: row 1 wins, and with both columns low the middle one wins
        assert_eq!(scan(&[(2, 1), (1, 2)]), Some(5));
        assert_eq!(scan(&[(0, 2), (0, 1)]), Some(2));
    }

    #[test]
    fn unused_key_does_not_mask_zero() {
        assert_eq!(scan(&[(3, 0), (3, 1)]), Some(0));
        assert_eq!(scan(&[(3, 1), (3, 2)]), Some(0));
        assert_eq!(scan(&[(3, 0), (3, 2)]), None);
    }

    #[test]
    fn pin_matrix_drives_then_samples_each_phase() {
        let high = Transaction::set(State::High);
        let low = Transaction::set(State::Low);
        let idle = Transaction::get(State::High);
        let pressed = Transaction::get(State::Low);

        // Key "5": row 2 and column 2 read low
        let row = |sensed: &Transaction| PinMock::new(&[high.clone(), sensed.clone(), low.clone()]);
        let rows = [row(&idle), row(&pressed), row(&idle), row(&idle)];
        let column = |sensed: &Transaction| PinMock::new(&[low.clone(), high.clone(), sensed.clone()]);
        let columns = [column(&idle), column(&pressed), column(&idle), column(&idle)];

        let mut keypad = Keypad::new(PinMatrix::new(rows, columns));
        assert_eq!(keypad.scan().unwrap().map(Digit::value), Some(5));

        for line in keypad.lines.rows.iter_mut().chain(keypad.lines.columns.iter_mut()) {
            line.done();
        }
    }

    #[test]
    fn accepted_digit_is_shifted_and_debounced() {
        let shared = RefCell::new(SharedState::new());
        let mut input = input(&[(1, 0)]);

        assert_eq!(input.poll(&shared).unwrap().map(Digit::value), Some(4));
        assert_eq!(shared.borrow().digits().digits(), [0, 0, 1, 4]);

        let timer = &input.debounce.timer;
        assert_eq!((timer.restarts, timer.waits, timer.stops), (1, 6, 1));
    }

    #[test]
    fn no_key_means_no_debounce() {
        let shared = RefCell::new(SharedState::new());
        let mut input = input(&[]);

        assert_eq!(input.poll(&shared), Ok(None));
        assert_eq!(input.debounce.timer.restarts, 0);
        assert_eq!(shared.borrow().digits().value(), 1);
    }

    #[test]
    fn keypad_is_ignored_while_active() {
        let shared = RefCell::new(SharedState::new());
        shared.borrow_mut().set_active(true);
        let mut input = input(&[(2, 2)]);

        assert_eq!(input.poll(&shared), Ok(None));
        assert_eq!(input.keypad.lines.column_senses, 0);
        assert_eq!(input.debounce.timer.restarts, 0);
        assert_eq!(shared.borrow().digits().value(), 1);
    }

    #[test]
    fn five_presses_keep_the_last_four() {
        let shared = RefCell::new(SharedState::new());
        for key in [(2, 2), (2, 1), (2, 0), (1, 2), (1, 1)] {
            input(&[key]).poll(&shared).unwrap();
        }
        assert_eq!(shared.borrow().digits().digits(), [8, 7, 6, 5]);
    }
}
