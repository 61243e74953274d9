//! Countdown timer capabilities
//!
//! The 16-bit timers count up from a loaded value and raise a completion when
//! they roll over from `0xFFFF`. Loading `TIMER_RANGE - n` therefore yields a
//! completion after `n` cycles, and a timer left alone after a completion runs
//! a full `TIMER_RANGE` cycles before the next one.

use core::convert::Infallible;

/// A timer that raises a completion each time its count rolls over.
pub trait Countdown {
    /// Writes the count the timer continues from.
    fn load(&mut self, reload: u16);

    fn start(&mut self);

    fn stop(&mut self);
}

/// A free-running timer whose rollover flag is polled instead of serviced.
pub trait SpanWait {
    /// Clears the count and the rollover flag and starts counting.
    fn restart(&mut self);

    /// Completes once per rollover since the last call.
    fn wait(&mut self) -> nb::Result<(), Infallible>;

    fn stop(&mut self);
}

#[cfg(target_arch = "avr")]
pub use self::avr::{DebounceTimer, Prescaler, Timer, Timer16Registers};

#[cfg(target_arch = "avr")]
mod avr {
    use super::{Countdown, SpanWait};
    use avr_device::atmega128a::{TC0, TC1, TC3};
    use core::convert::Infallible;
    use core::marker::PhantomData;

    #[derive(Clone, Copy)]
    pub enum Prescaler {
        Stop = 0,
        Direct = 1,
        Div8 = 2,
        Div64 = 3,
        Div256 = 4,
        Div1024 = 5,
    }

    /// Register access for the 16-bit timers running in normal mode.
    pub trait Timer16Registers {
        fn write_control(bits: u8);
        fn write_count(value: u16);
        fn enable_overflow_interrupt();
    }

    impl Timer16Registers for TC1 {
        fn write_control(bits: u8) {
            unsafe { (*TC1::ptr()).tccr1b.write(|w| w.bits(bits)) }
        }

        fn write_count(value: u16) {
            unsafe { (*TC1::ptr()).tcnt1.write(|w| w.bits(value)) }
        }

        fn enable_overflow_interrupt() {
            // TOIE1
            unsafe { (*TC1::ptr()).timsk.modify(|r, w| w.bits(r.bits() | (1 << 2))) }
        }
    }

    impl Timer16Registers for TC3 {
        fn write_control(bits: u8) {
            unsafe { (*TC3::ptr()).tccr3b.write(|w| w.bits(bits)) }
        }

        fn write_count(value: u16) {
            unsafe { (*TC3::ptr()).tcnt3.write(|w| w.bits(value)) }
        }

        fn enable_overflow_interrupt() {
            // TOIE3
            unsafe { (*TC3::ptr()).etimsk.modify(|r, w| w.bits(r.bits() | (1 << 2))) }
        }
    }

    /// 16-bit timer in normal mode with its overflow interrupt enabled.
    pub struct Timer<T> {
        prescaler: Prescaler,
        _timer: PhantomData<T>,
    }

    impl<T: Timer16Registers> Timer<T> {
        pub fn new(_timer: T, prescaler: Prescaler) -> Self {
            T::write_control(Prescaler::Stop as u8);
            T::write_count(0);
            T::enable_overflow_interrupt();
            Self {
                prescaler,
                _timer: PhantomData,
            }
        }
    }

    impl<T: Timer16Registers> Countdown for Timer<T> {
        #[inline]
        fn load(&mut self, reload: u16) {
            T::write_count(reload);
        }

        fn start(&mut self) {
            T::write_control(self.prescaler as u8);
        }

        fn stop(&mut self) {
            T::write_control(Prescaler::Stop as u8);
        }
    }

    /// Timer0 polled for rollovers at clk/1024 (16.4 ms per span).
    pub struct DebounceTimer {
        _timer: PhantomData<TC0>,
    }

    const TOV0: u8 = 1 << 0;
    // Timer0 has its own prescaler encoding; 7 selects clk/1024
    const TIMER0_DIV1024: u8 = 7;

    impl DebounceTimer {
        pub fn new(_timer: TC0) -> Self {
            unsafe { (*TC0::ptr()).tccr0.write(|w| w.bits(0)) }
            Self {
                _timer: PhantomData,
            }
        }
    }

    impl SpanWait for DebounceTimer {
        fn restart(&mut self) {
            unsafe {
                let p = TC0::ptr();
                (*p).tcnt0.write(|w| w.bits(0));
                (*p).tifr.write(|w| w.bits(TOV0));
                (*p).tccr0.write(|w| w.bits(TIMER0_DIV1024));
            }
        }

        fn wait(&mut self) -> nb::Result<(), Infallible> {
            unsafe {
                let p = TC0::ptr();
                if (*p).tifr.read().bits() & TOV0 == 0 {
                    return Err(nb::Error::WouldBlock);
                }
                // Flag clears by writing a one
                (*p).tifr.write(|w| w.bits(TOV0));
            }
            Ok(())
        }

        fn stop(&mut self) {
            unsafe { (*TC0::ptr()).tccr0.write(|w| w.bits(0)) }
        }
    }
}
