//! Digital lines and the segment bus
//!
//! Single lines use the `embedded-hal` digital traits. The segment bus is a
//! separate capability because the board drives all eight segments with one
//! port write.

use embedded_hal::digital::v2::OutputPin;

/// Eight segment lines (a to g, then dp) written together.
pub trait SegmentBus {
    type Error;

    /// Drives bit `n` of `pattern` onto segment line `n`.
    fn write(&mut self, pattern: u8) -> Result<(), Self::Error>;
}

/// Segment bus built from eight individual lines.
impl<P: OutputPin> SegmentBus for [P; 8] {
    type Error = P::Error;

    fn write(&mut self, pattern: u8) -> Result<(), Self::Error> {
        for (bit, line) in self.iter_mut().enumerate() {
            if pattern & (1 << bit) != 0 {
                line.set_high()?;
            } else {
                line.set_low()?;
            }
        }
        Ok(())
    }
}

#[cfg(target_arch = "avr")]
pub use self::avr::{Input, Output, Pin, Port, PortRegisters, Quasi};

#[cfg(target_arch = "avr")]
mod avr {
    use super::SegmentBus;
    use avr_device::atmega128a::{PORTA, PORTB, PORTC, PORTD};
    use core::convert::Infallible;
    use core::marker::PhantomData;
    use embedded_hal::digital::v2::{InputPin, OutputPin};

    pub trait PinMode {}
    pub struct Input;
    pub struct Output;
    /// Pulled up when high, sinking when low, readable either way.
    pub struct Quasi;
    impl PinMode for Input {}
    impl PinMode for Output {}
    impl PinMode for Quasi {}

    pub trait PortRegisters {
        fn set_port(mask: u8, high: bool);
        fn set_direction(mask: u8, output: bool);
        fn read_pins() -> u8;
        fn write_port(value: u8);
    }

    macro_rules! impl_port {
        ($PORT:ident, $port:ident, $ddr:ident, $pin:ident) => {
            impl PortRegisters for $PORT {
                #[inline]
                fn set_port(mask: u8, high: bool) {
                    unsafe {
                        (*$PORT::ptr()).$port.modify(|r, w| {
                            w.bits(if high { r.bits() | mask } else { r.bits() & !mask })
                        });
                    }
                }

                #[inline]
                fn set_direction(mask: u8, output: bool) {
                    unsafe {
                        (*$PORT::ptr()).$ddr.modify(|r, w| {
                            w.bits(if output { r.bits() | mask } else { r.bits() & !mask })
                        });
                    }
                }

                #[inline]
                fn read_pins() -> u8 {
                    unsafe { (*$PORT::ptr()).$pin.read().bits() }
                }

                #[inline]
                fn write_port(value: u8) {
                    unsafe { (*$PORT::ptr()).$port.write(|w| w.bits(value)) }
                }
            }
        };
    }

    impl_port!(PORTA, porta, ddra, pina);
    impl_port!(PORTB, portb, ddrb, pinb);
    impl_port!(PORTC, portc, ddrc, pinc);
    impl_port!(PORTD, portd, ddrd, pind);

    /// One line of `PORT`, selected at runtime so lines of a port share a type.
    pub struct Pin<PORT, MODE> {
        mask: u8,
        _port: PhantomData<PORT>,
        _mode: PhantomData<MODE>,
    }

    impl<PORT: PortRegisters, MODE: PinMode> Pin<PORT, MODE> {
        fn with_mask(pin: u8) -> Self {
            Self {
                mask: 1 << pin,
                _port: PhantomData,
                _mode: PhantomData,
            }
        }
    }

    impl<PORT: PortRegisters> Pin<PORT, Output> {
        /// Push-pull output, starting low.
        pub fn output(pin: u8) -> Self {
            let p = Self::with_mask(pin);
            PORT::set_port(p.mask, false);
            PORT::set_direction(p.mask, true);
            p
        }
    }

    impl<PORT: PortRegisters> Pin<PORT, Input> {
        /// Input with the internal pull-up enabled.
        pub fn input_pull_up(pin: u8) -> Self {
            let p = Self::with_mask(pin);
            PORT::set_direction(p.mask, false);
            PORT::set_port(p.mask, true);
            p
        }
    }

    impl<PORT: PortRegisters> Pin<PORT, Quasi> {
        /// Quasi-bidirectional line, starting released (pulled high).
        pub fn quasi(pin: u8) -> Self {
            let p = Self::with_mask(pin);
            PORT::set_direction(p.mask, false);
            PORT::set_port(p.mask, true);
            p
        }
    }

    impl<PORT: PortRegisters> OutputPin for Pin<PORT, Output> {
        type Error = Infallible;

        #[inline]
        fn set_high(&mut self) -> Result<(), Infallible> {
            PORT::set_port(self.mask, true);
            Ok(())
        }

        #[inline]
        fn set_low(&mut self) -> Result<(), Infallible> {
            PORT::set_port(self.mask, false);
            Ok(())
        }
    }

    impl<PORT: PortRegisters> OutputPin for Pin<PORT, Quasi> {
        type Error = Infallible;

        fn set_high(&mut self) -> Result<(), Infallible> {
            // Release: input with pull-up
            PORT::set_direction(self.mask, false);
            PORT::set_port(self.mask, true);
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), Infallible> {
            PORT::set_port(self.mask, false);
            PORT::set_direction(self.mask, true);
            Ok(())
        }
    }

    impl<PORT: PortRegisters, MODE: PinMode> InputPin for Pin<PORT, MODE> {
        type Error = Infallible;

        #[inline]
        fn is_high(&self) -> Result<bool, Infallible> {
            Ok(PORT::read_pins() & self.mask != 0)
        }

        #[inline]
        fn is_low(&self) -> Result<bool, Infallible> {
            Ok(PORT::read_pins() & self.mask == 0)
        }
    }

    /// A whole port driven as one 8-bit output bus.
    pub struct Port<PORT> {
        _port: PhantomData<PORT>,
    }

    impl<PORT: PortRegisters> Port<PORT> {
        pub fn output(initial: u8) -> Self {
            PORT::write_port(initial);
            PORT::set_direction(0xFF, true);
            Self { _port: PhantomData }
        }
    }

    impl<PORT: PortRegisters> SegmentBus for Port<PORT> {
        type Error = Infallible;

        #[inline]
        fn write(&mut self, pattern: u8) -> Result<(), Infallible> {
            PORT::write_port(pattern);
            Ok(())
        }
    }
}
