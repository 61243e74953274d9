use embedded_hal::serial::Write;

/// Line-oriented text output over a serial transmitter.
///
/// Writes never block: when the transmitter is full the byte is dropped and
/// counted, so the console is usable from interrupt handlers.
pub struct SerialConsole<S> {
    serial: S,
    dropped: u16,
}

impl<S: Write<u8>> SerialConsole<S> {
    pub fn new(serial: S) -> Self {
        Self { serial, dropped: 0 }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<(), S::Error> {
        match self.serial.write(byte) {
            Ok(()) => Ok(()),
            Err(nb::Error::WouldBlock) => {
                self.dropped = self.dropped.saturating_add(1);
                Ok(())
            }
            Err(nb::Error::Other(e)) => Err(e),
        }
    }

    /// Bytes lost to a full transmitter since power-up
    #[cfg(test)]
    pub(crate) fn dropped(&self) -> u16 {
        self.dropped
    }
}

impl<S: Write<u8>> ufmt::uWrite for SerialConsole<S> {
    type Error = S::Error;

    // Terminals expect CR LF
    fn write_str(&mut self, s: &str) -> Result<(), S::Error> {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.write_byte(b'\r')?;
            }
            self.write_byte(byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::vec::Vec;

    /// Transmitter with room for `capacity` bytes.
    struct Fifo {
        sent: Vec<u8>,
        capacity: usize,
    }

    impl Write<u8> for Fifo {
        type Error = Infallible;

        fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
            if self.sent.len() == self.capacity {
                return Err(nb::Error::WouldBlock);
            }
            self.sent.push(byte);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Infallible> {
            Ok(())
        }
    }

    fn console(capacity: usize) -> SerialConsole<Fifo> {
        SerialConsole::new(Fifo {
            sent: Vec::new(),
            capacity,
        })
    }

    #[test]
    fn newlines_become_crlf() {
        let mut console = console(64);
        ufmt::uwrite!(&mut console, "f={}\n", 440u16).unwrap();
        assert_eq!(console.serial.sent, b"f=440\r\n");
    }

    #[test]
    fn full_transmitter_drops_instead_of_blocking() {
        let mut console = console(3);
        ufmt::uWrite::write_str(&mut console, "hello").unwrap();
        assert_eq!(console.serial.sent, b"hel");
        assert_eq!(console.dropped(), 2);
    }
}
