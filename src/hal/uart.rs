#![allow(clippy::missing_safety_doc)]

use crate::config::{CPU_FREQ_HZ, UART_BAUD};
use avr_device::atmega128a::USART0;
use avr_device::interrupt::Mutex;
use core::cell::RefCell;
use core::convert::Infallible;
use core::marker::PhantomData;

// Buffer size must be power of 2 for efficient masking
const BUFFER_SIZE: usize = 64;
const BUFFER_MASK: usize = BUFFER_SIZE - 1;

const UBRR: u16 = (CPU_FREQ_HZ / (16 * UART_BAUD) - 1) as u16;

const TXEN: u8 = 1 << 3;
const UDRIE: u8 = 1 << 5;

pub struct Buffer {
    data: [u8; BUFFER_SIZE],
    write_idx: usize,
    read_idx: usize,
}

impl Buffer {
    const fn new() -> Self {
        Self {
            data: [0; BUFFER_SIZE],
            write_idx: 0,
            read_idx: 0,
        }
    }

    fn write(&mut self, byte: u8) -> bool {
        let next_write = (self.write_idx + 1) & BUFFER_MASK;
        if next_write != self.read_idx {
            self.data[self.write_idx] = byte;
            self.write_idx = next_write;
            true
        } else {
            false
        }
    }

    fn read(&mut self) -> Option<u8> {
        if self.read_idx != self.write_idx {
            let byte = self.data[self.read_idx];
            self.read_idx = (self.read_idx + 1) & BUFFER_MASK;
            Some(byte)
        } else {
            None
        }
    }

    fn is_empty(&self) -> bool {
        self.read_idx == self.write_idx
    }
}

// Drained by the data-register-empty interrupt
static TX_BUFFER: Mutex<RefCell<Buffer>> = Mutex::new(RefCell::new(Buffer::new()));

/// Interrupt-driven transmitter on USART0.
pub struct Uart<USART> {
    usart: PhantomData<USART>,
}

impl Uart<USART0> {
    pub fn new(_usart: USART0) -> Self {
        unsafe {
            let p = USART0::ptr();
            (*p).ubrr0h.write(|w| w.bits((UBRR >> 8) as u8));
            (*p).ubrr0l.write(|w| w.bits(UBRR as u8));
            (*p).ucsr0b.write(|w| w.bits(TXEN));
        }

        Self { usart: PhantomData }
    }
}

impl embedded_hal::serial::Write<u8> for Uart<USART0> {
    type Error = Infallible;

    fn write(&mut self, byte: u8) -> nb::Result<(), Infallible> {
        avr_device::interrupt::free(|cs| {
            if !TX_BUFFER.borrow(cs).borrow_mut().write(byte) {
                return Err(nb::Error::WouldBlock);
            }
            unsafe {
                (*USART0::ptr()).ucsr0b.modify(|r, w| w.bits(r.bits() | UDRIE));
            }
            Ok(())
        })
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        avr_device::interrupt::free(|cs| {
            if TX_BUFFER.borrow(cs).borrow().is_empty() {
                Ok(())
            } else {
                Err(nb::Error::WouldBlock)
            }
        })
    }
}

#[avr_device::interrupt(atmega128a)]
fn USART0_UDRE() {
    avr_device::interrupt::free(|cs| {
        if let Some(byte) = TX_BUFFER.borrow(cs).borrow_mut().read() {
            unsafe {
                (*USART0::ptr()).udr0.write(|w| w.bits(byte));
            }
        } else {
            // Buffer empty - disable TX interrupt
            unsafe {
                (*USART0::ptr()).ucsr0b.modify(|r, w| w.bits(r.bits() & !UDRIE));
            }
        }
    });
}
