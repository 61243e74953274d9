pub mod gpio;
pub mod timer;

#[cfg(target_arch = "avr")]
pub mod uart;

// Re-export commonly used types
pub use gpio::SegmentBus;
pub use timer::{Countdown, SpanWait};

#[cfg(target_arch = "avr")]
pub use gpio::{Input, Output, Pin, Port, Quasi};
#[cfg(target_arch = "avr")]
pub use timer::{DebounceTimer, Prescaler, Timer};
#[cfg(target_arch = "avr")]
pub use uart::Uart;
