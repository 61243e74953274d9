pub mod display;
pub mod keypad;
pub mod serial_console;

pub use display::{Display, Phase, SEGMENT_TABLE};
pub use keypad::{Debounce, Keypad, KeypadInput, MatrixLines, PinMatrix};
pub use serial_console::SerialConsole;
