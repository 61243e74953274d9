//! Event logging over any `ufmt` writer
//!
//! Only the control edge and the foreground loop record events. The timer
//! completion and display handlers never log, so their timing stays fixed.

use crate::control::Transition;
use crate::state::{Digit, DigitBuffer};
use crate::synth::Mode;
use ufmt::{uDisplay, uWrite, uwrite, uwriteln, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Boot { digits: DigitBuffer },
    DigitEntered { digit: Digit, value: u16 },
    Activated {
        freq_hz: u16,
        mode: Mode,
        half_period: u32,
        extra_full: u32,
        trim_reload: u16,
    },
    ActivationRefused,
    Deactivated,
}

impl From<Transition> for Event {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::Activated { freq_hz, plan } => Event::Activated {
                freq_hz,
                mode: plan.mode(),
                half_period: plan.half_period(),
                extra_full: plan.extra_full_chunks(),
                trim_reload: plan.trim_reload(),
            },
            Transition::Refused => Event::ActivationRefused,
            Transition::Deactivated => Event::Deactivated,
        }
    }
}

impl uDisplay for Event {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match *self {
            Event::Boot { digits } => {
                let [a, b, c, d] = digits.digits();
                uwrite!(f, "[BOOT] digits {}{}{}{}", a, b, c, d)
            }
            Event::DigitEntered { digit, value } => {
                uwrite!(f, "[KEY] {} -> {}", digit, value)
            }
            Event::Activated {
                freq_hz,
                mode,
                half_period,
                extra_full,
                trim_reload,
            } => {
                let mode = match mode {
                    Mode::Short => "short",
                    Mode::Long => "long",
                };
                uwrite!(
                    f,
                    "[ON] {} Hz, {} mode, {} cycles, {}+1 full, trim ",
                    freq_hz,
                    mode,
                    half_period,
                    extra_full
                )?;
                write_hex(f, trim_reload)
            }
            Event::ActivationRefused => f.write_str("[ON] refused: 0 Hz"),
            Event::Deactivated => f.write_str("[OFF] output low, digits cleared"),
        }
    }
}

fn write_hex<W: uWrite + ?Sized>(f: &mut Formatter<'_, W>, value: u16) -> Result<(), W::Error> {
    const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
    let mut text = [b'0', b'x', 0, 0, 0, 0];
    for (i, slot) in text[2..].iter_mut().enumerate() {
        *slot = HEX_CHARS[usize::from((value >> (12 - 4 * i)) & 0xF)];
    }
    // Only ASCII was written
    f.write_str(core::str::from_utf8(&text).unwrap_or("0x????"))
}

/// Destination for log events.
pub trait EventSink {
    fn record(&mut self, event: &Event);
}

/// Discards everything.
impl EventSink for () {
    #[inline]
    fn record(&mut self, _event: &Event) {}
}

/// Records into the sink when one has been installed.
impl<S: EventSink> EventSink for Option<S> {
    fn record(&mut self, event: &Event) {
        if let Some(sink) = self {
            sink.record(event);
        }
    }
}

/// Writes one line per event.
pub struct Console<W> {
    writer: W,
}

impl<W: uWrite> Console<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub(crate) fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: uWrite> EventSink for Console<W> {
    fn record(&mut self, event: &Event) {
        // A failing log line must not disturb the caller
        let _ = uwriteln!(&mut self.writer, "{}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::ChunkPlan;
    use core::convert::Infallible;
    use std::string::String;

    #[derive(Default)]
    struct Text(String);

    impl uWrite for Text {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    fn line(event: Event) -> String {
        let mut console = Console::new(Text::default());
        console.record(&event);
        console.writer().0.clone()
    }

    #[test]
    fn boot_line_shows_digits() {
        assert_eq!(line(Event::Boot { digits: DigitBuffer::POWER_ON }), "[BOOT] digits 0001\n");
    }

    #[test]
    fn activation_line_describes_the_plan() {
        let transition = Transition::Activated {
            freq_hz: 10,
            plan: ChunkPlan::from_half_period(66_652),
        };
        assert_eq!(
            line(transition.into()),
            "[ON] 10 Hz, long mode, 66652 cycles, 0+1 full, trim 0xFBA4\n"
        );
    }

    #[test]
    fn digit_line_shows_new_value() {
        let event = Event::DigitEntered {
            digit: Digit::new(7).unwrap(),
            value: 17,
        };
        assert_eq!(line(event), "[KEY] 7 -> 17\n");
    }

    #[test]
    fn refused_and_deactivated_lines() {
        assert_eq!(line(Transition::Refused.into()), "[ON] refused: 0 Hz\n");
        assert_eq!(line(Transition::Deactivated.into()), "[OFF] output low, digits cleared\n");
    }

    #[test]
    fn missing_sink_discards() {
        let mut sink: Option<Console<Text>> = None;
        sink.record(&Event::Deactivated);
        ().record(&Event::Deactivated);
    }
}
