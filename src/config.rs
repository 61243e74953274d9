//! Configuration constants for the frequency generator firmware

/// CPU frequency in Hz
pub const CPU_FREQ_HZ: u32 = 16_000_000;

/// UART baud rate
pub const UART_BAUD: u32 = 9600;

/// Native span of the 16-bit countdown timers, in timer cycles
pub const TIMER_RANGE: u32 = 1 << 16;

/// Full timer spans the keypad waits out after every accepted key
pub const DEBOUNCE_SPANS: u8 = 6;

/// Display timer reload: 512 cycles per refresh tick
pub const DISPLAY_RELOAD: u16 = 0xFE00;

/// Digits shown at power-up ("0001")
pub const INITIAL_DIGITS: [u8; 4] = [0, 0, 0, 1];

/// Timer cycle length and per-completion cost of the synthesis timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    /// Duration of one timer cycle in nanoseconds
    pub cycle_ns: u32,
    /// Cycles lost servicing one timer completion (entry, exit, reload)
    pub overhead_cycles: u32,
}

impl TimingConfig {
    /// 16 MHz part with a 12-clock machine cycle (0.75 us per count)
    pub const REFERENCE: Self = Self {
        cycle_ns: 750,
        overhead_cycles: 14,
    };

    /// ATmega128 Timer1 at clk/8 (0.5 us per count)
    pub const ATMEGA128: Self = Self {
        cycle_ns: 1_000_000_000 / (CPU_FREQ_HZ / 8),
        overhead_cycles: 8,
    };

    /// Half period of `freq_hz` in timer cycles, net of the completion overhead.
    ///
    /// Returns `None` for 0 Hz. A result that would go negative saturates at 0;
    /// with either preset that only happens far above 9999 Hz (50 kHz for
    /// `REFERENCE`, 125 kHz for `ATMEGA128`), so keypad entry never reaches it.
    pub const fn half_period_cycles(&self, freq_hz: u16) -> Option<u32> {
        if freq_hz == 0 {
            return None;
        }
        let half_period_us = 500_000 / freq_hz as u32;
        let cycles = half_period_us * 1000 / self.cycle_ns;
        Some(cycles.saturating_sub(self.overhead_cycles))
    }
}

/// Timing of the board this firmware is built for
#[cfg(feature = "atmega128")]
pub const BOARD_TIMING: TimingConfig = TimingConfig::ATMEGA128;

#[cfg(not(feature = "atmega128"))]
pub const BOARD_TIMING: TimingConfig = TimingConfig::REFERENCE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hz_has_no_half_period() {
        assert_eq!(TimingConfig::REFERENCE.half_period_cycles(0), None);
    }

    #[test]
    fn reference_half_periods() {
        let timing = TimingConfig::REFERENCE;
        // 500000 us / 0.75 us = 666666, less 14
        assert_eq!(timing.half_period_cycles(1), Some(666_652));
        // 405 us -> 540 cycles
        assert_eq!(timing.half_period_cycles(1234), Some(526));
        // 50 us -> 66 cycles
        assert_eq!(timing.half_period_cycles(9999), Some(52));
    }

    #[test]
    fn atmega_cycle_is_half_a_microsecond() {
        assert_eq!(TimingConfig::ATMEGA128.cycle_ns, 500);
        assert_eq!(TimingConfig::ATMEGA128.half_period_cycles(1000), Some(992));
    }

    #[test]
    fn overhead_larger_than_delay_clamps_to_zero() {
        let timing = TimingConfig {
            cycle_ns: 750,
            overhead_cycles: 100,
        };
        assert_eq!(timing.half_period_cycles(9999), Some(0));
    }
}
