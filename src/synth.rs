//! Square-wave synthesis on a 16-bit countdown timer
//!
//! The output flips once per half period. A half period that fits in one timer
//! span is a single TRIM chunk reloaded after every flip (short mode). A longer
//! one is chained: the timer free-runs through FULL chunks, then a TRIM chunk
//! covers the remainder, then the output flips (long mode).
//!
//! A FULL chunk relies on the timer rolling over to zero and continuing by
//! itself. Hardware that stops or reloads on rollover needs an explicit
//! `load(0)` after every FULL completion instead.

use crate::config::{TimingConfig, TIMER_RANGE};
use crate::error::Error;
use crate::hal::Countdown;
use crate::state::DigitBuffer;
use embedded_hal::digital::v2::OutputPin;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The half period is one TRIM chunk
    Short,
    /// The half period is FULL chunks plus one TRIM chunk
    Long,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Entire timer span, no reload
    Full,
    /// Partial span started from a reload value
    Trim,
}

/// Decomposition of one half period into timer chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    half_period: u32,
    extra_full: u32,
    trim_reload: u16,
}

impl ChunkPlan {
    /// Plans the half period of `freq_hz`; `None` for 0 Hz.
    pub fn for_frequency(freq_hz: u16, timing: &TimingConfig) -> Option<Self> {
        timing.half_period_cycles(freq_hz).map(Self::from_half_period)
    }

    /// Plans a half period of `cycles` timer cycles.
    ///
    /// The timer cannot complete in zero cycles, so a zero half period is run
    /// as a single one-cycle TRIM chunk.
    pub fn from_half_period(cycles: u32) -> Self {
        let effective = cycles.max(1);
        if effective <= TIMER_RANGE {
            return Self {
                half_period: cycles,
                extra_full: 0,
                trim_reload: (TIMER_RANGE - effective) as u16,
            };
        }

        // At least one FULL chunk; the TRIM chunk covers 1..=TIMER_RANGE cycles
        let full_chunks = (effective - 1) / TIMER_RANGE;
        let trim_cycles = effective - full_chunks * TIMER_RANGE;
        Self {
            half_period: cycles,
            extra_full: full_chunks - 1,
            trim_reload: (TIMER_RANGE - trim_cycles) as u16,
        }
    }

    pub fn mode(&self) -> Mode {
        if self.half_period <= TIMER_RANGE {
            Mode::Short
        } else {
            Mode::Long
        }
    }

    /// Requested half period in timer cycles
    #[inline]
    pub fn half_period(&self) -> u32 {
        self.half_period
    }

    /// FULL chunks that follow the first one in long mode
    #[inline]
    pub fn extra_full_chunks(&self) -> u32 {
        self.extra_full
    }

    #[inline]
    pub fn trim_reload(&self) -> u16 {
        self.trim_reload
    }

    #[inline]
    pub fn trim_cycles(&self) -> u32 {
        TIMER_RANGE - u32::from(self.trim_reload)
    }

    /// Half period the chunk sequence actually produces.
    pub fn realized_cycles(&self) -> u32 {
        match self.mode() {
            Mode::Short => self.trim_cycles(),
            Mode::Long => (self.extra_full + 1) * TIMER_RANGE + self.trim_cycles(),
        }
    }
}

/// What a timer completion asks of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// Flip the output and indicator
    pub flip: bool,
    /// Count to load into the timer, if any
    pub reload: Option<u16>,
}

/// Position within the current half period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkState {
    plan: ChunkPlan,
    kind: ChunkKind,
    remaining_full: u32,
}

impl ChunkState {
    /// State right after activation, with the count the timer must start from.
    pub fn start(plan: ChunkPlan) -> (Self, u16) {
        match plan.mode() {
            Mode::Short => (
                Self {
                    plan,
                    kind: ChunkKind::Trim,
                    remaining_full: 0,
                },
                plan.trim_reload,
            ),
            Mode::Long => (
                Self {
                    plan,
                    kind: ChunkKind::Full,
                    remaining_full: plan.extra_full,
                },
                0,
            ),
        }
    }

    /// Advances past the chunk that just completed.
    pub fn complete_chunk(&mut self) -> Step {
        match (self.plan.mode(), self.kind) {
            (Mode::Short, _) => Step {
                flip: true,
                reload: Some(self.plan.trim_reload),
            },
            (Mode::Long, ChunkKind::Full) if self.remaining_full > 0 => {
                // Timer rolls into the next FULL chunk unassisted
                self.remaining_full -= 1;
                Step {
                    flip: false,
                    reload: None,
                }
            }
            (Mode::Long, ChunkKind::Full) => {
                self.kind = ChunkKind::Trim;
                Step {
                    flip: false,
                    reload: Some(self.plan.trim_reload),
                }
            }
            (Mode::Long, ChunkKind::Trim) => {
                self.kind = ChunkKind::Full;
                self.remaining_full = self.plan.extra_full;
                Step {
                    flip: true,
                    reload: Some(0),
                }
            }
        }
    }

    #[inline]
    pub fn plan(&self) -> &ChunkPlan {
        &self.plan
    }

    #[inline]
    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    #[inline]
    pub fn remaining_full(&self) -> u32 {
        self.remaining_full
    }
}

/// Drives the output and indicator lines from timer completions.
pub struct FrequencySynth<T, O, I> {
    timer: T,
    output: O,
    indicator: I,
    timing: TimingConfig,
    level: bool,
    chunk: Option<ChunkState>,
}

impl<T, O, I, E> FrequencySynth<T, O, I>
where
    T: Countdown,
    O: OutputPin<Error = E>,
    I: OutputPin<Error = E>,
{
    /// Takes over lines that are already low and a stopped timer.
    pub fn new(timer: T, output: O, indicator: I, timing: TimingConfig) -> Self {
        Self {
            timer,
            output,
            indicator,
            timing,
            level: false,
            chunk: None,
        }
    }

    /// Starts toggling at the frequency held in `digits`.
    ///
    /// Returns `None` without touching the timer when `digits` reads 0 Hz.
    pub fn activate(&mut self, digits: &DigitBuffer) -> Result<Option<ChunkPlan>, Error<E>> {
        let Some(plan) = ChunkPlan::for_frequency(digits.value(), &self.timing) else {
            return Ok(None);
        };

        let (state, reload) = ChunkState::start(plan);
        self.chunk = Some(state);
        self.timer.load(reload);
        self.timer.start();
        Ok(Some(plan))
    }

    /// Timer completion handler.
    pub fn on_overflow(&mut self) -> Result<(), Error<E>> {
        // Completion latched just before a stop
        let Some(state) = self.chunk.as_mut() else {
            return Ok(());
        };

        let step = state.complete_chunk();
        if step.flip {
            self.flip()?;
        }
        if let Some(reload) = step.reload {
            self.timer.load(reload);
        }
        Ok(())
    }

    /// Stops the timer and drives both lines low.
    pub fn deactivate(&mut self) -> Result<(), Error<E>> {
        self.timer.stop();
        self.chunk = None;
        self.level = false;
        self.output.set_low()?;
        self.indicator.set_low()?;
        Ok(())
    }

    fn flip(&mut self) -> Result<(), Error<E>> {
        self.level = !self.level;
        if self.level {
            self.output.set_high()?;
            self.indicator.set_high()?;
        } else {
            self.output.set_low()?;
            self.indicator.set_low()?;
        }
        Ok(())
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.chunk.is_some()
    }

    /// Current level of the output line
    #[inline]
    pub fn level(&self) -> bool {
        self.level
    }

    #[inline]
    pub fn chunk_state(&self) -> Option<&ChunkState> {
        self.chunk.as_ref()
    }
}
