#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

#[cfg(target_arch = "avr")]
mod firmware {
    use panic_halt as _;

    use avr_device::atmega128a::{Peripherals, PORTA, PORTB, PORTC, PORTD, TC1, TC3, USART0};
    use avr_device::interrupt::{self, Mutex};
    use core::cell::RefCell;

    use freqgen_firmware::config::{BOARD_TIMING, DEBOUNCE_SPANS, DISPLAY_RELOAD};
    use freqgen_firmware::drivers::display::BLANK;
    use freqgen_firmware::drivers::{Debounce, Display, Keypad, KeypadInput, PinMatrix, SerialConsole};
    use freqgen_firmware::error::discharge;
    use freqgen_firmware::hal::{Countdown, DebounceTimer, Input, Output, Pin, Port, Prescaler, Quasi, Timer, Uart};
    use freqgen_firmware::logger::{Console, Event, EventSink};
    use freqgen_firmware::{Application, FrequencySynth, SharedState};

    type Synth = FrequencySynth<Timer<TC1>, Pin<PORTD, Output>, Pin<PORTD, Output>>;
    type Refresh = Display<Port<PORTC>, Pin<PORTA, Output>>;
    type App = Application<Timer<TC1>, Pin<PORTD, Output>, Pin<PORTD, Output>, Port<PORTC>, Pin<PORTA, Output>>;
    type Log = Console<SerialConsole<Uart<USART0>>>;

    // Global state for interrupt handling
    static SHARED: Mutex<RefCell<SharedState>> = Mutex::new(RefCell::new(SharedState::new()));
    static APP: Mutex<RefCell<Option<App>>> = Mutex::new(RefCell::new(None));
    static REFRESH_TIMER: Mutex<RefCell<Option<Timer<TC3>>>> = Mutex::new(RefCell::new(None));
    static LOG: Mutex<RefCell<Option<Log>>> = Mutex::new(RefCell::new(None));

    // INT0 on PD0, falling edge
    const ISC01: u8 = 1 << 1;
    const INT0_ENABLE: u8 = 1 << 0;

    #[avr_device::entry]
    fn main() -> ! {
        let dp = Peripherals::take().unwrap();

        // Segment bus on PORTC, digit enables on PA0-PA3
        let bus = Port::<PORTC>::output(BLANK);
        let enables = [0, 1, 2, 3].map(Pin::<PORTA, Output>::output);
        let display: Refresh = Display::new(bus, enables);

        // Output on PD7, indicator LED on PD6
        let synth: Synth = FrequencySynth::new(
            Timer::new(dp.TC1, Prescaler::Div8),
            Pin::<PORTD, Output>::output(7),
            Pin::<PORTD, Output>::output(6),
            BOARD_TIMING,
        );

        // Keypad rows on PB0-PB3, columns on PB4-PB7
        let rows = [0, 1, 2, 3].map(Pin::<PORTB, Quasi>::quasi);
        let columns = [4, 5, 6, 7].map(Pin::<PORTB, Quasi>::quasi);
        let mut keypad = KeypadInput::new(
            Keypad::new(PinMatrix::new(rows, columns)),
            Debounce::new(DebounceTimer::new(dp.TC0), DEBOUNCE_SPANS),
        );

        let mut refresh_timer = Timer::new(dp.TC3, Prescaler::Direct);
        refresh_timer.load(DISPLAY_RELOAD);
        let mut console = Console::new(SerialConsole::new(Uart::new(dp.USART0)));

        interrupt::free(|cs| {
            let mut app = Application::new(synth, display);
            discharge(app.start(&SHARED.borrow(cs).borrow(), &mut console));
            APP.borrow(cs).replace(Some(app));
            LOG.borrow(cs).replace(Some(console));
            REFRESH_TIMER.borrow(cs).replace(Some(refresh_timer));
        });

        // Control line on PD0 (INT0), idle high
        let _control = Pin::<PORTD, Input>::input_pull_up(0);
        unsafe {
            dp.EXINT.eicra.write(|w| w.bits(ISC01));
            dp.EXINT.eimsk.write(|w| w.bits(INT0_ENABLE));
        }

        interrupt::free(|cs| {
            if let Some(timer) = REFRESH_TIMER.borrow(cs).borrow_mut().as_mut() {
                timer.start();
            }
        });

        // Enable interrupts globally
        unsafe { avr_device::interrupt::enable() };

        loop {
            let Some(digit) = discharge(keypad.poll(&SHARED)) else {
                continue;
            };
            if cfg!(feature = "debug") {
                interrupt::free(|cs| {
                    let value = SHARED.borrow(cs).borrow().digits().value();
                    LOG.borrow(cs)
                        .borrow_mut()
                        .record(&Event::DigitEntered { digit, value });
                });
            }
        }
    }

    #[avr_device::interrupt(atmega128a)]
    fn INT0() {
        interrupt::free(|cs| {
            let mut state = SHARED.borrow(cs).borrow_mut();
            let mut log = LOG.borrow(cs).borrow_mut();
            if let Some(app) = APP.borrow(cs).borrow_mut().as_mut() {
                discharge(app.on_control_edge(&mut state, &mut *log));
            }
        });
    }

    #[avr_device::interrupt(atmega128a)]
    fn TIMER1_OVF() {
        interrupt::free(|cs| {
            if let Some(app) = APP.borrow(cs).borrow_mut().as_mut() {
                discharge(app.on_synth_overflow());
            }
        });
    }

    #[avr_device::interrupt(atmega128a)]
    fn TIMER3_OVF() {
        interrupt::free(|cs| {
            if let Some(timer) = REFRESH_TIMER.borrow(cs).borrow_mut().as_mut() {
                timer.load(DISPLAY_RELOAD);
            }
            let state = SHARED.borrow(cs).borrow();
            if let Some(app) = APP.borrow(cs).borrow_mut().as_mut() {
                discharge(app.on_display_tick(&state));
            }
        });
    }
}

// The control core is exercised by the library's unit tests on the host
#[cfg(not(target_arch = "avr"))]
fn main() {}
