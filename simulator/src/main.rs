//! Desktop simulator for the oscilloscope and frequency-sweep screens.
//!
//! Runs the same `tft-common` code as the firmware against an emulated
//! NT35510: every pixel goes through the controller driver and the bus
//! register stream, and the emulated GRAM is shown in an SDL window.
//! Signals come from the synthetic front ends.
//!
//! ```bash
//! cargo run -p tft-simulator              # chart drawn straight to the panel
//! cargo run -p tft-simulator -- --buffered   # chart through a framebuffer
//! ```

// Crate-level lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod keys;
mod panel;
mod timing;

use std::thread;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use tft_common::colors::BLACK;
use tft_common::controller::{DisplayController, Orientation, Panel, PanelKind};
use tft_common::display::Lcd;
use tft_common::font::ProFontSource;
use tft_common::framebuffer::PolledTransfer;
use tft_common::input::{Flow, KeyQueue};
use tft_common::scope::ScopeScreen;
use tft_common::screen::{Application, Backing, Overlay, Screen, draw_splash, run_once};
use tft_common::signal::{SyntheticScope, SyntheticSweep};
use tft_common::surface::PixelSurface;
use tft_common::sweep::SweepScreen;

use crate::keys::{HELP, keypad_code};
use crate::panel::EmulatedBus;
use crate::timing::{Clock, SPLASH_TIME, StdDelay};

type SimLcd = Lcd<Panel<EmulatedBus>>;
type SimScreen<'fb> = Screen<'fb, Panel<EmulatedBus>, PolledTransfer>;
type Scope = ScopeScreen<ProFontSource, SyntheticScope>;
type Sweep = SweepScreen<ProFontSource, SyntheticSweep>;

/// Logical size of the NT35510 in landscape.
const PANEL_SIZE: (u16, u16) = (800, 480);

fn start(
    app: Application,
    scope: &mut Scope,
    sweep: &mut Sweep,
    screen: &mut SimScreen<'_>,
) {
    let result = match app {
        Application::Scope => scope.init(screen),
        Application::Sweep => sweep.init(screen),
    };
    if let Err(err) = result {
        eprintln!("[ERROR] {app:?} init failed: {err}");
    }
}

fn show(
    screen: &mut SimScreen<'_>,
    display: &mut SimulatorDisplay<Rgb565>,
    window: &mut Window,
) {
    screen.lcd().controller().bus().render(display);
    window.update(display);
}

fn main() {
    let backing = if std::env::args().any(|arg| arg == "--buffered") { Backing::Buffered } else { Backing::Direct };

    let bus = EmulatedBus::new(PANEL_SIZE.0, PANEL_SIZE.1);
    let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(bus.size());
    let output_settings = OutputSettingsBuilder::new().scale(1).build();
    let mut window = Window::new("TFT Scope Sim", &output_settings);

    display.clear(BLACK).ok();
    window.update(&display);
    println!("{HELP}\n");

    let mut lcd = Lcd::new(Panel::new(PanelKind::Nt35510, bus));
    if let Err(err) = lcd.init(Orientation::Deg270, &mut StdDelay) {
        eprintln!("[ERROR] Panel init failed: {err}");
        return;
    }
    println!("[INFO] Panel {:?} ready, {}x{}", lcd.controller().kind(), lcd.width(), lcd.height());

    draw_splash(&mut lcd, ProFontSource);
    lcd.controller().bus().render(&mut display);
    window.update(&display);
    thread::sleep(SPLASH_TIME);

    // Stands in for the external SRAM.
    let mut memory = vec![0u16; usize::from(PANEL_SIZE.0) * usize::from(PANEL_SIZE.1)];
    let mut screen = match backing {
        Backing::Direct => Screen::direct(lcd, PolledTransfer),
        Backing::Buffered => Screen::buffered(lcd, PolledTransfer, &mut memory),
    };
    println!("[INFO] Chart backing: {backing:?}");

    let (mut scope, mut sweep, mut keys) = match (
        Scope::new(ProFontSource, SyntheticScope::default()),
        Sweep::new(ProFontSource, SyntheticSweep::default()),
        KeyQueue::new(),
    ) {
        (Ok(scope), Ok(sweep), Ok(keys)) => (scope, sweep, keys),
        (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
            eprintln!("[ERROR] Screen setup failed: {err}");
            return;
        }
    };

    let clock = Clock::new();
    let mut app = Application::default();
    start(app, &mut scope, &mut sweep, &mut screen);

    loop {
        let frame_start = Instant::now();

        for ev in window.events() {
            match ev {
                SimulatorEvent::Quit => return,
                SimulatorEvent::KeyDown { keycode, repeat, .. } if !repeat => {
                    if let Some(code) = keypad_code(&keycode.name())
                        && !keys.push(code)
                    {
                        println!("[WARN] Key queue full, dropped {code}");
                    }
                }
                _ => {}
            }
        }

        let now_ms = clock.now_ms();
        let (flow, delay_ms) = match app {
            Application::Scope => (run_once(&mut scope, &mut screen, &mut keys, now_ms), scope.frame_delay_ms()),
            Application::Sweep => (run_once(&mut sweep, &mut screen, &mut keys, now_ms), sweep.frame_delay_ms()),
        };
        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => {
                app = app.next();
                println!("[INFO] Switching to {app:?}");
                start(app, &mut scope, &mut sweep, &mut screen);
            }
            Err(err) => println!("[WARN] Frame failed: {err}"),
        }

        show(&mut screen, &mut display, &mut window);

        let frame_time = Duration::from_millis(delay_ms);
        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }
}
