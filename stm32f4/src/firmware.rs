//! Board bring-up and the main loop.

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::time::Hertz;
use embassy_time::{Delay, Instant, Timer};
use static_cell::StaticCell;
use tft_common::colors::BLACK;
use tft_common::controller::Panel;
use tft_common::display::Lcd;
use tft_common::font::{FontFace, FontSize, ProFontSource, Text};
use tft_common::input::{Flow, KeyQueue};
use tft_common::scope::ScopeScreen;
use tft_common::screen::{Application, Backing, Overlay, Screen, draw_splash, run_once};
use tft_common::signal::{SyntheticScope, SyntheticSweep};
use tft_common::surface::PixelSurface;
use tft_common::sweep::SweepScreen;
use tft_stm32f4::config::{BOARD, KEY_DEBOUNCE_MS, KEYPAD_I2C_HZ, LCD_COMMAND_ADDR, LCD_DATA_ADDR, SPLASH_MS};
use tft_stm32f4::keypad::{KeyInterrupt, Zlg7290};
use tft_stm32f4::log_buffer::draw_log;
use {defmt_rtt as _, panic_probe as _};

use crate::dma::DmaTransfer;
use crate::fsmc::{self, FsmcBus};
use crate::logging::LOG_BUFFER;

type BoardLcd = Lcd<Panel<FsmcBus>>;
type BoardScreen = Screen<'static, Panel<FsmcBus>, DmaTransfer>;
type Scope = ScopeScreen<ProFontSource, SyntheticScope>;
type Sweep = SweepScreen<ProFontSource, SyntheticSweep>;

static SCOPE: StaticCell<Scope> = StaticCell::new();
static SWEEP: StaticCell<Sweep> = StaticCell::new();

/// 168 MHz from the 8 MHz crystal, 48 MHz for USB.
fn clock_config() -> embassy_stm32::Config {
    use embassy_stm32::rcc::{
        AHBPrescaler,
        APBPrescaler,
        Hse,
        HseMode,
        Pll,
        PllMul,
        PllPDiv,
        PllPreDiv,
        PllQDiv,
        PllSource,
        Sysclk,
    };

    let mut config = embassy_stm32::Config::default();
    config.rcc.hse = Some(Hse {
        freq: Hertz(8_000_000),
        mode: HseMode::Oscillator,
    });
    config.rcc.pll_src = PllSource::HSE;
    config.rcc.pll = Some(Pll {
        prediv: PllPreDiv::DIV4,
        mul: PllMul::MUL168,
        divp: Some(PllPDiv::DIV2),
        divq: Some(PllQDiv::DIV7),
        divr: None,
    });
    config.rcc.ahb_pre = AHBPrescaler::DIV1;
    config.rcc.apb1_pre = APBPrescaler::DIV4;
    config.rcc.apb2_pre = APBPrescaler::DIV2;
    config.rcc.sys = Sysclk::PLL1_P;
    config
}

/// Stops here for good, keeping RTT alive.
async fn park() -> ! {
    loop {
        Timer::after_secs(3600).await;
    }
}

/// Replaces whatever is on the panel with the recent log lines.
fn show_log(lcd: &mut BoardLcd) {
    lcd.clear(BLACK);
    let mut text = Text::new(ProFontSource, FontFace::Sans, FontSize::Px16);
    if let Ok(log) = LOG_BUFFER.try_lock() {
        draw_log(lcd, &mut text, &log, 8, 8);
    }
}

fn start(
    app: Application,
    scope: &mut Scope,
    sweep: &mut Sweep,
    screen: &mut BoardScreen,
) {
    let result = match app {
        Application::Scope => scope.init(screen),
        Application::Sweep => sweep.init(screen),
    };
    if let Err(err) = result {
        log_error!("{:?} init failed: {}", app, err);
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_stm32::init(clock_config());
    log_info!("TFT firmware starting");

    let mut backlight = Output::new(p.PA6, Level::Low, Speed::Low);

    // SAFETY: runs once, before anything touches the FSMC windows.
    unsafe { fsmc::init() };
    // SAFETY: NE4 is mapped by fsmc::init and this is the only panel handle.
    let bus = unsafe { FsmcBus::new(LCD_COMMAND_ADDR, LCD_DATA_ADDR) };

    let mut lcd = Lcd::new(Panel::new(BOARD.panel, bus));
    if let Err(err) = lcd.init(BOARD.orientation, &mut Delay) {
        // Nothing can be shown on a panel that does not answer.
        log_error!("Panel init failed: {}", err);
        park().await;
    }
    backlight.set_high();
    log_info!("Panel {:?} ready, {}x{}", BOARD.panel, lcd.width(), lcd.height());

    draw_splash(&mut lcd, ProFontSource);
    Timer::after_millis(SPLASH_MS).await;

    let transfer = DmaTransfer::new(p.DMA2_CH0);
    let mut screen = match BOARD.backing {
        Backing::Direct => Screen::direct(lcd, transfer),
        // SAFETY: fsmc::init mapped NE3 and the framebuffer is its only user.
        Backing::Buffered => Screen::buffered(lcd, transfer, unsafe { fsmc::sram() }),
    };
    log_info!("Chart backing: {:?}", BOARD.backing);

    let (scope, sweep) = match (
        Scope::new(ProFontSource, SyntheticScope::default()),
        Sweep::new(ProFontSource, SyntheticSweep::default()),
    ) {
        (Ok(scope), Ok(sweep)) => (SCOPE.init(scope), SWEEP.init(sweep)),
        (Err(err), _) | (_, Err(err)) => {
            log_error!("Screen setup failed: {}", err);
            show_log(screen.lcd());
            park().await
        }
    };

    let mut keys = match KeyQueue::new() {
        Ok(keys) => keys,
        Err(err) => {
            log_error!("Key queue: {}", err);
            show_log(screen.lcd());
            park().await
        }
    };

    let mut i2c_config = i2c::Config::default();
    i2c_config.frequency = Hertz(KEYPAD_I2C_HZ);
    let mut keypad = Zlg7290::new(I2c::new_blocking(p.I2C1, p.PB6, p.PB7, i2c_config));
    let key_line = Input::new(p.PA0, Pull::Down);
    let mut key_interrupt = KeyInterrupt::new(KEY_DEBOUNCE_MS);

    let mut app = Application::default();
    start(app, scope, sweep, &mut screen);
    log_info!("Main loop starting");

    loop {
        let now_ms = Instant::now().as_millis();

        if key_interrupt.rising_edge(key_line.is_high(), now_ms) {
            match keypad.read_key() {
                Ok(Some(code)) => {
                    log_debug!("Key {}", code);
                    if !keys.push(code) {
                        log_warn!("Key queue full, dropped {}", code);
                    }
                }
                Ok(None) => {}
                Err(_) => log_warn!("Keypad read failed"),
            }
        }

        let (flow, delay_ms) = match app {
            Application::Scope => (run_once(scope, &mut screen, &mut keys, now_ms), scope.frame_delay_ms()),
            Application::Sweep => (run_once(sweep, &mut screen, &mut keys, now_ms), sweep.frame_delay_ms()),
        };
        match flow {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => {
                app = app.next();
                log_info!("Switching to {:?}", app);
                start(app, scope, sweep, &mut screen);
            }
            Err(err) => log_warn!("Frame failed: {}", err),
        }

        Timer::after_millis(delay_ms).await;
    }
}
