//! Macro-pad firmware entry point (STM32F411CE)
//!
//! Boot order: clocks → watchdog → encoder task → buttons → OLED → HID
//! bridge → engine. After that the main loop runs one engine pass per
//! scheduler period and pets the watchdog.
//!
//! Two executors: the thread-mode one runs `main`, an interrupt executor on
//! the SPI3 vector runs the encoder task so blocking I2C flushes in the main
//! loop never delay quadrature decoding.

#![no_std]
#![no_main]

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::dma::NoDma;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Pull};
use embassy_stm32::i2c::{self, I2c};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority};
use embassy_stm32::time::Hertz;
use embassy_stm32::usart::{self, UartTx};
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_time::{Instant, Ticker};

use dispatch::Engine;
use firmware::board::{self, PROFILE};
use firmware::input::{spawn_encoder_task, GpioButtons, ENCODER_TICKS};
use firmware::{modes, SerialHidBridge, Ssd1306, StatusRenderer};

use defmt_rtt as _;
use panic_probe as _;

bind_interrupts!(struct Irqs {
    I2C1_EV => i2c::EventInterruptHandler<peripherals::I2C1>;
    I2C1_ER => i2c::ErrorInterruptHandler<peripherals::I2C1>;
});

static ENCODER_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SPI3() {
    // SAFETY: SPI3 is not enabled on this board; the vector is only pended
    // by ENCODER_EXECUTOR.
    unsafe { ENCODER_EXECUTOR.on_interrupt() }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    defmt::info!("macro-pad firmware v{=str}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());

    let mut watchdog = IndependentWatchdog::new(p.IWDG, board::WATCHDOG_TIMEOUT_US);
    watchdog.unleash();
    defmt::info!(
        "IWDG armed: timeout={=u32}ms",
        board::WATCHDOG_TIMEOUT_US / 1_000
    );

    let timing = PROFILE.timing();
    defmt::info!("timing profile: {}", PROFILE);

    // ------------------------------------------------------------------
    // Encoder (EXTI on both channels, interrupt executor)
    // ------------------------------------------------------------------
    interrupt::SPI3.set_priority(Priority::from(board::ENCODER_EXECUTOR_PRIORITY));
    let encoder_spawner = ENCODER_EXECUTOR.start(interrupt::SPI3);
    let channel_a = ExtiInput::new(Input::new(p.PB4, Pull::Up).degrade(), p.EXTI4.degrade());
    let channel_b = ExtiInput::new(Input::new(p.PB5, Pull::Up).degrade(), p.EXTI5.degrade());
    if spawn_encoder_task(encoder_spawner, channel_a, channel_b).is_err() {
        defmt::panic!("failed to spawn encoder task");
    }

    // ------------------------------------------------------------------
    // Buttons (polled)
    // ------------------------------------------------------------------
    let buttons = GpioButtons::new(
        Input::new(p.PB12, Pull::Up).degrade(),
        Input::new(p.PB13, Pull::Up).degrade(),
        Input::new(p.PB14, Pull::Up).degrade(),
        Input::new(p.PB15, Pull::Up).degrade(),
        Input::new(p.PA8, Pull::Up).degrade(),
    );

    // ------------------------------------------------------------------
    // OLED
    // ------------------------------------------------------------------
    let bus = I2c::new(
        p.I2C1,
        p.PB6, // SCL
        p.PB7, // SDA
        Irqs,
        NoDma,
        NoDma,
        Hertz(board::OLED_I2C_HZ),
        i2c::Config::default(),
    );
    let mut oled = Ssd1306::new(bus, board::OLED_I2C_ADDRESS);
    match oled.init() {
        Ok(()) => defmt::info!("OLED ready at {=u8:#x}", board::OLED_I2C_ADDRESS),
        // Keep running: the pad is usable blind, and the renderer counts
        // further failures.
        Err(e) => defmt::error!("OLED init failed: {}", e),
    }
    let renderer = StatusRenderer::new(oled);

    // ------------------------------------------------------------------
    // HID bridge
    // ------------------------------------------------------------------
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = board::BRIDGE_BAUD;
    let Ok(link) = UartTx::new_blocking(p.USART1, p.PA9, uart_config) else {
        defmt::panic!("USART1 rejected {=u32} baud", board::BRIDGE_BAUD);
    };
    let bridge = SerialHidBridge::new(link, timing.mouse_scroll_amount);

    // ------------------------------------------------------------------
    // Engine
    // ------------------------------------------------------------------
    let table = match modes::table() {
        Ok(table) => table,
        Err(e) => defmt::panic!("mode table rejected: {}", e),
    };
    let mut engine = match Engine::new(
        table,
        timing,
        &ENCODER_TICKS,
        bridge,
        renderer,
        Instant::now(),
    ) {
        Ok(engine) => engine,
        Err(e) => defmt::panic!("timing config rejected: {}", e),
    };
    defmt::info!(
        "{=usize} modes, starting in {=str}",
        engine.table().len(),
        engine.table().mode(engine.active_mode()).name
    );

    let mut ticker = Ticker::every(timing.scheduler_period());
    let mut next_drift = Instant::MIN;
    loop {
        ticker.next().await;
        let now = Instant::now();
        engine.run_pass(&buttons, now);

        if engine.is_idle() {
            if now >= next_drift {
                engine.display_mut().drift();
                next_drift = now
                    .checked_add(board::SCREENSAVER_DRIFT)
                    .unwrap_or(Instant::MAX);
            }
        } else {
            next_drift = Instant::MIN;
        }

        watchdog.pet();
    }
}
