mod config;
mod startup;

use crate::config::{Backend, Config};
use crate::startup::init_display;
use charlcd_gpio::GpioDriver;
use charlcd_gpio::delay::StdDelay;
use charlcd_gpio::gpiod::GpiodDriver;
use charlcd_gpio::lcd::hd44780::ShiftDirection;
use charlcd_gpio::lcd::hd44780::latch::LatchDecoder;
use charlcd_gpio::raw::RawGpioDriver;
use charlcd_gpio::sim::{SimClock, SimDelay, SimGpioDriver};
use dotenv::dotenv;
use log::{debug, info};
use std::thread;
use std::time::Duration;
use sysinfo::System;

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    const UNKNOWN_STR: &str = "???";

    info!("charlcd starting...");
    info!(
        "Running on {} ({}), kernel {}",
        System::host_name().as_deref().unwrap_or(UNKNOWN_STR),
        System::long_os_version().as_deref().unwrap_or(UNKNOWN_STR),
        System::kernel_version().as_deref().unwrap_or(UNKNOWN_STR),
    );

    let config = Config::load()?;
    debug!("{:?}", config);

    info!(
        "LCD @ RS: {}, E: {}, Data: {:?}, backend: {:?}",
        config.pins.register_select, config.pins.enable, config.pins.data, config.backend
    );

    match config.backend {
        Backend::Gpiomem => run(RawGpioDriver::new_gpiomem()?, &config),
        Backend::Mem => run(RawGpioDriver::new_mem()?, &config),
        Backend::Gpiod => run(GpiodDriver::open(&config.gpiochip)?, &config),
        Backend::Sim => simulate(&config),
    }
}

fn run<G: GpioDriver>(gpio: G, config: &Config) -> eyre::Result<()> {
    debug!("{:?} initialized.", gpio);

    // Give the panel time to come out of its own power-on reset
    thread::sleep(Duration::from_millis(config.startup_delay_ms));

    let mut lcd = init_display(gpio, StdDelay, config)?;
    info!("LCD initialized.");

    thread::sleep(Duration::from_millis(config.startup_delay_ms));

    if config.heartbeat_ms == 0 {
        info!("Heartbeat disabled, idling.");
        loop {
            thread::park();
        }
    }

    info!("Starting heartbeat every {} ms...", config.heartbeat_ms);
    loop {
        thread::sleep(Duration::from_millis(config.heartbeat_ms));
        lcd.scroll_display(ShiftDirection::Left)?;
    }
}

/// Runs the startup sequence against simulated pins and logs what the controller would have latched.
fn simulate(config: &Config) -> eyre::Result<()> {
    let clock = SimClock::new();
    let gpio = SimGpioDriver::new(clock.clone());

    init_display(&gpio, SimDelay::new(clock.clone()), config)?;

    let transfers = LatchDecoder::new(config.pins).decode(&gpio.events());
    for transfer in &transfers {
        info!("{:>10} ns  {}", transfer.at_ns, transfer);
    }
    info!(
        "{} transfers in {:.3} ms of bus time.",
        transfers.len(),
        clock.now_ns() as f64 / 1_000_000.0
    );

    Ok(())
}
