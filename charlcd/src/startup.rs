use crate::config::Config;
use charlcd_gpio::GpioDriver;
use charlcd_gpio::lcd::hd44780::{BitMode, FontSize, GpioHd44780Bus, Hd44780Display, LineCount};
use embedded_hal::delay::DelayNs;
use log::debug;

pub type GpioDisplay<G, D> = Hd44780Display<GpioHd44780Bus<G, D>>;

/// Brings the display up in the order the controller requires after power-on: function set, then
/// display control, then clear, and finally the configured text.
pub fn init_display<G: GpioDriver, D: DelayNs>(
    gpio: G,
    delay: D,
    config: &Config,
) -> eyre::Result<GpioDisplay<G, D>> {
    debug!("Initializing LCD bus...");
    let bus = GpioHd44780Bus::initialize(gpio, delay, config.pins)?;
    debug!("{:?} initialized.", bus);

    let mut lcd = Hd44780Display::new(bus);

    lcd.set_bit_mode(BitMode::Eight)?;
    lcd.set_line_count(if config.two_lines { LineCount::Two } else { LineCount::One })?;
    lcd.set_font(if config.large_font { FontSize::Dots5x11 } else { FontSize::Dots5x8 })?;

    lcd.set_display(true)?;
    lcd.set_cursor(config.cursor)?;
    lcd.set_cursor_blink(config.blink)?;

    lcd.clear()?;
    lcd.print(&config.text)?;

    Ok(lcd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use charlcd_gpio::lcd::hd44780::latch::LatchDecoder;
    use charlcd_gpio::lcd::hd44780::PinConfigError;
    use charlcd_gpio::sim::{SimClock, SimDelay, SimGpioDriver};

    #[test]
    fn reference_config_sends_reference_sequence() {
        let clock = SimClock::new();
        let gpio = SimGpioDriver::new(clock.clone());
        let config = Config {
            text: "AB\nC".to_string(),
            ..Config::default()
        };

        let lcd = init_display(&gpio, SimDelay::new(clock), &config).unwrap();
        assert_eq!(lcd.mode_flags().bits(), 0x38);
        assert_eq!(lcd.control_flags().bits(), 0x0F);

        let transfers = LatchDecoder::new(config.pins).decode(&gpio.events());
        let wire = transfers.iter().map(|t| (t.is_data(), t.byte)).collect::<Vec<_>>();
        assert_eq!(
            wire,
            vec![
                (false, 0x30),
                (false, 0x38),
                (false, 0x38),
                (false, 0x0C),
                (false, 0x0E),
                (false, 0x0F),
                (false, 0x01),
                (true, b'A'),
                (true, b'B'),
                (false, 0xC0),
                (true, b'C'),
            ]
        );
    }

    #[test]
    fn one_line_large_font_without_cursor() {
        let clock = SimClock::new();
        let gpio = SimGpioDriver::new(clock.clone());
        let config = Config {
            two_lines: false,
            large_font: true,
            cursor: false,
            blink: false,
            text: String::new(),
            ..Config::default()
        };

        let lcd = init_display(&gpio, SimDelay::new(clock), &config).unwrap();
        assert_eq!(lcd.mode_flags().bits(), 0x34);
        assert_eq!(lcd.control_flags().bits(), 0x0C);
    }

    #[test]
    fn conflicting_pins_abort_startup() {
        let clock = SimClock::new();
        let gpio = SimGpioDriver::new(clock.clone());
        let mut config = Config::default();
        config.pins.enable = config.pins.register_select;

        let err = init_display(&gpio, SimDelay::new(clock), &config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PinConfigError>(),
            Some(PinConfigError::Duplicate { .. })
        ));
        assert!(gpio.events().is_empty());
    }
}
