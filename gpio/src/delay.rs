//! Blocking delays for drivers running on a regular OS thread.
use embedded_hal::delay::DelayNs;
use std::thread::sleep;
use std::time::Duration;

/// [DelayNs] implementation backed by [std::thread::sleep].
///
/// The OS may oversleep, never undersleep, which is the right direction for the LCD settling times.
#[derive(Debug, Default, Copy, Clone)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        sleep(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn delay_never_returns_early() {
        let mut delay = StdDelay;
        let start = Instant::now();
        delay.delay_us(200);
        delay.delay_ms(1);
        assert!(start.elapsed() >= Duration::from_micros(1200));
    }
}
