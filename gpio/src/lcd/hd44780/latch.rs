//! Logic analyzer for the simulated bus.
//!
//! Replays a [SimGpioDriver](crate::sim::SimGpioDriver) event log the way the controller sees it: the
//! levels of RS and D0..D7 are sampled on every falling edge of E.
use crate::lcd::hd44780::driver::PinAssignment;
use crate::sim::SimEvent;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// One byte as the controller would have latched it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LatchedTransfer {
    /// Level of RS on the falling edge, `true` for data.
    pub register_select: bool,
    pub byte: u8,
    /// Time of the falling edge.
    pub at_ns: u64,
    /// How long E was high.
    pub pulse_width_ns: u64,
}

impl LatchedTransfer {
    pub fn is_data(&self) -> bool {
        self.register_select
    }
}

impl Display for LatchedTransfer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_data() && (self.byte.is_ascii_graphic() || self.byte == b' ') {
            write!(f, "data {:#04x} '{}'", self.byte, self.byte as char)
        } else if self.is_data() {
            write!(f, "data {:#04x}", self.byte)
        } else {
            write!(f, "instruction {:#04x} ({:08b})", self.byte, self.byte)
        }
    }
}

#[derive(Debug)]
pub struct LatchDecoder {
    pins: PinAssignment,
}

impl LatchDecoder {
    pub fn new(pins: PinAssignment) -> Self {
        Self { pins }
    }

    /// Decodes every completed enable pulse in `events`.
    pub fn decode(&self, events: &[SimEvent]) -> Vec<LatchedTransfer> {
        let mut levels: HashMap<usize, bool> = HashMap::new();
        let mut rose_at = None;
        let mut transfers = Vec::new();

        for event in events {
            let SimEvent::Write { pin, high, at_ns } = *event else {
                continue;
            };
            let was_high = levels.insert(pin, high).unwrap_or(false);

            if pin != self.pins.enable {
                continue;
            }
            match (was_high, high) {
                (false, true) => rose_at = Some(at_ns),
                (true, false) => {
                    let byte = self
                        .pins
                        .data
                        .iter()
                        .enumerate()
                        .filter(|&(_, pin)| levels.get(pin).copied().unwrap_or(false))
                        .fold(0u8, |byte, (i, _)| byte | 1 << i);
                    transfers.push(LatchedTransfer {
                        register_select: levels
                            .get(&self.pins.register_select)
                            .copied()
                            .unwrap_or(false),
                        byte,
                        at_ns,
                        pulse_width_ns: rose_at.map_or(0, |rose| at_ns - rose),
                    });
                    rose_at = None;
                }
                _ => {}
            }
        }

        transfers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINS: PinAssignment = PinAssignment {
        register_select: 0,
        enable: 1,
        data: [2, 3, 4, 5, 6, 7, 8, 9],
    };

    fn write(pin: usize, high: bool, at_ns: u64) -> SimEvent {
        SimEvent::Write { pin, high, at_ns }
    }

    #[test]
    fn samples_on_falling_edge() {
        let events = [
            write(2, true, 0),
            write(1, true, 10),
            // Changes while E is high still count, the controller latches on the falling edge
            write(9, true, 20),
            write(1, false, 30),
            write(9, false, 40),
        ];
        let transfers = LatchDecoder::new(PINS).decode(&events);
        assert_eq!(
            transfers,
            vec![LatchedTransfer {
                register_select: false,
                byte: 0x81,
                at_ns: 30,
                pulse_width_ns: 20
            }]
        );
    }

    #[test]
    fn incomplete_pulse_is_ignored() {
        let events = [write(0, true, 0), write(1, true, 10)];
        assert!(LatchDecoder::new(PINS).decode(&events).is_empty());
    }

    #[test]
    fn formats_transfers() {
        let data = LatchedTransfer {
            register_select: true,
            byte: b'A',
            at_ns: 0,
            pulse_width_ns: 0,
        };
        let instruction = LatchedTransfer {
            register_select: false,
            byte: 0x38,
            ..data
        };
        assert_eq!(data.to_string(), "data 0x41 'A'");
        assert_eq!(instruction.to_string(), "instruction 0x38 (00111000)");
    }
}
