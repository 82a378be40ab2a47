extern crate std;

use std::vec::Vec;

use embedded_hal_mock::eh1::i2c::Transaction as I2cTransaction;

pub const ADDRESS: u8 = 0x27;

/// Delay that returns immediately and remembers every requested wait in microseconds.
#[derive(Default)]
pub struct RecordingDelay {
    pub waits_us: Vec<u32>,
}

impl RecordingDelay {
    pub fn take(&mut self) -> Vec<u32> {
        core::mem::take(&mut self.waits_us)
    }
}

impl embedded_hal::delay::DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.waits_us.push(ns / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.waits_us.push(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.waits_us.push(ms * 1000);
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.waits_us.push(ns / 1000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.waits_us.push(us);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.waits_us.push(ms * 1000);
    }
}

/// The four writes of a full instruction with the backlight on.
pub fn instruction(byte: u8, data: bool) -> Vec<I2cTransaction> {
    let rs = if data { 0x01 } else { 0x00 };
    let high = (byte & 0xf0) | 0x08 | rs;
    let low = (byte << 4) | 0x08 | rs;
    std::vec![
        I2cTransaction::write(ADDRESS, std::vec![high | 0x04]),
        I2cTransaction::write(ADDRESS, std::vec![high]),
        I2cTransaction::write(ADDRESS, std::vec![low | 0x04]),
        I2cTransaction::write(ADDRESS, std::vec![low]),
    ]
}

pub fn command(byte: u8) -> Vec<I2cTransaction> {
    instruction(byte, false)
}

pub fn data(byte: u8) -> Vec<I2cTransaction> {
    instruction(byte, true)
}

/// Full expected traffic of `init` with the backlight on.
pub fn init_sequence() -> Vec<I2cTransaction> {
    let mut t = std::vec![
        // idle, backlight only
        I2cTransaction::write(ADDRESS, std::vec![0b0000_1000]),
        // 0x30 high nibble three times
        I2cTransaction::write(ADDRESS, std::vec![0b0011_1100]),
        I2cTransaction::write(ADDRESS, std::vec![0b0011_1000]),
        I2cTransaction::write(ADDRESS, std::vec![0b0011_1100]),
        I2cTransaction::write(ADDRESS, std::vec![0b0011_1000]),
        I2cTransaction::write(ADDRESS, std::vec![0b0011_1100]),
        I2cTransaction::write(ADDRESS, std::vec![0b0011_1000]),
        // 0x20 high nibble, switches to 4 bit
        I2cTransaction::write(ADDRESS, std::vec![0b0010_1100]),
        I2cTransaction::write(ADDRESS, std::vec![0b0010_1000]),
        // 0x28 function set, 2 lines, 5x8
        I2cTransaction::write(ADDRESS, std::vec![0b0010_1100]),
        I2cTransaction::write(ADDRESS, std::vec![0b0010_1000]),
        I2cTransaction::write(ADDRESS, std::vec![0b1000_1100]),
        I2cTransaction::write(ADDRESS, std::vec![0b1000_1000]),
    ];
    t.extend(command(0x0c)); // display on
    t.extend(command(0x01)); // clear
    t.extend(command(0x06)); // left to right
    t
}

/// Waits issued by `init`, in order.
pub fn init_waits() -> Vec<u32> {
    std::vec![
        50_000, // power on
        1, 4200, 1, 150, 1, 37, // primes
        1, 37, // 4 bit
        1, 37, 1, 37, // function set
        1, 37, 1, 37, // display on
        1, 37, 1, 1600, // clear
        1, 37, 1, 37, // left to right
    ]
}
