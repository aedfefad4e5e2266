//! GPIO access through the memory-mapped BCM peripheral registers.
//!
//! This is the fastest backend available, since every level change is a single volatile store.
//! It needs access to `/dev/gpiomem` (usually granted to the `gpio` group) or `/dev/mem` (root).
use crate::{GpioBias, GpioDriver, GpioError, GpioResult};
use bitvec::vec::BitVec;
use log::debug;
use memmap2::{MmapOptions, MmapRaw};
use std::fmt::{Debug, Formatter};
use std::fs::OpenOptions;
use std::sync::atomic::AtomicU8;

/// Values of the 3-bit GPFSEL field of a pin.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum PinFunction {
    Input = 0b000,
    Output = 0b001,
}

pub struct RawGpioDriver {
    mmap: MmapRaw,
    outputs: BitVec<AtomicU8>,
}

impl RawGpioDriver {
    // #[cfg(target_pointer_width = "64")]
    // const GPIO_BASE: u32 = 0xFE200000;
    const GPIO_BASE: u32 = 0x3F200000;

    const PIN_COUNT: usize = 58;

    const GPSET0: usize = 0x1C / 4;
    const GPCLR0: usize = 0x28 / 4;
    const GPLEV0: usize = 0x34 / 4;
    // GPIO_PUP_PDN_CNTRL_REG0 (yes that is a long name)
    const GPIO_PUP_PDN_CNTRL_REG0: usize = 0xE4 / 4;

    fn create(path: &str) -> GpioResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)?;

        // /dev/gpiomem already starts at the GPIO block
        let offset = if path.ends_with("gpiomem") { 0 } else { Self::GPIO_BASE as u64 };

        let mmap = MmapOptions::new()
            .offset(offset)
            .len(4096)
            .map_raw(&file)?;

        debug!("Mapped GPIO registers from {} at offset {:#x}", path, offset);

        Ok(RawGpioDriver {
            mmap,
            outputs: BitVec::repeat(false, Self::PIN_COUNT),
        })
    }

    pub fn new_gpiomem() -> GpioResult<Self> {
        Self::create("/dev/gpiomem")
    }

    pub fn new_mem() -> GpioResult<Self> {
        Self::create("/dev/mem")
    }

    fn check_pin(pin: usize) -> GpioResult<()> {
        if pin >= Self::PIN_COUNT {
            return Err(GpioError::InvalidArgument);
        }
        Ok(())
    }

    fn register(&self, index: usize) -> *mut u32 {
        let base = self.mmap.as_mut_ptr() as *mut u32;
        // SAFETY: every index used by this driver points inside the 4 KiB mapping.
        unsafe { base.add(index) }
    }

    pub fn raw_get_pin_function(&self, pin: usize) -> GpioResult<u32> {
        Self::check_pin(pin)?;

        // GPFSELn register
        let register_ptr = self.register(pin / 10);
        let shift = (pin % 10) * 3;

        let register_value = unsafe { register_ptr.read_volatile() };
        Ok((register_value >> shift) & 0b111)
    }

    pub fn raw_set_pin_function(&self, pin: usize, function: PinFunction) -> GpioResult<()> {
        Self::check_pin(pin)?;

        // GPFSELn register
        let register_ptr = self.register(pin / 10);
        let shift = (pin % 10) * 3;

        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b111 << shift);
        register_value |= (function as u32) << shift;
        unsafe { register_ptr.write_volatile(register_value) };

        self.outputs.set_aliased(pin, function == PinFunction::Output);

        Ok(())
    }

    fn raw_set_pin_output(&self, pin: usize, high: bool) -> GpioResult<()> {
        Self::check_pin(pin)?;

        // GPSETn/GPCLRn registers only react to ones, so no read-modify-write is needed
        let base = if high { Self::GPSET0 } else { Self::GPCLR0 };
        let register_ptr = self.register(base + pin / 32);
        unsafe { register_ptr.write_volatile(1 << (pin % 32)) };

        Ok(())
    }

    fn raw_get_pin_level(&self, pin: usize) -> GpioResult<bool> {
        Self::check_pin(pin)?;

        let register_ptr = self.register(Self::GPLEV0 + pin / 32);
        let register_value = unsafe { register_ptr.read_volatile() };
        Ok((register_value >> (pin % 32)) & 1 != 0)
    }

    fn raw_set_bias(&self, pin: usize, bias: GpioBias) -> GpioResult<()> {
        Self::check_pin(pin)?;

        let bias_value = match bias {
            GpioBias::None => 0b00,
            GpioBias::PullUp => 0b01,
            GpioBias::PullDown => 0b10,
        };

        let register_ptr = self.register(Self::GPIO_PUP_PDN_CNTRL_REG0 + pin / 16);
        let shift = (pin % 16) * 2;
        let mut register_value = unsafe { register_ptr.read_volatile() };
        register_value &= !(0b11 << shift);
        register_value |= bias_value << shift;
        unsafe { register_ptr.write_volatile(register_value) };

        Ok(())
    }
}

impl Debug for RawGpioDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawGpioDriver({:?})", self.mmap.as_ptr().addr())
    }
}

impl GpioDriver for RawGpioDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(Self::PIN_COUNT)
    }

    fn set_output(&self, pin: usize) -> GpioResult<()> {
        self.raw_set_pin_function(pin, PinFunction::Output)
    }

    fn set_bias(&self, pin: usize, bias: GpioBias) -> GpioResult<()> {
        self.raw_set_bias(pin, bias)
    }

    fn write(&self, pin: usize, high: bool) -> GpioResult<()> {
        Self::check_pin(pin)?;
        if !self.outputs[pin] {
            return Err(GpioError::NotOutput(pin));
        }
        self.raw_set_pin_output(pin, high)
    }

    fn read(&self, pin: usize) -> GpioResult<bool> {
        self.raw_get_pin_level(pin)
    }
}

impl Drop for RawGpioDriver {
    fn drop(&mut self) {
        // Leave every pin we drove floating again
        for pin in self.outputs.iter_ones().collect::<Vec<_>>() {
            _ = self.raw_set_pin_function(pin, PinFunction::Input);
        }
    }
}
