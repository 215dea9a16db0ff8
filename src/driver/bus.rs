use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use i2cdev::core::I2CDevice as _;
use i2cdev::linux::LinuxI2CDevice;
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

/// Byte and block level I2C primitives, addressed per call.
pub trait I2cBus {
    fn write_byte(&mut self, address: u16, value: u8) -> Result<()>;

    fn write_byte_data(&mut self, address: u16, register: u8, value: u8) -> Result<()>;

    fn read_byte_data(&mut self, address: u16, register: u8) -> Result<u8>;

    /// Fills `buf` starting at `register`.
    fn read_block_data(&mut self, address: u16, register: u8, buf: &mut [u8]) -> Result<()>;
}

/// Full-duplex SPI transfer on a single chip select.
pub trait SpiBus {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()>;
}

/// An `/dev/i2c-N` character device.
///
/// The kernel binds a file descriptor to one slave address at a time, so the
/// address is re-targeted whenever a call names a different one.
pub struct LinuxI2cBus {
    path: PathBuf,
    device: LinuxI2CDevice,
    address: u16,
}

impl LinuxI2cBus {
    pub fn open(path: impl AsRef<Path>, address: u16) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let device = LinuxI2CDevice::new(&path, address)
            .with_context(|| format!("failed to open I2C bus: {}", path.display()))?;

        Ok(Self {
            path,
            device,
            address,
        })
    }

    fn target(&mut self, address: u16) -> Result<&mut LinuxI2CDevice> {
        if self.address != address {
            self.device.set_slave_address(address).with_context(|| {
                format!(
                    "failed to set slave address 0x{address:02x} on {}",
                    self.path.display()
                )
            })?;
            self.address = address;
        }

        Ok(&mut self.device)
    }
}

impl I2cBus for LinuxI2cBus {
    fn write_byte(&mut self, address: u16, value: u8) -> Result<()> {
        self.target(address)?
            .smbus_write_byte(value)
            .with_context(|| format!("I2C write to 0x{address:02x} failed"))
    }

    fn write_byte_data(&mut self, address: u16, register: u8, value: u8) -> Result<()> {
        self.target(address)?
            .smbus_write_byte_data(register, value)
            .with_context(|| {
                format!("I2C write to 0x{address:02x} register 0x{register:02x} failed")
            })
    }

    fn read_byte_data(&mut self, address: u16, register: u8) -> Result<u8> {
        self.target(address)?
            .smbus_read_byte_data(register)
            .with_context(|| {
                format!("I2C read from 0x{address:02x} register 0x{register:02x} failed")
            })
    }

    fn read_block_data(&mut self, address: u16, register: u8, buf: &mut [u8]) -> Result<()> {
        let len = u8::try_from(buf.len()).context("I2C block read too long")?;
        let data = self
            .target(address)?
            .smbus_read_i2c_block_data(register, len)
            .with_context(|| {
                format!("I2C block read from 0x{address:02x} register 0x{register:02x} failed")
            })?;

        if data.len() != buf.len() {
            bail!(
                "I2C block read from 0x{address:02x} too short: expected {} bytes, got {}",
                buf.len(),
                data.len()
            );
        }
        buf.copy_from_slice(&data);

        Ok(())
    }
}

/// A `/dev/spidevB.C` device in mode 0.
pub struct LinuxSpiBus {
    device: Spidev,
}

impl LinuxSpiBus {
    pub fn open(path: impl AsRef<Path>, max_speed_hz: u32) -> Result<Self> {
        let path = path.as_ref();
        let mut device = Spidev::open(path)
            .with_context(|| format!("failed to open SPI device: {}", path.display()))?;

        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(max_speed_hz)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        device
            .configure(&options)
            .with_context(|| format!("failed to configure SPI device: {}", path.display()))?;

        Ok(Self { device })
    }
}

impl SpiBus for LinuxSpiBus {
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let mut transfer = SpidevTransfer::read_write(tx, rx);
        self.device
            .transfer(&mut transfer)
            .context("SPI transfer failed")
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::{HashMap, HashSet};

    use anyhow::{Result, bail};

    use super::{I2cBus, SpiBus};

    /// Register file per address. Addresses in `failing` answer every call
    /// with a transport error.
    ///
    /// `blocks` holds registers wider than a byte (the MCP9808 ones are 16
    /// bit). A block read at such a register returns its bytes instead of
    /// walking the byte registers.
    #[derive(Debug, Default)]
    pub struct FakeI2cBus {
        pub registers: HashMap<u16, HashMap<u8, u8>>,
        pub blocks: HashMap<(u16, u8), Vec<u8>>,
        pub failing: HashSet<u16>,
        pub writes: Vec<(u16, Option<u8>, u8)>,
        pub reads: Vec<u16>,
    }

    impl FakeI2cBus {
        pub fn with_registers(address: u16, registers: &[(u8, u8)]) -> Self {
            let mut bus = Self::default();
            bus.set_registers(address, registers);
            bus
        }

        pub fn set_registers(&mut self, address: u16, registers: &[(u8, u8)]) {
            let file = self.registers.entry(address).or_default();
            for &(register, value) in registers {
                file.insert(register, value);
            }
        }

        pub fn set_block(&mut self, address: u16, register: u8, bytes: &[u8]) {
            self.registers.entry(address).or_default();
            self.blocks.insert((address, register), bytes.to_vec());
        }

        fn check(&self, address: u16) -> Result<()> {
            if self.failing.contains(&address) || !self.registers.contains_key(&address) {
                bail!("remote I/O error at 0x{address:02x}");
            }
            Ok(())
        }
    }

    impl I2cBus for FakeI2cBus {
        fn write_byte(&mut self, address: u16, value: u8) -> Result<()> {
            self.check(address)?;
            self.writes.push((address, None, value));
            Ok(())
        }

        fn write_byte_data(&mut self, address: u16, register: u8, value: u8) -> Result<()> {
            self.check(address)?;
            self.writes.push((address, Some(register), value));
            Ok(())
        }

        fn read_byte_data(&mut self, address: u16, register: u8) -> Result<u8> {
            self.check(address)?;
            self.reads.push(address);
            Ok(self.registers[&address].get(&register).copied().unwrap_or(0))
        }

        fn read_block_data(&mut self, address: u16, register: u8, buf: &mut [u8]) -> Result<()> {
            self.check(address)?;
            self.reads.push(address);
            if let Some(block) = self.blocks.get(&(address, register)) {
                if block.len() < buf.len() {
                    bail!("short block read at 0x{address:02x} register 0x{register:02x}");
                }
                buf.copy_from_slice(&block[..buf.len()]);
                return Ok(());
            }
            let file = &self.registers[&address];
            for (offset, byte) in buf.iter_mut().enumerate() {
                *byte = file
                    .get(&(register + offset as u8))
                    .copied()
                    .unwrap_or(0);
            }
            Ok(())
        }
    }

    /// Answers every transfer with `response`.
    #[derive(Debug, Default)]
    pub struct FakeSpiBus {
        pub response: Vec<u8>,
        pub sent: Vec<Vec<u8>>,
        pub fail: bool,
    }

    impl SpiBus for FakeSpiBus {
        fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
            if self.fail {
                bail!("SPI transfer failed");
            }
            self.sent.push(tx.to_vec());
            rx.copy_from_slice(&self.response[..rx.len()]);
            Ok(())
        }
    }
}
