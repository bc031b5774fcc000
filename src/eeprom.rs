//! Random / sequential access to a Microchip 24AA series serial EEPROM
//! (24AA256, 24AA512, ...: 16-bit memory addresses).
//!
//! Every access is one bus transaction:
//! - START, SLA+W, address high byte, address low byte
//! - write: data bytes
//! - read: repeated START, SLA+R, data bytes (ACK all but the last)
//! - STOP
//!
//! STOP is sent on every exit path once START was sent, including failed
//! phases and timeouts, so the bus is released for the next transaction.
//!
//! Requests longer than 255 bytes are split into several transactions at
//! consecutive addresses. Writes are not split at page boundaries and the
//! write cycle time after a page write is not waited for; the next
//! transaction to the device is NACKed until the write cycle is complete.

use std::fmt;

use crate::twi::{
	AddressPhase,
	Bus,
	DataPhase,
	Direction,
	Phase,
	SlaveAddress,
	TwiError,
};

/// 16-bit memory address inside the EEPROM; sent high byte first
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct MemoryAddress(pub u16);

impl MemoryAddress {
	pub fn from_bytes(high: u8, low: u8) -> Self {
		MemoryAddress(((high as u16) << 8) | low as u16)
	}

	pub fn high(self) -> u8 {
		(self.0 >> 8) as u8
	}

	pub fn low(self) -> u8 {
		self.0 as u8
	}

	/// the device address pointer rolls over at the end of the address space
	pub fn offset(self, offset: usize) -> Self {
		MemoryAddress(self.0.wrapping_add(offset as u16))
	}
}

impl fmt::Display for MemoryAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:04x}", self.0)
	}
}

impl From<u16> for MemoryAddress {
	fn from(v: u16) -> Self {
		MemoryAddress(v)
	}
}

pub enum Buffer<'a> {
	/// receives the data read from the EEPROM
	Read(&'a mut [u8]),
	/// data to write into the EEPROM
	Write(&'a [u8]),
}

impl<'a> Buffer<'a> {
	fn len(&self) -> usize {
		match self {
			Buffer::Read(b) => b.len(),
			Buffer::Write(b) => b.len(),
		}
	}
}

/// A single EEPROM access; consumed by `Eeprom::transfer`
pub struct Transfer<'a> {
	pub slave: SlaveAddress,
	pub address: MemoryAddress,
	pub buffer: Buffer<'a>,
	/// bytes to transfer; the buffer must hold at least this many
	pub length: u8,
}

impl<'a> Transfer<'a> {
	pub fn read(slave: SlaveAddress, address: MemoryAddress, buffer: &'a mut [u8], length: u8) -> Self {
		Transfer {
			slave,
			address,
			buffer: Buffer::Read(buffer),
			length,
		}
	}

	pub fn write(slave: SlaveAddress, address: MemoryAddress, buffer: &'a [u8], length: u8) -> Self {
		Transfer {
			slave,
			address,
			buffer: Buffer::Write(buffer),
			length,
		}
	}

	pub fn direction(&self) -> Direction {
		match self.buffer {
			Buffer::Read(_) => Direction::Read,
			Buffer::Write(_) => Direction::Write,
		}
	}
}

fn run_phases<B: Bus + ?Sized>(bus: &mut B, slave: SlaveAddress, address: MemoryAddress, buffer: Buffer, length: u8) -> Result<(), TwiError> {
	let len = length as usize;

	bus.address(slave, Direction::Write)?;
	bus.write_byte(address.high()).map_err(|e| e.at(Phase::MemoryAddressHigh))?;
	bus.write_byte(address.low()).map_err(|e| e.at(Phase::MemoryAddressLow))?;

	match buffer {
		Buffer::Read(target) => {
			bus.start_condition().map_err(|e| e.at(Phase::RepeatedStart))?;
			bus.address(slave, Direction::Read)?;

			// a zero length read still receives one byte; it is dropped
			let mut received = Vec::with_capacity(len.max(1));
			let result = bus.read_bytes(length, &mut received);
			let delivered = received.len().min(len);
			target[..delivered].copy_from_slice(&received[..delivered]);
			result
		},
		Buffer::Write(data) => {
			for (index, &byte) in data[..len].iter().enumerate() {
				bus.write_byte(byte).map_err(|e| e.at(Phase::WriteData(index)))?;
			}
			Ok(())
		},
	}
}

/// EEPROM access over a TWI bus.
///
/// The bus isn't shared: wrap the whole `Eeprom` in a `Mutex` if more than
/// one thread needs it.
pub struct Eeprom<B: Bus> {
	bus: B,
	slave: SlaveAddress,
}

impl<B: Bus> Eeprom<B> {
	/// takes over the bus and configures its bit rate
	pub fn new(bus: B, slave: SlaveAddress) -> Self {
		let mut ee = Eeprom {
			bus,
			slave,
		};
		ee.configure();
		ee
	}

	/// (re)load the bit rate; `new` already does this once
	pub fn configure(&mut self) {
		self.bus.configure_rate();
	}

	pub fn slave(&self) -> SlaveAddress {
		self.slave
	}

	pub fn bus_mut(&mut self) -> &mut B {
		&mut self.bus
	}

	pub fn into_inner(self) -> B {
		self.bus
	}

	/// Run a complete transaction; see module documentation.
	///
	/// For reads the buffer receives all bytes that arrived before a failure.
	pub fn transfer(&mut self, transfer: Transfer) -> Result<(), TwiError> {
		let direction = transfer.direction();
		let Transfer { slave, address, buffer, length } = transfer;

		if buffer.len() < length as usize {
			return Err(TwiError::BufferTooSmall {
				length: length as usize,
				capacity: buffer.len(),
			});
		}

		debug!("{} {} bytes at {} (slave {})", direction, length, address, slave);

		let bus = &mut self.bus;
		let result = bus.start_condition()
			.map_err(|e| e.at(Phase::Start))
			.and_then(|()| run_phases(bus, slave, address, buffer, length));
		bus.stop_condition();

		if let Err(ref e) = result {
			warn!("EEPROM {} at {} failed: {}", direction, address, e);
		}
		result
	}

	/// Read `target.len()` bytes starting at `address`; longer requests are
	/// split into multiple transactions.
	pub fn read(&mut self, address: MemoryAddress, target: &mut [u8]) -> Result<(), TwiError> {
		let slave = self.slave;
		let mut offset = 0;
		for chunk in target.chunks_mut(u8::max_value() as usize) {
			let length = chunk.len() as u8;
			self.transfer(Transfer::read(slave, address.offset(offset), chunk, length))?;
			offset += length as usize;
		}
		Ok(())
	}

	pub fn read_vec(&mut self, address: MemoryAddress, len: usize) -> Result<Vec<u8>, TwiError> {
		let mut buf = vec![0u8; len];
		self.read(address, &mut buf)?;
		Ok(buf)
	}

	pub fn read_byte(&mut self, address: MemoryAddress) -> Result<u8, TwiError> {
		let mut buf = [0u8; 1];
		self.transfer(Transfer::read(self.slave, address, &mut buf, 1))?;
		Ok(buf[0])
	}

	/// Write `data` starting at `address`; longer requests are split into
	/// multiple transactions.
	///
	/// Each transaction must stay inside a device page (it rolls over inside
	/// the page otherwise) and the device is busy for the write cycle
	/// afterwards.
	pub fn write(&mut self, address: MemoryAddress, data: &[u8]) -> Result<(), TwiError> {
		let slave = self.slave;
		let mut offset = 0;
		for chunk in data.chunks(u8::max_value() as usize) {
			let length = chunk.len() as u8;
			self.transfer(Transfer::write(slave, address.offset(offset), chunk, length))?;
			offset += length as usize;
		}
		Ok(())
	}

	pub fn write_byte(&mut self, address: MemoryAddress, data: u8) -> Result<(), TwiError> {
		self.transfer(Transfer::write(self.slave, address, &[data], 1))
	}
}
