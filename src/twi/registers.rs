use std::fmt;

use super::status::{
	STATUS_MASK,
	StatusCode,
};

/// TWI registers; offsets are relative to TWBR (ATmega328P: TWBR at 0xb8)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Register {
	/// TWBR: bit rate divisor
	BitRate,
	/// TWSR: status (read only) and prescaler bits
	Status,
	/// TWDR: byte to transmit / last byte received
	Data,
	/// TWCR: command bits
	Control,
}

impl Register {
	pub fn offset(self) -> usize {
		match self {
			Register::BitRate => 0,
			Register::Status => 1,
			// TWAR (own slave address) at 2 isn't used by a master
			Register::Data => 3,
			Register::Control => 4,
		}
	}
}

/// size of the register window starting at TWBR
pub const REGISTER_WINDOW: usize = 5;

pub trait TwiRegisters {
	fn read_register(&mut self, register: Register) -> u8;
	fn write_register(&mut self, register: Register, value: u8);
}

impl<'a, R: ?Sized + TwiRegisters> TwiRegisters for &'a mut R {
	fn read_register(&mut self, register: Register) -> u8 {
		R::read_register(*self, register)
	}
	fn write_register(&mut self, register: Register, value: u8) {
		R::write_register(*self, register, value)
	}
}

// TWCR flags
pub const TWINT: u8 = 0x80; // "job done"; writing 1 clears it and starts the next job
pub const TWEA:  u8 = 0x40; // return ACK on received bytes
pub const TWSTA: u8 = 0x20; // (repeated) START
pub const TWSTO: u8 = 0x10; // STOP; cleared by hardware when done
pub const TWWC:  u8 = 0x08; // write collision; read only
pub const TWEN:  u8 = 0x04; // enable
pub const TWIE:  u8 = 0x01; // interrupt enable; never set by this driver

// TWSR prescaler bits
pub const TWPS_MASK: u8 = 0x03;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TwControl(pub u8);

impl TwControl {
	pub fn start() -> Self {
		*TwControl(0)
			.set_interrupt()
			.set_start()
			.set_enable()
	}

	pub fn stop() -> Self {
		*TwControl(0)
			.set_interrupt()
			.set_stop()
			.set_enable()
	}

	/// transmit TWDR or receive a byte (NACKing it unless `ack` is set)
	pub fn transfer(ack: bool) -> Self {
		let mut control = TwControl(0);
		control.set_interrupt().set_enable();
		if ack {
			control.set_ack();
		}
		control
	}

	pub fn is_interrupt(&self) -> bool {
		0 != self.0 & TWINT
	}
	pub fn set_interrupt(&mut self) -> &mut Self {
		self.0 |= TWINT;
		self
	}
	pub fn clear_interrupt(&mut self) -> &mut Self {
		self.0 &= !TWINT;
		self
	}

	pub fn is_ack(&self) -> bool {
		0 != self.0 & TWEA
	}
	pub fn set_ack(&mut self) -> &mut Self {
		self.0 |= TWEA;
		self
	}

	pub fn is_start(&self) -> bool {
		0 != self.0 & TWSTA
	}
	pub fn set_start(&mut self) -> &mut Self {
		self.0 |= TWSTA;
		self
	}

	pub fn is_stop(&self) -> bool {
		0 != self.0 & TWSTO
	}
	pub fn set_stop(&mut self) -> &mut Self {
		self.0 |= TWSTO;
		self
	}
	pub fn clear_stop(&mut self) -> &mut Self {
		self.0 &= !TWSTO;
		self
	}

	pub fn is_write_collision(&self) -> bool {
		0 != self.0 & TWWC
	}

	pub fn is_enable(&self) -> bool {
		0 != self.0 & TWEN
	}
	pub fn set_enable(&mut self) -> &mut Self {
		self.0 |= TWEN;
		self
	}

	pub fn is_interrupt_enable(&self) -> bool {
		0 != self.0 & TWIE
	}
}

impl fmt::Display for TwControl {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for TwControl {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (", self.0)?;
		if self.is_interrupt() { write!(f, " [INT]")?; }
		if self.is_ack() { write!(f, " [EA]")?; }
		if self.is_start() { write!(f, " [STA]")?; }
		if self.is_stop() { write!(f, " [STO]")?; }
		if self.is_write_collision() { write!(f, " [WC]")?; }
		if self.is_enable() { write!(f, " [EN]")?; }
		if self.is_interrupt_enable() { write!(f, " [IE]")?; }
		write!(f, " )")
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TwStatus(pub u8);

impl TwStatus {
	pub fn with_prescaler(bits: u8) -> Self {
		TwStatus(bits & TWPS_MASK)
	}

	pub fn code(&self) -> StatusCode {
		StatusCode::from(self.0 & STATUS_MASK)
	}

	pub fn prescaler_bits(&self) -> u8 {
		self.0 & TWPS_MASK
	}

	// SCL = F_CPU / (16 + 2 * TWBR * prescaler)
	pub fn prescaler(&self) -> u32 {
		match self.prescaler_bits() {
			0 => 1,
			1 => 4,
			2 => 16,
			_ => 64,
		}
	}
}

impl fmt::Display for TwStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for TwStatus {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (status: {}, prescaler: {})", self.0, self.code(), self.prescaler())
	}
}

#[cfg(test)]
mod test {
	use super::{
		TwControl,
		TwStatus,
	};
	use crate::twi::StatusCode;

	#[test]
	fn control_commands() {
		assert_eq!(TwControl::start().0, 0xa4);
		assert_eq!(TwControl::stop().0, 0x94);
		assert_eq!(TwControl::transfer(false).0, 0x84);
		assert_eq!(TwControl::transfer(true).0, 0xc4);
	}

	#[test]
	fn status_splits_prescaler() {
		let status = TwStatus(0x58 | 0x03);
		assert_eq!(status.code(), StatusCode::DataNackRead);
		assert_eq!(status.prescaler_bits(), 0x03);
		assert_eq!(status.prescaler(), 64);
		assert_eq!(TwStatus::with_prescaler(0xff).0, 0x03);
	}
}
