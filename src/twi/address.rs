use std::fmt;

/// Value of the R/W bit following the 7-bit slave address
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Direction {
	Write,
	Read,
}

impl Direction {
	pub fn bit(self) -> u8 {
		match self {
			Direction::Write => 0,
			Direction::Read => 1,
		}
	}
}

impl fmt::Display for Direction {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Direction::Write => write!(f, "write"),
			Direction::Read => write!(f, "read"),
		}
	}
}

/// 7-bit slave address
///
/// On the bus it is followed by the direction bit, so the SLA+W byte is
/// always even and SLA+R is SLA+W + 1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct SlaveAddress(u8);

impl SlaveAddress {
	/// 24AA series: 0b1010 control code, chip selects A2..A0 tied low
	pub const DEFAULT: SlaveAddress = SlaveAddress(0x50);

	pub fn new(address: u8) -> Option<Self> {
		if address > 0x7f {
			return None;
		}
		Some(SlaveAddress(address))
	}

	/// from the SLA+W byte as it appears on the bus (i.e. "0xA0")
	pub fn from_write_byte(byte: u8) -> Option<Self> {
		if 0 != byte & 0x01 {
			return None;
		}
		Some(SlaveAddress(byte >> 1))
	}

	pub fn address(self) -> u8 {
		self.0
	}

	pub fn write_byte(self) -> u8 {
		self.0 << 1
	}

	pub fn read_byte(self) -> u8 {
		self.write_byte() + 1
	}

	pub fn byte(self, direction: Direction) -> u8 {
		self.write_byte() | direction.bit()
	}
}

impl Default for SlaveAddress {
	fn default() -> Self {
		SlaveAddress::DEFAULT
	}
}

impl fmt::Display for SlaveAddress {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.write_byte())
	}
}
