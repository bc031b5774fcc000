use std::fmt;

use super::{
	Direction,
	StatusCode,
};

/// Where in a transaction something went wrong
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Phase {
	Start,
	RepeatedStart,
	Address(Direction),
	MemoryAddressHigh,
	MemoryAddressLow,
	/// n-th byte of the data phase
	WriteData(usize),
	ReadData(usize),
	/// primitive transmit outside of a named phase
	Transmit,
	/// primitive receive outside of a named phase
	Receive,
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Phase::Start => write!(f, "START"),
			Phase::RepeatedStart => write!(f, "repeated START"),
			Phase::Address(direction) => write!(f, "slave address ({})", direction),
			Phase::MemoryAddressHigh => write!(f, "memory address high byte"),
			Phase::MemoryAddressLow => write!(f, "memory address low byte"),
			Phase::WriteData(index) => write!(f, "write data byte {}", index),
			Phase::ReadData(index) => write!(f, "read data byte {}", index),
			Phase::Transmit => write!(f, "transmit"),
			Phase::Receive => write!(f, "receive"),
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Fail)]
pub enum TwiError {
	#[fail(display = "{}: expected status {}, bus reported {}", phase, expected, actual)]
	StatusMismatch {
		phase: Phase,
		expected: StatusCode,
		actual: StatusCode,
	},
	#[fail(display = "{}: timed out waiting for TWI controller (last status {})", phase, status)]
	TimedOut {
		phase: Phase,
		status: StatusCode,
	},
	#[fail(display = "transfer of {} bytes doesn't fit buffer of {} bytes", length, capacity)]
	BufferTooSmall {
		length: usize,
		capacity: usize,
	},
}

impl TwiError {
	pub fn phase(&self) -> Option<Phase> {
		match *self {
			TwiError::StatusMismatch { phase, .. } => Some(phase),
			TwiError::TimedOut { phase, .. } => Some(phase),
			TwiError::BufferTooSmall { .. } => None,
		}
	}

	/// status the controller reported when the transaction was given up
	pub fn status(&self) -> Option<StatusCode> {
		match *self {
			TwiError::StatusMismatch { actual, .. } => Some(actual),
			TwiError::TimedOut { status, .. } => Some(status),
			TwiError::BufferTooSmall { .. } => None,
		}
	}

	/// Raw status byte as "0 = ok, anything else = TWSR" style interfaces
	/// report it. A `BusError` status would read as success there, so it
	/// (and failures without any status) map to 0xff instead.
	pub fn legacy_code(&self) -> u8 {
		match self.status() {
			Some(StatusCode::BusError) | None => 0xff,
			Some(status) => status.raw(),
		}
	}

	/// re-tag primitive failures with the transaction phase they happened in
	pub fn at(self, phase: Phase) -> Self {
		match self {
			TwiError::StatusMismatch { expected, actual, .. } => TwiError::StatusMismatch { phase, expected, actual },
			TwiError::TimedOut { status, .. } => TwiError::TimedOut { phase, status },
			e @ TwiError::BufferTooSmall { .. } => e,
		}
	}
}

#[cfg(test)]
mod test {
	use super::{
		Phase,
		TwiError,
	};
	use crate::twi::{
		Direction,
		StatusCode,
	};

	#[test]
	fn retag_keeps_status() {
		let e = TwiError::StatusMismatch {
			phase: Phase::Transmit,
			expected: StatusCode::DataAckWrite,
			actual: StatusCode::DataNackWrite,
		};
		let e = e.at(Phase::MemoryAddressHigh);
		assert_eq!(e.phase(), Some(Phase::MemoryAddressHigh));
		assert_eq!(e.status(), Some(StatusCode::DataNackWrite));
		assert_eq!(e.legacy_code(), 0x30);
	}

	#[test]
	fn display() {
		let e = TwiError::StatusMismatch {
			phase: Phase::Address(Direction::Write),
			expected: StatusCode::AddrAckWrite,
			actual: StatusCode::AddrNackWrite,
		};
		assert_eq!(
			e.to_string(),
			"slave address (write): expected status 0x18 (SLA+W transmitted, ACK received), bus reported 0x20 (SLA+W transmitted, NACK received)",
		);
	}

	#[test]
	fn legacy_code_never_zero() {
		let e = TwiError::TimedOut { phase: Phase::Start, status: StatusCode::BusError };
		assert_eq!(e.legacy_code(), 0xff);
		let e = TwiError::BufferTooSmall { length: 2, capacity: 1 };
		assert_eq!(e.legacy_code(), 0xff);
		assert_eq!(e.at(Phase::Start).phase(), None);
	}
}
