use std::fmt;

/// only the upper 5 bits of TWSR carry the status; the lower bits hold the
/// prescaler (and a reserved bit)
pub const STATUS_MASK: u8 = 0xf8;

/// Status codes of the TWI controller in master mode (ATmega328P datasheet,
/// tables 22-2 and 22-3).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum StatusCode {
	/// illegal START or STOP condition
	BusError,
	StartSent,
	RepeatedStartSent,
	/// SLA+W transmitted, ACK received
	AddrAckWrite,
	/// SLA+W transmitted, NOT ACK received
	AddrNackWrite,
	DataAckWrite,
	DataNackWrite,
	ArbitrationLost,
	/// SLA+R transmitted, ACK received
	AddrAckRead,
	/// SLA+R transmitted, NOT ACK received
	AddrNackRead,
	/// data byte received, ACK returned
	DataAckRead,
	/// data byte received, NOT ACK returned
	DataNackRead,
	/// no relevant state information available; TWINT = 0
	NoInformation,
	/// anything not in the master mode tables (slave mode codes, garbage)
	Other(u8),
}

impl StatusCode {
	pub fn raw(self) -> u8 {
		match self {
			StatusCode::BusError => 0x00,
			StatusCode::StartSent => 0x08,
			StatusCode::RepeatedStartSent => 0x10,
			StatusCode::AddrAckWrite => 0x18,
			StatusCode::AddrNackWrite => 0x20,
			StatusCode::DataAckWrite => 0x28,
			StatusCode::DataNackWrite => 0x30,
			StatusCode::ArbitrationLost => 0x38,
			StatusCode::AddrAckRead => 0x40,
			StatusCode::AddrNackRead => 0x48,
			StatusCode::DataAckRead => 0x50,
			StatusCode::DataNackRead => 0x58,
			StatusCode::NoInformation => 0xf8,
			StatusCode::Other(raw) => raw,
		}
	}

	pub fn is_start(self) -> bool {
		match self {
			StatusCode::StartSent | StatusCode::RepeatedStartSent => true,
			_ => false,
		}
	}
}

impl From<u8> for StatusCode {
	fn from(v: u8) -> Self {
		match v & STATUS_MASK {
			0x00 => StatusCode::BusError,
			0x08 => StatusCode::StartSent,
			0x10 => StatusCode::RepeatedStartSent,
			0x18 => StatusCode::AddrAckWrite,
			0x20 => StatusCode::AddrNackWrite,
			0x28 => StatusCode::DataAckWrite,
			0x30 => StatusCode::DataNackWrite,
			0x38 => StatusCode::ArbitrationLost,
			0x40 => StatusCode::AddrAckRead,
			0x48 => StatusCode::AddrNackRead,
			0x50 => StatusCode::DataAckRead,
			0x58 => StatusCode::DataNackRead,
			0xf8 => StatusCode::NoInformation,
			raw => StatusCode::Other(raw),
		}
	}
}

impl fmt::Display for StatusCode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let name = match self {
			StatusCode::BusError => "bus error",
			StatusCode::StartSent => "START transmitted",
			StatusCode::RepeatedStartSent => "repeated START transmitted",
			StatusCode::AddrAckWrite => "SLA+W transmitted, ACK received",
			StatusCode::AddrNackWrite => "SLA+W transmitted, NACK received",
			StatusCode::DataAckWrite => "data transmitted, ACK received",
			StatusCode::DataNackWrite => "data transmitted, NACK received",
			StatusCode::ArbitrationLost => "arbitration lost",
			StatusCode::AddrAckRead => "SLA+R transmitted, ACK received",
			StatusCode::AddrNackRead => "SLA+R transmitted, NACK received",
			StatusCode::DataAckRead => "data received, ACK returned",
			StatusCode::DataNackRead => "data received, NACK returned",
			StatusCode::NoInformation => "no state information",
			StatusCode::Other(_) => "unknown status",
		};
		write!(f, "0x{:02x} ({})", self.raw(), name)
	}
}

#[cfg(test)]
mod test {
	use super::StatusCode;

	#[test]
	fn masks_prescaler_bits() {
		assert_eq!(StatusCode::from(0x18 | 0x03), StatusCode::AddrAckWrite);
		assert_eq!(StatusCode::from(0x58 | 0x01), StatusCode::DataNackRead);
		assert_eq!(StatusCode::from(0xff), StatusCode::NoInformation);
	}

	#[test]
	fn raw_matches_parse() {
		for v in 0..=0xffu8 {
			let code = StatusCode::from(v);
			assert_eq!(code.raw(), v & 0xf8, "status 0x{:02x}", v);
			assert_eq!(StatusCode::from(code.raw()), code);
		}
	}

	#[test]
	fn unknown_codes_stay_opaque() {
		// slave receiver: own SLA+W received
		assert_eq!(StatusCode::from(0x60), StatusCode::Other(0x60));
		assert_eq!(StatusCode::Other(0x60).to_string(), "0x60 (unknown status)");
	}
}
