/// Master side of the AVR style "Two Wire Interface" (TWI), which is I²C
/// under a different name.
///
/// The controller is driven through four byte registers (bit rate, status,
/// data and control); every bus action is started by writing the control
/// register with TWINT set, and the hardware signals completion by setting
/// TWINT again. The status register then tells what happened on the bus.
///
/// Layering:
/// - `BusController`: register access and the primitive bus actions (start,
///   stop, transmit byte, receive byte)
/// - `AddressPhase`: send SLA+W / SLA+R and check for the matching ACK
/// - `DataPhase`: send data bytes, receive data bytes (ACK all but the last
///   one, NACK the last one)
///
/// The EEPROM transaction built on top of these lives in `crate::eeprom`.

mod address;
mod controller;
mod error;
mod phases;
mod registers;
mod status;

pub use self::address::{
	Direction,
	SlaveAddress,
};

pub use self::controller::{
	Bus,
	BusController,
	DEFAULT_POLL_LIMIT,
};

pub use self::error::{
	Phase,
	TwiError,
};

pub use self::phases::{
	AddressPhase,
	DataPhase,
};

pub use self::registers::{
	REGISTER_WINDOW,
	Register,
	TwControl,
	TwStatus,
	TwiRegisters,
};

pub use self::status::StatusCode;
