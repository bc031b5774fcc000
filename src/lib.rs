#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

macro_rules! with_context {
	(( $fmt:tt $($t:tt)* ), $e:expr) => {{
		use failure::Error;

		match (|| { $e })() {
			Ok(v) => Ok(v),
			Err(e) => {
				let e: Error = e;
				let msg = format!(concat!($fmt, ": {}") $($t)*, e);
				Err(Error::from(e.context(msg)))
			}
		}
	}};

	($msg:expr, $e:expr) => {
		with_context!(("{}", $msg), $e)
	};
}

pub type AResult<T> = Result<T, failure::Error>;

pub mod eeprom;
pub mod linux;
pub mod sim;
pub mod twi;

pub use self::eeprom::{
	Eeprom,
	MemoryAddress,
	Transfer,
};

pub use self::twi::{
	Direction,
	SlaveAddress,
	StatusCode,
	TwiError,
};

/// Opens the memory mapped register window of a TWI controller and
/// configures its bit rate.
pub fn open_eeprom(path: &str, offset: usize, slave: SlaveAddress) -> AResult<Eeprom<twi::BusController<linux::MappedRegisters>>> {
	let registers = with_context!(("couldn't map TWI registers from {} at 0x{:x}", path, offset), {
		Ok(linux::open_registers(path, offset)?)
	})?;
	Ok(Eeprom::new(twi::BusController::new(registers), slave))
}
