use super::registers::{
	Register,
	TwControl,
	TwStatus,
	TwiRegisters,
};
use super::{
	Phase,
	StatusCode,
	TwiError,
};

/// number of TWCR reads before giving up on TWINT
pub const DEFAULT_POLL_LIMIT: u32 = 0xffff;

// SCL = F_CPU / (16 + 2 * 255 * 64); slow enough for every 24AA part at
// every supply voltage
const BIT_RATE_DIVISOR: u8 = 0xff;
const BIT_RATE_PRESCALER: u8 = 0b11;

/// Primitive bus actions of a TWI master.
///
/// Nothing here checks whether the status matches what the caller wanted;
/// that's the job of `AddressPhase` and `DataPhase`.
pub trait Bus {
	/// load the bit rate divisor; only needs to be done once
	fn configure_rate(&mut self);

	/// (repeated) START; waits until the controller is done
	fn start_condition(&mut self) -> Result<(), TwiError>;

	/// STOP; doesn't wait for the bus to become idle
	fn stop_condition(&mut self);

	fn transmit_byte(&mut self, byte: u8) -> Result<StatusCode, TwiError>;

	/// receive a byte, either ACKing (more bytes wanted) or NACKing it
	fn receive_byte(&mut self, ack: bool) -> Result<(u8, StatusCode), TwiError>;
}

impl<'a, B: ?Sized + Bus> Bus for &'a mut B {
	fn configure_rate(&mut self) {
		B::configure_rate(*self)
	}
	fn start_condition(&mut self) -> Result<(), TwiError> {
		B::start_condition(*self)
	}
	fn stop_condition(&mut self) {
		B::stop_condition(*self)
	}
	fn transmit_byte(&mut self, byte: u8) -> Result<StatusCode, TwiError> {
		B::transmit_byte(*self, byte)
	}
	fn receive_byte(&mut self, ack: bool) -> Result<(u8, StatusCode), TwiError> {
		B::receive_byte(*self, ack)
	}
}

/// Owns the TWI register window; there must only be one per controller.
pub struct BusController<R: TwiRegisters> {
	registers: R,
	poll_limit: u32,
}

impl<R: TwiRegisters> BusController<R> {
	pub fn new(registers: R) -> Self {
		BusController {
			registers,
			poll_limit: DEFAULT_POLL_LIMIT,
		}
	}

	pub fn with_poll_limit(mut self, poll_limit: u32) -> Self {
		self.set_poll_limit(poll_limit);
		self
	}

	pub fn set_poll_limit(&mut self, poll_limit: u32) {
		self.poll_limit = poll_limit;
	}

	pub fn registers(&mut self) -> &mut R {
		&mut self.registers
	}

	pub fn into_registers(self) -> R {
		self.registers
	}

	pub fn status(&mut self) -> TwStatus {
		TwStatus(self.registers.read_register(Register::Status))
	}

	fn control_read(&mut self) -> TwControl {
		TwControl(self.registers.read_register(Register::Control))
	}

	fn control_write(&mut self, control: TwControl) {
		trace!("TWCR write: {:?}", control);
		self.registers.write_register(Register::Control, control.0);
	}

	/// returns the status once TWINT is set again; error on timeout
	fn wait_complete(&mut self, phase: Phase) -> Result<StatusCode, TwiError> {
		for _ in 0..self.poll_limit {
			if self.control_read().is_interrupt() {
				let status = self.status();
				trace!("TWSR read: {:?}", status);
				return Ok(status.code());
			}
		}
		let status = self.status().code();
		warn!("TWI controller didn't finish {} after {} polls (status {})", phase, self.poll_limit, status);
		Err(TwiError::TimedOut { phase, status })
	}
}

impl<R: TwiRegisters> Bus for BusController<R> {
	fn configure_rate(&mut self) {
		self.registers.write_register(Register::BitRate, BIT_RATE_DIVISOR);
		self.registers.write_register(Register::Status, TwStatus::with_prescaler(BIT_RATE_PRESCALER).0);
		debug!("TWI bit rate: TWBR=0x{:02x}, prescaler {}", BIT_RATE_DIVISOR, self.status().prescaler());
	}

	fn start_condition(&mut self) -> Result<(), TwiError> {
		self.control_write(TwControl::start());
		let status = self.wait_complete(Phase::Start)?;
		if !status.is_start() {
			// not checked by the protocol; the following SLA+W will fail anyway
			debug!("START finished with status {}", status);
		}
		Ok(())
	}

	fn stop_condition(&mut self) {
		self.control_write(TwControl::stop());
	}

	fn transmit_byte(&mut self, byte: u8) -> Result<StatusCode, TwiError> {
		trace!("TWDR write: 0x{:02x}", byte);
		self.registers.write_register(Register::Data, byte);
		self.control_write(TwControl::transfer(false));
		self.wait_complete(Phase::Transmit)
	}

	fn receive_byte(&mut self, ack: bool) -> Result<(u8, StatusCode), TwiError> {
		self.control_write(TwControl::transfer(ack));
		let status = self.wait_complete(Phase::Receive)?;
		let byte = self.registers.read_register(Register::Data);
		trace!("TWDR read: 0x{:02x}", byte);
		Ok((byte, status))
	}
}
