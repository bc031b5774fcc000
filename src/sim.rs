//! Software model of an ATmega TWI controller in master mode with a 24AA
//! series EEPROM (16-bit memory addresses) attached to the bus.
//!
//! Every bus action completes "instantly" (or after a configurable number of
//! TWCR polls). For testing error paths a status can be injected for the n-th
//! bus action, and the controller can be stalled so TWINT never comes back.
//!
//! The EEPROM model only knows the address pointer; write cycle time, page
//! buffers and page wrapping aren't modelled: data goes straight to memory
//! and the pointer rolls over at the end of the device.

use crate::twi::{
	Register,
	SlaveAddress,
	StatusCode,
	TwControl,
	TwStatus,
	TwiRegisters,
};

/// 24AA512
pub const DEFAULT_CAPACITY: usize = 0x1_0000;

/// What the controller put on (or took from) the bus
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BusEvent {
	Start,
	RepeatedStart,
	Stop,
	Transmit(u8),
	Receive { ack: bool },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Device {
	/// not part of a transaction
	Idle,
	/// START seen, next byte is the control byte (slave address)
	Started,
	AddressHigh,
	AddressLow,
	Writing,
	Reading,
	/// not addressed, NACKed or faulted; waiting for the next START
	Released,
}

pub struct SimulatedEeprom {
	slave: SlaveAddress,
	memory: Vec<u8>,
	pointer: usize,
	device: Device,

	// controller
	bit_rate: u8,
	prescaler: u8,
	data: u8,
	control: u8,
	status: StatusCode,
	in_transaction: bool,
	receiver: bool,
	interrupt: bool,
	busy: bool,
	pending_polls: u32,

	// test knobs
	latency: u32,
	stalled: bool,
	fault: Option<(usize, StatusCode)>,
	actions: usize,
	events: Vec<BusEvent>,
}

impl SimulatedEeprom {
	pub fn new() -> Self {
		SimulatedEeprom::with_capacity(DEFAULT_CAPACITY)
	}

	/// erased device (all 0xff) of `capacity` bytes
	pub fn with_capacity(capacity: usize) -> Self {
		assert!(capacity > 0 && capacity <= 0x1_0000);
		SimulatedEeprom {
			slave: SlaveAddress::DEFAULT,
			memory: vec![0xff; capacity],
			pointer: 0,
			device: Device::Idle,
			bit_rate: 0,
			prescaler: 0,
			data: 0xff,
			control: 0,
			status: StatusCode::NoInformation,
			in_transaction: false,
			receiver: false,
			interrupt: false,
			busy: false,
			pending_polls: 0,
			latency: 0,
			stalled: false,
			fault: None,
			actions: 0,
			events: Vec::new(),
		}
	}

	pub fn with_slave(mut self, slave: SlaveAddress) -> Self {
		self.slave = slave;
		self
	}

	pub fn memory(&self) -> &[u8] {
		&self.memory
	}

	pub fn memory_mut(&mut self) -> &mut [u8] {
		&mut self.memory
	}

	pub fn events(&self) -> &[BusEvent] {
		&self.events
	}

	pub fn clear_events(&mut self) {
		self.events.clear();
	}

	/// TWCR polls before TWINT shows up after each bus action
	pub fn set_latency(&mut self, polls: u32) {
		self.latency = polls;
	}

	/// TWINT never gets set again
	pub fn stall(&mut self) {
		self.stalled = true;
	}

	/// Report `status` for bus action number `action` (counting from zero,
	/// STOP doesn't count); the device drops off the bus afterwards.
	pub fn fail_at(&mut self, action: usize, status: StatusCode) {
		self.fault = Some((action, status));
	}

	/// bus actions (START, transmit, receive) started so far
	pub fn actions(&self) -> usize {
		self.actions
	}

	fn advance_pointer(&mut self) {
		self.pointer = (self.pointer + 1) % self.memory.len();
	}

	fn start(&mut self) -> StatusCode {
		let status = if self.in_transaction {
			self.events.push(BusEvent::RepeatedStart);
			StatusCode::RepeatedStartSent
		} else {
			self.events.push(BusEvent::Start);
			StatusCode::StartSent
		};
		self.in_transaction = true;
		self.receiver = false;
		self.device = Device::Started;
		status
	}

	fn stop(&mut self) {
		self.events.push(BusEvent::Stop);
		self.in_transaction = false;
		self.receiver = false;
		self.device = Device::Idle;
		self.status = StatusCode::NoInformation;
		// TWSTO is cleared by hardware; TWINT is not set after STOP
		self.control = TwControl(self.control).clear_stop().0;
		self.busy = false;
		self.interrupt = false;
	}

	fn transmit(&mut self) -> StatusCode {
		let byte = self.data;
		self.events.push(BusEvent::Transmit(byte));
		match self.device {
			Device::Idle => StatusCode::BusError,
			Device::Started => {
				let read = 0 != byte & 0x01;
				self.receiver = read;
				let acked = byte >> 1 == self.slave.address();
				self.device = match (acked, read) {
					(true, true) => Device::Reading,
					(true, false) => Device::AddressHigh,
					(false, _) => Device::Released,
				};
				match (acked, read) {
					(true, false) => StatusCode::AddrAckWrite,
					(false, false) => StatusCode::AddrNackWrite,
					(true, true) => StatusCode::AddrAckRead,
					(false, true) => StatusCode::AddrNackRead,
				}
			},
			Device::AddressHigh => {
				self.pointer = ((byte as usize) << 8) % self.memory.len();
				self.device = Device::AddressLow;
				StatusCode::DataAckWrite
			},
			Device::AddressLow => {
				self.pointer = (self.pointer | byte as usize) % self.memory.len();
				self.device = Device::Writing;
				StatusCode::DataAckWrite
			},
			Device::Writing => {
				let pointer = self.pointer;
				self.memory[pointer] = byte;
				self.advance_pointer();
				StatusCode::DataAckWrite
			},
			Device::Reading | Device::Released => StatusCode::DataNackWrite,
		}
	}

	fn receive(&mut self, ack: bool) -> StatusCode {
		self.events.push(BusEvent::Receive { ack });
		if self.device == Device::Reading {
			self.data = self.memory[self.pointer];
			self.advance_pointer();
			if !ack {
				// slave stops driving SDA after the NACK
				self.device = Device::Released;
			}
		} else {
			// nobody pulls SDA low
			self.data = 0xff;
		}
		if ack { StatusCode::DataAckRead } else { StatusCode::DataNackRead }
	}

	fn control_write(&mut self, value: u8) {
		let control = TwControl(value);
		// TWINT is cleared by writing a one; `interrupt` tracks the flag itself
		self.control = TwControl(value).clear_interrupt().0;
		if control.is_interrupt() {
			self.interrupt = false;
		}
		if !control.is_enable() || !control.is_interrupt() {
			return;
		}

		if control.is_stop() && !control.is_start() {
			self.stop();
			return;
		}

		let mut status = if control.is_start() {
			self.start()
		} else if self.receiver {
			self.receive(control.is_ack())
		} else {
			self.transmit()
		};

		if let Some((action, injected)) = self.fault {
			if action == self.actions {
				status = injected;
				self.device = Device::Released;
			}
		}
		self.actions += 1;

		self.status = status;
		self.busy = true;
		self.pending_polls = self.latency;
	}

	fn control_read(&mut self) -> u8 {
		if self.busy && !self.stalled {
			if self.pending_polls == 0 {
				self.busy = false;
				self.interrupt = true;
			} else {
				self.pending_polls -= 1;
			}
		}
		let mut control = TwControl(self.control);
		if self.interrupt {
			control.set_interrupt();
		}
		control.0
	}
}

impl Default for SimulatedEeprom {
	fn default() -> Self {
		SimulatedEeprom::new()
	}
}

impl TwiRegisters for SimulatedEeprom {
	fn read_register(&mut self, register: Register) -> u8 {
		match register {
			Register::BitRate => self.bit_rate,
			Register::Status => self.status.raw() | TwStatus::with_prescaler(self.prescaler).0,
			Register::Data => self.data,
			Register::Control => self.control_read(),
		}
	}

	fn write_register(&mut self, register: Register, value: u8) {
		match register {
			Register::BitRate => self.bit_rate = value,
			Register::Status => self.prescaler = TwStatus::with_prescaler(value).prescaler_bits(),
			Register::Data => self.data = value,
			Register::Control => self.control_write(value),
		}
	}
}
