use super::{
	Bus,
	Direction,
	Phase,
	SlaveAddress,
	StatusCode,
	TwiError,
};

fn expect(phase: Phase, expected: StatusCode, actual: StatusCode) -> Result<(), TwiError> {
	if actual != expected {
		debug!("{}: expected {}, got {}", phase, expected, actual);
		return Err(TwiError::StatusMismatch { phase, expected, actual });
	}
	Ok(())
}

pub trait AddressPhase: Bus {
	/// send SLA+W or SLA+R; must follow a (repeated) START
	///
	/// On failure the bus is left as it is; sending STOP is up to the caller.
	fn address(&mut self, slave: SlaveAddress, direction: Direction) -> Result<(), TwiError> {
		let phase = Phase::Address(direction);
		let expected = match direction {
			Direction::Write => StatusCode::AddrAckWrite,
			Direction::Read => StatusCode::AddrAckRead,
		};
		let status = self.transmit_byte(slave.byte(direction)).map_err(|e| e.at(phase))?;
		expect(phase, expected, status)
	}
}

impl<B: Bus + ?Sized> AddressPhase for B {
}

pub trait DataPhase: Bus {
	fn write_byte(&mut self, byte: u8) -> Result<(), TwiError> {
		let status = self.transmit_byte(byte)?;
		expect(Phase::Transmit, StatusCode::DataAckWrite, status)
	}

	/// Receive `count` bytes: ACK all but the last, NACK the last one.
	///
	/// Each byte is appended to `sink` before its status is checked (it was on
	/// the bus anyway). `count == 0` still receives (and NACKs) one byte: once
	/// the slave ACKed SLA+R it is going to send at least one.
	fn read_bytes(&mut self, count: u8, sink: &mut Vec<u8>) -> Result<(), TwiError> {
		let acked = count.saturating_sub(1) as usize;
		for index in 0..acked {
			let phase = Phase::ReadData(index);
			let (byte, status) = self.receive_byte(true).map_err(|e| e.at(phase))?;
			sink.push(byte);
			expect(phase, StatusCode::DataAckRead, status)?;
		}

		let phase = Phase::ReadData(acked);
		let (byte, status) = self.receive_byte(false).map_err(|e| e.at(phase))?;
		sink.push(byte);
		expect(phase, StatusCode::DataNackRead, status)
	}
}

impl<B: Bus + ?Sized> DataPhase for B {
}

#[cfg(test)]
mod test {
	use super::{
		AddressPhase,
		DataPhase,
	};
	use crate::sim::{
		BusEvent,
		SimulatedEeprom,
	};
	use crate::twi::{
		Bus,
		BusController,
		Direction,
		Phase,
		SlaveAddress,
		StatusCode,
		TwiError,
	};

	// START, SLA+W, pointer, repeated START, SLA+R
	fn addressed_for_read(sim: SimulatedEeprom, pointer: u16) -> BusController<SimulatedEeprom> {
		let mut bus = BusController::new(sim);
		bus.start_condition().unwrap();
		bus.address(SlaveAddress::DEFAULT, Direction::Write).unwrap();
		bus.write_byte((pointer >> 8) as u8).unwrap();
		bus.write_byte(pointer as u8).unwrap();
		bus.start_condition().unwrap();
		bus.address(SlaveAddress::DEFAULT, Direction::Read).unwrap();
		bus.registers().clear_events();
		bus
	}

	fn receives(bus: &mut BusController<SimulatedEeprom>) -> Vec<bool> {
		bus.registers().events().iter().filter_map(|e| match *e {
			BusEvent::Receive { ack } => Some(ack),
			_ => None,
		}).collect()
	}

	#[test]
	fn address_checks_direction() {
		let mut bus = BusController::new(SimulatedEeprom::new());
		bus.start_condition().unwrap();
		bus.address(SlaveAddress::DEFAULT, Direction::Write).unwrap();

		bus.start_condition().unwrap();
		bus.address(SlaveAddress::DEFAULT, Direction::Read).unwrap();

		// SLA+W acknowledged, but the bus reports it in the wrong direction
		let mut sim = SimulatedEeprom::new();
		sim.fail_at(1, StatusCode::AddrAckRead);
		let mut bus = BusController::new(sim);
		bus.start_condition().unwrap();
		assert_eq!(
			bus.address(SlaveAddress::DEFAULT, Direction::Write),
			Err(TwiError::StatusMismatch {
				phase: Phase::Address(Direction::Write),
				expected: StatusCode::AddrAckWrite,
				actual: StatusCode::AddrAckRead,
			}),
		);

		let mut bus = BusController::new(SimulatedEeprom::new());
		bus.start_condition().unwrap();
		let other = SlaveAddress::new(0x51).unwrap();
		assert_eq!(
			bus.address(other, Direction::Write),
			Err(TwiError::StatusMismatch {
				phase: Phase::Address(Direction::Write),
				expected: StatusCode::AddrAckWrite,
				actual: StatusCode::AddrNackWrite,
			}),
		);
	}

	#[test]
	fn write_byte_expects_data_ack() {
		let mut sim = SimulatedEeprom::new();
		// START, SLA+W, then the data byte
		sim.fail_at(2, StatusCode::DataNackWrite);
		let mut bus = BusController::new(sim);
		bus.start_condition().unwrap();
		bus.address(SlaveAddress::DEFAULT, Direction::Write).unwrap();
		assert_eq!(
			bus.write_byte(0x00),
			Err(TwiError::StatusMismatch {
				phase: Phase::Transmit,
				expected: StatusCode::DataAckWrite,
				actual: StatusCode::DataNackWrite,
			}),
		);
	}

	#[test]
	fn read_single_byte_is_nacked() {
		let mut sim = SimulatedEeprom::new();
		sim.memory_mut()[0x20] = 0x5a;
		let mut bus = addressed_for_read(sim, 0x20);
		let mut sink = Vec::new();
		bus.read_bytes(1, &mut sink).unwrap();
		assert_eq!(sink, vec![0x5a]);
		assert_eq!(receives(&mut bus), vec![false]);
	}

	#[test]
	fn read_many_acks_all_but_last() {
		let mut sim = SimulatedEeprom::new();
		for (i, b) in sim.memory_mut()[0x100..0x105].iter_mut().enumerate() {
			*b = i as u8;
		}
		let mut bus = addressed_for_read(sim, 0x100);
		let mut sink = Vec::new();
		bus.read_bytes(5, &mut sink).unwrap();
		assert_eq!(sink, vec![0, 1, 2, 3, 4]);
		assert_eq!(receives(&mut bus), vec![true, true, true, true, false]);
	}

	#[test]
	fn read_zero_still_reads_one_byte() {
		let mut bus = addressed_for_read(SimulatedEeprom::new(), 0);
		let mut sink = Vec::new();
		bus.read_bytes(0, &mut sink).unwrap();
		assert_eq!(sink.len(), 1);
		assert_eq!(receives(&mut bus), vec![false]);
	}

	#[test]
	fn failed_read_still_delivers_byte() {
		let mut sim = SimulatedEeprom::new();
		sim.memory_mut()[0] = 0x11;
		sim.memory_mut()[1] = 0x22;
		// START, SLA+W, high, low, START, SLA+R, byte 0, byte 1
		sim.fail_at(7, StatusCode::BusError);
		let mut bus = addressed_for_read(sim, 0);
		let mut sink = Vec::new();
		let e = bus.read_bytes(3, &mut sink).unwrap_err();
		assert_eq!(e, TwiError::StatusMismatch {
			phase: Phase::ReadData(1),
			expected: StatusCode::DataAckRead,
			actual: StatusCode::BusError,
		});
		assert_eq!(sink, vec![0x11, 0x22]);
		assert_eq!(receives(&mut bus), vec![true, true]);
	}
	#[test]
	fn last_byte_must_be_nacked() {
		let mut sim = SimulatedEeprom::new();
		sim.memory_mut()[0x40..0x43].copy_from_slice(&[0x11, 0x22, 0x33]);
		// START, SLA+W, high, low, START, SLA+R, byte 0, byte 1, byte 2
		sim.fail_at(8, StatusCode::DataAckRead);
		let mut bus = addressed_for_read(sim, 0x40);
		let mut sink = Vec::new();
		let e = bus.read_bytes(3, &mut sink).unwrap_err();
		assert_eq!(e, TwiError::StatusMismatch {
			phase: Phase::ReadData(2),
			expected: StatusCode::DataNackRead,
			actual: StatusCode::DataAckRead,
		});
		assert_eq!(sink, vec![0x11, 0x22, 0x33]);
		assert_eq!(receives(&mut bus), vec![true, true, false]);
	}

	#[test]
	fn single_byte_checks_nack_status() {
		let mut sim = SimulatedEeprom::new();
		sim.memory_mut()[0] = 0x5a;
		// START, SLA+W, high, low, START, SLA+R, byte 0
		sim.fail_at(6, StatusCode::DataAckRead);
		let mut bus = addressed_for_read(sim, 0);
		let mut sink = Vec::new();
		let e = bus.read_bytes(1, &mut sink).unwrap_err();
		assert_eq!(e.phase(), Some(Phase::ReadData(0)));
		assert_eq!(e.status(), Some(StatusCode::DataAckRead));
		assert_eq!(sink, vec![0x5a]);
	}
}
