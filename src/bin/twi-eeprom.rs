#[macro_use]
extern crate clap;
#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;

extern crate twi_eeprom;
use twi_eeprom::*;

use std::io::{
	self,
	Write,
};
use std::process::exit;

use twi_eeprom::sim::SimulatedEeprom;
use twi_eeprom::twi::{
	Bus,
	BusController,
	DEFAULT_POLL_LIMIT,
};

// ATmega328P: TWBR
const DEFAULT_REGISTER_OFFSET: usize = 0xb8;

const SELFTEST_ADDRESS: MemoryAddress = MemoryAddress(0x0010);
const SELFTEST_DATA: u8 = 0x41;

fn parse_number(name: &str, value: &str) -> AResult<u64> {
	let parsed = if value.starts_with("0x") || value.starts_with("0X") {
		u64::from_str_radix(&value[2..], 16)
	} else {
		value.parse::<u64>()
	};
	parsed.map_err(|e| {
		let e = failure::Error::from(e);
		let msg = format!("invalid parameter {}: {}", name, e);
		e.context(msg).into()
	})
}

fn get_number(matches: &clap::ArgMatches, name: &str, max: u64) -> AResult<u64> {
	let param = match matches.value_of(name) {
		Some(p) => p,
		None => bail!("missing parameter {}", name),
	};
	let value = parse_number(name, param)?;
	ensure!(value <= max, "parameter {} out of range: {} (max: 0x{:x})", name, param, max);
	Ok(value)
}

fn get_number_or(matches: &clap::ArgMatches, name: &str, max: u64, default: u64) -> AResult<u64> {
	if matches.is_present(name) {
		get_number(matches, name, max)
	} else {
		Ok(default)
	}
}

fn parse_hex_data(data: &str) -> AResult<Vec<u8>> {
	let digits: Vec<char> = data.chars().filter(|c| !c.is_whitespace() && *c != ':').collect();
	ensure!(0 == digits.len() % 2, "hex data needs an even number of digits");
	digits.chunks(2).map(|pair| {
		let s: String = pair.iter().collect();
		u8::from_str_radix(&s, 16).map_err(|_| format_err!("invalid hex byte {:?}", s))
	}).collect()
}

fn print_hex(start: MemoryAddress, data: &[u8]) {
	for (i, b) in data.iter().enumerate() {
		if 0 == i % 16 {
			if 0 != i {
				println!();
			}
			print!("{:04x} ", start.offset(i).0);
		} else if 0 == i % 8 {
			print!(" ");
		}
		print!(" {:02x}", b);
	}
	if !data.is_empty() {
		println!();
	}
}

fn read<B: Bus>(ee: &mut Eeprom<B>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = MemoryAddress(get_number(sub_m, "ADDRESS", 0xffff)? as u16);
	let length = get_number(sub_m, "LENGTH", 0x1_0000)? as usize;

	let data = ee.read_vec(address, length)?;
	print_hex(address, &data);
	Ok(())
}

fn write<B: Bus>(ee: &mut Eeprom<B>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let address = MemoryAddress(get_number(sub_m, "ADDRESS", 0xffff)? as u16);
	let data = parse_hex_data(sub_m.value_of("DATA").unwrap_or(""))?;
	ensure!(!data.is_empty(), "nothing to write");

	ee.write(address, &data)?;
	info!("Wrote {} bytes at {}", data.len(), address);
	Ok(())
}

fn dump<B: Bus>(ee: &mut Eeprom<B>, sub_m: &clap::ArgMatches) -> AResult<()> {
	let size = get_number_or(sub_m, "size", 0x1_0000, 0x1_0000)? as usize;

	let data = ee.read_vec(MemoryAddress(0), size)?;
	io::stdout().write_all(&data)?;
	Ok(())
}

fn selftest<B: Bus>(ee: &mut Eeprom<B>) -> AResult<()> {
	ee.write_byte(SELFTEST_ADDRESS, SELFTEST_DATA)?;
	let data = ee.read_byte(SELFTEST_ADDRESS)?;
	ensure!(data == SELFTEST_DATA,
		"Verify failed at {}: expected 0x{:02x}, EEPROM has 0x{:02x}", SELFTEST_ADDRESS, SELFTEST_DATA, data
	);
	info!("Selftest passed: read back 0x{:02x} from {}", data, SELFTEST_ADDRESS);
	Ok(())
}

fn run<B: Bus>(ee: &mut Eeprom<B>, matches: &clap::ArgMatches) -> AResult<()> {
	match matches.subcommand() {
		("read", Some(sub_m)) => {
			read(ee, sub_m)
		},
		("write", Some(sub_m)) => {
			write(ee, sub_m)
		},
		("dump", Some(sub_m)) => {
			dump(ee, sub_m)
		},
		("selftest", _) => {
			selftest(ee)
		},
		("", _) => bail!("no subcommand"),
		(cmd, _) => bail!("not implemented subcommand {:?}", cmd),
	}
}

fn main_app() -> AResult<()> {
	let matches = clap_app!(@app (app_from_crate!())
		(@setting SubcommandRequiredElseHelp)
		(global_setting: clap::AppSettings::VersionlessSubcommands)
		(@arg device: -d --device +takes_value "device to map TWI registers from (e.g. /dev/mem)")
		(@arg offset: -o --offset +takes_value "offset of TWBR in the device (default: 0xb8)")
		(@arg simulate: --simulate "use a simulated controller and EEPROM instead of --device")
		(@arg slave: -s --slave +takes_value "SLA+W byte of the EEPROM (default: 0xa0)")
		(@arg polls: --polls +takes_value "TWCR polls before giving up on a bus action")
		(@subcommand read =>
			(about: "read bytes and print them as hex dump")
			(@arg ADDRESS: +required "memory address to start at")
			(@arg LENGTH: +required "number of bytes to read")
		)
		(@subcommand write =>
			(about: "write bytes (255 bytes per transaction, mind the page size)")
			(@arg ADDRESS: +required "memory address to start at")
			(@arg DATA: +required "data as hex bytes, e.g. 41:42:43")
		)
		(@subcommand dump =>
			(about: "dump EEPROM content as binary to stdout")
			(@arg size: --size +takes_value "EEPROM size in bytes (default: 65536)")
		)
		(@subcommand selftest =>
			(about: "write a test byte and read it back")
		)
	).get_matches();

	let slave_byte = get_number_or(&matches, "slave", 0xfe, 0xa0)? as u8;
	let slave = match SlaveAddress::from_write_byte(slave_byte) {
		Some(s) => s,
		None => bail!("slave address 0x{:02x} has the read bit set", slave_byte),
	};
	let poll_limit = get_number_or(&matches, "polls", u32::max_value() as u64, DEFAULT_POLL_LIMIT as u64)? as u32;

	if matches.is_present("simulate") {
		let sim = SimulatedEeprom::new().with_slave(slave);
		let mut ee = Eeprom::new(BusController::new(sim).with_poll_limit(poll_limit), slave);
		return run(&mut ee, &matches);
	}

	let device = match matches.value_of("device") {
		Some(d) => d,
		None => bail!("need either --device or --simulate"),
	};
	let offset = get_number_or(&matches, "offset", usize::max_value() as u64, DEFAULT_REGISTER_OFFSET as u64)? as usize;
	let mut ee = open_eeprom(device, offset, slave)?;
	ee.bus_mut().set_poll_limit(poll_limit);
	run(&mut ee, &matches)
}

fn main() {
	env_logger::from_env(env_logger::Env::default().default_filter_or("info")).init();

	if let Err(e) = main_app() {
		error!("Error: {}", e);
		exit(1);
	}
}
