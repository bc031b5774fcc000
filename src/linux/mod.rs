use std::io;

mod mapped;

pub use self::mapped::MappedRegisters;

/// Map the TWI register window found at `offset` in `path`.
///
/// `path` is usually `/dev/mem` (with `offset` the physical address of
/// TWBR) or a UIO device node exposing the controller.
pub fn open_registers(path: &str, offset: usize) -> io::Result<MappedRegisters> {
	mapped::inner_open(path, offset)
}
