use std::ffi::CString;
use std::fs;
use std::io;
use std::os::unix::io::{
	FromRawFd,
};
use std::ptr;

use libc::{
	MAP_SHARED,
	O_CLOEXEC,
	O_RDWR,
	O_SYNC,
	PROT_READ,
	PROT_WRITE,
	_SC_PAGESIZE,
	c_void,
	mmap,
	munmap,
	off_t,
	open,
	sysconf,
};

use crate::twi::{
	REGISTER_WINDOW,
	Register,
	TwiRegisters,
};

#[derive(Debug)]
pub struct MappedRegisters {
	area: ptr::NonNull<u8>, // start of the mapped pages
	area_len: usize,
	base: usize, // offset of TWBR inside the mapping
	// keep the device open while mapped
	_file: fs::File,
}

impl Drop for MappedRegisters {
	fn drop(&mut self) {
		unsafe {
			let res = munmap(
				self.area.as_ptr() as *mut c_void,
				self.area_len,
			);
			if 0 != res {
				panic!("munmap failed: {}", io::Error::last_os_error());
			}
		}
	}
}

impl MappedRegisters {
	fn register_ptr(&self, register: Register) -> *mut u8 {
		let offset = self.base + register.offset();
		assert!(offset < self.area_len);
		unsafe { self.area.as_ptr().add(offset) }
	}
}

impl TwiRegisters for MappedRegisters {
	fn read_register(&mut self, register: Register) -> u8 {
		unsafe { ptr::read_volatile(self.register_ptr(register)) }
	}

	fn write_register(&mut self, register: Register, value: u8) {
		unsafe { ptr::write_volatile(self.register_ptr(register), value) }
	}
}

// TODO: exclusive open / file locking?
pub fn inner_open(path: &str, offset: usize) -> io::Result<MappedRegisters> {
	let page_size = unsafe { sysconf(_SC_PAGESIZE) };
	if page_size <= 0 {
		return Err(io::Error::last_os_error());
	}
	let page_size = page_size as usize;

	// mmap needs a page aligned offset
	let page_offset = offset & !(page_size - 1);
	let base = offset - page_offset;
	let area_len = (base + REGISTER_WINDOW + page_size - 1) & !(page_size - 1);

	let path = CString::new(path)?;

	let fd = unsafe { open(path.as_ptr(), O_RDWR | O_CLOEXEC | O_SYNC) };
	if -1 == fd {
		return Err(io::Error::last_os_error());
	}
	// now get fd managed to prevent resource leak
	let f = unsafe { fs::File::from_raw_fd(fd) };

	let area = unsafe {
		mmap(
			ptr::null_mut(),
			area_len,
			PROT_READ | PROT_WRITE,
			MAP_SHARED,
			fd,
			page_offset as off_t,
		)
	};

	if area as usize == !0usize {
		return Err(io::Error::last_os_error());
	}
	match ptr::NonNull::new(area as *mut u8) {
		None => panic!("mmap shouldn't return NULL ever"),
		Some(area) => Ok(MappedRegisters {
			area,
			area_len,
			base,
			_file: f,
		}),
	}
}
