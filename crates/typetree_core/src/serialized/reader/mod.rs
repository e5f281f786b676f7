use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use crate::serialized::{ByteSource, Result, TreeError};

/// Typed random-access reader with one read-ahead window over a [`ByteSource`].
///
/// Requests inside the window are served from memory; other requests refill the window
/// starting at the requested offset. Requests larger than the window bypass it.
pub struct BufferedReader {
	source: Box<dyn ByteSource>,
	buffer: Vec<u8>,
	window_start: u64,
	window_len: usize,
	length: u64,
	source_reads: u64,
}

impl BufferedReader {
	/// Window size used when callers have no better estimate.
	pub const DEFAULT_BUFFER_SIZE: usize = 4096;

	/// Wrap a byte source with a window of at most `buffer_size` bytes.
	pub fn new(mut source: Box<dyn ByteSource>, buffer_size: usize) -> Result<Self> {
		let length = source.length()?;
		let capacity = usize::try_from(length).map_or(buffer_size, |len| buffer_size.min(len)).max(1);

		Ok(Self {
			source,
			buffer: vec![0_u8; capacity],
			window_start: 0,
			window_len: 0,
			length,
			source_reads: 0,
		})
	}

	/// Open a file from disk.
	pub fn open(path: impl AsRef<Path>, buffer_size: usize) -> Result<Self> {
		Self::new(Box::new(File::open(path)?), buffer_size)
	}

	/// Read from an in-memory byte vector.
	pub fn from_bytes(bytes: Vec<u8>, buffer_size: usize) -> Result<Self> {
		Self::new(Box::new(Cursor::new(bytes)), buffer_size)
	}

	/// Total source length in bytes.
	pub fn length(&self) -> u64 {
		self.length
	}

	/// Size of the read-ahead window.
	pub fn buffer_size(&self) -> usize {
		self.buffer.len()
	}

	/// Number of read calls issued against the underlying source.
	pub fn source_reads(&self) -> u64 {
		self.source_reads
	}

	/// Fill `dest` with bytes starting at `offset`.
	pub fn read_into(&mut self, offset: u64, dest: &mut [u8]) -> Result<()> {
		let need = dest.len();
		if need == 0 {
			return Ok(());
		}

		self.ensure_available(offset, need)?;

		if need > self.buffer.len() {
			return self.read_direct(offset, dest);
		}

		if !self.window_contains(offset, need) {
			self.refill(offset)?;
			if self.window_len < need {
				return Err(TreeError::UnexpectedEof {
					at: offset,
					need,
					rem: self.window_len as u64,
				});
			}
		}

		let start = (offset - self.window_start) as usize;
		dest.copy_from_slice(&self.buffer[start..start + need]);
		Ok(())
	}

	/// Read `len` bytes starting at `offset`.
	pub fn read_bytes(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
		self.ensure_available(offset, len)?;
		let mut out = vec![0_u8; len];
		self.read_into(offset, &mut out)?;
		Ok(out)
	}

	/// Read `len` bytes as 8-bit text; invalid sequences are replaced, never rejected.
	pub fn read_string(&mut self, offset: u64, len: usize) -> Result<String> {
		let bytes = self.read_bytes(offset, len)?;
		Ok(String::from_utf8_lossy(&bytes).into_owned())
	}

	/// Read a signed 8-bit integer.
	pub fn read_i8(&mut self, offset: u64) -> Result<i8> {
		Ok(i8::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read an unsigned 8-bit integer.
	pub fn read_u8(&mut self, offset: u64) -> Result<u8> {
		Ok(u8::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a one-byte boolean (any non-zero byte is `true`).
	pub fn read_bool(&mut self, offset: u64) -> Result<bool> {
		Ok(self.read_u8(offset)? != 0)
	}

	/// Read a little-endian `i16`.
	pub fn read_i16(&mut self, offset: u64) -> Result<i16> {
		Ok(i16::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a little-endian `u16`.
	pub fn read_u16(&mut self, offset: u64) -> Result<u16> {
		Ok(u16::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a little-endian `i32`.
	pub fn read_i32(&mut self, offset: u64) -> Result<i32> {
		Ok(i32::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a little-endian `u32`.
	pub fn read_u32(&mut self, offset: u64) -> Result<u32> {
		Ok(u32::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a little-endian `i64`.
	pub fn read_i64(&mut self, offset: u64) -> Result<i64> {
		Ok(i64::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a little-endian `u64`.
	pub fn read_u64(&mut self, offset: u64) -> Result<u64> {
		Ok(u64::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a little-endian `f32`.
	pub fn read_f32(&mut self, offset: u64) -> Result<f32> {
		Ok(f32::from_le_bytes(self.read_fixed(offset)?))
	}

	/// Read a little-endian `f64`.
	pub fn read_f64(&mut self, offset: u64) -> Result<f64> {
		Ok(f64::from_le_bytes(self.read_fixed(offset)?))
	}

	fn read_fixed<const N: usize>(&mut self, offset: u64) -> Result<[u8; N]> {
		let mut out = [0_u8; N];
		self.read_into(offset, &mut out)?;
		Ok(out)
	}

	fn ensure_available(&self, offset: u64, need: usize) -> Result<()> {
		match offset.checked_add(need as u64) {
			Some(end) if end <= self.length => Ok(()),
			_ => Err(self.eof(offset, need)),
		}
	}

	fn window_contains(&self, offset: u64, len: usize) -> bool {
		offset >= self.window_start && offset + len as u64 <= self.window_start + self.window_len as u64
	}

	fn refill(&mut self, offset: u64) -> Result<()> {
		self.seek(offset)?;
		self.window_start = offset;
		self.window_len = 0;

		while self.window_len < self.buffer.len() {
			self.source_reads += 1;
			let read = self.source.read_some(&mut self.buffer[self.window_len..])?;
			if read == 0 {
				break;
			}
			self.window_len += read;
		}
		Ok(())
	}

	fn read_direct(&mut self, offset: u64, dest: &mut [u8]) -> Result<()> {
		self.seek(offset)?;

		let mut filled = 0;
		while filled < dest.len() {
			self.source_reads += 1;
			let read = self.source.read_some(&mut dest[filled..])?;
			if read == 0 {
				return Err(TreeError::UnexpectedEof {
					at: offset,
					need: dest.len(),
					rem: filled as u64,
				});
			}
			filled += read;
		}
		Ok(())
	}

	fn seek(&mut self, offset: u64) -> Result<()> {
		let actual = self.source.seek_to(offset)?;
		if actual != offset {
			return Err(TreeError::SeekMismatch { requested: offset, actual });
		}
		Ok(())
	}

	fn eof(&self, offset: u64, need: usize) -> TreeError {
		TreeError::UnexpectedEof {
			at: offset,
			need,
			rem: self.length.saturating_sub(offset),
		}
	}
}

impl std::fmt::Debug for BufferedReader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BufferedReader")
			.field("length", &self.length)
			.field("buffer_size", &self.buffer.len())
			.field("window_start", &self.window_start)
			.field("window_len", &self.window_len)
			.finish()
	}
}
