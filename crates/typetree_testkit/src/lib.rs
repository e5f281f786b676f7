//! Shared test helpers for workspace crates.

use std::io::Write;

use tempfile::NamedTempFile;

/// Write `bytes` to a fresh temporary file that is deleted on drop.
pub fn temp_file(bytes: &[u8]) -> NamedTempFile {
	let mut file = NamedTempFile::new().expect("temp file is created");
	file.write_all(bytes).expect("temp file is written");
	file.flush().expect("temp file is flushed");
	file
}

/// Little-endian payload builder for synthetic serialized data.
#[derive(Debug, Clone, Default)]
pub struct ByteWriter {
	bytes: Vec<u8>,
}

impl ByteWriter {
	/// Create an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current length, which is also the offset of the next write.
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Whether nothing has been written.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Append raw bytes.
	pub fn bytes(mut self, bytes: &[u8]) -> Self {
		self.bytes.extend_from_slice(bytes);
		self
	}

	/// Append one byte.
	pub fn u8(self, value: u8) -> Self {
		self.bytes(&[value])
	}

	/// Append a little-endian `i16`.
	pub fn i16(self, value: i16) -> Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append a little-endian `i32`.
	pub fn i32(self, value: i32) -> Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append a little-endian `u32`.
	pub fn u32(self, value: u32) -> Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append a little-endian `i64`.
	pub fn i64(self, value: i64) -> Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append a little-endian `u64`.
	pub fn u64(self, value: u64) -> Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append a little-endian `f32`.
	pub fn f32(self, value: f32) -> Self {
		self.bytes(&value.to_le_bytes())
	}

	/// Append a length-prefixed string without alignment padding.
	pub fn string(self, value: &str) -> Self {
		let len = i32::try_from(value.len()).expect("string fits in i32");
		self.i32(len).bytes(value.as_bytes())
	}

	/// Append zero bytes up to the next 4-byte boundary.
	pub fn align4(mut self) -> Self {
		while self.bytes.len() % 4 != 0 {
			self.bytes.push(0);
		}
		self
	}

	/// Finish and return the payload.
	pub fn finish(self) -> Vec<u8> {
		self.bytes
	}
}

#[cfg(test)]
mod tests {
	use super::ByteWriter;

	#[test]
	fn strings_are_length_prefixed_and_alignable() {
		let bytes = ByteWriter::new().string("abcde").align4().finish();
		assert_eq!(&bytes[..4], &5_i32.to_le_bytes());
		assert_eq!(&bytes[4..9], b"abcde");
		assert_eq!(bytes.len(), 12);
	}
}
