use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use crate::serialized::Result;

/// Random-access byte source underneath a [`BufferedReader`](crate::serialized::BufferedReader).
///
/// Any `Read + Seek` value qualifies, including files and in-memory cursors.
pub trait ByteSource: Send {
	/// Seek to an absolute offset, returning the offset actually reached.
	fn seek_to(&mut self, offset: u64) -> io::Result<u64>;

	/// Read up to `dest.len()` bytes, returning the count read (`0` at end of data).
	fn read_some(&mut self, dest: &mut [u8]) -> io::Result<usize>;

	/// Total length in bytes.
	fn length(&mut self) -> io::Result<u64>;
}

impl<T: Read + Seek + Send> ByteSource for T {
	fn seek_to(&mut self, offset: u64) -> io::Result<u64> {
		self.seek(SeekFrom::Start(offset))
	}

	fn read_some(&mut self, dest: &mut [u8]) -> io::Result<usize> {
		loop {
			match self.read(dest) {
				Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
				other => return other,
			}
		}
	}

	fn length(&mut self) -> io::Result<u64> {
		let pos = self.stream_position()?;
		let len = self.seek(SeekFrom::End(0))?;
		self.seek(SeekFrom::Start(pos))?;
		Ok(len)
	}
}

/// Opens byte sources by path for direct, short-lived reads.
pub trait SourceOpener {
	/// Open `path` as a byte source.
	fn open_source(&self, path: &str) -> Result<Box<dyn ByteSource>>;
}

/// [`SourceOpener`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl SourceOpener for FsOpener {
	fn open_source(&self, path: &str) -> Result<Box<dyn ByteSource>> {
		Ok(Box::new(File::open(path)?))
	}
}
