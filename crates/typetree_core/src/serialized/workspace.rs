use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use crate::serialized::{
	BufferedReader, DecodeOptions, FileSystemProvider, Node, Registry, Result, SerializedFile, SourceOpener, TreeError, TypedPointer, decode_object,
};

/// Opened serialized files and their readers, keyed by path.
///
/// Files stay open until [`Workspace::close`]; pointer resolution borrows the file table and the
/// reader table separately, so decoded objects never hold on to either.
#[derive(Debug)]
pub struct Workspace {
	files: HashMap<String, SerializedFile>,
	readers: HashMap<String, BufferedReader>,
	buffer_size: usize,
}

impl Default for Workspace {
	fn default() -> Self {
		Self::new(BufferedReader::DEFAULT_BUFFER_SIZE)
	}
}

impl Workspace {
	/// Empty workspace whose readers use `buffer_size` byte windows.
	pub fn new(buffer_size: usize) -> Self {
		Self {
			files: HashMap::new(),
			readers: HashMap::new(),
			buffer_size,
		}
	}

	/// Open `path` unless it is already open.
	///
	/// The directory comes from `provider` and the byte stream from `opener`.
	pub fn open(&mut self, provider: &dyn FileSystemProvider, opener: &dyn SourceOpener, path: &str) -> Result<&SerializedFile> {
		match self.files.entry(path.to_owned()) {
			Entry::Occupied(entry) => Ok(entry.into_mut()),
			Entry::Vacant(entry) => {
				let file = SerializedFile::open(provider, path)?;
				let reader = BufferedReader::new(opener.open_source(path)?, self.buffer_size)?;
				self.readers.insert(path.to_owned(), reader);
				Ok(entry.insert(file))
			}
		}
	}

	/// Open every external reference of the already opened `path`.
	///
	/// Returns the paths that could not be opened.
	pub fn open_references(&mut self, provider: &dyn FileSystemProvider, opener: &dyn SourceOpener, path: &str) -> Result<Vec<String>> {
		let references: Vec<String> = self
			.file(path)
			.ok_or_else(|| TreeError::FileUnavailable { path: path.to_owned() })?
			.external_references()
			.iter()
			.map(|reference| reference.path.clone())
			.collect();

		let mut failed = Vec::new();
		for reference in references {
			if let Err(err) = self.open(provider, opener, &reference) {
				debug!(path = %reference, error = %err, "external reference not opened");
				failed.push(reference);
			}
		}
		Ok(failed)
	}

	/// Register an already opened reader, such as one for a streamed resource file.
	pub fn insert_reader(&mut self, path: impl Into<String>, reader: BufferedReader) -> Option<BufferedReader> {
		self.readers.insert(path.into(), reader)
	}

	/// File opened under `path`.
	pub fn file(&self, path: &str) -> Option<&SerializedFile> {
		self.files.get(path)
	}

	/// Reader registered under `path`.
	pub fn reader_mut(&mut self, path: &str) -> Option<&mut BufferedReader> {
		self.readers.get_mut(path)
	}

	/// All registered readers, usable as a [`ReaderLookup`](crate::serialized::ReaderLookup).
	pub fn readers_mut(&mut self) -> &mut HashMap<String, BufferedReader> {
		&mut self.readers
	}

	/// Paths of the opened files.
	pub fn paths(&self) -> impl Iterator<Item = &str> {
		self.files.keys().map(String::as_str)
	}

	/// Decode object `object_id` of the opened file `path`.
	pub fn decode(&mut self, path: &str, object_id: i64, registry: &Registry, options: &DecodeOptions) -> Result<Node> {
		let file = self.files.get(path).ok_or_else(|| TreeError::FileUnavailable { path: path.to_owned() })?;
		let reader = self
			.readers
			.get_mut(path)
			.ok_or_else(|| TreeError::ReaderUnavailable { path: path.to_owned() })?;
		decode_object(file, reader, object_id, registry, options)
	}

	/// Resolve `pointer` against the opened files, or `None` when its target is unreachable.
	pub fn resolve(&mut self, pointer: &TypedPointer, registry: &Registry, options: &DecodeOptions) -> Option<Node> {
		pointer.resolve(&self.files, &mut self.readers, registry, options)
	}

	/// Like [`Workspace::resolve`], reporting why the target is unreachable.
	pub fn try_resolve(&mut self, pointer: &TypedPointer, registry: &Registry, options: &DecodeOptions) -> Result<Node> {
		pointer.try_resolve(&self.files, &mut self.readers, registry, options)
	}

	/// Close `path` and drop its reader. Returns whether the file was open.
	pub fn close(&mut self, path: &str) -> bool {
		self.readers.remove(path);
		match self.files.remove(path) {
			Some(file) => {
				file.close();
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use std::io::Cursor;

	use typetree_testkit::ByteWriter;

	use super::Workspace;
	use crate::serialized::{
		ByteSource, DecodeOptions, ExternalReference, MemoryFile, Node, Registry, Result, SchemaNode, SourceOpener, TreeError, TypedPointer,
	};

	struct MemoryOpener(HashMap<String, Vec<u8>>);

	impl SourceOpener for MemoryOpener {
		fn open_source(&self, path: &str) -> Result<Box<dyn ByteSource>> {
			let bytes = self.0.get(path).cloned().ok_or_else(|| TreeError::ReaderUnavailable { path: path.to_owned() })?;
			Ok(Box::new(Cursor::new(bytes)))
		}
	}

	fn setup() -> (HashMap<String, MemoryFile>, MemoryOpener) {
		let schema = || SchemaNode::object("Counter", "Base", vec![SchemaNode::leaf("int", "m_Count", 4)]);
		let mut files = HashMap::new();
		files.insert(
			"level0".to_owned(),
			MemoryFile::new()
				.with_object(1, 0, schema())
				.with_external_reference(ExternalReference::new("shared.assets"))
				.with_external_reference(ExternalReference::new("missing.assets")),
		);
		files.insert("shared.assets".to_owned(), MemoryFile::new().with_object(5, 0, schema()));

		let mut bytes = HashMap::new();
		bytes.insert("level0".to_owned(), ByteWriter::new().i32(10).finish());
		bytes.insert("shared.assets".to_owned(), ByteWriter::new().i32(20).finish());
		(files, MemoryOpener(bytes))
	}

	#[test]
	fn opens_references_and_resolves_across_files() {
		let (provider, opener) = setup();
		let mut workspace = Workspace::default();
		workspace.open(&provider, &opener, "level0").expect("level opens");
		let failed = workspace.open_references(&provider, &opener, "level0").expect("references visited");
		assert_eq!(failed, ["missing.assets"]);

		let registry = Registry::standard();
		let options = DecodeOptions::default();
		let node = workspace.decode("level0", 1, &registry, &options).expect("local decode");
		assert_eq!(node.field("m_Count").and_then(Node::as_i32), Some(10));

		let pointer = TypedPointer::new("Counter", 1, 5, "level0");
		let target = workspace.resolve(&pointer, &registry, &options).expect("external target");
		assert_eq!(target.field("m_Count").and_then(Node::as_i32), Some(20));

		let dangling = TypedPointer::new("Counter", 2, 5, "level0");
		assert!(workspace.resolve(&dangling, &registry, &options).is_none());
		assert!(matches!(
			workspace.try_resolve(&dangling, &registry, &options),
			Err(TreeError::FileUnavailable { .. })
		));
	}

	#[test]
	fn close_releases_file_and_reader() {
		let (provider, opener) = setup();
		let mut workspace = Workspace::new(16);
		workspace.open(&provider, &opener, "shared.assets").expect("opens");
		workspace.open(&provider, &opener, "shared.assets").expect("reopen is a lookup");
		assert_eq!(workspace.paths().count(), 1);

		assert!(workspace.close("shared.assets"));
		assert!(!workspace.close("shared.assets"));
		assert!(workspace.file("shared.assets").is_none());
		assert!(workspace.reader_mut("shared.assets").is_none());
	}
}
