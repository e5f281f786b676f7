use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, trace};

use crate::serialized::{Guid, Result, SchemaNode, TreeError};

/// Directory entry of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectInfo {
	/// Object id (path id).
	pub id: i64,
	/// Absolute offset of the object's data.
	pub byte_offset: u64,
}

/// Entry of a file's external reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalReference {
	/// Path of the referenced file.
	pub path: String,
	/// Asset GUID of the referenced file.
	pub guid: Guid,
	/// Reference kind code.
	pub kind: i32,
}

impl ExternalReference {
	/// Reference to `path` with a zero GUID and kind.
	pub fn new(path: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			guid: Guid::default(),
			kind: 0,
		}
	}
}

/// Native view of one opened serialized file.
pub trait SerializedFileHandle: Send {
	/// Number of objects in the file.
	fn object_count(&self) -> Result<usize>;

	/// Directory entries of all objects.
	fn object_infos(&self) -> Result<Vec<ObjectInfo>>;

	/// Number of external references.
	fn external_reference_count(&self) -> Result<usize>;

	/// External reference at `index`.
	fn external_reference(&self, index: usize) -> Result<ExternalReference>;

	/// Root schema node of the object `object_id`.
	fn schema_root(&self, object_id: i64) -> Result<Arc<SchemaNode>>;
}

/// Opens serialized files by path.
pub trait FileSystemProvider {
	/// Open `path`.
	fn open(&self, path: &str) -> Result<Box<dyn SerializedFileHandle>>;
}

/// Directory of one serialized file: objects, external references, and cached schemas.
pub struct SerializedFile {
	path: String,
	handle: Box<dyn SerializedFileHandle>,
	objects: Vec<ObjectInfo>,
	object_index: OnceLock<HashMap<i64, usize>>,
	external_references: Vec<ExternalReference>,
	schemas: Mutex<HashMap<i64, Arc<SchemaNode>>>,
}

impl SerializedFile {
	/// Open `path` through `provider`.
	pub fn open(provider: &dyn FileSystemProvider, path: &str) -> Result<Self> {
		let handle = provider.open(path)?;
		Self::from_handle(path, handle)
	}

	/// Load the object directory and external references from an already opened handle.
	pub fn from_handle(path: impl Into<String>, handle: Box<dyn SerializedFileHandle>) -> Result<Self> {
		let path = path.into();
		let count = handle.object_count()?;
		let objects = handle.object_infos()?;
		if objects.len() != count {
			return Err(TreeError::Provider {
				message: format!("object directory lists {} of {count} objects", objects.len()),
			});
		}
		let external_references = (0..handle.external_reference_count()?)
			.map(|index| handle.external_reference(index))
			.collect::<Result<Vec<_>>>()?;

		debug!(
			path = %path,
			objects = objects.len(),
			external_references = external_references.len(),
			"opened serialized file"
		);

		Ok(Self {
			path,
			handle,
			objects,
			object_index: OnceLock::new(),
			external_references,
			schemas: Mutex::new(HashMap::new()),
		})
	}

	/// Path the file was opened with.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Directory entries in file order.
	pub fn objects(&self) -> &[ObjectInfo] {
		&self.objects
	}

	/// Directory entry of `id`.
	pub fn object(&self, id: i64) -> Option<ObjectInfo> {
		let index = self.object_index.get_or_init(|| self.objects.iter().enumerate().map(|(index, info)| (info.id, index)).collect());
		index.get(&id).map(|&index| self.objects[index])
	}

	/// External references in file order.
	pub fn external_references(&self) -> &[ExternalReference] {
		&self.external_references
	}

	/// External reference at `index`.
	pub fn external_reference(&self, index: usize) -> Option<&ExternalReference> {
		self.external_references.get(index)
	}

	/// Root schema of object `id`, cached after the first lookup.
	pub fn schema_root(&self, id: i64) -> Result<Arc<SchemaNode>> {
		if let Some(schema) = self.schemas.lock().unwrap_or_else(PoisonError::into_inner).get(&id) {
			return Ok(schema.clone());
		}

		if self.object(id).is_none() {
			return Err(TreeError::ObjectNotFound { id });
		}

		trace!(path = %self.path, object_id = id, "schema cache miss");
		let schema = self.handle.schema_root(id)?;
		self.schemas
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.insert(id, schema.clone());
		Ok(schema)
	}

	/// Release the file.
	pub fn close(self) {
		debug!(path = %self.path, "closed serialized file");
	}
}

impl std::fmt::Debug for SerializedFile {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SerializedFile")
			.field("path", &self.path)
			.field("objects", &self.objects.len())
			.field("external_references", &self.external_references)
			.finish()
	}
}

/// In-memory [`SerializedFileHandle`], also usable as a [`FileSystemProvider`] entry.
#[derive(Debug, Clone, Default)]
pub struct MemoryFile {
	objects: Vec<(ObjectInfo, Arc<SchemaNode>)>,
	external_references: Vec<ExternalReference>,
}

impl MemoryFile {
	/// Empty file.
	pub fn new() -> Self {
		Self::default()
	}

	/// Add an object at `byte_offset` described by `schema`.
	pub fn with_object(mut self, id: i64, byte_offset: u64, schema: impl Into<Arc<SchemaNode>>) -> Self {
		self.objects.push((ObjectInfo { id, byte_offset }, schema.into()));
		self
	}

	/// Add an external reference.
	pub fn with_external_reference(mut self, reference: ExternalReference) -> Self {
		self.external_references.push(reference);
		self
	}
}

impl SerializedFileHandle for MemoryFile {
	fn object_count(&self) -> Result<usize> {
		Ok(self.objects.len())
	}

	fn object_infos(&self) -> Result<Vec<ObjectInfo>> {
		Ok(self.objects.iter().map(|(info, _)| *info).collect())
	}

	fn external_reference_count(&self) -> Result<usize> {
		Ok(self.external_references.len())
	}

	fn external_reference(&self, index: usize) -> Result<ExternalReference> {
		self.external_references.get(index).cloned().ok_or_else(|| TreeError::Provider {
			message: format!("external reference {index} out of range"),
		})
	}

	fn schema_root(&self, object_id: i64) -> Result<Arc<SchemaNode>> {
		self.objects
			.iter()
			.find(|(info, _)| info.id == object_id)
			.map(|(_, schema)| schema.clone())
			.ok_or(TreeError::ObjectNotFound { id: object_id })
	}
}

/// [`FileSystemProvider`] over [`MemoryFile`] values keyed by path.
impl FileSystemProvider for HashMap<String, MemoryFile> {
	fn open(&self, path: &str) -> Result<Box<dyn SerializedFileHandle>> {
		self.get(path)
			.cloned()
			.map(|file| Box::new(file) as Box<dyn SerializedFileHandle>)
			.ok_or_else(|| TreeError::FileUnavailable { path: path.to_owned() })
	}
}

#[cfg(test)]
mod tests;
