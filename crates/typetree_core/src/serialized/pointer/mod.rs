use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::serialized::{DecodeOptions, Node, ReaderLookup, Registry, Result, SerializedFile, TreeError, decode_object};

/// Looks up an opened serialized file by path.
pub trait DirectoryLookup {
	/// File opened under `path`, or `None` when the path is unknown.
	fn serialized_file(&self, path: &str) -> Option<&SerializedFile>;
}

impl DirectoryLookup for HashMap<String, SerializedFile> {
	fn serialized_file(&self, path: &str) -> Option<&SerializedFile> {
		self.get(path)
	}
}

/// A single file serves lookups for its own path only.
impl DirectoryLookup for SerializedFile {
	fn serialized_file(&self, path: &str) -> Option<&SerializedFile> {
		(self.path() == path).then_some(self)
	}
}

/// Cross-file object reference.
///
/// `file_id == 0` targets the owning file; `file_id == n` targets external reference `n - 1`
/// of the owning file. `object_id == 0` is the null pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TypedPointer {
	/// Target type named by the `PPtr<X>` schema.
	pub type_hint: String,
	/// Owner-relative file index.
	pub file_id: i32,
	/// Target object id.
	pub object_id: i64,
	/// Path of the file the pointer was decoded from.
	pub owner_file_path: String,
}

impl TypedPointer {
	/// Build a pointer decoded from `owner_file_path`.
	pub fn new(type_hint: impl Into<String>, file_id: i32, object_id: i64, owner_file_path: impl Into<String>) -> Self {
		Self {
			type_hint: type_hint.into(),
			file_id,
			object_id,
			owner_file_path: owner_file_path.into(),
		}
	}

	/// Null pointer with no type, file, or owner.
	pub fn null() -> Self {
		Self::new("", 0, 0, "")
	}

	/// Whether the pointer targets nothing.
	pub fn is_null(&self) -> bool {
		self.object_id == 0
	}

	/// Path of the file holding the target, resolved through the owner's external references.
	pub fn target_path<'a>(&'a self, owner: &'a SerializedFile) -> Result<&'a str> {
		if self.file_id == 0 {
			return Ok(owner.path());
		}

		let count = owner.external_references().len();
		usize::try_from(self.file_id)
			.ok()
			.and_then(|file_id| file_id.checked_sub(1))
			.and_then(|index| owner.external_reference(index))
			.map(|reference| reference.path.as_str())
			.ok_or(TreeError::ExternalReferenceOutOfRange {
				file_id: self.file_id,
				count,
			})
	}

	/// Decode the target object, reporting why it could not be reached.
	///
	/// Null pointers fail with [`TreeError::NullPointer`] before any lookup. Every call decodes
	/// the target afresh.
	pub fn try_resolve(
		&self,
		files: &dyn DirectoryLookup,
		readers: &mut dyn ReaderLookup,
		registry: &Registry,
		options: &DecodeOptions,
	) -> Result<Node> {
		if self.is_null() {
			return Err(TreeError::NullPointer);
		}

		let owner = files.serialized_file(&self.owner_file_path).ok_or_else(|| TreeError::FileUnavailable {
			path: self.owner_file_path.clone(),
		})?;
		let path = self.target_path(owner)?;
		let target = files
			.serialized_file(path)
			.ok_or_else(|| TreeError::FileUnavailable { path: path.to_owned() })?;
		let reader = readers
			.reader(path)
			.ok_or_else(|| TreeError::ReaderUnavailable { path: path.to_owned() })?;

		decode_object(target, reader, self.object_id, registry, options)
	}

	/// Decode the target object, or `None` when it cannot be reached.
	pub fn resolve(&self, files: &dyn DirectoryLookup, readers: &mut dyn ReaderLookup, registry: &Registry, options: &DecodeOptions) -> Option<Node> {
		match self.try_resolve(files, readers, registry, options) {
			Ok(node) => Some(node),
			Err(TreeError::NullPointer) => {
				debug!(type_hint = %self.type_hint, owner = %self.owner_file_path, "dereferenced null pointer");
				None
			}
			Err(err) => {
				warn!(
					type_hint = %self.type_hint,
					file_id = self.file_id,
					object_id = self.object_id,
					owner = %self.owner_file_path,
					error = %err,
					"pointer left unresolved"
				);
				None
			}
		}
	}
}

impl Default for TypedPointer {
	fn default() -> Self {
		Self::null()
	}
}
