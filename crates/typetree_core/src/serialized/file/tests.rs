use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::serialized::{
	ExternalReference, FileSystemProvider, MemoryFile, ObjectInfo, Result, SchemaNode, SerializedFile, SerializedFileHandle, TreeError,
};

fn sample() -> MemoryFile {
	MemoryFile::new()
		.with_object(7, 0, SchemaNode::leaf("int", "Base", 4))
		.with_object(-3, 16, SchemaNode::leaf("float", "Base", 4))
		.with_external_reference(ExternalReference::new("shared.assets"))
}

#[test]
fn directory_lists_objects_and_references() {
	let file = SerializedFile::from_handle("level0", Box::new(sample())).expect("file loads");

	assert_eq!(file.path(), "level0");
	assert_eq!(file.objects().len(), 2);
	assert_eq!(file.object(-3), Some(ObjectInfo { id: -3, byte_offset: 16 }));
	assert_eq!(file.object(99), None);
	assert_eq!(file.external_reference(0).map(|r| r.path.as_str()), Some("shared.assets"));
	assert!(file.external_reference(1).is_none());
}

#[test]
fn unknown_object_has_no_schema() {
	let file = SerializedFile::from_handle("level0", Box::new(sample())).expect("file loads");
	let err = file.schema_root(42).expect_err("unknown object");
	assert!(matches!(err, TreeError::ObjectNotFound { id: 42 }));
}

struct CountingHandle {
	inner: MemoryFile,
	schema_calls: Arc<AtomicUsize>,
}

impl SerializedFileHandle for CountingHandle {
	fn object_count(&self) -> Result<usize> {
		self.inner.object_count()
	}

	fn object_infos(&self) -> Result<Vec<ObjectInfo>> {
		self.inner.object_infos()
	}

	fn external_reference_count(&self) -> Result<usize> {
		self.inner.external_reference_count()
	}

	fn external_reference(&self, index: usize) -> Result<ExternalReference> {
		self.inner.external_reference(index)
	}

	fn schema_root(&self, object_id: i64) -> Result<Arc<SchemaNode>> {
		self.schema_calls.fetch_add(1, Ordering::SeqCst);
		self.inner.schema_root(object_id)
	}
}

#[test]
fn schema_roots_are_cached_per_object() {
	let calls = Arc::new(AtomicUsize::new(0));
	let handle = CountingHandle {
		inner: sample(),
		schema_calls: calls.clone(),
	};
	let file = SerializedFile::from_handle("level0", Box::new(handle)).expect("file loads");

	let first = file.schema_root(7).expect("schema exists");
	let second = file.schema_root(7).expect("schema cached");
	assert!(Arc::ptr_eq(&first, &second));
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	file.schema_root(-3).expect("other schema exists");
	assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn memory_provider_opens_known_paths_only() {
	let mut files = HashMap::new();
	files.insert("level0".to_owned(), sample());

	let file = SerializedFile::open(&files, "level0").expect("known path opens");
	assert_eq!(file.objects().len(), 2);
	file.close();

	let err = SerializedFile::open(&files, "missing").expect_err("unknown path fails");
	assert!(matches!(err, TreeError::FileUnavailable { .. }));

	let handle = files.open("level0").expect("handle opens");
	assert_eq!(handle.object_count().expect("count"), 2);
}

struct ShortDirectory(MemoryFile);

impl SerializedFileHandle for ShortDirectory {
	fn object_count(&self) -> Result<usize> {
		Ok(self.0.object_count()? + 1)
	}

	fn object_infos(&self) -> Result<Vec<ObjectInfo>> {
		self.0.object_infos()
	}

	fn external_reference_count(&self) -> Result<usize> {
		self.0.external_reference_count()
	}

	fn external_reference(&self, index: usize) -> Result<ExternalReference> {
		self.0.external_reference(index)
	}

	fn schema_root(&self, object_id: i64) -> Result<Arc<SchemaNode>> {
		self.0.schema_root(object_id)
	}
}

#[test]
fn directory_shorter_than_object_count_fails() {
	let err = SerializedFile::from_handle("level0", Box::new(ShortDirectory(sample()))).expect_err("truncated directory");
	assert!(matches!(err, TreeError::Provider { ref message } if message.contains("2 of 3")));
}
