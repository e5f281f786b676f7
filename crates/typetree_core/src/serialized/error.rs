use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Errors produced while reading, decoding, and resolving serialized file data.
#[derive(Debug, Error)]
pub enum TreeError {
	/// Filesystem or stream IO failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Not enough bytes remained for a requested read.
	#[error("unexpected eof at offset {at}, need {need} bytes, remaining {rem}")]
	UnexpectedEof {
		/// Byte offset where the read was attempted.
		at: u64,
		/// Requested bytes.
		need: usize,
		/// Bytes still available.
		rem: u64,
	},
	/// Byte source landed somewhere other than the requested offset.
	#[error("seek to {requested} landed at {actual}")]
	SeekMismatch {
		/// Requested absolute offset.
		requested: u64,
		/// Offset reported by the source.
		actual: u64,
	},
	/// Array schema whose first child is not a 4-byte leaf length field.
	#[error("unexpected array size node in {type_name} (size={byte_size})")]
	ArraySizeNode {
		/// Array node type name.
		type_name: String,
		/// Declared byte size of the first child.
		byte_size: i32,
	},
	/// Array schema without an element child.
	#[error("array {type_name} has no element schema")]
	ArrayElementMissing {
		/// Array node type name.
		type_name: String,
	},
	/// Schema construct that this decoder does not model.
	#[error("{type_name} not implemented")]
	NotSupported {
		/// Offending node type name.
		type_name: String,
	},
	/// Decoder recursion depth exceeded configured limit.
	#[error("decode depth exceeded (max={max_depth})")]
	DecodeDepthExceeded {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Requested array length exceeded configured limit.
	#[error("decode array too large: count={count}, max={max}")]
	DecodeArrayTooLarge {
		/// Requested array length.
		count: usize,
		/// Maximum permitted array length.
		max: usize,
	},
	/// Failure inside one schema node, annotated with its position.
	#[error("in node {type_name} \"{field_name}\" at offset {offset}: {source}")]
	Node {
		/// Node type name.
		type_name: String,
		/// Node field name.
		field_name: String,
		/// Start offset of the failing node.
		offset: u64,
		/// Underlying failure.
		source: Box<TreeError>,
	},
	/// Null pointer was dereferenced.
	#[error("dereferenced null pointer")]
	NullPointer,
	/// Serialized file lookup reported absence.
	#[error("serialized file unavailable: {path}")]
	FileUnavailable {
		/// Requested file path.
		path: String,
	},
	/// Reader lookup reported absence.
	#[error("reader unavailable: {path}")]
	ReaderUnavailable {
		/// Requested file path.
		path: String,
	},
	/// Pointer file id does not name an external reference.
	#[error("file id {file_id} out of range ({count} external references)")]
	ExternalReferenceOutOfRange {
		/// Pointer file id.
		file_id: i32,
		/// Number of external references of the owning file.
		count: usize,
	},
	/// Object id is not listed in the file directory.
	#[error("object not found: {id}")]
	ObjectNotFound {
		/// Requested object id.
		id: i64,
	},
	/// Native provider reported a failure that is not an IO error.
	#[error("provider: {message}")]
	Provider {
		/// Provider supplied description.
		message: String,
	},
}

/// One `(type, field, offset)` frame of a failing decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFrame {
	/// Node type name.
	pub type_name: String,
	/// Node field name.
	pub field_name: String,
	/// Start offset of the node.
	pub offset: u64,
}

impl TreeError {
	/// Return the schema path of a nested decode failure, outermost first.
	pub fn node_path(&self) -> Vec<NodeFrame> {
		let mut out = Vec::new();
		let mut current = self;
		while let Self::Node {
			type_name,
			field_name,
			offset,
			source,
		} = current
		{
			out.push(NodeFrame {
				type_name: type_name.clone(),
				field_name: field_name.clone(),
				offset: *offset,
			});
			current = source;
		}
		out
	}

	/// Return the innermost failure beneath any node context frames.
	pub fn root_cause(&self) -> &TreeError {
		let mut current = self;
		while let Self::Node { source, .. } = current {
			current = source;
		}
		current
	}
}
