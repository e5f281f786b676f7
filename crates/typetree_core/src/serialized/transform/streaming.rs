use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::serialized::{BufferedReader, Domain, Node, Result, SchemaNode, SerializedFile, SourceOpener, Transformed, Transformer};

/// Looks up an open reader by file path.
pub trait ReaderLookup {
	/// Reader for `path`, or `None` when the path is unknown.
	fn reader(&mut self, path: &str) -> Option<&mut BufferedReader>;
}

impl ReaderLookup for HashMap<String, BufferedReader> {
	fn reader(&mut self, path: &str) -> Option<&mut BufferedReader> {
		self.get_mut(path)
	}
}

/// No readers at all; every lookup reports absence.
impl ReaderLookup for () {
	fn reader(&mut self, _path: &str) -> Option<&mut BufferedReader> {
		None
	}
}

/// Location of bulk data stored outside a serialized file's own byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamingInfo {
	/// Raw resource path as stored in the file.
	pub path: String,
	/// Byte offset inside the resource.
	pub offset: u64,
	/// Payload size in bytes.
	pub size: u64,
}

impl StreamingInfo {
	/// Path handed to reader lookups, reduced to `mount_point/resource_name`.
	pub fn reference_path(&self) -> String {
		ReferencePath::new(&self.path).to_file_path()
	}

	/// Read the payload.
	///
	/// The reader registered for [`Self::reference_path`] is tried first. When it is missing or
	/// fails, a short-lived reader sized to the payload is opened through `opener` instead.
	pub fn fetch(&self, readers: &mut dyn ReaderLookup, opener: &dyn SourceOpener) -> Result<Vec<u8>> {
		let path = self.reference_path();
		let size = usize::try_from(self.size).unwrap_or(usize::MAX);

		match readers.reader(&path) {
			Some(reader) => match reader.read_bytes(self.offset, size) {
				Ok(bytes) => return Ok(bytes),
				Err(err) => warn!(path = %path, offset = self.offset, size = self.size, error = %err, "streamed read failed"),
			},
			None => warn!(path = %path, "no reader registered for streamed resource"),
		}

		warn!(path = %path, "falling back to direct streamed read");
		let mut direct = BufferedReader::new(opener.open_source(&path)?, size)?;
		direct.read_bytes(self.offset, size)
	}
}

/// Resource path split into mount point, innermost parent directory, and resource name.
///
/// Both `/` and `\` separate segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferencePath<'a> {
	raw: &'a str,
	parts: Option<(&'a str, &'a str, &'a str)>,
}

impl<'a> ReferencePath<'a> {
	/// Parse `raw`.
	pub fn new(raw: &'a str) -> Self {
		Self { raw, parts: split(raw) }
	}

	/// Raw path.
	pub fn raw(&self) -> &'a str {
		self.raw
	}

	/// First segment.
	pub fn mount_point(&self) -> Option<&'a str> {
		self.parts.map(|(mount, _, _)| mount)
	}

	/// Segment directly above the resource, empty when there is none.
	pub fn parent_path(&self) -> Option<&'a str> {
		self.parts.map(|(_, parent, _)| parent)
	}

	/// Final segment.
	pub fn resource_path(&self) -> Option<&'a str> {
		self.parts.map(|(_, _, resource)| resource)
	}

	/// `mount_point/resource_name`, or the raw path when it has no separator.
	pub fn to_file_path(&self) -> String {
		match self.parts {
			Some((mount, _, resource)) => format!("{mount}/{resource}"),
			None => self.raw.to_owned(),
		}
	}
}

fn is_separator(c: char) -> bool {
	c == '/' || c == '\\'
}

fn split(raw: &str) -> Option<(&str, &str, &str)> {
	let (mount, rest) = raw.split_once(is_separator)?;
	if mount.is_empty() || rest.is_empty() {
		return None;
	}

	match rest.rsplit_once(is_separator) {
		Some((parents, resource)) if !resource.is_empty() => {
			let parent = parents.rsplit(is_separator).next().unwrap_or(parents);
			Some((mount, parent, resource))
		}
		Some(_) => None,
		None => Some((mount, "", rest)),
	}
}

/// Reads `StreamingInfo` and `StreamedResource` descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingInfoTransformer;

impl Transformer for StreamingInfoTransformer {
	fn name(&self) -> &'static str {
		"streaming_info"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		matches!(schema.type_name(), "StreamingInfo" | "StreamedResource")
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let info = match node.type_name() {
			"StreamingInfo" => streaming_info(&node, ["path", "offset", "size"], |size| size.as_u32().map(u64::from)),
			"StreamedResource" => streaming_info(&node, ["m_Source", "m_Offset", "m_Size"], Node::as_u64),
			_ => None,
		};
		Transformed::from_domain(node, info.map(Domain::Streaming))
	}
}

/// `names` are the path, offset, and size field names; size widths differ between the two layouts.
fn streaming_info(node: &Node, names: [&str; 3], size: impl Fn(&Node) -> Option<u64>) -> Option<StreamingInfo> {
	let [path, offset, size_field] = names;
	let path = node.field(path)?.as_str().filter(|path| !path.is_empty())?;
	Some(StreamingInfo {
		path: path.to_owned(),
		offset: node.field(offset)?.as_u64()?,
		size: size(node.field(size_field)?)?,
	})
}
