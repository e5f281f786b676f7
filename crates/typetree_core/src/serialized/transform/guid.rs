use std::fmt;

use serde::{Serialize, Serializer};

use super::collections::indexed_elements;
use crate::serialized::{Domain, Node, SchemaNode, SerializedFile, Transformed, Transformer};

/// 16-byte identifier built from four little-endian `u32` words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Guid(pub [u8; 16]);

impl Guid {
	/// Concatenate the little-endian bytes of four words.
	pub fn from_words(words: [u32; 4]) -> Self {
		let mut bytes = [0_u8; 16];
		for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
			chunk.copy_from_slice(&word.to_le_bytes());
		}
		Self(bytes)
	}

	/// Raw bytes.
	pub fn as_bytes(&self) -> &[u8; 16] {
		&self.0
	}

	/// Whether every byte is zero.
	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|b| *b == 0)
	}

	/// Read a GUID from a `data[0..3]` node or a node already transformed into one.
	pub fn from_node(node: &Node) -> Option<Self> {
		if let Some(guid) = node.as_guid() {
			return Some(guid);
		}

		let elements = indexed_elements(node.fields()?)?;
		if elements.len() != 4 {
			return None;
		}
		let mut words = [0_u32; 4];
		for (word, element) in words.iter_mut().zip(elements) {
			*word = element.as_u32()?;
		}
		Some(Self::from_words(words))
	}
}

impl fmt::Display for Guid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for byte in self.0 {
			write!(f, "{byte:02x}")?;
		}
		Ok(())
	}
}

impl Serialize for Guid {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

/// Reads `GUID` objects of four `data[N]` words.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuidTransformer;

impl Transformer for GuidTransformer {
	fn name(&self) -> &'static str {
		"guid"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "GUID"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let guid = Guid::from_node(&node).map(Domain::Guid);
		Transformed::from_domain(node, guid)
	}
}
