use tracing::trace;

use crate::serialized::{Domain, Fields, Node, SchemaNode, SerializedFile, Value};

mod bundle;
mod collections;
mod geometry;
mod guid;
mod pointer;
mod sprite;
mod streaming;
mod texture;

pub use bundle::{AssetBundle, AssetBundleTransformer, AssetInfo, AssetInfoTransformer};
pub use collections::{IndexedArrayTransformer, MapTransformer, PairTransformer, VectorTransformer, index_from_field_name};
pub use geometry::{Rect, RectTransformer, Vector2, Vector3, Vector4, VectorfTransformer};
pub use guid::{Guid, GuidTransformer};
pub use pointer::PointerTransformer;
pub use sprite::{
	Sprite, SpriteAtlas, SpriteAtlasData, SpriteAtlasDataTransformer, SpriteAtlasTransformer, SpriteMeshType, SpritePackingMode, SpritePackingRotation,
	SpriteSettings, SpriteTransformer,
};
pub use streaming::{ReaderLookup, ReferencePath, StreamingInfo, StreamingInfoTransformer};
pub use texture::{PixelDecoder, Texture2D, Texture2DTransformer, TextureFormat};

/// Outcome of offering a node to a [`Transformer`].
#[derive(Debug)]
pub enum Transformed {
	/// Replacement node.
	Applied(Node),
	/// Original node, returned unchanged.
	Declined(Node),
}

impl Transformed {
	/// Apply `domain` when present, otherwise decline.
	pub fn from_domain(node: Node, domain: Option<Domain>) -> Self {
		match domain {
			Some(domain) => Self::Applied(node.with_domain(domain)),
			None => Self::Declined(node),
		}
	}

	/// Whether the transformer produced a replacement.
	pub fn is_applied(&self) -> bool {
		matches!(self, Self::Applied(_))
	}

	/// Resulting node either way.
	pub fn into_node(self) -> Node {
		match self {
			Self::Applied(node) | Self::Declined(node) => node,
		}
	}
}

/// Post-processor that reinterprets decoded nodes of matching schema types.
///
/// Transformers must not mutate anything but the node they are handed.
pub trait Transformer: Send + Sync {
	/// Short name used in diagnostics.
	fn name(&self) -> &'static str;

	/// Whether this transformer is responsible for nodes of `schema`.
	fn matches(&self, schema: &SchemaNode) -> bool;

	/// Rewrite `node`, or hand it back unchanged.
	fn try_transform(&self, node: Node, file: &SerializedFile) -> Transformed;
}

/// Ordered transformer list; the first transformer that matches a schema node is the only one tried.
pub struct Registry {
	transformers: Vec<Box<dyn Transformer>>,
}

impl Registry {
	/// Registry with no transformers; nodes keep their structural form.
	pub fn empty() -> Self {
		Self { transformers: Vec::new() }
	}

	/// Registry with every built-in transformer in its default order.
	pub fn standard() -> Self {
		Self::empty()
			.with(PointerTransformer)
			.with(MapTransformer)
			.with(PairTransformer)
			.with(VectorTransformer)
			.with(VectorfTransformer)
			.with(RectTransformer)
			.with(GuidTransformer)
			.with(StreamingInfoTransformer)
			.with(AssetInfoTransformer)
			.with(AssetBundleTransformer)
			.with(SpriteAtlasDataTransformer)
			.with(SpriteAtlasTransformer)
			.with(SpriteTransformer)
			.with(Texture2DTransformer)
			.with(IndexedArrayTransformer)
	}

	/// Append a transformer, returning the registry.
	pub fn with(mut self, transformer: impl Transformer + 'static) -> Self {
		self.push(transformer);
		self
	}

	/// Append a transformer.
	pub fn push(&mut self, transformer: impl Transformer + 'static) {
		self.transformers.push(Box::new(transformer));
	}

	/// Number of registered transformers.
	pub fn len(&self) -> usize {
		self.transformers.len()
	}

	/// Whether no transformers are registered.
	pub fn is_empty(&self) -> bool {
		self.transformers.is_empty()
	}

	/// Registered transformer names in order.
	pub fn names(&self) -> Vec<&'static str> {
		self.transformers.iter().map(|transformer| transformer.name()).collect()
	}

	/// First transformer matching `schema`.
	pub fn find(&self, schema: &SchemaNode) -> Option<&dyn Transformer> {
		self.transformers.iter().find(|transformer| transformer.matches(schema)).map(|transformer| transformer.as_ref())
	}

	/// Offer `node` to the first matching transformer and return the result.
	pub fn apply(&self, node: Node, file: &SerializedFile) -> Node {
		let Some(transformer) = self.find(&node.schema) else {
			return node;
		};

		match transformer.try_transform(node, file) {
			Transformed::Applied(node) => node,
			Transformed::Declined(node) => {
				trace!(
					transformer = transformer.name(),
					type_name = node.type_name(),
					field_name = node.field_name(),
					offset = node.start_offset,
					"transformer declined"
				);
				node
			}
		}
	}
}

impl Default for Registry {
	fn default() -> Self {
		Self::standard()
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.names()).finish()
	}
}

/// Move the fields of a structural object into a composite record.
fn into_record(mut node: Node, build: impl FnOnce(Fields) -> Domain) -> Transformed {
	match std::mem::replace(&mut node.value, Value::Ignored) {
		Value::Object(fields) => Transformed::Applied(node.with_domain(build(fields))),
		other => {
			node.value = other;
			Transformed::Declined(node)
		}
	}
}

#[cfg(test)]
mod tests;
