use std::collections::HashMap;

use serde::Serialize;

use super::into_record;
use crate::serialized::{ArrayValue, Domain, Fields, Node, SchemaNode, SerializedFile, Transformed, Transformer, TypedPointer};

/// One container entry of an asset bundle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetInfo {
	/// First preload table index used by the asset.
	pub preload_index: i32,
	/// Number of preload table entries used by the asset.
	pub preload_size: i32,
	/// Main asset object.
	pub asset: TypedPointer,
}

impl AssetInfo {
	/// Read an entry from a structural `AssetInfo` node or a node already transformed into one.
	pub fn from_node(node: &Node) -> Option<Self> {
		if let Some(Domain::AssetInfo(info)) = node.as_domain() {
			return Some(info.clone());
		}
		Some(Self {
			preload_index: node.field("preloadIndex")?.as_i32()?,
			preload_size: node.field("preloadSize")?.as_i32()?,
			asset: node.field("asset")?.as_pointer()?.clone(),
		})
	}

	/// Slice of `preload_table` belonging to this asset; out-of-range parts are dropped.
	pub fn preload_assets<'a>(&self, preload_table: &'a [TypedPointer]) -> &'a [TypedPointer] {
		let start = usize::try_from(self.preload_index).unwrap_or(0).min(preload_table.len());
		let len = usize::try_from(self.preload_size).unwrap_or(0);
		let end = start.saturating_add(len).min(preload_table.len());
		&preload_table[start..end]
	}
}

/// Asset bundle manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBundle {
	/// Objects preloaded with the bundle.
	pub preload_table: Vec<TypedPointer>,
	/// Container entries grouped by asset path, in first-seen key order.
	pub container: Vec<(String, Vec<AssetInfo>)>,
	/// Structural fields of the manifest object.
	pub fields: Fields,
}

impl AssetBundle {
	/// Entries registered under `path`.
	pub fn entries(&self, path: &str) -> Option<&[AssetInfo]> {
		self.container.iter().find(|(key, _)| key == path).map(|(_, infos)| infos.as_slice())
	}
}

/// Reads `AssetInfo` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetInfoTransformer;

impl Transformer for AssetInfoTransformer {
	fn name(&self) -> &'static str {
		"asset_info"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "AssetInfo"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let info = AssetInfo::from_node(&node).map(Domain::AssetInfo);
		Transformed::from_domain(node, info)
	}
}

/// Reads `AssetBundle` manifests. Both the preload table and the container are required.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssetBundleTransformer;

impl Transformer for AssetBundleTransformer {
	fn name(&self) -> &'static str {
		"asset_bundle"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "AssetBundle"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let parts = node
			.field("m_PreloadTable")
			.and_then(pointer_array)
			.zip(node.field("m_Container").and_then(container));
		match parts {
			Some((preload_table, container)) => into_record(node, |fields| {
				Domain::AssetBundle(AssetBundle {
					preload_table,
					container,
					fields,
				})
			}),
			None => Transformed::Declined(node),
		}
	}
}

/// Pointers held by an array node; every element must be a pointer.
pub(crate) fn pointer_array(node: &Node) -> Option<Vec<TypedPointer>> {
	match node.as_array()? {
		ArrayValue::Nodes(elements) => elements.iter().map(|element| element.as_pointer().cloned()).collect(),
		ArrayValue::Packed(packed) if packed.is_empty() => Some(Vec::new()),
		ArrayValue::Packed(_) => None,
	}
}

/// Entries whose key is not text or whose value is not an `AssetInfo` are skipped.
fn container(node: &Node) -> Option<Vec<(String, Vec<AssetInfo>)>> {
	let mut grouped: Vec<(String, Vec<AssetInfo>)> = Vec::new();
	let mut positions: HashMap<&str, usize> = HashMap::new();
	for entry in node.as_map()? {
		let Some(key) = entry.key.as_str() else { continue };
		if entry.value.type_name() != "AssetInfo" {
			continue;
		}
		let Some(info) = AssetInfo::from_node(&entry.value) else { continue };

		match positions.get(key) {
			Some(&position) => grouped[position].1.push(info),
			None => {
				positions.insert(key, grouped.len());
				grouped.push((key.to_owned(), vec![info]));
			}
		}
	}
	Some(grouped)
}
