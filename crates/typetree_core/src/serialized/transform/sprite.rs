use serde::Serialize;

use super::bundle::pointer_array;
use super::into_record;
use crate::serialized::{ArrayValue, Domain, Fields, Guid, Node, Rect, SchemaNode, SerializedFile, Transformed, Transformer, TypedPointer};

/// Orientation applied to a sprite when it was packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpritePackingRotation {
	/// Not rotated.
	None,
	/// Mirrored horizontally.
	FlipHorizontal,
	/// Mirrored vertically.
	FlipVertical,
	/// Rotated by 180 degrees.
	Rotate180,
	/// Rotated by 90 degrees.
	Rotate90,
	/// Code outside the known set.
	Other(u8),
}

impl SpritePackingRotation {
	fn from_bits(bits: u8) -> Self {
		match bits {
			0 => Self::None,
			1 => Self::FlipHorizontal,
			2 => Self::FlipVertical,
			3 => Self::Rotate180,
			4 => Self::Rotate90,
			other => Self::Other(other),
		}
	}
}

/// How tightly a sprite was packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpritePackingMode {
	/// Packed along its outline.
	Tight,
	/// Packed as a rectangle.
	Rectangle,
}

/// Mesh generated for a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpriteMeshType {
	/// Quad covering the full rectangle.
	FullRect,
	/// Mesh following the outline.
	Tight,
}

/// Bit-packed sprite render settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpriteSettings {
	/// Raw `settingsRaw` word.
	pub raw: u32,
	/// Bit 0.
	pub packed: bool,
	/// Bit 1.
	pub packing_mode: SpritePackingMode,
	/// Bits 2..6.
	pub packing_rotation: SpritePackingRotation,
	/// Bit 6.
	pub mesh_type: SpriteMeshType,
}

impl SpriteSettings {
	/// Decode the packed bit fields of `raw`.
	pub fn from_raw(raw: u32) -> Self {
		Self {
			raw,
			packed: raw & 1 != 0,
			packing_mode: if (raw >> 1) & 1 == 0 { SpritePackingMode::Tight } else { SpritePackingMode::Rectangle },
			packing_rotation: SpritePackingRotation::from_bits(((raw >> 2) & 0xF) as u8),
			mesh_type: if (raw >> 6) & 1 == 0 { SpriteMeshType::FullRect } else { SpriteMeshType::Tight },
		}
	}
}

/// Sprite metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
	/// Settings from `m_RD.settingsRaw`.
	pub settings: SpriteSettings,
	/// Structural fields of the sprite object.
	pub fields: Fields,
}

/// Render data of one sprite inside an atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAtlasData {
	/// Atlas page texture.
	pub texture: TypedPointer,
	/// Separate alpha texture, null when absent.
	pub alpha_texture: TypedPointer,
	/// Sprite rectangle on the page.
	pub texture_rect: Rect,
	/// Settings from `settingsRaw`.
	pub settings: SpriteSettings,
	/// Structural fields of the render data object.
	pub fields: Fields,
}

/// Sprite atlas.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAtlas {
	/// `m_Name`, when present.
	pub name: Option<String>,
	/// Packed sprites paired with their names.
	pub packed_sprites: Vec<(String, TypedPointer)>,
	/// Render data keyed by `(render data key GUID, sprite id)`.
	pub render_data: Vec<((Guid, i64), SpriteAtlasData)>,
	/// Structural fields of the atlas object.
	pub fields: Fields,
}

impl SpriteAtlas {
	/// Render data for one key.
	pub fn render_data_for(&self, guid: Guid, id: i64) -> Option<&SpriteAtlasData> {
		self.render_data.iter().find(|((g, i), _)| *g == guid && *i == id).map(|(_, data)| data)
	}
}

/// Reads `Sprite` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteTransformer;

impl Transformer for SpriteTransformer {
	fn name(&self) -> &'static str {
		"sprite"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "Sprite"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		match node.field_path(&["m_RD", "settingsRaw"]).and_then(Node::as_u32) {
			Some(raw) => into_record(node, |fields| {
				Domain::Sprite(Sprite {
					settings: SpriteSettings::from_raw(raw),
					fields,
				})
			}),
			None => Transformed::Declined(node),
		}
	}
}

/// Reads `SpriteAtlasData` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteAtlasDataTransformer;

impl Transformer for SpriteAtlasDataTransformer {
	fn name(&self) -> &'static str {
		"sprite_atlas_data"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "SpriteAtlasData"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		match atlas_data_parts(&node) {
			Some((texture, alpha_texture, texture_rect, raw)) => into_record(node, |fields| {
				Domain::SpriteAtlasData(SpriteAtlasData {
					texture,
					alpha_texture,
					texture_rect,
					settings: SpriteSettings::from_raw(raw),
					fields,
				})
			}),
			None => Transformed::Declined(node),
		}
	}
}

/// Reads `SpriteAtlas` objects.
///
/// Packed sprites and their names must have equal length. Render data entries with an
/// unreadable key or value are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpriteAtlasTransformer;

impl Transformer for SpriteAtlasTransformer {
	fn name(&self) -> &'static str {
		"sprite_atlas"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "SpriteAtlas"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let name = node.field("m_Name").and_then(Node::as_str).map(str::to_owned);
		let parts = packed_sprites(&node).zip(node.field("m_RenderDataMap").and_then(render_data));

		match parts {
			Some((packed_sprites, render_data)) => into_record(node, |fields| {
				Domain::SpriteAtlas(SpriteAtlas {
					name,
					packed_sprites,
					render_data,
					fields,
				})
			}),
			None => Transformed::Declined(node),
		}
	}
}

fn atlas_data_parts(node: &Node) -> Option<(TypedPointer, TypedPointer, Rect, u32)> {
	Some((
		node.field("texture")?.as_pointer()?.clone(),
		node.field("alphaTexture")?.as_pointer()?.clone(),
		Rect::from_node(node.field("textureRect")?)?,
		node.field("settingsRaw")?.as_u32()?,
	))
}

fn packed_sprites(node: &Node) -> Option<Vec<(String, TypedPointer)>> {
	let sprites = pointer_array(node.field("m_PackedSprites")?)?;
	let names = text_array(node.field("m_PackedSpriteNamesToIndex")?)?;
	if names.len() != sprites.len() {
		return None;
	}
	Some(names.into_iter().zip(sprites).collect())
}

fn text_array(node: &Node) -> Option<Vec<String>> {
	match node.as_array()? {
		ArrayValue::Nodes(elements) => elements.iter().map(|element| element.as_str().map(str::to_owned)).collect(),
		ArrayValue::Packed(packed) if packed.is_empty() => Some(Vec::new()),
		ArrayValue::Packed(_) => None,
	}
}

fn render_data(node: &Node) -> Option<Vec<((Guid, i64), SpriteAtlasData)>> {
	let entries = node.as_map()?;
	Some(
		entries
			.iter()
			.filter_map(|entry| {
				let (guid, id) = entry.key.as_pair()?;
				let key = (Guid::from_node(guid)?, id.as_i64()?);
				match entry.value.as_domain()? {
					Domain::SpriteAtlasData(data) => Some((key, data.clone())),
					_ => None,
				}
			})
			.collect(),
	)
}
