//! JSON rendering of decoded object graphs.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue, json};

use crate::serialized::{ArrayValue, Domain, Fields, Node, Primitive, SpriteAtlasData, Value};

/// Render `node` and everything beneath it.
///
/// Objects become `{"type", "fields"}`; transformer output becomes `{"type", "domain", "value"}`
/// plus `"fields"` for records that keep their structural fields.
pub fn to_json(node: &Node) -> JsonValue {
	match &node.value {
		Value::Primitive(value) => primitive_to_json(*value),
		Value::Text(text) => json!(text),
		Value::Array(ArrayValue::Packed(packed)) => JsonValue::Array(packed.iter().map(primitive_to_json).collect()),
		Value::Array(ArrayValue::Nodes(nodes)) => JsonValue::Array(nodes.iter().map(to_json).collect()),
		Value::Object(fields) => {
			let mut out = Map::new();
			out.insert("type".to_owned(), json!(node.type_name()));
			out.insert("fields".to_owned(), fields_to_json(fields));
			JsonValue::Object(out)
		}
		Value::Ignored => JsonValue::Null,
		Value::Domain(domain) => domain_to_json(node.type_name(), domain),
	}
}

fn primitive_to_json(value: Primitive) -> JsonValue {
	match value {
		Primitive::I8(v) => json!(v),
		Primitive::U8(v) => json!(v),
		Primitive::Bool(v) => json!(v),
		Primitive::I16(v) => json!(v),
		Primitive::U16(v) => json!(v),
		Primitive::I32(v) => json!(v),
		Primitive::U32(v) => json!(v),
		Primitive::I64(v) => json!(v),
		Primitive::U64(v) => json!(v),
		Primitive::F32(v) => json!(v),
		Primitive::F64(v) => json!(v),
	}
}

fn fields_to_json(fields: &Fields) -> JsonValue {
	JsonValue::Object(fields.iter().map(|(name, node)| (name.to_owned(), to_json(node))).collect())
}

fn serialized(value: &impl Serialize) -> JsonValue {
	serde_json::to_value(value).unwrap_or(JsonValue::Null)
}

fn atlas_data_to_json(data: &SpriteAtlasData) -> JsonValue {
	json!({
		"texture": serialized(&data.texture),
		"alpha_texture": serialized(&data.alpha_texture),
		"texture_rect": serialized(&data.texture_rect),
		"settings": serialized(&data.settings),
	})
}

fn domain_to_json(type_name: &str, domain: &Domain) -> JsonValue {
	let value = match domain {
		Domain::Pointer(pointer) => serialized(pointer),
		Domain::Map(entries) => entries
			.iter()
			.map(|entry| json!({ "key": to_json(&entry.key), "value": to_json(&entry.value) }))
			.collect(),
		Domain::Pair { first, second } => json!({ "first": to_json(first), "second": to_json(second) }),
		Domain::Vector2(v) => serialized(v),
		Domain::Vector3(v) => serialized(v),
		Domain::Vector4(v) => serialized(v),
		Domain::Rect(rect) => serialized(rect),
		Domain::Guid(guid) => serialized(guid),
		Domain::Streaming(info) => serialized(info),
		Domain::AssetInfo(info) => serialized(info),
		Domain::AssetBundle(bundle) => json!({
			"preload_table": serialized(&bundle.preload_table),
			"container": bundle
				.container
				.iter()
				.map(|(key, infos)| json!({ "key": key, "assets": serialized(infos) }))
				.collect::<Vec<_>>(),
		}),
		Domain::SpriteAtlas(atlas) => json!({
			"name": atlas.name,
			"packed_sprites": atlas
				.packed_sprites
				.iter()
				.map(|(name, pointer)| json!({ "name": name, "sprite": serialized(pointer) }))
				.collect::<Vec<_>>(),
			"render_data": atlas
				.render_data
				.iter()
				.map(|((guid, id), data)| json!({ "guid": serialized(guid), "id": id, "data": atlas_data_to_json(data) }))
				.collect::<Vec<_>>(),
		}),
		Domain::SpriteAtlasData(data) => atlas_data_to_json(data),
		Domain::Sprite(sprite) => json!({ "settings": serialized(&sprite.settings) }),
		Domain::Texture2D(texture) => json!({
			"name": texture.name,
			"width": texture.width,
			"height": texture.height,
			"format": serialized(&texture.format),
		}),
	};

	let mut out = Map::new();
	out.insert("type".to_owned(), json!(type_name));
	out.insert("domain".to_owned(), json!(domain.kind()));
	out.insert("value".to_owned(), value);
	if let Some(fields) = domain.fields() {
		out.insert("fields".to_owned(), fields_to_json(fields));
	}
	JsonValue::Object(out)
}
