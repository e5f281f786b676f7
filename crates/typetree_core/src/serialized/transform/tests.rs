use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use typetree_testkit::ByteWriter;

use crate::serialized::{
	Ancestors, ArrayValue, BufferedReader, ByteSource, DecodeOptions, Domain, Guid, MemoryFile, Node, PackedArray, PixelDecoder, Rect, Registry,
	Result, SchemaNode, SerializedFile, SourceOpener, SpriteMeshType, SpritePackingMode, SpritePackingRotation, TextureFormat, Transformed,
	Transformer, TreeError, TypedPointer, Value, Vector3, decode_node,
};

fn decode_with(registry: &Registry, schema: SchemaNode, bytes: Vec<u8>) -> Node {
	let file = SerializedFile::from_handle("level0", Box::new(MemoryFile::new())).expect("file loads");
	let mut reader = BufferedReader::from_bytes(bytes, 32).expect("reader builds");
	decode_node(
		&file,
		&mut reader,
		&Ancestors::empty(),
		0,
		&Arc::new(schema),
		registry,
		&DecodeOptions::default(),
	)
	.expect("node decodes")
}

fn decode(schema: SchemaNode, bytes: Vec<u8>) -> Node {
	decode_with(&Registry::standard(), schema, bytes)
}

fn pptr(field: &str, target: &str) -> SchemaNode {
	SchemaNode::object(
		format!("PPtr<{target}>"),
		field,
		vec![SchemaNode::leaf("int", "m_FileID", 4), SchemaNode::leaf("SInt64", "m_PathID", 8)],
	)
}

/// `first` and `second` must already carry those field names.
fn pair(first: SchemaNode, second: SchemaNode) -> SchemaNode {
	SchemaNode::object("pair", "data", vec![first, second])
}

fn map(field: &str, entry: SchemaNode) -> SchemaNode {
	SchemaNode::object("map", field, vec![SchemaNode::array("Array", entry)])
}

struct Fixed {
	name: &'static str,
	guid: Option<Guid>,
}

impl Transformer for Fixed {
	fn name(&self) -> &'static str {
		self.name
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "Thing"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		Transformed::from_domain(node, self.guid.map(Domain::Guid))
	}
}

fn thing() -> SchemaNode {
	SchemaNode::object("Thing", "Base", vec![SchemaNode::leaf("int", "m_Value", 4)])
}

#[test]
fn first_registered_transformer_wins() {
	let first = Guid::from_words([1, 0, 0, 0]);
	let second = Guid::from_words([2, 0, 0, 0]);
	let registry = Registry::empty()
		.with(Fixed {
			name: "first",
			guid: Some(first),
		})
		.with(Fixed {
			name: "second",
			guid: Some(second),
		});
	assert_eq!(registry.names(), ["first", "second"]);

	let node = decode_with(&registry, thing(), ByteWriter::new().i32(3).finish());
	assert_eq!(node.as_guid(), Some(first));
}

#[test]
fn declined_node_keeps_structural_form() {
	let registry = Registry::empty()
		.with(Fixed { name: "declines", guid: None })
		.with(Fixed {
			name: "unreached",
			guid: Some(Guid::from_words([9, 9, 9, 9])),
		});
	let bytes = ByteWriter::new().i32(3).finish();

	let transformed = decode_with(&registry, thing(), bytes.clone());
	let structural = decode_with(&Registry::empty(), thing(), bytes);
	assert_eq!(transformed, structural);
	assert_eq!(transformed.field("m_Value").and_then(Node::as_i32), Some(3));
}

#[test]
fn pointer_reads_file_and_object_ids() {
	let bytes = ByteWriter::new().bytes(&[0x01, 0, 0, 0]).bytes(&[0x2A, 0, 0, 0, 0, 0, 0, 0]).finish();
	let node = decode(pptr("m_Texture", "Texture2D"), bytes);

	let pointer = node.as_pointer().expect("pointer value");
	assert_eq!(pointer, &TypedPointer::new("Texture2D", 1, 42, "level0"));
	assert_eq!((node.start_offset, node.end_offset), (0, 12));
}

#[test]
fn pointer_with_zero_object_id_is_null() {
	let node = decode(pptr("m_Texture", "Texture2D"), ByteWriter::new().i32(1).i64(0).finish());
	assert!(node.as_pointer().expect("pointer value").is_null());
}

#[test]
fn malformed_pointer_schema_declines() {
	let schema = SchemaNode::object("PPtr<Mesh>", "m_Mesh", vec![SchemaNode::leaf("int", "m_FileID", 4)]);
	let node = decode(schema, ByteWriter::new().i32(0).finish());
	assert!(node.as_pointer().is_none());
	assert!(node.field("m_FileID").is_some());
}

#[test]
fn map_collects_pairs() {
	let schema = map("m_Lookup", pair(SchemaNode::string("first").aligned(), SchemaNode::leaf("int", "second", 4)));
	let bytes = ByteWriter::new().u32(2).string("ab").align4().i32(1).string("xyz").align4().i32(2).finish();

	let node = decode(schema, bytes);
	let entries = node.as_map().expect("map value");
	let flat: Vec<_> = entries
		.iter()
		.map(|entry| (entry.key.as_str().expect("text key"), entry.value.as_i32().expect("int value")))
		.collect();
	assert_eq!(flat, [("ab", 1), ("xyz", 2)]);
	assert_eq!(node.end_offset, 28);
}

#[test]
fn empty_map_has_no_entries() {
	let schema = map("m_Lookup", pair(SchemaNode::string("first"), SchemaNode::leaf("int", "second", 4)));
	let node = decode(schema, ByteWriter::new().u32(0).finish());
	assert_eq!(node.as_map().map(<[_]>::len), Some(0));
}

#[test]
fn pair_without_second_stays_structural() {
	let schema = SchemaNode::object("pair", "data", vec![SchemaNode::leaf("int", "first", 4), SchemaNode::leaf("int", "other", 4)]);
	let node = decode(schema, ByteWriter::new().i32(1).i32(2).finish());

	assert!(node.as_pair().is_none());
	assert!(matches!(node.value, Value::Object(_)));
	assert_eq!(node.field("first").and_then(Node::as_i32), Some(1));
	assert_eq!(node.field("other").and_then(Node::as_i32), Some(2));
}

#[test]
fn vector_exposes_inner_array() {
	let schema = SchemaNode::object("vector", "m_Items", vec![SchemaNode::array("Array", SchemaNode::leaf("int", "data", 4))]);
	let node = decode(schema, ByteWriter::new().u32(2).i32(5).i32(6).finish());

	assert_eq!(node.as_array(), Some(&ArrayValue::Packed(PackedArray::I32(vec![5, 6]))));
	assert_eq!(node.type_name(), "vector");
	assert_eq!(node.end_offset, 12);
}

#[test]
fn geometry_records_require_float_fields() {
	let vector = SchemaNode::object(
		"Vector3f",
		"m_Position",
		vec![SchemaNode::leaf("float", "x", 4), SchemaNode::leaf("float", "y", 4), SchemaNode::leaf("float", "z", 4)],
	);
	let node = decode(vector, ByteWriter::new().f32(1.0).f32(2.0).f32(3.0).finish());
	assert_eq!(node.as_domain(), Some(&Domain::Vector3(Vector3 { x: 1.0, y: 2.0, z: 3.0 })));

	let rect = SchemaNode::object(
		"Rectf",
		"m_Rect",
		["x", "y", "width", "height"].into_iter().map(|name| SchemaNode::leaf("float", name, 4)).collect(),
	);
	let node = decode(rect, ByteWriter::new().f32(0.5).f32(1.5).f32(8.0).f32(4.0).finish());
	assert_eq!(
		node.as_rect(),
		Some(Rect {
			x: 0.5,
			y: 1.5,
			width: 8.0,
			height: 4.0
		})
	);

	let ints = SchemaNode::object("Vector2f", "m_Size", vec![SchemaNode::leaf("int", "x", 4), SchemaNode::leaf("int", "y", 4)]);
	let node = decode(ints, ByteWriter::new().i32(1).i32(2).finish());
	assert!(node.as_domain().is_none());
}

fn guid_schema(field: &str) -> SchemaNode {
	SchemaNode::object(
		"GUID",
		field,
		(0..4).map(|index| SchemaNode::leaf("unsigned int", format!("data[{index}]"), 4)).collect(),
	)
}

#[test]
fn guid_concatenates_little_endian_words() {
	let node = decode(guid_schema("m_Guid"), ByteWriter::new().u32(0x0403_0201).u32(0).u32(0).u32(0xFF).finish());
	let guid = node.as_guid().expect("guid value");
	assert_eq!(guid.as_bytes()[..4], [1, 2, 3, 4]);
	assert_eq!(guid.as_bytes()[12], 0xFF);
	assert_eq!(guid.to_string(), "010203040000000000000000ff000000");
}

#[test]
fn indexed_objects_become_arrays_in_field_order() {
	let schema = SchemaNode::object(
		"Hash",
		"m_Hash",
		vec![SchemaNode::leaf("UInt8", "data[1]", 1), SchemaNode::leaf("UInt8", "data[0]", 1)],
	);
	let node = decode(schema, vec![0xB, 0xA]);
	let elements = node.as_array().and_then(ArrayValue::nodes).expect("indexed elements");
	let values: Vec<_> = elements.iter().filter_map(Node::as_u32).collect();
	assert_eq!(values, [0xB, 0xA]);
	assert_eq!(elements[0].field_name(), "data[1]");

	let gapped = SchemaNode::object(
		"Hash",
		"m_Hash",
		vec![SchemaNode::leaf("UInt8", "data[0]", 1), SchemaNode::leaf("UInt8", "data[2]", 1)],
	);
	let node = decode(gapped, vec![1, 2]);
	assert!(node.as_array().is_none());
	assert!(node.field("data[2]").is_some());
}

fn streaming_schema() -> SchemaNode {
	SchemaNode::object(
		"StreamingInfo",
		"m_StreamData",
		vec![SchemaNode::leaf("UInt64", "offset", 8), SchemaNode::leaf("unsigned int", "size", 4), SchemaNode::string("path")],
	)
}

#[test]
fn streaming_info_requires_a_path() {
	let node = decode(streaming_schema(), ByteWriter::new().u64(16).u32(64).string("archive:/CAB-1/CAB-1.resS").finish());
	let info = node.as_streaming_info().expect("streaming value");
	assert_eq!((info.offset, info.size), (16, 64));
	assert_eq!(info.reference_path(), "archive:/CAB-1.resS");

	let node = decode(streaming_schema(), ByteWriter::new().u64(0).u32(0).i32(0).finish());
	assert!(node.as_streaming_info().is_none());
}

fn streamed_resource_schema() -> SchemaNode {
	SchemaNode::object(
		"StreamedResource",
		"m_Resource",
		vec![SchemaNode::string("m_Source").aligned(), SchemaNode::leaf("UInt64", "m_Offset", 8), SchemaNode::leaf("UInt64", "m_Size", 8)],
	)
}

#[test]
fn streamed_resource_reads_source_and_wide_size() {
	let bytes = ByteWriter::new().string("a/b/c.resS").align4().u64(3).u64(5).finish();
	let node = decode(streamed_resource_schema(), bytes);
	let info = node.as_streaming_info().expect("streamed resource value");
	assert_eq!(info.path, "a/b/c.resS");
	assert_eq!((info.offset, info.size), (3, 5));

	let node = decode(streamed_resource_schema(), ByteWriter::new().i32(0).u64(3).u64(5).finish());
	assert!(node.as_streaming_info().is_none());
	assert!(node.field("m_Source").is_some());
}

#[test]
fn sprite_settings_are_unpacked() {
	let schema = SchemaNode::object(
		"Sprite",
		"Base",
		vec![SchemaNode::object("SpriteRenderData", "m_RD", vec![SchemaNode::leaf("unsigned int", "settingsRaw", 4)])],
	);
	let raw = 1 | (1 << 1) | (3 << 2) | (1 << 6);
	let node = decode(schema, ByteWriter::new().u32(raw).finish());

	let Some(Domain::Sprite(sprite)) = node.as_domain() else {
		panic!("expected sprite, got {:?}", node.value);
	};
	assert!(sprite.settings.packed);
	assert_eq!(sprite.settings.packing_mode, SpritePackingMode::Rectangle);
	assert_eq!(sprite.settings.packing_rotation, SpritePackingRotation::Rotate180);
	assert_eq!(sprite.settings.mesh_type, SpriteMeshType::Tight);
	assert_eq!(node.field_path(&["m_RD", "settingsRaw"]).and_then(Node::as_u32), Some(raw));
}

fn asset_info(field: &str) -> SchemaNode {
	SchemaNode::object(
		"AssetInfo",
		field,
		vec![SchemaNode::leaf("int", "preloadIndex", 4), SchemaNode::leaf("int", "preloadSize", 4), pptr("asset", "Object")],
	)
}

#[test]
fn asset_bundle_groups_container_entries() {
	let schema = SchemaNode::object(
		"AssetBundle",
		"Base",
		vec![
			SchemaNode::string("m_Name").aligned(),
			SchemaNode::array("m_PreloadTable", pptr("data", "Object")),
			map("m_Container", pair(SchemaNode::string("first").aligned(), asset_info("second"))),
		],
	);
	let mut bytes = ByteWriter::new().string("bundle").align4().u32(2).i32(0).i64(10).i32(0).i64(11).u32(3);
	for (key, index, size, id) in [("a", 0, 1, 10), ("b", 1, 1, 11), ("a", 0, 2, 12)] {
		bytes = bytes.string(key).align4().i32(index).i32(size).i32(0).i64(id);
	}
	let node = decode(schema, bytes.finish());

	let Some(Domain::AssetBundle(bundle)) = node.as_domain() else {
		panic!("expected bundle, got {:?}", node.value);
	};
	assert_eq!(bundle.preload_table.iter().map(|p| p.object_id).collect::<Vec<_>>(), [10, 11]);
	let keys: Vec<_> = bundle.container.iter().map(|(key, infos)| (key.as_str(), infos.len())).collect();
	assert_eq!(keys, [("a", 2), ("b", 1)]);

	let a = bundle.entries("a").expect("entries under a");
	assert_eq!(a[1].asset.object_id, 12);
	assert_eq!(a[1].preload_assets(&bundle.preload_table).len(), 2);
	assert_eq!(node.field("m_Name").and_then(Node::as_str), Some("bundle"));
}

struct CopyDecoder;

impl PixelDecoder for CopyDecoder {
	fn decode(&self, format: TextureFormat, _width: u32, _height: u32, raw: &[u8], out: &mut [u8]) -> Result<()> {
		if format != TextureFormat::Rgba32 || raw.len() != out.len() {
			return Err(TreeError::NotSupported {
				type_name: format!("{format:?}"),
			});
		}
		out.copy_from_slice(raw);
		Ok(())
	}
}

struct MemoryOpener(HashMap<String, Vec<u8>>);

impl SourceOpener for MemoryOpener {
	fn open_source(&self, path: &str) -> Result<Box<dyn ByteSource>> {
		let bytes = self.0.get(path).cloned().ok_or_else(|| TreeError::ReaderUnavailable { path: path.to_owned() })?;
		Ok(Box::new(Cursor::new(bytes)))
	}
}

fn texture_schema() -> SchemaNode {
	SchemaNode::object(
		"Texture2D",
		"Base",
		vec![
			SchemaNode::string("m_Name").aligned(),
			SchemaNode::leaf("int", "m_Width", 4),
			SchemaNode::leaf("int", "m_Height", 4),
			SchemaNode::leaf("int", "m_TextureFormat", 4),
			SchemaNode::array("image data", SchemaNode::leaf("UInt8", "data", 1)).aligned(),
			streaming_schema(),
		],
	)
}

#[test]
fn texture_pixels_come_from_streamed_resource() {
	let bytes = ByteWriter::new()
		.string("tex")
		.align4()
		.i32(1)
		.i32(1)
		.i32(4)
		.u32(0)
		.u64(2)
		.u32(4)
		.string("archive:/CAB-1/CAB-1.resS")
		.finish();
	let node = decode(texture_schema(), bytes);
	let Some(Domain::Texture2D(texture)) = node.as_domain() else {
		panic!("expected texture, got {:?}", node.value);
	};
	assert_eq!(texture.name.as_deref(), Some("tex"));
	assert_eq!(texture.format, TextureFormat::Rgba32);
	assert!(texture.inline_data().is_none());

	let resource = vec![9, 9, 1, 2, 3, 4];
	let mut readers = HashMap::new();
	readers.insert(
		"archive:/CAB-1.resS".to_owned(),
		BufferedReader::from_bytes(resource.clone(), 8).expect("resource reader"),
	);
	let opener = MemoryOpener(HashMap::new());
	let pixels = texture.decode_pixels(&mut readers, &opener, &CopyDecoder).expect("decodes");
	assert_eq!(pixels, Some(vec![1, 2, 3, 4]));

	let mut files = HashMap::new();
	files.insert("archive:/CAB-1.resS".to_owned(), resource);
	let fallback = MemoryOpener(files);
	let raw = texture.raw_data(&mut (), &fallback).expect("direct read");
	assert_eq!(raw, [1, 2, 3, 4]);
}

#[test]
fn texture_with_inline_data_or_missing_header() {
	let bytes = ByteWriter::new()
		.string("")
		.i32(1)
		.i32(1)
		.i32(4)
		.u32(4)
		.bytes(&[5, 6, 7, 8])
		.u64(0)
		.u32(0)
		.i32(0)
		.finish();
	let node = decode(texture_schema(), bytes);
	let Some(Domain::Texture2D(texture)) = node.as_domain() else {
		panic!("expected texture, got {:?}", node.value);
	};
	assert_eq!(texture.inline_data(), Some(vec![5, 6, 7, 8]));
	let opener = MemoryOpener(HashMap::new());
	assert_eq!(texture.decode_pixels(&mut (), &opener, &CopyDecoder).expect("decodes"), Some(vec![5, 6, 7, 8]));

	let headless = SchemaNode::object("Texture2D", "Base", vec![SchemaNode::leaf("int", "m_Width", 4)]);
	let node = decode(headless, ByteWriter::new().i32(1).finish());
	assert!(matches!(node.value, Value::Object(_)));
}
