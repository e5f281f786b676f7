use std::sync::Arc;

use crate::serialized::{
	Ancestors, AssetBundle, AssetInfo, Guid, PrimitiveKind, Rect, SchemaNode, Sprite, SpriteAtlas, SpriteAtlasData, StreamingInfo, Texture2D,
	TypedPointer, Vector2, Vector3, Vector4, align_offset,
};

/// One decoded schema node: the structural envelope plus its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
	/// Schema node this value was decoded from.
	pub schema: Arc<SchemaNode>,
	/// Enclosing schema nodes, root first when collected.
	pub ancestors: Ancestors,
	/// Absolute offset of the first byte.
	pub start_offset: u64,
	/// Absolute offset one past the last byte, before alignment.
	pub end_offset: u64,
	/// Decoded payload.
	pub value: Value,
}

/// Decoded payload of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	/// Fixed-size leaf value.
	Primitive(Primitive),
	/// Length-prefixed text.
	Text(String),
	/// Length-prefixed sequence.
	Array(ArrayValue),
	/// Named fields in schema order.
	Object(Fields),
	/// Region skipped without decoding.
	Ignored,
	/// Value produced by a transformer.
	Domain(Box<Domain>),
}

/// Decoded leaf value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
	/// Signed 8-bit integer.
	I8(i8),
	/// Unsigned 8-bit integer.
	U8(u8),
	/// Signed 16-bit integer.
	I16(i16),
	/// Unsigned 16-bit integer.
	U16(u16),
	/// Signed 32-bit integer.
	I32(i32),
	/// Unsigned 32-bit integer.
	U32(u32),
	/// Signed 64-bit integer.
	I64(i64),
	/// Unsigned 64-bit integer.
	U64(u64),
	/// 32-bit float.
	F32(f32),
	/// 64-bit float.
	F64(f64),
	/// Boolean.
	Bool(bool),
}

impl Primitive {
	/// Kind tag of this value.
	pub fn kind(self) -> PrimitiveKind {
		match self {
			Self::I8(_) => PrimitiveKind::I8,
			Self::U8(_) => PrimitiveKind::U8,
			Self::I16(_) => PrimitiveKind::I16,
			Self::U16(_) => PrimitiveKind::U16,
			Self::I32(_) => PrimitiveKind::I32,
			Self::U32(_) => PrimitiveKind::U32,
			Self::I64(_) => PrimitiveKind::I64,
			Self::U64(_) => PrimitiveKind::U64,
			Self::F32(_) => PrimitiveKind::F32,
			Self::F64(_) => PrimitiveKind::F64,
			Self::Bool(_) => PrimitiveKind::Bool,
		}
	}

	/// Decode one little-endian value of `kind` from the front of `bytes`.
	pub fn from_le_bytes(kind: PrimitiveKind, bytes: &[u8]) -> Option<Self> {
		let bytes = bytes.get(..kind.width())?;
		Some(match kind {
			PrimitiveKind::I8 => Self::I8(i8::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::U8 => Self::U8(bytes[0]),
			PrimitiveKind::Bool => Self::Bool(bytes[0] != 0),
			PrimitiveKind::I16 => Self::I16(i16::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::U16 => Self::U16(u16::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::I32 => Self::I32(i32::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::U32 => Self::U32(u32::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::I64 => Self::I64(i64::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::U64 => Self::U64(u64::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::F32 => Self::F32(f32::from_le_bytes(bytes.try_into().ok()?)),
			PrimitiveKind::F64 => Self::F64(f64::from_le_bytes(bytes.try_into().ok()?)),
		})
	}

	/// Integer value as `i64`, if it is an integer that fits.
	pub fn as_i64(self) -> Option<i64> {
		match self {
			Self::I8(v) => Some(v.into()),
			Self::U8(v) => Some(v.into()),
			Self::I16(v) => Some(v.into()),
			Self::U16(v) => Some(v.into()),
			Self::I32(v) => Some(v.into()),
			Self::U32(v) => Some(v.into()),
			Self::I64(v) => Some(v),
			Self::U64(v) => i64::try_from(v).ok(),
			Self::F32(_) | Self::F64(_) | Self::Bool(_) => None,
		}
	}

	/// Integer value as `u64`, if it is a non-negative integer.
	pub fn as_u64(self) -> Option<u64> {
		match self {
			Self::U64(v) => Some(v),
			other => other.as_i64().and_then(|v| u64::try_from(v).ok()),
		}
	}

	/// Value of a 32-bit float leaf. Other widths are rejected.
	pub fn as_f32(self) -> Option<f32> {
		match self {
			Self::F32(v) => Some(v),
			_ => None,
		}
	}

	/// Float value widened to `f64`.
	pub fn as_f64(self) -> Option<f64> {
		match self {
			Self::F32(v) => Some(v.into()),
			Self::F64(v) => Some(v),
			_ => None,
		}
	}

	/// Boolean value.
	pub fn as_bool(self) -> Option<bool> {
		match self {
			Self::Bool(v) => Some(v),
			_ => None,
		}
	}
}

/// Decoded array elements.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayValue {
	/// Contiguous primitives, used when the element schema is a basic leaf.
	Packed(PackedArray),
	/// Individually decoded elements.
	Nodes(Vec<Node>),
}

impl ArrayValue {
	/// Number of elements.
	pub fn len(&self) -> usize {
		match self {
			Self::Packed(packed) => packed.len(),
			Self::Nodes(nodes) => nodes.len(),
		}
	}

	/// Whether the array has no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Packed primitive storage, if any.
	pub fn packed(&self) -> Option<&PackedArray> {
		match self {
			Self::Packed(packed) => Some(packed),
			Self::Nodes(_) => None,
		}
	}

	/// Decoded element nodes, if any.
	pub fn nodes(&self) -> Option<&[Node]> {
		match self {
			Self::Nodes(nodes) => Some(nodes),
			Self::Packed(_) => None,
		}
	}
}

/// Homogeneous primitive storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PackedArray {
	/// `i8` elements.
	I8(Vec<i8>),
	/// `u8` elements.
	U8(Vec<u8>),
	/// `i16` elements.
	I16(Vec<i16>),
	/// `u16` elements.
	U16(Vec<u16>),
	/// `i32` elements.
	I32(Vec<i32>),
	/// `u32` elements.
	U32(Vec<u32>),
	/// `i64` elements.
	I64(Vec<i64>),
	/// `u64` elements.
	U64(Vec<u64>),
	/// `f32` elements.
	F32(Vec<f32>),
	/// `f64` elements.
	F64(Vec<f64>),
	/// `bool` elements.
	Bool(Vec<bool>),
}

macro_rules! unpack {
	($bytes:expr, $ty:ty) => {
		$bytes
			.chunks_exact(std::mem::size_of::<$ty>())
			.map(|chunk| {
				let mut raw = [0_u8; std::mem::size_of::<$ty>()];
				raw.copy_from_slice(chunk);
				<$ty>::from_le_bytes(raw)
			})
			.collect()
	};
}

impl PackedArray {
	/// Split little-endian `bytes` into elements of `kind`. Trailing partial elements are dropped.
	pub fn from_le_bytes(kind: PrimitiveKind, bytes: &[u8]) -> Self {
		match kind {
			PrimitiveKind::I8 => Self::I8(bytes.iter().map(|b| *b as i8).collect()),
			PrimitiveKind::U8 => Self::U8(bytes.to_vec()),
			PrimitiveKind::Bool => Self::Bool(bytes.iter().map(|b| *b != 0).collect()),
			PrimitiveKind::I16 => Self::I16(unpack!(bytes, i16)),
			PrimitiveKind::U16 => Self::U16(unpack!(bytes, u16)),
			PrimitiveKind::I32 => Self::I32(unpack!(bytes, i32)),
			PrimitiveKind::U32 => Self::U32(unpack!(bytes, u32)),
			PrimitiveKind::I64 => Self::I64(unpack!(bytes, i64)),
			PrimitiveKind::U64 => Self::U64(unpack!(bytes, u64)),
			PrimitiveKind::F32 => Self::F32(unpack!(bytes, f32)),
			PrimitiveKind::F64 => Self::F64(unpack!(bytes, f64)),
		}
	}

	/// Element kind.
	pub fn kind(&self) -> PrimitiveKind {
		match self {
			Self::I8(_) => PrimitiveKind::I8,
			Self::U8(_) => PrimitiveKind::U8,
			Self::I16(_) => PrimitiveKind::I16,
			Self::U16(_) => PrimitiveKind::U16,
			Self::I32(_) => PrimitiveKind::I32,
			Self::U32(_) => PrimitiveKind::U32,
			Self::I64(_) => PrimitiveKind::I64,
			Self::U64(_) => PrimitiveKind::U64,
			Self::F32(_) => PrimitiveKind::F32,
			Self::F64(_) => PrimitiveKind::F64,
			Self::Bool(_) => PrimitiveKind::Bool,
		}
	}

	/// Number of elements.
	pub fn len(&self) -> usize {
		match self {
			Self::I8(v) => v.len(),
			Self::U8(v) => v.len(),
			Self::I16(v) => v.len(),
			Self::U16(v) => v.len(),
			Self::I32(v) => v.len(),
			Self::U32(v) => v.len(),
			Self::I64(v) => v.len(),
			Self::U64(v) => v.len(),
			Self::F32(v) => v.len(),
			Self::F64(v) => v.len(),
			Self::Bool(v) => v.len(),
		}
	}

	/// Whether there are no elements.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Element at `index`.
	pub fn get(&self, index: usize) -> Option<Primitive> {
		Some(match self {
			Self::I8(v) => Primitive::I8(*v.get(index)?),
			Self::U8(v) => Primitive::U8(*v.get(index)?),
			Self::I16(v) => Primitive::I16(*v.get(index)?),
			Self::U16(v) => Primitive::U16(*v.get(index)?),
			Self::I32(v) => Primitive::I32(*v.get(index)?),
			Self::U32(v) => Primitive::U32(*v.get(index)?),
			Self::I64(v) => Primitive::I64(*v.get(index)?),
			Self::U64(v) => Primitive::U64(*v.get(index)?),
			Self::F32(v) => Primitive::F32(*v.get(index)?),
			Self::F64(v) => Primitive::F64(*v.get(index)?),
			Self::Bool(v) => Primitive::Bool(*v.get(index)?),
		})
	}

	/// Iterate elements as [`Primitive`] values.
	pub fn iter(&self) -> impl Iterator<Item = Primitive> + '_ {
		(0..self.len()).filter_map(|index| self.get(index))
	}

	/// Byte payload of a one-byte integer array.
	pub fn to_bytes(&self) -> Option<Vec<u8>> {
		match self {
			Self::U8(v) => Some(v.clone()),
			Self::I8(v) => Some(v.iter().map(|b| *b as u8).collect()),
			_ => None,
		}
	}
}

/// Ordered field map keyed by schema field name.
///
/// Inserting an existing name replaces the value in place, so the last write wins and the
/// first occurrence keeps its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
	entries: Vec<(Box<str>, Node)>,
}

impl Fields {
	/// Empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Empty map with room for `capacity` fields.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			entries: Vec::with_capacity(capacity),
		}
	}

	/// Insert or replace a field, returning the replaced node.
	pub fn insert(&mut self, name: impl Into<Box<str>>, node: Node) -> Option<Node> {
		let name = name.into();
		match self.entries.iter_mut().find(|(key, _)| *key == name) {
			Some((_, slot)) => Some(std::mem::replace(slot, node)),
			None => {
				self.entries.push((name, node));
				None
			}
		}
	}

	/// Field by name.
	pub fn get(&self, name: &str) -> Option<&Node> {
		self.entries.iter().find(|(key, _)| key.as_ref() == name).map(|(_, node)| node)
	}

	/// Remove a field by name.
	pub fn remove(&mut self, name: &str) -> Option<Node> {
		let index = self.entries.iter().position(|(key, _)| key.as_ref() == name)?;
		Some(self.entries.remove(index).1)
	}

	/// Whether `name` is present.
	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Number of fields.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether there are no fields.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Field names in order.
	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.iter().map(|(key, _)| key.as_ref())
	}

	/// `(name, node)` pairs in order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
		self.entries.iter().map(|(key, node)| (key.as_ref(), node))
	}
}

impl IntoIterator for Fields {
	type Item = (Box<str>, Node);
	type IntoIter = std::vec::IntoIter<(Box<str>, Node)>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

/// One `map` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
	/// Entry key.
	pub key: Node,
	/// Entry value.
	pub value: Node,
}

/// Transformer-produced value.
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
	/// Cross-file object pointer.
	Pointer(TypedPointer),
	/// Key/value entries of a `map`.
	Map(Vec<MapEntry>),
	/// `first`/`second` of a `pair`.
	Pair {
		/// First element.
		first: Node,
		/// Second element.
		second: Node,
	},
	/// Two-component float vector.
	Vector2(Vector2),
	/// Three-component float vector.
	Vector3(Vector3),
	/// Four-component float vector.
	Vector4(Vector4),
	/// Float rectangle.
	Rect(Rect),
	/// 16-byte identifier.
	Guid(Guid),
	/// Out-of-file payload descriptor.
	Streaming(StreamingInfo),
	/// Bundle container entry.
	AssetInfo(AssetInfo),
	/// Bundle manifest.
	AssetBundle(AssetBundle),
	/// Sprite atlas.
	SpriteAtlas(SpriteAtlas),
	/// Render data of one packed sprite.
	SpriteAtlasData(SpriteAtlasData),
	/// Sprite metadata.
	Sprite(Sprite),
	/// Texture header.
	Texture2D(Texture2D),
}

impl Domain {
	/// Stable label of the variant.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Pointer(_) => "pointer",
			Self::Map(_) => "map",
			Self::Pair { .. } => "pair",
			Self::Vector2(_) => "vector2",
			Self::Vector3(_) => "vector3",
			Self::Vector4(_) => "vector4",
			Self::Rect(_) => "rect",
			Self::Guid(_) => "guid",
			Self::Streaming(_) => "streaming_info",
			Self::AssetInfo(_) => "asset_info",
			Self::AssetBundle(_) => "asset_bundle",
			Self::SpriteAtlas(_) => "sprite_atlas",
			Self::SpriteAtlasData(_) => "sprite_atlas_data",
			Self::Sprite(_) => "sprite",
			Self::Texture2D(_) => "texture2d",
		}
	}

	/// Structural fields kept by composite records.
	pub fn fields(&self) -> Option<&Fields> {
		match self {
			Self::AssetBundle(record) => Some(&record.fields),
			Self::SpriteAtlas(record) => Some(&record.fields),
			Self::SpriteAtlasData(record) => Some(&record.fields),
			Self::Sprite(record) => Some(&record.fields),
			Self::Texture2D(record) => Some(&record.fields),
			_ => None,
		}
	}
}

impl Node {
	/// Build a node.
	pub fn new(schema: Arc<SchemaNode>, ancestors: Ancestors, start_offset: u64, end_offset: u64, value: Value) -> Self {
		Self {
			schema,
			ancestors,
			start_offset,
			end_offset,
			value,
		}
	}

	/// Schema type name.
	pub fn type_name(&self) -> &str {
		self.schema.type_name()
	}

	/// Schema field name.
	pub fn field_name(&self) -> &str {
		self.schema.field_name()
	}

	/// Offset at which the next sibling starts.
	pub fn next_offset(&self) -> u64 {
		align_offset(self.end_offset, &self.schema)
	}

	/// Replace the value, keeping the envelope.
	pub fn with_value(mut self, value: Value) -> Self {
		self.value = value;
		self
	}

	/// Replace the value with a domain value, keeping the envelope.
	pub fn with_domain(self, domain: Domain) -> Self {
		self.with_value(Value::Domain(Box::new(domain)))
	}

	/// Object fields, including those kept by composite domain records.
	pub fn fields(&self) -> Option<&Fields> {
		match &self.value {
			Value::Object(fields) => Some(fields),
			Value::Domain(domain) => domain.fields(),
			_ => None,
		}
	}

	/// Take the fields of a structural object.
	pub fn into_fields(self) -> Option<Fields> {
		match self.value {
			Value::Object(fields) => Some(fields),
			_ => None,
		}
	}

	/// Field by name.
	pub fn field(&self, name: &str) -> Option<&Node> {
		self.fields()?.get(name)
	}

	/// Leaf value.
	pub fn as_primitive(&self) -> Option<Primitive> {
		match self.value {
			Value::Primitive(value) => Some(value),
			_ => None,
		}
	}

	/// Integer value as `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		self.as_primitive()?.as_i64()
	}

	/// Integer value as `i32`.
	pub fn as_i32(&self) -> Option<i32> {
		self.as_i64().and_then(|v| i32::try_from(v).ok())
	}

	/// Integer value as `u64`.
	pub fn as_u64(&self) -> Option<u64> {
		self.as_primitive()?.as_u64()
	}

	/// Integer value as `u32`.
	pub fn as_u32(&self) -> Option<u32> {
		self.as_u64().and_then(|v| u32::try_from(v).ok())
	}

	/// Value of a 32-bit float leaf.
	pub fn as_f32(&self) -> Option<f32> {
		self.as_primitive()?.as_f32()
	}

	/// Boolean value.
	pub fn as_bool(&self) -> Option<bool> {
		self.as_primitive()?.as_bool()
	}

	/// Text value.
	pub fn as_str(&self) -> Option<&str> {
		match &self.value {
			Value::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Array value.
	pub fn as_array(&self) -> Option<&ArrayValue> {
		match &self.value {
			Value::Array(array) => Some(array),
			_ => None,
		}
	}

	/// Byte payload of a one-byte integer array.
	pub fn as_bytes(&self) -> Option<Vec<u8>> {
		self.as_array()?.packed()?.to_bytes()
	}

	/// Transformer-produced value.
	pub fn as_domain(&self) -> Option<&Domain> {
		match &self.value {
			Value::Domain(domain) => Some(domain),
			_ => None,
		}
	}

	/// Pointer value.
	pub fn as_pointer(&self) -> Option<&TypedPointer> {
		match self.as_domain()? {
			Domain::Pointer(pointer) => Some(pointer),
			_ => None,
		}
	}

	/// Rectangle value.
	pub fn as_rect(&self) -> Option<Rect> {
		match self.as_domain()? {
			Domain::Rect(rect) => Some(*rect),
			_ => None,
		}
	}

	/// GUID value.
	pub fn as_guid(&self) -> Option<Guid> {
		match self.as_domain()? {
			Domain::Guid(guid) => Some(*guid),
			_ => None,
		}
	}

	/// Streaming descriptor.
	pub fn as_streaming_info(&self) -> Option<&StreamingInfo> {
		match self.as_domain()? {
			Domain::Streaming(info) => Some(info),
			_ => None,
		}
	}

	/// Map entries.
	pub fn as_map(&self) -> Option<&[MapEntry]> {
		match self.as_domain()? {
			Domain::Map(entries) => Some(entries),
			_ => None,
		}
	}

	/// Pair elements.
	pub fn as_pair(&self) -> Option<(&Node, &Node)> {
		match self.as_domain()? {
			Domain::Pair { first, second } => Some((first, second)),
			_ => None,
		}
	}

	/// Whether this node is an ignored region.
	pub fn is_ignored(&self) -> bool {
		matches!(self.value, Value::Ignored)
	}

	/// Direct children: object fields, array elements, and domain-held nodes.
	pub fn children(&self) -> Vec<&Node> {
		match &self.value {
			Value::Object(fields) => fields.iter().map(|(_, node)| node).collect(),
			Value::Array(ArrayValue::Nodes(nodes)) => nodes.iter().collect(),
			Value::Domain(domain) => match domain.as_ref() {
				Domain::Map(entries) => entries.iter().flat_map(|entry| [&entry.key, &entry.value]).collect(),
				Domain::Pair { first, second } => vec![first, second],
				other => other.fields().map(|fields| fields.iter().map(|(_, node)| node).collect()).unwrap_or_default(),
			},
			_ => Vec::new(),
		}
	}

	/// Depth-first search, self first, in field order.
	pub fn find(&self, predicate: &dyn Fn(&Node) -> bool) -> Option<&Node> {
		if predicate(self) {
			return Some(self);
		}
		self.children().into_iter().find_map(|child| child.find(predicate))
	}

	/// Every node matching `predicate`, depth-first, self first, in field order.
	pub fn find_all(&self, predicate: &dyn Fn(&Node) -> bool) -> Vec<&Node> {
		let mut found = Vec::new();
		self.collect_matches(predicate, &mut found);
		found
	}

	fn collect_matches<'a>(&'a self, predicate: &dyn Fn(&Node) -> bool, found: &mut Vec<&'a Node>) {
		if predicate(self) {
			found.push(self);
		}
		for child in self.children() {
			child.collect_matches(predicate, found);
		}
	}

	/// Follow a chain of field names.
	pub fn field_path(&self, path: &[&str]) -> Option<&Node> {
		path.iter().try_fold(self, |node, name| node.field(name))
	}
}
