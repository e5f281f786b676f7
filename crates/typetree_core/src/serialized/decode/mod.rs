use std::sync::Arc;

use tracing::warn;

use crate::serialized::{
	Ancestors, ArrayValue, BufferedReader, Fields, Node, PackedArray, Primitive, PrimitiveKind, Registry, Result, SchemaNode, SerializedFile,
	TreeError, Value,
};

/// Decode limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
	/// Maximum schema nesting depth.
	pub max_depth: u32,
	/// Maximum element count of one array.
	pub max_array_len: usize,
}

impl Default for DecodeOptions {
	fn default() -> Self {
		Self {
			max_depth: 64,
			max_array_len: 1 << 28,
		}
	}
}

impl DecodeOptions {
	/// Options without practical limits.
	pub fn unbounded() -> Self {
		Self {
			max_depth: u32::MAX,
			max_array_len: usize::MAX,
		}
	}
}

/// Decode object `object_id` of `file` from the start of its data.
pub fn decode_object(file: &SerializedFile, reader: &mut BufferedReader, object_id: i64, registry: &Registry, options: &DecodeOptions) -> Result<Node> {
	let info = file.object(object_id).ok_or(TreeError::ObjectNotFound { id: object_id })?;
	let schema = file.schema_root(object_id)?;
	decode_node(file, reader, &Ancestors::empty(), info.byte_offset, &schema, registry, options)
}

/// Decode `schema` at `offset` and pass the result through `registry`.
///
/// Failures are wrapped in [`TreeError::Node`] frames naming every enclosing node.
pub fn decode_node(
	file: &SerializedFile,
	reader: &mut BufferedReader,
	ancestors: &Ancestors,
	offset: u64,
	schema: &Arc<SchemaNode>,
	registry: &Registry,
	options: &DecodeOptions,
) -> Result<Node> {
	let mut decoder = Decoder {
		file,
		reader,
		registry,
		options,
	};
	decoder.node(ancestors, offset, schema, 0)
}

struct Decoder<'a> {
	file: &'a SerializedFile,
	reader: &'a mut BufferedReader,
	registry: &'a Registry,
	options: &'a DecodeOptions,
}

impl Decoder<'_> {
	fn node(&mut self, ancestors: &Ancestors, offset: u64, schema: &Arc<SchemaNode>, depth: u32) -> Result<Node> {
		let node = self.structural(ancestors, offset, schema, depth).map_err(|source| TreeError::Node {
			type_name: schema.type_name().to_owned(),
			field_name: schema.field_name().to_owned(),
			offset,
			source: Box::new(source),
		})?;
		Ok(self.registry.apply(node, self.file))
	}

	fn structural(&mut self, ancestors: &Ancestors, offset: u64, schema: &Arc<SchemaNode>, depth: u32) -> Result<Node> {
		if depth > self.options.max_depth {
			return Err(TreeError::DecodeDepthExceeded {
				max_depth: self.options.max_depth,
			});
		}

		let node = |end_offset, value| Node::new(schema.clone(), ancestors.clone(), offset, end_offset, value);

		if let Some(kind) = schema.primitive_kind() {
			let value = self.primitive(offset, kind)?;
			return Ok(node(offset + kind.width() as u64, Value::Primitive(value)));
		}

		if schema.is_string() {
			let len = self.reader.read_i32(offset)?;
			let start = offset + 4;
			return Ok(match usize::try_from(len) {
				Ok(len) if len > 0 => {
					let text = self.reader.read_string(start, len)?;
					node(start + len as u64, Value::Text(text))
				}
				_ => node(start, Value::Text(String::new())),
			});
		}

		if schema.is_array() {
			let (end_offset, array) = self.array(ancestors, offset, schema, depth)?;
			return Ok(node(end_offset, Value::Array(array)));
		}

		if schema.is_managed_reference_registry() {
			if schema.is_leaf() || ancestors.is_empty() {
				return Err(TreeError::NotSupported {
					type_name: schema.type_name().to_owned(),
				});
			}
			return Ok(node(offset + schema.byte_size_or_zero(), Value::Ignored));
		}

		if schema.is_leaf() {
			// Leaves without a primitive kind are opaque bytes.
			return Ok(node(offset + schema.byte_size_or_zero(), Value::Object(Fields::new())));
		}

		let child_ancestors = ancestors.push(schema.clone());
		let mut fields = Fields::with_capacity(schema.children().len());
		let mut cursor = offset;
		for child in schema.children() {
			let decoded = self.node(&child_ancestors, cursor, child, depth + 1)?;
			cursor = decoded.next_offset();
			fields.insert(child.field_name(), decoded);
		}
		Ok(node(cursor, Value::Object(fields)))
	}

	fn primitive(&mut self, offset: u64, kind: PrimitiveKind) -> Result<Primitive> {
		Ok(match kind {
			PrimitiveKind::I8 => Primitive::I8(self.reader.read_i8(offset)?),
			PrimitiveKind::U8 => Primitive::U8(self.reader.read_u8(offset)?),
			PrimitiveKind::Bool => Primitive::Bool(self.reader.read_bool(offset)?),
			PrimitiveKind::I16 => Primitive::I16(self.reader.read_i16(offset)?),
			PrimitiveKind::U16 => Primitive::U16(self.reader.read_u16(offset)?),
			PrimitiveKind::I32 => Primitive::I32(self.reader.read_i32(offset)?),
			PrimitiveKind::U32 => Primitive::U32(self.reader.read_u32(offset)?),
			PrimitiveKind::I64 => Primitive::I64(self.reader.read_i64(offset)?),
			PrimitiveKind::U64 => Primitive::U64(self.reader.read_u64(offset)?),
			PrimitiveKind::F32 => Primitive::F32(self.reader.read_f32(offset)?),
			PrimitiveKind::F64 => Primitive::F64(self.reader.read_f64(offset)?),
		})
	}

	fn array(&mut self, ancestors: &Ancestors, offset: u64, schema: &Arc<SchemaNode>, depth: u32) -> Result<(u64, ArrayValue)> {
		let size_node = schema.children().first().ok_or_else(|| TreeError::ArraySizeNode {
			type_name: schema.type_name().to_owned(),
			byte_size: -1,
		})?;
		if !size_node.is_leaf() || size_node.byte_size() != 4 {
			return Err(TreeError::ArraySizeNode {
				type_name: schema.type_name().to_owned(),
				byte_size: size_node.byte_size(),
			});
		}
		let element = schema.children().get(1).ok_or_else(|| TreeError::ArrayElementMissing {
			type_name: schema.type_name().to_owned(),
		})?;

		let raw_len = self.reader.read_i32(offset)?;
		if raw_len < 0 {
			warn!(
				type_name = schema.type_name(),
				field_name = schema.field_name(),
				offset,
				length = raw_len,
				"negative array length clamped to zero"
			);
		}
		let len = usize::try_from(raw_len).unwrap_or(0);
		if len > self.options.max_array_len {
			return Err(TreeError::DecodeArrayTooLarge {
				count: len,
				max: self.options.max_array_len,
			});
		}

		let mut cursor = offset + 4;

		if let Some(kind) = element.primitive_kind() {
			let byte_len = len.checked_mul(kind.width()).ok_or(TreeError::DecodeArrayTooLarge {
				count: len,
				max: self.options.max_array_len,
			})?;
			let bytes = self.reader.read_bytes(cursor, byte_len)?;
			cursor += byte_len as u64;
			return Ok((cursor, ArrayValue::Packed(PackedArray::from_le_bytes(kind, &bytes))));
		}

		let element_ancestors = ancestors.push(schema.clone());
		let mut elements = Vec::with_capacity(len.min(4096));
		for _ in 0..len {
			let decoded = self.node(&element_ancestors, cursor, element, depth + 1)?;
			cursor = decoded.next_offset();
			elements.push(decoded);
		}
		Ok((cursor, ArrayValue::Nodes(elements)))
	}
}
