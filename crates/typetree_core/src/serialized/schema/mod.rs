use std::sync::Arc;

use bitflags::bitflags;

bitflags! {
	/// Structural flags attached to a schema node.
	pub struct TypeFlags: u32 {
		/// Node is a length-prefixed array (`size` child then `data` child).
		const IS_ARRAY = 0x01;
		/// Node is a managed reference.
		const IS_MANAGED_REFERENCE = 0x02;
		/// Node is a managed reference registry region.
		const IS_MANAGED_REFERENCE_REGISTRY = 0x04;
		/// Node is an array of managed references.
		const IS_ARRAY_OF_REFS = 0x08;
	}
}

bitflags! {
	/// Layout flags attached to a schema node.
	pub struct MetaFlags: u32 {
		/// The next sibling starts on a 4-byte boundary.
		const ALIGN_BYTES = 0x4000;
		/// Some descendant requested alignment; the next sibling starts on a 4-byte boundary.
		const ANY_CHILD_USES_ALIGN_BYTES = 0x8000;
	}
}

/// Primitive value kinds a basic schema leaf can decode to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
	/// Signed 8-bit integer.
	I8,
	/// Unsigned 8-bit integer.
	U8,
	/// Signed 16-bit integer.
	I16,
	/// Unsigned 16-bit integer.
	U16,
	/// Signed 32-bit integer.
	I32,
	/// Unsigned 32-bit integer.
	U32,
	/// Signed 64-bit integer.
	I64,
	/// Unsigned 64-bit integer.
	U64,
	/// 32-bit float.
	F32,
	/// 64-bit float.
	F64,
	/// One-byte boolean.
	Bool,
}

impl PrimitiveKind {
	/// Encoded width in bytes.
	pub fn width(self) -> usize {
		match self {
			Self::I8 | Self::U8 | Self::Bool => 1,
			Self::I16 | Self::U16 => 2,
			Self::I32 | Self::U32 | Self::F32 => 4,
			Self::I64 | Self::U64 | Self::F64 => 8,
		}
	}

	/// Map a schema type name to its primitive kind.
	pub fn from_type_name(type_name: &str) -> Option<Self> {
		Some(match type_name {
			"int" | "SInt32" | "TypePtr" => Self::I32,
			"unsigned int" | "UInt32" => Self::U32,
			"float" => Self::F32,
			"double" => Self::F64,
			"SInt16" | "short" => Self::I16,
			"UInt16" | "unsigned short" => Self::U16,
			"SInt64" | "long long" => Self::I64,
			"UInt64" | "FileSize" | "unsigned long long" => Self::U64,
			"SInt8" => Self::I8,
			"UInt8" | "char" => Self::U8,
			"bool" => Self::Bool,
			_ => return None,
		})
	}

	/// Fallback kind for an unrecognized leaf of the given byte size.
	pub fn from_byte_size(byte_size: i32) -> Option<Self> {
		match byte_size {
			8 => Some(Self::I64),
			4 => Some(Self::I32),
			2 => Some(Self::I16),
			1 => Some(Self::I8),
			_ => None,
		}
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::I8 => "i8",
			Self::U8 => "u8",
			Self::I16 => "i16",
			Self::U16 => "u16",
			Self::I32 => "i32",
			Self::U32 => "u32",
			Self::I64 => "i64",
			Self::U64 => "u64",
			Self::F32 => "f32",
			Self::F64 => "f64",
			Self::Bool => "bool",
		}
	}
}

/// One immutable type-tree node describing a field's type, name, size, and layout flags.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
	type_name: Box<str>,
	field_name: Box<str>,
	byte_size: i32,
	flags: TypeFlags,
	meta_flags: MetaFlags,
	children: Vec<Arc<SchemaNode>>,
	has_constant_size: bool,
}

impl SchemaNode {
	/// Type name used for the length field of array nodes.
	pub const ARRAY_SIZE_TYPE: &'static str = "int";

	/// Build a node from raw parts.
	pub fn new(
		type_name: impl Into<Box<str>>,
		field_name: impl Into<Box<str>>,
		byte_size: i32,
		flags: TypeFlags,
		meta_flags: MetaFlags,
		children: Vec<Arc<SchemaNode>>,
	) -> Self {
		let mut node = Self {
			type_name: type_name.into(),
			field_name: field_name.into(),
			byte_size,
			flags,
			meta_flags,
			children,
			has_constant_size: false,
		};
		node.has_constant_size = node.compute_constant_size();
		node
	}

	/// Build a childless node of fixed size.
	pub fn leaf(type_name: impl Into<Box<str>>, field_name: impl Into<Box<str>>, byte_size: i32) -> Self {
		Self::new(type_name, field_name, byte_size, TypeFlags::empty(), MetaFlags::empty(), Vec::new())
	}

	/// Build a variable-size object node from child nodes.
	pub fn object(type_name: impl Into<Box<str>>, field_name: impl Into<Box<str>>, children: Vec<SchemaNode>) -> Self {
		Self::new(
			type_name,
			field_name,
			-1,
			TypeFlags::empty(),
			MetaFlags::empty(),
			children.into_iter().map(Arc::new).collect(),
		)
	}

	/// Build a conventional `Array` node holding a 4-byte `size` and a `data` element.
	pub fn array(field_name: impl Into<Box<str>>, element: SchemaNode) -> Self {
		let size = Self::leaf(Self::ARRAY_SIZE_TYPE, "size", 4);
		Self::new(
			"Array",
			field_name,
			-1,
			TypeFlags::IS_ARRAY,
			MetaFlags::empty(),
			vec![Arc::new(size), Arc::new(element)],
		)
	}

	/// Build a `string` node, which the decoder reads as length-prefixed text.
	pub fn string(field_name: impl Into<Box<str>>) -> Self {
		let chars = Self::array("Array", Self::leaf("char", "data", 1));
		Self::object("string", field_name, vec![chars])
	}

	/// Return a copy with additional structural flags.
	pub fn with_flags(mut self, flags: TypeFlags) -> Self {
		self.flags |= flags;
		self.has_constant_size = self.compute_constant_size();
		self
	}

	/// Return a copy with additional layout flags.
	pub fn with_meta_flags(mut self, meta_flags: MetaFlags) -> Self {
		self.meta_flags |= meta_flags;
		self
	}

	/// Return a copy that aligns its next sibling to 4 bytes.
	pub fn aligned(self) -> Self {
		self.with_meta_flags(MetaFlags::ALIGN_BYTES)
	}

	/// Return a copy with a different declared byte size.
	pub fn with_byte_size(mut self, byte_size: i32) -> Self {
		self.byte_size = byte_size;
		self
	}

	/// Declared type name.
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	/// Declared field name.
	pub fn field_name(&self) -> &str {
		&self.field_name
	}

	/// Declared byte size, `-1` when not fixed.
	pub fn byte_size(&self) -> i32 {
		self.byte_size
	}

	/// Declared byte size with negative sizes treated as zero.
	pub fn byte_size_or_zero(&self) -> u64 {
		u64::try_from(self.byte_size).unwrap_or(0)
	}

	/// Structural flags.
	pub fn flags(&self) -> TypeFlags {
		self.flags
	}

	/// Layout flags.
	pub fn meta_flags(&self) -> MetaFlags {
		self.meta_flags
	}

	/// Child nodes in declaration order.
	pub fn children(&self) -> &[Arc<SchemaNode>] {
		&self.children
	}

	/// Find a direct child by field name.
	pub fn child(&self, field_name: &str) -> Option<&Arc<SchemaNode>> {
		self.children.iter().find(|child| child.field_name() == field_name)
	}

	/// Whether the node has no children.
	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Whether the node is a fixed-size leaf.
	pub fn is_basic_type(&self) -> bool {
		self.is_leaf() && self.byte_size > 0
	}

	/// Whether the node is a length-prefixed array.
	pub fn is_array(&self) -> bool {
		self.flags.contains(TypeFlags::IS_ARRAY)
	}

	/// Whether the node is a managed reference registry region.
	pub fn is_managed_reference_registry(&self) -> bool {
		self.flags.contains(TypeFlags::IS_MANAGED_REFERENCE_REGISTRY)
	}

	/// Whether the node decodes as length-prefixed text.
	pub fn is_string(&self) -> bool {
		self.type_name.as_ref() == "string"
	}

	/// Whether the next sibling must start on a 4-byte boundary.
	pub fn requires_alignment(&self) -> bool {
		self.meta_flags.intersects(MetaFlags::ALIGN_BYTES | MetaFlags::ANY_CHILD_USES_ALIGN_BYTES)
	}

	/// Whether no array, string, or variable-size node exists beneath this node.
	pub fn has_constant_size(&self) -> bool {
		self.has_constant_size
	}

	/// Primitive kind for basic leaves.
	///
	/// Known type names win when their width matches the declared size; otherwise the
	/// size-based fallback applies. Leaves of other sizes have no primitive kind.
	pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
		if !self.is_basic_type() {
			return None;
		}

		match PrimitiveKind::from_type_name(&self.type_name) {
			Some(kind) if i32::try_from(kind.width()).ok() == Some(self.byte_size) => Some(kind),
			_ => PrimitiveKind::from_byte_size(self.byte_size),
		}
	}

	fn compute_constant_size(&self) -> bool {
		if self.is_array() || self.is_string() {
			return false;
		}
		if self.is_leaf() && self.byte_size < 0 {
			return false;
		}
		self.children.iter().all(|child| child.has_constant_size())
	}
}

/// Round `offset` up to a 4-byte boundary when `node` requests alignment.
pub fn align_offset(offset: u64, node: &SchemaNode) -> u64 {
	if node.requires_alignment() { (offset + 3) & !3 } else { offset }
}

#[cfg(test)]
mod tests;
