use crate::serialized::{MetaFlags, PrimitiveKind, SchemaNode, TypeFlags, align_offset};

#[test]
fn unaligned_node_leaves_offset_unchanged() {
	let node = SchemaNode::leaf("int", "m_Value", 4);
	for offset in [0_u64, 1, 2, 3, 4, 5, 1023] {
		assert_eq!(align_offset(offset, &node), offset);
	}
}

#[test]
fn aligned_nodes_round_up_to_four() {
	let direct = SchemaNode::leaf("bool", "m_Enabled", 1).aligned();
	let inherited = SchemaNode::leaf("bool", "m_Enabled", 1).with_meta_flags(MetaFlags::ANY_CHILD_USES_ALIGN_BYTES);

	for node in [&direct, &inherited] {
		for offset in 0_u64..64 {
			let aligned = align_offset(offset, node);
			assert_eq!(aligned % 4, 0);
			assert!(aligned >= offset);
			assert!(aligned - offset < 4);
		}
	}
}

#[test]
fn known_type_names_map_to_primitive_kinds() {
	let cases = [
		("int", 4, PrimitiveKind::I32),
		("SInt32", 4, PrimitiveKind::I32),
		("unsigned int", 4, PrimitiveKind::U32),
		("float", 4, PrimitiveKind::F32),
		("double", 8, PrimitiveKind::F64),
		("SInt64", 8, PrimitiveKind::I64),
		("FileSize", 8, PrimitiveKind::U64),
		("UInt16", 2, PrimitiveKind::U16),
		("char", 1, PrimitiveKind::U8),
		("bool", 1, PrimitiveKind::Bool),
	];

	for (type_name, size, kind) in cases {
		let node = SchemaNode::leaf(type_name, "value", size);
		assert_eq!(node.primitive_kind(), Some(kind), "{type_name}");
	}
}

#[test]
fn unknown_leaf_names_fall_back_by_size() {
	assert_eq!(SchemaNode::leaf("Hash64", "h", 8).primitive_kind(), Some(PrimitiveKind::I64));
	assert_eq!(SchemaNode::leaf("Enum", "e", 4).primitive_kind(), Some(PrimitiveKind::I32));
	assert_eq!(SchemaNode::leaf("Half", "h", 2).primitive_kind(), Some(PrimitiveKind::I16));
	assert_eq!(SchemaNode::leaf("Byte", "b", 1).primitive_kind(), Some(PrimitiveKind::I8));
	assert_eq!(SchemaNode::leaf("Triple", "t", 3).primitive_kind(), None);
}

#[test]
fn constant_size_excludes_arrays_and_strings() {
	let vector = SchemaNode::object(
		"Vector2f",
		"m_Offset",
		vec![SchemaNode::leaf("float", "x", 4), SchemaNode::leaf("float", "y", 4)],
	);
	assert!(vector.has_constant_size());

	let with_string = SchemaNode::object("Named", "m_Named", vec![SchemaNode::string("m_Name")]);
	assert!(!with_string.has_constant_size());

	let with_array = SchemaNode::object("Buffer", "m_Buffer", vec![SchemaNode::array("Array", SchemaNode::leaf("UInt8", "data", 1))]);
	assert!(!with_array.has_constant_size());

	let flagged = SchemaNode::leaf("int", "x", 4).with_flags(TypeFlags::IS_ARRAY);
	assert!(!flagged.has_constant_size());
}

#[test]
fn array_builder_uses_size_and_data_children() {
	let node = SchemaNode::array("Array", SchemaNode::leaf("int", "data", 4));
	assert!(node.is_array());
	assert_eq!(node.children().len(), 2);
	assert_eq!(node.children()[0].byte_size(), 4);
	assert!(node.children()[0].is_leaf());
	assert_eq!(node.child("data").map(|child| child.type_name()), Some("int"));
}
