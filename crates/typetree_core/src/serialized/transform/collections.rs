use crate::serialized::{ArrayValue, Domain, Fields, MapEntry, Node, SchemaNode, SerializedFile, Transformed, Transformer, Value};

/// Exposes a `map` as the key/value entries of its `Array` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapTransformer;

impl Transformer for MapTransformer {
	fn name(&self) -> &'static str {
		"map"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "map"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let well_formed = node.field("Array").and_then(Node::as_array).is_some_and(|array| match array {
			ArrayValue::Nodes(elements) => elements.iter().all(is_pair),
			ArrayValue::Packed(packed) => packed.is_empty(),
		});
		if !well_formed {
			return Transformed::Declined(node);
		}

		let mut node = node;
		let elements = match &mut node.value {
			Value::Object(fields) => fields.remove("Array").map(|array| match array.value {
				Value::Array(ArrayValue::Nodes(elements)) => elements,
				_ => Vec::new(),
			}),
			_ => None,
		};
		let entries = elements
			.unwrap_or_default()
			.into_iter()
			.filter_map(into_pair)
			.map(|(key, value)| MapEntry { key, value })
			.collect();
		Transformed::Applied(node.with_domain(Domain::Map(entries)))
	}
}

/// Exposes a `pair` as its `first` and `second` fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairTransformer;

impl Transformer for PairTransformer {
	fn name(&self) -> &'static str {
		"pair"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "pair"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		if !is_pair(&node) {
			return Transformed::Declined(node);
		}

		let mut node = node;
		let parts = match &mut node.value {
			Value::Object(fields) => fields.remove("first").zip(fields.remove("second")),
			_ => None,
		};
		match parts {
			Some((first, second)) => Transformed::Applied(node.with_domain(Domain::Pair { first, second })),
			None => Transformed::Declined(node),
		}
	}
}

/// Replaces a `vector` with the array held in its `Array` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorTransformer;

impl Transformer for VectorTransformer {
	fn name(&self) -> &'static str {
		"vector"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "vector"
	}

	fn try_transform(&self, mut node: Node, _file: &SerializedFile) -> Transformed {
		let array = match &mut node.value {
			Value::Object(fields) if fields.get("Array").and_then(Node::as_array).is_some() => fields.remove("Array"),
			_ => None,
		};
		match array {
			Some(array) => Transformed::Applied(node.with_value(array.value)),
			None => Transformed::Declined(node),
		}
	}
}

/// Reinterprets an object whose fields are exactly `data[0]..data[n-1]` as an array in field order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexedArrayTransformer;

impl Transformer for IndexedArrayTransformer {
	fn name(&self) -> &'static str {
		"indexed_array"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		!schema.is_leaf() && schema.children().iter().all(|child| index_from_field_name(child.field_name()).is_some())
	}

	fn try_transform(&self, mut node: Node, _file: &SerializedFile) -> Transformed {
		let elements = match &mut node.value {
			Value::Object(fields) if indexed_order(fields).is_some() => {
				let fields = std::mem::take(fields);
				Some(into_indexed(fields))
			}
			_ => None,
		};
		match elements {
			Some(elements) => Transformed::Applied(node.with_value(Value::Array(ArrayValue::Nodes(elements)))),
			None => Transformed::Declined(node),
		}
	}
}

/// Index `N` of a field named `data[N]`.
pub fn index_from_field_name(name: &str) -> Option<usize> {
	let digits = name.strip_prefix("data[")?.strip_suffix(']')?;
	if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	digits.parse().ok()
}

/// Field positions sorted by index, when the names form exactly `data[0]..data[n-1]`.
fn indexed_order(fields: &Fields) -> Option<Vec<usize>> {
	let mut slots = vec![None; fields.len()];
	for (position, name) in fields.keys().enumerate() {
		let index = index_from_field_name(name)?;
		let slot = slots.get_mut(index)?;
		if slot.is_some() {
			return None;
		}
		*slot = Some(position);
	}
	slots.into_iter().collect()
}

/// Element nodes of a `data[N]` object ordered by index.
pub(crate) fn indexed_elements(fields: &Fields) -> Option<Vec<&Node>> {
	let order = indexed_order(fields)?;
	let nodes: Vec<&Node> = fields.iter().map(|(_, node)| node).collect();
	Some(order.into_iter().map(|position| nodes[position]).collect())
}

fn into_indexed(fields: Fields) -> Vec<Node> {
	fields.into_iter().map(|(_, node)| node).collect()
}

fn is_pair(node: &Node) -> bool {
	node.as_pair().is_some() || (node.field("first").is_some() && node.field("second").is_some())
}

fn into_pair(node: Node) -> Option<(Node, Node)> {
	match node.value {
		Value::Domain(domain) => match *domain {
			Domain::Pair { first, second } => Some((first, second)),
			_ => None,
		},
		Value::Object(mut fields) => fields.remove("first").zip(fields.remove("second")),
		_ => None,
	}
}
