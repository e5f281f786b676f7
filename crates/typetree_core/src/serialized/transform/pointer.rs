use crate::serialized::{Domain, Node, SchemaNode, SerializedFile, Transformed, Transformer, TypedPointer};

/// Reads `PPtr<X>` objects into [`TypedPointer`] values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTransformer;

impl Transformer for PointerTransformer {
	fn name(&self) -> &'static str {
		"pptr"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		pointer_target(schema.type_name()).is_some()
	}

	fn try_transform(&self, node: Node, file: &SerializedFile) -> Transformed {
		let pointer = pointer_target(node.type_name()).and_then(|type_hint| {
			let file_id = node.field("m_FileID")?.as_i32()?;
			let object_id = node.field("m_PathID")?.as_i64()?;
			Some(TypedPointer::new(type_hint, file_id, object_id, file.path()))
		});
		Transformed::from_domain(node, pointer.map(Domain::Pointer))
	}
}

/// Target type of a `PPtr<X>` type name, where `X` is a word of letters, digits, or `_`.
pub(crate) fn pointer_target(type_name: &str) -> Option<&str> {
	let inner = type_name.strip_prefix("PPtr<")?.strip_suffix('>')?;
	let is_word = !inner.is_empty() && inner.chars().all(|c| c.is_alphanumeric() || c == '_');
	is_word.then_some(inner)
}

#[cfg(test)]
mod tests {
	use super::pointer_target;

	#[test]
	fn only_plain_word_targets_match() {
		assert_eq!(pointer_target("PPtr<Texture2D>"), Some("Texture2D"));
		assert_eq!(pointer_target("PPtr<$MonoScript>"), None);
		assert_eq!(pointer_target("PPtr<>"), None);
		assert_eq!(pointer_target("PPtr<A<B>>"), None);
		assert_eq!(pointer_target("Texture2D"), None);
	}
}
