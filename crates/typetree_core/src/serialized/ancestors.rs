use std::fmt;
use std::sync::Arc;

use crate::serialized::SchemaNode;

/// Immutable root-to-parent stack of schema nodes enclosing a decoded node.
///
/// Pushing shares the existing tail, so sibling decodes reuse one prefix.
#[derive(Clone, Default)]
pub struct Ancestors(Option<Arc<Frame>>);

struct Frame {
	node: Arc<SchemaNode>,
	parent: Ancestors,
	depth: usize,
}

impl Ancestors {
	/// Empty stack, used for top-level objects.
	pub fn empty() -> Self {
		Self(None)
	}

	/// Whether the stack has no entries.
	pub fn is_empty(&self) -> bool {
		self.0.is_none()
	}

	/// Number of enclosing schema nodes.
	pub fn len(&self) -> usize {
		self.0.as_ref().map_or(0, |frame| frame.depth)
	}

	/// Return a new stack with `node` on top.
	pub fn push(&self, node: Arc<SchemaNode>) -> Self {
		let depth = self.len() + 1;
		Self(Some(Arc::new(Frame {
			node,
			parent: self.clone(),
			depth,
		})))
	}

	/// Innermost enclosing schema node.
	pub fn parent(&self) -> Option<&Arc<SchemaNode>> {
		self.0.as_ref().map(|frame| &frame.node)
	}

	/// Stack without its innermost entry.
	pub fn pop(&self) -> Option<&Ancestors> {
		self.0.as_ref().map(|frame| &frame.parent)
	}

	/// Iterate from the innermost parent towards the root.
	pub fn iter(&self) -> AncestorIter<'_> {
		AncestorIter { current: self }
	}

	/// Collect the chain root first.
	pub fn to_root_first(&self) -> Vec<Arc<SchemaNode>> {
		let mut out: Vec<_> = self.iter().cloned().collect();
		out.reverse();
		out
	}
}

/// Innermost-first iterator over an [`Ancestors`] stack.
pub struct AncestorIter<'a> {
	current: &'a Ancestors,
}

impl<'a> Iterator for AncestorIter<'a> {
	type Item = &'a Arc<SchemaNode>;

	fn next(&mut self) -> Option<Self::Item> {
		let frame = self.current.0.as_ref()?;
		self.current = &frame.parent;
		Some(&frame.node)
	}
}

impl PartialEq for Ancestors {
	fn eq(&self, other: &Self) -> bool {
		if self.len() != other.len() {
			return false;
		}
		self.iter().zip(other.iter()).all(|(left, right)| Arc::ptr_eq(left, right) || left == right)
	}
}

impl fmt::Debug for Ancestors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(self.to_root_first().iter().map(|node| node.type_name().to_owned())).finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use crate::serialized::{Ancestors, SchemaNode};

	#[test]
	fn push_shares_tail_between_siblings() {
		let root = Arc::new(SchemaNode::object("GameObject", "Base", vec![]));
		let base = Ancestors::empty().push(root.clone());

		let left = base.push(Arc::new(SchemaNode::leaf("int", "a", 4)));
		let right = base.push(Arc::new(SchemaNode::leaf("int", "b", 4)));

		assert_eq!(left.len(), 2);
		assert_eq!(right.len(), 2);
		assert!(Arc::ptr_eq(left.pop().and_then(Ancestors::parent).expect("tail"), &root));
		assert!(Arc::ptr_eq(right.pop().and_then(Ancestors::parent).expect("tail"), &root));
		assert_eq!(base.len(), 1);
	}

	#[test]
	fn root_first_order_is_preserved() {
		let stack = Ancestors::empty()
			.push(Arc::new(SchemaNode::object("Outer", "Base", vec![])))
			.push(Arc::new(SchemaNode::object("Inner", "m_Inner", vec![])));

		let names: Vec<_> = stack.to_root_first().iter().map(|node| node.type_name().to_owned()).collect();
		assert_eq!(names, ["Outer", "Inner"]);
		assert_eq!(stack.parent().map(|node| node.type_name()), Some("Inner"));
		assert!(Ancestors::empty().is_empty());
	}
}
