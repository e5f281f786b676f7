use serde::Serialize;

use crate::serialized::{Domain, Node, SchemaNode, SerializedFile, Transformed, Transformer};

/// Two-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector2 {
	/// X component.
	pub x: f32,
	/// Y component.
	pub y: f32,
}

/// Three-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector3 {
	/// X component.
	pub x: f32,
	/// Y component.
	pub y: f32,
	/// Z component.
	pub z: f32,
}

/// Four-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vector4 {
	/// X component.
	pub x: f32,
	/// Y component.
	pub y: f32,
	/// Z component.
	pub z: f32,
	/// W component.
	pub w: f32,
}

/// Axis-aligned float rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
	/// Left edge.
	pub x: f32,
	/// Bottom edge.
	pub y: f32,
	/// Width.
	pub width: f32,
	/// Height.
	pub height: f32,
}

impl Rect {
	/// Read a rectangle from a structural `Rectf` node or a node already transformed into one.
	pub fn from_node(node: &Node) -> Option<Self> {
		if let Some(rect) = node.as_rect() {
			return Some(rect);
		}
		Some(Self {
			x: float(node, "x")?,
			y: float(node, "y")?,
			width: float(node, "width")?,
			height: float(node, "height")?,
		})
	}
}

/// Reads `Vector2f`, `Vector3f`, and `Vector4f` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorfTransformer;

impl Transformer for VectorfTransformer {
	fn name(&self) -> &'static str {
		"vectorf"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		matches!(schema.type_name(), "Vector2f" | "Vector3f" | "Vector4f")
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let domain = match node.type_name() {
			"Vector2f" => vector2(&node).map(Domain::Vector2),
			"Vector3f" => vector3(&node).map(Domain::Vector3),
			"Vector4f" => vector4(&node).map(Domain::Vector4),
			_ => None,
		};
		Transformed::from_domain(node, domain)
	}
}

/// Reads `Rectf` objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectTransformer;

impl Transformer for RectTransformer {
	fn name(&self) -> &'static str {
		"rectf"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "Rectf"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let rect = Rect::from_node(&node).map(Domain::Rect);
		Transformed::from_domain(node, rect)
	}
}

fn float(node: &Node, name: &str) -> Option<f32> {
	node.field(name)?.as_f32()
}

fn vector2(node: &Node) -> Option<Vector2> {
	Some(Vector2 {
		x: float(node, "x")?,
		y: float(node, "y")?,
	})
}

fn vector3(node: &Node) -> Option<Vector3> {
	Some(Vector3 {
		x: float(node, "x")?,
		y: float(node, "y")?,
		z: float(node, "z")?,
	})
}

fn vector4(node: &Node) -> Option<Vector4> {
	Some(Vector4 {
		x: float(node, "x")?,
		y: float(node, "y")?,
		z: float(node, "z")?,
		w: float(node, "w")?,
	})
}
