use serde::Serialize;
use tracing::warn;

use super::into_record;
use crate::serialized::{Domain, Fields, Node, ReaderLookup, Result, SchemaNode, SerializedFile, SourceOpener, Transformed, Transformer};

macro_rules! texture_formats {
	($($name:ident = $code:literal,)*) => {
		/// Pixel storage format of a texture. Unknown codes are preserved.
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
		pub enum TextureFormat {
			$(
				#[doc = concat!("Format code ", stringify!($code), ".")]
				$name,
			)*
			/// Code outside the known table.
			Unknown(i32),
		}

		impl TextureFormat {
			/// Map a stored format code.
			pub fn from_code(code: i32) -> Self {
				match code {
					$($code => Self::$name,)*
					other => Self::Unknown(other),
				}
			}

			/// Stored format code.
			pub fn code(self) -> i32 {
				match self {
					$(Self::$name => $code,)*
					Self::Unknown(code) => code,
				}
			}
		}
	};
}

texture_formats! {
	Alpha8 = 1,
	Argb4444 = 2,
	Rgb24 = 3,
	Rgba32 = 4,
	Argb32 = 5,
	ArgbFloat = 6,
	Rgb565 = 7,
	Bgr24 = 8,
	R16 = 9,
	Dxt1 = 10,
	Dxt3 = 11,
	Dxt5 = 12,
	Rgba4444 = 13,
	Bgra32 = 14,
	RHalf = 15,
	RgHalf = 16,
	RgbaHalf = 17,
	RFloat = 18,
	RgFloat = 19,
	RgbaFloat = 20,
	Yuy2 = 21,
	Rgb9e5Float = 22,
	RgbFloat = 23,
	Bc6h = 24,
	Bc7 = 25,
	Bc4 = 26,
	Bc5 = 27,
	Dxt1Crunched = 28,
	Dxt5Crunched = 29,
	PvrtcRgb2 = 30,
	PvrtcRgba2 = 31,
	PvrtcRgb4 = 32,
	PvrtcRgba4 = 33,
	EtcRgb4 = 34,
	AtcRgb4 = 35,
	AtcRgba8 = 36,
	EacR = 41,
	EacRSigned = 42,
	EacRg = 43,
	EacRgSigned = 44,
	Etc2Rgb = 45,
	Etc2Rgba1 = 46,
	Etc2Rgba8 = 47,
	AstcRgb4x4 = 48,
	AstcRgb5x5 = 49,
	AstcRgb6x6 = 50,
	AstcRgb8x8 = 51,
	AstcRgb10x10 = 52,
	AstcRgb12x12 = 53,
	AstcRgba4x4 = 54,
	AstcRgba5x5 = 55,
	AstcRgba6x6 = 56,
	AstcRgba8x8 = 57,
	AstcRgba10x10 = 58,
	AstcRgba12x12 = 59,
	EtcRgb4For3ds = 60,
	EtcRgba8For3ds = 61,
	Rg16 = 62,
	R8 = 63,
	EtcRgb4Crunched = 64,
	Etc2Rgba8Crunched = 65,
	AstcHdr4x4 = 66,
	AstcHdr5x5 = 67,
	AstcHdr6x6 = 68,
	AstcHdr8x8 = 69,
	AstcHdr10x10 = 70,
	AstcHdr12x12 = 71,
	Rg32 = 72,
	Rgb48 = 73,
	Rgba64 = 74,
}

/// Decompresses raw texture payloads into 8-bit four-channel pixels.
pub trait PixelDecoder {
	/// Decode `raw` into `out`, which holds exactly `width * height * 4` bytes.
	fn decode(&self, format: TextureFormat, width: u32, height: u32, raw: &[u8], out: &mut [u8]) -> Result<()>;
}

/// Texture header.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
	/// `m_Name`, when present.
	pub name: Option<String>,
	/// Width in pixels.
	pub width: i32,
	/// Height in pixels.
	pub height: i32,
	/// Pixel storage format.
	pub format: TextureFormat,
	/// Structural fields of the texture object.
	pub fields: Fields,
}

impl Texture2D {
	/// Inline `image data` bytes, when present and non-empty.
	pub fn inline_data(&self) -> Option<Vec<u8>> {
		self.fields.get("image data")?.as_bytes().filter(|bytes| !bytes.is_empty())
	}

	/// Raw payload: inline `image data`, else the `m_StreamData` payload, else empty.
	pub fn raw_data(&self, readers: &mut dyn ReaderLookup, opener: &dyn SourceOpener) -> Result<Vec<u8>> {
		if let Some(bytes) = self.inline_data() {
			return Ok(bytes);
		}
		match self.fields.get("m_StreamData").and_then(Node::as_streaming_info) {
			Some(info) => info.fetch(readers, opener),
			None => Ok(Vec::new()),
		}
	}

	/// Decode the payload into `width * height * 4` bytes.
	///
	/// Returns `None` when the dimensions are empty or no payload is available.
	pub fn decode_pixels(&self, readers: &mut dyn ReaderLookup, opener: &dyn SourceOpener, decoder: &dyn PixelDecoder) -> Result<Option<Vec<u8>>> {
		let (Ok(width), Ok(height)) = (u32::try_from(self.width), u32::try_from(self.height)) else {
			return Ok(None);
		};
		if width == 0 || height == 0 {
			return Ok(None);
		}

		let raw = self.raw_data(readers, opener)?;
		if raw.is_empty() {
			warn!(name = self.name.as_deref().unwrap_or(""), "texture has no payload");
			return Ok(None);
		}

		let len = (width as usize).saturating_mul(height as usize).saturating_mul(4);
		let mut out = vec![0_u8; len];
		decoder.decode(self.format, width, height, &raw, &mut out)?;
		Ok(Some(out))
	}
}

/// Reads `Texture2D` headers. Width, height, and format are required.
#[derive(Debug, Clone, Copy, Default)]
pub struct Texture2DTransformer;

impl Transformer for Texture2DTransformer {
	fn name(&self) -> &'static str {
		"texture2d"
	}

	fn matches(&self, schema: &SchemaNode) -> bool {
		schema.type_name() == "Texture2D"
	}

	fn try_transform(&self, node: Node, _file: &SerializedFile) -> Transformed {
		let name = node.field("m_Name").and_then(Node::as_str).map(str::to_owned);
		match texture_header(&node) {
			Some((width, height, format)) => into_record(node, |fields| {
				Domain::Texture2D(Texture2D {
					name,
					width,
					height,
					format: TextureFormat::from_code(format),
					fields,
				})
			}),
			None => Transformed::Declined(node),
		}
	}
}

fn texture_header(node: &Node) -> Option<(i32, i32, i32)> {
	Some((
		node.field("m_Width")?.as_i32()?,
		node.field("m_Height")?.as_i32()?,
		node.field("m_TextureFormat")?.as_i32()?,
	))
}
