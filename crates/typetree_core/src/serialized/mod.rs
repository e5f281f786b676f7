mod ancestors;
mod decode;
pub mod dump;
mod error;
mod file;
mod pointer;
mod reader;
mod schema;
mod source;
mod transform;
mod value;
mod workspace;

/// Shared enclosing-node stack.
pub use ancestors::{AncestorIter, Ancestors};
/// Schema-driven decoding entry points and options.
pub use decode::{DecodeOptions, decode_node, decode_object};
/// Error and result aliases.
pub use error::{NodeFrame, Result, TreeError};
/// Object directories, native file handles, and the in-memory handle.
pub use file::{ExternalReference, FileSystemProvider, MemoryFile, ObjectInfo, SerializedFile, SerializedFileHandle};
/// Cross-file pointers and their file lookup.
pub use pointer::{DirectoryLookup, TypedPointer};
/// Windowed typed reader.
pub use reader::BufferedReader;
/// Type-tree schema representation.
pub use schema::{MetaFlags, PrimitiveKind, SchemaNode, TypeFlags, align_offset};
/// Raw byte sources and their openers.
pub use source::{ByteSource, FsOpener, SourceOpener};
/// Transformer registry and built-in transformers.
pub use transform::{Registry, Transformed, Transformer};
/// Collection transformers.
pub use transform::{IndexedArrayTransformer, MapTransformer, PairTransformer, VectorTransformer, index_from_field_name};
/// Geometry records and transformers.
pub use transform::{Rect, RectTransformer, Vector2, Vector3, Vector4, VectorfTransformer};
/// GUID record and transformer.
pub use transform::{Guid, GuidTransformer};
/// Pointer transformer.
pub use transform::PointerTransformer;
/// Streamed payload descriptors and reader lookup.
pub use transform::{ReaderLookup, ReferencePath, StreamingInfo, StreamingInfoTransformer};
/// Asset bundle manifest records and transformers.
pub use transform::{AssetBundle, AssetBundleTransformer, AssetInfo, AssetInfoTransformer};
/// Sprite and sprite atlas records and transformers.
pub use transform::{
	Sprite, SpriteAtlas, SpriteAtlasData, SpriteAtlasDataTransformer, SpriteAtlasTransformer, SpriteMeshType, SpritePackingMode, SpritePackingRotation,
	SpriteSettings, SpriteTransformer,
};
/// Texture header record and pixel decoding hook.
pub use transform::{PixelDecoder, Texture2D, Texture2DTransformer, TextureFormat};
/// Decoded value graph.
pub use value::{ArrayValue, Domain, Fields, MapEntry, Node, PackedArray, Primitive, Value};
/// Open files and readers keyed by path.
pub use workspace::Workspace;
