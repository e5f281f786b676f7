//! Public library API for decoding type-tree described serialized files.

/// Serialized file directories, schema-driven decoding, transformers, and pointer resolution.
pub mod serialized;
