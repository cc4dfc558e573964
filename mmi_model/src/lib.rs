//! High level decoding for maps frame captures.
//!
//! [mmi_capture] stores draw calls and raw GPU payloads without interpreting them.
//! This crate turns those payloads into values a modeling tool can consume:
//! decoded index and vertex attribute streams and flattened shader constants.
//!
//! The maps renderer binds position as vertex input 0 and texture coordinates
//! as vertex input 1. [decode_draw_geometry] relies on that layout and is not
//! a general purpose mesh decoder.
pub mod constants;
pub mod error;
pub mod vertex;

pub use constants::{constant_block_values, ConstantValue};
pub use error::DecodeMeshError;
pub use vertex::{decode_draw_geometry, AttributeData, DrawGeometry};
