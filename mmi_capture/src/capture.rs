//! The captured frame container.
//!
//! # Overview
//! A [Capture] records one frame of a maps renderer as replayed data rather than live API calls.
//! The ordered [draws](struct.Capture.html#structfield.draws) list is what the renderer submitted.
//! Each draw call's GPU state at replay time is snapshotted in
//! [states](struct.Capture.html#structfield.states) keyed by event id.
//! Raw buffer and texture payloads are stored once in
//! [buffers](struct.Capture.html#structfield.buffers) and
//! [textures](struct.Capture.html#structfield.textures) and referenced by index
//! from the per event state.
//!
//! All values are little endian. The container starts with the magic `MMRD`
//! followed by a version number. Unknown versions are rejected when reading.
use std::io::{BufWriter, Cursor, Read, Seek, Write};

use binrw::{BinRead, BinReaderExt, BinWrite, BinWriterExt};
use image::RgbaImage;

use crate::{
    error::SaveTextureError, parse_count32, parse_opt8, parse_string, write_count32, write_opt8,
    write_string,
};

pub const VERSION: u32 = 1;

/// A recorded GPU frame and the state snapshots needed to replay it.
#[derive(Debug, BinRead, BinWrite, PartialEq, Clone)]
#[brw(magic = b"MMRD", little)]
pub struct Capture {
    #[br(assert(version == VERSION))]
    pub version: u32,

    /// The frame's draw calls in submission order.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub draws: Vec<DrawCall>,

    /// Pipeline state snapshots keyed by [DrawCall::event_id].
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub states: Vec<EventState>,

    /// Raw GPU buffer payloads referenced by buffer bindings.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub buffers: Vec<GpuBuffer>,

    /// Texture images referenced by [PipelineState::fragment_textures].
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub textures: Vec<TextureData>,
}

/// One GPU rendering command captured during the frame.
#[derive(Debug, BinRead, BinWrite, PartialEq, Clone)]
pub struct DrawCall {
    /// Identifies this draw in the frame's event stream.
    pub event_id: u32,
    /// The number of indices for an indexed draw and 0 otherwise.
    pub num_indices: u32,
    /// The API call name like `glDrawElements(...)`.
    /// Extraction heuristics match on this name.
    #[br(parse_with = parse_string)]
    #[bw(write_with = write_string)]
    pub name: String,
    /// Nested draw calls. Not used beyond name matching.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub children: Vec<DrawCall>,
}

/// The pipeline state snapshot for one event.
#[derive(Debug, BinRead, BinWrite, PartialEq, Clone)]
pub struct EventState {
    pub event_id: u32,
    pub state: PipelineState,
}

/// GPU configuration active at a single draw call.
#[derive(Debug, BinRead, BinWrite, PartialEq, Clone)]
pub struct PipelineState {
    /// The bound index buffer if the draw is indexed.
    #[br(parse_with = parse_opt8)]
    #[bw(write_with = write_opt8)]
    pub index_buffer: Option<IndexBufferBinding>,

    /// Vertex buffer bindings indexed by [VertexAttribute::buffer_slot].
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub vertex_buffers: Vec<VertexBufferBinding>,

    /// Vertex input attributes in shader input order.
    /// The maps renderer binds position as input 0 and texture coordinates as input 1.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub attributes: Vec<VertexAttribute>,

    /// Vertex shader constant buffer contents reflected at this event.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub constant_blocks: Vec<ConstantBlock>,

    /// Indices into [Capture::textures] for the fragment stage's read only resources.
    /// The first entry is the diffuse texture for the maps renderer.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub fragment_textures: Vec<u32>,
}

/// The bound index buffer for an indexed draw call.
#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
pub struct IndexBufferBinding {
    /// The index into [Capture::buffers].
    pub buffer_index: u32,
    /// The start of the indices in the buffer in bytes.
    pub data_offset: u32,
    pub index_format: IndexFormat,
}

#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
#[brw(repr(u8))]
pub enum IndexFormat {
    Uint16 = 0,
    Uint32 = 1,
}

/// A vertex buffer binding slot.
#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
pub struct VertexBufferBinding {
    /// The index into [Capture::buffers].
    pub buffer_index: u32,
    /// The start of the vertex data in the buffer in bytes.
    pub data_offset: u32,
    /// The size of one vertex in bytes.
    pub stride: u32,
}

/// A single vertex input attribute like positions or texture coordinates.
#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
pub struct VertexAttribute {
    /// The [VertexBufferBinding] supplying this attribute's data.
    pub buffer_slot: u32,
    /// The offset of this attribute within one vertex in bytes.
    pub data_offset: u32,
    pub format: AttributeFormat,
}

// Formats are limited to what the maps renderer's captures actually bind.
/// The component type and count for a [VertexAttribute].
#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
#[brw(repr(u16))]
pub enum AttributeFormat {
    Float32x2 = 0,
    Float32x3 = 1,
    Float32x4 = 2,
    Unorm8x4 = 3,
    Snorm8x4 = 4,
    Unorm16x2 = 5,
    Uint8x4 = 6,
    Uint16x2 = 7,
    Uint32 = 8,
}

/// A group of shader uniform variables reflected from compiled shader metadata
/// with their values at a given event.
#[derive(Debug, BinRead, BinWrite, PartialEq, Clone)]
pub struct ConstantBlock {
    #[br(parse_with = parse_string)]
    #[bw(write_with = write_string)]
    pub name: String,
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub variables: Vec<ShaderVariable>,
}

/// A reflected uniform variable and its raw value.
#[derive(Debug, BinRead, BinWrite, PartialEq, Clone)]
pub struct ShaderVariable {
    #[br(parse_with = parse_string)]
    #[bw(write_with = write_string)]
    pub name: String,
    pub var_type: VarType,
    pub rows: u8,
    pub columns: u8,
    /// Raw bit patterns for `rows * columns` components.
    /// [var_type](#structfield.var_type) selects the interpretation.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub values: Vec<u32>,
    /// Members of a structured variable. Empty for plain variables.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub members: Vec<ShaderVariable>,
}

#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
#[brw(repr(u8))]
pub enum VarType {
    Float = 0,
    Int = 1,
    Uint = 2,
    Bool = 3,
    Double = 4,
    Struct = 5,
}

/// A raw GPU buffer payload.
#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone)]
pub struct GpuBuffer {
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub data: Vec<u8>,
}

/// An uncompressed texture image.
#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    /// Tightly packed `width * height * 4` bytes of pixel data.
    #[br(parse_with = parse_count32)]
    #[bw(write_with = write_count32)]
    pub data: Vec<u8>,
}

#[derive(Debug, BinRead, BinWrite, PartialEq, Eq, Clone, Copy)]
#[brw(repr(u8))]
pub enum TextureFormat {
    Rgba8Unorm = 0,
    Bgra8Unorm = 1,
}

impl TextureData {
    /// Convert the raw pixel data to an RGBA image, swizzling channels if needed.
    pub fn to_image(&self) -> Result<RgbaImage, SaveTextureError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(SaveTextureError::DimensionMismatch {
                width: self.width,
                height: self.height,
                len: self.data.len(),
            });
        }

        let mut data = self.data.clone();
        if self.format == TextureFormat::Bgra8Unorm {
            for pixel in data.chunks_exact_mut(4) {
                pixel.swap(0, 2);
            }
        }

        RgbaImage::from_raw(self.width, self.height, data).ok_or(
            SaveTextureError::DimensionMismatch {
                width: self.width,
                height: self.height,
                len: self.data.len(),
            },
        )
    }

    /// Export the texture as an uncompressed PNG with the alpha channel preserved.
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), SaveTextureError> {
        let image = self.to_image()?;
        image
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(Into::into)
    }
}

impl Capture {
    pub fn read<R: Read + Seek>(reader: &mut R) -> binrw::BinResult<Self> {
        reader.read_le()
    }

    /// Read from `path` using a fully buffered reader for performance.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> binrw::BinResult<Self> {
        let mut reader = Cursor::new(std::fs::read(path)?);
        reader.read_le()
    }

    pub fn from_bytes<T: AsRef<[u8]>>(bytes: T) -> binrw::BinResult<Self> {
        Self::read(&mut Cursor::new(bytes))
    }

    pub fn write<W: Write + Seek>(&self, writer: &mut W) -> binrw::BinResult<()> {
        writer.write_le(self)
    }

    /// Write to `path` using a buffered writer for better performance.
    pub fn write_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> binrw::BinResult<()> {
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        self.write(&mut writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_capture() -> Capture {
        Capture {
            version: VERSION,
            draws: vec![
                DrawCall {
                    event_id: 10,
                    num_indices: 0,
                    name: "glClear(Color = <0.000000, 0.000000, 0.000000, 1.000000>, Depth = <1.000000>)".to_string(),
                    children: Vec::new(),
                },
                DrawCall {
                    event_id: 11,
                    num_indices: 3,
                    name: "glDrawElements(3)".to_string(),
                    children: vec![DrawCall {
                        event_id: 12,
                        num_indices: 0,
                        name: "nested".to_string(),
                        children: Vec::new(),
                    }],
                },
            ],
            states: vec![EventState {
                event_id: 11,
                state: PipelineState {
                    index_buffer: Some(IndexBufferBinding {
                        buffer_index: 0,
                        data_offset: 0,
                        index_format: IndexFormat::Uint16,
                    }),
                    vertex_buffers: vec![VertexBufferBinding {
                        buffer_index: 1,
                        data_offset: 0,
                        stride: 20,
                    }],
                    attributes: vec![
                        VertexAttribute {
                            buffer_slot: 0,
                            data_offset: 0,
                            format: AttributeFormat::Float32x3,
                        },
                        VertexAttribute {
                            buffer_slot: 0,
                            data_offset: 12,
                            format: AttributeFormat::Float32x2,
                        },
                    ],
                    constant_blocks: vec![ConstantBlock {
                        name: "globals".to_string(),
                        variables: vec![ShaderVariable {
                            name: "opacity".to_string(),
                            var_type: VarType::Float,
                            rows: 1,
                            columns: 1,
                            values: vec![1.0f32.to_bits()],
                            members: Vec::new(),
                        }],
                    }],
                    fragment_textures: vec![0],
                },
            }],
            buffers: vec![
                GpuBuffer {
                    data: vec![0, 0, 1, 0, 2, 0],
                },
                GpuBuffer { data: vec![0; 60] },
            ],
            textures: vec![TextureData {
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
                data: vec![255, 0, 0, 128],
            }],
        }
    }

    #[test]
    fn write_read_capture() {
        let capture = sample_capture();

        let mut writer = Cursor::new(Vec::new());
        capture.write(&mut writer).unwrap();

        assert_eq!(capture, Capture::from_bytes(writer.into_inner()).unwrap());
    }

    #[test]
    fn read_capture_unsupported_version() {
        let mut writer = Cursor::new(Vec::new());
        let mut capture = sample_capture();
        capture.version = VERSION + 1;
        // The version assert only applies when reading.
        capture.write(&mut writer).unwrap();

        assert!(Capture::from_bytes(writer.into_inner()).is_err());
    }

    #[test]
    fn read_capture_bad_magic() {
        assert!(Capture::from_bytes(b"XXXX\x01\x00\x00\x00").is_err());
    }

    #[test]
    fn bgra_image_swizzles_channels() {
        let texture = TextureData {
            width: 1,
            height: 1,
            format: TextureFormat::Bgra8Unorm,
            data: vec![10, 20, 30, 40],
        };

        let image = texture.to_image().unwrap();
        assert_eq!(&[30, 20, 10, 40], &image.into_raw()[..]);
    }

    #[test]
    fn save_png_preserves_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.png");

        let texture = TextureData {
            width: 2,
            height: 1,
            format: TextureFormat::Rgba8Unorm,
            data: vec![255, 0, 0, 128, 0, 255, 0, 255],
        };
        texture.save_png(&path).unwrap();

        let image = image::open(&path).unwrap().into_rgba8();
        assert_eq!(&texture.data[..], &image.into_raw()[..]);
    }

    #[test]
    fn image_dimension_mismatch() {
        let texture = TextureData {
            width: 2,
            height: 2,
            format: TextureFormat::Rgba8Unorm,
            data: vec![0; 4],
        };

        assert!(matches!(
            texture.to_image(),
            Err(SaveTextureError::DimensionMismatch { .. })
        ));
    }
}
