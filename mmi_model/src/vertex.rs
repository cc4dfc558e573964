//! Utilities for decoding index and vertex buffer data.
//!
//! Captured vertex buffers use an interleaved or "array of structs" layout
//! matching what the renderer uploaded. Decoding produces one value list per
//! attribute, a "struct of arrays" layout that is easier for modeling tools
//! to consume and serialize.
use std::io::{Cursor, Seek, SeekFrom};

use binrw::{BinReaderExt, BinResult};
use glam::{Vec2, Vec3, Vec4};
use mmi_capture::{
    capture::{
        AttributeFormat, DrawCall, IndexBufferBinding, IndexFormat, VertexAttribute,
        VertexBufferBinding,
    },
    replay::ReplaySession,
};
use serde::{ser::SerializeSeq, Serialize, Serializer};

use crate::error::DecodeMeshError;

/// The vertex input the maps renderer uses for positions.
pub const POSITION_INPUT: usize = 0;
/// The vertex input the maps renderer uses for texture coordinates.
pub const UV_INPUT: usize = 1;

/// The per vertex values decoded for one vertex attribute.
#[derive(Debug, PartialEq, Clone)]
pub enum AttributeData {
    Float32x2(Vec<Vec2>),
    Float32x3(Vec<Vec3>),
    Float32x4(Vec<Vec4>),
    Unorm8x4(Vec<Vec4>),
    Snorm8x4(Vec<Vec4>),
    Unorm16x2(Vec<Vec2>),
    Uint8x4(Vec<[u8; 4]>),
    Uint16x2(Vec<[u16; 2]>),
    Uint32(Vec<u32>),
}

impl AttributeData {
    pub fn len(&self) -> usize {
        match self {
            AttributeData::Float32x2(v) => v.len(),
            AttributeData::Float32x3(v) => v.len(),
            AttributeData::Float32x4(v) => v.len(),
            AttributeData::Unorm8x4(v) => v.len(),
            AttributeData::Snorm8x4(v) => v.len(),
            AttributeData::Unorm16x2(v) => v.len(),
            AttributeData::Uint8x4(v) => v.len(),
            AttributeData::Uint16x2(v) => v.len(),
            AttributeData::Uint32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Serialize as plain nested arrays so the artifact shape
// does not depend on the in memory representation.
impl Serialize for AttributeData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        fn arrays<S: Serializer, const N: usize>(
            serializer: S,
            values: impl ExactSizeIterator<Item = [f32; N]>,
        ) -> Result<S::Ok, S::Error>
        where
            [f32; N]: Serialize,
        {
            let mut seq = serializer.serialize_seq(Some(values.len()))?;
            for value in values {
                seq.serialize_element(&value)?;
            }
            seq.end()
        }

        match self {
            AttributeData::Float32x2(v) => arrays(serializer, v.iter().map(|v| v.to_array())),
            AttributeData::Float32x3(v) => arrays(serializer, v.iter().map(|v| v.to_array())),
            AttributeData::Float32x4(v) => arrays(serializer, v.iter().map(|v| v.to_array())),
            AttributeData::Unorm8x4(v) => arrays(serializer, v.iter().map(|v| v.to_array())),
            AttributeData::Snorm8x4(v) => arrays(serializer, v.iter().map(|v| v.to_array())),
            AttributeData::Unorm16x2(v) => arrays(serializer, v.iter().map(|v| v.to_array())),
            AttributeData::Uint8x4(v) => v.serialize(serializer),
            AttributeData::Uint16x2(v) => v.serialize(serializer),
            AttributeData::Uint32(v) => v.serialize(serializer),
        }
    }
}

/// The decoded streams for one indexed draw call.
#[derive(Debug, PartialEq, Clone)]
pub struct DrawGeometry {
    pub indices: Vec<u32>,
    pub positions: AttributeData,
    pub uvs: AttributeData,
}

/// Decode the index buffer and the position and UV streams for `draw`
/// at the session's current replay position.
///
/// Any failure leaves no partial result, so callers can skip the draw call
/// without cleaning up output.
pub fn decode_draw_geometry(
    session: &ReplaySession,
    draw: &DrawCall,
) -> Result<DrawGeometry, DecodeMeshError> {
    let state = session.pipeline_state()?;

    let index_buffer = state
        .index_buffer
        .as_ref()
        .ok_or(DecodeMeshError::MissingIndexBuffer)?;
    let index_data = session.buffer_data(index_buffer.buffer_index)?;
    let indices = read_indices(index_buffer, index_data, draw.num_indices)?;

    // The streams store one value per referenced vertex.
    let vertex_count = indices.iter().max().map(|i| *i as usize + 1).unwrap_or(0);

    let positions = read_input_attribute(session, POSITION_INPUT, vertex_count)?;
    let uvs = read_input_attribute(session, UV_INPUT, vertex_count)?;

    Ok(DrawGeometry {
        indices,
        positions,
        uvs,
    })
}

fn read_input_attribute(
    session: &ReplaySession,
    input: usize,
    vertex_count: usize,
) -> Result<AttributeData, DecodeMeshError> {
    let state = session.pipeline_state()?;
    let attribute = state
        .attributes
        .get(input)
        .ok_or(DecodeMeshError::MissingAttribute { index: input })?;
    let binding = state
        .vertex_buffers
        .get(attribute.buffer_slot as usize)
        .ok_or(DecodeMeshError::MissingVertexBuffer {
            slot: attribute.buffer_slot,
        })?;
    let buffer = session.buffer_data(binding.buffer_index)?;
    read_attribute(attribute, binding, buffer, vertex_count)
}

/// Decode `index_count` indices starting at the binding's offset,
/// widening 16 bit indices to `u32`.
pub fn read_indices(
    binding: &IndexBufferBinding,
    buffer: &[u8],
    index_count: u32,
) -> Result<Vec<u32>, DecodeMeshError> {
    let mut reader = Cursor::new(buffer);
    reader.seek(SeekFrom::Start(binding.data_offset as u64))?;

    let mut indices = Vec::with_capacity(index_count as usize);
    for _ in 0..index_count {
        let index = match binding.index_format {
            IndexFormat::Uint16 => reader.read_le::<u16>()? as u32,
            IndexFormat::Uint32 => reader.read_le::<u32>()?,
        };
        indices.push(index);
    }
    Ok(indices)
}

/// Decode `vertex_count` values for a single attribute from an interleaved buffer.
pub fn read_attribute(
    attribute: &VertexAttribute,
    binding: &VertexBufferBinding,
    buffer: &[u8],
    vertex_count: usize,
) -> Result<AttributeData, DecodeMeshError> {
    match attribute.format {
        AttributeFormat::Float32x2 => read_data(attribute, binding, buffer, vertex_count, read_f32x2)
            .map(AttributeData::Float32x2),
        AttributeFormat::Float32x3 => read_data(attribute, binding, buffer, vertex_count, read_f32x3)
            .map(AttributeData::Float32x3),
        AttributeFormat::Float32x4 => read_data(attribute, binding, buffer, vertex_count, read_f32x4)
            .map(AttributeData::Float32x4),
        AttributeFormat::Unorm8x4 => read_data(attribute, binding, buffer, vertex_count, read_unorm8x4)
            .map(AttributeData::Unorm8x4),
        AttributeFormat::Snorm8x4 => read_data(attribute, binding, buffer, vertex_count, read_snorm8x4)
            .map(AttributeData::Snorm8x4),
        AttributeFormat::Unorm16x2 => {
            read_data(attribute, binding, buffer, vertex_count, read_unorm16x2)
                .map(AttributeData::Unorm16x2)
        }
        AttributeFormat::Uint8x4 => read_data(attribute, binding, buffer, vertex_count, read_u8x4)
            .map(AttributeData::Uint8x4),
        AttributeFormat::Uint16x2 => read_data(attribute, binding, buffer, vertex_count, read_u16x2)
            .map(AttributeData::Uint16x2),
        AttributeFormat::Uint32 => {
            read_data(attribute, binding, buffer, vertex_count, read_u32).map(AttributeData::Uint32)
        }
    }
}

fn read_data<T, F>(
    attribute: &VertexAttribute,
    binding: &VertexBufferBinding,
    buffer: &[u8],
    vertex_count: usize,
    read_item: F,
) -> Result<Vec<T>, DecodeMeshError>
where
    F: Fn(&mut Cursor<&[u8]>) -> BinResult<T>,
{
    let mut reader = Cursor::new(buffer);

    let mut values = Vec::with_capacity(vertex_count);
    for i in 0..vertex_count as u64 {
        let offset = binding.data_offset as u64
            + i * binding.stride as u64
            + attribute.data_offset as u64;
        reader.seek(SeekFrom::Start(offset))?;

        values.push(read_item(&mut reader)?);
    }
    Ok(values)
}

fn read_u32(reader: &mut Cursor<&[u8]>) -> BinResult<u32> {
    reader.read_le()
}

fn read_u8x4(reader: &mut Cursor<&[u8]>) -> BinResult<[u8; 4]> {
    reader.read_le()
}

fn read_u16x2(reader: &mut Cursor<&[u8]>) -> BinResult<[u16; 2]> {
    reader.read_le()
}

fn read_f32x2(reader: &mut Cursor<&[u8]>) -> BinResult<Vec2> {
    let value: [f32; 2] = reader.read_le()?;
    Ok(value.into())
}

fn read_f32x3(reader: &mut Cursor<&[u8]>) -> BinResult<Vec3> {
    let value: [f32; 3] = reader.read_le()?;
    Ok(value.into())
}

fn read_f32x4(reader: &mut Cursor<&[u8]>) -> BinResult<Vec4> {
    let value: [f32; 4] = reader.read_le()?;
    Ok(value.into())
}

fn read_unorm8x4(reader: &mut Cursor<&[u8]>) -> BinResult<Vec4> {
    let value: [u8; 4] = reader.read_le()?;
    Ok(value.map(|u| u as f32 / 255.0).into())
}

fn read_snorm8x4(reader: &mut Cursor<&[u8]>) -> BinResult<Vec4> {
    let value: [i8; 4] = reader.read_le()?;
    Ok(value.map(|i| (i as f32 / 127.0).max(-1.0)).into())
}

fn read_unorm16x2(reader: &mut Cursor<&[u8]>) -> BinResult<Vec2> {
    let value: [u16; 2] = reader.read_le()?;
    Ok(value.map(|u| u as f32 / 65535.0).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    use glam::{vec2, vec3};
    use hexlit::hex;
    use mmi_capture::capture::{
        Capture, EventState, GpuBuffer, PipelineState, TextureData, TextureFormat, VERSION,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn read_position_uv_vertices() {
        // Two interleaved vertices with a float3 position and float2 UV.
        let data = hex!(
            // vertex 0
            0000803f 00000040 00004040
            0000003f 0x0000803e
            // vertex 1
            000080bf 000000c0 000040c0
            00000000 0000803f
        );

        let binding = VertexBufferBinding {
            buffer_index: 0,
            data_offset: 0,
            stride: 20,
        };

        assert_eq!(
            AttributeData::Float32x3(vec![vec3(1.0, 2.0, 3.0), vec3(-1.0, -2.0, -3.0)]),
            read_attribute(
                &VertexAttribute {
                    buffer_slot: 0,
                    data_offset: 0,
                    format: AttributeFormat::Float32x3,
                },
                &binding,
                &data,
                2
            )
            .unwrap()
        );

        assert_eq!(
            AttributeData::Float32x2(vec![vec2(0.5, 0.25), vec2(0.0, 1.0)]),
            read_attribute(
                &VertexAttribute {
                    buffer_slot: 0,
                    data_offset: 12,
                    format: AttributeFormat::Float32x2,
                },
                &binding,
                &data,
                2
            )
            .unwrap()
        );
    }

    #[test]
    fn read_unorm8x4_vertices() {
        let data = hex!(00 7f ff 00);

        let values = read_attribute(
            &VertexAttribute {
                buffer_slot: 0,
                data_offset: 0,
                format: AttributeFormat::Unorm8x4,
            },
            &VertexBufferBinding {
                buffer_index: 0,
                data_offset: 0,
                stride: 4,
            },
            &data,
            1,
        )
        .unwrap();

        match values {
            AttributeData::Unorm8x4(v) => {
                assert_eq!(1, v.len());
                approx::assert_relative_eq!(0.0, v[0].x);
                approx::assert_relative_eq!(127.0 / 255.0, v[0].y);
                approx::assert_relative_eq!(1.0, v[0].z);
                approx::assert_relative_eq!(0.0, v[0].w);
            }
            _ => panic!("unexpected attribute data"),
        }
    }

    #[test]
    fn read_attribute_past_end_of_buffer() {
        let data = hex!(0000803f 00000040);

        let result = read_attribute(
            &VertexAttribute {
                buffer_slot: 0,
                data_offset: 0,
                format: AttributeFormat::Float32x3,
            },
            &VertexBufferBinding {
                buffer_index: 0,
                data_offset: 0,
                stride: 12,
            },
            &data,
            1,
        );

        assert!(matches!(result, Err(DecodeMeshError::Binrw(_))));
    }

    #[test]
    fn read_indices_u16() {
        let data = hex!(0000 0100 0200 0100);

        let indices = read_indices(
            &IndexBufferBinding {
                buffer_index: 0,
                data_offset: 0,
                index_format: IndexFormat::Uint16,
            },
            &data,
            4,
        )
        .unwrap();

        assert_eq!(vec![0, 1, 2, 1], indices);
    }

    #[test]
    fn read_indices_u32_with_offset() {
        let data = hex!(ffffffff 02000000 01000000);

        let indices = read_indices(
            &IndexBufferBinding {
                buffer_index: 0,
                data_offset: 4,
                index_format: IndexFormat::Uint32,
            },
            &data,
            2,
        )
        .unwrap();

        assert_eq!(vec![2, 1], indices);
    }

    #[test]
    fn read_indices_past_end_of_buffer() {
        let data = hex!(0000 0100);

        let result = read_indices(
            &IndexBufferBinding {
                buffer_index: 0,
                data_offset: 0,
                index_format: IndexFormat::Uint16,
            },
            &data,
            3,
        );

        assert!(matches!(result, Err(DecodeMeshError::Binrw(_))));
    }

    fn indexed_draw_capture() -> (Capture, DrawCall) {
        let draw = DrawCall {
            event_id: 2,
            num_indices: 3,
            name: "glDrawElements(3)".to_string(),
            children: Vec::new(),
        };

        let vertex_data = hex!(
            0000803f 00000040 00004040 0000003f 0x0000803e
            000080bf 000000c0 000040c0 00000000 0000803f
            00000000 00000000 00000000 0000803f 0000803f
        );

        let capture = Capture {
            version: VERSION,
            draws: vec![draw.clone()],
            states: vec![EventState {
                event_id: 2,
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
                    constant_blocks: Vec::new(),
                    fragment_textures: Vec::new(),
                },
            }],
            buffers: vec![
                GpuBuffer {
                    data: hex!(0000 0100 0200).to_vec(),
                },
                GpuBuffer {
                    data: vertex_data.to_vec(),
                },
            ],
            textures: vec![TextureData {
                width: 1,
                height: 1,
                format: TextureFormat::Rgba8Unorm,
                data: vec![0; 4],
            }],
        };

        (capture, draw)
    }

    #[test]
    fn decode_indexed_draw() {
        let (capture, draw) = indexed_draw_capture();
        let mut session = ReplaySession::new(capture);
        session.set_frame_event(draw.event_id).unwrap();

        let geometry = decode_draw_geometry(&session, &draw).unwrap();
        assert_eq!(vec![0, 1, 2], geometry.indices);
        assert_eq!(
            AttributeData::Float32x3(vec![
                vec3(1.0, 2.0, 3.0),
                vec3(-1.0, -2.0, -3.0),
                vec3(0.0, 0.0, 0.0)
            ]),
            geometry.positions
        );
        assert_eq!(
            AttributeData::Float32x2(vec![vec2(0.5, 0.25), vec2(0.0, 1.0), vec2(1.0, 1.0)]),
            geometry.uvs
        );
    }

    #[test]
    fn decode_draw_without_index_buffer() {
        let (mut capture, draw) = indexed_draw_capture();
        capture.states[0].state.index_buffer = None;

        let mut session = ReplaySession::new(capture);
        session.set_frame_event(draw.event_id).unwrap();

        assert!(matches!(
            decode_draw_geometry(&session, &draw),
            Err(DecodeMeshError::MissingIndexBuffer)
        ));
    }

    #[test]
    fn decode_draw_missing_uv_attribute() {
        let (mut capture, draw) = indexed_draw_capture();
        capture.states[0].state.attributes.truncate(1);

        let mut session = ReplaySession::new(capture);
        session.set_frame_event(draw.event_id).unwrap();

        assert!(matches!(
            decode_draw_geometry(&session, &draw),
            Err(DecodeMeshError::MissingAttribute { index: UV_INPUT })
        ));
    }

    #[test]
    fn serialize_positions_as_arrays() {
        let positions = AttributeData::Float32x3(vec![vec3(1.0, 2.0, 3.0)]);
        assert_eq!(
            "[[1.0,2.0,3.0]]",
            serde_json::to_string(&positions).unwrap()
        );
    }
}
