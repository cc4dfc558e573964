//! Replay access to a parsed capture.
//!
//! A [ReplaySession] plays the role of the capture tool's replay controller.
//! Setting the frame event selects the pipeline state snapshot recorded for
//! that event. State queries then resolve buffer and texture references
//! against the capture's payload tables.
//!
//! The session owns the capture for the duration of the run and releases it
//! when dropped, on normal return and unwind alike.
use std::path::Path;

use crate::{
    capture::{Capture, ConstantBlock, DrawCall, PipelineState, TextureData},
    error::{ReadFileError, ReplayError},
};

pub struct ReplaySession {
    capture: Capture,
    current_event: Option<u32>,
}

impl ReplaySession {
    /// Open a capture file and begin a replay session.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReadFileError> {
        let path = path.as_ref();
        let capture = Capture::from_file(path).map_err(|source| ReadFileError {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::new(capture))
    }

    pub fn new(capture: Capture) -> Self {
        Self {
            capture,
            current_event: None,
        }
    }

    /// The frame's draw calls in submission order.
    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.capture.draws
    }

    /// Move the replay position to `event_id`.
    ///
    /// Fails if the capture has no state snapshot for the event.
    pub fn set_frame_event(&mut self, event_id: u32) -> Result<(), ReplayError> {
        if !self.capture.states.iter().any(|s| s.event_id == event_id) {
            return Err(ReplayError::UnknownEvent(event_id));
        }
        self.current_event = Some(event_id);
        Ok(())
    }

    /// The pipeline state at the current replay position.
    pub fn pipeline_state(&self) -> Result<&PipelineState, ReplayError> {
        let event_id = self.current_event.ok_or(ReplayError::NoEventSet)?;
        self.capture
            .states
            .iter()
            .find(|s| s.event_id == event_id)
            .map(|s| &s.state)
            .ok_or(ReplayError::UnknownEvent(event_id))
    }

    /// The raw bytes of the buffer at `index`.
    pub fn buffer_data(&self, index: u32) -> Result<&[u8], ReplayError> {
        self.capture
            .buffers
            .get(index as usize)
            .map(|b| b.data.as_slice())
            .ok_or(ReplayError::BufferIndexOutOfRange {
                index,
                count: self.capture.buffers.len(),
            })
    }

    /// The vertex shader constant buffer contents at the current replay position.
    pub fn vertex_constant_blocks(&self) -> Result<&[ConstantBlock], ReplayError> {
        Ok(&self.pipeline_state()?.constant_blocks)
    }

    /// The texture at `index`.
    pub fn texture(&self, index: u32) -> Result<&TextureData, ReplayError> {
        self.capture.textures.get(index as usize).ok_or(
            ReplayError::TextureIndexOutOfRange {
                index,
                count: self.capture.textures.len(),
            },
        )
    }
}
