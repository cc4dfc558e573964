use mmi_capture::error::ReplayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeMeshError {
    #[error("draw call has no index buffer bound")]
    MissingIndexBuffer,

    #[error("missing vertex attribute stream {index}")]
    MissingAttribute { index: usize },

    #[error("vertex buffer slot {slot} is not bound")]
    MissingVertexBuffer { slot: u32 },

    #[error("error reading buffer data")]
    Binrw(#[from] binrw::Error),

    #[error("error reading buffer data")]
    Io(#[from] std::io::Error),

    #[error("error replaying draw call")]
    Replay(#[from] ReplayError),
}
