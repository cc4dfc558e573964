use std::path::PathBuf;

use thiserror::Error;

/// An error while reading a capture file from disk.
#[derive(Debug, Error)]
#[error("error reading capture file {path:?}")]
pub struct ReadFileError {
    pub path: PathBuf,
    #[source]
    pub source: binrw::Error,
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("no pipeline state recorded for event {0}")]
    UnknownEvent(u32),

    #[error("no replay position set")]
    NoEventSet,

    #[error("buffer index {index} out of range for {count} buffers")]
    BufferIndexOutOfRange { index: u32, count: usize },

    #[error("texture index {index} out of range for {count} textures")]
    TextureIndexOutOfRange { index: u32, count: usize },
}

#[derive(Debug, Error)]
pub enum SaveTextureError {
    #[error("texture dimensions {width}x{height} do not match {len} bytes of data")]
    DimensionMismatch { width: u32, height: u32, len: usize },

    #[error("error encoding image")]
    Image(#[from] image::ImageError),
}
