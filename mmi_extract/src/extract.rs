//! The per draw call extraction loop.
use std::io::BufWriter;
use std::path::PathBuf;

use log::{info, warn};
use mmi_capture::{
    error::{ReplayError, SaveTextureError},
    replay::ReplaySession,
};
use mmi_model::{constant_block_values, decode_draw_geometry};
use serde::Serialize;
use thiserror::Error;

use crate::select::{relevant_draw_calls, SelectorConfig};

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("error replaying capture")]
    Replay(#[from] ReplayError),

    #[error("draw call has no bound fragment texture")]
    MissingFragmentTexture,

    #[error("error saving texture")]
    Texture(#[from] SaveTextureError),

    #[error("error writing output file")]
    Io(#[from] std::io::Error),

    #[error("error serializing output")]
    Json(#[from] serde_json::Error),
}

/// Extract geometry, shader constants, and the diffuse texture for every
/// relevant draw call, writing one set of files per draw call under `prefix`.
///
/// Draw calls that are not indexed draws or whose streams fail to decode are
/// skipped without producing any files for their sequence index. Returns the
/// number of draw calls actually extracted.
pub fn extract_draw_calls(
    session: &mut ReplaySession,
    prefix: &str,
    config: &SelectorConfig,
) -> Result<usize, ExtractError> {
    let draws = session.draw_calls().to_vec();
    let relevant = relevant_draw_calls(&draws, config);
    if relevant.is_empty() {
        info!("No relevant draw calls found, nothing to extract");
        return Ok(0);
    }

    let mut extracted = 0;
    for (index, draw) in relevant.iter().enumerate() {
        info!("Draw call: {}", draw.name);
        if !draw.name.starts_with(&config.indexed_prefix) {
            info!("(Skipping)");
            continue;
        }

        session.set_frame_event(draw.event_id)?;

        // Decode everything before writing anything so a failed
        // draw call leaves no partial output behind.
        let geometry = match decode_draw_geometry(session, draw) {
            Ok(geometry) => geometry,
            Err(e) => {
                warn!("(Skipping: {e})");
                continue;
            }
        };
        let constants = constant_block_values(session.vertex_constant_blocks()?);

        write_json(&output_path(prefix, index, "indices.bin"), &geometry.indices)?;
        write_json(
            &output_path(prefix, index, "positions.bin"),
            &geometry.positions,
        )?;
        write_json(&output_path(prefix, index, "uv.bin"), &geometry.uvs)?;
        write_json(&output_path(prefix, index, "constants.bin"), &constants)?;

        let state = session.pipeline_state()?;
        let texture_index = *state
            .fragment_textures
            .first()
            .ok_or(ExtractError::MissingFragmentTexture)?;
        session
            .texture(texture_index)?
            .save_png(output_path(prefix, index, "texture.png"))?;

        extracted += 1;
    }

    Ok(extracted)
}

fn output_path(prefix: &str, index: usize, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{prefix}{index:05}-{suffix}"))
}

fn write_json<T: Serialize>(path: &PathBuf, value: &T) -> Result<(), ExtractError> {
    let mut writer = BufWriter::new(std::fs::File::create(path)?);
    serde_json::to_writer(&mut writer, value)?;
    Ok(())
}
