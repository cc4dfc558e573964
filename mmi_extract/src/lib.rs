//! Extraction of per draw call artifacts from a maps frame capture.
//!
//! [select] narrows the frame's draw calls to the ones drawing 3D map tiles.
//! [extract] decodes and saves geometry, shader constants, and the diffuse
//! texture for each of them. Hosts embedding the extraction step can call
//! [extract::extract_draw_calls] directly instead of going through the CLI.
pub mod extract;
pub mod select;
