//! Selection of the draw calls worth extracting.
//!
//! The maps renderer draws its 3D tiles between a characteristic clear and a
//! final 4 argument array draw. The heuristic scans the frame's draw call
//! names for that range. The exact clear signature differs between capture
//! contexts, so the signatures are configuration with defaults taken from
//! observed captures, not fixed logic.
use mmi_capture::capture::DrawCall;

/// Draw call name patterns delimiting the relevant range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Clear signatures tried in order until one yields a non empty range.
    pub clear_signatures: Vec<String>,
    /// Name prefix of the draw call ending the range.
    pub end_prefix: String,
    /// Name prefix identifying indexed draws worth extracting.
    pub indexed_prefix: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            clear_signatures: vec![
                "glClear(Color = <0.000000, 0.000000, 0.000000, 1.000000>, Depth = <1.000000>)"
                    .to_string(),
                "glClear(Color = <0.000000, 0.000000, 0.000000, 1.000000>, Depth = <1.000000>, Stencil = <0x00>)"
                    .to_string(),
            ],
            end_prefix: "glDrawArrays(4)".to_string(),
            indexed_prefix: "glDrawElements".to_string(),
        }
    }
}

/// Return the draw calls between the first matching clear signature and the
/// terminating array draw, in original order.
///
/// Signatures are tried in order and the first non empty result wins.
/// No match under any signature returns an empty list, meaning there is
/// nothing to extract.
pub fn relevant_draw_calls<'a>(
    draws: &'a [DrawCall],
    config: &SelectorConfig,
) -> Vec<&'a DrawCall> {
    config
        .clear_signatures
        .iter()
        .map(|signature| scan_range(draws, signature, &config.end_prefix))
        .find(|relevant| !relevant.is_empty())
        .unwrap_or_default()
}

fn scan_range<'a>(draws: &'a [DrawCall], signature: &str, end_prefix: &str) -> Vec<&'a DrawCall> {
    let mut relevant = Vec::new();
    let mut in_range = false;
    for draw in draws {
        if in_range {
            if draw.name.starts_with(end_prefix) {
                break;
            }
            relevant.push(draw);
        }
        if draw.name.starts_with(signature) {
            in_range = true;
        }
    }
    relevant
}
