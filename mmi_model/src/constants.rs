//! Flattening of reflected shader constants.
//!
//! Each uniform variable becomes a flat numeric sequence with
//! `rows * columns` elements. Structured variables expand their members one
//! level. Value kinds the maps renderer never uses are left as a placeholder
//! zero rather than failing extraction.
use indexmap::IndexMap;
use mmi_capture::capture::{ConstantBlock, ShaderVariable, VarType};
use serde::Serialize;

/// The flattened value of one uniform variable.
#[derive(Debug, PartialEq, Clone, Serialize)]
#[serde(untagged)]
pub enum ConstantValue {
    Floats(Vec<f32>),
    Ints(Vec<i32>),
    /// An unsupported value kind.
    Placeholder(i32),
    /// One level of structured member expansion.
    Struct(Vec<ConstantValue>),
}

/// Flatten every constant block into a `block name -> variable name -> value` mapping,
/// preserving reflection order.
pub fn constant_block_values(
    blocks: &[ConstantBlock],
) -> IndexMap<String, IndexMap<String, ConstantValue>> {
    blocks
        .iter()
        .map(|block| {
            let variables = block
                .variables
                .iter()
                .map(|v| (v.name.clone(), flatten_variable(v)))
                .collect();
            (block.name.clone(), variables)
        })
        .collect()
}

/// Flatten a single variable, expanding structured members one level.
pub fn flatten_variable(variable: &ShaderVariable) -> ConstantValue {
    if !variable.members.is_empty() {
        ConstantValue::Struct(variable.members.iter().map(flatten_value).collect())
    } else {
        flatten_value(variable)
    }
}

fn flatten_value(variable: &ShaderVariable) -> ConstantValue {
    let count = (variable.rows as usize * variable.columns as usize).min(variable.values.len());
    match variable.var_type {
        VarType::Float => ConstantValue::Floats(
            variable.values[..count]
                .iter()
                .map(|bits| f32::from_bits(*bits))
                .collect(),
        ),
        VarType::Int => ConstantValue::Ints(
            variable.values[..count].iter().map(|v| *v as i32).collect(),
        ),
        _ => ConstantValue::Placeholder(0),
    }
}
