//! wasm entry points, following the wasm-minimal-protocol byte ABI.
//! Invalid UTF-8 input is treated as empty text.

use wasm_minimal_protocol::*;

initiate_protocol!();

/// Input: UTF-8 text, e.g. b"中文ABC"
/// Output: the text with U+2009 at every script boundary
#[wasm_func]
pub fn add_space_to_string(input: &[u8]) -> Vec<u8> {
    let text = std::str::from_utf8(input).unwrap_or("");
    crate::boundary::add_space_to_string(text).into_bytes()
}

/// Input: UTF-8 text
/// Output: JSON array of character offsets, e.g. b"[1,2]" for "A中B"
#[wasm_func]
pub fn find_boundaries(input: &[u8]) -> Vec<u8> {
    let text = std::str::from_utf8(input).unwrap_or("");
    let indexes: Vec<usize> = crate::boundary::find_boundaries(text).collect();
    serde_json::to_string(&indexes)
        .unwrap_or_else(|_| "[]".to_string())
        .into_bytes()
}

/// Input: UTF-8 text
/// Output: JSON array of `{text, class, start}` runs
#[wasm_func]
pub fn script_runs(input: &[u8]) -> Vec<u8> {
    let text = std::str::from_utf8(input).unwrap_or("");
    serde_json::to_string(&crate::run::script_runs(text))
        .unwrap_or_else(|_| "[]".to_string())
        .into_bytes()
}
