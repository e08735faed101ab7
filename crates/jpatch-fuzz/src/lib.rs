//! Fuzzing harnesses for the JSON diff and patch engine.
//!
//! Each public function accepts raw bytes so it can back a `cargo fuzz`
//! target directly. Inputs that cannot be turned into documents are skipped;
//! broken invariants panic.
//!
//! # Examples
//!
//! Invoke the diff harness on deterministic input:
//!
//! ```
//! jpatch_fuzz::fuzz_diff(&[1, 2, 3, 4]);
//! ```
//!
//! Exercise the patch harness with arbitrary bytes:
//!
//! ```
//! jpatch_fuzz::fuzz_patch(b"example");
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use arbitrary::Unstructured;
use jpatch_core::{apply, apply_json, diff_with_flags, pointer, values_equal, DiffFlag, DiffFlags};
use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

const MAX_DEPTH: usize = 4;
const MAX_ARRAY_LEN: u8 = 6;
const MAX_OBJECT_LEN: u8 = 6;
const MAX_STRING_LEN: u8 = 4;

const FLAGS: [DiffFlag; 6] = [
    DiffFlag::OmitValueOnRemove,
    DiffFlag::OmitMoveOperation,
    DiffFlag::OmitCopyOperation,
    DiffFlag::AddOriginalValueOnReplace,
    DiffFlag::AddExplicitRemoveAddOnReplace,
    DiffFlag::EmitTestOperations,
];

/// Diffs two random documents under random flags and checks that the patch
/// reproduces the target.
///
/// # Panics
///
/// Panics when the patch fails to apply or yields a different document.
///
/// ```
/// jpatch_fuzz::fuzz_diff(b"seed");
/// ```
pub fn fuzz_diff(data: &[u8]) {
    let mut unstructured = Unstructured::new(data);
    let Some(source) = random_document(&mut unstructured) else {
        return;
    };
    let Some(target) = random_document(&mut unstructured) else {
        return;
    };
    let flags = random_flags(&mut unstructured).unwrap_or_default();

    let patch = diff_with_flags(&source, &target, &flags);
    let patched = match apply(&patch, &source) {
        Ok(patched) => patched,
        Err(err) => panic!("generated patch failed: {err}\npatch: {patch:?}\nsource: {source}"),
    };
    assert!(
        values_equal(&patched, &target),
        "patch produced {patched} instead of {target} (flags {flags:?}, patch {patch:?})"
    );
}

/// Applies arbitrary bytes as a patch document to a random document.
///
/// The bytes are first interpreted as JSON text; errors are expected and
/// ignored, the harness only looks for panics in decoding and application.
///
/// ```
/// jpatch_fuzz::fuzz_patch(b"[{\"op\":\"add\",\"path\":\"/a\",\"value\":1}]");
/// ```
pub fn fuzz_patch(data: &[u8]) {
    let Ok(patch) = serde_json::from_slice::<JsonValue>(data) else {
        return;
    };
    let mut unstructured = Unstructured::new(data);
    let document = random_document(&mut unstructured).unwrap_or(JsonValue::Null);
    let before = document.clone();
    let _ = apply_json(&patch, &document);
    assert_eq!(document, before, "source document must not change");
}

/// Decodes arbitrary text as a pointer and checks that encoding the tokens
/// gives the same text back.
///
/// # Panics
///
/// Panics when a decoded pointer does not re-encode to its input.
///
/// ```
/// jpatch_fuzz::fuzz_pointer(b"/a~1b/~0");
/// ```
pub fn fuzz_pointer(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(tokens) = pointer::decode(text) {
        assert_eq!(pointer::encode(&tokens), text);
    }
}

fn random_flags(unstructured: &mut Unstructured<'_>) -> Result<DiffFlags, arbitrary::Error> {
    let bits = unstructured.arbitrary::<u8>()?;
    Ok(FLAGS
        .iter()
        .enumerate()
        .filter(|(bit, _)| bits & (1 << bit) != 0)
        .map(|(_, flag)| *flag)
        .collect())
}

fn random_document(unstructured: &mut Unstructured<'_>) -> Option<JsonValue> {
    json_value_from_unstructured(unstructured, 0).ok()
}

fn json_value_from_unstructured(
    unstructured: &mut Unstructured<'_>,
    depth: usize,
) -> Result<JsonValue, arbitrary::Error> {
    if depth >= MAX_DEPTH {
        return json_leaf(unstructured);
    }

    let choice = unstructured.int_in_range::<u8>(0..=5)?;
    match choice {
        0..=3 => json_leaf(unstructured),
        4 => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_ARRAY_LEN)?);
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(json_value_from_unstructured(unstructured, depth + 1)?);
            }
            Ok(JsonValue::Array(items))
        }
        _ => {
            let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_OBJECT_LEN)?);
            let mut map = JsonMap::new();
            for _ in 0..len {
                let key = random_string(unstructured)?;
                let value = json_value_from_unstructured(unstructured, depth + 1)?;
                map.insert(key, value);
            }
            Ok(JsonValue::Object(map))
        }
    }
}

fn json_leaf(unstructured: &mut Unstructured<'_>) -> Result<JsonValue, arbitrary::Error> {
    let choice = unstructured.int_in_range::<u8>(0..=3)?;
    match choice {
        0 => Ok(JsonValue::Null),
        1 => Ok(JsonValue::Bool(unstructured.arbitrary()?)),
        2 => Ok(JsonValue::Number(random_number(unstructured)?)),
        _ => Ok(JsonValue::String(random_string(unstructured)?)),
    }
}

fn random_number(unstructured: &mut Unstructured<'_>) -> Result<JsonNumber, arbitrary::Error> {
    if unstructured.arbitrary()? {
        // a narrow range makes equal values, and thus moves and copies, likely
        let int = unstructured.int_in_range::<i64>(-4..=4)?;
        Ok(JsonNumber::from(int))
    } else {
        let numerator = f64::from(unstructured.arbitrary::<i32>()?);
        let denominator = f64::from(unstructured.int_in_range::<u16>(1..=1024)?);
        JsonNumber::from_f64(numerator / denominator).ok_or(arbitrary::Error::IncorrectFormat)
    }
}

fn random_string(unstructured: &mut Unstructured<'_>) -> Result<String, arbitrary::Error> {
    const ALPHABET: &[u8] = b"ab~/0-";
    let len = usize::from(unstructured.int_in_range::<u8>(0..=MAX_STRING_LEN)?);
    let mut string = String::with_capacity(len);
    for _ in 0..len {
        string.push(char::from(*unstructured.choose(ALPHABET)?));
    }
    Ok(string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_harness_runs() {
        fuzz_diff(b"diff");
        let seed: Vec<u8> = (0..=255).collect();
        fuzz_diff(&seed);
        fuzz_diff(&seed.iter().rev().copied().collect::<Vec<_>>());
    }

    #[test]
    fn patch_harness_runs() {
        fuzz_patch(b"patch");
        fuzz_patch(br#"[{"op":"move","from":"","path":"/a"}]"#);
        fuzz_patch(br#"[{"op":"remove","path":""}]"#);
    }

    #[test]
    fn pointer_harness_runs() {
        fuzz_pointer(b"");
        fuzz_pointer(b"/~01/~10//-");
        fuzz_pointer(b"no-slash");
        fuzz_pointer(b"/bad~");
    }

    #[test]
    fn generated_documents_are_bounded() {
        let seed: Vec<u8> = (0..2048u32).map(|n| (n.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        let mut unstructured = Unstructured::new(&seed);
        while let Some(document) = random_document(&mut unstructured) {
            assert!(depth(&document) <= MAX_DEPTH + 1);
            if unstructured.is_empty() {
                break;
            }
        }
    }

    fn depth(value: &JsonValue) -> usize {
        match value {
            JsonValue::Array(items) => 1 + items.iter().map(depth).max().unwrap_or(0),
            JsonValue::Object(map) => 1 + map.values().map(depth).max().unwrap_or(0),
            _ => 1,
        }
    }
}
