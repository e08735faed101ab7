use std::fs;
use std::path::Path;

use jpatch_core::{apply, diff_with_flags, values_equal, DiffFlag, DiffFlags, OpKind};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Sample {
    first: Value,
    second: Value,
}

fn load_samples() -> Vec<Sample> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample.json");
    let data = fs::read_to_string(&path).expect("fixture should be readable");
    serde_json::from_str(&data).expect("fixture should deserialize")
}

fn all_flag_sets() -> Vec<DiffFlags> {
    let flags = [
        DiffFlag::OmitValueOnRemove,
        DiffFlag::OmitMoveOperation,
        DiffFlag::OmitCopyOperation,
        DiffFlag::AddOriginalValueOnReplace,
        DiffFlag::AddExplicitRemoveAddOnReplace,
        DiffFlag::EmitTestOperations,
    ];
    (0..1u32 << flags.len())
        .map(|mask| {
            flags
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, flag)| *flag)
                .collect()
        })
        .collect()
}

#[test]
fn sample_documents_round_trip_under_every_flag_set() {
    let samples = load_samples();
    assert!(!samples.is_empty(), "expected samples in tests/fixtures/sample.json");

    for flags in all_flag_sets() {
        for (index, sample) in samples.iter().enumerate() {
            let patch = diff_with_flags(&sample.first, &sample.second, &flags);
            let patched = apply(&patch, &sample.first)
                .unwrap_or_else(|err| panic!("sample {index} with {flags:?}: {err}"));
            assert!(
                values_equal(&patched, &sample.second),
                "sample {index} with {flags:?} produced {patched} via {patch:?}",
            );

            let reverse = diff_with_flags(&sample.second, &sample.first, &flags);
            let restored = apply(&reverse, &sample.second)
                .unwrap_or_else(|err| panic!("reverse sample {index} with {flags:?}: {err}"));
            assert!(values_equal(&restored, &sample.first), "reverse sample {index} with {flags:?}");
        }
    }
}

#[test]
fn normalization_shrinks_sample_patches() {
    let plain = DiffFlags::dont_normalize_op_into_move_and_copy();
    let normalized = DiffFlags::defaults();
    let mut rewrites = 0;
    for sample in load_samples() {
        let long = diff_with_flags(&sample.first, &sample.second, &plain);
        let short = diff_with_flags(&sample.first, &sample.second, &normalized);
        assert!(short.len() <= long.len());
        assert!(long.iter().all(|op| !matches!(op.op, OpKind::Move | OpKind::Copy)));
        rewrites += short.iter().filter(|op| matches!(op.op, OpKind::Move | OpKind::Copy)).count();
    }
    assert!(rewrites > 0, "expected the samples to exercise move and copy");
}
