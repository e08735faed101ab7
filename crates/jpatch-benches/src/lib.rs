//! Deterministic corpora for the Criterion benchmarks.
//!
//! Every corpus is a `(source, target)` pair generated from a fixed seed so
//! that runs are comparable across machines and commits.
//!
//! # Examples
//!
//! ```
//! let corpora = jpatch_benches::available_corpora();
//! assert!(corpora.iter().any(|corpus| corpus.name() == "records"));
//! let patch = corpora[0].diff();
//! assert!(!patch.is_empty());
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

use jpatch_core::{diff_with_flags, DiffFlags, PatchDocument};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde_json::{json, Map, Value};

/// A named pair of documents to diff.
#[derive(Clone, Debug)]
pub struct Corpus {
    name: &'static str,
    source: Value,
    target: Value,
}

impl Corpus {
    /// Short identifier used as the benchmark parameter.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The document the patch starts from.
    #[must_use]
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// The document the patch should produce.
    #[must_use]
    pub fn target(&self) -> &Value {
        &self.target
    }

    /// Combined size of both documents serialized as compact JSON.
    #[must_use]
    pub fn fixture_bytes(&self) -> usize {
        self.source.to_string().len() + self.target.to_string().len()
    }

    /// Diffs the corpus with the default flags.
    #[must_use]
    pub fn diff(&self) -> PatchDocument {
        self.diff_with_flags(&DiffFlags::defaults())
    }

    /// Diffs the corpus with `flags`.
    #[must_use]
    pub fn diff_with_flags(&self, flags: &DiffFlags) -> PatchDocument {
        diff_with_flags(&self.source, &self.target, flags)
    }
}

/// Returns every benchmark corpus.
#[must_use]
pub fn available_corpora() -> Vec<Corpus> {
    vec![config(), shuffled_list(), records()]
}

fn config() -> Corpus {
    let mut source = Map::new();
    let mut target = Map::new();
    for section in 0..40 {
        let body = json!({
            "enabled": section % 3 == 0,
            "retries": section,
            "endpoints": [format!("https://s{section}.example"), format!("https://b{section}.example")],
        });
        source.insert(format!("section{section}"), body.clone());
        let key = if section % 7 == 0 { format!("renamed{section}") } else { format!("section{section}") };
        let mut body = body;
        if section % 5 == 0 {
            body["retries"] = json!(section * 2);
        }
        target.insert(key, body);
    }
    Corpus { name: "config", source: Value::Object(source), target: Value::Object(target) }
}

fn shuffled_list() -> Corpus {
    let mut rng = Xoshiro256StarStar::seed_from_u64(0x5eed);
    let source: Vec<Value> = (0..300).map(|n| json!(n)).collect();
    let mut target = source.clone();
    for _ in 0..30 {
        let from = rng.gen_range(0..300);
        let to = rng.gen_range(0..299);
        let item = target.remove(from);
        target.insert(to, item);
    }
    target.retain(|value| value.as_u64().is_none_or(|n| n % 37 != 0));
    Corpus { name: "shuffled-list", source: Value::Array(source), target: Value::Array(target) }
}

fn records() -> Corpus {
    let mut rng = Xoshiro256StarStar::seed_from_u64(42);
    let source: Vec<Value> = (0..120)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("user{id}"),
                "tags": (0..rng.gen_range(0..4)).map(|t| format!("t{t}")).collect::<Vec<_>>(),
                "address": {"city": format!("city{}", rng.gen_range(0..10)), "zip": rng.gen_range(0..100_000)},
            })
        })
        .collect();
    let mut target = source.clone();
    for (index, record) in target.iter_mut().enumerate() {
        if index % 4 == 0 {
            record["address"]["city"] = json!("relocated");
        }
        if index % 9 == 0 {
            if let Some(tags) = record["tags"].as_array_mut() {
                tags.push(json!("vip"));
            }
        }
    }
    target.rotate_left(5);
    target.truncate(110);
    Corpus { name: "records", source: Value::Array(source), target: Value::Array(target) }
}
