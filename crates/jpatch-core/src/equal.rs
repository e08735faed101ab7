//! Structural equality and hashing for [`serde_json::Value`].
//!
//! `serde_json`'s own `PartialEq` distinguishes `1` from `1.0`, which is not
//! what a diff engine wants. [`values_equal`] compares numbers by numeric
//! value, objects without regard to key order, and arrays element by element.
//! [`value_hash`] is consistent with it and is used as a cheap prefilter
//! before the full comparison.

use serde_json::{Map, Number, Value};

/// 64-bit structural hash produced by [`value_hash`].
pub type HashCode = u64;

const NULL_TAG: u8 = 0x00;
const FALSE_TAG: u8 = 0x01;
const TRUE_TAG: u8 = 0x02;
const NUMBER_TAG: u8 = 0x03;
const STRING_TAG: u8 = 0x04;
const ARRAY_TAG: u8 = 0x05;
const OBJECT_TAG: u8 = 0x06;

/// Deep structural equality.
///
/// ```
/// # use jpatch_core::values_equal;
/// use serde_json::json;
/// assert!(values_equal(&json!(1), &json!(1.0)));
/// assert!(values_equal(&json!({"a": 1, "b": 2}), &json!({"b": 2, "a": 1})));
/// assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
/// ```
#[must_use]
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => objects_equal(a, b),
        _ => false,
    }
}

fn objects_equal(lhs: &Map<String, Value>, rhs: &Map<String, Value>) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }
    for (key, value_a) in lhs {
        let Some(value_b) = rhs.get(key) else {
            return false;
        };
        if !values_equal(value_a, value_b) {
            return false;
        }
    }
    true
}

/// Compares two JSON numbers by value.
///
/// Integers are compared exactly when both sides fit the same integer type;
/// anything else falls back to IEEE-754 comparison.
#[must_use]
pub fn numbers_equal(lhs: &Number, rhs: &Number) -> bool {
    if let (Some(a), Some(b)) = (lhs.as_i64(), rhs.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (lhs.as_u64(), rhs.as_u64()) {
        return a == b;
    }
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Computes a structural hash consistent with [`values_equal`].
///
/// ```
/// # use jpatch_core::value_hash;
/// use serde_json::json;
/// assert_eq!(value_hash(&json!({"a": 1, "b": 2.0})), value_hash(&json!({"b": 2, "a": 1})));
/// ```
#[must_use]
pub fn value_hash(value: &Value) -> HashCode {
    let mut hasher = Fnv::new();
    hasher.value(value);
    hasher.finish()
}

/// FNV-1a over a tagged byte stream.
struct Fnv(u64);

impl Fnv {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn bytes(&mut self, input: &[u8]) {
        for byte in input {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    fn value(&mut self, value: &Value) {
        match value {
            Value::Null => self.bytes(&[NULL_TAG]),
            Value::Bool(false) => self.bytes(&[FALSE_TAG]),
            Value::Bool(true) => self.bytes(&[TRUE_TAG]),
            Value::Number(number) => {
                self.bytes(&[NUMBER_TAG]);
                // -0.0 and 0.0 compare equal, so they must hash equal too.
                let float = number.as_f64().unwrap_or_default();
                let float = if float == 0.0 { 0.0 } else { float };
                self.bytes(&float.to_bits().to_le_bytes());
            }
            Value::String(s) => {
                self.bytes(&[STRING_TAG]);
                self.bytes(&(s.len() as u64).to_le_bytes());
                self.bytes(s.as_bytes());
            }
            Value::Array(items) => {
                self.bytes(&[ARRAY_TAG]);
                self.bytes(&(items.len() as u64).to_le_bytes());
                for item in items {
                    self.bytes(&value_hash(item).to_le_bytes());
                }
            }
            Value::Object(map) => {
                let mut entries: Vec<HashCode> = map
                    .iter()
                    .map(|(key, value)| {
                        let mut entry = Fnv::new();
                        entry.bytes(&(key.len() as u64).to_le_bytes());
                        entry.bytes(key.as_bytes());
                        entry.value(value);
                        entry.finish()
                    })
                    .collect();
                entries.sort_unstable();
                self.bytes(&[OBJECT_TAG]);
                self.bytes(&(entries.len() as u64).to_le_bytes());
                for entry in entries {
                    self.bytes(&entry.to_le_bytes());
                }
            }
        }
    }

    fn finish(&self) -> HashCode {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::{
        collection::{btree_map, vec},
        prelude::*,
        string::string_regex,
    };
    use serde_json::json;

    fn arb_json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            (-1000i32..1000).prop_map(|n| json!(f64::from(n) / 4.0)),
            string_regex("[a-z0-9]{0,6}").unwrap().prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 16, 4, move |inner| {
            prop_oneof![
                vec(inner.clone(), 0..4).prop_map(Value::Array),
                btree_map(string_regex("[a-z]{1,4}").unwrap(), inner, 0..4)
                    .prop_map(|map| Value::Object(map.into_iter().collect())),
            ]
        })
    }

    fn reversed_keys(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter().rev().map(|(k, v)| (k.clone(), reversed_keys(v))).collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(reversed_keys).collect()),
            other => other.clone(),
        }
    }

    #[test]
    fn integers_and_floats_compare_numerically() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!(-0.0), &json!(0)));
        assert!(!values_equal(&json!(1), &json!(1.5)));
        assert!(!values_equal(&json!(-1), &json!(u64::MAX)));
        assert!(values_equal(&json!(u64::MAX), &json!(u64::MAX)));
    }

    #[test]
    fn large_integers_compare_exactly() {
        let a = json!(9_007_199_254_740_993_i64);
        let b = json!(9_007_199_254_740_992_i64);
        assert!(!values_equal(&a, &b));
    }

    #[test]
    fn object_key_order_is_insignificant() {
        let lhs: Value = serde_json::from_str(r#"{"a":1,"b":[1,{"c":2,"d":3}]}"#).unwrap();
        let rhs: Value = serde_json::from_str(r#"{"b":[1,{"d":3,"c":2}],"a":1}"#).unwrap();
        assert!(values_equal(&lhs, &rhs));
        assert_eq!(value_hash(&lhs), value_hash(&rhs));
    }

    #[test]
    fn mismatched_kinds_are_unequal() {
        assert!(!values_equal(&json!(null), &json!(false)));
        assert!(!values_equal(&json!("1"), &json!(1)));
        assert!(!values_equal(&json!([]), &json!({})));
        assert!(!values_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
    }

    proptest! {
        #[test]
        fn equality_is_reflexive_and_hash_consistent(value in arb_json_value()) {
            let shuffled = reversed_keys(&value);
            prop_assert!(values_equal(&value, &value));
            prop_assert!(values_equal(&value, &shuffled));
            prop_assert_eq!(value_hash(&value), value_hash(&shuffled));
        }

        #[test]
        fn equal_values_hash_equal(lhs in arb_json_value(), rhs in arb_json_value()) {
            if values_equal(&lhs, &rhs) {
                prop_assert_eq!(value_hash(&lhs), value_hash(&rhs));
            }
        }
    }
}
