//! Deterministic pseudo-random values keyed by a seed, so every render of a
//! frame draws the same numbers.

use serde::{Deserialize, Serialize};

/// Numeric seeds feed the generator directly; string seeds are hashed first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(f64),
    Text(String),
}

impl From<f64> for Seed {
    fn from(value: f64) -> Self {
        Seed::Number(value)
    }
}

impl From<i32> for Seed {
    fn from(value: i32) -> Self {
        Seed::Number(f64::from(value))
    }
}

impl From<u32> for Seed {
    fn from(value: u32) -> Self {
        Seed::Number(f64::from(value))
    }
}

impl From<&str> for Seed {
    fn from(value: &str) -> Self {
        Seed::Text(value.to_string())
    }
}

impl From<String> for Seed {
    fn from(value: String) -> Self {
        Seed::Text(value)
    }
}

/// djb2 variant over UTF-16 code units, last to first.
fn hash_text(text: &str) -> u32 {
    let mut hash: i32 = 5381;
    for unit in text.encode_utf16().collect::<Vec<u16>>().into_iter().rev() {
        hash = hash.wrapping_mul(33) ^ i32::from(unit);
    }
    hash as u32
}

/// ToUint32: truncate toward zero and wrap modulo 2^32; non-finite maps to 0.
fn to_u32(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.trunc().rem_euclid(4_294_967_296.0) as u32
}

fn mulberry32(seed: f64) -> f64 {
    let mut t = to_u32(seed + 1_831_565_813.0);
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    f64::from(t ^ (t >> 14)) / 4_294_967_296.0
}

/// Value in `[0, 1)` fully determined by `seed`.
pub fn random(seed: impl Into<Seed>) -> f64 {
    match seed.into() {
        Seed::Number(n) => mulberry32(n),
        Seed::Text(s) => mulberry32(f64::from(hash_text(&s))),
    }
}
