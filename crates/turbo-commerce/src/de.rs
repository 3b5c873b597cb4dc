//! Deserializers for backend numbers that sometimes arrive as strings.
//!
//! Decimal columns come back as `"12000.00"` and ids occasionally as `"7"`.
//! Both shapes decode to the same value; anything else is an error.

use serde::{Deserialize, Deserializer};
use serde_json::Number;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(Number),
    Text(String),
}

impl NumberOrString {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Number(n) => n
                .as_u64()
                .ok_or_else(|| E::custom(format!("expected an unsigned integer, got {n}"))),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected an unsigned integer, got {s:?}"))),
        }
    }

    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            Self::Number(n) => n
                .as_f64()
                .ok_or_else(|| E::custom(format!("number out of range: {n}"))),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("expected a number, got {s:?}"))),
        }
    }
}

pub(crate) fn u64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_u64()
}

/// Null and missing decode as 0.
pub(crate) fn f64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(raw) => raw.into_f64(),
        None => Ok(0.0),
    }
}

pub(crate) fn opt_f64_lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_f64)
        .transpose()
}

pub(crate) fn opt_u64_lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u64>, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_u64)
        .transpose()
}
