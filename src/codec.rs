//! Conversion between ledger entities and a generic structured format.
//!
//! Every entity is a fixed-shape struct; this is the only place where it is
//! turned into (or rebuilt from) a field mapping. Decoding rejects missing,
//! unknown and mistyped fields with [`Error::Structure`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

pub trait Codec: Serialize + DeserializeOwned {
    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(Error::from)
    }

    fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(Error::from)
    }

    fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::from)
    }

    fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::from)
    }
}
