//! JSON test vector loader shared by the parser tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    pub output: RawData,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub kind: String,
}

/// Tool output as stored in a vector file.
///
/// `text` carries the exact bytes as a string, `json` carries a value that is
/// serialized before decoding.
#[derive(Debug, Deserialize)]
pub struct RawData {
    pub encoding: String,
    pub data: serde_json::Value,
}

impl RawData {
    pub fn bytes(&self) -> Vec<u8> {
        match self.encoding.as_str() {
            "text" => self
                .data
                .as_str()
                .expect("text vectors must carry a string")
                .as_bytes()
                .to_vec(),
            "json" => serde_json::to_vec(&self.data).expect("json vector"),
            other => panic!("unsupported encoding: {other}"),
        }
    }
}

pub fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
