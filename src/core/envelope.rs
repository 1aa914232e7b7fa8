//! Purpose: Encode results into the `{"Ok"|"Err"}` JSON envelope and decode boundary input.
//! Exports: `Envelope`, `encode`, `decode_input`.
//! Role: The only place boundary text is turned into typed values and back.
//! Invariants: An envelope carries exactly one of `Ok` or `Err`, never both, never neither.
//! Invariants: Decode failures echo the offending raw input verbatim.
//! Invariants: Encode failures degrade to a plain diagnostic string instead of panicking.

use crate::core::error::{Error, ErrorKind};
use crate::json::parse;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Envelope<T> {
    Ok(T),
    Err(String),
}

impl<T> From<Result<T, Error>> for Envelope<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Envelope::Ok(value),
            Err(err) => Envelope::Err(err.to_string()),
        }
    }
}

pub fn encode<T: Serialize>(result: Result<T, Error>) -> String {
    let envelope = Envelope::from(result);
    serde_json::to_string(&envelope)
        .unwrap_or_else(|err| format!("failed to serialize result envelope: {err}"))
}

pub fn decode_input<T: DeserializeOwned>(raw: &str) -> Result<T, Error> {
    parse::from_str(raw).map_err(|err| {
        Error::new(ErrorKind::InvalidInput).with_message(parse::invalid_input_message(&err, raw))
    })
}
