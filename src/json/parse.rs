//! Purpose: Provide the internal JSON decode entrypoint for boundary text.
//! Exports: `from_str`, `invalid_input_message`.
//! Role: Parser seam so callsites avoid ad hoc `serde_json` decode logic.
//! Invariants: Decoding never panics; errors carry line/column from `serde_json`.
//! Invariants: Diagnostics echo the raw input verbatim, never escaped or shortened.
//! Notes: Error mapping is done by callsites so domain context stays explicit.

use serde::de::DeserializeOwned;

pub(crate) fn from_str<T: DeserializeOwned>(input: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(input)
}

/// Parse failure followed by the offending input exactly as received.
pub(crate) fn invalid_input_message(err: &serde_json::Error, input: &str) -> String {
    format!("invalid input: {err}\nInput:\n{input}")
}

#[cfg(test)]
mod tests {
    use super::{from_str, invalid_input_message};
    use serde_json::Value;

    #[test]
    fn from_str_reports_position() {
        let err = from_str::<Value>(r#"{"a":}"#).unwrap_err();
        assert!(err.to_string().contains("column"));
    }

    #[test]
    fn message_keeps_quotes_unescaped() {
        let raw = r#"[{"Name":"ct0""#;
        let err = from_str::<Value>(raw).unwrap_err();
        let message = invalid_input_message(&err, raw);
        assert!(message.starts_with("invalid input: EOF"), "{message}");
        assert!(message.ends_with(raw), "{message}");
    }

    #[test]
    fn message_keeps_long_input_whole() {
        let raw = format!("[{}", r#"{"Name":"auth_token","Value":"abc"},"#.repeat(40));
        let err = from_str::<Value>(&raw).unwrap_err();
        let message = invalid_input_message(&err, &raw);
        assert!(message.contains(&raw));
    }
}
