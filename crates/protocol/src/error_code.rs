use std::fmt;

use serde::{Deserialize, Serialize};

/// Error code carried in a gateway reply.
///
/// Gateways in the wild send either a number (`410100`) or a dotted name
/// (`"Error.RedisDynamicPassword"`). Both decode here; comparison is exact,
/// so `Numeric(410100)` never equals `Symbolic("410100")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i64),
    Symbolic(String),
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{n}"),
            Self::Symbolic(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        Self::Numeric(code)
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        Self::Symbolic(code.to_string())
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        Self::Symbolic(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_both_representations() {
        let n: ErrorCode = serde_json::from_str("410100").unwrap();
        assert_eq!(n, ErrorCode::Numeric(410_100));

        let s: ErrorCode = serde_json::from_str(r#""Error.RedisDynamicPassword""#).unwrap();
        assert_eq!(s, ErrorCode::Symbolic("Error.RedisDynamicPassword".into()));
    }

    #[test]
    fn representations_never_cross_match() {
        assert_ne!(ErrorCode::from(410_100), ErrorCode::from("410100"));
    }

    #[test]
    fn display_is_bare() {
        assert_eq!(ErrorCode::from(7).to_string(), "7");
        assert_eq!(ErrorCode::from("Error.X").to_string(), "Error.X");
    }
}
