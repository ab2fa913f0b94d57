use std::error::Error as StdError;
use std::fmt;

/// Errors produced while parsing, querying, or serializing ICC profiles.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorError {
    /// The ICC byte stream is truncated, malformed, or has an unrecoverable
    /// structure (bad header, tag table out of bounds, bad signature).
    ProfileParse(String),
    /// The profile is well-formed but lacks data required to answer a
    /// query (e.g. no media white point, or an out-of-range A2B0 matrix
    /// offset).
    ProfileQuery(String),
    /// A primaries triple failed the "not collinear" invariant, so no
    /// RGB→XYZ matrix can be derived from it.
    DegeneratePrimaries,
}

/// This is a regular `Result` type with `colorcore`-specific `Error`.
pub type ColorResult<T> = Result<T, ColorError>;

impl fmt::Display for ColorError {
    #[cold]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorError::ProfileParse(msg) => write!(f, "malformed ICC profile: {msg}"),
            ColorError::ProfileQuery(msg) => write!(f, "profile does not expose required data: {msg}"),
            ColorError::DegeneratePrimaries => f.write_str("primaries are collinear or out of range; no invertible RGB\u{2192}XYZ matrix exists"),
        }
    }
}

impl StdError for ColorError {}
