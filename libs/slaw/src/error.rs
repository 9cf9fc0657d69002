/// Error type for all fallible value-model operations.
///
/// Every variant maps to a distinct failure class so callers can branch
/// on kind instead of parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlawError {
    /// The supplied type tag is not a known tag symbol, or its shape does
    /// not fit the value being constructed.
    #[error("invalid type tag: {0}")]
    InvalidTypeTag(String),

    /// The native value has no slaw representation.
    #[error("don't know how to treat {0} as slaw")]
    UnrepresentableValue(String),

    /// The operation is not defined for this slaw variant (e.g. `car` on a
    /// non-cons), or its argument is of the wrong variant.
    #[error("{0}")]
    InvalidOperand(String),

    /// Decoding of serialized input failed.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    /// A fixed-arity constructor received the wrong number of elements.
    #[error("{op} requires {expected} elements, got {actual}")]
    ArgumentCountMismatch {
        op: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// Strict map construction saw the same key twice.
    #[error("duplicate map key: {0}")]
    DuplicateMapKey(String),
}

impl SlawError {
    /// "{op} can only be called on a {expected} slaw" — the standard
    /// wrong-variant message.
    pub(crate) fn wrong_type(op: &str, expected: &str) -> Self {
        SlawError::InvalidOperand(format!("{op} can only be called on a {expected} slaw"))
    }

    pub(crate) fn out_of_range(op: &str, index: i64, len: usize) -> Self {
        SlawError::InvalidOperand(format!(
            "{op}: index {index} out of range for {len}-element slaw"
        ))
    }
}
