use thiserror::Error;

/// Why a record or sub-event was dropped.
///
/// Drops are silent towards the producer; the drain loop only logs and
/// counts them, keyed by [`Rejected::reason`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    #[error("entry is not a JSON object")]
    NotAnObject,

    #[error("required field `{0}` is missing")]
    Missing(&'static str),

    #[error("required field `{0}` is null")]
    Null(&'static str),

    #[error("required field `{0}` is empty")]
    Empty(&'static str),

    #[error("field `{0}` has an unexpected type")]
    WrongType(&'static str),

    #[error("timestamp `{0}` is not an integer")]
    BadTimestamp(String),

    #[error("performance message is not a JSON object")]
    BadMessage,

    #[error("unsupported sub-event kind {0}")]
    UnsupportedKind(i64),

    #[error("unsupported performance category `{0}`")]
    UnsupportedCategory(String),
}

impl Rejected {
    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotAnObject => "not_an_object",
            Self::Missing(_) => "missing_field",
            Self::Null(_) => "null_field",
            Self::Empty(_) => "empty_field",
            Self::WrongType(_) => "wrong_type",
            Self::BadTimestamp(_) => "bad_timestamp",
            Self::BadMessage => "bad_message",
            Self::UnsupportedKind(_) => "unsupported_kind",
            Self::UnsupportedCategory(_) => "unsupported_category",
        }
    }
}
