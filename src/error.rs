use {crate::tlv::TagId, thiserror::Error};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The tag stream can not be parsed. A single misread shifts every
    /// following tag, so no partial result is ever returned.
    #[error("malformed payload at offset {offset}: {reason}")]
    Malformed { offset: usize, reason: &'static str },

    /// Only raised under [`Leniency::Strict`](crate::Leniency::Strict).
    #[error("field {field} is {actual} characters long, maximum is {max}")]
    FieldOverflow {
        field:  &'static str,
        max:    usize,
        actual: usize,
    },

    #[error("value of tag {id} is {len} bytes long, maximum is 99")]
    ValueTooLong { id: TagId, len: usize },

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Only raised under [`Leniency::Strict`](crate::Leniency::Strict).
    #[error("PIX key {0:?} is not ASCII")]
    NonAsciiKey(String),

    #[error("invalid merchant category code {0:?}, expected four digits")]
    InvalidCategoryCode(String),

    #[error("invalid checksum literal {0:?}, expected four hex digits")]
    InvalidChecksum(String),
}

/// Missing merchant settings, detected before any encoding is attempted.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("PIX key is not configured")]
    MissingPixKey,

    #[error("merchant name is not configured")]
    MissingMerchantName,

    #[error("merchant city is not configured")]
    MissingMerchantCity,
}

impl Error {
    pub(crate) const fn malformed(offset: usize, reason: &'static str) -> Self {
        Self::Malformed { offset, reason }
    }

    /// Rebases a malformed-payload offset onto an enclosing buffer.
    pub(crate) fn shifted(self, by: usize) -> Self {
        match self {
            Self::Malformed { offset, reason } => Self::malformed(offset + by, reason),
            other => other,
        }
    }
}
