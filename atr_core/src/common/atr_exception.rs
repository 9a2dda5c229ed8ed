use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Error codes for the Auto ATR core.
///
/// The taxonomy is deliberately small: the only fallible operations are
/// window construction and direct positional access. Everything numeric
/// is accepted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum ErrCode {
    #[strum(serialize = "INVALID_CONFIGURATION")]
    InvalidConfiguration = 1,
    #[strum(serialize = "INDEX_OUT_OF_RANGE")]
    IndexOutOfRange = 2,
}

#[derive(Debug, Error)]
#[error("{errcode}: {msg}")]
pub struct AtrException {
    pub errcode: ErrCode,
    pub msg: String,
}

impl AtrException {
    pub fn new(message: impl Into<String>, code: ErrCode) -> Self {
        Self {
            errcode: code,
            msg: message.into(),
        }
    }

    pub fn is_config_err(&self) -> bool {
        self.errcode == ErrCode::InvalidConfiguration
    }
}
