use std::error::Error as StdError;

use thiserror::Error;

use crate::{property::Format, transport::ChangePropertyRequest, Property};

/// `EwmhResult<T>` provides a simplified result type with a common error type
pub type EwmhResult<T> = std::result::Result<T, ErrorWrapper>;

/// EwmhError defines all the protocol contract violations that `ewmh-client` might return
#[derive(Debug, Error)]
pub enum EwmhError {
    #[error("atom does not exist: {0}")]
    UnknownAtom(String),

    #[error("property type mismatch, expected {expected} and got {actual}: {property:?}")]
    TypeMismatch { expected: String, actual: String, property: Box<Property> },

    #[error("incomplete property, {bytes_after} bytes left: {property:?}")]
    IncompletePropertyRead { bytes_after: u32, property: Box<Property> },

    #[error("format mismatch for {got} data: expected {expected}")]
    FormatMismatch { expected: Format, got: Format },

    #[error("invalid property format {0}, must be one of 8, 16 or 32")]
    InvalidFormat(u8),

    #[error("not a text property: {0:?}")]
    NotATextProperty(Box<Property>),

    #[error("{type_name} is not a text property type, must be one of {supported:?}")]
    UnsupportedTextType { type_name: String, supported: Vec<&'static str> },

    #[error("text is not valid {encoding} at byte {position}")]
    TextDecode { encoding: &'static str, position: usize },

    #[error("character {ch:?} at {position} can't be encoded as {encoding}")]
    TextEncode { encoding: &'static str, ch: char, position: usize },

    #[error("client message data must have at most 5 items, got {0}")]
    TooManyArguments(usize),

    #[error("server rejected {request:?}: {reason}")]
    PropertyWriteError { request: ChangePropertyRequest, reason: String },

    #[error("property {0} was not found")]
    PropertyNotFound(String),

    #[error("invalid desktop layout: {0}")]
    InvalidLayout(String),

    #[error("screen {0} does not exist")]
    ScreenNotFound(usize),
}

/// ErrorWrapper provides wrapper around all the underlying library dependencys that `ewmh-client` uses
/// such that we can easily surface all errors from `ewmh-client` in a single easy way.
#[derive(Debug, Error)]
pub enum ErrorWrapper {
    #[error(transparent)]
    Ewmh(#[from] EwmhError),

    // x11rb errors
    #[error(transparent)]
    Connect(#[from] x11rb::errors::ConnectError),
    #[error(transparent)]
    Connection(#[from] x11rb::errors::ConnectionError),
    #[error(transparent)]
    Reply(#[from] x11rb::errors::ReplyError),
}

impl ErrorWrapper {
    /// Implemented directly on the `Error` type to reduce casting required
    pub fn is<T: StdError + 'static>(&self) -> bool {
        self.as_ref().is::<T>()
    }

    /// Implemented directly on the `Error` type to reduce casting required
    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.as_ref().downcast_ref::<T>()
    }

    /// The domain error, if this is one
    pub fn ewmh(&self) -> Option<&EwmhError> {
        match self {
            ErrorWrapper::Ewmh(err) => Some(err),
            _ => None,
        }
    }
}

impl AsRef<dyn StdError> for ErrorWrapper {
    fn as_ref(&self) -> &(dyn StdError + 'static) {
        match *self {
            ErrorWrapper::Ewmh(ref err) => err,
            ErrorWrapper::Connect(ref err) => err,
            ErrorWrapper::Connection(ref err) => err,
            ErrorWrapper::Reply(ref err) => err,
        }
    }
}
