//! Text properties, string encode/decode on top of 8-bit properties.
//!
//! The charset is picked from the property type as per ICCCM: `STRING` is Latin-1, `UTF8_STRING`
//! is UTF-8, anything else is decoded as ASCII unless an encoding is given explicitly.
use std::fmt;

use tracing::debug;
use x11rb::protocol::xproto::AtomEnum;

use crate::{
    atom::{Atom, AtomSpec},
    property::{Format, Mode, PendingWrite, DEFAULT_SIZE_HINT},
    ErrorWrapper, EwmhError, EwmhResult, Window,
};

/// Property types text can be written as
pub const TEXT_TYPES: [&str; 2] = ["STRING", "UTF8_STRING"];

/// Character encoding of a text property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Latin1,
    Utf8,
    Ascii,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Latin1 => "latin-1",
            Encoding::Utf8 => "utf-8",
            Encoding::Ascii => "ascii",
        }
    }

    /// Decode bytes into a string
    pub fn decode(self, bytes: &[u8], errors: TextErrors) -> EwmhResult<String> {
        match self {
            Encoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf8 => match std::str::from_utf8(bytes) {
                Ok(text) => Ok(text.to_owned()),
                Err(_) if errors == TextErrors::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
                Err(err) => Err(self.decode_error(err.valid_up_to())),
            },
            Encoding::Ascii => bytes
                .iter()
                .enumerate()
                .map(|(i, &b)| match b {
                    0..=0x7f => Ok(b as char),
                    _ if errors == TextErrors::Replace => Ok(char::REPLACEMENT_CHARACTER),
                    _ => Err(self.decode_error(i)),
                })
                .collect(),
        }
    }

    /// Encode a string into bytes
    pub fn encode(self, text: &str, errors: TextErrors) -> EwmhResult<Vec<u8>> {
        let limit = match self {
            Encoding::Utf8 => return Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => 0xff,
            Encoding::Ascii => 0x7f,
        };
        text.chars()
            .enumerate()
            .map(|(position, ch)| match ch as u32 {
                c if c <= limit => Ok(c as u8),
                _ if errors == TextErrors::Replace => Ok(b'?'),
                _ => Err(ErrorWrapper::from(EwmhError::TextEncode { encoding: self.name(), ch, position })),
            })
            .collect()
    }

    fn decode_error(self, position: usize) -> ErrorWrapper {
        EwmhError::TextDecode { encoding: self.name(), position }.into()
    }
}

// Implement format! support
impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What to do with bytes or characters the encoding can't represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextErrors {
    /// Fail with `TextDecode` or `TextEncode`
    #[default]
    Strict,
    /// Substitute U+FFFD when decoding and `?` when encoding
    Replace,
}

/// Split a list of NUL terminated strings, as used by e.g. `_NET_DESKTOP_NAMES`
pub fn split_text_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }
    text.strip_suffix('\0').unwrap_or(text).split('\0').map(str::to_owned).collect()
}

/// Join strings into a list of NUL terminated strings
pub fn join_text_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().fold(String::new(), |mut text, item| {
        text.push_str(item.as_ref());
        text.push('\0');
        text
    })
}

impl Window {
    /// Encoding that goes with a text property type, `None` if the type is not a text type
    pub fn encoding_for(&self, type_: &Atom) -> EwmhResult<Option<Encoding>> {
        if type_.has_id(AtomEnum::STRING.into()) {
            return Ok(Some(Encoding::Latin1));
        }
        match self.atom("UTF8_STRING", false) {
            Ok(utf8) if utf8 == *type_ => Ok(Some(Encoding::Utf8)),
            Ok(_) => Ok(None),
            Err(err) if matches!(err.ewmh(), Some(EwmhError::UnknownAtom(_))) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Read a text property.
    ///
    /// A property that does not exist reads as the empty string, same as an empty one; use
    /// [`Window::has_property`] to tell them apart.
    ///
    /// ### Arguments
    /// * `name` - property name or atom
    /// * `expected_type` - type the property must have, [`ANY_PROPERTY_TYPE`](crate::ANY_PROPERTY_TYPE) to accept any
    /// * `encoding` - overrides the encoding derived from the property type
    /// * `errors` - how to handle undecodable bytes
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(None, None).unwrap();
    /// let win = ewmh.active_window().unwrap();
    /// let title = win.get_text("_NET_WM_NAME", "UTF8_STRING", None, TextErrors::Strict).unwrap();
    /// ```
    pub fn get_text<'a, 'b>(
        &self, name: impl Into<AtomSpec<'a>>, expected_type: impl Into<AtomSpec<'b>>, encoding: Option<Encoding>,
        errors: TextErrors,
    ) -> EwmhResult<String> {
        let prop = self.get_property(name, expected_type, DEFAULT_SIZE_HINT)?;
        if prop.value().is_empty() {
            return Ok(String::new());
        }
        let Some(bytes) = prop.as_bytes() else {
            return Err(EwmhError::NotATextProperty(Box::new(prop.clone())).into());
        };

        let encoding = match encoding {
            Some(encoding) => encoding,
            None => match prop.type_() {
                Some(type_) => self.encoding_for(type_)?.unwrap_or(Encoding::Ascii),
                None => Encoding::Ascii,
            },
        };
        let text = encoding.decode(bytes, errors)?;
        debug!("get_text: {} on {} as {}: {:?}", prop.name(), self, encoding, text);
        Ok(text)
    }

    /// Write a text property.
    ///
    /// ### Arguments
    /// * `name` - property name or atom, created if it doesn't exist yet
    /// * `text` - text to write
    /// * `property_type` - `STRING` or `UTF8_STRING`
    /// * `encoding` - overrides the encoding derived from the property type
    /// * `errors` - how to handle unencodable characters
    /// * `mode` - replace, prepend or append
    /// * `immediate` - wait for the server to process the request, otherwise the returned
    ///   [`PendingWrite`] reports a rejection
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(None, None).unwrap();
    /// let win = ewmh.active_window().unwrap();
    /// win.set_text("_NET_WM_NAME", "hello", "UTF8_STRING", None, TextErrors::Strict, Mode::Replace, true).unwrap();
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn set_text<'a, 'b>(
        &self, name: impl Into<AtomSpec<'a>>, text: &str, property_type: impl Into<AtomSpec<'b>>,
        encoding: Option<Encoding>, errors: TextErrors, mode: Mode, immediate: bool,
    ) -> EwmhResult<PendingWrite> {
        let type_ = self.atom(property_type, false)?;
        let mapped = match self.encoding_for(&type_)? {
            Some(mapped) => mapped,
            None => {
                return Err(EwmhError::UnsupportedTextType {
                    type_name: type_.name().map(str::to_owned).unwrap_or_else(|_| type_.to_string()),
                    supported: TEXT_TYPES.to_vec(),
                }
                .into())
            },
        };

        let data = encoding.unwrap_or(mapped).encode(text, errors)?;
        self.set_property(name, data, type_, Format::Char, mode, immediate)
    }
}
