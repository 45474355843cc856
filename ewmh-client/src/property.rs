//! Reading and writing raw window properties.
//!
//! [`Window::get_property`] performs the GetProperty round trip and validates the reply against
//! the requested type, [`Window::set_property`] validates the payload locally before issuing the
//! ChangeProperty request.
use std::{fmt, sync::Arc};

use tracing::{debug, trace};

use crate::{
    atom::{Atom, AtomSpec},
    transport::{ChangePropertyRequest, GetPropertyRequest, PropertyReply},
    Connection, EwmhError, EwmhResult, Window,
};

/// `AnyPropertyType`, accept whatever type the property has
pub const ANY_PROPERTY_TYPE: u32 = 0;

/// Default amount of bytes fetched by the first GetProperty request
pub const DEFAULT_SIZE_HINT: u32 = 256;

/// Item bit size of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Char = 8,
    Short = 16,
    Int = 32,
}

impl Format {
    /// Format for the raw format byte of a reply
    pub fn from_bits(bits: u8) -> EwmhResult<Format> {
        match bits {
            8 => Ok(Format::Char),
            16 => Ok(Format::Short),
            32 => Ok(Format::Int),
            _ => Err(EwmhError::InvalidFormat(bits).into()),
        }
    }

    /// Bit size of one item
    pub fn bits(self) -> u8 {
        self as u8
    }
}

// Implement format! support
impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// How ChangeProperty combines the new data with the existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    Replace,
    Prepend,
    Append,
}

/// Payload of a property, tagged with its item size
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Bytes(Vec<u8>),
    Words16(Vec<u16>),
    Words32(Vec<u32>),
}

impl PropertyValue {
    /// Decode a raw reply payload which is in the connection's native byte order
    pub fn from_raw(format: Format, raw: &[u8]) -> PropertyValue {
        match format {
            Format::Char => PropertyValue::Bytes(raw.to_vec()),
            Format::Short => {
                PropertyValue::Words16(raw.chunks_exact(2).map(|c| u16::from_ne_bytes([c[0], c[1]])).collect())
            },
            Format::Int => PropertyValue::Words32(
                raw.chunks_exact(4).map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]])).collect(),
            ),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            PropertyValue::Bytes(_) => Format::Char,
            PropertyValue::Words16(_) => Format::Short,
            PropertyValue::Words32(_) => Format::Int,
        }
    }

    /// Number of items
    pub fn len(&self) -> usize {
        match self {
            PropertyValue::Bytes(v) => v.len(),
            PropertyValue::Words16(v) => v.len(),
            PropertyValue::Words32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(val: Vec<u8>) -> Self {
        PropertyValue::Bytes(val)
    }
}

impl From<&[u8]> for PropertyValue {
    fn from(val: &[u8]) -> Self {
        PropertyValue::Bytes(val.to_vec())
    }
}

impl From<Vec<u16>> for PropertyValue {
    fn from(val: Vec<u16>) -> Self {
        PropertyValue::Words16(val)
    }
}

impl From<Vec<u32>> for PropertyValue {
    fn from(val: Vec<u32>) -> Self {
        PropertyValue::Words32(val)
    }
}

impl From<&[u32]> for PropertyValue {
    fn from(val: &[u32]) -> Self {
        PropertyValue::Words32(val.to_vec())
    }
}

/// Snapshot of one property read. Never cached, every read builds a new one.
///
/// A property that does not exist on the window is not an error: it has no type, format 0 and an
/// empty payload. Use [`Property::require`] when absence is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    window: Window,
    type_: Option<Atom>,
    value: PropertyValue,
}

impl Property {
    fn missing(name: String, window: Window) -> Self {
        Self { name, window, type_: None, value: PropertyValue::Bytes(vec![]) }
    }

    /// Name the property was requested by
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Window the property was read from
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Type of the property, `None` when the property does not exist
    pub fn type_(&self) -> Option<&Atom> {
        self.type_.as_ref()
    }

    /// Item bit size, 0 when the property does not exist
    pub fn format(&self) -> u8 {
        match self.type_ {
            Some(_) => self.value.format().bits(),
            None => 0,
        }
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn into_value(self) -> PropertyValue {
        self.value
    }

    pub fn is_missing(&self) -> bool {
        self.type_.is_none()
    }

    /// Fail with `PropertyNotFound` if the property does not exist
    pub fn require(&self) -> EwmhResult<&Self> {
        match self.type_ {
            Some(_) => Ok(self),
            None => Err(EwmhError::PropertyNotFound(format!("{} on {}", self.name, self.window)).into()),
        }
    }

    /// Payload as bytes, if the format is 8
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            PropertyValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Payload as 16-bit items, if the format is 16
    pub fn as_words16(&self) -> Option<&[u16]> {
        match &self.value {
            PropertyValue::Words16(v) => Some(v),
            _ => None,
        }
    }

    /// Payload as 32-bit items, if the format is 32
    pub fn as_words32(&self) -> Option<&[u32]> {
        match &self.value {
            PropertyValue::Words32(v) => Some(v),
            _ => None,
        }
    }
}

/// A property write the server may still reject.
///
/// Writes made with `immediate` set are already verified and [`PendingWrite::check`] is a no-op
/// for them. A deferred write is verified by `check`. Dropping it unchecked hands a rejection
/// over to the connection's event queue.
pub struct PendingWrite {
    conn: Arc<Connection>,
    sequence: Option<u64>,
    request: ChangePropertyRequest,
}

impl PendingWrite {
    /// The ChangeProperty request as sent to the server
    pub fn request(&self) -> &ChangePropertyRequest {
        &self.request
    }

    /// Whether the server's verdict is already known
    pub fn is_settled(&self) -> bool {
        self.sequence.is_none()
    }

    /// Wait for the server, a rejection becomes [`EwmhError::PropertyWriteError`]
    pub fn check(mut self) -> EwmhResult<()> {
        match self.sequence.take() {
            Some(sequence) => self.conn.transport().check_write(sequence, &self.request),
            None => Ok(()),
        }
    }
}

impl Drop for PendingWrite {
    fn drop(&mut self) {
        if let Some(sequence) = self.sequence.take() {
            debug!("pending write {} dropped unchecked", sequence);
            self.conn.transport().discard_write(sequence);
        }
    }
}

impl fmt::Debug for PendingWrite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PendingWrite").field("sequence", &self.sequence).field("request", &self.request).finish()
    }
}

impl Window {
    /// Read a property of this window.
    ///
    /// ### Arguments
    /// * `name` - property name or atom, it must already exist
    /// * `expected_type` - type the property must have, [`ANY_PROPERTY_TYPE`] to accept any
    /// * `size_hint` - bytes to fetch with the first request, the remainder is fetched with a
    ///   second request if needed
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(None, None).unwrap();
    /// let prop = ewmh.root().get_property("_NET_SUPPORTED", AtomEnum::ATOM, DEFAULT_SIZE_HINT).unwrap();
    /// ```
    pub fn get_property<'a, 'b>(
        &self, name: impl Into<AtomSpec<'a>>, expected_type: impl Into<AtomSpec<'b>>, size_hint: u32,
    ) -> EwmhResult<Property> {
        let name = self.atom(name, false)?;
        let expected = self.atom(expected_type, false)?;
        let prop_name = name.name()?.to_owned();

        let mut request = GetPropertyRequest {
            window: self.id(),
            property: name.id(),
            type_: expected.id(),
            long_offset: 0,
            long_length: size_hint.div_ceil(4),
        };
        let mut reply = self.connection().transport().get_property(&request)?;
        trace!("get_property: {} on {}: {:?}", prop_name, self, reply);

        if reply.type_ == x11rb::NONE {
            debug!("get_property: {} not found on {}", prop_name, self);
            return Ok(Property::missing(prop_name, self.clone()));
        }

        // Fetch what the size hint left behind, only possible when the type matched
        let type_matches = expected.id() == ANY_PROPERTY_TYPE || expected.id() == reply.type_;
        if reply.bytes_after > 0 && type_matches {
            request.long_offset = request.long_length;
            request.long_length = reply.bytes_after / 4 + 1;
            let rest = self.connection().transport().get_property(&request)?;
            if rest.type_ == x11rb::NONE {
                debug!("get_property: {} deleted from {} while reading", prop_name, self);
                return Ok(Property::missing(prop_name, self.clone()));
            }
            // replaced in between, the two halves don't belong together
            if rest.type_ != reply.type_ || rest.format != reply.format {
                let bytes_after = rest.value.len() as u32 + rest.bytes_after;
                let partial = Property {
                    name: prop_name,
                    window: self.clone(),
                    type_: Some(self.atom(reply.type_, false)?),
                    value: PropertyValue::from_raw(Format::from_bits(reply.format)?, &reply.value),
                };
                return Err(EwmhError::IncompletePropertyRead { bytes_after, property: Box::new(partial) }.into());
            }
            reply = PropertyReply {
                type_: rest.type_,
                format: rest.format,
                bytes_after: rest.bytes_after,
                value: [reply.value, rest.value].concat(),
            };
        }

        let actual = self.atom(reply.type_, false)?;
        let prop = Property {
            name: prop_name,
            window: self.clone(),
            type_: Some(actual.clone()),
            value: PropertyValue::from_raw(Format::from_bits(reply.format)?, &reply.value),
        };

        if !type_matches {
            return Err(EwmhError::TypeMismatch {
                expected: display_name(&expected),
                actual: display_name(&actual),
                property: Box::new(prop),
            }
            .into());
        }
        if reply.bytes_after > 0 {
            return Err(EwmhError::IncompletePropertyRead { bytes_after: reply.bytes_after, property: Box::new(prop) }
                .into());
        }

        debug!("get_property: {} on {}: {} items", prop.name, self, prop.value.len());
        Ok(prop)
    }

    /// Read a whole property in one request
    pub fn get_full_property<'a, 'b>(
        &self, name: impl Into<AtomSpec<'a>>, expected_type: impl Into<AtomSpec<'b>>,
    ) -> EwmhResult<Property> {
        self.get_property(name, expected_type, u32::MAX)
    }

    /// Check whether the property exists on this window, regardless of its type
    pub fn has_property<'a>(&self, name: impl Into<AtomSpec<'a>>) -> EwmhResult<bool> {
        match self.atom(name, false) {
            Ok(name) => {
                let request = GetPropertyRequest {
                    window: self.id(),
                    property: name.id(),
                    type_: ANY_PROPERTY_TYPE,
                    long_offset: 0,
                    long_length: 0,
                };
                Ok(self.connection().transport().get_property(&request)?.type_ != x11rb::NONE)
            },
            // the property can't be set if its name was never interned
            Err(err) if matches!(err.ewmh(), Some(EwmhError::UnknownAtom(_))) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Write a property of this window.
    ///
    /// ### Arguments
    /// * `name` - property name or atom, created if it doesn't exist yet
    /// * `data` - payload, its item size must agree with `format`
    /// * `property_type` - type atom of the payload, it must already exist
    /// * `format` - item bit size
    /// * `mode` - replace, prepend or append
    /// * `immediate` - wait for the server to process the request and report a rejection,
    ///   otherwise the request is only queued and the returned [`PendingWrite`] reports it
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(None, None).unwrap();
    /// ewmh.root().set_property("_NET_DESKTOP_LAYOUT", vec![0u32, 2, 2, 0], AtomEnum::CARDINAL,
    ///     Format::Int, Mode::Replace, true).unwrap();
    /// ```
    pub fn set_property<'a, 'b>(
        &self, name: impl Into<AtomSpec<'a>>, data: impl Into<PropertyValue>, property_type: impl Into<AtomSpec<'b>>,
        format: Format, mode: Mode, immediate: bool,
    ) -> EwmhResult<PendingWrite> {
        let value = data.into();
        if value.format() != format {
            return Err(EwmhError::FormatMismatch { expected: format, got: value.format() }.into());
        }

        let name = self.atom(name, true)?;
        let type_ = self.atom(property_type, false)?;
        let request = ChangePropertyRequest { window: self.id(), property: name.id(), type_: type_.id(), mode, value };
        let transport = self.connection().transport();
        let sequence = transport.change_property(&request)?;
        debug!("set_property: {} on {}: {:?}, {} items", name, self, mode, request.value.len());
        let pending = PendingWrite { conn: self.connection().clone(), sequence: Some(sequence), request };
        if !immediate {
            return Ok(pending);
        }

        let request = pending.request.clone();
        pending.check()?;
        transport.flush()?;
        Ok(PendingWrite { conn: self.connection().clone(), sequence: None, request })
    }

    /// Replace a property with 32-bit items and wait for the server
    pub fn set_property32<'a, 'b>(
        &self, name: impl Into<AtomSpec<'a>>, data: &[u32], property_type: impl Into<AtomSpec<'b>>,
    ) -> EwmhResult<()> {
        self.set_property(name, data, property_type, Format::Int, Mode::Replace, true)?.check()
    }

    /// Replace a property with bytes and wait for the server
    pub fn set_property8<'a, 'b>(
        &self, name: impl Into<AtomSpec<'a>>, data: &[u8], property_type: impl Into<AtomSpec<'b>>,
    ) -> EwmhResult<()> {
        self.set_property(name, data, property_type, Format::Char, Mode::Replace, true)?.check()
    }
}

// Name for error messages, falling back on the id if the server doesn't know it
fn display_name(atom: &Atom) -> String {
    match atom.name() {
        Ok(name) => name.to_owned(),
        Err(_) => atom.to_string(),
    }
}
