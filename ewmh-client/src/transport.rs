//! The X11 requests this crate needs, expressed as a small trait so that the access layer can be
//! driven by any X11 binding. [`X11rbTransport`] implements it on top of x11rb's pure Rust
//! connection.
use tracing::{debug, trace};
use x11rb::{
    connection::{Connection as _, DiscardMode, RequestConnection as _, RequestKind},
    errors::ReplyError,
    protocol::xproto::{ClientMessageEvent, ConnectionExt as _, EventMask, PropMode},
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
};

use crate::{
    property::{Mode, PropertyValue},
    EwmhError, EwmhResult,
};

/// Parameters of a GetProperty request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetPropertyRequest {
    pub window: u32,
    pub property: u32,
    /// Expected type, 0 for AnyPropertyType
    pub type_: u32,
    /// Offset into the property data in 32-bit units
    pub long_offset: u32,
    /// Amount of data to read in 32-bit units
    pub long_length: u32,
}

/// Raw GetProperty reply, `value` in the connection's byte order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyReply {
    pub type_: u32,
    pub format: u8,
    pub bytes_after: u32,
    pub value: Vec<u8>,
}

/// Parameters of a ChangeProperty request, also reported back when the server rejects it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePropertyRequest {
    pub window: u32,
    pub property: u32,
    pub type_: u32,
    pub mode: Mode,
    pub value: PropertyValue,
}

/// A 32-bit ClientMessage event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientMessage {
    /// Window the message is about, not necessarily the one it is sent to
    pub window: u32,
    pub type_: u32,
    pub data: [u32; 5],
}

/// Parameters of a SendEvent request carrying a [`ClientMessage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendEventRequest {
    pub destination: u32,
    pub propagate: bool,
    pub event_mask: EventMask,
    pub message: ClientMessage,
}

/// Request/reply primitives of the core X11 protocol used by the access layer.
///
/// Every method blocks until the server replies, except `send_event` and `change_property` which
/// only queue the request until the next `flush`.
pub trait XTransport: Send + Sync {
    /// Name of the display this transport is connected to, e.g. `:0`
    fn display_name(&self) -> &str;

    /// Screen selected by the display name
    fn default_screen(&self) -> usize;

    /// Root window id of the given screen, if the screen exists
    fn root_window(&self, screen: usize) -> Option<u32>;

    /// InternAtom, returns 0 when `only_if_exists` is set and the atom is unknown
    fn intern_atom(&self, name: &str, only_if_exists: bool) -> EwmhResult<u32>;

    /// GetAtomName
    fn atom_name(&self, atom: u32) -> EwmhResult<String>;

    /// GetProperty without deleting the property
    fn get_property(&self, request: &GetPropertyRequest) -> EwmhResult<PropertyReply>;

    /// Queue a ChangeProperty, the returned sequence number is later passed to either
    /// `check_write` or `discard_write`
    fn change_property(&self, request: &ChangePropertyRequest) -> EwmhResult<u64>;

    /// Wait for the server to process the ChangeProperty `sequence`, a rejection is reported as
    /// [`EwmhError::PropertyWriteError`] carrying `request`
    fn check_write(&self, sequence: u64, request: &ChangePropertyRequest) -> EwmhResult<()>;

    /// Stop tracking the ChangeProperty `sequence`, a rejection then goes to the event queue
    fn discard_write(&self, sequence: u64);

    /// SendEvent with a ClientMessage
    fn send_event(&self, request: &SendEventRequest) -> EwmhResult<()>;

    /// Flush all queued requests to the server
    fn flush(&self) -> EwmhResult<()>;
}

/// [`XTransport`] over x11rb's `RustConnection`
pub struct X11rbTransport {
    conn: RustConnection,
    display_name: String,
    screen: usize,
}

impl X11rbTransport {
    /// Connect to the X11 server named by `display_name`, else to `$DISPLAY`
    pub fn connect(display_name: Option<&str>) -> EwmhResult<Self> {
        let (conn, screen) = x11rb::connect(display_name)?;
        let display_name = match display_name {
            Some(name) => name.to_owned(),
            None => std::env::var("DISPLAY").unwrap_or_default(),
        };
        debug!("connect: display: {:?}, screen: {}", display_name, screen);
        Ok(Self { conn, display_name, screen })
    }

    /// Access the underlying x11rb connection
    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }
}

impl XTransport for X11rbTransport {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn default_screen(&self) -> usize {
        self.screen
    }

    fn root_window(&self, screen: usize) -> Option<u32> {
        self.conn.setup().roots.get(screen).map(|s| s.root)
    }

    fn intern_atom(&self, name: &str, only_if_exists: bool) -> EwmhResult<u32> {
        let atom = self.conn.intern_atom(only_if_exists, name.as_bytes())?.reply()?.atom;
        trace!("intern_atom: {} -> {}", name, atom);
        Ok(atom)
    }

    fn atom_name(&self, atom: u32) -> EwmhResult<String> {
        let reply = self.conn.get_atom_name(atom)?.reply()?;
        let name = String::from_utf8_lossy(&reply.name).into_owned();
        trace!("atom_name: {} -> {}", atom, name);
        Ok(name)
    }

    fn get_property(&self, request: &GetPropertyRequest) -> EwmhResult<PropertyReply> {
        let reply = self
            .conn
            .get_property(
                false,
                request.window,
                request.property,
                request.type_,
                request.long_offset,
                request.long_length,
            )?
            .reply()?;
        Ok(PropertyReply {
            type_: reply.type_,
            format: reply.format,
            bytes_after: reply.bytes_after,
            value: reply.value,
        })
    }

    fn change_property(&self, request: &ChangePropertyRequest) -> EwmhResult<u64> {
        let mode = PropMode::from(request.mode);
        let (window, property, type_) = (request.window, request.property, request.type_);
        let cookie = match &request.value {
            PropertyValue::Bytes(data) => self.conn.change_property8(mode, window, property, type_, data)?,
            PropertyValue::Words16(data) => self.conn.change_property16(mode, window, property, type_, data)?,
            PropertyValue::Words32(data) => self.conn.change_property32(mode, window, property, type_, data)?,
        };
        // dropping the cookie would hand the error to the event queue right away
        let sequence = cookie.sequence_number();
        std::mem::forget(cookie);
        trace!("change_property: sequence {}", sequence);
        Ok(sequence)
    }

    fn check_write(&self, sequence: u64, request: &ChangePropertyRequest) -> EwmhResult<()> {
        match self.conn.check_for_error(sequence) {
            Ok(()) => Ok(()),
            Err(ReplyError::X11Error(err)) => Err(EwmhError::PropertyWriteError {
                request: request.clone(),
                reason: format!("{:?} (bad value {})", err.error_kind, err.bad_value),
            }
            .into()),
            Err(err) => Err(err.into()),
        }
    }

    fn discard_write(&self, sequence: u64) {
        self.conn.discard_reply(sequence, RequestKind::IsVoid, DiscardMode::DiscardReply);
    }

    fn send_event(&self, request: &SendEventRequest) -> EwmhResult<()> {
        let msg = request.message;
        let event = ClientMessageEvent::new(32, msg.window, msg.type_, msg.data);
        self.conn.send_event(request.propagate, request.destination, request.event_mask, &event)?;
        Ok(())
    }

    fn flush(&self) -> EwmhResult<()> {
        Ok(self.conn.flush()?)
    }
}

impl From<Mode> for PropMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Replace => PropMode::REPLACE,
            Mode::Prepend => PropMode::PREPEND,
            Mode::Append => PropMode::APPEND,
        }
    }
}
