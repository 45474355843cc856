//! An in-memory X server standing in for the transport in tests.
//! This module and its contents are only available when testing.
//!
//! Properties follow the X semantics of GetProperty and ChangeProperty closely enough to exercise
//! the codec: type filtering, offsets and lengths in 32-bit units, trailing byte counts and the
//! BadMatch held back until the write is checked when appending data of another type or format.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    property::{Mode, PropertyValue},
    transport::{ChangePropertyRequest, GetPropertyRequest, PropertyReply, SendEventRequest, XTransport},
    EwmhError, EwmhResult,
};

/// Root window of screen 0, screen `n` has root `ROOT + n`
pub const ROOT: u32 = 0x0000_0100;

const SCREENS: usize = 2;
const DISPLAY: &str = ":99";

// Predefined atoms plus the ones every real server has interned by the time a client connects
const SEEDED: [(&str, u32); 8] = [
    ("ATOM", 4),
    ("CARDINAL", 6),
    ("INTEGER", 19),
    ("STRING", 31),
    ("WINDOW", 33),
    ("WM_NAME", 39),
    ("UTF8_STRING", 300),
    ("COMPOUND_TEXT", 301),
];
const FIRST_FREE_ATOM: u32 = 302;

/// A request as received by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    InternAtom { name: String, only_if_exists: bool },
    AtomName(u32),
    GetProperty(GetPropertyRequest),
    ChangeProperty(ChangePropertyRequest),
    CheckWrite(u64),
    DiscardWrite(u64),
    SendEvent(SendEventRequest),
    Flush,
}

/// A property as stored on the mock server, `value` in native byte order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProperty {
    pub type_: u32,
    pub format: u8,
    pub value: Vec<u8>,
}

#[derive(Default)]
struct State {
    atoms: HashMap<String, u32>,
    names: HashMap<u32, String>,
    next_atom: u32,
    properties: HashMap<(u32, u32), StoredProperty>,
    requests: Vec<Request>,
    reply_units: Option<u32>,
    sequence: u64,
    // applied right after the next GetProperty that returned data
    after_read: Option<((u32, u32), Option<StoredProperty>)>,
    // rejected writes nobody checked or discarded yet
    rejections: HashMap<u64, ChangePropertyRequest>,
}

impl State {
    fn intern(&mut self, name: &str) -> u32 {
        if let Some(id) = self.atoms.get(name) {
            return *id;
        }
        let id = self.next_atom;
        self.next_atom += 1;
        self.atoms.insert(name.to_owned(), id);
        self.names.insert(id, name.to_owned());
        id
    }
}

/// Cheap to clone, all clones share the same server state
#[derive(Clone)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    pub fn new() -> Self {
        let mut state = State { next_atom: FIRST_FREE_ATOM, ..Default::default() };
        for (name, id) in SEEDED {
            state.atoms.insert(name.to_owned(), id);
            state.names.insert(id, name.to_owned());
        }
        Self { state: Arc::new(Mutex::new(state)) }
    }

    /// Intern an atom on the server side, without recording a request
    pub fn atom(&self, name: &str) -> u32 {
        self.state.lock().unwrap().intern(name)
    }

    /// All requests received so far, oldest first
    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Number of requests received so far that match the predicate
    pub fn count(&self, pred: impl Fn(&Request) -> bool) -> usize {
        self.state.lock().unwrap().requests.iter().filter(|r| pred(r)).count()
    }

    /// Current content of a property, bypassing the request log
    pub fn property(&self, window: u32, name: &str) -> Option<StoredProperty> {
        let state = self.state.lock().unwrap();
        let atom = state.atoms.get(name)?;
        state.properties.get(&(window, *atom)).cloned()
    }

    /// Number of rejected writes still waiting for a check or a discard
    pub fn held_rejections(&self) -> usize {
        self.state.lock().unwrap().rejections.len()
    }

    /// Replace, or delete when `None`, a property right after the next GetProperty that returns
    /// data, as another client would between two reads
    pub fn change_after_next_read(&self, window: u32, name: &str, replacement: Option<StoredProperty>) {
        let mut state = self.state.lock().unwrap();
        let atom = state.intern(name);
        state.after_read = Some(((window, atom), replacement));
    }

    /// Cap every GetProperty reply to `units` 32-bit units, whatever length was asked for
    pub fn limit_reply_units(&self, units: u32) {
        self.state.lock().unwrap().reply_units = Some(units);
    }
}

fn raw_bytes(value: &PropertyValue) -> Vec<u8> {
    match value {
        PropertyValue::Bytes(v) => v.clone(),
        PropertyValue::Words16(v) => v.iter().flat_map(|w| w.to_ne_bytes()).collect(),
        PropertyValue::Words32(v) => v.iter().flat_map(|w| w.to_ne_bytes()).collect(),
    }
}

impl XTransport for MockTransport {
    fn display_name(&self) -> &str {
        DISPLAY
    }

    fn default_screen(&self) -> usize {
        0
    }

    fn root_window(&self, screen: usize) -> Option<u32> {
        (screen < SCREENS).then(|| ROOT + screen as u32)
    }

    fn intern_atom(&self, name: &str, only_if_exists: bool) -> EwmhResult<u32> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request::InternAtom { name: name.to_owned(), only_if_exists });
        match state.atoms.get(name) {
            Some(id) => Ok(*id),
            None if only_if_exists => Ok(x11rb::NONE),
            None => Ok(state.intern(name)),
        }
    }

    fn atom_name(&self, atom: u32) -> EwmhResult<String> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request::AtomName(atom));
        match state.names.get(&atom) {
            Some(name) => Ok(name.clone()),
            None => Err(x11rb::errors::ConnectionError::UnknownError.into()),
        }
    }

    fn get_property(&self, request: &GetPropertyRequest) -> EwmhResult<PropertyReply> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request::GetProperty(*request));

        let Some(prop) = state.properties.get(&(request.window, request.property)) else {
            return Ok(PropertyReply::default());
        };
        if request.type_ != 0 && request.type_ != prop.type_ {
            return Ok(PropertyReply {
                type_: prop.type_,
                format: prop.format,
                bytes_after: prop.value.len() as u32,
                value: vec![],
            });
        }

        let units = state.reply_units.map_or(request.long_length, |limit| limit.min(request.long_length));
        let start = (request.long_offset as usize).saturating_mul(4).min(prop.value.len());
        let end = start.saturating_add((units as usize).saturating_mul(4)).min(prop.value.len());
        let reply = PropertyReply {
            type_: prop.type_,
            format: prop.format,
            bytes_after: (prop.value.len() - end) as u32,
            value: prop.value[start..end].to_vec(),
        };

        if let Some((key, replacement)) = state.after_read.take() {
            match replacement {
                Some(prop) => state.properties.insert(key, prop),
                None => state.properties.remove(&key),
            };
        }
        Ok(reply)
    }

    fn change_property(&self, request: &ChangePropertyRequest) -> EwmhResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request::ChangeProperty(request.clone()));
        state.sequence += 1;
        let sequence = state.sequence;

        let key = (request.window, request.property);
        let format = request.value.format().bits();
        let data = raw_bytes(&request.value);
        let existing = state.properties.get(&key).cloned();

        let value = match (request.mode, existing) {
            (Mode::Replace, _) | (_, None) => data,
            (_, Some(prop)) if prop.type_ != request.type_ || prop.format != format => {
                state.rejections.insert(sequence, request.clone());
                return Ok(sequence);
            },
            (Mode::Prepend, Some(prop)) => [data, prop.value].concat(),
            (Mode::Append, Some(prop)) => [prop.value, data].concat(),
        };
        state.properties.insert(key, StoredProperty { type_: request.type_, format, value });
        Ok(sequence)
    }

    fn check_write(&self, sequence: u64, request: &ChangePropertyRequest) -> EwmhResult<()> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request::CheckWrite(sequence));
        match state.rejections.remove(&sequence) {
            Some(_) => Err(EwmhError::PropertyWriteError { request: request.clone(), reason: "Match".into() }.into()),
            None => Ok(()),
        }
    }

    fn discard_write(&self, sequence: u64) {
        let mut state = self.state.lock().unwrap();
        state.requests.push(Request::DiscardWrite(sequence));
        state.rejections.remove(&sequence);
    }

    fn send_event(&self, request: &SendEventRequest) -> EwmhResult<()> {
        self.state.lock().unwrap().requests.push(Request::SendEvent(*request));
        Ok(())
    }

    fn flush(&self) -> EwmhResult<()> {
        self.state.lock().unwrap().requests.push(Request::Flush);
        Ok(())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}
