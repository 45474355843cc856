use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tracing::debug;

use crate::{
    atom::{Atom, AtomSpec},
    Connection, EwmhError, EwmhResult,
};

// Connection and screen a family of windows belongs to
struct Root {
    conn: Arc<Connection>,
    screen: usize,
    display_name: String,
    id: u32,
}

/// An X11 window bound to the connection and screen it was found on.
///
/// Two windows are equal when they have the same id on the same connection and screen, no matter
/// which root handle they were derived from. Windows are not pooled: decoding the same id twice
/// yields two equal values.
#[derive(Clone)]
pub struct Window {
    id: u32,
    root: Arc<Root>,
}

impl Window {
    /// Create the root window of the given screen, the context all windows derived from it share
    ///
    /// ### Arguments
    /// * `conn` - connection to the X11 server
    /// * `screen` - screen number, see [`Connection::default_screen`]
    pub fn root_of(conn: Arc<Connection>, screen: usize) -> EwmhResult<Window> {
        let id = conn.transport().root_window(screen).ok_or(EwmhError::ScreenNotFound(screen))?;
        let display_name = conn.display_name().to_owned();
        debug!("root_of: display: {:?}, screen: {}, root: {:#010x}", display_name, screen, id);
        Ok(Window { id, root: Arc::new(Root { conn, screen, display_name, id }) })
    }

    /// Another window of the same connection and screen
    pub fn window(&self, id: u32) -> Window {
        Window { id, root: self.root.clone() }
    }

    /// The root window of this window's screen
    pub fn root(&self) -> Window {
        self.window(self.root.id)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_root(&self) -> bool {
        self.id == self.root.id
    }

    /// Screen number the window lives on
    pub fn screen(&self) -> usize {
        self.root.screen
    }

    /// Name of the display the window lives on
    pub fn display_name(&self) -> &str {
        &self.root.display_name
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.root.conn
    }

    /// Resolve an atom on this window's connection, see [`Connection::resolve_atom`]
    pub fn atom<'a>(&self, spec: impl Into<AtomSpec<'a>>, create: bool) -> EwmhResult<Atom> {
        self.root.conn.resolve_atom(spec, create)
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.root.screen == other.root.screen
            && Arc::ptr_eq(&self.root.conn, &other.root.conn)
    }
}

impl Eq for Window {}

impl Hash for Window {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        Arc::as_ptr(&self.root.conn).hash(state);
        self.root.screen.hash(state);
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Window({:#010x})", self.id)
    }
}

// Implement format! support
impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.id)
    }
}
