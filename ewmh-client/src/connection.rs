//! The connection context every [`Atom`](crate::Atom) and [`Window`](crate::Window) refers back to.
//! It owns the transport and the per-connection atom cache.
use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

use crate::{
    transport::{X11rbTransport, XTransport},
    EwmhError, EwmhResult,
};

#[derive(Default)]
struct AtomCache {
    by_name: HashMap<String, u32>,
    by_id: HashMap<u32, String>,
}

impl AtomCache {
    // first resolution wins, entries are never replaced
    fn insert(&mut self, name: &str, id: u32) {
        self.by_name.entry(name.to_owned()).or_insert(id);
        self.by_id.entry(id).or_insert_with(|| name.to_owned());
    }
}

/// One client connection to an X11 server.
///
/// Shared through `Arc`; atoms and windows hold a reference to the connection they were resolved
/// against and compare unequal to those of any other connection.
pub struct Connection {
    transport: Box<dyn XTransport>,
    atoms: RwLock<AtomCache>,
}

impl Connection {
    /// Wrap an already established transport
    pub fn new<T: XTransport + 'static>(transport: T) -> Arc<Self> {
        Arc::new(Self { transport: Box::new(transport), atoms: Default::default() })
    }

    /// Open a connection to the X11 server named by `display_name`, else to `$DISPLAY`
    pub fn connect(display_name: Option<&str>) -> EwmhResult<Arc<Self>> {
        Ok(Self::new(X11rbTransport::connect(display_name)?))
    }

    /// The transport requests are issued on
    pub fn transport(&self) -> &dyn XTransport {
        self.transport.as_ref()
    }

    /// Name of the display this connection is bound to
    pub fn display_name(&self) -> &str {
        self.transport.display_name()
    }

    /// Screen selected by the display name
    pub fn default_screen(&self) -> usize {
        self.transport.default_screen()
    }

    /// Look the name up in the cache, else intern it on the server. Without `create` the atom
    /// must already exist.
    pub(crate) fn intern(&self, name: &str, create: bool) -> EwmhResult<u32> {
        if let Some(id) = self.atoms.read().unwrap_or_else(PoisonError::into_inner).by_name.get(name) {
            return Ok(*id);
        }

        let id = self.transport.intern_atom(name, !create)?;
        if id == x11rb::NONE {
            return Err(EwmhError::UnknownAtom(name.to_owned()).into());
        }
        debug!("intern: {} -> {}", name, id);
        self.atoms.write().unwrap_or_else(PoisonError::into_inner).insert(name, id);
        Ok(id)
    }

    /// Look the id up in the cache, else ask the server for its name
    pub(crate) fn atom_name(&self, id: u32) -> EwmhResult<String> {
        if let Some(name) = self.atoms.read().unwrap_or_else(PoisonError::into_inner).by_id.get(&id) {
            return Ok(name.clone());
        }

        let name = self.transport.atom_name(id)?;
        debug!("atom_name: {} -> {}", id, name);
        self.atoms.write().unwrap_or_else(PoisonError::into_inner).insert(&name, id);
        Ok(name)
    }

    /// Name of the atom if it was already resolved on this connection
    pub(crate) fn cached_atom_name(&self, id: u32) -> Option<String> {
        self.atoms.read().unwrap_or_else(PoisonError::into_inner).by_id.get(&id).cloned()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Connection")
            .field("display_name", &self.display_name())
            .field("default_screen", &self.default_screen())
            .finish()
    }
}
