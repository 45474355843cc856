use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, OnceLock},
};

use x11rb::protocol::xproto::AtomEnum;

use crate::{Connection, EwmhResult};

/// An X atom, a named integer scoped to one [`Connection`].
///
/// Two atoms are equal only if they carry the same id *and* were resolved on the same connection,
/// atom ids are not portable between connections. Comparisons against raw ids or names are
/// explicit, see [`Atom::has_id`] and [`Atom::is_named`].
#[derive(Clone)]
pub struct Atom {
    id: u32,
    name: OnceLock<String>,
    conn: Arc<Connection>,
}

impl Atom {
    pub(crate) fn new(id: u32, name: Option<String>, conn: Arc<Connection>) -> Self {
        let cell = OnceLock::new();
        if let Some(name) = name.or_else(|| conn.cached_atom_name(id)) {
            let _ = cell.set(name);
        }
        Self { id, name: cell, conn }
    }

    /// Numeric id of the atom
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Symbolic name of the atom, fetched from the server on first access when the atom was
    /// resolved from its id
    pub fn name(&self) -> EwmhResult<&str> {
        if let Some(name) = self.name.get() {
            return Ok(name);
        }
        let name = self.conn.atom_name(self.id)?;
        Ok(self.name.get_or_init(|| name))
    }

    /// Name of the atom if already known, without a server round trip
    pub fn cached_name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Compare only the numeric id, ignoring the connection
    pub fn has_id(&self, id: u32) -> bool {
        self.id == id
    }

    /// Compare against the resolved name
    pub fn is_named(&self, name: &str) -> EwmhResult<bool> {
        Ok(self.name()? == name)
    }

    /// Connection the atom was resolved against
    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.conn, &other.conn)
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<&Atom> for u32 {
    fn from(atom: &Atom) -> u32 {
        atom.id
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.cached_name() {
            Some(name) => write!(f, "Atom({} {:?})", self.id, name),
            None => write!(f, "Atom({})", self.id),
        }
    }
}

// Implement format! support
impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.cached_name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "#{}", self.id),
        }
    }
}

/// Anything an [`Atom`] can be resolved from: an atom, a numeric id or a name
#[derive(Debug, Clone)]
pub enum AtomSpec<'a> {
    Atom(Atom),
    Id(u32),
    Name(Cow<'a, str>),
}

impl From<Atom> for AtomSpec<'_> {
    fn from(atom: Atom) -> Self {
        AtomSpec::Atom(atom)
    }
}

impl From<&Atom> for AtomSpec<'_> {
    fn from(atom: &Atom) -> Self {
        AtomSpec::Atom(atom.clone())
    }
}

impl From<u32> for AtomSpec<'_> {
    fn from(id: u32) -> Self {
        AtomSpec::Id(id)
    }
}

impl From<AtomEnum> for AtomSpec<'_> {
    fn from(atom: AtomEnum) -> Self {
        AtomSpec::Id(atom.into())
    }
}

impl<'a> From<&'a str> for AtomSpec<'a> {
    fn from(name: &'a str) -> Self {
        AtomSpec::Name(Cow::Borrowed(name))
    }
}

impl From<String> for AtomSpec<'_> {
    fn from(name: String) -> Self {
        AtomSpec::Name(Cow::Owned(name))
    }
}

impl<'a> From<&'a String> for AtomSpec<'a> {
    fn from(name: &'a String) -> Self {
        AtomSpec::Name(Cow::Borrowed(name.as_str()))
    }
}

impl Connection {
    /// Resolve a name, id or atom into an [`Atom`] of this connection.
    ///
    /// An atom of this connection is returned unchanged, one of another connection is resolved
    /// again by its name. A name is interned, `create` allows the server to
    /// define a new atom, otherwise an unknown name fails with `UnknownAtom`. An id is taken as is,
    /// its name is only queried on first access.
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let conn = Connection::connect(None).unwrap();
    /// let utf8 = conn.resolve_atom("UTF8_STRING", false).unwrap();
    /// assert_eq!(utf8.name().unwrap(), "UTF8_STRING");
    /// ```
    pub fn resolve_atom<'a>(self: &Arc<Self>, spec: impl Into<AtomSpec<'a>>, create: bool) -> EwmhResult<Atom> {
        Ok(match spec.into() {
            AtomSpec::Atom(atom) if Arc::ptr_eq(atom.connection(), self) => atom,
            // ids are only meaningful on the connection that interned them
            AtomSpec::Atom(atom) => {
                let name = atom.name()?.to_owned();
                let id = self.intern(&name, create)?;
                Atom::new(id, Some(name), self.clone())
            },
            AtomSpec::Id(id) => Atom::new(id, None, self.clone()),
            AtomSpec::Name(name) => {
                let id = self.intern(&name, create)?;
                Atom::new(id, Some(name.into_owned()), self.clone())
            },
        })
    }
}
