//! `ewmh-client` is a client side access layer for the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! and the lower level Inter Client Communication Conventions Manual (ICCCM) it builds on.
//!
//! The layer is small on purpose: atoms are resolved per [`Connection`], properties of a
//! [`Window`] are read and written through a typed codec, text properties are encoded according
//! to their type and requests to the window manager are sent as client messages to the root
//! window. [`Ewmh`] puts the root window hints on top of that.
//!
//! ### Examples
//! ```ignore
//! use ewmh_client::prelude::*;
//! let ewmh = Ewmh::connect(None, None).unwrap();
//! for win in ewmh.client_list().unwrap() {
//!     println!("{} {}", win, win.wm_name().unwrap_or_default());
//! }
//! ```
mod atom;
mod connection;
mod error;
mod ewmh;
mod message;
mod model;
mod property;
mod text;
pub mod transport;
mod window;

#[cfg(test)]
mod mock;

pub use atom::{Atom, AtomSpec};
pub use connection::Connection;
pub use error::*;
pub use ewmh::{Ewmh, CURRENT_TIME};
pub use message::{Source, MESSAGE_SLOTS};
pub use model::*;
pub use property::{
    Format, Mode, PendingWrite, Property, PropertyValue, ANY_PROPERTY_TYPE, DEFAULT_SIZE_HINT,
};
pub use text::{join_text_list, split_text_list, Encoding, TextErrors, TEXT_TYPES};
pub use window::Window;

/// All essential symbols in a simple consumable form
///
/// ### Examples
/// ```
/// use ewmh_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::*;
    pub use x11rb::protocol::xproto::AtomEnum;
}
