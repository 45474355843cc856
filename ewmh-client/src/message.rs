//! Client messages, the way clients ask the window manager to change state it owns.
//!
//! Messages are requests, the window manager is free to ignore them. Nothing here waits for or
//! verifies an effect.
use tracing::debug;
use x11rb::protocol::xproto::EventMask;

use crate::{
    atom::AtomSpec,
    transport::{ClientMessage, SendEventRequest},
    EwmhError, EwmhResult, Window,
};

/// Slots of 32-bit data a client message carries
pub const MESSAGE_SLOTS: usize = 5;

/// Source indication of a request, see the EWMH section on source indication in requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Source {
    /// Clients that support an older version of EWMH
    None = 0,
    /// Normal applications
    Application = 1,
    /// Pagers and other clients acting on behalf of the user
    #[default]
    User = 2,
}

impl From<Source> for u32 {
    fn from(source: Source) -> u32 {
        source as u32
    }
}

impl Window {
    /// Send a client message about this window to the window manager.
    ///
    /// The message is always delivered to the root window, the only window the window manager
    /// listens on for requests, with this window's id in the event's window field.
    ///
    /// ### Arguments
    /// * `name` - message type, it must already exist
    /// * `data` - up to 5 values, missing slots are sent as 0
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(None, None).unwrap();
    /// ewmh.root().send_message("_NET_CURRENT_DESKTOP", &[1, 0]).unwrap();
    /// ```
    pub fn send_message<'a>(&self, name: impl Into<AtomSpec<'a>>, data: &[u32]) -> EwmhResult<()> {
        if data.len() > MESSAGE_SLOTS {
            return Err(EwmhError::TooManyArguments(data.len()).into());
        }
        let type_ = self.atom(name, false)?;

        let mut slots = [0u32; MESSAGE_SLOTS];
        slots[..data.len()].copy_from_slice(data);
        let request = SendEventRequest {
            destination: self.root().id(),
            propagate: false,
            event_mask: EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            message: ClientMessage { window: self.id(), type_: type_.id(), data: slots },
        };

        let transport = self.connection().transport();
        transport.send_event(&request)?;
        transport.flush()?;
        debug!("send_message: {} about {}: {:?}", type_, self, slots);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mock::{MockTransport, Request, ROOT},
        Ewmh,
    };

    const CLIENT: u32 = 0x0040_0001;

    fn setup() -> (MockTransport, Ewmh) {
        let mock = MockTransport::new();
        mock.atom("_NET_ACTIVE_WINDOW");
        let ewmh = Ewmh::with_transport(mock.clone(), None).unwrap();
        (mock, ewmh)
    }

    fn sent(mock: &MockTransport) -> Vec<SendEventRequest> {
        mock.requests()
            .into_iter()
            .filter_map(|r| match r {
                Request::SendEvent(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn messages_go_to_the_root_about_the_calling_window() {
        let (mock, ewmh) = setup();

        ewmh.window(CLIENT).send_message("_NET_ACTIVE_WINDOW", &[2, 0, 0]).unwrap();

        let sent = sent(&mock);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].destination, ROOT);
        assert!(!sent[0].propagate);
        assert_eq!(sent[0].event_mask, EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY);
        assert_eq!(sent[0].message.window, CLIENT);
        assert_eq!(sent[0].message.type_, mock.atom("_NET_ACTIVE_WINDOW"));
    }

    #[test]
    fn short_data_is_zero_padded() {
        let (mock, ewmh) = setup();

        ewmh.root().send_message("_NET_ACTIVE_WINDOW", &[7]).unwrap();

        assert_eq!(sent(&mock)[0].message.data, [7, 0, 0, 0, 0]);
    }

    #[test]
    fn messages_are_flushed() {
        let (mock, ewmh) = setup();

        ewmh.root().send_message("_NET_ACTIVE_WINDOW", &[]).unwrap();

        assert!(matches!(mock.requests().last(), Some(Request::Flush)));
    }

    #[test]
    fn more_than_five_values_are_rejected_before_sending() {
        let (mock, ewmh) = setup();

        let err = ewmh.root().send_message("_NET_ACTIVE_WINDOW", &[1, 2, 3, 4, 5, 6]).unwrap_err();

        assert!(matches!(err.ewmh(), Some(EwmhError::TooManyArguments(6))));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn message_types_are_never_created() {
        let (mock, ewmh) = setup();

        let err = ewmh.root().send_message("_NET_NOT_A_MESSAGE", &[1]).unwrap_err();

        assert!(matches!(err.ewmh(), Some(EwmhError::UnknownAtom(_))));
        assert!(sent(&mock).is_empty());
    }

    #[test]
    fn sources_are_sent_as_their_protocol_values() {
        assert_eq!(u32::from(Source::None), 0);
        assert_eq!(u32::from(Source::Application), 1);
        assert_eq!(u32::from(Source::User), 2);
    }
}
