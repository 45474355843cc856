//! `Ewmh` exposes the root window hints of the [Extended Window Manager Hints (EWMH) specification](https://specifications.freedesktop.org/wm-spec/latest/)
//! on top of the property and client message layer.
//!
//! [Root Window Properties](https://specifications.freedesktop.org/wm-spec/latest/ar01s03.html)
//! Reads are direct property queries against the root window. Changes to state the window manager
//! owns are sent as client messages, which the window manager is free to ignore; only
//! `_NET_DESKTOP_LAYOUT`, which belongs to pagers, is written as a property.
use std::sync::Arc;

use tracing::debug;
use x11rb::protocol::xproto::AtomEnum;

use crate::{
    atom::Atom,
    message::Source,
    model::{DesktopLayout, WorkArea},
    property::{Format, Mode, PropertyValue, DEFAULT_SIZE_HINT},
    text::{join_text_list, split_text_list, TextErrors},
    transport::XTransport,
    Connection, ErrorWrapper, EwmhError, EwmhResult, Window,
};

/// Timestamp to use when the client has no user activity timestamp at hand
pub const CURRENT_TIME: u32 = x11rb::CURRENT_TIME;

/// Access to the EWMH root window hints of one screen
#[derive(Debug, Clone)]
pub struct Ewmh {
    root: Window,
}

impl Ewmh {
    /// Connect to the X11 server and bind to the root window of a screen
    ///
    /// ### Arguments
    /// * `display_name` - display to connect to, defaults to `$DISPLAY`
    /// * `screen` - screen to bind to, defaults to the one selected by the display name
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(Some(":0"), None).unwrap();
    /// ```
    pub fn connect(display_name: Option<&str>, screen: Option<usize>) -> EwmhResult<Self> {
        Self::with_connection(Connection::connect(display_name)?, screen)
    }

    /// Bind to a screen over an already established transport
    pub fn with_transport<T: XTransport + 'static>(transport: T, screen: Option<usize>) -> EwmhResult<Self> {
        Self::with_connection(Connection::new(transport), screen)
    }

    /// Bind to a screen of an existing connection
    pub fn with_connection(conn: Arc<Connection>, screen: Option<usize>) -> EwmhResult<Self> {
        let screen = screen.unwrap_or_else(|| conn.default_screen());
        let root = Window::root_of(conn, screen)?;
        debug!("ewmh: display: {:?}, screen: {}, root: {}", root.display_name(), screen, root);
        Ok(Self { root })
    }

    /// The root window the hints are read from
    pub fn root(&self) -> &Window {
        &self.root
    }

    /// Window of this screen with the given id
    pub fn window(&self, id: u32) -> Window {
        self.root.window(id)
    }

    pub fn screen(&self) -> usize {
        self.root.screen()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        self.root.connection()
    }

    // Values of a 32-bit root property, missing ones are an error
    fn words(&self, name: &str, type_: AtomEnum) -> EwmhResult<Vec<u32>> {
        let prop = self.root.get_property(name, type_, DEFAULT_SIZE_HINT)?;
        prop.require()?;
        match prop.into_value() {
            PropertyValue::Words32(values) => Ok(values),
            other => Err(EwmhError::FormatMismatch { expected: Format::Int, got: other.format() }.into()),
        }
    }

    fn word(&self, name: &str, type_: AtomEnum) -> EwmhResult<u32> {
        let values = self.words(name, type_)?;
        values.first().copied().ok_or_else(|| self.not_found(name))
    }

    fn windows(&self, name: &str) -> EwmhResult<Vec<Window>> {
        Ok(self.words(name, AtomEnum::WINDOW)?.into_iter().map(|id| self.window(id)).collect())
    }

    fn not_found(&self, name: &str) -> ErrorWrapper {
        EwmhError::PropertyNotFound(format!("{} on {}", name, self.root)).into()
    }

    /// Atoms of the hints the window manager supports
    pub fn supported(&self) -> EwmhResult<Vec<Atom>> {
        // Defined as: _NET_SUPPORTED, ATOM[]/32
        self.words("_NET_SUPPORTED", AtomEnum::ATOM)?.into_iter().map(|id| self.root.atom(id, false)).collect()
    }

    /// Windows managed by the window manager, oldest first
    pub fn client_list(&self) -> EwmhResult<Vec<Window>> {
        // Defined as: _NET_CLIENT_LIST, WINDOW[]/32
        self.windows("_NET_CLIENT_LIST")
    }

    /// Windows managed by the window manager, bottom to top
    pub fn client_list_stacking(&self) -> EwmhResult<Vec<Window>> {
        // Defined as: _NET_CLIENT_LIST_STACKING, WINDOW[]/32
        self.windows("_NET_CLIENT_LIST_STACKING")
    }

    pub fn number_of_desktops(&self) -> EwmhResult<u32> {
        // Defined as: _NET_NUMBER_OF_DESKTOPS, CARDINAL/32
        self.word("_NET_NUMBER_OF_DESKTOPS", AtomEnum::CARDINAL)
    }

    /// Ask the window manager to change the number of desktops
    pub fn set_number_of_desktops(&self, number: u32) -> EwmhResult<()> {
        self.root.send_message("_NET_NUMBER_OF_DESKTOPS", &[number])
    }

    /// Common size of all desktops as (width, height)
    pub fn desktop_geometry(&self) -> EwmhResult<(u32, u32)> {
        // Defined as: _NET_DESKTOP_GEOMETRY width, height, CARDINAL[2]/32
        match self.words("_NET_DESKTOP_GEOMETRY", AtomEnum::CARDINAL)?[..] {
            [width, height, ..] => Ok((width, height)),
            _ => Err(self.not_found("_NET_DESKTOP_GEOMETRY")),
        }
    }

    pub fn set_desktop_geometry(&self, width: u32, height: u32) -> EwmhResult<()> {
        self.root.send_message("_NET_DESKTOP_GEOMETRY", &[width, height])
    }

    /// Top left corner of each desktop's viewport
    pub fn desktop_viewport(&self) -> EwmhResult<Vec<(u32, u32)>> {
        // Defined as: _NET_DESKTOP_VIEWPORT x, y, CARDINAL[][2]/32
        let values = self.words("_NET_DESKTOP_VIEWPORT", AtomEnum::CARDINAL)?;
        Ok(values.chunks_exact(2).map(|c| (c[0], c[1])).collect())
    }

    /// Ask the window manager to move the viewport of the current desktop
    pub fn set_desktop_viewport(&self, x: u32, y: u32) -> EwmhResult<()> {
        self.root.send_message("_NET_DESKTOP_VIEWPORT", &[x, y])
    }

    pub fn current_desktop(&self) -> EwmhResult<u32> {
        // Defined as: _NET_CURRENT_DESKTOP desktop, CARDINAL/32
        self.word("_NET_CURRENT_DESKTOP", AtomEnum::CARDINAL)
    }

    /// Ask the window manager to switch to another desktop
    ///
    /// ### Arguments
    /// * `index` - desktop to switch to
    /// * `timestamp` - timestamp of the user action, [`CURRENT_TIME`] if unknown
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(None, None).unwrap();
    /// ewmh.set_current_desktop(1, CURRENT_TIME).unwrap();
    /// ```
    pub fn set_current_desktop(&self, index: u32, timestamp: u32) -> EwmhResult<()> {
        self.root.send_message("_NET_CURRENT_DESKTOP", &[index, timestamp])
    }

    /// Names of the desktops, there may be more or less names than desktops
    pub fn desktop_names(&self) -> EwmhResult<Vec<String>> {
        // Defined as: _NET_DESKTOP_NAMES, UTF8_STRING[]
        let text = self.root.get_text("_NET_DESKTOP_NAMES", "UTF8_STRING", None, TextErrors::Strict)?;
        Ok(split_text_list(&text))
    }

    pub fn set_desktop_names<I, S>(&self, names: I) -> EwmhResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = join_text_list(names);
        self.root
            .set_text("_NET_DESKTOP_NAMES", &text, "UTF8_STRING", None, TextErrors::Strict, Mode::Replace, true)?
            .check()
    }

    /// The window that has the focus, `None` if no window has it
    pub fn active_window(&self) -> EwmhResult<Option<Window>> {
        // Defined as: _NET_ACTIVE_WINDOW, WINDOW/32
        let id = self.word("_NET_ACTIVE_WINDOW", AtomEnum::WINDOW)?;
        Ok((id != x11rb::NONE).then(|| self.window(id)))
    }

    /// Ask the window manager to activate a window
    ///
    /// ### Arguments
    /// * `win` - window to activate
    /// * `source` - who is asking, pagers should use [`Source::User`]
    /// * `timestamp` - last user activity timestamp of the client, [`CURRENT_TIME`] if unknown
    /// * `requestor` - the client's currently active toplevel window, if any
    ///
    /// ### Examples
    /// ```ignore
    /// use ewmh_client::prelude::*;
    /// let ewmh = Ewmh::connect(None, None).unwrap();
    /// let win = ewmh.client_list().unwrap().remove(0);
    /// ewmh.set_active_window(&win, Source::User, CURRENT_TIME, None).unwrap();
    /// ```
    pub fn set_active_window(
        &self, win: &Window, source: Source, timestamp: u32, requestor: Option<&Window>,
    ) -> EwmhResult<()> {
        let requestor = requestor.map_or(x11rb::NONE, Window::id);
        win.send_message("_NET_ACTIVE_WINDOW", &[source.into(), timestamp, requestor])
    }

    /// Work area of each desktop
    pub fn workarea(&self) -> EwmhResult<Vec<WorkArea>> {
        // Defined as: _NET_WORKAREA, x, y, width, height CARDINAL[][4]/32
        let values = self.words("_NET_WORKAREA", AtomEnum::CARDINAL)?;
        Ok(values.chunks_exact(4).map(|c| WorkArea::from([c[0], c[1], c[2], c[3]])).collect())
    }

    /// Child window the window manager created to show that it is running
    pub fn supporting_wm_check(&self) -> EwmhResult<Window> {
        // Defined as: _NET_SUPPORTING_WM_CHECK, WINDOW/32
        Ok(self.window(self.word("_NET_SUPPORTING_WM_CHECK", AtomEnum::WINDOW)?))
    }

    /// Windows acting as virtual roots of the desktops
    pub fn virtual_roots(&self) -> EwmhResult<Vec<Window>> {
        // Defined as: _NET_VIRTUAL_ROOTS, WINDOW[]/32
        self.windows("_NET_VIRTUAL_ROOTS")
    }

    /// Desktop layout published by the pager
    pub fn desktop_layout(&self) -> EwmhResult<DesktopLayout> {
        // Defined as: _NET_DESKTOP_LAYOUT, orientation, columns, rows, starting_corner CARDINAL[4]/32
        DesktopLayout::from_values(&self.words("_NET_DESKTOP_LAYOUT", AtomEnum::CARDINAL)?)
    }

    /// Publish the desktop layout, meant for pagers owning the `_NET_DESKTOP_LAYOUT_Sn` selection
    pub fn set_desktop_layout(&self, layout: &DesktopLayout) -> EwmhResult<()> {
        self.root.set_property32("_NET_DESKTOP_LAYOUT", &layout.to_values(), AtomEnum::CARDINAL)
    }

    /// Whether the window manager is in "showing the desktop" mode
    pub fn showing_desktop(&self) -> EwmhResult<bool> {
        // Defined as: _NET_SHOWING_DESKTOP desktop, CARDINAL/32
        Ok(self.word("_NET_SHOWING_DESKTOP", AtomEnum::CARDINAL)? != 0)
    }

    pub fn set_showing_desktop(&self, showing: bool) -> EwmhResult<()> {
        self.root.send_message("_NET_SHOWING_DESKTOP", &[showing.into()])
    }

    /// Ask the window manager to close a window
    ///
    /// Note the order of `timestamp` and `source` is swapped compared to `_NET_ACTIVE_WINDOW`.
    pub fn close_window(&self, win: &Window, timestamp: u32, source: Source) -> EwmhResult<()> {
        win.send_message("_NET_CLOSE_WINDOW", &[timestamp, source.into()])
    }
}

impl Window {
    /// Title of the window as set by the client
    pub fn wm_name(&self) -> EwmhResult<String> {
        // Defined as: _NET_WM_NAME, UTF8_STRING
        self.get_text("_NET_WM_NAME", "UTF8_STRING", None, TextErrors::Strict)
    }

    pub fn set_wm_name(&self, name: &str) -> EwmhResult<()> {
        self.set_text("_NET_WM_NAME", name, "UTF8_STRING", None, TextErrors::Strict, Mode::Replace, true)?
            .check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mock::{MockTransport, Request, ROOT},
        model::{Corner, Orientation},
        transport::SendEventRequest,
    };

    const CLIENT: u32 = 0x0040_0001;

    fn setup() -> (MockTransport, Ewmh) {
        let mock = MockTransport::new();
        let ewmh = Ewmh::with_transport(mock.clone(), None).unwrap();
        (mock, ewmh)
    }

    fn last_sent(mock: &MockTransport) -> SendEventRequest {
        mock.requests()
            .into_iter()
            .rev()
            .find_map(|r| match r {
                Request::SendEvent(request) => Some(request),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn binding_a_screen_issues_no_requests() {
        let (mock, ewmh) = setup();

        assert_eq!(ewmh.root().id(), ROOT);
        assert_eq!(ewmh.screen(), 0);
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn other_screens_can_be_selected() {
        let ewmh = Ewmh::with_transport(MockTransport::new(), Some(1)).unwrap();

        assert_eq!(ewmh.root().id(), ROOT + 1);
        assert!(Ewmh::with_transport(MockTransport::new(), Some(2)).is_err());
    }

    #[test]
    fn client_lists_decode_to_windows_of_the_screen() {
        let (_, ewmh) = setup();
        ewmh.root().set_property32("_NET_CLIENT_LIST", &[CLIENT, CLIENT + 1], AtomEnum::WINDOW).unwrap();

        let clients = ewmh.client_list().unwrap();

        assert_eq!(clients, vec![ewmh.window(CLIENT), ewmh.window(CLIENT + 1)]);
    }

    #[test]
    fn missing_hints_are_not_found() {
        let (mock, ewmh) = setup();
        mock.atom("_NET_CURRENT_DESKTOP");

        let err = ewmh.current_desktop().unwrap_err();

        assert!(matches!(err.ewmh(), Some(EwmhError::PropertyNotFound(_))));
    }

    #[test]
    fn supported_hints_resolve_to_atoms() {
        let (mock, ewmh) = setup();
        let hint = mock.atom("_NET_WM_NAME");
        ewmh.root().set_property32("_NET_SUPPORTED", &[hint], AtomEnum::ATOM).unwrap();

        let supported = ewmh.supported().unwrap();

        assert_eq!(supported.len(), 1);
        assert_eq!(supported[0].name().unwrap(), "_NET_WM_NAME");
    }

    #[test]
    fn scalar_hints_read_the_first_value() {
        let (_, ewmh) = setup();
        let root = ewmh.root();
        root.set_property32("_NET_NUMBER_OF_DESKTOPS", &[4], AtomEnum::CARDINAL).unwrap();
        root.set_property32("_NET_CURRENT_DESKTOP", &[2], AtomEnum::CARDINAL).unwrap();
        root.set_property32("_NET_SHOWING_DESKTOP", &[1], AtomEnum::CARDINAL).unwrap();
        root.set_property32("_NET_DESKTOP_GEOMETRY", &[3840, 2400], AtomEnum::CARDINAL).unwrap();

        assert_eq!(ewmh.number_of_desktops().unwrap(), 4);
        assert_eq!(ewmh.current_desktop().unwrap(), 2);
        assert!(ewmh.showing_desktop().unwrap());
        assert_eq!(ewmh.desktop_geometry().unwrap(), (3840, 2400));
    }

    #[test]
    fn list_hints_are_chunked() {
        let (_, ewmh) = setup();
        let root = ewmh.root();
        root.set_property32("_NET_DESKTOP_VIEWPORT", &[0, 0, 1920, 0], AtomEnum::CARDINAL).unwrap();
        root.set_property32("_NET_WORKAREA", &[0, 24, 1920, 1056, 1920, 24, 1920, 1056], AtomEnum::CARDINAL)
            .unwrap();

        assert_eq!(ewmh.desktop_viewport().unwrap(), vec![(0, 0), (1920, 0)]);
        let workarea = ewmh.workarea().unwrap();
        assert_eq!(workarea.len(), 2);
        assert_eq!(workarea[1], WorkArea { x: 1920, y: 24, width: 1920, height: 1056 });
    }

    #[test]
    fn active_window_none_is_not_an_error() {
        let (_, ewmh) = setup();
        let root = ewmh.root();

        root.set_property32("_NET_ACTIVE_WINDOW", &[0], AtomEnum::WINDOW).unwrap();
        assert_eq!(ewmh.active_window().unwrap(), None);

        root.set_property32("_NET_ACTIVE_WINDOW", &[CLIENT], AtomEnum::WINDOW).unwrap();
        assert_eq!(ewmh.active_window().unwrap(), Some(ewmh.window(CLIENT)));
    }

    #[test]
    fn desktop_names_round_trip_as_a_list() {
        let (mock, ewmh) = setup();

        ewmh.set_desktop_names(["web", "mail", ""]).unwrap();

        assert_eq!(mock.property(ROOT, "_NET_DESKTOP_NAMES").unwrap().value, b"web\0mail\0\0");
        assert_eq!(ewmh.desktop_names().unwrap(), vec!["web", "mail", ""]);
    }

    #[test]
    fn missing_desktop_names_are_an_empty_list() {
        let (mock, ewmh) = setup();
        mock.atom("_NET_DESKTOP_NAMES");

        assert!(ewmh.desktop_names().unwrap().is_empty());
    }

    #[test]
    fn desktop_layouts_are_written_as_properties() {
        let (mock, ewmh) = setup();
        let layout = DesktopLayout { orientation: Orientation::Vert, columns: 2, rows: 2, corner: Corner::TopRight };

        ewmh.set_desktop_layout(&layout).unwrap();

        assert_eq!(ewmh.desktop_layout().unwrap(), layout);
        assert_eq!(mock.count(|r| matches!(r, Request::SendEvent(_))), 0);
    }

    #[test]
    fn desktop_switches_are_requested_with_a_timestamp() {
        let (mock, ewmh) = setup();
        mock.atom("_NET_CURRENT_DESKTOP");

        ewmh.set_current_desktop(3, 1234).unwrap();

        let sent = last_sent(&mock);
        assert_eq!(sent.message.type_, mock.atom("_NET_CURRENT_DESKTOP"));
        assert_eq!(sent.message.window, ROOT);
        assert_eq!(sent.message.data, [3, 1234, 0, 0, 0]);
    }

    #[test]
    fn activation_is_about_the_target_window() {
        let (mock, ewmh) = setup();
        mock.atom("_NET_ACTIVE_WINDOW");
        let requestor = ewmh.window(CLIENT + 1);

        ewmh.set_active_window(&ewmh.window(CLIENT), Source::User, CURRENT_TIME, Some(&requestor)).unwrap();

        let sent = last_sent(&mock);
        assert_eq!(sent.destination, ROOT);
        assert_eq!(sent.message.window, CLIENT);
        assert_eq!(sent.message.data, [2, 0, CLIENT + 1, 0, 0]);
    }

    #[test]
    fn close_requests_put_the_timestamp_first() {
        let (mock, ewmh) = setup();
        mock.atom("_NET_CLOSE_WINDOW");

        ewmh.close_window(&ewmh.window(CLIENT), 99, Source::Application).unwrap();

        let sent = last_sent(&mock);
        assert_eq!(sent.message.window, CLIENT);
        assert_eq!(sent.message.data, [99, 1, 0, 0, 0]);
    }

    #[test]
    fn simple_requests_carry_their_values() {
        let (mock, ewmh) = setup();
        for name in ["_NET_NUMBER_OF_DESKTOPS", "_NET_DESKTOP_GEOMETRY", "_NET_DESKTOP_VIEWPORT", "_NET_SHOWING_DESKTOP"] {
            mock.atom(name);
        }

        ewmh.set_number_of_desktops(6).unwrap();
        assert_eq!(last_sent(&mock).message.data, [6, 0, 0, 0, 0]);
        ewmh.set_desktop_geometry(1024, 768).unwrap();
        assert_eq!(last_sent(&mock).message.data, [1024, 768, 0, 0, 0]);
        ewmh.set_desktop_viewport(1024, 0).unwrap();
        assert_eq!(last_sent(&mock).message.data, [1024, 0, 0, 0, 0]);
        ewmh.set_showing_desktop(true).unwrap();
        assert_eq!(last_sent(&mock).message.data, [1, 0, 0, 0, 0]);
    }

    #[test]
    fn window_names_are_utf8() {
        let (mock, ewmh) = setup();
        let win = ewmh.window(CLIENT);

        win.set_wm_name("Ünïcode").unwrap();

        let stored = mock.property(CLIENT, "_NET_WM_NAME").unwrap();
        assert_eq!(stored.type_, mock.atom("UTF8_STRING"));
        assert_eq!(win.wm_name().unwrap(), "Ünïcode");
    }

    #[test]
    fn window_manager_is_found_through_its_check_window() {
        let (_, ewmh) = setup();
        let check = ewmh.window(CLIENT);
        ewmh.root().set_property32("_NET_SUPPORTING_WM_CHECK", &[CLIENT], AtomEnum::WINDOW).unwrap();
        check.set_wm_name("testwm").unwrap();

        let wm = ewmh.supporting_wm_check().unwrap();

        assert_eq!(wm, check);
        assert_eq!(wm.wm_name().unwrap(), "testwm");
    }
}
