//! Display Module
//!
//! The protocol operations the window manager needs, as a trait, and its
//! implementation on top of an x11rb connection.

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;

use crate::shared::{ClientAttributes, Geometry};
use crate::wm::decorations::FrameStyle;
use crate::wm::keyboard::KeyMap;

/// Window server requests issued by the registry and the event dispatcher.
///
/// Requests are unchecked: an `Err` means the connection itself failed.
/// Protocol errors for individual requests arrive later as `Event::Error`.
pub trait WindowServer {
    /// Root window of the managed screen
    fn root(&self) -> Window;

    /// Screen size in pixels
    fn screen_size(&self) -> (u16, u16);

    /// Block until the next event arrives
    fn wait_for_event(&self) -> Result<Event>;

    fn flush(&self) -> Result<()>;

    fn window_attributes(&self, window: Window) -> Result<ClientAttributes>;

    fn geometry(&self, window: Window) -> Result<Geometry>;

    /// Children of the root window, bottom-most first
    fn top_level_windows(&self) -> Result<Vec<Window>>;

    fn keyboard_mapping(&self) -> Result<KeyMap>;

    /// Create an unmapped frame window on the root
    fn create_frame(&self, geometry: Geometry, style: &FrameStyle) -> Result<Window>;

    fn reparent(&self, window: Window, parent: Window, x: i16, y: i16) -> Result<()>;

    fn map(&self, window: Window) -> Result<()>;

    fn destroy(&self, window: Window) -> Result<()>;

    fn configure(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()>;

    fn set_border_color(&self, window: Window, color: u32) -> Result<()>;

    fn set_input_focus(&self, window: Window) -> Result<()>;

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()>;

    /// Passive grab of `button` + `modifiers` on `window`, freezing the
    /// pointer until [`WindowServer::replay_pointer`] is called
    fn grab_button(&self, window: Window, button: ButtonIndex, modifiers: ModMask) -> Result<()>;

    fn grab_key(&self, window: Window, modifiers: ModMask, keycode: Keycode) -> Result<()>;

    /// Release a frozen pointer and deliver the press to the window under it
    fn replay_pointer(&self) -> Result<()>;
}

/// Live connection to the X server
pub struct X11Display {
    conn: RustConnection,
    root: Window,
    root_depth: u8,
    width: u16,
    height: u16,
}

impl X11Display {
    /// Connect to the X server and take over window management on the
    /// default screen
    pub fn connect(display_name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) =
            RustConnection::connect(display_name).context("Failed to connect to X server")?;

        let screen = &conn.setup().roots[screen_num];
        let root = screen.root;
        let root_depth = screen.root_depth;
        let width = screen.width_in_pixels;
        let height = screen.height_in_pixels;

        info!("Connected to X server, screen {} ({}x{})", screen_num, width, height);

        // Only one client may hold substructure redirect on the root
        let mask = EventMask::SUBSTRUCTURE_REDIRECT | EventMask::BUTTON_PRESS | EventMask::KEY_PRESS;
        conn.change_window_attributes(root, &ChangeWindowAttributesAux::new().event_mask(mask))?
            .check()
            .context("Another window manager is already running")?;

        info!("Registered as window manager");

        Ok(Self {
            conn,
            root,
            root_depth,
            width,
            height,
        })
    }
}

impl WindowServer for X11Display {
    fn root(&self) -> Window {
        self.root
    }

    fn screen_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn wait_for_event(&self) -> Result<Event> {
        self.conn
            .wait_for_event()
            .context("Lost connection to X server")
    }

    fn flush(&self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }

    fn window_attributes(&self, window: Window) -> Result<ClientAttributes> {
        let attrs = self
            .conn
            .get_window_attributes(window)?
            .reply()
            .with_context(|| format!("Failed to get attributes of window 0x{:x}", window))?;

        Ok(ClientAttributes {
            override_redirect: attrs.override_redirect,
            mapped: attrs.map_state != MapState::UNMAPPED,
        })
    }

    fn geometry(&self, window: Window) -> Result<Geometry> {
        let geom = self
            .conn
            .get_geometry(window)?
            .reply()
            .with_context(|| format!("Failed to get geometry of window 0x{:x}", window))?;

        Ok(Geometry::new(
            geom.x as i32,
            geom.y as i32,
            geom.width as u32,
            geom.height as u32,
        ))
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        let tree = self
            .conn
            .query_tree(self.root)?
            .reply()
            .context("Failed to query root window tree")?;
        Ok(tree.children)
    }

    fn keyboard_mapping(&self) -> Result<KeyMap> {
        let setup = self.conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;

        let reply = self
            .conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()
            .context("Failed to get keyboard mapping")?;

        debug!(
            "Keyboard mapping: keycodes {}..={}, {} keysyms per keycode",
            min_keycode, max_keycode, reply.keysyms_per_keycode
        );

        Ok(KeyMap::new(min_keycode, reply.keysyms_per_keycode, reply.keysyms))
    }

    fn create_frame(&self, geometry: Geometry, style: &FrameStyle) -> Result<Window> {
        let frame = self.conn.generate_id()?;

        // Zero-sized windows are a protocol error
        self.conn.create_window(
            self.root_depth,
            frame,
            self.root,
            geometry.x as i16,
            geometry.y as i16,
            geometry.width.max(1) as u16,
            geometry.height.max(1) as u16,
            style.border_width,
            WindowClass::INPUT_OUTPUT,
            0,
            &CreateWindowAux::new()
                .background_pixel(style.background)
                .border_pixel(style.inactive_border),
        )?;

        Ok(frame)
    }

    fn reparent(&self, window: Window, parent: Window, x: i16, y: i16) -> Result<()> {
        self.conn.reparent_window(window, parent, x, y)?;
        Ok(())
    }

    fn map(&self, window: Window) -> Result<()> {
        self.conn.map_window(window)?;
        Ok(())
    }

    fn destroy(&self, window: Window) -> Result<()> {
        self.conn.destroy_window(window)?;
        Ok(())
    }

    fn configure(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        self.conn.configure_window(window, changes)?;
        Ok(())
    }

    fn set_border_color(&self, window: Window, color: u32) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().border_pixel(color),
        )?;
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)?;
        Ok(())
    }

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()> {
        self.conn.change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(mask),
        )?;
        Ok(())
    }

    fn grab_button(&self, window: Window, button: ButtonIndex, modifiers: ModMask) -> Result<()> {
        self.conn.grab_button(
            false,
            window,
            EventMask::BUTTON_PRESS,
            GrabMode::SYNC,
            GrabMode::ASYNC,
            x11rb::NONE,
            x11rb::NONE,
            button,
            modifiers,
        )?;
        Ok(())
    }

    fn grab_key(&self, window: Window, modifiers: ModMask, keycode: Keycode) -> Result<()> {
        self.conn.grab_key(
            true,
            window,
            modifiers,
            keycode,
            GrabMode::ASYNC,
            GrabMode::ASYNC,
        )?;
        Ok(())
    }

    fn replay_pointer(&self) -> Result<()> {
        self.conn.allow_events(Allow::REPLAY_POINTER, x11rb::CURRENT_TIME)?;
        Ok(())
    }
}
