use tracing::{debug, error, info};
use x11rb::protocol::xproto::{ButtonIndex, ConfigureWindowAux, EventMask, ModMask, Window};

use anyhow::Result;

use crate::shared::Geometry;
use crate::wm::decorations::FrameStyle;
use crate::wm::display::WindowServer;

/// A client window managed by the WM, optionally wrapped in a frame
#[derive(Debug, PartialEq, Eq)]
pub struct DecoratedWindow {
    /// X11 window ID of the client
    client: Window,

    /// Frame window the client is reparented into, once created
    frame: Option<Window>,

    /// Does this window hold the WM's focus?
    focused: bool,
}

impl DecoratedWindow {
    pub fn new(client: Window) -> Self {
        Self {
            client,
            frame: None,
            focused: false,
        }
    }

    pub fn client(&self) -> Window {
        self.client
    }

    pub fn frame(&self) -> Option<Window> {
        self.frame
    }

    pub fn is_decorated(&self) -> bool {
        self.frame.is_some()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Wrap the client in a frame of its current geometry.
    ///
    /// A client whose geometry can't be read stays undecorated for good.
    pub fn create_decoration<S: WindowServer>(&mut self, server: &S, style: &FrameStyle) {
        if self.is_decorated() {
            return;
        }

        let geometry = match server.geometry(self.client) {
            Ok(geometry) => geometry,
            Err(e) => {
                error!("Not decorating window 0x{:x}: {:#}", self.client, e);
                return;
            }
        };

        let frame = match server.create_frame(geometry, style) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to create frame for window 0x{:x}: {:#}", self.client, e);
                return;
            }
        };

        if let Err(e) = server.reparent(self.client, frame, 0, 0) {
            error!("Failed to reparent window 0x{:x}: {:#}", self.client, e);
            // Don't leak a frame that holds nothing
            let _ = server.destroy(frame);
            return;
        }

        debug!("Framed window 0x{:x} in 0x{:x} at {:?}", self.client, frame, geometry);
        self.frame = Some(frame);
    }

    pub fn open<S: WindowServer>(&self, server: &S) -> Result<()> {
        server.map(self.client)?;
        if let Some(frame) = self.frame {
            server.map(frame)?;
        }
        debug!("Mapped window 0x{:x}", self.client);
        Ok(())
    }

    /// Destroy the window. The frame takes the client down with it.
    pub fn close<S: WindowServer>(self, server: &S) -> Result<()> {
        server.destroy(self.frame.unwrap_or(self.client))?;
        info!("Closed window 0x{:x}", self.client);
        Ok(())
    }

    pub fn focus<S: WindowServer>(&mut self, server: &S, style: &FrameStyle) -> Result<()> {
        let Some(frame) = self.frame else {
            return Ok(());
        };

        server.set_input_focus(self.client)?;
        server.set_border_color(frame, style.active_border)?;
        self.focused = true;

        info!("Focused window 0x{:x}", self.client);
        Ok(())
    }

    /// Repaint as inactive. Input focus stays wherever the server has it.
    pub fn unfocus<S: WindowServer>(&mut self, server: &S, style: &FrameStyle) -> Result<()> {
        let Some(frame) = self.frame else {
            return Ok(());
        };

        self.focused = false;
        server.set_border_color(frame, style.inactive_border)
    }

    /// Place the frame at `geometry` and stretch the client to fill it.
    ///
    /// Both requests are always sent; failures are logged independently.
    pub fn move_resize<S: WindowServer>(&self, server: &S, geometry: Geometry) {
        let Some(frame) = self.frame else {
            return;
        };

        let client_changes = ConfigureWindowAux::new()
            .x(0)
            .y(0)
            .width(geometry.width)
            .height(geometry.height);
        if let Err(e) = server.configure(self.client, &client_changes) {
            error!("Failed to resize window 0x{:x}: {:#}", self.client, e);
        }

        let frame_changes = ConfigureWindowAux::new()
            .x(geometry.x)
            .y(geometry.y)
            .width(geometry.width)
            .height(geometry.height);
        if let Err(e) = server.configure(frame, &frame_changes) {
            error!("Failed to move frame 0x{:x}: {:#}", frame, e);
        }

        info!(
            "Moved window 0x{:x} to [{},{}] size {}x{}",
            self.client, geometry.x, geometry.y, geometry.width, geometry.height
        );
    }

    /// Select `mask` on the frame and grab plain left clicks on it, so a
    /// click anywhere in the window reaches the WM first.
    pub fn set_event_mask<S: WindowServer>(&self, server: &S, mask: EventMask) -> Result<()> {
        let Some(frame) = self.frame else {
            return Ok(());
        };

        server.select_input(frame, mask)?;
        server.grab_button(frame, ButtonIndex::M1, ModMask::from(0u16))?;

        debug!("Set event mask 0x{:x} on frame 0x{:x}", u32::from(mask), frame);
        Ok(())
    }
}
