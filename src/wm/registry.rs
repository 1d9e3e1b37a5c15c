//! Registry Module
//!
//! The ordered list of managed windows and the focus tracker. Insertion order
//! is tiling order, and at most one window holds focus.

use anyhow::Result;
use tracing::{debug, error, info};
use x11rb::protocol::xproto::Window;

use crate::wm::client::DecoratedWindow;
use crate::wm::decorations::{FrameStyle, frame_event_mask};
use crate::wm::display::WindowServer;
use crate::wm::placement;

pub struct Registry {
    windows: Vec<DecoratedWindow>,
    focused: Option<usize>,
    style: FrameStyle,
}

impl Registry {
    pub fn new(style: FrameStyle) -> Self {
        Self {
            windows: Vec::new(),
            focused: None,
            style,
        }
    }

    #[cfg(test)]
    pub fn windows(&self) -> &[DecoratedWindow] {
        &self.windows
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    #[cfg(test)]
    pub fn focused_index(&self) -> Option<usize> {
        self.focused
    }

    pub fn focused(&self) -> Option<&DecoratedWindow> {
        self.focused.map(|i| &self.windows[i])
    }

    pub fn contains(&self, client: Window) -> bool {
        self.windows.iter().any(|w| w.client() == client)
    }

    /// Start managing `client`: frame it, map it, focus it and re-tile.
    pub fn register_and_frame<S: WindowServer>(&mut self, server: &S, client: Window) -> Result<()> {
        if self.contains(client) {
            debug!("Window 0x{:x} is already managed, mapping again", client);
            return self
                .windows
                .iter()
                .find(|w| w.client() == client)
                .map_or(Ok(()), |w| w.open(server));
        }

        let mut window = DecoratedWindow::new(client);
        window.create_decoration(server, &self.style);
        window.open(server)?;
        window.set_event_mask(server, frame_event_mask())?;

        self.windows.push(window);
        info!("Managing window 0x{:x} ({} total)", client, self.windows.len());

        let newest = self.windows.len() - 1;
        let focused = self.focus_index(server, newest);
        self.tile(server);
        focused
    }

    /// Focus the window whose frame is `target`. Clicks on anything else
    /// are ignored.
    pub fn focus_by_click_target<S: WindowServer>(&mut self, server: &S, target: Window) -> Result<bool> {
        let Some(index) = self.windows.iter().position(|w| w.frame() == Some(target)) else {
            debug!("Ignored click on non-managed window 0x{:x}", target);
            return Ok(false);
        };

        self.focus_index(server, index)?;
        Ok(true)
    }

    /// Close the focused window, if any. Focus is not handed to another
    /// window afterwards.
    pub fn close_focused<S: WindowServer>(&mut self, server: &S) -> Result<bool> {
        let Some(index) = self.focused.take() else {
            return Ok(false);
        };

        let window = self.windows.remove(index);
        info!("Closing focused window 0x{:x}", window.client());

        let closed = window.close(server);
        self.tile(server);
        closed.map(|_| true)
    }

    /// Close every managed window in order. Used on shutdown.
    pub fn shutdown_all<S: WindowServer>(&mut self, server: &S) {
        self.focused = None;
        for window in self.windows.drain(..) {
            let client = window.client();
            if let Err(e) = window.close(server) {
                error!("Failed to close window 0x{:x}: {:#}", client, e);
            }
        }
    }

    /// Lay out every managed window over the full screen
    pub fn tile<S: WindowServer>(&self, server: &S) {
        let (width, height) = server.screen_size();
        let tiles = placement::split_vertical(self.windows.len(), width as u32, height as u32);

        for (window, geometry) in self.windows.iter().zip(tiles) {
            window.move_resize(server, geometry);
        }
    }

    fn focus_index<S: WindowServer>(&mut self, server: &S, index: usize) -> Result<()> {
        if let Some(previous) = self.focused.take() {
            self.windows[previous].unfocus(server, &self.style)?;
        }

        let window = &mut self.windows[index];
        window.focus(server, &self.style)?;

        // Undecorated windows can't take focus
        if window.is_focused() {
            self.focused = Some(index);
        }
        Ok(())
    }
}
