//! Window Manager Module
//!
//! Owns the window registry and runs the event loop: one event is read,
//! dispatched to its handler, and fully handled before the next one.

pub mod client;
pub mod decorations;
pub mod display;
pub mod events;
pub mod keyboard;
pub mod placement;
pub mod registry;

#[cfg(test)]
pub mod testing;

use anyhow::{Context, Result};
use tracing::{debug, error, info, trace};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;

use crate::config::{AppsConfig, Config};
use crate::launcher::{Launch, ProcessLauncher};
use decorations::FrameStyle;
use display::WindowServer;
use events::{EventResult, LogProtocolErrors, ProtocolErrorHandler};
use keyboard::{KeyBindings, KeyMap, KeyboardAction};
use registry::Registry;

pub struct WindowManager<S: WindowServer> {
    server: S,
    registry: Registry,
    bindings: KeyBindings,
    keymap: KeyMap,
    apps: AppsConfig,
    launcher: Box<dyn Launch>,
    errors: Box<dyn ProtocolErrorHandler>,
}

impl<S: WindowServer> WindowManager<S> {
    /// Create a window manager on top of `server`
    pub fn new(server: S, config: &Config) -> Result<Self> {
        let bindings = KeyBindings::from_config(&config.keybindings)
            .context("Invalid key binding configuration")?;
        let keymap = server.keyboard_mapping()?;

        Ok(Self {
            server,
            registry: Registry::new(FrameStyle::from(&config.decorations)),
            bindings,
            keymap,
            apps: config.apps.clone(),
            launcher: Box::new(ProcessLauncher),
            errors: Box::new(LogProtocolErrors),
        })
    }

    #[cfg(test)]
    pub fn with_launcher(mut self, launcher: Box<dyn Launch>) -> Self {
        self.launcher = launcher;
        self
    }

    #[cfg(test)]
    pub fn with_error_handler(mut self, errors: Box<dyn ProtocolErrorHandler>) -> Self {
        self.errors = errors;
        self
    }

    #[cfg(test)]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Grab the bound keys and adopt windows that are already on screen
    pub fn setup(&mut self) -> Result<()> {
        self.grab_keys()?;
        self.manage_existing()?;
        self.server.flush()
    }

    /// Run the event loop until the user shuts the window manager down.
    ///
    /// Handler failures are logged and never end the loop; only losing the
    /// server connection does.
    pub fn run(&mut self) -> Result<()> {
        info!("Entering event loop");
        loop {
            let event = self.server.wait_for_event()?;

            match self.handle_event(event) {
                Ok(EventResult::Continue) => {}
                Ok(EventResult::Shutdown) => {
                    self.server.flush()?;
                    info!("Event loop finished");
                    return Ok(());
                }
                Err(e) => error!("Event handler failed: {:#}", e),
            }

            self.server.flush()?;
        }
    }

    /// Dispatch a single event
    pub fn handle_event(&mut self, event: Event) -> Result<EventResult> {
        match event {
            Event::MapRequest(e) => self.on_map_request(e.window)?,
            Event::ConfigureRequest(e) => self.on_configure_request(&e)?,
            Event::KeyPress(e) => return self.on_key_press(&e),
            Event::ButtonPress(e) => self.on_button_press(&e)?,
            Event::Error(e) => self.errors.report(&e),
            other => trace!("Ignoring event {:?}", other),
        }
        Ok(EventResult::Continue)
    }

    fn on_map_request(&mut self, window: Window) -> Result<()> {
        debug!("MapRequest for window 0x{:x}", window);

        let attrs = match self.server.window_attributes(window) {
            Ok(attrs) => attrs,
            Err(e) => {
                error!("Dropping map request: {:#}", e);
                return Ok(());
            }
        };

        if attrs.override_redirect {
            debug!("Mapping override-redirect window 0x{:x} unmanaged", window);
            return self.server.map(window);
        }

        self.registry.register_and_frame(&self.server, window)
    }

    /// Clients get exactly the geometry and stacking they ask for
    fn on_configure_request(&mut self, e: &ConfigureRequestEvent) -> Result<()> {
        debug!(
            "ConfigureRequest for window 0x{:x}: [{},{}] {}x{}",
            e.window, e.x, e.y, e.width, e.height
        );
        let aux = ConfigureWindowAux::from_configure_request(e);
        self.server.configure(e.window, &aux)
    }

    fn on_key_press(&mut self, e: &KeyPressEvent) -> Result<EventResult> {
        let Some(keysym) = self.keymap.keysym(e.detail) else {
            return Ok(EventResult::Continue);
        };
        debug!(
            "KeyPress: keycode={}, keysym=0x{:x}, state=0x{:x}",
            e.detail,
            keysym,
            u16::from(e.state)
        );

        let Some(action) = self.bindings.resolve(keysym, e.state) else {
            return Ok(EventResult::Continue);
        };

        match action {
            KeyboardAction::CloseManager => {
                info!("Shutting down window manager");
                self.registry.shutdown_all(&self.server);
                return Ok(EventResult::Shutdown);
            }
            KeyboardAction::CloseWindow => {
                if self.registry.focused().is_some() {
                    self.registry.close_focused(&self.server)?;
                } else {
                    debug!("No focused window to close");
                }
            }
            KeyboardAction::OpenTerminal => self.launcher.spawn(&self.apps.terminal),
            KeyboardAction::OpenLauncher => self.launcher.spawn(&self.apps.launcher),
        }

        Ok(EventResult::Continue)
    }

    fn on_button_press(&mut self, e: &ButtonPressEvent) -> Result<()> {
        if e.event == self.server.root() {
            return Ok(());
        }

        debug!("ButtonPress on window 0x{:x}", e.event);
        let focused = self.registry.focus_by_click_target(&self.server, e.event);

        // The frame grab froze the pointer; let the client see the click
        self.server.replay_pointer()?;
        focused.map(|_| ())
    }

    fn grab_keys(&self) -> Result<()> {
        let root = self.server.root();
        let modifier = self.bindings.modifier();

        for keysym in self.bindings.keysyms() {
            let keycodes = self.keymap.keycodes(keysym);
            if keycodes.is_empty() {
                error!("No keycode produces keysym 0x{:x}, binding unavailable", keysym);
            }
            for keycode in keycodes {
                self.server.grab_key(root, modifier, keycode)?;
            }
        }

        info!("Key bindings grabbed with modifier 0x{:x}", u16::from(modifier));
        Ok(())
    }

    fn manage_existing(&mut self) -> Result<()> {
        for window in self.server.top_level_windows()? {
            match self.server.window_attributes(window) {
                Ok(attrs) if attrs.mapped && !attrs.override_redirect => {
                    debug!("Adopting existing window 0x{:x}", window);
                    self.registry.register_and_frame(&self.server, window)?;
                }
                Ok(_) => {}
                Err(e) => debug!("Skipping window 0x{:x}: {:#}", window, e),
            }
        }
        Ok(())
    }
}
