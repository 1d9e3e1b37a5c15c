//! Keyboard Module
//!
//! Keysym lookup against the server's keyboard mapping and the modifier-gated
//! key bindings of the window manager.

use thiserror::Error;
use tracing::debug;
use x11rb::protocol::xproto::{KeyButMask, Keycode, Keysym, ModMask};

use crate::config::KeybindingsConfig;

// Keysym constants from X11/keysymdef.h
const XK_BACKSPACE: Keysym = 0xFF08;
const XK_TAB: Keysym = 0xFF09;
const XK_RETURN: Keysym = 0xFF0D;
const XK_ESCAPE: Keysym = 0xFF1B;
const XK_DELETE: Keysym = 0xFFFF;
const XK_F1: Keysym = 0xFFBE;
const XK_SPACE: Keysym = 0x0020;

/// Logical action bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyboardAction {
    /// Close every managed window and leave the event loop
    CloseManager,
    /// Close the focused window
    CloseWindow,
    /// Spawn the configured terminal
    OpenTerminal,
    /// Spawn the configured application launcher
    OpenLauncher,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindingError {
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    #[error("unknown modifier '{0}'")]
    UnknownModifier(String),
}

/// Translate a key name from the config file into a keysym
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    match name {
        "Return" | "Enter" => return Some(XK_RETURN),
        "Tab" => return Some(XK_TAB),
        "Escape" => return Some(XK_ESCAPE),
        "space" => return Some(XK_SPACE),
        "BackSpace" => return Some(XK_BACKSPACE),
        "Delete" => return Some(XK_DELETE),
        _ => {}
    }

    if let Some(n) = name.strip_prefix('F') {
        if let Ok(n) = n.parse::<u32>() {
            if (1..=12).contains(&n) {
                return Some(XK_F1 + n - 1);
            }
        }
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        // Latin-1 keysyms equal their code points; letters resolve to the
        // unshifted (lowercase) symbol like column 0 of the mapping does
        (Some(c), None) if c.is_ascii_alphanumeric() => {
            Some(c.to_ascii_lowercase() as Keysym)
        }
        _ => None,
    }
}

/// Translate a modifier name from the config file into a modifier mask
pub fn modifier_from_name(name: &str) -> Option<ModMask> {
    match name {
        "Super" | "Mod4" => Some(ModMask::M4),
        "Alt" | "Mod1" => Some(ModMask::M1),
        "Control" | "Ctrl" => Some(ModMask::CONTROL),
        "Shift" => Some(ModMask::SHIFT),
        _ => None,
    }
}

/// Snapshot of the server's keycode to keysym table
#[derive(Debug, Clone, Default)]
pub struct KeyMap {
    min_keycode: Keycode,
    keysyms_per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl KeyMap {
    pub fn new(min_keycode: Keycode, keysyms_per_keycode: u8, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode: keysyms_per_keycode as usize,
            keysyms,
        }
    }

    /// First-column keysym of a keycode (no shift level applied)
    pub fn keysym(&self, keycode: Keycode) -> Option<Keysym> {
        if keycode < self.min_keycode || self.keysyms_per_keycode == 0 {
            return None;
        }
        let idx = (keycode - self.min_keycode) as usize * self.keysyms_per_keycode;
        self.keysyms.get(idx).copied().filter(|&sym| sym != 0)
    }

    /// Every keycode that produces `keysym` in any column
    pub fn keycodes(&self, keysym: Keysym) -> Vec<Keycode> {
        if self.keysyms_per_keycode == 0 {
            return Vec::new();
        }
        self.keysyms
            .chunks(self.keysyms_per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.contains(&keysym))
            .filter_map(|(i, _)| Keycode::try_from(i + self.min_keycode as usize).ok())
            .collect()
    }
}

/// Modifier-gated key bindings
#[derive(Debug, Clone)]
pub struct KeyBindings {
    modifier: ModMask,
    bindings: Vec<(Keysym, KeyboardAction)>,
}

impl KeyBindings {
    pub fn from_config(config: &KeybindingsConfig) -> Result<Self, BindingError> {
        let modifier = modifier_from_name(&config.modifier)
            .ok_or_else(|| BindingError::UnknownModifier(config.modifier.clone()))?;

        let entries = [
            (&config.close_manager, KeyboardAction::CloseManager),
            (&config.close_window, KeyboardAction::CloseWindow),
            (&config.open_terminal, KeyboardAction::OpenTerminal),
            (&config.open_launcher, KeyboardAction::OpenLauncher),
        ];

        let mut bindings = Vec::with_capacity(entries.len());
        for (name, action) in entries {
            let keysym =
                keysym_from_name(name).ok_or_else(|| BindingError::UnknownKey(name.clone()))?;
            debug!("Binding {:?} to keysym 0x{:x}", action, keysym);
            bindings.push((keysym, action));
        }

        Ok(Self { modifier, bindings })
    }

    /// The single modifier every binding requires
    pub fn modifier(&self) -> ModMask {
        self.modifier
    }

    pub fn keysyms(&self) -> impl Iterator<Item = Keysym> + '_ {
        self.bindings.iter().map(|(sym, _)| *sym)
    }

    /// Resolve a key press, ignoring it unless the modifier is held
    pub fn resolve(&self, keysym: Keysym, state: KeyButMask) -> Option<KeyboardAction> {
        if u16::from(state) & u16::from(self.modifier) == 0 {
            return None;
        }
        self.bindings
            .iter()
            .find(|(sym, _)| *sym == keysym)
            .map(|(_, action)| *action)
    }
}
