//! Window decorations (frames) for splitwm

use x11rb::protocol::xproto::EventMask;

use crate::config::DecorationConfig;

/// Events a frame wants delivered: clicks for focus, exposure for repaint
pub fn frame_event_mask() -> EventMask {
    EventMask::BUTTON_PRESS | EventMask::EXPOSURE
}

/// Frame appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStyle {
    pub border_width: u16,
    pub active_border: u32,
    pub inactive_border: u32,
    pub background: u32,
}

impl From<&DecorationConfig> for FrameStyle {
    fn from(config: &DecorationConfig) -> Self {
        Self {
            border_width: config.border_width,
            active_border: config.active_border,
            inactive_border: config.inactive_border,
            background: config.background,
        }
    }
}

impl Default for FrameStyle {
    fn default() -> Self {
        Self::from(&DecorationConfig::default())
    }
}
