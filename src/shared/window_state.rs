//! Window state shared between the registry, the layout engine and the
//! window server seam.

/// Window geometry in root coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// The subset of a client's window attributes the manager acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientAttributes {
    /// Client asked to bypass the window manager (menus, tooltips)
    pub override_redirect: bool,
    /// Window is currently mapped (viewable or unviewable)
    pub mapped: bool,
}
