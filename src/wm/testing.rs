//! In-memory window server for unit tests

use anyhow::{Result, bail};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;

use crate::shared::{ClientAttributes, Geometry};
use crate::wm::decorations::FrameStyle;
use crate::wm::display::WindowServer;
use crate::wm::keyboard::KeyMap;

pub const ROOT: Window = 1;
const FIRST_FRAME_ID: Window = 0x0020_0000;

/// Keycodes of the fake keyboard, one keysym per keycode starting at 8
pub const KEYCODE_F4: Keycode = 8;
pub const KEYCODE_Q: Keycode = 9;
pub const KEYCODE_RETURN: Keycode = 10;
pub const KEYCODE_D: Keycode = 11;
pub const KEYCODE_X: Keycode = 12;

/// A recorded request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateFrame(Window, Geometry),
    Reparent(Window, Window, i16, i16),
    Map(Window),
    Destroy(Window),
    /// Only x/y/width/height of the request, missing fields as 0
    Configure(Window, Geometry),
    SetBorderColor(Window, u32),
    SetInputFocus(Window),
    SelectInput(Window, u32),
    GrabButton(Window, u8, u16),
    GrabKey(Window, u16, Keycode),
    ReplayPointer,
}

pub struct FakeServer {
    width: u16,
    height: u16,
    calls: RefCell<Vec<Call>>,
    events: RefCell<VecDeque<Event>>,
    attributes: RefCell<HashMap<Window, ClientAttributes>>,
    geometries: RefCell<HashMap<Window, Geometry>>,
    placements: RefCell<HashMap<Window, Geometry>>,
    failing_attributes: RefCell<HashSet<Window>>,
    failing_geometry: RefCell<HashSet<Window>>,
    failing_configure: RefCell<HashSet<Window>>,
    failing_focus: RefCell<HashSet<Window>>,
    top_level: RefCell<Vec<Window>>,
    next_id: Cell<Window>,
    flushes: Cell<usize>,
}

impl FakeServer {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            calls: RefCell::new(Vec::new()),
            events: RefCell::new(VecDeque::new()),
            attributes: RefCell::new(HashMap::new()),
            geometries: RefCell::new(HashMap::new()),
            placements: RefCell::new(HashMap::new()),
            failing_attributes: RefCell::new(HashSet::new()),
            failing_geometry: RefCell::new(HashSet::new()),
            failing_configure: RefCell::new(HashSet::new()),
            failing_focus: RefCell::new(HashSet::new()),
            top_level: RefCell::new(Vec::new()),
            next_id: Cell::new(FIRST_FRAME_ID),
            flushes: Cell::new(0),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn push_event(&self, event: Event) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn set_attributes(&self, window: Window, attributes: ClientAttributes) {
        self.attributes.borrow_mut().insert(window, attributes);
    }

    pub fn set_geometry(&self, window: Window, geometry: Geometry) {
        self.geometries.borrow_mut().insert(window, geometry);
    }

    pub fn set_top_level(&self, windows: &[Window]) {
        *self.top_level.borrow_mut() = windows.to_vec();
    }

    pub fn fail_attributes(&self, window: Window) {
        self.failing_attributes.borrow_mut().insert(window);
    }

    pub fn fail_geometry(&self, window: Window) {
        self.failing_geometry.borrow_mut().insert(window);
    }

    pub fn fail_configure(&self, window: Window) {
        self.failing_configure.borrow_mut().insert(window);
    }

    pub fn fail_focus(&self, window: Window) {
        self.failing_focus.borrow_mut().insert(window);
    }

    /// Windows that received a map request, in first-mapped order
    pub fn mapped(&self) -> Vec<Window> {
        let mut mapped = Vec::new();
        for call in self.calls.borrow().iter() {
            if let Call::Map(w) = call {
                if !mapped.contains(w) {
                    mapped.push(*w);
                }
            }
        }
        mapped
    }

    pub fn destroyed(&self) -> Vec<Window> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Destroy(w) => Some(*w),
                _ => None,
            })
            .collect()
    }

    /// Last geometry successfully configured on `window`
    pub fn placement(&self, window: Window) -> Option<Geometry> {
        self.placements.borrow().get(&window).copied()
    }

    pub fn flushes(&self) -> usize {
        self.flushes.get()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }
}

impl WindowServer for FakeServer {
    fn root(&self) -> Window {
        ROOT
    }

    fn screen_size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn wait_for_event(&self) -> Result<Event> {
        match self.events.borrow_mut().pop_front() {
            Some(event) => Ok(event),
            None => bail!("connection closed"),
        }
    }

    fn flush(&self) -> Result<()> {
        self.flushes.set(self.flushes.get() + 1);
        Ok(())
    }

    fn window_attributes(&self, window: Window) -> Result<ClientAttributes> {
        if self.failing_attributes.borrow().contains(&window) {
            bail!("BadWindow 0x{:x}", window);
        }
        Ok(self.attributes.borrow().get(&window).copied().unwrap_or_default())
    }

    fn geometry(&self, window: Window) -> Result<Geometry> {
        if self.failing_geometry.borrow().contains(&window) {
            bail!("BadDrawable 0x{:x}", window);
        }
        Ok(self
            .geometries
            .borrow()
            .get(&window)
            .copied()
            .unwrap_or(Geometry::new(0, 0, 640, 480)))
    }

    fn top_level_windows(&self) -> Result<Vec<Window>> {
        Ok(self.top_level.borrow().clone())
    }

    fn keyboard_mapping(&self) -> Result<KeyMap> {
        // F4, q, Return, d, x
        Ok(KeyMap::new(8, 1, vec![0xFFC1, 0x71, 0xFF0D, 0x64, 0x78]))
    }

    fn create_frame(&self, geometry: Geometry, _style: &FrameStyle) -> Result<Window> {
        let frame = self.next_id.get();
        self.next_id.set(frame + 1);
        self.record(Call::CreateFrame(frame, geometry));
        Ok(frame)
    }

    fn reparent(&self, window: Window, parent: Window, x: i16, y: i16) -> Result<()> {
        self.record(Call::Reparent(window, parent, x, y));
        Ok(())
    }

    fn map(&self, window: Window) -> Result<()> {
        self.record(Call::Map(window));
        Ok(())
    }

    fn destroy(&self, window: Window) -> Result<()> {
        self.record(Call::Destroy(window));
        Ok(())
    }

    fn configure(&self, window: Window, changes: &ConfigureWindowAux) -> Result<()> {
        let geometry = Geometry::new(
            changes.x.unwrap_or(0),
            changes.y.unwrap_or(0),
            changes.width.unwrap_or(0),
            changes.height.unwrap_or(0),
        );
        self.record(Call::Configure(window, geometry));
        if self.failing_configure.borrow().contains(&window) {
            bail!("BadWindow 0x{:x}", window);
        }
        self.placements.borrow_mut().insert(window, geometry);
        Ok(())
    }

    fn set_border_color(&self, window: Window, color: u32) -> Result<()> {
        self.record(Call::SetBorderColor(window, color));
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.record(Call::SetInputFocus(window));
        if self.failing_focus.borrow().contains(&window) {
            bail!("BadMatch focusing 0x{:x}", window);
        }
        Ok(())
    }

    fn select_input(&self, window: Window, mask: EventMask) -> Result<()> {
        self.record(Call::SelectInput(window, u32::from(mask)));
        Ok(())
    }

    fn grab_button(&self, window: Window, button: ButtonIndex, modifiers: ModMask) -> Result<()> {
        self.record(Call::GrabButton(window, u8::from(button), u16::from(modifiers)));
        Ok(())
    }

    fn grab_key(&self, window: Window, modifiers: ModMask, keycode: Keycode) -> Result<()> {
        self.record(Call::GrabKey(window, u16::from(modifiers), keycode));
        Ok(())
    }

    fn replay_pointer(&self) -> Result<()> {
        self.record(Call::ReplayPointer);
        Ok(())
    }
}

pub fn map_request(window: Window) -> Event {
    Event::MapRequest(MapRequestEvent {
        response_type: MAP_REQUEST_EVENT,
        sequence: 0,
        parent: ROOT,
        window,
    })
}

pub fn key_press(keycode: Keycode, state: KeyButMask) -> Event {
    Event::KeyPress(KeyPressEvent {
        response_type: KEY_PRESS_EVENT,
        detail: keycode,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: ROOT,
        child: 0,
        root_x: 0,
        root_y: 0,
        event_x: 0,
        event_y: 0,
        state,
        same_screen: true,
    })
}

pub fn button_press(window: Window) -> Event {
    Event::ButtonPress(ButtonPressEvent {
        response_type: BUTTON_PRESS_EVENT,
        detail: 1,
        sequence: 0,
        time: 0,
        root: ROOT,
        event: window,
        child: 0,
        root_x: 0,
        root_y: 0,
        event_x: 0,
        event_y: 0,
        state: KeyButMask::from(0u16),
        same_screen: true,
    })
}
