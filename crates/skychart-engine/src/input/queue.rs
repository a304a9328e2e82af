/// `MouseEvent.button` value of the primary (left) button.
pub const PRIMARY_BUTTON: i16 = 0;

/// Pointer, wheel and toolbar events the chart understands.
/// Positions are canvas pixels relative to the canvas' top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A button went down. Only [`PRIMARY_BUTTON`] starts a drag.
    PointerDown { x: f64, y: f64, button: i16 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    /// The pointer left the canvas. Ends a drag, never clicks.
    PointerLeave,
    /// Wheel scrolled. Positive `delta_y` zooms out.
    Wheel { delta_y: f64 },
    ZoomIn,
    ZoomOut,
    ResetView,
}

/// Events waiting for the next `process_input`.
/// The host pushes from its event handlers; the chart drains in order.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Take every pending event, oldest first.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
