pub mod transform;

pub use transform::{ViewTransform, ZOOM_MIN, ZOOM_MAX, PAN_LIMIT, WHEEL_ZOOM_STEP, BUTTON_ZOOM_STEP};
