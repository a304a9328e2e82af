pub mod queue;
pub mod controller;

pub use queue::{InputEvent, InputQueue, PRIMARY_BUTTON};
pub use controller::{hit_test, InputOutcome, InteractionController, DRAG_THRESHOLD, HIT_RADIUS};
