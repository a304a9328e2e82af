pub mod time;
pub mod coords;
pub mod orbit;
pub mod ephemeris;

pub use time::{Instant, TimeSource, SystemClock, ManualClock, MinuteTicker};
pub use coords::{Observer, Equatorial, Horizontal, equatorial_to_horizontal};
pub use ephemeris::{Body, EphemerisError, EphemerisProvider, KeplerEphemeris};
