//! Time handling: the chart's notion of "now", sidereal time, and the
//! minute-granularity ticker that drives recompute.
//!
//! The chart never reads the system clock directly. It asks a [`TimeSource`],
//! so tests can step time deterministically.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Julian day of the J2000.0 epoch (2000-01-01 12:00 TT).
pub const J2000_JD: f64 = 2451545.0;
/// Julian day of the Unix epoch.
const UNIX_EPOCH_JD: f64 = 2440587.5;
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36525.0;
const SECONDS_PER_DAY: f64 = 86400.0;

/// Default recompute cadence.
pub const TICK_CADENCE_SECS: i64 = 60;

/// A UTC instant. Opaque to everything except the ephemeris math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(DateTime<Utc>);

impl Instant {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    /// Build an instant from a calendar date and time (UTC).
    /// Returns `None` for invalid dates.
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Julian day (UT).
    pub fn julian_day(&self) -> f64 {
        let ms = self.0.timestamp_millis() as f64;
        UNIX_EPOCH_JD + ms / (1000.0 * SECONDS_PER_DAY)
    }

    /// Days elapsed since J2000.0 (negative before).
    pub fn days_since_j2000(&self) -> f64 {
        self.julian_day() - J2000_JD
    }

    /// Julian centuries since J2000.0.
    pub fn centuries_since_j2000(&self) -> f64 {
        self.days_since_j2000() / DAYS_PER_JULIAN_CENTURY
    }

    /// Greenwich mean sidereal time in degrees, 0..360.
    pub fn gmst_degrees(&self) -> f64 {
        let d = self.days_since_j2000();
        let t = d / DAYS_PER_JULIAN_CENTURY;
        let gmst = 280.46061837 + 360.98564736629 * d + 0.000387933 * t * t - t * t * t / 38710000.0;
        gmst.rem_euclid(360.0)
    }

    /// Local mean sidereal time in degrees for an east-positive longitude.
    pub fn local_sidereal_degrees(&self, longitude_deg: f64) -> f64 {
        (self.gmst_degrees() + longitude_deg).rem_euclid(360.0)
    }

    /// Shift by a signed duration.
    pub fn offset_by(&self, delta: Duration) -> Self {
        Self(self.0 + delta)
    }

    /// `HH:MM` in the given offset from UTC.
    pub fn format_hhmm(&self, utc_offset_minutes: i32) -> String {
        let shifted = self.0 + Duration::minutes(utc_offset_minutes as i64);
        shifted.format("%H:%M").to_string()
    }
}

impl From<DateTime<Utc>> for Instant {
    fn from(time: DateTime<Utc>) -> Self {
        Self(time)
    }
}

// ── Time sources ─────────────────────────────────────────────────────

/// Where the chart gets "now" from.
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// Reads the real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Instant {
        Instant(Utc::now())
    }
}

/// A clock that only moves when told to. Share it through an `Rc` to keep
/// stepping it after handing it to a chart.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn set(&self, instant: Instant) {
        self.now.set(instant);
    }

    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get().offset_by(delta));
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Rc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

// ── Minute ticker ────────────────────────────────────────────────────

/// Repeating timer polled by the host loop.
/// Fires on the first poll, then whenever a full cadence has elapsed.
pub struct MinuteTicker {
    cadence: Duration,
    last: Option<Instant>,
    active: bool,
}

impl MinuteTicker {
    pub fn new() -> Self {
        Self::with_cadence(Duration::seconds(TICK_CADENCE_SECS))
    }

    pub fn with_cadence(cadence: Duration) -> Self {
        Self {
            cadence,
            last: None,
            active: true,
        }
    }

    /// Returns `Some(now)` when the ticker fires.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        if !self.active {
            return None;
        }
        let due = match self.last {
            None => true,
            // A clock that jumped backwards also counts as due.
            Some(last) => now < last || now.datetime() - last.datetime() >= self.cadence,
        };
        if due {
            self.last = Some(now);
            Some(now)
        } else {
            None
        }
    }

    /// Stop firing. There is nothing in flight to cancel.
    pub fn stop(&mut self) {
        self.active = false;
        self.last = None;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Default for MinuteTicker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> Instant {
        Instant::from_ymd_hms(2024, 3, 20, h, m, s).unwrap()
    }

    #[test]
    fn julian_day_of_j2000() {
        let epoch = Instant::from_ymd_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((epoch.julian_day() - J2000_JD).abs() < 1e-9);
        assert!(epoch.days_since_j2000().abs() < 1e-9);
    }

    #[test]
    fn gmst_at_j2000() {
        let epoch = Instant::from_ymd_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((epoch.gmst_degrees() - 280.46061837).abs() < 1e-6);
    }

    #[test]
    fn gmst_advances_one_sidereal_day_per_solar_day() {
        let a = t(0, 0, 0);
        let b = a.offset_by(Duration::days(1));
        let diff = (b.gmst_degrees() - a.gmst_degrees()).rem_euclid(360.0);
        // ~0.9856 degrees gained per solar day
        assert!((diff - 0.98565).abs() < 1e-3, "diff = {diff}");
    }

    #[test]
    fn local_sidereal_wraps() {
        let a = t(0, 0, 0);
        let lst = a.local_sidereal_degrees(-179.0);
        assert!((0.0..360.0).contains(&lst));
    }

    #[test]
    fn format_hhmm_applies_offset() {
        let a = t(23, 30, 0);
        assert_eq!(a.format_hhmm(0), "23:30");
        assert_eq!(a.format_hhmm(60), "00:30");
        assert_eq!(a.format_hhmm(-90), "22:00");
    }

    #[test]
    fn manual_clock_steps() {
        let clock = Rc::new(ManualClock::new(t(10, 0, 0)));
        let shared: Rc<ManualClock> = Rc::clone(&clock);
        clock.advance(Duration::minutes(5));
        assert_eq!(shared.now(), t(10, 5, 0));
    }

    #[test]
    fn ticker_fires_immediately_then_per_minute() {
        let mut ticker = MinuteTicker::new();
        assert_eq!(ticker.poll(t(10, 0, 0)), Some(t(10, 0, 0)));
        assert_eq!(ticker.poll(t(10, 0, 30)), None);
        assert_eq!(ticker.poll(t(10, 0, 59)), None);
        assert_eq!(ticker.poll(t(10, 1, 0)), Some(t(10, 1, 0)));
        assert_eq!(ticker.poll(t(10, 1, 1)), None);
    }

    #[test]
    fn ticker_fires_when_clock_goes_backwards() {
        let mut ticker = MinuteTicker::new();
        ticker.poll(t(10, 0, 0));
        assert!(ticker.poll(t(9, 0, 0)).is_some());
    }

    #[test]
    fn stopped_ticker_never_fires() {
        let mut ticker = MinuteTicker::new();
        ticker.poll(t(10, 0, 0));
        ticker.stop();
        assert!(!ticker.is_active());
        assert_eq!(ticker.poll(t(11, 0, 0)), None);
    }
}
