use chrono::{FixedOffset, Offset, Utc};
use std::fmt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};

/// A time formatter that outputs timestamps at a fixed UTC offset.
///
/// The portal publishes grades on its local clock, so logs are easier to line
/// up with it when they use the same offset.
///
/// # Format
/// The output format is: `YYYY-MM-DDThh:mm:ss.sss-05:00`
///
/// # Example
/// ```
/// use gradewatch::telemetry::FixedOffsetTime;
/// use tracing_subscriber::fmt::time::FormatTime;
///
/// let formatter = FixedOffsetTime::from_hours(-5);
/// // Will output something like: 2024-02-14T15:30:45.123-05:00
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FixedOffsetTime {
    offset: FixedOffset,
}

impl FixedOffsetTime {
    /// Out-of-range offsets (beyond ±23 hours) fall back to UTC.
    pub fn from_hours(hours: i32) -> Self {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix());
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl FormatTime for FixedOffsetTime {
    fn format_time(&self, w: &mut Writer<'_>) -> Result<(), fmt::Error> {
        let now = Utc::now().with_timezone(&self.offset);
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Installs the global fmt subscriber. `RUST_LOG` overrides `default_filter`.
pub fn init_subscriber(default_filter: &str, utc_offset_hours: i32) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(FixedOffsetTime::from_hours(utc_offset_hours))
        .with_target(false)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();
}
