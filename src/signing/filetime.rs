//! Windows FILETIME conversions (100 ns ticks since 1601-01-01 UTC).

// self
use crate::_prelude::*;

/// Ticks between 1601-01-01 and the Unix epoch.
pub const UNIX_EPOCH_TICKS: u64 = 116_444_736_000_000_000;

const NANOS_PER_TICK: i128 = 100;

/// Converts `instant` into FILETIME ticks, clamping instants before 1601 to zero.
pub fn to_filetime(instant: OffsetDateTime) -> u64 {
	let ticks = instant.unix_timestamp_nanos() / NANOS_PER_TICK + i128::from(UNIX_EPOCH_TICKS);

	u64::try_from(ticks.max(0)).unwrap_or(u64::MAX)
}

/// Converts FILETIME ticks back into a UTC instant.
pub fn from_filetime(ticks: u64) -> Result<OffsetDateTime, time::error::ComponentRange> {
	let nanos = (i128::from(ticks) - i128::from(UNIX_EPOCH_TICKS)) * NANOS_PER_TICK;

	OffsetDateTime::from_unix_timestamp_nanos(nanos)
}
