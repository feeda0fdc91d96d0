//! Wall-clock helpers shared by the verifier and orchestrator.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch seconds.
pub fn now_ts() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn now_is_after_2020() {
		assert!(now_ts() > 1_577_836_800);
	}
}
