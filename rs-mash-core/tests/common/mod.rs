#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rs_mash_core::MashError;
use rs_mash_core::source::{SourceKey, TextSource, TextUnit};

/// In-memory source counting every fetch.
#[derive(Default)]
pub struct FakeSource {
	units: HashMap<String, Vec<TextUnit>>,
	delays: HashMap<String, Duration>,
	failures: Mutex<HashMap<String, usize>>,
	calls: Mutex<HashMap<String, usize>>,
	total_calls: AtomicUsize,
}

impl FakeSource {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_units(mut self, key: &str, units: &[&str]) -> Self {
		self.units.insert(key.to_owned(), units.iter().map(|s| s.to_string()).collect());
		self
	}

	pub fn with_delay(mut self, key: &str, delay: Duration) -> Self {
		self.delays.insert(key.to_owned(), delay);
		self
	}

	/// The next `times` fetches of `key` fail with `SourceUnavailable`.
	pub fn failing(self, key: &str, times: usize) -> Self {
		self.failures.lock().unwrap().insert(key.to_owned(), times);
		self
	}

	pub fn calls(&self, key: &str) -> usize {
		self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
	}

	pub fn total_calls(&self) -> usize {
		self.total_calls.load(Ordering::SeqCst)
	}

	fn record(&self, key: &str) -> bool {
		self.total_calls.fetch_add(1, Ordering::SeqCst);
		*self.calls.lock().unwrap().entry(key.to_owned()).or_insert(0) += 1;

		let mut failures = self.failures.lock().unwrap();
		match failures.get_mut(key) {
			Some(left) if *left > 0 => {
				*left -= 1;
				true
			}
			_ => false,
		}
	}
}

impl TextSource for FakeSource {
	async fn fetch_units(&self, key: &SourceKey, count: usize) -> rs_mash_core::Result<Vec<TextUnit>> {
		let fail = self.record(key.as_str());
		if let Some(delay) = self.delays.get(key.as_str()) {
			tokio::time::sleep(*delay).await;
		}
		if fail {
			return Err(MashError::SourceUnavailable { key: key.to_string(), reason: "boom".into() });
		}
		match self.units.get(key.as_str()) {
			Some(units) => Ok(units.iter().take(count).cloned().collect()),
			None => Err(MashError::SourceNotFound { key: key.to_string() }),
		}
	}
}

pub fn key(name: &str) -> SourceKey {
	SourceKey::new(name).unwrap()
}

pub fn lines(prefix: &str, count: usize) -> Vec<String> {
	(0..count).map(|i| format!("{prefix} {i}")).collect()
}
