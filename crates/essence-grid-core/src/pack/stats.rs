//! Thread-safe compression statistics with atomic counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters for Gravitas-Pack activity.
///
/// Relaxed ordering throughout; exact consistency is not required for
/// statistical monitoring.
#[derive(Debug, Default)]
pub struct PackStats {
    /// Records compressed.
    pub records_packed: AtomicU64,
    /// Records decompressed.
    pub records_unpacked: AtomicU64,
    /// Raw (JSON-measured) bytes seen by compression.
    pub bytes_raw: AtomicU64,
    /// Packed bytes produced by compression.
    pub bytes_packed: AtomicU64,
}

impl PackStats {
    /// New stats with all counters at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one compression.
    pub fn record_pack(&self, raw: usize, packed: usize) {
        self.records_packed.fetch_add(1, Ordering::Relaxed);
        self.bytes_raw.fetch_add(raw as u64, Ordering::Relaxed);
        self.bytes_packed.fetch_add(packed as u64, Ordering::Relaxed);
    }

    /// Record one decompression.
    pub fn record_unpack(&self) {
        self.records_unpacked.fetch_add(1, Ordering::Relaxed);
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.records_packed.store(0, Ordering::Relaxed);
        self.records_unpacked.store(0, Ordering::Relaxed);
        self.bytes_raw.store(0, Ordering::Relaxed);
        self.bytes_packed.store(0, Ordering::Relaxed);
    }

    /// Point-in-time snapshot.
    pub fn snapshot(&self) -> PackStatsSnapshot {
        let bytes_raw = self.bytes_raw.load(Ordering::Relaxed);
        let bytes_packed = self.bytes_packed.load(Ordering::Relaxed);
        PackStatsSnapshot {
            records_packed: self.records_packed.load(Ordering::Relaxed),
            records_unpacked: self.records_unpacked.load(Ordering::Relaxed),
            bytes_raw,
            bytes_packed,
            bytes_saved: bytes_raw.saturating_sub(bytes_packed),
            average_ratio: if bytes_raw == 0 {
                0.0
            } else {
                1.0 - bytes_packed as f64 / bytes_raw as f64
            },
        }
    }
}

/// Serializable snapshot of [`PackStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackStatsSnapshot {
    /// Records compressed since the last reset.
    pub records_packed: u64,
    /// Records decompressed since the last reset.
    pub records_unpacked: u64,
    /// Raw bytes seen by compression.
    pub bytes_raw: u64,
    /// Packed bytes produced.
    pub bytes_packed: u64,
    /// Raw minus packed bytes.
    pub bytes_saved: u64,
    /// Fractional size reduction in [0, 1).
    pub average_ratio: f64,
}
