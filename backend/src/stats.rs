//! Pure aggregation arithmetic over per-subject digest counts.
//!
//! The store produces raw (digest, count) rows; everything derived from them
//! (totals, shares, canonical match lookup) lives here so no rounding or
//! display policy leaks into the store or the verifier.

use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct SubjectSummary {
    counts: HashMap<String, u64>,
    total: u64,
}

impl SubjectSummary {
    pub fn from_rows(rows: Vec<(String, u64)>) -> Self {
        let mut counts = HashMap::with_capacity(rows.len());
        let mut total = 0u64;
        for (digest_hex, count) in rows {
            total += count;
            counts.insert(digest_hex, count);
        }
        Self { counts, total }
    }

    pub fn counts(&self) -> &HashMap<String, u64> {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, digest_hex: &str) -> u64 {
        self.counts.get(digest_hex).copied().unwrap_or(0)
    }

    /// Fraction of submissions matching `digest_hex`.
    ///
    /// `None` when the subject has no submissions at all; a zero-submission
    /// subject has no share, not a 0% one.
    pub fn share(&self, digest_hex: &str) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.count(digest_hex) as f64 / self.total as f64)
        }
    }

    /// Count of submissions matching the subject's canonical digest.
    ///
    /// Digest equality is plain string equality: all digests flow through the
    /// same compressed-Fr hex encoding.
    pub fn canonical_count(&self, canonical_digest_hex: &str) -> u64 {
        self.count(canonical_digest_hex)
    }
}

/// Deterministic palette entry for a digest, for presentation layers that
/// want stable chart colors across reloads.
pub fn palette_color(digest_hex: &str) -> &'static str {
    const PALETTE: [&str; 8] = [
        "#059669", "#2563eb", "#d97706", "#dc2626",
        "#7c3aed", "#0891b2", "#be185d", "#4b5563",
    ];

    let mut acc = 0usize;
    for b in digest_hex.bytes() {
        acc = acc.wrapping_mul(31).wrapping_add(b as usize);
    }
    PALETTE[acc % PALETTE.len()]
}
