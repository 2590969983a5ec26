//! Stats fingerprinting for cache invalidation
//!
//! A fingerprint is a SHA-256 digest over exactly the snapshot fields that
//! feed the AI prompts: income, expense, savings, category breakdown, and
//! monthly trend. Volatile fields (recent transactions, month comparison)
//! are excluded so they cannot thrash the cache.
//!
//! The serialization is canonical: categories are sorted by name and
//! numbers are written in their shortest decimal form, so `5` and `5.0`
//! and any breakdown insertion order all hash identically.

use sha2::{Digest, Sha256};

use crate::models::StatsSnapshot;

/// Write a float in shortest-form decimal ("5", "5.5", "0.25")
fn push_amount(out: &mut String, value: f64) {
    // f64 Display already drops a trailing ".0"
    out.push_str(&format!("{}", value));
}

/// Compute the fingerprint of the AI-relevant subset of a snapshot
pub fn stats_fingerprint(stats: &StatsSnapshot) -> String {
    let mut canonical = String::new();

    canonical.push_str("income=");
    push_amount(&mut canonical, stats.income);
    canonical.push_str("|expense=");
    push_amount(&mut canonical, stats.expense);
    canonical.push_str("|savings=");
    push_amount(&mut canonical, stats.savings);

    // Stable key ordering regardless of how the breakdown was assembled
    let mut categories: Vec<_> = stats
        .category_breakdown
        .iter()
        .map(|c| (c.name.as_str(), c.value))
        .collect();
    categories.sort_by(|a, b| a.0.cmp(b.0));

    canonical.push_str("|categories=");
    for (name, value) in categories {
        canonical.push_str(name);
        canonical.push(':');
        push_amount(&mut canonical, value);
        canonical.push(',');
    }

    // Trend is already chronological; its order is part of the data
    canonical.push_str("|trend=");
    for point in &stats.monthly_trend {
        canonical.push_str(&point.name);
        canonical.push(':');
        push_amount(&mut canonical, point.expense);
        canonical.push(',');
    }

    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(digest)
}

/// Derive the cache key for a (user, endpoint, fingerprint) triple
///
/// Pure function of its inputs; any storage backend can use the result as a
/// plain lookup key.
pub fn cache_key(user_id: i64, endpoint: &str, stats_hash: &str) -> String {
    format!("{}_{}_{}", user_id, endpoint, stats_hash)
}
