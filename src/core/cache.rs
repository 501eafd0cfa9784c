//! Bounded cache of the owner's recent messages.
//!
//! Entries are kept newest first by Slack timestamp. The cache is shared
//! between concurrently running event handlers, so every operation takes the
//! lock for its whole duration and never awaits while holding it.

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::models::CachedMessage;

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// What `insert` does when `(channel, ts)` is already cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Store the new copy alongside the old one.
    #[default]
    Keep,
    /// Drop the old copy first.
    Replace,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(DuplicatePolicy::Keep),
            "replace" => Ok(DuplicatePolicy::Replace),
            other => Err(format!("unknown duplicate policy '{other}'")),
        }
    }
}

pub struct MessageCache {
    capacity: usize,
    duplicates: DuplicatePolicy,
    entries: Mutex<Vec<CachedMessage>>,
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DuplicatePolicy::Keep)
    }
}

impl MessageCache {
    #[must_use]
    pub fn new(capacity: usize, duplicates: DuplicatePolicy) -> Self {
        Self {
            capacity,
            duplicates,
            entries: Mutex::new(Vec::with_capacity(capacity + 1)),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn entries(&self) -> MutexGuard<'_, Vec<CachedMessage>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a message, keeping newest-first order and evicting the oldest
    /// entry once the cache is over capacity.
    pub fn insert(&self, message: CachedMessage) {
        let mut entries = self.entries();

        if self.duplicates == DuplicatePolicy::Replace {
            entries.retain(|m| !(m.channel == message.channel && m.ts == message.ts));
        }

        entries.insert(0, message);
        entries.sort_by(|a, b| compare_ts(&b.ts, &a.ts));

        while entries.len() > self.capacity {
            if let Some(evicted) = entries.pop() {
                debug!(channel = %evicted.channel, ts = %evicted.ts, "Evicted oldest cached message");
            }
        }
    }

    /// Removes the first entry for `(channel, ts)`. Unknown pairs are ignored.
    pub fn remove(&self, channel: &str, ts: &str) {
        let mut entries = self.entries();
        if let Some(index) = entries
            .iter()
            .position(|m| m.channel == channel && m.ts == ts)
        {
            entries.remove(index);
        }
    }

    /// Snapshot of the entries for `channel` in the given thread scope, newest
    /// first. `None` matches top-level messages only.
    #[must_use]
    pub fn query(&self, channel: &str, thread_ts: Option<&str>) -> Vec<CachedMessage> {
        self.entries()
            .iter()
            .filter(|m| m.channel == channel && m.thread_ts.as_deref() == thread_ts)
            .cloned()
            .collect()
    }

    /// Replaces the stored content of `(channel, ts)`, if it is still cached.
    pub fn refresh(&self, updated: &CachedMessage) -> bool {
        let mut entries = self.entries();
        match entries
            .iter_mut()
            .find(|m| m.channel == updated.channel && m.ts == updated.ts)
        {
            Some(entry) => {
                entry.clone_from(updated);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Orders Slack timestamps (`"1700000000.000100"`) numerically.
///
/// Whole seconds are compared as integers and the fractional part digit by
/// digit, so `"10"` sorts after `"9.5"`. Timestamps that are not decimal
/// numbers sort before every numeric one, so a full cache evicts them first;
/// among themselves they use plain string order.
#[must_use]
pub fn compare_ts(a: &str, b: &str) -> Ordering {
    match (parse_ts(a), parse_ts(b)) {
        (Some((a_secs, a_frac)), Some((b_secs, b_frac))) => a_secs
            .cmp(&b_secs)
            .then_with(|| compare_fraction(a_frac, b_frac)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

fn parse_ts(ts: &str) -> Option<(u128, &str)> {
    let (secs, frac) = ts.split_once('.').unwrap_or((ts, ""));
    if secs.is_empty() && frac.is_empty() {
        return None;
    }
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let secs = if secs.is_empty() { 0 } else { secs.parse().ok()? };
    Some((secs, frac))
}

fn compare_fraction(a: &str, b: &str) -> Ordering {
    let a = a.trim_end_matches('0');
    let b = b.trim_end_matches('0');
    // Equal-length digit strings compare like numbers; pad the shorter one.
    let width = a.len().max(b.len());
    format!("{a:0<width$}").cmp(&format!("{b:0<width$}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(channel: &str, ts: &str, thread_ts: Option<&str>) -> CachedMessage {
        CachedMessage {
            channel: channel.to_string(),
            ts: ts.to_string(),
            thread_ts: thread_ts.map(ToString::to_string),
            subtype: None,
            text: Some(format!("message {ts}")),
            blocks: None,
        }
    }

    fn timestamps(messages: &[CachedMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.ts.as_str()).collect()
    }

    #[test]
    fn query_returns_newest_first_regardless_of_insert_order() {
        let cache = MessageCache::default();
        cache.insert(message("C", "2", None));
        cache.insert(message("C", "3", None));
        cache.insert(message("C", "1", None));

        assert_eq!(timestamps(&cache.query("C", None)), vec!["3", "2", "1"]);
    }

    #[test]
    fn full_cache_evicts_only_the_oldest_entry() {
        let cache = MessageCache::default();
        for i in 1..=100 {
            cache.insert(message("C", &format!("{i}.000000"), None));
        }
        assert_eq!(cache.len(), 100);

        cache.insert(message("C", "101.000000", None));

        let cached = cache.query("C", None);
        assert_eq!(cached.len(), 100);
        assert_eq!(cached[0].ts, "101.000000");
        assert!(cached.iter().all(|m| m.ts != "1.000000"));
        assert!(cached.iter().any(|m| m.ts == "2.000000"));
    }

    #[test]
    fn inserting_an_older_message_into_a_full_cache_drops_it() {
        let cache = MessageCache::new(3, DuplicatePolicy::Keep);
        for ts in ["5", "6", "7"] {
            cache.insert(message("C", ts, None));
        }

        cache.insert(message("C", "1", None));

        assert_eq!(timestamps(&cache.query("C", None)), vec!["7", "6", "5"]);
    }

    #[test]
    fn query_is_scoped_by_channel_and_thread() {
        let cache = MessageCache::default();
        cache.insert(message("C", "10", None));
        cache.insert(message("C", "11", Some("10")));
        cache.insert(message("C", "12", Some("10")));
        cache.insert(message("D", "13", None));
        cache.insert(message("C", "14", Some("99")));

        assert_eq!(timestamps(&cache.query("C", None)), vec!["10"]);
        assert_eq!(timestamps(&cache.query("C", Some("10"))), vec!["12", "11"]);
        assert_eq!(timestamps(&cache.query("D", None)), vec!["13"]);
        assert!(cache.query("E", None).is_empty());
    }

    #[test]
    fn remove_then_query_never_returns_the_pair() {
        let cache = MessageCache::default();
        cache.insert(message("C", "1", None));
        cache.insert(message("C", "2", None));
        cache.insert(message("D", "1", None));

        cache.remove("C", "1");

        assert_eq!(timestamps(&cache.query("C", None)), vec!["2"]);
        assert_eq!(timestamps(&cache.query("D", None)), vec!["1"]);
    }

    #[test]
    fn removing_an_unknown_message_is_a_no_op() {
        let cache = MessageCache::default();
        cache.insert(message("C", "1", None));

        cache.remove("C", "404");
        cache.remove("Z", "1");

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn delete_before_post_lets_the_late_post_reappear() {
        let cache = MessageCache::default();
        cache.remove("C", "5");
        cache.insert(message("C", "5", None));

        assert_eq!(timestamps(&cache.query("C", None)), vec!["5"]);
    }

    #[test]
    fn query_is_a_snapshot() {
        let cache = MessageCache::default();
        cache.insert(message("C", "1", None));
        let snapshot = cache.query("C", None);

        cache.remove("C", "1");

        assert_eq!(snapshot.len(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn duplicate_policy_keep_stores_both_copies() {
        let cache = MessageCache::new(10, DuplicatePolicy::Keep);
        cache.insert(message("C", "1", None));
        cache.insert(message("C", "1", None));

        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn duplicate_policy_replace_keeps_the_latest_copy() {
        let cache = MessageCache::new(10, DuplicatePolicy::Replace);
        cache.insert(message("C", "1", None));
        let mut edited = message("C", "1", None);
        edited.text = Some("edited".to_string());
        cache.insert(edited);

        let cached = cache.query("C", None);
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].text.as_deref(), Some("edited"));
    }

    #[test]
    fn refresh_updates_in_place() {
        let cache = MessageCache::default();
        cache.insert(message("C", "1", None));
        let mut updated = message("C", "1", None);
        updated.text = Some("fixed".to_string());

        assert!(cache.refresh(&updated));
        assert!(!cache.refresh(&message("C", "2", None)));
        assert_eq!(cache.query("C", None)[0].text.as_deref(), Some("fixed"));
    }

    #[test]
    fn cache_stays_sorted_and_bounded_under_arbitrary_inserts() {
        let cache = MessageCache::new(25, DuplicatePolicy::Keep);
        // Deterministic pseudo-random order.
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
            let secs = (seed >> 33) % 10_000;
            let micros = (seed >> 13) % 1_000_000;
            cache.insert(message("C", &format!("{secs}.{micros:06}"), None));

            let cached = cache.query("C", None);
            assert!(cached.len() <= 25);
            assert!(
                cached
                    .windows(2)
                    .all(|w| compare_ts(&w[0].ts, &w[1].ts) != Ordering::Less)
            );
        }
    }

    #[test]
    fn timestamps_compare_numerically() {
        assert_eq!(compare_ts("10", "9.5"), Ordering::Greater);
        assert_eq!(compare_ts("1700000000.000100", "1700000000.000099"), Ordering::Greater);
        assert_eq!(compare_ts("1.5", "1.50"), Ordering::Equal);
        assert_eq!(compare_ts("1.05", "1.5"), Ordering::Less);
        assert_eq!(compare_ts("abc", "1"), Ordering::Less);
        assert_eq!(compare_ts("abc", "abd"), Ordering::Less);
    }

    #[test]
    fn malformed_timestamps_are_evicted_first() {
        let cache = MessageCache::new(3, DuplicatePolicy::Keep);
        cache.insert(message("C", "not-a-ts", None));
        for ts in ["5", "6", "7"] {
            cache.insert(message("C", ts, None));
        }

        assert_eq!(timestamps(&cache.query("C", None)), vec!["7", "6", "5"]);
    }

    #[test]
    fn concurrent_inserts_and_removes_keep_the_cache_sorted_and_bounded() {
        let cache = MessageCache::new(50, DuplicatePolicy::Keep);

        std::thread::scope(|scope| {
            for worker in 0..8u64 {
                let cache = &cache;
                scope.spawn(move || {
                    for i in 0..200u64 {
                        let ts = format!("{}.{worker:06}", i * 8 + worker);
                        cache.insert(message("C", &ts, None));
                        if i % 3 == 0 {
                            cache.remove("C", &ts);
                        }
                    }
                });
            }
        });

        let cached = cache.query("C", None);
        assert!(cached.len() <= 50);
        assert!(
            cached
                .windows(2)
                .all(|w| compare_ts(&w[0].ts, &w[1].ts) != Ordering::Less)
        );
    }
}
