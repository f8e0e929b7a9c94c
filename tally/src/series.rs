//! Order-independent series identity
//!
//! A series is one physical counter stream: a metric name plus its tag set.
//! Identity is a 64-bit FNV-1a fingerprint over the name and the
//! lexicographically-sorted tag pairs, so two samples with the same tags in
//! any iteration order land on the same state. Fingerprints are used purely
//! as map keys; collisions are a theoretical risk we accept rather than
//! defend against.

use std::hash::Hasher;

use fnv::FnvHasher;

use crate::metric::Tags;

/// Fingerprint a metric name and tag set.
///
/// Framing is name, a separator, then for each sorted tag key: the key, a
/// separator, its value, a separator. The framing is part of the identity
/// contract and must not change independently of the hash function.
#[must_use]
pub fn series_id(name: &str, tags: &Tags) -> u64 {
    let mut keys: Vec<&str> = tags.keys().map(String::as_str).collect();
    keys.sort_unstable();

    let mut hasher = FnvHasher::default();
    hasher.write(name.as_bytes());
    hasher.write(b";");
    for key in keys {
        hasher.write(key.as_bytes());
        hasher.write(b"=");
        hasher.write(tags[key].as_bytes());
        hasher.write(b";");
    }
    hasher.finish()
}
