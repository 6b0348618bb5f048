//! Lead id generation.
//!
//! Ids have the shape `HERMES-<base36 epoch ms>-<6 random base36 chars>`,
//! uppercased. Two submissions of the same form produce two distinct ids —
//! there is deliberately no idempotency or de-duplication.

use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

const PREFIX: &str = "HERMES";
const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 6;

/// Generate a fresh lead id.
#[must_use]
pub fn generate() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    // 6 random base36 chars drawn from a v4 UUID's CSPRNG bytes.
    let random = Uuid::new_v4();
    let suffix: String = random
        .as_bytes()
        .iter()
        .take(SUFFIX_LEN)
        .map(|b| ALPHABET[usize::from(*b) % ALPHABET.len()] as char)
        .collect();

    format!("{PREFIX}-{}-{suffix}", to_base36(millis))
}

/// Check whether a string has the generated lead id shape.
#[must_use]
pub fn is_well_formed(id: &str) -> bool {
    let mut parts = id.splitn(3, '-');
    let (Some(prefix), Some(ts), Some(suffix)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    prefix == PREFIX
        && !ts.is_empty()
        && ts.bytes().all(|b| ALPHABET.contains(&b))
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| ALPHABET.contains(&b))
}

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_owned();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();

    // ALPHABET is pure ASCII, so the bytes are valid UTF-8.
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_well_formed() {
        for _ in 0..100 {
            let id = generate();
            assert!(is_well_formed(&id), "malformed id: {id}");
            assert!(id.starts_with("HERMES-"));
        }
    }

    #[test]
    fn generated_ids_are_distinct() {
        let ids: std::collections::HashSet<String> = (0..1000).map(|_| generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn base36_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn shape_checker_rejects_garbage() {
        assert!(!is_well_formed("HERMES-"));
        assert!(!is_well_formed("HERMES-abc-ABCDEF"));
        assert!(!is_well_formed("HERMES-1A2B-ABC"));
        assert!(!is_well_formed("ATLAS-1A2B-ABCDEF"));
        assert!(!is_well_formed(""));
    }
}
