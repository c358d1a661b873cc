//! License key generation and normalization.
//!
//! Keys are four dash-separated groups of `A-Z0-9` with lengths `2-6-4-4`,
//! e.g. `AB-CDEFGH-IJKL-MNOP`. Every character is drawn independently and
//! uniformly from the 36-symbol alphabet.

use rand::{Rng, RngExt};

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Group lengths of a license key, in order.
pub const GROUPS: [usize; 4] = [2, 6, 4, 4];

/// Total length of a key including the three separators.
pub const KEY_LEN: usize = 2 + 6 + 4 + 4 + 3;

/// Produces candidate license keys.
pub trait KeyGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

/// Key generator backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> String {
        generate_key_with(&mut rand::rng())
    }
}

/// Generate a key from the given randomness source.
pub fn generate_key_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut key = String::with_capacity(KEY_LEN);
    for (i, len) in GROUPS.iter().enumerate() {
        if i > 0 {
            key.push('-');
        }
        for _ in 0..*len {
            let idx = rng.random_range(0..CHARSET.len());
            key.push(char::from(CHARSET[idx]));
        }
    }
    key
}

/// Canonical form of a user-supplied key: surrounding whitespace trimmed,
/// upper-cased.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Whether `key` has the canonical `2-6-4-4` shape over `A-Z0-9`.
pub fn is_well_formed(key: &str) -> bool {
    let groups: Vec<&str> = key.split('-').collect();
    groups.len() == GROUPS.len()
        && groups.iter().zip(GROUPS).all(|(group, len)| {
            group.len() == len
                && group
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        })
}
