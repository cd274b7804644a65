//! Random identifiers for generated entities
//!
//! Values carry a fixed `test_` prefix so leftovers are easy to spot on a
//! shared server.

use rand::Rng;

pub const TEST_PREFIX: &str = "test_";

const MIN_RANDOM_LEN: usize = 10;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// `test_` followed by 10 random alphabetic characters
pub fn random_string() -> String {
    format!("{}{}", TEST_PREFIX, random_alphabetic(MIN_RANDOM_LEN))
}

/// A random string of `length` characters, prefix included.
///
/// Never shorter than [`random_string`], so uniqueness does not degrade for
/// small lengths.
pub fn random_string_of_len(length: usize) -> String {
    let random_len = length.saturating_sub(TEST_PREFIX.len()).max(MIN_RANDOM_LEN);
    format!("{}{}", TEST_PREFIX, random_alphabetic(random_len))
}

fn random_alphabetic(length: usize) -> String {
    // thread_rng is a CSPRNG reseeded from the OS
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use test_case::test_case;

    #[test]
    fn test_random_string_shape() {
        let value = random_string();
        assert_eq!(value.len(), 15);
        assert!(value.starts_with("test_"));
        assert!(value[5..].chars().all(|c| c.is_ascii_alphabetic()));
    }

    #[test]
    fn test_random_strings_are_unique() {
        let values: HashSet<String> = (0..10_000).map(|_| random_string()).collect();
        assert_eq!(values.len(), 10_000);
    }

    #[test_case(0, 15 ; "shorter than prefix")]
    #[test_case(15, 15 ; "default length")]
    #[test_case(225, 225 ; "server id limit")]
    #[test_case(226, 226 ; "past server id limit")]
    fn test_random_string_of_len(requested: usize, expected: usize) {
        let value = random_string_of_len(requested);
        assert_eq!(value.len(), expected);
        assert!(value.starts_with(TEST_PREFIX));
    }
}
