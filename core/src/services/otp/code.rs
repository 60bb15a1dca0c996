//! Verification code generation

use rand::{rngs::OsRng, RngCore};

use crate::domain::entities::CODE_LENGTH;

const CODE_SPACE: u32 = 1_000_000;

// Largest multiple of CODE_SPACE that fits in u32; draws at or above it are rejected.
const ACCEPT_BELOW: u32 = u32::MAX - (u32::MAX % CODE_SPACE);

/// Generate a 6-digit code uniformly over 000000..=999999 using the OS CSPRNG
pub fn generate_code() -> String {
    let mut rng = OsRng;
    loop {
        let num = rng.next_u32();
        if num < ACCEPT_BELOW {
            return format!("{:0width$}", num % CODE_SPACE, width = CODE_LENGTH);
        }
    }
}

/// Whether `code` has the shape of an issued code
pub fn is_well_formed(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_code_format() {
        for _ in 0..1_000 {
            let code = generate_code();
            assert!(is_well_formed(&code), "malformed code {}", code);
        }
    }

    #[test]
    fn test_codes_are_not_repeated() {
        // 10k draws from a space of 1M: expect a handful of collisions at most
        let codes: HashSet<String> = (0..10_000).map(|_| generate_code()).collect();
        assert!(codes.len() > 9_900, "only {} distinct codes", codes.len());
    }

    #[test]
    fn test_rejection_bound() {
        assert_eq!(ACCEPT_BELOW % CODE_SPACE, 0);
        assert!(u32::MAX - ACCEPT_BELOW < CODE_SPACE);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("000000"));
        assert!(is_well_formed("482913"));
        assert!(!is_well_formed("48291"));
        assert!(!is_well_formed("4829133"));
        assert!(!is_well_formed("48a913"));
        assert!(!is_well_formed("４８２９１３"));
    }
}
