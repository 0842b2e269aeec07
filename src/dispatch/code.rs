//! Workflow code generation
//!
//! Codes travel over SMS and get typed back on a keypad, so the alphabet
//! drops the lookalike glyphs (I, O, 0, 1).

use rand::Rng;

/// 32-character alphabet without lookalike glyphs
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Code length in characters
pub const CODE_LENGTH: usize = 6;

/// Collision retries before an operation gives up
pub const MAX_CODE_ATTEMPTS: usize = 8;

/// Generate one candidate code. Uniqueness among pending rows is checked by
/// the caller against the store.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_length() {
        for _ in 0..100 {
            assert_eq!(generate_code().len(), CODE_LENGTH);
        }
    }

    #[test]
    fn test_code_uses_only_the_alphabet() {
        for _ in 0..100 {
            let code = generate_code();
            for c in code.bytes() {
                assert!(
                    CODE_ALPHABET.contains(&c),
                    "unexpected character {:?} in code {}",
                    c as char,
                    code
                );
            }
        }
    }

    #[test]
    fn test_alphabet_has_no_lookalikes() {
        for forbidden in [b'I', b'O', b'0', b'1'] {
            assert!(!CODE_ALPHABET.contains(&forbidden));
        }
        assert_eq!(CODE_ALPHABET.len(), 32);
    }
}
