// ABOUTME: Invite token helpers for shape checks, random generation and invite URLs
// ABOUTME: Tokens are six ASCII alphanumeric characters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use rand::distributions::Alphanumeric;
use rand::Rng;

/// Length of generated tokens
pub const TOKEN_LENGTH: usize = 6;

/// Whether `token` has the generated token shape
///
/// Surrounding whitespace is ignored. Lookups never require this; admins may
/// create invites with any id.
#[must_use]
pub fn is_well_formed_token(token: &str) -> bool {
    let token = token.trim();
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Generate a random token
#[must_use]
pub fn generate_token() -> String {
    generate_token_with(&mut rand::thread_rng())
}

/// Generate a token from the given RNG
pub fn generate_token_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..TOKEN_LENGTH)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

/// Build the guest-facing invite URL for a token
///
/// A trailing slash on `base` is tolerated.
#[must_use]
pub fn build_invite_url(base: &str, token: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), token.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_tokens_are_well_formed() {
        for _ in 0..100 {
            let token = generate_token();
            assert!(is_well_formed_token(&token), "bad token {token}");
        }
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = generate_token_with(&mut StdRng::seed_from_u64(7));
        let b = generate_token_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_token_shape() {
        assert!(is_well_formed_token("AB12cd"));
        assert!(!is_well_formed_token("AB12c"));
        assert!(!is_well_formed_token("AB12cde"));
        assert!(!is_well_formed_token("AB-2cd"));
        assert!(!is_well_formed_token("ÅB12cd"));
        assert!(is_well_formed_token(" AB12cd\n"));
    }

    #[test]
    fn test_build_invite_url() {
        assert_eq!(
            build_invite_url("https://ash-wedding/token", "AB12cd"),
            "https://ash-wedding/token/AB12cd"
        );
        assert_eq!(
            build_invite_url("https://ash-wedding/token/", "AB12cd"),
            "https://ash-wedding/token/AB12cd"
        );
    }
}
