//! Invite Code Generation

use rand::Rng;

/// Code alphabet without the look-alike characters `I`, `O`, `0` and `1`.
pub const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Source of candidate invite codes.
///
/// Uniqueness is enforced by the store, not the generator; a colliding code is
/// simply discarded and another one requested.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

/// Uniformly random codes from [`INVITE_CODE_ALPHABET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
                INVITE_CODE_ALPHABET[idx] as char
            })
            .collect()
    }
}
