//! Lexicographically sortable keys.
//!
//! A ULID is 26 Crockford base32 characters: 10 for a 48-bit millisecond
//! timestamp followed by 16 for 80 random bits.

use rand::Rng;
use tabula_common::TabulaResult;

use super::{unix_millis, IdGenerator};

const ENCODING: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";
const TIME_CHARS: usize = 10;
const RANDOM_CHARS: usize = 16;

/// Generates ULIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UlidGenerator;

impl UlidGenerator {
    /// Creates a generator.
    pub fn new() -> Self {
        Self
    }

    /// Encodes a timestamp and random bits.
    fn encode(millis: u64, random: u128) -> String {
        let mut out = String::with_capacity(TIME_CHARS + RANDOM_CHARS);
        push_base32(&mut out, u128::from(millis), TIME_CHARS);
        push_base32(&mut out, random, RANDOM_CHARS);
        out
    }
}

impl IdGenerator for UlidGenerator {
    fn generate(&self) -> TabulaResult<String> {
        let random: u128 = rand::thread_rng().gen::<u128>() >> (128 - 80);
        Ok(Self::encode(unix_millis()?, random))
    }
}

fn push_base32(out: &mut String, value: u128, chars: usize) {
    for i in (0..chars).rev() {
        let digit = (value >> (i * 5)) & 0x1f;
        out.push(char::from(ENCODING[digit as usize]));
    }
}
