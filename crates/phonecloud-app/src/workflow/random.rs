//! Randomized inputs for workflows (account data, jittered waits).

use rand::Rng;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const SPECIAL: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?/~";

/// Character classes mixed into [`random_string`]. Lowercase letters are
/// always included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomStringOptions {
    pub numbers: bool,
    pub uppercase: bool,
    pub special_chars: bool,
}

impl Default for RandomStringOptions {
    fn default() -> Self {
        Self {
            numbers: true,
            uppercase: true,
            special_chars: false,
        }
    }
}

/// Uniform integer in `[start, end]`. The bounds may be given in either order.
pub fn random_number(start: i64, end: i64) -> i64 {
    let (low, high) = if start <= end { (start, end) } else { (end, start) };
    rand::thread_rng().gen_range(low..=high)
}

/// Random string whose length is uniform in `[min_len, max_len]`.
pub fn random_string(min_len: usize, max_len: usize, options: RandomStringOptions) -> String {
    let mut alphabet = String::from(LOWERCASE);
    if options.uppercase {
        alphabet.push_str(UPPERCASE);
    }
    if options.numbers {
        alphabet.push_str(DIGITS);
    }
    if options.special_chars {
        alphabet.push_str(SPECIAL);
    }
    let alphabet = alphabet.as_bytes();

    let (low, high) = if min_len <= max_len {
        (min_len, max_len)
    } else {
        (max_len, min_len)
    };
    let mut rng = rand::thread_rng();
    let len = rng.gen_range(low..=high);

    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}
