//! The Luhn (mod 10) checksum used to validate order numbers.

/// Returns true if `digits` is a non-empty string of ASCII decimal digits whose Luhn checksum is zero.
///
/// Counting from the rightmost digit, every second digit is doubled, and 9 is subtracted from any doubled digit greater
/// than 9. The number is valid when the sum of all the resulting digits is divisible by 10.
pub fn is_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, b) in digits.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return false;
        }
        let mut d = u32::from(b - b'0');
        if i % 2 == 1 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    sum % 10 == 0
}

/// Computes the digit that makes `prefix` followed by that digit Luhn-valid. Returns `None` if `prefix` contains
/// anything other than decimal digits.
pub fn check_digit(prefix: &str) -> Option<u8> {
    let mut sum = 0u32;
    for (i, b) in prefix.bytes().rev().enumerate() {
        if !b.is_ascii_digit() {
            return None;
        }
        let mut d = u32::from(b - b'0');
        // The check digit will occupy position 0, so the prefix's rightmost digit is the first one doubled.
        if i % 2 == 0 {
            d *= 2;
            if d > 9 {
                d -= 9;
            }
        }
        sum += d;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(((10 - sum % 10) % 10) as u8)
}

/// Appends the Luhn check digit to `prefix`.
pub fn with_check_digit(prefix: &str) -> Option<String> {
    check_digit(prefix).map(|d| format!("{prefix}{d}"))
}
