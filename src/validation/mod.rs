//! Validation and formatting of identity data: CPF, phone, email, date.
//!
//! Validators are strict and return plain booleans; formatters are permissive
//! and never fail, returning best-effort output on malformed input. Callers
//! that care about correctness must validate before formatting. Everything
//! here is pure and safe to call concurrently.

use chrono::NaiveDate;
use regex::Regex;

/// Compute a CPF check digit over `digits` with weights descending from
/// `first_weight`. Remainders 10 and 11 both map to digit 0, per the
/// standard CPF algorithm.
fn cpf_check_digit(digits: &[u32], first_weight: u32) -> u32 {
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| d * (first_weight - i as u32))
        .sum();
    let digit = 11 - (sum % 11);
    if digit >= 10 {
        0
    } else {
        digit
    }
}

fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a CPF (Brazilian national ID): 11 digits whose two trailing
/// check digits match their weighted-sum derivations. Non-digit characters
/// are stripped first, so both bare and punctuated forms are accepted.
///
/// Sequences of 11 identical digits (e.g. `111.111.111-11`) pass the
/// arithmetic but are defined invalid.
pub fn is_valid_cpf(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();

    if digits.len() != 11 || digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    cpf_check_digit(&digits[..9], 10) == digits[9]
        && cpf_check_digit(&digits[..10], 11) == digits[10]
}

/// Format a CPF as `xxx.xxx.xxx-xx`. Does not validate; if the input does
/// not strip to exactly 11 digits, the stripped digits are returned
/// unchanged.
pub fn format_cpf(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    if digits.len() != 11 {
        return digits;
    }
    format!(
        "{}.{}.{}-{}",
        &digits[..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..]
    )
}

/// Structural email check: one `@`, non-empty whitespace-free local part,
/// domain containing at least one dot. Exotic but technically valid
/// addresses may be rejected; that is an accepted limitation.
pub fn is_valid_email(raw: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").map_or(false, |re| re.is_match(raw))
}

/// Validate a phone number in canonical display form:
/// `(AA) NNNN-NNNN` (landline) or `(AA) NNNNN-NNNN` (mobile).
pub fn is_valid_phone(raw: &str) -> bool {
    Regex::new(r"^\(\d{2}\) \d{4,5}-\d{4}$").map_or(false, |re| re.is_match(raw))
}

/// Format a phone number to canonical display form. 10 digits become
/// `(aa) nnnn-nnnn`, 11 digits `(aa) nnnnn-nnnn`; any other digit count is
/// returned stripped and ungrouped.
pub fn format_phone(raw: &str) -> String {
    let digits = strip_non_digits(raw);
    match digits.len() {
        10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        11 => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..]),
        _ => digits,
    }
}

/// Validate a `YYYY-MM-DD` date string against the real calendar: pattern
/// match plus a chrono parse, so month 13, day 32, and non-leap Feb 29 all
/// reject.
pub fn is_valid_date(raw: &str) -> bool {
    let shape_ok = Regex::new(r"^\d{4}-\d{2}-\d{2}$").map_or(false, |re| re.is_match(raw));
    shape_ok && NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
}
