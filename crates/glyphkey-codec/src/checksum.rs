//! Position-weighted checksums over GF(32).
//!
//! Symbols are elements of GF(2^5) built from the primitive polynomial
//! x^5 + x^2 + 1. Check symbol `j` over data `x_0..x_{n-1}` is the unique
//! value `c_j` that zeroes the weighted sum
//!
//! ```text
//! sum_i a^((j+1)(i+1)) * x_i  +  a^((j+1)(n+1)) * c_j  =  0
//! ```
//!
//! where `a` is the field generator.
//!
//! # Error Detection
//!
//! - Single substitution: every weight is non-zero, so changing any one
//!   symbol changes the sum.
//! - Adjacent transposition: neighbouring weights differ by the factor
//!   `a^(j+1) != 1`, so swapping two different neighbours changes the sum.
//!   For `j = 0` this extends to swapping the last data symbol with the
//!   check symbol itself.
//!
//! The sum is linear, so it can be accumulated block by block (see
//! [`weighted_sum`] with an offset) without revisiting earlier blocks.

/// Primitive polynomial x^5 + x^2 + 1.
const POLYNOMIAL: u8 = 0b10_0101;

/// Multiplicative order of the field generator.
const ORDER: usize = 31;

const EXP: [u8; ORDER] = build_exp();
const LOG: [u8; 32] = build_log();

const fn build_exp() -> [u8; ORDER] {
    let mut table = [0u8; ORDER];
    let mut value: u8 = 1;
    let mut i = 0;
    while i < ORDER {
        table[i] = value;
        value <<= 1;
        if value & 0b10_0000 != 0 {
            value ^= POLYNOMIAL;
        }
        i += 1;
    }
    table
}

const fn build_log() -> [u8; 32] {
    let exp = build_exp();
    let mut table = [0u8; 32];
    let mut i = 0;
    while i < ORDER {
        table[exp[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// `a^exponent` for the field generator `a`.
fn alpha_pow(exponent: usize) -> u8 {
    EXP[exponent % ORDER]
}

fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let exponent = usize::from(LOG[usize::from(a)]) + usize::from(LOG[usize::from(b)]);
    alpha_pow(exponent)
}

/// Weighted sum for check symbol `index` over `values` that start at data
/// position `offset`.
///
/// Sums over disjoint ranges combine with XOR (field addition).
pub fn weighted_sum(values: &[u8], offset: usize, index: usize) -> u8 {
    let step = index + 1;
    values.iter().enumerate().fold(0, |acc, (i, &x)| {
        acc ^ mul(alpha_pow((step * (offset + i + 1)) % ORDER), x & 0x1F)
    })
}

/// Turn an accumulated weighted sum over `data_len` symbols into the check
/// symbol `index`.
pub fn finish(sum: u8, data_len: usize, index: usize) -> u8 {
    let exponent = ((index + 1) * (data_len + 1)) % ORDER;
    // Inverse of a^e is a^(31 - e)
    mul(sum, alpha_pow(ORDER - exponent))
}

/// Compute `len` check symbols over symbol values.
///
/// Deterministic and order-sensitive. Pure function.
pub fn compute_checksum(values: &[u8], len: usize) -> Vec<u8> {
    (0..len).map(|index| finish(weighted_sum(values, 0, index), values.len(), index)).collect()
}

/// Check that `check` holds the checksum of `values`.
pub fn verify(values: &[u8], check: &[u8]) -> bool {
    compute_checksum(values, check.len()) == check
}
