//! LexoRank allocation.
//!
//! A rank payload is a base-36 number written with the alphabet `0-9a-z`. Because
//! payloads compare symbol by symbol, a new key can always be produced between two
//! neighbours without touching either of them:
//!
//! - no neighbours: the mid-alphabet constant [`MID_PAYLOAD`]
//! - only `after`: half of `after`, at `after`'s length
//! - only `before`: three quarters of the way from `before` to the largest value
//!   representable at `before`'s length
//! - both: the arithmetic midpoint of the two payloads right-padded with `0`
//!
//! When integer arithmetic at the current length has no room left, the key is
//! extended with extra symbols instead. Allocation never fails; it only lengthens
//! keys.

use crate::types::Rank;
use std::cmp::Ordering;
use tracing::{debug, trace, warn};

/// The rank alphabet, in ascending order
pub const ALPHABET: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Number of symbols in [`ALPHABET`]
pub const BASE: u16 = 36;

/// Bucket used for every rank this crate allocates
pub const DEFAULT_BUCKET: char = '0';

/// Separates the bucket from the payload
pub const SEPARATOR: char = '|';

/// Terminates the payload
pub const SENTINEL: char = ':';

/// Payload handed out when a container is empty
pub const MID_PAYLOAD: &str = "hzzzzz";

/// Symbol appended when no key of the current length fits
pub const TIE_BREAK: char = 'i';

/// Payload length used by [`generate_n_ranks`]
pub const DEFAULT_LENGTH: usize = 6;

/// Alphabet index of a symbol, or `None` if it is not a rank symbol
pub fn symbol_index(c: char) -> Option<u8> {
    ALPHABET.find(c).map(|idx| idx as u8)
}

fn symbol(index: u8) -> char {
    ALPHABET
        .as_bytes()
        .get(usize::from(index))
        .map(|b| *b as char)
        .unwrap_or(DEFAULT_BUCKET)
}

/// Encode a value as a base-36 payload, left-padded with `0` to `length` symbols.
///
/// Values that need more than `length` symbols are written in full.
pub fn encode(value: u128, length: usize) -> String {
    let mut symbols = Vec::new();
    let mut rest = value;
    while rest > 0 {
        symbols.push(symbol((rest % u128::from(BASE)) as u8));
        rest /= u128::from(BASE);
    }
    while symbols.len() < length {
        symbols.push('0');
    }
    symbols.iter().rev().collect()
}

/// Decode a base-36 payload. Returns `None` on a foreign symbol or if the value
/// does not fit in a `u128`.
pub fn decode(payload: &str) -> Option<u128> {
    payload.chars().try_fold(0u128, |acc, c| {
        let digit = u128::from(symbol_index(c)?);
        acc.checked_mul(u128::from(BASE))?.checked_add(digit)
    })
}

/// Rank for the first entity of an empty container
pub fn initial_rank() -> Rank {
    Rank::from_parts(DEFAULT_BUCKET, MID_PAYLOAD)
}

/// Rank that sorts before `rank`
pub fn rank_before(rank: &Rank) -> Rank {
    between(None, Some(rank))
}

/// Rank that sorts after `rank`
pub fn rank_after(rank: &Rank) -> Rank {
    between(Some(rank), None)
}

/// Allocate a rank strictly between `before` and `after`.
///
/// Either neighbour may be absent. Anchors passed in the wrong order are treated as
/// an insertion after `before`.
pub fn between(before: Option<&Rank>, after: Option<&Rank>) -> Rank {
    let rank = match (before, after) {
        (None, None) => initial_rank(),
        (None, Some(after)) => head(after),
        (Some(before), None) => tail(before),
        (Some(before), Some(after)) if before >= after => {
            warn!(%before, %after, "rank anchors out of order, allocating after 'before'");
            tail(before)
        }
        (Some(before), Some(after)) if before.bucket() != after.bucket() => tail(before),
        (Some(before), Some(after)) => midpoint(before, after),
    };
    trace!(
        before = before.map(Rank::as_str),
        after = after.map(Rank::as_str),
        %rank,
        "allocated rank"
    );
    rank
}

/// Generate `n` evenly spaced, ascending ranks for populating an empty container.
///
/// Payloads are [`DEFAULT_LENGTH`] symbols long unless `n` needs more room.
pub fn generate_n_ranks(n: usize) -> Vec<Rank> {
    spread(n, DEFAULT_LENGTH)
}

fn spread(n: usize, min_length: usize) -> Vec<Rank> {
    if n == 0 {
        return Vec::new();
    }
    let slots = n as u128 + 1;
    let mut length = min_length;
    while u128::from(BASE).pow(length as u32) - 1 < slots {
        length += 1;
    }
    let step = (u128::from(BASE).pow(length as u32) - 1) / slots;
    (1..=n as u128)
        .map(|i| Rank::from_parts(DEFAULT_BUCKET, &encode(step * i, length)))
        .collect()
}

fn head(after: &Rank) -> Rank {
    let payload = after.payload();
    let width = payload.len();
    let mut value = Digits::from_payload(payload).div_small(2);
    if value.is_zero() {
        value = Digits::one(width);
    }
    let candidate = Rank::from_parts(after.bucket(), &value.fit(width).to_payload());
    if candidate < *after {
        return candidate;
    }

    // A proper prefix sorts first, so a run of zeros can shed its last symbol
    if width > 1 && payload.chars().all(|c| c == '0') {
        let candidate = Rank::from_parts(after.bucket(), &payload[..width - 1]);
        debug!(%after, %candidate, "head allocation shortened zero payload");
        return candidate;
    }

    // Halve the payload extended by its largest symbol: one symbol longer, still below.
    let extended = Digits::from_payload(payload)
        .mul_small(BASE)
        .add(&Digits(vec![(BASE - 1) as u8]))
        .div_small(2)
        .fit(width + 1);
    let candidate = Rank::from_parts(after.bucket(), &extended.to_payload());
    if candidate >= *after {
        warn!(%after, "no rank sorts before the minimum key");
    } else {
        debug!(%after, %candidate, "head allocation extended rank length");
    }
    candidate
}

fn tail(before: &Rank) -> Rank {
    let payload = before.payload();
    let width = payload.len();
    let value = Digits::from_payload(payload);
    let gap = Digits::max(width).sub(&value);
    let step = gap.mul_small(3).div_small(4);
    let mut next = value.add(&step);
    if next.cmp_value(&value) != Ordering::Greater {
        next = value.add(&Digits::one(1));
    }
    let candidate = Rank::from_parts(before.bucket(), &next.fit(width).to_payload());
    if candidate > *before {
        return candidate;
    }

    debug!(%before, "tail allocation extended rank length");
    Rank::from_parts(before.bucket(), &format!("{}{}", payload, TIE_BREAK))
}

fn midpoint(before: &Rank, after: &Rank) -> Rank {
    let bucket = before.bucket();
    let width = before.payload().len().max(after.payload().len());
    let low = Digits::padded(before.payload(), width);
    let high = Digits::padded(after.payload(), width);
    let mid = low.add(&high).div_small(2);
    if mid.cmp_value(&low) == Ordering::Greater && mid.cmp_value(&high) == Ordering::Less {
        return Rank::from_parts(bucket, &mid.fit(width).to_payload());
    }

    let tie_break = Rank::from_parts(bucket, &format!("{}{}", before.payload(), TIE_BREAK));
    if *before < tie_break && tie_break < *after {
        debug!(%before, %after, "midpoint collapsed, appended tie-break symbol");
        return tie_break;
    }

    let low: Vec<u8> = Digits::from_payload(before.payload()).0;
    let high: Vec<u8> = Digits::from_payload(after.payload()).0;
    let symbols: String = midpoint_symbols(&low, Some(&high))
        .into_iter()
        .map(symbol)
        .collect();
    let candidate = Rank::from_parts(bucket, &symbols);
    if *before < candidate && candidate < *after {
        debug!(%before, %after, %candidate, "midpoint collapsed, extended between anchors");
        return candidate;
    }

    warn!(%before, %after, "no rank fits between anchors, ordering will tie");
    tie_break
}

/// Shortest symbol string strictly between `low` and `high` in symbol order,
/// treating a missing `high` as unbounded.
fn midpoint_symbols(low: &[u8], high: Option<&[u8]>) -> Vec<u8> {
    if let Some(high) = high {
        // An exhausted `low` sorts below every continuation, so it shares nothing more
        let shared = high
            .iter()
            .enumerate()
            .take_while(|(i, d)| low.get(*i) == Some(*d))
            .count();
        if shared > 0 {
            let mut out = high[..shared].to_vec();
            out.extend(midpoint_symbols(
                low.get(shared..).unwrap_or(&[]),
                Some(&high[shared..]),
            ));
            return out;
        }
    }

    let low_digit = low.first().copied().map(u16::from).unwrap_or(0);
    let high_digit = high
        .and_then(|h| h.first().copied())
        .map(u16::from)
        .unwrap_or(BASE);
    if high_digit > low_digit + 1 {
        return vec![((low_digit + high_digit) / 2) as u8];
    }
    if let Some(high) = high {
        if high.len() > 1 {
            return vec![high[0]];
        }
    }
    let mut out = vec![low_digit as u8];
    out.extend(midpoint_symbols(low.get(1..).unwrap_or(&[]), None));
    out
}

/// Unbounded base-36 number, most significant digit first.
#[derive(Debug, Clone)]
struct Digits(Vec<u8>);

impl Digits {
    fn from_payload(payload: &str) -> Self {
        Self(
            payload
                .chars()
                .map(|c| symbol_index(c).unwrap_or(0))
                .collect(),
        )
    }

    /// Right-pad with zero symbols, which appends lower-order digits
    fn padded(payload: &str, width: usize) -> Self {
        let mut digits = Self::from_payload(payload);
        let width = width.max(digits.0.len());
        digits.0.resize(width, 0);
        digits
    }

    fn max(width: usize) -> Self {
        Self(vec![(BASE - 1) as u8; width])
    }

    fn one(width: usize) -> Self {
        let mut digits = vec![0; width.max(1)];
        if let Some(last) = digits.last_mut() {
            *last = 1;
        }
        Self(digits)
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|d| *d == 0)
    }

    fn from_right(&self, i: usize) -> u16 {
        self.0
            .len()
            .checked_sub(i + 1)
            .map(|idx| u16::from(self.0[idx]))
            .unwrap_or(0)
    }

    fn add(&self, other: &Digits) -> Digits {
        let width = self.0.len().max(other.0.len());
        let mut out = Vec::with_capacity(width + 1);
        let mut carry = 0;
        for i in 0..width {
            let sum = self.from_right(i) + other.from_right(i) + carry;
            out.push((sum % BASE) as u8);
            carry = sum / BASE;
        }
        if carry > 0 {
            out.push(carry as u8);
        }
        out.reverse();
        Digits(out)
    }

    /// `self - other`; callers guarantee `self >= other`
    fn sub(&self, other: &Digits) -> Digits {
        let mut out = Vec::with_capacity(self.0.len());
        let mut borrow = 0;
        for i in 0..self.0.len() {
            let mut diff = self.from_right(i) as i32 - other.from_right(i) as i32 - borrow;
            borrow = 0;
            if diff < 0 {
                diff += i32::from(BASE);
                borrow = 1;
            }
            out.push(diff as u8);
        }
        out.reverse();
        Digits(out)
    }

    fn mul_small(&self, factor: u16) -> Digits {
        let mut out = Vec::with_capacity(self.0.len() + 1);
        let mut carry: u32 = 0;
        for i in 0..self.0.len() {
            let product = u32::from(self.from_right(i)) * u32::from(factor) + carry;
            out.push((product % u32::from(BASE)) as u8);
            carry = product / u32::from(BASE);
        }
        while carry > 0 {
            out.push((carry % u32::from(BASE)) as u8);
            carry /= u32::from(BASE);
        }
        out.reverse();
        Digits(out)
    }

    fn div_small(&self, divisor: u16) -> Digits {
        let mut out = Vec::with_capacity(self.0.len());
        let mut rem: u32 = 0;
        for d in &self.0 {
            let current = rem * u32::from(BASE) + u32::from(*d);
            out.push((current / u32::from(divisor)) as u8);
            rem = current % u32::from(divisor);
        }
        Digits(out)
    }

    fn significant(&self) -> &[u8] {
        let start = self.0.iter().position(|d| *d != 0).unwrap_or(self.0.len());
        &self.0[start..]
    }

    fn cmp_value(&self, other: &Digits) -> Ordering {
        let (a, b) = (self.significant(), other.significant());
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }

    /// Write at exactly `width` digits, or wider if the value does not fit
    fn fit(mut self, width: usize) -> Digits {
        let excess = self.0.len().saturating_sub(width);
        let zeros = self.0.iter().take(excess).take_while(|d| **d == 0).count();
        self.0.drain(..zeros);
        if self.0.len() < width {
            let mut padded = vec![0; width - self.0.len()];
            padded.append(&mut self.0);
            self.0 = padded;
        }
        self
    }

    fn to_payload(&self) -> String {
        self.0.iter().map(|d| symbol(*d)).collect()
    }
}
