//! Factorials, exact up to `34!` and log-space beyond.

/// The largest `n` for which `n!` fits in a `u128`.
pub const MAX_EXACT: u8 = 34;

pub trait Factorial {
    fn get(&self, n: u8) -> u128;

    /// Natural logarithm of `n!`, defined for any `n`.
    fn ln(&self, n: u32) -> f64 {
        if n <= MAX_EXACT as u32 {
            (self.get(n as u8) as f64).ln()
        } else {
            let exact = (self.get(MAX_EXACT) as f64).ln();
            (MAX_EXACT as u32 + 1..=n).fold(exact, |acc, i| acc + (i as f64).ln())
        }
    }
}

#[derive(Default)]
pub struct Calculator;

impl Factorial for Calculator {
    #[inline]
    fn get(&self, n: u8) -> u128 {
        assert!(n <= MAX_EXACT, "{n}! overflows");
        let mut product = 1u128;
        for i in 2..=n {
            product *= i as u128;
        }
        product
    }
}

const MAX_ENTRIES: usize = MAX_EXACT as usize + 1;

pub struct Lookup {
    entries: [u128; MAX_ENTRIES],
}
impl Lookup {
    pub const fn new() -> Self {
        let mut entries = [1u128; MAX_ENTRIES];
        let mut i = 2;
        while i < MAX_ENTRIES {
            entries[i] = i as u128 * entries[i - 1];
            i += 1;
        }
        Self { entries }
    }
}

impl Factorial for Lookup {
    #[inline]
    fn get(&self, n: u8) -> u128 {
        self.entries[n as usize]
    }
}

impl Default for Lookup {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared table, built at compile time.
pub const LOOKUP: Lookup = Lookup::new();
