use derive_more::{Display, Debug};
use num_integer::Integer;
use num_traits::{One, Zero};

/// Arithmetic context for `Z/nZ`.
///
/// Elements are plain `u64` residues in `[0, n)`. The modulus is
/// usually prime; prime powers are supported, in which case `inv`
/// fails for non-units.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Display, Debug)]
#[display("Z/{n}")]
#[debug("Z/{n}")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Modulus {
    n: u64
}

impl Modulus {
    pub const MAX: u64 = 1 << 63;

    pub fn new(n: u64) -> Self {
        assert!(n >= 2, "modulus must be >= 2, got {n}");
        assert!(n < Self::MAX, "modulus must be < 2^63, got {n}");
        Self { n }
    }

    pub fn n(&self) -> u64 {
        self.n
    }

    pub fn reduce(&self, a: u64) -> u64 {
        a % self.n
    }

    pub fn from_i64(&self, a: i64) -> u64 {
        (a as i128).rem_euclid(self.n as i128) as u64
    }

    pub fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.n && b < self.n);
        let s = a + b; // n < 2^63
        if s >= self.n { s - self.n } else { s }
    }

    pub fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.n && b < self.n);
        if a >= b { a - b } else { a + (self.n - b) }
    }

    pub fn neg(&self, a: u64) -> u64 {
        debug_assert!(a < self.n);
        if a == 0 { 0 } else { self.n - a }
    }

    pub fn mul(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.n && b < self.n);
        ((a as u128 * b as u128) % self.n as u128) as u64
    }

    pub fn inv(&self, a: u64) -> Option<u64> {
        if a.is_zero() {
            return None
        }

        // 1 = ax + ny  ->  ax = 1 mod n.
        let (a, n) = (a as i128, self.n as i128);
        let e = a.extended_gcd(&n);

        if e.gcd.is_one() {
            Some(e.x.rem_euclid(n) as u64)
        } else {
            None
        }
    }

    pub fn is_unit(&self, a: u64) -> bool {
        !a.is_zero() && a.gcd(&self.n).is_one()
    }

    pub fn div(&self, a: u64, b: u64) -> u64 {
        let Some(binv) = self.inv(b) else {
            panic!("{b} is not invertible in {self}")
        };
        self.mul(a, binv)
    }

    pub fn is_minus_one(&self, a: u64) -> bool {
        a + 1 == self.n
    }
}
