//! Fixed-width integer capacity/load vector.
//!
//! All `Amount` values within one [`crate::models::Input`] share the same
//! dimension; the solver never mixes vectors of different width.

use std::ops::{Add, Sub};

/// A fixed-width signed integer vector describing a capacity or load delta.
///
/// Supports componentwise `+`, `-`, and `<=` as required by spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Amount(Vec<i64>);

impl Amount {
    /// Creates a zero vector of the given dimension.
    pub fn zero(size: usize) -> Self {
        Amount(vec![0; size])
    }

    /// Creates an amount from explicit component values.
    pub fn from_vec(values: Vec<i64>) -> Self {
        Amount(values)
    }

    /// Number of capacity dimensions.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Component at index `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.size()`.
    pub fn get(&self, i: usize) -> i64 {
        self.0[i]
    }

    /// Raw component slice.
    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// `true` if every component is `<= other`'s corresponding component.
    ///
    /// # Panics
    ///
    /// Panics if dimensions differ.
    pub fn le(&self, other: &Amount) -> bool {
        assert_eq!(self.size(), other.size(), "amount dimension mismatch");
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    /// `true` if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// Elementwise maximum of two amounts.
    ///
    /// # Panics
    ///
    /// Panics if dimensions differ.
    pub fn max(&self, other: &Amount) -> Amount {
        assert_eq!(self.size(), other.size(), "amount dimension mismatch");
        Amount(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| (*a).max(*b))
                .collect(),
        )
    }
}

impl Add<&Amount> for &Amount {
    type Output = Amount;

    fn add(self, rhs: &Amount) -> Amount {
        assert_eq!(self.size(), rhs.size(), "amount dimension mismatch");
        Amount(
            self.0
                .iter()
                .zip(rhs.0.iter())
                .map(|(a, b)| a + b)
                .collect(),
        )
    }
}

impl Sub<&Amount> for &Amount {
    type Output = Amount;

    fn sub(self, rhs: &Amount) -> Amount {
        assert_eq!(self.size(), rhs.size(), "amount dimension mismatch");
        Amount(
            self.0
                .iter()
                .zip(rhs.0.iter())
                .map(|(a, b)| a - b)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        let a = Amount::zero(3);
        assert_eq!(a.size(), 3);
        assert!(a.is_zero());
    }

    #[test]
    fn test_add_sub() {
        let a = Amount::from_vec(vec![1, 2, 3]);
        let b = Amount::from_vec(vec![4, 5, 6]);
        assert_eq!(&a + &b, Amount::from_vec(vec![5, 7, 9]));
        assert_eq!(&b - &a, Amount::from_vec(vec![3, 3, 3]));
    }

    #[test]
    fn test_le() {
        let a = Amount::from_vec(vec![1, 2]);
        let b = Amount::from_vec(vec![2, 2]);
        assert!(a.le(&b));
        assert!(!b.le(&a));
        assert!(a.le(&a));
    }

    #[test]
    fn test_max() {
        let a = Amount::from_vec(vec![1, 5, 3]);
        let b = Amount::from_vec(vec![4, 2, 3]);
        assert_eq!(a.max(&b), Amount::from_vec(vec![4, 5, 3]));
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn test_mismatched_dims_panics() {
        let a = Amount::from_vec(vec![1]);
        let b = Amount::from_vec(vec![1, 2]);
        let _ = &a + &b;
    }
}
