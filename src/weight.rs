//! # Pass weight functions
//!
//! A weight function maps an observation count to the weight of a spatial
//! pass when its per-pass summary is merged into a temporal accumulator.
//! The engine uses a power law `weight(n) = n^coeff` with `coeff >= 0`;
//! `coeff == 0` yields a constant weight of 1 and recovers an unweighted
//! temporal mean. The two common exponents get dedicated variants so the
//! hot path avoids `powf`.

use crate::l3bin_errors::L3binError;

/// Power-law weight function of the spatial observation count
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightFn {
    /// `coeff == 0`: constant weight of 1
    One,
    /// `coeff == 0.5`: square root of the observation count
    Sqrt,
    /// Any other non-negative exponent
    Pow(f64),
}

impl WeightFn {
    /// Create a power-law weight function
    ///
    /// Arguments
    /// ---------
    /// * `coeff`: the exponent of the power law, must be `>= 0`
    ///
    /// Return
    /// ------
    /// * the weight function, or [`L3binError::InvalidWeightCoefficient`]
    ///   for a negative (or NaN) exponent
    pub fn new(coeff: f64) -> Result<Self, L3binError> {
        if !(coeff >= 0.0) {
            return Err(L3binError::InvalidWeightCoefficient(coeff));
        }
        Ok(if coeff == 0.0 {
            WeightFn::One
        } else if coeff == 0.5 {
            WeightFn::Sqrt
        } else {
            WeightFn::Pow(coeff)
        })
    }

    /// Weight of a pass holding `count` observations
    pub fn eval(&self, count: usize) -> f32 {
        match self {
            WeightFn::One => 1.0,
            WeightFn::Sqrt => (count as f32).sqrt(),
            WeightFn::Pow(coeff) => (count as f64).powf(*coeff) as f32,
        }
    }
}
