//! # Constants and type definitions for l3bin
//!
//! This module centralizes the **numeric constants** and **common type
//! definitions** used throughout the `l3bin` library.
//!
//! ## Overview
//!
//! - Timestamp representation for observations (Modified Julian Date)
//! - The log-domain clamp used by the maximum-likelihood average
//! - Default configuration values shared by the aggregator registry
//!
//! These definitions are used by the aggregators and by the configuration
//! layer in [`crate::aggregators::registry`].

/// Modified Julian Date, the timestamp representation of an observation
pub type MJD = f64;

/// Lower clamp applied before taking logarithms in the maximum-likelihood
/// average; `ln` is undefined or unstable at or below zero
pub const LOG_CLAMP_EPS: f64 = 1e-9;

/// Default weight coefficient of the plain average aggregator (unweighted
/// temporal mean)
pub const DEFAULT_AVG_WEIGHT_COEFF: f64 = 0.0;

/// Default weight coefficient of the maximum-likelihood average aggregator
pub const DEFAULT_ML_WEIGHT_COEFF: f64 = 0.5;

/// Default percentage of the percentile aggregator
pub const DEFAULT_PERCENTAGE: i32 = 90;
