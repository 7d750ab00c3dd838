//! # Binning aggregators
//!
//! This module provides the **three-phase reduction protocol** of the
//! binning engine and its concrete reducers.
//!
//! ## Public API
//!
//! ### [`crate::aggregators::Aggregator`]
//!
//! The polymorphic core abstraction. A configured aggregator folds a stream
//! of observations for one bin in three phases:
//!
//! 1. **spatial** — once per (bin, pass): `init_spatial`, zero or more
//!    `aggregate_spatial` calls, then exactly one `complete_spatial` turning
//!    running sums into a per-pass summary in place;
//! 2. **temporal** — once per bin over the whole analysis period:
//!    `init_temporal`, one `aggregate_temporal` per incoming per-pass
//!    summary, then `complete_temporal`;
//! 3. **output** — exactly one `compute_output` deriving the reported
//!    feature values from the finalized temporal vector.
//!
//! ### Concrete reducers
//!
//! - [`crate::aggregators::average::AggregatorAverage`] – weighted mean and sigma
//! - [`crate::aggregators::average_ml::AggregatorAverageMl`] – log-normal maximum-likelihood moments
//! - [`crate::aggregators::min_max::AggregatorMinMax`] – elementwise minimum and maximum
//! - [`crate::aggregators::percentile::AggregatorPercentile`] – order statistic over per-pass means
//! - [`crate::aggregators::on_max_set::AggregatorOnMaxSet`] – arg-max tuple selection
//! - [`crate::aggregators::on_max_set::AggregatorOnMaxSetWithMask`] – arg-max selection gated by a mask variable
//!
//! Instances are usually built through the registry in
//! [`crate::aggregators::registry`] from a named configuration.

pub mod average;
pub mod average_ml;
pub mod min_max;
pub mod on_max_set;
pub mod percentile;
pub mod registry;

use std::fmt::Debug;

use crate::bin_context::BinContext;
use crate::observation::Observation;
use crate::vector::{Vector, WritableVector};

/// Three-phase statistical reducer over one bin's observation stream
///
/// An aggregator is immutable once constructed; all mutable state lives in
/// the caller-owned accumulator vectors and [`BinContext`]. A configured
/// instance is therefore safe to share read-only between worker threads, as
/// long as each bin's vectors and context are owned by exactly one logical
/// accumulation stream at a time (the engine holds no locks).
pub trait Aggregator: Debug + Send + Sync {
    /// Registry name of the aggregator (e.g. `"AVG"`)
    fn name(&self) -> &'static str;

    /// Feature names of the spatial accumulator, in slot order
    fn spatial_feature_names(&self) -> &[String];

    /// Feature names of the temporal accumulator, in slot order
    fn temporal_feature_names(&self) -> &[String];

    /// Feature names of the output vector, in slot order
    fn output_feature_names(&self) -> &[String];

    /// Configured substitute for NaN in persisted output, NaN when unset
    ///
    /// The engine itself always writes NaN for "no value"; replacing it is
    /// the downstream writer's job.
    fn output_fill_value(&self) -> f32 {
        f32::NAN
    }

    /// Initialize a spatial accumulator for one (bin, pass)
    fn init_spatial(&self, ctx: &mut BinContext, vector: &mut dyn WritableVector);

    /// Fold one observation into the spatial accumulator
    fn aggregate_spatial(
        &self,
        ctx: &mut BinContext,
        observation: &Observation,
        spatial_vector: &mut dyn WritableVector,
    );

    /// Finalize the spatial accumulator into a per-pass summary, in place
    ///
    /// `num_spatial_obs` is the number of observations the pass delivered to
    /// `aggregate_spatial`, valid or not.
    fn complete_spatial(
        &self,
        ctx: &mut BinContext,
        num_spatial_obs: usize,
        spatial_vector: &mut dyn WritableVector,
    );

    /// Initialize a temporal accumulator for one bin
    fn init_temporal(&self, ctx: &mut BinContext, vector: &mut dyn WritableVector);

    /// Fold one per-pass summary into the temporal accumulator
    ///
    /// `num_spatial_obs` is the observation count of the pass that produced
    /// `spatial_vector`; it feeds the weight function.
    fn aggregate_temporal(
        &self,
        ctx: &mut BinContext,
        spatial_vector: &dyn Vector,
        num_spatial_obs: usize,
        temporal_vector: &mut dyn WritableVector,
    );

    /// Finalize the temporal accumulator, in place
    fn complete_temporal(
        &self,
        ctx: &mut BinContext,
        num_temporal_obs: usize,
        temporal_vector: &mut dyn WritableVector,
    );

    /// Derive the reported feature values from the finalized temporal vector
    ///
    /// Idempotent; never mutates temporal state.
    fn compute_output(&self, temporal_vector: &dyn Vector, output_vector: &mut dyn WritableVector);
}

/// Build `<var>_<suffix>` feature names, in suffix order.
pub(crate) fn feature_names(var_name: &str, suffixes: &[&str]) -> Vec<String> {
    suffixes
        .iter()
        .map(|suffix| format!("{var_name}_{suffix}"))
        .collect()
}
