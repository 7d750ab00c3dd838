//! # Maximum-likelihood average aggregator (`AVG_ML`)
//!
//! Log-domain moment algebra for log-normally distributed quantities: the
//! spatial phase accumulates `sum(ln x)` and `sum(ln²x)`, and the output
//! phase applies the closed-form log-normal moment formulas to report
//! `mean`, `sigma`, `median` and `mode`.
//!
//! The weight function is applied twice on purpose: spatial-complete divides
//! the log sums by `WeightFn::eval(pass observation count)` (not by the
//! count itself), pre-applying part of the temporal weighting, and
//! temporal-accumulate adds the same weight to `sum_w`. This mirrors the
//! source behavior and differs from the single application of the plain
//! average.

use crate::aggregators::{feature_names, Aggregator};
use crate::bin_context::BinContext;
use crate::constants::LOG_CLAMP_EPS;
use crate::l3bin_errors::L3binError;
use crate::observation::Observation;
use crate::variable_context::VariableContext;
use crate::vector::{fill_zero, Vector, WritableVector};
use crate::weight::WeightFn;

/// Log-normal maximum-likelihood reducer
///
/// Spatial layout `[sum_log, sum_log_sq]`, temporal layout
/// `[sum_log, sum_log_sq, sum_w]`, output `[mean, sigma, median, mode]` or
/// the three raw sums when `output_sums` is set.
#[derive(Debug)]
pub struct AggregatorAverageMl {
    var_index: usize,
    weight_fn: WeightFn,
    output_sums: bool,
    fill_value: f32,
    spatial_names: Vec<String>,
    temporal_names: Vec<String>,
    output_names: Vec<String>,
}

impl AggregatorAverageMl {
    /// Create a configured maximum-likelihood average aggregator
    ///
    /// Arguments
    /// ---------
    /// * `variables`: the variable context of the run
    /// * `var_name`: the observation variable to average
    /// * `weight_coeff`: exponent of the pass weight power law, `>= 0`
    /// * `output_sums`: report raw log sums instead of derived moments
    /// * `fill_value`: substitute for NaN in persisted output
    ///
    /// Return
    /// ------
    /// * the aggregator, or a configuration error
    pub fn new(
        variables: &VariableContext,
        var_name: &str,
        weight_coeff: f64,
        output_sums: bool,
        fill_value: f32,
    ) -> Result<Self, L3binError> {
        let var_index = variables.require_index(var_name)?;
        let weight_fn = WeightFn::new(weight_coeff)?;

        let output_names = if output_sums {
            feature_names(var_name, &["sum", "sum_sq", "sum_w"])
        } else {
            feature_names(var_name, &["mean", "sigma", "median", "mode"])
        };

        Ok(AggregatorAverageMl {
            var_index,
            weight_fn,
            output_sums,
            fill_value,
            spatial_names: feature_names(var_name, &["sum_log", "sum_log_sq"]),
            temporal_names: feature_names(var_name, &["sum_log", "sum_log_sq", "sum_w"]),
            output_names,
        })
    }
}

impl Aggregator for AggregatorAverageMl {
    fn name(&self) -> &'static str {
        "AVG_ML"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.spatial_names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.temporal_names
    }

    fn output_feature_names(&self) -> &[String] {
        &self.output_names
    }

    fn output_fill_value(&self) -> f32 {
        self.fill_value
    }

    fn init_spatial(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        fill_zero(vector);
    }

    fn aggregate_spatial(
        &self,
        _ctx: &mut BinContext,
        observation: &Observation,
        spatial_vector: &mut dyn WritableVector,
    ) {
        let value = observation.get(self.var_index);
        if value.is_nan() {
            return;
        }
        let clamped = (value as f64).max(LOG_CLAMP_EPS);
        let log_value = clamped.ln();
        spatial_vector.set(0, spatial_vector.get(0) + log_value as f32);
        spatial_vector.set(1, spatial_vector.get(1) + (log_value * log_value) as f32);
    }

    fn complete_spatial(
        &self,
        _ctx: &mut BinContext,
        num_spatial_obs: usize,
        spatial_vector: &mut dyn WritableVector,
    ) {
        // Normalization is by the weight of the pass, not by the observation
        // count; the same weight is accumulated again into sum_w at temporal
        // merge.
        let weight = self.weight_fn.eval(num_spatial_obs);
        spatial_vector.set(0, spatial_vector.get(0) / weight);
        spatial_vector.set(1, spatial_vector.get(1) / weight);
    }

    fn init_temporal(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        fill_zero(vector);
    }

    fn aggregate_temporal(
        &self,
        _ctx: &mut BinContext,
        spatial_vector: &dyn Vector,
        num_spatial_obs: usize,
        temporal_vector: &mut dyn WritableVector,
    ) {
        let weight = self.weight_fn.eval(num_spatial_obs);
        temporal_vector.set(0, temporal_vector.get(0) + spatial_vector.get(0));
        temporal_vector.set(1, temporal_vector.get(1) + spatial_vector.get(1));
        temporal_vector.set(2, temporal_vector.get(2) + weight);
    }

    fn complete_temporal(
        &self,
        _ctx: &mut BinContext,
        _num_temporal_obs: usize,
        _temporal_vector: &mut dyn WritableVector,
    ) {
    }

    fn compute_output(&self, temporal_vector: &dyn Vector, output_vector: &mut dyn WritableVector) {
        if self.output_sums {
            output_vector.set(0, temporal_vector.get(0));
            output_vector.set(1, temporal_vector.get(1));
            output_vector.set(2, temporal_vector.get(2));
            return;
        }

        let sum_log = temporal_vector.get(0) as f64;
        let sum_log_sq = temporal_vector.get(1) as f64;
        let sum_w = temporal_vector.get(2) as f64;

        // Closed-form log-normal distribution moments.
        let avg_log = sum_log / sum_w;
        let var_log = sum_log_sq / sum_w - avg_log * avg_log;
        let mean = (avg_log + 0.5 * var_log).exp();
        let exp_var = var_log.exp();
        let sigma = mean * (exp_var - 1.0).max(0.0).sqrt();
        let median = avg_log.exp();
        let mode = (avg_log - var_log).exp();

        output_vector.set(0, mean as f32);
        output_vector.set(1, sigma as f32);
        output_vector.set(2, median as f32);
        output_vector.set(3, mode as f32);
    }
}
