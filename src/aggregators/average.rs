//! # Weighted average aggregator (`AVG`)
//!
//! Two-stage reduction to a weighted mean and standard deviation:
//!
//! - the spatial phase accumulates `sum` and `sum_sq` of the valid values of
//!   one pass, finalized in place to the per-pass sample mean and
//!   mean-of-squares;
//! - the temporal phase merges per-pass summaries weighted by
//!   `WeightFn::eval(pass observation count)`;
//! - the output phase reports either the raw sufficient statistics
//!   (`outputSums`) or the derived `mean`/`sigma`.
//!
//! NaN observation values are a first-class run-time condition: they are
//! excluded and counted, either in the dedicated count slot (`outputCounts`)
//! or through an invalid-observation counter in the bin context so the valid
//! count can be derived as `num_spatial_obs - invalid`.

use crate::aggregators::{feature_names, Aggregator};
use crate::bin_context::BinContext;
use crate::l3bin_errors::L3binError;
use crate::observation::Observation;
use crate::variable_context::VariableContext;
use crate::vector::{fill_zero, Vector, WritableVector};
use crate::weight::WeightFn;

/// Weighted mean / standard deviation reducer
///
/// Spatial layout `[sum, sum_sq, (counts)]`, temporal layout
/// `[sum, sum_sq, sum_w, (counts)]`, output `[mean, sigma, (counts)]` or
/// `[sum, sum_sq, sum_w, (counts)]` when `output_sums` is set.
#[derive(Debug)]
pub struct AggregatorAverage {
    var_index: usize,
    weight_fn: WeightFn,
    output_counts: bool,
    output_sums: bool,
    fill_value: f32,
    invalid_key: String,
    spatial_names: Vec<String>,
    temporal_names: Vec<String>,
    output_names: Vec<String>,
}

impl AggregatorAverage {
    /// Create a configured average aggregator
    ///
    /// Arguments
    /// ---------
    /// * `variables`: the variable context of the run
    /// * `var_name`: the observation variable to average
    /// * `weight_coeff`: exponent of the pass weight power law, `>= 0`
    /// * `output_counts`: report the accumulated valid-observation count
    /// * `output_sums`: report raw sums instead of derived mean/sigma
    /// * `fill_value`: substitute for NaN in persisted output
    ///
    /// Return
    /// ------
    /// * the aggregator, or a configuration error (unknown variable,
    ///   negative weight coefficient)
    pub fn new(
        variables: &VariableContext,
        var_name: &str,
        weight_coeff: f64,
        output_counts: bool,
        output_sums: bool,
        fill_value: f32,
    ) -> Result<Self, L3binError> {
        let var_index = variables.require_index(var_name)?;
        let weight_fn = WeightFn::new(weight_coeff)?;

        let mut spatial_names = feature_names(var_name, &["sum", "sum_sq"]);
        let mut temporal_names = feature_names(var_name, &["sum", "sum_sq", "sum_w"]);
        let mut output_names = if output_sums {
            feature_names(var_name, &["sum", "sum_sq", "sum_w"])
        } else {
            feature_names(var_name, &["mean", "sigma"])
        };
        if output_counts {
            let counts_name = format!("{var_name}_counts");
            spatial_names.push(counts_name.clone());
            temporal_names.push(counts_name.clone());
            output_names.push(counts_name);
        }

        Ok(AggregatorAverage {
            var_index,
            weight_fn,
            output_counts,
            output_sums,
            fill_value,
            invalid_key: format!("{var_name}.invalid"),
            spatial_names,
            temporal_names,
            output_names,
        })
    }

    /// Valid-observation count of one finalized-in-progress pass.
    fn pass_count(
        &self,
        ctx: &BinContext,
        num_spatial_obs: usize,
        spatial_vector: &dyn WritableVector,
    ) -> u32 {
        if self.output_counts {
            spatial_vector.get(2) as u32
        } else {
            (num_spatial_obs as u32).saturating_sub(ctx.counter(&self.invalid_key))
        }
    }
}

impl Aggregator for AggregatorAverage {
    fn name(&self) -> &'static str {
        "AVG"
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
        ctx: &mut BinContext,
        observation: &Observation,
        spatial_vector: &mut dyn WritableVector,
    ) {
        let value = observation.get(self.var_index);
        if !value.is_nan() {
            spatial_vector.set(0, spatial_vector.get(0) + value);
            spatial_vector.set(1, spatial_vector.get(1) + value * value);
            if self.output_counts {
                spatial_vector.set(2, spatial_vector.get(2) + 1.0);
            }
        } else if !self.output_counts {
            *ctx.counter_mut(&self.invalid_key) += 1;
        }
    }

    fn complete_spatial(
        &self,
        ctx: &mut BinContext,
        num_spatial_obs: usize,
        spatial_vector: &mut dyn WritableVector,
    ) {
        let count = self.pass_count(ctx, num_spatial_obs, spatial_vector);
        if count > 0 {
            spatial_vector.set(0, spatial_vector.get(0) / count as f32);
            spatial_vector.set(1, spatial_vector.get(1) / count as f32);
        } else {
            // An empty pass; NaN is propagated and excluded at temporal merge.
            spatial_vector.set(0, f32::NAN);
            spatial_vector.set(1, f32::NAN);
        }
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
        let sum = spatial_vector.get(0);
        if !sum.is_nan() {
            let weight = self.weight_fn.eval(num_spatial_obs);
            temporal_vector.set(0, temporal_vector.get(0) + weight * sum);
            temporal_vector.set(1, temporal_vector.get(1) + weight * spatial_vector.get(1));
            temporal_vector.set(2, temporal_vector.get(2) + weight);
            if self.output_counts {
                temporal_vector.set(3, temporal_vector.get(3) + spatial_vector.get(2));
            }
        }
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
            if self.output_counts {
                output_vector.set(3, temporal_vector.get(3));
            }
            return;
        }

        let sum_x = temporal_vector.get(0) as f64;
        let sum_xx = temporal_vector.get(1) as f64;
        let sum_w = temporal_vector.get(2) as f64;
        if sum_w > 0.0 {
            let mean = sum_x / sum_w;
            // Slightly negative variance can fall out of the float algebra;
            // clamp instead of letting sqrt produce NaN.
            let sigma_sqr = sum_xx / sum_w - mean * mean;
            let sigma = if sigma_sqr > 0.0 { sigma_sqr.sqrt() } else { 0.0 };
            output_vector.set(0, mean as f32);
            output_vector.set(1, sigma as f32);
            if self.output_counts {
                output_vector.set(2, temporal_vector.get(3));
            }
        } else {
            output_vector.set(0, f32::NAN);
            output_vector.set(1, f32::NAN);
            if self.output_counts {
                output_vector.set(2, 0.0);
            }
        }
    }
}
