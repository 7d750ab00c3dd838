//! # Percentile aggregator (`PERCENTILE`)
//!
//! Order statistic over the per-pass means of one variable. The spatial
//! phase reduces a pass to its mean; the temporal phase appends every
//! incoming per-pass mean to a growable buffer in the bin context, so the
//! accumulator is O(number of passes) per bin, not O(1). At
//! temporal-complete the buffer is sorted ascending and the `p`-th
//! percentile is computed with the NIST rank interpolation
//! (1-based indexing):
//!
//! ```text
//! rank = (p / 100) * (N + 1); k = floor(rank); d = rank - k
//! k == 0  -> m[0]
//! k >= N  -> m[N - 1]
//! else    -> m[k - 1] + d * (m[k] - m[k - 1])
//! ```

use crate::aggregators::Aggregator;
use crate::bin_context::BinContext;
use crate::l3bin_errors::L3binError;
use crate::observation::Observation;
use crate::variable_context::VariableContext;
use crate::vector::{fill_zero, Vector, WritableVector};

/// NIST percentile of an ascending-sorted sample; NaN for an empty sample.
fn percentile_of_sorted(sorted: &[f32], percentage: i32) -> f32 {
    let n = sorted.len();
    if n == 0 {
        return f32::NAN;
    }
    let rank = percentage as f64 / 100.0 * (n as f64 + 1.0);
    let k = rank.floor() as usize;
    let d = (rank - k as f64) as f32;
    if k == 0 {
        sorted[0]
    } else if k >= n {
        sorted[n - 1]
    } else {
        sorted[k - 1] + d * (sorted[k] - sorted[k - 1])
    }
}

/// Order-statistic reducer over per-pass means
///
/// Spatial layout `[sum]` (finalized to the per-pass mean), temporal layout
/// `[p<percentage>]` realized at temporal-complete from the buffered means,
/// output a single scalar.
#[derive(Debug)]
pub struct AggregatorPercentile {
    var_index: usize,
    percentage: i32,
    fill_value: f32,
    buffer_key: String,
    spatial_names: Vec<String>,
    temporal_names: Vec<String>,
}

impl AggregatorPercentile {
    /// Create a configured percentile aggregator
    ///
    /// Arguments
    /// ---------
    /// * `variables`: the variable context of the run
    /// * `var_name`: the observation variable to reduce
    /// * `percentage`: the percentile to report, within `[0, 100]`
    /// * `fill_value`: substitute for NaN in persisted output
    ///
    /// Return
    /// ------
    /// * the aggregator, or a configuration error (unknown variable,
    ///   percentage out of range)
    pub fn new(
        variables: &VariableContext,
        var_name: &str,
        percentage: i32,
        fill_value: f32,
    ) -> Result<Self, L3binError> {
        let var_index = variables.require_index(var_name)?;
        if !(0..=100).contains(&percentage) {
            return Err(L3binError::InvalidPercentage(percentage));
        }
        Ok(AggregatorPercentile {
            var_index,
            percentage,
            fill_value,
            buffer_key: format!("{var_name}.p{percentage}"),
            spatial_names: vec![format!("{var_name}_sum")],
            temporal_names: vec![format!("{var_name}_p{percentage}")],
        })
    }
}

impl Aggregator for AggregatorPercentile {
    fn name(&self) -> &'static str {
        "PERCENTILE"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.spatial_names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.temporal_names
    }

    fn output_feature_names(&self) -> &[String] {
        &self.temporal_names
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
        spatial_vector.set(0, spatial_vector.get(0) + observation.get(self.var_index));
    }

    fn complete_spatial(
        &self,
        _ctx: &mut BinContext,
        num_spatial_obs: usize,
        spatial_vector: &mut dyn WritableVector,
    ) {
        // 0 / 0 yields NaN for an empty pass.
        spatial_vector.set(0, spatial_vector.get(0) / num_spatial_obs as f32);
    }

    fn init_temporal(&self, ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        fill_zero(vector);
        ctx.buffer_mut(&self.buffer_key).clear();
    }

    fn aggregate_temporal(
        &self,
        ctx: &mut BinContext,
        spatial_vector: &dyn Vector,
        _num_spatial_obs: usize,
        _temporal_vector: &mut dyn WritableVector,
    ) {
        // One scalar per pass; the placeholder slot stays untouched until
        // temporal-complete realizes the result.
        ctx.buffer_mut(&self.buffer_key).push(spatial_vector.get(0));
    }

    fn complete_temporal(
        &self,
        ctx: &mut BinContext,
        _num_temporal_obs: usize,
        temporal_vector: &mut dyn WritableVector,
    ) {
        let buffer = ctx.buffer_mut(&self.buffer_key);
        // total_cmp keeps a NaN-poisoned pass mean ordered after all finite
        // values, so the sort is deterministic.
        buffer.sort_unstable_by(|a, b| a.total_cmp(b));
        temporal_vector.set(0, percentile_of_sorted(buffer, self.percentage));
    }

    fn compute_output(&self, temporal_vector: &dyn Vector, output_vector: &mut dyn WritableVector) {
        output_vector.set(0, temporal_vector.get(0));
    }
}

#[cfg(test)]
mod percentile_test {

    use super::*;

    fn context() -> VariableContext {
        VariableContext::new(["chl"]).unwrap()
    }

    /// Fold the given per-pass means through the temporal phase and return
    /// the realized percentile.
    fn temporal_result(agg: &AggregatorPercentile, pass_means: &[f32]) -> f32 {
        let mut ctx = BinContext::new();
        let mut temporal = vec![0.0_f32; 1];
        agg.init_temporal(&mut ctx, &mut temporal);
        for mean in pass_means {
            let spatial = [*mean];
            agg.aggregate_temporal(&mut ctx, &spatial, 1, &mut temporal);
        }
        agg.complete_temporal(&mut ctx, pass_means.len(), &mut temporal);
        temporal[0]
    }

    #[test]
    fn test_spatial_phase_produces_pass_mean() {
        let variables = context();
        let agg = AggregatorPercentile::new(&variables, "chl", 90, f32::NAN).unwrap();
        assert_eq!(agg.spatial_feature_names(), &["chl_sum"]);
        assert_eq!(agg.output_feature_names(), &["chl_p90"]);

        let mut ctx = BinContext::new();
        let mut spatial = vec![0.0_f32; 1];
        agg.init_spatial(&mut ctx, &mut spatial);
        for value in [2.0_f32, 4.0, 9.0] {
            let obs_values = [value];
            let obs = Observation::new(60000.0, &obs_values);
            agg.aggregate_spatial(&mut ctx, &obs, &mut spatial);
        }
        agg.complete_spatial(&mut ctx, 3, &mut spatial);

        assert!((spatial[0] - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_median_of_five_pass_means() {
        let variables = context();
        let agg = AggregatorPercentile::new(&variables, "chl", 50, f32::NAN).unwrap();
        assert_eq!(temporal_result(&agg, &[1.0, 2.0, 3.0, 4.0, 5.0]), 3.0);
    }

    #[test]
    fn test_result_is_order_independent() {
        let variables = context();
        let agg = AggregatorPercentile::new(&variables, "chl", 50, f32::NAN).unwrap();

        let orderings = [
            [1.0_f32, 2.0, 3.0, 4.0, 5.0],
            [5.0, 4.0, 3.0, 2.0, 1.0],
            [3.0, 1.0, 5.0, 2.0, 4.0],
            [2.0, 5.0, 1.0, 4.0, 3.0],
        ];
        for means in orderings {
            assert_eq!(temporal_result(&agg, &means), 3.0);
        }
    }

    #[test]
    fn test_boundary_percentages() {
        let variables = context();
        let means = [4.0_f32, 1.5, 9.0, 2.5];

        let agg = AggregatorPercentile::new(&variables, "chl", 0, f32::NAN).unwrap();
        assert_eq!(temporal_result(&agg, &means), 1.5);

        let agg = AggregatorPercentile::new(&variables, "chl", 100, f32::NAN).unwrap();
        assert_eq!(temporal_result(&agg, &means), 9.0);
    }

    #[test]
    fn test_rank_interpolation() {
        let variables = context();
        let agg = AggregatorPercentile::new(&variables, "chl", 25, f32::NAN).unwrap();

        // sorted {1,2,3,4}: rank = 0.25 * 5 = 1.25 -> 1 + 0.25 * (2 - 1)
        assert!((temporal_result(&agg, &[4.0, 3.0, 2.0, 1.0]) - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_empty_buffer_yields_nan() {
        let variables = context();
        let agg = AggregatorPercentile::new(&variables, "chl", 50, f32::NAN).unwrap();
        assert!(temporal_result(&agg, &[]).is_nan());
    }

    #[test]
    fn test_percentage_out_of_range_rejected() {
        let variables = context();
        assert_eq!(
            AggregatorPercentile::new(&variables, "chl", 101, f32::NAN).unwrap_err(),
            L3binError::InvalidPercentage(101)
        );
        assert_eq!(
            AggregatorPercentile::new(&variables, "chl", -1, f32::NAN).unwrap_err(),
            L3binError::InvalidPercentage(-1)
        );
    }
}
