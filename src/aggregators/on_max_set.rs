//! # Arg-max tuple aggregators (`ON_MAX_SET`, `ON_MAX_SET_WITH_MASK`)
//!
//! Tracks, per bin, the tuple of correlated variable values observed at the
//! moment a designated selection variable attains its running maximum,
//! together with the observation's timestamp. Replacement uses strict `>`,
//! so the first observation wins ties. The masked variant only considers
//! observations whose mask variable is `> 0` and additionally counts them;
//! a bin that never saw an eligible observation reports an all-NaN output.

use smallvec::SmallVec;

use crate::aggregators::Aggregator;
use crate::bin_context::BinContext;
use crate::l3bin_errors::L3binError;
use crate::observation::Observation;
use crate::variable_context::VariableContext;
use crate::vector::{fill_zero, Vector, WritableVector};

/// Copy every slot of `from` into `to`.
fn copy_all(from: &dyn Vector, to: &mut dyn WritableVector) {
    for index in 0..from.size() {
        to.set(index, from.get(index));
    }
}

/// Arg-max tuple reducer, layout `[max, mjd, ...set values]` in every phase
#[derive(Debug)]
pub struct AggregatorOnMaxSet {
    on_max_index: usize,
    set_indexes: SmallVec<[usize; 4]>,
    names: Vec<String>,
}

impl AggregatorOnMaxSet {
    /// Create a configured on-max-set aggregator
    ///
    /// Arguments
    /// ---------
    /// * `variables`: the variable context of the run
    /// * `var_names`: the selection variable followed by the correlated
    ///   "set" variables whose values are captured at the maximum
    ///
    /// Return
    /// ------
    /// * the aggregator, or a configuration error (empty list, unknown
    ///   variable)
    pub fn new(variables: &VariableContext, var_names: &[String]) -> Result<Self, L3binError> {
        let (on_max_name, set_names) = var_names
            .split_first()
            .ok_or_else(|| L3binError::EmptyVariableList("ON_MAX_SET".to_string()))?;
        let on_max_index = variables.require_index(on_max_name)?;
        let set_indexes = set_names
            .iter()
            .map(|name| variables.require_index(name))
            .collect::<Result<SmallVec<[usize; 4]>, _>>()?;

        let mut names = vec![format!("{on_max_name}_max"), format!("{on_max_name}_mjd")];
        names.extend(set_names.iter().cloned());

        Ok(AggregatorOnMaxSet {
            on_max_index,
            set_indexes,
            names,
        })
    }
}

impl Aggregator for AggregatorOnMaxSet {
    fn name(&self) -> &'static str {
        "ON_MAX_SET"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.names
    }

    fn output_feature_names(&self) -> &[String] {
        &self.names
    }

    fn init_spatial(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        fill_zero(vector);
        vector.set(0, f32::NEG_INFINITY);
    }

    fn aggregate_spatial(
        &self,
        _ctx: &mut BinContext,
        observation: &Observation,
        spatial_vector: &mut dyn WritableVector,
    ) {
        let value = observation.get(self.on_max_index);
        // Strict > keeps the first-seen tuple on ties; NaN never wins.
        if value > spatial_vector.get(0) {
            spatial_vector.set(0, value);
            spatial_vector.set(1, observation.mjd() as f32);
            for (slot, var_index) in self.set_indexes.iter().enumerate() {
                spatial_vector.set(2 + slot, observation.get(*var_index));
            }
        }
    }

    fn complete_spatial(
        &self,
        _ctx: &mut BinContext,
        _num_spatial_obs: usize,
        _spatial_vector: &mut dyn WritableVector,
    ) {
    }

    fn init_temporal(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        fill_zero(vector);
        vector.set(0, f32::NEG_INFINITY);
    }

    fn aggregate_temporal(
        &self,
        _ctx: &mut BinContext,
        spatial_vector: &dyn Vector,
        _num_spatial_obs: usize,
        temporal_vector: &mut dyn WritableVector,
    ) {
        if spatial_vector.get(0) > temporal_vector.get(0) {
            copy_all(spatial_vector, temporal_vector);
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
        copy_all(temporal_vector, output_vector);
    }
}

/// Masked arg-max tuple reducer, layout `[max, mjd, count, ...set values]`
///
/// Only observations with mask value `> 0` are eligible; the count slot
/// accumulates how many were ever seen.
#[derive(Debug)]
pub struct AggregatorOnMaxSetWithMask {
    on_max_index: usize,
    mask_index: usize,
    set_indexes: SmallVec<[usize; 4]>,
    names: Vec<String>,
}

impl AggregatorOnMaxSetWithMask {
    /// Create a configured masked on-max-set aggregator
    ///
    /// Arguments
    /// ---------
    /// * `variables`: the variable context of the run
    /// * `on_max_var_name`: the selection variable
    /// * `mask_var_name`: the eligibility mask variable (`> 0` is eligible)
    /// * `set_var_names`: the correlated "set" variables captured at the
    ///   maximum
    ///
    /// Return
    /// ------
    /// * the aggregator, or a configuration error
    pub fn new(
        variables: &VariableContext,
        on_max_var_name: &str,
        mask_var_name: &str,
        set_var_names: &[String],
    ) -> Result<Self, L3binError> {
        let on_max_index = variables.require_index(on_max_var_name)?;
        let mask_index = variables.require_index(mask_var_name)?;
        let set_indexes = set_var_names
            .iter()
            .map(|name| variables.require_index(name))
            .collect::<Result<SmallVec<[usize; 4]>, _>>()?;

        let mut names = vec![
            format!("{on_max_var_name}_max"),
            format!("{on_max_var_name}_mjd"),
            format!("{on_max_var_name}_count"),
        ];
        names.extend(set_var_names.iter().cloned());

        Ok(AggregatorOnMaxSetWithMask {
            on_max_index,
            mask_index,
            set_indexes,
            names,
        })
    }
}

impl Aggregator for AggregatorOnMaxSetWithMask {
    fn name(&self) -> &'static str {
        "ON_MAX_SET_WITH_MASK"
    }

    fn spatial_feature_names(&self) -> &[String] {
        &self.names
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.names
    }

    fn output_feature_names(&self) -> &[String] {
        &self.names
    }

    fn init_spatial(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        fill_zero(vector);
        vector.set(0, f32::NEG_INFINITY);
    }

    fn aggregate_spatial(
        &self,
        _ctx: &mut BinContext,
        observation: &Observation,
        spatial_vector: &mut dyn WritableVector,
    ) {
        if observation.get(self.mask_index) > 0.0 {
            spatial_vector.set(2, spatial_vector.get(2) + 1.0);
            let value = observation.get(self.on_max_index);
            if value > spatial_vector.get(0) {
                spatial_vector.set(0, value);
                spatial_vector.set(1, observation.mjd() as f32);
                for (slot, var_index) in self.set_indexes.iter().enumerate() {
                    spatial_vector.set(3 + slot, observation.get(*var_index));
                }
            }
        }
    }

    fn complete_spatial(
        &self,
        _ctx: &mut BinContext,
        _num_spatial_obs: usize,
        _spatial_vector: &mut dyn WritableVector,
    ) {
    }

    fn init_temporal(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        fill_zero(vector);
        vector.set(0, f32::NEG_INFINITY);
    }

    fn aggregate_temporal(
        &self,
        _ctx: &mut BinContext,
        spatial_vector: &dyn Vector,
        _num_spatial_obs: usize,
        temporal_vector: &mut dyn WritableVector,
    ) {
        // The eligible count sums across passes; the tuple obeys the same
        // strict-max merge as the unmasked variant.
        let count = temporal_vector.get(2) + spatial_vector.get(2);
        if spatial_vector.get(0) > temporal_vector.get(0) {
            copy_all(spatial_vector, temporal_vector);
        }
        temporal_vector.set(2, count);
    }

    fn complete_temporal(
        &self,
        _ctx: &mut BinContext,
        _num_temporal_obs: usize,
        _temporal_vector: &mut dyn WritableVector,
    ) {
    }

    fn compute_output(&self, temporal_vector: &dyn Vector, output_vector: &mut dyn WritableVector) {
        if temporal_vector.get(2) > 0.0 {
            copy_all(temporal_vector, output_vector);
        } else {
            // No eligible observation ever seen for this bin.
            for index in 0..output_vector.size() {
                output_vector.set(index, f32::NAN);
            }
        }
    }
}

#[cfg(test)]
mod on_max_set_test {

    use super::*;

    fn context() -> VariableContext {
        VariableContext::new(["ndvi", "red", "nir", "mask"]).unwrap()
    }

    fn var_names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_captures_tuple_at_running_maximum() {
        let variables = context();
        let agg = AggregatorOnMaxSet::new(&variables, &var_names(&["ndvi", "red", "nir"])).unwrap();
        assert_eq!(
            agg.output_feature_names(),
            &["ndvi_max", "ndvi_mjd", "red", "nir"]
        );

        let mut ctx = BinContext::new();
        let mut spatial = vec![0.0_f32; 4];
        agg.init_spatial(&mut ctx, &mut spatial);

        let observations = [
            (60000.0, [0.3_f32, 10.0, 20.0, 1.0]),
            (60001.0, [0.8, 11.0, 21.0, 1.0]),
            (60002.0, [0.5, 12.0, 22.0, 1.0]),
        ];
        for (mjd, values) in &observations {
            let obs = Observation::new(*mjd, values);
            agg.aggregate_spatial(&mut ctx, &obs, &mut spatial);
        }
        agg.complete_spatial(&mut ctx, 3, &mut spatial);

        assert_eq!(spatial, vec![0.8, 60001.0, 11.0, 21.0]);
    }

    #[test]
    fn test_strict_max_first_seen_wins_ties() {
        let variables = context();
        let agg = AggregatorOnMaxSet::new(&variables, &var_names(&["ndvi", "red"])).unwrap();

        let mut ctx = BinContext::new();
        let mut spatial = vec![0.0_f32; 3];
        agg.init_spatial(&mut ctx, &mut spatial);

        let first = [0.7_f32, 1.0, 0.0, 0.0];
        let second = [0.7_f32, 2.0, 0.0, 0.0];
        agg.aggregate_spatial(&mut ctx, &Observation::new(60000.0, &first), &mut spatial);
        agg.aggregate_spatial(&mut ctx, &Observation::new(60001.0, &second), &mut spatial);

        assert_eq!(spatial[1], 60000.0);
        assert_eq!(spatial[2], 1.0);
    }

    #[test]
    fn test_temporal_merge_keeps_largest_pass() {
        let variables = context();
        let agg = AggregatorOnMaxSet::new(&variables, &var_names(&["ndvi", "red"])).unwrap();

        let mut ctx = BinContext::new();
        let mut temporal = vec![0.0_f32; 3];
        agg.init_temporal(&mut ctx, &mut temporal);

        let pass_a = [0.4_f32, 60000.0, 5.0];
        let pass_b = [0.9_f32, 60010.0, 7.0];
        agg.aggregate_temporal(&mut ctx, &pass_a, 3, &mut temporal);
        agg.aggregate_temporal(&mut ctx, &pass_b, 2, &mut temporal);
        agg.complete_temporal(&mut ctx, 2, &mut temporal);

        let mut output = vec![0.0_f32; 3];
        agg.compute_output(&temporal, &mut output);
        assert_eq!(output, vec![0.9, 60010.0, 7.0]);
    }

    #[test]
    fn test_empty_variable_list_rejected() {
        let variables = context();
        assert_eq!(
            AggregatorOnMaxSet::new(&variables, &[]).unwrap_err(),
            L3binError::EmptyVariableList("ON_MAX_SET".to_string())
        );
    }

    #[test]
    fn test_mask_gates_eligibility_and_counts() {
        let variables = context();
        let agg =
            AggregatorOnMaxSetWithMask::new(&variables, "ndvi", "mask", &var_names(&["red"]))
                .unwrap();
        assert_eq!(
            agg.output_feature_names(),
            &["ndvi_max", "ndvi_mjd", "ndvi_count", "red"]
        );

        let mut ctx = BinContext::new();
        let mut spatial = vec![0.0_f32; 4];
        agg.init_spatial(&mut ctx, &mut spatial);

        let observations = [
            // ineligible despite the largest selection value
            (60000.0, [0.9_f32, 1.0, 0.0, 0.0]),
            (60001.0, [0.5, 2.0, 0.0, 1.0]),
            (60002.0, [0.6, 3.0, 0.0, 2.0]),
        ];
        for (mjd, values) in &observations {
            let obs = Observation::new(*mjd, values);
            agg.aggregate_spatial(&mut ctx, &obs, &mut spatial);
        }

        assert_eq!(spatial, vec![0.6, 60002.0, 2.0, 3.0]);
    }

    #[test]
    fn test_all_ineligible_bin_outputs_nan() {
        let variables = context();
        let agg =
            AggregatorOnMaxSetWithMask::new(&variables, "ndvi", "mask", &var_names(&["red"]))
                .unwrap();

        let mut ctx = BinContext::new();
        let mut spatial = vec![0.0_f32; 4];
        agg.init_spatial(&mut ctx, &mut spatial);
        for mjd in [60000.0, 60001.0] {
            let values = [0.9_f32, 1.0, 0.0, 0.0];
            let obs = Observation::new(mjd, &values);
            agg.aggregate_spatial(&mut ctx, &obs, &mut spatial);
        }
        agg.complete_spatial(&mut ctx, 2, &mut spatial);

        let mut temporal = vec![0.0_f32; 4];
        agg.init_temporal(&mut ctx, &mut temporal);
        agg.aggregate_temporal(&mut ctx, &spatial, 2, &mut temporal);
        agg.complete_temporal(&mut ctx, 1, &mut temporal);

        assert_eq!(temporal[2], 0.0);

        let mut output = vec![0.0_f32; 4];
        agg.compute_output(&temporal, &mut output);
        assert!(output.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_mask_counts_sum_across_passes() {
        let variables = context();
        let agg = AggregatorOnMaxSetWithMask::new(&variables, "ndvi", "mask", &[]).unwrap();

        let mut ctx = BinContext::new();
        let mut temporal = vec![0.0_f32; 3];
        agg.init_temporal(&mut ctx, &mut temporal);

        let pass_a = [0.4_f32, 60000.0, 3.0];
        let pass_b = [0.2_f32, 60010.0, 2.0];
        agg.aggregate_temporal(&mut ctx, &pass_a, 3, &mut temporal);
        agg.aggregate_temporal(&mut ctx, &pass_b, 2, &mut temporal);

        // tuple from pass A, counts from both passes
        assert_eq!(temporal, vec![0.4, 60000.0, 5.0]);
    }
}
