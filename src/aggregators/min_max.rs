//! # Minimum/maximum aggregator (`MIN_MAX`)
//!
//! Elementwise running minimum and maximum of one variable, seeded with
//! `[+inf, -inf]`. Every phase takes min/max against the incoming value; no
//! weighting is involved.
//!
//! Unlike the average family, this aggregator does not filter NaN: the
//! comparison helpers propagate NaN the way the source engine's min/max do,
//! so a single NaN observation poisons both slots of the bin from that point
//! on. Preserved deliberately; see `nan_observation_poisons_bin`.

use crate::aggregators::{feature_names, Aggregator};
use crate::bin_context::BinContext;
use crate::l3bin_errors::L3binError;
use crate::observation::Observation;
use crate::variable_context::VariableContext;
use crate::vector::{Vector, WritableVector};

/// NaN-propagating minimum; `f32::min` would silently drop the NaN operand.
#[inline]
fn nan_min(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.min(b)
    }
}

/// NaN-propagating maximum.
#[inline]
fn nan_max(a: f32, b: f32) -> f32 {
    if a.is_nan() || b.is_nan() {
        f32::NAN
    } else {
        a.max(b)
    }
}

/// Running min/max reducer, layout `[min, max]` in every phase
#[derive(Debug)]
pub struct AggregatorMinMax {
    var_index: usize,
    fill_value: f32,
    names: Vec<String>,
}

impl AggregatorMinMax {
    /// Create a configured min/max aggregator
    ///
    /// Arguments
    /// ---------
    /// * `variables`: the variable context of the run
    /// * `var_name`: the observation variable to track
    /// * `fill_value`: substitute for NaN in persisted output
    ///
    /// Return
    /// ------
    /// * the aggregator, or [`L3binError::UnknownVariable`]
    pub fn new(
        variables: &VariableContext,
        var_name: &str,
        fill_value: f32,
    ) -> Result<Self, L3binError> {
        let var_index = variables.require_index(var_name)?;
        Ok(AggregatorMinMax {
            var_index,
            fill_value,
            names: feature_names(var_name, &["min", "max"]),
        })
    }

    fn init(&self, vector: &mut dyn WritableVector) {
        vector.set(0, f32::INFINITY);
        vector.set(1, f32::NEG_INFINITY);
    }
}

impl Aggregator for AggregatorMinMax {
    fn name(&self) -> &'static str {
        "MIN_MAX"
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

    fn output_fill_value(&self) -> f32 {
        self.fill_value
    }

    fn init_spatial(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        self.init(vector);
    }

    fn aggregate_spatial(
        &self,
        _ctx: &mut BinContext,
        observation: &Observation,
        spatial_vector: &mut dyn WritableVector,
    ) {
        let value = observation.get(self.var_index);
        spatial_vector.set(0, nan_min(spatial_vector.get(0), value));
        spatial_vector.set(1, nan_max(spatial_vector.get(1), value));
    }

    fn complete_spatial(
        &self,
        _ctx: &mut BinContext,
        _num_spatial_obs: usize,
        _spatial_vector: &mut dyn WritableVector,
    ) {
    }

    fn init_temporal(&self, _ctx: &mut BinContext, vector: &mut dyn WritableVector) {
        self.init(vector);
    }

    fn aggregate_temporal(
        &self,
        _ctx: &mut BinContext,
        spatial_vector: &dyn Vector,
        _num_spatial_obs: usize,
        temporal_vector: &mut dyn WritableVector,
    ) {
        temporal_vector.set(0, nan_min(temporal_vector.get(0), spatial_vector.get(0)));
        temporal_vector.set(1, nan_max(temporal_vector.get(1), spatial_vector.get(1)));
    }

    fn complete_temporal(
        &self,
        _ctx: &mut BinContext,
        _num_temporal_obs: usize,
        _temporal_vector: &mut dyn WritableVector,
    ) {
    }

    fn compute_output(&self, temporal_vector: &dyn Vector, output_vector: &mut dyn WritableVector) {
        output_vector.set(0, temporal_vector.get(0));
        output_vector.set(1, temporal_vector.get(1));
    }
}
