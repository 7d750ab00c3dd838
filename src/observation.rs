use hifitime::Epoch;

use crate::constants::MJD;
use crate::vector::Vector;

/// One pixel measurement event
///
/// An observation borrows its value slice from the caller for the duration
/// of a single spatial-accumulate call; the engine never retains it. Values
/// an aggregator needs later (the arg-max tuples of the on-max-set family)
/// are copied into accumulator slots at accumulation time.
///
/// # Fields
///
/// * `time` - The time of the observation, in Modified Julian Date
/// * `values` - The measured values, indexed via [`crate::variable_context::VariableContext`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<'a> {
    time: MJD,
    values: &'a [f32],
}

impl<'a> Observation<'a> {
    /// Create a new observation
    ///
    /// Arguments
    /// ---------
    /// * `time`: the time of the observation, in Modified Julian Date
    /// * `values`: the measured values, in variable-context order
    ///
    /// Return
    /// ------
    /// * a new Observation struct
    pub fn new(time: MJD, values: &'a [f32]) -> Self {
        Observation { time, values }
    }

    /// Create a new observation from a [`hifitime::Epoch`] timestamp
    pub fn from_epoch(epoch: Epoch, values: &'a [f32]) -> Self {
        Observation::new(epoch.to_mjd_utc_days(), values)
    }

    /// Time of the observation, in Modified Julian Date
    pub fn mjd(&self) -> MJD {
        self.time
    }
}

impl Vector for Observation<'_> {
    fn size(&self) -> usize {
        self.values.len()
    }

    fn get(&self, index: usize) -> f32 {
        self.values[index]
    }
}

#[cfg(test)]
mod observation_test {

    use super::*;

    #[test]
    fn test_observation_views_values() {
        let values = [0.25_f32, f32::NAN, 7.5];
        let obs = Observation::new(54321.5, &values);

        assert_eq!(obs.mjd(), 54321.5);
        assert_eq!(obs.size(), 3);
        assert_eq!(obs.get(0), 0.25);
        assert!(obs.get(1).is_nan());
        assert_eq!(obs.get(2), 7.5);
    }

    #[test]
    fn test_observation_from_epoch() {
        let values = [1.0_f32];
        let epoch = Epoch::from_mjd_utc(60000.25);
        let obs = Observation::from_epoch(epoch, &values);

        assert!((obs.mjd() - 60000.25).abs() < 1e-9);
    }
}
