//! # Aggregator registry and configuration
//!
//! Maps registry names (`AVG`, `AVG_ML`, `MIN_MAX`, `PERCENTILE`,
//! `ON_MAX_SET`, `ON_MAX_SET_WITH_MASK`) to factories building configured
//! [`Aggregator`] instances from named parameters. Configurations are a
//! serde-tagged enum so a run description can be read from any serde
//! format; every parameter check happens at construction and fails fast
//! with an [`L3binError`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::aggregators::average::AggregatorAverage;
use crate::aggregators::average_ml::AggregatorAverageMl;
use crate::aggregators::min_max::AggregatorMinMax;
use crate::aggregators::on_max_set::{AggregatorOnMaxSet, AggregatorOnMaxSetWithMask};
use crate::aggregators::percentile::AggregatorPercentile;
use crate::aggregators::Aggregator;
use crate::constants::{DEFAULT_AVG_WEIGHT_COEFF, DEFAULT_ML_WEIGHT_COEFF, DEFAULT_PERCENTAGE};
use crate::l3bin_errors::L3binError;
use crate::variable_context::VariableContext;

/// Named parameters of one aggregator instance
///
/// The `type` tag selects the registry entry; unset optional parameters take
/// the documented defaults (`weight_coeff` 0.0 for `AVG`, 0.5 for `AVG_ML`,
/// `percentage` 90, `fill_value` NaN).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AggregatorConfig {
    #[serde(rename = "AVG")]
    Average {
        var_name: String,
        #[serde(default)]
        weight_coeff: Option<f64>,
        #[serde(default)]
        output_counts: bool,
        #[serde(default)]
        output_sums: bool,
        #[serde(default)]
        fill_value: Option<f32>,
    },
    #[serde(rename = "AVG_ML")]
    AverageMl {
        var_name: String,
        #[serde(default)]
        weight_coeff: Option<f64>,
        #[serde(default)]
        output_sums: bool,
        #[serde(default)]
        fill_value: Option<f32>,
    },
    #[serde(rename = "MIN_MAX")]
    MinMax {
        var_name: String,
        #[serde(default)]
        fill_value: Option<f32>,
    },
    #[serde(rename = "PERCENTILE")]
    Percentile {
        var_name: String,
        #[serde(default)]
        percentage: Option<i32>,
        #[serde(default)]
        fill_value: Option<f32>,
    },
    #[serde(rename = "ON_MAX_SET")]
    OnMaxSet { var_names: Vec<String> },
    #[serde(rename = "ON_MAX_SET_WITH_MASK")]
    OnMaxSetWithMask {
        on_max_var_name: String,
        mask_var_name: String,
        #[serde(default)]
        set_var_names: Vec<String>,
    },
}

impl AggregatorConfig {
    /// Registry name selected by this configuration
    pub fn name(&self) -> &'static str {
        match self {
            AggregatorConfig::Average { .. } => "AVG",
            AggregatorConfig::AverageMl { .. } => "AVG_ML",
            AggregatorConfig::MinMax { .. } => "MIN_MAX",
            AggregatorConfig::Percentile { .. } => "PERCENTILE",
            AggregatorConfig::OnMaxSet { .. } => "ON_MAX_SET",
            AggregatorConfig::OnMaxSetWithMask { .. } => "ON_MAX_SET_WITH_MASK",
        }
    }
}

/// Factory for one registered aggregator kind
pub trait AggregatorDescriptor: Send + Sync {
    /// Registry name this descriptor answers to
    fn name(&self) -> &'static str;

    /// Build a configured aggregator from named parameters
    fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError>;
}

fn mismatched(config: &AggregatorConfig, descriptor: &dyn AggregatorDescriptor) -> L3binError {
    L3binError::MismatchedConfig {
        config: config.name().to_string(),
        descriptor: descriptor.name().to_string(),
    }
}

struct AverageDescriptor;

impl AggregatorDescriptor for AverageDescriptor {
    fn name(&self) -> &'static str {
        "AVG"
    }

    fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError> {
        let AggregatorConfig::Average {
            var_name,
            weight_coeff,
            output_counts,
            output_sums,
            fill_value,
        } = config
        else {
            return Err(mismatched(config, self));
        };
        Ok(Box::new(AggregatorAverage::new(
            variables,
            var_name,
            weight_coeff.unwrap_or(DEFAULT_AVG_WEIGHT_COEFF),
            *output_counts,
            *output_sums,
            fill_value.unwrap_or(f32::NAN),
        )?))
    }
}

struct AverageMlDescriptor;

impl AggregatorDescriptor for AverageMlDescriptor {
    fn name(&self) -> &'static str {
        "AVG_ML"
    }

    fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError> {
        let AggregatorConfig::AverageMl {
            var_name,
            weight_coeff,
            output_sums,
            fill_value,
        } = config
        else {
            return Err(mismatched(config, self));
        };
        Ok(Box::new(AggregatorAverageMl::new(
            variables,
            var_name,
            weight_coeff.unwrap_or(DEFAULT_ML_WEIGHT_COEFF),
            *output_sums,
            fill_value.unwrap_or(f32::NAN),
        )?))
    }
}

struct MinMaxDescriptor;

impl AggregatorDescriptor for MinMaxDescriptor {
    fn name(&self) -> &'static str {
        "MIN_MAX"
    }

    fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError> {
        let AggregatorConfig::MinMax {
            var_name,
            fill_value,
        } = config
        else {
            return Err(mismatched(config, self));
        };
        Ok(Box::new(AggregatorMinMax::new(
            variables,
            var_name,
            fill_value.unwrap_or(f32::NAN),
        )?))
    }
}

struct PercentileDescriptor;

impl AggregatorDescriptor for PercentileDescriptor {
    fn name(&self) -> &'static str {
        "PERCENTILE"
    }

    fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError> {
        let AggregatorConfig::Percentile {
            var_name,
            percentage,
            fill_value,
        } = config
        else {
            return Err(mismatched(config, self));
        };
        Ok(Box::new(AggregatorPercentile::new(
            variables,
            var_name,
            percentage.unwrap_or(DEFAULT_PERCENTAGE),
            fill_value.unwrap_or(f32::NAN),
        )?))
    }
}

struct OnMaxSetDescriptor;

impl AggregatorDescriptor for OnMaxSetDescriptor {
    fn name(&self) -> &'static str {
        "ON_MAX_SET"
    }

    fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError> {
        let AggregatorConfig::OnMaxSet { var_names } = config else {
            return Err(mismatched(config, self));
        };
        Ok(Box::new(AggregatorOnMaxSet::new(variables, var_names)?))
    }
}

struct OnMaxSetWithMaskDescriptor;

impl AggregatorDescriptor for OnMaxSetWithMaskDescriptor {
    fn name(&self) -> &'static str {
        "ON_MAX_SET_WITH_MASK"
    }

    fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError> {
        let AggregatorConfig::OnMaxSetWithMask {
            on_max_var_name,
            mask_var_name,
            set_var_names,
        } = config
        else {
            return Err(mismatched(config, self));
        };
        Ok(Box::new(AggregatorOnMaxSetWithMask::new(
            variables,
            on_max_var_name,
            mask_var_name,
            set_var_names,
        )?))
    }
}

/// Registry of aggregator descriptors, keyed by registry name
pub struct AggregatorRegistry {
    descriptors: HashMap<&'static str, Box<dyn AggregatorDescriptor>>,
}

impl Default for AggregatorRegistry {
    /// Registry holding the six built-in aggregator kinds
    fn default() -> Self {
        let mut registry = AggregatorRegistry {
            descriptors: HashMap::new(),
        };
        registry.register(Box::new(AverageDescriptor));
        registry.register(Box::new(AverageMlDescriptor));
        registry.register(Box::new(MinMaxDescriptor));
        registry.register(Box::new(PercentileDescriptor));
        registry.register(Box::new(OnMaxSetDescriptor));
        registry.register(Box::new(OnMaxSetWithMaskDescriptor));
        registry
    }
}

impl AggregatorRegistry {
    /// Add (or replace) a descriptor under its own name
    pub fn register(&mut self, descriptor: Box<dyn AggregatorDescriptor>) {
        self.descriptors.insert(descriptor.name(), descriptor);
    }

    /// Descriptor registered under `name`, if any
    pub fn descriptor(&self, name: &str) -> Option<&dyn AggregatorDescriptor> {
        self.descriptors
            .get(name)
            .map(|descriptor| descriptor.as_ref())
    }

    /// Build a configured aggregator for `config`
    ///
    /// Arguments
    /// ---------
    /// * `variables`: the variable context of the run
    /// * `config`: the named parameters, tagged with the registry name
    ///
    /// Return
    /// ------
    /// * the aggregator, or a configuration error
    pub fn create_aggregator(
        &self,
        variables: &VariableContext,
        config: &AggregatorConfig,
    ) -> Result<Box<dyn Aggregator>, L3binError> {
        let descriptor = self
            .descriptor(config.name())
            .ok_or_else(|| L3binError::UnknownAggregator(config.name().to_string()))?;
        descriptor.create_aggregator(variables, config)
    }
}

#[cfg(test)]
mod registry_test {

    use super::*;

    #[test]
    fn test_all_builtins_are_registered() {
        let registry = AggregatorRegistry::default();
        for name in [
            "AVG",
            "AVG_ML",
            "MIN_MAX",
            "PERCENTILE",
            "ON_MAX_SET",
            "ON_MAX_SET_WITH_MASK",
        ] {
            assert!(registry.descriptor(name).is_some(), "missing {name}");
        }
        assert!(registry.descriptor("MEDIAN").is_none());
    }

    #[test]
    fn test_create_applies_defaults() {
        let variables = VariableContext::new(["chl"]).unwrap();
        let registry = AggregatorRegistry::default();

        let agg = registry
            .create_aggregator(
                &variables,
                &AggregatorConfig::Percentile {
                    var_name: "chl".to_string(),
                    percentage: None,
                    fill_value: None,
                },
            )
            .unwrap();

        assert_eq!(agg.name(), "PERCENTILE");
        assert_eq!(agg.output_feature_names(), &["chl_p90"]);
        assert!(agg.output_fill_value().is_nan());
    }

    #[test]
    fn test_configuration_errors_fail_fast() {
        let variables = VariableContext::new(["chl"]).unwrap();
        let registry = AggregatorRegistry::default();

        let unknown_var = registry.create_aggregator(
            &variables,
            &AggregatorConfig::MinMax {
                var_name: "tsm".to_string(),
                fill_value: None,
            },
        );
        assert_eq!(
            unknown_var.unwrap_err(),
            L3binError::UnknownVariable("tsm".to_string())
        );

        let bad_weight = registry.create_aggregator(
            &variables,
            &AggregatorConfig::Average {
                var_name: "chl".to_string(),
                weight_coeff: Some(-1.0),
                output_counts: false,
                output_sums: false,
                fill_value: None,
            },
        );
        assert_eq!(
            bad_weight.unwrap_err(),
            L3binError::InvalidWeightCoefficient(-1.0)
        );
    }

    #[test]
    fn test_descriptor_rejects_foreign_config() {
        let variables = VariableContext::new(["chl"]).unwrap();
        let registry = AggregatorRegistry::default();
        let descriptor = registry.descriptor("AVG").unwrap();

        let result = descriptor.create_aggregator(
            &variables,
            &AggregatorConfig::MinMax {
                var_name: "chl".to_string(),
                fill_value: None,
            },
        );
        assert_eq!(
            result.unwrap_err(),
            L3binError::MismatchedConfig {
                config: "MIN_MAX".to_string(),
                descriptor: "AVG".to_string(),
            }
        );
    }
}
