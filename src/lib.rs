pub mod aggregators;
pub mod bin_context;
pub mod constants;
pub mod l3bin_errors;
pub mod observation;
pub mod variable_context;
pub mod vector;
pub mod weight;

pub use crate::aggregators::registry::{AggregatorConfig, AggregatorRegistry};
pub use crate::aggregators::Aggregator;
pub use crate::bin_context::BinContext;
pub use crate::constants::MJD;
pub use crate::l3bin_errors::L3binError;
pub use crate::observation::Observation;
pub use crate::variable_context::VariableContext;
pub use crate::vector::{Vector, WritableVector};
pub use crate::weight::WeightFn;
