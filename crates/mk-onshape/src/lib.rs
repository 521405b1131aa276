//! Onshape binding for mk-core
//!
//! Implements [`mk_core::ServiceClient`] over the Onshape REST API:
//! - configuration from environment variables or a RON file
//! - encoding of feature definitions into feature-definition calls
//! - decoding of FeatureScript evaluation results into raw edge records

mod client;
mod config;
pub mod decode;
mod units;
pub mod wire;

pub use client::{OnshapeClient, feature_id_from_response};
pub use config::{ConfigError, OnshapeConfig};
pub use units::LengthUnit;
