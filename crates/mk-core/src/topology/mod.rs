//! Topology discovery
//!
//! Fetches the edges of a modeled body, classifies them, and filters them by
//! geometric type, radius (with tolerance) and originating feature.

mod catalog;
mod classify;
mod matcher;

pub use catalog::{EdgeCatalog, RemoteQueryError, TopologyQuery};
pub use classify::{Classified, EdgeDescriptor, GeometryType};
pub use matcher::{
    EdgePredicate, FindEdgesError, MatchValidationError, find_circular_edges,
    find_edges_by_feature, match_edges, matching_edges,
};
