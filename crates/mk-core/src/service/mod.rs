//! Remote Modeling Service abstraction
//!
//! The core never holds ambient connection state: every operation that talks
//! to the modeler receives a [`ServiceClient`] explicitly.

mod traits;

pub use traits::{
    BodyReference, NullClient, RawEdgeRecord, ServiceClient, ServiceError, ServiceResult,
};
