//! VelociTrack: serves seismic velocity models as VELEST (1D) and
//! pipe-delimited (3D) text exports.

pub mod config;
pub mod data;
pub mod discovery;
pub mod error;
pub mod format;
pub mod query;
pub mod server;

pub use config::Config;
pub use data::store::{Catalog, RecordStore};
pub use error::{QueryError, StoreError};
