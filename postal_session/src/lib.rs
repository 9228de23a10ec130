//! Postal plotting session.
//!
//! A [`Session`] owns everything one plot needs: the series cache, the data
//! source, the validity links of the dataset and the two aligned tables
//! (raw and validity-filtered) that renderers read.
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod metadata;
pub mod session;

pub use config::{ConfigError, SessionConfig};
pub use error::SessionError;
pub use metadata::{DatasetMetadata, MetadataError, ValidityLink, ValidityMap};
pub use session::Session;
