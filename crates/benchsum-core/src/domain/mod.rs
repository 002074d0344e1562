//! Domain models for benchsum.
//!
//! - `ResultRecord`: one run's flat metric record
//! - `FieldValue`: closed scalar value type for record fields
//! - `BenchsumError`: error taxonomy shared by every component

pub mod error;
pub mod record;

pub use error::{BenchsumError, Result};
pub use record::{FieldValue, ResultRecord};
