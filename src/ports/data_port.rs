//! Data access port trait.

use crate::domain::dataset::Dataset;
use crate::domain::error::TradelangError;
use std::path::Path;

pub trait DataPort {
    /// Load every bar from `source` into a time-ascending dataset.
    fn load(&self, source: &Path) -> Result<Dataset, TradelangError>;
}
