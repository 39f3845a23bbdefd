use serde::{Deserialize, Serialize};

use crate::config::{DistanceMetric, Mode};
use crate::error::{VectorError, VectorResult};

pub const FORMAT_VERSION: u16 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u16,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub mode: Mode,
    pub vector_count: usize,
    pub m: usize,
    pub ml: f64,
    pub ef_search: usize,
    pub seed: u64,
}

impl Manifest {
    pub fn check_compatible(&self) -> VectorResult<()> {
        if self.format_version > FORMAT_VERSION {
            return Err(VectorError::ManifestVersion {
                found: self.format_version,
                supported: FORMAT_VERSION,
            });
        }
        Ok(())
    }
}
