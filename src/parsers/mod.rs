pub mod gocover;

use std::path::Path;

use crate::error::Result;
use crate::model::ProfileData;

/// Every coverage profile parser implements this trait.
pub trait ProfileParser {
    /// Parse the input bytes into our profile model.
    fn parse(&self, input: &[u8]) -> Result<ProfileData>;

    /// Read and parse a profile from disk.
    fn parse_file(&self, path: &Path) -> Result<ProfileData> {
        let content = std::fs::read(path)?;
        self.parse(&content)
    }
}
