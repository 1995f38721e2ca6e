/// JSON run summary written alongside the point cloud.
use crate::bounds::PointCloudBounds;
use crate::config::{OutputFormat, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::exporter::StagedFile;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Everything needed to reproduce or audit one conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub tool_version: String,
    pub format: OutputFormat,
    /// Working resolution after resizing.
    pub width: usize,
    pub height: usize,
    /// Dither cells that became point candidates.
    pub candidate_points: usize,
    /// Points that passed filtering and were written.
    pub exported_points: usize,
    pub bounds: Option<PointCloudBounds>,
    /// Whether a leveling correction was applied.
    pub leveled: bool,
    pub config: PipelineConfig,
}

impl RunMetadata {
    /// `<output>.json`, next to the point cloud.
    pub fn path_for(output: &Path) -> PathBuf {
        let is_json = output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            output.with_extension("meta.json")
        } else {
            output.with_extension("json")
        }
    }

    /// Serialise to a staged file at `path`.
    pub fn stage(&self, path: &Path) -> Result<StagedFile> {
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            PipelineError::MetadataEncode {
                path: path.to_path_buf(),
                source,
            }
        })?;

        StagedFile::write(path, |writer| writeln!(writer, "{json}"))
    }
}
