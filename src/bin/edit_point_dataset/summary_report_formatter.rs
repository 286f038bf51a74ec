use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use editpoint_rs::{DroppedCandidate, EditPointConfig};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FailedUtterance {
    pub utterance_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub generated_at: String,
    pub manifest_path: String,
    pub clips_manifest_path: String,
    pub output_dir: String,
    pub config: EditPointConfig,
    pub utterance_count: usize,
    pub processed_utterances: usize,
    pub clip_count: usize,
    pub elapsed_seconds: f64,
    pub failed_utterances: Vec<FailedUtterance>,
    pub dropped_candidates: Vec<DroppedCandidate>,
}

pub fn write_summary(path: &Path, summary: &RunSummary) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            format!(
                "Failed to create summary output directory '{}': {err}",
                parent.display()
            )
        })?;
    }

    let mut file = File::create(path)
        .map_err(|err| format!("Failed to create summary file '{}': {err}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, summary).map_err(|err| {
        format!(
            "Failed to serialize summary JSON '{}': {err}",
            path.display()
        )
    })?;
    file.write_all(b"\n")
        .map_err(|err| format!("Failed to finalize summary file '{}': {err}", path.display()))?;
    Ok(())
}
