use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use editpoint_rs::ClipRecord;

const JSONL_FLUSH_EVERY: usize = 4096;
const JSONL_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Appends one JSON object per clip to the dataset manifest.
pub struct ClipManifestWriter {
    writer: BufWriter<File>,
    writes_since_flush: usize,
    written: usize,
}

impl ClipManifestWriter {
    pub fn open(path: &Path) -> Result<Self, String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create manifest directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|err| {
                format!(
                    "Failed to open clip manifest '{}' for append: {err}",
                    path.display()
                )
            })?;
        Ok(Self {
            writer: BufWriter::with_capacity(JSONL_BUFFER_CAPACITY, file),
            writes_since_flush: 0,
            written: 0,
        })
    }

    pub fn append(&mut self, record: &ClipRecord) -> Result<(), String> {
        serde_json::to_writer(&mut self.writer, record).map_err(|err| {
            format!(
                "Failed to serialize clip record {}/{} ({}): {err}",
                record.utterance_id,
                record.candidate_index,
                record.edit_type.as_str()
            )
        })?;
        self.writer.write_all(b"\n").map_err(|err| {
            format!(
                "Failed to write trailing newline for utterance '{}': {err}",
                record.utterance_id
            )
        })?;
        self.written += 1;
        self.writes_since_flush += 1;
        if self.writes_since_flush >= JSONL_FLUSH_EVERY {
            self.writer
                .flush()
                .map_err(|err| format!("Failed flushing clip manifest: {err}"))?;
            self.writes_since_flush = 0;
        }
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> Result<(), String> {
        self.writer
            .flush()
            .map_err(|err| format!("Failed finalizing clip manifest: {err}"))
    }
}
