use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::{Parser, ValueEnum};
use editpoint_rs::{
    load_alignment, DroppedCandidate, EditPointConfig, EditPointEngine, EditPointEngineBuilder,
    UtteranceOutput, WaveformAccess, Waveform, WavEncoding,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[path = "edit_point_dataset/manifest_writer.rs"]
mod manifest_writer;
#[path = "edit_point_dataset/summary_report_formatter.rs"]
mod summary_report_formatter;

use summary_report_formatter::{FailedUtterance, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EncodingChoice {
    Pcm16,
    Float32,
}

impl From<EncodingChoice> for WavEncoding {
    fn from(choice: EncodingChoice) -> Self {
        match choice {
            EncodingChoice::Pcm16 => WavEncoding::Pcm16,
            EncodingChoice::Float32 => WavEncoding::Float32,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "edit_point_dataset")]
#[command(about = "Generate original/natural/unnatural edit clips from aligned speech")]
struct Args {
    /// JSONL file with one `{utterance_id, audio_path, alignment_path}` object per line.
    #[arg(long, env = "EDITPOINT_MANIFEST")]
    manifest: PathBuf,
    #[arg(long, env = "EDITPOINT_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "EDITPOINT_OUT_DIR", default_value = "target/edit_points")]
    out_dir: PathBuf,
    /// Defaults to `<out-dir>/clips.jsonl`.
    #[arg(long, env = "EDITPOINT_CLIPS_MANIFEST")]
    clips_manifest: Option<PathBuf>,
    #[arg(long, env = "EDITPOINT_SEED")]
    seed: Option<u64>,
    #[arg(long, env = "EDITPOINT_WORKERS")]
    workers: Option<usize>,
    #[arg(
        long,
        env = "EDITPOINT_ENCODING",
        value_enum,
        default_value_t = EncodingChoice::Pcm16
    )]
    encoding: EncodingChoice,
    /// Write mono clips (channel mean) regardless of the source layout.
    #[arg(long, env = "EDITPOINT_MONO")]
    mono: bool,
    /// Resample every clip to this rate. Defaults to the source rate.
    #[arg(long, env = "EDITPOINT_CLIP_SAMPLE_RATE")]
    clip_sample_rate: Option<u32>,
    #[arg(long, env = "EDITPOINT_LIMIT")]
    limit: Option<usize>,
    #[arg(long, env = "EDITPOINT_OFFSET", default_value_t = 0)]
    offset: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestEntry {
    utterance_id: String,
    audio_path: PathBuf,
    alignment_path: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    let started = Instant::now();

    let mut config = match args.config.as_ref() {
        Some(path) => EditPointConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => EditPointConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    if let Some(workers) = args.workers {
        config.worker_threads = workers;
    }
    if args.mono {
        config.clip_format.mono = true;
    }
    if let Some(rate) = args.clip_sample_rate {
        config.clip_format.sample_rate_hz = Some(rate);
    }

    let mut entries = load_manifest(&args.manifest)?;
    if args.offset > 0 {
        entries = entries.into_iter().skip(args.offset).collect();
    }
    if let Some(limit) = args.limit {
        entries.truncate(limit);
    }
    if entries.is_empty() {
        return Err("No utterances selected after applying offset/limit.".to_string());
    }

    let engine = EditPointEngineBuilder::new(config)
        .with_wav_output(&args.out_dir, args.encoding.into())
        .build()
        .map_err(|err| format!("Failed to build edit-point engine: {err}"))?;

    let clips_manifest_path = args
        .clips_manifest
        .clone()
        .unwrap_or_else(|| args.out_dir.join("clips.jsonl"));
    let mut clip_writer = manifest_writer::ClipManifestWriter::open(&clips_manifest_path)?;

    let progress = ProgressBar::new(entries.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-"),
    );
    progress.set_message("starting...");

    let mut processed = 0usize;
    let mut failed: Vec<FailedUtterance> = Vec::new();
    let mut dropped: Vec<DroppedCandidate> = Vec::new();
    for entry in &entries {
        progress.set_message(entry.utterance_id.clone());
        match process_entry(&engine, entry) {
            Ok(output) => {
                for record in &output.records {
                    clip_writer.append(record)?;
                }
                dropped.extend(output.dropped);
                processed += 1;
            }
            Err(error) => {
                tracing::warn!(utterance_id = entry.utterance_id.as_str(), %error, "skipping utterance");
                failed.push(FailedUtterance {
                    utterance_id: entry.utterance_id.clone(),
                    error,
                });
            }
        }
        progress.inc(1);
    }
    progress.finish_with_message("edit-point pass complete");

    let clip_count = clip_writer.written();
    clip_writer.finish()?;

    let summary = RunSummary {
        schema_version: 1,
        generated_at: Utc::now().to_rfc3339(),
        manifest_path: args.manifest.display().to_string(),
        clips_manifest_path: clips_manifest_path.display().to_string(),
        output_dir: args.out_dir.display().to_string(),
        config: engine.config().clone(),
        utterance_count: entries.len(),
        processed_utterances: processed,
        clip_count,
        elapsed_seconds: started.elapsed().as_secs_f64(),
        failed_utterances: failed,
        dropped_candidates: dropped,
    };
    let summary_path = args.out_dir.join("summary.json");
    summary_report_formatter::write_summary(&summary_path, &summary)?;

    println!(
        "processed {processed}/{} utterance(s), wrote {clip_count} clip(s), dropped {} candidate(s)",
        summary.utterance_count,
        summary.dropped_candidates.len()
    );
    println!("{}", clips_manifest_path.display());
    println!("{}", summary_path.display());
    Ok(())
}

fn process_entry(engine: &EditPointEngine, entry: &ManifestEntry) -> Result<UtteranceOutput, String> {
    require_path_exists(&entry.audio_path, "Missing audio file referenced by manifest.")?;
    require_path_exists(
        &entry.alignment_path,
        "Missing alignment file referenced by manifest.",
    )?;

    let waveform = Waveform::load(&entry.audio_path).map_err(|err| err.to_string())?;
    let mut alignment = load_alignment(
        &entry.alignment_path,
        &entry.utterance_id,
        waveform.sample_rate_hz(),
    )
    .map_err(|err| err.to_string())?;
    if alignment.utterance_id != entry.utterance_id {
        tracing::debug!(
            manifest_id = entry.utterance_id.as_str(),
            alignment_id = alignment.utterance_id.as_str(),
            "using manifest utterance id"
        );
        alignment.utterance_id = entry.utterance_id.clone();
    }

    engine
        .process_utterance(&alignment, &waveform)
        .map_err(|err| err.to_string())
}

/// Reads the JSONL manifest; relative paths resolve against its directory.
fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, String> {
    require_path_exists(path, "Missing --manifest path.")?;
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read manifest '{}': {err}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut entries = Vec::new();
    for (line_no, raw_line) in contents.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut entry: ManifestEntry = serde_json::from_str(line).map_err(|err| {
            format!(
                "Failed to parse manifest line {} in '{}': {err}",
                line_no + 1,
                path.display()
            )
        })?;
        entry.audio_path = resolve_path(base_dir, &entry.audio_path);
        entry.alignment_path = resolve_path(base_dir, &entry.alignment_path);
        entries.push(entry);
    }
    Ok(entries)
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn require_path_exists(path: &Path, message: &str) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    Err(format!("{message} Missing path: {}", path.display()))
}
