use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedPhoneme {
    pub label: String,
    /// Sample interval is [start_sample, end_sample), i.e. start inclusive/end exclusive.
    pub start_sample: usize,
    pub end_sample: usize,
}

impl AlignedPhoneme {
    pub fn duration_samples(&self) -> usize {
        self.end_sample.saturating_sub(self.start_sample)
    }

    pub fn midpoint_sample(&self) -> usize {
        self.start_sample + self.duration_samples() / 2
    }
}

/// Diagnostics the upstream normalizer attaches to every word of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkFlags {
    pub contains_audio_event: bool,
    pub contains_oov_words: bool,
    pub contains_mismatched_words: bool,
}

impl ChunkFlags {
    pub fn any(&self) -> bool {
        self.contains_audio_event || self.contains_oov_words || self.contains_mismatched_words
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedWord {
    pub text: String,
    /// Sample interval is [start_sample, end_sample), i.e. start inclusive/end exclusive.
    pub start_sample: usize,
    pub end_sample: usize,
    /// Words from different chunks were aligned independently; gaps between
    /// them are never edit candidates.
    pub chunk_id: u32,
    #[serde(default)]
    pub chunk_flags: ChunkFlags,
    #[serde(default)]
    pub phonemes: Vec<AlignedPhoneme>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtteranceAlignment {
    pub utterance_id: String,
    pub sample_rate_hz: u32,
    pub words: Vec<AlignedWord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SilenceGap {
    /// End of the preceding word (inclusive start of silence).
    pub start_sample: usize,
    /// Start of the following word (exclusive end of silence).
    pub end_sample: usize,
}

impl SilenceGap {
    pub fn duration_samples(&self) -> usize {
        self.end_sample.saturating_sub(self.start_sample)
    }

    pub fn midpoint_sample(&self) -> usize {
        (self.start_sample + self.end_sample) / 2
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EditCandidate<'a> {
    /// Position in the selector's output for this utterance.
    pub index: usize,
    /// Index of `preceding_word` in the utterance's word list.
    pub word_index: usize,
    pub gap: SilenceGap,
    pub preceding_word: &'a AlignedWord,
    pub following_word: &'a AlignedWord,
    pub gap_duration_samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditType {
    Original,
    Natural,
    Unnatural,
}

impl EditType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Natural => "natural",
            Self::Unnatural => "unnatural",
        }
    }
}

/// Word boundary an unnatural cut was pushed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundarySide {
    Preceding,
    Following,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutSpec {
    pub edit_type: EditType,
    /// Clip interval is [start_sample, end_sample), i.e. start inclusive/end exclusive.
    pub start_sample: usize,
    pub end_sample: usize,
    pub gap: SilenceGap,
    /// Splice location before zero-crossing snapping. `None` for `Original`.
    pub target_sample: Option<usize>,
    /// Splice location after zero-crossing snapping. `None` for `Original`.
    pub splice_sample: Option<usize>,
    /// Pre-snap distance from the word boundary. Only set for `Unnatural`.
    pub invasion_samples: Option<usize>,
    pub invaded_side: Option<BoundarySide>,
    /// True when the splice sits on a detected zero-crossing.
    pub snapped: bool,
}

impl CutSpec {
    pub fn overlaps(&self, other: &CutSpec) -> bool {
        self.start_sample < other.end_sample && other.start_sample < self.end_sample
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CutTriplet {
    pub candidate_index: usize,
    pub gap_duration_samples: usize,
    pub original: CutSpec,
    pub natural: CutSpec,
    pub unnatural: CutSpec,
}

impl CutTriplet {
    pub fn specs(&self) -> [&CutSpec; 3] {
        [&self.original, &self.natural, &self.unnatural]
    }
}

/// One manifest row per rendered clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub utterance_id: String,
    pub candidate_index: usize,
    pub edit_type: EditType,
    pub start_sample: usize,
    pub end_sample: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub splice_sample: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invasion_samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invaded_side: Option<BoundarySide>,
    pub gap_start_sample: usize,
    pub gap_end_sample: usize,
    pub gap_duration_samples: usize,
    pub snapped: bool,
    /// Rate the sample indices above refer to.
    pub sample_rate_hz: u32,
    /// Rate and channel count of the rendered clip itself.
    pub clip_sample_rate_hz: u32,
    pub clip_channels: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<String>,
}

/// Auditable record of a candidate that produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedCandidate {
    pub utterance_id: String,
    pub candidate_index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UtteranceOutput {
    pub records: Vec<ClipRecord>,
    pub dropped: Vec<DroppedCandidate>,
}
