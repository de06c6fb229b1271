//! Replay files on disk: JSON, zstd-compressed when the path ends in `.zst`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use playback_common::Metadata;
use playback_kernel::{MatchHeader, RoundDelta, WorldSnapshot};
use playback_timeline::{Timeline, TimelineConfig};
use playback_tools::SyntheticMatch;
use serde::{Deserialize, Serialize};

const ZSTD_LEVEL: i32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFile {
    #[serde(default)]
    pub metadata: Metadata,
    pub header: MatchHeader,
    #[serde(default)]
    pub rounds: Vec<RoundDelta>,
}

impl From<SyntheticMatch> for ReplayFile {
    fn from(synth: SyntheticMatch) -> Self {
        Self {
            metadata: synth.metadata,
            header: synth.header,
            rounds: synth.rounds,
        }
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

pub fn load(path: &Path) -> Result<ReplayFile> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let replay: ReplayFile = if is_compressed(path) {
        let decoder = zstd::Decoder::new(file)?;
        serde_json::from_reader(BufReader::new(decoder))
    } else {
        serde_json::from_reader(BufReader::new(file))
    }
    .with_context(|| format!("parsing {}", path.display()))?;
    Ok(replay)
}

pub fn save(path: &Path, replay: &ReplayFile) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    if is_compressed(path) {
        let mut encoder = zstd::Encoder::new(file, ZSTD_LEVEL)?;
        serde_json::to_writer(&mut encoder, replay)?;
        encoder.finish()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, replay)?;
        writer.flush()?;
    }
    tracing::info!(path = %path.display(), rounds = replay.rounds.len(), "replay written");
    Ok(())
}

/// Build the round-0 snapshot and record every round into a timeline.
pub fn record(replay: ReplayFile, config: TimelineConfig) -> Result<Timeline> {
    let initial = WorldSnapshot::from_header(&replay.metadata, &replay.header)
        .context("building snapshot from header")?;
    let mut timeline = Timeline::new(initial, config);
    for delta in replay.rounds {
        let round = delta.round_id;
        timeline
            .push(delta)
            .with_context(|| format!("applying round {round}"))?;
    }
    Ok(timeline)
}
