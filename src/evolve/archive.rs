//! On-disk run artifacts: elite snapshots and the fusion log.
//!
//! Snapshots capture the fittest seeds at an interval so a run can be
//! analyzed or reseeded later; the fusion log appends every committed
//! fusion as a (left, right, fused, birth) record. Both are JSON; the
//! byte layout beyond that is not part of any contract.

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schema::Seed;

use super::ledger::PopulationLedger;

/// One committed fusion: the two rotated parts as they were joined,
/// the resulting whole, and which birth it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionRecord {
    pub left: Seed,
    pub right: Seed,
    pub fused: Seed,
    pub birth_index: u64,
}

/// Writer for the artifacts of a single run.
#[derive(Debug)]
pub struct RunArchive {
    dir: PathBuf,
    run_id: String,
}

impl RunArchive {
    /// Open (creating if needed) an archive directory for a run.
    pub fn create<P: AsRef<Path>>(dir: P, run_id: &str) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            run_id: run_id.to_string(),
        })
    }

    /// Archive directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the current elite as `<run_id>-elite-<generation>.json`.
    pub fn snapshot_elite(
        &self,
        ledger: &PopulationLedger,
        elite_size: usize,
        generation: usize,
    ) -> io::Result<PathBuf> {
        let elite = ledger.top_k(elite_size);
        let path = self
            .dir
            .join(format!("{}-elite-{}.json", self.run_id, generation));
        let json = serde_json::to_string_pretty(&elite)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Path of this run's fusion log.
    pub fn fusion_log_path(&self) -> PathBuf {
        self.dir.join(format!("{}-fusions.jsonl", self.run_id))
    }

    /// Append one fusion record to the log, one JSON object per line.
    pub fn append_fusion(&self, record: &FusionRecord) -> io::Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.fusion_log_path())?;
        file.write_all(line.as_bytes())
    }
}

/// Load an elite snapshot written by [`RunArchive::snapshot_elite`].
pub fn load_elite<P: AsRef<Path>>(path: P) -> io::Result<Vec<Seed>> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Read a fusion log back in append order.
pub fn load_fusions<P: AsRef<Path>>(path: P) -> io::Result<Vec<FusionRecord>> {
    let file = fs::File::open(path)?;
    let mut records = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        records.push(record);
    }
    Ok(records)
}
