//! Checkpoint system for saving and loading simulation state.

use crate::config::Config;
use crate::person::{Person, PersonId};
use crate::population::ResourcePool;
use crate::stats::Stats;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

/// Complete simulation state for checkpointing
#[derive(Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Simulation tick
    pub time: u64,
    /// Configuration
    pub config: Config,
    /// All persons
    pub people: Vec<Person>,
    /// Community resource pool
    pub pool: ResourcePool,
    /// Current statistics
    pub stats: Stats,
    /// Next person ID
    pub next_person_id: PersonId,
    /// Random seed (for reproducibility)
    pub random_seed: u64,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    /// Create a new checkpoint
    pub fn new(
        time: u64,
        config: Config,
        people: Vec<Person>,
        pool: ResourcePool,
        stats: Stats,
        next_person_id: PersonId,
        random_seed: u64,
    ) -> Self {
        Self {
            version: Self::VERSION,
            time,
            config,
            people,
            pool,
            stats,
            next_person_id,
            random_seed,
        }
    }

    /// Save checkpoint to a binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        // magic bytes for identification
        writer.write_all(b"SGEN")?;

        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;

        Ok(())
    }

    /// Load checkpoint from a binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != b"SGEN" {
            return Err(CheckpointError::InvalidFormat(
                "invalid magic bytes".to_string(),
            ));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }

        Ok(checkpoint)
    }

    /// Approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Errors that can occur during checkpoint operations
#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    Serialization(bincode::Error),
    InvalidFormat(String),
    VersionMismatch { expected: u32, found: u32 },
}

impl std::fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Serialization(e) => write!(f, "serialization error: {}", e),
            Self::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            Self::VersionMismatch { expected, found } => {
                write!(f, "version mismatch: expected {}, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for CheckpointError {}

impl From<std::io::Error> for CheckpointError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(e: bincode::Error) -> Self {
        Self::Serialization(e)
    }
}

/// Checkpoint manager for automatic interval saving and rotation
pub struct CheckpointManager {
    base_dir: PathBuf,
    /// Ticks between checkpoints
    pub interval: u64,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    last_checkpoint: u64,
}

const CHECKPOINT_PREFIX: &str = "checkpoint_";
const CHECKPOINT_EXT: &str = "bin";

impl CheckpointManager {
    /// Create a new checkpoint manager rooted at `base_dir`
    pub fn new<P: Into<PathBuf>>(base_dir: P, interval: u64, max_checkpoints: usize) -> Self {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir).ok();

        Self {
            base_dir,
            interval,
            max_checkpoints,
            last_checkpoint: 0,
        }
    }

    /// Should a checkpoint be saved at this tick
    pub fn should_save(&self, time: u64) -> bool {
        self.interval > 0
            && time > 0
            && time % self.interval == 0
            && time != self.last_checkpoint
    }

    /// Checkpoint file path for a tick
    pub fn checkpoint_path(&self, time: u64) -> PathBuf {
        self.base_dir
            .join(format!("{CHECKPOINT_PREFIX}{time:08}.{CHECKPOINT_EXT}"))
    }

    /// Save a checkpoint and rotate old files
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.time);
        checkpoint.save(&path)?;
        self.last_checkpoint = checkpoint.time;

        self.rotate()?;

        Ok(path)
    }

    // Managed checkpoint files, oldest first. Zero-padded tick numbers
    // make the lexical sort chronological.
    fn checkpoint_files(&self) -> Result<Vec<PathBuf>, CheckpointError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension().map_or(false, |ext| ext == CHECKPOINT_EXT)
                    && path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .map_or(false, |name| name.starts_with(CHECKPOINT_PREFIX))
            })
            .collect();
        files.sort();
        Ok(files)
    }

    // Drop the oldest files beyond the retention limit
    fn rotate(&self) -> Result<(), CheckpointError> {
        let files = self.checkpoint_files()?;
        let excess = files.len().saturating_sub(self.max_checkpoints);
        for path in files.into_iter().take(excess) {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Most recent managed checkpoint, if any
    pub fn find_latest(&self) -> Option<PathBuf> {
        self.checkpoint_files().ok()?.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::PersonParams;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_checkpoint() -> Checkpoint {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = Config::default();
        Checkpoint::new(
            1000,
            config,
            vec![Person::new(1, PersonParams::default(), &mut rng)],
            ResourcePool::default(),
            Stats::default(),
            2,
            12345,
        )
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let checkpoint = create_test_checkpoint();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_checkpoint.bin");

        checkpoint.save(&path).unwrap();
        let loaded = Checkpoint::load(&path).unwrap();

        assert_eq!(loaded.time, checkpoint.time);
        assert_eq!(loaded.people.len(), checkpoint.people.len());
        assert_eq!(loaded.random_seed, checkpoint.random_seed);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"NOPEnot a checkpoint").unwrap();

        assert!(matches!(
            Checkpoint::load(&path),
            Err(CheckpointError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_checkpoint_size() {
        let checkpoint = create_test_checkpoint();
        let size = checkpoint.size_bytes();

        assert!(size > 0);
        assert!(size < 1_000_000);
    }

    #[test]
    fn test_manager_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = CheckpointManager::new(dir.path(), 10, 2);

        for time in [10, 20, 30] {
            let mut checkpoint = create_test_checkpoint();
            checkpoint.time = time;
            manager.save(&checkpoint).unwrap();
        }

        let kept: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(kept.len(), 2);

        let latest = manager.find_latest().unwrap();
        assert_eq!(latest, manager.checkpoint_path(30));
    }

    #[test]
    fn test_manager_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), 10, 2);

        std::fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();
        assert!(manager.find_latest().is_none());
    }

    #[test]
    fn test_manager_zero_interval_never_saves() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path(), 0, 2);

        for time in [0, 1, 10, 500] {
            assert!(!manager.should_save(time));
        }
    }
}
