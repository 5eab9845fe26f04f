use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::{Serialize, de::DeserializeOwned};

use crate::config::Config;
use crate::store::repository::ReviewRepository;
use crate::store::schema::{
    EXPORT_VERSION, ExportData, ReviewStatsData, Versioned, WrongWordEntry, WrongWordsData,
};

const WRONG_WORDS_FILE: &str = "wrong_words.json";
const REVIEW_STATS_FILE: &str = "review_stats.json";
const DATA_FILES: [&str; 2] = [WRONG_WORDS_FILE, REVIEW_STATS_FILE];

/// File-backed repository: one pretty-printed JSON document per record.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// A missing file loads as the default. A file with a stale schema is
    /// moved aside to `<name>.stale` and also loads as the default.
    /// Unreadable or unparsable files are errors, so callers never write
    /// over data they could not read.
    fn load<T: DeserializeOwned + Default + Versioned>(&self, name: &str) -> Result<T> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(T::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let data: T = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        if !data.needs_reset() {
            return Ok(data);
        }

        let stale_path = path.with_extension("json.stale");
        fs::rename(&path, &stale_path)
            .with_context(|| format!("moving aside {}", path.display()))?;
        log::warn!(
            "{} has schema version {}, moved to {} and starting fresh",
            path.display(),
            data.schema_version(),
            stale_path.display()
        );
        Ok(T::default())
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        write_synced(&tmp_path, &json)?;
        fs::rename(&tmp_path, &path)?;
        log::debug!("saved {}", path.display());
        Ok(())
    }

    pub fn export_all(&self, config: &Config) -> Result<ExportData> {
        Ok(ExportData {
            wordup_export_version: EXPORT_VERSION,
            exported_at: Utc::now(),
            config: config.clone(),
            wrong_words: self.load(WRONG_WORDS_FILE)?,
            review_stats: self.load(REVIEW_STATS_FILE)?,
        })
    }

    /// Replace all persisted data with `data`.
    ///
    /// Every file is first staged as `.json.tmp`; only when all are staged are
    /// the originals moved to `.json.bak` and the staged files renamed into
    /// place. A failure while committing restores the backups.
    pub fn import_all(&self, data: &ExportData) -> Result<()> {
        if data.wordup_export_version != EXPORT_VERSION {
            bail!(
                "Unsupported export version: {} (expected {})",
                data.wordup_export_version,
                EXPORT_VERSION
            );
        }

        let files = [
            (WRONG_WORDS_FILE, serde_json::to_string_pretty(&data.wrong_words)?),
            (REVIEW_STATS_FILE, serde_json::to_string_pretty(&data.review_stats)?),
        ];

        let mut staged: Vec<PathBuf> = Vec::new();
        for (name, json) in &files {
            let tmp_path = self.file_path(name).with_extension("json.tmp");
            if let Err(e) = write_synced(&tmp_path, json) {
                remove_all(&staged);
                bail!("Import failed during staging: {e}");
            }
            staged.push(tmp_path);
        }

        let mut committed: Vec<Committed> = Vec::new();
        for (i, (name, _)) in files.iter().enumerate() {
            let step = Committed {
                final_path: self.file_path(name),
                bak_path: self.file_path(name).with_extension("json.bak"),
                had_original: self.file_path(name).exists(),
            };

            if step.had_original
                && let Err(e) = fs::rename(&step.final_path, &step.bak_path)
            {
                rollback(&committed);
                remove_all(&staged);
                bail!("Import failed during commit (backup): {e}");
            }

            if let Err(e) = fs::rename(&staged[i], &step.final_path) {
                step.restore();
                rollback(&committed);
                remove_all(&staged[i + 1..]);
                bail!("Import failed during commit (rename): {e}");
            }

            committed.push(step);
        }

        for step in &committed {
            if step.had_original {
                let _ = fs::remove_file(&step.bak_path);
            }
        }
        log::info!("imported data into {}", self.base_dir.display());
        Ok(())
    }

    /// Remove `.bak` files left over from an interrupted import.
    /// Returns true if any were found.
    pub fn check_interrupted_import(&self) -> bool {
        let mut found = false;
        for name in DATA_FILES {
            let bak_path = self.file_path(name).with_extension("json.bak");
            if bak_path.exists() {
                found = true;
                let _ = fs::remove_file(&bak_path);
            }
        }
        found
    }
}

impl ReviewRepository for JsonStore {
    fn load_wrong_words(&self) -> Result<Vec<WrongWordEntry>> {
        Ok(self.load::<WrongWordsData>(WRONG_WORDS_FILE)?.wrong_words)
    }

    fn save_wrong_words(&mut self, entries: &[WrongWordEntry]) -> Result<()> {
        let data = WrongWordsData {
            wrong_words: entries.to_vec(),
            ..WrongWordsData::default()
        };
        self.save(WRONG_WORDS_FILE, &data)
    }

    fn load_review_stats(&self) -> Result<ReviewStatsData> {
        self.load(REVIEW_STATS_FILE)
    }

    fn save_review_stats(&mut self, data: &ReviewStatsData) -> Result<()> {
        self.save(REVIEW_STATS_FILE, data)
    }
}

struct Committed {
    final_path: PathBuf,
    bak_path: PathBuf,
    had_original: bool,
}

impl Committed {
    /// Put the original back, or remove the new file if there was none.
    fn restore(&self) {
        if self.had_original && self.bak_path.exists() {
            let _ = fs::rename(&self.bak_path, &self.final_path);
        } else if !self.had_original {
            let _ = fs::remove_file(&self.final_path);
        }
    }
}

fn rollback(committed: &[Committed]) {
    for step in committed {
        step.restore();
    }
}

fn remove_all(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

fn write_synced(path: &Path, content: &str) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
