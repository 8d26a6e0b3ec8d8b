use super::LessonBatch;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::info;
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// A trait for the collaborators persisting solved timetables.
///
/// A batch is committed as a whole: if the commit fails, none of its lessons must be considered stored.
pub trait LessonStore {
    /// Commits the batch of a day, replacing any batch previously committed for the same day.
    fn commit(&mut self, batch: &LessonBatch) -> Result<()>;
}

/// A lesson store keeping the batches in memory.
#[derive(Debug, Default)]
pub struct MemoryLessonStore {
    batches: BTreeMap<NaiveDate, LessonBatch>,
}

impl MemoryLessonStore {
    /// Returns the batch committed for a day, if any.
    pub fn batch(&self, date: NaiveDate) -> Option<&LessonBatch> {
        self.batches.get(&date)
    }

    /// Returns the number of days with a committed batch.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    /// Returns `true` iff no batch was committed.
    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

impl LessonStore for MemoryLessonStore {
    fn commit(&mut self, batch: &LessonBatch) -> Result<()> {
        self.batches.insert(batch.date, batch.clone());
        Ok(())
    }
}

/// A lesson store writing each batch as a JSON file in a directory.
///
/// The batch of a day goes to `lessons-YYYY-MM-DD.json`.
/// It is first written to a temporary file which is then renamed, so that a failure never leaves a partial batch.
pub struct JsonFileLessonStore {
    directory: PathBuf,
}

impl JsonFileLessonStore {
    /// Builds a store writing in the given directory.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Returns the path of the file holding the batch of a day.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.directory
            .join(format!("lessons-{}.json", date.format("%Y-%m-%d")))
    }
}

impl LessonStore for JsonFileLessonStore {
    fn commit(&mut self, batch: &LessonBatch) -> Result<()> {
        let path = self.path_for(batch.date);
        let tmp_path = path.with_extension("json.tmp");
        let write = || -> Result<()> {
            let file = File::create(&tmp_path)
                .with_context(|| format!("while creating file {:?}", tmp_path))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, batch)
                .context("while serializing the lesson batch")?;
            writer.flush().context("while writing the lesson batch")?;
            fs::rename(&tmp_path, &path)
                .with_context(|| format!("while moving {:?} to {:?}", tmp_path, path))
        };
        if let Err(e) = write() {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        info!("committed {} lesson(s) to {:?}", batch.lessons.len(), path);
        Ok(())
    }
}
