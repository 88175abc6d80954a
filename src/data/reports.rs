use crate::engines::evaluation::WorldTrace;
use crate::engines::generation::cross_play::CrossPlayMatrix;
use crate::engines::generation::genome::Tree;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

/// Header plus tab-separated rows, grouped into `Run n` sections.
pub struct RowLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RowLog {
    pub fn create<P: AsRef<Path>>(path: P, title: &str, config_toml: &str) -> Result<Self> {
        Self::create_at(path, title, config_toml, Utc::now())
    }

    pub fn create_at<P: AsRef<Path>>(
        path: P,
        title: &str,
        config_toml: &str,
        started: DateTime<Utc>,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut writer = BufWriter::new(create_file(&path)?);
        writeln!(writer, "{}", title)?;
        writeln!(writer, "Started: {}", started.to_rfc3339())?;
        writeln!(writer)?;
        writeln!(writer, "{}", config_toml.trim_end())?;
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn begin_run(&mut self, run: usize) -> Result<()> {
        writeln!(self.writer)?;
        writeln!(self.writer, "Run {}", run)?;
        Ok(())
    }

    pub fn write_rows<T: Display>(&mut self, rows: &[T]) -> Result<()> {
        for row in rows {
            writeln!(self.writer, "{}", row)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

pub fn write_solution<P: AsRef<Path>>(path: P, tree: &Tree) -> Result<()> {
    let mut file = create_file(path.as_ref())?;
    write!(file, "{}", tree)?;
    Ok(())
}

pub fn write_world<P: AsRef<Path>>(path: P, trace: &WorldTrace) -> Result<()> {
    let mut writer = BufWriter::new(create_file(path.as_ref())?);
    write!(writer, "{}", trace)?;
    writer.flush()?;
    Ok(())
}

/// `{root}_Run{run}_cross_play.txt`
pub fn cross_play_path<P: AsRef<Path>>(root: P, run: usize) -> PathBuf {
    let mut name = root.as_ref().as_os_str().to_owned();
    name.push(format!("_Run{}_cross_play.txt", run));
    PathBuf::from(name)
}

pub fn write_cross_play<P: AsRef<Path>>(root: P, run: usize, matrix: &CrossPlayMatrix) -> Result<PathBuf> {
    let path = cross_play_path(root, run);
    let mut file = create_file(&path)?;
    write!(file, "{}", matrix)?;
    Ok(path)
}

pub fn write_summary<P: AsRef<Path>, T: Serialize>(path: P, summary: &T) -> Result<()> {
    let file = create_file(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    Ok(())
}
