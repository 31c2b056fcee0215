//! The screenshot organizer: renames loose screenshots into canonical
//! names and moves them into `YYYY-MM` folders under the watched root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;

use crate::config::Config;
use crate::counter::CounterStore;
use crate::error::Result;
use crate::naming::{self, CanonicalName};

/// Resolves when a file was created, as local wall-clock time.
pub trait CreationTime: Send {
    /// # Errors
    ///
    /// Returns the underlying I/O error if metadata cannot be read.
    fn created_at(&self, path: &Path) -> io::Result<NaiveDateTime>;
}

/// Reads the birth time from file metadata, falling back to the
/// modification time where the filesystem does not record birth times.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsCreationTime;

impl CreationTime for FsCreationTime {
    fn created_at(&self, path: &Path) -> io::Result<NaiveDateTime> {
        let meta = fs::metadata(path)?;
        let time = meta.created().or_else(|_| meta.modified())?;
        Ok(DateTime::<Local>::from(time).naive_local())
    }
}

/// Why a path was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Missing, a directory, or some other non-regular file.
    NotAFile,
    /// Not a screenshot image.
    WrongExtension,
    /// Canonically named and already inside a month folder.
    AlreadySorted,
}

/// A completed rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Move {
    pub from: PathBuf,
    pub to: PathBuf,
    pub sequence: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disambiguator: Option<u64>,
}

/// Result of [`Organizer::process`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Moved(Move),
    Skipped(SkipReason),
}

/// Summary of a startup sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub moved: Vec<Move>,
    pub skipped: usize,
}

/// Organizer state: configuration, counters, and the creation-time source.
pub struct Organizer {
    config: Config,
    counters: CounterStore,
    clock: Box<dyn CreationTime>,
}

impl Organizer {
    /// Load the counter store for `config` and use filesystem timestamps.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`CounterStore::load`].
    pub fn open(config: Config) -> Result<Self> {
        Self::with_clock(config, FsCreationTime)
    }

    /// Like [`Organizer::open`] with a custom creation-time source.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`CounterStore::load`].
    pub fn with_clock(config: Config, clock: impl CreationTime + 'static) -> Result<Self> {
        let counters = CounterStore::load(&config.counter_path())?;
        Ok(Self {
            config,
            counters,
            clock: Box::new(clock),
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn counters(&self) -> &CounterStore {
        &self.counters
    }

    /// Rename and move one screenshot.
    ///
    /// Irrelevant paths come back as [`Outcome::Skipped`]. The sequence
    /// id is reserved before the move and never returned, so a failed
    /// move leaves a gap for that day.
    ///
    /// # Errors
    ///
    /// Returns [`ShotsortError::Io`](crate::ShotsortError::Io) for any
    /// failed stat, mkdir, rename, or counter write, and
    /// [`ShotsortError::Counter`](crate::ShotsortError::Counter) if the
    /// day's counter cannot advance.
    pub fn process(&mut self, path: &Path) -> Result<Outcome> {
        if let Some(reason) = self.skip_reason(path) {
            match reason {
                SkipReason::AlreadySorted => {
                    tracing::info!("Skipped (already sorted): {}", path.display());
                }
                _ => tracing::debug!(path = %path.display(), ?reason, "skipped"),
            }
            return Ok(Outcome::Skipped(reason));
        }

        let created = self.clock.created_at(path)?;
        let date = naming::date_key(created);
        let month = naming::month_folder(created);

        let sequence = self.counters.reserve(&date)?;
        let base = CanonicalName::new(date, sequence);

        let folder = self.config.root.join(&month);
        fs::create_dir_all(&folder)?;

        let mut name = base.clone();
        let mut dest = folder.join(name.to_string());
        let mut n = 1;
        while dest.try_exists()? {
            name = base.with_disambiguator(n);
            dest = folder.join(name.to_string());
            n += 1;
        }

        fs::rename(path, &dest)?;
        self.counters.save()?;

        tracing::info!(
            "Moved {} -> {}",
            display_name(path),
            dest.strip_prefix(&self.config.root)
                .unwrap_or(&dest)
                .display()
        );

        Ok(Outcome::Moved(Move {
            from: path.to_path_buf(),
            to: dest,
            sequence,
            disambiguator: name.disambiguator,
        }))
    }

    /// Process every matching file directly inside the root, in directory
    /// listing order.
    ///
    /// # Errors
    ///
    /// Returns the first error from listing the root or from
    /// [`Organizer::process`]; files after it are left untouched.
    pub fn sweep(&mut self) -> Result<SweepReport> {
        let mut candidates = Vec::new();
        for entry in fs::read_dir(&self.config.root)? {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| naming::has_extension(n, &self.config.extension))
            {
                candidates.push(path);
            }
        }

        let mut report = SweepReport::default();
        for path in candidates {
            match self.process(&path)? {
                Outcome::Moved(m) => report.moved.push(m),
                Outcome::Skipped(_) => report.skipped += 1,
            }
        }
        Ok(report)
    }

    fn skip_reason(&self, path: &Path) -> Option<SkipReason> {
        if !path.is_file() {
            return Some(SkipReason::NotAFile);
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return Some(SkipReason::WrongExtension);
        };
        if !naming::has_extension(file_name, &self.config.extension) {
            return Some(SkipReason::WrongExtension);
        }
        if CanonicalName::parse(file_name).is_some() && path.parent() != Some(&*self.config.root)
        {
            return Some(SkipReason::AlreadySorted);
        }
        None
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;
    use tempfile::TempDir;

    /// Reports the same timestamp for every file.
    struct FixedCreationTime(NaiveDateTime);

    impl CreationTime for FixedCreationTime {
        fn created_at(&self, _path: &Path) -> io::Result<NaiveDateTime> {
            Ok(self.0)
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Run `f` with INFO-level logs captured into the returned buffer.
    fn capture_info<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buf = LogBuffer::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let out = tracing::subscriber::with_default(subscriber, f);
        (out, buf.contents())
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
    }

    fn organizer_on(day: NaiveDateTime) -> (TempDir, Organizer) {
        let dir = tempfile::tempdir().unwrap();
        let org =
            Organizer::with_clock(Config::with_root(dir.path()), FixedCreationTime(day)).unwrap();
        (dir, org)
    }

    fn touch(path: &Path) {
        fs::write(path, b"\x89PNG").unwrap();
    }

    fn moved(outcome: Outcome) -> Move {
        match outcome {
            Outcome::Moved(m) => m,
            Outcome::Skipped(reason) => panic!("expected a move, got skip {reason:?}"),
        }
    }

    #[test]
    fn first_file_of_the_day_gets_sequence_one() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let src = dir.path().join("foo.png");
        touch(&src);

        let m = moved(org.process(&src).unwrap());

        let expected = dir.path().join("2024-03").join("Screenshot_20240305_1.png");
        assert_eq!(m.to, expected);
        assert_eq!(m.sequence, 1);
        assert!(expected.is_file());
        assert!(!src.exists());
    }

    #[test]
    fn same_day_files_get_increasing_ids() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let mut ids = Vec::new();
        for name in ["c.png", "a.png", "b.png"] {
            let src = dir.path().join(name);
            touch(&src);
            ids.push(moved(org.process(&src).unwrap()).sequence);
        }
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(org.counters().get("20240305"), Some(3));
    }

    #[test]
    fn collision_appends_disambiguator() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let month = dir.path().join("2024-03");
        fs::create_dir_all(&month).unwrap();
        touch(&month.join("Screenshot_20240305_1.png"));
        touch(&month.join("Screenshot_20240305_1_1.png"));

        let src = dir.path().join("foo.png");
        touch(&src);
        let m = moved(org.process(&src).unwrap());

        assert_eq!(m.to, month.join("Screenshot_20240305_1_2.png"));
        assert_eq!(m.disambiguator, Some(2));
        // The reserved id is kept even though the plain name was taken.
        assert_eq!(org.counters().get("20240305"), Some(1));
    }

    #[test]
    fn second_file_collides_with_existing_name() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let month = dir.path().join("2024-03");
        fs::create_dir_all(&month).unwrap();
        touch(&month.join("Screenshot_20240305_2.png"));

        let first = dir.path().join("one.png");
        let second = dir.path().join("two.png");
        touch(&first);
        touch(&second);

        assert_eq!(
            moved(org.process(&first).unwrap()).to,
            month.join("Screenshot_20240305_1.png")
        );
        assert_eq!(
            moved(org.process(&second).unwrap()).to,
            month.join("Screenshot_20240305_2_1.png")
        );
    }

    #[test]
    fn counters_are_persisted_after_each_move() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let src = dir.path().join("foo.png");
        touch(&src);
        org.process(&src).unwrap();

        let raw = fs::read_to_string(dir.path().join("screenshot_counter.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value, serde_json::json!({"20240305": 1}));
    }

    #[test]
    fn restart_resumes_from_persisted_counter() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        for name in ["a.png", "b.png"] {
            let src = dir.path().join(name);
            touch(&src);
            org.process(&src).unwrap();
        }
        drop(org);

        let mut restarted = Organizer::with_clock(
            Config::with_root(dir.path()),
            FixedCreationTime(at(2024, 3, 5)),
        )
        .unwrap();
        let src = dir.path().join("c.png");
        touch(&src);
        assert_eq!(moved(restarted.process(&src).unwrap()).sequence, 3);
    }

    #[test]
    fn skips_irrelevant_paths() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));

        let txt = dir.path().join("notes.txt");
        touch(&txt);
        assert_eq!(
            org.process(&txt).unwrap(),
            Outcome::Skipped(SkipReason::WrongExtension)
        );

        let folder = dir.path().join("folder.png");
        fs::create_dir(&folder).unwrap();
        assert_eq!(
            org.process(&folder).unwrap(),
            Outcome::Skipped(SkipReason::NotAFile)
        );

        assert_eq!(
            org.process(&dir.path().join("gone.png")).unwrap(),
            Outcome::Skipped(SkipReason::NotAFile)
        );
        assert!(org.counters().is_empty());
    }

    #[test]
    fn canonical_file_in_month_folder_is_already_sorted() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let month = dir.path().join("2024-03");
        fs::create_dir_all(&month).unwrap();
        let sorted = month.join("Screenshot_20240305_1.png");
        touch(&sorted);

        assert_eq!(
            org.process(&sorted).unwrap(),
            Outcome::Skipped(SkipReason::AlreadySorted)
        );
        assert!(sorted.exists());
    }

    #[test]
    fn already_sorted_skips_are_logged_at_info() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let month = dir.path().join("2024-03");
        fs::create_dir_all(&month).unwrap();
        let sorted = month.join("Screenshot_20240305_1.png");
        touch(&sorted);
        let txt = dir.path().join("notes.txt");
        touch(&txt);

        let (_, logs) = capture_info(|| {
            org.process(&sorted).unwrap();
            org.process(&txt).unwrap();
        });

        assert!(logs.contains("Skipped (already sorted)"), "logs: {logs}");
        assert!(logs.contains("Screenshot_20240305_1.png"));
        assert!(!logs.contains("notes.txt"), "logs: {logs}");
    }

    #[test]
    fn moves_are_logged_relative_to_root() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let src = dir.path().join("foo.png");
        touch(&src);

        let (_, logs) = capture_info(|| org.process(&src).unwrap());

        let expected = Path::new("2024-03").join("Screenshot_20240305_1.png");
        assert!(
            logs.contains(&format!("Moved foo.png -> {}", expected.display())),
            "logs: {logs}"
        );
    }

    #[test]
    fn exhausted_counter_fails_without_moving() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("screenshot_counter.json"),
            format!(r#"{{"20240305": {}}}"#, u64::MAX),
        )
        .unwrap();
        let mut org = Organizer::with_clock(
            Config::with_root(dir.path()),
            FixedCreationTime(at(2024, 3, 5)),
        )
        .unwrap();
        let src = dir.path().join("foo.png");
        touch(&src);

        let err = org.process(&src).unwrap_err();

        assert!(matches!(err, crate::ShotsortError::Counter { .. }));
        assert!(src.exists());
        assert!(!dir.path().join("2024-03").exists());
    }

    #[test]
    fn canonical_file_in_root_is_still_moved() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let src = dir.path().join("Screenshot_20240101_9.png");
        touch(&src);

        let m = moved(org.process(&src).unwrap());
        assert_eq!(
            m.to,
            dir.path().join("2024-03").join("Screenshot_20240305_1.png")
        );
    }

    #[test]
    fn uppercase_extension_is_accepted() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        let src = dir.path().join("SHOT.PNG");
        touch(&src);

        let m = moved(org.process(&src).unwrap());
        assert!(m.to.ends_with("2024-03/Screenshot_20240305_1.png"));
    }

    #[test]
    fn sweep_processes_only_root_screenshots() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        touch(&dir.path().join("a.png"));
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join("readme.txt"));
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        touch(&nested.join("deep.png"));

        let report = org.sweep().unwrap();

        assert_eq!(report.moved.len(), 2);
        let mut ids: Vec<u64> = report.moved.iter().map(|m| m.sequence).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
        assert!(dir.path().join("readme.txt").exists());
        assert!(nested.join("deep.png").exists());
    }

    #[test]
    fn sweeping_twice_renames_nothing_the_second_time() {
        let (dir, mut org) = organizer_on(at(2024, 3, 5));
        touch(&dir.path().join("a.png"));
        org.sweep().unwrap();

        let report = org.sweep().unwrap();
        assert!(report.moved.is_empty());
        assert_eq!(org.counters().get("20240305"), Some(1));
    }

    #[test]
    fn sweep_of_missing_root_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("missing");
        let mut org =
            Organizer::with_clock(Config::with_root(&root), FixedCreationTime(at(2024, 3, 5)))
                .unwrap();
        assert!(matches!(
            org.sweep().unwrap_err(),
            crate::ShotsortError::Io(_)
        ));
    }

    #[test]
    fn filesystem_clock_reads_real_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("now.png");
        touch(&src);

        let created = FsCreationTime.created_at(&src).unwrap();
        let now = Local::now().naive_local();
        assert!((now - created).num_minutes().abs() < 5);
    }
}
