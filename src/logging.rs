use log::{Metadata, Record};
use std::fs::{read_dir, remove_file, File};
use std::io::{Error as IoError, Write};
use std::path::Path;
use std::sync::Mutex;

/// Logger that buffers records in memory until a log file is opened by [`FileLogger::init`].
pub struct FileLogger {
    inner: Mutex<Inner>,
}

struct Inner {
    buffer: Vec<u8>,
    file: Option<File>,
}

const MAX_LOG_FILES: usize = 10;
const LOG_FILENAME_PREFIX: &str = "Insomnia";
const LOG_FILENAME_EXTENSION: &str = ".log";

/// Local wall clock time.
#[derive(Copy, Clone)]
struct Timestamp {
    year: u16,
    month: u16,
    day: u16,
    hour: u16,
    minute: u16,
    second: u16,
    millisecond: u16,
}

#[cfg(not(test))]
fn now() -> Timestamp {
    let time = crate::winapi::get_local_time();
    Timestamp {
        year: time.wYear,
        month: time.wMonth,
        day: time.wDay,
        hour: time.wHour,
        minute: time.wMinute,
        second: time.wSecond,
        millisecond: time.wMilliseconds,
    }
}

#[cfg(test)]
fn now() -> Timestamp {
    Timestamp {
        year: 2026,
        month: 3,
        day: 14,
        hour: 9,
        minute: 26,
        second: 53,
        millisecond: 589,
    }
}

fn format_log_filename_prefix(time: &Timestamp) -> String {
    format!(
        "{}{:04}{:02}{:02}_",
        LOG_FILENAME_PREFIX, time.year, time.month, time.day
    )
}

fn format_log_filename(prefix: &str, counter: u32) -> String {
    format!("{}{:03}{}", prefix, counter, LOG_FILENAME_EXTENSION)
}

/// Matches `Insomnia????????_???.log`; the counter itself is validated later.
fn is_log_filename(name: &str) -> bool {
    let Some(stem) = name
        .strip_prefix(LOG_FILENAME_PREFIX)
        .and_then(|s| s.strip_suffix(LOG_FILENAME_EXTENSION))
    else {
        return false;
    };
    let chars: Vec<char> = stem.chars().collect();
    chars.len() == 12 && chars[8] == '_'
}

fn create_log_file(path: &Path) -> Result<File, IoError> {
    let mut options = File::options();
    options.create_new(true).write(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        use windows::Win32::Storage::FileSystem::FILE_SHARE_READ;
        options.share_mode(FILE_SHARE_READ.0);
    }
    options.open(path)
}

impl FileLogger {
    fn new_log_file(dir: &Path) -> Result<File, IoError> {
        let mut existing_logs = vec![];
        for entry in read_dir(dir)? {
            let name = entry?.file_name();
            match name.into_string() {
                Ok(name) if is_log_filename(&name) => existing_logs.push(name),
                _ => {}
            }
        }
        existing_logs.sort_unstable();
        existing_logs.reverse(); // newest files first
        let existing_logs = existing_logs;

        // make room for the new file
        let mut deleted = 0;
        for log in existing_logs.iter().skip(MAX_LOG_FILES - 1) {
            if let Err(err) = remove_file(dir.join(log)) {
                warn!("Failed to delete log file {}: {}", log, err);
            } else {
                deleted += 1;
            }
        }
        if deleted > 0 {
            info!("Deleted {} old log files", deleted);
        }

        // continue today's numbering
        let prefix = format_log_filename_prefix(&now());
        let mut counter = 0;
        let todays_counters = existing_logs
            .iter()
            .take(MAX_LOG_FILES - 1)
            .filter_map(|log| log.strip_prefix(&prefix));
        for suffix in todays_counters {
            match suffix.get(..3).and_then(|s| s.parse::<u32>().ok()) {
                Some(999) => {
                    warn!("Log filename counter overflow, resetting to zero");
                    break;
                }
                Some(last) => {
                    counter = last + 1;
                    break;
                }
                None => debug!(
                    "Unexpected log filename counter suffix: {}, skipping",
                    suffix
                ),
            }
        }

        create_log_file(&dir.join(format_log_filename(&prefix, counter)))
    }

    pub const fn new() -> Self {
        FileLogger {
            inner: Mutex::new(Inner {
                buffer: Vec::new(),
                file: None,
            }),
        }
    }

    /// Opens a fresh log file in `dir` and writes out everything logged so far.
    pub fn init(&self, dir: &Path) -> Result<(), IoError> {
        let mut new_log = Self::new_log_file(dir)?;
        let mut inner = self.inner.lock().unwrap();
        new_log.write_all(&std::mem::take(&mut inner.buffer))?;
        inner.file = Some(new_log);
        Ok(())
    }
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let time = now();
        let s = format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}[{}][{}] {}\n",
            time.year,
            time.month,
            time.day,
            time.hour,
            time.minute,
            time.second,
            time.millisecond,
            record.level(),
            record.target(),
            record.args()
        );
        let mut inner = self.inner.lock().unwrap();
        if let Some(file) = &mut inner.file {
            _ = file.write_all(s.as_bytes());
        } else {
            inner.buffer.extend_from_slice(s.as_bytes());
        }
    }

    fn flush(&self) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(f) = &mut inner.file {
            // Not logged: the logger would try to take the lock we are holding
            _ = f.sync_data();
        }
    }
}
