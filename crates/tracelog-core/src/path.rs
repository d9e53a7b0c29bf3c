//! Target path resolution and bucket directory management.
//!
//! Without a time pattern every entry goes to `root/file`. With one, the
//! entry's timestamp is rendered through the pattern and used as a directory
//! segment: `root/<bucket>/file`. Bucketing truncates; two entries a
//! microsecond apart land in different files when their rendered buckets
//! differ.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{TraceLogError, TraceLogResult};
use crate::pattern::DatePattern;

/// Maps entry timestamps to file paths under a root folder.
#[derive(Debug)]
pub struct PathResolver {
    root: PathBuf,
    file_name: String,
    pattern: Option<DatePattern>,
}

impl PathResolver {
    /// Create a resolver. An empty `time_pattern` disables partitioning.
    ///
    /// Does not touch the file system.
    pub fn new(
        root: impl Into<PathBuf>,
        file_name: impl Into<String>,
        time_pattern: &str,
    ) -> TraceLogResult<Self> {
        let pattern = if time_pattern.is_empty() {
            None
        } else {
            Some(DatePattern::parse(time_pattern)?)
        };

        Ok(Self {
            root: root.into(),
            file_name: file_name.into(),
            pattern,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn pattern(&self) -> Option<&DatePattern> {
        self.pattern.as_ref()
    }

    /// Bucket segment for `timestamp`, or `None` when not partitioning.
    pub fn bucket(&self, timestamp: &DateTime<Utc>) -> Option<String> {
        self.pattern.as_ref().map(|p| p.render(timestamp))
    }

    /// Path an entry stamped `timestamp` belongs in, without creating anything.
    pub fn path_for(&self, timestamp: &DateTime<Utc>) -> TraceLogResult<PathBuf> {
        match self.bucket(timestamp) {
            None => Ok(self.root.join(&self.file_name)),
            Some(bucket) => {
                check_bucket(&bucket)?;
                Ok(self.root.join(bucket).join(&self.file_name))
            }
        }
    }

    /// Resolve the target path and make sure its directory exists.
    ///
    /// Nothing is cached: a bucket directory removed while the logger runs
    /// is created again the next time an entry lands in it.
    pub fn resolve(&self, timestamp: &DateTime<Utc>) -> TraceLogResult<PathBuf> {
        let path = self.path_for(timestamp)?;

        if let Some(dir) = path.parent() {
            if !dir.is_dir() {
                fs::create_dir_all(dir).map_err(|e| TraceLogError::io(dir, e))?;
                tracing::debug!(dir = %dir.display(), "Created bucket directory");
            }
        }

        Ok(path)
    }
}

/// A bucket must stay below the root and never alias it.
fn check_bucket(bucket: &str) -> TraceLogResult<()> {
    let path = Path::new(bucket);
    let normal = !bucket.is_empty()
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

    if normal {
        Ok(())
    } else {
        Err(TraceLogError::Config(format!(
            "time pattern renders an unusable bucket directory {bucket:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2012, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_flat_path_without_pattern() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path(), "log.txt", "").unwrap();

        assert_eq!(resolver.resolve(&at(8)).unwrap(), temp.path().join("log.txt"));
        assert_eq!(resolver.resolve(&at(9)).unwrap(), temp.path().join("log.txt"));
        assert!(resolver.bucket(&at(8)).is_none());
    }

    #[test]
    fn test_bucketed_paths() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path(), "log.txt", "hh").unwrap();

        let eight = resolver.resolve(&at(8)).unwrap();
        let nine = resolver.resolve(&at(9)).unwrap();

        assert_eq!(eight, temp.path().join("08").join("log.txt"));
        assert_eq!(nine, temp.path().join("09").join("log.txt"));
        assert!(temp.path().join("08").is_dir());
        assert!(temp.path().join("09").is_dir());
        assert_eq!(resolver.resolve(&at(8)).unwrap(), eight);
    }

    #[test]
    fn test_truncation_splits_adjacent_instants() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path(), "log.txt", "HH").unwrap();

        let before = Utc.with_ymd_and_hms(2012, 1, 1, 8, 59, 59).unwrap()
            + chrono::Duration::microseconds(999_999);
        let after = at(9);

        assert_ne!(
            resolver.resolve(&before).unwrap(),
            resolver.resolve(&after).unwrap()
        );
    }

    #[test]
    fn test_existing_bucket_directory_is_fine() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("08")).unwrap();

        let resolver = PathResolver::new(temp.path(), "log.txt", "hh").unwrap();
        assert!(resolver.resolve(&at(8)).is_ok());
    }

    #[test]
    fn test_removed_bucket_is_recreated() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path(), "log.txt", "HH").unwrap();

        resolver.resolve(&at(8)).unwrap();
        fs::remove_dir_all(temp.path().join("08")).unwrap();

        let next_day = Utc.with_ymd_and_hms(2012, 1, 2, 8, 0, 0).unwrap();
        let path = resolver.resolve(&next_day).unwrap();
        assert_eq!(path, temp.path().join("08").join("log.txt"));
        assert!(temp.path().join("08").is_dir());
    }

    #[test]
    fn test_nested_buckets() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path(), "log.txt", "yyyy/MM/dd").unwrap();

        let path = resolver.resolve(&at(8)).unwrap();
        assert_eq!(path, temp.path().join("2012").join("01").join("01").join("log.txt"));
        assert!(path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_rejects_escaping_bucket() {
        let temp = TempDir::new().unwrap();
        let resolver = PathResolver::new(temp.path(), "log.txt", "'..'").unwrap();
        assert!(matches!(
            resolver.path_for(&at(8)),
            Err(TraceLogError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        assert!(matches!(
            PathResolver::new("logs", "log.txt", "HHH"),
            Err(TraceLogError::Config(_))
        ));
    }
}
