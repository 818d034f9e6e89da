//! Output file naming

use encoder::Container;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Hands out `<prefix>_<millis>.<ext>` paths
///
/// The millisecond stamp strictly increases per namer, even if two
/// recordings start within the same millisecond or the wall clock steps back.
#[derive(Debug, Default)]
pub struct OutputNamer {
    last_stamp: AtomicU64,
}

impl OutputNamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_stamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        let mut last = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let stamp = now.max(last + 1);
            match self.last_stamp.compare_exchange(
                last,
                stamp,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return stamp,
                Err(actual) => last = actual,
            }
        }
    }

    pub fn next_path(&self, dir: &Path, prefix: &str, container: Container) -> PathBuf {
        let stamp = self.next_stamp();
        dir.join(format!("{}_{}.{}", prefix, stamp, container.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_shape() {
        let namer = OutputNamer::new();
        let path = namer.next_path(Path::new("/data/files"), "screen_recording", Container::Mp4);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(path.starts_with("/data/files"));
        assert!(name.starts_with("screen_recording_"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_stamps_never_collide() {
        let namer = OutputNamer::new();
        let paths: Vec<PathBuf> = (0..50)
            .map(|_| namer.next_path(Path::new("/tmp"), "rec", Container::AnnexB))
            .collect();
        let mut unique = paths.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn test_clock_stepping_back() {
        let namer = OutputNamer::new();
        namer.last_stamp.store(u64::MAX / 2, Ordering::SeqCst);
        assert_eq!(namer.next_stamp(), u64::MAX / 2 + 1);
    }
}
