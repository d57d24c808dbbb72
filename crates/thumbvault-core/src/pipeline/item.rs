//! Work items and collision-free destination names.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// One image to fetch, resize and store. Immutable once queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Source image URL
    pub url: String,
    /// Destination file name (also the stored row's name)
    pub name: String,
    /// Directory the raw download is written to
    pub work_dir: PathBuf,
}

impl WorkItem {
    pub fn new(url: impl Into<String>, name: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Where the raw download for this item lives.
    pub fn raw_path(&self) -> PathBuf {
        self.work_dir.join(&self.name)
    }
}

/// Hands out `<prefix>_<counter>.jpg` names from a monotonic counter.
///
/// Every name from one allocator (and from any allocator derived from it
/// with [`NameAllocator::with_prefix`]) is distinct, so items built from
/// them never share a raw or resized path.
#[derive(Debug)]
pub struct NameAllocator {
    prefix: String,
    next: Arc<AtomicU64>,
}

impl NameAllocator {
    /// Create an allocator. The prefix is reduced to filename-safe characters
    /// with whitespace turned into `_`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: sanitize_prefix(prefix),
            next: Arc::new(AtomicU64::new(1)),
        }
    }

    /// An allocator with a different prefix that draws from the same counter.
    ///
    /// Prefixes that sanitize to the same string still get distinct names.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            prefix: sanitize_prefix(prefix),
            next: self.next.clone(),
        }
    }

    /// The sanitized prefix every name starts with.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Next unique file name.
    pub fn next_name(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}_{:06}.jpg", self.prefix, n)
    }

    /// Build work items for `urls`, in order, all writing to `work_dir`.
    pub fn items<I, S>(&self, urls: I, work_dir: &Path) -> Vec<WorkItem>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        urls.into_iter()
            .map(|url| WorkItem::new(url, self.next_name(), work_dir))
            .collect()
    }
}

fn sanitize_prefix(prefix: &str) -> String {
    let cleaned: String = prefix
        .trim()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                Some(c.to_ascii_lowercase())
            } else {
                None
            }
        })
        .collect();

    if cleaned.is_empty() {
        "img".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_sequential() {
        let names = NameAllocator::new("cats");
        assert_eq!(names.next_name(), "cats_000001.jpg");
        assert_eq!(names.next_name(), "cats_000002.jpg");
    }

    #[test]
    fn test_prefix_sanitized() {
        assert_eq!(NameAllocator::new("red  Cars!").next_name(), "red__cars_000001.jpg");
        assert_eq!(NameAllocator::new("../etc").next_name(), "etc_000001.jpg");
        assert_eq!(NameAllocator::new("").next_name(), "img_000001.jpg");
    }

    #[test]
    fn test_derived_prefixes_share_the_counter() {
        let names = NameAllocator::new("run");
        let cats = names.with_prefix("Cats");
        let cats_again = names.with_prefix("cats!");

        assert_eq!(cats.next_name(), "cats_000001.jpg");
        assert_eq!(cats_again.next_name(), "cats_000002.jpg");
        assert_eq!(names.next_name(), "run_000003.jpg");
    }

    #[test]
    fn test_items_have_unique_paths() {
        let names = NameAllocator::new("dogs");
        let urls: Vec<String> = (0..50).map(|i| format!("http://example/{i}.png")).collect();
        let items = names.items(urls, Path::new("/tmp/raw"));

        assert_eq!(items.len(), 50);
        assert_eq!(items[0].url, "http://example/0.png");
        assert_eq!(items[0].raw_path(), PathBuf::from("/tmp/raw/dogs_000001.jpg"));
        let paths: HashSet<PathBuf> = items.iter().map(WorkItem::raw_path).collect();
        assert_eq!(paths.len(), 50);
    }

    #[test]
    fn test_concurrent_allocation_is_unique() {
        let names = std::sync::Arc::new(NameAllocator::new("x"));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let names = names.clone();
                std::thread::spawn(move || (0..250).map(|_| names.next_name()).collect::<Vec<_>>())
            })
            .collect();

        let all: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        assert_eq!(all.len(), 1000);
    }
}
