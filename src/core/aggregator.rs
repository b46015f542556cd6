//! Candidate aggregation for presto.
//!
//! One load pass walks the configured shortcut roots, decodes every `.lnk`
//! and `.url` file, merges in the JSON-backed UWP and web search lists, and
//! publishes the result as one [CandidateLists] swap. Passes run on a
//! background thread; the coordinator observes them through [LoadPhase] and
//! a completion channel.
//!
//! Guarantees:
//! - at most one pass is ever `Loading`; [SourceAggregator::begin_load]
//!   while loading is a no-op
//! - cancellation is observed before each root enumeration and inside every
//!   per-file loop; a cancelled or failed pass leaves the previously
//!   published lists untouched
//! - a superseded pass can never publish: publication re-checks the pass
//!   generation under the state lock

use crate::config::lists::{load_uwp_entries, load_web_entries};
use crate::config::settings::{OnBusyActivation, Settings};
use crate::core::entry::{CandidateEntry, CandidateLists};
use crate::core::shortcut;

use crossbeam_channel::{Receiver, Sender, unbounded};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Lifecycle of one aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Loaded,
    Cancelled,
    Failed,
}

/// Completion notice sent when a pass ends, keyed by its generation so
/// waiters can skip notices from superseded passes.
#[derive(Debug, Clone, Copy)]
struct LoadEvent {
    generation: u64,
    phase: LoadPhase,
}

struct Shared {
    phase: LoadPhase,
    generation: u64,
    lists: Arc<CandidateLists>,
    cancel: Option<Arc<AtomicBool>>,
}

struct Inner {
    shortcut_roots: Vec<PathBuf>,
    lists_dir: PathBuf,
    shared: Mutex<Shared>,
    events_tx: Sender<LoadEvent>,
    events_rx: Receiver<LoadEvent>,
}

impl Inner {
    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Owns the candidate collections and the load lifecycle.
pub struct SourceAggregator {
    inner: Arc<Inner>,
    on_busy: OnBusyActivation,
}

impl SourceAggregator {
    pub fn new(settings: &Settings) -> Self {
        let (events_tx, events_rx) = unbounded();
        SourceAggregator {
            inner: Arc::new(Inner {
                shortcut_roots: settings.shortcut_roots().to_vec(),
                lists_dir: settings.lists_dir().clone(),
                shared: Mutex::new(Shared {
                    phase: LoadPhase::Idle,
                    generation: 0,
                    lists: Arc::new(CandidateLists::default()),
                    cancel: None,
                }),
                events_tx,
                events_rx,
            }),
            on_busy: settings.on_busy(),
        }
    }

    /// Starts one background pass. Returns `false` without doing anything
    /// when a pass is already loading.
    pub fn begin_load(&self) -> bool {
        let generation;
        let cancel;
        {
            let mut shared = self.inner.shared();
            if shared.phase == LoadPhase::Loading {
                tracing::debug!("load pass already running, begin_load is a no-op");
                return false;
            }
            shared.phase = LoadPhase::Loading;
            shared.generation += 1;
            generation = shared.generation;
            let token = Arc::new(AtomicBool::new(false));
            shared.cancel = Some(Arc::clone(&token));
            cancel = token;
        }

        let inner = Arc::clone(&self.inner);
        thread::spawn(move || run_pass(inner, generation, cancel));
        true
    }

    /// Cancels the in-flight pass, if any. Bumping the generation here means
    /// a pass that already passed its last cancellation check still cannot
    /// publish.
    pub fn cancel(&self) {
        let mut shared = self.inner.shared();
        if let Some(token) = shared.cancel.take() {
            token.store(true, Ordering::Release);
        }
        shared.generation += 1;
        if shared.phase == LoadPhase::Loading {
            shared.phase = LoadPhase::Cancelled;
        }
    }

    /// Blocks until the current pass finishes or the timeout elapses.
    pub fn wait(&self, timeout: Duration) -> LoadPhase {
        let deadline = Instant::now() + timeout;
        let target = {
            let shared = self.inner.shared();
            if shared.phase != LoadPhase::Loading {
                return shared.phase;
            }
            shared.generation
        };
        loop {
            match self.inner.events_rx.recv_deadline(deadline) {
                Ok(event) if event.generation >= target => return self.phase(),
                Ok(_) => continue,
                Err(_) => return self.phase(),
            }
        }
    }

    /// Activation entry point: makes sure the lists are loaded, applying the
    /// configured busy policy. Anything but `Loaded` means the activation
    /// must be declined.
    pub fn ensure_loaded(&self) -> LoadPhase {
        if self.is_loaded() {
            return LoadPhase::Loaded;
        }
        match (self.is_loading(), self.on_busy) {
            (true, OnBusyActivation::WaitBounded(timeout)) => self.wait_or_cancel(timeout),
            (true, OnBusyActivation::CancelAndDismiss) => {
                self.cancel();
                LoadPhase::Cancelled
            }
            (false, OnBusyActivation::WaitBounded(timeout)) => {
                self.begin_load();
                self.wait_or_cancel(timeout)
            }
            (false, OnBusyActivation::CancelAndDismiss) => {
                self.begin_load();
                self.phase()
            }
        }
    }

    fn wait_or_cancel(&self, timeout: Duration) -> LoadPhase {
        let phase = self.wait(timeout);
        if phase == LoadPhase::Loading {
            tracing::warn!("load pass exceeded {:?}, cancelling", timeout);
            self.cancel();
            return LoadPhase::Cancelled;
        }
        phase
    }

    /// Re-reads only the JSON-backed lists and republishes, keeping the
    /// scanned shortcut entries without another filesystem walk.
    pub fn reload_lists(&self) {
        let uwp = load_uwp_entries(&self.inner.lists_dir);
        let web = load_web_entries(&self.inner.lists_dir);

        let mut shared = self.inner.shared();
        shared.lists = Arc::new(shared.lists.with_fresh_json(uwp, web));
        tracing::info!("json lists reloaded");
    }

    /// The currently published collections. Readers hold the `Arc` and never
    /// observe a half-built pass.
    pub fn lists(&self) -> Arc<CandidateLists> {
        Arc::clone(&self.inner.shared().lists)
    }

    pub fn phase(&self) -> LoadPhase {
        self.inner.shared().phase
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.phase() == LoadPhase::Loading
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.phase() == LoadPhase::Loaded
    }
}

fn run_pass(inner: Arc<Inner>, generation: u64, cancel: Arc<AtomicBool>) {
    let started = Instant::now();
    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        collect_candidates(&inner.shortcut_roots, &inner.lists_dir, &cancel)
    }));

    let mut shared = inner.shared();
    let phase = match outcome {
        Ok(Some(lists)) if shared.generation == generation => {
            tracing::info!(
                "load pass done in {:?}: {} executables, {} web entries",
                started.elapsed(),
                lists.executables().len(),
                lists.web_entries().len()
            );
            shared.lists = Arc::new(lists);
            LoadPhase::Loaded
        }
        Ok(Some(_)) => {
            tracing::debug!("load pass superseded, result dropped");
            LoadPhase::Cancelled
        }
        Ok(None) => LoadPhase::Cancelled,
        Err(_) => {
            tracing::warn!("load pass failed unexpectedly");
            LoadPhase::Failed
        }
    };

    // A newer pass owns the state now; only report to waiters.
    if shared.generation == generation {
        shared.phase = phase;
        shared.cancel = None;
    }
    drop(shared);
    let _ = inner.events_tx.send(LoadEvent { generation, phase });
}

/// The pass body. `None` means the cancellation token fired.
fn collect_candidates(
    roots: &[PathBuf],
    lists_dir: &Path,
    cancel: &AtomicBool,
) -> Option<CandidateLists> {
    let (lnk_paths, url_paths) = scan_roots(roots, cancel)?;

    let mut shortcuts = Vec::with_capacity(lnk_paths.len() + url_paths.len());
    for path in &lnk_paths {
        if cancel.load(Ordering::Acquire) {
            return None;
        }
        if let Some(entry) = shortcut::resolve(path) {
            shortcuts.push(entry);
        }
    }
    shortcuts.extend(resolve_urls_parallel(&url_paths, cancel)?);

    if cancel.load(Ordering::Acquire) {
        return None;
    }
    let uwp = load_uwp_entries(lists_dir);
    let web = load_web_entries(lists_dir);
    Some(CandidateLists::new(shortcuts, uwp, web))
}

/// Walks every root concurrently, collecting shortcut paths in walk order.
/// Missing roots contribute nothing.
fn scan_roots(roots: &[PathBuf], cancel: &AtomicBool) -> Option<(Vec<PathBuf>, Vec<PathBuf>)> {
    let per_root: Vec<Option<(Vec<PathBuf>, Vec<PathBuf>)>> = thread::scope(|s| {
        let handles: Vec<_> = roots
            .iter()
            .map(|root| s.spawn(move || scan_one_root(root, cancel)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(None))
            .collect()
    });

    let mut lnk_paths = Vec::new();
    let mut url_paths = Vec::new();
    for scanned in per_root {
        let (mut lnk, mut url) = scanned?;
        lnk_paths.append(&mut lnk);
        url_paths.append(&mut url);
    }
    Some((lnk_paths, url_paths))
}

fn scan_one_root(root: &Path, cancel: &AtomicBool) -> Option<(Vec<PathBuf>, Vec<PathBuf>)> {
    if cancel.load(Ordering::Acquire) {
        return None;
    }
    let mut lnk_paths = Vec::new();
    let mut url_paths = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if cancel.load(Ordering::Acquire) {
            return None;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        // Uninstallers clutter every vendor folder and are never launch
        // targets.
        if name.contains("uninstall") {
            continue;
        }
        if name.ends_with(".lnk") {
            lnk_paths.push(entry.into_path());
        } else if name.ends_with(".url") {
            url_paths.push(entry.into_path());
        }
    }
    Some((lnk_paths, url_paths))
}

/// Resolves `.url` files across a small scoped pool. Chunked so the merged
/// result keeps walk order; no shared handle is involved, so files within a
/// chunk are independent.
fn resolve_urls_parallel(
    url_paths: &[PathBuf],
    cancel: &AtomicBool,
) -> Option<Vec<CandidateEntry>> {
    if url_paths.is_empty() {
        return Some(Vec::new());
    }
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .min(url_paths.len());
    let chunk_size = url_paths.len().div_ceil(workers);

    let per_chunk: Vec<Option<Vec<CandidateEntry>>> = thread::scope(|s| {
        let handles: Vec<_> = url_paths
            .chunks(chunk_size)
            .map(|chunk| {
                s.spawn(move || {
                    let mut out = Vec::with_capacity(chunk.len());
                    for path in chunk {
                        if cancel.load(Ordering::Acquire) {
                            return None;
                        }
                        if let Some(entry) = shortcut::resolve(path) {
                            out.push(entry);
                        }
                    }
                    Some(out)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(None))
            .collect()
    });

    let mut entries = Vec::new();
    for chunk in per_chunk {
        entries.extend(chunk?);
    }
    Some(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error;
    use std::fs;
    use tempfile::tempdir;

    fn url_file(dir: &Path, name: &str, url: &str) -> std::io::Result<()> {
        fs::write(
            dir.join(name),
            format!("[InternetShortcut]\nURL={url}\n"),
        )
    }

    #[test]
    fn scan_skips_uninstallers_and_foreign_files() -> Result<(), Box<dyn error::Error>> {
        let root = tempdir()?;
        url_file(root.path(), "Docs.url", "https://docs.example.org")?;
        url_file(root.path(), "Uninstall Docs.url", "https://example.org")?;
        fs::write(root.path().join("readme.txt"), "x")?;
        fs::write(root.path().join("App.lnk"), "not a real link")?;

        let cancel = AtomicBool::new(false);
        let (lnk, url) =
            scan_roots(&[root.path().to_path_buf()], &cancel).ok_or("cancelled")?;
        assert_eq!(lnk.len(), 1);
        assert_eq!(url.len(), 1);
        assert!(url[0].ends_with("Docs.url"));
        Ok(())
    }

    #[test]
    fn cancelled_scan_returns_none() -> Result<(), Box<dyn error::Error>> {
        let root = tempdir()?;
        url_file(root.path(), "Docs.url", "https://docs.example.org")?;

        let cancel = AtomicBool::new(true);
        assert!(scan_roots(&[root.path().to_path_buf()], &cancel).is_none());
        Ok(())
    }

    #[test]
    fn parallel_url_resolution_keeps_walk_order() -> Result<(), Box<dyn error::Error>> {
        let root = tempdir()?;
        let mut paths = Vec::new();
        for i in 0..12 {
            let name = format!("site_{i:02}.url");
            url_file(root.path(), &name, &format!("https://example.org/{i}"))?;
            paths.push(root.path().join(name));
        }

        let cancel = AtomicBool::new(false);
        let entries = resolve_urls_parallel(&paths, &cancel).ok_or("cancelled")?;
        let titles: Vec<&str> = entries.iter().map(|e| e.title()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("site_{i:02}")).collect();
        assert_eq!(titles, expected);
        Ok(())
    }

    #[test]
    fn missing_roots_contribute_nothing() -> Result<(), Box<dyn error::Error>> {
        let cancel = AtomicBool::new(false);
        let (lnk, url) = scan_roots(
            &[PathBuf::from("/no/such/start/menu")],
            &cancel,
        )
        .ok_or("cancelled")?;
        assert!(lnk.is_empty());
        assert!(url.is_empty());
        Ok(())
    }
}
