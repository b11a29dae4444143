//! Unbounded playback loops.
//!
//! Every loop here runs on one thread and is paced by [`SampleSink::write`]
//! blocking. Regeneration happens inline between writes, so a slow reload
//! stalls the output for that long. Loops end when their [`CancelToken`] is
//! set and always close the sink on the way out.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use crate::{
    animation::synthesize_animation,
    assets::{ChangeMarker, PathSource, SourceCollection},
    audio::SampleSink,
    config::AppConfig,
    render::{synthesize_frame, SynthParams},
    Result, ScopeError, Signal,
};

/// Shared stop flag, set from outside the loop (for example a Ctrl-C
/// handler) and checked before every write.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Wall-clock source for poll cadence, slot timing and error backoff.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration);
}

/// Monotonic clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    origin: Instant,
}

impl PlaybackClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::start()
    }
}

impl Clock for PlaybackClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Timings and synthesis parameters for the live loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSettings {
    pub params: SynthParams,
    /// How often a playing source is checked for changes.
    pub poll_period: Duration,
    /// Pause after a source fails to load in show mode.
    pub error_backoff: Duration,
    /// Time each source holds the display in show mode.
    pub interval: Duration,
    /// Reveal animation length in seconds, if any.
    pub animation_duration: Option<f64>,
}

impl LiveSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            params: config.render.synth_params(),
            poll_period: config.live.poll_period(),
            error_backoff: config.live.error_backoff(),
            interval: config.show.interval(),
            animation_duration: config.show.animation(),
        }
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// The render currently on air. The signal is only ever replaced as a whole,
/// never edited, so a reader holding the `Arc` always sees a complete buffer.
#[derive(Debug, Clone)]
pub struct LiveSession {
    current: Arc<Signal>,
    marker: ChangeMarker,
}

impl LiveSession {
    pub fn new(signal: Signal, marker: ChangeMarker) -> Self {
        Self {
            current: Arc::new(signal),
            marker,
        }
    }

    pub fn current(&self) -> Arc<Signal> {
        Arc::clone(&self.current)
    }

    pub fn marker(&self) -> ChangeMarker {
        self.marker
    }

    fn swap(&mut self, signal: Signal, marker: ChangeMarker) {
        self.current = Arc::new(signal);
        self.marker = marker;
    }
}

/// Writes `signal` over and over until cancelled.
pub fn play_loop<K: SampleSink + ?Sized>(
    signal: &Signal,
    sink: &mut K,
    cancel: &CancelToken,
) -> Result<()> {
    tracing::info!(samples = signal.len(), "streaming, press Ctrl+C to stop");
    let result = (|| -> Result<()> {
        while !cancel.is_cancelled() {
            sink.write(signal)?;
        }
        Ok(())
    })();
    finish(sink, result)
}

/// Plays one source, reloading it whenever it changes.
///
/// The first load must succeed. After that a failed reload is logged and the
/// previous render keeps playing.
pub fn run_single_live<S, K, C>(
    source: &S,
    sink: &mut K,
    settings: &LiveSettings,
    clock: &C,
    cancel: &CancelToken,
) -> Result<()>
where
    S: PathSource + ?Sized,
    K: SampleSink + ?Sized,
    C: Clock + ?Sized,
{
    let result = single_live_loop(source, sink, settings, clock, cancel);
    finish(sink, result)
}

fn single_live_loop<S, K, C>(
    source: &S,
    sink: &mut K,
    settings: &LiveSettings,
    clock: &C,
    cancel: &CancelToken,
) -> Result<()>
where
    S: PathSource + ?Sized,
    K: SampleSink + ?Sized,
    C: Clock + ?Sized,
{
    let marker = source.marker()?;
    let paths = source.load()?;
    let mut session = LiveSession::new(synthesize_frame(&paths, &settings.params), marker);
    tracing::info!(source = source.id(), paths = paths.len(), "live streaming");

    let mut last_check = clock.now();
    while !cancel.is_cancelled() {
        let current = session.current();
        sink.write(&current)?;

        let now = clock.now();
        if now.saturating_sub(last_check) < settings.poll_period {
            continue;
        }
        last_check = now;

        match regenerate_if_changed(source, session.marker(), &settings.params) {
            Ok(Some((signal, marker))) => {
                session.swap(signal, marker);
                tracing::info!(source = source.id(), "reloaded");
            }
            Ok(None) => {}
            Err(ScopeError::SourceNotFound(path)) => {
                tracing::debug!(path = %path.display(), "source missing, keeping last render");
            }
            Err(err) => {
                tracing::warn!(source = source.id(), error = %err, "reload failed, keeping last render");
            }
        }
    }
    Ok(())
}

fn regenerate_if_changed<S: PathSource + ?Sized>(
    source: &S,
    marker: ChangeMarker,
    params: &SynthParams,
) -> Result<Option<(Signal, ChangeMarker)>> {
    let Some(marker) = source.changed_since(marker)? else {
        return Ok(None);
    };
    let paths = source.load()?;
    Ok(Some((synthesize_frame(&paths, params), marker)))
}

/// Renders derived from one source at one change marker.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub marker: ChangeMarker,
    pub cycle: Arc<Signal>,
    pub animation: Option<Arc<Signal>>,
}

/// Renders keyed by source identity. An entry is only valid for the marker
/// it was built from.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<String, CacheEntry>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `id` if it was built at `marker`.
    pub fn get(&self, id: &str, marker: ChangeMarker) -> Option<&CacheEntry> {
        self.entries.get(id).filter(|entry| entry.marker == marker)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drops the entries of every source not listed in `current`.
    pub fn retain_ids<'a, I>(&mut self, current: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = current.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| keep.contains(id.as_str()));
        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "dropped renders of removed sources");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetches a valid entry for `source` or rebuilds it.
    pub fn resolve<S: PathSource + ?Sized>(
        &mut self,
        source: &S,
        settings: &LiveSettings,
    ) -> Result<CacheEntry> {
        let marker = source.marker()?;
        if let Some(entry) = self.get(source.id(), marker) {
            return Ok(entry.clone());
        }

        if self.contains(source.id()) {
            tracing::info!(source = source.id(), "source changed, regenerating");
        }
        let paths = source.load()?;
        let entry = CacheEntry {
            marker,
            cycle: Arc::new(synthesize_frame(&paths, &settings.params)),
            animation: settings
                .animation_duration
                .map(|duration| Arc::new(synthesize_animation(&paths, duration, &settings.params))),
        };
        self.insert(source.id(), entry.clone());
        Ok(entry)
    }
}

/// Cycles through a collection forever, giving each source `interval` of
/// display time: its animation once, then its static frame on repeat.
///
/// The collection is re-listed every pass so sources can be added, removed
/// or edited while the show runs. A source that fails to load is skipped
/// for that pass after a short backoff.
pub fn run_show_live<L, K, C>(
    collection: &L,
    sink: &mut K,
    settings: &LiveSettings,
    clock: &C,
    cancel: &CancelToken,
) -> Result<()>
where
    L: SourceCollection + ?Sized,
    K: SampleSink + ?Sized,
    C: Clock + ?Sized,
{
    let result = show_live_loop(collection, sink, settings, clock, cancel);
    finish(sink, result)
}

fn show_live_loop<L, K, C>(
    collection: &L,
    sink: &mut K,
    settings: &LiveSettings,
    clock: &C,
    cancel: &CancelToken,
) -> Result<()>
where
    L: SourceCollection + ?Sized,
    K: SampleSink + ?Sized,
    C: Clock + ?Sized,
{
    let mut cache = RenderCache::new();
    tracing::info!(interval = ?settings.interval, "live show");

    while !cancel.is_cancelled() {
        let sources = match collection.enumerate() {
            Ok(sources) => sources,
            Err(err) => {
                tracing::warn!(error = %err, "could not list sources, waiting");
                clock.sleep(settings.error_backoff);
                continue;
            }
        };
        cache.retain_ids(sources.iter().map(|source| source.id()));
        if sources.is_empty() {
            tracing::info!("no sources found, waiting");
            clock.sleep(settings.error_backoff);
            continue;
        }

        for source in &sources {
            if cancel.is_cancelled() {
                break;
            }

            let entry = match cache.resolve(source, settings) {
                Ok(entry) => entry,
                Err(ScopeError::SourceNotFound(_)) => {
                    tracing::debug!(source = source.id(), "source vanished, skipping");
                    continue;
                }
                Err(err) => {
                    tracing::warn!(source = source.id(), error = %err, "error loading source");
                    clock.sleep(settings.error_backoff);
                    continue;
                }
            };

            tracing::info!(source = source.id(), "now playing");
            let started = clock.now();
            if let Some(animation) = entry.animation.as_deref() {
                if !animation.is_empty() && !cancel.is_cancelled() {
                    sink.write(animation)?;
                }
            }
            while !cancel.is_cancelled() && clock.now().saturating_sub(started) < settings.interval
            {
                sink.write(&entry.cycle)?;
            }
        }
    }
    Ok(())
}

/// Closes the sink whatever happened in the loop; the loop's own error wins.
fn finish<K: SampleSink + ?Sized>(sink: &mut K, result: Result<()>) -> Result<()> {
    let closed = sink.close();
    if let Err(err) = &result {
        tracing::error!(error = %err, "playback stopped");
    } else {
        tracing::info!("playback stopped");
    }
    result.and(closed)
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use super::*;
    use crate::geometry::{Path, PathSet};

    const FRAME: Duration = Duration::from_nanos(16_666_667);

    /// Clock advanced by hand: by the sink on every write and by `sleep`.
    #[derive(Clone, Default)]
    struct ManualClock {
        now: Rc<Cell<Duration>>,
        sleeps: Rc<Cell<usize>>,
    }

    impl ManualClock {
        fn advance(&self, by: Duration) {
            self.now.set(self.now.get() + by);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.set(self.sleeps.get() + 1);
            self.advance(duration);
        }
    }

    /// Records every write, advances the clock by one frame per write, and
    /// cancels once its budget is spent.
    struct RecordingSink {
        clock: ManualClock,
        cancel: CancelToken,
        budget: usize,
        writes: Vec<Signal>,
        closed: bool,
        on_write: Box<dyn FnMut(usize)>,
    }

    impl RecordingSink {
        fn new(clock: &ManualClock, cancel: &CancelToken, budget: usize) -> Self {
            Self {
                clock: clock.clone(),
                cancel: cancel.clone(),
                budget,
                writes: Vec::new(),
                closed: false,
                on_write: Box::new(|_| {}),
            }
        }
    }

    impl SampleSink for RecordingSink {
        fn sample_rate(&self) -> u32 {
            48_000
        }

        fn write(&mut self, signal: &Signal) -> Result<()> {
            self.writes.push(signal.clone());
            self.clock.advance(FRAME * (signal.len() / 800).max(1) as u32);
            (self.on_write)(self.writes.len());
            if self.writes.len() >= self.budget {
                self.cancel.cancel();
            }
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            self.closed = true;
            Ok(())
        }
    }

    /// In-memory source whose content and marker tests can change.
    #[derive(Clone)]
    struct FakeSource {
        id: String,
        paths: Rc<RefCell<Option<PathSet>>>,
        marker: Rc<Cell<u128>>,
        present: Rc<Cell<bool>>,
        loads: Rc<Cell<usize>>,
    }

    impl FakeSource {
        fn new(id: &str, paths: PathSet) -> Self {
            Self {
                id: id.to_string(),
                paths: Rc::new(RefCell::new(Some(paths))),
                marker: Rc::new(Cell::new(1)),
                present: Rc::new(Cell::new(true)),
                loads: Rc::new(Cell::new(0)),
            }
        }

        fn replace(&self, paths: Option<PathSet>) {
            *self.paths.borrow_mut() = paths;
            self.marker.set(self.marker.get() + 1);
        }
    }

    impl PathSource for FakeSource {
        fn id(&self) -> &str {
            &self.id
        }

        fn marker(&self) -> Result<ChangeMarker> {
            if !self.present.get() {
                return Err(ScopeError::SourceNotFound(self.id.clone().into()));
            }
            Ok(ChangeMarker::new(self.marker.get()))
        }

        fn load(&self) -> Result<PathSet> {
            self.loads.set(self.loads.get() + 1);
            self.paths
                .borrow()
                .clone()
                .ok_or_else(|| ScopeError::Svg("broken document".into()))
        }
    }

    struct FakeCollection(Vec<FakeSource>);

    impl SourceCollection for FakeCollection {
        type Source = FakeSource;

        fn enumerate(&self) -> Result<Vec<FakeSource>> {
            Ok(self.0.clone())
        }
    }

    fn line(y: f64) -> PathSet {
        vec![[(-1.0, y), (1.0, y)].into_iter().collect::<Path>()]
    }

    fn settings() -> LiveSettings {
        LiveSettings {
            interval: Duration::from_millis(100),
            ..LiveSettings::default()
        }
    }

    fn frame(paths: &PathSet) -> Signal {
        synthesize_frame(paths, &SynthParams::default())
    }

    #[test]
    fn play_loop_repeats_until_cancelled() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let mut sink = RecordingSink::new(&clock, &cancel, 5);

        play_loop(&Signal::silence(800), &mut sink, &cancel).unwrap();
        assert_eq!(sink.writes.len(), 5);
        assert!(sink.closed);
    }

    #[test]
    fn single_live_swaps_in_changed_source() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let source = FakeSource::new("drawing", line(0.0));
        let mut sink = RecordingSink::new(&clock, &cancel, 90);
        let editor = source.clone();
        sink.on_write = Box::new(move |count| {
            if count == 10 {
                editor.replace(Some(line(0.5)));
            }
        });

        run_single_live(&source, &mut sink, &settings(), &clock, &cancel).unwrap();

        assert_eq!(sink.writes[0], frame(&line(0.0)));
        assert_eq!(sink.writes[10], frame(&line(0.0)));
        assert_eq!(sink.writes.last(), Some(&frame(&line(0.5))));
        assert_eq!(source.loads.get(), 2);
        assert!(sink.closed);
    }

    #[test]
    fn failed_reload_keeps_previous_render() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let source = FakeSource::new("drawing", line(0.0));
        let mut sink = RecordingSink::new(&clock, &cancel, 90);
        let editor = source.clone();
        sink.on_write = Box::new(move |count| {
            if count == 10 {
                editor.replace(None);
            }
        });

        run_single_live(&source, &mut sink, &settings(), &clock, &cancel).unwrap();

        let original = frame(&line(0.0));
        assert_eq!(sink.writes.len(), 90);
        assert!(sink.writes.iter().all(|written| *written == original));
        // Still retried on later polls since the marker never caught up.
        assert!(source.loads.get() > 2);
    }

    #[test]
    fn initial_load_failure_is_fatal_and_closes_sink() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let source = FakeSource::new("drawing", line(0.0));
        source.replace(None);
        let mut sink = RecordingSink::new(&clock, &cancel, 10);

        let err = run_single_live(&source, &mut sink, &settings(), &clock, &cancel).unwrap_err();
        assert!(matches!(err, ScopeError::Svg(_)));
        assert!(sink.writes.is_empty());
        assert!(sink.closed);
    }

    #[test]
    fn show_live_rotates_and_caches() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let first = FakeSource::new("a", line(0.25));
        let second = FakeSource::new("b", line(-0.25));
        let collection = FakeCollection(vec![first.clone(), second.clone()]);
        let mut sink = RecordingSink::new(&clock, &cancel, 24);

        run_show_live(&collection, &mut sink, &settings(), &clock, &cancel).unwrap();

        // 100 ms slots of 1/60 s frames: six writes per visit.
        let (a, b) = (frame(&line(0.25)), frame(&line(-0.25)));
        for (index, written) in sink.writes.iter().enumerate() {
            let expected = if (index / 6) % 2 == 0 { &a } else { &b };
            assert_eq!(written, expected, "write {index}");
        }
        assert_eq!(first.loads.get(), 1);
        assert_eq!(second.loads.get(), 1);
        assert!(sink.closed);
    }

    #[test]
    fn show_live_plays_animation_once_per_visit() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let source = FakeSource::new("a", line(0.0));
        let collection = FakeCollection(vec![source.clone()]);
        let mut sink = RecordingSink::new(&clock, &cancel, 8);
        let settings = LiveSettings {
            animation_duration: Some(0.05),
            ..settings()
        };

        run_show_live(&collection, &mut sink, &settings, &clock, &cancel).unwrap();

        // Three animation frames count as three frames of slot time.
        let lengths: Vec<usize> = sink.writes.iter().map(Signal::len).collect();
        assert_eq!(lengths, vec![2400, 800, 800, 800, 2400, 800, 800, 800]);
        assert_eq!(source.loads.get(), 1);
    }

    #[test]
    fn show_live_reloads_changed_source() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let source = FakeSource::new("a", line(0.0));
        let collection = FakeCollection(vec![source.clone()]);
        let mut sink = RecordingSink::new(&clock, &cancel, 12);
        let editor = source.clone();
        sink.on_write = Box::new(move |count| {
            if count == 3 {
                editor.replace(Some(line(0.75)));
            }
        });

        run_show_live(&collection, &mut sink, &settings(), &clock, &cancel).unwrap();

        assert_eq!(sink.writes[5], frame(&line(0.0)));
        assert_eq!(sink.writes[6], frame(&line(0.75)));
        assert_eq!(source.loads.get(), 2);
    }

    #[test]
    fn show_live_skips_broken_and_vanished_sources() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let broken = FakeSource::new("broken", line(0.0));
        broken.replace(None);
        let gone = FakeSource::new("gone", line(0.0));
        gone.present.set(false);
        let good = FakeSource::new("good", line(0.5));
        let collection = FakeCollection(vec![broken, gone, good]);
        let mut sink = RecordingSink::new(&clock, &cancel, 12);

        run_show_live(&collection, &mut sink, &settings(), &clock, &cancel).unwrap();

        let expected = frame(&line(0.5));
        assert!(sink.writes.iter().all(|written| *written == expected));
        // One backoff per pass for the broken source only.
        assert_eq!(clock.sleeps.get(), 2);
    }

    #[test]
    fn empty_collection_waits_between_passes() {
        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let mut sink = RecordingSink::new(&clock, &cancel, 1);
        let watcher = cancel.clone();
        let sleeps = clock.sleeps.clone();

        struct Empty {
            sleeps: Rc<Cell<usize>>,
            cancel: CancelToken,
        }
        impl SourceCollection for Empty {
            type Source = FakeSource;
            fn enumerate(&self) -> Result<Vec<FakeSource>> {
                if self.sleeps.get() >= 3 {
                    self.cancel.cancel();
                }
                Ok(Vec::new())
            }
        }

        let collection = Empty {
            sleeps,
            cancel: watcher,
        };
        run_show_live(&collection, &mut sink, &settings(), &clock, &cancel).unwrap();

        assert!(sink.writes.is_empty());
        assert_eq!(clock.sleeps.get(), 4);
        assert_eq!(clock.now(), Duration::from_secs(4));
        assert!(sink.closed);
    }

    #[test]
    fn cache_entries_follow_markers() {
        let source = FakeSource::new("a", line(0.0));
        let mut cache = RenderCache::new();
        let settings = settings();

        let first = cache.resolve(&source, &settings).unwrap();
        let again = cache.resolve(&source, &settings).unwrap();
        assert!(Arc::ptr_eq(&first.cycle, &again.cycle));
        assert!(cache.get("a", ChangeMarker::new(1)).is_some());

        source.replace(Some(line(0.5)));
        assert!(cache.get("a", ChangeMarker::new(2)).is_none());
        let rebuilt = cache.resolve(&source, &settings).unwrap();
        assert!(!Arc::ptr_eq(&first.cycle, &rebuilt.cycle));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn removed_sources_leave_the_cache() {
        let settings = settings();
        let mut cache = RenderCache::new();
        for id in ["a", "b", "c"] {
            cache.resolve(&FakeSource::new(id, line(0.0)), &settings).unwrap();
        }
        assert_eq!(cache.len(), 3);

        cache.retain_ids(["a", "c"]);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("b"));
        assert!(cache.contains("a") && cache.contains("c"));

        cache.retain_ids(std::iter::empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn show_live_forgets_removed_source() {
        struct Shrinking {
            passes: Cell<usize>,
            sources: Vec<FakeSource>,
        }
        impl SourceCollection for Shrinking {
            type Source = FakeSource;
            fn enumerate(&self) -> Result<Vec<FakeSource>> {
                let pass = self.passes.get();
                self.passes.set(pass + 1);
                // The first pass sees both sources, later passes only the first.
                let keep = if pass == 0 { self.sources.len() } else { 1 };
                Ok(self.sources[..keep].to_vec())
            }
        }

        let clock = ManualClock::default();
        let cancel = CancelToken::new();
        let first = FakeSource::new("a", line(0.25));
        let removed = FakeSource::new("b", line(-0.25));
        let collection = Shrinking {
            passes: Cell::new(0),
            sources: vec![first.clone(), removed.clone()],
        };
        let mut sink = RecordingSink::new(&clock, &cancel, 24);

        run_show_live(&collection, &mut sink, &settings(), &clock, &cancel).unwrap();

        // Visits: a, b, then a alone for every later pass.
        let (a, b) = (frame(&line(0.25)), frame(&line(-0.25)));
        assert!(sink.writes[..6].iter().all(|written| *written == a));
        assert!(sink.writes[6..12].iter().all(|written| *written == b));
        assert!(sink.writes[12..].iter().all(|written| *written == a));
        assert_eq!(first.loads.get(), 1);
        assert_eq!(removed.loads.get(), 1);
    }
}
