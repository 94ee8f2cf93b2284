//! Full-screen playback: navigation over a slideshow and the sliding window
//! of materialized slides around the current one.
//!
//! Everything runs on one thread. The "deferred" lazy-load pass is a one-shot
//! deadline checked by [`PlaybackController::tick`]; pending deadlines are
//! never cancelled, so each pass re-checks the materialized flags and only
//! acts on what changed since it was scheduled.

use crate::config::AppConfig;
use crate::media::MediaBackend;
use crate::properties::Size;
use crate::slideshow::Slideshow;
use crate::surface::RenderSurface;
use log::{debug, info, trace, warn};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

/// Tuning of the lazy-load window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaybackSettings {
    /// Slides kept materialized on each side of the current slide.
    pub window_half_width: usize,
    pub lazy_load_delay: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            window_half_width: crate::config::DEFAULT_MAX_LOADED_SLIDES / 2,
            lazy_load_delay: Duration::from_millis(crate::config::DEFAULT_LAZY_LOAD_DELAY_MS),
        }
    }
}

impl From<&AppConfig> for PlaybackSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            window_half_width: config.window_half_width(),
            lazy_load_delay: config.lazy_load_delay,
        }
    }
}

/// Which slides currently have displayable content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackWindow {
    half_width: usize,
    materialized: Vec<bool>,
}

impl PlaybackWindow {
    pub fn new(half_width: usize, slide_count: usize) -> Self {
        Self { half_width, materialized: vec![false; slide_count] }
    }

    pub fn half_width(&self) -> usize {
        self.half_width
    }

    /// Indices to keep materialized around `current`, clipped to the show.
    /// `None` for an empty show.
    pub fn keep_range(&self, current: usize) -> Option<RangeInclusive<usize>> {
        let last = self.materialized.len().checked_sub(1)?;
        let start = current.saturating_sub(self.half_width);
        let end = current.saturating_add(self.half_width).min(last);
        Some(start..=end)
    }

    pub fn is_materialized(&self, index: usize) -> bool {
        self.materialized.get(index).copied().unwrap_or(false)
    }

    fn set_materialized(&mut self, index: usize, materialized: bool) {
        if let Some(flag) = self.materialized.get_mut(index) {
            *flag = materialized;
        }
    }

    pub fn materialized_indices(&self) -> Vec<usize> {
        self.materialized.iter().enumerate().filter(|(_, m)| **m).map(|(i, _)| i).collect()
    }
}

/// One-shot deadlines for deferred lazy-load passes.
#[derive(Clone, Debug)]
pub struct LazyLoadTimer {
    delay: Duration,
    deadlines: Vec<Instant>,
}

impl LazyLoadTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, deadlines: Vec::new() }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.deadlines.push(now + self.delay);
    }

    /// Removes and counts the deadlines that have passed at `now`.
    pub fn take_due(&mut self, now: Instant) -> usize {
        let before = self.deadlines.len();
        self.deadlines.retain(|deadline| *deadline > now);
        before - self.deadlines.len()
    }

    pub fn pending(&self) -> usize {
        self.deadlines.len()
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.iter().min().copied()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}

type ClosedListener = Box<dyn FnMut(usize)>;

/// Drives playback of a slideshow: one surface per slide, the current index,
/// and the lazy-load window.
pub struct PlaybackController<S: RenderSurface, M: MediaBackend> {
    show: Slideshow,
    surfaces: Vec<S>,
    media: M,
    window: PlaybackWindow,
    timer: LazyLoadTimer,
    current: usize,
    paused: bool,
    blanked: bool,
    closed: bool,
    closed_listeners: Vec<ClosedListener>,
}

impl<S: RenderSurface, M: MediaBackend> PlaybackController<S, M> {
    /// Creates a controller with one empty surface per slide.
    /// Nothing is rendered or played until [`PlaybackController::start`].
    pub fn new(show: Slideshow, media: M, mut make_surface: impl FnMut(Size) -> S, settings: PlaybackSettings) -> Self {
        let canvas = show.canvas_size();
        let surfaces = (0..show.len()).map(|_| make_surface(canvas)).collect();
        let window = PlaybackWindow::new(settings.window_half_width, show.len());
        debug!("Playback controller created for {} slide(s), window half-width {}", show.len(), settings.window_half_width);
        Self {
            show,
            surfaces,
            media,
            window,
            timer: LazyLoadTimer::new(settings.lazy_load_delay),
            current: 0,
            paused: true,
            blanked: false,
            closed: false,
            closed_listeners: Vec::new(),
        }
    }

    fn is_active(&self) -> bool {
        !self.closed && !self.show.is_empty()
    }

    /// Shows slide `index` (clamped to the show) and starts playing it.
    /// A slide already playing from an earlier start is stopped first.
    pub fn start(&mut self, index: usize) {
        if !self.is_active() {
            warn!("Cannot start playback: show is empty or closed");
            return;
        }
        let index = index.min(self.show.len() - 1);
        info!("Starting playback at slide {} of {}", index, self.show.len());
        if self.window.is_materialized(self.current) {
            self.stop();
        }
        self.current = index;
        self.materialize(index);
        self.play();
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn slide_count(&self) -> usize {
        self.show.len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_blanked(&self) -> bool {
        self.blanked
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_materialized(&self, index: usize) -> bool {
        self.window.is_materialized(index)
    }

    pub fn materialized_indices(&self) -> Vec<usize> {
        self.window.materialized_indices()
    }

    pub fn pending_lazy_loads(&self) -> usize {
        self.timer.pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    pub fn surface(&self, index: usize) -> Option<&S> {
        self.surfaces.get(index)
    }

    pub fn current_surface(&self) -> Option<&S> {
        self.surfaces.get(self.current)
    }

    pub fn slideshow(&self) -> &Slideshow {
        &self.show
    }

    pub fn slide_names(&self) -> Vec<String> {
        self.show.slide_names()
    }

    pub fn on_closed(&mut self, listener: impl FnMut(usize) + 'static) {
        self.closed_listeners.push(Box::new(listener));
    }

    pub fn next(&mut self) -> bool {
        if !self.is_active() || self.current + 1 >= self.show.len() {
            return false;
        }
        self.navigate(self.current + 1)
    }

    pub fn prev(&mut self) -> bool {
        if !self.is_active() || self.current == 0 {
            return false;
        }
        self.navigate(self.current - 1)
    }

    pub fn first(&mut self) -> bool {
        if !self.is_active() || self.current == 0 {
            return false;
        }
        self.navigate(0)
    }

    pub fn last(&mut self) -> bool {
        if !self.is_active() || self.current + 1 == self.show.len() {
            return false;
        }
        self.navigate(self.show.len() - 1)
    }

    pub fn goto_index(&mut self, index: usize) -> bool {
        if !self.is_active() {
            return false;
        }
        if index >= self.show.len() {
            warn!("Ignoring jump to slide {}: show has {} slide(s)", index, self.show.len());
            return false;
        }
        if index == self.current {
            return false;
        }
        self.navigate(index)
    }

    /// Jumps to the first slide called `name`. An unknown name or the current
    /// slide's name just resumes playback.
    pub fn goto_by_name(&mut self, name: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        self.pause();
        match self.show.index_of(name) {
            Some(index) if index != self.current => self.navigate(index),
            resolved => {
                if resolved.is_none() {
                    warn!("No slide named '{}'", name);
                }
                self.play();
                false
            }
        }
    }

    /// Pauses while a slide chooser is shown. Returns the names to offer.
    /// Follow up with [`PlaybackController::goto_by_name`] or
    /// [`PlaybackController::cancel_goto`].
    pub fn begin_goto(&mut self) -> Vec<String> {
        self.pause();
        self.show.slide_names()
    }

    /// Resumes playback after the chooser was dismissed without a choice.
    pub fn cancel_goto(&mut self) {
        debug!("Go to cancelled, resuming slide {}", self.current);
        self.play();
    }

    fn navigate(&mut self, target: usize) -> bool {
        debug!("Navigating from slide {} to {}", self.current, target);
        self.stop();
        self.current = target;
        self.play();
        true
    }

    /// Plays the current slide, materializing it first if needed. When it is
    /// already materialized the window update is deferred.
    pub fn play(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.window.is_materialized(self.current) {
            trace!("Slide {} ready, deferring lazy load", self.current);
            self.timer.schedule(Instant::now());
        } else {
            self.lazy_load();
        }
        self.paused = false;
        if let Some(slide) = self.show.slide_mut(self.current) {
            slide.play();
        }
    }

    pub fn pause(&mut self) {
        if !self.is_active() {
            return;
        }
        self.paused = true;
        if let Some(slide) = self.show.slide_mut(self.current) {
            slide.pause();
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if self.paused { self.play() } else { self.pause() }
    }

    pub fn stop(&mut self) {
        if !self.is_active() {
            return;
        }
        self.paused = true;
        if let Some(slide) = self.show.slide_mut(self.current) {
            slide.stop();
        }
    }

    pub fn toggle_mute(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Some(slide) = self.show.slide_mut(self.current) {
            slide.toggle_mute();
        }
    }

    pub fn restart(&mut self) {
        self.stop();
        self.play();
    }

    /// Hides or shows the slides without touching playback.
    pub fn toggle_black(&mut self) {
        self.blanked = !self.blanked;
        debug!("Blank screen: {}", self.blanked);
    }

    /// Runs every deferred lazy-load pass due at `now`. Returns how many ran.
    pub fn tick(&mut self, now: Instant) -> usize {
        let due = self.timer.take_due(now);
        for _ in 0..due {
            self.lazy_load();
        }
        due
    }

    fn materialize(&mut self, index: usize) {
        if self.window.is_materialized(index) {
            return;
        }
        if let (Some(slide), Some(surface)) = (self.show.slide_mut(index), self.surfaces.get_mut(index)) {
            slide.render(surface, &self.media, false);
            self.window.set_materialized(index, true);
            debug!("Materialized slide {}", index);
        }
    }

    fn evict(&mut self, index: usize) {
        if !self.window.is_materialized(index) {
            return;
        }
        if let Some(slide) = self.show.slide_mut(index) {
            slide.stop();
            slide.destroy();
        }
        if let Some(surface) = self.surfaces.get_mut(index) {
            surface.clear();
        }
        self.window.set_materialized(index, false);
        debug!("Evicted slide {}", index);
    }

    /// Evicts every slide outside the window around the current slide and
    /// materializes (without playing) every slide inside it.
    pub fn lazy_load(&mut self) {
        if !self.is_active() {
            return;
        }
        let Some(keep) = self.window.keep_range(self.current) else {
            return;
        };
        trace!("Lazy load around slide {}: keeping {:?}", self.current, keep);
        for index in 0..self.show.len() {
            if keep.contains(&index) {
                self.materialize(index);
            } else {
                self.evict(index);
            }
        }
    }

    /// Stops and releases every materialized slide, then notifies the
    /// `on_closed` listeners with the current index, which is returned.
    pub fn close(&mut self) -> usize {
        if self.closed {
            return self.current;
        }
        info!("Closing playback at slide {}", self.current);
        for index in self.window.materialized_indices() {
            self.evict(index);
        }
        self.timer.clear();
        self.paused = true;
        self.closed = true;
        let current = self.current;
        for listener in self.closed_listeners.iter_mut() {
            listener(current);
        }
        current
    }
}
