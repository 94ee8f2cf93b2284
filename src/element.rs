//! Slide elements: the renderable, property-bearing units a slide is made of.
//!
//! Every element kind implements [`SlideElement`]. Rectangles and images are
//! purely visual; audio and movie elements also own a media player while they
//! are materialized.

use crate::media::{MediaBackend, MediaPlayer, MediaSource, PlayerState};
use crate::properties::{PropertyStore, Point, Size};
use crate::surface::{BrushStyle, DisplayItem, ItemId, PenStyle, RenderSurface};
use log::{debug, trace, warn};
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

pub const RECT_TYPE_ID: u32 = 1;
pub const IMAGE_TYPE_ID: u32 = 2;
pub const AUDIO_TYPE_ID: u32 = 3;
pub const MOVIE_TYPE_ID: u32 = 4;

/// Metadata describing an element kind, used to offer it in a UI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideElementType {
    id: u32,
    label: String,
    icon: String,
}

impl SlideElementType {
    pub fn new(id: u32, label: impl Into<String>, icon: impl Into<String>) -> Self {
        Self { id, label: label.into(), icon: icon.into() }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Freedesktop icon name.
    pub fn icon(&self) -> &str {
        &self.icon
    }
}

/// Behaviour shared by every element kind.
///
/// Playback operations default to no-ops so purely visual elements only
/// implement rendering.
pub trait SlideElement {
    fn element_type_id(&self) -> u32;
    fn properties(&self) -> &PropertyStore;
    fn properties_mut(&mut self) -> &mut PropertyStore;

    /// Adds this element's display item to `surface`, if it has one.
    ///
    /// `interactive` is true while editing: nothing may start playing and
    /// playback-only elements produce nothing.
    fn render(&mut self, surface: &mut dyn RenderSurface, media: &dyn MediaBackend, interactive: bool) -> Option<ItemId>;

    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn stop(&mut self) {}
    fn toggle_mute(&mut self) {}
    /// Releases any playback resource. Safe to call repeatedly and without a prior render.
    fn destroy(&mut self) {}

    fn preview_url(&self) -> Option<PathBuf> {
        None
    }

    fn name(&self) -> String {
        self.properties().string("name")
    }

    fn is_visible(&self) -> bool {
        self.properties().bool_or("visible", true)
    }
}

fn base_properties() -> PropertyStore {
    let mut properties = PropertyStore::new();
    properties.set_default("name", "");
    properties.set_default("visible", true);
    properties.set_default("position", Point::new(0, 0));
    properties
}

fn source_path(properties: &PropertyStore) -> Option<PathBuf> {
    let src = properties.string("src");
    if src.is_empty() { None } else { Some(PathBuf::from(src)) }
}

/// State shared between a handle and its player's state callback.
#[derive(Default)]
struct PlayerFlags {
    finished: Cell<bool>,
    // A commanded stop whose Stopped report has not arrived yet.
    stop_pending: Cell<bool>,
    last_state: Cell<Option<PlayerState>>,
}

impl PlayerFlags {
    fn on_state(&self, state: PlayerState) {
        self.last_state.set(Some(state));
        if state != PlayerState::Stopped {
            return;
        }
        if self.stop_pending.replace(false) {
            trace!("Stopped report for a commanded stop");
        } else {
            self.finished.set(true);
        }
    }
}

/// Player slot of a media element and its playback-finished flag.
///
/// The flag is only raised when the player stops on its own; the report that
/// follows a [`MediaHandle::stop`] is consumed instead.
#[derive(Default)]
pub struct MediaHandle {
    player: Option<Box<dyn MediaPlayer>>,
    flags: Rc<PlayerFlags>,
}

impl MediaHandle {
    /// Replaces the current player (if any) with a fresh one for `source`.
    pub fn open(&mut self, media: &dyn MediaBackend, source: MediaSource) {
        self.release();
        self.flags = Rc::new(PlayerFlags::default());
        let flags = self.flags.clone();
        let on_state = Box::new(move |state: PlayerState| flags.on_state(state));
        match media.create_player(&source, on_state) {
            Ok(player) => {
                debug!("Player allocated for '{}'", source.path.display());
                self.player = Some(player);
            }
            Err(e) => warn!("Could not create a player for '{}': {}", source.path.display(), e),
        }
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    pub fn is_finished(&self) -> bool {
        self.flags.finished.get()
    }

    pub fn play(&mut self) {
        if self.is_finished() {
            return;
        }
        if let Some(player) = self.player.as_mut() {
            player.play();
        }
    }

    pub fn pause(&mut self) {
        if self.is_finished() {
            return;
        }
        if let Some(player) = self.player.as_mut() {
            player.pause();
        }
    }

    pub fn stop(&mut self) {
        if let Some(player) = self.player.as_mut() {
            // An already stopped player reports nothing for this command.
            if self.flags.last_state.get() != Some(PlayerState::Stopped) {
                self.flags.stop_pending.set(true);
            }
            player.stop();
        }
        self.flags.finished.set(false);
    }

    pub fn toggle_mute(&mut self) {
        if let Some(player) = self.player.as_mut() {
            let muted = !player.is_muted();
            player.set_muted(muted);
        }
    }

    pub fn release(&mut self) {
        if self.player.take().is_some() {
            debug!("Player released");
        }
    }
}

fn media_source(properties: &PropertyStore, path: PathBuf, video: bool) -> MediaSource {
    MediaSource {
        path,
        volume: properties.int_or("volume", 100).clamp(0, 100) as u8,
        looping: properties.bool("loop"),
        video,
    }
}

// --- Rect ---

/// A filled, bordered rectangle.
pub struct RectElement {
    properties: PropertyStore,
}

impl RectElement {
    pub fn new() -> Self {
        let mut properties = base_properties();
        properties.set_default("size", Size::new(100, 100));
        properties.set_default("bgStyle", 1);
        properties.set_default("borderSize", 1);
        Self { properties }
    }

    pub fn pen_style(&self) -> PenStyle {
        PenStyle::from_code(self.properties.int("borderStyle"))
    }

    pub fn brush_style(&self) -> BrushStyle {
        BrushStyle::from_code(self.properties.int_or("bgStyle", 1))
    }
}

impl Default for RectElement {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideElement for RectElement {
    fn element_type_id(&self) -> u32 { RECT_TYPE_ID }
    fn properties(&self) -> &PropertyStore { &self.properties }
    fn properties_mut(&mut self) -> &mut PropertyStore { &mut self.properties }

    fn render(&mut self, surface: &mut dyn RenderSurface, _media: &dyn MediaBackend, _interactive: bool) -> Option<ItemId> {
        if !self.is_visible() {
            return None;
        }
        let item = DisplayItem::Rect {
            position: self.properties.point("position"),
            size: self.properties.size("size"),
            fill: self.properties.color("color"),
            brush: self.brush_style(),
            border: self.properties.color("borderColor"),
            pen: self.pen_style(),
            border_width: self.properties.int_or("borderSize", 1),
        };
        trace!("Rendering rect '{}'", self.name());
        Some(surface.add_item(item))
    }
}

// --- Image ---

/// A picture loaded from `src`.
pub struct ImageElement {
    properties: PropertyStore,
}

impl ImageElement {
    pub fn new() -> Self {
        let mut properties = base_properties();
        properties.set_default("src", "");
        properties.set_default("keepRatio", true);
        Self { properties }
    }
}

impl Default for ImageElement {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideElement for ImageElement {
    fn element_type_id(&self) -> u32 { IMAGE_TYPE_ID }
    fn properties(&self) -> &PropertyStore { &self.properties }
    fn properties_mut(&mut self) -> &mut PropertyStore { &mut self.properties }

    fn render(&mut self, surface: &mut dyn RenderSurface, _media: &dyn MediaBackend, _interactive: bool) -> Option<ItemId> {
        if !self.is_visible() {
            return None;
        }
        let src = source_path(&self.properties)?;
        trace!("Rendering image '{}' from {}", self.name(), src.display());
        Some(surface.add_item(DisplayItem::Image {
            position: self.properties.point("position"),
            size: self.properties.size("size"),
            src,
            keep_ratio: self.properties.bool_or("keepRatio", true),
        }))
    }

    fn preview_url(&self) -> Option<PathBuf> {
        source_path(&self.properties)
    }
}

// --- Audio ---

/// A sound played while its slide is shown. Has no visual representation.
pub struct AudioElement {
    properties: PropertyStore,
    media: MediaHandle,
}

impl AudioElement {
    pub fn new() -> Self {
        let mut properties = base_properties();
        properties.set_default("src", "");
        properties.set_default("loop", false);
        properties.set_default("volume", 100);
        Self { properties, media: MediaHandle::default() }
    }

    pub fn media(&self) -> &MediaHandle {
        &self.media
    }
}

impl Default for AudioElement {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideElement for AudioElement {
    fn element_type_id(&self) -> u32 { AUDIO_TYPE_ID }
    fn properties(&self) -> &PropertyStore { &self.properties }
    fn properties_mut(&mut self) -> &mut PropertyStore { &mut self.properties }

    fn render(&mut self, _surface: &mut dyn RenderSurface, media: &dyn MediaBackend, interactive: bool) -> Option<ItemId> {
        if interactive || !self.is_visible() {
            return None;
        }
        match source_path(&self.properties) {
            Some(path) => {
                let source = media_source(&self.properties, path, false);
                self.media.open(media, source);
            }
            None => warn!("Audio element '{}' has no source", self.name()),
        }
        None
    }

    fn play(&mut self) { self.media.play(); }
    fn pause(&mut self) { self.media.pause(); }
    fn stop(&mut self) { self.media.stop(); }
    fn toggle_mute(&mut self) { self.media.toggle_mute(); }
    fn destroy(&mut self) { self.media.release(); }

    fn preview_url(&self) -> Option<PathBuf> {
        source_path(&self.properties)
    }
}

// --- Movie ---

/// A video shown in a rectangle of the slide.
pub struct MovieElement {
    properties: PropertyStore,
    media: MediaHandle,
}

impl MovieElement {
    pub fn new() -> Self {
        let mut properties = base_properties();
        properties.set_default("src", "");
        properties.set_default("loop", false);
        properties.set_default("volume", 100);
        properties.set_default("size", Size::new(320, 240));
        Self { properties, media: MediaHandle::default() }
    }

    pub fn media(&self) -> &MediaHandle {
        &self.media
    }
}

impl Default for MovieElement {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideElement for MovieElement {
    fn element_type_id(&self) -> u32 { MOVIE_TYPE_ID }
    fn properties(&self) -> &PropertyStore { &self.properties }
    fn properties_mut(&mut self) -> &mut PropertyStore { &mut self.properties }

    fn render(&mut self, surface: &mut dyn RenderSurface, media: &dyn MediaBackend, interactive: bool) -> Option<ItemId> {
        if !self.is_visible() {
            return None;
        }
        let src = source_path(&self.properties)?;
        if !interactive {
            let source = media_source(&self.properties, src.clone(), true);
            self.media.open(media, source);
        }
        Some(surface.add_item(DisplayItem::Video {
            position: self.properties.point("position"),
            size: self.properties.size("size"),
            src,
            live: !interactive,
        }))
    }

    fn play(&mut self) { self.media.play(); }
    fn pause(&mut self) { self.media.pause(); }
    fn stop(&mut self) { self.media.stop(); }
    fn toggle_mute(&mut self) { self.media.toggle_mute(); }
    fn destroy(&mut self) { self.media.release(); }

    fn preview_url(&self) -> Option<PathBuf> {
        source_path(&self.properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::testing::FakeBackend;
    use crate::media::SilentBackend;
    use crate::properties::Color;
    use crate::surface::Scene;

    fn scene() -> Scene {
        Scene::new(Size::new(800, 600))
    }

    fn audio(src: &str) -> AudioElement {
        let mut element = AudioElement::new();
        element.properties_mut().set("src", src);
        element
    }

    #[test]
    fn rect_defaults_and_render() {
        let media = FakeBackend::default();
        let mut rect = RectElement::new();
        rect.properties_mut().set("color", Color::rgb(10, 20, 30));
        rect.properties_mut().set("position", Point::new(5, 6));

        let mut surface = scene();
        let id = rect.render(&mut surface, &media, false).unwrap();
        match surface.item(id).unwrap() {
            DisplayItem::Rect { position, size, fill, brush, pen, border_width, .. } => {
                assert_eq!(*position, Point::new(5, 6));
                assert_eq!(*size, Size::new(100, 100));
                assert_eq!(*fill, Color::rgb(10, 20, 30));
                assert_eq!(*brush, BrushStyle::Solid);
                assert_eq!(*pen, PenStyle::NoPen);
                assert_eq!(*border_width, 1);
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn rect_with_out_of_range_styles_has_no_border_or_fill() {
        let media = FakeBackend::default();
        let mut rect = RectElement::new();
        rect.properties_mut().set("borderStyle", 99);
        rect.properties_mut().set("bgStyle", -1);
        assert_eq!(rect.pen_style(), PenStyle::NoPen);
        assert_eq!(rect.brush_style(), BrushStyle::NoBrush);

        let mut surface = scene();
        rect.render(&mut surface, &media, false);
        assert!(matches!(
            surface.items().next(),
            Some(DisplayItem::Rect { pen: PenStyle::NoPen, brush: BrushStyle::NoBrush, .. })
        ));
    }

    #[test]
    fn invisible_elements_render_nothing() {
        let media = FakeBackend::default();
        let mut surface = scene();

        let mut rect = RectElement::new();
        rect.properties_mut().set("visible", false);
        assert!(rect.render(&mut surface, &media, false).is_none());

        let mut sound = audio("a.ogg");
        sound.properties_mut().set("visible", false);
        assert!(sound.render(&mut surface, &media, false).is_none());

        assert!(surface.is_empty());
        assert_eq!(media.record.borrow().created.len(), 0);
        sound.destroy();
        sound.destroy();
    }

    #[test]
    fn interactive_render_never_plays_or_shows_audio() {
        let media = FakeBackend::default();
        let mut surface = scene();

        let mut sound = audio("a.ogg");
        assert!(sound.render(&mut surface, &media, true).is_none());
        sound.play();

        let mut movie = MovieElement::new();
        movie.properties_mut().set("src", "clip.mp4");
        let id = movie.render(&mut surface, &media, true).unwrap();
        assert!(matches!(surface.item(id), Some(DisplayItem::Video { live: false, .. })));
        movie.play();

        assert_eq!(media.record.borrow().created.len(), 0);
        assert_eq!(media.calls("play"), 0);
    }

    #[test]
    fn audio_render_allocates_player_with_volume_and_loop() {
        let media = FakeBackend::default();
        let mut sound = audio("theme.ogg");
        sound.properties_mut().set("volume", 140);
        sound.properties_mut().set("loop", true);

        let mut surface = scene();
        assert!(sound.render(&mut surface, &media, false).is_none());
        assert!(surface.is_empty());
        assert!(sound.media().has_player());

        let record = media.record.borrow();
        let created = &record.created;
        assert_eq!(created[0].path, PathBuf::from("theme.ogg"));
        assert_eq!(created[0].volume, 100);
        assert!(created[0].looping);
        assert!(!created[0].video);
    }

    #[test]
    fn finished_playback_suppresses_play_until_stopped() {
        let media = FakeBackend::default();
        let mut sound = audio("a.ogg");
        sound.render(&mut scene(), &media, false);

        sound.play();
        assert_eq!(media.calls("play"), 1);

        media.report(0, PlayerState::Stopped);
        assert!(sound.media().is_finished());
        sound.play();
        sound.pause();
        assert_eq!(media.calls("play"), 1);
        assert_eq!(media.calls("pause"), 0);

        sound.stop();
        assert!(!sound.media().is_finished());
        sound.play();
        assert_eq!(media.calls("play"), 2);
    }

    #[test]
    fn late_report_of_commanded_stop_is_not_an_end_of_media() {
        let media = FakeBackend::default();
        let mut sound = audio("a.ogg");
        sound.render(&mut scene(), &media, false);

        sound.play();
        sound.stop();
        sound.play();
        media.report(0, PlayerState::Stopped);
        assert!(!sound.media().is_finished());

        sound.pause();
        sound.play();
        assert_eq!(media.calls("pause"), 1);
        assert_eq!(media.calls("play"), 3);

        // The next Stopped is a real end of media again.
        media.report(0, PlayerState::Stopped);
        assert!(sound.media().is_finished());
    }

    #[test]
    fn silent_player_restart_keeps_playback_controls() {
        let mut sound = audio("a.ogg");
        sound.render(&mut scene(), &SilentBackend, false);
        sound.play();
        sound.stop();
        sound.stop();
        sound.play();
        assert!(!sound.media().is_finished());
    }

    #[test]
    fn playback_without_player_is_a_no_op() {
        let mut sound = audio("a.ogg");
        sound.play();
        sound.pause();
        sound.stop();
        sound.toggle_mute();
        sound.destroy();
        assert!(!sound.media().has_player());
    }

    #[test]
    fn destroy_releases_exactly_once() {
        let media = FakeBackend::default();
        let mut movie = MovieElement::new();
        movie.properties_mut().set("src", "clip.mp4");
        movie.render(&mut scene(), &media, false);
        assert_eq!(media.alive(), 1);

        movie.destroy();
        movie.destroy();
        assert_eq!(media.alive(), 0);
        assert_eq!(media.record.borrow().released, vec![0]);
    }

    #[test]
    fn rerender_replaces_previous_player() {
        let media = FakeBackend::default();
        let mut sound = audio("a.ogg");
        sound.render(&mut scene(), &media, false);
        sound.render(&mut scene(), &media, false);
        assert_eq!(media.record.borrow().created.len(), 2);
        assert_eq!(media.alive(), 1);
    }

    #[test]
    fn toggle_mute_flips_player_state() {
        let media = FakeBackend::default();
        let mut sound = audio("a.ogg");
        sound.render(&mut scene(), &media, false);
        sound.toggle_mute();
        sound.toggle_mute();
        assert_eq!(media.calls("mute"), 2);
    }

    #[test]
    fn refused_player_leaves_element_inert() {
        let media = FakeBackend::default();
        media.record.borrow_mut().refuse = true;
        let mut sound = audio("a.ogg");
        sound.render(&mut scene(), &media, false);
        assert!(!sound.media().has_player());
        sound.play();
        sound.destroy();
    }

    #[test]
    fn image_renders_from_source() {
        let media = FakeBackend::default();
        let mut surface = scene();
        let mut image = ImageElement::new();
        assert!(image.render(&mut surface, &media, false).is_none());
        assert!(image.preview_url().is_none());

        image.properties_mut().set("src", "photo.png");
        image.properties_mut().set("size", Size::new(64, 48));
        image.render(&mut surface, &media, true);
        assert_eq!(image.preview_url(), Some(PathBuf::from("photo.png")));
        assert!(matches!(
            surface.items().next(),
            Some(DisplayItem::Image { size: Size { width: 64, height: 48 }, keep_ratio: true, .. })
        ));
    }
}
