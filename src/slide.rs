//! A slide: an ordered stack of elements plus its own name and background.

use crate::element::SlideElement;
use crate::media::MediaBackend;
use crate::properties::PropertyStore;
use crate::surface::{DisplayItem, RenderSurface};
use log::{debug, trace};

pub struct Slide {
    properties: PropertyStore,
    elements: Vec<Box<dyn SlideElement>>,
}

impl Slide {
    pub fn new(name: &str) -> Self {
        let mut properties = PropertyStore::new();
        properties.set("name", name);
        Self { properties, elements: Vec::new() }
    }

    pub(crate) fn from_parts(properties: PropertyStore, elements: Vec<Box<dyn SlideElement>>) -> Self {
        Self { properties, elements }
    }

    pub fn name(&self) -> String {
        self.properties.string("name")
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    /// Appends `element` on top of the existing ones.
    pub fn add_element(&mut self, element: Box<dyn SlideElement>) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[Box<dyn SlideElement>] {
        &self.elements
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut (dyn SlideElement + 'static)> {
        self.elements.get_mut(index).map(|element| element.as_mut())
    }

    /// Removes and returns the element at `index`, releasing its player.
    pub fn remove_element(&mut self, index: usize) -> Option<Box<dyn SlideElement>> {
        if index >= self.elements.len() {
            return None;
        }
        let mut element = self.elements.remove(index);
        element.destroy();
        Some(element)
    }

    /// Renders the background and then every element in order, so later
    /// elements end up on top. Returns the number of display items added.
    pub fn render(&mut self, surface: &mut dyn RenderSurface, media: &dyn MediaBackend, interactive: bool) -> usize {
        let mut added = 0;
        if let Some(color) = self.properties.optional_color("background") {
            surface.add_item(DisplayItem::Background(color));
            added += 1;
        }
        for element in self.elements.iter_mut() {
            if element.render(surface, media, interactive).is_some() {
                added += 1;
            }
        }
        debug!("Rendered slide '{}' ({} item(s), interactive: {})", self.name(), added, interactive);
        added
    }

    pub fn play(&mut self) {
        trace!("Slide '{}': play", self.name());
        self.elements.iter_mut().for_each(|e| e.play());
    }

    pub fn pause(&mut self) {
        trace!("Slide '{}': pause", self.name());
        self.elements.iter_mut().for_each(|e| e.pause());
    }

    pub fn stop(&mut self) {
        trace!("Slide '{}': stop", self.name());
        self.elements.iter_mut().for_each(|e| e.stop());
    }

    pub fn toggle_mute(&mut self) {
        self.elements.iter_mut().for_each(|e| e.toggle_mute());
    }

    pub fn destroy(&mut self) {
        trace!("Slide '{}': destroy", self.name());
        self.elements.iter_mut().for_each(|e| e.destroy());
    }
}

impl std::fmt::Debug for Slide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slide")
            .field("properties", &self.properties)
            .field("elements", &self.elements.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{AudioElement, MovieElement, RectElement};
    use crate::media::testing::FakeBackend;
    use crate::properties::{Color, Point, Size};
    use crate::surface::Scene;

    fn rect_at(x: i32) -> Box<dyn SlideElement> {
        let mut rect = RectElement::new();
        rect.properties_mut().set("position", Point::new(x, 0));
        Box::new(rect)
    }

    fn media_slide() -> Slide {
        let mut slide = Slide::new("Media");
        let mut sound = AudioElement::new();
        sound.properties_mut().set("src", "a.ogg");
        let mut movie = MovieElement::new();
        movie.properties_mut().set("src", "b.mp4");
        slide.add_element(Box::new(sound));
        slide.add_element(Box::new(movie));
        slide
    }

    #[test]
    fn renders_background_then_elements_in_order() {
        let media = FakeBackend::default();
        let mut slide = Slide::new("Intro");
        slide.properties_mut().set("background", Color::WHITE);
        slide.add_element(rect_at(1));
        slide.add_element(rect_at(2));

        let mut scene = Scene::new(Size::new(800, 600));
        assert_eq!(slide.render(&mut scene, &media, false), 3);
        let items: Vec<&DisplayItem> = scene.items().collect();
        assert_eq!(items[0], &DisplayItem::Background(Color::WHITE));
        assert!(matches!(items[1], DisplayItem::Rect { position: Point { x: 1, .. }, .. }));
        assert!(matches!(items[2], DisplayItem::Rect { position: Point { x: 2, .. }, .. }));
    }

    #[test]
    fn playback_fans_out_to_every_element() {
        let media = FakeBackend::default();
        let mut slide = media_slide();
        let mut scene = Scene::new(Size::new(800, 600));
        assert_eq!(slide.render(&mut scene, &media, false), 1);

        slide.play();
        slide.pause();
        slide.toggle_mute();
        slide.stop();
        assert_eq!(media.calls("play"), 2);
        assert_eq!(media.calls("pause"), 2);
        assert_eq!(media.calls("mute"), 2);
        assert_eq!(media.calls("stop"), 2);

        slide.destroy();
        slide.destroy();
        assert_eq!(media.alive(), 0);
    }

    #[test]
    fn dropping_a_slide_releases_players() {
        let media = FakeBackend::default();
        let mut slide = media_slide();
        slide.render(&mut Scene::default(), &media, false);
        assert_eq!(media.alive(), 2);
        drop(slide);
        assert_eq!(media.alive(), 0);
    }

    #[test]
    fn remove_element_releases_its_player() {
        let media = FakeBackend::default();
        let mut slide = media_slide();
        slide.render(&mut Scene::default(), &media, false);
        let removed = slide.remove_element(0).unwrap();
        assert_eq!(removed.name(), "");
        assert_eq!(slide.elements().len(), 1);
        assert_eq!(media.alive(), 1);
        assert!(slide.remove_element(5).is_none());
    }
}
