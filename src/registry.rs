//! Element kinds known to the application, keyed by numeric type id.
//!
//! The built-in kinds are registered by [`ElementRegistry::with_builtin`].
//! Hosts that load extensions register additional kinds at startup.

use crate::element::{
    AudioElement, ImageElement, MovieElement, RectElement, SlideElement, SlideElementType,
    AUDIO_TYPE_ID, IMAGE_TYPE_ID, MOVIE_TYPE_ID, RECT_TYPE_ID,
};
use log::{debug, info};
use std::collections::BTreeMap;

pub type ElementFactory = Box<dyn Fn() -> Box<dyn SlideElement>>;

struct Entry {
    element_type: SlideElementType,
    factory: ElementFactory,
}

#[derive(Default)]
pub struct ElementRegistry {
    entries: BTreeMap<u32, Entry>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding rectangle, image, audio and movie elements.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SlideElementType::new(RECT_TYPE_ID, "Rectangle", "draw-rectangle"), || Box::new(RectElement::new()));
        registry.register(SlideElementType::new(IMAGE_TYPE_ID, "Image", "image-x-generic"), || Box::new(ImageElement::new()));
        registry.register(SlideElementType::new(AUDIO_TYPE_ID, "Audio", "audio-x-generic"), || Box::new(AudioElement::new()));
        registry.register(SlideElementType::new(MOVIE_TYPE_ID, "Video", "video-x-generic"), || Box::new(MovieElement::new()));
        registry
    }

    /// Registers `element_type`, replacing any kind with the same id.
    pub fn register<F>(&mut self, element_type: SlideElementType, factory: F)
    where
        F: Fn() -> Box<dyn SlideElement> + 'static,
    {
        let id = element_type.id();
        let entry = Entry { element_type, factory: Box::new(factory) };
        if self.entries.insert(id, entry).is_some() {
            info!("Element type {} re-registered", id);
        } else {
            debug!("Element type {} registered", id);
        }
    }

    pub fn element_type(&self, id: u32) -> Option<&SlideElementType> {
        self.entries.get(&id).map(|entry| &entry.element_type)
    }

    /// Registered kinds, ordered by id.
    pub fn types(&self) -> impl Iterator<Item = &SlideElementType> {
        self.entries.values().map(|entry| &entry.element_type)
    }

    /// Creates a new element of kind `id` with its default properties.
    pub fn create(&self, id: u32) -> Option<Box<dyn SlideElement>> {
        self.entries.get(&id).map(|entry| (entry.factory)())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
