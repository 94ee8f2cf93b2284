//! The slideshow aggregate and its JSON document form.
//!
//! A `Slideshow` owns its slides, which own their elements. On disk it is a
//! `SlideshowDocument`: plain serde structs whose elements are rebuilt
//! through an [`ElementRegistry`] by type id.

use crate::element::SlideElement;
use crate::errors::DocumentError;
use crate::properties::{PropertyStore, PropertyValue, Size};
use crate::registry::ElementRegistry;
use crate::slide::Slide;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Canvas size used when a show does not define one.
pub const DEFAULT_CANVAS_SIZE: Size = Size::new(800, 600);

/// Persisted form of a whole slideshow.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SlideshowDocument {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub slides: Vec<SlideDocument>,
}

/// Persisted form of a slide.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SlideDocument {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub elements: Vec<ElementDocument>,
}

/// Persisted form of an element. `type` is the registry type id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ElementDocument {
    #[serde(rename = "type")]
    pub type_id: u32,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Default)]
pub struct Slideshow {
    properties: PropertyStore,
    slides: Vec<Slide>,
}

impl Slideshow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    pub fn canvas_size(&self) -> Size {
        match self.properties.size("size") {
            size if size.is_empty() => DEFAULT_CANVAS_SIZE,
            size => size,
        }
    }

    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slide_names(&self) -> Vec<String> {
        self.slides.iter().map(Slide::name).collect()
    }

    /// Index of the first slide called `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.slides.iter().position(|slide| slide.name() == name)
    }

    /// Rebuilds a slideshow from its document form.
    ///
    /// # Errors
    /// `DocumentError::UnknownElementType` if an element's type id is not registered.
    pub fn from_document(document: SlideshowDocument, registry: &ElementRegistry) -> Result<Self, DocumentError> {
        let mut show = Slideshow {
            properties: PropertyStore::from_values(document.properties),
            slides: Vec::with_capacity(document.slides.len()),
        };
        for slide_doc in document.slides {
            let mut elements = Vec::with_capacity(slide_doc.elements.len());
            for element_doc in slide_doc.elements {
                let mut element = registry.create(element_doc.type_id).ok_or_else(|| {
                    warn!("Document references unregistered element type {}", element_doc.type_id);
                    DocumentError::UnknownElementType(element_doc.type_id)
                })?;
                for (key, value) in element_doc.properties {
                    element.properties_mut().set(&key, value);
                }
                elements.push(element);
            }
            show.slides.push(Slide::from_parts(PropertyStore::from_values(slide_doc.properties), elements));
        }
        debug!("Built slideshow with {} slide(s)", show.slides.len());
        Ok(show)
    }

    pub fn to_document(&self) -> SlideshowDocument {
        SlideshowDocument {
            properties: self.properties.values().clone(),
            slides: self.slides.iter().map(|slide| SlideDocument {
                properties: slide.properties().values().clone(),
                elements: slide.elements().iter().map(|element| ElementDocument {
                    type_id: element.element_type_id(),
                    properties: element.properties().values().clone(),
                }).collect(),
            }).collect(),
        }
    }

    /// Loads a slideshow from a JSON document file.
    #[must_use = "loading a slideshow can fail; the Result must be handled"]
    pub fn load(path: &Path, registry: &ElementRegistry) -> Result<Self, DocumentError> {
        info!("Loading slideshow from {}", path.display());
        let content = fs::read_to_string(path)?;
        let document: SlideshowDocument = serde_json::from_str(&content)?;
        Self::from_document(document, registry)
    }

    /// Writes the slideshow as a pretty-printed JSON document.
    #[must_use = "saving a slideshow can fail; the Result must be handled"]
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let content = serde_json::to_string_pretty(&self.to_document())?;
        fs::write(path, content)?;
        info!("Saved slideshow with {} slide(s) to {}", self.slides.len(), path.display());
        Ok(())
    }
}
