//! Builds slides from a directory of media files, one slide per file.

use crate::element::{SlideElement, AUDIO_TYPE_ID, IMAGE_TYPE_ID, MOVIE_TYPE_ID};
use crate::errors::MediaError;
use crate::properties::Size;
use crate::registry::ElementRegistry;
use crate::slide::Slide;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];
const MOVIE_EXTENSIONS: &[&str] = &["avi", "mkv", "mp4", "mov", "ogv", "webm", "mpg", "mpeg"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "oga", "wav", "flac", "m4a"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Movie,
    Audio,
}

impl MediaKind {
    fn type_id(self) -> u32 {
        match self {
            MediaKind::Image => IMAGE_TYPE_ID,
            MediaKind::Movie => MOVIE_TYPE_ID,
            MediaKind::Audio => AUDIO_TYPE_ID,
        }
    }
}

/// Order of the imported slides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImportOrder {
    #[default]
    Name,
    NameReversed,
    /// Oldest modification time first.
    Date,
    /// Largest first.
    Size,
    /// By extension, then name.
    Type,
}

/// Classifies a file by its (case-insensitive) extension.
pub fn classify(path: &Path) -> Option<MediaKind> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Image)
    } else if MOVIE_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Movie)
    } else if AUDIO_EXTENSIONS.contains(&extension.as_str()) {
        Some(MediaKind::Audio)
    } else {
        None
    }
}

/// Creates the element matching `path`, named after the file stem.
///
/// Images get their pixel size; movies get `movie_size`.
///
/// # Errors
/// `MediaError::UnsupportedFormat` if the extension is not a known media kind
/// or no element of that kind is registered.
pub fn element_for_file(path: &Path, registry: &ElementRegistry, movie_size: Size) -> Result<Box<dyn SlideElement>, MediaError> {
    let unsupported = || MediaError::UnsupportedFormat(path.display().to_string());
    let kind = classify(path).ok_or_else(unsupported)?;
    let mut element = registry.create(kind.type_id()).ok_or_else(unsupported)?;
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let properties = element.properties_mut();
    properties.set("name", stem);
    properties.set("src", path.to_string_lossy().into_owned());
    match kind {
        MediaKind::Image => match image_size(path) {
            Ok(size) => properties.set("size", size),
            Err(e) => warn!("Could not read image size of '{}': {}", path.display(), e),
        },
        MediaKind::Movie => properties.set("size", movie_size),
        MediaKind::Audio => {}
    }
    Ok(element)
}

/// Pixel size of the image at `path`.
pub fn image_size(path: &Path) -> Result<Size, MediaError> {
    let (width, height) = image::image_dimensions(path)?;
    Ok(Size::new(width.min(i32::MAX as u32) as i32, height.min(i32::MAX as u32) as i32))
}

struct Candidate {
    path: PathBuf,
    modified: Option<SystemTime>,
    len: u64,
}

fn readable(path: &Path) -> bool {
    match fs::File::open(path) {
        Ok(_) => true,
        Err(e) => {
            debug!("Skipping unreadable '{}': {}", path.display(), e);
            false
        }
    }
}

fn sort_candidates(files: &mut [Candidate], order: ImportOrder) {
    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    match order {
        ImportOrder::Name => {}
        ImportOrder::NameReversed => files.reverse(),
        ImportOrder::Date => files.sort_by_key(|c| c.modified),
        ImportOrder::Size => files.sort_by(|a, b| b.len.cmp(&a.len)),
        ImportOrder::Type => files.sort_by_key(|c| c.path.extension().map(|e| e.to_string_lossy().to_lowercase())),
    }
}

/// Creates one slide per readable media file in `dir`, in `order`.
///
/// Slides are named `Slide N`, numbering from `first_number + 1`. With
/// `filter`, only files of that kind are imported.
#[must_use = "importing a directory can fail; the Result must be handled"]
pub fn slides_from_directory(
    dir: &Path,
    registry: &ElementRegistry,
    first_number: usize,
    filter: Option<MediaKind>,
    order: ImportOrder,
    movie_size: Size,
) -> Result<Vec<Slide>, MediaError> {
    info!("Importing media from {} ({:?} order)", dir.display(), order);
    let mut files: Vec<Candidate> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Ok(metadata) = fs::metadata(&path) else { continue };
        if !metadata.is_file() {
            continue;
        }
        let wanted = match (classify(&path), filter) {
            (Some(kind), Some(wanted)) => kind == wanted,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if wanted && readable(&path) {
            files.push(Candidate { path, modified: metadata.modified().ok(), len: metadata.len() });
        }
    }
    sort_candidates(&mut files, order);

    let mut slides = Vec::with_capacity(files.len());
    for Candidate { path, .. } in files {
        let element = match element_for_file(&path, registry, movie_size) {
            Ok(element) => element,
            Err(e) => {
                debug!("Skipping '{}': {}", path.display(), e);
                continue;
            }
        };
        let mut slide = Slide::new(&format!("Slide {}", first_number + slides.len() + 1));
        slide.add_element(element);
        slides.push(slide);
    }
    info!("Imported {} slide(s) from {}", slides.len(), dir.display());
    Ok(slides)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbaImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify(Path::new("a/B.PNG")), Some(MediaKind::Image));
        assert_eq!(classify(Path::new("clip.webm")), Some(MediaKind::Movie));
        assert_eq!(classify(Path::new("song.Flac")), Some(MediaKind::Audio));
        assert_eq!(classify(Path::new("notes.txt")), None);
        assert_eq!(classify(Path::new("README")), None);
    }

    #[test]
    fn image_elements_get_their_pixel_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        write_png(&path, 12, 7);

        let element = element_for_file(&path, &ElementRegistry::with_builtin(), Size::new(320, 240)).unwrap();
        assert_eq!(element.element_type_id(), IMAGE_TYPE_ID);
        assert_eq!(element.name(), "photo");
        assert_eq!(element.properties().size("size"), Size::new(12, 7));
        assert_eq!(element.preview_url(), Some(path));
    }

    #[test]
    fn unknown_kinds_are_unsupported() {
        let registry = ElementRegistry::with_builtin();
        let result = element_for_file(Path::new("notes.txt"), &registry, Size::default());
        assert!(matches!(result, Err(MediaError::UnsupportedFormat(ref p)) if p == "notes.txt"));

        let empty = ElementRegistry::default();
        assert!(matches!(
            element_for_file(Path::new("clip.mp4"), &empty, Size::default()),
            Err(MediaError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn unreadable_image_keeps_default_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        let element = element_for_file(&path, &ElementRegistry::with_builtin(), Size::new(320, 240)).unwrap();
        assert!(!element.properties().contains("size"));
    }

    #[test]
    fn imports_one_slide_per_file_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("b.png"), 2, 2);
        std::fs::write(dir.path().join("a.ogg"), b"").unwrap();
        std::fs::write(dir.path().join("c.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let registry = ElementRegistry::with_builtin();
        let slides = slides_from_directory(dir.path(), &registry, 4, None, ImportOrder::Name, Size::new(640, 360)).unwrap();
        let names: Vec<String> = slides.iter().map(Slide::name).collect();
        assert_eq!(names, vec!["Slide 5", "Slide 6", "Slide 7"]);
        let kinds: Vec<u32> = slides.iter().map(|s| s.elements()[0].element_type_id()).collect();
        assert_eq!(kinds, vec![AUDIO_TYPE_ID, IMAGE_TYPE_ID, MOVIE_TYPE_ID]);
        assert_eq!(slides[2].elements()[0].properties().size("size"), Size::new(640, 360));

        let movies = slides_from_directory(dir.path(), &registry, 0, Some(MediaKind::Movie), ImportOrder::Name, Size::new(640, 360)).unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].name(), "Slide 1");
    }

    fn imported_names(dir: &Path, order: ImportOrder) -> Vec<String> {
        slides_from_directory(dir, &ElementRegistry::with_builtin(), 0, None, order, Size::default())
            .unwrap()
            .iter()
            .map(|slide| slide.elements()[0].name())
            .collect()
    }

    #[test]
    fn import_orders() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ogg"), vec![0u8; 10]).unwrap();
        std::fs::write(dir.path().join("b.mp4"), vec![0u8; 30]).unwrap();
        std::fs::write(dir.path().join("c.flac"), vec![0u8; 20]).unwrap();

        assert_eq!(imported_names(dir.path(), ImportOrder::Name), vec!["a", "b", "c"]);
        assert_eq!(imported_names(dir.path(), ImportOrder::NameReversed), vec!["c", "b", "a"]);
        assert_eq!(imported_names(dir.path(), ImportOrder::Size), vec!["b", "c", "a"]);
        assert_eq!(imported_names(dir.path(), ImportOrder::Type), vec!["c", "b", "a"]);
    }

    #[test]
    fn date_order_puts_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("z.ogg");
        std::fs::write(&old, b"").unwrap();
        std::fs::write(dir.path().join("a.ogg"), b"").unwrap();
        let file = std::fs::File::options().write(true).open(&old).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000)).unwrap();

        assert_eq!(imported_names(dir.path(), ImportOrder::Date), vec!["z", "a"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = slides_from_directory(&dir.path().join("nope"), &ElementRegistry::with_builtin(), 0, None, ImportOrder::default(), Size::default());
        assert!(matches!(result, Err(MediaError::Io(_))));
    }
}
