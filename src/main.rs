use eframe::{egui, NativeOptions};
use egui::{pos2, vec2, Align2, CentralPanel, Color32, ColorImage, FontId, Painter, Pos2, Rect, ScrollArea, Shape, Stroke, TextureHandle, TextureOptions};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use slideview::config::{self, AppConfig};
use slideview::errors::{AppError, MediaError};
use slideview::import::{self, ImportOrder};
use slideview::keymap::{self, ViewAction};
use slideview::media::SilentBackend;
use slideview::playback::{PlaybackController, PlaybackSettings};
use slideview::properties::{Color, Point, Size};
use slideview::registry::ElementRegistry;
use slideview::slideshow::Slideshow;
use slideview::surface::{BrushStyle, DisplayItem, PenStyle, Scene};

const DEFAULT_CONFIG_PATH: &str = "slideview.conf";
const HATCH_SPACING: f32 = 8.0;
// Coverage of the dense brush patterns, densest first.
const DENSE_COVERAGE: [f32; 7] = [0.94, 0.88, 0.63, 0.5, 0.37, 0.12, 0.06];

type Controller = PlaybackController<Scene, SilentBackend>;

#[derive(Debug, Clone, PartialEq)]
enum ViewState {
    Showing,
    Empty(String),
    Error(String),
}

struct SlideviewApp {
    state: ViewState,
    controller: Option<Controller>,
    textures: HashMap<PathBuf, Option<TextureHandle>>,
    goto_open: bool,
    goto_names: Vec<String>,
}

impl SlideviewApp {
    fn new(_cc: &eframe::CreationContext<'_>, config_path: &str) -> Self {
        info!("Initializing SlideviewApp with configuration {}", config_path);
        match open_show(config_path) {
            Ok((show, app_config)) if show.is_empty() => {
                let msg = format!("Slideshow {} has no slides.", app_config.slideshow_path.display());
                warn!("{}", msg);
                Self::with_state(ViewState::Empty(msg), None)
            }
            Ok((show, app_config)) => {
                info!("Loaded {} slide(s); starting at index {}", show.len(), app_config.start_index);
                let mut controller = PlaybackController::new(show, SilentBackend, Scene::new, PlaybackSettings::from(&app_config));
                controller.on_closed(|index| info!("Slideshow closed at slide index {}", index));
                controller.start(app_config.start_index);
                Self::with_state(ViewState::Showing, Some(controller))
            }
            Err(e) => {
                let msg = format!("Failed to open slideshow: {}", e);
                error!("{}", msg);
                Self::with_state(ViewState::Error(msg), None)
            }
        }
    }

    fn with_state(state: ViewState, controller: Option<Controller>) -> Self {
        Self { state, controller, textures: HashMap::new(), goto_open: false, goto_names: Vec::new() }
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let pressed: Vec<(egui::Key, egui::Modifiers)> = ctx.input(|i| {
            i.events.iter().filter_map(|event| match event {
                egui::Event::Key { key, pressed: true, modifiers, .. } => Some((*key, *modifiers)),
                _ => None,
            }).collect()
        });
        for (key, modifiers) in pressed {
            if self.goto_open {
                if key == egui::Key::Escape {
                    self.cancel_goto();
                }
                continue;
            }
            if let Some(action) = keymap::action_for_key(key, modifiers) {
                self.apply(action, ctx);
            }
        }
    }

    fn apply(&mut self, action: ViewAction, ctx: &egui::Context) {
        debug!("View action {:?}", action);
        if action == ViewAction::Close {
            self.close(ctx);
            return;
        }
        let Some(controller) = self.controller.as_mut() else { return };
        match action {
            ViewAction::Next => { controller.next(); }
            ViewAction::Prev => { controller.prev(); }
            ViewAction::First => { controller.first(); }
            ViewAction::Last => { controller.last(); }
            ViewAction::GoTo => {
                self.goto_names = controller.begin_goto();
                self.goto_open = true;
            }
            ViewAction::TogglePlayPause => controller.toggle_play_pause(),
            ViewAction::Stop => controller.stop(),
            ViewAction::ToggleMute => controller.toggle_mute(),
            ViewAction::Restart => controller.restart(),
            ViewAction::ToggleBlack => controller.toggle_black(),
            ViewAction::Close => {}
        }
    }

    fn close(&mut self, ctx: &egui::Context) {
        if let Some(controller) = self.controller.as_mut() {
            controller.close();
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn cancel_goto(&mut self) {
        self.goto_open = false;
        if let Some(controller) = self.controller.as_mut() {
            controller.cancel_goto();
        }
    }

    fn show_goto_window(&mut self, ctx: &egui::Context) {
        let Some(controller) = self.controller.as_mut() else { return };
        let current = controller.current_index();
        let names = &self.goto_names;
        let mut chosen = None;
        let mut open = true;
        egui::Window::new("Go to slide").open(&mut open).collapsible(false).show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                for (index, name) in names.iter().enumerate() {
                    if ui.selectable_label(index == current, name.as_str()).clicked() {
                        chosen = Some(name.clone());
                    }
                }
            });
        });
        if let Some(name) = chosen {
            if !controller.goto_by_name(&name) {
                debug!("Go to '{}' did not change the slide", name);
            }
            self.goto_open = false;
        } else if !open {
            self.cancel_goto();
        }
    }

    fn texture(&mut self, ctx: &egui::Context, path: &Path) -> Option<TextureHandle> {
        if let Some(cached) = self.textures.get(path) {
            return cached.clone();
        }
        let texture = match load_color_image(path) {
            Ok(image) => Some(ctx.load_texture(path.to_string_lossy(), image, TextureOptions::LINEAR)),
            Err(e) => {
                error!("Failed to load image {}: {}", path.display(), e);
                None
            }
        };
        self.textures.insert(path.to_path_buf(), texture.clone());
        texture
    }

    fn paint_scene(&mut self, ctx: &egui::Context, ui: &egui::Ui) {
        let Some(controller) = self.controller.as_ref() else { return };
        let available = ui.available_rect_before_wrap();
        let painter = ui.painter_at(available);
        painter.rect_filled(available, 0.0, Color32::BLACK);
        if controller.is_blanked() {
            return;
        }
        let Some(scene) = controller.current_surface() else { return };
        let canvas = scene.size();
        let canvas_rect = calculate_draw_rect(canvas.width.max(1) as f32, canvas.height.max(1) as f32, available);
        let scale = canvas_rect.width() / canvas.width.max(1) as f32;
        let items: Vec<DisplayItem> = scene.items().cloned().collect();
        let painter = painter.with_clip_rect(canvas_rect);

        for item in &items {
            match item {
                DisplayItem::Background(color) => {
                    painter.rect_filled(canvas_rect, 0.0, to_color32(*color));
                }
                DisplayItem::Rect { position, size, fill, brush, border, pen, border_width } => {
                    let rect = item_rect(canvas_rect, scale, *position, *size);
                    paint_brush(&painter, rect, *brush, to_color32(*fill));
                    let stroke = Stroke::new((*border_width).max(0) as f32 * scale, to_color32(*border));
                    paint_pen(&painter, rect, *pen, stroke);
                }
                DisplayItem::Image { position, size, src, keep_ratio } => {
                    let rect = item_rect(canvas_rect, scale, *position, *size);
                    match self.texture(ctx, src) {
                        Some(texture) => {
                            let [w, h] = texture.size();
                            let target = if *keep_ratio { calculate_draw_rect(w as f32, h as f32, rect) } else { rect };
                            painter.image(texture.id(), target, Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)), Color32::WHITE);
                        }
                        None => paint_placeholder(&painter, rect, &format!("Missing image: {}", src.display())),
                    }
                }
                DisplayItem::Video { position, size, src, live } => {
                    let rect = item_rect(canvas_rect, scale, *position, *size);
                    let name = src.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                    let label = if *live { format!("\u{25B6} {}", name) } else { name };
                    paint_placeholder(&painter, rect, &label);
                }
            }
        }
    }
}

impl eframe::App for SlideviewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_input(ctx);

        if let Some(controller) = self.controller.as_mut() {
            let now = Instant::now();
            controller.tick(now);
            if let Some(deadline) = controller.next_deadline() {
                ctx.request_repaint_after(deadline.saturating_duration_since(now).max(Duration::from_millis(10)));
            }
        }

        if self.goto_open {
            self.show_goto_window(ctx);
        }

        CentralPanel::default().frame(egui::Frame::none()).show(ctx, |ui| {
            match self.state.clone() {
                ViewState::Showing => self.paint_scene(ctx, ui),
                ViewState::Empty(msg) => { ui.centered_and_justified(|ui| ui.label(msg)); }
                ViewState::Error(msg) => { ui.centered_and_justified(|ui| { ui.colored_label(Color32::RED, format!("Error: {}", msg)); }); }
            }
        });
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("SlideviewApp on_exit called. Releasing loaded slides.");
        if let Some(controller) = self.controller.as_mut() {
            controller.close();
        }
    }
}

/// Loads the configuration and the show it points at. A directory path is
/// imported as one slide per media file.
fn open_show(config_path: &str) -> Result<(Slideshow, AppConfig), AppError> {
    let app_config = config::load_config(config_path)?;
    let registry = ElementRegistry::with_builtin();
    let show = if app_config.slideshow_path.is_dir() {
        let mut show = Slideshow::new();
        let movie_size = show.canvas_size();
        for slide in import::slides_from_directory(&app_config.slideshow_path, &registry, 0, None, ImportOrder::Name, movie_size)? {
            show.add_slide(slide);
        }
        show
    } else {
        Slideshow::load(&app_config.slideshow_path, &registry)?
    };
    Ok((show, app_config))
}

fn load_color_image(path: &Path) -> Result<ColorImage, MediaError> {
    let rgba = image::open(path)?.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()))
}

fn to_color32(color: Color) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

fn item_rect(canvas_rect: Rect, scale: f32, position: Point, size: Size) -> Rect {
    let min = canvas_rect.min + vec2(position.x as f32 * scale, position.y as f32 * scale);
    Rect::from_min_size(min, vec2(size.width.max(0) as f32 * scale, size.height.max(0) as f32 * scale))
}

fn paint_brush(painter: &Painter, rect: Rect, brush: BrushStyle, color: Color32) {
    let stroke = Stroke::new(1.0, color);
    let hatch = painter.with_clip_rect(rect.intersect(painter.clip_rect()));
    match brush {
        BrushStyle::NoBrush => {}
        BrushStyle::Solid => {
            painter.rect_filled(rect, 0.0, color);
        }
        BrushStyle::Dense(level) => {
            let coverage = DENSE_COVERAGE[(level.clamp(1, 7) - 1) as usize];
            painter.rect_filled(rect, 0.0, color.gamma_multiply(coverage));
        }
        BrushStyle::Horizontal => horizontal_hatch(&hatch, rect, stroke),
        BrushStyle::Vertical => vertical_hatch(&hatch, rect, stroke),
        BrushStyle::Cross => {
            horizontal_hatch(&hatch, rect, stroke);
            vertical_hatch(&hatch, rect, stroke);
        }
        BrushStyle::BackwardDiagonal => diagonal_hatch(&hatch, rect, stroke, false),
        BrushStyle::ForwardDiagonal => diagonal_hatch(&hatch, rect, stroke, true),
        BrushStyle::DiagonalCross => {
            diagonal_hatch(&hatch, rect, stroke, false);
            diagonal_hatch(&hatch, rect, stroke, true);
        }
    }
}

fn horizontal_hatch(painter: &Painter, rect: Rect, stroke: Stroke) {
    let mut y = rect.top();
    while y <= rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += HATCH_SPACING;
    }
}

fn vertical_hatch(painter: &Painter, rect: Rect, stroke: Stroke) {
    let mut x = rect.left();
    while x <= rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += HATCH_SPACING;
    }
}

// Lines longer than the rect; the painter's clip rect trims them.
fn diagonal_hatch(painter: &Painter, rect: Rect, stroke: Stroke, forward: bool) {
    let span = rect.width() + rect.height();
    let mut offset = 0.0;
    while offset <= span {
        let (start, end) = if forward {
            (pos2(rect.left() + offset, rect.top()), pos2(rect.left() + offset - span, rect.top() + span))
        } else {
            (pos2(rect.right() - offset, rect.top()), pos2(rect.right() - offset + span, rect.top() + span))
        };
        painter.line_segment([start, end], stroke);
        offset += HATCH_SPACING;
    }
}

fn paint_pen(painter: &Painter, rect: Rect, pen: PenStyle, stroke: Stroke) {
    if stroke.width <= 0.0 {
        return;
    }
    let outline: [Pos2; 5] = [rect.left_top(), rect.right_top(), rect.right_bottom(), rect.left_bottom(), rect.left_top()];
    let dash = 3.0 * stroke.width.max(1.0);
    match pen {
        PenStyle::NoPen => {}
        PenStyle::Solid => {
            painter.rect_stroke(rect, 0.0, stroke);
        }
        PenStyle::Dash => painter.extend(Shape::dashed_line(&outline, stroke, dash, dash)),
        PenStyle::Dot => painter.extend(Shape::dotted_line(&outline, stroke.color, 2.0 * stroke.width, stroke.width / 2.0)),
        PenStyle::DashDot => painter.extend(Shape::dashed_line(&outline, stroke, dash, dash / 2.0)),
        PenStyle::DashDotDot => painter.extend(Shape::dashed_line(&outline, stroke, dash, dash / 3.0)),
    }
}

fn paint_placeholder(painter: &Painter, rect: Rect, label: &str) {
    painter.rect_filled(rect, 0.0, Color32::from_gray(24));
    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::DARK_GRAY));
    painter.text(rect.center(), Align2::CENTER_CENTER, label, FontId::proportional(14.0), Color32::LIGHT_GRAY);
}

fn calculate_draw_rect(media_width: f32, media_height: f32, available_rect: Rect) -> Rect {
    let aspect_ratio = media_width / media_height;
    let mut draw_width = available_rect.width();
    let mut draw_height = available_rect.width() / aspect_ratio;
    if draw_height > available_rect.height() {
        draw_height = available_rect.height();
        draw_width = available_rect.height() * aspect_ratio;
    }
    Rect::from_center_size(available_rect.center(), vec2(draw_width, draw_height))
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    info!("Starting slideview...");
    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };
    eframe::run_native("Slideview", options, Box::new(move |cc| Box::new(SlideviewApp::new(cc, &config_path))))
}
