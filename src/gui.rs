// src/gui.rs
use anyhow::Result;
use eframe::egui;
use egui::{Align, Color32, Layout, RichText, Stroke, Vec2};
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::ai::{AiConnector, GeminiModel};
use crate::config::Settings;
use crate::convert::{generate, ConversionOutcome, FailureKind};
use crate::input::candidate::media_type_for_path;
use crate::input::clipboard::{read_system_clipboard, write_system_clipboard_text};
use crate::input::{ImageCandidate, PreviewHandle, PreviewHost, SelectedImage};
use crate::session::{CopyFeedback, Session, Trigger, UiState};

const WINDOW_WIDTH: f32 = 720.0;
const WINDOW_HEIGHT: f32 = 680.0;
const PREVIEW_MAX_HEIGHT: f32 = 260.0;
const DROP_ZONE_HEIGHT: f32 = 180.0;
const POLL_INTERVAL: Duration = Duration::from_millis(100);
const ACCENT: Color32 = Color32::from_rgb(42, 90, 170);
const ERROR_RED: Color32 = Color32::from_rgb(220, 90, 90);
const IMAGE_EXTENSIONS: [&str; 9] = ["png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "heic"];

/// Previews backed by egui textures. Revoking drops the handle, which frees
/// the texture.
pub struct TexturePreview {
    ctx: egui::Context,
    next_id: u64,
    textures: HashMap<PreviewHandle, egui::TextureHandle>,
}

impl TexturePreview {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            next_id: 0,
            textures: HashMap::new(),
        }
    }

    pub fn texture(&self, handle: PreviewHandle) -> Option<&egui::TextureHandle> {
        self.textures.get(&handle)
    }
}

impl PreviewHost for TexturePreview {
    fn create_preview(&mut self, image: &SelectedImage) -> PreviewHandle {
        self.next_id += 1;
        let handle = PreviewHandle(self.next_id);
        match decode_preview(image) {
            Ok(color_image) => {
                let texture = self.ctx.load_texture(
                    format!("preview_{}", handle.0),
                    color_image,
                    egui::TextureOptions::LINEAR,
                );
                self.textures.insert(handle, texture);
            }
            // Gemini may still read formats we cannot draw (heic, svg, ...).
            Err(e) => warn!("No preview for '{}': {}", image.name(), e),
        }
        handle
    }

    fn revoke_preview(&mut self, handle: PreviewHandle) {
        self.textures.remove(&handle);
    }
}

fn decode_preview(image: &SelectedImage) -> Result<egui::ColorImage> {
    let bytes = image.read_bytes()?;
    let decoded = image::load_from_memory(&bytes)?;
    let size = [decoded.width() as usize, decoded.height() as usize];
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        decoded.to_rgba8().as_flat_samples().as_slice(),
    ))
}

pub struct EqSnapApp {
    session: Session<TexturePreview>,
    connector: Arc<dyn AiConnector>,
    model_name: String,
    pending: Option<Receiver<(u64, ConversionOutcome)>>,
    copy_feedback: CopyFeedback,
}

impl EqSnapApp {
    fn new(cc: &eframe::CreationContext<'_>, connector: Arc<dyn AiConnector>, model_name: String) -> Self {
        let ctx = cc.egui_ctx.clone();

        let mut style = (*ctx.style()).clone();
        style.visuals.selection.bg_fill = ACCENT;
        style.visuals.widgets.inactive.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.hovered.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.active.rounding = egui::Rounding::same(6.0);
        style.text_styles.insert(
            egui::TextStyle::Body,
            egui::FontId::new(15.0, egui::FontFamily::Proportional),
        );
        style.text_styles.insert(
            egui::TextStyle::Button,
            egui::FontId::new(15.0, egui::FontFamily::Proportional),
        );
        ctx.set_style(style);

        Self {
            session: Session::new(TexturePreview::new(ctx)),
            connector,
            model_name,
            pending: None,
            copy_feedback: CopyFeedback::default(),
        }
    }

    fn poll_pending(&mut self) {
        let Some(receiver) = &self.pending else {
            return;
        };
        match receiver.try_recv() {
            Ok((ticket, outcome)) => {
                self.session.finish_generation(ticket, outcome);
                self.pending = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                error!("Conversion worker exited without an outcome");
                self.pending = None;
                if let Some(ticket) = self.session.in_flight_ticket() {
                    self.session
                        .finish_generation(ticket, ConversionOutcome::failure(FailureKind::RemoteFailure));
                }
            }
        }
    }

    fn handle_window_input(&mut self, ctx: &egui::Context) {
        let (hovering, dropped, paste_requested) = ctx.input(|i| {
            let paste = i.events.iter().any(|event| match event {
                egui::Event::Paste(_) => true,
                egui::Event::Key { key: egui::Key::V, pressed: true, modifiers, .. } => modifiers.command,
                _ => false,
            });
            (!i.raw.hovered_files.is_empty(), i.raw.dropped_files.clone(), paste)
        });

        self.session.input_mut().set_dragging(hovering);

        if !dropped.is_empty() {
            self.session.handle_drop(first_dropped(dropped));
            self.copy_feedback.reset();
        }

        if paste_requested {
            let text_field_focused = ctx.wants_keyboard_input();
            let items = if text_field_focused { Vec::new() } else { read_system_clipboard() };
            if self.session.handle_paste(text_field_focused, &items) {
                self.copy_feedback.reset();
            }
        }
    }

    fn pick_file(&mut self) {
        let picked = rfd::FileDialog::new()
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .add_filter("All files", &["*"])
            .pick_file();
        if let Some(path) = picked {
            self.session.submit_candidate(ImageCandidate::from_path(path));
            self.copy_feedback.reset();
        }
    }

    fn start_generation(&mut self, ctx: &egui::Context) {
        match self.session.begin_generation() {
            Trigger::Started(job) => {
                let (sender, receiver) = mpsc::channel();
                let connector = Arc::clone(&self.connector);
                let repaint = ctx.clone();
                self.pending = Some(receiver);
                self.copy_feedback.reset();
                thread::spawn(move || {
                    let outcome = generate(Some(&job.image), connector.as_ref());
                    if sender.send((job.ticket, outcome)).is_err() {
                        warn!("Window closed before conversion #{} finished", job.ticket);
                    }
                    repaint.request_repaint();
                });
            }
            Trigger::Finished => info!("Nothing selected to convert"),
            Trigger::Busy => {}
        }
    }

    fn copy_latex(&mut self, latex: &str) {
        match write_system_clipboard_text(latex) {
            Ok(()) => {
                info!("LaTeX copied to clipboard");
                self.copy_feedback.mark_copied(Instant::now());
            }
            Err(e) => error!("Failed to copy LaTeX: {}", e),
        }
    }

    fn draw_drop_zone(&mut self, ui: &mut egui::Ui) {
        let dragging = self.session.input().is_dragging();
        let stroke = if dragging {
            Stroke::new(2.0, ACCENT)
        } else {
            Stroke::new(1.0, Color32::from_rgb(90, 90, 90))
        };
        let fill = if dragging { Color32::from_rgb(35, 45, 65) } else { Color32::from_rgb(30, 30, 30) };

        egui::Frame::none()
            .fill(fill)
            .stroke(stroke)
            .rounding(8.0)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.set_min_height(DROP_ZONE_HEIGHT);

                let texture = self
                    .session
                    .input()
                    .preview()
                    .and_then(|handle| self.session.input().host().texture(handle))
                    .cloned();
                let selected_name = self.session.input().selected().map(|s| s.name().to_string());

                ui.vertical_centered(|ui| match (texture, selected_name) {
                    (Some(texture), _) => {
                        let size = texture.size_vec2();
                        let scale = (ui.available_width() / size.x).min(PREVIEW_MAX_HEIGHT / size.y).min(1.0);
                        ui.image((texture.id(), Vec2::new(size.x * scale, size.y * scale)));
                    }
                    (None, Some(name)) => {
                        ui.add_space(60.0);
                        ui.label(RichText::new(format!("🖼 {}", name)).size(16.0));
                        ui.label(RichText::new("(no preview available)").weak());
                    }
                    (None, None) => {
                        ui.add_space(50.0);
                        let hint = if dragging { "Drop it!" } else { "Drag an equation image here" };
                        ui.label(RichText::new(hint).size(18.0));
                        ui.label(RichText::new("or paste it with Ctrl+V").weak());
                        ui.add_space(8.0);
                        if ui.button("📂 Choose file…").clicked() {
                            self.pick_file();
                        }
                    }
                });
            });
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            let in_flight = self.session.is_in_flight();
            let generate_label = if in_flight { "Generating…" } else { "✨ Generate LaTeX" };
            let generate_button = egui::Button::new(RichText::new(generate_label).color(Color32::WHITE))
                .fill(ACCENT)
                .rounding(6.0);
            if ui.add_enabled(self.session.can_generate(), generate_button).clicked() {
                self.start_generation(ctx);
            }
            if in_flight {
                ui.spinner();
            }

            let can_clear = self.session.input().has_image() && !in_flight;
            if ui.add_enabled(can_clear, egui::Button::new("🗑 Clear")).clicked() {
                self.session.clear();
                self.copy_feedback.reset();
            }
            if ui.add_enabled(!in_flight, egui::Button::new("📂 Choose file…")).clicked() {
                self.pick_file();
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                let status = match self.session.ui_state() {
                    UiState::Idle => "No image",
                    UiState::Ready => "Ready",
                    UiState::InFlight => "Waiting for Gemini",
                    UiState::Resolved => "Done",
                };
                ui.label(RichText::new(format!("{} · {}", status, self.model_name)).weak().small());
            });
        });
    }

    fn draw_outcome(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let Some(outcome) = self.session.outcome().cloned() else {
            return;
        };
        match outcome {
            ConversionOutcome::Failure { message, .. } => {
                egui::Frame::none()
                    .fill(Color32::from_rgb(60, 30, 30))
                    .rounding(6.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_min_width(ui.available_width());
                        ui.colored_label(ERROR_RED, message);
                    });
            }
            ConversionOutcome::Success(latex) => {
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("LaTeX").size(18.0));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let now = Instant::now();
                        let label = if self.copy_feedback.is_showing(now) { "✔ Copied!" } else { "📋 Copy" };
                        if ui.button(label).clicked() {
                            self.copy_latex(&latex);
                        }
                        if let Some(remaining) = self.copy_feedback.remaining(Instant::now()) {
                            ctx.request_repaint_after(remaining);
                        }
                    });
                });
                // Not focusable, so Ctrl+V still reaches the paste handler.
                let mut latex_view: &str = &latex;
                ui.add(
                    egui::TextEdit::multiline(&mut latex_view)
                        .interactive(false)
                        .code_editor()
                        .desired_rows(4)
                        .desired_width(f32::INFINITY),
                );
            }
        }
    }
}

impl eframe::App for EqSnapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_pending();
        self.handle_window_input(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(6.0);
            ui.heading(RichText::new("Equation → LaTeX").size(22.0));
            ui.label(RichText::new("Upload a picture of an equation and get LaTeX back.").weak());
            ui.separator();
            ui.add_space(6.0);

            self.draw_drop_zone(ui);
            ui.add_space(8.0);
            self.draw_controls(ui, ctx);
            ui.add_space(8.0);
            self.draw_outcome(ui, ctx);
        });

        if self.session.is_in_flight() {
            ctx.request_repaint_after(POLL_INTERVAL);
        }
    }
}

// Only the first dropped file counts; later ones are ignored.
fn first_dropped(files: Vec<egui::DroppedFile>) -> Vec<ImageCandidate> {
    files.into_iter().next().and_then(dropped_candidate).into_iter().collect()
}

fn dropped_candidate(file: egui::DroppedFile) -> Option<ImageCandidate> {
    if let Some(path) = file.path {
        return Some(ImageCandidate::from_path(path));
    }
    let bytes = file.bytes?;
    let media_type = media_type_for_path(Path::new(&file.name));
    Some(ImageCandidate::from_bytes(file.name, media_type, bytes))
}

pub fn run_gui(settings: Settings) -> Result<()> {
    info!("EqSnap GUI starting up...");

    let model = GeminiModel::new(&settings)?;
    let model_name = model.model_name().to_string();
    let connector: Arc<dyn AiConnector> = Arc::new(model);

    let native_options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(WINDOW_WIDTH, WINDOW_HEIGHT)),
        drag_and_drop_support: true,
        ..eframe::NativeOptions::default()
    };

    eframe::run_native(
        "EqSnap",
        native_options,
        Box::new(move |cc| Box::new(EqSnapApp::new(cc, connector, model_name))),
    )
    .map_err(|e| anyhow::anyhow!("Failed to start GUI: {}", e))?;

    Ok(())
}
