use std::thread;
use std::time::{Duration, Instant, SystemTime};

use egui::{ColorImage, TextureHandle, TextureOptions};
use image::RgbImage;

use crate::mode::Mode;
use crate::pipeline::DisplaySink;
use crate::utils::*;

pub struct VidfxApp {
    shared_state: SharedState,
    texture: Option<TextureHandle>,
    shown_frame: u64,
}

impl VidfxApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, shared_state: SharedState) -> Self {
        Self {
            shared_state,
            texture: None,
            shown_frame: 0,
        }
    }

    fn push_key(&self, key: char) {
        lock(&self.shared_state).pending_keys.push_back(key);
    }
}

impl eframe::App for VidfxApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        // typed characters are forwarded to the processing loop as input symbols
        let typed: Vec<char> = ctx.input(|i| {
            i.events
                .iter()
                .filter_map(|event| match event {
                    egui::Event::Text(text) => Some(text.chars()),
                    _ => None,
                })
                .flatten()
                .collect()
        });

        let (mode, fps, resolution, finished, new_image) = {
            let mut state = lock(&self.shared_state);
            state.pending_keys.extend(typed);
            let new_image = if state.frame_id != self.shown_frame {
                self.shown_frame = state.frame_id;
                state.image.clone()
            } else {
                None
            };
            (state.mode, state.fps, state.resolution, state.finished, new_image)
        };

        if let Some(image) = new_image {
            let size = [image.width() as usize, image.height() as usize];
            let ui_image = ColorImage::from_rgb(size, image.as_raw());
            match self.texture.as_mut() {
                Some(texture) => texture.set(ui_image, TextureOptions::default()),
                None => {
                    let texture = ctx.load_texture("frame", ui_image, TextureOptions::default());
                    self.texture = Some(texture);
                }
            }
        }

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Save screenshot").clicked() {
                        self.push_key('s');
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        self.push_key('q');
                        frame.close();
                    }
                });
            });
        });

        egui::SidePanel::left("side_panel").show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Effects");
                for entry in Mode::all() {
                    let text = format!("[{}] {}", entry.key(), entry.label());
                    if ui.selectable_label(entry == mode, text).clicked() {
                        self.push_key(entry.key());
                    }
                }

                ui.separator();
                let resolution = resolution.unwrap_or((0, 0));
                ui.add(egui::Label::new(format!("FPS: {:.1}", fps.unwrap_or(0.0))));
                ui.add(egui::Label::new(format!(
                    "Resolution: {}x{}",
                    resolution.0, resolution.1
                )));
                ui.add(egui::Label::new("Keys: q quit, s save"));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(texture) = self.texture.as_ref() else {
                ui.label("Waiting for frames...");
                return;
            };

            // scale to panel width, keeping aspect ratio
            let [width, height] = texture.size();
            let ui_img_width = ui.available_width();
            let ui_img_height = ui_img_width / (width as f32 / height.max(1) as f32);
            ui.image(texture, egui::Vec2::new(ui_img_width, ui_img_height));
        });

        if finished {
            frame.close();
        }

        ctx.request_repaint_after(Duration::from_millis(15));
    }

    fn on_close_event(&mut self) -> bool {
        lock(&self.shared_state).window_closed = true;
        true
    }
}

/// Display sink backed by the viewer window. Frames are handed over through
/// the shared state and keys are polled back for up to `poll_timeout`.
pub struct EguiDisplay {
    shared_state: SharedState,
    poll_timeout: Duration,
}

impl EguiDisplay {
    pub fn new(shared_state: SharedState) -> Self {
        Self {
            shared_state,
            poll_timeout: Duration::from_millis(10),
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    fn take_key(&self) -> Option<char> {
        let mut state = lock(&self.shared_state);
        if state.window_closed {
            return Some('q');
        }
        state.pending_keys.pop_front()
    }
}

impl DisplaySink for EguiDisplay {
    fn show(&mut self, frame: &RgbImage, mode: Mode) -> Option<char> {
        {
            let mut state = lock(&self.shared_state);
            state.record_frame_time(SystemTime::now());
            state.resolution = Some(frame.dimensions());
            state.image = Some(frame.clone());
            state.frame_id += 1;
            state.mode = mode;
        }

        let deadline = Instant::now() + self.poll_timeout;
        loop {
            if let Some(key) = self.take_key() {
                return Some(key);
            }
            if Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}
