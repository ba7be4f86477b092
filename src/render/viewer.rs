use eframe::egui;

use crate::error::{PreviewError, Result};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

/// Window showing one rendered preview at its native pixel size.
pub struct PreviewViewer {
    size: [usize; 2],
    rgb: Vec<u8>,
    texture: Option<egui::TextureHandle>,
}

impl PreviewViewer {
    pub fn new(size: u32, rgb: Vec<u8>) -> Self {
        Self {
            size: [size as usize, size as usize],
            rgb,
            texture: None,
        }
    }
}

impl eframe::App for PreviewViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Upload once, on the first frame.
        let texture = self.texture.get_or_insert_with(|| {
            let image = egui::ColorImage::from_rgb(self.size, &self.rgb);
            ctx.load_texture("preview", image, egui::TextureOptions::LINEAR)
        });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                ui.image((texture.id(), texture.size_vec2()));
            });
    }
}

/// Open a window with the preview and block until the user closes it.
pub fn show(title: &str, size: u32, rgb: Vec<u8>) -> Result<()> {
    let side = size as f32;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([side, side])
            .with_resizable(false),
        ..Default::default()
    };

    log::debug!("opening preview window '{title}' ({size}x{size})");
    eframe::run_native(
        title,
        options,
        Box::new(move |_cc| Ok(Box::new(PreviewViewer::new(size, rgb)))),
    )
    .map_err(|e| PreviewError::Display(e.to_string()))
}
