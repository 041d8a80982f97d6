//! The egui side of the presentation surface.
//!
//! egui redraws everything each frame, so the scene keeps what the coordinator
//! last drew and paints it again on every frame.

use std::path::Path;

use eframe::egui::{
    self, pos2, text::LayoutJob, vec2, Align, Color32, ColorImage, FontId, Rect, TextureHandle,
    TextureOptions,
};
use image::imageops::FilterType;
use log::{info, warn};

use crate::{
    config::DisplayConfig,
    error::LogoError,
    surface::{LogoState, OverlayView, Rgb, Surface},
    widgets::LogoBadge,
};

impl From<Rgb> for Color32 {
    fn from(Rgb(r, g, b): Rgb) -> Self {
        Self::from_rgb(r, g, b)
    }
}

/// Decodes the logo file and scales it to exactly the logo box.
pub fn load_logo_image(path: &Path, width: i32, height: i32) -> Result<ColorImage, LogoError> {
    let empty = || LogoError::EmptyBox { width, height };
    let box_width = u32::try_from(width).ok().filter(|w| *w > 0).ok_or_else(empty)?;
    let box_height = u32::try_from(height).ok().filter(|h| *h > 0).ok_or_else(empty)?;
    let img = image::open(path)
        .map_err(|source| LogoError::Load {
            path: path.to_path_buf(),
            source,
        })?
        .resize_exact(box_width, box_height, FilterType::Lanczos3)
        .to_rgba8();
    let size = [img.width() as usize, img.height() as usize];
    Ok(ColorImage::from_rgba_unmultiplied(size, img.as_raw()))
}

/// What the logo box shows: the uploaded image, or the label on a placeholder.
#[derive(Clone)]
pub struct LogoArt {
    label: String,
    texture: Option<TextureHandle>,
}

impl std::fmt::Debug for LogoArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoArt")
            .field("label", &self.label)
            .field("image", &self.has_image())
            .finish()
    }
}

impl LogoArt {
    /// Uploads the configured logo, falling back to the placeholder with a warning.
    #[must_use]
    pub fn load(ctx: &egui::Context, display: &DisplayConfig) -> Self {
        let texture = match load_logo_image(
            &display.logo_path,
            display.logo_width,
            display.logo_height,
        ) {
            Ok(image) => {
                info!("logo loaded from {}", display.logo_path.display());
                Some(ctx.load_texture("logo", image, TextureOptions::LINEAR))
            }
            Err(err) => {
                warn!("{err}, drawing the placeholder logo");
                None
            }
        };
        Self {
            label: display.logo_label.clone(),
            texture,
        }
    }

    #[must_use]
    pub const fn has_image(&self) -> bool {
        self.texture.is_some()
    }

    fn paint(&self, ui: &mut egui::Ui, rect: Rect) {
        if let Some(texture) = &self.texture {
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        } else {
            ui.put(rect, LogoBadge::new(&self.label));
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Scene {
    logo: Option<LogoState>,
    overlay: Option<OverlayView>,
}

impl Surface for Scene {
    fn draw_logo(&mut self, logo: &LogoState) {
        self.logo = Some(*logo);
    }

    fn hide_logo(&mut self) {
        self.logo = None;
    }

    fn draw_overlay(&mut self, overlay: &OverlayView) {
        self.overlay = Some(overlay.clone());
    }

    fn clear_overlay(&mut self) {
        self.overlay = None;
    }
}

impl Scene {
    #[must_use]
    pub const fn logo(&self) -> Option<&LogoState> {
        self.logo.as_ref()
    }

    #[must_use]
    pub const fn overlay(&self) -> Option<&OverlayView> {
        self.overlay.as_ref()
    }

    /// Paints into the whole of `ui`, whose top left is the surface origin.
    #[allow(clippy::cast_precision_loss)]
    pub fn paint(&self, ui: &mut egui::Ui, art: &LogoArt) {
        let area = ui.max_rect();
        if let Some(logo) = &self.logo {
            let rect = Rect::from_min_size(
                area.min + vec2(logo.x as f32, logo.y as f32),
                vec2(logo.width as f32, logo.height as f32),
            );
            art.paint(ui, rect);
        }
        if let Some(overlay) = &self.overlay {
            let painter = ui.painter();
            let galley = painter.layout_job(overlay_job(overlay));
            // centred rows extend both sides of the galley origin
            let origin = area.center() - galley.rect.center().to_vec2();
            painter.galley(origin, galley, Color32::WHITE);
        }
    }
}

/// Overlay text wrapped at the overlay width with every row centred.
fn overlay_job(overlay: &OverlayView) -> LayoutJob {
    let mut job = LayoutJob::simple(
        overlay.text.clone(),
        FontId::proportional(overlay.font_size),
        overlay.color.into(),
        overlay.wrap_width,
    );
    job.halign = Align::Center;
    job
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{Rgba, RgbaImage};

    use super::*;

    fn display(logo_path: PathBuf) -> DisplayConfig {
        DisplayConfig {
            logo_path,
            ..DisplayConfig::default()
        }
    }

    fn write_png(path: &Path) {
        RgbaImage::from_pixel(8, 4, Rgba([0, 102, 204, 255]))
            .save(path)
            .unwrap();
    }

    #[test]
    fn logo_is_scaled_to_the_box() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ifpb.png");
        write_png(&path);
        let image = load_logo_image(&path, 200, 150).unwrap();
        assert_eq!(image.size, [200, 150]);
        assert!(image.pixels.iter().all(|pixel| pixel.a() == 255));
    }

    #[test]
    fn unusable_logo_files_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            load_logo_image(&missing, 200, 200),
            Err(LogoError::Load { .. })
        ));

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        assert!(matches!(
            load_logo_image(&garbage, 200, 200),
            Err(LogoError::Load { .. })
        ));

        let valid = dir.path().join("ifpb.png");
        write_png(&valid);
        assert!(matches!(
            load_logo_image(&valid, 0, 200),
            Err(LogoError::EmptyBox { .. })
        ));
    }

    #[test]
    fn falls_back_to_the_placeholder() {
        let ctx = egui::Context::default();
        let dir = tempfile::tempdir().unwrap();

        let art = LogoArt::load(&ctx, &display(dir.path().join("missing.png")));
        assert!(!art.has_image());
        assert_eq!(art.label, "IFPB");

        let garbage = dir.path().join("garbage.png");
        std::fs::write(&garbage, b"not an image").unwrap();
        assert!(!LogoArt::load(&ctx, &display(garbage)).has_image());

        let valid = dir.path().join("ifpb.png");
        write_png(&valid);
        assert!(LogoArt::load(&ctx, &display(valid)).has_image());
    }

    #[test]
    fn keeps_last_drawn_state() {
        let mut scene = Scene::default();
        let logo = LogoState::new(200, 200, 2);
        scene.draw_logo(&logo);
        assert_eq!(scene.logo(), Some(&logo));

        let overlay = OverlayView {
            text: "MUDANÇA DE AULA!".to_string(),
            color: Rgb::RED,
            font_size: 72.0,
            wrap_width: 1820.0,
        };
        scene.hide_logo();
        scene.draw_overlay(&overlay);
        assert_eq!(scene.logo(), None);
        assert_eq!(scene.overlay(), Some(&overlay));

        scene.clear_overlay();
        assert_eq!(scene.overlay(), None);
    }

    #[test]
    fn overlay_rows_are_centred_and_wrapped() {
        let overlay = OverlayView {
            text: "Prova de cálculo amanhã às 08:00 no laboratório".to_string(),
            color: Rgb::YELLOW,
            font_size: 48.0,
            wrap_width: 1820.0,
        };
        let job = overlay_job(&overlay);
        assert_eq!(job.halign, Align::Center);
        assert_eq!(job.wrap.max_width, 1820.0);
        assert_eq!(job.text, overlay.text);
        assert_eq!(job.sections[0].format.color, Color32::from_rgb(255, 255, 0));
        assert_eq!(job.sections[0].format.font_id, FontId::proportional(48.0));
    }

    #[test]
    fn converts_colours() {
        assert_eq!(Color32::from(Rgb::YELLOW), Color32::from_rgb(255, 255, 0));
        assert_eq!(Color32::from(Rgb::RED), Color32::RED);
    }
}
