use eframe::egui::{Align2, Color32, FontId, Sense, Shape, Stroke, Widget};

/// Placeholder logo: a filled box with an outline and a centred label.
/// Fills whatever space it is given, so place it with `Ui::put`.
pub struct LogoBadge<'a> {
    label: &'a str,
    fill: Color32,
    stroke: Stroke,
    text_color: Color32,
    text_size: f32,
}

impl<'a> LogoBadge<'a> {
    pub const fn new(label: &'a str) -> Self {
        Self {
            label,
            fill: Color32::from_rgb(0x00, 0x66, 0xCC),
            stroke: Stroke {
                width: 3.0,
                color: Color32::WHITE,
            },
            text_color: Color32::WHITE,
            text_size: 48.0,
        }
    }
}

impl Widget for LogoBadge<'_> {
    fn ui(self, ui: &mut eframe::egui::Ui) -> eframe::egui::Response {
        let Self {
            label,
            fill,
            stroke,
            text_color,
            text_size,
        } = self;
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter();
        painter.rect_filled(rect, 0.0, fill);
        // keep the outline inside the box
        let inner = rect.shrink(stroke.width / 2.0);
        painter.add(Shape::closed_line(
            vec![
                inner.left_top(),
                inner.right_top(),
                inner.right_bottom(),
                inner.left_bottom(),
            ],
            stroke,
        ));
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            label,
            FontId::proportional(text_size),
            text_color,
        );
        response
    }
}
