use eframe::egui::{self, Color32, RichText, Stroke};

pub(crate) const ACCENT: Color32 = Color32::from_rgb(0x6F, 0xFF, 0xE9);

pub(crate) const ACTIVE: Color32 = Color32::from_rgb(0x72, 0x89, 0xDA);

pub(crate) const HOVERED: Color32 = Color32::from_rgb(0x67, 0x7B, 0xC4);

pub(crate) const ESTOP: Color32 = Color32::from_rgb(0xD3, 0x2F, 0x2F);

pub(crate) const ESTOP_ENGAGED: Color32 = Color32::from_rgb(0x7F, 0x1D, 0x1D);

pub(crate) const ERROR: Color32 = Color32::from_rgb(0xFF, 0x6B, 0x6B);

pub(crate) const OK: Color32 = Color32::from_rgb(0x4C, 0xAF, 0x50);

pub(crate) const DIRECTION_BUTTON_SIZE: f32 = 56.0;

/// Round button of the direction pad. `selected` draws an accent border.
pub(crate) fn round_button(label: &str, selected: bool) -> egui::Button<'_> {
    let button = egui::Button::new(RichText::new(label).size(20.0).color(Color32::WHITE))
        .fill(ACTIVE)
        .rounding(DIRECTION_BUTTON_SIZE / 2.0)
        .min_size(egui::vec2(DIRECTION_BUTTON_SIZE, DIRECTION_BUTTON_SIZE));
    if selected {
        button.stroke(Stroke::new(2.0, ACCENT))
    } else {
        button
    }
}

pub(crate) fn emergency_stop_button(engaged: bool) -> egui::Button<'static> {
    let (text, fill) = if engaged {
        ("RELEASE E-STOP", ESTOP_ENGAGED)
    } else {
        ("E-STOP", ESTOP)
    };
    egui::Button::new(RichText::new(text).strong().size(22.0).color(Color32::WHITE))
        .fill(fill)
        .stroke(Stroke::new(2.0, Color32::WHITE))
        .min_size(egui::vec2(240.0, 56.0))
}
