use eframe::egui::{self, Pos2, Sense, Stroke, Vec2};
use teleop_core::InputEvent;

use crate::style;

/// On-screen joystick: drag the knob, it springs back to center on release.
#[derive(Debug)]
pub(crate) struct Joystick {
    size: f32,
    // knob offset from the center, normalized to the unit disc
    offset: Vec2,
    active: bool,
}

/// Limits `offset` to the disc of `radius` and normalizes it.
pub(crate) fn normalize(offset: Vec2, radius: f32) -> Vec2 {
    if radius <= 0.0 {
        return Vec2::ZERO;
    }
    let v = offset / radius;
    let len = v.length();
    if len > 1.0 {
        v / len
    } else {
        v
    }
}

impl Joystick {
    pub(crate) fn new(size: f32) -> Self {
        Self {
            size,
            offset: Vec2::ZERO,
            active: false,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    fn knob_radius(&self) -> f32 {
        self.size * 0.18
    }

    fn travel(&self) -> f32 {
        self.size / 2.0 - self.knob_radius()
    }

    /// Updates the knob from the pointer position while pressed.
    pub(crate) fn drag_to(&mut self, center: Pos2, pointer: Pos2) -> InputEvent {
        self.active = true;
        self.offset = normalize(pointer - center, self.travel());
        InputEvent::JoystickMoved {
            x: self.offset.x as f64,
            y: self.offset.y as f64,
        }
    }

    pub(crate) fn release(&mut self) -> Option<InputEvent> {
        self.offset = Vec2::ZERO;
        if std::mem::take(&mut self.active) {
            Some(InputEvent::JoystickReleased)
        } else {
            None
        }
    }

    /// Draws the joystick and returns the event produced this frame, if any.
    pub(crate) fn show(&mut self, ui: &mut egui::Ui, enabled: bool) -> Option<InputEvent> {
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(self.size), Sense::drag());
        let center = rect.center();

        let event = if enabled && response.is_pointer_button_down_on() {
            response
                .interact_pointer_pos()
                .map(|pointer| self.drag_to(center, pointer))
        } else {
            self.release()
        };

        let visuals = ui.visuals();
        let painter = ui.painter_at(rect);
        painter.circle_filled(center, self.size / 2.0, visuals.extreme_bg_color);
        painter.circle_stroke(
            center,
            self.size / 2.0 - 1.0,
            Stroke::new(2.0, visuals.widgets.inactive.bg_stroke.color),
        );
        // cross hair
        let stroke = Stroke::new(1.0, visuals.weak_text_color());
        painter.line_segment(
            [center - Vec2::X * self.travel(), center + Vec2::X * self.travel()],
            stroke,
        );
        painter.line_segment(
            [center - Vec2::Y * self.travel(), center + Vec2::Y * self.travel()],
            stroke,
        );

        let knob_color = if !enabled {
            visuals.widgets.noninteractive.bg_fill
        } else if self.active {
            style::ACCENT
        } else if response.hovered() {
            style::HOVERED
        } else {
            style::ACTIVE
        };
        painter.circle_filled(
            center + self.offset * self.travel(),
            self.knob_radius(),
            knob_color,
        );

        event
    }
}
