use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Shape, Stroke, Vec2};

use crate::doppler::{PerceivedSignal, SimulationParameters, Wavefront};

pub const WORLD_X: (f32, f32) = (-50.0, 150.0);
pub const WORLD_Y: (f32, f32) = (-100.0, 100.0);
const GRID_SPACING: f32 = 25.0;
const MARKER_RADIUS: f32 = 7.0;

const WAVE_COLOR: Color32 = Color32::from_rgb(128, 0, 128);
const SOURCE_COLOR: Color32 = Color32::RED;
const OBSERVER_COLOR: Color32 = Color32::from_rgb(0, 160, 0);
const GRID_COLOR: Color32 = Color32::from_gray(215);

/// Maps world metres onto a screen rectangle with equal aspect ratio,
/// centred and letterboxed.
#[derive(Clone, Copy, Debug)]
pub struct ViewTransform {
    origin: Pos2,
    scale: f32,
}

impl ViewTransform {
    pub fn fit(screen: Rect) -> Self {
        let world_w = WORLD_X.1 - WORLD_X.0;
        let world_h = WORLD_Y.1 - WORLD_Y.0;
        let scale = (screen.width() / world_w).min(screen.height() / world_h);
        let used = Vec2::new(world_w * scale, world_h * scale);
        let top_left = screen.center() - used / 2.0;
        // Screen y grows downward, world y grows upward.
        let origin = Pos2::new(top_left.x - WORLD_X.0 * scale, top_left.y + WORLD_Y.1 * scale);
        Self { origin, scale }
    }

    pub fn to_screen(&self, x: f32, y: f32) -> Pos2 {
        Pos2::new(self.origin.x + x * self.scale, self.origin.y - y * self.scale)
    }

    pub fn length(&self, metres: f32) -> f32 {
        metres * self.scale
    }

    pub fn world_rect(&self) -> Rect {
        Rect::from_two_pos(
            self.to_screen(WORLD_X.0, WORLD_Y.0),
            self.to_screen(WORLD_X.1, WORLD_Y.1),
        )
    }
}

/// Whether any part of a circle outline falls inside the world view.
pub fn circle_visible(cx: f32, cy: f32, r: f32) -> bool {
    let nearest_x = cx.clamp(WORLD_X.0, WORLD_X.1);
    let nearest_y = cy.clamp(WORLD_Y.0, WORLD_Y.1);
    let nearest = ((nearest_x - cx).powi(2) + (nearest_y - cy).powi(2)).sqrt();

    let far_x = (WORLD_X.0 - cx).abs().max((WORLD_X.1 - cx).abs());
    let far_y = (WORLD_Y.0 - cy).abs().max((WORLD_Y.1 - cy).abs());
    let farthest = (far_x * far_x + far_y * far_y).sqrt();

    nearest <= r && r <= farthest
}

pub fn draw_wavefronts(
    ui: &mut egui::Ui,
    size: Vec2,
    params: &SimulationParameters,
    waves: &[Wavefront],
    now: f64,
) {
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter_at(rect);
    let view = ViewTransform::fit(rect);
    let bounds = view.world_rect();

    painter.rect_filled(bounds, 0.0, Color32::WHITE);

    let mut x = WORLD_X.0;
    while x <= WORLD_X.1 {
        painter.line_segment(
            [view.to_screen(x, WORLD_Y.0), view.to_screen(x, WORLD_Y.1)],
            Stroke::new(1.0, GRID_COLOR),
        );
        x += GRID_SPACING;
    }
    let mut y = WORLD_Y.0;
    while y <= WORLD_Y.1 {
        painter.line_segment(
            [view.to_screen(WORLD_X.0, y), view.to_screen(WORLD_X.1, y)],
            Stroke::new(1.0, GRID_COLOR),
        );
        y += GRID_SPACING;
    }

    let wave_painter = painter.with_clip_rect(bounds);
    for wave in waves {
        let (cx, r) = (wave.center as f32, wave.radius as f32);
        if !circle_visible(cx, 0.0, r) {
            continue;
        }
        wave_painter.circle_stroke(
            view.to_screen(cx, 0.0),
            view.length(r),
            Stroke::new(1.0, WAVE_COLOR),
        );
    }

    let source = view.to_screen(params.source_position(now) as f32, 0.0);
    let observer = view.to_screen(params.observer_position as f32, 0.0);
    wave_painter.circle_filled(source, MARKER_RADIUS, SOURCE_COLOR);
    wave_painter.circle_filled(observer, MARKER_RADIUS, OBSERVER_COLOR);
    painter.rect_stroke(bounds, 0.0, Stroke::new(1.0, Color32::DARK_GRAY));

    draw_legend(&painter, bounds);
}

fn draw_legend(painter: &egui::Painter, bounds: Rect) {
    let entries = [("Sound source", SOURCE_COLOR), ("Observer", OBSERVER_COLOR)];
    let font = FontId::proportional(13.0);
    let mut pos = bounds.right_top() + Vec2::new(-120.0, 14.0);
    for (label, color) in entries {
        painter.circle_filled(pos, 5.0, color);
        painter.text(
            pos + Vec2::new(10.0, 0.0),
            Align2::LEFT_CENTER,
            label,
            font.clone(),
            Color32::BLACK,
        );
        pos.y += 18.0;
    }
}

/// Perceived waveform over its fixed 20 ms window.
pub fn draw_waveform(ui: &mut egui::Ui, size: Vec2, signal: &PerceivedSignal, points: &[[f64; 2]]) {
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, Color32::WHITE);
    painter.line_segment(
        [rect.left_center(), rect.right_center()],
        Stroke::new(1.0, GRID_COLOR),
    );

    let Some(t_end) = points.last().map(|p| p[0]) else {
        return;
    };
    if t_end <= 0.0 {
        return;
    }

    let half_height = rect.height() * 0.45;
    let line: Vec<Pos2> = points
        .iter()
        .map(|&[t, y]| {
            Pos2::new(
                rect.left() + (t / t_end) as f32 * rect.width(),
                rect.center().y - y as f32 * half_height,
            )
        })
        .collect();
    painter.add(Shape::line(line, Stroke::new(1.5, Color32::from_rgb(30, 90, 200))));

    painter.text(
        rect.left_top() + Vec2::new(6.0, 4.0),
        Align2::LEFT_TOP,
        format!("{:.3} Hz, amplitude {:.2}  (0 to 20 ms)", signal.frequency, signal.amplitude),
        FontId::proportional(12.0),
        Color32::BLACK,
    );
    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, Color32::DARK_GRAY));
}
