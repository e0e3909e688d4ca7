use std::f64::consts::{FRAC_PI_2, PI};

pub const START_ANGLE: f64 = -FRAC_PI_2;
pub const END_ANGLE: f64 = FRAC_PI_2;
pub const PRIMARY_COLOR: &str = "#ffd700";
pub const SECONDARY_COLOR: &str = "#FA8072";
pub const MAX_LABEL_CHARS: usize = 25;

const WIDTH_FILL: f64 = 0.95;
const INNER_RADIUS_RATIO: f64 = 0.6;
const LABEL_RADIUS_RATIO: f64 = 0.85;
const EPSILON: f64 = 1e-12;

// Angles run clockwise from twelve o'clock; -π/2 is the left end of the half circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub label_radius: f64,
    pub center: (f64, f64),
}

impl ChartGeometry {
    pub fn for_width(container_width: f64) -> Option<Self> {
        if !(container_width > 0.0) || !container_width.is_finite() {
            return None;
        }
        let width = container_width * WIDTH_FILL;
        let height = width / 2.0;
        Some(Self {
            width,
            height,
            outer_radius: height,
            inner_radius: height * INNER_RADIUS_RATIO,
            label_radius: height * LABEL_RADIUS_RATIO,
            center: (width / 2.0, height),
        })
    }

    fn point(&self, radius: f64, angle: f64) -> (f64, f64) {
        (radius * angle.sin(), -radius * angle.cos())
    }

    pub fn sector_path(&self, start_angle: f64, end_angle: f64) -> Option<String> {
        let span = end_angle - start_angle;
        if span.abs() < EPSILON {
            return None;
        }
        let large_arc = if span.abs() > PI { 1 } else { 0 };
        let (r1, r0) = (self.outer_radius, self.inner_radius);
        let (ox0, oy0) = self.point(r1, start_angle);
        let (ox1, oy1) = self.point(r1, end_angle);
        let (ix1, iy1) = self.point(r0, end_angle);
        let (ix0, iy0) = self.point(r0, start_angle);
        Some(format!(
            "M{},{}A{},{},0,{},1,{},{}L{},{}A{},{},0,{},0,{},{}Z",
            fmt(ox0), fmt(oy0),
            fmt(r1), fmt(r1), large_arc, fmt(ox1), fmt(oy1),
            fmt(ix1), fmt(iy1),
            fmt(r0), fmt(r0), large_arc, fmt(ix0), fmt(iy0),
        ))
    }

    // Out along the wedge and back, so offsets are percentages of the round trip.
    pub fn label_path(&self, start_angle: f64, end_angle: f64) -> String {
        let span = end_angle - start_angle;
        let large_arc = if span.abs() > PI { 1 } else { 0 };
        let r = self.label_radius;
        let (x0, y0) = self.point(r, start_angle);
        let (x1, y1) = self.point(r, end_angle);
        format!(
            "M{},{}A{},{},0,{},1,{},{}L{},{}A{},{},0,{},0,{},{}Z",
            fmt(x0), fmt(y0),
            fmt(r), fmt(r), large_arc, fmt(x1), fmt(y1),
            fmt(x1), fmt(y1),
            fmt(r), fmt(r), large_arc, fmt(x0), fmt(y0),
        )
    }
}

fn fmt(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 { "0".to_string() } else { rounded.to_string() }
}

pub fn wedge_angles(weights: &[u64]) -> Vec<(f64, f64)> {
    let total: u64 = weights.iter().sum();
    let k = if total > 0 { (END_ANGLE - START_ANGLE) / total as f64 } else { 0.0 };
    let mut angle = START_ANGLE;
    weights
        .iter()
        .map(|w| {
            let start = angle;
            angle += *w as f64 * k;
            (start, angle)
        })
        .collect()
}

pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}
