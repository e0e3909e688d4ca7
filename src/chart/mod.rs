pub mod geometry;
pub mod surface;

use crate::models::PollRecord;
use geometry::{
    ease_cubic_in_out, lerp, truncate_label, wedge_angles, ChartGeometry, MAX_LABEL_CHARS, PRIMARY_COLOR,
    SECONDARY_COLOR, START_ANGLE,
};
use log::debug;
use std::time::Duration;
use surface::{Surface, TextAnchor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartTiming {
    pub sweep: Duration,
    pub label_delay: Duration,
    pub label_fade: Duration,
}

impl Default for ChartTiming {
    fn default() -> Self {
        Self {
            sweep: Duration::from_millis(1000),
            label_delay: Duration::from_millis(1000),
            label_fade: Duration::from_millis(500),
        }
    }
}

impl ChartTiming {
    pub fn total(&self) -> Duration {
        self.sweep.max(self.label_delay + self.label_fade)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WedgeLayout {
    pub label: String,
    pub color: &'static str,
    pub weight: u64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub anchor: TextAnchor,
    // percent of the label path
    pub label_offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub post_id: String,
    pub geometry: ChartGeometry,
    pub wedges: Vec<WedgeLayout>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub angles: Vec<(f64, f64)>,
    pub label_opacity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ChartEngine {
    pub timing: ChartTiming,
}

impl ChartEngine {
    pub fn new(timing: ChartTiming) -> Self {
        Self { timing }
    }

    pub fn layout(&self, poll: &PollRecord, container_width: f64) -> Option<ChartLayout> {
        let geometry = ChartGeometry::for_width(container_width)?;
        let angles = wedge_angles(&[poll.response_count1, poll.response_count2]);
        let specs = [
            (&poll.option1, poll.response_count1, PRIMARY_COLOR, TextAnchor::Start, 5.0),
            (&poll.option2, poll.response_count2, SECONDARY_COLOR, TextAnchor::End, 45.0),
        ];
        let wedges = specs
            .into_iter()
            .zip(angles)
            .map(|((label, weight, color, anchor, label_offset), (start_angle, end_angle))| WedgeLayout {
                label: truncate_label(label, MAX_LABEL_CHARS),
                color,
                weight,
                start_angle,
                end_angle,
                anchor,
                label_offset,
            })
            .collect();

        Some(ChartLayout { post_id: poll.post_id.clone(), geometry, wedges })
    }

    pub fn render(&self, poll: &PollRecord, surface: &mut dyn Surface) -> Option<ChartLayout> {
        let Some(layout) = self.layout(poll, surface.width()) else {
            debug!("Chart container not ready for poll {}; skipping render", poll.post_id);
            return None;
        };
        self.draw_frame(&layout, surface, Duration::ZERO);
        Some(layout)
    }

    pub fn frame_at(&self, layout: &ChartLayout, elapsed: Duration) -> ChartFrame {
        let t = progress(elapsed, Duration::ZERO, self.timing.sweep);
        let eased = ease_cubic_in_out(t);
        let angles = layout
            .wedges
            .iter()
            .map(|w| (lerp(START_ANGLE, w.start_angle, eased), lerp(START_ANGLE, w.end_angle, eased)))
            .collect();
        let label_opacity = ease_cubic_in_out(progress(elapsed, self.timing.label_delay, self.timing.label_fade));
        ChartFrame { angles, label_opacity }
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.timing.total()
    }

    pub fn draw_frame(&self, layout: &ChartLayout, surface: &mut dyn Surface, elapsed: Duration) {
        let frame = self.frame_at(layout, elapsed);
        let g = &layout.geometry;

        surface.clear();
        surface.begin(g.width, g.height, g.center);

        for (wedge, (start, end)) in layout.wedges.iter().zip(&frame.angles) {
            if let Some(d) = g.sector_path(*start, *end) {
                surface.path(None, &d, Some(wedge.color));
            }
        }
        for (i, wedge) in layout.wedges.iter().enumerate() {
            let path_id = format!("label-path-{}", i);
            surface.path(Some(&path_id), &g.label_path(wedge.start_angle, wedge.end_angle), None);
            surface.text_on_path(&path_id, &wedge.label, wedge.label_offset, wedge.anchor, frame.label_opacity);
        }
    }
}

fn progress(elapsed: Duration, delay: Duration, duration: Duration) -> f64 {
    if elapsed < delay {
        return 0.0;
    }
    if duration.is_zero() {
        return 1.0;
    }
    ((elapsed - delay).as_secs_f64() / duration.as_secs_f64()).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::surface::SvgSurface;
    use super::*;
    use crate::models::sample_poll;

    #[test]
    fn test_layout_uses_counts_in_order() {
        let engine = ChartEngine::default();
        let mut poll = sample_poll("1", "acme");
        poll.response_count1 = 25;
        poll.response_count2 = 75;
        let layout = engine.layout(&poll, 600.0).unwrap();
        assert_eq!(layout.wedges.len(), 2);
        assert_eq!(layout.wedges[0].color, PRIMARY_COLOR);
        assert_eq!(layout.wedges[1].color, SECONDARY_COLOR);
        assert!((layout.wedges[0].end_angle - (START_ANGLE + std::f64::consts::PI * 0.25)).abs() < 1e-12);
        assert_eq!(layout.wedges[0].anchor, TextAnchor::Start);
        assert_eq!(layout.wedges[1].anchor, TextAnchor::End);
    }

    #[test]
    fn test_render_is_noop_without_width() {
        let engine = ChartEngine::default();
        let mut surface = SvgSurface::new(0.0);
        assert!(engine.render(&sample_poll("1", "acme"), &mut surface).is_none());
        assert!(surface.is_empty());
    }

    #[test]
    fn test_render_clears_previous_drawing() {
        let engine = ChartEngine::default();
        let mut surface = SvgSurface::new(600.0);
        let layout = engine.render(&sample_poll("1", "acme"), &mut surface).unwrap();
        engine.draw_frame(&layout, &mut surface, engine.timing.total());
        let settled = surface.element_count();

        engine.render(&sample_poll("2", "acme"), &mut surface).unwrap();
        engine.draw_frame(&layout, &mut surface, engine.timing.total());
        assert_eq!(surface.element_count(), settled);
    }

    #[test]
    fn test_wedges_sweep_from_start_angle() {
        let engine = ChartEngine::default();
        let layout = engine.layout(&sample_poll("1", "acme"), 600.0).unwrap();

        let first = engine.frame_at(&layout, Duration::ZERO);
        assert!(first.angles.iter().all(|(s, e)| *s == START_ANGLE && *e == START_ANGLE));
        assert_eq!(first.label_opacity, 0.0);

        let middle = engine.frame_at(&layout, Duration::from_millis(500));
        assert!(middle.angles[1].1 > START_ANGLE && middle.angles[1].1 < layout.wedges[1].end_angle);
        assert_eq!(middle.label_opacity, 0.0);

        let swept = engine.frame_at(&layout, Duration::from_millis(1000));
        assert!((swept.angles[0].1 - layout.wedges[0].end_angle).abs() < 1e-12);
        assert_eq!(swept.label_opacity, 0.0);

        let done = engine.frame_at(&layout, Duration::from_millis(1500));
        assert_eq!(done.label_opacity, 1.0);
        assert!(engine.is_complete(Duration::from_millis(1500)));
        assert!(!engine.is_complete(Duration::from_millis(1499)));
    }

    #[test]
    fn test_first_frame_draws_only_labels() {
        let engine = ChartEngine::default();
        let mut surface = SvgSurface::new(600.0);
        engine.render(&sample_poll("1", "acme"), &mut surface).unwrap();
        // Two label paths and two labels; both wedges still have zero width.
        assert_eq!(surface.element_count(), 4);
        assert!(surface.to_svg().contains("opacity:0"));
    }

    #[test]
    fn test_labels_sit_at_fixed_offsets_along_arc() {
        let engine = ChartEngine::default();
        let mut surface = SvgSurface::new(600.0);
        let layout = engine.render(&sample_poll("1", "acme"), &mut surface).unwrap();
        engine.draw_frame(&layout, &mut surface, engine.timing.total());

        let svg = surface.to_svg();
        assert!(svg.contains(r#"startOffset="5%" style="text-anchor:start"#));
        assert!(svg.contains(r#"startOffset="45%" style="text-anchor:end"#));
        assert!(!svg.contains("500%"));
    }

    #[test]
    fn test_long_option_text_is_truncated() {
        let engine = ChartEngine::default();
        let mut poll = sample_poll("1", "acme");
        poll.option1 = "An extremely long option text that will not fit".to_string();
        let layout = engine.layout(&poll, 600.0).unwrap();
        assert_eq!(layout.wedges[0].label, "An extremely long opti...");
    }
}
