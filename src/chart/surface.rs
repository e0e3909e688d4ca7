use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    End,
}

impl TextAnchor {
    fn as_str(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::End => "end",
        }
    }
}

// Coordinates are relative to the origin set by `begin`.
pub trait Surface: Send {
    fn width(&self) -> f64;
    fn set_width(&mut self, width: f64);
    fn clear(&mut self);
    fn begin(&mut self, width: f64, height: f64, origin: (f64, f64));
    fn path(&mut self, id: Option<&str>, d: &str, fill: Option<&str>);
    // `start_offset_percent` is a percentage of the path length (5.0 = 5%).
    fn text_on_path(&mut self, path_id: &str, text: &str, start_offset_percent: f64, anchor: TextAnchor, opacity: f64);
    fn is_empty(&self) -> bool;

    fn export(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Default, Clone)]
pub struct SvgSurface {
    container_width: f64,
    size: Option<(f64, f64)>,
    origin: (f64, f64),
    elements: Vec<String>,
}

impl SvgSurface {
    pub fn new(container_width: f64) -> Self {
        Self { container_width, ..Self::default() }
    }

    #[cfg(test)]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn to_svg(&self) -> String {
        let Some((width, height)) = self.size else {
            return String::new();
        };
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{}" height="{}" style="display:block;margin:auto">"#,
            width, height
        );
        let _ = writeln!(out, r#"<g transform="translate({}, {})">"#, self.origin.0, self.origin.1);
        for element in &self.elements {
            out.push_str(element);
            out.push('\n');
        }
        out.push_str("</g>\n</svg>\n");
        out
    }
}

impl Surface for SvgSurface {
    fn width(&self) -> f64 {
        self.container_width
    }

    fn set_width(&mut self, width: f64) {
        self.container_width = width;
    }

    fn clear(&mut self) {
        self.size = None;
        self.elements.clear();
    }

    fn begin(&mut self, width: f64, height: f64, origin: (f64, f64)) {
        self.size = Some((width, height));
        self.origin = origin;
    }

    fn path(&mut self, id: Option<&str>, d: &str, fill: Option<&str>) {
        let id_attr = id.map(|id| format!(r#" id="{}""#, id)).unwrap_or_default();
        let style = match fill {
            Some(fill) => format!("fill:{}", fill),
            None => "fill:none;stroke:none".to_string(),
        };
        self.elements.push(format!(r#"<path{} d="{}" style="{}"/>"#, id_attr, d, style));
    }

    fn text_on_path(&mut self, path_id: &str, text: &str, start_offset_percent: f64, anchor: TextAnchor, opacity: f64) {
        self.elements.push(format!(
            r##"<text><textPath xlink:href="#{}" startOffset="{}%" style="text-anchor:{};font-size:1.1em;fill:black;opacity:{}">{}</textPath></text>"##,
            path_id,
            start_offset_percent,
            anchor.as_str(),
            opacity,
            escape(text)
        ));
    }

    fn is_empty(&self) -> bool {
        self.size.is_none()
    }

    fn export(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.to_svg())
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_surface_serializes_elements() {
        let mut surface = SvgSurface::new(200.0);
        assert!(surface.to_svg().is_empty());
        assert_eq!(surface.export(), None);

        surface.begin(190.0, 95.0, (95.0, 95.0));
        surface.path(None, "M0,0Z", Some("#ffd700"));
        surface.path(Some("label-path-0"), "M1,1Z", None);
        surface.text_on_path("label-path-0", "Cats & dogs", 5.0, TextAnchor::Start, 0.0);

        let svg = surface.to_svg();
        assert!(svg.contains(r#"width="190" height="95""#));
        assert!(svg.contains(r#"translate(95, 95)"#));
        assert!(svg.contains(r#"style="fill:#ffd700""#));
        assert!(svg.contains(r#"id="label-path-0""#));
        assert!(svg.contains("Cats &amp; dogs"));
        assert!(svg.contains("startOffset=\"5%\""));
        assert_eq!(surface.export(), Some(svg));
    }

    #[test]
    fn test_clear_removes_prior_drawing() {
        let mut surface = SvgSurface::new(200.0);
        surface.begin(190.0, 95.0, (95.0, 95.0));
        surface.path(None, "M0,0Z", Some("#ffd700"));
        surface.clear();
        assert!(surface.is_empty());
        assert_eq!(surface.element_count(), 0);
        assert_eq!(surface.width(), 200.0);
    }
}
