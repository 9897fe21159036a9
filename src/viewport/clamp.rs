use eframe::egui::{Pos2, Rect, Vec2, vec2};

/// Per-axis result of comparing scaled content against the viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxisFit {
    pub x: bool,
    pub y: bool,
}

impl AxisFit {
    pub fn both(self) -> bool {
        self.x && self.y
    }
}

/// World-space bounding box of `points`, `None` when there are none.
pub fn bounds_of<'a>(points: impl IntoIterator<Item = &'a Pos2>) -> Option<Rect> {
    let mut points = points.into_iter();
    let first = *points.next()?;
    Some(points.fold(Rect::from_min_max(first, first), |rect, point| {
        rect.union(Rect::from_min_max(*point, *point))
    }))
}

/// Whether the content fits on each axis. Empty content always fits.
pub fn content_fits(bounds: Option<Rect>, zoom: f32, viewport: Vec2) -> AxisFit {
    let Some(bounds) = bounds else {
        return AxisFit { x: true, y: true };
    };
    let content = bounds.size() * zoom;
    AxisFit {
        x: content.x <= viewport.x,
        y: content.y <= viewport.y,
    }
}

/// Pan that puts the content's centre on the viewport's centre.
pub fn centering_pan(bounds: Option<Rect>, zoom: f32) -> Vec2 {
    bounds.map_or(Vec2::ZERO, |bounds| -bounds.center().to_vec2() * zoom)
}

/// Clamps `pan` so fitting axes stay centred and overflowing axes never
/// pull an edge of the content further than `padding` inside the viewport.
pub fn clamp_pan(
    pan: Vec2,
    bounds: Option<Rect>,
    zoom: f32,
    viewport: Vec2,
    padding: f32,
) -> Vec2 {
    let Some(bounds) = bounds else {
        return Vec2::ZERO;
    };
    vec2(
        clamp_axis(pan.x, bounds.min.x, bounds.max.x, zoom, viewport.x, padding),
        clamp_axis(pan.y, bounds.min.y, bounds.max.y, zoom, viewport.y, padding),
    )
}

fn clamp_axis(pan: f32, min: f32, max: f32, zoom: f32, viewport: f32, padding: f32) -> f32 {
    let content = (max - min) * zoom;
    if content <= viewport {
        return -(min + max) * 0.5 * zoom;
    }

    let half = viewport * 0.5;
    let upper = padding - half - min * zoom;
    let lower = viewport - padding - half - max * zoom;
    pan.clamp(lower, upper)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn fitting_axis_is_centred_whatever_the_input() {
        let bounds = Some(Rect::from_min_max(pos2(10.0, -50.0), pos2(30.0, 50.0)));
        let pan = clamp_pan(vec2(500.0, -500.0), bounds, 1.0, vec2(800.0, 600.0), 48.0);
        assert_eq!(pan, vec2(-20.0, 0.0));
    }

    #[test]
    fn overflowing_axis_keeps_padding_at_the_edges() {
        let bounds = Some(Rect::from_min_max(pos2(-500.0, 0.0), pos2(500.0, 0.0)));
        let viewport = vec2(400.0, 300.0);

        let right = clamp_pan(vec2(10_000.0, 0.0), bounds, 1.0, viewport, 40.0);
        // left edge of content lands on the padding line
        assert_eq!(200.0 + right.x - 500.0, 40.0);

        let left = clamp_pan(vec2(-10_000.0, 0.0), bounds, 1.0, viewport, 40.0);
        assert_eq!(200.0 + left.x + 500.0, 360.0);

        let inside = clamp_pan(vec2(25.0, 0.0), bounds, 1.0, viewport, 40.0);
        assert_eq!(inside.x, 25.0);
    }

    #[test]
    fn empty_content_resets_pan() {
        assert_eq!(
            clamp_pan(vec2(3.0, 4.0), None, 2.0, vec2(100.0, 100.0), 0.0),
            Vec2::ZERO
        );
        assert!(content_fits(None, 100.0, Vec2::ZERO).both());
    }

    #[test]
    fn bounds_cover_every_point() {
        let points = [pos2(3.0, -1.0), pos2(-2.0, 4.0), pos2(0.0, 0.0)];
        assert_eq!(
            bounds_of(&points),
            Some(Rect::from_min_max(pos2(-2.0, -1.0), pos2(3.0, 4.0)))
        );
        assert_eq!(bounds_of(&[]), None);
    }

    #[test]
    fn zoom_changes_the_fit() {
        let bounds = Some(Rect::from_min_max(pos2(-100.0, -100.0), pos2(100.0, 100.0)));
        assert!(content_fits(bounds, 1.0, vec2(300.0, 300.0)).both());
        let fit = content_fits(bounds, 2.0, vec2(300.0, 500.0));
        assert_eq!(fit, AxisFit { x: false, y: true });
    }
}
