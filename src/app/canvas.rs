use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use eframe::egui::{Color32, Mesh, Pos2, Rect, Shape, Stroke, pos2};

use trustline_canvas::scheduler::FrameOutcome;
use trustline_canvas::view::{FrameView, Renderer};

const NODE_RADIUS: f32 = 7.0;

/// Retained output of the last rendered frame, in surface-local points.
#[derive(Default)]
pub(super) struct DisplayList {
    pub(super) background: Option<Shape>,
    pub(super) shapes: Vec<Shape>,
    pub(super) labels: Vec<(Pos2, String)>,
    pub(super) nodes_drawn: usize,
    pub(super) links_drawn: usize,
    pub(super) rendered_at_ms: f64,
}

struct CachedBackground {
    pixels: (u32, u32),
    shape: Shape,
}

/// Draws into a shared [`DisplayList`] that the app paints every update,
/// so an idle scheduler still leaves the last frame on screen.
pub(super) struct ShapeRenderer {
    list: Rc<RefCell<DisplayList>>,
    background: Option<CachedBackground>,
    gradients_built: u64,
}

impl ShapeRenderer {
    pub(super) fn new(list: Rc<RefCell<DisplayList>>) -> Self {
        Self {
            list,
            background: None,
            gradients_built: 0,
        }
    }

    fn background(&mut self, rect: Rect, pixels: (u32, u32)) -> Shape {
        if let Some(cached) = &self.background
            && cached.pixels == pixels
        {
            return cached.shape.clone();
        }

        let shape = Shape::mesh(gradient_mesh(rect));
        self.gradients_built += 1;
        self.background = Some(CachedBackground {
            pixels,
            shape: shape.clone(),
        });
        shape
    }
}

impl Renderer for ShapeRenderer {
    fn draw(&mut self, frame: &FrameView<'_>) -> FrameOutcome {
        let rect = Rect::from_min_size(Pos2::ZERO, frame.surface.size());
        let background = self.background(rect, frame.surface.pixel_size());
        let transform = frame.transform;
        let zoom_sqrt = transform.zoom.sqrt();

        // Utilization changes between snapshots without moving anything, so
        // it is looked up fresh every frame.
        let utilization = frame
            .snapshot
            .links
            .iter()
            .map(|link| ((link.source.as_str(), link.target.as_str()), link.utilization()))
            .collect::<HashMap<_, _>>();

        let mut shapes = Vec::with_capacity(frame.links.len() + frame.positions.len() * 2);
        let mut links_drawn = 0;
        for link in frame.links {
            let load = utilization
                .get(&(link.source.as_str(), link.target.as_str()))
                .copied()
                .unwrap_or(0.0);
            let (Some(source), Some(target)) = (
                frame.positions.get(&link.source),
                frame.positions.get(&link.target),
            ) else {
                continue;
            };
            let start = transform.world_to_screen(*source);
            let end = transform.world_to_screen(*target);
            if !edge_visible(rect, start, end, 2.5) {
                continue;
            }

            let color = blend_color(
                Color32::from_rgba_unmultiplied(96, 112, 128, 170),
                Color32::from_rgb(241, 146, 94),
                load,
            );
            let width = ((0.9 + load * 1.6) * zoom_sqrt).clamp(0.6, 4.0);
            shapes.push(Shape::line_segment([start, end], Stroke::new(width, color)));
            links_drawn += 1;
        }

        let radius = (NODE_RADIUS * transform.zoom.powf(0.4)).clamp(2.5, 26.0);
        let mut labels = Vec::new();
        let mut nodes_drawn = 0;
        for node in &frame.snapshot.nodes {
            let Some(world) = frame.positions.get(&node.id) else {
                continue;
            };
            let position = transform.world_to_screen(*world);
            if !circle_visible(rect, position, radius) {
                continue;
            }

            shapes.push(Shape::circle_filled(position, radius, balance_color(node.balance)));
            shapes.push(Shape::circle_stroke(
                position,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
            ));
            if transform.zoom > 1.35 || node.id.starts_with("gw-") {
                labels.push((
                    position + eframe::egui::vec2(radius + 5.0, 0.0),
                    node.display_name().to_owned(),
                ));
            }
            nodes_drawn += 1;
        }

        let mut list = self.list.borrow_mut();
        list.background = Some(background);
        list.shapes = shapes;
        list.labels = labels;
        list.nodes_drawn = nodes_drawn;
        list.links_drawn = links_drawn;
        list.rendered_at_ms = frame.timestamp_ms;
        FrameOutcome::Rendered
    }

    fn invalidate_resources(&mut self) {
        self.background = None;
    }
}

fn gradient_mesh(rect: Rect) -> Mesh {
    let top = Color32::from_rgb(24, 30, 38);
    let bottom = Color32::from_rgb(13, 16, 21);

    let mut mesh = Mesh::default();
    let base = mesh.vertices.len() as u32;
    mesh.colored_vertex(rect.left_top(), top);
    mesh.colored_vertex(rect.right_top(), top);
    mesh.colored_vertex(rect.right_bottom(), bottom);
    mesh.colored_vertex(rect.left_bottom(), bottom);
    mesh.add_triangle(base, base + 1, base + 2);
    mesh.add_triangle(base, base + 2, base + 3);
    mesh
}

fn balance_color(balance: f64) -> Color32 {
    let neutral = Color32::from_rgb(103, 160, 215);
    let t = ((balance.abs() / 5_000.0).min(1.0)) as f32;
    if balance >= 0.0 {
        blend_color(neutral, Color32::from_rgb(112, 206, 140), t)
    } else {
        blend_color(neutral, Color32::from_rgb(228, 102, 96), t)
    }
}

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min = pos2(start.x.min(end.x) - padding, start.y.min(end.y) - padding);
    let max = pos2(start.x.max(end.x) + padding, start.y.max(end.y) + padding);
    if !rect.intersects(Rect::from_min_max(min, max)) {
        return false;
    }
    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let corners = [
        rect.left_top(),
        rect.right_top(),
        rect.right_bottom(),
        rect.left_bottom(),
    ];
    (0..4).any(|index| segments_intersect(start, end, corners[index], corners[(index + 1) % 4]))
}

fn segments_intersect(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
        let oa = a - o;
        let ob = b - o;
        (oa.x * ob.y) - (oa.y * ob.x)
    }

    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);

    (c1 <= 0.0 && c2 >= 0.0 || c1 >= 0.0 && c2 <= 0.0)
        && (c3 <= 0.0 && c4 >= 0.0 || c3 >= 0.0 && c4 <= 0.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use eframe::egui::vec2;

    use trustline_canvas::layout::PlacedLink;
    use trustline_canvas::port::SurfaceMetrics;
    use trustline_canvas::snapshot::{LinkRecord, NodeRecord, Snapshot};
    use trustline_canvas::viewport::ViewTransform;

    use super::*;

    fn frame_parts(used: f64) -> (Snapshot, HashMap<String, Pos2>, Vec<PlacedLink>) {
        let mut link = LinkRecord::new("gw-01", "acct-002");
        link.limit = 100.0;
        link.used = used;
        let snapshot = Snapshot {
            nodes: vec![NodeRecord::new("gw-01"), NodeRecord::new("acct-002")],
            links: vec![link],
            generated_at: None,
        };
        let positions = HashMap::from([
            ("gw-01".to_owned(), pos2(-50.0, 0.0)),
            ("acct-002".to_owned(), pos2(50.0, 0.0)),
        ]);
        let links = vec![PlacedLink {
            source: "gw-01".into(),
            target: "acct-002".into(),
        }];
        (snapshot, positions, links)
    }

    fn draw_with(renderer: &mut ShapeRenderer, surface: SurfaceMetrics, used: f64) {
        let (snapshot, positions, links) = frame_parts(used);
        renderer.draw(&FrameView {
            snapshot: &snapshot,
            positions: &positions,
            links: &links,
            transform: ViewTransform {
                center: (surface.size() * 0.5).to_pos2(),
                pan: vec2(0.0, 0.0),
                zoom: 1.0,
            },
            surface,
            timestamp_ms: 16.0,
        });
    }

    fn draw(renderer: &mut ShapeRenderer, surface: SurfaceMetrics) {
        draw_with(renderer, surface, 50.0);
    }

    fn link_width(list: &DisplayList) -> Option<f32> {
        list.shapes.iter().find_map(|shape| match shape {
            Shape::LineSegment { stroke, .. } => Some(stroke.width),
            _ => None,
        })
    }

    #[test]
    fn frame_fills_display_list() {
        let list = Rc::new(RefCell::new(DisplayList::default()));
        let mut renderer = ShapeRenderer::new(Rc::clone(&list));
        draw(&mut renderer, SurfaceMetrics::new(400.0, 300.0, 1.0));

        let list = list.borrow();
        assert_eq!(list.nodes_drawn, 2);
        assert_eq!(list.links_drawn, 1);
        assert_eq!(list.labels.len(), 1);
        assert_eq!(list.labels[0].1, "01");
        assert!(list.background.is_some());
    }

    #[test]
    fn link_load_follows_the_current_snapshot() {
        let list = Rc::new(RefCell::new(DisplayList::default()));
        let mut renderer = ShapeRenderer::new(Rc::clone(&list));
        let surface = SurfaceMetrics::new(400.0, 300.0, 1.0);

        draw_with(&mut renderer, surface, 0.0);
        let idle = link_width(&list.borrow());
        draw_with(&mut renderer, surface, 100.0);
        let saturated = link_width(&list.borrow());

        assert_eq!(idle, Some(0.9));
        assert_eq!(saturated, Some(2.5));
    }

    #[test]
    fn gradient_is_rebuilt_only_after_invalidation() {
        let list = Rc::new(RefCell::new(DisplayList::default()));
        let mut renderer = ShapeRenderer::new(list);
        let surface = SurfaceMetrics::new(400.0, 300.0, 1.0);

        draw(&mut renderer, surface);
        draw(&mut renderer, surface);
        assert_eq!(renderer.gradients_built, 1);

        renderer.invalidate_resources();
        draw(&mut renderer, SurfaceMetrics::new(400.0, 300.0, 2.0));
        assert_eq!(renderer.gradients_built, 2);
    }

    #[test]
    fn offscreen_edges_are_culled() {
        let rect = Rect::from_min_max(Pos2::ZERO, pos2(100.0, 100.0));
        assert!(edge_visible(rect, pos2(-10.0, 50.0), pos2(110.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-10.0, -10.0), pos2(-5.0, 200.0), 0.0));
    }
}
