use std::cell::Cell;
use std::rc::Rc;

use trustline_canvas::config::ViewConfig;
use trustline_canvas::port::HeadlessPlatform;
use trustline_canvas::scheduler::FrameOutcome;
use trustline_canvas::snapshot::{LinkRecord, NodeRecord, Snapshot};
use trustline_canvas::view::{FrameView, GraphView};

pub struct Rig {
    pub view: GraphView<HeadlessPlatform>,
    pub frames: Rc<Cell<u32>>,
}

pub fn rig(platform: HeadlessPlatform, config: ViewConfig) -> Rig {
    let frames = Rc::new(Cell::new(0));
    let counter = Rc::clone(&frames);
    let renderer = move |_: &FrameView<'_>| {
        counter.set(counter.get() + 1);
        FrameOutcome::Rendered
    };
    let view = GraphView::with_default_engine(Rc::new(platform), config, Box::new(renderer))
        .expect("test config is valid");
    Rig { view, frames }
}

pub fn snapshot(nodes: &[&str], links: &[(&str, &str)]) -> Snapshot {
    Snapshot {
        nodes: nodes.iter().map(|id| NodeRecord::new(*id)).collect(),
        links: links
            .iter()
            .map(|(source, target)| LinkRecord::new(*source, *target))
            .collect(),
        generated_at: Some("2026-10-19T09:00:00Z".into()),
    }
}
