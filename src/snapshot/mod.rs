mod load;
mod model;
mod simulate;

pub use load::{load_snapshot, parse_snapshot};
pub use model::{LinkRecord, NodeRecord, Snapshot};
pub use simulate::SimulatedNetwork;
