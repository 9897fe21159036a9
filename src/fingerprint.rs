use crate::snapshot::Snapshot;

/// 128-bit digest of a set, built from two independently seeded FNV-1a lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SetDigest {
    pub hi: u64,
    pub lo: u64,
}

/// Order-independent summary of a snapshot's node-id set and edge set.
///
/// Only ids and `(source, target)` pairs contribute; balances, limits and
/// `generated_at` never do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StructuralFingerprint {
    pub nodes: SetDigest,
    pub edges: SetDigest,
}

impl StructuralFingerprint {
    /// True when the node-id sets differ, i.e. cached positions may need pruning.
    pub fn node_set_differs(&self, other: &Self) -> bool {
        self.nodes != other.nodes
    }
}

pub fn fingerprint(snapshot: &Snapshot) -> StructuralFingerprint {
    let mut node_ids = snapshot
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<Vec<_>>();
    node_ids.sort_unstable();
    node_ids.dedup();

    let mut edges = snapshot
        .links
        .iter()
        .map(|link| (link.source.as_str(), link.target.as_str()))
        .collect::<Vec<_>>();
    edges.sort_unstable();
    edges.dedup();

    let nodes = {
        let mut lanes = Lanes::new();
        lanes.write_u64(node_ids.len() as u64);
        for id in &node_ids {
            lanes.write_str(id);
        }
        lanes.finish()
    };

    let edges = {
        let mut lanes = Lanes::new();
        lanes.write_u64(edges.len() as u64);
        for (source, target) in &edges {
            lanes.write_str(source);
            lanes.write_str(target);
        }
        lanes.finish()
    };

    StructuralFingerprint { nodes, edges }
}

struct Lanes {
    a: Fnv1a64,
    b: Fnv1a64,
}

impl Lanes {
    fn new() -> Self {
        Self {
            a: Fnv1a64::new(0xcbf29ce484222325),
            b: Fnv1a64::new(0x9ae16a3b2f90404f),
        }
    }

    fn write_u64(&mut self, v: u64) {
        self.a.write_u64(v);
        self.b.write_u64(v);
    }

    // Length prefix keeps ("ab", "c") apart from ("a", "bc").
    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.a.write_bytes(s.as_bytes());
        self.b.write_bytes(s.as_bytes());
    }

    fn finish(self) -> SetDigest {
        SetDigest {
            hi: self.a.finish(),
            lo: self.b.finish(),
        }
    }
}

#[derive(Clone, Copy)]
struct Fnv1a64(u64);

impl Fnv1a64 {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.0 = h;
    }

    fn finish(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{LinkRecord, NodeRecord};

    fn snapshot(nodes: &[&str], links: &[(&str, &str)]) -> Snapshot {
        Snapshot {
            nodes: nodes.iter().map(|id| NodeRecord::new(*id)).collect(),
            links: links
                .iter()
                .map(|(source, target)| LinkRecord::new(*source, *target))
                .collect(),
            generated_at: None,
        }
    }

    #[test]
    fn reordering_does_not_change_fingerprint() {
        let a = snapshot(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let b = snapshot(&["C", "A", "B"], &[("B", "C"), ("A", "B")]);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn cosmetic_fields_are_ignored() {
        let base = snapshot(&["A", "B"], &[("A", "B")]);
        let mut bumped = base.clone().with_generated_at("2026-10-19T12:00:00Z");
        bumped.nodes[0].balance = 999.0;
        bumped.nodes[1].label = Some("Bob".into());
        bumped.links[0].used = 12.0;
        bumped.links[0].limit = 50.0;

        assert_eq!(fingerprint(&base), fingerprint(&bumped));
    }

    #[test]
    fn changed_endpoint_changes_edge_digest_only() {
        let before = fingerprint(&snapshot(&["A", "B"], &[("A", "B")]));
        let after = fingerprint(&snapshot(&["A", "B"], &[("A", "C")]));

        assert_ne!(before, after);
        assert_eq!(before.nodes, after.nodes);
        assert!(!before.node_set_differs(&after));
    }

    #[test]
    fn edge_direction_matters() {
        let forward = fingerprint(&snapshot(&["A", "B"], &[("A", "B")]));
        let reverse = fingerprint(&snapshot(&["A", "B"], &[("B", "A")]));
        assert_ne!(forward, reverse);
    }

    #[test]
    fn adding_or_removing_members_changes_fingerprint() {
        let base = fingerprint(&snapshot(&["A", "B"], &[("A", "B")]));
        let extra_node = fingerprint(&snapshot(&["A", "B", "C"], &[("A", "B")]));
        let extra_edge = fingerprint(&snapshot(&["A", "B"], &[("A", "B"), ("B", "A")]));
        let no_edges = fingerprint(&snapshot(&["A", "B"], &[]));

        assert!(base.node_set_differs(&extra_node));
        assert_ne!(base, extra_edge);
        assert_ne!(base, no_edges);
    }

    #[test]
    fn ids_are_length_delimited() {
        let joined = fingerprint(&snapshot(&["ab", "c"], &[]));
        let split = fingerprint(&snapshot(&["a", "bc"], &[]));
        assert_ne!(joined, split);
    }
}
