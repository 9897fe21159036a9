use tracing::debug;

use super::model::{LinkRecord, NodeRecord, Snapshot};

const GATEWAY_COUNT: usize = 3;

struct Participant {
    id: String,
    balance: f64,
}

struct Trustline {
    source: String,
    target: String,
    limit: f64,
    used: f64,
}

/// Seeded generator for an evolving payment network.
///
/// Most steps only move balances around; a small share opens or closes trust
/// lines or changes the participant set.
pub struct SimulatedNetwork {
    rng: u64,
    next_participant: usize,
    participants: Vec<Participant>,
    trustlines: Vec<Trustline>,
    structural_changes: u64,
}

impl SimulatedNetwork {
    pub fn new(seed: u64, participant_count: usize) -> Self {
        let mut network = Self {
            rng: seed.max(1),
            next_participant: 0,
            participants: Vec::new(),
            trustlines: Vec::new(),
            structural_changes: 0,
        };

        for _ in 0..participant_count.max(GATEWAY_COUNT + 1) {
            network.join();
        }
        let initial_lines = network.participants.len() + network.participants.len() / 2;
        for _ in 0..initial_lines {
            network.open_trustline();
        }
        network.structural_changes = 0;
        network
    }

    pub fn structural_changes(&self) -> u64 {
        self.structural_changes
    }

    pub fn snapshot(&self, now_ms: f64) -> Snapshot {
        Snapshot {
            nodes: self
                .participants
                .iter()
                .map(|participant| NodeRecord {
                    id: participant.id.clone(),
                    label: None,
                    balance: participant.balance,
                })
                .collect(),
            links: self
                .trustlines
                .iter()
                .map(|line| LinkRecord {
                    source: line.source.clone(),
                    target: line.target.clone(),
                    limit: line.limit,
                    used: line.used,
                })
                .collect(),
            generated_at: Some(format!("t+{:.0}ms", now_ms.max(0.0))),
        }
    }

    pub fn step(&mut self, now_ms: f64) -> Snapshot {
        let roll = self.next_unit();
        let structural = if roll < 0.06 {
            self.open_trustline()
        } else if roll < 0.10 {
            self.close_trustline()
        } else if roll < 0.12 {
            self.join();
            true
        } else if roll < 0.13 {
            self.leave()
        } else {
            false
        };
        if structural {
            self.structural_changes += 1;
            debug!(
                participants = self.participants.len(),
                trustlines = self.trustlines.len(),
                "simulated network changed shape"
            );
        }

        self.settle_payments();
        self.snapshot(now_ms)
    }

    fn settle_payments(&mut self) {
        if self.trustlines.is_empty() {
            return;
        }

        let payments = 1 + (self.next_unit() * 3.0) as usize;
        for _ in 0..payments {
            let line_index = self.pick(self.trustlines.len());
            let amount = (self.next_unit() * 40.0).round();
            let line = &mut self.trustlines[line_index];
            line.used = (line.used + amount).min(line.limit);
            let (source, target) = (line.source.clone(), line.target.clone());
            for participant in &mut self.participants {
                if participant.id == source {
                    participant.balance -= amount;
                } else if participant.id == target {
                    participant.balance += amount;
                }
            }
        }
    }

    fn join(&mut self) {
        let id = if self.next_participant < GATEWAY_COUNT {
            format!("gw-{:02}", self.next_participant)
        } else {
            format!("acct-{:03}", self.next_participant)
        };
        self.next_participant += 1;
        let balance = (self.next_unit() * 500.0).round();
        self.participants.push(Participant { id, balance });
    }

    fn leave(&mut self) -> bool {
        if self.participants.len() <= GATEWAY_COUNT + 1 {
            return false;
        }

        let index = GATEWAY_COUNT + self.pick(self.participants.len() - GATEWAY_COUNT);
        let removed = self.participants.remove(index);
        self.trustlines
            .retain(|line| line.source != removed.id && line.target != removed.id);
        true
    }

    fn open_trustline(&mut self) -> bool {
        let count = self.participants.len();
        if count < 2 {
            return false;
        }

        // Accounts mostly extend trust towards gateways.
        let source = self.pick(count);
        let target = if self.next_unit() < 0.7 {
            self.pick(GATEWAY_COUNT.min(count))
        } else {
            self.pick(count)
        };
        if source == target {
            return false;
        }

        let source_id = self.participants[source].id.clone();
        let target_id = self.participants[target].id.clone();
        if self
            .trustlines
            .iter()
            .any(|line| line.source == source_id && line.target == target_id)
        {
            return false;
        }

        let limit = 100.0 + (self.next_unit() * 900.0).round();
        self.trustlines.push(Trustline {
            source: source_id,
            target: target_id,
            limit,
            used: 0.0,
        });
        true
    }

    fn close_trustline(&mut self) -> bool {
        if self.trustlines.len() <= self.participants.len() / 2 {
            return false;
        }
        let index = self.pick(self.trustlines.len());
        self.trustlines.swap_remove(index);
        true
    }

    fn pick(&mut self, len: usize) -> usize {
        ((self.next_unit() * len as f64) as usize).min(len.saturating_sub(1))
    }

    fn next_unit(&mut self) -> f64 {
        // xorshift64*
        let mut x = self.rng;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.rng = x;
        let value = x.wrapping_mul(0x2545_f491_4f6c_dd1d);
        (value >> 11) as f64 / (1u64 << 53) as f64
    }
}
