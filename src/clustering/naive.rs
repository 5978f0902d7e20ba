//! Reference strategy: rescan every pair and every beam distance at each step

use super::{ActiveObject, Candidate, Engine, Outcome};
use crate::history::NodeId;

pub(super) fn cluster(engine: &mut Engine<'_>, leaves: &[NodeId]) {
    let mut active: Vec<ActiveObject> = leaves.iter().map(|id| engine.active(*id)).collect();

    while !active.is_empty() {
        let mut best: Option<Candidate> = None;
        for (position, a) in active.iter().enumerate() {
            consider(&mut best, Candidate::beam(a));
            for b in &active[position + 1..] {
                // Pairs are always keyed (lower id, higher id)
                let candidate = if a.id < b.id {
                    engine.pair(a, b)
                } else {
                    engine.pair(b, a)
                };
                consider(&mut best, candidate);
            }
        }

        let Some(best) = best else {
            break;
        };
        match engine.apply(best) {
            Outcome::Merged { removed, added } => {
                active.retain(|object| !removed.contains(&object.id));
                active.push(engine.active(added));
            }
            Outcome::Beamed(id) | Outcome::Discarded(id) => {
                active.retain(|object| object.id != id);
            }
        }
    }
}

fn consider(best: &mut Option<Candidate>, candidate: Candidate) {
    match best {
        Some(current) if !candidate.precedes(current) => {}
        _ => *best = Some(candidate),
    }
}
