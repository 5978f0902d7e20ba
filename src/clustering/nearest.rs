//! Nearest-neighbour caching strategy
//!
//! Each active object remembers its best candidate (its nearest neighbour or
//! the beam). After a step only the objects around the removed and added
//! positions are revisited. The search region is supplied by a
//! [`Neighbourhood`]: every object for [`AllPairs`], adjacent tiles for
//! [`super::tiles::TileGrid`].
//!
//! A neighbourhood may leave out objects further than R away: such a pair can
//! never be the global minimum, because its distance exceeds the beam distance
//! of one of its members.

use super::{ActiveObject, Candidate, Engine, Outcome};
use crate::history::NodeId;

/// Spatial index over the active objects
pub(super) trait Neighbourhood {
    fn insert(&mut self, object: &ActiveObject);
    fn remove(&mut self, object: &ActiveObject);
    /// Objects that may lie within R of `object` (possibly including itself)
    ///
    /// Must be symmetric: `b ∈ around(a)` iff `a ∈ around(b)`.
    fn around(&self, object: &ActiveObject, out: &mut Vec<NodeId>);
}

/// No spatial restriction: everything is a neighbour of everything
#[derive(Debug, Default)]
pub(super) struct AllPairs {
    ids: Vec<NodeId>,
}

impl Neighbourhood for AllPairs {
    fn insert(&mut self, object: &ActiveObject) {
        self.ids.push(object.id);
    }

    fn remove(&mut self, object: &ActiveObject) {
        self.ids.retain(|id| *id != object.id);
    }

    fn around(&self, _object: &ActiveObject, out: &mut Vec<NodeId>) {
        out.extend_from_slice(&self.ids);
    }
}

struct NearestState {
    objects: Vec<Option<ActiveObject>>,
    best: Vec<Option<Candidate>>,
    scratch: Vec<NodeId>,
}

impl NearestState {
    fn with_capacity(n: usize) -> Self {
        Self {
            objects: vec![None; n],
            best: vec![None; n],
            scratch: Vec::new(),
        }
    }

    fn store(&mut self, object: ActiveObject) {
        let index = object.id.index();
        if index >= self.objects.len() {
            self.objects.resize(index + 1, None);
            self.best.resize(index + 1, None);
        }
        self.objects[index] = Some(object);
    }

    fn refresh<N: Neighbourhood>(&mut self, engine: &Engine<'_>, space: &N, id: NodeId) {
        let Some(object) = self.objects[id.index()] else {
            return;
        };
        self.scratch.clear();
        space.around(&object, &mut self.scratch);
        let mut best = Candidate::beam(&object);
        for other_id in &self.scratch {
            if *other_id == id {
                continue;
            }
            if let Some(other) = &self.objects[other_id.index()] {
                let candidate = engine.pair(&object, other);
                if candidate.precedes(&best) {
                    best = candidate;
                }
            }
        }
        self.best[id.index()] = Some(best);
    }
}

pub(super) fn cluster<N: Neighbourhood>(engine: &mut Engine<'_>, leaves: &[NodeId], mut space: N) {
    let mut state = NearestState::with_capacity(2 * leaves.len());
    let mut alive: Vec<NodeId> = leaves.to_vec();

    for id in leaves {
        let object = engine.active(*id);
        space.insert(&object);
        state.store(object);
    }
    for id in leaves {
        state.refresh(engine, &space, *id);
    }

    let mut affected = Vec::new();
    let mut near = Vec::new();

    while !alive.is_empty() {
        let winner = alive
            .iter()
            .filter_map(|id| state.best[id.index()])
            .reduce(|best, candidate| if candidate.precedes(&best) { candidate } else { best });
        let Some(winner) = winner else {
            break;
        };

        let (removed, added) = match engine.apply(winner) {
            Outcome::Merged { removed, added } => (removed.to_vec(), Some(added)),
            Outcome::Beamed(id) | Outcome::Discarded(id) => (vec![id], None),
        };

        affected.clear();
        for id in &removed {
            if let Some(object) = state.objects[id.index()].take() {
                space.remove(&object);
                space.around(&object, &mut affected);
            }
            state.best[id.index()] = None;
        }
        alive.retain(|id| !removed.contains(id));

        let lost_partner = |candidate: Option<Candidate>| {
            candidate
                .and_then(|c| c.partner)
                .is_some_and(|partner| removed.contains(&partner))
        };

        if let Some(new_id) = added {
            let object = engine.active(new_id);
            space.insert(&object);
            state.store(object);
            alive.push(new_id);
            state.refresh(engine, &space, new_id);

            near.clear();
            space.around(&object, &mut near);
            for id in &near {
                if *id == new_id || lost_partner(state.best[id.index()]) {
                    continue;
                }
                let (Some(other), Some(current)) =
                    (state.objects[id.index()], state.best[id.index()])
                else {
                    continue;
                };
                let candidate = engine.pair(&other, &object);
                if candidate.precedes(&current) {
                    state.best[id.index()] = Some(candidate);
                }
            }
        }

        affected.sort_unstable();
        affected.dedup();
        for id in &affected {
            if lost_partner(state.best[id.index()]) {
                state.refresh(engine, &space, *id);
            }
        }
    }
}
