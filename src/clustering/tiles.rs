//! Rapidity-azimuth tile grid
//!
//! Tiles are at least R wide in both directions, so any two objects closer
//! than R sit in the same or adjacent tiles. Azimuth wraps around; rapidity
//! is clamped to the range spanned by the inputs (recombined objects always
//! lie inside it).

use super::nearest::Neighbourhood;
use super::ActiveObject;
use crate::history::NodeId;
use std::f64::consts::TAU;

const MAX_TILES_PER_AXIS: usize = 1000;

#[derive(Debug)]
pub(super) struct TileGrid {
    rapidity_min: f64,
    rapidity_width: f64,
    n_rapidity: usize,
    phi_width: f64,
    n_phi: usize,
    tiles: Vec<Vec<NodeId>>,
}

impl TileGrid {
    pub fn new(objects: &[ActiveObject], radius: f64) -> Self {
        let (rapidity_min, rapidity_max) = objects.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), object| (lo.min(object.rapidity), hi.max(object.rapidity)),
        );
        let (rapidity_min, span) = if objects.is_empty() {
            (0.0, 0.0)
        } else {
            (rapidity_min, rapidity_max - rapidity_min)
        };

        let n_rapidity = tile_count(span, radius);
        let n_phi = tile_count(TAU, radius);

        Self {
            rapidity_min,
            rapidity_width: span / n_rapidity as f64,
            n_rapidity,
            phi_width: TAU / n_phi as f64,
            n_phi,
            tiles: vec![Vec::new(); n_rapidity * n_phi],
        }
    }

    fn tile_of(&self, object: &ActiveObject) -> (usize, usize) {
        let iy = if self.rapidity_width > 0.0 {
            ((object.rapidity - self.rapidity_min) / self.rapidity_width)
                .floor()
                .clamp(0.0, (self.n_rapidity - 1) as f64) as usize
        } else {
            0
        };
        let iphi = (object.phi / self.phi_width)
            .floor()
            .clamp(0.0, (self.n_phi - 1) as f64) as usize;
        (iy, iphi)
    }

    fn index(&self, iy: usize, iphi: usize) -> usize {
        iy * self.n_phi + iphi
    }

    fn neighbour_columns(&self, iphi: usize) -> Vec<usize> {
        let mut columns = vec![
            (iphi + self.n_phi - 1) % self.n_phi,
            iphi,
            (iphi + 1) % self.n_phi,
        ];
        columns.sort_unstable();
        columns.dedup();
        columns
    }
}

/// Number of tiles along an axis such that each tile is at least `radius` wide
fn tile_count(span: f64, radius: f64) -> usize {
    let mut n = ((span / radius).floor() as usize).clamp(1, MAX_TILES_PER_AXIS);
    while n > 1 && span / (n as f64) < radius {
        n -= 1;
    }
    n
}

impl Neighbourhood for TileGrid {
    fn insert(&mut self, object: &ActiveObject) {
        let (iy, iphi) = self.tile_of(object);
        let index = self.index(iy, iphi);
        self.tiles[index].push(object.id);
    }

    fn remove(&mut self, object: &ActiveObject) {
        let (iy, iphi) = self.tile_of(object);
        let index = self.index(iy, iphi);
        self.tiles[index].retain(|id| *id != object.id);
    }

    fn around(&self, object: &ActiveObject, out: &mut Vec<NodeId>) {
        let (iy, iphi) = self.tile_of(object);
        let rows = iy.saturating_sub(1)..=(iy + 1).min(self.n_rapidity - 1);
        let columns = self.neighbour_columns(iphi);
        for row in rows {
            for column in &columns {
                out.extend_from_slice(&self.tiles[self.index(row, *column)]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: usize, rapidity: f64, phi: f64) -> ActiveObject {
        ActiveObject {
            id: NodeId(id),
            rapidity,
            phi,
            factor: 1.0,
        }
    }

    #[test]
    fn test_tiles_at_least_radius_wide() {
        let objects = [object(0, -2.0, 0.0), object(1, 2.0, 3.0)];
        let grid = TileGrid::new(&objects, 0.5);
        assert!(grid.rapidity_width >= 0.5);
        assert!(grid.phi_width >= 0.5);
        assert_eq!(grid.n_rapidity, 8);
        assert_eq!(grid.n_phi, 12);
    }

    #[test]
    fn test_azimuth_wraps() {
        let a = object(0, 0.0, 0.05);
        let b = object(1, 0.0, TAU - 0.05);
        let mut grid = TileGrid::new(&[a, b], 0.4);
        grid.insert(&a);
        grid.insert(&b);

        let mut found = Vec::new();
        grid.around(&a, &mut found);
        assert!(found.contains(&NodeId(1)));
    }

    #[test]
    fn test_far_objects_not_neighbours() {
        let a = object(0, -2.0, 0.0);
        let b = object(1, 2.0, 3.0);
        let mut grid = TileGrid::new(&[a, b], 0.4);
        grid.insert(&a);
        grid.insert(&b);

        let mut found = Vec::new();
        grid.around(&a, &mut found);
        assert_eq!(found, vec![NodeId(0)]);

        grid.remove(&a);
        found.clear();
        grid.around(&a, &mut found);
        assert!(found.is_empty());
    }
}
