//! Projectile collision detection
//!
//! Everything is a sphere test on center distance. Each player projectile
//! registers at most one hit per frame: the first target in store order that
//! it overlaps. [`TargetGrid`] is a broad phase over the arena floor that
//! returns exactly the same hits as the pairwise scan.

use glam::Vec3;

use super::state::{Broadphase, Owner, Projectile, Target};
use crate::consts::*;

/// A player projectile overlapping a target, as indices into the stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetHit {
    pub projectile: usize,
    pub target: usize,
}

/// Whether two points are strictly closer than `radius`
#[inline]
pub fn within(a: Vec3, b: Vec3, radius: f32) -> bool {
    a.distance_squared(b) < radius * radius
}

/// Uniform grid bucketing targets by arena cell
#[derive(Debug, Clone)]
pub struct TargetGrid {
    cell: f32,
    cols: usize,
    /// Largest target radius; bounds how far a query has to look
    reach: f32,
    buckets: Vec<Vec<usize>>,
}

impl TargetGrid {
    /// Default cell edge, a few hit radii wide
    pub const CELL_SIZE: f32 = 7.0;

    pub fn build(targets: &[Target]) -> Self {
        Self::with_cell_size(targets, Self::CELL_SIZE)
    }

    pub fn with_cell_size(targets: &[Target], cell: f32) -> Self {
        let cols = ((2.0 * ARENA_HALF_EXTENT) / cell).ceil() as usize + 1;
        let mut grid = Self {
            cell,
            cols,
            reach: 0.0,
            buckets: vec![Vec::new(); cols * cols],
        };
        for (index, target) in targets.iter().enumerate() {
            let (cx, cz) = (grid.column(target.pos.x), grid.column(target.pos.z));
            grid.buckets[cz * cols + cx].push(index);
            grid.reach = grid.reach.max(target.radius);
        }
        grid
    }

    fn column(&self, v: f32) -> usize {
        let c = ((v + ARENA_HALF_EXTENT) / self.cell).floor();
        (c.max(0.0) as usize).min(self.cols - 1)
    }

    /// Indices of targets that could be within reach of `pos`, ascending
    pub fn candidates(&self, pos: Vec3, out: &mut Vec<usize>) {
        out.clear();
        let (x0, x1) = (self.column(pos.x - self.reach), self.column(pos.x + self.reach));
        let (z0, z1) = (self.column(pos.z - self.reach), self.column(pos.z + self.reach));
        for cz in z0..=z1 {
            for cx in x0..=x1 {
                out.extend_from_slice(&self.buckets[cz * self.cols + cx]);
            }
        }
        out.sort_unstable();
    }
}

/// First live target that `pos` overlaps, in store order
fn first_overlap(
    pos: Vec3,
    targets: &[Target],
    live: &[bool],
    order: impl Iterator<Item = usize>,
) -> Option<usize> {
    order
        .filter(|&i| live[i])
        .find(|&i| within(pos, targets[i].pos, targets[i].radius))
}

/// Pair player projectiles with the targets they hit this frame.
///
/// Projectiles are visited in store order; a target claimed by an earlier
/// projectile is no longer available to later ones.
pub fn player_fire_hits(
    projectiles: &[Projectile],
    targets: &[Target],
    broadphase: Broadphase,
) -> Vec<TargetHit> {
    let mut live = vec![true; targets.len()];
    let mut hits = Vec::new();
    if targets.is_empty() {
        return hits;
    }

    let grid = match broadphase {
        Broadphase::Pairwise => None,
        Broadphase::Grid => Some(TargetGrid::build(targets)),
    };
    let mut scratch = Vec::new();

    for (pi, projectile) in projectiles.iter().enumerate() {
        if projectile.owner != Owner::Player {
            continue;
        }
        let found = match &grid {
            None => first_overlap(projectile.pos, targets, &live, 0..targets.len()),
            Some(grid) => {
                grid.candidates(projectile.pos, &mut scratch);
                first_overlap(projectile.pos, targets, &live, scratch.iter().copied())
            }
        };
        if let Some(ti) = found {
            live[ti] = false;
            hits.push(TargetHit {
                projectile: pi,
                target: ti,
            });
        }
    }
    hits
}

/// Indices of enemy projectiles touching the player
pub fn enemy_fire_hits(projectiles: &[Projectile], player_pos: Vec3) -> Vec<usize> {
    projectiles
        .iter()
        .enumerate()
        .filter(|(_, p)| p.owner == Owner::Enemy && within(p.pos, player_pos, PLAYER_HIT_RADIUS))
        .map(|(i, _)| i)
        .collect()
}
