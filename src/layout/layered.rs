//! Layered placement of sibling blocks: longest-path ranks, one barycenter
//! ordering sweep, then coordinate assignment (ranks flow top to bottom).

use std::collections::BTreeSet;

use super::sizing::{LayoutSpacing, Size};

/// A placed block, relative to the arrangement's origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Placement {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
}

/// Output of [`arrange`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arrangement {
    /// One placement per input block, in input order.
    pub placements: Vec<Placement>,
    /// Bounding box of all blocks.
    pub extent: Size,
}

/// Assigns ranks via longest-path layering over Kahn's order.
///
/// Sources get rank 0; each other block gets 1 + the max rank of its
/// predecessors. Blocks stuck in cycles are put one rank below the rest.
fn assign_ranks(n: usize, keys: &[&str], preds: &[Vec<usize>], succs: &[Vec<usize>]) -> Vec<usize> {
    let mut in_degree: Vec<usize> = preds.iter().map(Vec::len).collect();
    let mut queue: Vec<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    queue.sort_by(|a, b| keys[*a].cmp(keys[*b]));

    let mut ranks = vec![0usize; n];
    let mut visited = vec![false; n];
    let mut head = 0;
    while head < queue.len() {
        let u = queue[head];
        head += 1;
        visited[u] = true;
        for &v in &succs[u] {
            ranks[v] = ranks[v].max(ranks[u] + 1);
            in_degree[v] -= 1;
            if in_degree[v] == 0 {
                queue.push(v);
            }
        }
    }

    if visited.iter().any(|v| !v) {
        let max_rank = ranks.iter().copied().max().unwrap_or(0);
        for (v, rank) in ranks.iter_mut().enumerate() {
            if !visited[v] {
                *rank = max_rank + 1;
            }
        }
    }
    ranks
}

/// Mean position of `neighbors` in the previous rank, `None` without any.
#[allow(clippy::cast_precision_loss)]
fn barycenter(prev_pos: &[Option<usize>], neighbors: &[usize]) -> Option<f64> {
    let positions: Vec<usize> = neighbors.iter().filter_map(|&nb| prev_pos[nb]).collect();
    if positions.is_empty() {
        return None;
    }
    Some(positions.iter().sum::<usize>() as f64 / positions.len() as f64)
}

/// Places `sizes.len()` blocks given directed `edges` between them.
///
/// `keys` break ties so identical inputs always yield identical output.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn arrange(sizes: &[Size], keys: &[&str], edges: &[(usize, usize)], spacing: &LayoutSpacing) -> Arrangement {
    let n = sizes.len();
    if n == 0 {
        return Arrangement::default();
    }

    let unique: BTreeSet<(usize, usize)> =
        edges.iter().copied().filter(|&(u, v)| u != v && u < n && v < n).collect();
    let mut preds = vec![Vec::new(); n];
    let mut succs = vec![Vec::new(); n];
    for &(u, v) in &unique {
        succs[u].push(v);
        preds[v].push(u);
    }

    let ranks = assign_ranks(n, keys, &preds, &succs);
    let rank_count = ranks.iter().copied().max().unwrap_or(0) + 1;
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); rank_count];
    for (v, &r) in ranks.iter().enumerate() {
        buckets[r].push(v);
    }
    for bucket in &mut buckets {
        bucket.sort_by(|a, b| keys[*a].cmp(keys[*b]));
    }

    let mut pos: Vec<Option<usize>> = vec![None; n];
    for (r, bucket) in buckets.iter_mut().enumerate() {
        if r > 0 {
            let mut scored: Vec<(usize, Option<f64>)> =
                bucket.iter().map(|&v| (v, barycenter(&pos, &preds[v]))).collect();
            scored.sort_by(|(a, ba), (b, bb)| {
                let ka = ba.unwrap_or(f64::MAX);
                let kb = bb.unwrap_or(f64::MAX);
                ka.total_cmp(&kb).then_with(|| keys[*a].cmp(keys[*b]))
            });
            *bucket = scored.into_iter().map(|(v, _)| v).collect();
        }
        for (i, &v) in bucket.iter().enumerate() {
            pos[v] = Some(i);
        }
    }

    let rank_widths: Vec<f64> = buckets
        .iter()
        .map(|bucket| {
            let total: f64 = bucket.iter().map(|&v| sizes[v].width).sum();
            total + spacing.node_gap * bucket.len().saturating_sub(1) as f64
        })
        .collect();
    let widest = rank_widths.iter().copied().fold(0.0_f64, f64::max);

    let mut placements = vec![Placement::default(); n];
    let mut y = 0.0;
    for (bucket, width) in buckets.iter().zip(&rank_widths) {
        let mut x = (widest - width) / 2.0;
        let mut tallest = 0.0_f64;
        for &v in bucket {
            placements[v] = Placement { x, y };
            x += sizes[v].width + spacing.node_gap;
            tallest = tallest.max(sizes[v].height);
        }
        y += tallest + spacing.rank_gap;
    }
    let height = (y - spacing.rank_gap).max(0.0);

    Arrangement { placements, extent: Size::new(widest, height) }
}
