//! Seeded connected-graph generation

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

/// Generate a connected graph with `nodes` vertices and (up to) `edges`
/// undirected edges: a spanning tree over a shuffled permutation first,
/// then random non-duplicate extra edges. Edges are normalized `(u, v)`
/// with `u < v`. The attempt cap bounds the fill phase on dense requests;
/// the result is connected even if the edge target is not met.
pub fn generate(nodes: usize, edges: usize, rng: &mut ChaCha8Rng) -> Vec<(usize, usize)> {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut result: Vec<(usize, usize)> = Vec::with_capacity(edges);

    let mut order: Vec<usize> = (0..nodes).collect();
    order.shuffle(rng);

    // Spanning tree for connectivity
    for pair in order.windows(2) {
        let edge = normalize(pair[0], pair[1]);
        seen.insert(edge);
        result.push(edge);
    }

    // Random extra edges up to the requested count
    let mut attempts = 0;
    while result.len() < edges && attempts < edges * 10 {
        let u = rng.gen_range(0..nodes);
        let v = rng.gen_range(0..nodes);
        if u != v {
            let edge = normalize(u, v);
            if seen.insert(edge) {
                result.push(edge);
            }
        }
        attempts += 1;
    }

    result
}

/// Degree of every node given an edge list.
pub fn degrees(nodes: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut deg = vec![0usize; nodes];
    for &(u, v) in edges {
        deg[u] += 1;
        deg[v] += 1;
    }
    deg
}

fn normalize(u: usize, v: usize) -> (usize, usize) {
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn is_connected(nodes: usize, edges: &[(usize, usize)]) -> bool {
        let mut adjacency = vec![Vec::new(); nodes];
        for &(u, v) in edges {
            adjacency[u].push(v);
            adjacency[v].push(u);
        }
        let mut visited = vec![false; nodes];
        let mut stack = vec![0usize];
        visited[0] = true;
        while let Some(n) = stack.pop() {
            for &next in &adjacency[n] {
                if !visited[next] {
                    visited[next] = true;
                    stack.push(next);
                }
            }
        }
        visited.into_iter().all(|v| v)
    }

    #[test]
    fn generates_connected_graph_with_exact_edge_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let edges = generate(15, 22, &mut rng);
        assert_eq!(edges.len(), 22);
        assert!(is_connected(15, &edges));
    }

    #[test]
    fn no_duplicate_or_self_edges() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let edges = generate(50, 88, &mut rng);
        let unique: std::collections::HashSet<_> = edges.iter().collect();
        assert_eq!(unique.len(), edges.len());
        assert!(edges.iter().all(|&(u, v)| u < v));
    }

    #[test]
    fn same_seed_same_graph() {
        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(generate(30, 29, &mut a), generate(30, 29, &mut b));
    }
}
