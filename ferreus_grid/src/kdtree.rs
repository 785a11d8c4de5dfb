/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides a planar KD-tree for duplicate grouping and nearest-point queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::MatRef;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceMetric {
    Euclidean,
    InfinityNorm,
}

impl DistanceMetric {
    #[inline]
    fn distance(self, p: &[f64; 2], q: &[f64; 2]) -> f64 {
        let de = (p[0] - q[0]).abs();
        let dn = (p[1] - q[1]).abs();
        match self {
            DistanceMetric::Euclidean => de.hypot(dn),
            DistanceMetric::InfinityNorm => de.max(dn),
        }
    }
}

/// A node in the KDTree
#[derive(Debug)]
struct Node {
    point: [f64; 2],
    id: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// KD-tree over `(easting, northing)` points, stored as a flat node vector.
#[derive(Debug)]
pub struct KDTree {
    nodes: Vec<Node>,
}

impl KDTree {
    /// Builds a tree over the rows of an `N x 2` matrix. Ids are row indices.
    pub fn new(points: MatRef<f64>) -> Self {
        let mut entries: Vec<([f64; 2], usize)> = (0..points.nrows())
            .map(|i| ([points[(i, 0)], points[(i, 1)]], i))
            .collect();

        let mut tree = KDTree {
            nodes: Vec::with_capacity(entries.len()),
        };
        tree.build_tree(&mut entries, 0);
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recursively builds the tree, splitting on the median of alternating axes.
    fn build_tree(&mut self, entries: &mut [([f64; 2], usize)], depth: usize) -> Option<usize> {
        if entries.is_empty() {
            return None;
        }

        let axis = depth % 2;
        entries.sort_by(|a, b| a.0[axis].partial_cmp(&b.0[axis]).unwrap_or(Ordering::Equal));

        let mid = entries.len() / 2;
        let node_index = self.nodes.len();
        self.nodes.push(Node {
            point: entries[mid].0,
            id: entries[mid].1,
            left: None,
            right: None,
        });

        let (lower, upper) = entries.split_at_mut(mid);
        self.nodes[node_index].left = self.build_tree(lower, depth + 1);
        self.nodes[node_index].right = self.build_tree(&mut upper[1..], depth + 1);

        Some(node_index)
    }

    /// Ids of every point within `radius` of `target` (inclusive).
    pub fn radius_search(&self, target: [f64; 2], radius: f64, metric: DistanceMetric) -> Vec<usize> {
        let mut result = Vec::new();
        if !self.nodes.is_empty() {
            self.radius_search_impl(0, &target, radius, 0, metric, &mut result);
        }
        result
    }

    fn radius_search_impl(
        &self,
        node_index: usize,
        target: &[f64; 2],
        radius: f64,
        depth: usize,
        metric: DistanceMetric,
        result: &mut Vec<usize>,
    ) {
        let node = &self.nodes[node_index];

        if metric.distance(target, &node.point) <= radius {
            result.push(node.id);
        }

        let axis = depth % 2;
        let diff = target[axis] - node.point[axis];

        // Both metrics bound the per-axis offset by the distance.
        if diff <= radius {
            if let Some(left) = node.left {
                self.radius_search_impl(left, target, radius, depth + 1, metric, result);
            }
        }
        if diff >= -radius {
            if let Some(right) = node.right {
                self.radius_search_impl(right, target, radius, depth + 1, metric, result);
            }
        }
    }

    /// Closest point to `target` as `(id, distance)`.
    pub fn nearest(&self, target: [f64; 2], metric: DistanceMetric) -> Option<(usize, f64)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best = (usize::MAX, f64::INFINITY);
        self.nearest_impl(0, &target, 0, metric, &mut best);
        Some(best)
    }

    fn nearest_impl(
        &self,
        node_index: usize,
        target: &[f64; 2],
        depth: usize,
        metric: DistanceMetric,
        best: &mut (usize, f64),
    ) {
        let node = &self.nodes[node_index];
        let dist = metric.distance(target, &node.point);
        if dist < best.1 {
            *best = (node.id, dist);
        }

        let axis = depth % 2;
        let diff = target[axis] - node.point[axis];

        let (near, far) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            self.nearest_impl(near, target, depth + 1, metric, best);
        }
        if let Some(far) = far {
            if diff.abs() <= best.1 {
                self.nearest_impl(far, target, depth + 1, metric, best);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Mat::from_fn(n, 2, |_, _| rng.random_range(0.0..1.0))
    }

    fn brute_force_radius_ids(
        points: &Mat<f64>,
        target: [f64; 2],
        radius: f64,
        metric: DistanceMetric,
    ) -> Vec<usize> {
        (0..points.nrows())
            .filter(|&i| metric.distance(&[points[(i, 0)], points[(i, 1)]], &target) <= radius)
            .collect()
    }

    #[test]
    fn radius_search_matches_bruteforce() {
        for metric in [DistanceMetric::Euclidean, DistanceMetric::InfinityNorm] {
            let points = random_points(300, 123);
            let tree = KDTree::new(points.as_ref());
            let mut rng = StdRng::seed_from_u64(7);

            for _ in 0..25 {
                let q = [rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)];
                let r = rng.random_range(0.0..0.3);

                let mut kd_ids = tree.radius_search(q, r, metric);
                kd_ids.sort_unstable();
                assert_eq!(kd_ids, brute_force_radius_ids(&points, q, r, metric));
            }
        }
    }

    #[test]
    fn radius_zero_finds_exact_duplicates() {
        let points = faer::mat![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0], [0.5, 0.0f64]];
        let tree = KDTree::new(points.as_ref());

        let mut ids = tree.radius_search([0.0, 0.0], 0.0, DistanceMetric::InfinityNorm);
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn nearest_matches_bruteforce() {
        let points = random_points(500, 99);
        let tree = KDTree::new(points.as_ref());
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            let q = [rng.random_range(-0.5..1.5), rng.random_range(-0.5..1.5)];
            let (_, dist) = tree.nearest(q, DistanceMetric::Euclidean).unwrap();

            let expected = (0..points.nrows())
                .map(|i| DistanceMetric::Euclidean.distance(&[points[(i, 0)], points[(i, 1)]], &q))
                .fold(f64::INFINITY, f64::min);
            assert_eq!(dist, expected);
        }
    }

    #[test]
    fn empty_tree() {
        let tree = KDTree::new(Mat::<f64>::zeros(0, 2).as_ref());
        assert!(tree.is_empty());
        assert!(tree.nearest([0.0, 0.0], DistanceMetric::Euclidean).is_none());
    }
}
