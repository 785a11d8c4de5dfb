/////////////////////////////////////////////////////////////////////////////////////////////
//
// Wraps the `rstar` crate to build point R-trees for nearest-observation queries.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # rtree
//!
//! Wrapper module for the rstar crate.
//!
//! Bulk loads planar points tagged with their row index and answers
//! nearest-point queries.

use faer::MatRef;
use rstar::primitives::GeomWithData;
use rstar::RTree;

/// A point tagged with its row index in the source matrix.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// R-tree over `(easting, northing)` points.
#[derive(Debug)]
pub struct PointRTree {
    tree: RTree<IndexedPoint>,
}

impl PointRTree {
    /// Bulk loads the rows of an `N x 2` matrix.
    pub fn new(points: MatRef<f64>) -> Self {
        let items: Vec<IndexedPoint> = (0..points.nrows())
            .map(|i| GeomWithData::new([points[(i, 0)], points[(i, 1)]], i))
            .collect();

        PointRTree {
            tree: RTree::bulk_load(items),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Closest point to `target` as `(row index, euclidean distance)`.
    pub fn nearest(&self, target: [f64; 2]) -> Option<(usize, f64)> {
        self.tree.nearest_neighbor(&target).map(|item| {
            let p = item.geom();
            (item.data, (p[0] - target[0]).hypot(p[1] - target[1]))
        })
    }
}
