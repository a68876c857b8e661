//! Vertex output shared by the waveform and spectrum extractors
//!
//! A [`Path`] is a list of disconnected sub-paths; each sub-path is an
//! ordered polyline. Drawing layers stroke every sub-path independently.

use serde::{Deserialize, Serialize};

/// A vertex in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position
    pub x: f32,
    /// Vertical position
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Ordered polylines produced for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    sub_paths: Vec<Vec<Point>>,
}

impl Path {
    /// Create an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty path with room for `vertices` points in its first sub-path.
    pub fn with_capacity(vertices: usize) -> Self {
        Self {
            sub_paths: vec![Vec::with_capacity(vertices)],
        }
    }

    /// Begin a new disconnected sub-path at `point`.
    pub fn start_new_sub_path(&mut self, point: Point) {
        match self.sub_paths.last_mut() {
            Some(last) if last.is_empty() => last.push(point),
            _ => self.sub_paths.push(vec![point]),
        }
    }

    /// Connect `point` to the end of the current sub-path.
    ///
    /// Starts a sub-path if none is open.
    pub fn line_to(&mut self, point: Point) {
        match self.sub_paths.last_mut() {
            Some(last) => last.push(point),
            None => self.sub_paths.push(vec![point]),
        }
    }

    /// True if the path has no vertices.
    pub fn is_empty(&self) -> bool {
        self.sub_paths.iter().all(Vec::is_empty)
    }

    /// Non-empty sub-paths in emission order.
    pub fn sub_paths(&self) -> impl Iterator<Item = &[Point]> {
        self.sub_paths
            .iter()
            .filter(|s| !s.is_empty())
            .map(Vec::as_slice)
    }

    /// Number of non-empty sub-paths.
    pub fn sub_path_count(&self) -> usize {
        self.sub_paths().count()
    }

    /// Total number of vertices across all sub-paths.
    pub fn vertex_count(&self) -> usize {
        self.sub_paths.iter().map(Vec::len).sum()
    }

    /// All vertices in emission order, ignoring sub-path boundaries.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.sub_paths.iter().flatten()
    }
}
