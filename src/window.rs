//! Evaluation window: the stream points seen since the last cycle.

use std::collections::VecDeque;

/// A stream point annotated with its arrival index.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowPoint {
    /// Zero-based position of the point in the stream.
    pub index: u64,
    pub values: Vec<f64>,
}

impl WindowPoint {
    pub fn new(index: u64, values: Vec<f64>) -> Self {
        Self { index, values }
    }
}

/// Bounded buffer of the most recent points, oldest first.
///
/// The optimizer clears it once per cycle, after scoring, so under normal use it
/// never reaches its cap. Pushing into a full window evicts the oldest point.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Window {
    cap: usize,
    buf: VecDeque<WindowPoint>,
}

impl Window {
    /// Create an empty window with capacity `cap` (minimum 1).
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            cap,
            buf: VecDeque::with_capacity(cap.min(4096)),
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.cap
    }

    /// Iterate over points, oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &WindowPoint> + '_ {
        self.buf.iter()
    }

    /// Append a point, evicting the oldest if at capacity.
    pub fn push(&mut self, point: WindowPoint) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(point);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
