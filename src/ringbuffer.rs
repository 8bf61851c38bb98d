//! Ringbuffer module for rolling series windows.
//!
//! This module provides a fixed-size ringbuffer of `(timestamp, value)` points
//! with predictable memory usage. When full, the oldest point is overwritten.

use serde::Serialize;

/// Size of a single ringbuffer point in bytes.
pub const POINT_SIZE_BYTES: usize = 16;

/// One observation of a series.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: i64, // 8 bytes - Unix timestamp in milliseconds
    pub value: f64,     // 8 bytes
}

impl SeriesPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A circular buffer for storing series points with fixed capacity.
#[derive(Debug)]
pub struct Ringbuffer {
    points: Vec<SeriesPoint>,
    capacity: usize,
    write_index: usize,
    count: usize,
}

impl Ringbuffer {
    /// Creates a new ringbuffer with the specified capacity (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: vec![SeriesPoint::default(); capacity],
            capacity,
            write_index: 0,
            count: 0,
        }
    }

    /// Pushes a new point into the ringbuffer.
    ///
    /// If the buffer is full, the oldest point will be overwritten.
    pub fn push(&mut self, point: SeriesPoint) {
        self.points[self.write_index] = point;
        self.write_index = (self.write_index + 1) % self.capacity;

        if self.count < self.capacity {
            self.count += 1;
        }
    }

    /// Returns all points in chronological order (oldest to newest).
    pub fn points(&self) -> Vec<SeriesPoint> {
        if self.count == 0 {
            return Vec::new();
        }

        let mut result = Vec::with_capacity(self.count);

        if self.count < self.capacity {
            // Not yet full, points are in order from 0 to count-1
            result.extend_from_slice(&self.points[0..self.count]);
        } else {
            // Full: write_index is the oldest point
            result.extend_from_slice(&self.points[self.write_index..]);
            result.extend_from_slice(&self.points[0..self.write_index]);
        }

        result
    }

    /// Returns the most recently pushed point.
    pub fn latest(&self) -> Option<SeriesPoint> {
        if self.count == 0 {
            return None;
        }
        let index = (self.write_index + self.capacity - 1) % self.capacity;
        Some(self.points[index])
    }

    /// Returns the current number of points in the buffer.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns the maximum capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_size() {
        assert_eq!(std::mem::size_of::<SeriesPoint>(), POINT_SIZE_BYTES);
    }

    #[test]
    fn test_ringbuffer_push_and_read() {
        let mut rb = Ringbuffer::new(3);

        assert_eq!(rb.len(), 0);
        assert_eq!(rb.capacity(), 3);

        rb.push(SeriesPoint::new(1000, 1.5));

        assert_eq!(rb.len(), 1);
        let points = rb.points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, 1000);
        assert_eq!(rb.latest(), Some(SeriesPoint::new(1000, 1.5)));
    }

    #[test]
    fn test_ringbuffer_wraparound() {
        let mut rb = Ringbuffer::new(3);

        for i in 0..5 {
            rb.push(SeriesPoint::new(1000 + i * 100, i as f64));
        }

        // Only the last 3 points remain, oldest first
        let points = rb.points();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].timestamp, 1200);
        assert_eq!(points[1].timestamp, 1300);
        assert_eq!(points[2].timestamp, 1400);
        assert_eq!(rb.latest().map(|p| p.value), Some(4.0));
    }

    #[test]
    fn test_ringbuffer_empty() {
        let rb = Ringbuffer::new(10);
        assert!(rb.is_empty());
        assert!(rb.points().is_empty());
        assert!(rb.latest().is_none());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut rb = Ringbuffer::new(0);
        assert_eq!(rb.capacity(), 1);
        rb.push(SeriesPoint::new(1, 1.0));
        rb.push(SeriesPoint::new(2, 2.0));
        assert_eq!(rb.points(), vec![SeriesPoint::new(2, 2.0)]);
    }
}
