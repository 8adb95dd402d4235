//! Clock hand for second-chance replacement.

use crate::common::FrameId;

/// A cursor that sweeps the frames of a pool in a circle.
///
/// The hand is part of the manager's state and keeps its position between
/// allocations, so each sweep resumes where the last one stopped.
#[derive(Debug, Clone)]
pub struct ClockHand {
    hand: usize,
    size: usize,
}

impl ClockHand {
    /// Create a hand over `size` frames, parked on the last frame so that
    /// the first advance lands on frame 0.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "clock needs at least one frame");
        Self {
            hand: size - 1,
            size,
        }
    }

    /// Move to the next frame and return it.
    #[inline]
    pub fn advance(&mut self) -> FrameId {
        self.hand = (self.hand + 1) % self.size;
        FrameId::new(self.hand)
    }

    /// The frame the hand currently points at.
    #[inline]
    pub fn current(&self) -> FrameId {
        FrameId::new(self.hand)
    }
}
