//! Stack model: the plate plus every block that landed on it.

/// One horizontal slab. Index 0 of a [`Stack`] is the plate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub width: f64,
    pub center_x: f64,
    pub is_base: bool,
    /// Perfect landing (drawn highlighted).
    pub perfect: bool,
}

impl Segment {
    pub fn base(width: f64, center_x: f64) -> Self {
        Self {
            width,
            center_x,
            is_base: true,
            perfect: false,
        }
    }

    pub fn stacked(width: f64, center_x: f64, perfect: bool) -> Self {
        Self {
            width,
            center_x,
            is_base: false,
            perfect,
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.center_x - self.width / 2.0
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.center_x + self.width / 2.0
    }
}

/// Ordered segments, bottom first. Never empty: the plate is always present.
#[derive(Debug, Clone)]
pub struct Stack {
    segments: Vec<Segment>,
}

impl Stack {
    pub fn new(plate_width: f64, center_x: f64) -> Self {
        Self {
            segments: vec![Segment::base(plate_width, center_x)],
        }
    }

    /// Current alignment target.
    pub fn top(&self) -> &Segment {
        // Non-empty by construction; `push` is the only mutator.
        &self.segments[self.segments.len() - 1]
    }

    pub fn push(&mut self, segment: Segment) {
        debug_assert!(!segment.is_base, "only the plate is a base segment");
        self.segments.push(segment);
    }

    /// Stacked blocks, plate excluded. This is the player's score.
    #[inline]
    pub fn stacked_count(&self) -> usize {
        self.segments.len() - 1
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stack_has_only_plate() {
        let stack = Stack::new(150.0, 200.0);
        assert_eq!(stack.segments().len(), 1);
        assert_eq!(stack.stacked_count(), 0);
        assert!(stack.top().is_base);
        assert_eq!(stack.top().left(), 125.0);
        assert_eq!(stack.top().right(), 275.0);
    }

    #[test]
    fn test_push_moves_top() {
        let mut stack = Stack::new(150.0, 200.0);
        stack.push(Segment::stacked(100.0, 180.0, false));
        assert_eq!(stack.stacked_count(), 1);
        assert_eq!(stack.top().width, 100.0);
        assert!(!stack.top().is_base);
        assert!(stack.segments()[0].is_base);
    }
}
