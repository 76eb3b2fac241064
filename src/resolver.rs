//! Drop resolution: tolerant overlap test against the stack top, then clip the
//! landed block to the part that actually rests on it.

use crate::config::GameConfig;
use crate::stack::{Segment, Stack};

/// Where a block landed and how the renderer should draw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landing {
    /// Segment appended to the stack (clipped width and center).
    pub segment: Segment,
    /// Width of the stack top the block landed on.
    pub base_width: f64,
    /// Unclipped footprint of the dropped block: `[falling_left, falling_left + falling_width]`.
    pub falling_left: f64,
    pub falling_width: f64,
    /// Part of the footprint cut off on the left / right.
    pub left_inset: f64,
    pub right_inset: f64,
    /// Bottom of the new segment, measured from the field floor.
    pub bottom_offset: f64,
    pub is_perfect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropOutcome {
    Landed(Landing),
    /// No usable overlap. `overlap` is the tolerant overlap (may be positive
    /// when only the margin touched the base).
    Missed { overlap: f64 },
}

impl DropOutcome {
    pub fn landing(&self) -> Option<&Landing> {
        match self {
            Self::Landed(landing) => Some(landing),
            Self::Missed { .. } => None,
        }
    }
}

/// Compute the outcome of dropping `[falling_left, falling_left + falling_width]`
/// onto `stack` without touching it.
pub fn evaluate(stack: &Stack, falling_left: f64, falling_width: f64, config: &GameConfig) -> DropOutcome {
    let top = stack.top();
    let base_width = top.width;
    let (base_left, base_right) = (top.left(), top.right());
    let falling_right = falling_left + falling_width;

    // The margin widens the falling block only.
    let margin = config.margin_for(base_width);
    let expanded_left = falling_left - margin;
    let expanded_right = falling_right + margin;
    let overlap = expanded_right.min(base_right) - expanded_left.max(base_left);
    if overlap <= 0.0 {
        return DropOutcome::Missed { overlap };
    }

    let new_left = falling_left.max(base_left);
    let new_right = falling_right.min(base_right);
    let new_width = new_right - new_left;
    // Inside the margin but not on the base: nothing to stand on.
    if new_width <= 0.0 {
        return DropOutcome::Missed { overlap };
    }

    let is_perfect = (new_width - base_width).abs() < config.perfect_tolerance;
    let stacked_before = stack.stacked_count() as f64;
    DropOutcome::Landed(Landing {
        segment: Segment::stacked(new_width, new_left + new_width / 2.0, is_perfect),
        base_width,
        falling_left,
        falling_width,
        left_inset: (new_left - falling_left).max(0.0),
        right_inset: (falling_right - new_right).max(0.0),
        bottom_offset: config.plate_height + stacked_before * config.segment_height,
        is_perfect,
    })
}

/// Evaluate a drop and append the clipped segment on success.
pub fn resolve(stack: &mut Stack, falling_left: f64, falling_width: f64, config: &GameConfig) -> DropOutcome {
    let outcome = evaluate(stack, falling_left, falling_width, config);
    if let DropOutcome::Landed(landing) = outcome {
        stack.push(landing.segment);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plate_stack() -> (Stack, GameConfig) {
        let config = GameConfig::default();
        (Stack::new(config.plate_width, config.field_width / 2.0), config)
    }

    #[test]
    fn test_exact_alignment_is_perfect() {
        let (mut stack, config) = plate_stack();
        let outcome = resolve(&mut stack, 125.0, 150.0, &config);
        let landing = outcome.landing().copied().unwrap();
        assert_eq!(landing.segment.width, 150.0);
        assert_eq!(landing.segment.center_x, 200.0);
        assert!(landing.is_perfect);
        assert_eq!(landing.left_inset, 0.0);
        assert_eq!(landing.right_inset, 0.0);
        assert_eq!(stack.stacked_count(), 1);
    }

    #[test]
    fn test_plate_sized_block_at_left_edge_of_plate_sized_field() {
        // A field exactly as wide as the plate: x=0 sits right on it.
        let config = GameConfig {
            field_width: 150.0,
            ..GameConfig::default()
        };
        let mut stack = Stack::new(150.0, 75.0);
        let outcome = resolve(&mut stack, 0.0, 150.0, &config);
        let landing = outcome.landing().copied().unwrap();
        assert_eq!(landing.segment.width, 150.0);
        assert!(landing.is_perfect);
    }

    #[test]
    fn test_far_right_drop_misses() {
        let (mut stack, config) = plate_stack();
        let outcome = resolve(&mut stack, 340.0, 150.0, &config);
        assert_eq!(outcome, DropOutcome::Missed { overlap: -56.0 });
        assert_eq!(stack.stacked_count(), 0);
    }

    #[test]
    fn test_partial_overlap_clips_and_reports_insets() {
        let (mut stack, config) = plate_stack();
        // Falling [175, 325] on plate [125, 275].
        let outcome = resolve(&mut stack, 175.0, 150.0, &config);
        let landing = outcome.landing().copied().unwrap();
        assert_eq!(landing.segment.width, 100.0);
        assert_eq!(landing.segment.center_x, 225.0);
        assert_eq!(landing.left_inset, 0.0);
        assert_eq!(landing.right_inset, 50.0);
        assert!(!landing.is_perfect);
        assert_eq!(landing.bottom_offset, config.plate_height);
        assert_eq!(stack.top().width, 100.0);
    }

    #[test]
    fn test_bottom_offset_grows_with_stack() {
        let (mut stack, config) = plate_stack();
        resolve(&mut stack, 125.0, 150.0, &config);
        resolve(&mut stack, 125.0, 150.0, &config);
        let outcome = evaluate(&stack, 125.0, 150.0, &config);
        let landing = outcome.landing().copied().unwrap();
        assert_eq!(landing.bottom_offset, config.plate_height + 2.0 * config.segment_height);
    }

    #[test]
    fn test_near_miss_inside_margin_is_a_miss() {
        let (mut stack, config) = plate_stack();
        // Right edge 5 units short of the plate: margin 9 touches, block does not.
        let outcome = resolve(&mut stack, -30.0, 150.0, &config);
        match outcome {
            DropOutcome::Missed { overlap } => assert!(overlap > 0.0),
            DropOutcome::Landed(_) => panic!("block does not rest on the plate"),
        }
        assert_eq!(stack.stacked_count(), 0);
    }

    #[test]
    fn test_one_unit_short_is_still_perfect() {
        let (mut stack, config) = plate_stack();
        let landing = *resolve(&mut stack, 126.0, 150.0, &config).landing().unwrap();
        assert_eq!(landing.segment.width, 149.0);
        assert!(landing.is_perfect);
        assert_eq!(landing.left_inset, 0.0);
        assert_eq!(landing.right_inset, 1.0);
    }

    proptest! {
        #[test]
        fn prop_disjoint_beyond_margin_misses(
            base_width in 10.0f64..400.0,
            width in 1.0f64..400.0,
            gap in 0.01f64..200.0,
            to_the_right in any::<bool>(),
        ) {
            let config = GameConfig::default();
            let stack = Stack::new(base_width, 0.0);
            let margin = config.margin_for(base_width);
            let left = if to_the_right {
                base_width / 2.0 + margin + gap
            } else {
                -base_width / 2.0 - margin - gap - width
            };
            let outcome = evaluate(&stack, left, width, &config);
            prop_assert!(
                matches!(outcome, DropOutcome::Missed { .. }),
                "expected a miss, got {:?}",
                outcome
            );
        }

        #[test]
        fn prop_landing_width_is_strict_intersection(
            base_width in 10.0f64..400.0,
            base_center in 0.0f64..400.0,
            left in -100.0f64..500.0,
            width in 1.0f64..400.0,
        ) {
            let config = GameConfig::default();
            let stack = Stack::new(base_width, base_center);
            if let DropOutcome::Landed(landing) = evaluate(&stack, left, width, &config) {
                let base = stack.top();
                let expected = (left + width).min(base.right()) - left.max(base.left());
                prop_assert!((landing.segment.width - expected).abs() < 1e-9);
                prop_assert!(landing.segment.width > 0.0);
                prop_assert_eq!(
                    landing.is_perfect,
                    (landing.segment.width - base_width).abs() < config.perfect_tolerance
                );
                let covered = landing.left_inset + landing.segment.width + landing.right_inset;
                prop_assert!((covered - width).abs() < 1e-9);
            }
        }
    }
}
