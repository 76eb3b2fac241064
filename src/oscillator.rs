//! The falling block and its left/right bounce.

/// Block the player is about to drop. `x` is its left edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingBlock {
    pub x: f64,
    pub width: f64,
    /// +1 moving right, -1 moving left.
    pub direction: f64,
    pub speed: f64,
}

impl FallingBlock {
    /// New block at the left wall, heading right.
    pub fn spawn(width: f64, speed: f64) -> Self {
        Self {
            x: 0.0,
            width,
            direction: 1.0,
            speed,
        }
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// One animation step: move by `speed * direction`, clamping and bouncing at
/// either wall.
pub fn advance(block: &mut FallingBlock, field_width: f64) {
    block.x += block.speed * block.direction;
    if block.x + block.width > field_width {
        block.x = field_width - block.width;
        block.direction = -1.0;
    } else if block.x < 0.0 {
        block.x = 0.0;
        block.direction = 1.0;
    }
}
