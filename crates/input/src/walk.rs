use glam::Vec3;

/// World units moved per nominal frame while a walk key is held.
pub const WALK_SPEED: f32 = 0.1;

/// Held state of the four walk keys packed into a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalkKeys(u8);

impl WalkKeys {
    pub const FORWARD: u8 = 1; // W
    pub const LEFT: u8 = 2; // A
    pub const BACK: u8 = 4; // S
    pub const RIGHT: u8 = 8; // D

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    pub fn from_held(forward: bool, left: bool, back: bool, right: bool) -> Self {
        let mut bits = 0;
        if forward {
            bits |= Self::FORWARD;
        }
        if left {
            bits |= Self::LEFT;
        }
        if back {
            bits |= Self::BACK;
        }
        if right {
            bits |= Self::RIGHT;
        }
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Heading offset in degrees, relative to yaw, for each key combination.
/// `None` means the combination cancels out.
#[rustfmt::skip]
const WALK_OFFSETS: [Option<f32>; 16] = [
    None,           //  0: nothing held
    Some(0.0),      //  1: W
    Some(90.0),     //  2: A
    Some(45.0),     //  3: W+A
    Some(180.0),    //  4: S
    None,           //  5: W+S
    Some(135.0),    //  6: A+S
    Some(90.0),     //  7: W+A+S
    Some(270.0),    //  8: D
    Some(315.0),    //  9: W+D
    None,           // 10: A+D
    Some(0.0),      // 11: W+A+D
    Some(225.0),    // 12: S+D
    Some(270.0),    // 13: W+S+D
    Some(180.0),    // 14: A+S+D
    None,           // 15: all four
];

/// Heading offset for a key combination, or `None` when it produces no
/// movement.
pub fn walk_offset(keys: WalkKeys) -> Option<f32> {
    WALK_OFFSETS[keys.bits() as usize]
}

/// Horizontal displacement for one frame, or `None` when nothing should move.
///
/// `yaw` is the camera yaw in degrees and `rate` the frame-time
/// normalization factor.
pub fn walk_delta(keys: WalkKeys, yaw: f32, rate: f32) -> Option<Vec3> {
    let offset = walk_offset(keys)?;
    let heading = (yaw + offset).to_radians();
    let (sin, cos) = heading.sin_cos();
    Some(WALK_SPEED * rate * Vec3::new(cos, sin, 0.0))
}
