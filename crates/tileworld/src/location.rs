use crate::tile::TilePos;

/// Scalar index for the event registry.
///
/// Packs both 32-bit coordinates into one 64-bit word, so every representable
/// tile maps to a distinct key regardless of map extent or sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocationKey(u64);

impl LocationKey {
    pub fn get_key(x: i32, y: i32) -> Self {
        Self(((x as u32 as u64) << 32) | (y as u32 as u64))
    }

    pub fn of(pos: TilePos) -> Self {
        Self::get_key(pos.x, pos.y)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn position(self) -> TilePos {
        TilePos {
            x: (self.0 >> 32) as u32 as i32,
            y: self.0 as u32 as i32,
        }
    }
}
