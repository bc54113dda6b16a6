//! 64-bit spatial node keys.
//!
//! Layout, most significant bits first:
//!
//! ```text
//! | base_x:16 | base_z:16 | base_y:16 | depth:4 | sub_x:4 | sub_y:4 | sub_z:4 |
//! ```
//!
//! `base_*` address the root grid cell (two's complement), `sub_*` the position of the
//! node inside that root's octree at `depth`.

use serde::{Deserialize, Serialize};

/// Largest depth the depth field can carry.
pub const MAX_TREE_DEPTH: u8 = 8;

/// Deepest level whose sub coordinates still fit in four bits.
pub const MAX_ADDRESSABLE_DEPTH: u8 = 4;

/// Packed node address. See the module docs for the bit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Unpacked form of a [`NodeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeAddress {
    pub base_x: i16,
    pub base_z: i16,
    pub base_y: i16,
    pub depth: u8,
    pub sub_x: u8,
    pub sub_y: u8,
    pub sub_z: u8,
}

impl NodeId {
    pub fn encode(
        base_x: i16,
        base_z: i16,
        base_y: i16,
        depth: u8,
        sub_x: u8,
        sub_y: u8,
        sub_z: u8,
    ) -> Self {
        debug_assert!(depth <= MAX_TREE_DEPTH, "depth {depth} exceeds {MAX_TREE_DEPTH}");
        let limit = 1u16 << depth.min(MAX_ADDRESSABLE_DEPTH);
        debug_assert!(
            u16::from(sub_x) < limit && u16::from(sub_y) < limit && u16::from(sub_z) < limit,
            "sub coordinates ({sub_x}, {sub_y}, {sub_z}) out of range for depth {depth}"
        );

        Self(
            (u64::from(base_x as u16) << 48)
                | (u64::from(base_z as u16) << 32)
                | (u64::from(base_y as u16) << 16)
                | (u64::from(depth & 0x0F) << 12)
                | (u64::from(sub_x & 0x0F) << 8)
                | (u64::from(sub_y & 0x0F) << 4)
                | u64::from(sub_z & 0x0F),
        )
    }

    pub fn decode(self) -> NodeAddress {
        let v = self.0;
        NodeAddress {
            base_x: (v >> 48) as u16 as i16,
            base_z: (v >> 32) as u16 as i16,
            base_y: (v >> 16) as u16 as i16,
            depth: ((v >> 12) & 0x0F) as u8,
            sub_x: ((v >> 8) & 0x0F) as u8,
            sub_y: ((v >> 4) & 0x0F) as u8,
            sub_z: (v & 0x0F) as u8,
        }
    }

    /// Root-aligned node for grid cell `(x, y, z)`.
    pub fn root(x: i16, y: i16, z: i16) -> Self {
        Self::encode(x, z, y, 0, 0, 0, 0)
    }

    pub fn depth(self) -> u8 {
        ((self.0 >> 12) & 0x0F) as u8
    }

    pub fn is_root(self) -> bool {
        self.depth() == 0
    }

    /// Id of the root cell this node descends from.
    pub fn root_id(self) -> Self {
        Self(self.0 & !0xFFFF)
    }

    /// Child in `octant` (bit 2 = +X, bit 1 = +Y, bit 0 = +Z).
    pub fn child(self, octant: usize) -> Self {
        debug_assert!(octant < 8);
        let a = self.decode();
        debug_assert!(a.depth < MAX_ADDRESSABLE_DEPTH, "node {self} has no addressable children");
        let bit = |shift: usize| ((octant >> shift) & 1) as u8;
        Self::encode(
            a.base_x,
            a.base_z,
            a.base_y,
            a.depth + 1,
            a.sub_x * 2 + bit(2),
            a.sub_y * 2 + bit(1),
            a.sub_z * 2 + bit(0),
        )
    }

    pub fn parent(self) -> Option<Self> {
        let a = self.decode();
        if a.depth == 0 {
            return None;
        }
        Some(Self::encode(
            a.base_x,
            a.base_z,
            a.base_y,
            a.depth - 1,
            a.sub_x / 2,
            a.sub_y / 2,
            a.sub_z / 2,
        ))
    }

    /// Octant taken when descending from `level - 1` to `level` on the way to this node.
    pub fn octant_at(self, level: u8) -> usize {
        let a = self.decode();
        debug_assert!(level >= 1 && level <= a.depth);
        let shift = a.depth - level;
        let bit = |sub: u8| usize::from((sub >> shift) & 1);
        (bit(a.sub_x) << 2) | (bit(a.sub_y) << 1) | bit(a.sub_z)
    }
}

impl From<NodeAddress> for NodeId {
    fn from(a: NodeAddress) -> Self {
        Self::encode(a.base_x, a.base_z, a.base_y, a.depth, a.sub_x, a.sub_y, a.sub_z)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = std::num::ParseIntError;

    /// Accepts `0x`-prefixed hex or plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).map(Self),
            None => s.parse().map(Self),
        }
    }
}

impl std::fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cell({}, {}, {}) depth={} sub=({}, {}, {})",
            self.base_x, self.base_y, self.base_z, self.depth, self.sub_x, self.sub_y, self.sub_z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_extremes() {
        let cases = [
            NodeAddress::default(),
            NodeAddress {
                base_x: i16::MIN,
                base_z: i16::MAX,
                base_y: -1,
                depth: 4,
                sub_x: 15,
                sub_y: 0,
                sub_z: 9,
            },
            NodeAddress {
                base_x: -1,
                base_z: -1,
                base_y: i16::MIN,
                depth: MAX_TREE_DEPTH,
                sub_x: 15,
                sub_y: 15,
                sub_z: 15,
            },
        ];
        for a in cases {
            assert_eq!(NodeId::from(a).decode(), a);
        }
    }

    #[test]
    fn round_trip_sweep() {
        for base in [-300i16, -2, -1, 0, 1, 7, 12_000] {
            for depth in 0..=MAX_ADDRESSABLE_DEPTH {
                let max_sub = (1u8 << depth) - 1;
                let a = NodeAddress {
                    base_x: base,
                    base_z: base.wrapping_mul(3),
                    base_y: -base,
                    depth,
                    sub_x: max_sub,
                    sub_y: max_sub / 2,
                    sub_z: 0,
                };
                assert_eq!(NodeId::from(a).decode(), a, "{a}");
            }
        }
    }

    #[test]
    fn field_positions_match_layout() {
        let id = NodeId::encode(1, 2, 3, 4, 5, 6, 7);
        assert_eq!(id.0, 0x0001_0002_0003_4567);
        assert_eq!(NodeId::root(-1, 0, 0).0, 0xFFFF_0000_0000_0000);
    }

    #[test]
    fn children_and_parent_are_inverse() {
        let root = NodeId::root(-3, 1, 9);
        for octant in 0..8 {
            let child = root.child(octant);
            assert_eq!(child.depth(), 1);
            assert_eq!(child.parent(), Some(root));
            assert_eq!(child.root_id(), root);
            assert_eq!(child.octant_at(1), octant);

            let grandchild = child.child(7 - octant);
            assert_eq!(grandchild.parent(), Some(child));
            assert_eq!(grandchild.octant_at(1), octant);
            assert_eq!(grandchild.octant_at(2), 7 - octant);
        }
        assert_eq!(root.parent(), None);
        assert!(root.is_root());
    }

    #[test]
    fn octant_bits_select_axes() {
        let a = NodeId::root(0, 0, 0).child(0b100).decode();
        assert_eq!((a.sub_x, a.sub_y, a.sub_z), (1, 0, 0));
        let a = NodeId::root(0, 0, 0).child(0b011).decode();
        assert_eq!((a.sub_x, a.sub_y, a.sub_z), (0, 1, 1));
    }

    #[test]
    fn parse_hex_and_decimal() {
        let id = NodeId::encode(5, -2, 0, 1, 1, 0, 1);
        assert_eq!(id.to_string().parse::<NodeId>().unwrap(), id);
        assert_eq!(id.0.to_string().parse::<NodeId>().unwrap(), id);
        assert!("0xZZ".parse::<NodeId>().is_err());
    }
}
