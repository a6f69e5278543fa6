use num_traits::{One, PrimInt};

use crate::{Vec3, constants::SIDE_NORMAL_Y};

/// A single named bit inside a [`BitmaskFlags`] container.
///
/// The enum discriminant (via `#[repr(u8)]`) is the bit index; the associated `Storage`
/// picks the backing integer.
pub trait FlagBitmask {
    type Storage: PrimInt;

    fn bit_index(&self) -> u8;

    fn mask(&self) -> Self::Storage {
        // NOTE: `bit_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.bit_index() as usize)
    }
}

/// Plain bitset over a primitive integer.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct BitmaskFlags<T: PrimInt> {
    pub bits: T,
}

impl<T: PrimInt> BitmaskFlags<T> {
    pub fn new(bits: T) -> Self {
        Self { bits }
    }

    pub fn add<U: FlagBitmask<Storage = T>>(&mut self, flag: U) {
        self.bits = self.bits | flag.mask();
    }

    pub fn has<U: FlagBitmask<Storage = T>>(&self, flag: U) -> bool {
        (self.bits & flag.mask()) != T::zero()
    }

    pub fn union(self, other: Self) -> Self {
        Self::new(self.bits | other.bits)
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }

    pub fn clear(&mut self) {
        self.bits = T::zero();
    }
}

/// Declare a bitmask-backed enum and implement `FlagBitmask` for it.
#[macro_export]
macro_rules! define_bitmask_flags {
    ($(#[$meta:meta])* $name:ident, $storage:ty, { $($variant:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum $name {
            $($variant),*
        }

        impl $crate::bitmask_flags::FlagBitmask for $name {
            type Storage = $storage;

            fn bit_index(&self) -> u8 {
                *self as u8
            }
        }
    };
}

define_bitmask_flags!(
    /// Which part of the character's collider touched something during a move.
    CollisionFlag,
    u8,
    {
        Below,
        Above,
        Sides,
    }
);

/// Collision summary returned by a mover for one displacement.
pub type CollisionFlags = BitmaskFlags<u8>;

impl CollisionFlags {
    /// Classify a world-space contact normal (pointing away from the touched surface).
    pub fn from_contact_normal(normal: &Vec3) -> Self {
        let mut flags = Self::default();
        if normal.y > SIDE_NORMAL_Y {
            flags.add(CollisionFlag::Below);
        } else if normal.y < -SIDE_NORMAL_Y {
            flags.add(CollisionFlag::Above);
        } else {
            flags.add(CollisionFlag::Sides);
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_normals_map_to_collider_regions() {
        let floor = CollisionFlags::from_contact_normal(&Vec3::new(0.0, 1.0, 0.0));
        let ceiling = CollisionFlags::from_contact_normal(&Vec3::new(0.0, -1.0, 0.0));
        let wall = CollisionFlags::from_contact_normal(&Vec3::new(1.0, 0.05, 0.0));

        assert!(floor.has(CollisionFlag::Below) && !floor.has(CollisionFlag::Above));
        assert!(ceiling.has(CollisionFlag::Above) && !ceiling.has(CollisionFlag::Sides));
        assert!(wall.has(CollisionFlag::Sides) && !wall.has(CollisionFlag::Below));
    }

    #[test]
    fn union_keeps_every_region() {
        let mut flags = CollisionFlags::default();
        assert!(flags.is_empty());

        flags = flags.union(CollisionFlags::from_contact_normal(&Vec3::y()));
        flags = flags.union(CollisionFlags::from_contact_normal(&-Vec3::y()));
        assert!(flags.has(CollisionFlag::Below));
        assert!(flags.has(CollisionFlag::Above));
        assert!(!flags.has(CollisionFlag::Sides));

        flags.clear();
        assert!(flags.is_empty());
    }
}
