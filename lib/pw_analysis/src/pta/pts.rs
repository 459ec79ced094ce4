//! Points-to sets over context-sensitive objects.

use crate::pta::arena::Idx;
use crate::pta::element::CSObjId;
use fixedbitset::FixedBitSet;

/// A set of context-sensitive objects, as a bit set over their handles.
#[derive(Debug, Clone, Default)]
pub struct PointsToSet {
    bits: FixedBitSet,
    len: usize,
}

impl PartialEq for PointsToSet {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.bits.ones().eq(other.bits.ones())
    }
}

impl Eq for PointsToSet {}

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(obj: CSObjId) -> Self {
        let mut pts = Self::new();
        pts.insert(obj);
        pts
    }

    /// Adds an object, returns `true` if it was not already in the set.
    pub fn insert(&mut self, obj: CSObjId) -> bool {
        let i = obj.index();
        if i >= self.bits.len() {
            self.bits.grow(i + 1);
        }
        let present = self.bits.put(i);
        if !present {
            self.len += 1;
        }
        !present
    }

    pub fn contains(&self, obj: CSObjId) -> bool {
        self.bits.contains(obj.index())
    }

    /// Adds every object of `other`, returns the objects that were not
    /// already in the set.
    pub fn add_all(&mut self, other: &Self) -> Self {
        let mut diff = Self::new();
        for obj in other.iter() {
            if self.insert(obj) {
                diff.insert(obj);
            }
        }
        diff
    }

    pub fn iter(&self) -> impl Iterator<Item = CSObjId> + '_ {
        self.bits.ones().map(Idx::new)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl FromIterator<CSObjId> for PointsToSet {
    fn from_iter<I: IntoIterator<Item = CSObjId>>(iter: I) -> Self {
        let mut pts = Self::new();
        for obj in iter {
            pts.insert(obj);
        }
        pts
    }
}
