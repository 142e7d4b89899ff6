//! Merge region tracking
//!
//! The tracker is the sole authority on which addresses are shadowed.
//! Regions are kept in a plain vector and checked by linear scan; region
//! counts on real worksheets are small enough that an interval index
//! would buy nothing.

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};

/// The set of merged regions on one worksheet
///
/// Invariant: regions are pairwise disjoint. Only the top-left cell of a
/// region is addressable; every other cell inside it is *shadowed*.
/// A 1x1 region is legal and shadows nothing.
#[derive(Debug, Default)]
pub struct MergeTracker {
    regions: Vec<CellRange>,
}

impl MergeTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new merged region
    ///
    /// The corner pair is normalized first. Fails with
    /// [`Error::OverlappingMerge`] if the rectangle shares any cell with an
    /// existing region.
    pub fn merge(&mut self, a: CellAddress, b: CellAddress) -> Result<CellRange> {
        let range = CellRange::new(a, b);
        if let Some(existing) = self.regions.iter().find(|r| r.overlaps(&range)) {
            return Err(Error::OverlappingMerge {
                requested: range.to_a1_string(),
                existing: existing.to_a1_string(),
            });
        }
        self.regions.push(range);
        Ok(range)
    }

    /// Remove the region containing the given address
    ///
    /// Any address inside the region works, not just the top-left. Fails
    /// with [`Error::NoSuchMerge`] if the address is outside every region.
    pub fn unmerge(&mut self, addr: CellAddress) -> Result<CellRange> {
        match self.regions.iter().position(|r| r.contains(&addr)) {
            Some(idx) => Ok(self.regions.swap_remove(idx)),
            None => Err(Error::NoSuchMerge(addr.to_a1_string())),
        }
    }

    /// Check whether an address is shadowed
    ///
    /// True when the address lies inside a region and is not that region's
    /// top-left cell.
    pub fn is_shadowed(&self, addr: CellAddress) -> bool {
        self.region_containing(addr)
            .map(|r| r.start.row != addr.row || r.start.col != addr.col)
            .unwrap_or(false)
    }

    /// Get the region containing an address, if any
    pub fn region_containing(&self, addr: CellAddress) -> Option<&CellRange> {
        self.regions.iter().find(|r| r.contains(&addr))
    }

    /// All registered regions
    pub fn regions(&self) -> &[CellRange] {
        &self.regions
    }

    /// Number of registered regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Remove all regions
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    /// Replace the whole region set in one pass (bulk load)
    ///
    /// Validates pairwise disjointness before touching the current set, so
    /// a failed load leaves the tracker unchanged.
    pub fn load(&mut self, regions: Vec<CellRange>) -> Result<()> {
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                if a.overlaps(b) {
                    return Err(Error::OverlappingMerge {
                        requested: b.to_a1_string(),
                        existing: a.to_a1_string(),
                    });
                }
            }
        }
        self.regions = regions;
        Ok(())
    }

    /// Replace the region set without validation
    ///
    /// For the structural editor, which derives the new set from an
    /// already-disjoint one by shifting; disjointness is preserved by
    /// construction there.
    pub(crate) fn replace_unchecked(&mut self, regions: Vec<CellRange>) {
        self.regions = regions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    #[test]
    fn merge_registers_normalized_region() {
        let mut tracker = MergeTracker::new();
        let region = tracker.merge(addr("C3"), addr("A1")).unwrap();
        assert_eq!(region.to_a1_string(), "A1:C3");
        assert_eq!(tracker.region_count(), 1);
    }

    #[test]
    fn shadowing_covers_everything_but_top_left() {
        let mut tracker = MergeTracker::new();
        tracker.merge(addr("A1"), addr("C1")).unwrap();

        assert!(!tracker.is_shadowed(addr("A1")));
        assert!(tracker.is_shadowed(addr("B1")));
        assert!(tracker.is_shadowed(addr("C1")));
        assert!(!tracker.is_shadowed(addr("D1")));
        assert!(!tracker.is_shadowed(addr("A2")));
    }

    #[test]
    fn overlapping_merge_rejected() {
        let mut tracker = MergeTracker::new();
        tracker.merge(addr("A1"), addr("C3")).unwrap();

        // Shares cell C3
        let err = tracker.merge(addr("C3"), addr("E5")).unwrap_err();
        assert!(matches!(err, Error::OverlappingMerge { .. }));
        assert_eq!(tracker.region_count(), 1);

        // Fully disjoint succeeds
        tracker.merge(addr("D4"), addr("E5")).unwrap();
        assert_eq!(tracker.region_count(), 2);
    }

    #[test]
    fn single_cell_merge_is_legal_noop_region() {
        let mut tracker = MergeTracker::new();
        let region = tracker.merge(addr("B2"), addr("B2")).unwrap();
        assert_eq!(region.cell_count(), 1);
        assert!(!tracker.is_shadowed(addr("B2")));
    }

    #[test]
    fn unmerge_by_interior_address() {
        let mut tracker = MergeTracker::new();
        tracker.merge(addr("A1"), addr("C3")).unwrap();

        let removed = tracker.unmerge(addr("B2")).unwrap();
        assert_eq!(removed.to_a1_string(), "A1:C3");
        assert_eq!(tracker.region_count(), 0);
        assert!(!tracker.is_shadowed(addr("B2")));

        let err = tracker.unmerge(addr("B2")).unwrap_err();
        assert!(matches!(err, Error::NoSuchMerge(_)));
    }

    #[test]
    fn load_rejects_overlapping_set() {
        let mut tracker = MergeTracker::new();
        tracker.merge(addr("A1"), addr("A2")).unwrap();

        let bad = vec![
            CellRange::parse("B1:C2").unwrap(),
            CellRange::parse("C2:D3").unwrap(),
        ];
        assert!(tracker.load(bad).is_err());
        // Failed load left the previous set alone
        assert_eq!(tracker.region_count(), 1);
        assert_eq!(tracker.regions()[0].to_a1_string(), "A1:A2");

        let good = vec![
            CellRange::parse("B1:C2").unwrap(),
            CellRange::parse("D3:E4").unwrap(),
        ];
        tracker.load(good).unwrap();
        assert_eq!(tracker.region_count(), 2);
    }
}
