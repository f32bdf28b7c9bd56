/// Stable identifier of a region within its dataset.
///
/// The value is the region's position in dataset insertion order, so ids are
/// dense and ordering by id matches the order the data was authored in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u32);

impl RegionId {
    pub fn new(index: u32) -> Self {
        RegionId(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region#{}", self.0)
    }
}
