/// Index handle into a host-owned arena.
///
/// Hosts hand these out in creation order and never reuse a slot, so the
/// generation stays 0 for every handle the scene graph issues.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32, u32); // (index, generation)

impl Handle {
    pub fn new(index: u32, generation: u32) -> Self {
        Handle(index, generation)
    }

    pub fn index(&self) -> u32 {
        self.0
    }

    pub fn generation(&self) -> u32 {
        self.1
    }
}
