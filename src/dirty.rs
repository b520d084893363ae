use bitflags::bitflags;

bitflags! {
    /// Caches that must be re-derived on the next `prepare`.
    /// Handled in declaration order: the atlas first, then the visible region,
    /// then the vertex buffers (which read the region).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DirtyFlags: u8 {
        const ATLAS = 1 << 0;
        const REGION = 1 << 1;
        const BUFFERS = 1 << 2;
    }
}

impl DirtyFlags {
    /// Clear `flag`, returning whether it was set.
    pub fn take(&mut self, flag: DirtyFlags) -> bool {
        let was_set = self.contains(flag);
        self.remove(flag);
        was_set
    }
}
