//! Addressing of individual images inside a container.

/// Layer count as used for iteration: containers report 0 when they are not arrays.
#[inline]
pub const fn effective_layer_count(layers: u32) -> u32 {
    if layers == 0 {
        1
    } else {
        layers
    }
}

/// One `(level, layer, face)` image within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceIndex {
    /// Mipmap level, 0 is the largest.
    pub level: u32,
    /// Array layer.
    pub layer: u32,
    /// Cubemap face, 0 for 2D textures.
    pub face: u32,
}

impl SliceIndex {
    /// Creates a new slice index.
    #[inline]
    pub const fn new(level: u32, layer: u32, face: u32) -> Self {
        Self { level, layer, face }
    }

    /// Returns true if this index lies within a container with the given counts.
    ///
    /// `layers` is the raw count; 0 is treated as 1.
    #[inline]
    pub const fn is_within(self, levels: u32, layers: u32, faces: u32) -> bool {
        self.level < levels && self.layer < effective_layer_count(layers) && self.face < faces
    }

    /// Enumerates every slice of a container, levels outermost and faces innermost.
    ///
    /// `layers` is the raw count; 0 is treated as 1.
    #[inline]
    pub const fn iter_all(levels: u32, layers: u32, faces: u32) -> SliceIter {
        SliceIter::new(levels, layers, faces)
    }
}

impl core::fmt::Display for SliceIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "level {}, layer {}, face {}",
            self.level, self.layer, self.face
        )
    }
}

/// Iterator over all slices of a container. See [`SliceIndex::iter_all`].
#[derive(Debug, Clone)]
pub struct SliceIter {
    levels: u32,
    layers: u32,
    faces: u32,
    next: Option<SliceIndex>,
}

impl SliceIter {
    /// Creates an iterator over `levels * max(1, layers) * faces` slices.
    pub const fn new(levels: u32, layers: u32, faces: u32) -> Self {
        let layers = effective_layer_count(layers);
        let next = if levels == 0 || faces == 0 {
            None
        } else {
            Some(SliceIndex::new(0, 0, 0))
        };
        Self {
            levels,
            layers,
            faces,
            next,
        }
    }

    /// Number of slices the iterator yields in total.
    pub const fn total(&self) -> usize {
        self.levels as usize * self.layers as usize * self.faces as usize
    }
}

impl Iterator for SliceIter {
    type Item = SliceIndex;

    fn next(&mut self) -> Option<SliceIndex> {
        let current = self.next?;

        let mut following = current;
        following.face += 1;
        if following.face == self.faces {
            following.face = 0;
            following.layer += 1;
            if following.layer == self.layers {
                following.layer = 0;
                following.level += 1;
            }
        }

        self.next = (following.level < self.levels).then_some(following);
        Some(current)
    }
}
