/// How an image is presented as an array.
///
/// The default is a read-only view that shares the image's buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ViewOptions {
    /// Permit writes through the view.
    pub writable: bool,
    /// Share the image's buffer instead of copying it.
    pub zero_copy: bool,
}

/// How an array is interpreted as an image.
///
/// The default shares the array's buffer and treats every axis as spatial, unless there are more
/// axes than an image can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImportOptions {
    /// Treat the last axis as the components of vector pixels.
    pub is_vector: bool,
    /// Share the array's buffer instead of copying it, where the layout permits.
    pub zero_copy: bool,
    /// The largest number of spatial axes.
    ///
    /// Arrays with more axes than this are always vector images.
    pub max_dimension: usize,
}

impl ViewOptions {
    pub const fn with_writable(self, writable: bool) -> Self {
        ViewOptions { writable, ..self }
    }

    pub const fn with_zero_copy(self, zero_copy: bool) -> Self {
        ViewOptions { zero_copy, ..self }
    }

    /// Permit writes through the view.
    pub const fn writable(self) -> Self {
        self.with_writable(true)
    }

    /// Copy the pixels instead of sharing them.
    pub const fn copied(self) -> Self {
        self.with_zero_copy(false)
    }
}

impl ImportOptions {
    pub const fn with_vector(self, is_vector: bool) -> Self {
        ImportOptions { is_vector, ..self }
    }

    pub const fn with_zero_copy(self, zero_copy: bool) -> Self {
        ImportOptions { zero_copy, ..self }
    }

    pub const fn with_max_dimension(self, max_dimension: usize) -> Self {
        ImportOptions {
            max_dimension,
            ..self
        }
    }

    /// Treat the last axis as the components of vector pixels.
    pub const fn vector(self) -> Self {
        self.with_vector(true)
    }

    /// Copy the elements instead of sharing them.
    pub const fn copied(self) -> Self {
        self.with_zero_copy(false)
    }
}

impl Default for ViewOptions {
    fn default() -> Self {
        ViewOptions {
            writable: false,
            zero_copy: true,
        }
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            is_vector: false,
            zero_copy: true,
            max_dimension: 3,
        }
    }
}
