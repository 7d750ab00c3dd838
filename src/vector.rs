//! # Accumulator vector contracts
//!
//! The binning engine stores every accumulator as a fixed-length sequence of
//! single-precision slots. [`Vector`] is the read-only view, [`WritableVector`]
//! the mutable one; both are implemented for `[f32]` and `Vec<f32>` so any
//! caller-owned buffer (typically a `Vec<f32>` sized to the aggregator's
//! declared feature count) can back a spatial, temporal or output vector.

/// Read-only view over a fixed-length sequence of floating-point slots.
pub trait Vector {
    /// Number of slots in the vector
    fn size(&self) -> usize;

    /// Value of the slot at `index`; panics if `index >= size()`
    fn get(&self, index: usize) -> f32;
}

/// Mutable view over the same storage as [`Vector`].
pub trait WritableVector: Vector {
    /// Overwrite the slot at `index`; panics if `index >= size()`
    fn set(&mut self, index: usize, value: f32);
}

impl Vector for [f32] {
    fn size(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> f32 {
        self[index]
    }
}

impl WritableVector for [f32] {
    fn set(&mut self, index: usize, value: f32) {
        self[index] = value;
    }
}

impl<const N: usize> Vector for [f32; N] {
    fn size(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> f32 {
        self[index]
    }
}

impl<const N: usize> WritableVector for [f32; N] {
    fn set(&mut self, index: usize, value: f32) {
        self[index] = value;
    }
}

impl Vector for Vec<f32> {
    fn size(&self) -> usize {
        self.len()
    }

    fn get(&self, index: usize) -> f32 {
        self[index]
    }
}

impl WritableVector for Vec<f32> {
    fn set(&mut self, index: usize, value: f32) {
        self[index] = value;
    }
}

/// Zero every slot of `vector`.
pub(crate) fn fill_zero(vector: &mut dyn WritableVector) {
    for index in 0..vector.size() {
        vector.set(index, 0.0);
    }
}
