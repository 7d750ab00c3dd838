//! # Per-bin scratch storage
//!
//! Auxiliary state that does not fit in the fixed-size accumulator vectors
//! lives in a [`BinContext`]: the invalid-observation counters of the plain
//! average and the growable per-pass buffer of the percentile aggregator.
//!
//! A context is scoped to one bin and one phase: the caller creates a fresh
//! context per (bin, pass) for the spatial phase and one per bin for the
//! whole temporal phase, and must never share it between two concurrent
//! accumulation streams (the engine holds no locks).
//!
//! Entries are a closed set of typed shapes behind typed accessors, so an
//! aggregator reading back its own key gets a `u32` counter or an `f32`
//! buffer, never a downcast.

use std::collections::HashMap;

/// One typed scratch entry of a [`BinContext`]
#[derive(Debug, Clone, PartialEq)]
enum Scratch {
    Counter(u32),
    Buffer(Vec<f32>),
}

/// Typed per-bin key/value scratch store
#[derive(Debug, Clone, Default)]
pub struct BinContext {
    entries: HashMap<String, Scratch>,
}

impl BinContext {
    pub fn new() -> Self {
        BinContext::default()
    }

    /// Mutable access to the counter stored under `key`, creating it at 0
    ///
    /// Panics if the key already holds a buffer; aggregators derive their
    /// keys from their own variable names, so a shape clash is a programming
    /// error, not a run-time condition.
    pub fn counter_mut(&mut self, key: &str) -> &mut u32 {
        match self
            .entries
            .entry(key.to_string())
            .or_insert(Scratch::Counter(0))
        {
            Scratch::Counter(count) => count,
            Scratch::Buffer(_) => panic!("scratch entry `{key}` is not a counter"),
        }
    }

    /// Current value of the counter stored under `key`, 0 when absent
    pub fn counter(&self, key: &str) -> u32 {
        match self.entries.get(key) {
            Some(Scratch::Counter(count)) => *count,
            Some(Scratch::Buffer(_)) => panic!("scratch entry `{key}` is not a counter"),
            None => 0,
        }
    }

    /// Mutable access to the growable buffer stored under `key`, creating it
    /// empty
    ///
    /// The buffer grows by `Vec`'s capacity doubling; the percentile
    /// aggregator appends one value per temporal pass, so its footprint is
    /// O(number of passes) per bin.
    pub fn buffer_mut(&mut self, key: &str) -> &mut Vec<f32> {
        match self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Scratch::Buffer(Vec::new()))
        {
            Scratch::Buffer(buffer) => buffer,
            Scratch::Counter(_) => panic!("scratch entry `{key}` is not a buffer"),
        }
    }

    /// Read-only view of the buffer stored under `key`, empty when absent
    pub fn buffer(&self, key: &str) -> &[f32] {
        match self.entries.get(key) {
            Some(Scratch::Buffer(buffer)) => buffer,
            Some(Scratch::Counter(_)) => panic!("scratch entry `{key}` is not a buffer"),
            None => &[],
        }
    }

    /// Drop the entry stored under `key`, if any
    pub fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every entry, allowing the context to be reused for another bin
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod bin_context_test {

    use super::*;

    #[test]
    fn test_counter_defaults_to_zero() {
        let mut ctx = BinContext::new();
        assert_eq!(ctx.counter("chl.invalid"), 0);

        *ctx.counter_mut("chl.invalid") += 1;
        *ctx.counter_mut("chl.invalid") += 1;
        assert_eq!(ctx.counter("chl.invalid"), 2);
    }

    #[test]
    fn test_buffer_grows() {
        let mut ctx = BinContext::new();
        assert!(ctx.buffer("chl.p90").is_empty());

        ctx.buffer_mut("chl.p90").push(1.5);
        ctx.buffer_mut("chl.p90").push(-0.5);
        assert_eq!(ctx.buffer("chl.p90"), &[1.5, -0.5]);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut ctx = BinContext::new();
        *ctx.counter_mut("a.invalid") += 3;
        ctx.buffer_mut("b.p50").push(9.0);

        assert_eq!(ctx.counter("a.invalid"), 3);
        assert_eq!(ctx.buffer("b.p50"), &[9.0]);

        ctx.remove("a.invalid");
        assert_eq!(ctx.counter("a.invalid"), 0);

        ctx.clear();
        assert!(ctx.buffer("b.p50").is_empty());
    }

    #[test]
    #[should_panic(expected = "is not a buffer")]
    fn test_shape_clash_panics() {
        let mut ctx = BinContext::new();
        *ctx.counter_mut("key") += 1;
        ctx.buffer_mut("key");
    }
}
