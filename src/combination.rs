
use crate::{
    allocator::{BO_USE_CURSOR, BO_USE_SCANOUT, BufferUsage, Tiling},
    format::{ARGB8888, Format, XRGB8888},
    video::{LINEAR_MODIFIER, Modifier},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LayoutMetadata {
    pub tiling: Tiling,
    pub priority: u32,
    pub modifier: Modifier,
}

pub const LINEAR_METADATA: LayoutMetadata = LayoutMetadata {
    tiling: Tiling::Linear,
    priority: 1,
    modifier: LINEAR_MODIFIER,
};

#[derive(Copy, Clone, Debug)]
pub struct Combination {
    pub format: &'static Format,
    pub metadata: LayoutMetadata,
    pub usage: BufferUsage,
}

/// The (format, usage) pairs a backend can allocate.
#[derive(Debug, Default)]
pub struct Combinations {
    combos: Vec<Combination>,
}

impl Combinations {
    pub fn add(&mut self, format: &'static Format, metadata: &LayoutMetadata, usage: BufferUsage) {
        self.combos.push(Combination {
            format,
            metadata: *metadata,
            usage,
        });
    }

    pub fn add_combinations(
        &mut self,
        formats: &[&'static Format],
        metadata: &LayoutMetadata,
        usage: BufferUsage,
    ) {
        for &format in formats {
            self.add(format, metadata, usage);
        }
    }

    /// Adds `usage` to every entry of `format` that was registered with `metadata`.
    pub fn modify_combination(
        &mut self,
        format: &'static Format,
        metadata: &LayoutMetadata,
        usage: BufferUsage,
    ) {
        for combo in &mut self.combos {
            if combo.format == format && combo.metadata == *metadata {
                combo.usage |= usage;
            }
        }
    }

    /// Every supported device can scan out and use as a cursor linear XRGB8888 and
    /// ARGB8888 buffers.
    pub fn modify_linear_combinations(&mut self) {
        let usage = BO_USE_CURSOR | BO_USE_SCANOUT;
        self.modify_combination(XRGB8888, &LINEAR_METADATA, usage);
        self.modify_combination(ARGB8888, &LINEAR_METADATA, usage);
    }

    /// Returns the highest-priority entry of `format` whose usage contains `usage`.
    pub fn get(&self, format: &Format, usage: BufferUsage) -> Option<&Combination> {
        if usage.is_empty() {
            return None;
        }
        let mut best: Option<&Combination> = None;
        for combo in &self.combos {
            if combo.format != format || !combo.usage.contains(usage) {
                continue;
            }
            if best.is_none_or(|b| b.metadata.priority < combo.metadata.priority) {
                best = Some(combo);
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combination> {
        self.combos.iter()
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }
}
