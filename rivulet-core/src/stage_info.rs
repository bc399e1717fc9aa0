// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Read-only stage introspection for tooling built outside the core.

/// Metadata every assembled stage exposes.
///
/// Walking [`StageInfo::upstream`] links traverses the assembly-time operator
/// chain from any stage back to its root source. The trait is object-safe so
/// stages of different value types can be inspected uniformly.
pub trait StageInfo: Send + Sync {
    /// Short identifier of the operator kind, e.g. `"map"` or `"publish"`.
    fn stage_name(&self) -> &'static str;

    /// Configured upstream prefetch amount, if this stage requests ahead of
    /// downstream demand.
    fn prefetch(&self) -> Option<usize> {
        None
    }

    /// The stage's immediate upstream, or `None` for root sources.
    fn upstream(&self) -> Option<&dyn StageInfo> {
        None
    }
}
