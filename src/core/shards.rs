/*!
 * Shard Sizing
 *
 * CPU-proportional shard counts for the concurrent maps used by the pool.
 * Power-of-2 counts keep hash distribution cheap.
 */

/// Access pattern of a sharded map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contention {
    /// Touched by every allocate/deallocate (allocated-block registry)
    High,
    /// Touched by reporting paths only
    Low,
}

/// Shard count for a map with the given contention profile, clamped to [8, 512]
pub fn shard_count(contention: Contention) -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8);

    let multiplier = match contention {
        Contention::High => 4,
        Contention::Low => 1,
    };

    (cpus * multiplier).next_power_of_two().clamp(8, 512)
}
