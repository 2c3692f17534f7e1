//! Tunable constants for heuristic packing decisions.
//!
//! Collects the magic numbers §9's "Open questions" flags as tunables
//! rather than buried literals, the way `aion_synth::synthesize` takes an
//! `&OptLevel` rather than hard-coding its optimization thresholds.

/// Tunable thresholds controlling the LUT-pairing and dense-packing
/// heuristics, and the safety caps on the edge-clock and dense-pack BFS
/// searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackerConfig {
    /// Fanout above which a LUT is no longer considered for common-sink
    /// pairing (§4.2.2 step 4).
    pub common_sink_fanout_limit: u32,
    /// Fanout above which a shared input net is no longer considered for
    /// common-input pairing (§4.2.2 step 5).
    pub common_input_fanout_limit: u32,
    /// Fanout above which a net is excluded from the dense-pack BFS
    /// expansion frontier (§4.2.6).
    pub dense_pack_bfs_fanout_limit: u32,
    /// Occupancy ratio above which orphan FFs switch from singleton-SLICE
    /// creation to dense-pack BFS search (§4.2.6, §9).
    pub dense_pack_threshold: f64,
    /// Maximum number of cells visited during a dense-pack BFS search
    /// (§4.2.6).
    pub dense_pack_bfs_cap: u32,
    /// Maximum cluster size a dense-pack BFS candidate SLICE may already
    /// have (§4.2.6).
    pub dense_pack_max_cluster: u32,
    /// Maximum number of wires visited during the edge-clock uphill PIP
    /// search (§4.4, §9).
    pub eclk_bfs_cap: u32,
    /// Maximum number of fixed-point iterations for clock-constraint
    /// propagation before further changes are silently dropped (§4.5).
    pub clock_propagation_iteration_limit: u32,
    /// Relative difference (as a fraction) above which a user-supplied
    /// clock constraint disagreeing with a derived one produces a warning
    /// (§4.5).
    pub clock_constraint_tolerance: f64,
    /// Fanout above which a net feeding `CLK`/`LSR` ports is promoted to
    /// the global routing network during the final stage (§2 stage 18).
    pub global_promotion_fanout: u32,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self {
            common_sink_fanout_limit: 5,
            common_input_fanout_limit: 10,
            dense_pack_bfs_fanout_limit: 25,
            dense_pack_threshold: 0.95,
            dense_pack_bfs_cap: 10_000,
            dense_pack_max_cluster: 8,
            eclk_bfs_cap: 30_000,
            clock_propagation_iteration_limit: 5_000,
            clock_constraint_tolerance: 0.001,
            global_promotion_fanout: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let cfg = PackerConfig::default();
        assert_eq!(cfg.common_sink_fanout_limit, 5);
        assert_eq!(cfg.common_input_fanout_limit, 10);
        assert_eq!(cfg.dense_pack_bfs_fanout_limit, 25);
        assert_eq!(cfg.dense_pack_threshold, 0.95);
        assert_eq!(cfg.eclk_bfs_cap, 30_000);
    }
}
