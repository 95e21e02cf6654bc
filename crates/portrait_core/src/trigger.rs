//! When a referring user's answers are worth a portrait

/// Answer counts at which a portrait is generated
pub const ANALYSIS_THRESHOLDS: [u32; 3] = [3, 5, 10];

/// Count shown to users as the goal in status replies
pub const STATUS_TARGET: u32 = 10;

/// Whether reaching `count` completed interviews should trigger analysis
///
/// `answers_count` grows by exactly one per completed interview, so each
/// threshold is observed once and needs no separate dedup flag.
pub fn should_fire(count: u32) -> bool {
    ANALYSIS_THRESHOLDS.contains(&count)
}
