/// Number of priority levels in every bag.
pub const BAG_LEVEL: usize = 100;

/// Levels below this are "dormant": a take-out visits them one item at a time.
/// Levels at or above it drain their whole current size before moving on.
pub const BAG_THRESHOLD: usize = 10;

/// Forgetting floor, as a fraction of quality: BAG_THRESHOLD / BAG_LEVEL.
pub const RELATIVE_THRESHOLD: f32 = BAG_THRESHOLD as f32 / BAG_LEVEL as f32;

/// Evidential horizon k, the amount of future evidence considered.
pub const HORIZON: f32 = 1.0;

/// Confidence of a derived truth value never reaches 1.
pub const MAX_CONFIDENCE: f32 = 0.9999;

/// Budget given to a freshly created concept.
pub const CONCEPT_INITIAL_LEVEL: f32 = 0.01;

/// Average priority reported by an empty bag.
pub const EMPTY_BAG_PRIORITY: f32 = 0.01;
