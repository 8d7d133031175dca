/// Maps a non-negative distance onto `(0, 1]`: `0` is `1.0`, larger is lower.
///
/// Needs no bound on the maximum distance and never divides by zero. A NaN distance
/// carries no evidence of relevance and maps to `0.0`.
pub fn distance_to_similarity(distance: f64) -> f64 {
    if distance.is_nan() {
        return 0.0;
    }
    1.0 / (1.0 + distance.max(0.0))
}
