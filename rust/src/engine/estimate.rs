use crate::config::MEDIA_END_TOLERANCE_SECONDS;

/// Estimate how much of a streamed resource is loaded from its buffered extent.
///
/// Returns `None` while the duration is unknown (zero, NaN or infinite).
/// A buffered end within [`MEDIA_END_TOLERANCE_SECONDS`] of the duration counts
/// as fully buffered, since buffered ranges of streamed containers rarely line
/// up with the reported duration.
pub fn estimate_media_progress(buffered_end: f64, duration: f64) -> Option<f64> {
    if !duration.is_finite() || duration <= 0.0 || buffered_end.is_nan() {
        return None;
    }
    if buffered_end >= duration - MEDIA_END_TOLERANCE_SECONDS {
        return Some(1.0);
    }
    Some((buffered_end / duration).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_tolerance_is_complete() {
        assert_eq!(estimate_media_progress(9.7, 10.0), Some(1.0));
        assert_eq!(estimate_media_progress(10.0, 10.0), Some(1.0));
    }

    #[test]
    fn test_outside_tolerance_is_fraction() {
        assert_eq!(estimate_media_progress(9.5, 10.0), Some(0.95));
        assert_eq!(estimate_media_progress(2.5, 10.0), Some(0.25));
        assert_eq!(estimate_media_progress(0.0, 10.0), Some(0.0));
    }

    #[test]
    fn test_unknown_duration_gives_no_estimate() {
        assert_eq!(estimate_media_progress(3.0, 0.0), None);
        assert_eq!(estimate_media_progress(3.0, f64::NAN), None);
        assert_eq!(estimate_media_progress(3.0, f64::INFINITY), None);
    }

    #[test]
    fn test_short_media_completes_immediately() {
        // Anything shorter than the tolerance is done as soon as it reports.
        assert_eq!(estimate_media_progress(0.0, 0.3), Some(1.0));
    }
}
