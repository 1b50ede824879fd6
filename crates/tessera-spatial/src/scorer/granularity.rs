use tessera_core::constants::{GRANULARITY_MAX, GRANULARITY_MIN};

/// `clamp(ceil(log2(words) * 100), 1, 1000)`; no words maps to 1.
pub fn granularity_for_words(words: usize) -> f64 {
    if words == 0 {
        return GRANULARITY_MIN;
    }
    ((words as f64).log2() * 100.0)
        .ceil()
        .clamp(GRANULARITY_MIN, GRANULARITY_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grows_logarithmically() {
        assert_eq!(granularity_for_words(0), 1.0);
        assert_eq!(granularity_for_words(1), 1.0);
        assert_eq!(granularity_for_words(2), 100.0);
        assert_eq!(granularity_for_words(8), 300.0);
        assert_eq!(granularity_for_words(3), 159.0);
    }

    #[test]
    fn saturates_at_the_axis_maximum() {
        assert_eq!(granularity_for_words(1 << 10), 1000.0);
        assert_eq!(granularity_for_words(usize::MAX), 1000.0);
    }
}
