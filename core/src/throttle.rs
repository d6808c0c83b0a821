use ahash::AHashMap;

const DEFAULT_PERIOD: u32 = 10;

/// Decaying per-message counter: a notice is shown on its first occurrence,
/// then again only once `period` further occurrences have been swallowed.
#[derive(Debug)]
pub struct NoticeThrottle {
    counts: AHashMap<String, u32>,
    period: u32,
}

impl NoticeThrottle {
    pub fn new(period: u32) -> Self {
        Self {
            counts: AHashMap::new(),
            period,
        }
    }

    pub fn should_emit(&mut self, message: &str) -> bool {
        let count = self.counts.entry(message.to_string()).or_insert(0);
        *count += 1;
        let emit = *count == 1;
        if *count > self.period {
            *count = 0;
        }
        emit
    }
}

impl Default for NoticeThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emits_first_then_every_eleventh() {
        let mut throttle = NoticeThrottle::default();
        let emitted: Vec<usize> = (1..=30)
            .filter(|_| throttle.should_emit("Board Not Found"))
            .collect();
        assert_eq!(emitted, vec![1, 12, 23]);
    }

    #[test]
    fn test_counts_per_message() {
        let mut throttle = NoticeThrottle::new(2);
        assert!(throttle.should_emit("a"));
        assert!(throttle.should_emit("b"));
        assert!(!throttle.should_emit("a"));
        assert!(!throttle.should_emit("a"));
        assert!(throttle.should_emit("a"));
        assert!(!throttle.should_emit("b"));
    }
}
