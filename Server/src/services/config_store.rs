use std::sync::atomic::{AtomicU64, Ordering};

/// Holds the intensity threshold shared between the frame-processing worker
/// and the reconfiguration endpoint.
///
/// The threshold is stored as its f64 bit pattern in a single atomic word,
/// so a reader observes either the value before or after a concurrent write,
/// never a torn one. The value is taken as-is: NaN and negative thresholds
/// are stored without validation and simply let more or fewer points through.
#[derive(Debug)]
pub struct ConfigStore {
    threshold_bits: AtomicU64,
}

impl ConfigStore {
    pub fn new(intensity_threshold: f64) -> Self {
        Self {
            threshold_bits: AtomicU64::new(intensity_threshold.to_bits()),
        }
    }

    /// The threshold currently in effect. Read once per frame by the
    /// pipeline, so an in-flight frame never observes two values.
    pub fn intensity_threshold(&self) -> f64 {
        f64::from_bits(self.threshold_bits.load(Ordering::Relaxed))
    }

    /// Replaces the threshold. Takes effect on the next frame; a frame that
    /// already snapshotted the old value completes against it.
    pub fn set_intensity_threshold(&self, value: f64) {
        self.threshold_bits.store(value.to_bits(), Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_with_the_given_threshold() {
        let store = ConfigStore::new(100.0);
        assert_eq!(store.intensity_threshold(), 100.0);
    }

    #[test]
    fn set_is_visible_to_subsequent_reads() {
        let store = ConfigStore::new(100.0);
        store.set_intensity_threshold(50.0);
        assert_eq!(store.intensity_threshold(), 50.0);
    }

    #[test]
    fn accepts_negative_and_non_finite_values() {
        let store = ConfigStore::new(100.0);
        store.set_intensity_threshold(-3.5);
        assert_eq!(store.intensity_threshold(), -3.5);
        store.set_intensity_threshold(f64::NAN);
        assert!(store.intensity_threshold().is_nan());
    }

    #[test]
    fn concurrent_writes_never_produce_torn_reads() {
        let store = Arc::new(ConfigStore::new(1.0));

        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..100_000u32 {
                    store.set_intensity_threshold(if i % 2 == 0 { 1.0 } else { 2.0 });
                }
            })
        };

        for _ in 0..100_000 {
            let value = store.intensity_threshold();
            assert!(value == 1.0 || value == 2.0, "torn read: {}", value);
        }

        writer.join().unwrap();
    }
}
