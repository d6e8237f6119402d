//! Memoized color transform, shared across threads.
//!
//! The cache is an explicit object owned by whoever drives the pipeline and
//! passed by reference into each call. One mutex guards the whole state and
//! stays held across check, build and store, so two threads missing on the
//! same key never both build.

use parking_lot::Mutex;

use crate::transform::matrix::{self, ColorTransform};
use crate::transform::params::{AdjustmentParameters, GAMMA_NEUTRAL};

/// Normalized signature of the parameters a transform was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterKey {
    pub brightness: i32,
    pub contrast: i32,
    pub red_gain: i32,
    pub green_gain: i32,
    pub blue_gain: i32,
    /// Clamped gamma, or neutral when gamma is excluded.
    pub gamma: i32,
    /// `1` when the gamma approximation is folded in, `-1` when not.
    pub gamma_discriminant: i32,
}

impl FilterKey {
    /// Clamp and normalize `params`. Ignores `enabled`.
    pub fn from_params(params: &AdjustmentParameters) -> Self {
        let p = params.clamped();
        Self {
            brightness: p.brightness,
            contrast: p.contrast,
            red_gain: p.red_gain,
            green_gain: p.green_gain,
            blue_gain: p.blue_gain,
            gamma: if p.include_gamma { p.gamma } else { GAMMA_NEUTRAL },
            gamma_discriminant: if p.include_gamma { 1 } else { -1 },
        }
    }

    /// True when no step would be produced.
    pub fn is_neutral(&self) -> bool {
        self.brightness == 0
            && self.contrast == 0
            && self.red_gain == 0
            && self.green_gain == 0
            && self.blue_gain == 0
            && self.gamma == GAMMA_NEUTRAL
    }
}

/// Produces a transform for a cache key.
pub trait TransformBuilder: Send + Sync {
    fn build(&self, key: &FilterKey) -> Option<ColorTransform>;
}

/// The stock builder: composes the adjustment steps into one matrix.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixBuilder;

impl TransformBuilder for MatrixBuilder {
    fn build(&self, key: &FilterKey) -> Option<ColorTransform> {
        matrix::compose(
            key.brightness,
            key.contrast,
            key.red_gain,
            key.green_gain,
            key.blue_gain,
            key.gamma,
            key.gamma_discriminant > 0,
        )
    }
}

#[derive(Debug, Default)]
struct CachedFilterState {
    key: Option<FilterKey>,
    transform: Option<ColorTransform>,
}

/// Thread-safe get-or-build cache for the current color transform.
pub struct FilterCache<B = MatrixBuilder> {
    builder: B,
    state: Mutex<CachedFilterState>,
}

impl FilterCache {
    pub fn new() -> Self {
        Self::with_builder(MatrixBuilder)
    }
}

impl Default for FilterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: TransformBuilder> FilterCache<B> {
    pub fn with_builder(builder: B) -> Self {
        Self {
            builder,
            state: Mutex::new(CachedFilterState::default()),
        }
    }

    /// Transform for `params`, built at most once per distinct key.
    ///
    /// Disabled or neutral parameters clear the cache and yield `None`.
    pub fn get_or_build(&self, params: &AdjustmentParameters) -> Option<ColorTransform> {
        let key = FilterKey::from_params(params);
        let mut state = self.state.lock();

        if !params.enabled || key.is_neutral() {
            if state.key.is_some() {
                tracing::debug!("clearing color filter cache");
            }
            *state = CachedFilterState::default();
            return None;
        }

        if state.key == Some(key) {
            tracing::trace!(?key, "color filter cache hit");
            return state.transform;
        }

        tracing::debug!(?key, "building color filter");
        let transform = self.builder.build(&key);
        state.key = Some(key);
        state.transform = transform;
        transform
    }

    /// Single-pass variant for renderers that cannot run the gamma LUT:
    /// the gamma approximation is folded into the matrix.
    pub fn display_filter(&self, params: &AdjustmentParameters) -> Option<ColorTransform> {
        self.get_or_build(&params.with_include_gamma(true))
    }

    /// Drop the cached key and transform.
    pub fn clear(&self) {
        *self.state.lock() = CachedFilterState::default();
    }

    /// Key of the currently cached transform, if any.
    pub fn cached_key(&self) -> Option<FilterKey> {
        self.state.lock().key
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Counts how often the cache asks for a build.
    #[derive(Default)]
    struct CountingBuilder {
        builds: AtomicUsize,
    }

    impl TransformBuilder for Arc<CountingBuilder> {
        fn build(&self, key: &FilterKey) -> Option<ColorTransform> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            MatrixBuilder.build(key)
        }
    }

    fn counting_cache() -> (Arc<CountingBuilder>, FilterCache<Arc<CountingBuilder>>) {
        let counter = Arc::new(CountingBuilder::default());
        (counter.clone(), FilterCache::with_builder(counter))
    }

    fn enabled(brightness: i32) -> AdjustmentParameters {
        AdjustmentParameters {
            enabled: true,
            brightness,
            ..Default::default()
        }
    }

    #[test]
    fn test_neutral_params_return_none_and_clear() {
        let cache = FilterCache::new();
        assert!(cache.get_or_build(&enabled(20)).is_some());
        assert!(cache.cached_key().is_some());

        assert!(cache.get_or_build(&enabled(0)).is_none());
        assert!(cache.cached_key().is_none());
    }

    #[test]
    fn test_disabled_returns_none_and_clears() {
        let cache = FilterCache::new();
        assert!(cache.get_or_build(&enabled(20)).is_some());

        let disabled = AdjustmentParameters {
            enabled: false,
            ..enabled(20)
        };
        assert!(cache.get_or_build(&disabled).is_none());
        assert!(cache.cached_key().is_none());
    }

    #[test]
    fn test_repeated_calls_build_once() {
        let (counter, cache) = counting_cache();
        let params = enabled(35);
        let first = cache.get_or_build(&params);
        for _ in 0..10 {
            assert_eq!(cache.get_or_build(&params), first);
        }
        assert_eq!(counter.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_parameter_change_rebuilds() {
        let (counter, cache) = counting_cache();
        cache.get_or_build(&enabled(10));
        cache.get_or_build(&enabled(11));
        cache.get_or_build(&enabled(11));
        assert_eq!(counter.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clamped_values_share_a_key() {
        let (counter, cache) = counting_cache();
        let over = cache.get_or_build(&enabled(150));
        let max = cache.get_or_build(&enabled(100));
        assert_eq!(over, max);
        assert_eq!(counter.builds.load(Ordering::SeqCst), 1);

        let low_gamma = AdjustmentParameters {
            enabled: true,
            gamma: 5,
            ..Default::default()
        };
        let min_gamma = AdjustmentParameters {
            gamma: 10,
            ..low_gamma
        };
        assert_eq!(cache.get_or_build(&low_gamma), cache.get_or_build(&min_gamma));
        assert_eq!(counter.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_gamma_inclusion_is_part_of_key() {
        let (counter, cache) = counting_cache();
        let params = AdjustmentParameters {
            gamma: 180,
            ..enabled(10)
        };
        let with = cache.get_or_build(&params.with_include_gamma(true));
        let without = cache.get_or_build(&params.with_include_gamma(false));
        assert_ne!(with, without);
        assert_eq!(counter.builds.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_key().map(|k| k.gamma_discriminant), Some(-1));
    }

    #[test]
    fn test_gamma_only_without_inclusion_is_neutral() {
        let cache = FilterCache::new();
        let params = AdjustmentParameters {
            enabled: true,
            gamma: 250,
            include_gamma: false,
            ..Default::default()
        };
        assert!(cache.get_or_build(&params).is_none());
        assert!(cache.display_filter(&params).is_some());
    }

    #[test]
    fn test_concurrent_misses_build_once() {
        let (counter, cache) = counting_cache();
        let cache = Arc::new(cache);
        let params = enabled(42);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_build(&params))
            })
            .collect();

        let results: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(counter.builds.load(Ordering::SeqCst), 1);
    }
}
