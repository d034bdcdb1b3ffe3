//! Seeded random source handed to every generator invocation.
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Default weight of the "should this nullable slot be null" coin flip.
pub const DEFAULT_NULL_PROBABILITY: f64 = 1.0 / 6.0;

const ALPHABET_UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const ALPHABET_LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone)]
pub struct Random {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Random {
    pub fn new(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), seed }
    }

    /// Random source seeded from entropy; the chosen seed is kept for reporting.
    pub fn from_entropy() -> Self {
        let seed = rand::thread_rng().next_u64();
        Self::new(seed)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Weighted coin flip. Probabilities outside `[0, 1]` are clamped.
    pub fn chance(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }

    /// `true` with the default null probability, but only if `precondition` holds.
    pub fn boolean(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }

    /// Inclusive range; bounds are swapped if given in the wrong order.
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(lo..=hi)
    }

    pub fn usize_range(&mut self, min: usize, max: usize) -> usize {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.rng.gen_range(lo..=hi)
    }

    pub fn float_range(&mut self, min: f64, max: f64) -> f64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        if lo == hi {
            return lo;
        }
        self.rng.gen_range(lo..hi)
    }

    pub fn upper_char(&mut self) -> char {
        ALPHABET_UPPER[self.rng.gen_range(0..ALPHABET_UPPER.len())] as char
    }

    pub fn lower_char(&mut self) -> char {
        ALPHABET_LOWER[self.rng.gen_range(0..ALPHABET_LOWER.len())] as char
    }

    pub fn digit_char(&mut self) -> char {
        char::from(b'0' + self.rng.gen_range(0..10u8))
    }

    pub fn upper_string(&mut self, len: usize) -> String {
        (0..len).map(|_| self.upper_char()).collect()
    }

    pub fn lower_string(&mut self, len: usize) -> String {
        (0..len).map(|_| self.lower_char()).collect()
    }

    pub fn digits(&mut self, len: usize) -> String {
        (0..len).map(|_| self.digit_char()).collect()
    }

    pub fn one_of<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Random::new(42);
        let mut b = Random::new(42);
        let xs: Vec<i64> = (0..10).map(|_| a.int_range(0, 1000)).collect();
        let ys: Vec<i64> = (0..10).map(|_| b.int_range(0, 1000)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn chance_respects_extremes() {
        let mut r = Random::new(1);
        assert!((0..100).all(|_| !r.chance(0.0)));
        assert!((0..100).all(|_| r.chance(1.0)));
    }

    #[test]
    fn ranges_are_inclusive_and_order_insensitive() {
        let mut r = Random::new(7);
        for _ in 0..200 {
            let x = r.int_range(5, 3);
            assert!((3..=5).contains(&x));
        }
        assert_eq!(r.usize_range(4, 4), 4);
        assert_eq!(r.float_range(2.5, 2.5), 2.5);
    }

    #[test]
    fn strings_have_requested_shape() {
        let mut r = Random::new(9);
        let s = r.upper_string(6);
        assert_eq!(s.len(), 6);
        assert!(s.chars().all(|c| c.is_ascii_uppercase()));
        assert!(r.digits(4).chars().all(|c| c.is_ascii_digit()));
    }
}
