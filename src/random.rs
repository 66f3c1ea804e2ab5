use ::rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Pool of pre-drawn uniform samples, refilled wholesale once the cursor wraps.
pub struct SampleBuffer {
    samples: Vec<f32>,
    cursor: usize,
}

impl SampleBuffer {
    pub fn new(len: usize, rng: &mut ChaCha8Rng) -> Self {
        let mut buffer = Self {
            samples: vec![0.0; len.max(1)],
            cursor: 0,
        };
        buffer.refill(rng);
        buffer
    }

    fn refill(&mut self, rng: &mut ChaCha8Rng) {
        for sample in &mut self.samples {
            *sample = rng.gen::<f32>();
        }
    }

    pub fn next(&mut self, rng: &mut ChaCha8Rng) -> f32 {
        let value = self.samples[self.cursor];
        self.cursor = (self.cursor + 1) % self.samples.len();
        if self.cursor == 0 {
            self.refill(rng);
        }
        value
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Simulation-wide random state handed to every component call.
///
/// `roll` serves hot-path probability checks from the buffer; the range helpers
/// draw straight from the seeded generator.
pub struct SimContext {
    pub rng: ChaCha8Rng,
    samples: SampleBuffer,
}

impl SimContext {
    pub fn new(seed: u64, buffer_len: usize) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let samples = SampleBuffer::new(buffer_len, &mut rng);
        Self { rng, samples }
    }

    /// Uniform sample in [0, 1) from the buffered pool.
    pub fn roll(&mut self) -> f32 {
        self.samples.next(&mut self.rng)
    }

    pub fn chance(&mut self, probability: f32) -> bool {
        self.roll() < probability
    }

    /// Uniform in [lo, hi); returns `lo` when the interval is empty.
    pub fn uniform(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.rng.gen::<f32>()
    }

    pub fn uniform_in(&mut self, range: [f32; 2]) -> f32 {
        self.uniform(range[0], range[1])
    }

    /// Symmetric perturbation in [-amplitude, amplitude).
    pub fn jitter(&mut self, amplitude: f32) -> f32 {
        self.uniform(-amplitude, amplitude)
    }

    pub fn int_inclusive(&mut self, lo: u32, hi: u32) -> u32 {
        if hi <= lo {
            lo
        } else {
            self.rng.gen_range(lo..=hi)
        }
    }

    pub fn int_in(&mut self, range: [u32; 2]) -> u32 {
        self.int_inclusive(range[0], range[1])
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            0
        } else {
            self.rng.gen_range(0..len)
        }
    }

    pub fn coin(&mut self) -> bool {
        self.rng.gen::<bool>()
    }

    /// Fresh seed for a derived generator such as a noise field.
    pub fn derive_seed(&mut self) -> u32 {
        self.rng.gen::<u32>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_stream() {
        let mut a = SimContext::new(9, 16);
        let mut b = SimContext::new(9, 16);
        for _ in 0..40 {
            assert_eq!(a.roll(), b.roll());
            assert_eq!(a.uniform(0.0, 5.0), b.uniform(0.0, 5.0));
        }
    }

    #[test]
    fn buffer_refills_after_wrapping() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut buffer = SampleBuffer::new(4, &mut rng);
        let first: Vec<f32> = (0..4).map(|_| buffer.next(&mut rng)).collect();
        let second: Vec<f32> = (0..4).map(|_| buffer.next(&mut rng)).collect();
        assert_ne!(first, second);
        assert!(first.iter().chain(&second).all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn degenerate_ranges_do_not_panic() {
        let mut ctx = SimContext::new(3, 8);
        assert_eq!(ctx.uniform(2.0, 2.0), 2.0);
        assert_eq!(ctx.int_inclusive(4, 4), 4);
        assert_eq!(ctx.pick_index(0), 0);
    }
}
