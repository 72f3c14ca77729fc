// ActionTracker: Smoothing Buffer
//
// Fixed-capacity circular moving average.  An optional branch cut makes the
// average of a periodic quantity (compass heading) continuous across its
// wraparound point instead of swinging through the middle of the range.

use num_traits::Float;

pub struct SmoothingBuffer<T: Float, const N: usize> {
    samples: [T; N],
    write_index: usize,
    warmed_up: bool,
    branch_cut: Option<T>,
    average: T,
}

impl<T: Float, const N: usize> SmoothingBuffer<T, N> {
    const NON_EMPTY: () = assert!(N > 0, "SmoothingBuffer capacity must be non-zero");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            samples: [T::zero(); N],
            write_index: 0,
            warmed_up: false,
            branch_cut: None,
            average: T::zero(),
        }
    }

    /// Buffer for a circular quantity with the given modulus (e.g. 360°).
    pub fn with_branch_cut(modulus: T) -> Self {
        let mut buffer = Self::new();
        buffer.set_branch_cut(modulus);
        buffer
    }

    /// Insert one sample and refresh the cached average.
    ///
    /// The very first sample fills every slot, so the average starts at that
    /// value instead of being dragged towards zero by empty history.
    pub fn append(&mut self, value: T) {
        if !self.warmed_up {
            self.samples = [value; N];
            self.write_index = 1 % N;
            self.warmed_up = true;
            self.average = value;
            return;
        }

        self.samples[self.write_index] = value;
        self.write_index = (self.write_index + 1) % N;
        self.average = self.recompute();
    }

    /// Cached moving average; zero before the first `append`.
    pub fn smoothed_value(&self) -> T {
        self.average
    }

    /// Enable wraparound correction.  Zero, negative or non-finite disables it.
    pub fn set_branch_cut(&mut self, modulus: T) {
        self.branch_cut = if modulus > T::zero() && modulus.is_finite() {
            Some(modulus)
        } else {
            None
        };
    }

    pub fn branch_cut(&self) -> Option<T> {
        self.branch_cut
    }

    pub fn size(&self) -> usize {
        N
    }

    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up
    }

    /// Forget all history.  The branch cut setting is kept.
    pub fn reset(&mut self) {
        self.samples = [T::zero(); N];
        self.write_index = 0;
        self.warmed_up = false;
        self.average = T::zero();
    }

    // Mean of all slots, taken as slot 0 plus the mean deviation from it so a
    // run of identical samples reproduces that value exactly.
    fn recompute(&self) -> T {
        let anchor = self.samples[0];
        let mut offset = T::zero();

        match self.branch_cut {
            Some(modulus) => {
                let half = modulus / (T::one() + T::one());
                let mut reference = anchor;
                for &raw in &self.samples[1..] {
                    let diff = raw - reference;
                    reference = if diff > half {
                        raw - modulus
                    } else if diff < -half {
                        raw + modulus
                    } else {
                        raw
                    };
                    offset = offset + (reference - anchor);
                }
            }
            None => {
                for &raw in &self.samples[1..] {
                    offset = offset + (raw - anchor);
                }
            }
        }

        let count = T::from(N).unwrap_or_else(T::one);
        anchor + offset / count
    }
}

impl<T: Float, const N: usize> Default for SmoothingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float + std::fmt::Debug, const N: usize> std::fmt::Debug for SmoothingBuffer<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmoothingBuffer")
            .field("capacity", &N)
            .field("warmed_up", &self.warmed_up)
            .field("branch_cut", &self.branch_cut)
            .field("average", &self.average)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circular_distance(a: f32, b: f32, modulus: f32) -> f32 {
        let d = (a - b).rem_euclid(modulus);
        d.min(modulus - d)
    }

    #[test]
    fn zero_before_first_append() {
        let buffer: SmoothingBuffer<f32, 16> = SmoothingBuffer::new();
        assert_eq!(buffer.smoothed_value(), 0.0);
        assert!(!buffer.is_warmed_up());
        assert_eq!(buffer.size(), 16);
    }

    #[test]
    fn first_append_fills_every_slot() {
        let mut buffer: SmoothingBuffer<f32, 4> = SmoothingBuffer::new();
        buffer.append(10.0);
        assert_eq!(buffer.smoothed_value(), 10.0);

        // Three history slots still hold the warm-start value.
        buffer.append(14.0);
        assert!((buffer.smoothed_value() - 11.0).abs() < 1e-6);
    }

    #[test]
    fn identical_values_average_exactly() {
        for &value in &[0.1f32, 7.3, -2.25, 359.9, 1e-3] {
            let mut buffer: SmoothingBuffer<f32, 16> = SmoothingBuffer::new();
            for _ in 0..16 {
                buffer.append(value);
            }
            assert_eq!(buffer.smoothed_value(), value);
        }
    }

    #[test]
    fn identical_values_average_exactly_with_branch_cut() {
        let mut buffer: SmoothingBuffer<f64, 16> = SmoothingBuffer::with_branch_cut(360.0);
        for _ in 0..16 {
            buffer.append(123.456);
        }
        assert_eq!(buffer.smoothed_value(), 123.456);
    }

    #[test]
    fn branch_cut_keeps_seam_average_near_zero() {
        let mut buffer: SmoothingBuffer<f32, 16> = SmoothingBuffer::with_branch_cut(360.0);
        for i in 0..64 {
            buffer.append(if i % 2 == 0 { 359.0 } else { 1.0 });
            let avg = buffer.smoothed_value();
            assert!(
                circular_distance(avg, 0.0, 360.0) < 1.5,
                "sample {}: average {} strayed from the seam",
                i,
                avg
            );
        }
    }

    #[test]
    fn linear_mode_averages_through_the_middle() {
        let mut buffer: SmoothingBuffer<f32, 16> = SmoothingBuffer::new();
        for i in 0..16 {
            buffer.append(if i % 2 == 0 { 359.0 } else { 1.0 });
        }
        assert!((buffer.smoothed_value() - 180.0).abs() < 1e-3);
    }

    #[test]
    fn only_latest_capacity_values_count() {
        let mut buffer: SmoothingBuffer<f32, 8> = SmoothingBuffer::new();
        for _ in 0..20 {
            buffer.append(1000.0);
        }
        for v in 1..=8 {
            buffer.append(v as f32);
        }
        assert!((buffer.smoothed_value() - 4.5).abs() < 1e-4);

        buffer.append(9.0);
        assert!((buffer.smoothed_value() - 5.5).abs() < 1e-4);
    }

    #[test]
    fn zero_modulus_disables_branch_cut() {
        let mut buffer: SmoothingBuffer<f32, 16> = SmoothingBuffer::with_branch_cut(360.0);
        buffer.set_branch_cut(0.0);
        assert_eq!(buffer.branch_cut(), None);
        buffer.set_branch_cut(f32::NAN);
        assert_eq!(buffer.branch_cut(), None);
    }

    #[test]
    fn reset_returns_to_cold_start() {
        let mut buffer: SmoothingBuffer<f32, 4> = SmoothingBuffer::with_branch_cut(360.0);
        buffer.append(90.0);
        buffer.append(100.0);
        buffer.reset();
        assert_eq!(buffer.smoothed_value(), 0.0);
        assert_eq!(buffer.branch_cut(), Some(360.0));

        buffer.append(42.0);
        assert_eq!(buffer.smoothed_value(), 42.0);
    }
}
