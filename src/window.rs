// ActionTracker: Sliding Analysis Window
//
// One second of fixed-rate samples for a single smoothed signal.  Slots are
// addressed by index; ranges walk forward from `from` to `to` and may wrap
// past the end of the array.

/// Fold a difference of a periodic quantity into (-m/2, m/2].
pub fn bound_to_branch_cut(diff: f32, modulus: f32) -> f32 {
    let half = modulus / 2.0;
    if diff > half {
        diff - modulus
    } else if diff < -half {
        diff + modulus
    } else {
        diff
    }
}

#[derive(Debug, Clone)]
pub struct SlidingWindow<const W: usize> {
    values: [f32; W],
    cursor: usize,
    warmed_up: bool,
    branch_cut: Option<f32>,
}

impl<const W: usize> SlidingWindow<W> {
    const NON_EMPTY: () = assert!(W > 0, "SlidingWindow length must be non-zero");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            values: [0.0; W],
            cursor: 0,
            warmed_up: false,
            branch_cut: None,
        }
    }

    /// Window over a circular signal; displacements wrap at `modulus`.
    pub fn circular(modulus: f32) -> Self {
        let mut window = Self::new();
        if modulus > 0.0 && modulus.is_finite() {
            window.branch_cut = Some(modulus);
        }
        window
    }

    /// Store one analysis sample.  The first push fills the whole window so
    /// displacement queries never compare against the zeroed initial slots.
    pub fn push(&mut self, value: f32) {
        if !self.warmed_up {
            self.values = [value; W];
            self.warmed_up = true;
        }
        self.values[self.cursor] = value;
        self.cursor = (self.cursor + 1) % W;
    }

    pub fn len(&self) -> usize {
        W
    }

    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up
    }

    pub fn value_at(&self, index: usize) -> f32 {
        self.values[index % W]
    }

    /// Slot of the most recent push.
    pub fn latest_index(&self) -> usize {
        (self.cursor + W - 1) % W
    }

    /// Slot `n` samples before `from`.
    pub fn index_back(&self, from: usize, n: usize) -> usize {
        (from % W + W - n % W) % W
    }

    /// Number of samples from `from` to `to`, walking forward.
    pub fn span(&self, from: usize, to: usize) -> usize {
        (to % W + W - from % W) % W
    }

    /// Signed difference of slot `index` to `reference`, wrapped when the
    /// signal is circular.
    pub fn displacement_from(&self, reference: f32, index: usize) -> f32 {
        let diff = self.value_at(index) - reference;
        match self.branch_cut {
            Some(modulus) => bound_to_branch_cut(diff, modulus),
            None => diff,
        }
    }

    /// Largest |displacement| of the slots after `from` up to and including
    /// `to`, measured against the value at `from`.
    pub fn max_displacement(&self, from: usize, to: usize) -> f32 {
        self.displacements(from, to).fold(0.0f32, |peak, (_, d)| peak.max(d))
    }

    /// Slot achieving `max_displacement`; `from` for an empty range.
    pub fn index_of_max_displacement(&self, from: usize, to: usize) -> usize {
        let mut best = (from % W, 0.0f32);
        for (index, d) in self.displacements(from, to) {
            if d > best.1 {
                best = (index, d);
            }
        }
        best.0
    }

    /// Root-mean-square displacement over the same range as
    /// `max_displacement`; zero for an empty range.
    pub fn rms_displacement(&self, from: usize, to: usize) -> f32 {
        let (count, sum_sq) = self
            .displacements(from, to)
            .fold((0usize, 0.0f32), |(n, acc), (_, d)| (n + 1, acc + d * d));
        if count == 0 {
            0.0
        } else {
            (sum_sq / count as f32).sqrt()
        }
    }

    /// Sum of |value| over `from..=to`.
    pub fn absolute_sum(&self, from: usize, to: usize) -> f32 {
        let from = from % W;
        (0..=self.span(from, to))
            .map(|step| self.values[(from + step) % W].abs())
            .sum()
    }

    fn displacements(&self, from: usize, to: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let from = from % W;
        let reference = self.values[from];
        (1..=self.span(from, to)).map(move |step| {
            let index = (from + step) % W;
            (index, self.displacement_from(reference, index).abs())
        })
    }
}

impl<const W: usize> Default for SlidingWindow<W> {
    fn default() -> Self {
        Self::new()
    }
}
