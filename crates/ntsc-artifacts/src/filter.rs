use std::f64::consts::PI;

/// Single-pole IIR lowpass filter. The filter keeps its running output between calls, so the same instance can be fed
/// multiple rows to carry its state from the end of one row into the start of the next.
#[derive(Debug, Clone, Copy)]
pub struct LowpassFilter {
    alpha: f64,
    prev: f64,
}

impl LowpassFilter {
    /// Create a lowpass filter for a signal sampled at `rate` with the given `cutoff` frequency, starting from the
    /// steady-state value `initial`.
    pub fn new(rate: f64, cutoff: f64, initial: f64) -> Self {
        let time_interval = 1.0 / rate;
        let tau = (cutoff * 2.0 * PI).recip();
        let alpha = time_interval / (tau + time_interval);

        LowpassFilter {
            alpha,
            prev: initial,
        }
    }

    /// Create a filter with an explicit smoothing coefficient.
    pub fn with_alpha(alpha: f64, initial: f64) -> Self {
        LowpassFilter {
            alpha,
            prev: initial,
        }
    }

    #[inline(always)]
    pub fn lowpass(&mut self, sample: f64) -> f64 {
        let stage1 = sample * self.alpha;
        let stage2 = self.prev - self.prev * self.alpha;
        self.prev = stage1 + stage2;
        self.prev
    }

    #[inline(always)]
    pub fn highpass(&mut self, sample: f64) -> f64 {
        sample - self.lowpass(sample)
    }

    /// Lowpass a signal in place.
    pub fn lowpass_in_place(&mut self, samples: &mut [f64]) {
        for sample in samples.iter_mut() {
            *sample = self.lowpass(*sample);
        }
    }

    /// Highpass `src` into `dst`. Both must be the same length.
    pub fn highpass_into(&mut self, src: &[f64], dst: &mut [f64]) {
        for (out, sample) in dst.iter_mut().zip(src) {
            *out = self.highpass(*sample);
        }
    }
}

/// Three identical lowpass filters run one after another, each over the entire signal before the next.
#[derive(Debug, Clone, Copy)]
pub struct LowpassCascade {
    stages: [LowpassFilter; 3],
}

impl LowpassCascade {
    pub fn new(rate: f64, cutoff: f64, initial: f64) -> Self {
        LowpassCascade {
            stages: [LowpassFilter::new(rate, cutoff, initial); 3],
        }
    }

    pub fn filter_in_place(&mut self, samples: &mut [f64]) {
        for stage in self.stages.iter_mut() {
            stage.lowpass_in_place(samples);
        }
    }
}
