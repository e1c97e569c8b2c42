use std::collections::VecDeque;
use std::f64::consts::PI;

use num_complex::Complex64;

use crate::acquisition::source::RawSample;

/// Output of the filter for one accepted raw sample.
pub type FilteredSample = f64;

/// Butterworth filter order; the rolling input window keeps `FILTER_ORDER + 1` values.
pub const FILTER_ORDER: usize = 3;
/// ADC sample rate the cutoff is designed against.
pub const SAMPLE_RATE_HZ: f64 = 200.0;
/// Low-pass cutoff frequency.
pub const CUTOFF_HZ: f64 = 50.0;

/// Low-pass Butterworth filter applied one sample at a time.
///
/// Instead of carrying recursive state across calls, each call re-runs the
/// direct-form recurrence over a short window of the most recent
/// `order + 1` raw inputs and keeps the last output. Early outputs
/// therefore differ from a streaming IIR and settle once the window is
/// full; this mirrors the reference capture pipeline exactly and must not
/// be "fixed" into a carried-state implementation.
pub struct StreamFilter {
    b: Vec<f64>,
    a: Vec<f64>,
    window: VecDeque<f64>,
}

impl StreamFilter {
    pub fn new() -> Self {
        let (b, a) = butter_lowpass(FILTER_ORDER, CUTOFF_HZ, SAMPLE_RATE_HZ);
        Self {
            b,
            a,
            window: VecDeque::with_capacity(FILTER_ORDER + 1),
        }
    }

    /// Feeds one raw ADC value and returns the filtered sample.
    pub fn apply(&mut self, raw: RawSample) -> FilteredSample {
        self.window.push_back(f64::from(raw));
        while self.window.len() > FILTER_ORDER + 1 {
            self.window.pop_front();
        }
        let input: Vec<f64> = self.window.iter().copied().collect();
        match lfilter(&self.b, &self.a, &input).last() {
            Some(&value) => value,
            // Unreachable after the push above; kept as the documented fallback.
            None => f64::from(raw),
        }
    }
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Digital Butterworth low-pass design.
///
/// Returns the transfer-function coefficient vectors `(b, a)`, each of
/// length `order + 1` with `a[0] == 1`: analog prototype poles, cutoff
/// pre-warp, low-pass frequency scaling, bilinear transform, then
/// polynomial expansion from the digital zeros and poles. Matches the
/// standard reference design to f64 round-off.
pub fn butter_lowpass(order: usize, cutoff_hz: f64, sample_rate_hz: f64) -> (Vec<f64>, Vec<f64>) {
    // Normalized cutoff in (0, 1), 1.0 being Nyquist.
    let wn = cutoff_hz / (0.5 * sample_rate_hz);

    // Prototype poles, evenly spaced on the left half of the unit circle.
    let mut poles: Vec<Complex64> = (0..order)
        .map(|k| {
            let m = (2 * k + 1) as f64 - order as f64;
            -(Complex64::i() * PI * m / (2.0 * order as f64)).exp()
        })
        .collect();

    // The bilinear transform below runs at fs = 2 samples/s; pre-warp the
    // cutoff so the -3 dB point lands at `wn` after warping.
    let fs = 2.0;
    let warped = 2.0 * fs * (PI * wn / fs).tan();

    // Low-pass frequency scaling of the prototype.
    for p in &mut poles {
        *p *= warped;
    }
    let analog_gain = warped.powi(order as i32);

    // Bilinear transform: s -> 2*fs*(z - 1)/(z + 1). The analog zeros at
    // infinity all map to z = -1.
    let fs2 = 2.0 * fs;
    let digital_poles: Vec<Complex64> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
    let digital_zeros = vec![Complex64::new(-1.0, 0.0); order];
    let denom: Complex64 = poles.iter().map(|&p| fs2 - p).product();
    let gain = (Complex64::new(analog_gain, 0.0) / denom).re;

    let b: Vec<f64> = poly(&digital_zeros).iter().map(|&c| (c * gain).re).collect();
    let a: Vec<f64> = poly(&digital_poles).iter().map(|c| c.re).collect();
    (b, a)
}

/// Expands a monic polynomial from its roots, highest power first.
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        coeffs.push(Complex64::new(0.0, 0.0));
        for i in (1..coeffs.len()).rev() {
            let prev = coeffs[i - 1];
            coeffs[i] -= root * prev;
        }
    }
    coeffs
}

/// Direct-form transfer-function recurrence over a full input slice with
/// zero initial state.
fn lfilter(b: &[f64], a: &[f64], input: &[f64]) -> Vec<f64> {
    let mut output: Vec<f64> = Vec::with_capacity(input.len());
    for n in 0..input.len() {
        let mut acc = 0.0;
        for (i, &bi) in b.iter().enumerate() {
            if n >= i {
                acc += bi * input[n - i];
            }
        }
        for (j, &aj) in a.iter().enumerate().skip(1) {
            if n >= j {
                acc -= aj * output[n - j];
            }
        }
        output.push(acc / a[0]);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn order_three_design_matches_reference_coefficients() {
        // butter(3, 0.5) closed form: b = (1 + z^-1)^3 / 6, a = 1 + z^-2 / 3.
        let (b, a) = butter_lowpass(3, 50.0, 200.0);
        let expected_b = [1.0 / 6.0, 0.5, 0.5, 1.0 / 6.0];
        let expected_a = [1.0, 0.0, 1.0 / 3.0, 0.0];
        assert_eq!(b.len(), 4);
        assert_eq!(a.len(), 4);
        for (got, want) in b.iter().zip(expected_b) {
            assert_close(*got, want, 1e-12);
        }
        for (got, want) in a.iter().zip(expected_a) {
            assert_close(*got, want, 1e-12);
        }
    }

    #[test]
    fn first_order_design_matches_reference_coefficients() {
        // butter(1, 0.5) closed form: b = [0.5, 0.5], a = [1, 0].
        let (b, a) = butter_lowpass(1, 50.0, 200.0);
        assert_close(b[0], 0.5, 1e-12);
        assert_close(b[1], 0.5, 1e-12);
        assert_close(a[0], 1.0, 1e-12);
        assert_close(a[1], 0.0, 1e-12);
    }

    #[test]
    fn early_outputs_follow_windowed_recurrence() {
        // Hand-computed lfilter outputs over the growing window for raw
        // inputs 10, 20, 30, 40 with the fixed design above.
        let mut filter = StreamFilter::new();
        assert_close(filter.apply(10), 10.0 / 6.0, 1e-9);
        assert_close(filter.apply(20), 25.0 / 3.0, 1e-9);
        assert_close(filter.apply(30), 175.0 / 9.0, 1e-9);
        assert_close(filter.apply(40), 275.0 / 9.0, 1e-9);
    }

    #[test]
    fn output_stabilizes_once_window_is_full() {
        // With a constant input the retained window stops changing after
        // order + 1 samples, so every later output is identical.
        let mut filter = StreamFilter::new();
        let outputs: Vec<f64> = (0..10).map(|_| filter.apply(90)).collect();
        assert_close(outputs[3], 100.0, 1e-9);
        for &value in &outputs[3..] {
            assert_eq!(value.to_bits(), outputs[3].to_bits());
        }
    }

    #[test]
    fn replaying_a_sequence_is_deterministic() {
        let sequence: Vec<RawSample> = vec![3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5, 8, 9, 7, 9];
        let mut first = StreamFilter::new();
        let mut second = StreamFilter::new();
        let a: Vec<f64> = sequence.iter().map(|&v| first.apply(v)).collect();
        let b: Vec<f64> = sequence.iter().map(|&v| second.apply(v)).collect();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}
