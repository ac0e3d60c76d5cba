//! Causal convolution for temporal superposition of load steps.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Inputs at or below this length are convolved directly.
const DIRECT_LIMIT: usize = 256;

/// First `signal.len()` samples of the convolution of `signal` with `kernel`.
///
/// `out[n] = sum_{k <= n} signal[k] * kernel[n - k]`, i.e. the response at
/// step `n` to the steps applied up to and including `n`. Uses FFT
/// overlap-add for long inputs.
pub fn causal_convolve(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n == 0 || kernel.is_empty() {
        return vec![0.0; n];
    }
    // Kernel samples beyond the signal length never contribute
    let kernel = &kernel[..kernel.len().min(n)];

    if n <= DIRECT_LIMIT || kernel.len() <= DIRECT_LIMIT {
        return causal_convolve_direct(signal, kernel);
    }

    let fft_size = (2 * kernel.len()).next_power_of_two();
    let block_size = fft_size - kernel.len() + 1;

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(fft_size);
    let ifft = planner.plan_fft_inverse(fft_size);

    let mut kernel_fft = zero_padded(kernel, fft_size);
    fft.process(&mut kernel_fft);

    let mut output = vec![0.0; n];
    let scale = 1.0 / fft_size as f64;

    let mut pos = 0;
    while pos < n {
        let end = (pos + block_size).min(n);
        let mut block = zero_padded(&signal[pos..end], fft_size);

        fft.process(&mut block);
        for (b, k) in block.iter_mut().zip(kernel_fft.iter()) {
            *b *= k;
        }
        ifft.process(&mut block);

        // Only the part landing inside the output window is kept
        let valid_len = (end - pos + kernel.len() - 1).min(n - pos);
        for i in 0..valid_len {
            output[pos + i] += block[i].re * scale;
        }

        pos += block_size;
    }

    output
}

fn zero_padded(values: &[f64], len: usize) -> Vec<Complex<f64>> {
    values
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat_n(
            Complex::new(0.0, 0.0),
            len - values.len(),
        ))
        .collect()
}

fn causal_convolve_direct(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mut output = vec![0.0; n];
    for (i, &s) in signal.iter().enumerate() {
        if s == 0.0 {
            continue;
        }
        for (j, &k) in kernel.iter().enumerate().take(n - i) {
            output[i + j] += s * k;
        }
    }
    output
}
