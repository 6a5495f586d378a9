use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

use crate::error::{MetricError, Result};

/// 離散フーリエ変換のサンプル周波数軸 (`d` はサンプル間隔秒)
///
/// 前半に非負周波数、後半に負周波数が並ぶ標準FFT順。
pub fn fftfreq(n: usize, d: f64) -> Vec<f64> {
    let scale = 1.0 / (n as f64 * d);
    let positive = (n + 1) / 2;
    let mut freqs = Vec::with_capacity(n);
    for i in 0..positive {
        freqs.push(i as f64 * scale);
    }
    for i in 0..(n - positive) {
        freqs.push((i as f64 - (n - positive) as f64) * scale);
    }
    freqs
}

/// ゼロ周波数を中央へ移すシフト
pub fn fftshift<T: Copy>(x: &[T]) -> Vec<T> {
    let split = (x.len() + 1) / 2;
    let mut out = Vec::with_capacity(x.len());
    out.extend_from_slice(&x[split..]);
    out.extend_from_slice(&x[..split]);
    out
}

/// 実数系列の振幅スペクトル
///
/// 戻り値はゼロ周波数を中央に置いた (周波数軸, 2/N 正規化振幅) の組。
pub fn amplitude_spectrum(x: &[f64], d: f64) -> Result<(Vec<f64>, Vec<f64>)> {
    if x.is_empty() {
        return Err(MetricError::data("empty series for spectrum"));
    }
    let n = x.len();

    let mut buffer: Vec<Complex64> = x.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    FftPlanner::new().plan_fft_forward(n).process(&mut buffer);

    let amplitudes: Vec<f64> = buffer.iter().map(|c| 2.0 / n as f64 * c.norm()).collect();
    Ok((fftshift(&fftfreq(n, d)), fftshift(&amplitudes)))
}

/// ヒルベルト変換による解析信号
///
/// 正の周波数成分を2倍、負の成分をゼロにして逆変換する。
pub fn hilbert(x: &[f64]) -> Result<Vec<Complex64>> {
    if x.is_empty() {
        return Err(MetricError::data("empty series for analytic signal"));
    }
    let n = x.len();

    let mut buffer: Vec<Complex64> = x.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    for (i, value) in buffer.iter_mut().enumerate() {
        if i == 0 || (n % 2 == 0 && i == n / 2) {
            // 直流とナイキストはそのまま
        } else if i < (n + 1) / 2 {
            *value *= 2.0;
        } else {
            *value = Complex64::new(0.0, 0.0);
        }
    }

    planner.plan_fft_inverse(n).process(&mut buffer);
    for value in &mut buffer {
        *value /= n as f64;
    }
    Ok(buffer)
}
