use crate::error::{MetricError, Result};
use crate::signal::butterworth::solve_linear;

/// Savitzky-Golayフィルタ
///
/// 中央部は固定FIR係数の畳み込み、両端は窓1つ分の最小二乗
/// 多項式フィッティングで外挿する。`window` は奇数、
/// `polyorder < window`、系列長は `window` 以上であること。
pub fn savgol_filter(x: &[f64], window: usize, polyorder: usize) -> Result<Vec<f64>> {
    if window == 0 || window % 2 == 0 {
        return Err(MetricError::parameter(
            "Window Length",
            format!("{window} must be a positive odd number"),
        ));
    }
    if polyorder >= window {
        return Err(MetricError::parameter(
            "Poly Order",
            format!("{polyorder} must be less than window length {window}"),
        ));
    }
    if x.len() < window {
        return Err(MetricError::data(format!(
            "series too short for smoothing: {} < window length {}",
            x.len(),
            window
        )));
    }

    let half = window / 2;
    let coeffs = central_coeffs(window, polyorder)?;

    let mut y = vec![0.0; x.len()];
    for i in half..(x.len() - half) {
        let mut acc = 0.0;
        for (j, &c) in coeffs.iter().enumerate() {
            acc += c * x[i - half + j];
        }
        y[i] = acc;
    }

    // 先頭: 最初の窓に多項式を当てて端まで評価し直す
    let ts: Vec<f64> = (0..window).map(|i| i as f64 - half as f64).collect();
    let front = polyfit(&ts, &x[..window], polyorder)?;
    for (i, slot) in y.iter_mut().take(half).enumerate() {
        *slot = polyval(&front, i as f64 - half as f64);
    }

    // 末尾も同様
    let back = polyfit(&ts, &x[x.len() - window..], polyorder)?;
    for i in (x.len() - half)..x.len() {
        let t = i as f64 - (x.len() - 1 - half) as f64;
        y[i] = polyval(&back, t);
    }

    Ok(y)
}

/// 窓中央を評価点とする平滑化FIR係数
fn central_coeffs(window: usize, polyorder: usize) -> Result<Vec<f64>> {
    let half = window / 2;
    let ts: Vec<f64> = (0..window).map(|i| i as f64 - half as f64).collect();

    // (A^T A) w = e0 を解き c = A w とする。c はt=0での
    // 最小二乗フィット値を与える線形結合係数になる。
    let dim = polyorder + 1;
    let mut ata = vec![vec![0.0; dim]; dim];
    for &t in &ts {
        let mut powers = vec![1.0; dim];
        for j in 1..dim {
            powers[j] = powers[j - 1] * t;
        }
        for j in 0..dim {
            for k in 0..dim {
                ata[j][k] += powers[j] * powers[k];
            }
        }
    }
    let mut e0 = vec![0.0; dim];
    e0[0] = 1.0;
    let w = solve_linear(ata, e0)?;

    Ok(ts
        .iter()
        .map(|&t| {
            let mut acc = 0.0;
            let mut tn = 1.0;
            for &wj in &w {
                acc += wj * tn;
                tn *= t;
            }
            acc
        })
        .collect())
}

/// 最小二乗多項式フィッティング（正規方程式）
fn polyfit(ts: &[f64], xs: &[f64], degree: usize) -> Result<Vec<f64>> {
    let dim = degree + 1;
    let mut ata = vec![vec![0.0; dim]; dim];
    let mut atx = vec![0.0; dim];
    for (&t, &x) in ts.iter().zip(xs) {
        let mut powers = vec![1.0; dim];
        for j in 1..dim {
            powers[j] = powers[j - 1] * t;
        }
        for j in 0..dim {
            atx[j] += powers[j] * x;
            for k in 0..dim {
                ata[j][k] += powers[j] * powers[k];
            }
        }
    }
    solve_linear(ata, atx)
}

fn polyval(coeffs: &[f64], t: f64) -> f64 {
    let mut acc = 0.0;
    let mut tn = 1.0;
    for &c in coeffs {
        acc += c * tn;
        tn *= t;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_savgol_rejects_bad_parameters() {
        let x = vec![1.0; 30];
        assert!(savgol_filter(&x, 24, 5).is_err());
        assert!(savgol_filter(&x, 0, 5).is_err());
        assert!(savgol_filter(&x, 5, 5).is_err());
        assert!(savgol_filter(&x, 25, 5).is_ok());
    }

    #[test]
    fn test_savgol_rejects_short_series() {
        let x = vec![1.0; 24];
        assert!(savgol_filter(&x, 25, 5).is_err());
    }

    #[test]
    fn test_savgol_reproduces_polynomial_exactly() {
        // 次数以下の多項式は平滑化で変化しない
        let x: Vec<f64> = (0..60)
            .map(|i| {
                let t = i as f64;
                0.5 * t * t * t - 2.0 * t * t + 3.0 * t - 7.0
            })
            .collect();
        let y = savgol_filter(&x, 25, 5).unwrap();
        for (i, (&a, &b)) in x.iter().zip(&y).enumerate() {
            assert!(approx_eq(a, b, 1e-5 * a.abs().max(1.0)), "index {i}: {a} vs {b}");
        }
    }

    #[test]
    fn test_savgol_preserves_constant_series() {
        let x = vec![3.5; 40];
        let y = savgol_filter(&x, 25, 5).unwrap();
        for &v in &y {
            assert!(approx_eq(v, 3.5, 1e-9));
        }
    }

    #[test]
    fn test_savgol_smooths_noise() {
        // 正弦波 + 高周波ジッタで分散が下がること
        let x: Vec<f64> = (0..200)
            .map(|i| {
                let t = i as f64;
                (0.05 * t).sin() + if i % 2 == 0 { 0.2 } else { -0.2 }
            })
            .collect();
        let y = savgol_filter(&x, 25, 5).unwrap();
        let clean: Vec<f64> = (0..200).map(|i| (0.05 * i as f64).sin()).collect();
        let err_raw: f64 = x.iter().zip(&clean).map(|(a, b)| (a - b).powi(2)).sum();
        let err_smooth: f64 = y.iter().zip(&clean).map(|(a, b)| (a - b).powi(2)).sum();
        assert!(
            err_smooth < err_raw / 10.0,
            "smoothing did not reduce error: {err_smooth} vs {err_raw}"
        );
    }

    #[test]
    fn test_savgol_output_length_matches_input() {
        let x: Vec<f64> = (0..33).map(|i| i as f64).collect();
        let y = savgol_filter(&x, 25, 5).unwrap();
        assert_eq!(y.len(), x.len());
    }
}
