use num_complex::Complex64;

use crate::error::{MetricError, Result};

/// フィルタ通過帯域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Lowpass,
    Highpass,
}

/// IIRフィルタ係数 (分子 b / 分母 a、a[0] = 1 に正規化済み)
#[derive(Debug, Clone)]
pub struct FilterCoefficients {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

/// バターワースフィルタ設計
///
/// アナログプロトタイプの極を双一次変換でz平面へ写像する。
/// `cutoff` はHz単位で、ナイキスト周波数 (fs/2) 未満であること。
pub fn butter(order: usize, cutoff: f64, fs: f64, band: Band) -> Result<FilterCoefficients> {
    if order == 0 {
        return Err(MetricError::parameter("Order", "must be at least 1"));
    }
    let nyquist = fs / 2.0;
    if !(cutoff > 0.0 && cutoff < nyquist) {
        return Err(MetricError::parameter(
            "Cutoff Freq.",
            format!("{cutoff} Hz is outside (0, {nyquist}) for fs = {fs} Hz"),
        ));
    }

    // 正規化カットオフのプリワーピング (内部サンプリング周波数 2 Hz)
    let wn = cutoff / nyquist;
    let warped = 4.0 * (std::f64::consts::PI * wn / 2.0).tan();

    // プロトタイプ極: 単位円左半面に等間隔
    let n = order as f64;
    let mut poles: Vec<Complex64> = (0..order)
        .map(|k| {
            let theta = std::f64::consts::PI * (2.0 * k as f64 + n + 1.0) / (2.0 * n);
            Complex64::new(theta.cos(), theta.sin())
        })
        .collect();

    // 周波数変換と零点配置
    let zeros: Vec<Complex64> = match band {
        Band::Lowpass => {
            for p in &mut poles {
                *p *= warped;
            }
            // s無限遠の零点は双一次変換で z = -1 に集まる
            vec![Complex64::new(-1.0, 0.0); order]
        }
        Band::Highpass => {
            for p in &mut poles {
                *p = warped / *p;
            }
            // s = 0 の零点は z = 1 に写る
            vec![Complex64::new(1.0, 0.0); order]
        }
    };

    // 双一次変換 z = (4 + s) / (4 - s)
    let z_poles: Vec<Complex64> = poles
        .iter()
        .map(|&s| (Complex64::new(4.0, 0.0) + s) / (Complex64::new(4.0, 0.0) - s))
        .collect();

    let mut b = poly_from_roots(&zeros);
    let a = poly_from_roots(&z_poles);

    // 利得正規化: LPは直流、HPはナイキストで振幅1
    let gain = match band {
        Band::Lowpass => eval_ratio_at(&b, &a, 1.0),
        Band::Highpass => eval_ratio_at(&b, &a, -1.0),
    };
    for coef in &mut b {
        *coef /= gain;
    }

    Ok(FilterCoefficients { b, a })
}

/// 複素根から実係数多項式を組み立てる（根は共役対で与えられること）
fn poly_from_roots(roots: &[Complex64]) -> Vec<f64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex64::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs.iter().map(|c| c.re).collect()
}

/// H(z) = B(z)/A(z) を実数 z で評価（係数は z^-1 の昇冪）
fn eval_ratio_at(b: &[f64], a: &[f64], z: f64) -> f64 {
    let eval = |coeffs: &[f64]| -> f64 {
        let mut acc = 0.0;
        let mut zn = 1.0;
        for &c in coeffs {
            acc += c * zn;
            zn *= z.recip();
        }
        acc
    };
    eval(b) / eval(a)
}

/// 直接型II転置構造のIIRフィルタ適用
///
/// `zi` は初期状態（長さ max(len(a),len(b)) - 1）。Noneならゼロ初期化。
pub fn lfilter(coeffs: &FilterCoefficients, x: &[f64], zi: Option<&[f64]>) -> Vec<f64> {
    let n = coeffs.a.len().max(coeffs.b.len());
    let mut b = coeffs.b.clone();
    let mut a = coeffs.a.clone();
    b.resize(n, 0.0);
    a.resize(n, 0.0);

    let mut state = match zi {
        Some(zi) => zi.to_vec(),
        None => vec![0.0; n - 1],
    };

    let mut y = Vec::with_capacity(x.len());
    for &xn in x {
        let yn = b[0] * xn + state.first().copied().unwrap_or(0.0);
        for i in 0..state.len() {
            let carry = if i + 1 < state.len() { state[i + 1] } else { 0.0 };
            state[i] = b[i + 1] * xn + carry - a[i + 1] * yn;
        }
        y.push(yn);
    }
    y
}

/// 定常状態の初期フィルタ状態
///
/// 単位入力の定常応答に一致する状態ベクトルを (I - A^T) zi = B の
/// 線形方程式で解く。filtfiltの端点過渡を抑えるために使う。
pub fn lfilter_zi(coeffs: &FilterCoefficients) -> Result<Vec<f64>> {
    let n = coeffs.a.len().max(coeffs.b.len());
    if n < 2 {
        return Ok(Vec::new());
    }
    let mut b = coeffs.b.clone();
    let mut a = coeffs.a.clone();
    b.resize(n, 0.0);
    a.resize(n, 0.0);

    let dim = n - 1;
    // I - companion(a)^T
    let mut m = vec![vec![0.0; dim]; dim];
    for i in 0..dim {
        m[i][i] = 1.0;
        m[i][0] += a[i + 1];
        if i + 1 < dim {
            m[i][i + 1] -= 1.0;
        }
    }
    let rhs: Vec<f64> = (0..dim).map(|i| b[i + 1] - a[i + 1] * b[0]).collect();
    solve_linear(m, rhs)
}

/// 部分ピボット選択付きガウス消去法
pub(crate) fn solve_linear(mut m: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Result<Vec<f64>> {
    let dim = rhs.len();
    for col in 0..dim {
        let pivot_row = (col..dim)
            .max_by(|&r1, &r2| m[r1][col].abs().total_cmp(&m[r2][col].abs()))
            .unwrap_or(col);
        if m[pivot_row][col].abs() < 1e-14 {
            return Err(MetricError::data("singular system in filter state solve"));
        }
        m.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..dim {
            let factor = m[row][col] / m[col][col];
            for k in col..dim {
                m[row][k] -= factor * m[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = vec![0.0; dim];
    for row in (0..dim).rev() {
        let mut acc = rhs[row];
        for k in (row + 1)..dim {
            acc -= m[row][k] * x[k];
        }
        x[row] = acc / m[row][row];
    }
    Ok(x)
}

/// ゼロ位相フィルタリング（前進・後退の2パス適用）
///
/// 端点は奇対称拡張でパディングする。系列長がパディング長以下の場合は
/// エラー。
pub fn filtfilt(coeffs: &FilterCoefficients, x: &[f64]) -> Result<Vec<f64>> {
    let n = coeffs.a.len().max(coeffs.b.len());
    let padlen = 3 * n;
    if x.len() <= padlen {
        return Err(MetricError::data(format!(
            "series too short for zero-phase filtering: {} <= pad length {}",
            x.len(),
            padlen
        )));
    }

    // 奇対称拡張: 端の値を中心に反転した鏡像を前後に付ける
    let mut ext = Vec::with_capacity(x.len() + 2 * padlen);
    let first = x[0];
    let last = x[x.len() - 1];
    for i in (1..=padlen).rev() {
        ext.push(2.0 * first - x[i]);
    }
    ext.extend_from_slice(x);
    for i in 2..=(padlen + 1) {
        ext.push(2.0 * last - x[x.len() - i]);
    }

    let zi = lfilter_zi(coeffs)?;

    let scaled = |scale: f64| -> Vec<f64> { zi.iter().map(|&z| z * scale).collect() };

    let forward = lfilter(coeffs, &ext, Some(&scaled(ext[0])));

    let mut reversed: Vec<f64> = forward.iter().rev().copied().collect();
    let backward = lfilter(coeffs, &reversed, Some(&scaled(reversed[0])));
    reversed = backward.iter().rev().copied().collect();

    Ok(reversed[padlen..padlen + x.len()].to_vec())
}
