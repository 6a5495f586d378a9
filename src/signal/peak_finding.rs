use crate::error::{MetricError, Result};

/// 片側または両側の制約区間
///
/// 下限のみ (スカラー指定) か、下限と上限の両方 (区間指定) を持つ。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bound {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

impl Bound {
    pub fn at_least(lower: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: None,
        }
    }

    pub fn between(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(lower),
            upper: Some(upper),
        }
    }

    fn contains(&self, value: f64) -> bool {
        self.lower.map_or(true, |lo| value >= lo) && self.upper.map_or(true, |hi| value <= hi)
    }
}

/// ピーク探索の制約パラメータ。未指定の制約は適用しない。
#[derive(Debug, Clone)]
pub struct PeakParams {
    pub height: Option<Bound>,
    pub threshold: Option<Bound>,
    pub distance: Option<f64>,
    pub prominence: Option<Bound>,
    pub width: Option<Bound>,
    pub wlen: Option<usize>,
    pub rel_height: f64,
    pub plateau_size: Option<Bound>,
}

impl Default for PeakParams {
    fn default() -> Self {
        Self {
            height: None,
            threshold: None,
            distance: None,
            prominence: None,
            width: None,
            wlen: None,
            rel_height: 0.5,
            plateau_size: None,
        }
    }
}

/// 系列の局所極大インデックスを制約付きで探す
///
/// プラトー（同値が続く頂上）は中央のインデックスを返す。制約は
/// プラトー幅 → 高さ → 隣接差分 → 距離 → プロミネンス → 幅 の順に
/// 適用する。系列の両端はピークにならない。
pub fn find_peaks(x: &[f64], params: &PeakParams) -> Result<Vec<usize>> {
    if let Some(distance) = params.distance {
        if distance < 1.0 {
            return Err(MetricError::parameter("Distance", "must be at least 1"));
        }
    }
    if let Some(wlen) = params.wlen {
        if wlen < 2 {
            return Err(MetricError::parameter("Window Len.", "must be at least 2"));
        }
    }
    if params.rel_height < 0.0 {
        return Err(MetricError::parameter("Rel. Height", "must not be negative"));
    }

    let (mut peaks, left_edges, right_edges) = local_maxima(x);

    if let Some(bound) = params.plateau_size {
        let keep: Vec<bool> = left_edges
            .iter()
            .zip(&right_edges)
            .map(|(&l, &r)| bound.contains((r - l + 1) as f64))
            .collect();
        apply_keep(&mut peaks, &keep);
    }

    if let Some(bound) = params.height {
        let keep: Vec<bool> = peaks.iter().map(|&p| bound.contains(x[p])).collect();
        apply_keep(&mut peaks, &keep);
    }

    if let Some(bound) = params.threshold {
        let keep: Vec<bool> = peaks
            .iter()
            .map(|&p| {
                let left = x[p] - x[p - 1];
                let right = x[p] - x[p + 1];
                bound.lower.map_or(true, |lo| left.min(right) >= lo)
                    && bound.upper.map_or(true, |hi| left.max(right) <= hi)
            })
            .collect();
        apply_keep(&mut peaks, &keep);
    }

    if let Some(distance) = params.distance {
        let priority: Vec<f64> = peaks.iter().map(|&p| x[p]).collect();
        let keep = select_by_distance(&peaks, &priority, distance);
        apply_keep(&mut peaks, &keep);
    }

    if params.prominence.is_some() || params.width.is_some() {
        let (mut prominences, mut left_bases, mut right_bases) =
            peak_prominences(x, &peaks, params.wlen);

        if let Some(bound) = params.prominence {
            let keep: Vec<bool> = prominences.iter().map(|&p| bound.contains(p)).collect();
            apply_keep(&mut peaks, &keep);
            apply_keep(&mut prominences, &keep);
            apply_keep(&mut left_bases, &keep);
            apply_keep(&mut right_bases, &keep);
        }

        if let Some(bound) = params.width {
            let widths = peak_widths(
                x,
                &peaks,
                params.rel_height,
                &prominences,
                &left_bases,
                &right_bases,
            );
            let keep: Vec<bool> = widths.iter().map(|&w| bound.contains(w)).collect();
            apply_keep(&mut peaks, &keep);
        }
    }

    Ok(peaks)
}

fn apply_keep<T: Copy>(values: &mut Vec<T>, keep: &[bool]) {
    let mut iter = keep.iter();
    values.retain(|_| *iter.next().unwrap_or(&false));
}

/// プラトー対応の局所極大探索
/// 戻り値: (中央インデックス, 左端, 右端)
fn local_maxima(x: &[f64]) -> (Vec<usize>, Vec<usize>, Vec<usize>) {
    let mut midpoints = Vec::new();
    let mut left_edges = Vec::new();
    let mut right_edges = Vec::new();
    if x.len() < 3 {
        return (midpoints, left_edges, right_edges);
    }

    let i_max = x.len() - 1;
    let mut i = 1;
    while i < i_max {
        if x[i - 1] < x[i] {
            let mut i_ahead = i + 1;
            while i_ahead < i_max && x[i_ahead] == x[i] {
                i_ahead += 1;
            }
            if x[i_ahead] < x[i] {
                let left = i;
                let right = i_ahead - 1;
                midpoints.push((left + right) / 2);
                left_edges.push(left);
                right_edges.push(right);
                i = i_ahead;
            }
        }
        i += 1;
    }
    (midpoints, left_edges, right_edges)
}

/// 距離制約: 高いピークを優先して近接ピークを間引く
fn select_by_distance(peaks: &[usize], priority: &[f64], distance: f64) -> Vec<bool> {
    let n = peaks.len();
    let mut keep = vec![true; n];
    let distance = distance.ceil();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| priority[a].total_cmp(&priority[b]));

    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        let mut k = j;
        while k > 0 && ((peaks[j] - peaks[k - 1]) as f64) < distance {
            keep[k - 1] = false;
            k -= 1;
        }
        let mut k = j + 1;
        while k < n && ((peaks[k] - peaks[j]) as f64) < distance {
            keep[k] = false;
            k += 1;
        }
    }
    keep
}

/// 各ピークのプロミネンス（基準線からの突出量）
/// 戻り値: (プロミネンス, 左ベース, 右ベース)
fn peak_prominences(
    x: &[f64],
    peaks: &[usize],
    wlen: Option<usize>,
) -> (Vec<f64>, Vec<usize>, Vec<usize>) {
    let mut prominences = Vec::with_capacity(peaks.len());
    let mut left_bases = Vec::with_capacity(peaks.len());
    let mut right_bases = Vec::with_capacity(peaks.len());

    for &peak in peaks {
        let mut i_min = 0usize;
        let mut i_max = x.len() - 1;
        if let Some(wlen) = wlen {
            i_min = i_min.max(peak.saturating_sub(wlen / 2));
            i_max = i_max.min(peak + wlen / 2);
        }

        let mut left_min = x[peak];
        let mut left_base = peak;
        let mut i = peak as isize;
        while i >= i_min as isize && x[i as usize] <= x[peak] {
            if x[i as usize] < left_min {
                left_min = x[i as usize];
                left_base = i as usize;
            }
            i -= 1;
        }

        let mut right_min = x[peak];
        let mut right_base = peak;
        let mut i = peak;
        while i <= i_max && x[i] <= x[peak] {
            if x[i] < right_min {
                right_min = x[i];
                right_base = i;
            }
            i += 1;
        }

        prominences.push(x[peak] - left_min.max(right_min));
        left_bases.push(left_base);
        right_bases.push(right_base);
    }
    (prominences, left_bases, right_bases)
}

/// 相対高さ `rel_height` における各ピークの幅（サンプル数、補間つき）
fn peak_widths(
    x: &[f64],
    peaks: &[usize],
    rel_height: f64,
    prominences: &[f64],
    left_bases: &[usize],
    right_bases: &[usize],
) -> Vec<f64> {
    let mut widths = Vec::with_capacity(peaks.len());
    for (idx, &peak) in peaks.iter().enumerate() {
        let i_min = left_bases[idx];
        let i_max = right_bases[idx];
        let height = x[peak] - prominences[idx] * rel_height;

        let mut i = peak;
        while i_min < i && height < x[i] {
            i -= 1;
        }
        let mut left_ip = i as f64;
        if x[i] < height {
            left_ip += (height - x[i]) / (x[i + 1] - x[i]);
        }

        let mut i = peak;
        while i < i_max && height < x[i] {
            i += 1;
        }
        let mut right_ip = i as f64;
        if x[i] < height {
            right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
        }

        widths.push(right_ip - left_ip);
    }
    widths
}
