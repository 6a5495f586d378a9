/// 単調増加の制御点 `(xp, fp)` に対する1次元線形補間
///
/// 範囲外の `x` は端の値にクランプする。`xp` は狭義単調増加であること。
pub fn interp_linear(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    debug_assert!(!xp.is_empty());

    if x <= xp[0] {
        return fp[0];
    }
    let last = xp.len() - 1;
    if x >= xp[last] {
        return fp[last];
    }

    // x が入る区間 [xp[i], xp[i+1]) を二分探索で見つける
    let i = match xp.binary_search_by(|p| p.total_cmp(&x)) {
        Ok(exact) => return fp[exact],
        Err(upper) => upper - 1,
    };

    let t = (x - xp[i]) / (xp[i + 1] - xp[i]);
    fp[i] + t * (fp[i + 1] - fp[i])
}

/// 系列全体の補間 (`np.interp(x, xp, fp)` 相当)
pub fn interp_series(x: &[f64], xp: &[f64], fp: &[f64]) -> Vec<f64> {
    x.iter().map(|&v| interp_linear(v, xp, fp)).collect()
}
