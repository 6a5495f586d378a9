use std::collections::HashMap;

use crate::error::{MetricError, Result};
use crate::signal::peak_finding::Bound;

/// UI由来の文字列パラメータマップ
///
/// 空文字列・未設定はデフォルト値の使用を意味する。`"low,high"` 形式は
/// 区間指定をサポートするパラメータでのみ受け付ける。パースは
/// `calculate` の数値処理より前に行い、不正入力は `ParameterError` に
/// する。
#[derive(Debug, Clone, Default)]
pub struct Parameters(HashMap<String, String>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// 生の文字列値。未設定・空文字列は `None`
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// スカラー数値パラメータ。カンマを含む値は拒否する。
    pub fn scalar(&self, name: &str) -> Result<Option<f64>> {
        match self.raw(name) {
            None => Ok(None),
            Some(raw) if raw.contains(',') => Err(MetricError::parameter(
                name,
                format!("'{raw}' is a range but a single number is expected"),
            )),
            Some(raw) => parse_number(name, raw).map(Some),
        }
    }

    /// 正の整数パラメータ（フィルタ次数、窓長など）
    pub fn integer(&self, name: &str) -> Result<Option<usize>> {
        match self.scalar(name)? {
            None => Ok(None),
            Some(value) => {
                if value.fract() != 0.0 || value < 0.0 {
                    return Err(MetricError::parameter(
                        name,
                        format!("{value} is not a non-negative integer"),
                    ));
                }
                Ok(Some(value as usize))
            }
        }
    }

    /// 下限スカラーまたは `"low,high"` 区間
    pub fn bound(&self, name: &str) -> Result<Option<Bound>> {
        let raw = match self.raw(name) {
            None => return Ok(None),
            Some(raw) => raw,
        };

        if let Some((low, high)) = raw.split_once(',') {
            let low = parse_number(name, low.trim())?;
            let high = parse_number(name, high.trim())?;
            if low > high {
                return Err(MetricError::parameter(
                    name,
                    format!("lower bound {low} exceeds upper bound {high}"),
                ));
            }
            Ok(Some(Bound::between(low, high)))
        } else {
            Ok(Some(Bound::at_least(parse_number(name, raw)?)))
        }
    }
}

fn parse_number(name: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| MetricError::parameter(name, format!("'{raw}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string_means_default() {
        let params = Parameters::new().set("Order", "");
        assert_eq!(params.scalar("Order").unwrap(), None);
        assert_eq!(params.scalar("Cutoff Freq.").unwrap(), None);
    }

    #[test]
    fn test_scalar_parsing() {
        let params = Parameters::new().set("Cutoff Freq.", "2.5");
        assert_eq!(params.scalar("Cutoff Freq.").unwrap(), Some(2.5));
    }

    #[test]
    fn test_scalar_rejects_range() {
        let params = Parameters::new().set("Distance", "1,5");
        assert!(params.scalar("Distance").is_err());
    }

    #[test]
    fn test_scalar_rejects_garbage() {
        let params = Parameters::new().set("Order", "four");
        let err = params.scalar("Order").unwrap_err();
        assert!(err.to_string().contains("Order"));
    }

    #[test]
    fn test_integer_rejects_fraction() {
        let params = Parameters::new().set("Order", "4.5");
        assert!(params.integer("Order").is_err());
        let params = Parameters::new().set("Order", "4");
        assert_eq!(params.integer("Order").unwrap(), Some(4));
    }

    #[test]
    fn test_bound_scalar_is_lower_bound() {
        let params = Parameters::new().set("Height", "3.0");
        assert_eq!(params.bound("Height").unwrap(), Some(Bound::at_least(3.0)));
    }

    #[test]
    fn test_bound_pair() {
        let params = Parameters::new().set("Height", "1.5, 4.0");
        assert_eq!(
            params.bound("Height").unwrap(),
            Some(Bound::between(1.5, 4.0))
        );
    }

    #[test]
    fn test_bound_pair_order_checked() {
        let params = Parameters::new().set("Height", "4.0,1.5");
        assert!(params.bound("Height").is_err());
    }
}
