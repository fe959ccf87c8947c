// 記述統計モジュール

use crate::error::{Error, Result};
use crate::stats::DescriptiveStats;

/// 平均値を計算する内部実装
pub(crate) fn mean_impl(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::EmptyData("平均の計算にはデータが必要です".into()));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// 標準偏差（不偏推定量）を計算する内部実装
pub(crate) fn std_impl(data: &[f64]) -> Result<f64> {
    if data.len() < 2 {
        return Err(Error::InsufficientData(
            "標準偏差には少なくとも2つのデータポイントが必要です".into(),
        ));
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let var = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (data.len() - 1) as f64;
    Ok(var.sqrt())
}

/// 分位点を計算する内部実装（線形補間）
pub(crate) fn quantile_impl(data: &[f64], q: f64) -> Result<f64> {
    if data.is_empty() {
        return Err(Error::EmptyData("分位点の計算にはデータが必要です".into()));
    }
    if !(0.0..=1.0).contains(&q) {
        return Err(Error::InvalidValue(format!(
            "分位点は0から1の範囲で指定してください: {}",
            q
        )));
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;

    if lower == upper {
        Ok(sorted[lower])
    } else {
        let weight = pos - lower as f64;
        Ok(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
    }
}

/// 基本統計量を計算する内部実装
pub(crate) fn describe_impl(data: &[f64]) -> Result<DescriptiveStats> {
    if data.is_empty() {
        return Err(Error::EmptyData("記述統計にはデータが必要です".into()));
    }

    let mean = mean_impl(data)?;
    let std = if data.len() < 2 { 0.0 } else { std_impl(data)? };
    let min = data.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Ok(DescriptiveStats {
        count: data.len(),
        mean,
        std,
        min,
        q1: quantile_impl(data, 0.25)?,
        median: quantile_impl(data, 0.5)?,
        q3: quantile_impl(data, 0.75)?,
        max,
    })
}
