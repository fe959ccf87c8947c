// 推測統計・仮説検定モジュール

use crate::error::{Error, Result};
use crate::stats::PairedTTestResult;

/// 標準正規分布のCDF（累積分布関数）を計算
fn normal_cdf(z: f64) -> f64 {
    // 誤差関数の近似計算（純Rustで実装）
    // 標準正規分布のCDFの近似計算（Abramowitz and Stegun近似式）
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if z < 0.0 { -1.0 } else { 1.0 };
    let x = z.abs() / (2.0_f64).sqrt();

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    0.5 * (1.0 + sign * y)
}

/// t分布のCDF（累積分布関数）を計算
fn t_distribution_cdf(t: f64, df: usize) -> f64 {
    // 自由度が大きい場合は標準正規分布の近似を利用
    if df > 30 {
        return normal_cdf(t);
    }

    // 自由度が小さい場合の簡略化した近似
    let df_f64 = df as f64;
    let x = df_f64 / (df_f64 + t * t);
    let a = 0.5 * df_f64;

    if t > 0.0 {
        1.0 - 0.5 * x.powf(a)
    } else {
        0.5 * x.powf(a)
    }
}

/// 対応のあるt検定を実行する内部実装
///
/// 2つの標本は同じ順序で対応している必要があります
/// （例: 同じ分割に対する2つのモデルのメトリクス値）。
pub(crate) fn paired_ttest_impl(
    sample1: &[f64],
    sample2: &[f64],
    alpha: f64,
) -> Result<PairedTTestResult> {
    if sample1.len() != sample2.len() {
        return Err(Error::LengthMismatch {
            expected: sample1.len(),
            actual: sample2.len(),
        });
    }

    let n = sample1.len();
    if n < 2 {
        return Err(Error::InsufficientData(
            "対応のあるt検定には少なくとも2組のデータポイントが必要です".into(),
        ));
    }

    // ペア差分の平均と標準偏差
    let diffs: Vec<f64> = sample1
        .iter()
        .zip(sample2.iter())
        .map(|(&a, &b)| a - b)
        .collect();

    let mean_diff = diffs.iter().sum::<f64>() / n as f64;
    let var_diff = diffs
        .iter()
        .map(|&d| (d - mean_diff).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    let std_err = (var_diff / n as f64).sqrt();

    if std_err == 0.0 {
        // すべてのペア差分が等しい場合、検定統計量は定義できない
        return Err(Error::DegenerateColumn(
            "ペア差分に分散がありません".into(),
        ));
    }

    let t_stat = mean_diff / std_err;
    let df = n - 1;

    // 両側検定のp値計算
    let p_value = 2.0 * (1.0 - t_distribution_cdf(t_stat.abs(), df));

    Ok(PairedTTestResult {
        statistic: t_stat,
        pvalue: p_value,
        df,
        mean_diff,
        significant: p_value < alpha,
    })
}
