// resamplrs 統計モジュール
//
// このモジュールは、リサンプリング評価のための統計機能を提供します。
// 記述統計と、モデル比較に使用する対応のあるt検定が実装されています。

pub mod descriptive;
pub mod inference;

use crate::error::Result;

/// 記述統計量の結果を保持する構造体
#[derive(Debug, Clone)]
pub struct DescriptiveStats {
    /// データの件数
    pub count: usize,
    /// 平均値
    pub mean: f64,
    /// 標準偏差（不偏推定量）
    pub std: f64,
    /// 最小値
    pub min: f64,
    /// 25%分位点
    pub q1: f64,
    /// 中央値（50%分位点）
    pub median: f64,
    /// 75%分位点
    pub q3: f64,
    /// 最大値
    pub max: f64,
}

/// データの基本統計量を計算
///
/// # 説明
/// 数値データに対する基本的な記述統計量（平均、標準偏差、最小値、最大値など）を計算します。
///
/// # 例
/// ```rust
/// use resamplrs::stats;
///
/// let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
/// let stats = stats::describe(&data).unwrap();
/// println!("平均: {}", stats.mean);
/// println!("標準偏差: {}", stats.std);
/// ```
pub fn describe<T: AsRef<[f64]>>(data: T) -> Result<DescriptiveStats> {
    descriptive::describe_impl(data.as_ref())
}

/// 平均値を計算
pub fn mean<T: AsRef<[f64]>>(data: T) -> Result<f64> {
    descriptive::mean_impl(data.as_ref())
}

/// 標準偏差を計算（不偏推定量）
pub fn std<T: AsRef<[f64]>>(data: T) -> Result<f64> {
    descriptive::std_impl(data.as_ref())
}

/// 分位点を計算（線形補間）
pub fn quantile<T: AsRef<[f64]>>(data: T, q: f64) -> Result<f64> {
    descriptive::quantile_impl(data.as_ref(), q)
}

/// 対応のあるt検定の結果
#[derive(Debug, Clone)]
pub struct PairedTTestResult {
    /// t統計量
    pub statistic: f64,
    /// p値
    pub pvalue: f64,
    /// 自由度
    pub df: usize,
    /// ペア差分の平均
    pub mean_diff: f64,
    /// 有意水準で有意か
    pub significant: bool,
}

/// 対応のあるt検定を実行
///
/// # 説明
/// 同じ分割の上で評価された2つのモデルのメトリクス値のように、
/// 対応のある2つの標本の平均差を検定します。
///
/// # 例
/// ```rust
/// use resamplrs::stats;
///
/// let model_a = vec![0.80, 0.82, 0.79, 0.85, 0.81];
/// let model_b = vec![0.75, 0.78, 0.74, 0.80, 0.77];
/// let result = stats::paired_ttest(&model_a, &model_b, 0.05).unwrap();
/// println!("t統計量: {}", result.statistic);
/// println!("p値: {}", result.pvalue);
/// ```
pub fn paired_ttest<T: AsRef<[f64]>, U: AsRef<[f64]>>(
    sample1: T,
    sample2: U,
    alpha: f64,
) -> Result<PairedTTestResult> {
    inference::paired_ttest_impl(sample1.as_ref(), sample2.as_ref(), alpha)
}
