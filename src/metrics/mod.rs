//! モデル評価メトリクスモジュール
//!
//! 回帰・分類モデルの評価指標と、分割ごとの評価結果をまとめる
//! エバリュエータを提供します。

pub mod classification;
pub mod regression;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 回帰評価で使用するメトリクスの指定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// 平均二乗誤差
    Mse,
    /// 二乗平均平方根誤差
    Rmse,
    /// 平均絶対誤差
    Mae,
    /// 決定係数
    RSquared,
}

impl Metric {
    /// メトリクスの名前を取得
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Mse => "mse",
            Metric::Rmse => "rmse",
            Metric::Mae => "mae",
            Metric::RSquared => "r_squared",
        }
    }

    /// 真の値と予測値からメトリクスを計算
    pub fn compute(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
        match self {
            Metric::Mse => regression::mean_squared_error(y_true, y_pred),
            Metric::Rmse => regression::root_mean_squared_error(y_true, y_pred),
            Metric::Mae => regression::mean_absolute_error(y_true, y_pred),
            Metric::RSquared => regression::r2_score(y_true, y_pred),
        }
    }
}

/// 1つの分割に対する評価結果: メトリクス名から値への順序付きマッピング
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    values: Vec<(String, f64)>,
}

impl MetricReport {
    /// 新しい空のMetricReportを作成
    pub fn new() -> Self {
        MetricReport { values: Vec::new() }
    }

    /// メトリクス値を追加
    pub fn insert<S: Into<String>>(&mut self, name: S, value: f64) {
        self.values.push((name.into(), value));
    }

    /// 名前からメトリクス値を取得
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// (名前, 値)の組を順に返すイテレータ
    pub fn iter(&self) -> impl Iterator<Item = &(String, f64)> {
        self.values.iter()
    }

    /// 保持しているメトリクスの数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for MetricReport {
    fn default() -> Self {
        Self::new()
    }
}

/// 指定したメトリクスをまとめて計算する
///
/// 真の値と予測値の長さが一致しない場合はエラーになります。
pub fn evaluate(metrics: &[Metric], y_true: &[f64], y_pred: &[f64]) -> Result<MetricReport> {
    let mut report = MetricReport::new();
    for metric in metrics {
        report.insert(metric.name(), metric.compute(y_true, y_pred)?);
    }
    Ok(report)
}
