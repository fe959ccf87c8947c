//! 前処理ステップモジュール
//!
//! パイプラインで使用する変換ステップの実装を提供します。
//! 各ステップは分析データのみからパラメータを学習し、
//! 評価データへの適用時に情報漏洩が起きないようにします。

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::frame::{DataFrame, DataValue, Series};
use crate::pipeline::Transformer;

/// 出現頻度の低いカテゴリ水準をまとめるラベル
const OTHER_LABEL: &str = "other";

/// 稀なカテゴリ水準を"other"にまとめる変換器
///
/// 学習時の出現頻度が閾値以上の水準のみを保持します。
/// 適用時に未知の水準が現れてもエラーにはならず、"other"に写像されます。
pub struct RareCategoryCollapser {
    /// 変換対象の列
    column: String,
    /// 保持する最小出現頻度（割合）
    threshold: f64,
    /// 学習時に保持された水準
    retained: Vec<String>,
    /// 学習済みかどうか
    fitted: bool,
}

impl RareCategoryCollapser {
    /// 新しいRareCategoryCollapserを作成
    pub fn new(column: String, threshold: f64) -> Self {
        RareCategoryCollapser {
            column,
            threshold,
            retained: Vec::new(),
            fitted: false,
        }
    }

    /// 学習時に保持された水準を取得
    pub fn retained_levels(&self) -> &[String] {
        &self.retained
    }
}

impl Transformer for RareCategoryCollapser {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let series = df.column(&self.column)?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut total = 0usize;
        for value in series.iter() {
            if let DataValue::Text(s) = value {
                *counts.entry(s.as_str()).or_insert(0) += 1;
                total += 1;
            }
        }

        if total == 0 {
            return Err(Error::EmptyData(format!(
                "列にカテゴリ値がありません: {}",
                self.column
            )));
        }

        // 閾値以上の頻度を持つ水準のみ保持（"以上"なのでちょうど閾値の水準も残る）
        let mut retained: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count as f64 / total as f64 >= self.threshold)
            .map(|(level, _)| level.to_string())
            .collect();
        retained.sort();

        self.retained = retained;
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "変換器が学習されていません".to_string(),
            ));
        }

        let series = df.column(&self.column)?;
        let collapsed = series.map(|value| match value {
            DataValue::Text(s) => {
                if self.retained.iter().any(|level| level == s) {
                    DataValue::Text(s.clone())
                } else {
                    DataValue::Text(OTHER_LABEL.to_string())
                }
            }
            other => other.clone(),
        });

        let mut result = df.clone();
        result.replace_column(self.column.clone(), collapsed)?;
        Ok(result)
    }
}

/// カテゴリカルデータをダミー変数に変換するための変換器（One-Hot Encoding）
pub struct OneHotEncoder {
    /// 各列のカテゴリリスト
    categories: HashMap<String, Vec<String>>,
    /// 変換対象の列
    columns: Vec<String>,
    /// 最初のカテゴリを除外するかどうか（ダミー変数トラップ回避）
    drop_first: bool,
    /// 学習済みかどうか
    fitted: bool,
}

impl OneHotEncoder {
    /// 新しいOneHotEncoderを作成
    pub fn new(columns: Vec<String>, drop_first: bool) -> Self {
        OneHotEncoder {
            categories: HashMap::new(),
            columns,
            drop_first,
            fitted: false,
        }
    }
}

impl Transformer for OneHotEncoder {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        for col_name in &self.columns {
            let series = df.column(col_name)?;

            let mut unique_vals: Vec<String> = series
                .iter()
                .filter_map(|x| match x {
                    DataValue::Text(s) => Some(s.clone()),
                    _ => None,
                })
                .collect();

            // 重複を削除
            unique_vals.sort();
            unique_vals.dedup();

            self.categories.insert(col_name.clone(), unique_vals);
        }
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "変換器が学習されていません".to_string(),
            ));
        }

        let mut result = df.clone();

        for col_name in &self.columns {
            let categories = &self.categories[col_name];
            let series = df.column(col_name)?;

            // カテゴリごとに指標列を作成
            // 学習時に観測されなかった水準はすべての指標が0になる
            let start_idx = if self.drop_first { 1 } else { 0 };

            for category in categories.iter().skip(start_idx) {
                let new_col_name = format!("{}_{}", col_name, category);

                let dummy_series = series.map(|x| match x {
                    DataValue::Text(s) => {
                        if s == category {
                            DataValue::Int64(1)
                        } else {
                            DataValue::Int64(0)
                        }
                    }
                    _ => DataValue::Na,
                });

                result.add_column(new_col_name, dummy_series)?;
            }

            // 元の列を削除
            result.drop_column(col_name)?;
        }

        Ok(result)
    }
}

/// 学習時に分散が0だった列を削除する変換器
pub struct ZeroVarianceFilter {
    /// 削除対象と判定された列
    dropped: Vec<String>,
    /// 学習済みかどうか
    fitted: bool,
}

impl ZeroVarianceFilter {
    /// 新しいZeroVarianceFilterを作成
    pub fn new() -> Self {
        ZeroVarianceFilter {
            dropped: Vec::new(),
            fitted: false,
        }
    }

    /// 列が定数かどうかを判定
    fn is_constant(series: &Series) -> bool {
        let mut first: Option<&DataValue> = None;
        for value in series.iter() {
            if value.is_na() {
                continue;
            }
            match first {
                None => first = Some(value),
                Some(f) => {
                    if f != value {
                        return false;
                    }
                }
            }
        }
        true
    }
}

impl Default for ZeroVarianceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for ZeroVarianceFilter {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let mut dropped = Vec::new();
        for name in df.column_names() {
            let series = df.column(name)?;
            if Self::is_constant(series) {
                dropped.push(name.clone());
            }
        }
        self.dropped = dropped;
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "変換器が学習されていません".to_string(),
            ));
        }

        let mut result = df.clone();
        for col_name in &self.dropped {
            // 削除済みの列が適用先に存在しない場合は何もしない
            if result.has_column(col_name) {
                result.drop_column(col_name)?;
            }
        }
        Ok(result)
    }
}

/// 数値データを標準化するための変換器
///
/// 学習時の平均と標準偏差（不偏推定量）を記録し、
/// 適用時に平均を引いて標準偏差で割ります。
pub struct StandardScaler {
    /// 各列の平均値
    means: HashMap<String, f64>,
    /// 各列の標準偏差
    stds: HashMap<String, f64>,
    /// 変換対象の列
    columns: Vec<String>,
    /// 学習済みかどうか
    fitted: bool,
}

impl StandardScaler {
    /// 新しいStandardScalerを作成
    pub fn new(columns: Vec<String>) -> Self {
        StandardScaler {
            means: HashMap::new(),
            stds: HashMap::new(),
            columns,
            fitted: false,
        }
    }
}

impl Transformer for StandardScaler {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        for col_name in &self.columns {
            let series = df.column(col_name)?;
            let mean = series.mean()?;
            let std = series.std()?;

            if std == 0.0 {
                return Err(Error::DegenerateColumn(col_name.clone()));
            }

            self.means.insert(col_name.clone(), mean);
            self.stds.insert(col_name.clone(), std);
        }
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "変換器が学習されていません".to_string(),
            ));
        }

        let mut result = df.clone();

        for col_name in &self.columns {
            let mean = self.means[col_name];
            let std = self.stds[col_name];
            let series = df.column(col_name)?;

            let scaled_series = series.map(|x| match x.to_f64() {
                Some(v) => DataValue::Float64((v - mean) / std),
                None => x.clone(),
            });

            result.replace_column(col_name.clone(), scaled_series)?;
        }

        Ok(result)
    }
}

/// 数値列を自然キュービックスプライン基底に展開する変換器
///
/// 境界ノットは学習時の最小値・最大値、内部ノットは等間隔の分位点に置かれます。
/// 展開後は元の列を削除し、`{列名}_ns{k}`という名前の基底列を追加します。
pub struct SplineBasis {
    /// 変換対象の列
    column: String,
    /// 基底の自由度（生成される列数）
    deg_free: usize,
    /// 学習時に決定されたノット（境界ノットを含む、昇順）
    knots: Vec<f64>,
    /// 学習済みかどうか
    fitted: bool,
}

impl SplineBasis {
    /// 新しいSplineBasisを作成
    pub fn new(column: String, deg_free: usize) -> Self {
        SplineBasis {
            column,
            deg_free,
            knots: Vec::new(),
            fitted: false,
        }
    }

    /// 自然スプラインの打ち切りべき基底の補助関数
    fn truncated_cubic(x: f64, knot: f64, boundary: f64) -> f64 {
        let d = (x - knot).max(0.0).powi(3) - (x - boundary).max(0.0).powi(3);
        d / (boundary - knot)
    }

    /// 基底関数の値を計算
    ///
    /// 基底1は恒等写像、基底k+1はノットkに対応する自然スプライン項です。
    fn basis_value(&self, x: f64, basis_idx: usize) -> f64 {
        if basis_idx == 0 {
            return x;
        }

        let n_knots = self.knots.len();
        let boundary = self.knots[n_knots - 1];
        let last_interior = self.knots[n_knots - 2];

        let d_k = Self::truncated_cubic(x, self.knots[basis_idx - 1], boundary);
        let d_last = Self::truncated_cubic(x, last_interior, boundary);
        d_k - d_last
    }
}

impl Transformer for SplineBasis {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        if self.deg_free < 1 {
            return Err(Error::InvalidConfiguration(
                "スプライン基底の自由度は1以上である必要があります".to_string(),
            ));
        }

        let series = df.column(&self.column)?;
        let min = series.min()?;
        let max = series.max()?;

        if min == max {
            return Err(Error::DegenerateColumn(self.column.clone()));
        }

        // ノット: 最小値、内部分位点（deg_free - 1個）、最大値
        let mut knots = vec![min];
        for i in 1..self.deg_free {
            let q = i as f64 / self.deg_free as f64;
            knots.push(series.quantile(q)?);
        }
        knots.push(max);
        knots.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        knots.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        if knots.len() < 2 {
            return Err(Error::DegenerateColumn(self.column.clone()));
        }

        self.knots = knots;
        self.fitted = true;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "変換器が学習されていません".to_string(),
            ));
        }

        let series = df.column(&self.column)?;
        let mut result = df.clone();

        // ノットの重複除去で基底数が減ることがある
        let n_basis = self.deg_free.min(self.knots.len() - 1);

        for basis_idx in 0..n_basis {
            let new_col_name = format!("{}_ns{}", self.column, basis_idx + 1);
            let basis_series = series.map(|x| match x.to_f64() {
                Some(v) => DataValue::Float64(self.basis_value(v, basis_idx)),
                None => DataValue::Na,
            });
            result.add_column(new_col_name, basis_series)?;
        }

        result.drop_column(&self.column)?;
        Ok(result)
    }
}

/// 対数変換を行う変換器
///
/// `skip_on_transform`を指定すると、変換は学習時（fit_transform）のみに適用され、
/// 学習済みパイプラインの適用（transform）では入力をそのまま通します。
/// 目的変数の学習時準備のように、新しいデータでは再現しない変換に使用します。
pub struct LogTransform {
    /// 変換対象の列
    column: String,
    /// 適用時に変換をスキップするかどうか
    skip_on_transform: bool,
}

impl LogTransform {
    /// 新しいLogTransformを作成
    pub fn new(column: String, skip_on_transform: bool) -> Self {
        LogTransform {
            column,
            skip_on_transform,
        }
    }

    /// 列に自然対数を適用
    fn apply_log(&self, df: &DataFrame) -> Result<DataFrame> {
        let series = df.column(&self.column)?;

        let mut logged = Vec::with_capacity(series.len());
        for value in series.iter() {
            match value.to_f64() {
                Some(v) if v > 0.0 => logged.push(DataValue::Float64(v.ln())),
                Some(v) => {
                    return Err(Error::InvalidValue(format!(
                        "対数変換には正の値が必要です: 列 {}, 値 {}",
                        self.column, v
                    )))
                }
                None => logged.push(value.clone()),
            }
        }

        let mut result = df.clone();
        result.replace_column(
            self.column.clone(),
            Series::new(logged, series.name().cloned()),
        )?;
        Ok(result)
    }
}

impl Transformer for LogTransform {
    fn fit(&mut self, df: &DataFrame) -> Result<()> {
        // 学習するパラメータはないが、列の存在は学習時に確認する
        df.column(&self.column)?;
        Ok(())
    }

    fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if self.skip_on_transform {
            // 学習時のみの変換: 適用時は入力をそのまま通す
            return Ok(df.clone());
        }
        self.apply_log(df)
    }

    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.apply_log(df)
    }
}
