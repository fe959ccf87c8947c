//! データフレームモジュール
//!
//! リサンプリングパイプラインで使用する列指向のテーブルデータ構造を提供します。
//! 各列は動的型（数値・カテゴリ・文字列・欠損値）のセルを保持します。

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// セルの値を表現する型
///
/// 欠損値はOptionではなくNaバリアントで表現します。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    /// 浮動小数点値
    Float64(f64),
    /// 整数値
    Int64(i64),
    /// 文字列（カテゴリ値を含む）
    Text(String),
    /// 欠損値
    Na,
}

impl DataValue {
    /// 欠損値かどうかをチェック
    pub fn is_na(&self) -> bool {
        matches!(self, DataValue::Na)
    }

    /// 数値として取得（数値でない場合はNone）
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            DataValue::Float64(v) => Some(*v),
            DataValue::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::Float64(v) => write!(f, "{}", v),
            DataValue::Int64(v) => write!(f, "{}", v),
            DataValue::Text(s) => write!(f, "{}", s),
            DataValue::Na => write!(f, "NA"),
        }
    }
}

/// Series構造体: 一次元の値の配列
#[derive(Debug, Clone)]
pub struct Series {
    /// Seriesのデータ値
    values: Vec<DataValue>,

    /// 名前（オプション）
    name: Option<String>,
}

impl Series {
    /// 新しいSeriesをベクトルから作成
    pub fn new(values: Vec<DataValue>, name: Option<String>) -> Self {
        Series { values, name }
    }

    /// f64のベクトルからSeriesを作成
    pub fn from_f64(values: Vec<f64>) -> Self {
        Series::new(values.into_iter().map(DataValue::Float64).collect(), None)
    }

    /// i64のベクトルからSeriesを作成
    pub fn from_i64(values: Vec<i64>) -> Self {
        Series::new(values.into_iter().map(DataValue::Int64).collect(), None)
    }

    /// 文字列のベクトルからSeriesを作成
    pub fn from_text<S: Into<String>>(values: Vec<S>) -> Self {
        Series::new(
            values
                .into_iter()
                .map(|s| DataValue::Text(s.into()))
                .collect(),
            None,
        )
    }

    /// Seriesの長さを取得
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Seriesが空かどうか
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 位置から値を取得
    pub fn get(&self, pos: usize) -> Option<&DataValue> {
        self.values.get(pos)
    }

    /// 値の配列を取得
    pub fn values(&self) -> &[DataValue] {
        &self.values
    }

    /// 値のイテレータを取得
    pub fn iter(&self) -> std::slice::Iter<'_, DataValue> {
        self.values.iter()
    }

    /// 名前を取得
    pub fn name(&self) -> Option<&String> {
        self.name.as_ref()
    }

    /// 名前を設定
    pub fn with_name(mut self, name: String) -> Self {
        self.name = Some(name);
        self
    }

    /// すべての要素に関数を適用した新しいSeriesを作成
    pub fn map<F>(&self, f: F) -> Series
    where
        F: Fn(&DataValue) -> DataValue,
    {
        Series::new(self.values.iter().map(f).collect(), self.name.clone())
    }

    /// 数値のベクトルとして取得
    ///
    /// 欠損値または数値以外のセルが含まれる場合はエラーになります。
    pub fn to_vec_f64(&self) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(self.values.len());
        for value in &self.values {
            match value.to_f64() {
                Some(v) => out.push(v),
                None => {
                    return Err(Error::Cast(format!(
                        "数値に変換できない値が含まれています: {}",
                        value
                    )))
                }
            }
        }
        Ok(out)
    }

    /// 欠損値を除いた数値セルを取得
    fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(|v| v.to_f64()).collect()
    }

    /// 数値セルを持つかどうか
    pub fn is_numeric(&self) -> bool {
        self.values.iter().any(|v| v.to_f64().is_some())
            && !self
                .values
                .iter()
                .any(|v| matches!(v, DataValue::Text(_)))
    }

    /// 平均を計算（欠損値は除外）
    pub fn mean(&self) -> Result<f64> {
        let values = self.numeric_values();
        if values.is_empty() {
            return Err(Error::EmptyData(
                "空のSeriesの平均は計算できません".to_string(),
            ));
        }
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// 標準偏差を計算（不偏推定量、欠損値は除外）
    pub fn std(&self) -> Result<f64> {
        let values = self.numeric_values();
        if values.len() < 2 {
            return Err(Error::InsufficientData(
                "標準偏差には少なくとも2つの値が必要です".to_string(),
            ));
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / (values.len() - 1) as f64;
        Ok(var.sqrt())
    }

    /// 最小値を計算（欠損値は除外）
    pub fn min(&self) -> Result<f64> {
        let values = self.numeric_values();
        if values.is_empty() {
            return Err(Error::EmptyData(
                "空のSeriesの最小値は計算できません".to_string(),
            ));
        }
        Ok(values.iter().cloned().fold(f64::INFINITY, f64::min))
    }

    /// 最大値を計算（欠損値は除外）
    pub fn max(&self) -> Result<f64> {
        let values = self.numeric_values();
        if values.is_empty() {
            return Err(Error::EmptyData(
                "空のSeriesの最大値は計算できません".to_string(),
            ));
        }
        Ok(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
    }

    /// 分位点を計算（線形補間、欠損値は除外）
    pub fn quantile(&self, q: f64) -> Result<f64> {
        let values = self.numeric_values();
        crate::stats::quantile(&values, q)
    }
}

/// DataFrame構造体: 名前付き列の順序付きコレクション
///
/// すべての列は同じ行数を持ちます。
#[derive(Debug, Clone)]
pub struct DataFrame {
    /// 列データ
    columns: HashMap<String, Series>,

    /// 列の挿入順序
    column_order: Vec<String>,

    /// 行数
    row_count: usize,
}

impl DataFrame {
    /// 新しい空のDataFrameを作成
    pub fn new() -> Self {
        DataFrame {
            columns: HashMap::new(),
            column_order: Vec::new(),
            row_count: 0,
        }
    }

    /// 行数を取得
    pub fn nrows(&self) -> usize {
        self.row_count
    }

    /// 列数を取得
    pub fn ncols(&self) -> usize {
        self.column_order.len()
    }

    /// DataFrameが空かどうか
    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// 列名の一覧を取得（挿入順）
    pub fn column_names(&self) -> &[String] {
        &self.column_order
    }

    /// 列が存在するかどうか
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// 列を取得
    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    /// 列を追加
    pub fn add_column<S: Into<String>>(&mut self, name: S, series: Series) -> Result<()> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(Error::DuplicateColumnName(name));
        }
        if !self.column_order.is_empty() && series.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: series.len(),
            });
        }
        if self.column_order.is_empty() {
            self.row_count = series.len();
        }
        self.column_order.push(name.clone());
        self.columns.insert(name, series);
        Ok(())
    }

    /// 既存の列を置き換え
    pub fn replace_column<S: Into<String>>(&mut self, name: S, series: Series) -> Result<()> {
        let name = name.into();
        if !self.columns.contains_key(&name) {
            return Err(Error::ColumnNotFound(name));
        }
        if series.len() != self.row_count {
            return Err(Error::InconsistentRowCount {
                expected: self.row_count,
                found: series.len(),
            });
        }
        self.columns.insert(name, series);
        Ok(())
    }

    /// 列を削除
    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        if self.columns.remove(name).is_none() {
            return Err(Error::ColumnNotFound(name.to_string()));
        }
        self.column_order.retain(|c| c != name);
        if self.column_order.is_empty() {
            self.row_count = 0;
        }
        Ok(())
    }

    /// 指定した行インデックスの部分DataFrameを作成
    ///
    /// リサンプリングの分析・評価パーティションの構築に使用します。
    /// 同じインデックスを複数回指定できます（ブートストラップ用）。
    pub fn take(&self, indices: &[usize]) -> Result<DataFrame> {
        for &idx in indices {
            if idx >= self.row_count {
                return Err(Error::IndexOutOfBounds {
                    index: idx,
                    size: self.row_count,
                });
            }
        }

        let mut result = DataFrame::new();
        for name in &self.column_order {
            let series = &self.columns[name];
            let values: Vec<DataValue> = indices
                .iter()
                .map(|&idx| series.values()[idx].clone())
                .collect();
            result.add_column(name.clone(), Series::new(values, series.name().cloned()))?;
        }
        Ok(result)
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}
