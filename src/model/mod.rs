//! モデルアダプタモジュール
//!
//! 外部の学習ルーチンを統一的なfit/predictインターフェースで包むアダプタ層です。
//! モデルファミリは実行時の文字列ではなく、設定オブジェクト（ModelFamily）で
//! 明示的に選択します。

pub mod elastic_net;
pub mod linalg;
pub mod mars;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::frame::DataFrame;
use crate::pipeline::steps::SplineBasis;
use crate::pipeline::Transformer;

pub use elastic_net::ElasticNetRegression;
pub use mars::MarsRegression;

/// 教師あり学習モデルに共通するトレイト
pub trait SupervisedModel {
    /// モデルを訓練データでフィットさせる
    fn fit(&mut self, df: &DataFrame, target: &str, features: &[String]) -> Result<()>;

    /// 新しいデータに対して予測を行う
    ///
    /// 予測値は入力の行順に対応します。
    fn predict(&self, df: &DataFrame) -> Result<Vec<f64>>;

    /// モデルのスコアを計算（デフォルトはR^2）
    fn score(&self, df: &DataFrame, target: &str) -> Result<f64> {
        let y_true = df.column(target)?.to_vec_f64()?;
        let y_pred = self.predict(df)?;
        crate::metrics::regression::r2_score(&y_true, &y_pred)
    }
}

/// モデルファミリの指定
///
/// 各バリアントがチューニングパラメータを保持します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelFamily {
    /// 線形回帰（正規方程式による最小二乗法）
    Linear,
    /// エラスティックネット回帰（座標降下法）
    ElasticNet {
        /// 正則化の強さ
        penalty: f64,
        /// L1正則化の割合（0.0 = リッジ、1.0 = ラッソ）
        mixture: f64,
    },
    /// 自然スプライン基底による回帰
    SplineRegression {
        /// 各説明変数に使用する基底の自由度
        deg_free: usize,
    },
    /// 多変量適応回帰スプライン（前進パス）
    Mars {
        /// 保持する基底項の最大数（切片を除く）
        max_terms: usize,
        /// ヒンジ関数の交互作用の最大次数
        degree: usize,
    },
}

impl Default for ModelFamily {
    fn default() -> Self {
        ModelFamily::Linear
    }
}

impl ModelFamily {
    /// ファミリに対応するモデルの新しいインスタンスを構築
    pub fn build(&self) -> Box<dyn SupervisedModel> {
        match self {
            ModelFamily::Linear => Box::new(LinearRegression::new()),
            ModelFamily::ElasticNet { penalty, mixture } => {
                Box::new(ElasticNetRegression::new(*penalty, *mixture))
            }
            ModelFamily::SplineRegression { deg_free } => {
                Box::new(SplineRegression::new(*deg_free))
            }
            ModelFamily::Mars { max_terms, degree } => {
                Box::new(MarsRegression::new(*max_terms, *degree))
            }
        }
    }
}

/// モデルの指定: 目的変数、説明変数、ファミリの組
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// 目的変数の列名
    pub target: String,
    /// 説明変数の列名（Noneの場合は目的変数以外のすべての数値列）
    pub features: Option<Vec<String>>,
    /// モデルファミリ
    pub family: ModelFamily,
}

impl ModelSpec {
    /// 新しいモデル指定を作成
    pub fn new<S: Into<String>>(target: S, family: ModelFamily) -> Self {
        ModelSpec {
            target: target.into(),
            features: None,
            family,
        }
    }

    /// 説明変数を明示的に指定
    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = Some(features);
        self
    }
}

/// 説明変数の列名を解決する
///
/// 明示的に指定された場合はその存在を検証し、
/// 指定がない場合は目的変数以外のすべての数値列を使用します。
pub fn resolve_features(
    df: &DataFrame,
    target: &str,
    features: Option<&[String]>,
) -> Result<Vec<String>> {
    if !df.has_column(target) {
        return Err(Error::ColumnNotFound(target.to_string()));
    }

    let resolved = match features {
        Some(names) => {
            for name in names {
                if !df.has_column(name) {
                    return Err(Error::ColumnNotFound(name.clone()));
                }
            }
            names.to_vec()
        }
        None => df
            .column_names()
            .iter()
            .filter(|name| name.as_str() != target)
            .filter(|name| {
                df.column(name.as_str())
                    .map(|s| s.is_numeric())
                    .unwrap_or(false)
            })
            .cloned()
            .collect(),
    };

    if resolved.is_empty() {
        return Err(Error::InvalidOperation(
            "回帰には少なくとも1つの説明変数が必要です".into(),
        ));
    }

    Ok(resolved)
}

/// 線形回帰モデル
pub struct LinearRegression {
    /// 回帰係数
    coefficients: Vec<f64>,
    /// 切片
    intercept: f64,
    /// 特徴量の名前
    feature_names: Vec<String>,
    /// 学習済みかどうか
    fitted: bool,
}

impl LinearRegression {
    /// 新しい線形回帰モデルを作成
    pub fn new() -> Self {
        LinearRegression {
            coefficients: Vec::new(),
            intercept: 0.0,
            feature_names: Vec::new(),
            fitted: false,
        }
    }

    /// 係数を取得
    pub fn coefficients(&self) -> HashMap<String, f64> {
        self.feature_names
            .iter()
            .zip(self.coefficients.iter())
            .map(|(name, coef)| (name.clone(), *coef))
            .collect()
    }

    /// 切片を取得
    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl SupervisedModel for LinearRegression {
    fn fit(&mut self, df: &DataFrame, target: &str, features: &[String]) -> Result<()> {
        let y = df.column(target)?.to_vec_f64().map_err(|_| {
            Error::FitError(format!(
                "目的変数に欠損値または数値でない値が含まれています: {}",
                target
            ))
        })?;
        let x_cols = linalg::feature_columns(df, features)?;

        // 切片用の列（全て1.0）を先頭に追加
        let n = y.len();
        let mut design: Vec<Vec<f64>> = Vec::with_capacity(x_cols.len() + 1);
        design.push(vec![1.0; n]);
        design.extend(x_cols);

        let coefficients = linalg::solve_least_squares(&design, &y).map_err(|e| match e {
            Error::ComputationError(msg) => Error::FitError(msg),
            other => other,
        })?;

        self.intercept = coefficients[0];
        self.coefficients = coefficients[1..].to_vec();
        self.feature_names = features.to_vec();
        self.fitted = true;

        Ok(())
    }

    fn predict(&self, df: &DataFrame) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "モデルが学習されていません".to_string(),
            ));
        }

        let x_cols = linalg::feature_columns(df, &self.feature_names)?;
        let n_rows = df.nrows();
        let mut predictions = Vec::with_capacity(n_rows);

        for row in 0..n_rows {
            let mut pred = self.intercept;
            for (col, coef) in x_cols.iter().zip(self.coefficients.iter()) {
                pred += col[row] * coef;
            }
            predictions.push(pred);
        }

        Ok(predictions)
    }
}

/// 自然スプライン基底による回帰モデル
///
/// 各説明変数をスプライン基底に展開した上で最小二乗法をあてはめる、
/// 基底展開と線形回帰の合成です。
pub struct SplineRegression {
    /// 各説明変数に使用する基底の自由度
    deg_free: usize,
    /// 元の説明変数の名前
    feature_names: Vec<String>,
    /// 学習済みの基底展開（説明変数ごと）
    expansions: Vec<SplineBasis>,
    /// 展開後の特徴量であてはめた線形モデル
    inner: LinearRegression,
    /// 学習済みかどうか
    fitted: bool,
}

impl SplineRegression {
    /// 新しいSplineRegressionを作成
    pub fn new(deg_free: usize) -> Self {
        SplineRegression {
            deg_free,
            feature_names: Vec::new(),
            expansions: Vec::new(),
            inner: LinearRegression::new(),
            fitted: false,
        }
    }

    /// 説明変数（と任意で目的変数）だけを含む部分フレームを作る
    fn feature_subset(
        df: &DataFrame,
        features: &[String],
        target: Option<&str>,
    ) -> Result<DataFrame> {
        let mut subset = DataFrame::new();
        for name in features {
            subset.add_column(name.clone(), df.column(name)?.clone())?;
        }
        if let Some(target) = target {
            subset.add_column(target.to_string(), df.column(target)?.clone())?;
        }
        Ok(subset)
    }

    /// 学習済みの基底展開をデータに適用
    fn expand(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for expansion in &self.expansions {
            result = expansion.transform(&result)?;
        }
        Ok(result)
    }
}

impl SupervisedModel for SplineRegression {
    fn fit(&mut self, df: &DataFrame, target: &str, features: &[String]) -> Result<()> {
        self.feature_names = features.to_vec();
        self.expansions = features
            .iter()
            .map(|name| SplineBasis::new(name.clone(), self.deg_free))
            .collect();

        let mut expanded = Self::feature_subset(df, features, Some(target))?;
        for expansion in &mut self.expansions {
            expanded = expansion.fit_transform(&expanded)?;
        }

        // 展開後の基底列をすべて説明変数として使用する
        let expanded_features = resolve_features(&expanded, target, None)?;
        self.inner.fit(&expanded, target, &expanded_features)?;
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, df: &DataFrame) -> Result<Vec<f64>> {
        if !self.fitted {
            return Err(Error::InvalidOperation(
                "モデルが学習されていません".to_string(),
            ));
        }
        let subset = Self::feature_subset(df, &self.feature_names, None)?;
        let expanded = self.expand(&subset)?;
        self.inner.predict(&expanded)
    }
}
