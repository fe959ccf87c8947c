//! エラスティックネット回帰モジュール
//!
//! L1とL2の正則化を組み合わせた線形回帰を座標降下法であてはめます。

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::frame::DataFrame;
use crate::model::{linalg, SupervisedModel};

/// エラスティックネット回帰モデル（座標降下法）
pub struct ElasticNetRegression {
    /// 正則化の強さ
    penalty: f64,
    /// L1正則化の割合（0.0 = リッジ、1.0 = ラッソ）
    mixture: f64,
    /// 座標降下の最大反復回数
    max_iter: usize,
    /// 収束判定の閾値（係数の変化量の合計）
    tol: f64,
    /// 回帰係数
    coefficients: Vec<f64>,
    /// 切片
    intercept: f64,
    /// 特徴量の名前
    feature_names: Vec<String>,
    /// 学習済みかどうか
    fitted: bool,
}

impl ElasticNetRegression {
    /// 新しいElasticNetRegressionを作成
    pub fn new(penalty: f64, mixture: f64) -> Self {
        ElasticNetRegression {
            penalty,
            mixture: mixture.clamp(0.0, 1.0),
            max_iter: 1000,
            tol: 1e-6,
            coefficients: Vec::new(),
            intercept: 0.0,
            feature_names: Vec::new(),
            fitted: false,
        }
    }

    /// 最大反復回数を設定
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// 収束判定の閾値を設定
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
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

    /// L1正則化のソフト閾値演算子
    fn soft_threshold(val: f64, threshold: f64) -> f64 {
        if val > threshold {
            val - threshold
        } else if val < -threshold {
            val + threshold
        } else {
            0.0
        }
    }
}

impl SupervisedModel for ElasticNetRegression {
    fn fit(&mut self, df: &DataFrame, target: &str, features: &[String]) -> Result<()> {
        if self.penalty < 0.0 {
            return Err(Error::InvalidConfiguration(format!(
                "正則化の強さは非負である必要があります: {}",
                self.penalty
            )));
        }

        let y = df.column(target)?.to_vec_f64().map_err(|_| {
            Error::FitError(format!(
                "目的変数に欠損値または数値でない値が含まれています: {}",
                target
            ))
        })?;
        let x_cols = linalg::feature_columns(df, features)?;

        let n_samples = y.len();
        let n_features = x_cols.len();
        if n_samples < 2 {
            return Err(Error::InsufficientData(
                "エラスティックネットには少なくとも2行のデータが必要です".into(),
            ));
        }

        // 切片を扱うため、各列と目的変数を中心化する
        let x_means: Vec<f64> = x_cols
            .iter()
            .map(|col| col.iter().sum::<f64>() / n_samples as f64)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n_samples as f64;

        let x_c: Vec<Vec<f64>> = x_cols
            .iter()
            .zip(x_means.iter())
            .map(|(col, mean)| col.iter().map(|v| v - mean).collect())
            .collect();
        let y_c: Vec<f64> = y.iter().map(|v| v - y_mean).collect();

        // 各列のノルムは反復の外で一度だけ計算する
        let col_norms: Vec<f64> = x_c
            .iter()
            .map(|col| col.iter().map(|v| v * v).sum::<f64>())
            .collect();

        let lambda_l1 = self.penalty * self.mixture * n_samples as f64;
        let lambda_l2 = self.penalty * (1.0 - self.mixture) * n_samples as f64;

        let mut w = vec![0.0; n_features];
        let mut residual: Vec<f64> = y_c.clone();

        for _iter in 0..self.max_iter {
            let mut total_change = 0.0;

            // 座標降下: 残差は増分更新する
            for j in 0..n_features {
                if col_norms[j] < 1e-15 {
                    w[j] = 0.0;
                    continue;
                }

                let rho: f64 = x_c[j]
                    .iter()
                    .zip(residual.iter())
                    .map(|(x, r)| x * r)
                    .sum::<f64>()
                    + col_norms[j] * w[j];

                let old_wj = w[j];
                w[j] = Self::soft_threshold(rho, lambda_l1) / (col_norms[j] + lambda_l2);

                let delta = old_wj - w[j];
                if delta != 0.0 {
                    for (r, x) in residual.iter_mut().zip(x_c[j].iter()) {
                        *r += x * delta;
                    }
                }
                total_change += delta.abs();
            }

            if total_change < self.tol {
                break;
            }
        }

        self.intercept = y_mean
            - w.iter()
                .zip(x_means.iter())
                .map(|(wj, mj)| wj * mj)
                .sum::<f64>();
        self.coefficients = w;
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
