//! 分類モデル評価のためのメトリクス

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 入力の長さと空チェックを行う
fn validate_lengths<T, U>(y_true: &[T], y_pred: &[U]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(Error::LengthMismatch {
            expected: y_true.len(),
            actual: y_pred.len(),
        });
    }

    if y_true.is_empty() {
        return Err(Error::EmptyData(
            "空のデータで計算することはできません".to_string(),
        ));
    }

    Ok(())
}

/// 精度（Accuracy）を計算
///
/// # Arguments
/// * `y_true` - 真のラベル
/// * `y_pred` - 予測ラベル
///
/// # Returns
/// * `Result<f64>` - 精度（0〜1）
pub fn accuracy_score<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> Result<f64> {
    validate_lengths(y_true, y_pred)?;

    let correct_count = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();

    Ok(correct_count as f64 / y_true.len() as f64)
}

/// 2クラス分類の混同行列のカウント
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// 真陽性
    pub tp: usize,
    /// 偽陽性
    pub fp: usize,
    /// 真陰性
    pub tn: usize,
    /// 偽陰性
    pub fn_: usize,
}

/// 2クラス分類の混同行列カウントを計算
///
/// # Arguments
/// * `y_true` - 真のラベル（trueまたはfalse）
/// * `y_pred` - 予測ラベル（trueまたはfalse）
///
/// # Returns
/// * `Result<ConfusionCounts>` - 混同行列のカウント
pub fn confusion_counts(y_true: &[bool], y_pred: &[bool]) -> Result<ConfusionCounts> {
    validate_lengths(y_true, y_pred)?;

    let mut counts = ConfusionCounts {
        tp: 0,
        fp: 0,
        tn: 0,
        fn_: 0,
    };

    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        match (t, p) {
            (true, true) => counts.tp += 1,
            (false, true) => counts.fp += 1,
            (false, false) => counts.tn += 1,
            (true, false) => counts.fn_ += 1,
        }
    }

    Ok(counts)
}

/// 多クラス分類の混同行列を計算
///
/// (真のラベル, 予測ラベル)の組から出現回数へのマッピングを返します。
pub fn confusion_matrix(
    y_true: &[String],
    y_pred: &[String],
) -> Result<HashMap<(String, String), usize>> {
    validate_lengths(y_true, y_pred)?;

    let mut matrix = HashMap::new();
    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        *matrix.entry((t.clone(), p.clone())).or_insert(0) += 1;
    }

    Ok(matrix)
}

/// 適合率（Precision）を計算（2クラス分類）
///
/// # Arguments
/// * `y_true` - 真のラベル（trueまたはfalse）
/// * `y_pred` - 予測ラベル（trueまたはfalse）
///
/// # Returns
/// * `Result<f64>` - 適合率（0〜1）
pub fn precision_score(y_true: &[bool], y_pred: &[bool]) -> Result<f64> {
    let counts = confusion_counts(y_true, y_pred)?;

    if counts.tp + counts.fp == 0 {
        return Ok(0.0); // 正と予測したサンプルがない場合
    }

    Ok(counts.tp as f64 / (counts.tp + counts.fp) as f64)
}

/// 再現率（Recall）を計算（2クラス分類）
///
/// # Arguments
/// * `y_true` - 真のラベル（trueまたはfalse）
/// * `y_pred` - 予測ラベル（trueまたはfalse）
///
/// # Returns
/// * `Result<f64>` - 再現率（0〜1）
pub fn recall_score(y_true: &[bool], y_pred: &[bool]) -> Result<f64> {
    let counts = confusion_counts(y_true, y_pred)?;

    if counts.tp + counts.fn_ == 0 {
        return Ok(0.0); // 実際に正のサンプルがない場合
    }

    Ok(counts.tp as f64 / (counts.tp + counts.fn_) as f64)
}

/// F1スコアを計算（2クラス分類）
///
/// # Arguments
/// * `y_true` - 真のラベル（trueまたはfalse）
/// * `y_pred` - 予測ラベル（trueまたはfalse）
///
/// # Returns
/// * `Result<f64>` - F1スコア（0〜1）
pub fn f1_score(y_true: &[bool], y_pred: &[bool]) -> Result<f64> {
    let precision = precision_score(y_true, y_pred)?;
    let recall = recall_score(y_true, y_pred)?;

    if precision + recall == 0.0 {
        return Ok(0.0); // 分母がゼロになる場合
    }

    Ok(2.0 * precision * recall / (precision + recall))
}
