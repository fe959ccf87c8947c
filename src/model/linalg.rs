//! モデル学習用の行列計算ヘルパー
//!
//! 最小二乗法の正規方程式を解くための小規模な密行列計算を提供します。
//! 行列は列ベクトルのリスト（各列が長さnのVec）として扱います。

use crate::error::{Error, Result};
use crate::frame::DataFrame;

/// 計画行列の列データを抽出する
///
/// 欠損値や数値でないセルが含まれる場合は学習エラーになります。
pub(crate) fn feature_columns(df: &DataFrame, features: &[String]) -> Result<Vec<Vec<f64>>> {
    let mut columns = Vec::with_capacity(features.len());
    for name in features {
        let series = df.column(name)?;
        let values = series.to_vec_f64().map_err(|_| {
            Error::FitError(format!(
                "計画行列に欠損値または数値でない値が含まれています: 列 {}",
                name
            ))
        })?;
        columns.push(values);
    }
    Ok(columns)
}

/// 行列の転置積（A^T * B）を計算
pub(crate) fn matrix_multiply_transpose(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a.len();
    let m = b.len();

    let mut result = vec![vec![0.0; m]; n];

    for i in 0..n {
        for j in 0..m {
            let mut sum = 0.0;
            for k in 0..a[i].len() {
                sum += a[i][k] * b[j][k];
            }
            result[i][j] = sum;
        }
    }

    result
}

/// ベクトルの転置積（A^T * y）を計算
pub(crate) fn vec_multiply_transpose(a: &[Vec<f64>], y: &[f64]) -> Vec<f64> {
    let n = a.len();
    let mut result = vec![0.0; n];

    for i in 0..n {
        let mut sum = 0.0;
        for k in 0..y.len() {
            sum += a[i][k] * y[k];
        }
        result[i] = sum;
    }

    result
}

/// 行列の逆行列を計算（ガウス・ジョルダン法）
///
/// ピボットが閾値未満になった場合、行列は特異（ランク落ち）とみなします。
pub(crate) fn matrix_inverse(matrix: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    let n = matrix.len();

    if n == 0 {
        return Err(Error::InvalidOperation("行列が空です".into()));
    }

    // 拡張行列を作成 [A|I]
    let mut augmented = Vec::with_capacity(n);
    for i in 0..n {
        let mut row = Vec::with_capacity(2 * n);
        row.extend_from_slice(&matrix[i]);

        for j in 0..n {
            row.push(if i == j { 1.0 } else { 0.0 });
        }

        augmented.push(row);
    }

    // ガウス・ジョルダン消去法
    for i in 0..n {
        // ピボット選択
        let mut max_row = i;
        let mut max_val = augmented[i][i].abs();

        for j in i + 1..n {
            let abs_val = augmented[j][i].abs();
            if abs_val > max_val {
                max_row = j;
                max_val = abs_val;
            }
        }

        if max_val < 1e-10 {
            return Err(Error::ComputationError(
                "行列が特異です（逆行列が存在しません）".into(),
            ));
        }

        if max_row != i {
            augmented.swap(i, max_row);
        }

        // ピボット要素を1にする
        let pivot = augmented[i][i];
        for j in 0..2 * n {
            augmented[i][j] /= pivot;
        }

        // 他の行の消去
        for j in 0..n {
            if j != i {
                let factor = augmented[j][i];
                for k in 0..2 * n {
                    augmented[j][k] -= factor * augmented[i][k];
                }
            }
        }
    }

    // 結果の抽出（右半分が逆行列）
    let mut inverse = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            inverse[i][j] = augmented[i][j + n];
        }
    }

    Ok(inverse)
}

/// 正規方程式による最小二乗解を計算
///
/// `x_columns`は計画行列の列（切片列を含む場合は呼び出し側が先頭に追加）、
/// 戻り値は各列に対応する係数です。
pub(crate) fn solve_least_squares(x_columns: &[Vec<f64>], y: &[f64]) -> Result<Vec<f64>> {
    let xt_x = matrix_multiply_transpose(x_columns, x_columns);
    let xt_x_inv = matrix_inverse(&xt_x)?;
    let xt_y = vec_multiply_transpose(x_columns, y);

    let mut coefficients = vec![0.0; x_columns.len()];
    for i in 0..coefficients.len() {
        let mut sum = 0.0;
        for j in 0..xt_y.len() {
            sum += xt_x_inv[i][j] * xt_y[j];
        }
        coefficients[i] = sum;
    }

    Ok(coefficients)
}

/// 残差平方和を計算
pub(crate) fn sum_squared_residuals(
    x_columns: &[Vec<f64>],
    y: &[f64],
    coefficients: &[f64],
) -> f64 {
    let n = y.len();
    let mut ss = 0.0;
    for row in 0..n {
        let mut fitted = 0.0;
        for (col, coef) in x_columns.iter().zip(coefficients.iter()) {
            fitted += col[row] * coef;
        }
        ss += (y[row] - fitted).powi(2);
    }
    ss
}
