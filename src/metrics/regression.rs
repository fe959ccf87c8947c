//! 回帰モデル評価のためのメトリクス

use crate::error::{Error, Result};

/// 入力の長さと空チェックを行う
fn validate_inputs(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
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

/// 平均二乗誤差（Mean Squared Error）を計算
///
/// # Arguments
/// * `y_true` - 真の値
/// * `y_pred` - 予測値
///
/// # Returns
/// * `Result<f64>` - 平均二乗誤差
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    validate_inputs(y_true, y_pred)?;

    let sum_squared_error = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>();

    Ok(sum_squared_error / y_true.len() as f64)
}

/// 二乗平均平方根誤差（Root Mean Squared Error）を計算
///
/// # Arguments
/// * `y_true` - 真の値
/// * `y_pred` - 予測値
///
/// # Returns
/// * `Result<f64>` - 二乗平均平方根誤差
pub fn root_mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    Ok(mean_squared_error(y_true, y_pred)?.sqrt())
}

/// 平均絶対誤差（Mean Absolute Error）を計算
///
/// # Arguments
/// * `y_true` - 真の値
/// * `y_pred` - 予測値
///
/// # Returns
/// * `Result<f64>` - 平均絶対誤差
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    validate_inputs(y_true, y_pred)?;

    let sum_abs_error = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>();

    Ok(sum_abs_error / y_true.len() as f64)
}

/// 決定係数（R^2）を計算
///
/// 真の値の分散が0の場合、予測が完全なら1、そうでなければ0を返します。
///
/// # Arguments
/// * `y_true` - 真の値
/// * `y_pred` - 予測値
///
/// # Returns
/// * `Result<f64>` - 決定係数
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    validate_inputs(y_true, y_pred)?;

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;

    let ss_total = y_true.iter().map(|t| (t - mean).powi(2)).sum::<f64>();
    let ss_residual = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>();

    if ss_total == 0.0 {
        return Ok(if ss_residual == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_residual / ss_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_squared_error() {
        let y_true = vec![1.0, 2.0, 3.0, 4.0];
        let y_pred = vec![1.0, 2.0, 3.0, 4.0];
        assert!((mean_squared_error(&y_true, &y_pred).unwrap()).abs() < 1e-10);

        let y_pred = vec![2.0, 3.0, 4.0, 5.0];
        assert!((mean_squared_error(&y_true, &y_pred).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_rmse_is_sqrt_of_mse() {
        let y_true = vec![1.0, 2.0, 3.0];
        let y_pred = vec![3.0, 4.0, 5.0];
        let mse = mean_squared_error(&y_true, &y_pred).unwrap();
        let rmse = root_mean_squared_error(&y_true, &y_pred).unwrap();
        assert!((rmse - mse.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_r2_score_perfect_fit() {
        let y_true = vec![1.0, 2.0, 3.0, 4.0];
        let y_pred = y_true.clone();
        assert!((r2_score(&y_true, &y_pred).unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_r2_score_mean_prediction() {
        // 平均を予測するだけのモデルのR^2は0になる
        let y_true = vec![1.0, 2.0, 3.0, 4.0];
        let y_pred = vec![2.5, 2.5, 2.5, 2.5];
        assert!((r2_score(&y_true, &y_pred).unwrap()).abs() < 1e-10);
    }

    #[test]
    fn test_length_mismatch() {
        let y_true = vec![1.0, 2.0, 3.0];
        let y_pred = vec![1.0, 2.0];
        assert!(matches!(
            mean_squared_error(&y_true, &y_pred),
            Err(Error::LengthMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<f64> = vec![];
        assert!(mean_squared_error(&empty, &empty).is_err());
    }
}
