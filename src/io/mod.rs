//! 入出力モジュール
//!
//! CSVファイルからDataFrameを構築する機能を提供します。
//! データの取得やクリーニングはリサンプリングの範囲外であり、
//! ここでは既に整形されたファイルの読み込みのみを扱います。

use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{Error, Result};
use crate::frame::{DataFrame, DataValue, Series};

/// 列の値の型を推定してDataValueに変換する
///
/// すべての非空セルが整数なら整数列、数値なら浮動小数点列、
/// それ以外は文字列列として扱います。空のセルは欠損値になります。
fn sniff_column(raw: &[String]) -> Vec<DataValue> {
    let non_empty: Vec<&String> = raw.iter().filter(|s| !s.is_empty()).collect();

    let all_int = !non_empty.is_empty()
        && non_empty.iter().all(|s| s.parse::<i64>().is_ok());
    let all_float = !non_empty.is_empty()
        && non_empty.iter().all(|s| s.parse::<f64>().is_ok());

    raw.iter()
        .map(|s| {
            if s.is_empty() {
                DataValue::Na
            } else if all_int {
                DataValue::Int64(s.parse::<i64>().unwrap_or(0))
            } else if all_float {
                DataValue::Float64(s.parse::<f64>().unwrap_or(f64::NAN))
            } else {
                DataValue::Text(s.clone())
            }
        })
        .collect()
}

/// CSVファイルからDataFrameを読み込む
///
/// # 説明
/// 各列の型はファイル全体から推定します（整数→浮動小数点→文字列の順）。
/// 空のセルは欠損値として読み込まれます。
///
/// # 例
/// ```rust,no_run
/// use resamplrs::io::read_csv;
///
/// let df = read_csv("data.csv", true).unwrap();
/// println!("行数: {}", df.nrows());
/// ```
pub fn read_csv<P: AsRef<Path>>(path: P, has_header: bool) -> Result<DataFrame> {
    let mut reader = ReaderBuilder::new()
        .has_headers(has_header)
        .from_path(path.as_ref())?;

    let headers: Vec<String> = if has_header {
        reader.headers()?.iter().map(|h| h.to_string()).collect()
    } else {
        Vec::new()
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|field| field.trim().to_string()).collect());
    }

    if rows.is_empty() {
        return Err(Error::EmptyData(format!(
            "CSVファイルに行がありません: {}",
            path.as_ref().display()
        )));
    }

    let n_cols = rows[0].len();
    for row in &rows {
        if row.len() != n_cols {
            return Err(Error::InconsistentRowCount {
                expected: n_cols,
                found: row.len(),
            });
        }
    }

    let column_names: Vec<String> = if has_header {
        headers
    } else {
        (0..n_cols).map(|i| format!("column_{}", i)).collect()
    };

    let mut df = DataFrame::new();
    for (col_idx, name) in column_names.iter().enumerate() {
        let raw: Vec<String> = rows.iter().map(|row| row[col_idx].clone()).collect();
        let values = sniff_column(&raw);
        df.add_column(name.clone(), Series::new(values, Some(name.clone())))?;
    }

    Ok(df)
}
