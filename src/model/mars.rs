//! 多変量適応回帰スプライン（MARS）モジュール
//!
//! ヒンジ関数の組を前進的に追加していく探索であてはめる非線形回帰です。
//! 各反復で残差平方和を最も減らすヒンジ対（親基底×特徴量×ノット）を選びます。

use crate::error::{Error, Result};
use crate::frame::DataFrame;
use crate::model::{linalg, SupervisedModel};

/// 1つのヒンジ関数: max(0, x - knot) または max(0, knot - x)
#[derive(Debug, Clone)]
struct Hinge {
    /// 特徴量のインデックス
    feature: usize,
    /// ノット位置
    knot: f64,
    /// 正方向（x - knot）かどうか
    positive: bool,
}

impl Hinge {
    fn eval(&self, x: f64) -> f64 {
        if self.positive {
            (x - self.knot).max(0.0)
        } else {
            (self.knot - x).max(0.0)
        }
    }
}

/// 基底項: ヒンジ関数の積（空の場合は切片）
type BasisTerm = Vec<Hinge>;

/// 基底項を1行分評価する
fn eval_term(term: &BasisTerm, row: &[f64]) -> f64 {
    term.iter().map(|h| h.eval(row[h.feature])).product()
}

/// 候補ノットとして使用する分位点の数
const KNOT_CANDIDATES: usize = 15;

/// 多変量適応回帰スプラインモデル（前進パスのみ）
pub struct MarsRegression {
    /// 保持する基底項の最大数（切片を除く）
    max_terms: usize,
    /// ヒンジ関数の交互作用の最大次数
    degree: usize,
    /// 選択された基底項
    terms: Vec<BasisTerm>,
    /// 係数（先頭は切片、以降は基底項に対応）
    coefficients: Vec<f64>,
    /// 特徴量の名前
    feature_names: Vec<String>,
    /// 学習済みかどうか
    fitted: bool,
}

impl MarsRegression {
    /// 新しいMarsRegressionを作成
    pub fn new(max_terms: usize, degree: usize) -> Self {
        MarsRegression {
            max_terms,
            degree,
            terms: Vec::new(),
            coefficients: Vec::new(),
            feature_names: Vec::new(),
            fitted: false,
        }
    }

    /// 選択された基底項の数（切片を除く）
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// 特徴量の候補ノットを計算（分位点、重複は除去）
    fn candidate_knots(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        sorted.dedup_by(|a, b| (*a - *b).abs() < 1e-12);

        if sorted.len() <= KNOT_CANDIDATES {
            // 端点はヒンジが定数になるため除外する
            if sorted.len() > 2 {
                return sorted[1..sorted.len() - 1].to_vec();
            }
            return sorted;
        }

        (1..=KNOT_CANDIDATES)
            .map(|i| {
                let pos = i as f64 / (KNOT_CANDIDATES + 1) as f64 * (sorted.len() - 1) as f64;
                sorted[pos.round() as usize]
            })
            .collect()
    }

    /// 現在の基底項から計画行列の列を構築（先頭は切片列）
    fn design_columns(terms: &[BasisTerm], rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let n = rows.len();
        let mut columns = Vec::with_capacity(terms.len() + 1);
        columns.push(vec![1.0; n]);
        for term in terms {
            columns.push(rows.iter().map(|row| eval_term(term, row)).collect());
        }
        columns
    }
}

impl SupervisedModel for MarsRegression {
    fn fit(&mut self, df: &DataFrame, target: &str, features: &[String]) -> Result<()> {
        if self.max_terms < 2 {
            return Err(Error::InvalidConfiguration(
                "MARSの基底項数は2以上である必要があります".into(),
            ));
        }
        if self.degree == 0 {
            return Err(Error::InvalidConfiguration(
                "MARSの交互作用次数は1以上である必要があります".into(),
            ));
        }

        let y = df.column(target)?.to_vec_f64().map_err(|_| {
            Error::FitError(format!(
                "目的変数に欠損値または数値でない値が含まれています: {}",
                target
            ))
        })?;
        let x_cols = linalg::feature_columns(df, features)?;
        let n = y.len();

        // 行単位のアクセス用に転置しておく
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| x_cols.iter().map(|col| col[i]).collect())
            .collect();

        let knots: Vec<Vec<f64>> = x_cols
            .iter()
            .map(|col| Self::candidate_knots(col))
            .collect();

        let mut terms: Vec<BasisTerm> = Vec::new();
        let design = Self::design_columns(&terms, &rows);
        let coefs = linalg::solve_least_squares(&design, &y)
            .map_err(|e| Error::FitError(e.to_string()))?;
        let mut current_sse = linalg::sum_squared_residuals(&design, &y, &coefs);

        // 前進パス: 残差平方和を最も減らすヒンジ対を繰り返し追加する
        while terms.len() + 2 <= self.max_terms {
            let mut best: Option<(f64, BasisTerm, BasisTerm)> = None;

            // 親基底は切片（空の積）と既存の項のすべて
            for parent_idx in 0..=terms.len() {
                let parent: BasisTerm = if parent_idx == 0 {
                    Vec::new()
                } else {
                    terms[parent_idx - 1].clone()
                };

                if parent.len() >= self.degree {
                    continue;
                }

                for (feature, feature_knots) in knots.iter().enumerate() {
                    // 同じ特徴量を同一の項の中で2回は使わない
                    if parent.iter().any(|h| h.feature == feature) {
                        continue;
                    }

                    for &knot in feature_knots {
                        let mut term_pos = parent.clone();
                        term_pos.push(Hinge {
                            feature,
                            knot,
                            positive: true,
                        });
                        let mut term_neg = parent.clone();
                        term_neg.push(Hinge {
                            feature,
                            knot,
                            positive: false,
                        });

                        let mut candidate_terms = terms.clone();
                        candidate_terms.push(term_pos.clone());
                        candidate_terms.push(term_neg.clone());

                        let design = Self::design_columns(&candidate_terms, &rows);
                        let coefs = match linalg::solve_least_squares(&design, &y) {
                            Ok(c) => c,
                            // ランク落ちする候補はスキップ
                            Err(_) => continue,
                        };
                        let sse = linalg::sum_squared_residuals(&design, &y, &coefs);

                        if best.as_ref().map(|(b, _, _)| sse < *b).unwrap_or(true) {
                            best = Some((sse, term_pos, term_neg));
                        }
                    }
                }
            }

            match best {
                Some((sse, term_pos, term_neg)) if sse < current_sse * (1.0 - 1e-10) => {
                    terms.push(term_pos);
                    terms.push(term_neg);
                    current_sse = sse;
                }
                // 改善する候補がなければ打ち切り
                _ => break,
            }
        }

        let design = Self::design_columns(&terms, &rows);
        let coefficients = linalg::solve_least_squares(&design, &y)
            .map_err(|e| Error::FitError(e.to_string()))?;

        self.terms = terms;
        self.coefficients = coefficients;
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
        for i in 0..n_rows {
            let row: Vec<f64> = x_cols.iter().map(|col| col[i]).collect();
            let mut pred = self.coefficients[0];
            for (term, coef) in self.terms.iter().zip(self.coefficients[1..].iter()) {
                pred += coef * eval_term(term, &row);
            }
            predictions.push(pred);
        }

        Ok(predictions)
    }
}
