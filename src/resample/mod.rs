//! リサンプリングオーケストレータモジュール
//!
//! 分割の生成、パイプラインの学習と適用、モデルのあてはめ、メトリクスの集計を
//! 1つの実行にまとめます。分割同士は独立しているため、rayonで並列に処理されます。
//!
//! 同じ分割の列を複数の候補設定で再利用することで、分割識別子を揃えた
//! 対応のあるモデル比較（対応のあるt検定）ができます。

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::DataFrame;
use crate::metrics::{evaluate, Metric, MetricReport};
use crate::model::{resolve_features, ModelSpec};
use crate::pipeline::{Pipeline, StepSpec};
use crate::split::{split, Split, SplitConfig};
use crate::stats;

/// 1つの分割に対する評価結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitScore {
    /// 分割の識別子
    pub split_id: usize,
    /// 分割のラベル
    pub label: String,
    /// 評価パーティションの行インデックス（元データ基準）
    pub assessment_rows: Vec<usize>,
    /// 評価パーティションの真の値（パイプライン適用後）
    pub truths: Vec<f64>,
    /// モデルの予測値（評価パーティションの行順）
    pub predictions: Vec<f64>,
    /// この分割のメトリクス
    pub metrics: MetricReport,
}

/// 1つのメトリクスの分割間集計
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSummary {
    /// メトリクスの名前
    pub metric: String,
    /// 分割間の平均
    pub mean: f64,
    /// 分割間の標準偏差（不偏推定量）
    pub std: f64,
    /// 集計に使用した分割の数
    pub n_splits: usize,
}

/// リサンプリング評価のレポート
///
/// 分割ごとの評価結果（識別子順）と、メトリクスごとの集計を保持します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResampleReport {
    /// 分割ごとの評価結果（分割識別子の昇順）
    pub scores: Vec<SplitScore>,
    /// メトリクスごとの集計
    pub summary: Vec<MetricSummary>,
}

impl ResampleReport {
    /// 指定したメトリクスの分割ごとの値を識別子順に取得
    pub fn metric_values(&self, name: &str) -> Vec<f64> {
        self.scores
            .iter()
            .filter_map(|s| s.metrics.get(name))
            .collect()
    }

    /// 指定したメトリクスの集計を取得
    pub fn summary_for(&self, name: &str) -> Option<&MetricSummary> {
        self.summary.iter().find(|s| s.metric == name)
    }

    /// レポートをJSON文字列に変換
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// リサンプリング評価を実行
///
/// # 説明
/// 設定に従って分割を生成し、分割ごとに次の手順を実行します:
/// 1. パイプラインを分析パーティションで学習して適用する
/// 2. 学習済みパイプラインを評価パーティションに適用する
/// 3. 変換後の分析パーティションでモデルをあてはてる
/// 4. 変換後の評価パーティションで予測する
/// 5. 真の値と予測値からメトリクスを計算する
///
/// いずれかの分割で学習または予測が失敗した場合、実行全体がエラーになります
/// （失敗した分割を黙って除外すると集計に偏りが生じるため）。
pub fn resample(
    df: &DataFrame,
    split_config: &SplitConfig,
    steps: &[StepSpec],
    model_spec: &ModelSpec,
    metrics: &[Metric],
) -> Result<ResampleReport> {
    let splits = split(df, split_config)?;
    resample_with_splits(df, &splits, steps, model_spec, metrics)
}

/// 生成済みの分割の列でリサンプリング評価を実行
///
/// 同じ分割を複数の候補設定で再利用する場合に使用します。
/// レポートの分割識別子は、渡された分割の識別子をそのまま保持します。
pub fn resample_with_splits(
    df: &DataFrame,
    splits: &[Split],
    steps: &[StepSpec],
    model_spec: &ModelSpec,
    metrics: &[Metric],
) -> Result<ResampleReport> {
    if splits.is_empty() {
        return Err(Error::InvalidConfiguration(
            "少なくとも1つの分割が必要です".into(),
        ));
    }
    if metrics.is_empty() {
        return Err(Error::InvalidConfiguration(
            "少なくとも1つのメトリクスが必要です".into(),
        ));
    }

    log::info!(
        "{}個の分割でリサンプリング評価を開始します（目的変数: {}）",
        splits.len(),
        model_spec.target
    );

    // 分割同士は共有する可変状態を持たないため、並列に処理できる
    let mut scores: Vec<SplitScore> = splits
        .par_iter()
        .map(|s| evaluate_split(df, s, steps, model_spec, metrics))
        .collect::<Result<Vec<_>>>()?;

    // 完了順序に依存しないよう、分割識別子の順に並べ直す
    scores.sort_by_key(|s| s.split_id);

    let summary = summarize(&scores, metrics)?;

    log::info!("リサンプリング評価が完了しました");
    Ok(ResampleReport { scores, summary })
}

/// 1つの分割を評価する
fn evaluate_split(
    df: &DataFrame,
    split: &Split,
    steps: &[StepSpec],
    model_spec: &ModelSpec,
    metrics: &[Metric],
) -> Result<SplitScore> {
    let analysis = df.take(&split.analysis)?;
    let assessment = df.take(&split.assessment)?;

    // パイプラインとモデルは分割ごとに新しく構築する（分割間の状態共有なし）
    let mut pipeline = Pipeline::from_spec(steps);
    let train = pipeline.fit_transform(&analysis)?;
    let test = pipeline.transform(&assessment)?;

    let features = resolve_features(&train, &model_spec.target, model_spec.features.as_deref())?;
    let mut model = model_spec.family.build();
    model.fit(&train, &model_spec.target, &features)?;
    let predictions = model.predict(&test)?;

    let truths = test.column(&model_spec.target)?.to_vec_f64()?;
    let report = evaluate(metrics, &truths, &predictions)?;

    log::debug!("分割{}の評価が完了しました", split.label);

    Ok(SplitScore {
        split_id: split.id,
        label: split.label.clone(),
        assessment_rows: split.assessment.clone(),
        truths,
        predictions,
        metrics: report,
    })
}

/// メトリクスごとの分割間集計を計算
fn summarize(scores: &[SplitScore], metrics: &[Metric]) -> Result<Vec<MetricSummary>> {
    metrics
        .iter()
        .map(|metric| {
            let values: Vec<f64> = scores
                .iter()
                .filter_map(|s| s.metrics.get(metric.name()))
                .collect();

            let mean = stats::mean(&values)?;
            let std = if values.len() < 2 {
                0.0
            } else {
                stats::std(&values)?
            };

            Ok(MetricSummary {
                metric: metric.name().to_string(),
                mean,
                std,
                n_splits: values.len(),
            })
        })
        .collect()
}

/// 比較する1つの候補設定（パイプラインとモデルの組）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// 候補の名前（レポートで使用）
    pub name: String,
    /// 変換ステップの指定
    pub steps: Vec<StepSpec>,
    /// モデルの指定
    pub model: ModelSpec,
}

impl Candidate {
    /// 新しい候補を作成
    pub fn new<S: Into<String>>(name: S, steps: Vec<StepSpec>, model: ModelSpec) -> Self {
        Candidate {
            name: name.into(),
            steps,
            model,
        }
    }
}

/// 2つの候補間の対応のある比較の結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseComparison {
    /// 候補1の名前
    pub first: String,
    /// 候補2の名前
    pub second: String,
    /// 比較したメトリクスの名前
    pub metric: String,
    /// 分割ごとの差（候補1 - 候補2）の平均
    pub mean_diff: f64,
    /// 対応のあるt検定のt統計量
    pub statistic: f64,
    /// p値
    pub pvalue: f64,
    /// 有意水準で有意か
    pub significant: bool,
}

/// 複数候補の比較レポート
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// 候補ごとのリサンプリング評価レポート
    pub reports: Vec<(String, ResampleReport)>,
    /// 候補ペアごとの対応のある比較
    pub pairwise: Vec<PairwiseComparison>,
}

impl ComparisonReport {
    /// 名前から候補のレポートを取得
    pub fn report_for(&self, name: &str) -> Option<&ResampleReport> {
        self.reports
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, r)| r)
    }
}

/// 複数の候補設定を同じ分割の上で比較
///
/// # 説明
/// 分割は一度だけ生成され、すべての候補で同一の分割が再利用されます。
/// これにより分割識別子が揃い、候補ペアごとに分割単位の
/// 対応のあるt検定ができます。
pub fn compare(
    df: &DataFrame,
    split_config: &SplitConfig,
    candidates: &[Candidate],
    metrics: &[Metric],
    alpha: f64,
) -> Result<ComparisonReport> {
    if candidates.len() < 2 {
        return Err(Error::InvalidConfiguration(
            "比較には少なくとも2つの候補が必要です".into(),
        ));
    }

    // 分割は一度だけ生成して全候補で共有する
    let splits = split(df, split_config)?;

    let reports: Vec<(String, ResampleReport)> = candidates
        .iter()
        .map(|c| {
            let report = resample_with_splits(df, &splits, &c.steps, &c.model, metrics)?;
            Ok((c.name.clone(), report))
        })
        .collect::<Result<Vec<_>>>()?;

    // 分割識別子が候補間で一致していることを確認する
    let base_ids: Vec<usize> = reports[0].1.scores.iter().map(|s| s.split_id).collect();
    for (name, report) in &reports[1..] {
        let ids: Vec<usize> = report.scores.iter().map(|s| s.split_id).collect();
        if ids != base_ids {
            return Err(Error::InvalidOperation(format!(
                "候補{}の分割識別子が一致しません",
                name
            )));
        }
    }

    let mut pairwise = Vec::new();
    for i in 0..reports.len() {
        for j in (i + 1)..reports.len() {
            for metric in metrics {
                let a = reports[i].1.metric_values(metric.name());
                let b = reports[j].1.metric_values(metric.name());

                let comparison = match stats::paired_ttest(&a, &b, alpha) {
                    Ok(t) => PairwiseComparison {
                        first: reports[i].0.clone(),
                        second: reports[j].0.clone(),
                        metric: metric.name().to_string(),
                        mean_diff: t.mean_diff,
                        statistic: t.statistic,
                        pvalue: t.pvalue,
                        significant: t.significant,
                    },
                    // ペア差分が一定（分散0）の場合は差の証拠なしとして扱う
                    Err(Error::DegenerateColumn(_)) => {
                        let mean_diff = a
                            .iter()
                            .zip(b.iter())
                            .map(|(x, y)| x - y)
                            .sum::<f64>()
                            / a.len() as f64;
                        PairwiseComparison {
                            first: reports[i].0.clone(),
                            second: reports[j].0.clone(),
                            metric: metric.name().to_string(),
                            mean_diff,
                            statistic: 0.0,
                            pvalue: 1.0,
                            significant: false,
                        }
                    }
                    Err(e) => return Err(e),
                };

                pairwise.push(comparison);
            }
        }
    }

    Ok(ComparisonReport { reports, pairwise })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Series;
    use crate::model::ModelFamily;
    use crate::split::SplitStrategy;

    fn linear_frame(n: usize) -> DataFrame {
        let mut df = DataFrame::new();
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        df.add_column("x", Series::from_f64(x)).unwrap();
        df.add_column("y", Series::from_f64(y)).unwrap();
        df
    }

    #[test]
    fn test_resample_scores_sorted_by_id() {
        let df = linear_frame(60);
        let config = SplitConfig::new(SplitStrategy::KFold { k: 5 }).with_seed(11);
        let spec = ModelSpec::new("y", ModelFamily::Linear);

        let report = resample(&df, &config, &[], &spec, &[Metric::Rmse]).unwrap();

        assert_eq!(report.scores.len(), 5);
        let ids: Vec<usize> = report.scores.iter().map(|s| s.split_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_resample_requires_metrics() {
        let df = linear_frame(20);
        let config = SplitConfig::new(SplitStrategy::KFold { k: 2 }).with_seed(1);
        let spec = ModelSpec::new("y", ModelFamily::Linear);

        assert!(matches!(
            resample(&df, &config, &[], &spec, &[]),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_summarize_mean_and_std() {
        let df = linear_frame(40);
        let config = SplitConfig::new(SplitStrategy::KFold { k: 4 }).with_seed(2);
        let spec = ModelSpec::new("y", ModelFamily::Linear);

        let report = resample(&df, &config, &[], &spec, &[Metric::Rmse]).unwrap();
        let summary = report.summary_for("rmse").unwrap();

        // 完全な線形データなのでRMSEはほぼ0になる
        assert!(summary.mean < 1e-8);
        assert_eq!(summary.n_splits, 4);
    }
}
