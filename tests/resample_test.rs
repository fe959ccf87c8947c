//! リサンプリングオーケストレータの統合テスト

use resamplrs::frame::{DataFrame, Series};
use resamplrs::metrics::Metric;
use resamplrs::model::{ModelFamily, ModelSpec};
use resamplrs::pipeline::StepSpec;
use resamplrs::resample::{compare, resample, resample_with_splits, Candidate};
use resamplrs::split::{split, SplitConfig, SplitStrategy};

// 緩やかなノイズを持つ非線形データを準備するヘルパー関数
fn workshop_frame(n: usize) -> DataFrame {
    let mut df = DataFrame::new();
    let x: Vec<f64> = (0..n).map(|i| i as f64 / 2.0).collect();
    // 決定的な擬似ノイズ（テストの再現性のため）
    let y: Vec<f64> = x
        .iter()
        .enumerate()
        .map(|(i, v)| 5.0 + 2.0 * v + (v - 12.0).max(0.0) * 3.0 + ((i % 5) as f64 - 2.0) * 0.3)
        .collect();
    let kind: Vec<&str> = (0..n)
        .map(|i| match i % 10 {
            0..=5 => "standard",
            6..=8 => "premium",
            _ => "rare",
        })
        .collect();
    df.add_column("x", Series::from_f64(x)).unwrap();
    df.add_column("kind", Series::from_text(kind)).unwrap();
    df.add_column("y", Series::from_f64(y)).unwrap();
    df
}

fn preprocessing_steps() -> Vec<StepSpec> {
    vec![
        StepSpec::CollapseRareCategories {
            column: "kind".to_string(),
            threshold: 0.2,
        },
        StepSpec::OneHotEncode {
            columns: vec!["kind".to_string()],
            drop_first: true,
        },
        StepSpec::CenterScale {
            columns: vec!["x".to_string()],
        },
    ]
}

#[test]
fn test_resample_end_to_end() {
    let df = workshop_frame(80);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 8 }).with_seed(42);
    let model = ModelSpec::new("y", ModelFamily::Linear);

    let report = resample(
        &df,
        &config,
        &preprocessing_steps(),
        &model,
        &[Metric::Rmse, Metric::RSquared],
    )
    .unwrap();

    // 分割ごとの結果は識別子順に保持される
    assert_eq!(report.scores.len(), 8);
    let ids: Vec<usize> = report.scores.iter().map(|s| s.split_id).collect();
    assert_eq!(ids, (0..8).collect::<Vec<_>>());

    // 予測テーブルは評価パーティションと同じ行数
    for score in &report.scores {
        assert_eq!(score.predictions.len(), score.assessment_rows.len());
        assert_eq!(score.truths.len(), score.assessment_rows.len());
    }

    // 集計には全分割が寄与する
    let rmse = report.summary_for("rmse").unwrap();
    assert_eq!(rmse.n_splits, 8);
    assert!(rmse.mean >= 0.0);
}

#[test]
fn test_paired_comparison_preserves_split_ids() {
    // 同じ設定とシードで異なるモデルを評価すると、分割識別子が1対1で揃う
    let df = workshop_frame(60);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 6 }).with_seed(42);
    let steps = preprocessing_steps();
    let metrics = [Metric::Rmse];

    let linear = resample(
        &df,
        &config,
        &steps,
        &ModelSpec::new("y", ModelFamily::Linear),
        &metrics,
    )
    .unwrap();
    let mars = resample(
        &df,
        &config,
        &steps,
        &ModelSpec::new(
            "y",
            ModelFamily::Mars {
                max_terms: 6,
                degree: 1,
            },
        ),
        &metrics,
    )
    .unwrap();

    let linear_ids: Vec<usize> = linear.scores.iter().map(|s| s.split_id).collect();
    let mars_ids: Vec<usize> = mars.scores.iter().map(|s| s.split_id).collect();
    assert_eq!(linear_ids, mars_ids);

    // 評価パーティションの行集合も一致するはず
    for (a, b) in linear.scores.iter().zip(mars.scores.iter()) {
        assert_eq!(a.assessment_rows, b.assessment_rows);
    }
}

#[test]
fn test_resample_with_splits_reuses_identical_splits() {
    let df = workshop_frame(50);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 5 }).with_seed(7);
    let splits = split(&df, &config).unwrap();

    let report = resample_with_splits(
        &df,
        &splits,
        &preprocessing_steps(),
        &ModelSpec::new("y", ModelFamily::Linear),
        &[Metric::Mae],
    )
    .unwrap();

    for (score, s) in report.scores.iter().zip(splits.iter()) {
        assert_eq!(score.split_id, s.id);
        assert_eq!(score.assessment_rows, s.assessment);
    }
}

#[test]
fn test_compare_runs_paired_ttest() {
    let df = workshop_frame(80);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 8 }).with_seed(13);

    let candidates = vec![
        Candidate::new(
            "linear",
            preprocessing_steps(),
            ModelSpec::new("y", ModelFamily::Linear),
        ),
        Candidate::new(
            "mars",
            preprocessing_steps(),
            ModelSpec::new(
                "y",
                ModelFamily::Mars {
                    max_terms: 8,
                    degree: 1,
                },
            ),
        ),
    ];

    let comparison = compare(&df, &config, &candidates, &[Metric::Rmse], 0.05).unwrap();

    assert_eq!(comparison.reports.len(), 2);
    assert_eq!(comparison.pairwise.len(), 1);

    let pair = &comparison.pairwise[0];
    assert_eq!(pair.first, "linear");
    assert_eq!(pair.second, "mars");
    assert_eq!(pair.metric, "rmse");
    assert!(pair.pvalue >= 0.0 && pair.pvalue <= 1.0);

    // データにはヒンジ構造があるため、MARSのRMSEは線形モデルより小さいはず
    let linear_rmse = comparison
        .report_for("linear")
        .unwrap()
        .summary_for("rmse")
        .unwrap()
        .mean;
    let mars_rmse = comparison
        .report_for("mars")
        .unwrap()
        .summary_for("rmse")
        .unwrap()
        .mean;
    assert!(
        mars_rmse < linear_rmse,
        "MARSのRMSE({})は線形モデル({})より小さいはず",
        mars_rmse,
        linear_rmse
    );
}

#[test]
fn test_per_split_failure_aborts_whole_run() {
    // 存在しない列を参照するステップは実行全体を失敗させる（部分的な集計はしない）
    let df = workshop_frame(40);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 4 }).with_seed(1);
    let steps = vec![StepSpec::CenterScale {
        columns: vec!["ghost".to_string()],
    }];
    let model = ModelSpec::new("y", ModelFamily::Linear);

    let result = resample(&df, &config, &steps, &model, &[Metric::Rmse]);
    assert!(result.is_err());
}

#[test]
fn test_configuration_errors_before_any_split() {
    let df = workshop_frame(40);
    let bad_config = SplitConfig::new(SplitStrategy::KFold { k: 1 });
    let model = ModelSpec::new("y", ModelFamily::Linear);

    assert!(matches!(
        resample(&df, &bad_config, &[], &model, &[Metric::Rmse]),
        Err(resamplrs::Error::InvalidConfiguration(_))
    ));
}

#[test]
fn test_report_serializes_to_json() {
    let df = workshop_frame(30);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 3 }).with_seed(4);
    let model = ModelSpec::new("y", ModelFamily::Linear);

    let report = resample(&df, &config, &[], &model, &[Metric::Rmse]).unwrap();
    let json = report.to_json().unwrap();
    assert!(json.contains("rmse"));
    assert!(json.contains("scores"));
}

#[test]
fn test_log_target_pipeline_end_to_end() {
    // 目的変数を学習時のみ対数変換するワークフロー
    let mut df = DataFrame::new();
    let x: Vec<f64> = (1..=40).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| (0.1 * v).exp() * 2.0).collect();
    df.add_column("x", Series::from_f64(x)).unwrap();
    df.add_column("y", Series::from_f64(y)).unwrap();

    let steps = vec![StepSpec::LogTransform {
        column: "y".to_string(),
        skip_on_transform: false,
    }];
    let config = SplitConfig::new(SplitStrategy::KFold { k: 4 }).with_seed(21);
    let model = ModelSpec::new("y", ModelFamily::Linear);

    // 対数スケールでは関係が線形になるため、R^2は1に近いはず
    let report = resample(&df, &config, &steps, &model, &[Metric::RSquared]).unwrap();
    let r2 = report.summary_for("r_squared").unwrap().mean;
    assert!(r2 > 0.99, "対数スケールでのR^2が低すぎます: {}", r2);
}
