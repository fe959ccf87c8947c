//! 分割モジュールの統合テスト

use resamplrs::frame::{DataFrame, Series};
use resamplrs::split::{split, SplitConfig, SplitStrategy};

// テストデータの準備を行うヘルパー関数
fn numeric_frame(n: usize) -> DataFrame {
    let mut df = DataFrame::new();
    df.add_column("x", Series::from_f64((0..n).map(|i| i as f64).collect()))
        .unwrap();
    df
}

#[test]
fn test_ten_fold_on_hundred_rows() {
    // 100行をシード42で10分割するシナリオ
    let df = numeric_frame(100);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 10 }).with_seed(42);
    let splits = split(&df, &config).unwrap();

    assert_eq!(splits.len(), 10);
    for s in &splits {
        assert_eq!(s.assessment.len(), 10, "各分割の評価パーティションは10行");
        assert_eq!(s.analysis.len(), 90, "各分割の分析パーティションは90行");
    }

    // 評価パーティションは互いに素で、全行をカバーする
    let mut all_assessment: Vec<usize> = splits
        .iter()
        .flat_map(|s| s.assessment.iter().copied())
        .collect();
    all_assessment.sort_unstable();
    assert_eq!(all_assessment, (0..100).collect::<Vec<_>>());
}

#[test]
fn test_split_determinism_with_seed() {
    let df = numeric_frame(100);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 10 }).with_seed(42);

    let first = split(&df, &config).unwrap();
    let second = split(&df, &config).unwrap();

    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.label, b.label);
        assert_eq!(a.analysis, b.analysis);
        assert_eq!(a.assessment, b.assessment);
    }
}

#[test]
fn test_different_seeds_differ() {
    let df = numeric_frame(100);
    let a = split(
        &df,
        &SplitConfig::new(SplitStrategy::KFold { k: 10 }).with_seed(1),
    )
    .unwrap();
    let b = split(
        &df,
        &SplitConfig::new(SplitStrategy::KFold { k: 10 }).with_seed(2),
    )
    .unwrap();

    let same = a
        .iter()
        .zip(b.iter())
        .all(|(x, y)| x.assessment == y.assessment);
    assert!(!same, "異なるシードでは異なる分割になるはず");
}

#[test]
fn test_analysis_and_assessment_disjoint() {
    let df = numeric_frame(50);
    let config = SplitConfig::new(SplitStrategy::KFold { k: 5 }).with_seed(3);
    let splits = split(&df, &config).unwrap();

    for s in &splits {
        for idx in &s.assessment {
            assert!(
                !s.analysis.contains(idx),
                "分析と評価のパーティションは互いに素のはず"
            );
        }
    }
}

#[test]
fn test_numeric_strata_uses_quartile_bins() {
    // 数値の層化列は四分位ビンでグループ化される
    let mut df = DataFrame::new();
    df.add_column("x", Series::from_f64((0..40).map(|i| i as f64).collect()))
        .unwrap();
    df.add_column(
        "value",
        Series::from_f64((0..40).map(|i| i as f64 * 10.0).collect()),
    )
    .unwrap();

    let config = SplitConfig::new(SplitStrategy::KFold { k: 4 })
        .with_seed(5)
        .with_strata("value");
    let splits = split(&df, &config).unwrap();

    // 各フォールドには各四分位からほぼ同数の行が入るはず
    for s in &splits {
        let low = s.assessment.iter().filter(|&&i| i < 10).count();
        let high = s.assessment.iter().filter(|&&i| i >= 30).count();
        assert!(low >= 2 && low <= 3, "下位四分位の行数: {}", low);
        assert!(high >= 2 && high <= 3, "上位四分位の行数: {}", high);
    }
}

#[test]
fn test_bootstrap_assessment_is_complement() {
    let df = numeric_frame(40);
    let config = SplitConfig::new(SplitStrategy::Bootstrap { times: 5 }).with_seed(8);
    let splits = split(&df, &config).unwrap();

    assert_eq!(splits.len(), 5);
    for s in &splits {
        // 復元抽出なので分析パーティションの行数は元データと同じ
        assert_eq!(s.analysis.len(), 40);

        // 評価パーティションは一度も抽出されなかった行そのもの
        for idx in 0..40 {
            let in_analysis = s.analysis.contains(&idx);
            let in_assessment = s.assessment.contains(&idx);
            assert!(in_analysis != in_assessment);
        }
    }
}

#[test]
fn test_invalid_configurations_fail_fast() {
    let df = numeric_frame(10);

    // k < 2
    assert!(split(&df, &SplitConfig::new(SplitStrategy::KFold { k: 1 })).is_err());

    // k > 行数
    assert!(split(&df, &SplitConfig::new(SplitStrategy::KFold { k: 11 })).is_err());

    // 不正なホールドアウト割合
    assert!(split(
        &df,
        &SplitConfig::new(SplitStrategy::Holdout { test_fraction: 1.5 })
    )
    .is_err());

    // 存在しない層化列
    assert!(split(
        &df,
        &SplitConfig::new(SplitStrategy::KFold { k: 2 }).with_strata("ghost")
    )
    .is_err());
}
