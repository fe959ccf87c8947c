//! 変換パイプラインの統合テスト

use resamplrs::frame::{DataFrame, DataValue, Series};
use resamplrs::pipeline::{Pipeline, StepSpec};

// カテゴリ列と数値列を持つテストデータを準備するヘルパー関数
fn mixed_frame() -> DataFrame {
    let mut df = DataFrame::new();
    df.add_column(
        "size",
        Series::from_f64(vec![10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0]),
    )
    .unwrap();
    df.add_column(
        "kind",
        Series::from_text(vec!["a", "a", "a", "a", "b", "b", "b", "c"]),
    )
    .unwrap();
    df.add_column(
        "price",
        Series::from_f64(vec![
            100.0, 210.0, 290.0, 420.0, 480.0, 610.0, 690.0, 820.0,
        ]),
    )
    .unwrap();
    df
}

#[test]
fn test_full_pipeline_fit_and_apply() {
    let df = mixed_frame();
    let spec = vec![
        StepSpec::CollapseRareCategories {
            column: "kind".to_string(),
            threshold: 0.2,
        },
        StepSpec::OneHotEncode {
            columns: vec!["kind".to_string()],
            drop_first: false,
        },
        StepSpec::CenterScale {
            columns: vec!["size".to_string()],
        },
    ];

    let mut pipeline = Pipeline::from_spec(&spec);
    let transformed = pipeline.fit_transform(&df).unwrap();

    // "c"は頻度1/8 < 0.2なので"other"にまとめられる
    assert!(transformed.has_column("kind_a"));
    assert!(transformed.has_column("kind_b"));
    assert!(transformed.has_column("kind_other"));
    assert!(!transformed.has_column("kind"));

    // 標準化された列は平均0
    let size = transformed.column("size").unwrap();
    assert!(size.mean().unwrap().abs() < 1e-10);
}

#[test]
fn test_no_leakage_from_assessment() {
    // パイプラインのパラメータは分析パーティションのみから学習される
    let df = mixed_frame();
    let analysis = df.take(&[0, 1, 2, 3]).unwrap();
    let assessment = df.take(&[4, 5, 6, 7]).unwrap();

    let spec = vec![StepSpec::CenterScale {
        columns: vec!["size".to_string()],
    }];
    let mut pipeline = Pipeline::from_spec(&spec);
    let _ = pipeline.fit_transform(&analysis).unwrap();
    let transformed = pipeline.transform(&assessment).unwrap();

    // 分析パーティションの平均は25、不偏標準偏差はsqrt(500/3)
    let mean = 25.0;
    let std = (500.0f64 / 3.0).sqrt();
    let values = transformed.column("size").unwrap().to_vec_f64().unwrap();
    let expected: Vec<f64> = vec![50.0, 60.0, 70.0, 80.0]
        .into_iter()
        .map(|v| (v - mean) / std)
        .collect();

    for (v, e) in values.iter().zip(expected.iter()) {
        assert!((v - e).abs() < 1e-10, "評価データは学習時のパラメータで変換されるはず");
    }
}

#[test]
fn test_unseen_category_maps_to_other() {
    let df = mixed_frame();
    let spec = vec![
        StepSpec::CollapseRareCategories {
            column: "kind".to_string(),
            threshold: 0.2,
        },
        StepSpec::OneHotEncode {
            columns: vec!["kind".to_string()],
            drop_first: false,
        },
    ];

    let mut pipeline = Pipeline::from_spec(&spec);
    let _ = pipeline.fit_transform(&df).unwrap();

    // 学習時に存在しなかった水準"z"を含む新しいデータ
    let mut new_df = DataFrame::new();
    new_df
        .add_column("size", Series::from_f64(vec![15.0]))
        .unwrap();
    new_df
        .add_column("kind", Series::from_text(vec!["z"]))
        .unwrap();
    new_df
        .add_column("price", Series::from_f64(vec![150.0]))
        .unwrap();

    // エラーにはならず、"other"の指標が1になる
    let encoded = pipeline.transform(&new_df).unwrap();
    assert_eq!(
        encoded.column("kind_other").unwrap().get(0),
        Some(&DataValue::Int64(1))
    );
    assert_eq!(
        encoded.column("kind_a").unwrap().get(0),
        Some(&DataValue::Int64(0))
    );
}

#[test]
fn test_drop_zero_variance_learned_on_fit_data() {
    let mut df = DataFrame::new();
    df.add_column("flat", Series::from_f64(vec![7.0, 7.0, 7.0]))
        .unwrap();
    df.add_column("x", Series::from_f64(vec![1.0, 2.0, 3.0]))
        .unwrap();

    let spec = vec![StepSpec::DropZeroVariance];
    let mut pipeline = Pipeline::from_spec(&spec);
    let transformed = pipeline.fit_transform(&df).unwrap();

    assert!(!transformed.has_column("flat"));
    assert!(transformed.has_column("x"));

    // 適用先で値が変動していても、学習時に定数だった列は削除される
    let mut new_df = DataFrame::new();
    new_df
        .add_column("flat", Series::from_f64(vec![1.0, 2.0]))
        .unwrap();
    new_df
        .add_column("x", Series::from_f64(vec![5.0, 6.0]))
        .unwrap();
    let applied = pipeline.transform(&new_df).unwrap();
    assert!(!applied.has_column("flat"));
}

#[test]
fn test_log_transform_skip_not_replayed() {
    // skip付きの対数変換は学習時のみ適用され、評価データには再適用されない
    let mut df = DataFrame::new();
    df.add_column("y", Series::from_f64(vec![1.0, 10.0, 100.0]))
        .unwrap();

    let spec = vec![StepSpec::LogTransform {
        column: "y".to_string(),
        skip_on_transform: true,
    }];
    let mut pipeline = Pipeline::from_spec(&spec);

    let fitted = pipeline.fit_transform(&df).unwrap();
    let logged = fitted.column("y").unwrap().to_vec_f64().unwrap();
    assert!((logged[2] - 100.0f64.ln()).abs() < 1e-10);

    // 目的変数の列を持たない新しいデータでもエラーにならない
    let mut new_df = DataFrame::new();
    new_df
        .add_column("x", Series::from_f64(vec![1.0]))
        .unwrap();
    let applied = pipeline.transform(&new_df).unwrap();
    assert!(applied.has_column("x"));
}

#[test]
fn test_pipeline_chains_step_outputs() {
    // 後段のステップは前段の変換結果を入力として学習する
    let df = mixed_frame();
    let spec = vec![
        StepSpec::OneHotEncode {
            columns: vec!["kind".to_string()],
            drop_first: false,
        },
        // ダミー変数化で生まれた指標列を標準化の対象にできる
        StepSpec::CenterScale {
            columns: vec!["kind_a".to_string()],
        },
    ];

    let mut pipeline = Pipeline::from_spec(&spec);
    let transformed = pipeline.fit_transform(&df).unwrap();

    let col = transformed.column("kind_a").unwrap();
    assert!(col.mean().unwrap().abs() < 1e-10);
}

#[test]
fn test_step_with_missing_column_errors() {
    let df = mixed_frame();
    let spec = vec![StepSpec::CenterScale {
        columns: vec!["missing".to_string()],
    }];

    let mut pipeline = Pipeline::from_spec(&spec);
    assert!(pipeline.fit_transform(&df).is_err());
}
