//! 分割（リサンプリング）モジュール
//!
//! データセットを分析パーティションと評価パーティションの組に分割します。
//! ホールドアウト、V分割交差検証、反復交差検証、ブートストラップをサポートし、
//! 指定した列による層化抽出にも対応します。

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::frame::{DataFrame, DataValue};

/// リサンプリング戦略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SplitStrategy {
    /// 単純ホールドアウト（評価パーティションの割合を指定）
    Holdout { test_fraction: f64 },
    /// V分割交差検証
    KFold { k: usize },
    /// 反復V分割交差検証
    RepeatedKFold { k: usize, repeats: usize },
    /// ブートストラップ（復元抽出、評価は非抽出行）
    Bootstrap { times: usize },
}

/// 分割の設定
///
/// 乱数シードと層化列は、グローバル状態ではなく設定オブジェクトで明示的に渡します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// リサンプリング戦略
    pub strategy: SplitStrategy,
    /// 再現性のための乱数シード
    pub seed: Option<u64>,
    /// 層化に使用する列名
    pub strata: Option<String>,
}

impl SplitConfig {
    /// 新しい分割設定を作成
    pub fn new(strategy: SplitStrategy) -> Self {
        SplitConfig {
            strategy,
            seed: None,
            strata: None,
        }
    }

    /// 乱数シードを設定
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 層化列を設定
    pub fn with_strata<S: Into<String>>(mut self, strata: S) -> Self {
        self.strata = Some(strata.into());
        self
    }
}

/// 1つの分割: 分析パーティションと評価パーティションのインデックス組
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Split {
    /// 生成順に割り当てられる識別子
    pub id: usize,
    /// 表示用ラベル（fold01など）
    pub label: String,
    /// 分析（学習）パーティションの行インデックス
    pub analysis: Vec<usize>,
    /// 評価パーティションの行インデックス
    pub assessment: Vec<usize>,
}

/// データフレームを設定に従って分割する
///
/// # 説明
/// 戦略ごとに分割の列を生成します。同じシードを指定すれば
/// 同じ分割が再現されます。設定の検証はすべての分割生成の前に行われます。
///
/// # 例
/// ```rust,no_run
/// use resamplrs::split::{split, SplitConfig, SplitStrategy};
/// use resamplrs::frame::DataFrame;
///
/// let df = DataFrame::new(); // データを含むDataFrame
/// let config = SplitConfig::new(SplitStrategy::KFold { k: 10 }).with_seed(42);
/// let splits = split(&df, &config).unwrap();
/// ```
pub fn split(df: &DataFrame, config: &SplitConfig) -> Result<Vec<Split>> {
    if df.is_empty() {
        return Err(Error::EmptyData("分割にはデータが必要です".into()));
    }

    // 設定の検証（フェイルファスト）
    validate_config(df, config)?;

    let groups = strata_groups(df, config.strata.as_deref())?;
    let n_rows = df.nrows();

    let splits = match config.strategy {
        SplitStrategy::Holdout { test_fraction } => {
            holdout_impl(&groups, test_fraction, config.seed)
        }
        SplitStrategy::KFold { k } => k_fold_impl(&groups, k, config.seed, 0, ""),
        SplitStrategy::RepeatedKFold { k, repeats } => {
            let mut all = Vec::with_capacity(k * repeats);
            for repeat in 0..repeats {
                let seed = config.seed.map(|s| s + repeat as u64);
                let prefix = format!("repeat{:02}_", repeat + 1);
                all.extend(k_fold_impl(&groups, k, seed, repeat * k, &prefix));
            }
            all
        }
        SplitStrategy::Bootstrap { times } => bootstrap_impl(&groups, n_rows, times, config.seed),
    };

    log::debug!(
        "{}行のデータから{}個の分割を生成しました",
        n_rows,
        splits.len()
    );
    Ok(splits)
}

/// 分割設定を検証する
fn validate_config(df: &DataFrame, config: &SplitConfig) -> Result<()> {
    match config.strategy {
        SplitStrategy::Holdout { test_fraction } => {
            if test_fraction <= 0.0 || test_fraction >= 1.0 {
                return Err(Error::InvalidConfiguration(format!(
                    "評価割合は0と1の間で指定してください: {}",
                    test_fraction
                )));
            }
        }
        SplitStrategy::KFold { k } | SplitStrategy::RepeatedKFold { k, .. } => {
            if k < 2 {
                return Err(Error::InvalidConfiguration(format!(
                    "交差検証の分割数は2以上である必要があります: {}",
                    k
                )));
            }
            if k > df.nrows() {
                return Err(Error::InvalidConfiguration(format!(
                    "分割数({})が行数({})を超えています",
                    k,
                    df.nrows()
                )));
            }
            if let SplitStrategy::RepeatedKFold { repeats, .. } = config.strategy {
                if repeats == 0 {
                    return Err(Error::InvalidConfiguration(
                        "反復回数は1以上である必要があります".into(),
                    ));
                }
            }
        }
        SplitStrategy::Bootstrap { times } => {
            if times == 0 {
                return Err(Error::InvalidConfiguration(
                    "ブートストラップの回数は1以上である必要があります".into(),
                ));
            }
        }
    }

    if let Some(strata) = &config.strata {
        if !df.has_column(strata) {
            return Err(Error::ColumnNotFound(strata.clone()));
        }
    }

    Ok(())
}

/// 層ごとの行インデックスグループを構築する
///
/// 層化列がカテゴリの場合は値ごと、数値の場合は四分位ビンごとにグループ化します。
/// 層化列が指定されない場合は全行が1つのグループになります。
fn strata_groups(df: &DataFrame, strata: Option<&str>) -> Result<Vec<Vec<usize>>> {
    let strata = match strata {
        Some(name) => name,
        None => return Ok(vec![(0..df.nrows()).collect()]),
    };

    let series = df.column(strata)?;

    if series.is_numeric() {
        // 数値列は四分位点でビンに分ける
        let q1 = series.quantile(0.25)?;
        let q2 = series.quantile(0.5)?;
        let q3 = series.quantile(0.75)?;

        let mut bins: Vec<Vec<usize>> = vec![Vec::new(); 5];
        for (idx, value) in series.iter().enumerate() {
            match value.to_f64() {
                Some(v) if v <= q1 => bins[0].push(idx),
                Some(v) if v <= q2 => bins[1].push(idx),
                Some(v) if v <= q3 => bins[2].push(idx),
                Some(_) => bins[3].push(idx),
                // 欠損値は独立した層として扱う
                None => bins[4].push(idx),
            }
        }
        Ok(bins.into_iter().filter(|b| !b.is_empty()).collect())
    } else {
        // カテゴリ列は値ごとにグループ化（出現順を保持）
        let mut order: Vec<String> = Vec::new();
        let mut groups: std::collections::HashMap<String, Vec<usize>> =
            std::collections::HashMap::new();
        for (idx, value) in series.iter().enumerate() {
            let key = match value {
                DataValue::Text(s) => s.clone(),
                DataValue::Na => "NA".to_string(),
                other => other.to_string(),
            };
            if !groups.contains_key(&key) {
                order.push(key.clone());
            }
            groups.entry(key).or_default().push(idx);
        }
        Ok(order.into_iter().map(|k| groups.remove(&k).unwrap()).collect())
    }
}

/// シード付きの乱数生成器を作成（再現性のため）
fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    }
}

/// ホールドアウト分割の内部実装
fn holdout_impl(groups: &[Vec<usize>], test_fraction: f64, seed: Option<u64>) -> Vec<Split> {
    let mut rng = make_rng(seed);
    let mut assessment = Vec::new();
    let mut analysis = Vec::new();

    // 各層から指定割合を評価パーティションへ
    for group in groups {
        let mut indices = group.clone();
        indices.shuffle(&mut rng);
        let n_test = ((indices.len() as f64) * test_fraction).round() as usize;
        assessment.extend_from_slice(&indices[..n_test]);
        analysis.extend_from_slice(&indices[n_test..]);
    }

    analysis.sort_unstable();
    assessment.sort_unstable();

    vec![Split {
        id: 0,
        label: "holdout".to_string(),
        analysis,
        assessment,
    }]
}

/// V分割交差検証の内部実装
///
/// 各層をシャッフルした上でラウンドロビンに配ることで、
/// どのフォールドも層の分布をほぼ保ちます。
fn k_fold_impl(
    groups: &[Vec<usize>],
    k: usize,
    seed: Option<u64>,
    id_offset: usize,
    label_prefix: &str,
) -> Vec<Split> {
    let mut rng = make_rng(seed);

    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); k];
    for group in groups {
        let mut indices = group.clone();
        indices.shuffle(&mut rng);
        for (i, idx) in indices.into_iter().enumerate() {
            folds[i % k].push(idx);
        }
    }

    (0..k)
        .map(|fold_idx| {
            let mut assessment = folds[fold_idx].clone();
            let mut analysis: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();

            analysis.sort_unstable();
            assessment.sort_unstable();

            Split {
                id: id_offset + fold_idx,
                label: format!("{}fold{:02}", label_prefix, fold_idx + 1),
                analysis,
                assessment,
            }
        })
        .collect()
}

/// ブートストラップ分割の内部実装
///
/// 各層のサイズ分だけ復元抽出し、一度も抽出されなかった行を評価パーティションとします。
fn bootstrap_impl(
    groups: &[Vec<usize>],
    n_rows: usize,
    times: usize,
    seed: Option<u64>,
) -> Vec<Split> {
    let mut rng = make_rng(seed);

    (0..times)
        .map(|t| {
            let mut drawn = vec![false; n_rows];
            let mut analysis = Vec::with_capacity(n_rows);

            for group in groups {
                for _ in 0..group.len() {
                    let idx = group[rng.random_range(0..group.len())];
                    drawn[idx] = true;
                    analysis.push(idx);
                }
            }

            let assessment: Vec<usize> = (0..n_rows).filter(|&i| !drawn[i]).collect();
            analysis.sort_unstable();

            Split {
                id: t,
                label: format!("bootstrap{:02}", t + 1),
                analysis,
                assessment,
            }
        })
        .collect()
}
