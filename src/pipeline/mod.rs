//! 特徴量変換パイプラインモジュール
//!
//! recipesスタイルのデータ変換パイプラインを提供します。
//! 各ステップは分析パーティションのみで学習（fit）され、
//! 学習済みパラメータで任意のデータに適用（transform）されます。

pub mod steps;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::DataFrame;

pub use steps::{
    LogTransform, OneHotEncoder, RareCategoryCollapser, SplineBasis, StandardScaler,
    ZeroVarianceFilter,
};

/// データ変換器のトレイト
pub trait Transformer {
    /// データから学習する
    fn fit(&mut self, df: &DataFrame) -> Result<()>;

    /// 学習済みパラメータでデータを変換する
    fn transform(&self, df: &DataFrame) -> Result<DataFrame>;

    /// データを学習し、その後変換する
    fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}

/// データ変換ステップを連鎖させるパイプライン
///
/// ステップiの学習は、ステップi-1までの変換を適用した出力に対して行われます。
pub struct Pipeline {
    transformers: Vec<Box<dyn Transformer>>,
}

impl Pipeline {
    /// 新しいパイプラインを作成
    pub fn new() -> Self {
        Pipeline {
            transformers: Vec::new(),
        }
    }

    /// 宣言的なステップ指定からパイプラインを構築
    pub fn from_spec(spec: &[StepSpec]) -> Self {
        let mut pipeline = Pipeline::new();
        for step in spec {
            pipeline.transformers.push(step.build());
        }
        pipeline
    }

    /// 変換器をパイプラインに追加
    pub fn add_transformer<T: Transformer + 'static>(&mut self, transformer: T) -> &mut Self {
        self.transformers.push(Box::new(transformer));
        self
    }

    /// パイプラインを学習
    pub fn fit(&mut self, df: &DataFrame) -> Result<()> {
        let _ = self.fit_transform(df)?;
        Ok(())
    }

    /// パイプラインを学習してから変換
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for transformer in &mut self.transformers {
            result = transformer.fit_transform(&result)?;
        }

        Ok(result)
    }

    /// 学習済みのパイプラインで全ステップを適用
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();

        for transformer in &self.transformers {
            result = transformer.transform(&result)?;
        }

        Ok(result)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// 変換ステップの宣言的な指定
///
/// 分割ごとに新しいステップインスタンスを構築するために使用します。
/// 学習済みパラメータが分割をまたいで共有されることはありません。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepSpec {
    /// 出現頻度が閾値未満のカテゴリ水準を"other"にまとめる
    CollapseRareCategories { column: String, threshold: f64 },
    /// カテゴリ列をダミー変数に展開する
    OneHotEncode { columns: Vec<String>, drop_first: bool },
    /// 学習時に定数だった列を削除する
    DropZeroVariance,
    /// 数値列を標準化する（平均0、標準偏差1）
    CenterScale { columns: Vec<String> },
    /// 数値列を自然スプライン基底に展開する
    SplineBasis { column: String, deg_free: usize },
    /// 対数変換（skip_on_transformで学習時のみ適用）
    LogTransform {
        column: String,
        skip_on_transform: bool,
    },
}

impl StepSpec {
    /// ステップの新しいインスタンスを構築
    pub fn build(&self) -> Box<dyn Transformer> {
        match self {
            StepSpec::CollapseRareCategories { column, threshold } => {
                Box::new(RareCategoryCollapser::new(column.clone(), *threshold))
            }
            StepSpec::OneHotEncode {
                columns,
                drop_first,
            } => Box::new(OneHotEncoder::new(columns.clone(), *drop_first)),
            StepSpec::DropZeroVariance => Box::new(ZeroVarianceFilter::new()),
            StepSpec::CenterScale { columns } => Box::new(StandardScaler::new(columns.clone())),
            StepSpec::SplineBasis { column, deg_free } => {
                Box::new(SplineBasis::new(column.clone(), *deg_free))
            }
            StepSpec::LogTransform {
                column,
                skip_on_transform,
            } => Box::new(LogTransform::new(column.clone(), *skip_on_transform)),
        }
    }
}
