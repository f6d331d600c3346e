//! Category classification of dataset records
//!
//! The [`Classifier`] compiles one [`KeywordMatcher`] per [`Category`] up
//! front and is immutable afterwards, so one instance can serve any number of
//! independent datasets. Each call to [`Classifier::classify`] lower-cases the
//! text column once into a [`NormalizedTexts`] cache shared by all categories.

use serde::Serialize;
use tracing::{debug, info};

use super::matcher::{KeywordMatcher, MatchMode};
use crate::error::Result;
use crate::models::{CellValue, Category, Dataset};

/// Lower-cased copy of the text column, one entry per record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedTexts {
    column: String,
    texts: Vec<Option<String>>,
}

impl NormalizedTexts {
    /// Normalize the named text column of a dataset
    pub fn from_dataset(dataset: &Dataset, text_column: &str) -> Result<Self> {
        let index = dataset.column_index(text_column)?;
        let texts = dataset
            .column_values(index)
            .map(|cell| cell.as_text().map(|t| t.to_lowercase()))
            .collect();

        Ok(Self {
            column: text_column.to_string(),
            texts,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        self.texts.get(row).and_then(|t| t.as_deref())
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Records with no text at all
    pub fn missing(&self) -> usize {
        self.texts.iter().filter(|t| t.is_none()).count()
    }
}

/// Records matched by one category: source row indices in ascending order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledSubset {
    category: String,
    rows: Vec<usize>,
}

impl LabeledSubset {
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Matching row indices, in source order
    pub fn indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, row: usize) -> bool {
        self.rows.binary_search(&row).is_ok()
    }

    /// Iterate over the matching rows of the dataset this subset came from
    pub fn rows<'a>(
        &'a self,
        dataset: &'a Dataset,
    ) -> impl Iterator<Item = (usize, &'a [CellValue])> + 'a {
        self.rows
            .iter()
            .filter_map(move |&i| dataset.row(i).map(|row| (i, row)))
    }
}

/// Result of classifying one dataset
#[derive(Debug, Clone)]
pub struct Classification {
    texts: NormalizedTexts,
    subsets: Vec<LabeledSubset>,
}

impl Classification {
    pub fn texts(&self) -> &NormalizedTexts {
        &self.texts
    }

    /// Subsets in category order
    pub fn subsets(&self) -> &[LabeledSubset] {
        &self.subsets
    }

    /// Look up the subset of a category by name
    pub fn subset(&self, category: &str) -> Option<&LabeledSubset> {
        self.subsets.iter().find(|s| s.category == category)
    }

    /// Number of records classified
    pub fn total(&self) -> usize {
        self.texts.len()
    }
}

/// Compiled set of category matchers
#[derive(Debug, Clone)]
pub struct Classifier {
    categories: Vec<(Category, KeywordMatcher)>,
    mode: MatchMode,
}

impl Classifier {
    /// Compile a matcher for every category
    pub fn new(categories: &[Category], mode: MatchMode) -> Result<Self> {
        let categories = categories
            .iter()
            .map(|category| {
                KeywordMatcher::new(category.keywords(), mode)
                    .map(|matcher| (category.clone(), matcher))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(categories = categories.len(), mode = %mode, "Compiled classifier");
        Ok(Self { categories, mode })
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Categories in configuration order
    pub fn categories(&self) -> impl Iterator<Item = &Category> + '_ {
        self.categories.iter().map(|(category, _)| category)
    }

    /// Classify every record of the dataset against every category
    ///
    /// Fails with [`crate::error::Error::ColumnNotFound`] if the text column
    /// does not exist. Records without text belong to no category.
    pub fn classify(&self, dataset: &Dataset, text_column: &str) -> Result<Classification> {
        let texts = NormalizedTexts::from_dataset(dataset, text_column)?;
        Ok(self.classify_texts(texts))
    }

    /// Classify an already-normalized text column
    pub fn classify_texts(&self, texts: NormalizedTexts) -> Classification {
        let subsets = self
            .categories
            .iter()
            .map(|(category, matcher)| {
                let rows: Vec<usize> = (0..texts.len())
                    .filter(|&i| matcher.matches_opt(texts.get(i)))
                    .collect();

                debug!(
                    category = %category.name(),
                    matched = rows.len(),
                    "Category classified"
                );

                LabeledSubset {
                    category: category.name().to_string(),
                    rows,
                }
            })
            .collect();

        info!(
            records = texts.len(),
            missing_text = texts.missing(),
            column = %texts.column(),
            "Classification complete"
        );

        Classification { texts, subsets }
    }
}
