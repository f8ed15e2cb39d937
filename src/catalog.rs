use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use thiserror::Error;

static PASSAGE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/passages");

/// A group of passages sharing a script
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Default,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    #[default]
    Chinese,
    English,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Chinese, Category::English];

    /// Human readable label for menus
    pub fn label(&self) -> &'static str {
        match self {
            Category::Chinese => "Chinese classics",
            Category::English => "English classics",
        }
    }
}

/// A fixed text plus its attribution
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Passage {
    pub text: String,
    pub source: String,
}

impl Passage {
    /// Length in characters, which is what speed and progress are measured in
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[derive(Debug, Deserialize)]
struct PassageFile {
    category: Category,
    passages: Vec<Passage>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("passage file {0} not found")]
    MissingFile(String),
    #[error("passage file {0} is not valid utf-8")]
    NotUtf8(String),
    #[error("unable to parse passage file {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("passage file {file} declares category {found}, expected {expected}")]
    CategoryMismatch {
        file: String,
        expected: Category,
        found: Category,
    },
    #[error("category {0} has no passages")]
    EmptyCategory(Category),
    #[error("passage {index} in category {category} has empty text")]
    EmptyPassage { category: Category, index: usize },
}

/// Read-only, ordered passages grouped by category
#[derive(Debug, Clone)]
pub struct Catalog {
    chinese: Vec<Passage>,
    english: Vec<Passage>,
}

impl Catalog {
    /// Load the passages bundled into the binary
    pub fn load() -> Result<Self, CatalogError> {
        Ok(Self {
            chinese: read_category(Category::Chinese)?,
            english: read_category(Category::English)?,
        })
    }

    /// Build a catalog from explicit passages, validating the same invariants as `load`
    pub fn from_passages(
        chinese: Vec<Passage>,
        english: Vec<Passage>,
    ) -> Result<Self, CatalogError> {
        validate(Category::Chinese, &chinese)?;
        validate(Category::English, &english)?;
        Ok(Self { chinese, english })
    }

    pub fn list_categories(&self) -> &'static [Category] {
        &Category::ALL
    }

    pub fn passages(&self, category: Category) -> &[Passage] {
        match category {
            Category::Chinese => &self.chinese,
            Category::English => &self.english,
        }
    }

    pub fn passage(&self, category: Category, index: usize) -> Option<&Passage> {
        self.passages(category).get(index)
    }

    pub fn len(&self, category: Category) -> usize {
        self.passages(category).len()
    }

    pub fn is_last(&self, category: Category, index: usize) -> bool {
        index + 1 >= self.len(category)
    }
}

fn read_category(category: Category) -> Result<Vec<Passage>, CatalogError> {
    let file_name = format!("{category}.json");
    let file = PASSAGE_DIR
        .get_file(&file_name)
        .ok_or_else(|| CatalogError::MissingFile(file_name.clone()))?;
    let contents = file
        .contents_utf8()
        .ok_or_else(|| CatalogError::NotUtf8(file_name.clone()))?;

    let parsed = parse_passage_file(&file_name, contents)?;
    if parsed.category != category {
        return Err(CatalogError::CategoryMismatch {
            file: file_name,
            expected: category,
            found: parsed.category,
        });
    }

    validate(category, &parsed.passages)?;
    Ok(parsed.passages)
}

fn parse_passage_file(file_name: &str, contents: &str) -> Result<PassageFile, CatalogError> {
    serde_json::from_str(contents).map_err(|source| CatalogError::Parse {
        file: file_name.to_string(),
        source,
    })
}

fn validate(category: Category, passages: &[Passage]) -> Result<(), CatalogError> {
    if passages.is_empty() {
        return Err(CatalogError::EmptyCategory(category));
    }
    if let Some(index) = passages.iter().position(|p| p.text.is_empty()) {
        return Err(CatalogError::EmptyPassage { category, index });
    }
    Ok(())
}
