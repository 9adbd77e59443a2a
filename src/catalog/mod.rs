//! Template catalog: the authored question bank and its validation.
//!
//! Templates are stored as JSON. Deserialization is strict about shapes
//! it knows (a recognized generator kind with bad parameters is a parse
//! error) and lenient about kinds it does not (they deserialize to the
//! `Unknown` variants and degrade at generation time).

use crate::engine::answers::AnswerLogic;
use crate::engine::generators::GeneratorKind;
use crate::engine::value::Value;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate template id '{0}'")]
    DuplicateId(String),
    #[error("template '{id}' answer references option {index}, but only {len} options exist")]
    OptionIndexOutOfRange { id: String, index: usize, len: usize },
}

/// How a question variable gets its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarSpec {
    Generated(GeneratorKind),
    Literal { value: Value },
}

/// One named variable declaration inside a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    #[serde(flatten)]
    pub spec: VarSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    pub const fn label(self) -> &'static str {
        match self {
            DifficultyLevel::Easy => "easy",
            DifficultyLevel::Medium => "medium",
            DifficultyLevel::Hard => "hard",
        }
    }
}

/// Pedagogical style of a question; drives quota selection and marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyType {
    #[serde(rename = "direct")]
    Direct,
    #[serde(rename = "aptitude")]
    Aptitude,
    #[serde(rename = "logical reasoning")]
    LogicalReasoning,
}

impl DifficultyType {
    pub const fn label(self) -> &'static str {
        match self {
            DifficultyType::Direct => "direct",
            DifficultyType::Aptitude => "aptitude",
            DifficultyType::LogicalReasoning => "logical reasoning",
        }
    }

    /// Direct questions are the short one-mark pool; the rest carry
    /// two marks in a quiz.
    pub const fn is_direct(self) -> bool {
        matches!(self, DifficultyType::Direct)
    }
}

/// Syllabus placement and difficulty labels for one template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub unit_name: String,
    pub topic_name: String,
    pub subtopic_name: String,
    pub difficulty_level: DifficultyLevel,
    pub difficulty_type: DifficultyType,
}

/// An authored question template, before any variables are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    pub id: String,
    #[serde(flatten)]
    pub classification: Classification,
    pub question: String,
    #[serde(default)]
    pub variables: Vec<VarDecl>,
    #[serde(default)]
    pub options: Vec<String>,
    pub answer: AnswerLogic,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// The loaded and validated question bank.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<QuestionTemplate>,
}

impl TemplateCatalog {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            templates = catalog.len(),
            "template catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, CatalogError> {
        let templates: Vec<QuestionTemplate> = serde_json::from_reader(reader)?;
        Self::new(templates)
    }

    pub fn new(templates: Vec<QuestionTemplate>) -> Result<Self, CatalogError> {
        validate(&templates)?;
        Ok(Self { templates })
    }

    pub fn templates(&self) -> &[QuestionTemplate] {
        &self.templates
    }

    /// Templates belonging to one syllabus unit.
    pub fn for_unit(&self, unit_name: &str) -> Vec<&QuestionTemplate> {
        self.templates
            .iter()
            .filter(|t| t.classification.unit_name == unit_name)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn validate(templates: &[QuestionTemplate]) -> Result<(), CatalogError> {
    let mut seen = std::collections::BTreeSet::new();
    let mut unknown_generators = 0usize;

    for template in templates {
        if !seen.insert(template.id.as_str()) {
            return Err(CatalogError::DuplicateId(template.id.clone()));
        }

        let needed = template.answer.min_template_options();
        if needed > 0 && template.options.len() < needed {
            return Err(CatalogError::OptionIndexOutOfRange {
                id: template.id.clone(),
                index: needed - 1,
                len: template.options.len(),
            });
        }

        for decl in &template.variables {
            if let VarSpec::Generated(kind) = &decl.spec {
                if kind.is_unknown() {
                    unknown_generators += 1;
                    warn!(
                        template = %template.id,
                        variable = %decl.name,
                        "unrecognized generator kind, variable will fault at generation"
                    );
                }
            }
        }
    }

    if unknown_generators > 0 {
        warn!(count = unknown_generators, "catalog contains unknown generator kinds");
    }
    Ok(())
}
