//! Skill Tagger: keyword-category scoring against a fixed taxonomy.
//!
//! Each keyword carries its own `MatchRule`. Most keywords are plain substring
//! tests against the lower-cased text; very short tokens that occur inside
//! unrelated words ("c", "go") use a coarse word-boundary rule instead.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-category scores are capped at this value.
pub const MAX_CATEGORY_SCORE: u8 = 5;

/// Category name → score in `0..=MAX_CATEGORY_SCORE`.
pub type SkillScores = BTreeMap<String, u8>;

#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse taxonomy file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid taxonomy: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Keyword occurs anywhere in the text.
    #[default]
    Substring,
    /// Keyword occurs surrounded by spaces (`" c "`) or directly followed by a comma (`"c,"`).
    WordBoundary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "KeywordSpec")]
pub struct Keyword {
    pub term: String,
    pub rule: MatchRule,
}

/// On-disk keyword form: either a bare string or `{ "term": ..., "rule": ... }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum KeywordSpec {
    Plain(String),
    Detailed {
        term: String,
        #[serde(default)]
        rule: MatchRule,
    },
}

impl From<KeywordSpec> for Keyword {
    fn from(spec: KeywordSpec) -> Self {
        match spec {
            KeywordSpec::Plain(term) => Keyword::substring(&term),
            KeywordSpec::Detailed { term, rule } => Keyword {
                term: term.to_lowercase(),
                rule,
            },
        }
    }
}

impl Keyword {
    pub fn substring(term: &str) -> Self {
        Self {
            term: term.to_lowercase(),
            rule: MatchRule::Substring,
        }
    }

    pub fn word_boundary(term: &str) -> Self {
        Self {
            term: term.to_lowercase(),
            rule: MatchRule::WordBoundary,
        }
    }

    /// `text` must already be lower-cased.
    pub fn matches(&self, text: &str) -> bool {
        match self.rule {
            MatchRule::Substring => text.contains(self.term.as_str()),
            MatchRule::WordBoundary => {
                text.contains(&format!(" {} ", self.term)) || text.contains(&format!("{},", self.term))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    pub keywords: Vec<Keyword>,
}

/// Immutable category → keyword mapping, built once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillTaxonomy {
    pub categories: Vec<SkillCategory>,
}

impl SkillTaxonomy {
    /// Loads a taxonomy from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, TaxonomyError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, TaxonomyError> {
        let taxonomy: SkillTaxonomy = serde_json::from_str(raw)?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    fn validate(&self) -> Result<(), TaxonomyError> {
        if self.categories.is_empty() {
            return Err(TaxonomyError::Invalid("no categories defined".to_string()));
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(TaxonomyError::Invalid("category with empty name".to_string()));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(TaxonomyError::Invalid(format!(
                    "duplicate category '{}'",
                    category.name
                )));
            }
            if category.keywords.iter().any(|k| k.term.is_empty()) {
                return Err(TaxonomyError::Invalid(format!(
                    "category '{}' contains an empty keyword",
                    category.name
                )));
            }
        }
        Ok(())
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Scores `text` against every category. Each keyword listing that matches
    /// counts once regardless of how often it appears; scores cap at 5.
    pub fn score(&self, text: &str) -> SkillScores {
        let lowered = text.to_lowercase();

        self.categories
            .iter()
            .map(|category| {
                let found = category
                    .keywords
                    .iter()
                    .filter(|keyword| keyword.matches(&lowered))
                    .count();
                let score = found.min(MAX_CATEGORY_SCORE as usize) as u8;
                (category.name.clone(), score)
            })
            .collect()
    }

    /// The six-category taxonomy the desktop client's charts are labelled with.
    pub fn builtin() -> Self {
        let categories = BUILTIN_CATEGORIES
            .iter()
            .map(|(name, terms)| SkillCategory {
                name: name.to_string(),
                keywords: terms
                    .iter()
                    .map(|term| {
                        if WORD_BOUNDARY_TERMS.contains(term) {
                            Keyword::word_boundary(term)
                        } else {
                            Keyword::substring(term)
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { categories }
    }
}

impl Default for SkillTaxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

const WORD_BOUNDARY_TERMS: &[&str] = &["c", "go"];

const BUILTIN_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Backend",
        &[
            "python", "java", "c#", ".net", "php", "go", "golang", "ruby", "nodejs", "node.js",
            "express", "django", "flask", "fastapi", "spring", "spring boot", "laravel", "asp.net",
            "rest", "graphql", "microservices", "soap", "redis", "rabbitmq", "kafka", "algorithm",
            "oop", "design patterns", "solid", "mvc", "entity framework", "hibernate",
        ],
    ),
    (
        "Frontend",
        &[
            "html", "html5", "css", "css3", "javascript", "js", "typescript", "ts", "react",
            "react.js", "angular", "vue", "vue.js", "next.js", "nuxt.js", "jquery", "bootstrap",
            "tailwind", "sass", "less", "redux", "webpack", "babel", "responsive", "ui/ux", "figma",
            "adobe xd", "material ui", "ajax", "json", "dom",
        ],
    ),
    (
        "Veri & AI",
        &[
            "sql", "mysql", "postgresql", "mongodb", "nosql", "sqlite", "oracle", "t-sql", "pl/sql",
            "python", "pandas", "numpy", "scikit-learn", "matplotlib", "seaborn", "tensorflow",
            "pytorch", "keras", "opencv", "nlp", "llm", "generative ai", "data science", "big data",
            "hadoop", "spark", "power bi", "tableau", "excel", "data analysis", "etl", "yolo",
            "hugging face",
        ],
    ),
    (
        "DevOps & Cloud",
        &[
            "git", "github", "gitlab", "bitbucket", "docker", "kubernetes", "k8s", "jenkins",
            "ci/cd", "aws", "amazon web services", "azure", "google cloud", "gcp", "terraform",
            "ansible", "linux", "bash", "shell", "nginx", "apache", "ubuntu", "centos",
            "prometheus", "grafana", "jira", "agile", "scrum", "heroku", "digitalocean",
        ],
    ),
    (
        "Mobil",
        &[
            "flutter", "dart", "react native", "swift", "ios", "kotlin", "android", "java",
            "xamarin", "ionic", "objective-c", "mobile app", "firebase", "app store", "play store",
            "swiftui", "jetpack compose",
        ],
    ),
    (
        "Sistem & Güvenlik",
        &[
            "c", "c++", "cpp", "assembly", "embedded", "arduino", "raspberry pi", "stm32", "iot",
            "network", "tcp/ip", "http", "https", "dns", "cyber security", "siber güvenlik",
            "penetration testing", "owasp", "cryptography", "firewall", "wireshark", "kali linux",
            "ethical hacking", "metasploit", "işletim sistemleri", "mikroişlemci",
        ],
    ),
];
