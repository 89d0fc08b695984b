use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{3,4})\b").unwrap());

pub type PersonId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: PersonId,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub death_date: Option<String>,
    #[serde(default)]
    pub sex: Sex,
}

impl Person {
    pub fn new(id: &str, given_name: &str, surname: &str) -> Self {
        Self {
            id: id.to_string(),
            given_name: given_name.to_string(),
            surname: surname.to_string(),
            birth_date: None,
            death_date: None,
            sex: Sex::Unknown,
        }
    }

    pub fn born(mut self, date: &str) -> Self {
        self.birth_date = Some(date.to_string());
        self
    }

    pub fn died(mut self, date: &str) -> Self {
        self.death_date = Some(date.to_string());
        self
    }

    pub fn with_sex(mut self, sex: Sex) -> Self {
        self.sex = sex;
        self
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.birth_date.as_deref().and_then(year_of)
    }

    pub fn death_year(&self) -> Option<i32> {
        self.death_date.as_deref().and_then(year_of)
    }

    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.given_name.trim(), self.surname.trim());
        let name = name.trim();
        if name.is_empty() {
            self.id.clone()
        } else {
            name.to_string()
        }
    }
}

/// Extracts the first plausible year from a free-form genealogical date
/// ("1950", "1950-03-12", "abt. 1890", "12 MAR 1901").
pub fn year_of(date: &str) -> Option<i32> {
    YEAR_RE
        .captures(date)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Sort key shared by every ordering decision in the pipeline: birth year
/// (unknown last), then display name, then id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub birth_year: i32,
    pub name: String,
    pub id: PersonId,
}

impl OrderKey {
    pub fn of(person: &Person) -> Self {
        Self {
            birth_year: person.birth_year().unwrap_or(i32::MAX),
            name: person.display_name(),
            id: person.id.clone(),
        }
    }

    /// Ascending year, then ascending name.
    pub fn cmp_name_asc(&self, other: &Self) -> Ordering {
        self.birth_year
            .cmp(&other.birth_year)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Ascending year, then descending name. Used for divorced pairs.
    pub fn cmp_name_desc(&self, other: &Self) -> Ordering {
        self.birth_year
            .cmp(&other.birth_year)
            .then_with(|| other.name.cmp(&self.name))
            .then_with(|| other.id.cmp(&self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelationshipEdge {
    Parent { parent: PersonId, child: PersonId },
    Spouse { a: PersonId, b: PersonId },
    Divorced { a: PersonId, b: PersonId },
    Unmarried { a: PersonId, b: PersonId },
}

impl RelationshipEdge {
    pub fn parent(parent: &str, child: &str) -> Self {
        Self::Parent {
            parent: parent.to_string(),
            child: child.to_string(),
        }
    }

    pub fn spouse(a: &str, b: &str) -> Self {
        Self::Spouse {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn divorced(a: &str, b: &str) -> Self {
        Self::Divorced {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn unmarried(a: &str, b: &str) -> Self {
        Self::Unmarried {
            a: a.to_string(),
            b: b.to_string(),
        }
    }

    pub fn endpoints(&self) -> (&str, &str) {
        match self {
            Self::Parent { parent, child } => (parent, child),
            Self::Spouse { a, b } | Self::Divorced { a, b } | Self::Unmarried { a, b } => (a, b),
        }
    }
}

/// Document accepted by the CLI and the wasm wrapper.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartInput {
    #[serde(default)]
    pub people: Vec<Person>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEdge>,
    #[serde(default)]
    pub focus: Option<PersonId>,
    #[serde(default)]
    pub max_depth: Option<u32>,
}

impl ChartInput {
    /// Explicit focus, or the first person when none is given.
    pub fn focus_id(&self) -> Option<&str> {
        self.focus
            .as_deref()
            .or_else(|| self.people.first().map(|p| p.id.as_str()))
    }
}
