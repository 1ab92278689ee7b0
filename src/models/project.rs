// src/models/project.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::{
    common::query::{FromParams, ListParams, ListQuery, SortKey},
    models::worker::Worker,
};

// A ordem das variantes segue a do enum no banco (usada na ordenação).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Completed,
    OnHold,
    Cancelled,
}

impl std::str::FromStr for ProjectStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(ProjectStatus::Active),
            "completed" => Ok(ProjectStatus::Completed),
            "on_hold" => Ok(ProjectStatus::OnHold),
            "cancelled" => Ok(ProjectStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(ignore)]
    pub user_id: i64,
    #[schema(example = "Ponte Norte")]
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub start_date: NaiveDate,
    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,
    #[schema(example = 46.77)]
    pub latitude: f64,
    #[schema(example = 23.59)]
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Projeto com os trabalhadores alocados.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub workers: Vec<Worker>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_project_dates"))]
pub struct ProjectPayload {
    #[validate(length(min = 2, max = 100, message = "O nome deve ter entre 2 e 100 caracteres."))]
    #[schema(example = "Ponte Norte")]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "A descrição deve ter no máximo 500 caracteres."))]
    pub description: String,

    #[serde(default)]
    pub status: ProjectStatus,

    #[schema(value_type = String, format = Date, example = "2025-03-01")]
    pub start_date: NaiveDate,

    #[schema(value_type = Option<String>, format = Date)]
    pub end_date: Option<NaiveDate>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude fora do intervalo."))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude fora do intervalo."))]
    pub longitude: f64,
}

fn validate_project_dates(payload: &ProjectPayload) -> Result<(), ValidationError> {
    match payload.end_date {
        Some(end) if end < payload.start_date => {
            let mut err = ValidationError::new("date_range");
            err.message = Some("A data de término não pode ser anterior à de início.".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

// --- Listagem ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub search: Option<String>,
    pub name: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date_from: Option<NaiveDate>,
    pub start_date_to: Option<NaiveDate>,
}

impl FromParams for ProjectFilter {
    fn from_params(params: &ListParams) -> Self {
        Self {
            search: params.text("search"),
            name: params.text("name"),
            status: params.parse("status"),
            start_date_from: params.parse("start_date_from"),
            start_date_to: params.parse("start_date_to"),
        }
    }
}

// Equivalente em memória do WHERE montado pelo repositório
#[cfg(test)]
impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        use crate::common::query::contains_ci;

        self.search.as_deref().is_none_or(|term| {
            contains_ci(&project.name, term) || contains_ci(&project.description, term)
        }) && self.name.as_deref().is_none_or(|n| contains_ci(&project.name, n))
            && self.status.is_none_or(|s| project.status == s)
            && self.start_date_from.is_none_or(|from| project.start_date >= from)
            && self.start_date_to.is_none_or(|to| project.start_date <= to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectSort {
    Id,
    Name,
    Status,
    StartDate,
    EndDate,
    CreatedAt,
}

impl SortKey for ProjectSort {
    const DEFAULT: Self = ProjectSort::Id;

    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(ProjectSort::Id),
            "name" => Some(ProjectSort::Name),
            "status" => Some(ProjectSort::Status),
            "start_date" => Some(ProjectSort::StartDate),
            "end_date" => Some(ProjectSort::EndDate),
            "created_at" => Some(ProjectSort::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            ProjectSort::Id => "id",
            ProjectSort::Name => "name",
            ProjectSort::Status => "status",
            ProjectSort::StartDate => "start_date",
            ProjectSort::EndDate => "end_date",
            ProjectSort::CreatedAt => "created_at",
        }
    }
}

#[cfg(test)]
impl ProjectSort {
    /// Ordem ascendente. `end_date` nulo fica por último, como no Postgres.
    pub fn compare(self, a: &Project, b: &Project) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        match self {
            ProjectSort::Id => a.id.cmp(&b.id),
            ProjectSort::Name => a.name.cmp(&b.name),
            ProjectSort::Status => a.status.cmp(&b.status),
            ProjectSort::StartDate => a.start_date.cmp(&b.start_date),
            ProjectSort::EndDate => match (a.end_date, b.end_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            ProjectSort::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

pub type ProjectQuery = ListQuery<ProjectFilter, ProjectSort>;
