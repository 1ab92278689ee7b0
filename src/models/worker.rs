// src/models/worker.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::common::query::{FromParams, ListParams, ListQuery, SortKey};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Worker {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(ignore)] // Vem do token, nunca do corpo da requisição
    pub user_id: i64,
    #[schema(example = "Ana")]
    pub name: String,
    #[schema(example = "Engineer")]
    pub position: String,
    #[schema(example = 30)]
    pub age: i32,
    #[schema(example = 5000)]
    pub salary: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Dados de criação/atualização. O dono (user_id) nunca vem do cliente.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct WorkerPayload {
    #[validate(length(min = 2, max = 50, message = "O nome deve ter entre 2 e 50 caracteres."))]
    #[schema(example = "Ana")]
    pub name: String,

    #[validate(length(min = 2, max = 50, message = "O cargo deve ter entre 2 e 50 caracteres."))]
    #[schema(example = "Engineer")]
    pub position: String,

    #[validate(range(min = 18, max = 100, message = "A idade deve estar entre 18 e 100."))]
    #[schema(example = 30)]
    pub age: i32,

    #[validate(range(min = 0, message = "O salário não pode ser negativo."))]
    #[schema(example = 5000)]
    pub salary: i64,
}

// --- Listagem ---

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerFilter {
    pub search: Option<String>,
    pub position: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
}

impl FromParams for WorkerFilter {
    fn from_params(params: &ListParams) -> Self {
        Self {
            search: params.text("search"),
            position: params.text("position"),
            min_age: params.parse("min_age"),
            max_age: params.parse("max_age"),
            min_salary: params.parse("min_salary"),
            max_salary: params.parse("max_salary"),
        }
    }
}

#[cfg(test)]
impl WorkerFilter {
    pub fn matches(&self, worker: &Worker) -> bool {
        use crate::common::query::contains_ci;

        self.search.as_deref().is_none_or(|term| {
            contains_ci(&worker.name, term) || contains_ci(&worker.position, term)
        }) && self
            .position
            .as_deref()
            .is_none_or(|p| contains_ci(&worker.position, p))
            && self.min_age.is_none_or(|min| worker.age >= min)
            && self.max_age.is_none_or(|max| worker.age <= max)
            && self.min_salary.is_none_or(|min| worker.salary >= min)
            && self.max_salary.is_none_or(|max| worker.salary <= max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSort {
    Id,
    Name,
    Position,
    Age,
    Salary,
    CreatedAt,
}

impl SortKey for WorkerSort {
    const DEFAULT: Self = WorkerSort::Id;

    fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(WorkerSort::Id),
            "name" => Some(WorkerSort::Name),
            "position" => Some(WorkerSort::Position),
            "age" => Some(WorkerSort::Age),
            "salary" => Some(WorkerSort::Salary),
            "created_at" => Some(WorkerSort::CreatedAt),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            WorkerSort::Id => "id",
            WorkerSort::Name => "name",
            WorkerSort::Position => "position",
            WorkerSort::Age => "age",
            WorkerSort::Salary => "salary",
            WorkerSort::CreatedAt => "created_at",
        }
    }
}

#[cfg(test)]
impl WorkerSort {
    pub fn compare(self, a: &Worker, b: &Worker) -> std::cmp::Ordering {
        match self {
            WorkerSort::Id => a.id.cmp(&b.id),
            WorkerSort::Name => a.name.cmp(&b.name),
            WorkerSort::Position => a.position.cmp(&b.position),
            WorkerSort::Age => a.age.cmp(&b.age),
            WorkerSort::Salary => a.salary.cmp(&b.salary),
            WorkerSort::CreatedAt => a.created_at.cmp(&b.created_at),
        }
    }
}

pub type WorkerQuery = ListQuery<WorkerFilter, WorkerSort>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_ignores_unknown_keys_and_malformed_bounds() {
        let params = ListParams::new()
            .with("search", "  ana ")
            .with("min_age", "x")
            .with("max_salary", "9000")
            .with("favourite_colour", "blue");
        let filter = WorkerFilter::from_params(&params);

        assert_eq!(
            filter,
            WorkerFilter {
                search: Some("ana".into()),
                max_salary: Some(9000),
                ..Default::default()
            }
        );
    }

    #[test]
    fn payload_bounds() {
        let ok = WorkerPayload {
            name: "Ana".into(),
            position: "Engineer".into(),
            age: 30,
            salary: 5000,
        };
        assert!(ok.validate().is_ok());

        let bad = WorkerPayload { age: 12, salary: -1, ..ok };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("age"));
        assert!(fields.contains_key("salary"));
    }
}
