// src/common/query.rs
//
// Montagem das consultas de listagem: filtros tipados, ordenação com
// allow-list e paginação limitada. Os repositórios só recebem um `ListQuery`
// já normalizado; nada vindo do cliente vira SQL sem passar por aqui.

use std::{collections::HashMap, fmt::Debug, str::FromStr};

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use utoipa::ToSchema;

use crate::middleware::tenancy::TenantContext;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

// =========================================================================
//  PARÂMETROS BRUTOS
// =========================================================================

/// Parâmetros de query string ainda sem tipo. Chaves desconhecidas são ignoradas.
#[derive(Debug, Clone, Default)]
pub struct ListParams(HashMap<String, String>);

impl From<HashMap<String, String>> for ListParams {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.0.insert(key.to_string(), value.to_string());
        self
    }

    /// Texto não vazio (com trim).
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Valor tipado; se não fizer parse, é descartado (sem limite) em vez de virar erro.
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.text(key).and_then(|v| v.parse::<T>().ok())
    }

    pub fn page(&self) -> PageRequest {
        PageRequest::new(self.parse::<i64>("page"), self.parse::<i64>("page_size"))
    }

    pub fn sorting<S: SortKey>(&self) -> Sorting<S> {
        Sorting::parse(
            self.text("sort_by").as_deref(),
            self.text("sort_order").as_deref(),
        )
    }
}

/// Filtros tipados por recurso, construídos uma única vez na borda.
pub trait FromParams: Sized {
    fn from_params(params: &ListParams) -> Self;
}

// =========================================================================
//  PAGINAÇÃO
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Ausente → padrão; abaixo de 1 → 1; `page_size` acima do teto → teto.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.map_or(DEFAULT_PAGE, |p| p.clamp(1, u32::MAX as i64) as u32);
        let page_size = page_size.map_or(DEFAULT_PAGE_SIZE, |s| {
            s.clamp(1, MAX_PAGE_SIZE as i64) as u32
        });
        Self { page, page_size }
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Fatia de um conjunto já filtrado e ordenado.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        let start = (self.offset() as usize).min(items.len());
        let end = start.saturating_add(self.page_size as usize).min(items.len());
        items[start..end].to_vec()
    }
}

/// Resposta paginada: `{ data, total, page, pageSize }`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, page: PageRequest) -> Self {
        Self {
            data,
            total,
            page: page.page,
            page_size: page.page_size,
        }
    }
}

// =========================================================================
//  ORDENAÇÃO
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Colunas ordenáveis de um recurso. `column` só devolve literais fixos.
pub trait SortKey: Copy + Eq + Debug + Send + Sync + 'static {
    const DEFAULT: Self;

    fn parse(name: &str) -> Option<Self>;

    fn column(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sorting<S> {
    pub key: S,
    pub order: SortOrder,
}

impl<S: SortKey> Default for Sorting<S> {
    fn default() -> Self {
        Self {
            key: S::DEFAULT,
            order: SortOrder::Asc,
        }
    }
}

impl<S: SortKey> Sorting<S> {
    /// Campo fora da allow-list (ou ausente) cai na chave padrão, ascendente.
    pub fn parse(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        match sort_by.and_then(S::parse) {
            Some(key) => Self {
                key,
                order: sort_order.and_then(SortOrder::parse).unwrap_or_default(),
            },
            None => Self::default(),
        }
    }

    pub fn new(key: S, order: SortOrder) -> Self {
        Self { key, order }
    }
}

// =========================================================================
//  CONSULTA COMPLETA
// =========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F, S> {
    pub filter: F,
    pub sorting: Sorting<S>,
    pub page: PageRequest,
}

impl<F: Default, S: SortKey> Default for ListQuery<F, S> {
    fn default() -> Self {
        Self {
            filter: F::default(),
            sorting: Sorting::default(),
            page: PageRequest::default(),
        }
    }
}

impl<F: FromParams, S: SortKey> ListQuery<F, S> {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            filter: F::from_params(params),
            sorting: params.sorting(),
            page: params.page(),
        }
    }
}

impl<F, S> ListQuery<F, S> {
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = page;
        self
    }

    pub fn with_sorting(mut self, sorting: Sorting<S>) -> Self {
        self.sorting = sorting;
        self
    }
}

// =========================================================================
//  HELPERS SQL
// =========================================================================

/// `%termo%` com os curingas do LIKE escapados.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Inicia o WHERE com o predicado de tenant. Toda consulta escopada passa por aqui.
pub fn push_tenant_scope(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, tenant: TenantContext) {
    qb.push(format!(" WHERE {alias}.user_id = "));
    qb.push_bind(tenant.0);
}

/// `AND (c1 ILIKE $n OR c2 ILIKE $n ...)`.
pub fn push_search(qb: &mut QueryBuilder<'_, Postgres>, columns: &[&'static str], term: &str) {
    let pattern = like_pattern(term);
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(format!("{column} ILIKE "));
        qb.push_bind(pattern.clone());
    }
    qb.push(")");
}

/// ORDER BY com desempate por id, LIMIT e OFFSET.
pub fn push_order_and_page<S: SortKey>(
    qb: &mut QueryBuilder<'_, Postgres>,
    alias: &str,
    sorting: &Sorting<S>,
    page: &PageRequest,
) {
    let column = sorting.key.column();
    qb.push(format!(" ORDER BY {alias}.{column} {}", sorting.order.as_sql()));
    if column != "id" {
        qb.push(format!(", {alias}.id ASC"));
    }
    qb.push(" LIMIT ");
    qb.push_bind(page.limit());
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());
}

/// Comparação parcial sem diferenciar maiúsculas (equivalente em memória ao ILIKE).
#[cfg(test)]
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum TestSort {
        Id,
        Name,
    }

    impl SortKey for TestSort {
        const DEFAULT: Self = TestSort::Id;

        fn parse(name: &str) -> Option<Self> {
            match name {
                "id" => Some(TestSort::Id),
                "name" => Some(TestSort::Name),
                _ => None,
            }
        }

        fn column(self) -> &'static str {
            match self {
                TestSort::Id => "id",
                TestSort::Name => "name",
            }
        }
    }

    #[test]
    fn page_defaults_and_clamping() {
        assert_eq!(PageRequest::new(None, None), PageRequest { page: 1, page_size: 10 });
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, page_size: 1 });
        assert_eq!(PageRequest::new(Some(-3), Some(-1)), PageRequest { page: 1, page_size: 1 });
        assert_eq!(PageRequest::new(Some(4), Some(10_000)).page_size, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let params = ListParams::new()
            .with("page", "abc")
            .with("page_size", "1.5")
            .with("min_age", "old");
        assert_eq!(params.page(), PageRequest::default());
        assert_eq!(params.parse::<i32>("min_age"), None);
    }

    #[test]
    fn sort_outside_allow_list_falls_back_to_id_asc() {
        let s: Sorting<TestSort> = Sorting::parse(Some("password_hash"), Some("desc"));
        assert_eq!(s, Sorting::new(TestSort::Id, SortOrder::Asc));

        let s: Sorting<TestSort> = Sorting::parse(Some("name"), Some("DESC"));
        assert_eq!(s, Sorting::new(TestSort::Name, SortOrder::Desc));

        let s: Sorting<TestSort> = Sorting::parse(Some("name"), Some("sideways"));
        assert_eq!(s.order, SortOrder::Asc);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ana"), "%ana%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn rendered_sql_binds_every_user_value() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT w.* FROM workers w");
        push_tenant_scope(&mut qb, "w", TenantContext(7));
        push_search(&mut qb, &["w.name", "w.position"], "'; DROP TABLE workers; --");
        push_order_and_page(
            &mut qb,
            "w",
            &Sorting::new(TestSort::Name, SortOrder::Desc),
            &PageRequest::new(Some(2), Some(5)),
        );

        let sql = qb.sql();
        assert_eq!(
            sql,
            "SELECT w.* FROM workers w WHERE w.user_id = $1 AND (w.name ILIKE $2 OR w.position ILIKE $3) \
             ORDER BY w.name DESC, w.id ASC LIMIT $4 OFFSET $5"
        );
        assert!(!sql.contains("DROP"));
    }

    #[test]
    fn slice_is_bounded() {
        let items: Vec<i32> = (1..=7).collect();
        assert_eq!(PageRequest::new(Some(2), Some(3)).slice(&items), vec![4, 5, 6]);
        assert_eq!(PageRequest::new(Some(3), Some(3)).slice(&items), vec![7]);
        assert!(PageRequest::new(Some(9), Some(3)).slice(&items).is_empty());
    }
}
