use std::marker::PhantomData;

use chrono::{Duration, Utc};

use sea_orm::{
    sea_query::{Alias, Expr, Func, IntoCondition, SimpleExpr},
    prelude::DateTimeWithTimeZone,
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, Order, PaginatorTrait, PrimaryKeyTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::entities::Genres;
use crate::error::{AppError, Result};

/// Attach the entity name to a raw store error.
pub trait DbResultExt<T> {
    fn for_entity(self, entity: &'static str) -> Result<T>;
}

impl<T> DbResultExt<T> for std::result::Result<T, DbErr> {
    fn for_entity(self, entity: &'static str) -> Result<T> {
        self.map_err(|e| AppError::from_db(entity, e))
    }
}

/// Case-insensitive substring match that behaves the same on PostgreSQL and SQLite.
pub fn contains_ci<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column.as_column_ref())))
        .like(format!("%{}%", needle.trim().to_lowercase()))
}

/// Timestamp `days` days before now, for "recent"/"older than" windows.
pub fn days_ago(days: i64) -> DateTimeWithTimeZone {
    (Utc::now() - Duration::days(days)).into()
}

/// `SUM(column)` cast to BIGINT so it decodes as `i64` on every backend.
pub fn sum_i64<C: ColumnTrait>(column: C) -> SimpleExpr {
    Expr::col(column.as_column_ref())
        .sum()
        .cast_as(Alias::new("BIGINT"))
}

/// Trim, drop blanks and de-duplicate (case-insensitively) a genre list.
pub fn clean_genres(genres: Vec<String>) -> Genres {
    let mut cleaned: Vec<String> = Vec::with_capacity(genres.len());
    for genre in genres {
        let genre = genre.trim();
        if genre.is_empty() || cleaned.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
            continue;
        }
        cleaned.push(genre.to_string());
    }
    Genres(cleaned)
}

/// Same as [`clean_genres`] but an explicit update must leave at least one genre.
pub fn require_genres(genres: Vec<String>) -> Result<Genres> {
    let cleaned = clean_genres(genres);
    if cleaned.is_empty() {
        return Err(AppError::validation("genres", "at least one genre is required"));
    }
    Ok(cleaned)
}

/// Filter, ordering and window for a `find_*` call.
pub struct FindOptions<E: EntityTrait> {
    pub filter: Condition,
    pub order_by: Vec<(E::Column, Order)>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl<E: EntityTrait> Default for FindOptions<E> {
    fn default() -> Self {
        Self {
            filter: Condition::all(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }
}

impl<E: EntityTrait> FindOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, condition: impl IntoCondition) -> Self {
        self.filter = self.filter.add(condition.into_condition());
        self
    }

    pub fn order_asc(mut self, column: E::Column) -> Self {
        self.order_by.push((column, Order::Asc));
        self
    }

    pub fn order_desc(mut self, column: E::Column) -> Self {
        self.order_by.push((column, Order::Desc));
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    fn apply(self, mut select: Select<E>) -> Select<E> {
        select = select.filter(self.filter);
        for (column, order) in self.order_by {
            select = select.order_by(column, order);
        }
        if let Some(offset) = self.offset {
            select = select.offset(offset);
        }
        if let Some(limit) = self.limit {
            select = select.limit(limit);
        }
        select
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageRequest {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page.max(1) - 1) * self.limit.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        let limit = request.limit.max(1);
        let page = request.page.max(1);
        let total_pages = total.div_ceil(limit);

        Self {
            data,
            total,
            page,
            limit,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// Generic CRUD over a UUID-keyed entity. Per-entity repositories wrap one of these
/// and add their own finders.
pub struct BaseRepository<E: EntityTrait> {
    db: DatabaseConnection,
    entity: &'static str,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Clone for BaseRepository<E> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            entity: self.entity,
            _entity: PhantomData,
        }
    }
}

impl<E> BaseRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + Sync,
    E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send,
    <E::PrimaryKey as PrimaryKeyTrait>::ValueType: From<Uuid>,
{
    pub fn new(db: DatabaseConnection, entity: &'static str) -> Self {
        Self {
            db,
            entity,
            _entity: PhantomData,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub async fn create(&self, model: E::ActiveModel) -> Result<E::Model> {
        tracing::debug!("Creating {}", self.entity);
        model.insert(&self.db).await.for_entity(self.entity)
    }

    /// Insert every row in one statement and return how many were written.
    pub async fn create_many(&self, models: Vec<E::ActiveModel>) -> Result<u64> {
        if models.is_empty() {
            return Ok(0);
        }
        let count = models.len() as u64;
        tracing::debug!("Creating {} {} rows", count, self.entity);

        E::insert_many(models)
            .exec_without_returning(&self.db)
            .await
            .for_entity(self.entity)?;

        Ok(count)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<E::Model>> {
        E::find_by_id(id).one(&self.db).await.for_entity(self.entity)
    }

    /// Like [`find_by_id`](Self::find_by_id) but a missing row is an error.
    pub async fn get(&self, id: Uuid) -> Result<E::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(self.entity, id))
    }

    pub async fn find_first(&self, options: FindOptions<E>) -> Result<Option<E::Model>> {
        options
            .apply(E::find())
            .one(&self.db)
            .await
            .for_entity(self.entity)
    }

    pub async fn find_many(&self, options: FindOptions<E>) -> Result<Vec<E::Model>> {
        options
            .apply(E::find())
            .all(&self.db)
            .await
            .for_entity(self.entity)
    }

    pub async fn find_many_paginated(
        &self,
        options: FindOptions<E>,
        request: PageRequest,
    ) -> Result<Paginated<E::Model>> {
        let request = PageRequest::new(request.page, request.limit);
        let filter = options.filter.clone();
        let options = options.offset(request.offset()).limit(request.limit);

        let (data, total) = tokio::try_join!(
            self.find_many(options),
            self.count(filter),
        )?;

        Ok(Paginated::new(data, total, request))
    }

    pub async fn count(&self, filter: Condition) -> Result<u64> {
        E::find()
            .filter(filter)
            .count(&self.db)
            .await
            .for_entity(self.entity)
    }

    pub async fn exists(&self, filter: Condition) -> Result<bool> {
        Ok(self.count(filter).await? > 0)
    }

    pub async fn update(&self, model: E::ActiveModel) -> Result<E::Model> {
        tracing::debug!("Updating {}", self.entity);
        model.update(&self.db).await.for_entity(self.entity)
    }

    pub async fn update_many(&self, filter: Condition, changes: E::ActiveModel) -> Result<u64> {
        let result = E::update_many()
            .set(changes)
            .filter(filter)
            .exec(&self.db)
            .await
            .for_entity(self.entity)?;
        Ok(result.rows_affected)
    }

    /// Delete by id and hand back the removed row.
    pub async fn delete(&self, id: Uuid) -> Result<E::Model> {
        let model = self.get(id).await?;
        tracing::debug!("Deleting {} {}", self.entity, id);

        let result = E::delete_by_id(id)
            .exec(&self.db)
            .await
            .for_entity(self.entity)?;
        if result.rows_affected == 0 {
            return Err(AppError::not_found(self.entity, id));
        }

        Ok(model)
    }

    pub async fn delete_many(&self, filter: Condition) -> Result<u64> {
        let result = E::delete_many()
            .filter(filter)
            .exec(&self.db)
            .await
            .for_entity(self.entity)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginated_math() {
        let page: Paginated<u32> = Paginated::new(vec![0; 5], 25, PageRequest::new(3, 10));
        assert_eq!(page.total_pages, 3);
        assert!(!page.has_next);
        assert!(page.has_prev);

        let first: Paginated<u32> = Paginated::new(vec![0; 10], 25, PageRequest::default());
        assert!(first.has_next);
        assert!(!first.has_prev);
    }

    #[test]
    fn test_empty_result_has_no_pages() {
        let page: Paginated<u32> = Paginated::new(vec![], 0, PageRequest::default());
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }

    #[test]
    fn test_clean_genres() {
        let genres = clean_genres(vec![" Rock ".into(), "rock".into(), "".into(), "Jazz".into()]);
        assert_eq!(genres.0, vec!["Rock".to_string(), "Jazz".to_string()]);
        assert!(require_genres(vec!["  ".into()]).is_err());
    }

    #[test]
    fn test_page_request_clamps() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request, PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }
}
