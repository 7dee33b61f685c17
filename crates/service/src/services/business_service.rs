use common::pagination::Pagination;
use sea_orm::{ConnectionTrait, EntityTrait, QueryOrder};
use uuid::Uuid;

use models::business;

use crate::errors::ServiceError;
use crate::services::{fetch_page, Page};

/// Get business by id.
pub async fn get_business<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<business::Model, ServiceError> {
    business::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("business"))
}

/// Resolve the public widget slug.
pub async fn get_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> Result<business::Model, ServiceError> {
    business::find_by_slug(db, slug)
        .await?
        .ok_or_else(|| ServiceError::not_found("business"))
}

/// List businesses, newest first.
pub async fn list_businesses<C: ConnectionTrait>(db: &C, opts: Pagination) -> Result<Page<business::Model>, ServiceError> {
    fetch_page(db, business::Entity::find().order_by_desc(business::Column::CreatedAt), opts).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[tokio::test]
    async fn slug_lookup_and_listing() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let b = business::create(&db, "Polar Bear HVAC", None).await?;
        assert_eq!(get_by_slug(&db, "polar-bear-hvac").await?.id, b.id);
        assert!(matches!(get_by_slug(&db, "nope").await, Err(ServiceError::NotFound(_))));
        assert_eq!(get_business(&db, b.id).await?.name, "Polar Bear HVAC");
        let page = list_businesses(&db, Pagination { page: 1, per_page: 10 }).await?;
        assert_eq!(page.page_info.total, 1);
        Ok(())
    }
}
