use chrono::Utc;
use common::pagination::Pagination;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::customer;

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::services::{audit_service, fetch_page, non_empty, require, Page};

const DUPLICATE: &str = "customer with this email already exists";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    /// 按姓名或邮箱模糊匹配
    pub search: Option<String>,
}

/// Create a customer; (business, email) must be unique.
pub async fn create_customer<C: ConnectionTrait>(
    db: &C,
    ctx: &TenantContext,
    input: CustomerInput,
) -> Result<customer::Model, ServiceError> {
    let name = require(input.name, "name")?;
    let email = require(input.email, "email")?;
    if customer::find_by_email(db, ctx.business_id, &email).await?.is_some() {
        return Err(ServiceError::Conflict(DUPLICATE.into()));
    }
    let created = customer::create(
        db,
        ctx.business_id,
        customer::NewCustomer {
            name,
            email,
            phone: non_empty(input.phone),
            address: non_empty(input.address),
            notes: non_empty(input.notes),
        },
    )
    .await
    .map_err(|e| match ServiceError::from(e) {
        // 并发插入时由唯一索引兜底
        ServiceError::Conflict(_) => ServiceError::Conflict(DUPLICATE.into()),
        other => other,
    })?;
    info!(service = "customers", event = "customer_created", customer_id = %created.id, business_id = %ctx.business_id);
    audit_service::record(db, ctx, "create", "customer", Some(created.id), serde_json::json!({ "email": created.email })).await;
    Ok(created)
}

/// 组件预约：按邮箱查找，不存在则创建
pub async fn find_or_create<C: ConnectionTrait>(
    db: &C,
    ctx: &TenantContext,
    input: CustomerInput,
) -> Result<customer::Model, ServiceError> {
    let email = non_empty(input.email.clone()).ok_or_else(|| ServiceError::required("customer.email"))?;
    if let Some(existing) = customer::find_by_email(db, ctx.business_id, &email).await? {
        return Ok(existing);
    }
    if non_empty(input.name.clone()).is_none() {
        return Err(ServiceError::required("customer.name"));
    }
    create_customer(db, ctx, input).await
}

/// Get customer scoped to the business.
pub async fn get_customer<C: ConnectionTrait>(db: &C, business_id: Uuid, id: Uuid) -> Result<customer::Model, ServiceError> {
    customer::Entity::find_by_id(id)
        .filter(customer::Column::BusinessId.eq(business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("customer"))
}

/// List customers with optional search and pagination.
pub async fn list_customers<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    query: &CustomerQuery,
    opts: Pagination,
) -> Result<Page<customer::Model>, ServiceError> {
    let mut q = customer::Entity::find()
        .filter(customer::Column::BusinessId.eq(business_id))
        .order_by_asc(customer::Column::Name);
    if let Some(term) = non_empty(query.search.clone()) {
        q = q.filter(
            Condition::any()
                .add(customer::Column::Name.contains(&term))
                .add(customer::Column::Email.contains(&term.to_lowercase())),
        );
    }
    fetch_page(db, q, opts).await
}

/// Update provided fields only.
pub async fn update_customer<C: ConnectionTrait>(
    db: &C,
    ctx: &TenantContext,
    id: Uuid,
    input: CustomerInput,
) -> Result<customer::Model, ServiceError> {
    let current = get_customer(db, ctx.business_id, id).await?;
    let mut am: customer::ActiveModel = current.clone().into();
    if let Some(name) = input.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("name cannot be empty".into()));
        }
        am.name = Set(name);
    }
    if let Some(email) = input.email {
        let email = email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(ServiceError::Validation("email is invalid".into()));
        }
        if email != current.email {
            if customer::find_by_email(db, ctx.business_id, &email).await?.is_some() {
                return Err(ServiceError::Conflict(DUPLICATE.into()));
            }
            am.email = Set(email);
        }
    }
    if input.phone.is_some() {
        am.phone = Set(non_empty(input.phone));
    }
    if input.address.is_some() {
        am.address = Set(non_empty(input.address));
    }
    if input.notes.is_some() {
        am.notes = Set(non_empty(input.notes));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    audit_service::record(db, ctx, "update", "customer", Some(id), serde_json::json!({})).await;
    Ok(updated)
}

/// Delete customer (cascades to bookings and communications).
pub async fn delete_customer<C: ConnectionTrait>(db: &C, ctx: &TenantContext, id: Uuid) -> Result<(), ServiceError> {
    let current = get_customer(db, ctx.business_id, id).await?;
    customer::Entity::delete_by_id(current.id).exec(db).await?;
    audit_service::record(db, ctx, "delete", "customer", Some(id), serde_json::json!({ "email": current.email })).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    fn input(name: &str, email: &str) -> CustomerInput {
        CustomerInput { name: Some(name.into()), email: Some(email.into()), ..Default::default() }
    }

    #[tokio::test]
    async fn customer_crud_service() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let b = models::business::create(&db, "Cust Biz", None).await?;
        let ctx = TenantContext::new(b.id, "owner@biz.com");

        let c = create_customer(&db, &ctx, input("Ann", "ann@example.com")).await?;
        assert_eq!(get_customer(&db, b.id, c.id).await?.name, "Ann");

        let updated = update_customer(&db, &ctx, c.id, CustomerInput { phone: Some("555-0101".into()), ..Default::default() }).await?;
        assert_eq!(updated.phone.as_deref(), Some("555-0101"));
        assert_eq!(updated.name, "Ann");

        create_customer(&db, &ctx, input("Bob", "bob@example.com")).await?;
        let found = list_customers(&db, b.id, &CustomerQuery { search: Some("bob".into()) }, Pagination::default()).await?;
        assert_eq!(found.items.len(), 1);

        delete_customer(&db, &ctx, c.id).await?;
        assert!(matches!(get_customer(&db, b.id, c.id).await, Err(ServiceError::NotFound(_))));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let b = models::business::create(&db, "Dup Biz", None).await?;
        let ctx = TenantContext::new(b.id, "owner@biz.com");
        create_customer(&db, &ctx, input("Ann", "ann@example.com")).await?;
        let err = create_customer(&db, &ctx, input("Ann Again", "ANN@example.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let other = create_customer(&db, &ctx, input("Cy", "cy@example.com")).await?;
        let err = update_customer(&db, &ctx, other.id, CustomerInput { email: Some("ann@example.com".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn missing_fields_and_tenant_isolation() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let a = models::business::create(&db, "Iso A", None).await?;
        let b = models::business::create(&db, "Iso B", None).await?;
        let ctx = TenantContext::new(a.id, "owner@a.com");
        let err = create_customer(&db, &ctx, CustomerInput { email: Some("x@y.com".into()), ..Default::default() }).await.unwrap_err();
        assert_eq!(err.to_string(), "validation error: name is required");
        let c = create_customer(&db, &ctx, input("Ann", "ann@example.com")).await?;
        assert!(matches!(get_customer(&db, b.id, c.id).await, Err(ServiceError::NotFound(_))));

        let same = find_or_create(&db, &ctx, CustomerInput { email: Some("ann@example.com".into()), ..Default::default() }).await?;
        assert_eq!(same.id, c.id);
        Ok(())
    }
}
