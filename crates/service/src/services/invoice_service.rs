use chrono::{NaiveDate, Utc};
use common::pagination::Pagination;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::invoice::{self, InvoiceStatus};
use models::schedule::parse_date;
use models::booking;

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::metrics::INVOICES_CREATED_TOTAL;
use crate::realtime::{ChangeAction, EventHub};
use crate::services::{audit_service, customer_service, fetch_page, non_empty, Page};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInput {
    pub customer_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub tax_amount: Option<f64>,
    pub due_date: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    pub status: Option<String>,
    pub amount: Option<f64>,
    pub tax_amount: Option<f64>,
    pub due_date: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
}

fn check_amount(v: f64, field: &str) -> Result<f64, ServiceError> {
    if !v.is_finite() || v < 0.0 {
        return Err(ServiceError::Validation(format!("{} must be a non-negative number", field)));
    }
    Ok(invoice::round_cents(v))
}

/// 插入草稿发票；预约自动开票与手工开票共用
pub(crate) async fn insert_draft<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    customer_id: Uuid,
    booking_id: Option<Uuid>,
    amount: f64,
    tax_amount: f64,
    due_date: Option<NaiveDate>,
) -> Result<invoice::Model, ServiceError> {
    let now = Utc::now();
    let am = invoice::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(business_id),
        customer_id: Set(customer_id),
        booking_id: Set(booking_id),
        invoice_number: Set(invoice::generate_number(now.date_naive())),
        amount: Set(amount),
        tax_amount: Set(tax_amount),
        total_amount: Set(invoice::round_cents(amount + tax_amount)),
        status: Set(InvoiceStatus::Draft.as_str().to_string()),
        due_date: Set(due_date),
        paid_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };
    let created = am.insert(db).await?;
    INVOICES_CREATED_TOTAL.inc();
    info!(service = "invoices", event = "invoice_created", invoice_id = %created.id, number = %created.invoice_number);
    Ok(created)
}

/// Create a draft invoice for a customer.
pub async fn create_invoice<C: ConnectionTrait>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    input: InvoiceInput,
) -> Result<invoice::Model, ServiceError> {
    let customer_id = input.customer_id.ok_or_else(|| ServiceError::required("customerId"))?;
    let amount = check_amount(input.amount.ok_or_else(|| ServiceError::required("amount"))?, "amount")?;
    let tax_amount = check_amount(input.tax_amount.unwrap_or(0.0), "taxAmount")?;
    let due_date = non_empty(input.due_date).map(|d| parse_date(&d)).transpose()?;

    customer_service::get_customer(db, ctx.business_id, customer_id).await?;
    if let Some(booking_id) = input.booking_id {
        booking::Entity::find_by_id(booking_id)
            .filter(booking::Column::BusinessId.eq(ctx.business_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("booking"))?;
    }

    let created = insert_draft(db, ctx.business_id, customer_id, input.booking_id, amount, tax_amount, due_date).await?;
    audit_service::record(db, ctx, "create", "invoice", Some(created.id), serde_json::json!({ "number": created.invoice_number })).await;
    hub.publish("invoices", ChangeAction::Insert, ctx.business_id, &created);
    Ok(created)
}

/// Get invoice scoped to the business.
pub async fn get_invoice<C: ConnectionTrait>(db: &C, business_id: Uuid, id: Uuid) -> Result<invoice::Model, ServiceError> {
    invoice::Entity::find_by_id(id)
        .filter(invoice::Column::BusinessId.eq(business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("invoice"))
}

pub async fn list_invoices<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    query: &InvoiceQuery,
    opts: Pagination,
) -> Result<Page<invoice::Model>, ServiceError> {
    let mut q = invoice::Entity::find()
        .filter(invoice::Column::BusinessId.eq(business_id))
        .order_by_desc(invoice::Column::CreatedAt);
    if let Some(status) = non_empty(query.status.clone()) {
        let status: InvoiceStatus = status.parse()?;
        q = q.filter(invoice::Column::Status.eq(status.as_str()));
    }
    if let Some(cid) = query.customer_id {
        q = q.filter(invoice::Column::CustomerId.eq(cid));
    }
    fetch_page(db, q, opts).await
}

/// 金额只能在草稿状态修改；状态按迁移表推进，进入 paid 时记录 paid_at
pub async fn update_invoice<C: ConnectionTrait>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    id: Uuid,
    input: InvoiceUpdate,
) -> Result<invoice::Model, ServiceError> {
    let current = get_invoice(db, ctx.business_id, id).await?;
    let from = current.status()?;
    let mut am: invoice::ActiveModel = current.clone().into();

    if input.amount.is_some() || input.tax_amount.is_some() {
        if from != InvoiceStatus::Draft {
            return Err(ServiceError::Validation("only draft invoices can change amounts".into()));
        }
        let amount = check_amount(input.amount.unwrap_or(current.amount), "amount")?;
        let tax_amount = check_amount(input.tax_amount.unwrap_or(current.tax_amount), "taxAmount")?;
        am.amount = Set(amount);
        am.tax_amount = Set(tax_amount);
        am.total_amount = Set(invoice::round_cents(amount + tax_amount));
    }
    if let Some(due) = input.due_date {
        am.due_date = Set(non_empty(Some(due)).map(|d| parse_date(&d)).transpose()?);
    }

    let mut details = serde_json::json!({});
    if let Some(raw) = non_empty(input.status) {
        let to: InvoiceStatus = raw.parse()?;
        if to != from {
            if !from.can_transition_to(to) {
                return Err(ServiceError::Validation(format!("cannot change invoice status from {} to {}", from, to)));
            }
            am.status = Set(to.as_str().to_string());
            if to == InvoiceStatus::Paid {
                am.paid_at = Set(Some(Utc::now().into()));
            }
            details = serde_json::json!({ "from": from.as_str(), "to": to.as_str() });
        }
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    audit_service::record(db, ctx, "update", "invoice", Some(id), details).await;
    hub.publish("invoices", ChangeAction::Update, ctx.business_id, &updated);
    Ok(updated)
}

/// 仅草稿或已取消的发票可以删除
pub async fn delete_invoice<C: ConnectionTrait>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    id: Uuid,
) -> Result<(), ServiceError> {
    let current = get_invoice(db, ctx.business_id, id).await?;
    if !matches!(current.status()?, InvoiceStatus::Draft | InvoiceStatus::Cancelled) {
        return Err(ServiceError::Conflict(format!("invoice in status {} cannot be deleted", current.status)));
    }
    invoice::Entity::delete_by_id(id).exec(db).await?;
    audit_service::record(db, ctx, "delete", "invoice", Some(id), serde_json::json!({ "number": current.invoice_number })).await;
    hub.publish("invoices", ChangeAction::Delete, ctx.business_id, &current);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{get_db, seed};

    #[tokio::test]
    async fn create_and_pay() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let f = seed(&db).await?;
        let hub = EventHub::default();
        let ctx = TenantContext::new(f.business.id, "owner@biz.com");

        let err = create_invoice(&db, &hub, &ctx, InvoiceInput { amount: Some(10.0), ..Default::default() }).await.unwrap_err();
        assert_eq!(err.to_string(), "validation error: customerId is required");

        let inv = create_invoice(&db, &hub, &ctx, InvoiceInput {
            customer_id: Some(f.customer.id),
            amount: Some(200.0),
            tax_amount: Some(16.5),
            due_date: Some("2030-02-01".into()),
            ..Default::default()
        })
        .await?;
        assert_eq!(inv.total_amount, 216.5);
        assert_eq!(inv.status, "draft");
        assert!(inv.invoice_number.starts_with("INV-"));

        // draft -> paid 不允许
        let err = update_invoice(&db, &hub, &ctx, inv.id, InvoiceUpdate { status: Some("paid".into()), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        update_invoice(&db, &hub, &ctx, inv.id, InvoiceUpdate { status: Some("sent".into()), ..Default::default() }).await?;
        let paid = update_invoice(&db, &hub, &ctx, inv.id, InvoiceUpdate { status: Some("paid".into()), ..Default::default() }).await?;
        assert!(paid.paid_at.is_some());

        let err = update_invoice(&db, &hub, &ctx, inv.id, InvoiceUpdate { amount: Some(1.0), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(matches!(delete_invoice(&db, &hub, &ctx, inv.id).await, Err(ServiceError::Conflict(_))));

        let page = list_invoices(&db, f.business.id, &InvoiceQuery { status: Some("paid".into()), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(page.page_info.total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn other_business_cannot_see_invoice() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let f = seed(&db).await?;
        let other = seed(&db).await?;
        let hub = EventHub::default();
        let ctx = TenantContext::new(f.business.id, "owner@biz.com");
        let inv = create_invoice(&db, &hub, &ctx, InvoiceInput { customer_id: Some(f.customer.id), amount: Some(5.0), ..Default::default() }).await?;
        assert!(matches!(get_invoice(&db, other.business.id, inv.id).await, Err(ServiceError::NotFound(_))));

        // 其他租户的客户
        let err = create_invoice(&db, &hub, &ctx, InvoiceInput { customer_id: Some(other.customer.id), amount: Some(5.0), ..Default::default() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        Ok(())
    }
}
