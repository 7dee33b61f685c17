//! 退款：校验可退金额，并在同一事务内更新发票状态。
use chrono::Utc;
use common::pagination::Pagination;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::invoice::{self, round_cents, InvoiceStatus};
use models::refund::{self, RefundStatus};

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::realtime::{ChangeAction, EventHub};
use crate::services::{audit_service, fetch_page, non_empty, Page};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundInput {
    pub invoice_id: Option<Uuid>,
    pub amount: Option<f64>,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundUpdate {
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundQuery {
    pub invoice_id: Option<Uuid>,
    pub status: Option<String>,
}

/// 未被拒绝的退款总额
async fn refunded_total<C: ConnectionTrait>(db: &C, invoice_id: Uuid) -> Result<f64, ServiceError> {
    let rows = refund::Entity::find()
        .filter(refund::Column::InvoiceId.eq(invoice_id))
        .filter(refund::Column::Status.ne(RefundStatus::Rejected.as_str()))
        .all(db)
        .await?;
    Ok(round_cents(rows.iter().map(|r| r.amount).sum()))
}

/// 在事务内锁定发票行（Postgres 为 `SELECT ... FOR UPDATE`，SQLite 依赖单写者串行），
/// 同一发票的余额校验与写入因此串行执行
async fn lock_invoice<C: ConnectionTrait>(txn: &C, business_id: Uuid, id: Uuid) -> Result<invoice::Model, ServiceError> {
    invoice::Entity::find_by_id(id)
        .filter(invoice::Column::BusinessId.eq(business_id))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("invoice"))
}

/// 按已退金额重算发票状态
async fn sync_invoice_status<C: ConnectionTrait>(db: &C, inv: invoice::Model) -> Result<invoice::Model, ServiceError> {
    let refunded = refunded_total(db, inv.id).await?;
    let next = if refunded <= 0.0 {
        InvoiceStatus::Paid
    } else if refunded >= inv.total_amount {
        InvoiceStatus::Refunded
    } else {
        InvoiceStatus::PartiallyRefunded
    };
    if inv.status == next.as_str() {
        return Ok(inv);
    }
    let mut am: invoice::ActiveModel = inv.into();
    am.status = Set(next.as_str().to_string());
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

/// Create a pending refund against a paid invoice.
pub async fn create_refund<C>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    input: RefundInput,
) -> Result<refund::Model, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let invoice_id = input.invoice_id.ok_or_else(|| ServiceError::required("invoiceId"))?;
    let amount = input.amount.ok_or_else(|| ServiceError::required("amount"))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ServiceError::Validation("amount must be greater than zero".into()));
    }
    let amount = round_cents(amount);

    let txn = db.begin().await?;
    let inv = lock_invoice(&txn, ctx.business_id, invoice_id).await?;
    if !inv.status()?.is_refundable() {
        return Err(ServiceError::Validation(format!("invoice in status {} cannot be refunded", inv.status)));
    }
    let refundable = round_cents(inv.total_amount - refunded_total(&txn, inv.id).await?);
    if amount > refundable {
        return Err(ServiceError::Validation(format!("amount exceeds refundable balance of {:.2}", refundable)));
    }

    let created = refund::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(ctx.business_id),
        invoice_id: Set(inv.id),
        amount: Set(amount),
        reason: Set(non_empty(input.reason)),
        status: Set(RefundStatus::Pending.as_str().to_string()),
        processed_at: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;
    let inv = sync_invoice_status(&txn, inv).await?;
    txn.commit().await?;

    info!(service = "refunds", event = "refund_created", refund_id = %created.id, invoice_id = %inv.id, amount, invoice_status = %inv.status);
    audit_service::record(db, ctx, "create", "refund", Some(created.id), serde_json::json!({ "invoiceId": inv.id, "amount": amount })).await;
    hub.publish("invoices", ChangeAction::Update, ctx.business_id, &inv);
    Ok(created)
}

pub async fn get_refund<C: ConnectionTrait>(db: &C, business_id: Uuid, id: Uuid) -> Result<refund::Model, ServiceError> {
    refund::Entity::find_by_id(id)
        .filter(refund::Column::BusinessId.eq(business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("refund"))
}

pub async fn list_refunds<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    query: &RefundQuery,
    opts: Pagination,
) -> Result<Page<refund::Model>, ServiceError> {
    let mut q = refund::Entity::find()
        .filter(refund::Column::BusinessId.eq(business_id))
        .order_by_desc(refund::Column::CreatedAt);
    if let Some(iid) = query.invoice_id {
        q = q.filter(refund::Column::InvoiceId.eq(iid));
    }
    if let Some(status) = non_empty(query.status.clone()) {
        let status: RefundStatus = status.parse()?;
        q = q.filter(refund::Column::Status.eq(status.as_str()));
    }
    fetch_page(db, q, opts).await
}

/// 审批流转；拒绝后释放额度并重算发票状态，processed 记录处理时间
pub async fn update_refund<C>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    id: Uuid,
    input: RefundUpdate,
) -> Result<refund::Model, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let raw = non_empty(input.status).ok_or_else(|| ServiceError::required("status"))?;
    let to: RefundStatus = raw.parse()?;

    let txn = db.begin().await?;
    let current = get_refund(&txn, ctx.business_id, id).await?;
    let from: RefundStatus = current.status.parse()?;
    if !from.can_transition_to(to) {
        return Err(ServiceError::Validation(format!("cannot change refund status from {} to {}", from, to)));
    }
    let invoice_id = current.invoice_id;
    let mut am: refund::ActiveModel = current.into();
    am.status = Set(to.as_str().to_string());
    if to == RefundStatus::Processed {
        am.processed_at = Set(Some(Utc::now().into()));
    }
    let updated = am.update(&txn).await?;
    let inv = if to == RefundStatus::Rejected {
        let inv = lock_invoice(&txn, ctx.business_id, invoice_id).await?;
        Some(sync_invoice_status(&txn, inv).await?)
    } else {
        None
    };
    txn.commit().await?;

    audit_service::record(db, ctx, "update", "refund", Some(id), serde_json::json!({ "from": from.as_str(), "to": to.as_str() })).await;
    if let Some(inv) = inv {
        hub.publish("invoices", ChangeAction::Update, ctx.business_id, &inv);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::invoice_service::{self, InvoiceInput, InvoiceUpdate};
    use crate::test_support::{get_db, seed};
    use sea_orm::DatabaseConnection;

    async fn paid_invoice(db: &DatabaseConnection, hub: &EventHub, ctx: &TenantContext, customer_id: Uuid) -> Result<invoice::Model, anyhow::Error> {
        let inv = invoice_service::create_invoice(db, hub, ctx, InvoiceInput {
            customer_id: Some(customer_id),
            amount: Some(100.0),
            ..Default::default()
        })
        .await?;
        for status in ["sent", "paid"] {
            invoice_service::update_invoice(db, hub, ctx, inv.id, InvoiceUpdate { status: Some(status.into()), ..Default::default() }).await?;
        }
        Ok(invoice_service::get_invoice(db, ctx.business_id, inv.id).await?)
    }

    #[tokio::test]
    async fn partial_then_full_refund() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let f = seed(&db).await?;
        let hub = EventHub::default();
        let ctx = TenantContext::new(f.business.id, "owner@biz.com");
        let inv = paid_invoice(&db, &hub, &ctx, f.customer.id).await?;

        create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(inv.id), amount: Some(40.0), reason: Some("late".into()) }).await?;
        let inv_now = invoice_service::get_invoice(&db, f.business.id, inv.id).await?;
        assert_eq!(inv_now.status, "partially_refunded");

        let err = create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(inv.id), amount: Some(60.01), reason: None }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(inv.id), amount: Some(60.0), reason: None }).await?;
        let inv_now = invoice_service::get_invoice(&db, f.business.id, inv.id).await?;
        assert_eq!(inv_now.status, "refunded");
        Ok(())
    }

    #[tokio::test]
    async fn rejects_bad_amounts_and_unpaid_invoices() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let f = seed(&db).await?;
        let hub = EventHub::default();
        let ctx = TenantContext::new(f.business.id, "owner@biz.com");
        let draft = invoice_service::create_invoice(&db, &hub, &ctx, InvoiceInput { customer_id: Some(f.customer.id), amount: Some(10.0), ..Default::default() }).await?;

        let err = create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(draft.id), amount: Some(0.0), reason: None }).await.unwrap_err();
        assert_eq!(err.to_string(), "validation error: amount must be greater than zero");
        let err = create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(draft.id), amount: Some(5.0), reason: None }).await.unwrap_err();
        assert!(err.to_string().contains("cannot be refunded"));
        let err = create_refund(&db, &hub, &ctx, RefundInput { invoice_id: None, amount: Some(5.0), reason: None }).await.unwrap_err();
        assert_eq!(err.to_string(), "validation error: invoiceId is required");
        Ok(())
    }

    #[tokio::test]
    async fn approval_flow_and_rejection_restores_invoice() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let f = seed(&db).await?;
        let hub = EventHub::default();
        let ctx = TenantContext::new(f.business.id, "owner@biz.com");
        let inv = paid_invoice(&db, &hub, &ctx, f.customer.id).await?;

        let r1 = create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(inv.id), amount: Some(100.0), reason: None }).await?;
        let err = update_refund(&db, &hub, &ctx, r1.id, RefundUpdate { status: Some("processed".into()) }).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        update_refund(&db, &hub, &ctx, r1.id, RefundUpdate { status: Some("rejected".into()) }).await?;
        assert_eq!(invoice_service::get_invoice(&db, f.business.id, inv.id).await?.status, "paid");

        let r2 = create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(inv.id), amount: Some(30.0), reason: None }).await?;
        update_refund(&db, &hub, &ctx, r2.id, RefundUpdate { status: Some("approved".into()) }).await?;
        let done = update_refund(&db, &hub, &ctx, r2.id, RefundUpdate { status: Some("processed".into()) }).await?;
        assert!(done.processed_at.is_some());

        let page = list_refunds(&db, f.business.id, &RefundQuery { invoice_id: Some(inv.id), ..Default::default() }, Pagination::default()).await?;
        assert_eq!(page.page_info.total, 2);
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_refunds_cannot_overdraw() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let f = seed(&db).await?;
        let hub = EventHub::default();
        let ctx = TenantContext::new(f.business.id, "owner@biz.com");
        let inv = paid_invoice(&db, &hub, &ctx, f.customer.id).await?;

        let refund = |amount: f64| create_refund(&db, &hub, &ctx, RefundInput { invoice_id: Some(inv.id), amount: Some(amount), reason: None });
        let (a, b) = tokio::join!(refund(70.0), refund(70.0));
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(ServiceError::Validation(_))));
        assert_eq!(refunded_total(&db, inv.id).await?, 70.0);
        Ok(())
    }
}
