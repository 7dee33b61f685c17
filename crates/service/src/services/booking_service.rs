//! 预约：可用性判定、冲突检测、定价，以及与草稿发票一起落库。
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use common::pagination::Pagination;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use configs::BookingConfig;
use models::booking::{self, BookingStatus};
use models::invoice::{self, round_cents};
use models::schedule::{parse_date, parse_time};

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::metrics::BOOKINGS_CREATED_TOTAL;
use crate::pricing::{evaluate_price, PriceQuote, PricingContext};
use crate::realtime::{ChangeAction, EventHub};
use crate::scheduling::{check_availability, SlotRequest};
use crate::services::customer_service::{self, CustomerInput};
use crate::services::{audit_service, catalog_service, fetch_page, invoice_service, non_empty, require, Page};

const SLOT_TAKEN: &str = "time slot is already booked";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingInput {
    pub service_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    /// 组件预约时按邮箱查找或创建客户
    pub customer: Option<CustomerInput>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    #[serde(default)]
    pub is_emergency: bool,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    pub status: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    pub status: Option<String>,
    pub date: Option<String>,
    pub customer_id: Option<Uuid>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBooking {
    pub booking: booking::Model,
    pub invoice: Option<invoice::Model>,
    pub price: PriceQuote,
}

/// 同一服务当天仍占用时段的预约区间 `[start, end)`
pub async fn booked_intervals<C: ConnectionTrait>(
    db: &C,
    service_id: Uuid,
    date: NaiveDate,
    exclude: Option<Uuid>,
) -> Result<Vec<(NaiveTime, NaiveTime)>, ServiceError> {
    let mut q = booking::Entity::find()
        .filter(booking::Column::ServiceId.eq(service_id))
        .filter(booking::Column::ScheduledDate.eq(date))
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled.as_str()));
    if let Some(id) = exclude {
        q = q.filter(booking::Column::Id.ne(id));
    }
    Ok(q.all(db).await?.into_iter().map(|b| (b.start_time, b.end_time)).collect())
}

/// 老客户：至少有一单已完成的预约
pub async fn is_repeat_customer<C: ConnectionTrait>(db: &C, business_id: Uuid, customer_id: Uuid) -> Result<bool, ServiceError> {
    let completed = booking::Entity::find()
        .filter(booking::Column::BusinessId.eq(business_id))
        .filter(booking::Column::CustomerId.eq(customer_id))
        .filter(booking::Column::Status.eq(BookingStatus::Completed.as_str()))
        .count(db)
        .await?;
    Ok(completed > 0)
}

/// 判定可用性并检测冲突，返回结束时刻与是否需要审批
async fn reserve_slot<C: ConnectionTrait>(
    db: &C,
    svc: &models::service_template::Model,
    date: NaiveDate,
    start: NaiveTime,
    exclude: Option<Uuid>,
    now: NaiveDateTime,
) -> Result<(NaiveTime, bool), ServiceError> {
    let req = SlotRequest { date, start, duration_minutes: svc.duration_minutes.max(0) as u32 };
    let decision = check_availability(&svc.availability, &svc.scheduling_rules.0, &req, now);
    if !decision.available {
        return Err(ServiceError::Conflict(decision.reason));
    }
    let end = req.end().ok_or_else(|| ServiceError::Conflict(crate::scheduling::OUTSIDE_HOURS.into()))?;
    let booked = booked_intervals(db, svc.id, date, exclude).await?;
    if booked.iter().any(|(s, e)| start < *e && *s < end) {
        return Err(ServiceError::Conflict(SLOT_TAKEN.into()));
    }
    Ok((end, decision.requires_approval))
}

/// Create a booking; with `auto_invoice` a draft invoice is written in the same transaction.
#[instrument(skip_all, fields(business_id = %ctx.business_id))]
pub async fn create_booking<C>(
    db: &C,
    hub: &EventHub,
    cfg: &BookingConfig,
    ctx: &TenantContext,
    input: BookingInput,
    now: NaiveDateTime,
) -> Result<CreatedBooking, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let service_id = input.service_id.ok_or_else(|| ServiceError::required("serviceId"))?;
    let date = parse_date(&require(input.date, "date")?)?;
    let start = parse_time(&require(input.start_time, "startTime")?)?;
    if input.customer_id.is_none() && input.customer.is_none() {
        return Err(ServiceError::required("customerId"));
    }

    let svc = catalog_service::get_service(db, ctx.business_id, service_id).await?;
    if !svc.active {
        return Err(ServiceError::Validation("service is not active".into()));
    }

    let txn = db.begin().await?;
    let customer = match input.customer_id {
        Some(id) => customer_service::get_customer(&txn, ctx.business_id, id).await?,
        None => customer_service::find_or_create(&txn, ctx, input.customer.unwrap_or_default()).await?,
    };
    let (end, requires_approval) = reserve_slot(&txn, &svc, date, start, None, now).await?;

    let pricing = PricingContext {
        is_emergency: input.is_emergency,
        date,
        time: start,
        is_repeat_customer: is_repeat_customer(&txn, ctx.business_id, customer.id).await?,
    };
    let price = evaluate_price(svc.base_price, &svc.pricing_rules.0, &pricing);
    let status = if requires_approval { BookingStatus::PendingApproval } else { BookingStatus::Pending };

    let ts = Utc::now();
    let created = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(ctx.business_id),
        customer_id: Set(customer.id),
        service_id: Set(svc.id),
        scheduled_date: Set(date),
        start_time: Set(start),
        end_time: Set(end),
        status: Set(status.as_str().to_string()),
        total_price: Set(price.final_price),
        is_emergency: Set(input.is_emergency),
        notes: Set(non_empty(input.notes)),
        created_at: Set(ts.into()),
        updated_at: Set(ts.into()),
    }
    .insert(&txn)
    .await?;

    let invoice = if cfg.auto_invoice {
        let tax = round_cents(created.total_price * cfg.tax_rate);
        let due = date + Duration::days(cfg.invoice_due_days);
        Some(invoice_service::insert_draft(&txn, ctx.business_id, customer.id, Some(created.id), created.total_price, tax, Some(due)).await?)
    } else {
        None
    };
    txn.commit().await?;

    BOOKINGS_CREATED_TOTAL.with_label_values(&[status.as_str()]).inc();
    info!(
        service = "bookings",
        event = "booking_created",
        booking_id = %created.id,
        status = status.as_str(),
        total = created.total_price
    );
    audit_service::record(
        db,
        ctx,
        "create",
        "booking",
        Some(created.id),
        serde_json::json!({ "serviceId": svc.id, "date": date, "status": status.as_str() }),
    )
    .await;
    hub.publish("bookings", ChangeAction::Insert, ctx.business_id, &created);
    if let Some(inv) = &invoice {
        hub.publish("invoices", ChangeAction::Insert, ctx.business_id, inv);
    }
    Ok(CreatedBooking { booking: created, invoice, price })
}

/// Get booking scoped to the business.
pub async fn get_booking<C: ConnectionTrait>(db: &C, business_id: Uuid, id: Uuid) -> Result<booking::Model, ServiceError> {
    booking::Entity::find_by_id(id)
        .filter(booking::Column::BusinessId.eq(business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("booking"))
}

pub async fn list_bookings<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    query: &BookingQuery,
    opts: Pagination,
) -> Result<Page<booking::Model>, ServiceError> {
    let mut q = booking::Entity::find()
        .filter(booking::Column::BusinessId.eq(business_id))
        .order_by_desc(booking::Column::ScheduledDate)
        .order_by_desc(booking::Column::StartTime);
    if let Some(status) = non_empty(query.status.clone()) {
        let status: BookingStatus = status.parse()?;
        q = q.filter(booking::Column::Status.eq(status.as_str()));
    }
    if let Some(date) = non_empty(query.date.clone()) {
        q = q.filter(booking::Column::ScheduledDate.eq(parse_date(&date)?));
    }
    if let Some(cid) = query.customer_id {
        q = q.filter(booking::Column::CustomerId.eq(cid));
    }
    fetch_page(db, q, opts).await
}

/// 状态迁移与改期；改期重新做可用性与冲突检测
pub async fn update_booking<C: ConnectionTrait>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    id: Uuid,
    input: BookingUpdate,
    now: NaiveDateTime,
) -> Result<booking::Model, ServiceError> {
    let current = get_booking(db, ctx.business_id, id).await?;
    let mut from = current.status()?;
    let mut am: booking::ActiveModel = current.clone().into();
    let mut details = serde_json::Map::new();

    let new_date = non_empty(input.date).map(|d| parse_date(&d)).transpose()?;
    let new_start = non_empty(input.start_time).map(|t| parse_time(&t)).transpose()?;
    if new_date.is_some() || new_start.is_some() {
        if !matches!(from, BookingStatus::Pending | BookingStatus::PendingApproval | BookingStatus::Confirmed) {
            return Err(ServiceError::Validation(format!("booking in status {} cannot be rescheduled", from)));
        }
        let date = new_date.unwrap_or(current.scheduled_date);
        let start = new_start.unwrap_or(current.start_time);
        let svc = catalog_service::get_service(db, ctx.business_id, current.service_id).await?;
        let (end, requires_approval) = reserve_slot(db, &svc, date, start, Some(id), now).await?;
        am.scheduled_date = Set(date);
        am.start_time = Set(start);
        am.end_time = Set(end);
        details.insert("rescheduled".into(), serde_json::json!({ "date": date, "startTime": start.format("%H:%M").to_string() }));
        // 新时段命中需审批规则时重新进入待审批
        if requires_approval && from != BookingStatus::PendingApproval {
            am.status = Set(BookingStatus::PendingApproval.as_str().to_string());
            details.insert("approval".into(), serde_json::json!({ "from": from.as_str(), "to": BookingStatus::PendingApproval.as_str() }));
            from = BookingStatus::PendingApproval;
        }
    }

    if let Some(raw) = non_empty(input.status) {
        let to: BookingStatus = raw.parse()?;
        if to != from {
            if !from.can_transition_to(to) {
                return Err(ServiceError::Validation(format!("cannot change booking status from {} to {}", from, to)));
            }
            am.status = Set(to.as_str().to_string());
            details.insert("from".into(), from.as_str().into());
            details.insert("to".into(), to.as_str().into());
        }
    }
    if input.notes.is_some() {
        am.notes = Set(non_empty(input.notes));
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    audit_service::record(db, ctx, "update", "booking", Some(id), serde_json::Value::Object(details)).await;
    hub.publish("bookings", ChangeAction::Update, ctx.business_id, &updated);
    Ok(updated)
}

/// 服务跟踪到达 completed 时调用，由调用方在提交事务后发布事件。
///
/// 只接受 in_progress，或 confirmed（技师未单独标记开工时视为经过 in_progress）；
/// 已完成的预约原样返回。
pub(crate) async fn mark_completed<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    id: Uuid,
) -> Result<booking::Model, ServiceError> {
    let current = get_booking(db, business_id, id).await?;
    let from = current.status()?;
    match from {
        BookingStatus::Completed => return Ok(current),
        BookingStatus::InProgress | BookingStatus::Confirmed => {}
        _ => {
            return Err(ServiceError::Validation(format!("cannot complete booking in status {}", from)));
        }
    }
    let mut am: booking::ActiveModel = current.into();
    am.status = Set(BookingStatus::Completed.as_str().to_string());
    am.updated_at = Set(Utc::now().into());
    Ok(am.update(db).await?)
}

pub async fn delete_booking<C: ConnectionTrait>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    id: Uuid,
) -> Result<(), ServiceError> {
    let current = get_booking(db, ctx.business_id, id).await?;
    booking::Entity::delete_by_id(id).exec(db).await?;
    audit_service::record(db, ctx, "delete", "booking", Some(id), serde_json::json!({ "status": current.status })).await;
    hub.publish("bookings", ChangeAction::Delete, ctx.business_id, &current);
    Ok(())
}
