//! 上门服务进度跟踪：每个预约一条记录，状态只能向前推进。
use chrono::{DateTime, FixedOffset, Utc};
use common::pagination::Pagination;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use models::booking::BookingStatus;
use models::service_tracking::{self, TrackingStatus};

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::realtime::{ChangeAction, EventHub};
use crate::services::{booking_service, fetch_page, non_empty, Page};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInput {
    pub booking_id: Option<Uuid>,
    pub status: Option<String>,
    pub technician_name: Option<String>,
    pub notes: Option<String>,
    pub eta: Option<DateTime<FixedOffset>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingQuery {
    pub booking_id: Option<Uuid>,
    pub status: Option<String>,
}

fn parse_status(raw: Option<String>) -> Result<Option<TrackingStatus>, ServiceError> {
    Ok(non_empty(raw).map(|s| s.parse::<TrackingStatus>()).transpose()?)
}

/// Start tracking a booking; one tracking row per booking.
pub async fn create_tracking<C>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    input: TrackingInput,
) -> Result<service_tracking::Model, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let booking_id = input.booking_id.ok_or_else(|| ServiceError::required("bookingId"))?;
    let status = parse_status(input.status)?.unwrap_or(TrackingStatus::Scheduled);
    let booking = booking_service::get_booking(db, ctx.business_id, booking_id).await?;
    if matches!(booking.status()?, BookingStatus::Cancelled | BookingStatus::Completed) {
        return Err(ServiceError::Validation(format!("cannot track a {} booking", booking.status)));
    }
    let exists = service_tracking::Entity::find()
        .filter(service_tracking::Column::BookingId.eq(booking_id))
        .one(db)
        .await?;
    if exists.is_some() {
        return Err(ServiceError::Conflict("booking is already tracked".into()));
    }

    let txn = db.begin().await?;
    let now = Utc::now();
    let created = service_tracking::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(ctx.business_id),
        booking_id: Set(booking_id),
        status: Set(status.as_str().to_string()),
        technician_name: Set(non_empty(input.technician_name)),
        notes: Set(non_empty(input.notes)),
        eta: Set(input.eta),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;
    let completed = if status == TrackingStatus::Completed {
        Some(booking_service::mark_completed(&txn, ctx.business_id, booking_id).await?)
    } else {
        None
    };
    txn.commit().await?;

    info!(service = "tracking", event = "tracking_created", tracking_id = %created.id, booking_id = %booking_id, status = status.as_str());
    hub.publish("service_tracking", ChangeAction::Insert, ctx.business_id, &created);
    if let Some(b) = &completed {
        hub.publish("bookings", ChangeAction::Update, ctx.business_id, b);
    }
    Ok(created)
}

pub async fn get_tracking<C: ConnectionTrait>(db: &C, business_id: Uuid, id: Uuid) -> Result<service_tracking::Model, ServiceError> {
    service_tracking::Entity::find_by_id(id)
        .filter(service_tracking::Column::BusinessId.eq(business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service tracking"))
}

pub async fn list_tracking<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    query: &TrackingQuery,
    opts: Pagination,
) -> Result<Page<service_tracking::Model>, ServiceError> {
    let mut q = service_tracking::Entity::find()
        .filter(service_tracking::Column::BusinessId.eq(business_id))
        .order_by_desc(service_tracking::Column::UpdatedAt);
    if let Some(bid) = query.booking_id {
        q = q.filter(service_tracking::Column::BookingId.eq(bid));
    }
    if let Some(status) = parse_status(query.status.clone())? {
        q = q.filter(service_tracking::Column::Status.eq(status.as_str()));
    }
    fetch_page(db, q, opts).await
}

/// 推进状态；到达 completed 时同步完成预约
pub async fn update_tracking<C>(
    db: &C,
    hub: &EventHub,
    ctx: &TenantContext,
    id: Uuid,
    input: TrackingInput,
) -> Result<service_tracking::Model, ServiceError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let current = get_tracking(db, ctx.business_id, id).await?;
    let from: TrackingStatus = current.status.parse()?;
    let next = parse_status(input.status)?;
    if let Some(to) = next {
        if !from.can_advance_to(to) {
            return Err(ServiceError::Validation(format!(
                "cannot move tracking from {} back to {}",
                from.as_str(),
                to.as_str()
            )));
        }
    }

    let booking_id = current.booking_id;
    let mut am: service_tracking::ActiveModel = current.into();
    if let Some(to) = next {
        am.status = Set(to.as_str().to_string());
    }
    if input.technician_name.is_some() {
        am.technician_name = Set(non_empty(input.technician_name));
    }
    if input.notes.is_some() {
        am.notes = Set(non_empty(input.notes));
    }
    if input.eta.is_some() {
        am.eta = Set(input.eta);
    }
    am.updated_at = Set(Utc::now().into());

    let txn = db.begin().await?;
    let updated = am.update(&txn).await?;
    let completed = if next == Some(TrackingStatus::Completed) {
        Some(booking_service::mark_completed(&txn, ctx.business_id, booking_id).await?)
    } else {
        None
    };
    txn.commit().await?;

    hub.publish("service_tracking", ChangeAction::Update, ctx.business_id, &updated);
    if let Some(b) = &completed {
        hub.publish("bookings", ChangeAction::Update, ctx.business_id, b);
    }
    Ok(updated)
}
