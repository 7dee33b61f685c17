//! 客户通信：先落库为 queued，再经通知通道投递并回写结果。
use chrono::Utc;
use common::pagination::Pagination;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use models::booking;
use models::communication::{self, Channel, STATUS_FAILED, STATUS_QUEUED, STATUS_SENT};

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::metrics::NOTIFICATIONS_TOTAL;
use crate::notifications::{Notification, NotificationError, NotificationSender};
use crate::realtime::{ChangeAction, EventHub};
use crate::services::{audit_service, customer_service, fetch_page, non_empty, require, Page};

const OUTBOUND: &str = "outbound";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationInput {
    pub customer_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub channel: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationQuery {
    pub customer_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub channel: Option<String>,
}

/// 投递失败不视为请求错误，返回的记录状态为 failed
pub async fn send_communication<C: ConnectionTrait>(
    db: &C,
    hub: &EventHub,
    sender: &dyn NotificationSender,
    ctx: &TenantContext,
    input: CommunicationInput,
) -> Result<communication::Model, ServiceError> {
    let customer_id = input.customer_id.ok_or_else(|| ServiceError::required("customerId"))?;
    let channel = Channel::parse(&require(input.channel, "channel")?)?;
    let body = require(input.body, "body")?;
    let subject = non_empty(input.subject);

    let customer = customer_service::get_customer(db, ctx.business_id, customer_id).await?;
    if let Some(booking_id) = input.booking_id {
        booking::Entity::find_by_id(booking_id)
            .filter(booking::Column::BusinessId.eq(ctx.business_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("booking"))?;
    }
    let to = match channel {
        Channel::Email => Some(customer.email.clone()),
        Channel::Sms => customer.phone.clone(),
    }
    .filter(|s| !s.trim().is_empty());

    let queued = communication::ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(ctx.business_id),
        customer_id: Set(customer.id),
        booking_id: Set(input.booking_id),
        channel: Set(channel.as_str().to_string()),
        direction: Set(OUTBOUND.to_string()),
        subject: Set(subject.clone()),
        body: Set(body.clone()),
        status: Set(STATUS_QUEUED.to_string()),
        error_message: Set(None),
        sent_at: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;

    let outcome = match to {
        Some(to) => {
            let message = Notification {
                communication_id: queued.id,
                business_id: ctx.business_id,
                channel,
                to,
                subject,
                body,
            };
            sender.send(&message).await
        }
        None => Err(NotificationError::MissingRecipient(format!("customer has no {} address", channel.as_str()))),
    };

    let mut am: communication::ActiveModel = queued.into();
    match &outcome {
        Ok(()) => {
            am.status = Set(STATUS_SENT.to_string());
            am.sent_at = Set(Some(Utc::now().into()));
            NOTIFICATIONS_TOTAL.with_label_values(&[channel.as_str(), "sent"]).inc();
        }
        Err(e) => {
            warn!(service = "communications", event = "delivery_failed", provider = sender.provider(), error = %e);
            am.status = Set(STATUS_FAILED.to_string());
            am.error_message = Set(Some(e.to_string()));
            NOTIFICATIONS_TOTAL.with_label_values(&[channel.as_str(), "failed"]).inc();
        }
    }
    let saved = am.update(db).await?;
    info!(service = "communications", event = "communication_recorded", communication_id = %saved.id, status = %saved.status);
    audit_service::record(db, ctx, "create", "communication", Some(saved.id), serde_json::json!({ "channel": saved.channel, "status": saved.status })).await;
    hub.publish("communications", ChangeAction::Insert, ctx.business_id, &saved);
    Ok(saved)
}

pub async fn get_communication<C: ConnectionTrait>(db: &C, business_id: Uuid, id: Uuid) -> Result<communication::Model, ServiceError> {
    communication::Entity::find_by_id(id)
        .filter(communication::Column::BusinessId.eq(business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("communication"))
}

pub async fn list_communications<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    query: &CommunicationQuery,
    opts: Pagination,
) -> Result<Page<communication::Model>, ServiceError> {
    let mut q = communication::Entity::find()
        .filter(communication::Column::BusinessId.eq(business_id))
        .order_by_desc(communication::Column::CreatedAt);
    if let Some(cid) = query.customer_id {
        q = q.filter(communication::Column::CustomerId.eq(cid));
    }
    if let Some(bid) = query.booking_id {
        q = q.filter(communication::Column::BookingId.eq(bid));
    }
    if let Some(ch) = non_empty(query.channel.clone()) {
        q = q.filter(communication::Column::Channel.eq(Channel::parse(&ch)?.as_str()));
    }
    fetch_page(db, q, opts).await
}
