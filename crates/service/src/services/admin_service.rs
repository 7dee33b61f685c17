//! 平台管理员视图：跨租户的汇总统计。
use std::collections::BTreeMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};
use serde::Serialize;

use models::booking::{self, BookingStatus};
use models::invoice::{self, round_cents, InvoiceStatus};
use models::{business, customer, refund};

use crate::errors::ServiceError;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub businesses: u64,
    pub customers: u64,
    pub bookings: u64,
    pub bookings_by_status: BTreeMap<String, i64>,
    /// 已收款发票总额减去未被拒绝的退款
    pub paid_revenue: f64,
}

async fn sum_column<C, E, Col>(db: &C, select: sea_orm::Select<E>, col: Col) -> Result<f64, ServiceError>
where
    C: ConnectionTrait,
    E: EntityTrait,
    Col: ColumnTrait,
{
    let total: Option<Option<f64>> = select
        .select_only()
        .column_as(col.sum(), "total")
        .into_tuple()
        .one(db)
        .await?;
    Ok(total.flatten().unwrap_or(0.0))
}

pub async fn platform_stats<C: ConnectionTrait>(db: &C) -> Result<PlatformStats, ServiceError> {
    let businesses = business::Entity::find().count(db).await?;
    let customers = customer::Entity::find().count(db).await?;

    let rows: Vec<(String, i64)> = booking::Entity::find()
        .select_only()
        .column(booking::Column::Status)
        .column_as(booking::Column::Id.count(), "count")
        .group_by(booking::Column::Status)
        .into_tuple()
        .all(db)
        .await?;
    let mut bookings_by_status: BTreeMap<String, i64> =
        BookingStatus::ALL.iter().map(|s| (s.as_str().to_string(), 0)).collect();
    for (status, n) in rows {
        *bookings_by_status.entry(status).or_insert(0) += n;
    }
    let bookings = bookings_by_status.values().sum::<i64>().max(0) as u64;

    let collected = [InvoiceStatus::Paid, InvoiceStatus::PartiallyRefunded, InvoiceStatus::Refunded].map(|s| s.as_str());
    let gross = sum_column(
        db,
        invoice::Entity::find().filter(invoice::Column::Status.is_in(collected)),
        invoice::Column::TotalAmount,
    )
    .await?;
    let refunded = sum_column(
        db,
        refund::Entity::find().filter(refund::Column::Status.ne(refund::RefundStatus::Rejected.as_str())),
        refund::Column::Amount,
    )
    .await?;

    Ok(PlatformStats {
        businesses,
        customers,
        bookings,
        bookings_by_status,
        paid_revenue: round_cents(gross - refunded),
    })
}
