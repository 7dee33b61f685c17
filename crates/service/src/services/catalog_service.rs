//! 服务模板（目录）管理，以及基于模板的可用时段与报价。
use chrono::{NaiveDate, NaiveDateTime, Utc};
use common::pagination::Pagination;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use models::schedule::{parse_date, parse_time, PricingRules, SchedulingRules, WeeklyAvailability};
use models::{booking, service_template};

use crate::context::TenantContext;
use crate::errors::ServiceError;
use crate::pricing::{evaluate_price, PriceQuote, PricingContext};
use crate::scheduling::{available_slots, AvailableSlot};
use crate::services::{audit_service, booking_service, fetch_page, non_empty, require, Page};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub base_price: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub availability: Option<WeeklyAvailability>,
    pub scheduling_rules: Option<SchedulingRules>,
    pub pricing_rules: Option<PricingRules>,
    pub active: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceQuery {
    pub active: Option<bool>,
    pub category: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: i32,
    pub slots: Vec<AvailableSlot>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    pub date: Option<String>,
    pub start_time: Option<String>,
    #[serde(default)]
    pub is_emergency: bool,
    pub customer_id: Option<Uuid>,
}

/// Create a service template.
pub async fn create_service<C: ConnectionTrait>(
    db: &C,
    ctx: &TenantContext,
    input: ServiceInput,
) -> Result<service_template::Model, ServiceError> {
    let name = require(input.name, "name")?;
    let base_price = input.base_price.ok_or_else(|| ServiceError::required("basePrice"))?;
    let duration_minutes = input.duration_minutes.ok_or_else(|| ServiceError::required("durationMinutes"))?;
    let created = service_template::create(
        db,
        ctx.business_id,
        service_template::NewServiceTemplate {
            name,
            description: non_empty(input.description),
            category: non_empty(input.category),
            base_price,
            duration_minutes,
            availability: input.availability.unwrap_or_default(),
            scheduling_rules: input.scheduling_rules.unwrap_or_default(),
            pricing_rules: input.pricing_rules.unwrap_or_default(),
        },
    )
    .await?;
    audit_service::record(db, ctx, "create", "service", Some(created.id), serde_json::json!({ "name": created.name })).await;
    Ok(created)
}

/// Get service template scoped to the business.
pub async fn get_service<C: ConnectionTrait>(db: &C, business_id: Uuid, id: Uuid) -> Result<service_template::Model, ServiceError> {
    service_template::Entity::find_by_id(id)
        .filter(service_template::Column::BusinessId.eq(business_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("service"))
}

/// List service templates.
pub async fn list_services<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    query: &ServiceQuery,
    opts: Pagination,
) -> Result<Page<service_template::Model>, ServiceError> {
    let mut q = service_template::Entity::find()
        .filter(service_template::Column::BusinessId.eq(business_id))
        .order_by_asc(service_template::Column::Name);
    if let Some(active) = query.active {
        q = q.filter(service_template::Column::Active.eq(active));
    }
    if let Some(cat) = non_empty(query.category.clone()) {
        q = q.filter(service_template::Column::Category.eq(cat));
    }
    fetch_page(db, q, opts).await
}

/// Update provided fields only.
pub async fn update_service<C: ConnectionTrait>(
    db: &C,
    ctx: &TenantContext,
    id: Uuid,
    input: ServiceInput,
) -> Result<service_template::Model, ServiceError> {
    let current = get_service(db, ctx.business_id, id).await?;
    let base_price = input.base_price.unwrap_or(current.base_price);
    let duration = input.duration_minutes.unwrap_or(current.duration_minutes);
    service_template::validate_numbers(base_price, duration)?;
    service_template::validate_documents(
        input.availability.as_ref().unwrap_or(&current.availability),
        input.scheduling_rules.as_ref().unwrap_or(&current.scheduling_rules),
        input.pricing_rules.as_ref().unwrap_or(&current.pricing_rules),
    )?;

    let mut am: service_template::ActiveModel = current.into();
    if let Some(name) = input.name {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("name cannot be empty".into()));
        }
        am.name = Set(name.trim().to_string());
    }
    if input.description.is_some() {
        am.description = Set(non_empty(input.description));
    }
    if input.category.is_some() {
        am.category = Set(non_empty(input.category));
    }
    am.base_price = Set(base_price);
    am.duration_minutes = Set(duration);
    if let Some(a) = input.availability {
        am.availability = Set(a);
    }
    if let Some(r) = input.scheduling_rules {
        am.scheduling_rules = Set(r);
    }
    if let Some(p) = input.pricing_rules {
        am.pricing_rules = Set(p);
    }
    if let Some(active) = input.active {
        am.active = Set(active);
    }
    am.updated_at = Set(Utc::now().into());
    let updated = am.update(db).await?;
    audit_service::record(db, ctx, "update", "service", Some(id), serde_json::json!({})).await;
    Ok(updated)
}

/// Delete a service template that has no bookings.
pub async fn delete_service<C: ConnectionTrait>(db: &C, ctx: &TenantContext, id: Uuid) -> Result<(), ServiceError> {
    let current = get_service(db, ctx.business_id, id).await?;
    let bookings = booking::Entity::find()
        .filter(booking::Column::ServiceId.eq(id))
        .count(db)
        .await?;
    if bookings > 0 {
        return Err(ServiceError::Conflict("service has bookings; deactivate it instead".into()));
    }
    service_template::Entity::delete_by_id(current.id).exec(db).await?;
    audit_service::record(db, ctx, "delete", "service", Some(id), serde_json::json!({ "name": current.name })).await;
    Ok(())
}

/// Open slots of one service on one date.
pub async fn day_availability<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    service_id: Uuid,
    date: Option<&str>,
    step_minutes: Option<u32>,
    now: NaiveDateTime,
) -> Result<DayAvailability, ServiceError> {
    let date = parse_date(date.ok_or_else(|| ServiceError::required("date"))?)?;
    let svc = get_service(db, business_id, service_id).await?;
    if !svc.active {
        return Err(ServiceError::not_found("service"));
    }
    let booked = booking_service::booked_intervals(db, service_id, date, None).await?;
    let slots = available_slots(
        &svc.availability,
        &svc.scheduling_rules.0,
        date,
        svc.duration_minutes.max(0) as u32,
        step_minutes,
        &booked,
        now,
    );
    Ok(DayAvailability { service_id, date, duration_minutes: svc.duration_minutes, slots })
}

/// Price a prospective booking without persisting anything.
pub async fn quote<C: ConnectionTrait>(
    db: &C,
    business_id: Uuid,
    service_id: Uuid,
    input: QuoteInput,
) -> Result<PriceQuote, ServiceError> {
    let date = parse_date(&require(input.date, "date")?)?;
    let time = parse_time(&require(input.start_time, "startTime")?)?;
    let svc = get_service(db, business_id, service_id).await?;
    let is_repeat_customer = match input.customer_id {
        Some(cid) => booking_service::is_repeat_customer(db, business_id, cid).await?,
        None => false,
    };
    let ctx = PricingContext { is_emergency: input.is_emergency, date, time, is_repeat_customer };
    Ok(evaluate_price(svc.base_price, &svc.pricing_rules.0, &ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{business_hours, get_db};
    use models::schedule::{PriceModifier, PricingCondition, PricingRule};

    fn input() -> ServiceInput {
        ServiceInput {
            name: Some("AC Repair".into()),
            base_price: Some(100.0),
            duration_minutes: Some(60),
            availability: Some(business_hours()),
            pricing_rules: Some(PricingRules(vec![PricingRule {
                name: "emergency".into(),
                enabled: true,
                condition: PricingCondition::Emergency,
                modifier: PriceModifier::Percentage(0.10),
            }])),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn service_crud_and_validation() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let b = models::business::create(&db, "Catalog", None).await?;
        let ctx = TenantContext::new(b.id, "owner@c.com");

        let err = create_service(&db, &ctx, ServiceInput { name: Some("x".into()), ..Default::default() }).await.unwrap_err();
        assert_eq!(err.to_string(), "validation error: basePrice is required");

        let s = create_service(&db, &ctx, input()).await?;
        let updated = update_service(&db, &ctx, s.id, ServiceInput { active: Some(false), base_price: Some(120.0), ..Default::default() }).await?;
        assert!(!updated.active);
        assert_eq!(updated.base_price, 120.0);
        assert_eq!(updated.pricing_rules.0.len(), 1);

        let active = list_services(&db, b.id, &ServiceQuery { active: Some(true), ..Default::default() }, Pagination::default()).await?;
        assert!(active.items.is_empty());

        delete_service(&db, &ctx, s.id).await?;
        assert!(get_service(&db, b.id, s.id).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn rule_documents_are_validated_on_write() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let b = models::business::create(&db, "Rules", None).await?;
        let ctx = TenantContext::new(b.id, "owner@c.com");

        let huge: SchedulingRules = serde_json::from_value(serde_json::json!([
            { "condition": { "type": "lead_time", "hours": i64::MAX }, "action": "block" }
        ]))?;
        let err = create_service(&db, &ctx, ServiceInput { scheduling_rules: Some(huge.clone()), ..input() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "{err}");

        let s = create_service(&db, &ctx, input()).await?;
        let err = update_service(&db, &ctx, s.id, ServiceInput { scheduling_rules: Some(huge), ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let inverted: WeeklyAvailability = serde_json::from_value(serde_json::json!({
            "monday": { "enabled": true, "slots": [{ "start": "17:00", "end": "08:00" }] }
        }))?;
        let err = update_service(&db, &ctx, s.id, ServiceInput { availability: Some(inverted), ..Default::default() })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("monday"));

        let blackout: SchedulingRules = serde_json::from_value(serde_json::json!([
            { "condition": { "type": "blackout", "startDate": "2030-01-10", "endDate": "2030-01-01" }, "action": "block" }
        ]))?;
        assert!(update_service(&db, &ctx, s.id, ServiceInput { scheduling_rules: Some(blackout), ..Default::default() })
            .await
            .is_err());

        // 被拒的更新不落库
        let stored = get_service(&db, b.id, s.id).await?;
        assert!(stored.scheduling_rules.0.is_empty());
        assert_eq!(stored.availability, business_hours());
        Ok(())
    }

    #[tokio::test]
    async fn availability_and_quote() -> Result<(), anyhow::Error> {
        let db = get_db().await?;
        let b = models::business::create(&db, "Avail", None).await?;
        let ctx = TenantContext::new(b.id, "owner@c.com");
        let s = create_service(&db, &ctx, input()).await?;
        let now = NaiveDate::from_ymd_opt(2029, 12, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

        // 周一 08-17，午休 12-13：8 个整点时段
        let day = day_availability(&db, b.id, s.id, Some("2030-01-07"), None, now).await?;
        assert_eq!(day.slots.len(), 8);
        let sunday = day_availability(&db, b.id, s.id, Some("2030-01-06"), None, now).await?;
        assert!(sunday.slots.is_empty());
        assert!(matches!(day_availability(&db, b.id, s.id, None, None, now).await, Err(ServiceError::Validation(_))));

        let q = quote(&db, b.id, s.id, QuoteInput {
            date: Some("2030-01-07".into()),
            start_time: Some("09:00".into()),
            is_emergency: true,
            customer_id: None,
        })
        .await?;
        assert_eq!(q.final_price, 110.0);
        Ok(())
    }
}
