//! 服务模板（表 `services`）：业务提供的服务项，带基础价、时长与三份 JSON 文档。
use sea_orm::{entity::prelude::*, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::business;
use crate::errors::ModelError;
use crate::schedule::{PricingRules, SchedulingRules, WeeklyAvailability};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub base_price: f64,
    pub duration_minutes: i32,
    pub availability: WeeklyAvailability,
    pub scheduling_rules: SchedulingRules,
    pub pricing_rules: PricingRules,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Business,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Business => Entity::belongs_to(business::Entity)
                .from(Column::BusinessId)
                .to(business::Column::Id)
                .into(),
        }
    }
}

impl Related<business::Entity> for Entity {
    fn to() -> RelationDef { Relation::Business.def() }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, Default)]
pub struct NewServiceTemplate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub base_price: f64,
    pub duration_minutes: i32,
    pub availability: WeeklyAvailability,
    pub scheduling_rules: SchedulingRules,
    pub pricing_rules: PricingRules,
}

pub fn validate_numbers(base_price: f64, duration_minutes: i32) -> Result<(), ModelError> {
    if !base_price.is_finite() || base_price < 0.0 {
        return Err(ModelError::Validation("basePrice must be a non-negative number".into()));
    }
    if duration_minutes <= 0 || duration_minutes > 24 * 60 {
        return Err(ModelError::Validation("durationMinutes must be between 1 and 1440".into()));
    }
    Ok(())
}

/// 三份 JSON 文档的取值检查，写库前调用
pub fn validate_documents(
    availability: &WeeklyAvailability,
    scheduling_rules: &SchedulingRules,
    pricing_rules: &PricingRules,
) -> Result<(), ModelError> {
    availability.validate()?;
    scheduling_rules.validate()?;
    pricing_rules.validate()
}

pub async fn create<C: ConnectionTrait>(db: &C, business_id: Uuid, input: NewServiceTemplate) -> Result<Model, ModelError> {
    if input.name.trim().is_empty() {
        return Err(ModelError::Validation("name is required".into()));
    }
    validate_numbers(input.base_price, input.duration_minutes)?;
    validate_documents(&input.availability, &input.scheduling_rules, &input.pricing_rules)?;
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(business_id),
        name: Set(input.name.trim().to_string()),
        description: Set(input.description),
        category: Set(input.category),
        base_price: Set(input.base_price),
        duration_minutes: Set(input.duration_minutes),
        availability: Set(input.availability),
        scheduling_rules: Set(input.scheduling_rules),
        pricing_rules: Set(input.pricing_rules),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}
