use sea_orm::{entity::prelude::*, ConnectionTrait, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::business;
use crate::errors::ModelError;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_REVOKED: &str = "revoked";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "api_keys")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub key_prefix: String,
    #[sea_orm(unique)]
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub status: String,
    pub rate_limit_per_minute: i32,
    pub request_count: i64,
    pub last_used_at: Option<DateTimeWithTimeZone>,
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Business }

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

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_usable_at(&self, now: DateTimeWithTimeZone) -> bool {
        self.status == STATUS_ACTIVE && self.expires_at.map_or(true, |exp| exp > now)
    }
}

pub struct NewApiKey {
    pub business_id: Uuid,
    pub name: String,
    pub key_prefix: String,
    pub key_hash: String,
    pub rate_limit_per_minute: i32,
    pub expires_at: Option<DateTimeWithTimeZone>,
}

pub async fn create<C: ConnectionTrait>(db: &C, input: NewApiKey) -> Result<Model, ModelError> {
    if input.name.trim().is_empty() {
        return Err(ModelError::Validation("name is required".into()));
    }
    if input.rate_limit_per_minute <= 0 {
        return Err(ModelError::Validation("rateLimitPerMinute must be positive".into()));
    }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        business_id: Set(input.business_id),
        name: Set(input.name.trim().to_string()),
        key_prefix: Set(input.key_prefix),
        key_hash: Set(input.key_hash),
        status: Set(STATUS_ACTIVE.to_string()),
        rate_limit_per_minute: Set(input.rate_limit_per_minute),
        request_count: Set(0),
        last_used_at: Set(None),
        expires_at: Set(input.expires_at),
        created_at: Set(Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_hash<C: ConnectionTrait>(db: &C, key_hash: &str) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find().filter(Column::KeyHash.eq(key_hash)).one(db).await?)
}
