use std::str::FromStr;

use sea_orm::entity::prelude::*;
use uuid::Uuid;
use serde::{Deserialize, Serialize};

use crate::booking;
use crate::errors::ModelError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_tracking")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_id: Uuid,
    #[sea_orm(unique)]
    pub booking_id: Uuid,
    pub status: String,
    pub technician_name: Option<String>,
    pub notes: Option<String>,
    pub eta: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Booking,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Booking => Entity::belongs_to(booking::Entity)
                .from(Column::BookingId)
                .to(booking::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// 按派工顺序排列；只允许向前推进
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Scheduled,
    EnRoute,
    OnSite,
    InProgress,
    Completed,
}

impl TrackingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingStatus::Scheduled => "scheduled",
            TrackingStatus::EnRoute => "en_route",
            TrackingStatus::OnSite => "on_site",
            TrackingStatus::InProgress => "in_progress",
            TrackingStatus::Completed => "completed",
        }
    }

    pub fn can_advance_to(&self, next: TrackingStatus) -> bool {
        next > *self
    }
}

impl FromStr for TrackingStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(TrackingStatus::Scheduled),
            "en_route" => Ok(TrackingStatus::EnRoute),
            "on_site" => Ok(TrackingStatus::OnSite),
            "in_progress" => Ok(TrackingStatus::InProgress),
            "completed" => Ok(TrackingStatus::Completed),
            other => Err(ModelError::Validation(format!("unknown tracking status '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TrackingStatus::{self, *};

    #[test]
    fn forward_only() {
        assert!(Scheduled.can_advance_to(EnRoute));
        assert!(Scheduled.can_advance_to(Completed));
        assert!(!OnSite.can_advance_to(EnRoute));
        assert!(!Completed.can_advance_to(Completed));
        assert_eq!("on_site".parse::<TrackingStatus>().unwrap(), OnSite);
    }
}
