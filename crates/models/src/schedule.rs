//! 服务模板上的 JSON 文档：每周可用时段、排期规则、定价规则。
//!
//! 这些类型只描述数据；判定逻辑在 `service::scheduling` 与 `service::pricing`。
use chrono::{NaiveDate, NaiveTime, Weekday};
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// 接受 `HH:MM` 或 `HH:MM:SS`
pub fn parse_time(raw: &str) -> Result<NaiveTime, ModelError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ModelError::Validation(format!("invalid time '{}', expected HH:MM", raw)))
}

/// `YYYY-MM-DD`
pub fn parse_date(raw: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ModelError::Validation(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
}

pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        }
    }

    pub fn is_weekend(&self) -> bool {
        matches!(self, DayOfWeek::Saturday | DayOfWeek::Sunday)
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(w: Weekday) -> Self {
        match w {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

/// 半开区间 `[start, end)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start >= self.start && end <= self.end
    }

    pub fn overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < self.end && self.start < end
    }

    /// 判断时刻是否落在区间内；`start > end` 视为跨午夜
    pub fn covers(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaySchedule {
    pub enabled: bool,
    pub slots: Vec<TimeRange>,
    pub breaks: Vec<TimeRange>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct WeeklyAvailability {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl WeeklyAvailability {
    pub fn day(&self, day: DayOfWeek) -> &DaySchedule {
        match day {
            DayOfWeek::Monday => &self.monday,
            DayOfWeek::Tuesday => &self.tuesday,
            DayOfWeek::Wednesday => &self.wednesday,
            DayOfWeek::Thursday => &self.thursday,
            DayOfWeek::Friday => &self.friday,
            DayOfWeek::Saturday => &self.saturday,
            DayOfWeek::Sunday => &self.sunday,
        }
    }

    /// 每个时段与休息段都必须 `start < end`；跨午夜的营业时段不支持
    pub fn validate(&self) -> Result<(), ModelError> {
        for day in DayOfWeek::ALL {
            let schedule = self.day(day);
            for range in schedule.slots.iter().chain(schedule.breaks.iter()) {
                if range.start >= range.end {
                    return Err(ModelError::Validation(format!(
                        "availability.{}: start must be before end",
                        day.as_str()
                    )));
                }
            }
        }
        Ok(())
    }

    /// 周一至周五使用同一份日程，周末关闭
    pub fn weekdays(schedule: DaySchedule) -> Self {
        Self {
            monday: schedule.clone(),
            tuesday: schedule.clone(),
            wednesday: schedule.clone(),
            thursday: schedule.clone(),
            friday: schedule,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RuleCondition {
    TimeOfDay {
        #[serde(with = "hhmm")]
        start: NaiveTime,
        #[serde(with = "hhmm")]
        end: NaiveTime,
    },
    DayOfWeek { days: Vec<DayOfWeek> },
    /// 距现在不足 `hours` 小时时命中
    LeadTime { hours: i64 },
    /// 闭区间
    Blackout { start_date: NaiveDate, end_date: NaiveDate },
    /// 超过 `days` 天之后时命中
    MaxAdvance { days: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Block,
    Allow,
    RequireApproval,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingRule {
    #[serde(default)]
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub condition: RuleCondition,
    pub action: RuleAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct SchedulingRules(pub Vec<SchedulingRule>);

/// 提前量上限一年
pub const MAX_LEAD_TIME_HOURS: i64 = 24 * 366;
/// 最远预约窗口上限十年
pub const MAX_ADVANCE_DAYS: i64 = 3660;

impl SchedulingRules {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (i, rule) in self.0.iter().enumerate() {
            match &rule.condition {
                RuleCondition::LeadTime { hours } if !(0..=MAX_LEAD_TIME_HOURS).contains(hours) => {
                    return Err(ModelError::Validation(format!(
                        "schedulingRules[{i}]: lead_time hours must be between 0 and {MAX_LEAD_TIME_HOURS}"
                    )));
                }
                RuleCondition::MaxAdvance { days } if !(0..=MAX_ADVANCE_DAYS).contains(days) => {
                    return Err(ModelError::Validation(format!(
                        "schedulingRules[{i}]: max_advance days must be between 0 and {MAX_ADVANCE_DAYS}"
                    )));
                }
                RuleCondition::Blackout { start_date, end_date } if start_date > end_date => {
                    return Err(ModelError::Validation(format!(
                        "schedulingRules[{i}]: blackout startDate must not be after endDate"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum PricingCondition {
    Always,
    Emergency,
    Weekend,
    AfterHours {
        #[serde(with = "hhmm")]
        start: NaiveTime,
        #[serde(with = "hhmm")]
        end: NaiveTime,
    },
    DayOfWeek { days: Vec<DayOfWeek> },
    RepeatCustomer,
}

/// `percentage` 以小数表示，0.10 即 +10%
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PriceModifier {
    Percentage(f64),
    Fixed(f64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRule {
    #[serde(default)]
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub condition: PricingCondition,
    pub modifier: PriceModifier,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct PricingRules(pub Vec<PricingRule>);

impl PricingRules {
    pub fn validate(&self) -> Result<(), ModelError> {
        for (i, rule) in self.0.iter().enumerate() {
            let value = match rule.modifier {
                PriceModifier::Percentage(v) | PriceModifier::Fixed(v) => v,
            };
            if !value.is_finite() {
                return Err(ModelError::Validation(format!("pricingRules[{i}]: modifier value must be a finite number")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_time_accepts_seconds() {
        assert_eq!(parse_time("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(parse_time("09:30:15").unwrap(), NaiveTime::from_hms_opt(9, 30, 15).unwrap());
        assert!(parse_time("9h30").is_err());
        assert!(parse_date("2024-02-30").is_err());
    }

    #[test]
    fn scheduling_rules_from_json() {
        let raw = serde_json::json!([
            { "name": "lead", "condition": { "type": "lead_time", "hours": 24 }, "action": "block" },
            { "condition": { "type": "blackout", "startDate": "2024-12-24", "endDate": "2024-12-26" },
              "action": "block", "message": "closed for holidays" },
            { "enabled": false, "condition": { "type": "time_of_day", "start": "07:00", "end": "09:00" },
              "action": "require_approval" }
        ]);
        let rules: SchedulingRules = serde_json::from_value(raw).unwrap();
        assert_eq!(rules.0.len(), 3);
        assert!(rules.0[0].enabled);
        assert_eq!(rules.0[0].condition, RuleCondition::LeadTime { hours: 24 });
        assert_eq!(rules.0[1].message.as_deref(), Some("closed for holidays"));
        assert!(!rules.0[2].enabled);
        assert_eq!(rules.0[2].action, RuleAction::RequireApproval);
    }

    #[test]
    fn pricing_modifier_shape() {
        let rule: PricingRule = serde_json::from_value(serde_json::json!({
            "name": "emergency",
            "condition": { "type": "emergency" },
            "modifier": { "type": "percentage", "value": 0.1 }
        }))
        .unwrap();
        assert_eq!(rule.modifier, PriceModifier::Percentage(0.1));
        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["modifier"]["type"], "percentage");
    }

    #[test]
    fn availability_missing_days_are_closed() {
        let week: WeeklyAvailability = serde_json::from_value(serde_json::json!({
            "monday": { "enabled": true, "slots": [{ "start": "08:00", "end": "12:00" }] }
        }))
        .unwrap();
        assert!(week.day(DayOfWeek::Monday).enabled);
        assert!(!week.day(DayOfWeek::Sunday).enabled);
        assert!(week.day(DayOfWeek::Monday).breaks.is_empty());
    }

    #[test]
    fn rule_documents_reject_out_of_range_values() {
        let rules: SchedulingRules = serde_json::from_value(serde_json::json!([
            { "condition": { "type": "lead_time", "hours": i64::MAX }, "action": "block" }
        ]))
        .unwrap();
        assert!(matches!(rules.validate(), Err(ModelError::Validation(_))));

        let rules = SchedulingRules(vec![SchedulingRule {
            name: String::new(),
            enabled: true,
            condition: RuleCondition::MaxAdvance { days: -1 },
            action: RuleAction::Block,
            message: None,
        }]);
        assert!(rules.validate().is_err());

        let rules: SchedulingRules = serde_json::from_value(serde_json::json!([
            { "condition": { "type": "blackout", "startDate": "2024-12-26", "endDate": "2024-12-24" }, "action": "block" }
        ]))
        .unwrap();
        assert!(rules.validate().is_err());

        let ok: SchedulingRules = serde_json::from_value(serde_json::json!([
            { "condition": { "type": "lead_time", "hours": 24 }, "action": "block" },
            { "condition": { "type": "max_advance", "days": 90 }, "action": "block" }
        ]))
        .unwrap();
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn availability_rejects_inverted_ranges() {
        let week: WeeklyAvailability = serde_json::from_value(serde_json::json!({
            "tuesday": { "enabled": true, "slots": [{ "start": "17:00", "end": "08:00" }] }
        }))
        .unwrap();
        let err = week.validate().unwrap_err();
        assert!(err.to_string().contains("tuesday"));

        let week: WeeklyAvailability = serde_json::from_value(serde_json::json!({
            "monday": { "enabled": true, "slots": [{ "start": "08:00", "end": "17:00" }],
                        "breaks": [{ "start": "12:00", "end": "12:00" }] }
        }))
        .unwrap();
        assert!(week.validate().is_err());
        assert!(WeeklyAvailability::default().validate().is_ok());
    }

    #[test]
    fn overnight_range_covers() {
        let r = TimeRange::new(parse_time("18:00").unwrap(), parse_time("07:00").unwrap());
        assert!(r.covers(parse_time("23:00").unwrap()));
        assert!(r.covers(parse_time("06:59").unwrap()));
        assert!(!r.covers(parse_time("12:00").unwrap()));
    }
}
