//! 排期可用性判定与可选时段生成。
//!
//! 判定顺序固定，先失败者胜出：
//! 1. 当天是否开放
//! 2. `[start, start + duration)` 是否落在某个营业时段内
//! 3. 是否与休息时段重叠（休息时段优先于任何规则）
//! 4. 按声明顺序执行已启用的规则
//!
//! 所有时间按业务本地的墙上时间处理，`now` 由调用方传入。
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::Serialize;
use tracing::debug;

use models::schedule::{hhmm, DayOfWeek, RuleAction, RuleCondition, SchedulingRule, WeeklyAvailability};

pub const OUTSIDE_HOURS: &str = "outside available hours";
pub const BREAK_CONFLICT: &str = "conflicts with scheduled break";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDecision {
    pub available: bool,
    pub requires_approval: bool,
    pub reason: String,
}

impl AvailabilityDecision {
    fn unavailable(reason: impl Into<String>) -> Self {
        Self { available: false, requires_approval: false, reason: reason.into() }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

impl SlotRequest {
    /// 结束时刻；跨越午夜时返回 None
    pub fn end(&self) -> Option<NaiveTime> {
        let (end, wrapped) = self.start.overflowing_add_signed(Duration::minutes(self.duration_minutes as i64));
        if wrapped != 0 {
            // 恰好结束于 24:00 视为越界
            return None;
        }
        Some(end)
    }

    fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.start)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub requires_approval: bool,
}

pub fn check_availability(
    availability: &WeeklyAvailability,
    rules: &[SchedulingRule],
    req: &SlotRequest,
    now: NaiveDateTime,
) -> AvailabilityDecision {
    let weekday = DayOfWeek::from(req.date.weekday());
    let day = availability.day(weekday);
    if !day.enabled {
        return AvailabilityDecision::unavailable(format!("not available on {}", weekday.as_str()));
    }

    let end = match req.end() {
        Some(end) if req.duration_minutes > 0 => end,
        _ => return AvailabilityDecision::unavailable(OUTSIDE_HOURS),
    };
    if !day.slots.iter().any(|slot| slot.contains(req.start, end)) {
        return AvailabilityDecision::unavailable(OUTSIDE_HOURS);
    }

    if day.breaks.iter().any(|b| b.overlaps(req.start, end)) {
        return AvailabilityDecision::unavailable(BREAK_CONFLICT);
    }

    let mut requires_approval = false;
    for rule in rules.iter().filter(|r| r.enabled) {
        let matched = condition_matches(&rule.condition, req, weekday, now);
        match rule.action {
            RuleAction::Block if matched => {
                debug!(rule = %rule.name, "blocked by scheduling rule");
                return AvailabilityDecision::unavailable(
                    rule.message.clone().unwrap_or_else(|| block_reason(&rule.condition)),
                );
            }
            RuleAction::Allow if !matched => {
                debug!(rule = %rule.name, "outside allow rule");
                return AvailabilityDecision::unavailable(
                    rule.message.clone().unwrap_or_else(|| "outside allowed booking window".to_string()),
                );
            }
            RuleAction::RequireApproval if matched => requires_approval = true,
            _ => {}
        }
    }

    AvailabilityDecision {
        available: true,
        requires_approval,
        reason: if requires_approval { "requires approval".into() } else { "available".into() },
    }
}

fn condition_matches(cond: &RuleCondition, req: &SlotRequest, weekday: DayOfWeek, now: NaiveDateTime) -> bool {
    match cond {
        RuleCondition::TimeOfDay { start, end } => {
            models::schedule::TimeRange::new(*start, *end).covers(req.start)
        }
        RuleCondition::DayOfWeek { days } => days.contains(&weekday),
        // 超出 TimeDelta 范围的取值按无穷大/无穷小处理，不 panic
        RuleCondition::LeadTime { hours } => {
            TimeDelta::try_hours(*hours).map_or(*hours > 0, |lead| req.starts_at() - now < lead)
        }
        RuleCondition::Blackout { start_date, end_date } => req.date >= *start_date && req.date <= *end_date,
        RuleCondition::MaxAdvance { days } => {
            TimeDelta::try_days(*days).map_or(*days < 0, |max| req.starts_at() - now > max)
        }
    }
}

fn block_reason(cond: &RuleCondition) -> String {
    match cond {
        RuleCondition::TimeOfDay { .. } => "not available at this time".into(),
        RuleCondition::DayOfWeek { .. } => "not available on this day".into(),
        RuleCondition::LeadTime { hours } => format!("requires at least {} hours notice", hours),
        RuleCondition::Blackout { .. } => "date is blacked out".into(),
        RuleCondition::MaxAdvance { days } => format!("cannot book more than {} days in advance", days),
    }
}

/// 遍历当天每个营业时段，按步长生成候选，剔除不可用或与已有预约重叠者。
///
/// `step_minutes` 为空时按服务时长步进；`booked` 为同一服务未取消预约的 `[start, end)`。
pub fn available_slots(
    availability: &WeeklyAvailability,
    rules: &[SchedulingRule],
    date: NaiveDate,
    duration_minutes: u32,
    step_minutes: Option<u32>,
    booked: &[(NaiveTime, NaiveTime)],
    now: NaiveDateTime,
) -> Vec<AvailableSlot> {
    let day = availability.day(DayOfWeek::from(date.weekday()));
    if !day.enabled || duration_minutes == 0 {
        return Vec::new();
    }
    let step = Duration::minutes(step_minutes.unwrap_or(duration_minutes).max(1) as i64);

    let mut out: Vec<AvailableSlot> = Vec::new();
    for slot in &day.slots {
        let mut cursor = slot.start;
        loop {
            let req = SlotRequest { date, start: cursor, duration_minutes };
            let Some(end) = req.end() else { break };
            if end > slot.end {
                break;
            }
            let decision = check_availability(availability, rules, &req, now);
            let clashes = booked.iter().any(|(s, e)| cursor < *e && *s < end);
            if decision.available && !clashes {
                out.push(AvailableSlot { start_time: cursor, end_time: end, requires_approval: decision.requires_approval });
            }
            let (next, wrapped) = cursor.overflowing_add_signed(step);
            if wrapped != 0 || next <= cursor {
                break;
            }
            cursor = next;
        }
    }
    out.sort_by_key(|s| s.start_time);
    out.dedup_by_key(|s| s.start_time);
    out
}
