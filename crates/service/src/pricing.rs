//! 定价规则求值：按声明顺序把命中规则的修正叠加到当前价格上。
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use models::invoice::round_cents;
use models::schedule::{DayOfWeek, PriceModifier, PricingCondition, PricingRule, TimeRange};

#[derive(Clone, Copy, Debug)]
pub struct PricingContext {
    pub is_emergency: bool,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub is_repeat_customer: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub rule: String,
    pub amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub base_price: f64,
    pub final_price: f64,
    pub adjustments: Vec<Adjustment>,
}

fn matches(cond: &PricingCondition, ctx: &PricingContext) -> bool {
    let weekday = DayOfWeek::from(ctx.date.weekday());
    match cond {
        PricingCondition::Always => true,
        PricingCondition::Emergency => ctx.is_emergency,
        PricingCondition::Weekend => weekday.is_weekend(),
        PricingCondition::AfterHours { start, end } => TimeRange::new(*start, *end).covers(ctx.time),
        PricingCondition::DayOfWeek { days } => days.contains(&weekday),
        PricingCondition::RepeatCustomer => ctx.is_repeat_customer,
    }
}

/// # Examples
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use models::schedule::{PricingRule, PricingCondition, PriceModifier};
/// use service::pricing::{evaluate_price, PricingContext};
///
/// let rules = vec![PricingRule {
///     name: "emergency".into(),
///     enabled: true,
///     condition: PricingCondition::Emergency,
///     modifier: PriceModifier::Percentage(0.10),
/// }];
/// let ctx = PricingContext {
///     is_emergency: true,
///     date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
///     time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     is_repeat_customer: false,
/// };
/// assert_eq!(evaluate_price(100.0, &rules, &ctx).final_price, 110.0);
/// ```
pub fn evaluate_price(base_price: f64, rules: &[PricingRule], ctx: &PricingContext) -> PriceQuote {
    let mut price = base_price;
    let mut adjustments = Vec::new();
    for rule in rules.iter().filter(|r| r.enabled) {
        if !matches(&rule.condition, ctx) {
            continue;
        }
        let delta = match rule.modifier {
            PriceModifier::Percentage(p) => price * p,
            PriceModifier::Fixed(a) => a,
        };
        price += delta;
        adjustments.push(Adjustment { rule: rule.name.clone(), amount: round_cents(delta) });
    }
    PriceQuote {
        base_price,
        final_price: round_cents(price).max(0.0),
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(is_emergency: bool) -> PricingContext {
        PricingContext {
            is_emergency,
            // 周一上午
            date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            is_repeat_customer: false,
        }
    }

    fn rule(name: &str, condition: PricingCondition, modifier: PriceModifier) -> PricingRule {
        PricingRule { name: name.into(), enabled: true, condition, modifier }
    }

    #[test]
    fn emergency_ten_percent() {
        let rules = vec![rule("emergency", PricingCondition::Emergency, PriceModifier::Percentage(0.10))];
        let q = evaluate_price(100.0, &rules, &ctx(true));
        assert_eq!(q.final_price, 110.0);
        assert_eq!(q.adjustments, vec![Adjustment { rule: "emergency".into(), amount: 10.0 }]);
        assert_eq!(evaluate_price(100.0, &rules, &ctx(false)).final_price, 100.0);
    }

    #[test]
    fn fixed_surcharge() {
        let rules = vec![rule("trip", PricingCondition::Always, PriceModifier::Fixed(25.0))];
        assert_eq!(evaluate_price(100.0, &rules, &ctx(false)).final_price, 125.0);
    }

    #[test]
    fn declared_order_matters() {
        let pct = rule("pct", PricingCondition::Always, PriceModifier::Percentage(0.10));
        let fixed = rule("fixed", PricingCondition::Always, PriceModifier::Fixed(25.0));
        let a = evaluate_price(100.0, &[pct.clone(), fixed.clone()], &ctx(false));
        assert_eq!(a.final_price, 135.0);
        let b = evaluate_price(100.0, &[fixed, pct], &ctx(false));
        assert_eq!(b.final_price, 137.5);
        assert_eq!(b.adjustments[1].amount, 12.5);
    }

    #[test]
    fn conditions_and_clamp() {
        let mut c = ctx(false);
        c.date = NaiveDate::from_ymd_opt(2030, 1, 5).unwrap(); // 周六
        c.time = NaiveTime::from_hms_opt(19, 30, 0).unwrap();
        c.is_repeat_customer = true;
        let rules = vec![
            rule("weekend", PricingCondition::Weekend, PriceModifier::Fixed(20.0)),
            rule(
                "evening",
                PricingCondition::AfterHours {
                    start: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                    end: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
                },
                PriceModifier::Fixed(30.0),
            ),
            rule("loyal", PricingCondition::RepeatCustomer, PriceModifier::Percentage(-0.5)),
            rule("monday", PricingCondition::DayOfWeek { days: vec![DayOfWeek::Monday] }, PriceModifier::Fixed(99.0)),
        ];
        let q = evaluate_price(100.0, &rules, &c);
        assert_eq!(q.final_price, 75.0);
        assert_eq!(q.adjustments.len(), 3);

        let discount = vec![rule("free", PricingCondition::Always, PriceModifier::Fixed(-500.0))];
        assert_eq!(evaluate_price(100.0, &discount, &c).final_price, 0.0);
    }

    #[test]
    fn disabled_rule_ignored() {
        let mut r = rule("pct", PricingCondition::Always, PriceModifier::Percentage(0.5));
        r.enabled = false;
        assert_eq!(evaluate_price(80.0, &[r], &ctx(false)).final_price, 80.0);
    }
}
