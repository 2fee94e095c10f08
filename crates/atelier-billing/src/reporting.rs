//! Back-office reporting.
//!
//! Aggregates the user and analysis tables into the dashboard read model:
//! activity over the trailing seven days, a per-day trend, and estimated
//! revenue figures.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use atelier_core::{Analysis, AnalysisKind, Plan, User};

/// Estimated API cost per analysis (TWD).
const COST_PER_ANALYSIS: Decimal = dec!(1);

/// Estimated revenue figures derived from plan counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueMetrics {
    pub monthly_revenue: Decimal,
    /// Rough daily figure: monthly revenue spread over 30 days.
    pub today_revenue: Decimal,
    pub revenue_plus: Decimal,
    pub revenue_pro: Decimal,
    pub arpu: Decimal,
    pub last7_paid_analyses: u64,
    pub last7_api_cost: Decimal,
    pub last7_gross_profit: Decimal,
}

/// One day of critique volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: u64,
    pub general: u64,
    pub master: u64,
    pub paid: u64,
}

/// Newest accounts shown on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentUser {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub provider: String,
}

/// The admin dashboard read model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: u64,
    pub total_analyses: u64,
    pub paid_users_plus: u64,
    pub paid_users_pro: u64,
    pub total_paid_users: u64,
    /// Sum of all outstanding balances across accounts.
    pub total_credits: u64,
    pub last7_total: u64,
    pub last7_unique_users: u64,
    pub last7_avg_usage: f64,
    /// Share of last-7-day analyses made by paid accounts, in percent.
    pub last7_paid_ratio: f64,
    /// Daily volume for the trailing seven days, oldest first.
    pub trend_7d: Vec<TrendPoint>,
    pub recent_users: Vec<RecentUser>,
    pub revenue: RevenueMetrics,
}

/// Build the dashboard from full table scans, as of `now`.
pub fn dashboard_stats(users: &[User], analyses: &[Analysis], now: DateTime<Utc>) -> DashboardStats {
    let since = now - Duration::days(7);

    let paid_users_plus = users.iter().filter(|u| u.plan == Plan::Plus).count() as u64;
    let paid_users_pro = users.iter().filter(|u| u.plan == Plan::Pro).count() as u64;

    let plan_of = |user_id: Uuid| users.iter().find(|u| u.id == user_id).map(|u| u.plan);
    let last7: Vec<&Analysis> = analyses.iter().filter(|a| a.created_at >= since).collect();

    let mut unique = std::collections::HashSet::new();
    for a in &last7 {
        unique.insert(a.user_id);
    }
    let last7_total = last7.len() as u64;
    let last7_unique_users = unique.len() as u64;
    let last7_avg_usage = if last7_unique_users > 0 {
        last7_total as f64 / last7_unique_users as f64
    } else {
        0.0
    };

    let paid_analyses = last7
        .iter()
        .filter(|a| plan_of(a.user_id).is_some_and(|p| p.is_paid()))
        .count() as u64;
    let last7_paid_ratio = if last7_total > 0 {
        paid_analyses as f64 * 100.0 / last7_total as f64
    } else {
        0.0
    };

    // Trailing seven calendar days, oldest first.
    let mut trend_7d: Vec<TrendPoint> = (0..7)
        .rev()
        .map(|back| TrendPoint {
            date: (now - Duration::days(back)).date_naive(),
            total: 0,
            general: 0,
            master: 0,
            paid: 0,
        })
        .collect();
    for a in &last7 {
        let date = a.created_at.date_naive();
        if let Some(point) = trend_7d.iter_mut().find(|p| p.date == date) {
            point.total += 1;
            match a.kind {
                AnalysisKind::General => point.general += 1,
                AnalysisKind::MasterStyle => point.master += 1,
            }
            if plan_of(a.user_id).is_some_and(|p| p.is_paid()) {
                point.paid += 1;
            }
        }
    }

    let revenue_plus = Plan::Plus.monthly_price() * Decimal::from(paid_users_plus);
    let revenue_pro = Plan::Pro.monthly_price() * Decimal::from(paid_users_pro);
    let monthly_revenue = revenue_plus + revenue_pro;
    let today_revenue = (monthly_revenue / dec!(30)).round();
    let arpu = if users.is_empty() {
        dec!(0)
    } else {
        (monthly_revenue / Decimal::from(users.len() as u64)).round()
    };
    let last7_api_cost = COST_PER_ANALYSIS * Decimal::from(last7_total);
    let last7_gross_profit = (monthly_revenue * dec!(7) / dec!(30) - last7_api_cost).round();

    let mut recent: Vec<&User> = users.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let recent_users = recent
        .into_iter()
        .take(5)
        .map(|u| RecentUser {
            id: u.id,
            name: u.name.clone(),
            image: u.image.clone(),
            created_at: u.created_at,
            provider: u.login_method.clone().unwrap_or_else(|| "email".into()),
        })
        .collect();

    let total_credits = users
        .iter()
        .map(|u| (u.credits + u.subscription_credits) as u64)
        .sum();

    DashboardStats {
        total_users: users.len() as u64,
        total_analyses: analyses.len() as u64,
        paid_users_plus,
        paid_users_pro,
        total_paid_users: paid_users_plus + paid_users_pro,
        total_credits,
        last7_total,
        last7_unique_users,
        last7_avg_usage,
        last7_paid_ratio,
        trend_7d,
        recent_users,
        revenue: RevenueMetrics {
            monthly_revenue,
            today_revenue,
            revenue_plus,
            revenue_pro,
            arpu,
            last7_paid_analyses: paid_analyses,
            last7_api_cost,
            last7_gross_profit,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn user(plan: Plan) -> User {
        let mut u = User::register(format!("{}@example.com", Uuid::new_v4()), "U", t0());
        u.plan = plan;
        u
    }

    fn analysis(user: &User, at: DateTime<Utc>, kind: AnalysisKind) -> Analysis {
        Analysis {
            id: Uuid::new_v4(),
            user_id: user.id,
            image_url: "data:image/png;base64,xxxx".into(),
            score: 80,
            result: serde_json::json!({}),
            kind,
            media_id: "watercolor".into(),
            style_id: "general".into(),
            scenario_id: "free_practice".into(),
            funded_by: None,
            created_at: at,
        }
    }

    #[test]
    fn revenue_comes_from_plan_counts() {
        let users = vec![user(Plan::Free), user(Plan::Plus), user(Plan::Pro), user(Plan::Pro)];
        let stats = dashboard_stats(&users, &[], t0());

        assert_eq!(stats.total_paid_users, 3);
        assert_eq!(stats.revenue.revenue_plus, dec!(150));
        assert_eq!(stats.revenue.revenue_pro, dec!(600));
        assert_eq!(stats.revenue.monthly_revenue, dec!(750));
        assert_eq!(stats.revenue.today_revenue, dec!(25));
        // 750 / 4 users, rounded.
        assert_eq!(stats.revenue.arpu, dec!(188));
    }

    #[test]
    fn seven_day_window_and_trend() {
        let free = user(Plan::Free);
        let pro = user(Plan::Pro);
        let users = vec![free.clone(), pro.clone()];

        let analyses = vec![
            analysis(&free, t0() - Duration::days(1), AnalysisKind::General),
            analysis(&pro, t0() - Duration::days(1), AnalysisKind::MasterStyle),
            analysis(&pro, t0() - Duration::days(2), AnalysisKind::General),
            // Outside the window; counted in totals only.
            analysis(&free, t0() - Duration::days(20), AnalysisKind::General),
        ];

        let stats = dashboard_stats(&users, &analyses, t0());
        assert_eq!(stats.total_analyses, 4);
        assert_eq!(stats.last7_total, 3);
        assert_eq!(stats.last7_unique_users, 2);
        assert_eq!(stats.last7_avg_usage, 1.5);
        assert_eq!(stats.revenue.last7_paid_analyses, 2);
        assert!((stats.last7_paid_ratio - 66.6).abs() < 1.0);

        assert_eq!(stats.trend_7d.len(), 7);
        let yesterday = stats
            .trend_7d
            .iter()
            .find(|p| p.date == (t0() - Duration::days(1)).date_naive())
            .unwrap();
        assert_eq!(yesterday.total, 2);
        assert_eq!(yesterday.master, 1);
        assert_eq!(yesterday.paid, 1);
    }

    #[test]
    fn empty_tables_produce_zeroes() {
        let stats = dashboard_stats(&[], &[], t0());
        assert_eq!(stats.last7_avg_usage, 0.0);
        assert_eq!(stats.last7_paid_ratio, 0.0);
        assert_eq!(stats.revenue.arpu, dec!(0));
        assert_eq!(stats.trend_7d.len(), 7);
    }
}
