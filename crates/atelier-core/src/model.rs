//! Relational row types and shared vocabulary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription plan. Governs default allowances, trial eligibility and
/// the monthly price used by revenue reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free tier, eligible for a one-time 7-day trial.
    #[default]
    Free,
    /// Paid entry tier.
    Plus,
    /// Paid top tier.
    Pro,
}

impl Plan {
    /// True for the paid tiers.
    pub fn is_paid(&self) -> bool {
        !matches!(self, Self::Free)
    }

    /// Monthly list price (TWD).
    pub fn monthly_price(&self) -> Decimal {
        match self {
            Self::Free => dec!(0),
            Self::Plus => dec!(150),
            Self::Pro => dec!(300),
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Plus => write!(f, "plus"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular end user.
    #[default]
    User,
    /// Back-office administrator.
    Admin,
}

/// Which balance paid for a usage event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSource {
    /// Tier/trial-granted balance, zeroed when a free trial expires.
    Subscription,
    /// Balance bought or granted outside the subscription mechanism.
    Purchased,
}

/// Registered end user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub role: Role,
    pub plan: Plan,
    /// Purchased-credit balance.
    pub credits: u32,
    /// Subscription/trial-credit balance.
    pub subscription_credits: u32,
    /// Set at most once, and only while the plan is free.
    pub trial_started_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub login_method: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// New free-tier account with the registration defaults (both
    /// balances at zero, trial not yet started).
    pub fn register(email: impl Into<String>, name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            image: None,
            role: Role::User,
            plan: Plan::Free,
            credits: 0,
            subscription_credits: 0,
            trial_started_at: None,
            subscription_expires_at: None,
            login_method: None,
            last_login: None,
            created_at: at,
        }
    }
}

/// Critique flavor recorded on each analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Evaluated against general standards.
    General,
    /// Evaluated against a specific master/style reference.
    MasterStyle,
}

/// One completed critique: the usage event plus its artifact.
///
/// Created in the same atomic transaction as the balance decrement that
/// paid for it; `funded_by` records which balance that was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    /// Overall score, 0-100.
    pub score: u32,
    /// Full critique report document as returned by the model.
    pub result: serde_json::Value,
    pub kind: AnalysisKind,
    pub media_id: String,
    pub style_id: String,
    pub scenario_id: String,
    /// None when no balance held units at commit time (accepted race).
    pub funded_by: Option<FundingSource>,
    pub created_at: DateTime<Utc>,
}

/// Support-ticket category, as presented in the help center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    SystemError,
    CreditsIssue,
    AccountLogin,
    SubscriptionPayment,
    FeatureRequest,
    ReportViolation,
    Other,
}

impl TicketCategory {
    /// Display label (zh-TW, as shown in the client).
    pub fn label(&self) -> &'static str {
        match self {
            Self::SystemError => "系統異常",
            Self::CreditsIssue => "次數/點數問題",
            Self::AccountLogin => "帳號與登入",
            Self::SubscriptionPayment => "訂閱與付款",
            Self::FeatureRequest => "功能建議",
            Self::ReportViolation => "違規檢舉",
            Self::Other => "其他協助",
        }
    }
}

/// Support-ticket status. Replying closes the ticket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

/// Support ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub content: String,
    pub category: TicketCategory,
    pub status: TicketStatus,
    pub tags: Vec<String>,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Key/value system setting, upserted by the back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_prices() {
        assert_eq!(Plan::Free.monthly_price(), dec!(0));
        assert_eq!(Plan::Plus.monthly_price(), dec!(150));
        assert_eq!(Plan::Pro.monthly_price(), dec!(300));
        assert!(!Plan::Free.is_paid());
        assert!(Plan::Plus.is_paid());
    }

    #[test]
    fn plan_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Plan::Pro).unwrap(), "\"pro\"");
        let plan: Plan = serde_json::from_str("\"plus\"").unwrap();
        assert_eq!(plan, Plan::Plus);
    }

    #[test]
    fn registration_defaults() {
        let user = User::register("a@example.com", "A", Utc::now());
        assert_eq!(user.plan, Plan::Free);
        assert_eq!(user.credits, 0);
        assert_eq!(user.subscription_credits, 0);
        assert!(user.trial_started_at.is_none());
        assert_eq!(user.role, Role::User);
    }
}
