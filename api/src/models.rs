//! API models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use atelier_billing::CreditSummary;
use atelier_core::{
    Analysis, AnalysisKind, FundingSource, Plan, Role, Ticket, TicketCategory, TicketStatus, User,
};

/// Standard API envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorResponse>,
}

impl<T> ApiResponse<T> {
    /// Successful envelope.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope.
    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
            }),
        }
    }
}

/// Error payload inside the envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

// ============ Critique ============

/// Critique request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CritiqueRequest {
    /// Artwork image as a data URL or fetchable URL.
    pub image: String,
    pub media_id: Option<String>,
    pub style_id: Option<String>,
    pub scenario_id: Option<String>,
}

/// One past analysis row, as shown in the history tab.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisDto {
    pub id: Uuid,
    pub image_url: String,
    pub score: u32,
    pub kind: AnalysisKind,
    pub media_id: String,
    pub style_id: String,
    pub scenario_id: String,
    pub funded_by: Option<FundingSource>,
    pub created_at: DateTime<Utc>,
}

impl From<Analysis> for AnalysisDto {
    fn from(a: Analysis) -> Self {
        Self {
            id: a.id,
            image_url: a.image_url,
            score: a.score,
            kind: a.kind,
            media_id: a.media_id,
            style_id: a.style_id,
            scenario_id: a.scenario_id,
            funded_by: a.funded_by,
            created_at: a.created_at,
        }
    }
}

// ============ Credits ============

/// Allowance read model rendered by the client.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreditSummaryDto {
    pub credits: u32,
    pub subscription_credits: u32,
    #[schema(value_type = String)]
    pub plan: Plan,
    pub total: u32,
    pub is_trial_expired: bool,
    pub can_start_trial: bool,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

impl From<CreditSummary> for CreditSummaryDto {
    fn from(s: CreditSummary) -> Self {
        Self {
            credits: s.credits,
            subscription_credits: s.subscription_credits,
            plan: s.plan,
            total: s.total,
            is_trial_expired: s.is_trial_expired,
            can_start_trial: s.can_start_trial,
            trial_started_at: s.trial_started_at,
            subscription_expires_at: s.subscription_expires_at,
        }
    }
}

// ============ Tickets ============

/// Ticket creation request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketCreate {
    pub subject: String,
    pub content: String,
    #[schema(value_type = String)]
    pub category: TicketCategory,
}

/// Ticket row.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TicketDto {
    pub id: Uuid,
    pub subject: String,
    pub content: String,
    #[schema(value_type = String)]
    pub category: TicketCategory,
    #[schema(value_type = String)]
    pub status: TicketStatus,
    pub tags: Vec<String>,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketDto {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            subject: t.subject,
            content: t.content,
            category: t.category,
            status: t.status,
            tags: t.tags,
            reply: t.reply,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

/// Admin reply body.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketReply {
    pub reply: String,
}

/// Tag replacement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketTags {
    pub tags: Vec<String>,
}

// ============ Masters ============

/// Master-validation request body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MasterValidateRequest {
    pub name: String,
    pub medium: Option<String>,
}

// ============ Admin: users ============

/// Admin user-listing query parameters.
#[derive(Debug, Deserialize)]
pub struct UserListParams {
    /// Substring over name and email.
    pub query: Option<String>,
    pub role: Option<Role>,
    pub plan: Option<Plan>,
}

/// Admin user-creation body.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub plan: Option<Plan>,
    pub credits: Option<u32>,
    pub subscription_credits: Option<u32>,
}

/// Admin user-update body; absent fields are left untouched.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub plan: Option<Plan>,
    pub credits: Option<u32>,
    pub subscription_credits: Option<u32>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
}

/// Absolute purchased-credit adjustment.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreditAdjust {
    pub credits: u32,
}

/// Full user row for the back office.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub image: Option<String>,
    pub role: Role,
    pub plan: Plan,
    pub credits: u32,
    pub subscription_credits: u32,
    pub trial_started_at: Option<DateTime<Utc>>,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub login_method: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            image: u.image,
            role: u.role,
            plan: u.plan,
            credits: u.credits,
            subscription_credits: u.subscription_credits,
            trial_started_at: u.trial_started_at,
            subscription_expires_at: u.subscription_expires_at,
            login_method: u.login_method,
            last_login: u.last_login,
            created_at: u.created_at,
        }
    }
}

// ============ Admin: tickets & settings ============

/// Admin ticket-listing query parameters.
#[derive(Debug, Deserialize)]
pub struct TicketListParams {
    pub status: Option<TicketStatus>,
    pub tag: Option<String>,
}

/// Setting upsert body.
#[derive(Debug, Serialize, Deserialize)]
pub struct SettingUpsert {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub description: String,
}

/// Result of the bulk analysis reset.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResult {
    pub count: usize,
}
