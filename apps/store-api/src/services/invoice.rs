//! # Invoice Service
//!
//! Invoice creation and retrieval. An invoice is generated only after its
//! payment exists, at most one per payment, and is immutable once created
//! except for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use tribune_core::validation::validate_entity_id;
use tribune_core::{CoreError, Invoice};
use tribune_db::repository::invoice::generate_invoice_number;
use tribune_db::DbError;

use crate::auth::Principal;
use crate::error::ApiError;
use crate::services::require_active_user;
use crate::state::AppState;

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub payment_id: String,
    pub legal_notice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub id: String,
    pub payment_id: String,
    pub order_id: String,
    pub user_id: String,
    pub number: String,
    pub legal_notice: String,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceView {
    fn from(invoice: Invoice) -> Self {
        InvoiceView {
            id: invoice.id,
            payment_id: invoice.payment_id,
            order_id: invoice.order_id,
            user_id: invoice.user_id,
            number: invoice.number,
            legal_notice: invoice.legal_notice,
            created_at: invoice.created_at,
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Creates an invoice for an existing payment.
pub async fn create(
    state: &AppState,
    principal: &Principal,
    request: CreateInvoiceRequest,
) -> Result<InvoiceView, ApiError> {
    debug!(user_id = %principal.id, payment_id = %request.payment_id, "create invoice requested");

    let user = require_active_user(&state.db, &principal.id).await?;
    validate_entity_id(&request.payment_id).map_err(CoreError::from)?;

    let payment = state
        .db
        .payments()
        .get_by_id(&request.payment_id)
        .await?
        .filter(|p| user.role.is_admin() || p.user_id == user.id)
        .ok_or_else(|| CoreError::PaymentNotFound(request.payment_id.clone()))?;

    state
        .db
        .orders()
        .get_by_id(&payment.order_id)
        .await?
        .ok_or_else(|| CoreError::OrderNotFound(payment.order_id.clone()))?;

    let invoices = state.db.invoices();
    if invoices.get_by_payment(&payment.id).await?.is_some() {
        return Err(CoreError::DuplicateInvoice(payment.id).into());
    }

    let now = Utc::now();
    let invoice = Invoice {
        id: Uuid::new_v4().to_string(),
        payment_id: payment.id.clone(),
        order_id: payment.order_id.clone(),
        user_id: payment.user_id.clone(),
        number: generate_invoice_number(),
        legal_notice: request.legal_notice.unwrap_or_default(),
        created_at: now,
        updated_at: now,
    };

    match invoices.insert(&invoice).await {
        Ok(()) => {}
        Err(DbError::UniqueViolation { .. }) => {
            return Err(CoreError::DuplicateInvoice(payment.id).into());
        }
        Err(e) => return Err(e.into()),
    }

    info!(invoice_id = %invoice.id, number = %invoice.number, "Invoice created");

    Ok(invoice.into())
}

/// Lists the caller's invoices; administrators see every invoice.
pub async fn list(state: &AppState, principal: &Principal) -> Result<Vec<InvoiceView>, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;

    let invoices = if user.role.is_admin() {
        state.db.invoices().list_all().await?
    } else {
        state.db.invoices().list_for_user(&user.id).await?
    };

    Ok(invoices.into_iter().map(InvoiceView::from).collect())
}

/// Gets one invoice; owners see their own, administrators see any.
pub async fn get(
    state: &AppState,
    principal: &Principal,
    invoice_id: &str,
) -> Result<InvoiceView, ApiError> {
    let user = require_active_user(&state.db, &principal.id).await?;
    validate_entity_id(invoice_id).map_err(CoreError::from)?;

    let invoice = state
        .db
        .invoices()
        .get_by_id(invoice_id)
        .await?
        .filter(|i| user.role.is_admin() || i.user_id == user.id)
        .ok_or_else(|| CoreError::InvoiceNotFound(invoice_id.to_string()))?;

    Ok(invoice.into())
}
