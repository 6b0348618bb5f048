//! Lead repository — PostgreSQL queries for the persisted lead store.
//!
//! Every function takes a `&PgPool` and returns `Result<T, AppError>`.
//! Queries use parameterized statements (sqlx). Lead creation runs in a
//! transaction; all other writes are single statements.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use hermes_core::lead::LeadSubmission;

use crate::error::AppError;
use crate::models::{LeadRecord, LeadStats, SubmissionMetadata, UpdateLeadRequest};

/// Connect to PostgreSQL and run the initial migration.
///
/// Creates the `leads` table and its indexes if they do not exist.
///
/// # Errors
///
/// Returns [`AppError::DatabaseUnavailable`] if the connection or
/// migration fails.
pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| AppError::DatabaseUnavailable(format!("connect failed: {e}")))?;

    migrate(&pool).await?;

    Ok(pool)
}

/// Run the schema migration on an existing pool.
///
/// # Errors
///
/// Returns [`AppError::DatabaseUnavailable`] if a statement fails.
pub async fn migrate(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query(
        r"CREATE TABLE IF NOT EXISTS leads (
            id                  BIGSERIAL PRIMARY KEY,
            lead_id             TEXT NOT NULL UNIQUE,
            first_name          TEXT NOT NULL,
            last_name           TEXT NOT NULL,
            email               TEXT NOT NULL,
            country             TEXT NOT NULL,
            phone_number        TEXT NOT NULL,
            contact_role        TEXT,
            problem_description TEXT NOT NULL,
            company_name        TEXT,
            company_size        TEXT,
            service_urgency     TEXT NOT NULL,
            agree_to_terms      BOOLEAN NOT NULL,
            privacy_consent     BOOLEAN NOT NULL,
            marketing_opt_in    BOOLEAN NOT NULL DEFAULT FALSE,
            captcha_token       TEXT,
            user_agent          TEXT,
            ip_address          TEXT,
            n8n_success         BOOLEAN,
            n8n_retry_count     INTEGER NOT NULL DEFAULT 0,
            n8n_response        JSONB,
            n8n_error           TEXT,
            webhook_sent_at     TIMESTAMPTZ,
            webhook_response_at TIMESTAMPTZ,
            status              TEXT NOT NULL DEFAULT 'new',
            assigned_to         TEXT,
            notes               TEXT,
            lead_score          INTEGER,
            priority            INTEGER,
            tags                TEXT[] NOT NULL DEFAULT '{}',
            created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| AppError::DatabaseUnavailable(format!("migration failed: {e}")))?;

    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_leads_created_at ON leads (created_at)",
        "CREATE INDEX IF NOT EXISTS idx_leads_status ON leads (status)",
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| AppError::DatabaseUnavailable(format!("index creation failed: {e}")))?;
    }

    Ok(())
}

/// Persist a new lead inside a transaction.
///
/// Resubmission creates a new row every time — there is deliberately no
/// de-duplication on email or phone.
///
/// # Errors
///
/// Any failure here is the hard-failure case and maps to
/// [`AppError::DatabaseUnavailable`] (HTTP 503).
pub async fn create_lead(
    pool: &PgPool,
    lead_id: &str,
    submission: &LeadSubmission,
    metadata: &SubmissionMetadata,
) -> Result<LeadRecord, AppError> {
    let unavailable = |e: sqlx::Error| AppError::DatabaseUnavailable(e.to_string());

    let mut tx = pool.begin().await.map_err(unavailable)?;

    let record = sqlx::query_as::<_, LeadRecord>(
        r"INSERT INTO leads (
            lead_id, first_name, last_name, email, country, phone_number,
            contact_role, problem_description, company_name, company_size,
            service_urgency, agree_to_terms, privacy_consent, marketing_opt_in,
            captcha_token, user_agent, ip_address
          )
          VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
          RETURNING *",
    )
    .bind(lead_id)
    .bind(&submission.first_name)
    .bind(&submission.last_name)
    .bind(&submission.email)
    .bind(&submission.country)
    .bind(&submission.phone_number)
    .bind(&submission.role)
    .bind(&submission.problem_description)
    .bind(&submission.company_name)
    .bind(&submission.company_size)
    .bind(submission.service_urgency.to_string())
    .bind(submission.agree_to_terms)
    .bind(submission.privacy_consent)
    .bind(submission.marketing_opt_in)
    .bind(
        metadata
            .captcha_token
            .as_deref()
            .or(submission.captcha_token.as_deref()),
    )
    .bind(&metadata.user_agent)
    .bind(&metadata.ip_address)
    .fetch_one(&mut *tx)
    .await
    .map_err(unavailable)?;

    tx.commit().await.map_err(unavailable)?;

    Ok(record)
}

/// Fetch a lead by raw path id: numeric `id` first, else the string
/// `lead_id`.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when no row matches.
pub async fn get_lead(pool: &PgPool, raw_id: &str) -> Result<LeadRecord, AppError> {
    if let Ok(numeric) = raw_id.parse::<i64>() {
        if let Some(record) =
            sqlx::query_as::<_, LeadRecord>("SELECT * FROM leads WHERE id = $1")
                .bind(numeric)
                .fetch_optional(pool)
                .await?
        {
            return Ok(record);
        }
    }

    sqlx::query_as::<_, LeadRecord>("SELECT * FROM leads WHERE lead_id = $1")
        .bind(raw_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("lead '{raw_id}' not found")))
}

/// Stamp the webhook dispatch timestamp on a lead.
///
/// # Errors
///
/// Returns [`AppError::Internal`] on database failure.
pub async fn mark_webhook_sent(pool: &PgPool, id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE leads SET webhook_sent_at = now(), updated_at = now() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Record the webhook outcome on a lead.
///
/// # Errors
///
/// Returns [`AppError::Internal`] on database failure.
pub async fn record_webhook_outcome(
    pool: &PgPool,
    id: i64,
    success: bool,
    response: Option<&serde_json::Value>,
    error: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r"UPDATE leads SET
            n8n_success = $2,
            n8n_response = $3,
            n8n_error = $4,
            webhook_response_at = now(),
            updated_at = now()
          WHERE id = $1",
    )
    .bind(id)
    .bind(success)
    .bind(response)
    .bind(error)
    .execute(pool)
    .await?;

    Ok(())
}

/// Increment the advisory retry counter. Nothing in-process consumes it;
/// it exists for an operator or external redispatch process.
///
/// # Errors
///
/// Returns [`AppError::Internal`] on database failure.
pub async fn increment_retry_count(pool: &PgPool, id: i64) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE leads SET n8n_retry_count = n8n_retry_count + 1, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Apply a manual workflow update; absent fields keep their value.
///
/// # Errors
///
/// Returns [`AppError::NotFound`] when no row matches.
pub async fn update_workflow(
    pool: &PgPool,
    id: i64,
    update: &UpdateLeadRequest,
) -> Result<LeadRecord, AppError> {
    sqlx::query_as::<_, LeadRecord>(
        r"UPDATE leads SET
            status = COALESCE($2, status),
            assigned_to = COALESCE($3, assigned_to),
            notes = COALESCE($4, notes),
            lead_score = COALESCE($5, lead_score),
            priority = COALESCE($6, priority),
            tags = COALESCE($7, tags),
            updated_at = now()
          WHERE id = $1
          RETURNING *",
    )
    .bind(id)
    .bind(&update.status)
    .bind(&update.assigned_to)
    .bind(&update.notes)
    .bind(update.lead_score)
    .bind(update.priority)
    .bind(&update.tags)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("lead {id} not found")))
}

/// Aggregate statistics for the health endpoint.
///
/// # Errors
///
/// Returns [`AppError::Internal`] on database failure.
pub async fn stats(pool: &PgPool) -> Result<LeadStats, AppError> {
    let (total, new, dispatched, failed): (i64, i64, i64, i64) = sqlx::query_as(
        r"SELECT
            COUNT(*),
            COUNT(*) FILTER (WHERE status = 'new'),
            COUNT(*) FILTER (WHERE n8n_success IS NOT NULL),
            COUNT(*) FILTER (WHERE n8n_success = FALSE)
          FROM leads",
    )
    .fetch_one(pool)
    .await?;

    Ok(LeadStats {
        total_leads: total,
        new_leads: new,
        failed_webhooks: failed,
        webhook_success_rate: success_rate(dispatched, failed),
    })
}

/// Connectivity probe.
///
/// # Errors
///
/// Returns the mapped database error when the store is unreachable.
pub async fn ping(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Delete leads whose `created_at` is older than the retention window.
/// Returns the number of purged rows.
///
/// # Errors
///
/// Returns [`AppError::Internal`] on database failure.
pub async fn purge_expired(pool: &PgPool, window_days: u32) -> Result<u64, AppError> {
    let result = sqlx::query(
        "DELETE FROM leads WHERE created_at < now() - make_interval(days => $1)",
    )
    .bind(i32::try_from(window_days).unwrap_or(i32::MAX))
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delivery success rate in percent; 100 when nothing was dispatched.
fn success_rate(dispatched: i64, failed: i64) -> f64 {
    if dispatched <= 0 {
        return 100.0;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        (dispatched - failed) as f64 / dispatched as f64 * 100.0
    }
}
