use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::models::NewTransaction;
use crate::middleware::AuthUser;
use crate::service::statement_pdf::{StatementHeader, render_statement_pdf};
use crate::service::statements::{
    RawStatement, Statement, correct_discrepancies, extract_pdf_text, net_change,
    parse_statement_csv, parse_statement_text, write_statements_csv,
};
use crate::{BridgeError, router::BridgeState};

struct Upload {
    filename: String,
    bytes: Bytes,
}

/// Pull the `file` field out of a multipart body and check its extension.
async fn read_upload(mut multipart: Multipart, extension: &str) -> Result<Upload, BridgeError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        upload = Some(Upload { filename, bytes });
        break;
    }

    let upload = upload.ok_or_else(|| BridgeError::validation("No file part"))?;
    if upload.filename.is_empty() {
        return Err(BridgeError::validation("No selected file"));
    }
    let matches = Path::new(&upload.filename)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if !matches {
        return Err(BridgeError::validation(format!(
            "Invalid file format. Only {} allowed",
            extension.to_ascii_uppercase()
        )));
    }
    Ok(upload)
}

/// Basename of a client-supplied filename with anything unusual replaced.
fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let cleaned: String = base
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

async fn store_upload(state: &BridgeState, upload: &Upload) -> Result<String, BridgeError> {
    let stored = format!("{}-{}", Uuid::new_v4(), sanitize_filename(&upload.filename));
    let path = state.config.upload_folder.join(&stored);
    tokio::fs::write(&path, &upload.bytes).await?;
    debug!(path = %path.display(), size = upload.bytes.len(), "upload saved");
    Ok(stored)
}

/// Remove the saved upload when nothing was imported from it.
async fn keep_or_discard(
    state: &BridgeState,
    stored: &str,
    summary: Result<ImportSummary, BridgeError>,
) -> Result<ImportSummary, BridgeError> {
    if summary.is_err() {
        let path = state.config.upload_folder.join(stored);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "failed to remove rejected upload");
        }
    }
    summary
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    pub message: String,
    pub filename: String,
    pub imported: usize,
    pub statements: Vec<Statement>,
    pub global_balance: f64,
}

/// Correct, screen, store and apply parsed lines to the reserve.
async fn import(
    state: &BridgeState,
    user: &AuthUser,
    filename: String,
    raw: Vec<RawStatement>,
) -> Result<ImportSummary, BridgeError> {
    let statements = correct_discrepancies(raw);
    let rows: Vec<NewTransaction> = statements
        .iter()
        .cloned()
        .map(|s| {
            let fraudulent = state
                .screening
                .detect_fraudulent_transaction(&s.description, s.amount);
            s.into_new_transaction(!fraudulent)
        })
        .collect();

    let (stored, global_balance) = state
        .ledger
        .import(user.id, rows, net_change(&statements))
        .await?;
    info!(
        user_id = user.id,
        %filename,
        imported = stored.len(),
        global_balance,
        "statement imported"
    );

    Ok(ImportSummary {
        message: "File uploaded and processed successfully".to_string(),
        filename,
        imported: stored.len(),
        statements,
        global_balance,
    })
}

pub async fn upload_pdf(
    State(state): State<BridgeState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, BridgeError> {
    let upload = read_upload(multipart, "pdf").await?;
    let filename = store_upload(&state, &upload).await?;
    let summary: Result<ImportSummary, BridgeError> = async {
        let text = extract_pdf_text(upload.bytes.to_vec()).await?;
        import(&state, &user, filename.clone(), parse_statement_text(&text)).await
    }
    .await;
    Ok(Json(keep_or_discard(&state, &filename, summary).await?))
}

pub async fn upload_csv(
    State(state): State<BridgeState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<ImportSummary>, BridgeError> {
    let upload = read_upload(multipart, "csv").await?;
    let filename = store_upload(&state, &upload).await?;
    let summary: Result<ImportSummary, BridgeError> = async {
        let raw = parse_statement_csv(&upload.bytes[..])
            .map_err(|e| BridgeError::Statement(e.to_string()))?;
        import(&state, &user, filename.clone(), raw).await
    }
    .await;
    Ok(Json(keep_or_discard(&state, &filename, summary).await?))
}

pub async fn export_csv(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<impl IntoResponse, BridgeError> {
    let rows = state.storage.list_transactions(user.id).await?;
    let body = write_statements_csv(&rows)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"statements.csv\"",
            ),
        ],
        body,
    ))
}

pub async fn export_pdf(
    State(state): State<BridgeState>,
    user: AuthUser,
) -> Result<impl IntoResponse, BridgeError> {
    let rows = state.storage.list_transactions(user.id).await?;
    let account_number = state
        .storage
        .get_linked_item(user.id)
        .await?
        .and_then(|item| {
            item.ach_details
                .first()
                .and_then(|ach| ach.get("account"))
                .and_then(|a| a.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "N/A".to_string());

    let holder = user.username.clone();
    let body = tokio::task::spawn_blocking(move || {
        render_statement_pdf(
            &StatementHeader {
                holder: &holder,
                account_number: &account_number,
            },
            &rows,
        )
    })
    .await
    .map_err(|e| BridgeError::PdfRender(e.to_string()))??;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"statement.pdf\"",
            ),
        ],
        body,
    ))
}
