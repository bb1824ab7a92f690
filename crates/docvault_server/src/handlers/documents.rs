//! Document handlers.
//!
//! POST   /documents                                      — multipart create
//! GET    /documents                                      — list with search/tag filters
//! GET    /documents/:id                                  — details
//! PUT    /documents/:id                                  — multipart update, optional new version
//! DELETE /documents/:id                                  — referential cleanup + file removal
//! GET    /documents/:id/versions                         — version history
//! PUT    /documents/:id/versions/:version_id/set-current — promote a version
//! GET    /documents/:id/download                         — current version bytes
//! GET    /documents/:id/versions/:version_id/download    — specific version bytes
//! POST   /documents/:id/tags                             — associate tag names

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    body::Body,
    extract::{Multipart, Path, Query},
    http::header,
    response::Response,
    Extension, Json,
};
use docvault_core::{
    error::DocVaultError,
    principal::Principal,
    proto::{
        AddTagsRequest, CreateDocumentInput, DocumentResponse, DownloadPayload, FileUpload,
        ListDocumentsQuery, MessageResponse, UpdateDocumentInput,
    },
    service::DocVaultService,
    types::VersionDetails,
};
use uuid::Uuid;

use crate::{config::UploadPolicy, error::AppError};

pub async fn create(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(principal): Extension<Principal>,
    Extension(policy): Extension<UploadPolicy>,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>, AppError> {
    let form = DocumentForm::parse(&mut multipart).await?;
    let title = form.require_title()?;
    let file = form
        .file
        .ok_or_else(|| DocVaultError::InvalidInput("file field is required".into()))?;
    policy.check(&file)?;

    let input = CreateDocumentInput {
        title,
        description: form.description,
        tags: form.tags,
        file,
    };
    Ok(Json(service.create_document(&principal, input).await?))
}

pub async fn list(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentResponse>>, AppError> {
    Ok(Json(service.list_documents(query).await?))
}

pub async fn get_one(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    Ok(Json(service.get_document(document_id).await?))
}

pub async fn update(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(principal): Extension<Principal>,
    Extension(policy): Extension<UploadPolicy>,
    Path(document_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<DocumentResponse>, AppError> {
    let form = DocumentForm::parse(&mut multipart).await?;
    let title = form.require_title()?;
    if let Some(file) = &form.file {
        policy.check(file)?;
    }

    let input = UpdateDocumentInput {
        title,
        description: form.description,
        tags: form.tags,
        file: form.file,
    };
    Ok(Json(
        service.update_document(&principal, document_id, input).await?,
    ))
}

pub async fn delete(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(principal): Extension<Principal>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    service.delete_document(&principal, document_id).await?;
    Ok(Json(MessageResponse {
        message: "Document deleted successfully".into(),
    }))
}

pub async fn list_versions(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<VersionDetails>>, AppError> {
    Ok(Json(service.list_versions(document_id).await?))
}

pub async fn set_current(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Path((document_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessageResponse>, AppError> {
    service.set_current_version(document_id, version_id).await?;
    Ok(Json(MessageResponse {
        message: "Current version updated successfully".into(),
    }))
}

pub async fn download(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(principal): Extension<Principal>,
    Path(document_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let payload = service.download(&principal, document_id, None).await?;
    file_response(payload)
}

pub async fn download_version(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(principal): Extension<Principal>,
    Path((document_id, version_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let payload = service
        .download(&principal, document_id, Some(version_id))
        .await?;
    file_response(payload)
}

pub async fn add_tags(
    Extension(service): Extension<Arc<dyn DocVaultService>>,
    Extension(principal): Extension<Principal>,
    Path(document_id): Path<Uuid>,
    Json(req): Json<AddTagsRequest>,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(
        service.add_tags(&principal, document_id, req.tags).await?,
    ))
}

// ── Multipart plumbing ────────────────────────────────────────

/// Fields shared by the create and update forms. `tags` is a single
/// comma-separated field, matching the upload clients.
#[derive(Default)]
struct DocumentForm {
    title: Option<String>,
    description: Option<String>,
    tags: Vec<String>,
    file: Option<FileUpload>,
}

impl DocumentForm {
    async fn parse(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("title") => {
                    form.title = Some(field.text().await.map_err(bad_multipart)?);
                }
                Some("description") => {
                    let text = field.text().await.map_err(bad_multipart)?;
                    if !text.is_empty() {
                        form.description = Some(text);
                    }
                }
                Some("tags") => {
                    form.tags = split_tags(&field.text().await.map_err(bad_multipart)?);
                }
                Some("file") => {
                    let file_name = field
                        .file_name()
                        .filter(|n| !n.is_empty())
                        .unwrap_or("upload.bin")
                        .to_string();
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await.map_err(bad_multipart)?;
                    form.file = Some(FileUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                _ => {}
            }
        }

        Ok(form)
    }

    fn require_title(&self) -> Result<String, AppError> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .ok_or_else(|| DocVaultError::InvalidInput("title field is required".into()).into())
    }
}

fn bad_multipart(e: axum::extract::multipart::MultipartError) -> AppError {
    DocVaultError::InvalidInput(format!("malformed multipart body: {e}")).into()
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn file_response(payload: DownloadPayload) -> Result<Response, AppError> {
    let content_type = payload
        .content_type
        .unwrap_or_else(|| "application/octet-stream".into());
    // Strip quotes rather than escape them; filenames with quotes are rare
    // and escaping rules differ per client.
    let filename = payload.file_name.replace('"', "");

    Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from(payload.bytes))
        .map_err(|e| AppError::from(DocVaultError::Internal(anyhow!(e))))
}
