use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use tracing::{debug, info};

use service::pagination::{Pagination, DEFAULT_LIMIT, MAX_LIMIT};
use service::voucher::domain::{
    CreateVoucherInput, CsvImportResult, ListParams, ListResponse, SortColumn, SortOrder, UpdateVoucherInput,
    Voucher,
};

use crate::{errors::ApiError, state::ServerState};

/// Raw query string values. Numbers are parsed leniently so a bad value falls
/// back to its default instead of failing the request.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Case-insensitive substring of the voucher code
    pub q: Option<String>,
    /// `expiry_date` (default) or `discount_percent`
    pub sort: Option<String>,
    /// `asc` (default) or `desc`
    pub order: Option<String>,
    /// Page size, 1..=100, default 10
    pub limit: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
}

impl ListQuery {
    pub fn into_list_params(self) -> ListParams {
        let int = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        let limit = match int(&self.limit) {
            Some(l) if l > 0 => l.min(MAX_LIMIT as i64),
            _ => DEFAULT_LIMIT as i64,
        };
        let page = int(&self.page).unwrap_or(1);
        let Pagination { limit, offset } = Pagination::from_page(page, limit);

        ListParams {
            search: self.q.unwrap_or_default().trim().to_string(),
            sort_by: SortColumn::from_param(self.sort.as_deref()),
            order: SortOrder::from_param(self.order.as_deref()),
            limit,
            offset,
        }
    }
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::Validation("invalid voucher id".into())),
    }
}

fn invalid_payload(_: JsonRejection) -> ApiError { ApiError::Validation("invalid request payload".into()) }

#[utoipa::path(
    get, path = "/vouchers", tag = "vouchers",
    params(ListQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Page of vouchers", body = crate::openapi::ListResponseDoc),
        (status = 401, description = "Unauthorized", body = crate::openapi::ErrorBody),
        (status = 500, description = "List Failed", body = crate::openapi::ErrorBody)
    )
)]
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse>, ApiError> {
    let Query(q) = query.map_err(|_| ApiError::Validation("invalid query parameters".into()))?;
    let params = q.into_list_params();
    debug!(search = %params.search, sort = params.sort_by.as_str(), limit = params.limit, offset = params.offset, "list_vouchers_request");
    Ok(Json(state.vouchers.list(params).await?))
}

#[utoipa::path(
    post, path = "/vouchers", tag = "vouchers",
    request_body = crate::openapi::VoucherInputDoc,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Created", body = crate::openapi::VoucherDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBody),
        (status = 409, description = "Duplicate voucher code", body = crate::openapi::ErrorBody)
    )
)]
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreateVoucherInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Voucher>), ApiError> {
    let Json(input) = payload.map_err(invalid_payload)?;
    let created = state.vouchers.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get, path = "/vouchers/{id}", tag = "vouchers",
    params(("id" = i64, Path, description = "Voucher ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "OK", body = crate::openapi::VoucherDoc),
        (status = 400, description = "Invalid id", body = crate::openapi::ErrorBody),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBody)
    )
)]
pub async fn get(State(state): State<ServerState>, Path(raw): Path<String>) -> Result<Json<Voucher>, ApiError> {
    let id = parse_id(&raw)?;
    Ok(Json(state.vouchers.get(id).await?))
}

#[utoipa::path(
    put, path = "/vouchers/{id}", tag = "vouchers",
    params(("id" = i64, Path, description = "Voucher ID")),
    request_body = crate::openapi::VoucherInputDoc,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Updated", body = crate::openapi::VoucherDoc),
        (status = 400, description = "Validation Error", body = crate::openapi::ErrorBody),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBody),
        (status = 409, description = "Duplicate voucher code", body = crate::openapi::ErrorBody)
    )
)]
pub async fn update(
    State(state): State<ServerState>,
    Path(raw): Path<String>,
    payload: Result<Json<UpdateVoucherInput>, JsonRejection>,
) -> Result<Json<Voucher>, ApiError> {
    let id = parse_id(&raw)?;
    let Json(input) = payload.map_err(invalid_payload)?;
    Ok(Json(state.vouchers.update(id, input).await?))
}

#[utoipa::path(
    delete, path = "/vouchers/{id}", tag = "vouchers",
    params(("id" = i64, Path, description = "Voucher ID")),
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Invalid id", body = crate::openapi::ErrorBody),
        (status = 404, description = "Not Found", body = crate::openapi::ErrorBody)
    )
)]
pub async fn delete(State(state): State<ServerState>, Path(raw): Path<String>) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw)?;
    state.vouchers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get, path = "/vouchers/export", tag = "vouchers",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 500, description = "Export Failed", body = crate::openapi::ErrorBody)
    )
)]
pub async fn export(State(state): State<ServerState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.vouchers.export().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=vouchers.csv"),
        ],
        body,
    ))
}

fn read_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::Validation("file size exceeds limit".into());
    }
    ApiError::Validation("failed to read file".into())
}

#[utoipa::path(
    post, path = "/vouchers/upload-csv", tag = "vouchers",
    request_body(content = crate::openapi::UploadCsvDoc, content_type = "multipart/form-data"),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Import summary", body = crate::openapi::CsvImportResultDoc),
        (status = 400, description = "Missing file, bad header or oversize upload", body = crate::openapi::ErrorBody)
    )
)]
pub async fn upload_csv(
    State(state): State<ServerState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CsvImportResult>, ApiError> {
    let mut multipart = multipart.map_err(|_| ApiError::Validation("file is required".into()))?;
    let max = state.vouchers.config().csv_max_bytes;

    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let mut buf = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(read_error)? {
            buf.extend_from_slice(&chunk);
            if buf.len() as u64 > max {
                return Err(ApiError::Validation("file size exceeds limit".into()));
            }
        }
        info!(file_name = field.file_name().unwrap_or("-"), bytes = buf.len(), "csv_upload_received");
        let result = state.vouchers.import_csv(buf.len() as u64, buf.as_slice()).await?;
        return Ok(Json(result));
    }

    Err(ApiError::Validation("file is required".into()))
}
