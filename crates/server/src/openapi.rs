use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ErrorBody { pub error: String }

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct LoginResponseDoc { pub token: String }

#[derive(utoipa::ToSchema)]
pub struct VoucherInputDoc {
    pub voucher_code: String,
    #[schema(minimum = 1, maximum = 100)]
    pub discount_percent: i32,
    #[schema(example = "2025-12-31")]
    pub expiry_date: String,
}

#[derive(utoipa::ToSchema)]
pub struct VoucherDoc {
    pub id: i64,
    pub voucher_code: String,
    pub discount_percent: i32,
    #[schema(example = "2025-12-31")]
    pub expiry_date: String,
    #[schema(example = "2025-01-01T00:00:00Z")]
    pub created_at: String,
    #[schema(example = "2025-01-01T00:00:00Z")]
    pub updated_at: String,
}

#[derive(utoipa::ToSchema)]
pub struct PaginationDoc { pub page: u64, pub limit: u64, pub total: u64, pub total_pages: u64 }

#[derive(utoipa::ToSchema)]
pub struct ListResponseDoc { pub data: Vec<VoucherDoc>, pub pagination: PaginationDoc }

#[derive(utoipa::ToSchema)]
pub struct CsvImportStatusDoc { pub row: usize, pub reason: String }

#[derive(utoipa::ToSchema)]
pub struct CsvImportResultDoc {
    pub total_rows: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub failures: Vec<CsvImportStatusDoc>,
}

#[derive(utoipa::ToSchema)]
pub struct UploadCsvDoc {
    /// CSV with header `voucher_code,discount_percent,expiry_date`
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::vouchers::list,
        crate::routes::vouchers::create,
        crate::routes::vouchers::get,
        crate::routes::vouchers::update,
        crate::routes::vouchers::delete,
        crate::routes::vouchers::export,
        crate::routes::vouchers::upload_csv,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            LoginRequest,
            LoginResponseDoc,
            VoucherInputDoc,
            VoucherDoc,
            PaginationDoc,
            ListResponseDoc,
            CsvImportStatusDoc,
            CsvImportResultDoc,
            UploadCsvDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "vouchers")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_voucher_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for p in ["/health", "/login", "/vouchers", "/vouchers/{id}", "/vouchers/export", "/vouchers/upload-csv"] {
            assert!(paths.iter().any(|k| k.as_str() == p), "missing {}", p);
        }
    }
}
