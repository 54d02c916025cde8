use serde::Serialize;
use utoipa::ToSchema;

/// Pagination block of the response envelope. List endpoints that do not
/// paginate send it empty rather than omitting it.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_empty_serializes_with_null_fields() {
        let json = serde_json::to_value(Meta::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "page": null, "per_page": null, "total": null })
        );
    }

    #[test]
    fn success_wraps_data_and_message() {
        let resp = ApiResponse::success("ok", 7, Some(Meta::new(2, 10, 42)));
        assert_eq!(resp.message, "ok");
        assert_eq!(resp.data, Some(7));
        let meta = resp.meta.unwrap();
        assert_eq!(meta.page, Some(2));
        assert_eq!(meta.total, Some(42));
    }
}
