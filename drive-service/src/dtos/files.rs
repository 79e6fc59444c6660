use crate::services::drive::{ListOptions, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::models::{SortField, SortOrder};
use validator::{Validate, ValidationError};

/// Query string of the folder listing endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilesParams {
    pub parent_id: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListFilesParams {
    /// Unknown sort values are rejected; page and limit are clamped.
    pub fn list_options(&self) -> Result<ListOptions, AppError> {
        let sort_by = match self.sort_by.as_deref() {
            Some(raw) => raw
                .parse::<SortField>()
                .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?,
            None => SortField::default(),
        };
        let sort_order = match self.sort_order.as_deref() {
            Some(raw) => raw
                .parse::<SortOrder>()
                .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e)))?,
            None => SortOrder::default(),
        };

        Ok(ListOptions {
            sort_by,
            sort_order,
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1 to 255 characters"),
        custom(function = "validate_item_name")
    )]
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be 1 to 255 characters"),
        custom(function = "validate_item_name")
    )]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Rejects blank names and names containing a path separator.
pub fn validate_item_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("blank_name"));
    }
    if name.contains('/') {
        return Err(ValidationError::new("name_contains_slash"));
    }
    Ok(())
}
