use serde::Deserialize;
use validator::Validate;

/// Body of `/api/move` and `/api/copy`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[validate(length(min = 1, max = 500, message = "fileIds must hold 1 to 500 ids"))]
    pub file_ids: Vec<String>,
    #[validate(length(min = 1, message = "targetFolderId cannot be empty"))]
    pub target_folder_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_list_is_rejected() {
        let request: BatchRequest =
            serde_json::from_str(r#"{"fileIds": [], "targetFolderId": "t"}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn oversized_id_list_is_rejected() {
        let request = BatchRequest {
            file_ids: (0..501).map(|i| i.to_string()).collect(),
            target_folder_id: "t".to_string(),
        };
        assert!(request.validate().is_err());
    }
}
