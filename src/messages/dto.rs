use serde::Deserialize;

use crate::{
    error::AppError,
    validation::{self, Validate},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMessagesRequest {
    pub accept_messages: bool,
}

impl Validate for AcceptMessagesRequest {
    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Anonymous submission to `username`'s profile.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub username: String,
    pub content: String,
}

impl Validate for SendMessageRequest {
    fn validate(&self) -> Result<(), AppError> {
        validation::required(&self.username, "Username")?;
        validation::content(self.content.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accept_flag_is_camel_case() {
        let req: AcceptMessagesRequest =
            serde_json::from_str(r#"{"acceptMessages":false}"#).unwrap();
        assert!(!req.accept_messages);
        assert!(serde_json::from_str::<AcceptMessagesRequest>(r#"{"acceptMessages":"no"}"#).is_err());
    }

    #[test]
    fn content_is_checked_after_trim() {
        let req = SendMessageRequest {
            username: "alice".into(),
            content: "  hi    ".into(),
        };
        assert!(req.validate().is_err());
    }
}
