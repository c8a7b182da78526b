// Allure result schema
//
// Only the parts of the Allure 2 result format this suite emits. Field names
// follow the JSON the Allure CLI reads from `allure-results/`.

use serde::{Deserialize, Serialize};

/// Final state of a test case or step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Passed,
    /// An assertion did not hold
    Failed,
    /// The check could not run to its assertion (browser or HTTP error)
    Broken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Running,
    Finished,
}

/// Media type tag of an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Png,
    Text,
    Webm,
}

impl MediaType {
    /// MIME type written into the result file
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Text => "text/plain",
            MediaType::Webm => "video/webm",
        }
    }

    /// Extension of the attachment file on disk
    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Png => "png",
            MediaType::Text => "txt",
            MediaType::Webm => "webm",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Human-readable name shown in the report
    pub name: String,
    /// File name relative to the results directory
    pub source: String,
    /// MIME type
    #[serde(rename = "type")]
    pub media_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub name: String,
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    pub stage: Stage,
    pub start: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl StepResult {
    pub(crate) fn started(name: &str, start: i64) -> Self {
        Self {
            name: name.to_string(),
            status: None,
            status_details: None,
            stage: Stage::Running,
            start,
            stop: None,
            steps: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// One `<uuid>-result.json` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub uuid: String,
    pub history_id: String,
    pub name: String,
    pub full_name: String,
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_details: Option<StatusDetails>,
    pub stage: Stage,
    pub start: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub steps: Vec<StepResult>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TestResult {
    /// Every attachment of the case, its steps and their sub-steps
    pub fn all_attachments(&self) -> Vec<&Attachment> {
        fn collect<'a>(steps: &'a [StepResult], out: &mut Vec<&'a Attachment>) {
            for step in steps {
                out.extend(step.attachments.iter());
                collect(&step.steps, out);
            }
        }

        let mut out: Vec<&Attachment> = self.attachments.iter().collect();
        collect(&self.steps, &mut out);
        out
    }

    /// Value of the first label with `name`
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_media_types() {
        assert_eq!(MediaType::Png.mime(), "image/png");
        assert_eq!(MediaType::Text.mime(), "text/plain");
        assert_eq!(MediaType::Webm.mime(), "video/webm");
        assert_eq!(MediaType::Text.extension(), "txt");
    }

    #[test]
    fn test_result_serializes_allure_field_names() {
        let result = TestResult {
            uuid: "u".to_string(),
            history_id: "h".to_string(),
            name: "n".to_string(),
            full_name: "f".to_string(),
            status: Some(Status::Broken),
            status_details: Some(StatusDetails {
                message: Some("boom".to_string()),
                trace: None,
            }),
            stage: Stage::Finished,
            start: 1,
            stop: Some(2),
            labels: vec![Label {
                name: "feature".to_string(),
                value: "Cart".to_string(),
            }],
            steps: vec![],
            attachments: vec![Attachment {
                name: "Cart_OK".to_string(),
                source: "a-attachment.png".to_string(),
                media_type: "image/png".to_string(),
            }],
        };

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["historyId"], json!("h"));
        assert_eq!(value["fullName"], json!("f"));
        assert_eq!(value["status"], json!("broken"));
        assert_eq!(value["stage"], json!("finished"));
        assert_eq!(value["statusDetails"], json!({"message": "boom"}));
        assert_eq!(value["attachments"][0]["type"], json!("image/png"));
        assert_eq!(result.label("feature"), Some("Cart"));
    }

    #[test]
    fn test_all_attachments_walks_nested_steps() {
        let attachment = |name: &str| Attachment {
            name: name.to_string(),
            source: format!("{name}.png"),
            media_type: "image/png".to_string(),
        };
        let mut inner = StepResult::started("inner", 0);
        inner.attachments.push(attachment("deep"));
        let mut outer = StepResult::started("outer", 0);
        outer.attachments.push(attachment("step"));
        outer.steps.push(inner);

        let result = TestResult {
            uuid: String::new(),
            history_id: String::new(),
            name: String::new(),
            full_name: String::new(),
            status: None,
            status_details: None,
            stage: Stage::Running,
            start: 0,
            stop: None,
            labels: vec![],
            steps: vec![outer],
            attachments: vec![attachment("top")],
        };

        let names: Vec<&str> = result
            .all_attachments()
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["top", "step", "deep"]);
    }
}
