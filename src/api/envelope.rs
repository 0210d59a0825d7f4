//! Request envelopes: `{ object, action, query }` documents naming which
//! remote object and action to invoke.
//!
//! The transport treats these as opaque; the constructors below only save
//! the shell from spelling out each payload by hand.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::types::UploadedFileRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub object: String,
    pub action: String,
    pub query: Value,
}

/// Folder categories accepted by `folder/list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderCategory {
    #[default]
    All,
    Application,
    Archive,
    Definition,
    GlobalVariable,
    Instance,
}

impl FolderCategory {
    pub const ALL: [FolderCategory; 6] = [
        Self::All,
        Self::Application,
        Self::Archive,
        Self::Definition,
        Self::GlobalVariable,
        Self::Instance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Application => "application",
            Self::Archive => "archive",
            Self::Definition => "definition",
            Self::GlobalVariable => "globalvariable",
            Self::Instance => "instance",
        }
    }
}

impl fmt::Display for FolderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name/value pair set on a process instance at initiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessVariable {
    pub name: String,
    pub value: String,
}

/// Arguments for `process_definition/initiate`.
#[derive(Debug, Clone, Default)]
pub struct InitiateRequest {
    pub process_definition_id: i64,
    pub return_workitem_info: bool,
    pub start_activity_name: Option<String>,
    pub description: Option<String>,
    pub variables: Vec<ProcessVariable>,
    pub attachments: Vec<UploadedFileRef>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl Envelope {
    pub fn new(object: impl Into<String>, action: impl Into<String>, query: Value) -> Self {
        Self {
            object: object.into(),
            action: action.into(),
            query,
        }
    }

    pub fn login(id: &str, pwd: &str) -> Self {
        Self::new("authentication", "login", json!({ "id": id, "pwd": pwd }))
    }

    /// `all_sessions` logs the user out of every session on every device.
    pub fn logout(all_sessions: bool) -> Self {
        Self::new("authentication", "logout", json!({ "allSessions": all_sessions }))
    }

    pub fn folder_get(id: i64) -> Self {
        Self::new("folder", "get", json!({ "id": id }))
    }

    pub fn folder_list(category: FolderCategory, project_id: i64) -> Self {
        let prj_id = (project_id > 0).then_some(project_id);
        Self::new(
            "folder",
            "list",
            json!({ "category": category.as_str(), "prjId": prj_id }),
        )
    }

    pub fn comment_list(process_id: i64) -> Self {
        Self::new("comment", "list", json!({ "processId": process_id }))
    }

    /// `comment_id` 0 adds a new comment; otherwise the comment is replaced.
    pub fn comment_put(process_id: i64, workitem_seq: i64, comment_id: i64, text: &str) -> Self {
        Self::new(
            "comment",
            "put",
            json!({
                "processId": process_id,
                "workitemId": workitem_seq,
                "id": comment_id,
                "comment": text,
            }),
        )
    }

    pub fn comment_delete(process_id: i64, comment_id: i64) -> Self {
        Self::new(
            "comment",
            "delete",
            json!({ "processId": process_id, "id": comment_id }),
        )
    }

    pub fn process_definition_get(id: i64) -> Self {
        Self::new("process_definition", "get", json!({ "id": id }))
    }

    pub fn process_definition_list(folder_id: i64) -> Self {
        Self::new("process_definition", "list", json!({ "id": folder_id }))
    }

    pub fn process_definition_initiate(request: &InitiateRequest) -> Self {
        let variables = (!request.variables.is_empty()).then_some(&request.variables);
        let attachments = (!request.attachments.is_empty()).then(|| {
            request
                .attachments
                .iter()
                .map(|file| json!({ "fileId": file.file_id, "name": file.name, "description": "" }))
                .collect::<Vec<_>>()
        });

        Self::new(
            "process_definition",
            "initiate",
            json!({
                "id": request.process_definition_id,
                "returnWorkitemInfo": request.return_workitem_info,
                "startActivityName": non_empty(request.start_activity_name.as_deref()),
                "description": non_empty(request.description.as_deref()),
                "variables": variables,
                "attachments": attachments,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_object_action_query_order() {
        let json = serde_json::to_string(&Envelope::login("u", "p")).unwrap();
        assert_eq!(
            json,
            r#"{"object":"authentication","action":"login","query":{"id":"u","pwd":"p"}}"#
        );
    }

    #[test]
    fn folder_list_omits_project_unless_positive() {
        let envelope = Envelope::folder_list(FolderCategory::Definition, 0);
        assert_eq!(envelope.query, json!({ "category": "definition", "prjId": null }));

        let envelope = Envelope::folder_list(FolderCategory::All, 42);
        assert_eq!(envelope.query["prjId"], 42);
    }

    #[test]
    fn comment_put_maps_workitem_sequence() {
        let envelope = Envelope::comment_put(100, 3, 0, "looks good");
        assert_eq!((envelope.object.as_str(), envelope.action.as_str()), ("comment", "put"));
        assert_eq!(
            envelope.query,
            json!({ "processId": 100, "workitemId": 3, "id": 0, "comment": "looks good" })
        );
    }

    #[test]
    fn initiate_nulls_empty_fields() {
        let envelope = Envelope::process_definition_initiate(&InitiateRequest {
            process_definition_id: 7,
            return_workitem_info: true,
            start_activity_name: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(
            envelope.query,
            json!({
                "id": 7,
                "returnWorkitemInfo": true,
                "startActivityName": null,
                "description": null,
                "variables": null,
                "attachments": null,
            })
        );
    }

    #[test]
    fn initiate_attaches_uploaded_files_without_description() {
        let envelope = Envelope::process_definition_initiate(&InitiateRequest {
            process_definition_id: 7,
            description: Some("expense report".into()),
            variables: vec![ProcessVariable {
                name: "amount".into(),
                value: "120".into(),
            }],
            attachments: vec![UploadedFileRef {
                file_id: "F1".into(),
                name: "receipt.pdf".into(),
                size: 2048,
                description: "scan".into(),
            }],
            ..Default::default()
        });
        assert_eq!(envelope.query["description"], "expense report");
        assert_eq!(envelope.query["variables"], json!([{ "name": "amount", "value": "120" }]));
        assert_eq!(
            envelope.query["attachments"],
            json!([{ "fileId": "F1", "name": "receipt.pdf", "description": "" }])
        );
    }
}
