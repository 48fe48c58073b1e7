//! [`Remote`] over the tasks server's JSON API.
//!
//! Records live under `tasks-server/{resource}`: a create is a `POST` to the
//! collection, updates and destroys address `tasks-server/{resource}/{id}`.
//! Bodies are the record's serde form (camelCase foreign keys).

use serde::Deserialize;

use tasks_core::{Operation, RecordId};

use super::{CommitAck, CommitRequest, Remote};
use crate::error::RemoteError;

const RESOURCE_ROOT: &str = "tasks-server";

/// Path component of a resource URL, relative to the server base.
///
/// `resource_path("task", Some(RecordId(7)), &[("format", "json")])` is
/// `tasks-server/task/7?format=json`.
pub fn resource_path(resource: &str, id: Option<RecordId>, query: &[(&str, &str)]) -> String {
    let mut path = format!("{RESOURCE_ROOT}/{resource}");
    if let Some(id) = id {
        path.push('/');
        path.push_str(&id.to_string());
    }
    for (i, (key, value)) in query.iter().enumerate() {
        path.push(if i == 0 { '?' } else { '&' });
        path.push_str(key);
        path.push('=');
        path.push_str(value);
    }
    path
}

#[derive(Debug, Deserialize)]
struct CreatedBody {
    id: Option<RecordId>,
}

/// HTTP client for the tasks server.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpRemote { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Builds the request for one commit without sending it.
    pub fn request_for(&self, request: &CommitRequest) -> reqwest::RequestBuilder {
        let resource = request.kind.resource_name();
        let builder = match request.operation {
            Operation::Create => self
                .client
                .post(self.url(&resource_path(resource, None, &[])))
                .json(&request.record),
            Operation::Update => self
                .client
                .put(self.url(&resource_path(resource, Some(request.record.id), &[])))
                .json(&request.record),
            Operation::Destroy => self
                .client
                .delete(self.url(&resource_path(resource, Some(request.record.id), &[]))),
        };
        builder.header("Accept", "application/json")
    }
}

impl Remote for HttpRemote {
    async fn commit(&self, request: CommitRequest) -> Result<CommitAck, RemoteError> {
        let response = self.request_for(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(RemoteError::Rejected {
                status: status.as_u16(),
                message: body,
            });
        }

        match request.operation {
            Operation::Create => {
                if body.trim().is_empty() {
                    return Ok(CommitAck::done());
                }
                let created: CreatedBody =
                    serde_json::from_str(&body).map_err(|err| RemoteError::Rejected {
                        status: status.as_u16(),
                        message: format!("unreadable create response: {err}"),
                    })?;
                Ok(CommitAck { id: created.id })
            }
            Operation::Update | Operation::Destroy => Ok(CommitAck::done()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasks_core::record::{Task, User};
    use tasks_core::{Record, RecordData, RecordKind, StoreKey};

    fn commit(kind: RecordKind, operation: Operation, record: Record) -> CommitRequest {
        CommitRequest {
            key: StoreKey(3),
            kind,
            operation,
            record,
        }
    }

    fn body_json(request: &reqwest::Request) -> serde_json::Value {
        let bytes = request
            .body()
            .and_then(|b| b.as_bytes())
            .expect("request has a buffered body");
        serde_json::from_slice(bytes).unwrap()
    }

    #[test]
    fn resource_paths() {
        assert_eq!(resource_path("project", None, &[]), "tasks-server/project");
        assert_eq!(
            resource_path("task", Some(RecordId(7)), &[]),
            "tasks-server/task/7"
        );
        assert_eq!(
            resource_path("user", None, &[("loginName", "sam"), ("role", "Manager")]),
            "tasks-server/user?loginName=sam&role=Manager"
        );
    }

    #[test]
    fn create_posts_to_the_collection() {
        let remote = HttpRemote::new("http://tasks.test:8080/");
        let record = Record::new(
            RecordId(-5),
            RecordData::User(User {
                login_name: "sam".into(),
                role: Default::default(),
            }),
        );
        let request = remote
            .request_for(&commit(RecordKind::User, Operation::Create, record))
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "http://tasks.test:8080/tasks-server/user"
        );
        assert_eq!(body_json(&request)["loginName"], "sam");
    }

    #[test]
    fn update_puts_to_the_record() {
        let remote = HttpRemote::new("http://tasks.test");
        let record = Record::new(
            RecordId(12),
            RecordData::Task(Task {
                assignee_id: Some(RecordId(42)),
                ..Task::default()
            }),
        );
        let request = remote
            .request_for(&commit(RecordKind::Task, Operation::Update, record))
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::PUT);
        assert_eq!(request.url().path(), "/tasks-server/task/12");
        assert_eq!(body_json(&request)["assigneeId"], 42);
    }

    #[test]
    fn destroy_deletes_without_a_body() {
        let remote = HttpRemote::new("http://tasks.test");
        let record = Record::new(RecordId(9), RecordData::Task(Task::default()));
        let request = remote
            .request_for(&commit(RecordKind::Task, Operation::Destroy, record))
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::DELETE);
        assert_eq!(request.url().path(), "/tasks-server/task/9");
        assert!(request.body().is_none());
    }
}
