//! GitLab v4 REST adapter.
//!
//! A roster team is a GitLab group; a resource is a project inside it,
//! addressed as `<team>/<name>`. The roster login becomes a project member.
//!
//! `DELETE /projects/:id` answers `202 Accepted` and may only schedule the
//! removal (delayed project deletion). Until GitLab actually removes the
//! project its path stays taken, so the create that follows a delete fails
//! with "has already been taken" and the row stays `PROCESSING`. Such rows
//! converge on a later pass once the deletion has gone through.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use roster_core::{HostingSettings, LoginId, ResourceName, TeamName};
use roster_sync::{HostingError, HostingGateway};

use crate::error::RemoteError;
use crate::{agent, encode_segment};

#[derive(Debug, Deserialize)]
struct User {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Group {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: u64,
}

pub struct GitlabClient {
    agent: ureq::Agent,
    api_base: String,
    token: String,
    access_level: u32,
}

impl GitlabClient {
    pub fn new(settings: &HostingSettings, token: impl Into<String>) -> Self {
        Self {
            agent: agent(Duration::from_secs(settings.timeout_secs)),
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token: token.into(),
            access_level: settings.member_access_level,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, RemoteError> {
        let url = self.url(path);
        let mut request = self.agent.get(&url).set("PRIVATE-TOKEN", &self.token);
        for (k, v) in query {
            request = request.query(k, v);
        }
        request
            .call()?
            .into_json()
            .map_err(|source| RemoteError::Decode { url, source })
    }

    fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, RemoteError> {
        let url = self.url(path);
        self.agent
            .post(&url)
            .set("PRIVATE-TOKEN", &self.token)
            .send_json(body)?
            .into_json()
            .map_err(|source| RemoteError::Decode { url, source })
    }

    fn find_user(&self, login: &LoginId) -> Result<Option<User>, HostingError> {
        let users: Vec<User> = self
            .get_json("/users", &[("username", login.0.as_str())])
            .map_err(|e| e.into_hosting(&login.0))?;
        Ok(users.into_iter().next())
    }

    fn require_user(&self, login: &LoginId) -> Result<User, HostingError> {
        self.find_user(login)?
            .ok_or_else(|| HostingError::UnknownLogin(login.0.clone()))
    }
}

impl HostingGateway for GitlabClient {
    fn create_resource(
        &mut self,
        login: &LoginId,
        name: &ResourceName,
        team: &TeamName,
    ) -> Result<(), HostingError> {
        let group: Group = self
            .get_json(&format!("/groups/{}", encode_segment(&team.0)), &[])
            .map_err(|e| e.into_hosting(&format!("group '{team}'")))?;
        let user = self.require_user(login)?;

        let full_path = format!("{team}/{name}");
        let project: Project = self
            .post_json(
                "/projects",
                json!({
                    "name": name.as_str(),
                    "path": name.as_str(),
                    "namespace_id": group.id,
                }),
            )
            .map_err(|e| e.into_hosting(&full_path))?;
        tracing::debug!("created project {} ({full_path})", project.id);

        let _member: Value = self
            .post_json(
                &format!("/projects/{}/members", project.id),
                json!({
                    "user_id": user.id,
                    "access_level": self.access_level,
                }),
            )
            .map_err(|e| e.into_hosting(&full_path))?;
        Ok(())
    }

    fn delete_resource(
        &mut self,
        name: &ResourceName,
        team: &TeamName,
    ) -> Result<(), HostingError> {
        let full_path = format!("{team}/{name}");
        let url = self.url(&format!("/projects/{}", encode_segment(&full_path)));
        self.agent
            .delete(&url)
            .set("PRIVATE-TOKEN", &self.token)
            .call()
            .map_err(|e| RemoteError::from(e).into_hosting(&full_path))?;
        tracing::debug!("deleted project {full_path}");
        Ok(())
    }

    fn verify_login(&mut self, login: &LoginId) -> Result<(), HostingError> {
        self.require_user(login).map(|_| ())
    }
}
