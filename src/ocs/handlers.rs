//! OCS operations.
//!
//! Each handler reads its parameters, authenticates, authorizes where the
//! operation demands it, calls one collaborator and assembles the envelope.
//! Rejections (`OcsReject`) short-circuit with `?`; collaborator failures
//! become a `failed`/996 envelope.

use thiserror::Error;

use crate::backends::{CollaboratorError, Collaborators};
use crate::config::OcsConfig;
use crate::ocs::auth::{Authenticator, Credentials, Identity};
use crate::ocs::envelope::{
    Dimension, Envelope, CODE_FORBIDDEN, CODE_INVALID_LOGIN, CODE_MISSING_FIELD, CODE_SERVER_ERROR,
};
use crate::ocs::error::OcsReject;
use crate::ocs::params::{addslashes, strip_tags, ParamSource, ParameterReader};
use crate::ocs::payload::Payload;
use crate::resilience::with_deadline;
use crate::routing::RouteMatch;

const MSG_MISSING_FIELDS: &str = "please specify all mandatory fields";
const MSG_INVALID_LOGIN: &str = "login not valid";
const MSG_FORBIDDEN: &str = "You don't have permission to access this resource";
const MSG_NO_SUCH_USER: &str = "User does not exist";
const MSG_SERVER_ERROR: &str = "Internal server error";

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Identifier of an OCS operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Config,
    PersonCheck,
    ActivityGet,
    ActivityPut,
    PrivateDataGet,
    PrivateDataSet,
    PrivateDataDelete,
    QuotaGet,
    QuotaSet,
}

impl Operation {
    /// Route name, also used as a metrics label.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Config => "config",
            Operation::PersonCheck => "person_check",
            Operation::ActivityGet => "activity_get",
            Operation::ActivityPut => "activity_put",
            Operation::PrivateDataGet => "privatedata_get",
            Operation::PrivateDataSet => "privatedata_set",
            Operation::PrivateDataDelete => "privatedata_delete",
            Operation::QuotaGet => "quota_get",
            Operation::QuotaSet => "quota_set",
        }
    }
}

/// Everything a handler may read from the request.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    pub route: &'a RouteMatch,
    pub params: ParameterReader<'a>,
    pub credentials: Option<&'a Credentials>,
    /// Host the request was addressed to.
    pub host: &'a str,
}

impl Call<'_> {
    fn placeholder(&self, name: &str) -> &str {
        self.route.param(name).unwrap_or_default()
    }

    /// A placeholder cleaned for use as a preference app or key.
    fn sanitized(&self, name: &str) -> String {
        addslashes(&strip_tags(self.placeholder(name)))
    }
}

#[derive(Debug, Error)]
enum Failure {
    #[error(transparent)]
    Reject(#[from] OcsReject),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

/// The OCS handler set.
#[derive(Debug, Clone)]
pub struct Handlers {
    collaborators: Collaborators,
    authenticator: Authenticator,
    ocs: OcsConfig,
}

impl Handlers {
    pub fn new(collaborators: Collaborators, ocs: OcsConfig) -> Self {
        let authenticator =
            Authenticator::new(collaborators.users.clone(), collaborators.deadline);
        Self {
            collaborators,
            authenticator,
            ocs,
        }
    }

    /// Run `operation`.
    pub async fn invoke(&self, operation: Operation, call: &Call<'_>) -> Result<Envelope, OcsReject> {
        let result = match operation {
            Operation::Config => self.config(call).await,
            Operation::PersonCheck => self.person_check(call).await,
            Operation::ActivityGet => self.activity_get(call).await,
            Operation::ActivityPut => self.activity_put(call).await,
            Operation::PrivateDataGet => self.privatedata_get(call).await,
            Operation::PrivateDataSet => self.privatedata_set(call).await,
            Operation::PrivateDataDelete => self.privatedata_delete(call).await,
            Operation::QuotaGet => self.quota_get(call).await,
            Operation::QuotaSet => self.quota_set(call).await,
        };

        match result {
            Ok(envelope) => Ok(envelope),
            Err(Failure::Reject(reject)) => Err(reject),
            Err(Failure::Collaborator(e)) => {
                tracing::error!(operation = operation.name(), error = %e, "Handler failed");
                Ok(Envelope::failed(CODE_SERVER_ERROR, MSG_SERVER_ERROR))
            }
        }
    }

    /// Forced authentication, returning the caller's username.
    async fn require_user(&self, call: &Call<'_>) -> Result<String, OcsReject> {
        match self
            .authenticator
            .check_credentials(call.credentials, true)
            .await?
        {
            Identity::Authenticated { username } => Ok(username),
            Identity::Anonymous => Err(OcsReject::Unauthenticated),
        }
    }

    async fn is_admin(&self, user: &str) -> Result<bool, CollaboratorError> {
        let groups = &self.collaborators.groups;
        with_deadline(
            self.collaborators.deadline,
            "groups.in_group",
            groups.in_group(user, &self.ocs.admin_group),
        )
        .await
    }

    async fn config(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        self.authenticator
            .check_credentials(call.credentials, false)
            .await?;

        let host = self.ocs.host.as_deref().unwrap_or(call.host);
        let ssl = if self.ocs.ssl { "true" } else { "false" };
        let data = Payload::map([
            ("version", self.ocs.version.as_str()),
            ("website", self.ocs.website.as_str()),
            ("host", host),
            ("contact", self.ocs.contact.as_str()),
            ("ssl", ssl),
        ]);

        Ok(Envelope::ok()
            .with_data(data, Dimension::Flat)
            .with_tag("config", ""))
    }

    async fn person_check(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let login = call.params.text(ParamSource::Body, "login", None)?;
        let password = call.params.text(ParamSource::Body, "password", None)?;

        if login.is_empty() {
            return Ok(Envelope::failed(CODE_MISSING_FIELD, MSG_MISSING_FIELDS));
        }
        if !self.authenticator.verify(&login, &password).await {
            return Ok(Envelope::failed(CODE_INVALID_LOGIN, MSG_INVALID_LOGIN));
        }

        let data = Payload::map([("person", Payload::map([("personid", login)]))]);
        Ok(Envelope::ok()
            .with_data(data, Dimension::Entries)
            .with_tag("person", "check"))
    }

    async fn activity_get(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let page = call.params.int(ParamSource::Query, "page", Some(0))?;
        let mut page_size = call
            .params
            .int(ParamSource::Query, "pagesize", Some(DEFAULT_PAGE_SIZE))?;
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            page_size = DEFAULT_PAGE_SIZE;
        }
        let user = self.require_user(call).await?;

        let page_index = usize::try_from(page).unwrap_or(0);
        let per_page = usize::try_from(page_size).unwrap_or(10);
        let activity = &self.collaborators.activity;
        let result = with_deadline(
            self.collaborators.deadline,
            "activity.page",
            activity.page(&user, page_index, per_page),
        )
        .await?;

        let entries = result.entries.into_iter().map(|entry| {
            Payload::map([
                ("id", Payload::from(entry.id)),
                ("personid", Payload::from(entry.personid)),
                ("timestamp", Payload::from(entry.timestamp)),
                ("message", Payload::from(entry.message)),
            ])
        });

        Ok(Envelope::ok()
            .with_data(Payload::list(entries), Dimension::Entries)
            .with_tag("activity", "full")
            .with_items(result.total as u64, per_page as u64))
    }

    async fn activity_put(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let message = call.params.text(ParamSource::Body, "message", None)?;
        let user = self.require_user(call).await?;

        let activity = &self.collaborators.activity;
        with_deadline(
            self.collaborators.deadline,
            "activity.publish",
            activity.publish(&user, &message),
        )
        .await?;
        Ok(Envelope::ok())
    }

    async fn privatedata_get(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let app = call.sanitized("app");
        let key = call.sanitized("key");
        let user = self.require_user(call).await?;

        let store = &self.collaborators.preferences;
        let deadline = self.collaborators.deadline;

        let apps = if app.is_empty() {
            with_deadline(deadline, "preferences.get_apps", store.get_apps(&user)).await?
        } else {
            vec![app]
        };

        let mut entries = Vec::new();
        for app in &apps {
            let keys = if key.is_empty() {
                with_deadline(deadline, "preferences.get_keys", store.get_keys(&user, app))
                    .await?
            } else {
                vec![key.clone()]
            };
            for key in keys {
                let value = with_deadline(
                    deadline,
                    "preferences.get_value",
                    store.get_value(&user, app, &key),
                )
                .await?;
                entries.push(Payload::map([
                    ("key", Payload::from(key)),
                    ("app", Payload::from(app.as_str())),
                    ("value", Payload::from(value)),
                ]));
            }
        }

        let count = entries.len() as u64;
        Ok(Envelope::ok()
            .with_data(Payload::List(entries), Dimension::Entries)
            .with_tag("privatedata", "full")
            .with_items(count, 0))
    }

    async fn privatedata_set(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let app = call.sanitized("app");
        let key = call.sanitized("key");
        let value = call.params.text(ParamSource::Body, "value", None)?;
        let user = self.require_user(call).await?;

        let store = &self.collaborators.preferences;
        with_deadline(
            self.collaborators.deadline,
            "preferences.set_value",
            store.set_value(&user, &app, &key, &value),
        )
        .await?;
        Ok(Envelope::ok())
    }

    async fn privatedata_delete(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let app = call.sanitized("app");
        let key = call.sanitized("key");
        if app.is_empty() || key.is_empty() {
            return Ok(Envelope::failed(CODE_MISSING_FIELD, MSG_MISSING_FIELDS));
        }
        let user = self.require_user(call).await?;

        let store = &self.collaborators.preferences;
        with_deadline(
            self.collaborators.deadline,
            "preferences.delete_key",
            store.delete_key(&user, &app, &key),
        )
        .await?;
        Ok(Envelope::ok())
    }

    async fn quota_get(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let target = call.placeholder("user").to_string();
        let login = self.require_user(call).await?;

        if login != target && !self.is_admin(&login).await? {
            return Ok(Envelope::failed(CODE_FORBIDDEN, MSG_FORBIDDEN));
        }

        let deadline = self.collaborators.deadline;
        let users = &self.collaborators.users;
        if !with_deadline(deadline, "users.user_exists", users.user_exists(&target)).await? {
            return Ok(Envelope::failed(CODE_FORBIDDEN, MSG_NO_SUCH_USER));
        }

        let quota = &self.collaborators.quota;
        let usage = match with_deadline(deadline, "quota.usage", quota.usage(&target)).await {
            Ok(usage) => usage,
            Err(CollaboratorError::NotFound(_)) => {
                return Ok(Envelope::failed(CODE_FORBIDDEN, MSG_NO_SUCH_USER))
            }
            Err(e) => return Err(e.into()),
        };

        let mut total = usage.free.saturating_add(usage.used);
        if total == 0 {
            total = 1;
        }
        let relative = (usage.used as f64 / total as f64 * 10_000.0).round() / 100.0;

        let data = Payload::map([
            ("quota", Payload::from(total)),
            ("free", Payload::from(usage.free)),
            ("used", Payload::from(usage.used)),
            ("relative", Payload::from(relative)),
        ]);
        Ok(Envelope::ok()
            .with_data(data, Dimension::Flat)
            .with_tag("cloud", "full")
            .with_items(4, 0))
    }

    async fn quota_set(&self, call: &Call<'_>) -> Result<Envelope, Failure> {
        let target = call.placeholder("user").to_string();
        let quota = call.params.int(ParamSource::Body, "quota", None)?;
        let login = self.require_user(call).await?;

        if !self.is_admin(&login).await? {
            return Ok(Envelope::failed(CODE_FORBIDDEN, MSG_FORBIDDEN));
        }

        let bytes = u64::try_from(quota).unwrap_or(0);
        let backend = &self.collaborators.quota;
        match with_deadline(
            self.collaborators.deadline,
            "quota.set_quota",
            backend.set_quota(&target, bytes),
        )
        .await
        {
            Ok(()) => {}
            Err(CollaboratorError::NotFound(_)) => {
                return Ok(Envelope::failed(CODE_FORBIDDEN, MSG_NO_SUCH_USER))
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(user = %target, by = %login, bytes, "Quota updated");

        Ok(Envelope::ok()
            .with_data(Payload::empty(), Dimension::Flat)
            .with_tag("cloud", "full")
            .with_items(0, 0))
    }
}
