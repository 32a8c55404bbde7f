//! The closed table of service operations.
//!
//! Every HTTP call the client can make is one of the [`Operation`] variants
//! below. Each variant knows its HTTP verb, its URL template and the error
//! codes the service documents for it, so dispatch and response
//! classification never work from free-form strings.
//!
//! URL templates are origin-relative: `{0}` is always the service origin
//! (scheme, host and optional port), `{1}`/`{2}`/`{3}` are positional
//! arguments such as the project, the resource name or a timestamp.
//!
//! ## Operation groups
//!
//! | Group | Operations |
//! |-------|------------|
//! | Topics | list, get, publish, create, delete, ACL get/modify |
//! | Subscriptions | create, delete, list, get, pull, acknowledge, push config, ACL get/modify, offsets |
//! | Service | status, metrics, VA metrics, version, usage report |
//! | Users | create, update, get (by name/token/uuid/profile), list, delete, token refresh |
//! | Projects | member management, create, update, get, delete |
//! | Auth | x509 token exchange |

use http::Method;

/// A logical service operation.
///
/// The set is closed: adding an endpoint means adding a variant here
/// together with its row in every table method, which the compiler then
/// enforces exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Operation {
    // topic api calls
    TopicList,
    TopicGet,
    TopicPublish,
    TopicCreate,
    TopicDelete,
    TopicGetAcl,
    TopicModifyAcl,

    // subscription api calls
    SubCreate,
    SubDelete,
    SubList,
    SubGet,
    SubPull,
    SubAck,
    SubPushConfig,
    SubGetAcl,
    SubModifyAcl,
    SubOffsets,
    SubModifyOffset,
    SubTimeToOffset,

    // service api calls for metrics, version and status
    ApiStatus,
    ApiMetrics,
    ApiVaMetrics,
    ApiVersion,
    ApiUsageReport,

    // user api calls
    UserCreate,
    UserUpdate,
    UserGet,
    UserGetByToken,
    UserGetByUuid,
    UserGetProfile,
    UsersList,
    UserDelete,
    UserRefreshToken,

    // project api calls
    ProjectAddMember,
    ProjectGetMember,
    ProjectCreateMember,
    ProjectRemoveMember,
    ProjectCreate,
    ProjectUpdate,
    ProjectGet,
    ProjectDelete,

    // authentication
    AuthX509,
}

impl Operation {
    /// Every operation, in table order. Used by table-driven tests.
    pub(crate) const ALL: [Operation; 42] = [
        Operation::TopicList,
        Operation::TopicGet,
        Operation::TopicPublish,
        Operation::TopicCreate,
        Operation::TopicDelete,
        Operation::TopicGetAcl,
        Operation::TopicModifyAcl,
        Operation::SubCreate,
        Operation::SubDelete,
        Operation::SubList,
        Operation::SubGet,
        Operation::SubPull,
        Operation::SubAck,
        Operation::SubPushConfig,
        Operation::SubGetAcl,
        Operation::SubModifyAcl,
        Operation::SubOffsets,
        Operation::SubModifyOffset,
        Operation::SubTimeToOffset,
        Operation::ApiStatus,
        Operation::ApiMetrics,
        Operation::ApiVaMetrics,
        Operation::ApiVersion,
        Operation::ApiUsageReport,
        Operation::UserCreate,
        Operation::UserUpdate,
        Operation::UserGet,
        Operation::UserGetByToken,
        Operation::UserGetByUuid,
        Operation::UserGetProfile,
        Operation::UsersList,
        Operation::UserDelete,
        Operation::UserRefreshToken,
        Operation::ProjectAddMember,
        Operation::ProjectGetMember,
        Operation::ProjectCreateMember,
        Operation::ProjectRemoveMember,
        Operation::ProjectCreate,
        Operation::ProjectUpdate,
        Operation::ProjectGet,
        Operation::ProjectDelete,
        Operation::AuthX509,
    ];

    /// The operation name used in error messages and logs.
    ///
    /// ```
    /// use pubsub_http_client::protocol::Operation;
    ///
    /// assert_eq!(Operation::SubPull.name(), "sub_pull");
    /// assert_eq!(Operation::TopicPublish.name(), "topic_publish");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            Operation::TopicList => "topic_list",
            Operation::TopicGet => "topic_get",
            Operation::TopicPublish => "topic_publish",
            Operation::TopicCreate => "topic_create",
            Operation::TopicDelete => "topic_delete",
            Operation::TopicGetAcl => "topic_getacl",
            Operation::TopicModifyAcl => "topic_modifyacl",
            Operation::SubCreate => "sub_create",
            Operation::SubDelete => "sub_delete",
            Operation::SubList => "sub_list",
            Operation::SubGet => "sub_get",
            Operation::SubPull => "sub_pull",
            Operation::SubAck => "sub_ack",
            Operation::SubPushConfig => "sub_pushconfig",
            Operation::SubGetAcl => "sub_getacl",
            Operation::SubModifyAcl => "sub_modifyacl",
            Operation::SubOffsets => "sub_offsets",
            Operation::SubModifyOffset => "sub_mod_offset",
            Operation::SubTimeToOffset => "sub_timeToOffset",
            Operation::ApiStatus => "api_status",
            Operation::ApiMetrics => "api_metrics",
            Operation::ApiVaMetrics => "api_va_metrics",
            Operation::ApiVersion => "api_version",
            Operation::ApiUsageReport => "api_usage_report",
            Operation::UserCreate => "user_create",
            Operation::UserUpdate => "user_update",
            Operation::UserGet => "user_get",
            Operation::UserGetByToken => "user_get_by_token",
            Operation::UserGetByUuid => "user_get_by_uuid",
            Operation::UserGetProfile => "user_get_profile",
            Operation::UsersList => "users_list",
            Operation::UserDelete => "user_delete",
            Operation::UserRefreshToken => "user_refresh_token",
            Operation::ProjectAddMember => "project_add_member",
            Operation::ProjectGetMember => "project_get_member",
            Operation::ProjectCreateMember => "project_create_member",
            Operation::ProjectRemoveMember => "project_remove_member",
            Operation::ProjectCreate => "project_create",
            Operation::ProjectUpdate => "project_update",
            Operation::ProjectGet => "project_get",
            Operation::ProjectDelete => "project_delete",
            Operation::AuthX509 => "auth_x509",
        }
    }

    /// The HTTP verb the operation is dispatched with.
    pub fn verb(&self) -> Method {
        match self {
            Operation::TopicList
            | Operation::TopicGet
            | Operation::TopicGetAcl
            | Operation::SubList
            | Operation::SubGet
            | Operation::SubGetAcl
            | Operation::SubOffsets
            | Operation::SubTimeToOffset
            | Operation::ApiStatus
            | Operation::ApiMetrics
            | Operation::ApiVaMetrics
            | Operation::ApiVersion
            | Operation::ApiUsageReport
            | Operation::UserGet
            | Operation::UserGetByToken
            | Operation::UserGetByUuid
            | Operation::UserGetProfile
            | Operation::UsersList
            | Operation::ProjectGetMember
            | Operation::ProjectGet
            | Operation::AuthX509 => Method::GET,

            Operation::TopicPublish
            | Operation::TopicModifyAcl
            | Operation::SubPull
            | Operation::SubAck
            | Operation::SubPushConfig
            | Operation::SubModifyAcl
            | Operation::SubModifyOffset
            | Operation::UserCreate
            | Operation::UserRefreshToken
            | Operation::ProjectAddMember
            | Operation::ProjectCreateMember
            | Operation::ProjectRemoveMember
            | Operation::ProjectCreate => Method::POST,

            Operation::TopicCreate
            | Operation::SubCreate
            | Operation::UserUpdate
            | Operation::ProjectUpdate => Method::PUT,

            Operation::TopicDelete
            | Operation::SubDelete
            | Operation::UserDelete
            | Operation::ProjectDelete => Method::DELETE,
        }
    }

    /// The origin-relative URL template for the operation.
    pub fn url_template(&self) -> &'static str {
        match self {
            Operation::TopicList => "{0}/v1/projects/{1}/topics",
            Operation::TopicGet => "{0}/v1/projects/{1}/topics/{2}",
            Operation::TopicPublish => "{0}/v1/projects/{1}/topics/{2}:publish",
            Operation::TopicCreate => "{0}/v1/projects/{1}/topics/{2}",
            Operation::TopicDelete => "{0}/v1/projects/{1}/topics/{2}",
            Operation::TopicGetAcl => "{0}/v1/projects/{1}/topics/{2}:acl",
            Operation::TopicModifyAcl => "{0}/v1/projects/{1}/topics/{2}:modifyAcl",
            Operation::SubCreate => "{0}/v1/projects/{1}/subscriptions/{2}",
            Operation::SubDelete => "{0}/v1/projects/{1}/subscriptions/{2}",
            Operation::SubList => "{0}/v1/projects/{1}/subscriptions",
            Operation::SubGet => "{0}/v1/projects/{1}/subscriptions/{2}",
            Operation::SubPull => "{0}/v1/projects/{1}/subscriptions/{2}:pull",
            Operation::SubAck => "{0}/v1/projects/{1}/subscriptions/{2}:acknowledge",
            Operation::SubPushConfig => "{0}/v1/projects/{1}/subscriptions/{2}:modifyPushConfig",
            Operation::SubGetAcl => "{0}/v1/projects/{1}/subscriptions/{2}:acl",
            Operation::SubModifyAcl => "{0}/v1/projects/{1}/subscriptions/{2}:modifyAcl",
            Operation::SubOffsets => "{0}/v1/projects/{1}/subscriptions/{2}:offsets",
            Operation::SubModifyOffset => "{0}/v1/projects/{1}/subscriptions/{2}:modifyOffset",
            Operation::SubTimeToOffset => {
                "{0}/v1/projects/{1}/subscriptions/{2}:timeToOffset?time={3}"
            }
            Operation::ApiStatus => "{0}/v1/status",
            Operation::ApiMetrics => "{0}/v1/metrics",
            Operation::ApiVaMetrics => "{0}/v1/metrics/va_metrics",
            Operation::ApiVersion => "{0}/v1/version",
            Operation::ApiUsageReport => "{0}/v1/users/usageReport",
            Operation::UserCreate => "{0}/v1/users/{1}",
            Operation::UserUpdate => "{0}/v1/users/{1}",
            Operation::UserGet => "{0}/v1/users/{1}",
            Operation::UserGetByToken => "{0}/v1/users:byToken/{1}",
            Operation::UserGetByUuid => "{0}/v1/users:byUUID/{1}",
            Operation::UserGetProfile => "{0}/v1/users/profile",
            Operation::UsersList => "{0}/v1/users",
            Operation::UserDelete => "{0}/v1/users/{1}",
            Operation::UserRefreshToken => "{0}/v1/users/{1}:refreshToken",
            Operation::ProjectAddMember => "{0}/v1/projects/{1}/members/{2}:add",
            Operation::ProjectGetMember => "{0}/v1/projects/{1}/members/{2}",
            Operation::ProjectCreateMember => "{0}/v1/projects/{1}/members/{2}",
            Operation::ProjectRemoveMember => "{0}/v1/projects/{1}/members/{2}:remove",
            Operation::ProjectCreate => "{0}/v1/projects/{1}",
            Operation::ProjectUpdate => "{0}/v1/projects/{1}",
            Operation::ProjectGet => "{0}/v1/projects/{1}",
            Operation::ProjectDelete => "{0}/v1/projects/{1}",
            Operation::AuthX509 => "{0}/v1/service-types/ams/hosts/{1}:authx509",
        }
    }

    /// HTTP status codes the service documents as explicit errors for this
    /// operation. A response with one of these codes becomes a
    /// [`Service`](crate::PubSubError::Service) error.
    pub fn service_error_codes(&self) -> &'static [u16] {
        match self {
            Operation::TopicList => &[400, 401, 403, 404],
            Operation::TopicGet => &[401, 403, 404],
            Operation::TopicPublish => &[401, 403, 413],
            Operation::TopicCreate => &[401, 403, 409],
            Operation::TopicDelete => &[401, 403, 404],
            Operation::TopicGetAcl => &[401, 403, 404],
            Operation::TopicModifyAcl => &[400, 401, 403, 404],
            Operation::SubCreate => &[400, 401, 403, 408, 409],
            Operation::SubDelete => &[401, 403, 404],
            Operation::SubList => &[401, 403, 404],
            Operation::SubGet => &[401, 403, 404],
            Operation::SubPull => &[400, 401, 403, 404],
            Operation::SubAck => &[400, 401, 403, 404, 408],
            Operation::SubPushConfig => &[400, 401, 403, 404],
            Operation::SubGetAcl => &[401, 403, 404],
            Operation::SubModifyAcl => &[400, 401, 403, 404],
            Operation::SubOffsets => &[400, 401, 403, 404],
            Operation::SubModifyOffset => &[400, 401, 403, 404],
            Operation::SubTimeToOffset => &[400, 401, 403, 404, 409],
            Operation::ApiStatus => &[401, 403],
            Operation::ApiMetrics => &[401, 403],
            Operation::ApiVaMetrics => &[400, 401, 403, 404],
            Operation::ApiVersion => &[401, 403],
            Operation::ApiUsageReport => &[400, 401, 403],
            Operation::UserCreate => &[400, 401, 403, 404, 409],
            Operation::UserUpdate => &[400, 401, 403, 404, 409],
            Operation::UserGet => &[400, 401, 403, 404],
            Operation::UserGetByToken => &[400, 401, 403, 404],
            Operation::UserGetByUuid => &[400, 401, 403, 404],
            Operation::UserGetProfile => &[400, 401, 403, 404],
            Operation::UsersList => &[401, 403],
            Operation::UserDelete => &[401, 403, 404],
            Operation::UserRefreshToken => &[401, 403, 404],
            Operation::ProjectAddMember => &[400, 401, 403, 404, 409],
            Operation::ProjectGetMember => &[400, 401, 403, 404],
            Operation::ProjectCreateMember => &[400, 401, 403, 404, 409],
            Operation::ProjectRemoveMember => &[401, 403, 404],
            Operation::ProjectCreate => &[400, 401, 403, 409],
            Operation::ProjectUpdate => &[400, 401, 403, 404, 409],
            Operation::ProjectGet => &[401, 403, 404],
            Operation::ProjectDelete => &[401, 403, 404],
            Operation::AuthX509 => &[400, 401, 403, 404],
        }
    }

    /// HTTP status codes attributed to the load balancer, for operations
    /// routed through one. Empty for everything else.
    pub fn balancer_error_codes(&self) -> &'static [u16] {
        match self {
            Operation::SubPull | Operation::SubAck | Operation::TopicPublish => {
                &[500, 502, 503, 504]
            }
            _ => &[],
        }
    }

    /// Whether the operation is routed through the load balancer.
    ///
    /// Only these operations can yield
    /// [`Balancer`](crate::PubSubError::Balancer) errors, and only for them
    /// does a 504 count as a timeout.
    pub fn is_balancer_sensitive(&self) -> bool {
        !self.balancer_error_codes().is_empty()
    }

    /// Whether the API key header is omitted for the operation.
    ///
    /// The x509 token exchange is the one call made before a token exists.
    pub fn skips_api_key(&self) -> bool {
        matches!(self, Operation::AuthX509)
    }

    /// Expand the URL template with positional arguments.
    pub fn url(&self, args: &[&str]) -> String {
        fill_template(self.url_template(), args)
    }
}

/// Replace `{0}`, `{1}`, ... placeholders with the given arguments.
pub(crate) fn fill_template(template: &str, args: &[&str]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), arg);
    }
    out
}
