// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User account endpoints.
//!
//! `{user}` in a path is either a user id or a username. Callers may always
//! read, update and delete their own account; acting on someone else needs
//! `modify_all_users_restricted` (read/update) or `modify_all_users`
//! (delete, role changes, password resets without the old password).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    audit_log,
    auth::{password::password_digest, Auth, AuthenticatedUser, MaybeAuth, Permission, Role},
    error::ApiError,
    models::{
        CreateUserRequest, UpdateUserRequest, UserList, UserListQuery, UserView, ValidationError,
    },
    state::AppState,
    storage::{
        AuditEvent, AuditEventType, AuditRepository, DocumentStore, StorageError, StoredUser,
        UserPatch, UserRepository, UserStore,
    },
};

/// Check a permission and audit the denial.
fn authorize(
    storage: &DocumentStore,
    caller: &AuthenticatedUser,
    permission: Permission,
    target: &str,
) -> Result<(), ApiError> {
    caller.require(permission).map_err(|e| {
        AuditRepository::new(storage).record(
            AuditEvent::new(AuditEventType::PermissionDenied)
                .with_actor(&caller.user_id)
                .with_target(target)
                .failed(permission.name()),
        );
        ApiError::from(e)
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(UserListQuery),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserList),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Missing modify_all_users_restricted")
    )
)]
pub async fn list_users(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserList>, ApiError> {
    let storage = state.storage.read().await;
    authorize(&storage, &caller, Permission::ModifyAllUsersRestricted, "*")?;

    let users = UserRepository::new(&storage).list_all()?;
    Ok(Json(UserList::new(users, query.mapped)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    tag = "Users",
    responses(
        (status = 201, body = UserView),
        (status = 400, description = "Missing field"),
        (status = 401, description = "Authorization header present but invalid"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn create_user(
    MaybeAuth(caller): MaybeAuth,
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let Json(request) = payload?;
    let new_user = request.validate()?;

    let creator_role = caller.as_ref().map_or(Role::ANON, |c| c.role);
    let role = match new_user.role {
        Some(requested) if creator_role.has_permission(Permission::ModifyAllUsers) => requested,
        Some(requested) => {
            tracing::debug!(requested = %requested, "Ignoring role on self-service signup");
            Role::USER
        }
        None => Role::USER,
    };

    let user = StoredUser::new(
        new_user.username,
        new_user.email,
        password_digest(&new_user.password),
        role,
    );

    let storage = state.storage.write().await;
    UserRepository::new(&storage).insert(&user)?;

    let actor = caller.as_ref().map_or(user.id.as_str(), |c| c.user_id.as_str());
    audit_log!(&storage, AuditEventType::UserCreated, actor, &user.id);
    tracing::info!(user_id = %user.id, role = %user.role, "User created");

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user}",
    params(("user" = String, Path, description = "User id or username")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserView),
        (status = 403, description = "Not self and missing modify_all_users_restricted"),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let storage = state.storage.read().await;
    let repo = UserRepository::new(&storage);

    if caller.is_target(&target) {
        return Ok(Json(repo.find_by_id(&caller.user_id)?.into()));
    }

    authorize(&storage, &caller, Permission::ModifyAllUsersRestricted, &target)?;
    Ok(Json(repo.resolve(&target)?.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{user}",
    params(("user" = String, Path, description = "User id or username")),
    request_body = UpdateUserRequest,
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserView),
        (status = 400, description = "Blank field, or password change without oldPassword"),
        (status = 401, description = "oldPassword does not match"),
        (status = 403, description = "Not allowed to modify this user or its role"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn update_user(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(target): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserView>, ApiError> {
    let Json(request) = payload?;
    let storage = state.storage.write().await;
    let repo = UserRepository::new(&storage);

    if !caller.is_target(&target) {
        authorize(&storage, &caller, Permission::ModifyAllUsersRestricted, &target)?;
    }
    if request.role.is_some() {
        authorize(&storage, &caller, Permission::ModifyAllUsers, &target)?;
    }
    request.validate()?;

    let user = repo.resolve(&target)?;

    if request.password.is_some() && !caller.has_permission(Permission::ModifyAllUsers) {
        let old_password = request.old_password.as_deref().ok_or(ValidationError {
            field: "oldPassword",
            expected: "string",
        })?;
        match repo.find_by_credentials(&user.username, &password_digest(old_password)) {
            Ok(_) => {}
            Err(StorageError::NotFound(_)) => {
                tracing::info!(user_id = %user.id, "Password change with wrong old password");
                return Err(ApiError::unauthorized());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let patch = UserPatch {
        username: request.username.map(|v| v.trim().to_string()),
        email: request.email.map(|v| v.trim().to_string()),
        password_digest: request.password.as_deref().map(password_digest),
        role: request.role,
    };
    let fields: Vec<&str> = [
        ("username", patch.username.is_some()),
        ("email", patch.email.is_some()),
        ("password", patch.password_digest.is_some()),
        ("role", patch.role.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, touched)| touched.then_some(name))
    .collect();

    let updated = repo.update(&user.id, patch)?;

    AuditRepository::new(&storage).record(
        AuditEvent::new(AuditEventType::UserUpdated)
            .with_actor(&caller.user_id)
            .with_target(&updated.id)
            .with_details(serde_json::json!({ "fields": fields })),
    );
    tracing::info!(user_id = %updated.id, actor = %caller.user_id, "User updated");

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{user}",
    params(("user" = String, Path, description = "User id or username")),
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, body = UserView),
        (status = 403, description = "Not self and missing modify_all_users"),
        (status = 404, description = "No such user")
    )
)]
pub async fn delete_user(
    Auth(caller): Auth,
    State(state): State<AppState>,
    Path(target): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let storage = state.storage.write().await;
    let repo = UserRepository::new(&storage);

    if !caller.is_target(&target) {
        authorize(&storage, &caller, Permission::ModifyAllUsers, &target)?;
    }

    let user = repo.resolve(&target)?;
    let deleted = repo.delete(&user.id)?;

    audit_log!(&storage, AuditEventType::UserDeleted, &caller.user_id, &deleted.id);
    tracing::info!(user_id = %deleted.id, actor = %caller.user_id, "User deleted");

    Ok(Json(deleted.into()))
}
