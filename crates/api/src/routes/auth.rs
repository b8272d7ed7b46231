//! Account routes: registration, confirmation, login and password flows.

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    http::{StatusCode, request::Parts},
    routing::{get, post, put},
};
use cashtrackr_core::{
    account::{ProfileUpdate, Registration, UserProfile},
    auth::is_opaque_token_shape,
};
use cashtrackr_shared::{AppError, FieldError};
use tracing::debug;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    extractors::{ValidatedJson, segment_after},
    middleware::AuthUser,
    validation::{Body, Field, RequestBody, Rule},
};

/// Routes that need no session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/create-account", post(create_account))
        .route("/auth/confirm-account", post(confirm_account))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/validate-token", post(validate_token))
        .route("/auth/reset-password/{token}", post(reset_password))
}

/// Routes acting on the authenticated user (requires auth middleware to be applied externally).
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/user", get(current_user))
        .route("/auth/update-password", post(update_password))
        .route("/auth/check-password", post(check_password))
        .route("/auth/update-profile", put(update_profile))
}

// ============================================================================
// Request bodies
// ============================================================================

const EMAIL: Field = Field {
    name: "email",
    rules: &[Rule::Email("Email no válido")],
};

const NEW_PASSWORD: Field = Field {
    name: "password",
    rules: &[Rule::MinLength(
        8,
        "El password es muy corto, mínimo 8 caracteres",
    )],
};

const TOKEN: Field = Field {
    name: "token",
    rules: &[
        Rule::NotEmpty("Token no válido"),
        Rule::Length(6, "Token no válido"),
    ],
};

/// Body of `POST /auth/create-account`.
#[derive(Debug)]
pub struct CreateAccountBody {
    name: String,
    email: String,
    password: String,
}

impl RequestBody for CreateAccountBody {
    const FIELDS: &'static [Field] = &[
        Field {
            name: "name",
            rules: &[Rule::NotEmpty("El nombre no puede ir vacio")],
        },
        NEW_PASSWORD,
        EMAIL,
    ];

    fn from_body(body: &Body) -> Self {
        Self {
            name: body.text("name"),
            email: body.text("email"),
            password: body.text("password"),
        }
    }
}

/// Body carrying a 6-digit token.
#[derive(Debug)]
pub struct TokenBody {
    token: String,
}

impl RequestBody for TokenBody {
    const FIELDS: &'static [Field] = &[TOKEN];

    fn from_body(body: &Body) -> Self {
        Self {
            token: body.text("token"),
        }
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug)]
pub struct LoginBody {
    email: String,
    password: String,
}

impl RequestBody for LoginBody {
    const FIELDS: &'static [Field] = &[
        EMAIL,
        Field {
            name: "password",
            rules: &[Rule::NotEmpty("El password es obligatorio")],
        },
    ];

    fn from_body(body: &Body) -> Self {
        Self {
            email: body.text("email"),
            password: body.text("password"),
        }
    }
}

/// Body of `POST /auth/forgot-password`.
#[derive(Debug)]
pub struct EmailBody {
    email: String,
}

impl RequestBody for EmailBody {
    const FIELDS: &'static [Field] = &[EMAIL];

    fn from_body(body: &Body) -> Self {
        Self {
            email: body.text("email"),
        }
    }
}

/// Body of `POST /auth/reset-password/{token}`.
#[derive(Debug)]
pub struct NewPasswordBody {
    password: String,
}

impl RequestBody for NewPasswordBody {
    const FIELDS: &'static [Field] = &[NEW_PASSWORD];

    fn from_body(body: &Body) -> Self {
        Self {
            password: body.text("password"),
        }
    }
}

/// Body of `POST /auth/update-password`.
#[derive(Debug)]
pub struct UpdatePasswordBody {
    current_password: String,
    password: String,
}

impl RequestBody for UpdatePasswordBody {
    const FIELDS: &'static [Field] = &[
        Field {
            name: "current_password",
            rules: &[Rule::NotEmpty("El password actual no puede ir vacio")],
        },
        Field {
            name: "password",
            rules: &[Rule::MinLength(
                8,
                "El password nuevo es muy corto, mínimo 8 caracteres",
            )],
        },
    ];

    fn from_body(body: &Body) -> Self {
        Self {
            current_password: body.text("current_password"),
            password: body.text("password"),
        }
    }
}

/// Body of `POST /auth/check-password`.
#[derive(Debug)]
pub struct CheckPasswordBody {
    password: String,
}

impl RequestBody for CheckPasswordBody {
    const FIELDS: &'static [Field] = &[Field {
        name: "password",
        rules: &[Rule::NotEmpty("El password actual no puede ir vacio")],
    }];

    fn from_body(body: &Body) -> Self {
        Self {
            password: body.text("password"),
        }
    }
}

/// Body of `PUT /auth/update-profile`.
#[derive(Debug)]
pub struct ProfileBody {
    name: String,
    email: String,
}

impl RequestBody for ProfileBody {
    const FIELDS: &'static [Field] = &[
        Field {
            name: "name",
            rules: &[Rule::NotEmpty("Tu nombre no puede ir vacio")],
        },
        EMAIL,
    ];

    fn from_body(body: &Body) -> Self {
        Self {
            name: body.text("name"),
            email: body.text("email"),
        }
    }
}

/// The `{token}` path segment of the reset route, checked for shape.
#[derive(Debug)]
pub struct ResetToken(String);

impl<S> FromRequestParts<S> for ResetToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = match Path::<String>::from_request_parts(parts, state).await {
            Ok(Path(token)) if is_opaque_token_shape(&token) => return Ok(Self(token)),
            Ok(Path(token)) => token,
            Err(rejection) => {
                debug!(error = %rejection, "Undecodable reset token");
                segment_after(parts.uri.path(), "reset-password").unwrap_or_default()
            }
        };

        Err(ApiError(AppError::Validation(vec![FieldError::param(
            "token",
            &token,
            "Token no válido",
        )])))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/create-account - Register and send the confirmation email.
async fn create_account(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateAccountBody>,
) -> ApiResult<(StatusCode, Json<&'static str>)> {
    state
        .accounts()
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json("Cuenta Creada Correctamente")))
}

/// POST /auth/confirm-account - Confirm with the emailed token.
async fn confirm_account(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<TokenBody>,
) -> ApiResult<Json<&'static str>> {
    state.accounts().confirm(&body.token).await?;
    Ok(Json("Cuenta confirmada correctamente"))
}

/// POST /auth/login - Returns the session token as a JSON string.
async fn login(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<LoginBody>,
) -> ApiResult<Json<String>> {
    let token = state.accounts().login(&body.email, &body.password).await?;
    Ok(Json(token))
}

/// POST /auth/forgot-password - Email a reset token.
async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<EmailBody>,
) -> ApiResult<Json<&'static str>> {
    state.accounts().forgot_password(&body.email).await?;
    Ok(Json("Revisa tu email para instrucciones"))
}

/// POST /auth/validate-token - Check a reset token before asking for a password.
async fn validate_token(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<TokenBody>,
) -> ApiResult<Json<&'static str>> {
    state.accounts().validate_reset_token(&body.token).await?;
    Ok(Json("Token válido, asigna un nuevo password"))
}

/// POST /auth/reset-password/{token} - Set a new password with a reset token.
async fn reset_password(
    State(state): State<AppState>,
    ResetToken(token): ResetToken,
    ValidatedJson(body): ValidatedJson<NewPasswordBody>,
) -> ApiResult<Json<&'static str>> {
    state.accounts().reset_password(&token, body.password).await?;
    Ok(Json("El password se modificó correctamente"))
}

/// GET /auth/user - The authenticated user.
async fn current_user(AuthUser(user): AuthUser) -> Json<UserProfile> {
    Json(user)
}

/// POST /auth/update-password - Change password knowing the current one.
async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<UpdatePasswordBody>,
) -> ApiResult<Json<&'static str>> {
    state
        .accounts()
        .change_password(user.user_id(), &body.current_password, body.password)
        .await?;
    Ok(Json("El password se modificó correctamente"))
}

/// POST /auth/check-password - Confirm the current password.
async fn check_password(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<CheckPasswordBody>,
) -> ApiResult<Json<&'static str>> {
    state
        .accounts()
        .verify_current_password(user.user_id(), &body.password)
        .await?;
    Ok(Json("Password correcto"))
}

/// PUT /auth/update-profile - Change name and email.
async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(body): ValidatedJson<ProfileBody>,
) -> ApiResult<Json<&'static str>> {
    state
        .accounts()
        .update_profile(
            user.user_id(),
            ProfileUpdate {
                name: body.name,
                email: body.email,
            },
        )
        .await?;
    Ok(Json("Perfil actualizado correctamente"))
}
