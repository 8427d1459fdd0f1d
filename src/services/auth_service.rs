use crate::{
    client::ApiClient,
    dto::auth::{LoginRequest, OtpSent, RegisterRequest, TokenResponse, VerifyOtpRequest},
    error::{AppError, AppResult},
    models::User,
    response::ApiResponse,
};

pub async fn register_user(api: &ApiClient, payload: RegisterRequest) -> AppResult<ApiResponse<User>> {
    let RegisterRequest { name, email, phone } = payload;
    let name = name.trim().to_string();
    let email = normalize_email(&email)?;
    let phone = phone.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if !(10..=15).contains(&phone.len()) {
        return Err(AppError::Validation(
            "Phone number must be 10 to 15 characters".into(),
        ));
    }

    let resp = api
        .post("auth/register", &RegisterRequest { name, email, phone })
        .await?;
    tracing::info!("account registered");
    Ok(resp)
}

pub async fn send_otp(api: &ApiClient, email: &str) -> AppResult<ApiResponse<OtpSent>> {
    let email = normalize_email(email)?;
    api.post("auth/login", &LoginRequest { email }).await
}

pub async fn send_admin_otp(api: &ApiClient, email: &str) -> AppResult<ApiResponse<OtpSent>> {
    let email = normalize_email(email)?;
    api.post("auth/admin-login", &LoginRequest { email }).await
}

pub async fn verify_otp(
    api: &ApiClient,
    email: &str,
    otp: &str,
) -> AppResult<ApiResponse<TokenResponse>> {
    let payload = VerifyOtpRequest {
        email: normalize_email(email)?,
        otp: otp.to_string(),
    };
    api.post("auth/verify-otp", &payload).await
}

/// Cheap shape check so obviously bad input never reaches the network.
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.starts_with('.'));
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!("'{email}' is not a valid email address")));
    }
    Ok(email.to_string())
}
