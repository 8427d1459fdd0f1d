//! Email + one-time-code login, shared by the customer and admin surfaces.
//!
//! The flow has two steps: `AwaitingEmail` sends a code, `AwaitingCode` verifies it.
//! The admin surface reuses the common verification endpoint and rejects
//! non-admin accounts only after a token has been issued, logging them back out.

mod code;

use std::time::Duration;

pub use code::{Cooldown, OTP_LENGTH, OtpCode};

use crate::{
    dto::auth::OtpSent,
    error::{AppError, AppResult},
    guard::Page,
    response::ApiResponse,
    session::SessionStore,
};

pub const NOT_ADMIN: &str =
    "This account does not have admin privileges. Please use the Student login.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginSurface {
    User,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpStep {
    AwaitingEmail,
    AwaitingCode,
}

#[derive(Debug)]
pub struct OtpFlow {
    surface: LoginSurface,
    session: SessionStore,
    step: OtpStep,
    email: String,
    code: OtpCode,
    dev_code: Option<String>,
    cooldown: Cooldown,
    return_to: Page,
    error: Option<String>,
}

impl OtpFlow {
    pub fn new(surface: LoginSurface, session: SessionStore, cooldown: Duration) -> Self {
        Self {
            surface,
            session,
            step: OtpStep::AwaitingEmail,
            email: String::new(),
            code: OtpCode::new(),
            dev_code: None,
            cooldown: Cooldown::new(cooldown),
            return_to: Page::Landing,
            error: None,
        }
    }

    /// Page a customer goes back to after logging in.
    pub fn returning_to(mut self, page: Page) -> Self {
        self.return_to = page;
        self
    }

    pub fn step(&self) -> OtpStep {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn code(&self) -> &OtpCode {
        &self.code
    }

    pub fn code_mut(&mut self) -> &mut OtpCode {
        &mut self.code
    }

    /// Code echoed by a non-production backend, if any.
    pub fn dev_code(&self) -> Option<&str> {
        self.dev_code.as_deref()
    }

    pub fn resend_in(&self) -> u64 {
        self.cooldown.remaining_secs()
    }

    /// Last error to show inline, cleared by the next action.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub async fn submit_email(&mut self, email: &str) -> AppResult<()> {
        if self.step != OtpStep::AwaitingEmail {
            return self.fail(AppError::Validation("A code has already been requested".into()));
        }
        self.error = None;
        let email = email.trim().to_string();
        let resp = match self.request_code(&email).await {
            Ok(resp) => resp,
            Err(err) => return self.fail(err),
        };

        self.email = email;
        self.step = OtpStep::AwaitingCode;
        self.code.clear();
        self.accept_sent(resp);
        Ok(())
    }

    /// Sends a fresh code. Returns `false` without contacting the server while cooling down.
    pub async fn resend(&mut self) -> AppResult<bool> {
        if self.step != OtpStep::AwaitingCode {
            return self.fail(AppError::Validation("Enter your email first".into()));
        }
        if !self.cooldown.is_ready() {
            return Ok(false);
        }
        self.error = None;
        let email = self.email.clone();
        match self.request_code(&email).await {
            Ok(resp) => {
                self.accept_sent(resp);
                Ok(true)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Verifies the entered code and returns where to go next.
    pub async fn verify(&mut self) -> AppResult<Page> {
        if self.step != OtpStep::AwaitingCode {
            return self.fail(AppError::Validation("Enter your email first".into()));
        }
        let Some(code) = self.code.value() else {
            return self.fail(AppError::Validation(format!(
                "Please enter the complete {OTP_LENGTH}-digit OTP"
            )));
        };
        self.error = None;

        let session = match self.session.verify_otp(&self.email, &code).await {
            Ok(session) => session,
            Err(err) => return self.fail(err),
        };

        match self.surface {
            LoginSurface::Admin if !session.is_admin() => {
                tracing::warn!(user_id = %session.user_id, "non-admin account used the admin login");
                self.session.logout();
                self.fail(AppError::Forbidden(NOT_ADMIN.into()))
            }
            LoginSurface::Admin => Ok(Page::AdminDashboard),
            LoginSurface::User if session.is_admin() => Ok(Page::AdminDashboard),
            LoginSurface::User => Ok(self.return_to),
        }
    }

    /// Back to the email step. The resend cooldown keeps running.
    pub fn change_email(&mut self) {
        self.step = OtpStep::AwaitingEmail;
        self.code.clear();
        self.dev_code = None;
        self.error = None;
    }

    async fn request_code(&self, email: &str) -> AppResult<ApiResponse<OtpSent>> {
        match self.surface {
            LoginSurface::User => self.session.login(email).await,
            LoginSurface::Admin => self.session.admin_login(email).await,
        }
    }

    fn accept_sent(&mut self, resp: ApiResponse<OtpSent>) {
        self.dev_code = resp
            .data
            .as_ref()
            .and_then(OtpSent::dev_code)
            .map(str::to_string);
        if let Some(dev_code) = self.dev_code.as_deref() {
            self.code.paste(dev_code);
        }
        self.cooldown.start();
        tracing::info!(surface = ?self.surface, "login code sent");
    }

    fn fail<T>(&mut self, err: AppError) -> AppResult<T> {
        self.error = Some(err.user_message());
        Err(err)
    }
}
