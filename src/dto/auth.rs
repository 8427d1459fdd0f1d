use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// Acknowledgement of an OTP send. Non-production backends echo the code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtpSent {
    pub email: Option<String>,
    pub otp: Option<String>,
    pub dev_otp: Option<DevOtp>,
}

/// Dev-mode marker: either the code itself or a bare `true` flag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DevOtp {
    Code(String),
    Flag(bool),
}

impl OtpSent {
    pub fn dev_code(&self) -> Option<&str> {
        let dev_otp = match &self.dev_otp {
            Some(DevOtp::Code(code)) => Some(code.as_str()),
            _ => None,
        };
        self.otp
            .as_deref()
            .or(dev_otp)
            .filter(|code| !code.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ApiResponse;

    #[test]
    fn dev_flag_is_accepted_without_a_code() {
        let resp: ApiResponse<OtpSent> = serde_json::from_str(
            r#"{"success":true,"message":"Dev mode","data":{"email":"a@b.co","dev_otp":true}}"#,
        )
        .unwrap();
        let sent = resp.into_data().unwrap();
        assert_eq!(sent.dev_otp, Some(DevOtp::Flag(true)));
        assert_eq!(sent.dev_code(), None);
    }

    #[test]
    fn echoed_code_is_used_from_either_field() {
        let sent: OtpSent = serde_json::from_str(r#"{"dev_otp":"482913"}"#).unwrap();
        assert_eq!(sent.dev_code(), Some("482913"));
        let sent: OtpSent = serde_json::from_str(r#"{"otp":"104729","dev_otp":true}"#).unwrap();
        assert_eq!(sent.dev_code(), Some("104729"));
    }
}
