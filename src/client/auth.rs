// Parley — Auth endpoints
// /login (form), /signup (multipart), /signout (best-effort), /user.

use log::{debug, info};
use reqwest::multipart::{Form, Part};

use super::{http, ApiClient};
use crate::atoms::error::ClientResult;
use crate::atoms::types::{LoginResponse, SignupRequest, SignupResponse, UserProfile};

impl ApiClient {
    /// `POST /login` with form-encoded credentials.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<LoginResponse> {
        debug!("[auth] login as {}", username);
        let response = self
            .http
            .post(self.url("/login"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        let response = http::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// `POST /signup` as a multipart form: profile fields plus an optional
    /// `profile_picture` file part.
    pub async fn signup(&self, request: &SignupRequest) -> ClientResult<SignupResponse> {
        info!("[auth] signup for {}", request.username);

        let mut form = Form::new()
            .text("username", request.username.clone())
            .text("password", request.password.clone())
            .text("confirm_password", request.confirm_password.clone())
            .text("age", request.age.to_string())
            .text("profession", request.profession.clone())
            .text("email", request.email.clone())
            .text("phonenumber", request.phone.clone());

        if let Some(description) = &request.description {
            form = form.text("description", description.clone());
        }
        if let Some(picture) = &request.profile_picture {
            let part = Part::bytes(picture.bytes.clone()).file_name(picture.file_name.clone());
            form = form.part("profile_picture", part);
        }

        let response = self
            .http
            .post(self.url("/signup"))
            .multipart(form)
            .send()
            .await?;
        let response = http::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// `POST /signout` with the token as a form field. Best-effort: callers
    /// clear local session state whether or not this succeeds.
    pub async fn signout(&self, token: &str) -> ClientResult<()> {
        debug!("[auth] signout");
        let response = self
            .http
            .post(self.url("/signout"))
            .form(&[("token", token)])
            .send()
            .await?;
        http::ensure_success(response).await?;
        Ok(())
    }

    /// `GET /user` with the bearer token — the current profile.
    pub async fn fetch_user(&self) -> ClientResult<UserProfile> {
        let response = self
            .authorize(self.http.get(self.url("/user")))
            .send()
            .await?;
        let response = http::ensure_success(response).await?;
        Ok(response.json().await?)
    }
}
