use log::{debug, info, warn};
use reqwest::cookie::CookieStore;
use reqwest::StatusCode;

use super::core::{check_status, JenkinsClient, LoginState};
use crate::error::{JenkinsError, Result};
use crate::types::Crumb;

/// Marker Jenkins renders on its pages for anonymous visitors.
const LOGIN_MARKER: &str = "log in";

fn needs_login(page: &str) -> bool {
    page.to_lowercase().contains(LOGIN_MARKER)
}

impl JenkinsClient {
    /// Logs in unless the stored session is already authenticated.
    ///
    /// Runs at most once per process; a failure is remembered and returned
    /// to every later caller.
    pub(super) async fn ensure_login(&mut self) -> Result<()> {
        match &self.login {
            LoginState::Ready => return Ok(()),
            LoginState::Failed(reason) => return Err(JenkinsError::Auth(reason.clone())),
            LoginState::Pending => {}
        }

        match self.login().await {
            Ok(()) => {
                self.login = LoginState::Ready;
                Ok(())
            }
            Err(e) => {
                self.login = LoginState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn login(&mut self) -> Result<()> {
        let page = self.get_text(self.base_url.clone()).await?;
        if !needs_login(&page) {
            debug!("Session already authenticated");
            return Ok(());
        }

        let user = self.credentials.user()?;
        let password = self.credentials.password(&user)?;

        let url = self.endpoint(&["j_acegi_security_check"])?;
        let form = [
            ("j_username", user.as_str()),
            ("j_password", password.as_str()),
            ("from", "/"),
            ("remember_me", "on"),
            ("Submit", "log in"),
        ];
        let response = self.execute(self.client.post(url).form(&form)).await?;

        // The error page may itself answer with a failure status.
        if response.url().as_str().contains("loginError") {
            return Err(JenkinsError::Auth(format!(
                "invalid username or password for {user}"
            )));
        }
        check_status(response).await?;

        info!("Logged in to {} as {user}", self.base_url);
        self.persist_session();
        Ok(())
    }

    fn persist_session(&self) {
        let Some(cookies) = self.jar.cookies(&self.base_url) else {
            warn!("Login succeeded but the server set no session cookie");
            return;
        };

        match cookies.to_str() {
            Ok(cookies) => {
                if let Err(e) = self.session.save(&self.base_url, cookies) {
                    warn!("Failed to save session: {e}");
                }
            }
            Err(e) => warn!("Session cookie is not valid text: {e}"),
        }
    }

    /// CSRF crumb header to send with writes, fetched once.
    ///
    /// Servers without a crumb issuer answer 404; any other failure to get a
    /// crumb is logged and writes go out without one.
    pub(super) async fn crumb(&mut self) -> Result<Option<(String, String)>> {
        if let Some(crumb) = &self.crumb {
            return Ok(crumb.clone());
        }

        let url = self.api_url(&["crumbIssuer"], "crumb,crumbRequestField")?;
        let crumb = match self.get_json::<Crumb>(url).await {
            Ok(crumb) => Some((crumb.crumb_request_field, crumb.crumb)),
            Err(JenkinsError::Api { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                debug!("Server issues no CSRF crumb");
                None
            }
            Err(JenkinsError::Network(e)) => return Err(JenkinsError::Network(e)),
            Err(e) => {
                warn!("Could not fetch CSRF crumb, continuing without one: {e}");
                None
            }
        };

        self.crumb = Some(crumb.clone());
        Ok(crumb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, Password};
    use crate::client::SessionStore;
    use mockito::Matcher;

    fn credentials() -> Credentials {
        Credentials {
            user: Some("alice".to_string()),
            password: Some(Password::from("s3cret")),
            password_command: None,
        }
    }

    #[test]
    fn test_needs_login_marker() {
        assert!(needs_login(r#"<a href="/login?from=%2F"><b>Log in</b></a>"#));
        assert!(!needs_login(r#"<a href="/logout"><b>log out</b></a>"#));
    }

    #[tokio::test]
    async fn test_login_posts_credentials_and_persists_cookie() {
        let mut server = mockito::Server::new_async().await;
        let probe = server
            .mock("GET", "/")
            .with_body("<html><a href=\"/login\">log in</a></html>")
            .expect(1)
            .create_async()
            .await;
        let login = server
            .mock("POST", "/j_acegi_security_check")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("j_username".into(), "alice".into()),
                Matcher::UrlEncoded("j_password".into(), "s3cret".into()),
            ]))
            .with_header("set-cookie", "JSESSIONID.abc=xyz; Path=/; HttpOnly")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path().join("session.json"));
        let mut client = JenkinsClient::new(&server.url(), credentials(), store.clone()).unwrap();

        client.ensure_login().await.unwrap();
        client.ensure_login().await.unwrap();

        probe.assert_async().await;
        login.assert_async().await;
        let saved = store.load(client.base_url()).unwrap();
        assert!(saved.contains("JSESSIONID.abc=xyz"));
    }

    #[tokio::test]
    async fn test_login_skipped_when_session_is_valid() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_body("<html><a href=\"/logout\">log out</a></html>")
            .create_async()
            .await;
        let login = server
            .mock("POST", "/j_acegi_security_check")
            .expect(0)
            .create_async()
            .await;

        let mut client =
            JenkinsClient::new(&server.url(), credentials(), SessionStore::ephemeral()).unwrap();
        client.ensure_login().await.unwrap();

        login.assert_async().await;
    }

    #[tokio::test]
    async fn test_login_error_is_remembered() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_body("log in")
            .expect(1)
            .create_async()
            .await;
        let _m = server
            .mock("POST", "/j_acegi_security_check")
            .with_status(302)
            .with_header("location", "/loginError")
            .expect(1)
            .create_async()
            .await;
        let _m = server
            .mock("GET", "/loginError")
            .with_body("Invalid username or password")
            .create_async()
            .await;

        let mut client =
            JenkinsClient::new(&server.url(), credentials(), SessionStore::ephemeral()).unwrap();

        assert!(matches!(client.ensure_login().await, Err(JenkinsError::Auth(_))));
        assert!(matches!(client.ensure_login().await, Err(JenkinsError::Auth(_))));
    }

    #[tokio::test]
    async fn test_login_error_page_with_failure_status_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_body("log in")
            .create_async()
            .await;
        let _m = server
            .mock("POST", "/j_acegi_security_check")
            .with_status(302)
            .with_header("location", "/loginError")
            .create_async()
            .await;
        let _m = server
            .mock("GET", "/loginError")
            .with_status(401)
            .with_body("Invalid username or password")
            .create_async()
            .await;

        let mut client =
            JenkinsClient::new(&server.url(), credentials(), SessionStore::ephemeral()).unwrap();

        assert!(matches!(client.ensure_login().await, Err(JenkinsError::Auth(_))));
    }

    #[tokio::test]
    async fn test_login_rejected_without_redirect_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_body("log in")
            .create_async()
            .await;
        let _m = server
            .mock("POST", "/j_acegi_security_check")
            .with_status(500)
            .create_async()
            .await;

        let mut client =
            JenkinsClient::new(&server.url(), credentials(), SessionStore::ephemeral()).unwrap();

        assert!(matches!(
            client.ensure_login().await,
            Err(JenkinsError::Api { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_crumb_is_fetched_once() {
        let mut server = mockito::Server::new_async().await;
        let issuer = server
            .mock("GET", "/crumbIssuer/api/json")
            .match_query(Matcher::Any)
            .with_body(r#"{"crumb": "c0ffee", "crumbRequestField": "Jenkins-Crumb"}"#)
            .expect(1)
            .create_async()
            .await;

        let mut client =
            JenkinsClient::new(&server.url(), credentials(), SessionStore::ephemeral()).unwrap();

        let expected = Some(("Jenkins-Crumb".to_string(), "c0ffee".to_string()));
        assert_eq!(client.crumb().await.unwrap(), expected);
        assert_eq!(client.crumb().await.unwrap(), expected);
        issuer.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_crumb_issuer() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/crumbIssuer/api/json")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let mut client =
            JenkinsClient::new(&server.url(), credentials(), SessionStore::ephemeral()).unwrap();
        assert_eq!(client.crumb().await.unwrap(), None);
    }
}
