//! Sign-in flows run from the command line before the editor starts.

use std::collections::HashMap;
use std::io::{self, Write};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse};
use axum::{Router, routing::get};
use forge_api::HttpBackend;
use forge_auth::{MemoryLocation, RehydrateOutcome, Session, SessionStore};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use url::Url;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(180);
const MIN_PASSWORD_LEN: usize = 8;
const SIGNED_IN_HTML: &str = "<!doctype html><html><head><meta charset=\"utf-8\" /><title>Signed in</title></head><body><p>You are signed in to Forge Studio. Return to your terminal.</p></body></html>";
const FAILED_HTML: &str = "<!doctype html><html><head><meta charset=\"utf-8\" /><title>Sign-in failed</title></head><body><p>Google sign-in failed. Return to your terminal and try again.</p></body></html>";

type BoxError = Box<dyn std::error::Error>;

pub fn validate_login(email: &str, password: &str) -> Result<(), String> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Please fill in both fields.".to_string());
    }
    Ok(())
}

pub fn validate_signup(name: &str, email: &str, password: &str) -> Result<(), String> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err("Please fill in all fields.".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters long.".to_string());
    }
    Ok(())
}

pub async fn login(
    sessions: &mut SessionStore,
    backend: &HttpBackend,
    email: Option<String>,
) -> Result<(), BoxError> {
    let email = match email {
        Some(email) => email,
        None => prompt_line("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;
    validate_login(&email, &password)?;

    let session = sessions
        .login_with_password(backend, &email, &password)
        .await?;
    print_signed_in(session);
    Ok(())
}

pub async fn signup(
    sessions: &mut SessionStore,
    backend: &HttpBackend,
    name: Option<String>,
    email: Option<String>,
) -> Result<(), BoxError> {
    let name = match name {
        Some(name) => name,
        None => prompt_line("Name: ")?,
    };
    let email = match email {
        Some(email) => email,
        None => prompt_line("Email: ")?,
    };
    let password = rpassword::prompt_password("Password (8+ characters): ")?;
    validate_signup(&name, &email, &password)?;

    let session = sessions.signup(backend, &name, &email, &password).await?;
    print_signed_in(session);
    Ok(())
}

/// Open the proxy's Google sign-in page and wait for it to redirect back to
/// `callback_url`, then consume the redirect payload.
pub async fn google(
    sessions: &mut SessionStore,
    backend: &HttpBackend,
    callback_url: &Url,
) -> Result<(), BoxError> {
    let authorize_url = backend.google_authorize_url()?;
    println!("Sign in with Google:\n{authorize_url}");
    if let Err(err) = webbrowser::open(authorize_url.as_str()) {
        eprintln!("failed to open browser: {err}");
    }

    let redirect = match wait_for_redirect(callback_url).await? {
        Some(url) => url,
        None => Url::parse(&prompt_line("Paste the address your browser landed on: ")?)?,
    };

    let location = MemoryLocation::new(redirect);
    match sessions.rehydrate(&location)? {
        RehydrateOutcome::Redirect => {
            if let Some(session) = sessions.current() {
                print_signed_in(session);
            }
            Ok(())
        }
        RehydrateOutcome::RedirectFailed(reason) => {
            Err(format!("Google sign-in failed: {reason}").into())
        }
        RehydrateOutcome::Persisted | RehydrateOutcome::Anonymous => {
            Err("The redirect did not carry a sign-in.".into())
        }
    }
}

fn print_signed_in(session: &Session) {
    println!(
        "Signed in as {} <{}>",
        session.identity.name, session.identity.email
    );
}

#[derive(Clone)]
struct CallbackState {
    base: Url,
    expected_path: String,
    tx: mpsc::UnboundedSender<Url>,
}

/// Listen on the callback address. `None` when the address is not local or
/// cannot be bound, or when nothing arrives in time.
async fn wait_for_redirect(callback_url: &Url) -> Result<Option<Url>, BoxError> {
    if callback_url.scheme() != "http" {
        return Ok(None);
    }
    let host = callback_url.host_str().unwrap_or("127.0.0.1");
    if host != "127.0.0.1" && host != "localhost" {
        return Ok(None);
    }
    let port = callback_url.port_or_known_default().unwrap_or(80);

    let listener = match TcpListener::bind(("127.0.0.1", port)).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::warn!(%port, error = %err, "could not bind sign-in callback listener");
            return Ok(None);
        }
    };
    Ok(capture_redirect(listener, callback_url.clone(), CALLBACK_TIMEOUT).await)
}

async fn capture_redirect(listener: TcpListener, base: Url, timeout: Duration) -> Option<Url> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Url>();
    let state = CallbackState {
        expected_path: base.path().to_string(),
        base,
        tx,
    };

    let app = Router::new()
        .route("/", get(callback))
        .route("/{*path}", get(callback))
        .with_state(state);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        let _ = shutdown_rx.await;
    });
    let server_task = tokio::spawn(async move {
        let _ = server.await;
    });

    let result = tokio::time::timeout(timeout, rx.recv()).await;
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(Duration::from_secs(2), server_task).await;

    result.ok().flatten()
}

async fn callback(
    State(state): State<CallbackState>,
    Query(query): Query<HashMap<String, String>>,
    uri: Uri,
) -> impl IntoResponse {
    if uri.path() != state.expected_path {
        return (StatusCode::NOT_FOUND, Html("Not found")).into_response();
    }

    let mut landed = state.base.clone();
    landed.set_query(uri.query());
    let _ = state.tx.send(landed);

    if query.contains_key("error") {
        (StatusCode::OK, Html(FAILED_HTML)).into_response()
    } else {
        (StatusCode::OK, Html(SIGNED_IN_HTML)).into_response()
    }
}

fn prompt_line(prompt: &str) -> Result<String, io::Error> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        assert_eq!(
            validate_login(" ", "secret"),
            Err("Please fill in both fields.".to_string())
        );
        assert!(validate_login("ada@example.com", "secret").is_ok());
    }

    #[test]
    fn signup_enforces_password_length() {
        assert_eq!(
            validate_signup("Ada", "", "longenough"),
            Err("Please fill in all fields.".to_string())
        );
        assert_eq!(
            validate_signup("Ada", "ada@example.com", "short"),
            Err("Password must be at least 8 characters long.".to_string())
        );
        assert!(validate_signup("Ada", "ada@example.com", "longenough").is_ok());
    }

    #[tokio::test]
    async fn callback_captures_redirect_query() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let base = Url::parse(&format!("http://127.0.0.1:{port}/")).expect("url");

        let capture = tokio::spawn(capture_redirect(
            listener,
            base,
            Duration::from_secs(5),
        ));

        let client = reqwest::Client::new();
        let missing = client
            .get(format!("http://127.0.0.1:{port}/elsewhere"))
            .send()
            .await
            .expect("request");
        assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);

        let response = client
            .get(format!(
                "http://127.0.0.1:{port}/?user=%7B%22id%22%3A%22u1%22%7D&token=abc"
            ))
            .send()
            .await
            .expect("request");
        assert!(response.status().is_success());

        let landed = capture.await.expect("join").expect("redirect captured");
        let pairs: HashMap<String, String> = landed.query_pairs().into_owned().collect();
        assert_eq!(pairs.get("token").map(String::as_str), Some("abc"));
        assert_eq!(pairs.get("user").map(String::as_str), Some("{\"id\":\"u1\"}"));
    }

    #[tokio::test]
    async fn callback_times_out_quietly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base = Url::parse("http://127.0.0.1/").expect("url");
        assert_eq!(
            capture_redirect(listener, base, Duration::from_millis(50)).await,
            None
        );
    }
}
