// tests/login_flow_test.rs

mod common;

use common::{ENROLLED_URL, FakeBrowser, FakeMediaFetcher, FakePage, test_context_with_strategy};
use course_dl::{
    auth::{AuthState, Authenticator},
    cli::AuthStrategy,
    client::RobustClient,
    config::AppConfig,
    constants::selectors::login,
    error::{AppError, AppResult},
    run_courses,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;
use url::Url;

const COURSE_URL: &str = "https://school.example.com/p/web-api";
const LOGIN_URL: &str = "https://sso.example.com/sign_in";

const LOGIN_FORM: &str = r#"<html><body><form>
    <input id="email" type="email">
    <input id="password" type="password">
    <input type="submit" name="commit" value="Log In">
</form></body></html>"#;

const LOGIN_FORM_WITHOUT_PASSWORD: &str = r#"<html><body><form>
    <input id="email" type="email">
    <input type="submit" name="commit" value="Next">
</form></body></html>"#;

fn credentials() -> (String, String) {
    ("me@example.com".to_string(), "s3cret".to_string())
}

fn test_client(config: &Arc<AppConfig>) -> RobustClient {
    RobustClient::new(config.clone()).unwrap()
}

/// 表单可以正常填写，提交后跳转到已登录页面
fn accept_form_login(browser: &FakeBrowser) {
    browser.add_page(LOGIN_URL, FakePage::new(LOGIN_FORM));
    browser.respond_to_script("el.value = arguments[1]", json!(true));
    browser.navigate_on_click(login::SUBMIT, ENROLLED_URL);
}

#[tokio::test]
async fn test_discover_link_login_fills_form() -> AppResult<()> {
    let browser = FakeBrowser::new();
    browser.add_page(
        COURSE_URL,
        FakePage::new(r#"<html><body><a href="/sign_in">Login</a></body></html>"#),
    );
    accept_form_login(&browser);
    browser.respond_to_script("return a.href", json!(LOGIN_URL));

    let config = Arc::new(AppConfig::default());
    let (email, password) = credentials();
    let mut auth = Authenticator::new(AuthStrategy::DiscoverLink { email, password }, &config);
    assert_eq!(auth.state(), AuthState::Unauthenticated);

    auth.ensure_authenticated(browser.as_ref(), &test_client(&config), &Url::parse(COURSE_URL)?)
        .await?;

    assert_eq!(auth.state(), AuthState::Authenticated);
    assert_eq!(browser.navigations(), vec![COURSE_URL, LOGIN_URL, ENROLLED_URL]);
    assert_eq!(browser.clicks(), vec![login::SUBMIT]);

    let filled: Vec<_> = browser
        .scripts()
        .into_iter()
        .filter(|(script, _)| script.contains("el.value = arguments[1]"))
        .map(|(_, args)| args)
        .collect();
    assert_eq!(
        filled,
        vec![
            vec![json!(login::EMAIL), json!("me@example.com")],
            vec![json!(login::PASSWORD), json!("s3cret")],
        ]
    );

    // 已登录时不再重复登录
    auth.ensure_authenticated(browser.as_ref(), &test_client(&config), &Url::parse(COURSE_URL)?)
        .await?;
    assert_eq!(browser.navigations().len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_login_url_strategy_opens_given_page() -> AppResult<()> {
    let browser = FakeBrowser::new();
    accept_form_login(&browser);

    let config = Arc::new(AppConfig::default());
    let (email, password) = credentials();
    let strategy = AuthStrategy::LoginUrl { login_url: LOGIN_URL.to_string(), email, password };
    let mut auth = Authenticator::new(strategy, &config);

    auth.ensure_authenticated(browser.as_ref(), &test_client(&config), &Url::parse(COURSE_URL)?)
        .await?;

    assert!(auth.is_authenticated());
    // 不需要先打开课程页
    assert_eq!(browser.navigations(), vec![LOGIN_URL, ENROLLED_URL]);
    Ok(())
}

#[tokio::test]
async fn test_missing_login_link_fails_and_resets_state() -> AppResult<()> {
    let browser = FakeBrowser::new();
    browser.add_page(COURSE_URL, FakePage::new("<html><body><h1>Course</h1></body></html>"));

    let config = Arc::new(AppConfig::default());
    let (email, password) = credentials();
    let mut auth = Authenticator::new(AuthStrategy::DiscoverLink { email, password }, &config);

    let result = auth
        .ensure_authenticated(browser.as_ref(), &test_client(&config), &Url::parse(COURSE_URL)?)
        .await;

    assert!(matches!(result, Err(AppError::LoginFailed(_))));
    assert_eq!(auth.state(), AuthState::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn test_missing_password_field_is_fatal_for_course() -> AppResult<()> {
    let browser = FakeBrowser::new();
    browser.add_page(LOGIN_URL, FakePage::new(LOGIN_FORM_WITHOUT_PASSWORD));

    let config = Arc::new(AppConfig::default());
    let (email, password) = credentials();
    let strategy = AuthStrategy::LoginUrl { login_url: LOGIN_URL.to_string(), email, password };
    let mut auth = Authenticator::new(strategy, &config);

    let result = auth
        .ensure_authenticated(browser.as_ref(), &test_client(&config), &Url::parse(COURSE_URL)?)
        .await;

    assert!(matches!(result, Err(AppError::ElementTimeout { selector, .. }) if selector == login::PASSWORD));
    assert_eq!(auth.state(), AuthState::Unauthenticated);
    assert!(browser.clicks().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_batch_continues_after_failed_login() -> AppResult<()> {
    let browser = FakeBrowser::new();
    browser.add_page(LOGIN_URL, FakePage::new(LOGIN_FORM_WITHOUT_PASSWORD));
    let out = tempdir()?;

    let (email, password) = credentials();
    let strategy = AuthStrategy::LoginUrl { login_url: LOGIN_URL.to_string(), email, password };
    let context = test_context_with_strategy(browser.clone(), FakeMediaFetcher::new(), out.path(), false, strategy);
    let auth = context.auth.clone();

    let courses = vec![COURSE_URL.to_string(), "https://school.example.com/p/blazor".to_string()];
    let summary = run_courses(&courses, context).await;

    assert_eq!((summary.succeeded, summary.failed), (0, 2));
    // 第一门课程登录失败后状态复位，第二门课程重新尝试登录
    let login_attempts = browser.navigations().iter().filter(|u| u.as_str() == LOGIN_URL).count();
    assert_eq!(login_attempts, 2);
    assert_eq!(auth.lock().await.state(), AuthState::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn test_manual_login_polls_until_target_reached() -> AppResult<()> {
    let dashboard = "https://school.example.com/dashboard";
    let browser = FakeBrowser::new();
    browser.add_page(LOGIN_URL, FakePage::new(LOGIN_FORM));
    browser.add_page(dashboard, FakePage::new("<html><body>Dashboard</body></html>"));
    // 未登录时打开目标页会被重定向到登录页，用户登录若干秒后浏览器才到达目标页
    browser.redirect(dashboard, LOGIN_URL);
    browser.arrive_after_reads(3, dashboard);

    let config = Arc::new(AppConfig::default());
    let mut auth = Authenticator::new(AuthStrategy::Manual { target_url: dashboard.to_string() }, &config);

    auth.ensure_authenticated(browser.as_ref(), &test_client(&config), &Url::parse(COURSE_URL)?)
        .await?;

    assert_eq!(auth.state(), AuthState::Authenticated);
    assert!(browser.url_reads() >= 4);
    assert_eq!(browser.navigations(), vec![dashboard]);
    // 手动登录不填写表单
    assert!(browser.clicks().is_empty());
    Ok(())
}
