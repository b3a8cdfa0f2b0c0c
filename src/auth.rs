// src/auth.rs

use crate::{
    browser::{self, BrowserSession},
    cli::AuthStrategy,
    client::RobustClient,
    config::AppConfig,
    constants::{selectors::login, timeouts},
    error::*,
    symbols, ui,
};
use colored::Colorize;
use log::{debug, error, info, warn};
use serde_json::{Value, json};
use std::time::{Duration, Instant};
use url::Url;

/// 按链接文字查找登录入口，返回其绝对地址
const FIND_LOGIN_LINK_SCRIPT: &str = r#"
const needle = arguments[0].toLowerCase();
for (const a of document.querySelectorAll('a[href]')) {
    if (a.textContent.trim().toLowerCase() === needle) {
        return a.href;
    }
}
for (const a of document.querySelectorAll('a[href]')) {
    if (a.textContent.toLowerCase().includes(needle)) {
        return a.href;
    }
}
return null;
"#;

/// 直接写入输入框的值并触发事件，不模拟按键
const SET_VALUE_SCRIPT: &str = r#"
const el = document.querySelector(arguments[0]);
if (!el) { return false; }
el.focus();
el.value = arguments[1];
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AwaitingCredentialsForm,
    Submitted,
    Authenticated,
}

pub struct Authenticator {
    strategy: AuthStrategy,
    state: AuthState,
    field_timeout: Duration,
    poll_interval: Duration,
}

impl Authenticator {
    pub fn new(strategy: AuthStrategy, config: &AppConfig) -> Self {
        Self {
            strategy,
            state: AuthState::Unauthenticated,
            field_timeout: config.login_field_timeout,
            poll_interval: config.manual_login_poll,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == AuthState::Authenticated
    }

    fn transition(&mut self, next: AuthState) {
        debug!("登录状态: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// 确保会话已登录。已登录时直接返回；登录失败时状态回到未登录，
    /// 以便批量模式中的下一门课程重新尝试。
    pub async fn ensure_authenticated(
        &mut self,
        session: &dyn BrowserSession,
        client: &RobustClient,
        course_url: &Url,
    ) -> AppResult<()> {
        if self.is_authenticated() {
            debug!("会话已登录，跳过登录步骤");
            return Ok(());
        }
        match self.login(session, course_url).await {
            Ok(()) => {
                self.transition(AuthState::Authenticated);
                self.sync_cookies(session, client, course_url).await;
                ui::info("登录成功。");
                Ok(())
            }
            Err(e) => {
                error!("登录失败: {}", e);
                self.transition(AuthState::Unauthenticated);
                Err(e)
            }
        }
    }

    async fn login(&mut self, session: &dyn BrowserSession, course_url: &Url) -> AppResult<()> {
        match self.strategy.clone() {
            AuthStrategy::DiscoverLink { email, password } => {
                info!("在课程页中查找登录链接");
                session.navigate(course_url.as_str()).await?;
                let login_url = discover_login_link(session).await?;
                info!("找到登录链接: {}", login_url);
                session.navigate(&login_url).await?;
                self.fill_and_submit(session, &email, &password).await
            }
            AuthStrategy::LoginUrl { login_url, email, password } => {
                info!("打开登录页: {}", login_url);
                session.navigate(&login_url).await?;
                self.fill_and_submit(session, &email, &password).await
            }
            AuthStrategy::Manual { target_url } => self.wait_for_manual_login(session, &target_url).await,
        }
    }

    async fn fill_and_submit(&mut self, session: &dyn BrowserSession, email: &str, password: &str) -> AppResult<()> {
        self.transition(AuthState::AwaitingCredentialsForm);
        for field in [login::EMAIL, login::PASSWORD, login::SUBMIT] {
            session.wait_for(field, self.field_timeout).await.map_err(|e| {
                error!("登录表单元素 '{}' 未出现: {}", field, e);
                e
            })?;
        }

        set_field_value(session, login::EMAIL, email).await?;
        set_field_value(session, login::PASSWORD, password).await?;
        let page_before = session.current_url().await?;

        session.click(login::SUBMIT, self.field_timeout).await?;
        self.transition(AuthState::Submitted);
        wait_until_form_left(session, &page_before, timeouts::LOGIN_SUBMIT).await
    }

    /// 等待用户在浏览器中手动完成登录。没有超时，只能由 Ctrl+C 中断。
    async fn wait_for_manual_login(&mut self, session: &dyn BrowserSession, target_url: &str) -> AppResult<()> {
        session.navigate(target_url).await?;
        self.transition(AuthState::AwaitingCredentialsForm);
        let mut announced = false;
        loop {
            let current = session.current_url().await?;
            if same_page(&current, target_url) {
                info!("浏览器已到达登录后页面: {}", current);
                return Ok(());
            }
            if !announced {
                let reach = format!("浏览器到达 {} 后程序将自动继续。", target_url);
                let quit = format!("按 {} 可随时退出。", *symbols::CTRL_C);
                ui::box_message(
                    "等待手动登录",
                    &["请在打开的浏览器窗口中完成登录。", reach.as_str(), quit.as_str()],
                    |s| s.yellow(),
                );
                announced = true;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn sync_cookies(&self, session: &dyn BrowserSession, client: &RobustClient, course_url: &Url) {
        match session.cookies().await {
            Ok(cookies) => client.import_cookies(course_url, &cookies),
            Err(e) => warn!("读取浏览器 Cookie 失败，附件下载可能需要登录: {}", e),
        }
    }
}

async fn discover_login_link(session: &dyn BrowserSession) -> AppResult<String> {
    let found = session
        .execute_script(FIND_LOGIN_LINK_SCRIPT, vec![json!(login::LINK_TEXT)])
        .await?;
    match found {
        Value::String(href) if !href.is_empty() => Ok(href),
        _ => Err(AppError::LoginFailed("课程页中没有找到登录链接".into())),
    }
}

async fn set_field_value(session: &dyn BrowserSession, selector: &str, value: &str) -> AppResult<()> {
    let ok = session
        .execute_script(SET_VALUE_SCRIPT, vec![json!(selector), json!(value)])
        .await?;
    if ok.as_bool() == Some(true) {
        Ok(())
    } else {
        Err(AppError::LoginFailed(format!("无法填写字段 '{}'", selector)))
    }
}

/// 提交后等待页面离开登录表单: 地址改变或密码框消失
async fn wait_until_form_left(session: &dyn BrowserSession, page_before: &str, timeout: Duration) -> AppResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let current = session.current_url().await?;
        if !same_page(&current, page_before) {
            return Ok(());
        }
        if !browser::is_present(session, login::PASSWORD, timeouts::OPTIONAL_ELEMENT).await? {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(AppError::LoginFailed("提交后仍停留在登录页，请检查邮箱和密码".into()));
        }
        tokio::time::sleep(timeouts::POLL_INTERVAL).await;
    }
}

/// 忽略末尾斜杠与片段比较两个地址
pub(crate) fn same_page(a: &str, b: &str) -> bool {
    fn normalize(s: &str) -> &str {
        let s = s.split('#').next().unwrap_or(s);
        s.trim_end_matches('/')
    }
    normalize(a.trim()) == normalize(b.trim())
}
