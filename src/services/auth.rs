//! 访问控制
//!
//! 共享访问码校验；没有配置访问码时不做限制

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};

use crate::error::{AuthError, Result};

pub struct AuthGate {
    password: Option<String>,
    authenticated: AtomicBool,
}

impl AuthGate {
    pub fn new(password: Option<String>) -> Self {
        let password = password.filter(|p| !p.is_empty());
        let open = password.is_none();
        Self {
            password,
            authenticated: AtomicBool::new(open),
        }
    }

    /// 校验访问码，成功后保持登录状态
    pub fn login(&self, secret: &str) -> bool {
        let accepted = match &self.password {
            Some(password) => password == secret,
            None => true,
        };
        if accepted {
            self.authenticated.store(true, Ordering::SeqCst);
            info!("🔓 访问码校验通过");
        } else {
            warn!("🔒 访问码无效");
        }
        accepted
    }

    pub fn logout(&self) {
        if self.password.is_some() {
            self.authenticated.store(false, Ordering::SeqCst);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    /// 未登录时返回错误
    pub fn require(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials.into())
        }
    }
}
