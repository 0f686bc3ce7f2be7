use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::config::SessionConfig;

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Set the refresh cookie: HttpOnly, SameSite=Strict, path `/`.
pub fn set_refresh_cookie(jar: CookieJar, raw_secret: &str, config: &SessionConfig) -> CookieJar {
    jar.add(
        Cookie::build((REFRESH_COOKIE_NAME, raw_secret.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(config.cookie_secure)
            .max_age(time::Duration::days(config.refresh_token_expiry_days))
            .build(),
    )
}

pub fn clear_refresh_cookie(jar: CookieJar, config: &SessionConfig) -> CookieJar {
    jar.remove(
        Cookie::build(REFRESH_COOKIE_NAME)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(config.cookie_secure)
            .build(),
    )
}

pub fn refresh_cookie_value(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
