use axum_extra::extract::cookie::{Cookie, CookieJar};

const FLASH_COOKIE: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot status banner carried across a redirect in a cookie. Written by
/// the mutating handlers, consumed by the next rendered page and cleared.
#[derive(Debug, Clone)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

pub fn set_flash(jar: CookieJar, level: FlashLevel, message: &str) -> CookieJar {
    let tag = match level {
        FlashLevel::Success => "success",
        FlashLevel::Error => "error",
    };
    let value = format!("{}:{}", tag, urlencoding::encode(message));
    jar.add(
        Cookie::build((FLASH_COOKIE, value))
            .path("/")
            .http_only(true),
    )
}

pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, None);
    };
    let flash = cookie.value().split_once(':').and_then(|(tag, message)| {
        let level = match tag {
            "success" => Some(FlashLevel::Success),
            "error" => Some(FlashLevel::Error),
            _ => None,
        }?;
        let message = urlencoding::decode(message).ok()?.into_owned();
        Some(Flash { level, message })
    });
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, flash)
}

/// Banner markup for the pages that render flashes. Messages are
/// server-authored, never user input.
pub fn banner_html(flash: &Option<Flash>) -> String {
    match flash {
        Some(Flash {
            level: FlashLevel::Success,
            message,
        }) => format!(r#"<p class="flash success"><i>{}</i></p>"#, message),
        Some(Flash {
            level: FlashLevel::Error,
            message,
        }) => format!(r#"<p class="flash error"><i>{}</i></p>"#, message),
        None => String::new(),
    }
}
