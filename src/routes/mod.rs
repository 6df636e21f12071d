mod flash;
mod health_check;
mod home;
mod subscriptions;
mod unsubscribe;
mod verify;

pub use flash::{banner_html, set_flash, take_flash, Flash, FlashLevel};
pub use health_check::check_health;
pub use home::index;
pub use subscriptions::{subscribe, subscribe_form};
pub use unsubscribe::unsubscribe;
pub use verify::verify;

/// Walks an error's source chain so handler `Debug` output keeps the root
/// cause visible in the logs.
pub(crate) fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
