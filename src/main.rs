use tokio::net::TcpListener;

use weathermail::{configuration, startup, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber =
        telemetry::get_subscriber("weathermail".to_string(), "info".to_string(), std::io::stdout);
    telemetry::initialize_subscriber(subscriber);

    let configuration = configuration::get_configuration()?;
    let lifecycle = startup::get_lifecycle(&configuration)?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address).await?;

    startup::run(listener, lifecycle).await;
    Ok(())
}
