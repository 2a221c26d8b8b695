use std::env;

use apollo_sync::Application;
use apollo_sync::NamespaceEvent;
use apollo_sync::Result;
use apollo_sync::Settings;
use tokio::sync::broadcast::error::RecvError;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

/// Usage: `apollo-sync [CONFIG_PATH]`, overridable with `APOLLO__*` variables
#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    init_observability();

    let path = env::args().nth(1);
    let options = Settings::load(path.as_deref())?.into_options()?;

    let app = Application::new(options)?;
    let namespace = app.namespace("")?;
    let mut events = namespace.subscribe();

    namespace.ready().await?;
    match serde_json::to_string_pretty(&namespace.config()?) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("failed to render config: {}", e),
    }

    info!("Watching {}. Waiting for CTRL+C signal...", namespace.identifier());
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(n)) => warn!("{} events dropped", n),
                Err(RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C detected.");
                break;
            }
        }
    }

    println!("Exiting program.");
    Ok(())
}

fn log_event(event: &NamespaceEvent) {
    match event {
        NamespaceEvent::Added { key, value } => info!("+ {} = {}", key, value),
        NamespaceEvent::Changed {
            key,
            old_value,
            new_value,
        } => info!("~ {} = {} (was {})", key, new_value, old_value),
        NamespaceEvent::Deleted { key, old_value } => info!("- {} (was {})", key, old_value),
        NamespaceEvent::Updated { new, .. } => info!("snapshot updated, {} keys", new.len()),
        NamespaceEvent::FetchError(e) => warn!("fetch failed: {}", e),
        NamespaceEvent::SaveError(e) => warn!("save failed: {}", e),
        NamespaceEvent::Saved => info!("snapshot saved"),
        NamespaceEvent::Ready => info!("ready"),
    }
}

fn init_observability() {
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry().with(base_subscriber).init();
}
