//! `gmv serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use gmv_config::{CliSettings, Config};
use gmv_server::{VaultServer, server_config_from_gmv_config, shutdown_signal};
use gmv_storage::DocumentRef;
use gmv_tree::ParseStrategy;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover gmv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vault root directory (overrides config).
    #[arg(long)]
    vault: Option<PathBuf>,

    /// Entry document, relative to the vault root (overrides config).
    #[arg(short, long)]
    entry: Option<String>,

    /// Loopback host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Export mode: folder, headings or headings-flat (overrides config).
    #[arg(short, long)]
    mode: Option<ParseStrategy>,

    /// Public URL of a tunnel forwarding to this server (overrides config).
    #[arg(long, env = "GMV_PUBLIC_URL")]
    public_url: Option<String>,

    /// Enable verbose output (log requests and exports).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            vault_root: self.vault,
            entry: self.entry,
            mode: self.mode,
            public_url: self.public_url,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Vault: {}",
            config.vault_resolved.root.display()
        ));
        output.info(&format!("Export mode: {}", config.export.mode));

        let server = VaultServer::new(server_config_from_gmv_config(&config));

        match &config.vault_resolved.entry {
            Some(entry) => {
                if !config.vault_resolved.root.join(entry).is_file() {
                    output.warning(&format!("Entry document not found: {entry}"));
                }
                server.select_entry(DocumentRef::new(entry.as_str()));
                output.info(&format!("Entry document: {entry}"));
            }
            None => output.warning("No entry document selected (use --entry or vault.entry)"),
        }

        server.start().await?;
        output.url("Serving", &format!("{}/gm-vault", server.local_url()));

        if config.tunnel.public_url.is_some() {
            match server.open_tunnel() {
                Ok(url) => output.url("Public URL", &format!("{url}/gm-vault")),
                Err(err) => output.warning(&format!("Tunnel not opened: {err}")),
            }
        }

        shutdown_signal().await;
        server.stop().await;
        output.success("Server stopped");

        Ok(())
    }
}
