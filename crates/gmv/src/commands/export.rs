//! `gmv export` command implementation.

use std::path::PathBuf;

use clap::Args;
use gmv_config::{CliSettings, Config};
use gmv_storage::{DocumentRef, FsStorage};
use gmv_tree::{JsonExporter, ParseStrategy};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the export command.
#[derive(Args)]
pub(crate) struct ExportArgs {
    /// Path to configuration file (default: auto-discover gmv.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Vault root directory (overrides config).
    #[arg(long)]
    vault: Option<PathBuf>,

    /// Entry document, relative to the vault root (overrides config).
    #[arg(short, long)]
    entry: Option<String>,

    /// Export mode: folder, headings or headings-flat (overrides config).
    #[arg(short, long)]
    mode: Option<ParseStrategy>,

    /// Base URL for page links (default: tunnel URL, then local server URL).
    #[arg(long)]
    base_url: Option<String>,

    /// Pretty-print the JSON.
    #[arg(long)]
    pretty: bool,

    /// Write to a file instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, no entry document is given or
    /// the entry can't be parsed.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            vault_root: self.vault,
            entry: self.entry,
            mode: self.mode,
            ..Default::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let json = export_json(&config, self.base_url.as_deref(), self.pretty)?;

        let output = Output::new();
        match self.output {
            Some(path) => {
                std::fs::write(&path, format!("{json}\n"))?;
                output.success(&format!("Exported to {}", path.display()));
            }
            None => output.data(&json)?,
        }

        Ok(())
    }
}

/// Parse the configured entry document and serialize its tree.
fn export_json(config: &Config, base_url: Option<&str>, pretty: bool) -> Result<String, CliError> {
    let entry = config.vault_resolved.entry.as_deref().ok_or_else(|| {
        CliError::Validation("No entry document (use --entry or vault.entry)".to_owned())
    })?;

    tracing::debug!(entry, mode = %config.export.mode, "Exporting vault tree");
    let storage = FsStorage::new(config.vault_resolved.root.clone());
    let parser = config.export.mode.parser(&config.export.ignore_headings);
    let session = parser.parse(&storage, &DocumentRef::new(entry))?;

    let base_url = base_url
        .map(str::to_owned)
        .or_else(|| config.tunnel.public_url.clone())
        .unwrap_or_else(|| config.local_url());
    let export = JsonExporter::new(base_url).build_json(&session);

    let json = if pretty {
        serde_json::to_string_pretty(&export)?
    } else {
        serde_json::to_string(&export)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use gmv_tree::HeadingMode;
    use pretty_assertions::assert_eq;

    use super::*;

    fn vault() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("Campaign/NPCs")).unwrap();
        fs::write(dir.path().join("Campaign/Index.md"), "# Campaign\n\n## NPCs\n- [[Old Mage]]\n").unwrap();
        fs::write(dir.path().join("Campaign/Tavern.md"), "# The Tavern\n").unwrap();
        fs::write(dir.path().join("Campaign/NPCs/Old Mage.md"), "# Old Mage\n").unwrap();
        dir
    }

    fn load(dir: &Path, settings: &CliSettings) -> Config {
        let path = dir.join("gmv.toml");
        fs::write(&path, "").unwrap();
        Config::load(Some(path.as_path()), Some(settings)).unwrap()
    }

    #[test]
    fn test_export_folder_mode() {
        let dir = vault();
        let config = load(
            dir.path(),
            &CliSettings {
                entry: Some("Campaign/Index.md".to_owned()),
                ..Default::default()
            },
        );

        let json = export_json(&config, None, false).unwrap();

        assert_eq!(
            json,
            concat!(
                r#"{"categories":[{"name":"Campaign","#,
                r#""pages":[{"name":"The Tavern","url":"http://127.0.0.1:3000/pages/tavern"}],"#,
                r#""categories":[{"name":"NPCs","#,
                r#""pages":[{"name":"Old Mage","url":"http://127.0.0.1:3000/pages/old-mage"}]}]}]}"#
            )
        );
    }

    #[test]
    fn test_export_heading_mode_with_base_url() {
        let dir = vault();
        let config = load(
            dir.path(),
            &CliSettings {
                entry: Some("Campaign/Index.md".to_owned()),
                mode: Some(ParseStrategy::Headings(HeadingMode::Structured)),
                ..Default::default()
            },
        );

        let json = export_json(&config, Some("https://abc.tunnel.example/"), false).unwrap();

        assert_eq!(
            json,
            concat!(
                r#"{"categories":[{"name":"Campaign","categories":[{"name":"NPCs","#,
                r#""pages":[{"name":"Old Mage","url":"https://abc.tunnel.example/pages/old-mage"}]}]}]}"#
            )
        );
    }

    #[test]
    fn test_export_requires_entry() {
        let dir = vault();
        let config = load(dir.path(), &CliSettings::default());

        let err = export_json(&config, None, false).unwrap_err();

        assert!(matches!(err, CliError::Validation(_)));
    }

    #[test]
    fn test_export_missing_entry_fails() {
        let dir = vault();
        let config = load(
            dir.path(),
            &CliSettings {
                entry: Some("Campaign/Missing.md".to_owned()),
                mode: Some(ParseStrategy::Headings(HeadingMode::Structured)),
                ..Default::default()
            },
        );

        let err = export_json(&config, None, false).unwrap_err();

        assert!(matches!(err, CliError::Parse(_)));
    }
}
