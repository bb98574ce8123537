use crate::viewer::CONFIG_PATH;
use crate::viewer::error::{Result, ViewerError};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliOptions {
    pub url: Option<String>,
    pub config_path: PathBuf,
    pub write_default_config: bool,
    pub show_help: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            url: None,
            config_path: PathBuf::from(CONFIG_PATH),
            write_default_config: false,
            show_help: false,
        }
    }
}

pub fn parse_cli_options(args: impl IntoIterator<Item = String>) -> Result<CliOptions> {
    let mut options = CliOptions::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" | "-u" => {
                let value = args
                    .next()
                    .ok_or_else(|| ViewerError::Cli(format!("{arg} expects a model url")))?;
                if value.trim().is_empty() {
                    return Err(ViewerError::EmptyUrl);
                }
                options.url = Some(value);
            }
            "--config" | "-c" => {
                let value = args
                    .next()
                    .ok_or_else(|| ViewerError::Cli(format!("{arg} expects a path")))?;
                options.config_path = PathBuf::from(value);
            }
            "--write-default-config" => options.write_default_config = true,
            "--help" | "-h" => options.show_help = true,
            _ => return Err(ViewerError::Cli(format!("unknown option: {arg}"))),
        }
    }

    Ok(options)
}

pub fn help_text() -> String {
    format!(
        "Usage:\n  roomview [options]\n\nOptions:\n  -u, --url <url>            Load a glTF scene right away (http(s) url or asset path)\n  -c, --config <path>        Settings file (default: {CONFIG_PATH})\n      --write-default-config Write default settings to the config path and exit\n  -h, --help                 Show this help"
    )
}
