//! Command-line entry point: load a template and print the rendered scene.

#[cfg(feature = "native")]
mod cli {
    use clap::{Parser, ValueEnum};
    use formplate_app::{Designer, FacadeError, FacadeProps, Form, ShortcutRegistry, Viewer};
    use formplate_core::inputs::InputRecord;
    use formplate_core::options::UiOptions;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum CliError {
        #[error("Failed to read {}: {source}", .path.display())]
        Read {
            path: PathBuf,
            source: std::io::Error,
        },
        #[error("Failed to parse {}: {source}", .path.display())]
        Parse {
            path: PathBuf,
            source: serde_json::Error,
        },
        #[error("No template given")]
        MissingTemplate,
        #[error(transparent)]
        Facade(#[from] FacadeError),
        #[error("Failed to serialize scene: {0}")]
        Scene(#[from] formplate_render::RendererError),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    enum ModeArg {
        Designer,
        Form,
        Viewer,
    }

    /// Formplate - render a template in designer, form or viewer mode
    #[derive(Parser, Debug)]
    #[command(name = "formplate")]
    #[command(author, version, about, long_about = None)]
    struct Cli {
        /// Template JSON file
        #[arg(required_unless_present = "shortcuts")]
        template: Option<PathBuf>,

        /// Rendering mode
        #[arg(short, long, value_enum, default_value = "viewer")]
        mode: ModeArg,

        /// JSON file with an array of input records
        #[arg(short, long)]
        inputs: Option<PathBuf>,

        /// JSON file with UI options
        #[arg(short, long)]
        options: Option<PathBuf>,

        /// Print the keyboard shortcuts and exit
        #[arg(long)]
        shortcuts: bool,
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn run() -> Result<(), CliError> {
        execute(Cli::parse())
    }

    fn execute(cli: Cli) -> Result<(), CliError> {
        if cli.shortcuts {
            ShortcutRegistry::print_all();
            return Ok(());
        }
        let template_path = cli.template.ok_or(CliError::MissingTemplate)?;

        let template: serde_json::Value = read_json(&template_path)?;
        let inputs: Vec<InputRecord> = match &cli.inputs {
            Some(path) => read_json(path)?,
            None => Vec::new(),
        };
        let options = match &cli.options {
            Some(path) => UiOptions::from_value(read_json(path)?).map_err(|source| CliError::Parse {
                path: path.clone(),
                source,
            })?,
            None => UiOptions::default(),
        };
        let props = FacadeProps::new(template)
            .with_inputs(inputs)
            .with_options(options);

        log::info!("Rendering {} in {:?} mode", template_path.display(), cli.mode);
        let scene = match cli.mode {
            ModeArg::Designer => {
                let mut designer = Designer::new(props)?;
                pollster::block_on(designer.load_assets())?;
                designer.render()?
            }
            ModeArg::Form => {
                let mut form = Form::new(props)?;
                pollster::block_on(form.load_assets())?;
                form.render()?
            }
            ModeArg::Viewer => {
                let mut viewer = Viewer::new(props)?;
                pollster::block_on(viewer.load_assets())?;
                viewer.render()?
            }
        };
        println!("{}", scene.to_json()?);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_template_required_without_shortcuts() {
            assert!(Cli::try_parse_from(["formplate"]).is_err());
            assert!(Cli::try_parse_from(["formplate", "--shortcuts"]).is_ok());
            assert!(Cli::try_parse_from(["formplate", "t.json", "-m", "form"]).is_ok());
        }

        #[test]
        fn test_missing_template_is_an_error() {
            let cli = Cli {
                template: None,
                mode: ModeArg::Viewer,
                inputs: None,
                options: None,
                shortcuts: false,
            };
            assert!(matches!(execute(cli), Err(CliError::MissingTemplate)));
        }

        #[test]
        fn test_unreadable_template_is_an_error() {
            let cli = Cli::parse_from(["formplate", "/nonexistent/template.json"]);
            assert!(matches!(execute(cli), Err(CliError::Read { .. })));
        }
    }
}

#[cfg(feature = "native")]
fn main() {
    env_logger::init();

    if let Err(e) = cli::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "native"))]
fn main() {
    panic!("Native feature not enabled. Use `cargo run --features native`");
}
