use clap::{Parser, Subcommand};
use cli::{AnalysisConfig, AnalysisOutcome, AnalyzeArgs, run_analysis};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find contours in an image, print their shape features and save an annotated copy
    Analyze(AnalyzeArgs),
    /// Print the JSON schema of the configuration file
    Schema,
    /// Write a default configuration file (.toml or .json)
    InitConfig {
        /// Where to write the configuration
        #[arg(short, long)]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze(args) => {
            let config = args.resolve()?;
            let outcome = run_analysis(&config, args.quiet)?;
            if let AnalysisOutcome::ImageUnavailable = outcome {
                std::process::exit(outcome.exit_code());
            }
        }
        Commands::Schema => {
            println!("{}", AnalysisConfig::schema_json()?);
        }
        Commands::InitConfig { path } => {
            init_config(path)?;
        }
    }

    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    AnalysisConfig::default().to_file(path)?;
    info!("📄 Configuration saved to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, error::ErrorKind};
    use contour_features::{ChainApproximation, ContourRetrieval};

    #[test]
    fn test_command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "contour_cli", "analyze",
            "--input", "shapes.png",
            "--retrieval", "external",
            "--approximation", "none",
            "--otsu",
            "--draw-ellipses",
            "--quiet",
        ])
        .expect("valid invocation");

        let Commands::Analyze(args) = cli.command else {
            panic!("expected the analyze subcommand");
        };
        assert_eq!(args.input, Some(PathBuf::from("shapes.png")));
        assert_eq!(args.retrieval, Some(ContourRetrieval::External));
        assert_eq!(args.approximation, Some(ChainApproximation::None));
        assert!(args.otsu && args.draw_ellipses && args.quiet);
        assert_eq!(args.threshold, None);
    }

    #[test]
    fn test_threshold_conflicts_with_otsu() {
        let err = Cli::try_parse_from(["contour_cli", "analyze", "--threshold", "100", "--otsu"])
            .expect_err("threshold and otsu are exclusive");
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_unknown_retrieval_is_rejected() {
        let err = Cli::try_parse_from(["contour_cli", "analyze", "--retrieval", "sideways"])
            .expect_err("not a retrieval mode");
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_parse_other_subcommands() {
        let cli = Cli::try_parse_from(["contour_cli", "schema"]).expect("valid invocation");
        assert!(matches!(cli.command, Commands::Schema));

        let cli = Cli::try_parse_from(["contour_cli", "init-config", "--path", "config.toml"])
            .expect("valid invocation");
        let Commands::InitConfig { path } = cli.command else {
            panic!("expected the init-config subcommand");
        };
        assert_eq!(path, PathBuf::from("config.toml"));

        let err = Cli::try_parse_from(["contour_cli", "init-config"]).expect_err("path is required");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }
}
