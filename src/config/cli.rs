use super::AppConfig;
use crate::domain::model::{BodyShape, Gender, GarmentKind, SkinTone};
use crate::utils::error::{Result, StylistError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fitting-room")]
#[command(about = "AI personal stylist with a virtual fitting room")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the browser UI
    Serve(ServeArgs),
    /// Run one search from the command line
    Find(FindArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Full-body photo of the person
    #[arg(long)]
    pub photo: PathBuf,

    /// What kind of outfit you are looking for
    #[arg(long)]
    pub query: String,

    #[arg(long, value_enum, default_value = "male")]
    pub gender: GenderArg,

    #[arg(long, value_enum, default_value = "average")]
    pub body_shape: BodyShapeArg,

    #[arg(long, value_enum, default_value = "medium")]
    pub skin_tone: SkinToneArg,

    /// Let the model read the profile from the photo instead
    #[arg(long)]
    pub auto_profile: bool,

    /// Try on a result: `top:N`, `bottom:N` or `set:N` (zero-based)
    #[arg(long, value_parser = parse_try_on_target)]
    pub try_on: Option<TryOnTarget>,

    /// Directory for suggestions.json and the try-on image
    #[arg(long, default_value = "./output")]
    pub output: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum GenderArg {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BodyShapeArg {
    Slim,
    Average,
    Athletic,
    PlusSize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SkinToneArg {
    Fair,
    Medium,
    Tan,
    Dark,
}

impl From<GenderArg> for Gender {
    fn from(arg: GenderArg) -> Self {
        match arg {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
            GenderArg::Other => Gender::Other,
        }
    }
}

impl From<BodyShapeArg> for BodyShape {
    fn from(arg: BodyShapeArg) -> Self {
        match arg {
            BodyShapeArg::Slim => BodyShape::Slim,
            BodyShapeArg::Average => BodyShape::Average,
            BodyShapeArg::Athletic => BodyShape::Athletic,
            BodyShapeArg::PlusSize => BodyShape::PlusSize,
        }
    }
}

impl From<SkinToneArg> for SkinTone {
    fn from(arg: SkinToneArg) -> Self {
        match arg {
            SkinToneArg::Fair => SkinTone::Fair,
            SkinToneArg::Medium => SkinTone::Medium,
            SkinToneArg::Tan => SkinTone::Tan,
            SkinToneArg::Dark => SkinTone::Dark,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryOnTarget {
    Garment(GarmentKind, usize),
    FullSet(usize),
}

fn parse_try_on_target(raw: &str) -> std::result::Result<TryOnTarget, String> {
    let (kind, index) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected KIND:INDEX, got '{}'", raw))?;
    let index: usize = index
        .trim()
        .parse()
        .map_err(|_| format!("invalid index '{}'", index))?;

    match kind.trim() {
        "set" => Ok(TryOnTarget::FullSet(index)),
        other => GarmentKind::parse(other)
            .map(|kind| TryOnTarget::Garment(kind, index))
            .ok_or_else(|| format!("unknown garment kind '{}'", other)),
    }
}

impl Cli {
    /// Config file (if any), environment keys, then command-line overrides.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::from_env(),
        };

        if let Command::Serve(serve) = &self.command {
            if let Some(host) = &serve.host {
                config.server.host = host.clone();
            }
            if let Some(port) = serve.port {
                config.server.port = port;
            }
        }

        Ok(config)
    }
}

impl FindArgs {
    pub async fn read_photo(&self) -> Result<crate::domain::model::ImageData> {
        let bytes = tokio::fs::read(&self.photo).await?;
        crate::domain::model::ImageData::from_bytes(bytes).map_err(|e| {
            StylistError::image(format!("{}: {}", self.photo.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_try_on_target() {
        assert_eq!(
            parse_try_on_target("top:2").unwrap(),
            TryOnTarget::Garment(GarmentKind::Top, 2)
        );
        assert_eq!(
            parse_try_on_target("bottoms:0").unwrap(),
            TryOnTarget::Garment(GarmentKind::Bottom, 0)
        );
        assert_eq!(parse_try_on_target("set:1").unwrap(), TryOnTarget::FullSet(1));
        assert!(parse_try_on_target("hat:1").is_err());
        assert!(parse_try_on_target("top").is_err());
        assert!(parse_try_on_target("top:x").is_err());
    }

    #[test]
    fn test_parse_find_command() {
        let cli = Cli::try_parse_from([
            "fitting-room",
            "--verbose",
            "find",
            "--photo",
            "me.jpg",
            "--query",
            "beach vacation",
            "--body-shape",
            "plus-size",
            "--try-on",
            "set:0",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Find(args) => {
                assert_eq!(args.query, "beach vacation");
                assert_eq!(BodyShape::from(args.body_shape), BodyShape::PlusSize);
                assert_eq!(args.try_on, Some(TryOnTarget::FullSet(0)));
                assert_eq!(args.output, "./output");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_serve_overrides_port() {
        let cli = Cli::try_parse_from(["fitting-room", "serve", "--port", "9000"]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
    }
}
