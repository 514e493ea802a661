use clap::Parser;
use fitting_room::app::export::{export_run, run_folder_name};
use fitting_room::config::cli::{Cli, Command, FindArgs, TryOnTarget};
use fitting_room::domain::model::{OutfitSuggestions, UserProfile};
use fitting_room::utils::error::{ErrorSeverity, Result};
use fitting_room::utils::{logger, validation::Validate};
use fitting_room::{AppConfig, FindOutfitsRequest, LocalStorage, StylistApp, StylistSession};
use std::path::Path;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    tracing::info!("Starting fitting-room");

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ fitting-room failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 1,      // bad input
            ErrorSeverity::Medium => 2,   // provider, worth a retry
            ErrorSeverity::High => 4,     // configuration
            ErrorSeverity::Critical => 3, // system
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }
    for key in config.missing_api_keys() {
        tracing::warn!("⚠️ {} is not set", key);
    }

    match cli.command {
        Command::Serve(_) => fitting_room::web::run_server(config).await,
        Command::Find(args) => find(&config, args).await,
    }
}

async fn find(config: &AppConfig, args: FindArgs) -> Result<()> {
    let app = StylistApp::from_config(config)?;
    let photo = app.prepare_photo(args.read_photo().await?)?;
    let profile = (!args.auto_profile).then(|| UserProfile {
        gender: args.gender.into(),
        body_shape: args.body_shape.into(),
        skin_tone: args.skin_tone.into(),
        current_style: None,
    });

    let mut session = StylistSession::default();
    let suggestions = app
        .stylist
        .find_outfits(
            &mut session,
            FindOutfitsRequest {
                photo: Some(photo),
                profile,
                query: args.query.clone(),
            },
        )
        .await?;
    print_suggestions(&suggestions);

    let outcome = match args.try_on {
        Some(TryOnTarget::Garment(kind, index)) => Some(
            app.fitting_room
                .try_on_garment(&session, kind, index)
                .await?,
        ),
        Some(TryOnTarget::FullSet(index)) => {
            Some(app.fitting_room.try_on_full_set(&session, index).await?)
        }
        None => None,
    };

    let run_dir = Path::new(&args.output).join(run_folder_name(chrono::Local::now()));
    let storage = LocalStorage::new(run_dir);
    let written = export_run(&storage, &suggestions, outcome.as_ref()).await?;

    if let Some(outcome) = &outcome {
        println!("\n👗 {}", outcome.status);
        if let Some(url) = &outcome.buy_url {
            println!("🛒 Buy Now: {}", url);
        }
    }
    for path in written {
        println!("📁 Saved {}", path);
    }
    Ok(())
}

fn print_suggestions(suggestions: &OutfitSuggestions) {
    println!("✅ {}\n", suggestions.status);
    println!("{}", suggestions.explanation.trim_end());

    for (label, garments) in [("Tops", &suggestions.tops), ("Bottoms", &suggestions.bottoms)] {
        println!("\n{}:", label);
        for garment in garments {
            let price = garment
                .price
                .as_deref()
                .map(|p| format!(" ({})", p))
                .unwrap_or_default();
            println!("  {}: {}{}  {}", garment.index, garment.title, price, garment.url);
        }
    }

    if !suggestions.outfit_sets.is_empty() {
        println!("\nFull sets:");
        for (i, set) in suggestions.outfit_sets.iter().enumerate() {
            println!(
                "  set:{}  top:{} + bottom:{}  {}",
                i, set.top_index, set.bottom_index, set.reasoning
            );
        }
    }
}
