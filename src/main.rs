use anyhow::Result;
use clap::{Parser, Subcommand};
use menu_forge::app::App;
use menu_forge::models::{Config, MenuRequest, RecipeRequest};
use menu_forge::server;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "menu-forge")]
#[command(about = "Generate recipes and themed restaurant menus with AI")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Port to listen on; overrides PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate one recipe and print it as JSON.
    Recipe {
        #[arg(value_name = "FOOD")]
        food: String,
        #[arg(long)]
        difficulty: Option<String>,
        #[arg(long)]
        servings: Option<u32>,
        #[arg(long)]
        dietary: Option<String>,
    },
    /// Generate a restaurant menu and its design and print them as JSON.
    Menu {
        #[arg(long)]
        name: String,
        #[arg(long)]
        theme: String,
        #[arg(long)]
        cuisine: String,
        #[arg(long, value_parser = parse_price_range)]
        price_range: Option<String>,
        #[arg(long)]
        atmosphere: Option<String>,
        #[arg(long)]
        special_feature: Option<String>,
        /// Also render the menu card image into OUTPUT_DIR.
        #[arg(long)]
        image: bool,
    },
}

fn parse_price_range(input: &str) -> std::result::Result<String, String> {
    let price_range = menu_forge::models::PRICE_RANGES
        .iter()
        .find(|p| **p == input)
        .ok_or_else(|| {
            format!(
                "Invalid price range '{}'. Expected one of: {}",
                input,
                menu_forge::models::PRICE_RANGES.join(", ")
            )
        })?;
    Ok(price_range.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    let config = Config::from_env()?;
    let app = App::from_config(&config)?;

    match command {
        Command::Serve { port } => {
            server::serve(Arc::new(app), port.unwrap_or(config.port)).await?;
        }
        Command::Recipe {
            food,
            difficulty,
            servings,
            dietary,
        } => {
            let request = RecipeRequest {
                food_name: food,
                dietary_restrictions: dietary,
                difficulty,
                serving_size: servings,
            };
            print_json(&app.generate_recipe(request).await?)?;
        }
        Command::Menu {
            name,
            theme,
            cuisine,
            price_range,
            atmosphere,
            special_feature,
            image,
        } => {
            let request = MenuRequest {
                name,
                theme,
                cuisine_type: cuisine,
                price_range,
                atmosphere,
                special_feature,
            };
            print_json(&app.generate_menu(request, image).await?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "menu_forge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();
    info!("Starting menu-forge");

    match run(args.command).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("menu-forge failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
