mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::sync::Arc;

use routebind::api::{self, DispatchOptions};
use routebind::api::pages::PlainPages;
use routebind::config::Config;
use routebind::demo;
use routebind::observability::init_tracing;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            let config = match args.config {
                Some(path) => Config::load_from_path(path)?,
                None => Config::load()?,
            };
            init_tracing(&config.logging.filter);
            api::run(config, demo::module(), args.address).await?;
        }
        Commands::Routes(args) => {
            init_tracing("warn");
            let app = api::build_app(&demo::module(), DispatchOptions::default(), Arc::new(PlainPages))?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&app.routes)?);
            } else {
                for route in &app.routes {
                    println!("{:<5} {:<16} => {}{}", route.method.as_str(), route.path, route.handler, route.signature);
                }
            }
        }
    }

    Ok(())
}
