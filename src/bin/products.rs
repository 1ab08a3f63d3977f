use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashSet;
use storefront_products::products::capability::{Platform, PlatformVersion};
use storefront_products::storefront::build_manager;
use storefront_products::telemetry::init_tracing;
use storefront_products::util::env;
use storefront_products::{LookupResult, ProductIdentifier, ProductsManager, ResolverConfig};
use tokio::sync::oneshot;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "products", version, about = "Storefront product lookup")]
struct Cli {
    /// Storefront base URL (overrides STOREFRONT_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Prefer the v2 storefront when the platform supports it (overrides PRODUCTS_PREFER_V2)
    #[arg(long, global = true)]
    prefer_v2: bool,
    /// Platform to evaluate the v2 gate for (ios, tvos, watchos, macos)
    #[arg(long, global = true)]
    platform: Option<Platform>,
    /// Platform version, e.g. 16.1
    #[arg(long, global = true)]
    platform_version: Option<PlatformVersion>,
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Command-line values win over the environment; absent flags leave it untouched.
    fn apply_overrides(&self, config: &mut ResolverConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if self.prefer_v2 {
            config.prefer_v2 = true;
        }
        if let Some(platform) = self.platform {
            config.platform = platform;
            if self.platform_version.is_none() {
                config.platform_version = platform.v2_minimum();
            }
        }
        if let Some(version) = self.platform_version {
            config.platform_version = version;
        }
    }
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Resolve product identifiers and print one JSON object per product
    Lookup {
        /// Product identifiers to resolve
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<String>,
        /// Call style used against the manager
        #[arg(long, value_enum, default_value_t = Style::Async)]
        style: Style,
    },
    /// Print which storefront generation a lookup would use
    Capability,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Style {
    Callback,
    Async,
}

#[tokio::main]
async fn main() -> Result<()> {
    env::init_env();
    init_tracing("info")?;
    env::bootstrap_cli("products");

    let cli = Cli::parse();
    let mut config = ResolverConfig::from_env();
    cli.apply_overrides(&mut config);

    let manager = build_manager(&config)?;

    match cli.command {
        Commands::Capability => {
            let info = manager.system_info();
            println!(
                "{}",
                serde_json::json!({
                    "platform": info.platform().to_string(),
                    "platform_version": info.platform_version().to_string(),
                    "v2_supported": info.v2_support().is_supported(),
                    "prefer_v2": info.prefer_v2(),
                    "backend": manager.backend_for_call().to_string(),
                })
            );
        }
        Commands::Lookup { ids, style } => {
            let identifiers: HashSet<ProductIdentifier> = ids
                .into_iter()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty())
                .map(ProductIdentifier::from)
                .collect();
            let requested = identifiers.len();
            let products = lookup(&manager, identifiers, style).await?;

            info!(requested, resolved = products.len(), "products: lookup complete");
            let mut products: Vec<_> = products.into_iter().collect();
            products.sort_by(|a, b| a.identifier.cmp(&b.identifier));
            for product in products {
                println!("{}", serde_json::to_string(&product)?);
            }
        }
    }
    Ok(())
}

async fn lookup(
    manager: &ProductsManager,
    identifiers: HashSet<ProductIdentifier>,
    style: Style,
) -> Result<HashSet<storefront_products::StoreProduct>> {
    let result: LookupResult = match style {
        Style::Async => manager.products_async(identifiers).await,
        Style::Callback => {
            let (tx, rx) = oneshot::channel();
            manager.products(identifiers, move |result| {
                let _ = tx.send(result);
            });
            rx.await.context("lookup completion was dropped")?
        }
    };
    result.context("product lookup failed")
}
