// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! etab: command-line front end for the establishments directory.
//!
//! Logs go to stderr as JSON; command output goes to stdout.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use etab_client::{
    config::Config,
    models::{EstablishmentId, EstablishmentPayload, ImageUpload},
    navigation::{routes, HistoryNavigator, Navigator},
    services::{reviews::average_rating, Filter},
    store::{ClientStore, Theme},
    time_utils::review_date,
    App,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Browse, review and administer establishments.
#[derive(Parser, Debug)]
#[command(name = "etab", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and remember the session
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account
    Register {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List establishments
    List {
        /// Only this type (exact, case-insensitive)
        #[arg(long = "type")]
        category: Option<String>,
        /// Name contains this text
        #[arg(long)]
        search: Option<String>,
        /// Resolve cover images
        #[arg(long)]
        covers: bool,
    },
    /// Show one establishment and its reviews
    Show { id: String },
    /// Toggle an establishment as favorite
    Favorite { id: String },
    /// List favorite establishments
    Favorites,
    /// List reviews of an establishment
    Reviews { id: String },
    /// Review an establishment
    Review {
        id: String,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,
        #[arg(long)]
        body: String,
    },
    /// Create an establishment (admin)
    Create {
        #[command(flatten)]
        fields: EstablishmentArgs,
        /// Cover image to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Edit an establishment (admin)
    Update {
        id: String,
        #[command(flatten)]
        fields: EstablishmentArgs,
    },
    /// Delete an establishment (admin)
    Delete { id: String },
    /// Show or clear recent searches
    Searches {
        #[arg(long)]
        clear: bool,
    },
    /// Show or set the theme (light or dark)
    Theme { value: Option<String> },
}

#[derive(Args, Debug)]
struct EstablishmentArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long = "type")]
    kind: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    rating: Option<f64>,
}

impl EstablishmentArgs {
    /// Overlay the given fields on `base`.
    fn apply_to(self, mut base: EstablishmentPayload) -> EstablishmentPayload {
        if let Some(v) = self.name {
            base.name = v;
        }
        if let Some(v) = self.kind {
            base.kind = v;
        }
        if let Some(v) = self.address {
            base.address = v;
        }
        base.phone_number = self.phone.or(base.phone_number);
        base.email = self.email.or(base.email);
        base.website = self.website.or(base.website);
        base.description = self.description.or(base.description);
        base.rating = self.rating.or(base.rating);
        base
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(api = %config.api_root(), "Starting etab");

    let store = ClientStore::open(&config.store_path).context("Failed to open client store")?;
    let navigator = Arc::new(HistoryNavigator::new(routes::ESTABLISHMENTS));
    let app = App::new(config, store, navigator.clone()).context("Failed to build API client")?;
    app.session.restore();

    let result = run(&app, cli.command).await;

    if navigator.current_route() == routes::LOGIN && !app.session.is_authenticated() {
        eprintln!("Signed out. Run `etab login <email> --password ...` to sign in.");
    }
    result
}

async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { email, password } => {
            let session = app.session.login(&email, &password).await?;
            println!(
                "Signed in as {} ({})",
                session.display_name,
                session.role.as_str()
            );
        }
        Commands::Register {
            name,
            email,
            password,
        } => {
            let request = etab_client::services::RegisterRequest {
                name,
                email,
                password_confirmation: password.clone(),
                password,
            };
            app.session.register(&request).await?;
            println!("Account created, you can now sign in");
        }
        Commands::Logout => {
            if let Some(redirect) = app.session.logout() {
                redirect.await?;
            }
            println!("Signed out");
        }
        Commands::Whoami => match app.session.session() {
            Some(s) => println!(
                "{} <{}> id={} role={}",
                s.display_name,
                s.email.as_deref().unwrap_or("-"),
                s.user_id.map_or_else(|| "-".to_string(), |id| id.to_string()),
                app.session.role().as_str()
            ),
            None => println!("Not signed in"),
        },
        Commands::List {
            category,
            search,
            covers,
        } => {
            app.directory.load_all().await?;
            if covers {
                app.directory.load_cover_images().await;
            }
            print_warning(app);
            if let Some(q) = &search {
                app.search.record(q);
            }

            let list = app.directory.filtered(&Filter {
                category,
                search_text: search,
            });
            for e in &list {
                let star = if app.favorites.contains(e.id.as_str()) { "*" } else { " " };
                println!("{} {:<12} {:<30} {:<20} {:.1}", star, e.id, e.name, e.kind, e.rating);
                if covers {
                    if let Some(url) = &e.cover_image {
                        println!("  {}", url);
                    }
                }
            }
            println!("{} establishment(s)", list.len());
        }
        Commands::Show { id } => {
            let id = resolve_id(app, &id).await?;
            let e = app.directory.get(&id).await?;
            let cover = app.directory.load_cover_image(&id).await;
            println!("{} ({})", e.name, e.kind);
            println!("  {}", e.address);
            for (label, value) in [
                ("Phone", &e.phone_number),
                ("Email", &e.email),
                ("Website", &e.website),
            ] {
                if let Some(v) = value {
                    println!("  {}: {}", label, v);
                }
            }
            println!("  Rating: {:.1}", e.rating);
            println!("  Cover: {}", cover);
            println!();
            println!("{}", e.description);

            let reviews = app.reviews.list(&id).await?;
            if let Some(avg) = average_rating(&reviews) {
                println!();
                println!("{} review(s), average {:.1}", reviews.len(), avg);
            }
        }
        Commands::Favorite { id } => {
            let now = app.favorites.toggle(&id);
            println!("{} {}", id, if now { "added to favorites" } else { "removed from favorites" });
        }
        Commands::Favorites => {
            let ids = app.favorites.list();
            if ids.is_empty() {
                println!("No favorites yet");
                return Ok(());
            }
            app.directory.load_all().await?;
            for id in ids {
                let name = app
                    .directory
                    .establishments()
                    .into_iter()
                    .find(|e| e.id.as_str() == id)
                    .map(|e| e.name)
                    .unwrap_or_else(|| "(unknown)".to_string());
                println!("{:<12} {}", id, name);
            }
        }
        Commands::Reviews { id } => {
            let id = resolve_id(app, &id).await?;
            let reviews = app.reviews.list(&id).await?;
            for r in &reviews {
                println!(
                    "#{} {} {} [{}]",
                    r.id,
                    "★".repeat(usize::from(r.rating)),
                    r.author_name,
                    review_date(&r.created_at)
                );
                println!("  {}", r.body);
            }
            if reviews.is_empty() {
                println!("No reviews yet");
            }
        }
        Commands::Review { id, rating, body } => {
            let id = resolve_id(app, &id).await?;
            let review = app.reviews.create(&id, &body, rating).await?;
            println!("Review #{} posted", review.id);
        }
        Commands::Create { fields, image } => {
            let image = image.map(read_image).transpose()?;
            app.directory.load_all().await?;
            let payload = fields.apply_to(EstablishmentPayload::default());
            let outcome = app.directory.create(payload, image).await?;
            println!("{}", outcome.message);
            if let Some(e) = outcome.establishment {
                println!("  id: {}", e.id);
            }
        }
        Commands::Update { id, fields } => {
            let id = resolve_id(app, &id).await?;
            let Some(current) = app.directory.find(&id) else {
                bail!("Establishment {} not found", id);
            };
            let payload = fields.apply_to(EstablishmentPayload::from_establishment(&current));
            let outcome = app.directory.update(&id, payload).await?;
            println!("{}", outcome.message);
        }
        Commands::Delete { id } => {
            let id = resolve_id(app, &id).await?;
            let outcome = app.directory.delete(&id).await?;
            println!("{}", outcome.message);
        }
        Commands::Searches { clear } => {
            if clear {
                app.search.clear();
            }
            for q in app.search.list() {
                println!("{}", q);
            }
        }
        Commands::Theme { value } => {
            match value.as_deref() {
                Some("light") => app.store.set_theme(Theme::Light),
                Some("dark") => app.store.set_theme(Theme::Dark),
                Some(other) => bail!("Unknown theme {:?}, expected light or dark", other),
                None => {}
            }
            println!("{}", app.store.theme().as_str());
        }
    }
    Ok(())
}

/// Map a user-typed id onto a loaded record id (demo ids are not remote).
async fn resolve_id(app: &App, raw: &str) -> anyhow::Result<EstablishmentId> {
    app.directory.load_all().await?;
    Ok(app
        .directory
        .establishments()
        .into_iter()
        .map(|e| e.id)
        .find(|id| id.as_str() == raw)
        .unwrap_or_else(|| EstablishmentId::Remote(raw.to_string())))
}

fn read_image(path: PathBuf) -> anyhow::Result<ImageUpload> {
    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = match path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    Ok(ImageUpload {
        file_name,
        mime_type: mime_type.to_string(),
        bytes,
    })
}

fn print_warning(app: &App) {
    if let Some(warning) = app.directory.state().warning {
        eprintln!("warning: {}", warning);
    }
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("etab_client=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
