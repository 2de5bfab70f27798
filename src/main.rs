// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use blog_cms::utils::logging::{
    format_error, format_info, format_post_row, format_success, format_warning,
};
use blog_cms::{AppState, Config, ContentPipeline, HealthCheck, HealthReport, run_api};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser)]
#[command(name = "blog_cms")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Markdown blog CMS and lead relay", long_about = None)]
struct Cli {
    /// Configuration file; defaults to config/default.toml when present
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List stored posts, newest first
    List {
        /// Only posts whose category slug matches
        #[arg(long)]
        category: Option<String>,
    },

    /// Print one post
    Show {
        slug: String,

        /// Print the rendered html instead of the markdown body
        #[arg(long)]
        html: bool,

        /// Print the table of contents
        #[arg(long)]
        toc: bool,
    },

    /// Publish a markdown file with complete frontmatter
    Publish {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete a stored post
    Delete {
        slug: String,

        #[arg(long)]
        confirm: bool,
    },

    /// Strictly validate every stored post
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    blog_cms::utils::logging::init_logger(cli.color, cli.verbose);

    match &cli.config {
        Some(path) => info!("Loading configuration from: {}", path.display()),
        None => info!("Loading configuration from defaults and environment"),
    }
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(config, host, port).await?;
        }
        Commands::List { category } => {
            cmd_list(&config, category.as_deref()).await?;
        }
        Commands::Show { slug, html, toc } => {
            cmd_show(&config, &slug, html, toc).await?;
        }
        Commands::Publish { file } => {
            cmd_publish(&config, file).await?;
        }
        Commands::Delete { slug, confirm } => {
            cmd_delete(&config, &slug, confirm).await?;
        }
        Commands::Check => {
            cmd_check(&config).await?;
        }
    }

    Ok(())
}

async fn cmd_serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate().context("Invalid server settings")?;

    info!("Content directory: {}", config.blog.content_dir.display());

    let state = AppState::from_config(config).context("Failed to initialise application state")?;
    run_api(state).await.context("HTTP server failed")?;

    Ok(())
}

async fn cmd_list(config: &Config, category: Option<&str>) -> Result<()> {
    let pipeline = ContentPipeline::from_config(&config.blog);
    let store = pipeline.store();

    let posts = match category {
        Some(category) => store.list_by_category(category).await?,
        None => store.list().await?,
    };

    if posts.is_empty() {
        println!("{}", format_info("No posts found"));
        return Ok(());
    }

    for post in &posts {
        println!(
            "{}",
            format_post_row(&post.date, &post.category, &post.title, &post.slug)
        );
    }
    println!("\n{}", format_info(&format!("{} post(s)", posts.len())));

    Ok(())
}

async fn cmd_show(config: &Config, slug: &str, html: bool, toc: bool) -> Result<()> {
    let pipeline = ContentPipeline::from_config(&config.blog);
    let rendered = match pipeline.render_post(slug).await {
        Ok(rendered) => rendered,
        Err(e) if e.is_not_found() => {
            println!("{}", format_error(&e.to_string()));
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to read post"),
    };

    let post = &rendered.post;
    println!("{}", post.title);
    println!("{} | {} | {}", post.date, post.category, post.image);
    println!("{}\n", post.excerpt);

    if toc {
        println!("Contents:");
        for heading in &rendered.toc {
            let indent = "  ".repeat(heading.level.saturating_sub(2) as usize);
            println!("{}- {} ({})", indent, heading.text, heading.anchor());
        }
        println!();
    }

    if html {
        println!("{}", rendered.html);
    } else {
        println!("{}", post.content);
    }

    Ok(())
}

async fn cmd_publish(config: &Config, file: PathBuf) -> Result<()> {
    info!("Publishing {}", file.display());
    let start_time = Instant::now();

    let pipeline = ContentPipeline::from_config(&config.blog);
    let outcome = pipeline
        .import_file(&file)
        .await
        .with_context(|| format!("Failed to publish {}", file.display()))?;

    let verb = if outcome.created { "Created" } else { "Updated" };
    println!(
        "{}",
        format_success(&format!(
            "{} {} ({}) in {:.2}s",
            verb,
            outcome.post.slug,
            outcome.post.date,
            start_time.elapsed().as_secs_f64()
        ))
    );

    Ok(())
}

async fn cmd_delete(config: &Config, slug: &str, confirm: bool) -> Result<()> {
    if !confirm {
        println!(
            "{}",
            format_warning(&format!("This will delete {}. Use --confirm to proceed", slug))
        );
        return Ok(());
    }

    let pipeline = ContentPipeline::from_config(&config.blog);
    match pipeline.store().delete(slug).await {
        Ok(()) => println!("{}", format_success(&format!("Deleted {}", slug))),
        Err(e) if e.is_not_found() => println!("{}", format_error(&e.to_string())),
        Err(e) => return Err(e).context("Failed to delete post"),
    }

    Ok(())
}

async fn cmd_check(config: &Config) -> Result<()> {
    let health = HealthReport::new(
        vec![
            HealthCheck::content_dir(&config.blog),
            HealthCheck::crm(&config.crm),
        ],
        env!("CARGO_PKG_VERSION").to_string(),
    );
    println!("{}", health.format());

    let pipeline = ContentPipeline::from_config(&config.blog);
    let report = pipeline.check().await.context("Failed to check posts")?;

    for problem in &report.problems {
        println!("{}", format_error(&format!("{}: {}", problem.file, problem.message)));
    }

    let summary = format!("{}/{} posts valid", report.valid, report.checked);
    if report.is_clean() {
        println!("{}", format_success(&summary));
        Ok(())
    } else {
        println!("{}", format_warning(&summary));
        Err(anyhow::anyhow!("{} post(s) failed validation", report.problems.len()))
    }
}
