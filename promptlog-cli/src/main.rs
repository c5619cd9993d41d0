mod config;
mod constants;

use crate::config::{load_config, open_service};
use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use promptlog_core::attachment::Attachment;
use promptlog_core::manager::{PromptFilters, PromptManager, SortField, SortOrder, TextPromptManager};
use promptlog_core::prompt::{AnyTextPrompt, MultiModalPrompt, Prompt, PromptBase, TextPrompt, parse_date};
use promptlog_core::storage_service::StorageMode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(version,
display_name = "promptlog",
bin_name = "promptlog",
about="Keep a log of prompts sent to generative AI models",
long_about="Keep a log of prompts sent to generative AI models: record, filter, sort and search them", )]
struct Args {
    #[arg(short = 'p', long)]
    store_path: Option<String>,

    /// Keep prompts in memory only, without reading or writing the store
    #[arg(long)]
    headless: bool,

    #[arg(short = 'v', long)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    Add {
        #[arg(short = 'm', long)]
        model: String,
        #[arg(short = 'V', long)]
        model_version: String,
        #[arg(short = 't', long = "type")]
        prompt_type: String,
        #[arg(short = 'r', long, default_value = "Success")]
        result: String,
        /// RFC 3339 timestamp or YYYY-MM-DD, defaults to now
        #[arg(short = 'd', long)]
        date: Option<String>,
        #[arg(short = 'i', long)]
        input: String,
        #[arg(short = 'o', long, default_value = "")]
        output: String,
        /// Input attachment as TYPE=PAYLOAD
        #[arg(short = 'a', long)]
        attach: Vec<String>,
        /// Output attachment as TYPE=PAYLOAD
        #[arg(long)]
        produce: Vec<String>,
    },
    List {
        #[arg(short = 'm', long)]
        model: Option<String>,
        #[arg(short = 'V', long)]
        model_version: Option<String>,
        #[arg(short = 't', long = "type")]
        prompt_type: Option<String>,
        #[arg(short = 'r', long)]
        result: Option<String>,
        /// Sort the listing by one of id, model, version, type, date, result.
        /// The stored order is left unchanged
        #[arg(short = 's', long)]
        sort: Option<String>,
    },
    Search {
        term: String,
    },
    Remove {
        id: String,
    },
    Order {
        /// asc or desc
        order: String,
    },
    Clear,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn parse_attachments(values: &[String]) -> anyhow::Result<Vec<Attachment>> {
    values
        .iter()
        .map(|value| {
            let (attachment_type, payload) = value
                .split_once('=')
                .ok_or_else(|| anyhow!("Attachment must look like TYPE=PAYLOAD: {}", value))?;
            Ok(Attachment::new(attachment_type, payload)?)
        })
        .collect()
}

/// Filters `prompts` and, when `sort` is given, sorts the matches in `sort_order`.
fn list_prompts(
    prompts: &[Prompt],
    sort_order: SortOrder,
    filters: &PromptFilters,
    sort: Option<SortField>,
) -> Vec<Prompt> {
    let matching = prompts.iter().filter(|p| filters.matches(*p)).cloned().collect();
    let mut listing = PromptManager::with_prompts(matching, sort_order);
    if let Some(field) = sort {
        listing.sort_prompts(field);
    }
    listing.prompts().to_vec()
}

/// Searches the text and multimodal prompts. Base prompts carry no text and are skipped.
fn search_text_prompts(prompts: &[Prompt], sort_order: SortOrder, term: &str) -> Vec<AnyTextPrompt> {
    let texts = prompts
        .iter()
        .cloned()
        .filter_map(|p| AnyTextPrompt::try_from(p).ok())
        .collect();
    let manager: TextPromptManager = TextPromptManager::with_prompts(texts, sort_order);
    manager.search_prompts(term).into_iter().cloned().collect()
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config();
    let mode = if args.headless { StorageMode::Ephemeral } else { StorageMode::Durable };
    debug!(?mode, store_path = ?args.store_path, "Opening prompt store");
    let mut service = open_service(&config, args.store_path, mode).context("Failed to open prompt store")?;

    match args.cmd {
        Commands::Add { model, model_version, prompt_type, result, date, input, output, attach, produce } => {
            let date = match date {
                Some(date) => parse_date(&date)?,
                None => chrono::Utc::now(),
            };
            let base = PromptBase::new(model, model_version, prompt_type, date, result)?;
            let text = TextPrompt::new(base, input, output)?;

            let inputs = parse_attachments(&attach)?;
            let outputs = parse_attachments(&produce)?;
            let prompt = if inputs.is_empty() && outputs.is_empty() {
                Prompt::from(text)
            } else {
                Prompt::from(MultiModalPrompt::new(text, inputs, outputs))
            };

            let id = prompt.base().id().to_string();
            service.add_prompt(prompt)?;
            println!("{}", id);
        }
        Commands::List { model, model_version, prompt_type, result, sort } => {
            let sort = sort.map(|field| field.parse::<SortField>()).transpose()?;
            let filters = PromptFilters {
                model,
                version: model_version,
                prompt_type,
                result: result.map(Into::into),
            };
            for prompt in list_prompts(service.prompts(), service.sort_order(), &filters, sort) {
                println!("{}", prompt);
            }
        }
        Commands::Search { term } => {
            for prompt in search_text_prompts(service.prompts(), service.sort_order(), &term) {
                println!("{}", prompt);
            }
        }
        Commands::Remove { id } => {
            if service.remove_prompt_by_id(&id)? == 0 {
                eprintln!("Error: No prompt with id {}", id);
                std::process::exit(exitcode::DATAERR);
            }
        }
        Commands::Order { order } => {
            let order: SortOrder = order.parse()?;
            service.set_sort_order(order)?;
        }
        Commands::Clear => {
            service.clear_prompts()?;
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(exitcode::SOFTWARE);
    }
}
