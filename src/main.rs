//! wiklet - render wiki pages from a directory of accounts.

mod cli;

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::{Write, stdout};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use wiklet::config::WikiConfig;
use wiklet::logger::set_quiet;
use wiklet::services::AccountBy;
use wiklet::template::tokenize;
use wiklet::{MemoryStore, Request, Wiki, WikiUrl, log};

fn main() -> ExitCode {
    let cli = Cli::parse();
    set_quiet(cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log!("error"; "{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if let Commands::Tokens { file, json } = &cli.command {
        return print_tokens(file, *json);
    }

    let mut config = load_config(cli)?;
    if let Commands::Render { bare: true, .. } = &cli.command {
        config.render.chrome = None;
    }

    let store = MemoryStore::load_dir(&cli.root, &config.server.name)?;
    config.apply(&store)?;
    let wiki = Wiki::new(store.services(), config);
    log!("wiki"; "loaded {}", cli.root.display());

    match &cli.command {
        Commands::Render {
            account,
            path,
            chrome,
            locale,
            requestor,
            view,
            ..
        } => {
            let account_id = account_id(&store, account)?;
            let page = wiki.find_page_by_path(&account_id, path, None, false)?;
            let request = Request {
                requestor: requestor.clone(),
                view: view.clone(),
                locale: locale.clone(),
            };
            let body = wiki.render_page(&request, &page, chrome.as_deref())?;
            let mut out = stdout().lock();
            writeln!(out, "{body}")?;
            Ok(())
        }
        Commands::Url {
            account,
            url,
            folder,
        } => {
            let account_id = account_id(&store, account)?;
            let current = store
                .find(&account_id, folder)
                .ok_or_else(|| anyhow!("no folder {folder} in {account}"))?;
            let href = WikiUrl::parse(url, Some(current)).full_url(wiki.services(), &account_id)?;
            println!("{href}");
            Ok(())
        }
        Commands::Tokens { file, json } => print_tokens(file, *json),
    }
}

/// Load and validate configuration; a missing file means defaults.
fn load_config(cli: &Cli) -> Result<WikiConfig> {
    let path = cli.root.join(&cli.config);
    let config = if path.exists() {
        WikiConfig::from_path(&path)?
    } else {
        log!("config"; "{} not found, using defaults", path.display());
        WikiConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn account_id(store: &Arc<MemoryStore>, name: &str) -> Result<String> {
    use wiklet::services::Directory;

    store
        .account(AccountBy::Name(name))?
        .map(|account| account.id)
        .ok_or_else(|| anyhow!("no such account: {name}"))
}

fn print_tokens(file: &Path, json: bool) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let tokens = tokenize(&source);
    let mut out = stdout().lock();

    if json {
        let list: Vec<_> = tokens
            .iter()
            .map(|token| serde_json::json!({ "kind": token.kind(), "value": token.value() }))
            .collect();
        serde_json::to_writer_pretty(&mut out, &list)?;
        writeln!(out)?;
    } else {
        for token in &tokens {
            writeln!(out, "{:?}\t{:?}", token.kind(), token.value())?;
        }
    }
    Ok(())
}
