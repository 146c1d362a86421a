//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wiki page renderer CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Site directory holding one sub-directory per account
    #[arg(short, long, default_value = "./")]
    pub root: PathBuf,

    /// Config file name, relative to `root` (default: wiklet.toml)
    #[arg(short = 'C', long, default_value = "wiklet.toml")]
    pub config: PathBuf,

    /// Only report errors
    #[arg(short, long)]
    pub quiet: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Render a page or folder to stdout
    Render {
        /// Account name owning the page, e.g. alice@example.com
        account: String,

        /// Path of the page inside the account, e.g. /Notebook/Home
        path: String,

        /// Chrome template wrapped around the page (overrides [render.chrome])
        #[arg(long)]
        chrome: Option<String>,

        /// Render without any chrome
        #[arg(long, conflicts_with = "chrome")]
        bare: bool,

        /// Locale for date directives, e.g. fr_FR
        #[arg(short, long)]
        locale: Option<String>,

        /// Account name the page is rendered for
        #[arg(long)]
        requestor: Option<String>,

        /// Item kind listed by `{{TOC format=template}}` (wiki, document, folder)
        #[arg(long)]
        view: Option<String>,
    },

    /// Print the tokens of a page source
    Tokens {
        /// Source file to tokenize
        file: PathBuf,

        /// Print tokens as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a wiki link to its REST url
    Url {
        /// Account name the link is written in
        account: String,

        /// Link as written, e.g. ../Recipes/Soup or //bob@example.com/Notebook
        url: String,

        /// Folder path the link is written in
        #[arg(short, long, default_value = "/Notebook")]
        folder: String,
    },
}
