use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;
use wikigraph::config::{
    ConfigError, default_global_config_yaml, default_repo_config_yaml, load_effective_config,
};
use wikigraph::import::{ImportError, run_import};
use wikigraph::index::documents::{default_document_path, default_title};
use wikigraph::index::{PageCursor, Scope, SqliteStore, StoreError, Visibility};
use wikigraph::query::link_pallet;
use wikigraph::store::{write_json, write_text};

const DATA_DIR: &str = ".wikigraph";
const IMPORT_STATE_FILE: &str = "import-state.json";
const LOG_ENV: &str = "WIKIGRAPH_LOG";

#[derive(Debug)]
struct CliError {
    code: &'static str,
    message: String,
}

impl CliError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn io(code: &'static str, err: io::Error) -> Self {
        Self::new(code, err.to_string())
    }
}

impl From<rusqlite::Error> for CliError {
    fn from(value: rusqlite::Error) -> Self {
        Self::new("sqlite_error", value.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::new("json_error", value.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(value: StoreError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::new("config_error", value.to_string())
    }
}

impl From<ImportError> for CliError {
    fn from(value: ImportError) -> Self {
        Self::new(value.code(), value.to_string())
    }
}

#[derive(Parser, Debug)]
#[command(name = "wikigraph")]
#[command(about = "A local wiki with a two-hop link graph over [[Title]] references")]
struct Cli {
    #[arg(long, global = true)]
    global: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Init,
    Create(CreateArgs),
    Show(PathArgs),
    Edit(EditArgs),
    Retitle(RetitleArgs),
    Visibility(VisibilityArgs),
    Delete(PathArgs),
    List(ListArgs),
    Titles,
    Links(PathArgs),
    Pallet(PalletArgs),
    Import,
    Reindex,
}

#[derive(Args, Debug)]
struct PathArgs {
    path: String,
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    path: Option<String>,
}

#[derive(Args, Debug)]
struct EditArgs {
    path: String,
    #[arg(long)]
    updated_at: String,
    #[arg(long)]
    body: Option<String>,
    #[arg(long)]
    stdin: bool,
}

#[derive(Args, Debug)]
struct RetitleArgs {
    path: String,
    title: String,
    #[arg(long)]
    updated_at: String,
}

#[derive(Args, Debug)]
struct VisibilityArgs {
    path: String,
    visibility: String,
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value_t = 20)]
    limit: usize,
    /// `updated_at` of the last document on the previous page.
    #[arg(long, requires = "before_path")]
    before: Option<String>,
    /// Path of the last document on the previous page.
    #[arg(long, requires = "before")]
    before_path: Option<String>,
}

#[derive(Args, Debug)]
struct PalletArgs {
    path: String,
    #[arg(long)]
    public: bool,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct RepoPaths {
    root: PathBuf,
    index: PathBuf,
    import_state: PathBuf,
    repo_config: PathBuf,
    user_config: PathBuf,
    mode: StorageMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StorageMode {
    RepoLocal,
    Global,
}

fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let payload = json!({
                "error": {
                    "code": err.code,
                    "message": err.message,
                }
            });
            eprintln!("{payload}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir().map_err(|err| CliError::io("cwd_error", err))?;
    let paths = repo_paths(&cwd, cli.global)?;
    match cli.command {
        Command::Init => cmd_init(&paths),
        Command::Create(args) => cmd_create(&paths, args),
        Command::Show(args) => cmd_show(&paths, args),
        Command::Edit(args) => cmd_edit(&paths, args),
        Command::Retitle(args) => cmd_retitle(&paths, args),
        Command::Visibility(args) => cmd_visibility(&paths, args),
        Command::Delete(args) => cmd_delete(&paths, args),
        Command::List(args) => cmd_list(&paths, args),
        Command::Titles => cmd_titles(&paths),
        Command::Links(args) => cmd_links(&paths, args),
        Command::Pallet(args) => cmd_pallet(&paths, args),
        Command::Import => cmd_import(&cwd, &paths),
        Command::Reindex => cmd_reindex(&paths),
    }
}

fn cmd_init(paths: &RepoPaths) -> Result<(), CliError> {
    std::fs::create_dir_all(&paths.root).map_err(|err| CliError::io("mkdir_error", err))?;
    let _ = SqliteStore::open(&path_string(&paths.index))?;
    write_default_config(paths)?;

    print_json(&json!({
        "status": "ok",
        "wikigraph_dir": paths.root,
        "index": paths.index,
        "mode": match paths.mode {
            StorageMode::RepoLocal => "repo",
            StorageMode::Global => "global",
        },
    }))
}

fn cmd_create(paths: &RepoPaths, args: CreateArgs) -> Result<(), CliError> {
    let store = open_store(paths)?;
    let now = Utc::now();
    let path = args.path.unwrap_or_else(|| default_document_path(now));
    let title = args.title.unwrap_or_else(|| default_title(now));
    let document = store.create_document(&path, &title, Visibility::Private)?;
    print_serialized(&document)
}

fn cmd_show(paths: &RepoPaths, args: PathArgs) -> Result<(), CliError> {
    let store = open_store(paths)?;
    print_serialized(&store.document_by_path(&args.path)?)
}

fn cmd_edit(paths: &RepoPaths, args: EditArgs) -> Result<(), CliError> {
    let body = match (args.body, args.stdin) {
        (Some(_), true) => {
            return Err(CliError::new(
                "invalid_input",
                "use either `--body <text>` or `--stdin`, not both",
            ));
        }
        (Some(body), false) => body,
        (None, true) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| CliError::io("stdin_error", err))?;
            buf
        }
        (None, false) => {
            return Err(CliError::new(
                "invalid_input",
                "expected `--body <text>` or `--stdin`",
            ));
        }
    };

    let store = open_store(paths)?;
    let document = store.update_body(&args.path, &body, &args.updated_at)?;
    print_serialized(&document)
}

fn cmd_retitle(paths: &RepoPaths, args: RetitleArgs) -> Result<(), CliError> {
    let store = open_store(paths)?;
    let document = store.update_title(&args.path, &args.title, &args.updated_at)?;
    print_serialized(&document)
}

fn cmd_visibility(paths: &RepoPaths, args: VisibilityArgs) -> Result<(), CliError> {
    let visibility = Visibility::parse(&args.visibility).ok_or_else(|| {
        CliError::new(
            "invalid_input",
            format!(
                "unknown visibility `{}` (expected public or private)",
                args.visibility
            ),
        )
    })?;
    let store = open_store(paths)?;
    print_serialized(&store.update_visibility(&args.path, visibility)?)
}

fn cmd_delete(paths: &RepoPaths, args: PathArgs) -> Result<(), CliError> {
    let store = open_store(paths)?;
    let removed_edges = store.delete_document(&args.path)?;
    print_json(&json!({
        "status": "ok",
        "path": args.path,
        "removed_edges": removed_edges,
    }))
}

fn cmd_list(paths: &RepoPaths, args: ListArgs) -> Result<(), CliError> {
    let store = open_store(paths)?;
    let cursor = args
        .before
        .zip(args.before_path)
        .map(|(updated_at, path)| PageCursor { updated_at, path });
    let documents = store.latest_documents(args.limit, cursor.as_ref(), Scope::Admin)?;
    let next_before = (documents.len() == args.limit)
        .then(|| documents.last().map(PageCursor::after))
        .flatten();
    print_json(&json!({
        "documents": documents,
        "next_before": next_before,
    }))
}

fn cmd_titles(paths: &RepoPaths) -> Result<(), CliError> {
    let store = open_store(paths)?;
    print_json(&json!({ "titles": store.all_titles()? }))
}

fn cmd_links(paths: &RepoPaths, args: PathArgs) -> Result<(), CliError> {
    let store = open_store(paths)?;
    print_json(&json!({
        "path": args.path,
        "links": store.linked_paths(&args.path)?,
    }))
}

fn cmd_pallet(paths: &RepoPaths, args: PalletArgs) -> Result<(), CliError> {
    let store = open_store(paths)?;
    let scope = if args.public {
        Scope::Public
    } else {
        Scope::Admin
    };
    let pallet = link_pallet(store.connection(), &args.path, scope)?;

    match args.output {
        Some(output) => {
            write_json(&output, &pallet).map_err(|err| CliError::io("write_error", err))?;
            print_json(&json!({
                "status": "ok",
                "path": args.path,
                "output": output,
            }))
        }
        None => print_serialized(&pallet),
    }
}

fn cmd_import(cwd: &Path, paths: &RepoPaths) -> Result<(), CliError> {
    let store = open_store(paths)?;
    let home = home_dir()?;
    let config = load_effective_config(cwd, Some(&paths.repo_config), Some(&paths.user_config))?;
    if config.sources.is_empty() {
        return Err(CliError::new(
            "missing_sources",
            "no import sources configured; add sources in .wikigraph/config.yml or ~/.wikigraph/config.yml",
        ));
    }

    let summary = run_import(&store, cwd, &home, &config, &paths.import_state)?;
    print_json(&json!({
        "status": if summary.failures.is_empty() { "ok" } else { "partial" },
        "scanned_inputs": summary.scanned,
        "created": summary.created,
        "updated": summary.updated,
        "skipped_unchanged": summary.skipped_unchanged,
        "failure_count": summary.failures.len(),
        "failures": summary.failures,
    }))
}

fn cmd_reindex(paths: &RepoPaths) -> Result<(), CliError> {
    let store = open_store(paths)?;
    let summary = store.reindex_all()?;
    print_json(&json!({
        "status": "ok",
        "documents": summary.documents,
        "edges": summary.edges,
    }))
}

fn repo_paths(cwd: &Path, global: bool) -> Result<RepoPaths, CliError> {
    let home = home_dir()?;
    let (root, mode) = if global {
        (home.join(DATA_DIR), StorageMode::Global)
    } else {
        (cwd.join(DATA_DIR), StorageMode::RepoLocal)
    };

    Ok(RepoPaths {
        index: root.join("index.sqlite"),
        import_state: root.join(IMPORT_STATE_FILE),
        repo_config: cwd.join(DATA_DIR).join("config.yml"),
        user_config: home.join(DATA_DIR).join("config.yml"),
        root,
        mode,
    })
}

fn open_store(paths: &RepoPaths) -> Result<SqliteStore, CliError> {
    if !paths.root.exists() || !paths.index.exists() {
        return Err(CliError::new(
            "not_initialized",
            "wiki is not initialized; run `wikigraph init`",
        ));
    }
    Ok(SqliteStore::open(&path_string(&paths.index))?)
}

fn write_default_config(paths: &RepoPaths) -> Result<(), CliError> {
    let config_path = match paths.mode {
        StorageMode::RepoLocal => &paths.repo_config,
        StorageMode::Global => &paths.user_config,
    };
    if config_path.exists() {
        return Ok(());
    }
    let default = match paths.mode {
        StorageMode::RepoLocal => default_repo_config_yaml(),
        StorageMode::Global => default_global_config_yaml(),
    };
    write_text(config_path, &default).map_err(|err| CliError::io("write_error", err))
}

fn home_dir() -> Result<PathBuf, CliError> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| CliError::new("home_error", "HOME environment variable is not set"))
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn print_serialized<T: Serialize>(value: &T) -> Result<(), CliError> {
    print_json(&serde_json::to_value(value)?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string(value)?;
    println!("{rendered}");
    Ok(())
}
