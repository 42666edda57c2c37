//! Linkgraph CLI: inspect and edit an on-disk linkgraph store
//!
//! Opens the store directly; no server is involved.

use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use linkgraph::{Link, LinkGraphStore, Node, StoreConfig};

#[derive(Parser)]
#[command(name = "linkgraph", version, about = "Linkgraph node/link store CLI")]
struct Cli {
    /// Store directory
    #[arg(long, global = true, env = "LINKGRAPH_STORE_DIR", default_value = "./linkgraph-data")]
    store_dir: String,

    /// YAML configuration file; overrides --store-dir
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or overwrite a node
    AddNode {
        id: u64,
        /// Payload, stored as UTF-8 bytes
        #[arg(long, default_value = "")]
        data: String,
        #[arg(long = "type", default_value_t = 0)]
        node_type: i32,
        #[arg(long, default_value_t = 0)]
        version: i64,
        #[arg(long, default_value_t = 0)]
        time: i32,
    },
    /// Show a node
    GetNode { id: u64 },
    /// Delete a node and its links
    DeleteNode { id: u64 },
    /// Create or overwrite a link
    AddLink {
        id1: u64,
        link_type: i64,
        id2: u64,
        #[arg(long, default_value = "")]
        data: String,
        #[arg(long, default_value_t = 0)]
        time: i64,
        #[arg(long, default_value_t = 0)]
        version: i32,
        #[arg(long)]
        noinverse: bool,
    },
    /// Show one link, hidden or not
    GetLink { id1: u64, link_type: i64, id2: u64 },
    /// List visible links, newest first
    ListLinks {
        id1: u64,
        link_type: i64,
        #[arg(long, default_value_t = i64::MIN, allow_hyphen_values = true)]
        min_time: i64,
        #[arg(long, default_value_t = i64::MAX, allow_hyphen_values = true)]
        max_time: i64,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Count visible links
    CountLinks { id1: u64, link_type: i64 },
    /// Hide a link, or remove it with --expunge
    DeleteLink {
        id1: u64,
        link_type: i64,
        id2: u64,
        #[arg(long)]
        expunge: bool,
    },
    /// Show store statistics
    Stats,
    /// Start an interactive shell
    Shell,
}

/// One line typed into the shell
#[derive(Parser)]
#[command(name = "linkgraph", no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Commands,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = open_store(&cli).and_then(|store| run(&store, cli.command, &cli.format));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn open_store(cli: &Cli) -> Result<LinkGraphStore, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => StoreConfig::from_yaml_file(path)?,
        None => StoreConfig::new(&cli.store_dir),
    };
    Ok(LinkGraphStore::open(config)?)
}

fn run(store: &LinkGraphStore, command: Commands, format: &OutputFormat) -> CliResult {
    match command {
        Commands::AddNode {
            id,
            data,
            node_type,
            version,
            time,
        } => {
            store.add_node(&Node::new(id, node_type, version, time, data.into_bytes()))?;
            println!("Stored node {}", id);
        }
        Commands::GetNode { id } => match store.get_node(id)? {
            Some(node) => print_nodes(&[node], format)?,
            None => println!("(no node {})", id),
        },
        Commands::DeleteNode { id } => {
            if store.delete_node(id)? {
                println!("Deleted node {}", id);
            } else {
                println!("(no node {})", id);
            }
        }
        Commands::AddLink {
            id1,
            link_type,
            id2,
            data,
            time,
            version,
            noinverse,
        } => {
            let link = Link::new(id1, link_type, id2)
                .with_data(data)
                .with_time(time)
                .with_version(version);
            if store.add_link(&link, noinverse)? {
                println!("Created link ({}, {}, {})", id1, link_type, id2);
            } else {
                println!("Updated link ({}, {}, {})", id1, link_type, id2);
            }
        }
        Commands::GetLink { id1, link_type, id2 } => match store.get_link(id1, link_type, id2)? {
            Some(link) => print_links(&[link], format)?,
            None => println!("(no link ({}, {}, {}))", id1, link_type, id2),
        },
        Commands::ListLinks {
            id1,
            link_type,
            min_time,
            max_time,
            offset,
            limit,
        } => match store.get_link_list_range(id1, link_type, min_time, max_time, offset, limit)? {
            Some(links) => print_links(&links, format)?,
            None => println!("(no links)"),
        },
        Commands::CountLinks { id1, link_type } => {
            let count = store.count_links(id1, link_type)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::json!({ "count": count })),
                OutputFormat::Table => println!("{}", count),
            }
        }
        Commands::DeleteLink {
            id1,
            link_type,
            id2,
            expunge,
        } => {
            if store.delete_link(id1, link_type, id2, expunge)? {
                let action = if expunge { "Expunged" } else { "Hid" };
                println!("{} link ({}, {}, {})", action, id1, link_type, id2);
            } else {
                println!("(no link ({}, {}, {}))", id1, link_type, id2);
            }
        }
        Commands::Stats => run_stats(store, format)?,
        Commands::Shell => run_shell(store, format)?,
    }
    Ok(())
}

fn run_stats(store: &LinkGraphStore, format: &OutputFormat) -> CliResult {
    let config = store.config()?;
    let nodes = store.object_count()?;
    let links = store.relationship_count()?;

    match format {
        OutputFormat::Json => {
            let stats = serde_json::json!({
                "version": linkgraph::version(),
                "store_dir": config.store_dir,
                "nodes": nodes,
                "links": links,
                "bulk_load_batch_size": config.bulk_load_batch_size,
            });
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Table => {
            println!("Version: {}", linkgraph::version());
            println!("Store:   {}", config.store_dir.display());
            println!("Nodes:   {}", nodes);
            println!("Links:   {}", links);
        }
    }
    Ok(())
}

fn run_shell(store: &LinkGraphStore, format: &OutputFormat) -> CliResult {
    println!("Linkgraph Interactive Shell");
    println!("Type a command (e.g. `count-links 1 5`), help, or :quit to exit.\n");

    let stdin = std::io::stdin();
    let mut line = String::new();

    loop {
        eprint!("linkgraph> ");

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, ":quit" | ":exit" | ":q") {
            break;
        }

        match ShellLine::try_parse_from(trimmed.split_whitespace()) {
            Ok(ShellLine {
                command: Commands::Shell,
            }) => eprintln!("Already in the shell"),
            Ok(parsed) => {
                if let Err(e) = run(store, parsed.command, format) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(e) => eprintln!("{}", e),
        }
    }

    println!("Bye!");
    Ok(())
}

fn print_nodes(nodes: &[Node], format: &OutputFormat) -> CliResult {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(nodes)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["id", "type", "version", "time", "data"]);
            for node in nodes {
                table.add_row(vec![
                    node.id.to_string(),
                    node.node_type.to_string(),
                    node.version.to_string(),
                    node.time.to_string(),
                    format_payload(&node.data),
                ]);
            }
            println!("{}", table);
        }
    }
    Ok(())
}

fn print_links(links: &[Link], format: &OutputFormat) -> CliResult {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(links)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["id1", "type", "id2", "visible", "version", "time", "data"]);
            for link in links {
                table.add_row(vec![
                    link.id1.to_string(),
                    link.link_type.to_string(),
                    link.id2.to_string(),
                    link.is_visible().to_string(),
                    link.version.to_string(),
                    link.time.to_string(),
                    format_payload(&link.data),
                ]);
            }
            println!("{}", table);
            println!("{} link(s)", links.len());
        }
    }
    Ok(())
}

fn format_payload(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<{} bytes>", data.len()),
    }
}
