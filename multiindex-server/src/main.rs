use clap::{parser::ValueSource, ArgMatches, CommandFactory, FromArgMatches, Parser};
use multiindex_http::serve;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8888";

#[derive(Parser)]
#[command(name = "multiindex", version, about = "Multi-tenant page index server")]
struct Cli {
    #[arg(long, env = "MULTIINDEX_DATA_DIR", default_value = "./data")]
    data_dir: String,
    #[arg(long, env = "MULTIINDEX_BIND_ADDR")]
    bind_addr: Option<String>,
    #[arg(long, env = "MULTIINDEX_PORT")]
    port: Option<u16>,

    /// Basic auth credential as user:password.
    #[arg(long, env = "MULTIINDEX_CREDENTIALS", hide_env_values = true)]
    credentials: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cmd = Cli::command();
    let matches = cmd.get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    let bind_addr = resolve_bind_addr(&cli, &matches);
    let credentials = cli
        .credentials
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or("MULTIINDEX_CREDENTIALS (or --credentials user:password) is required")?;

    std::env::set_var("MULTIINDEX_DATA_DIR", &cli.data_dir);
    std::env::set_var("MULTIINDEX_BIND_ADDR", &bind_addr);
    std::env::set_var("MULTIINDEX_CREDENTIALS", credentials);
    serve().await
}

/// Command-line flags beat env vars; `--bind-addr` beats `--port`.
fn resolve_bind_addr(cli: &Cli, matches: &ArgMatches) -> String {
    if is_set_on_command_line(matches, "bind_addr") {
        if let Some(bind_addr) = &cli.bind_addr {
            return bind_addr.clone();
        }
    }

    if is_set_on_command_line(matches, "port") {
        if let Some(port) = cli.port {
            return format!("127.0.0.1:{port}");
        }
    }

    if let Some(bind_addr) = &cli.bind_addr {
        return bind_addr.clone();
    }

    if let Some(port) = cli.port {
        return format!("127.0.0.1:{port}");
    }

    DEFAULT_BIND_ADDR.to_string()
}

fn is_set_on_command_line(matches: &ArgMatches, arg: &str) -> bool {
    matches.value_source(arg) == Some(ValueSource::CommandLine)
}
