use std::error::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{info, error};

use sundry::compare;
use sundry::config::{CompareConfig, ServerConfig, DEFAULT_DATA_PATH};
use sundry::game::{self, Outcome};
use sundry::netdive::{
    self, combine_rows, expand_column, load_api_keys, load_hostname_list, load_ip_list,
    populate_settings, split_list, MyIpMsClient, Table,
};
use sundry::netdive::settings::API_KEYS_PATH;
use sundry::netdive::table::records_from_json;
use sundry::web::start_web_server;

#[derive(Parser)]
#[command(name = "sundry", version, about = "Guessing game, spam classifier and IP-lookup helpers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Play guess-the-number on the terminal
    Guess,
    /// Serve spam predictions over HTTP
    Serve(ServeArgs),
    /// Benchmark every classifier against every vectorizer
    Compare(CompareArgs),
    /// IP-intelligence helpers
    Netdive {
        #[command(subcommand)]
        command: NetdiveCommand,
    },
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, env = "SPAM_HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "PORT", default_value_t = 666)]
    port: u16,
    #[arg(long, env = "SPAM_DATA", default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// Cached predictions; 0 disables the cache
    #[arg(long, env = "SPAM_CACHE_CAPACITY", default_value_t = 1024)]
    cache_capacity: usize,
}

#[derive(Args)]
struct CompareArgs {
    #[arg(long, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,
    #[arg(long, default_value_t = 0.33)]
    test_size: f64,
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Also sweep the hashing vectorizer
    #[arg(long)]
    hashing: bool,
    /// Write the score table as CSV
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum NetdiveCommand {
    /// Print a random placeholder API key
    Keygen,
    /// Check that the API keys file has every key
    Keys {
        #[arg(long, default_value = API_KEYS_PATH)]
        settings: PathBuf,
    },
    /// Load IP and hostname target lists
    Targets {
        #[arg(long)]
        ips: Option<PathBuf>,
        #[arg(long)]
        hostnames: Option<PathBuf>,
        /// List the addresses behind each port
        #[arg(long)]
        group_by_port: bool,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Flatten a nested column of a JSON record array into a table
    Flatten {
        json: PathBuf,
        #[arg(long)]
        column: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a signed myip.ms lookup URL
    MyipUrl {
        query: String,
        #[arg(long, default_value = API_KEYS_PATH)]
        settings: PathBuf,
        #[arg(long)]
        as_array: bool,
    },
}

fn print_and_save(table: &Table, output: Option<&PathBuf>) -> Result<(), netdive::NetdiveError> {
    print!("{}", table);
    if let Some(path) = output {
        table.write_csv(path)?;
    }
    Ok(())
}

/// Sibling of `output` for the hostname table when the IP table takes `output`
fn hosts_output_path(output: &Path) -> PathBuf {
    let stem = output.file_stem().map_or_else(|| "targets".into(), |s| s.to_string_lossy());
    let name = match output.extension() {
        Some(ext) => format!("{}_hosts.{}", stem, ext.to_string_lossy()),
        None => format!("{}_hosts", stem),
    };
    output.with_file_name(name)
}

fn run_netdive(command: NetdiveCommand) -> Result<(), Box<dyn Error>> {
    match command {
        NetdiveCommand::Keygen => println!("{}", netdive::get_dummy_api_key()),
        NetdiveCommand::Keys { settings } => {
            load_api_keys(&settings)?;
            println!("All API keys present in {}", settings.display());
        }
        NetdiveCommand::Targets { ips, hostnames, group_by_port, output } => {
            if ips.is_none() && hostnames.is_none() {
                return Err("pass --ips and/or --hostnames".into());
            }

            if let Some(path) = hostnames {
                let hosts = load_hostname_list(&path)?;
                let names: Vec<&String> = hosts.keys().collect();
                let mut table = Table::new(["key", "host"]);
                for (key, host) in split_list(&names, "host") {
                    table.push_row([key, host.to_string()]);
                }
                let hosts_output = match (&output, &ips) {
                    (Some(path), Some(_)) => Some(hosts_output_path(path)),
                    (output, None) => output.clone(),
                    (None, _) => None,
                };
                print_and_save(&table, hosts_output.as_ref())?;
            }

            if let Some(path) = ips {
                let (addresses, targets) = load_ip_list(&path)?;
                let mut table = Table::new(["key", "ip", "port"]);
                for (key, ip) in split_list(&addresses, "ip") {
                    let port = targets.get(&ip).map_or(netdive::DEFAULT_PORT, |t| t.port);
                    table.push_row([key, ip, port.to_string()]);
                }
                if group_by_port {
                    table = combine_rows(&table, "port", "ip")?;
                }
                print_and_save(&table, output.as_ref())?;
            }
        }
        NetdiveCommand::Flatten { json, column, output } => {
            let records = records_from_json(&fs::read_to_string(&json)?)?;
            let table = expand_column(&records, &column);
            print_and_save(&table, output.as_ref())?;
        }
        NetdiveCommand::MyipUrl { query, settings, as_array } => {
            let client = MyIpMsClient::from_settings(&populate_settings(&settings)?)?;
            println!("{}", client.request_url_now(&query, as_array));
        }
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    let cli = Cli::parse();

    match cli.command {
        Command::Guess => {
            let stdin = io::stdin();
            let outcome = game::run_interactive(&mut stdin.lock(), &mut io::stdout(), &mut rand::thread_rng())?;
            if let Outcome::Won { guesses } = outcome {
                info!("Game won in {} guesses", guesses);
            }
        }
        Command::Serve(args) => {
            let config = ServerConfig {
                host: args.host,
                port: args.port,
                data_path: args.data,
                cache_capacity: args.cache_capacity,
                ..ServerConfig::default()
            };
            if let Err(e) = start_web_server(config).await {
                error!("Server stopped: {}", e);
                return Err(e.into());
            }
        }
        Command::Compare(args) => {
            let config = CompareConfig {
                data_path: args.data,
                test_size: args.test_size,
                seed: args.seed,
                hashing: args.hashing,
                output: args.output,
            };
            compare::run(&config, &mut io::stdout())?;
        }
        Command::Netdive { command } => run_netdive(command)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hosts_output_path() {
        assert_eq!(hosts_output_path(Path::new("out/targets.csv")), PathBuf::from("out/targets_hosts.csv"));
        assert_eq!(hosts_output_path(Path::new("report")), PathBuf::from("report_hosts"));
    }

    #[test]
    fn test_targets_writes_both_tables() {
        let dir = tempfile::tempdir().unwrap();
        let ips = dir.path().join("ips.txt");
        let hosts = dir.path().join("hosts.txt");
        std::fs::write(&ips, "10.0.0.1:8080\n10.0.0.2\n").unwrap();
        std::fs::write(&hosts, "example.com\n").unwrap();
        let output = dir.path().join("targets.csv");

        run_netdive(NetdiveCommand::Targets {
            ips: Some(ips),
            hostnames: Some(hosts),
            group_by_port: false,
            output: Some(output.clone()),
        })
        .unwrap();

        let ip_csv = std::fs::read_to_string(&output).unwrap();
        assert!(ip_csv.contains("10.0.0.1,8080"));
        let host_csv = std::fs::read_to_string(dir.path().join("targets_hosts.csv")).unwrap();
        assert!(host_csv.contains("host1,example.com"));
    }
}
