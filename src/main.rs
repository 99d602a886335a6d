use clap::Parser;
use dirsort::cli::{Cli, run_cli_with_config};

fn main() {
    let cli = Cli::parse();
    let (command, dir_path, options, config) = cli.into_parts();

    if let Err(e) = run_cli_with_config(command, &dir_path, &options, config.as_deref()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
