use clap::Parser;
use pedqc::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{hwe, pairs},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Pairs(_) => "pairs",
        Command::Hwe(_) => "hwe",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Pairs(args) => pairs::pairs(args)?,
        Command::Hwe(args) => hwe::hwe(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
