use clap::ArgMatches;
use clap_complete::{generate, Shell};
use ptaworks::prelude::*;
use ptaworks::{cli, pw_callgraph, pw_hierarchy, pw_pta};
use std::io;

fn main() -> PwResult<()> {
    let args = cli::ptaworks().get_matches();

    match &args.subcommand() {
        Some(("callgraph", cmd_args)) => pw_callgraph::run(cmd_args),
        Some(("hierarchy", cmd_args)) => pw_hierarchy::run(cmd_args),
        Some(("pta", cmd_args)) => pw_pta::run(cmd_args),
        Some(("gen-completions", sub_args)) => subcommand_gen_completions(sub_args),
        Some((subcommand, _)) => Err(PwError::BadArguments(format!(
            "unknown subcommand '{subcommand}'"
        ))),
        None => Err(PwError::BadArguments("missing subcommand".to_string())),
    }
}

fn subcommand_gen_completions(sub_args: &ArgMatches) -> PwResult<()> {
    let generator = *sub_args
        .get_one::<Shell>("shell")
        .ok_or_else(|| PwError::BadArguments("--shell needed".to_string()))?;
    let mut cmd = cli::ptaworks();
    let cmd_name = cmd.get_name().to_string();
    generate(generator, &mut cmd, cmd_name, &mut io::stdout());
    Ok(())
}
