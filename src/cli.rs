//! Main `PtaWorks` binary command line arguments options.
//!
//! This module declares a function to build `clap` command line arguments
//! parser, so that it can be used from other places than the main binary,
//! such as from bash completion file generator.

use clap::{value_parser, Arg, ArgAction, Command};
use clap_complete::Shell;

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

fn arg_debug() -> Arg {
    Arg::new("debug")
        .short('d')
        .long("debug")
        .action(ArgAction::SetTrue)
        .help("Activate debug mode")
}

fn arg_verbose() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::SetTrue)
        .help("Activate verbose mode")
}

fn arg_ecslog() -> Arg {
    Arg::new("ecslog")
        .short('e')
        .long("ecslog")
        .action(ArgAction::SetTrue)
        .help("Output logs in ECS format")
}

fn arg_input() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .action(ArgAction::Set)
        .required(true)
        .help("Input program file")
}

fn arg_system() -> Arg {
    Arg::new("system")
        .short('s')
        .long("system")
        .action(ArgAction::Set)
        .help("Additional library program file")
}

fn arg_output(help: &str) -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .action(ArgAction::Set)
        .help(help.to_string())
}

fn arg_filter_class() -> Arg {
    Arg::new("filter-class")
        .long("filter-class")
        .action(ArgAction::Set)
        .help("Class(es) regex filter")
}

fn arg_filter_method() -> Arg {
    Arg::new("filter-method")
        .long("filter-method")
        .action(ArgAction::Set)
        .help("Method(s) regex filter")
}

#[must_use]
pub fn ptaworks() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .author(AUTHORS)
        .about(DESCRIPTION)
        .subcommand(callgraph())
        .subcommand(hierarchy())
        .subcommand(pta())
        .subcommand(
            Command::new("gen-completions")
                .about("Generates completions file")
                .arg(
                    Arg::new("shell")
                        .short('s')
                        .long("shell")
                        .action(ArgAction::Set)
                        .value_parser(value_parser!(Shell))
                        .required(true)
                        .help("Shell type for completion generation"),
                ),
        )
}

#[must_use]
pub fn callgraph() -> Command {
    Command::new("callgraph")
        .bin_name("pw-callgraph")
        .version(VERSION)
        .author(AUTHORS)
        .about("Generates class hierarchy analysis callgraph")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(arg_input())
        .arg(arg_system())
        .arg(arg_output("Output dot file"))
        .arg(arg_filter_class())
        .arg(arg_filter_method())
}

#[must_use]
pub fn hierarchy() -> Command {
    Command::new("hierarchy")
        .bin_name("pw-hierarchy")
        .version(VERSION)
        .author(AUTHORS)
        .about("Generates classes hierarchy graph")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(arg_input())
        .arg(arg_system())
        .arg(arg_output("Output dot file"))
        .arg(arg_filter_class())
        .arg(arg_filter_method())
}

#[must_use]
pub fn pta() -> Command {
    Command::new("pta")
        .bin_name("pw-pta")
        .version(VERSION)
        .author(AUTHORS)
        .about("Runs points-to analysis and on-the-fly callgraph construction")
        .arg(arg_debug())
        .arg(arg_verbose())
        .arg(arg_ecslog())
        .arg(arg_input())
        .arg(arg_system())
        .arg(arg_output("Output JSON report file"))
        .arg(arg_filter_class())
        .arg(arg_filter_method())
        .arg(
            Arg::new("cs")
                .short('c')
                .long("cs")
                .action(ArgAction::Set)
                .default_value("ci")
                .help("Context sensitivity: ci, <k>-call, <k>-obj or <k>-type, with optional :<hk> heap depth"),
        )
        .arg(
            Arg::new("no-merge-strings")
                .long("no-merge-strings")
                .action(ArgAction::SetTrue)
                .help("Allocate one string object per const-string statement"),
        )
        .arg(
            Arg::new("dot")
                .long("dot")
                .action(ArgAction::Set)
                .help("Output callgraph dot file, contexts dropped"),
        )
        .arg(
            Arg::new("cs-dot")
                .long("cs-dot")
                .action(ArgAction::Set)
                .help("Output context-sensitive callgraph dot file"),
        )
        .arg(
            Arg::new("compare")
                .long("compare")
                .action(ArgAction::Set)
                .value_delimiter(',')
                .conflicts_with_all(["output", "dot", "cs-dot"])
                .help("Comma separated context sensitivities to run and compare"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        ptaworks().debug_assert();
    }

    #[test]
    fn pta_arguments() {
        let args = pta()
            .try_get_matches_from(["pw-pta", "-i", "prog.ir", "--compare", "ci,1-call,2-obj"])
            .unwrap();
        let variants: Vec<&String> = args.get_many::<String>("compare").unwrap().collect();
        assert_eq!(variants, ["ci", "1-call", "2-obj"]);
        assert_eq!(args.get_one::<String>("cs").unwrap(), "ci");
        assert!(!args.get_flag("no-merge-strings"));

        assert!(pta()
            .try_get_matches_from(["pw-pta", "-i", "prog.ir", "--compare", "ci", "--dot", "cg.dot"])
            .is_err());
    }
}
