use crate::prelude::*;
use callgraph::CallGraph;
use clap::ArgMatches;
use regex::Regex;
use std::fs::File;
use std::io::Write;

/// Keeps the methods leading to methods matching the `--filter-class` and
/// `--filter-method` patterns, if any.
pub fn filter_callgraph(cg: CallGraph, args: &ArgMatches) -> PwResult<CallGraph> {
    let filter_class = args.get_one::<String>("filter-class");
    let filter_method = args.get_one::<String>("filter-method");
    if filter_class.is_none() && filter_method.is_none() {
        return Ok(cg);
    }
    let class_pattern = filter_class.map(|r| Regex::new(r)).transpose()?;
    let method_pattern = filter_method.map(|r| Regex::new(r)).transpose()?;
    log::debug!(
        "filtering callgraph on class pattern {:?}, method pattern {:?}",
        class_pattern,
        method_pattern
    );
    Ok(cg.filter(|meth| {
        class_pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(meth.class_name()))
            && method_pattern
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(meth.name()))
    }))
}

pub fn run(args: &ArgMatches) -> PwResult<()> {
    init_logger(args);

    let repo = load_repo(args)?;
    let cg = filter_callgraph(repo.build_callgraph()?, args)?;

    log::info!(
        "callgraph contains {} methods and {} calls",
        cg.nb_methods(),
        cg.nb_calls()
    );

    if let Some(dot_filename) = args.get_one::<String>("output") {
        let mut file = File::create(dot_filename)?;
        file.write_all(cg.to_dot().as_bytes())?;
        log::info!("dot output written in {:?}", dot_filename);
    }

    Ok(())
}
