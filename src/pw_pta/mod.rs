use crate::prelude::*;
use crate::pw_callgraph::filter_callgraph;
use clap::ArgMatches;
use nu_ansi_term::{Color, Style};
use pta::{ContextSensitivity, Options, PointerAnalysisResult, Stats};
use rayon::prelude::*;
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Write};

pub fn run(args: &ArgMatches) -> PwResult<()> {
    init_logger(args);

    let repo = load_repo(args)?;
    let merge_string_objects = !args.get_flag("no-merge-strings");

    if let Some(variants) = args.get_many::<String>("compare") {
        let variants = variants
            .map(|cs| cs.parse::<ContextSensitivity>())
            .collect::<Result<Vec<_>, _>>()?;
        return compare(&repo, &variants, merge_string_objects);
    }

    let cs = args
        .get_one::<String>("cs")
        .map(|cs| cs.parse::<ContextSensitivity>())
        .transpose()?
        .unwrap_or_default();
    let options = Options {
        cs,
        merge_string_objects,
    };
    let result = pta::analyze(&repo, &options)?;

    print_points_to(&result, args)?;

    if let Some(json_filename) = args.get_one::<String>("output") {
        let file = BufWriter::new(File::create(json_filename)?);
        serde_json::to_writer_pretty(file, &result.report())?;
        log::info!("JSON report written in {:?}", json_filename);
    }
    if let Some(dot_filename) = args.get_one::<String>("dot") {
        let cg = filter_callgraph(result.ci_call_graph(), args)?;
        let mut file = File::create(dot_filename)?;
        file.write_all(cg.to_dot().as_bytes())?;
        log::info!("dot output written in {:?}", dot_filename);
    }
    if let Some(dot_filename) = args.get_one::<String>("cs-dot") {
        let mut file = File::create(dot_filename)?;
        file.write_all(result.cs_call_graph_dot().as_bytes())?;
        log::info!("context-sensitive dot output written in {:?}", dot_filename);
    }

    Ok(())
}

/// Prints the points-to sets of the variables of the reachable methods
/// matching the filters.
fn print_points_to(result: &PointerAnalysisResult, args: &ArgMatches) -> PwResult<()> {
    let repo = result.repo();
    let class_pattern = args
        .get_one::<String>("filter-class")
        .map(|r| Regex::new(r))
        .transpose()?;
    let method_pattern = args
        .get_one::<String>("filter-method")
        .map(|r| Regex::new(r))
        .transpose()?;

    for muid in result.reachable_methods() {
        let method = &repo[muid];
        if !class_pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(method.class_name()))
            || !method_pattern
                .as_ref()
                .map_or(true, |pattern| pattern.is_match(method.name()))
        {
            continue;
        }
        println!("{}", Style::new().bold().paint(method.to_string()));
        for vuid in method.iter_vars() {
            let objs = result.points_to_var(vuid);
            let var = &repo[vuid];
            if objs.is_empty() {
                println!("  {}", Color::DarkGray.paint(format!("{} -> {{}}", var.name())));
                continue;
            }
            println!("  {} ->", var.name());
            for obj in objs {
                println!("    {}", Color::Cyan.paint(result.obj(obj).describe(repo)));
            }
        }
    }
    Ok(())
}

/// Runs several context sensitivities in parallel and prints their
/// precision figures side by side.
fn compare(repo: &Repo, variants: &[ContextSensitivity], merge_string_objects: bool) -> PwResult<()> {
    let results = variants
        .par_iter()
        .map(|cs| -> PwResult<(Stats, usize)> {
            let options = Options {
                cs: *cs,
                merge_string_objects,
            };
            let result = pta::analyze(repo, &options)?;
            let nb_ci_calls = result.ci_call_graph().nb_calls();
            Ok((result.stats().clone(), nb_ci_calls))
        })
        .collect::<PwResult<Vec<_>>>()?;

    let best_methods = results
        .iter()
        .map(|(stats, _)| stats.nb_reachable_methods)
        .min()
        .unwrap_or_default();
    let best_calls = results
        .iter()
        .map(|(_, calls)| *calls)
        .min()
        .unwrap_or_default();
    let highlight = |value: usize, best: usize| {
        let cell = format!("{value:>10}");
        if value == best {
            Color::Green.paint(cell).to_string()
        } else {
            cell
        }
    };

    println!(
        "{}",
        Style::new().bold().paint(format!(
            "{:<12}{:>10}{:>10}{:>10}{:>10}{:>10}{:>12}",
            "cs", "methods", "calls", "contexts", "objects", "pointers", "iterations"
        ))
    );
    for (stats, nb_ci_calls) in &results {
        println!(
            "{:<12}{}{}{:>10}{:>10}{:>10}{:>12}",
            stats.context_sensitivity,
            highlight(stats.nb_reachable_methods, best_methods),
            highlight(*nb_ci_calls, best_calls),
            stats.nb_contexts,
            stats.nb_cs_objs,
            stats.nb_pointers,
            stats.nb_iterations
        );
    }
    Ok(())
}
