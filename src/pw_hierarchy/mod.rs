use crate::prelude::*;
use clap::ArgMatches;
use regex::Regex;
use std::fs::File;
use std::io::Write;

pub fn run(args: &ArgMatches) -> PwResult<()> {
    init_logger(args);

    let repo = load_repo(args)?;
    for name in repo.iter_missing_classes() {
        log::warn!("class {} is referenced but not defined", name);
    }
    log::info!(
        "hierarchy contains {} classes, {} methods and {} fields",
        repo.nb_classes(),
        repo.nb_methods(),
        repo.nb_fields()
    );

    let filter_class = args.get_one::<String>("filter-class");
    let filter_method = args.get_one::<String>("filter-method");
    if filter_class.is_some() || filter_method.is_some() {
        let class_pattern = Regex::new(filter_class.map_or(".*", String::as_str))?;
        let method_pattern = Regex::new(filter_method.map_or(".*", String::as_str))?;
        for class in repo.find_classes(&class_pattern) {
            let methods: Vec<&Method> = class.find_methods(&method_pattern, &repo).collect();
            if methods.is_empty() && filter_method.is_some() {
                continue;
            }
            println!("{}", class.name());
            for method in methods {
                println!("  {}", method.subsig());
            }
        }
    }

    if let Some(dot_filename) = args.get_one::<String>("output") {
        let mut file = File::create(dot_filename)?;
        file.write_all(repo.hierarchy().to_dot().as_bytes())?;
        log::info!("dot output written in {:?}", dot_filename);
    }
    Ok(())
}
