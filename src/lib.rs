//! # `PtaWorks`
//!
//! `ptaworks` is the main crate of the `PtaWorks` points-to analysis
//! project. It acts as entry point by reexporting important structs and
//! functions from the sub-crates, most of them within the
//! `ptaworks::prelude` namespace, and hosts the command line tools.
//!
//! ## Library basics
//!
//! Programs are written in a small textual IR and parsed by `pw_ir`. They
//! are then registered into a `Repo`, which resolves classes, methods and
//! fields and gives access to the analyses:
//!
//! ```rust
//! use ptaworks::prelude::*;
//!
//! let program = ir::parse(
//!     "class A\n  static method main()\n    new-instance x, A\n    return-void\n  end\nend\nentry A->main\n",
//! )?;
//! let repository = Repo::from_program(&program)?;
//! let options = pta::Options {
//!     cs: "1-call".parse()?,
//!     ..pta::Options::default()
//! };
//! let result = pta::analyze(&repository, &options)?;
//! println!("reachable methods: {}", result.reachable_methods().len());
//! # Ok::<(), PwError>(())
//! ```
//!
//! ## Sub-crates
//!
//!  - [`pw_ir`] contains the IR definitions and its parser,
//!  - [`pw_analysis`] contains the class hierarchy, the call graphs and the
//!    pointer analysis.

mod errors;

pub mod cli;
pub mod pw_callgraph;
pub mod pw_hierarchy;
pub mod pw_pta;

pub use pw_analysis as analysis;
pub use pw_ir as ir;

/// Reexport module of commonly used structures and functions from `PtaWorks`
/// project sub-crates:
///
/// ```rust
/// use ptaworks::prelude::*;
/// ```
pub mod prelude {
    pub use crate::errors::{PwError, PwResult};

    pub use pw_analysis::callgraph;
    pub use pw_analysis::pta;
    pub use pw_analysis::repo::{Class, Field, Method, Repo};

    pub use pw_ir::{self as ir, Addr, Program};

    use clap::ArgMatches;

    pub fn init_logger(args: &ArgMatches) {
        let env = env_logger::Env::new()
            .filter_or("PW_LOG", "info")
            .write_style("PW_LOG_STYLE");

        let mut builder = env_logger::Builder::from_env(env);
        if args.get_flag("verbose") {
            builder.filter_level(log::LevelFilter::Trace);
        } else if args.get_flag("debug") {
            builder.filter_level(log::LevelFilter::Debug);
        }
        if args.get_flag("ecslog") {
            builder.format(ecs_logger::format);
        }
        builder.init();
    }

    /// Builds the closed repository of the `--input` program, along with the
    /// optional `--system` library program.
    pub fn load_repo(args: &ArgMatches) -> PwResult<Repo> {
        let mut repo = Repo::new();
        if let Some(system_fname) = args.get_one::<String>("system") {
            let system = ir::open(system_fname)?;
            repo.register_program(&system)?;
            log::debug!("system program {:?} registered", system_fname);
        }
        let input_fname = args
            .get_one::<String>("input")
            .ok_or_else(|| PwError::BadArguments("--input needed".to_string()))?;
        let input = ir::open(input_fname)?;
        repo.register_program(&input)?;
        repo.close_hierarchy()?;
        Ok(repo)
    }
}
