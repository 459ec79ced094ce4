use ptaworks::prelude::PwResult;
use ptaworks::{cli, pw_hierarchy};

fn main() -> PwResult<()> {
    let args = cli::hierarchy().get_matches();
    pw_hierarchy::run(&args)
}
