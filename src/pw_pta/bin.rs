use ptaworks::prelude::PwResult;
use ptaworks::{cli, pw_pta};

fn main() -> PwResult<()> {
    let args = cli::pta().get_matches();
    pw_pta::run(&args)
}
