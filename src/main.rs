mod viewer;

use viewer::cli::{help_text, parse_cli_options};

fn main() -> anyhow::Result<()> {
    let options = parse_cli_options(std::env::args().skip(1))?;
    if options.show_help {
        println!("{}", help_text());
        return Ok(());
    }

    viewer::app::run(options)
}
