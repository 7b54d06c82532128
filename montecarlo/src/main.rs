use montecarlo::cli::{Args, BaseCommand, Command};
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::new(pico_args::Arguments::from_env());

    let result = BaseCommand::try_from_cli_args(args).and_then(BaseCommand::run);

    match result {
        Ok(output) => println!("{output}"),
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("Try 'montecarlo --help' for more information.");
            process::exit(1);
        }
    }
}
