use std::path::PathBuf;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub once: bool,
    pub status: bool,
}

pub fn parse_args<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = CliArgs::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value for --config".to_string())?;
                parsed.config = Some(PathBuf::from(value));
            }
            "--once" => {
                parsed.once = true;
            }
            "--status" => {
                parsed.status = true;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                return Err(format!("unknown argument: {arg}"));
            }
        }
    }

    if parsed.once && parsed.status {
        return Err("--once and --status cannot be combined".to_string());
    }
    Ok(parsed)
}

pub fn print_help() {
    println!(
        "LTE Data Tracker\n\n\
Usage:\n  lte-tracker [--config <path>] [--once | --status]\n\n\
Options:\n  -c, --config <path>  Read settings from this TOML file (default: ./lte-tracker.toml)\n  --once               Run a single usage cycle and exit\n  --status             Print the stored usage record and exit\n  -h, --help           Show this help message\n\n\
Settings can also be given as LTE_TRACKER_* environment variables or in a .env file.\n"
    );
}
