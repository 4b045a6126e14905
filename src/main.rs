use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    use clap::Parser;
    use std::error::Error;
    let args = nass_revenue::cli::Args::parse();

    let default_level = if args.verbose {
        "nass_revenue=debug,warn"
    } else if args.quiet {
        "warn"
    } else {
        "nass_revenue=info,warn"
    };
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = nass_revenue::cli::run(&args) {
        eprintln!("{}", e);
        if args.verbose {
            let mut source = e.source();
            while let Some(s) = source {
                eprintln!("  cause: {}", s);
                source = s.source();
            }
        }
        std::process::exit(e.exit_code());
    }
}
