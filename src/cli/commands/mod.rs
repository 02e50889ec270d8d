use crate::{
    collectors::config::DEFAULT_ENDPOINT,
    exporter::{DEFAULT_METRICS_PATH, GIT_COMMIT_HASH},
};
use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("v2ray_exporter")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(GIT_COMMIT_HASH)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("9550")
                .env("V2RAY_EXPORTER_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .help("IP address to bind to, defaults to [::] with a fallback to 0.0.0.0")
                .env("V2RAY_EXPORTER_LISTEN")
                .value_name("IP"),
        )
        .arg(
            Arg::new("metrics-path")
                .short('m')
                .long("metrics-path")
                .help("Path under which the V2Ray scrape is exposed")
                .default_value(DEFAULT_METRICS_PATH)
                .env("V2RAY_EXPORTER_METRICS_PATH")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("v2ray-endpoint")
                .short('e')
                .long("v2ray-endpoint")
                .help("V2Ray API endpoint, host:port or http(s)://host:port")
                .default_value(DEFAULT_ENDPOINT)
                .env("V2RAY_EXPORTER_ENDPOINT")
                .value_name("HOST:PORT"),
        )
        .arg(
            Arg::new("scrape-timeout")
                .short('t')
                .long("scrape-timeout")
                .help("Timeout in seconds for a whole scrape against V2Ray")
                .default_value("3")
                .env("V2RAY_EXPORTER_SCRAPE_TIMEOUT")
                .value_name("SECONDS")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Increase verbosity, -vv for debug")
                .action(ArgAction::Count),
        )
}
