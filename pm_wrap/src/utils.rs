use chrono::Local;
use env_logger::Builder;
use itertools::Itertools;
use log::LevelFilter;
use std::io::Write;

/// Convert an io::error to a string and strip "(os error 2)" from the end.
fn io_error_to_string(err: &std::io::Error) -> String {
    let s = err.to_string();
    s.strip_suffix(&format!(" (os error {})", err.raw_os_error().unwrap_or(0)))
        .unwrap_or(&s)
        .to_string()
}

/// Render an error and its causes, one per line.
pub fn format_error_chain(err: &anyhow::Error) -> String {
    let error_chain = err.chain().join("\n\tCaused by: ");
    if let Some(io_err) = err.downcast_ref::<std::io::Error>() {
        let io_err_str = io_error_to_string(io_err);
        match err.chain().len() {
            1 => format!("ERROR: {io_err_str}"),
            2 => format!("ERROR: {io_err_str}: {err}"),
            _ => format!("ERROR: {error_chain}"),
        }
    } else {
        format!("ERROR: {error_chain}")
    }
}

/// Print an error chain.
pub fn print_error_chain(err: &anyhow::Error) {
    eprintln!("{}", format_error_chain(err));
}

/// Log `<time> [LEVEL] - message` lines at info and above; `RUST_LOG`
/// overrides the level.
pub fn init_logging() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .init();
}
