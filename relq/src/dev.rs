use env_logger::Builder;
use std::io::Write;

/// Set up `env_logger` with millisecond timestamps and coloured levels. The filter comes from
/// `RUST_LOG`, like `RUST_LOG=relq=debug`.
pub fn setup_logger() {
    let mut builder = Builder::from_default_env();

    builder
        .format_timestamp_millis()
        .format(|buf, record| {
            let level_style = buf.default_level_style(record.level()).bold();

            writeln!(
                buf,
                "{} - [{level_style}{:5}{level_style:#}] {}:{} - {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or_default(),
                record.line().unwrap_or_default(),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Auto);

    // the logger can be set up once per process, demos and tests may call this more times
    let _ = builder.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_twice_is_fine() {
        setup_logger();
        setup_logger();

        log::info!("Logger is set up");
    }
}
