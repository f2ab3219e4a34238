use std::path::Path;

/// Install the process logger.
///
/// Logs go to `file` in append mode when it can be opened, otherwise to stderr.
/// The level defaults to `info`; `RUST_LOG` overrides it.
pub fn init(file: Option<&Path>) {
    use env_logger::Target;
    use std::fs;
    use std::io;

    let target = (|| -> io::Result<Target> {
        let path = file.ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Target::Pipe(Box::new(file)))
    })()
    .unwrap_or(Target::Stderr);

    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(log::LevelFilter::Info);
    }
    // A second init (tests, embedding) keeps the first logger.
    let _ = builder.target(target).try_init();
}
